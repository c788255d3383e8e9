//! User profile model for storage and API.

use serde::{Deserialize, Serialize};

/// User role stored on the profile document.
///
/// Tokens carry the same value as a custom claim; the admin gate checks
/// the claim, not this field.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    #[default]
    User,
    Admin,
}

/// User profile stored in Firestore.
///
/// Field names are camelCase on the wire to match the documents written
/// by earlier revisions of this backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    /// Storage-assigned document ID. Populated on reads, never written
    /// back into the document itself.
    #[serde(alias = "_firestore_id", skip_serializing, default)]
    pub id: Option<String>,
    /// Identity-provider subject identifier
    pub uid: String,
    /// Email address (unique by pre-check, not by storage constraint)
    pub email: String,
    /// First name
    pub first_name: String,
    /// Last name
    pub last_name: String,
    /// Profile picture URL
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile_picture_url: Option<String>,
    #[serde(default)]
    pub role: UserRole,
    /// Opaque session statistics owned by the client
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_stats: Option<serde_json::Value>,
}
