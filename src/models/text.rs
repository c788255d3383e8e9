//! Practice text model.

use serde::{Deserialize, Serialize};

/// Practice text stored in Firestore.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Text {
    /// Storage-assigned document ID (read-only)
    #[serde(alias = "_firestore_id", skip_serializing, default)]
    pub id: Option<String>,
    pub title: String,
    pub author: String,
    pub content: String,
    pub language: String,
}
