// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Firestore client wrapper with typed operations.
//!
//! Provides high-level operations for:
//! - Users (profile documents, email lookup)
//! - Texts (practice text documents)

use crate::db::collections;
use crate::error::AppError;
use crate::models::{Text, UserProfile};
use serde_json::{Map, Value};

/// Firestore database client.
#[derive(Clone)]
pub struct FirestoreDb {
    client: Option<firestore::FirestoreDb>,
}

impl FirestoreDb {
    /// Create a new Firestore client.
    ///
    /// For local development with emulator, set FIRESTORE_EMULATOR_HOST.
    pub async fn new(project_id: &str) -> Result<Self, AppError> {
        // If the emulator environment variable is set, use unauthenticated
        // connection to avoid local credential warnings and leakage.
        if std::env::var("FIRESTORE_EMULATOR_HOST").is_ok() {
            return Self::create_emulator_client(project_id).await;
        }

        let client = firestore::FirestoreDb::new(project_id)
            .await
            .map_err(|e| AppError::Upstream(format!("Failed to connect to Firestore: {}", e)))?;

        tracing::info!(project = project_id, "Connected to Firestore");

        Ok(Self {
            client: Some(client),
        })
    }

    /// Create a Firestore client for the emulator with unauthenticated access.
    async fn create_emulator_client(project_id: &str) -> Result<Self, AppError> {
        tracing::info!("Using unauthenticated connection for Firestore Emulator");

        let token_source = gcloud_sdk::ExternalJwtFunctionSource::new(|| async {
            Ok(gcloud_sdk::Token {
                token_type: "Bearer".to_string(),
                token: gcloud_sdk::SecretValue::new(
                    "eyJhbGciOiJub25lIn0.eyJ1aWQiOiJ0ZXN0In0."
                        .to_string()
                        .into(),
                ),
                expiry: chrono::Utc::now() + chrono::Duration::hours(1),
            })
        });

        let options = firestore::FirestoreDbOptions::new(project_id.to_string());

        let client = firestore::FirestoreDb::with_options_token_source(
            options,
            gcloud_sdk::GCP_DEFAULT_SCOPES.clone(),
            gcloud_sdk::TokenSourceType::ExternalSource(Box::new(token_source)),
        )
        .await
        .map_err(|e| {
            AppError::Upstream(format!("Failed to connect to Firestore Emulator: {}", e))
        })?;

        tracing::info!(
            project = project_id,
            "Connected to Firestore (Emulator/Unauthenticated)"
        );

        Ok(Self {
            client: Some(client),
        })
    }

    /// Create a mock Firestore client for testing (offline mode).
    ///
    /// All database operations will return an error if called.
    pub fn new_mock() -> Self {
        Self { client: None }
    }

    /// Helper to get the client or return an error if offline.
    fn get_client(&self) -> Result<&firestore::FirestoreDb, AppError> {
        self.client
            .as_ref()
            .ok_or_else(|| AppError::Upstream("Database not connected (offline mode)".to_string()))
    }

    // ─── User Operations ─────────────────────────────────────────

    /// Get a user profile by document ID.
    pub async fn get_user(&self, id: &str) -> Result<Option<UserProfile>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .by_id_in(collections::USERS)
            .obj()
            .one(id)
            .await
            .map_err(|e| AppError::Upstream(e.to_string()))
    }

    /// Find a user profile by exact email match.
    ///
    /// Used for the duplicate-email pre-check at signup. Uniqueness is
    /// not enforced by the store itself, so this returns the first match.
    pub async fn find_user_by_email(&self, email: &str) -> Result<Option<UserProfile>, AppError> {
        let email = email.to_string();
        let matches: Vec<UserProfile> = self
            .get_client()?
            .fluent()
            .select()
            .from(collections::USERS)
            .filter(move |q| q.for_all([q.field("email").eq(email.clone())]))
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Upstream(e.to_string()))?;

        Ok(matches.into_iter().next())
    }

    /// Create a user profile with a storage-assigned document ID.
    ///
    /// Returns the generated ID.
    pub async fn create_user(&self, profile: &UserProfile) -> Result<String, AppError> {
        let created: UserProfile = self
            .get_client()?
            .fluent()
            .insert()
            .into(collections::USERS)
            .generate_document_id()
            .object(profile)
            .execute()
            .await
            .map_err(|e| AppError::Upstream(e.to_string()))?;

        created
            .id
            .ok_or_else(|| AppError::Upstream("Store did not return a document ID".to_string()))
    }

    /// Merge-write a partial set of fields into a user document.
    ///
    /// Only the supplied keys change; document identity and other fields
    /// are untouched.
    pub async fn update_user_fields(
        &self,
        id: &str,
        fields: &Map<String, Value>,
    ) -> Result<(), AppError> {
        let field_paths: Vec<String> = fields.keys().cloned().collect();

        let _: () = self
            .get_client()?
            .fluent()
            .update()
            .fields(field_paths)
            .in_col(collections::USERS)
            .document_id(id)
            .object(fields)
            .execute()
            .await
            .map_err(|e| AppError::Upstream(e.to_string()))?;
        Ok(())
    }

    /// Overwrite the sessionStats field of a user document.
    pub async fn set_session_stats(&self, id: &str, stats: &Value) -> Result<(), AppError> {
        let mut fields = Map::new();
        fields.insert("sessionStats".to_string(), stats.clone());
        self.update_user_fields(id, &fields).await
    }

    /// Delete a user profile document.
    ///
    /// The linked identity-provider account is not touched here.
    pub async fn delete_user(&self, id: &str) -> Result<(), AppError> {
        self.get_client()?
            .fluent()
            .delete()
            .from(collections::USERS)
            .document_id(id)
            .execute()
            .await
            .map_err(|e| AppError::Upstream(e.to_string()))?;
        Ok(())
    }

    // ─── Text Operations ─────────────────────────────────────────

    /// List all practice texts.
    pub async fn list_texts(&self) -> Result<Vec<Text>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .from(collections::TEXTS)
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Upstream(e.to_string()))
    }

    /// Get a practice text by document ID.
    pub async fn get_text(&self, id: &str) -> Result<Option<Text>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .by_id_in(collections::TEXTS)
            .obj()
            .one(id)
            .await
            .map_err(|e| AppError::Upstream(e.to_string()))
    }

    /// Create a practice text with a storage-assigned document ID.
    ///
    /// Returns the generated ID.
    pub async fn create_text(&self, text: &Text) -> Result<String, AppError> {
        let created: Text = self
            .get_client()?
            .fluent()
            .insert()
            .into(collections::TEXTS)
            .generate_document_id()
            .object(text)
            .execute()
            .await
            .map_err(|e| AppError::Upstream(e.to_string()))?;

        created
            .id
            .ok_or_else(|| AppError::Upstream("Store did not return a document ID".to_string()))
    }

    /// Delete a practice text by document ID.
    pub async fn delete_text(&self, id: &str) -> Result<(), AppError> {
        self.get_client()?
            .fluent()
            .delete()
            .from(collections::TEXTS)
            .document_id(id)
            .execute()
            .await
            .map_err(|e| AppError::Upstream(e.to_string()))?;
        Ok(())
    }
}
