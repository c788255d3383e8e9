// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Practice text routes.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    middleware::from_fn_with_state,
    routing::{delete, get, post},
    Json, Router,
};
use serde::Serialize;
use serde_json::Value;

use crate::error::{AppError, Result};
use crate::middleware::require_auth;
use crate::models::Text;
use crate::validation;
use crate::AppState;

/// Text routes, mounted under `/texte`.
///
/// Reads are public; writes require a valid token but no role.
pub fn routes(state: Arc<AppState>) -> Router<Arc<AppState>> {
    let gated_routes = Router::new()
        .route("/addText", post(add_text))
        .route("/deleteText/{id}", delete(delete_text))
        .route_layer(from_fn_with_state(state, require_auth));

    Router::new()
        .route("/getAllTexts", get(get_all_texts))
        .route("/getText/{id}", get(get_text))
        .merge(gated_routes)
}

/// List entry carrying the document ID alongside the text fields.
#[derive(Serialize)]
struct TextListEntry {
    id: String,
    #[serde(flatten)]
    text: Text,
}

/// List all practice texts.
async fn get_all_texts(State(state): State<Arc<AppState>>) -> Result<Json<Vec<TextListEntry>>> {
    let texts = state.db.list_texts().await?;

    let entries = texts
        .into_iter()
        .map(|text| TextListEntry {
            id: text.id.clone().unwrap_or_default(),
            text,
        })
        .collect();

    Ok(Json(entries))
}

/// Create a practice text.
async fn add_text(
    State(state): State<Arc<AppState>>,
    Json(body): Json<Value>,
) -> Result<(StatusCode, String)> {
    let body = body
        .as_object()
        .ok_or_else(|| AppError::Validation("Request body must be a JSON object".to_string()))?;

    validation::require_fields(body, &["title", "author", "content", "language"])?;

    let text: Text = serde_json::from_value(Value::Object(body.clone()))
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let id = state.db.create_text(&text).await?;

    tracing::info!(id = %id, "Text created");
    Ok((StatusCode::CREATED, format!("Text created with ID: {}", id)))
}

/// Get a practice text by document ID.
async fn get_text(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Text>> {
    let text = state
        .db
        .get_text(&id)
        .await?
        .ok_or_else(|| AppError::NotFound("Text not found".to_string()))?;

    Ok(Json(text))
}

/// Delete a practice text by document ID.
async fn delete_text(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<String> {
    state.db.delete_text(&id).await?;

    tracing::info!(id = %id, "Text deleted");
    Ok("Text deleted successfully".to_string())
}
