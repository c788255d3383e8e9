// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! User routes: signup, profile CRUD, session stats.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    middleware::from_fn_with_state,
    routing::{delete, get, patch, post, put},
    Json, Router,
};
use serde::Deserialize;
use serde_json::{Map, Value};

use crate::error::{AppError, Result};
use crate::middleware::require_admin;
use crate::models::{UserProfile, UserRole};
use crate::validation;
use crate::AppState;

/// User routes, mounted under `/user`.
///
/// Signup and the email lookup are public; profile CRUD is admin-gated.
/// The session-stats pair carries no middleware in the current frontend
/// contract.
pub fn routes(state: Arc<AppState>) -> Router<Arc<AppState>> {
    let admin_routes = Router::new()
        .route("/getUser/{id}", get(get_user))
        .route("/updateUser/{id}", patch(update_user).put(update_user))
        .route("/deleteUser/{id}", delete(delete_user))
        .route_layer(from_fn_with_state(state, require_admin));

    Router::new()
        .route("/createUser", post(create_user))
        .route("/userExists/{email}", get(user_exists))
        .route("/updateSessionStats/{id}", put(update_session_stats))
        .route("/getSessionStats/{id}", get(get_session_stats))
        .merge(admin_routes)
}

// ─── Signup ──────────────────────────────────────────────────

/// Raw signup body, deserialized only after the field validator passed.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateUserBody {
    email: String,
    first_name: String,
    last_name: String,
    #[serde(default)]
    profile_picture_url: Option<String>,
    #[serde(default)]
    password: Option<String>,
    #[serde(default)]
    uid: Option<String>,
}

/// Validated signup request, tagged by signup method.
#[derive(Debug)]
struct CreateUserRequest {
    email: String,
    first_name: String,
    last_name: String,
    profile_picture_url: Option<String>,
    method: SignupMethod,
}

#[derive(Debug)]
enum SignupMethod {
    /// Password-based: the provider account is created here.
    Standard { password: String },
    /// Federated: the subject identifier was established client-side.
    Google { uid: String },
}

impl CreateUserRequest {
    fn from_body(body: &Map<String, Value>) -> Result<Self> {
        // Bodies from clients predating federated signup carry no
        // signInMethod; those are password-based.
        let sign_in_method = present_str(body, "signInMethod").unwrap_or("standard");

        let mut required = vec!["email", "firstName", "lastName"];
        match sign_in_method {
            "standard" => required.push("password"),
            "google" => required.push("uid"),
            _ => {}
        }
        validation::require_fields(body, &required)?;

        let parsed: CreateUserBody = serde_json::from_value(Value::Object(body.clone()))
            .map_err(|e| AppError::Validation(e.to_string()))?;

        let method = match sign_in_method {
            "standard" => SignupMethod::Standard {
                password: parsed
                    .password
                    .ok_or_else(|| AppError::Validation("Missing fields: password".to_string()))?,
            },
            "google" => SignupMethod::Google {
                uid: parsed
                    .uid
                    .ok_or_else(|| AppError::Validation("Missing fields: uid".to_string()))?,
            },
            _ => {
                return Err(AppError::Validation("Invalid sign-in method".to_string()));
            }
        };

        Ok(Self {
            email: parsed.email,
            first_name: parsed.first_name,
            last_name: parsed.last_name,
            profile_picture_url: parsed.profile_picture_url,
            method,
        })
    }
}

/// Create a new user: duplicate-email pre-check, then provider account
/// creation (standard) or acceptance of the federated subject id
/// (google), then the profile document write.
///
/// The pre-check and the writes are not transactional across the two
/// backends; concurrent identical signups can both pass the check.
async fn create_user(
    State(state): State<Arc<AppState>>,
    Json(body): Json<Value>,
) -> Result<(StatusCode, String)> {
    let body = body
        .as_object()
        .ok_or_else(|| AppError::Validation("Request body must be a JSON object".to_string()))?;

    let request = CreateUserRequest::from_body(body)?;

    if state
        .db
        .find_user_by_email(&request.email)
        .await?
        .is_some()
    {
        return Err(AppError::Conflict("User already exists".to_string()));
    }

    let uid = match &request.method {
        SignupMethod::Standard { password } => {
            if !validation::is_valid_email(&request.email) {
                return Err(AppError::Validation("Invalid email format.".to_string()));
            }

            let display_name = format!("{} {}", request.first_name, request.last_name);
            state
                .identity
                .create_account(&request.email, password, &display_name)
                .await?
        }
        SignupMethod::Google { uid } => uid.clone(),
    };

    let profile = UserProfile {
        id: None,
        uid,
        email: request.email,
        first_name: request.first_name,
        last_name: request.last_name,
        profile_picture_url: request.profile_picture_url,
        role: UserRole::User,
        session_stats: None,
    };

    let id = state.db.create_user(&profile).await?;

    tracing::info!(id = %id, uid = %profile.uid, "User created");
    Ok((StatusCode::CREATED, format!("User created with ID: {}", id)))
}

// ─── Profile CRUD ────────────────────────────────────────────

/// Get a user profile by document ID.
async fn get_user(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<UserProfile>> {
    let user = state
        .db
        .get_user(&id)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    Ok(Json(user))
}

/// Partially update a user profile.
///
/// Credential fields (email, password) are updated at the identity
/// provider first, keyed by the profile's stored subject id; the
/// remaining fields are merge-written into the document.
async fn update_user(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(body): Json<Value>,
) -> Result<String> {
    let updates = body
        .as_object()
        .ok_or_else(|| AppError::Validation("Request body must be a JSON object".to_string()))?;

    let profile = state
        .db
        .get_user(&id)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    let email = present_str(updates, "email");
    let password = present_str(updates, "password");

    if email.is_some() || password.is_some() {
        state
            .identity
            .update_account(&profile.uid, email, password)
            .await?;
    }

    state.db.update_user_fields(&id, updates).await?;

    tracing::info!(id = %id, fields = updates.len(), "User updated");
    Ok("User updated successfully".to_string())
}

/// Delete a user profile document.
///
/// The linked identity-provider account is left in place.
async fn delete_user(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<String> {
    state.db.delete_user(&id).await?;

    tracing::info!(id = %id, "User deleted");
    Ok("User deleted successfully".to_string())
}

/// Look up a user profile by email.
async fn user_exists(
    State(state): State<Arc<AppState>>,
    Path(email): Path<String>,
) -> Result<Json<UserProfile>> {
    let user = state
        .db
        .find_user_by_email(&email)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    Ok(Json(user))
}

// ─── Session Stats ───────────────────────────────────────────

/// Overwrite the sessionStats field of a user profile.
async fn update_session_stats(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(body): Json<Value>,
) -> Result<String> {
    let body = body
        .as_object()
        .ok_or_else(|| AppError::Validation("Request body must be a JSON object".to_string()))?;

    validation::require_fields(body, &["sessionStats"])?;

    if state.db.get_user(&id).await?.is_none() {
        return Err(AppError::NotFound("User not found".to_string()));
    }

    state.db.set_session_stats(&id, &body["sessionStats"]).await?;

    Ok("Session stats updated successfully".to_string())
}

/// Read the sessionStats field of a user profile.
async fn get_session_stats(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Value>> {
    let user = state
        .db
        .get_user(&id)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    Ok(Json(user.session_stats.unwrap_or(Value::Null)))
}

/// A body value that is present under the falsy-aware semantics, as a str.
fn present_str<'a>(body: &'a Map<String, Value>, key: &str) -> Option<&'a str> {
    body.get(key)
        .filter(|v| validation::is_present(Some(*v)))
        .and_then(Value::as_str)
}
