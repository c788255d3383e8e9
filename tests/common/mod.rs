// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use jsonwebtoken::{encode, Algorithm, DecodingKey, EncodingKey, Header};
use lectio_api::config::Config;
use lectio_api::db::FirestoreDb;
use lectio_api::routes::create_router;
use lectio_api::services::{FirebaseTokenVerifier, IdentityClient};
use lectio_api::AppState;
use serde_json::json;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

/// HMAC key used by the static-key verifier in tests.
#[allow(dead_code)]
pub const TEST_SIGNING_KEY: &[u8] = b"test_signing_key_32_bytes_long!!";

/// Key ID pinned by the static-key verifier.
#[allow(dead_code)]
pub const TEST_KID: &str = "test-kid";

/// Create a test app with offline mock dependencies.
/// Returns the router and the shared state.
#[allow(dead_code)]
pub fn create_test_app() -> (axum::Router, Arc<AppState>) {
    let config = Config::default();
    let db = FirestoreDb::new_mock();

    let token_verifier = Arc::new(
        FirebaseTokenVerifier::new_with_static_key(
            &config.project_id,
            TEST_KID,
            DecodingKey::from_secret(TEST_SIGNING_KEY),
            Algorithm::HS256,
        )
        .expect("Failed to build static-key verifier"),
    );

    let identity = IdentityClient::new_mock();

    let state = Arc::new(AppState {
        config,
        db,
        token_verifier,
        identity,
    });

    (create_router(state.clone()), state)
}

fn now_unix_secs() -> usize {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("System time before epoch")
        .as_secs() as usize
}

/// Create an ID token the static-key verifier accepts.
#[allow(dead_code)]
pub fn create_test_token(uid: &str, role: Option<&str>) -> String {
    sign_test_token(uid, role, now_unix_secs() - 10, now_unix_secs() + 3600)
}

/// Create an ID token that expired well past the verifier's leeway.
#[allow(dead_code)]
pub fn create_expired_test_token(uid: &str, role: Option<&str>) -> String {
    sign_test_token(uid, role, now_unix_secs() - 7200, now_unix_secs() - 3600)
}

#[allow(dead_code)]
fn sign_test_token(uid: &str, role: Option<&str>, iat: usize, exp: usize) -> String {
    let mut claims = json!({
        "sub": uid,
        "aud": "test-project",
        "iss": "https://securetoken.google.com/test-project",
        "iat": iat,
        "exp": exp,
    });
    if let Some(role) = role {
        claims["role"] = json!(role);
    }

    let mut header = Header::new(Algorithm::HS256);
    header.kid = Some(TEST_KID.to_string());

    encode(&header, &claims, &EncodingKey::from_secret(TEST_SIGNING_KEY))
        .expect("Failed to create test token")
}
