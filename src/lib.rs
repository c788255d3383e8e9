// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Lectio API Server
//!
//! Backend for the Lectio reading practice app: user accounts backed by
//! Firebase Authentication, with profiles and practice texts stored in
//! Firestore.

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod validation;

use std::sync::Arc;

use config::Config;
use db::FirestoreDb;
use services::{FirebaseTokenVerifier, IdentityClient};

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub db: FirestoreDb,
    pub token_verifier: Arc<FirebaseTokenVerifier>,
    pub identity: IdentityClient,
}
