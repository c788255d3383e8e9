// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - identity provider boundary.

pub mod firebase_token;
pub mod identity;

pub use firebase_token::{FirebaseTokenVerifier, IdTokenClaims, InvalidToken};
pub use identity::IdentityClient;
