// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Authentication extractor.
//!
//! Handlers that take [`RequireAuth`] only run once the session guard has
//! produced an [`Identity`]; the identity is handed to them by value.

use axum::{extract::FromRequestParts, http::request::Parts};
use wgaccess_server_session::{Identity, SessionError};

use crate::api::AppState;
use crate::api_response::ApiError;

#[derive(Debug, Clone)]
pub struct RequireAuth(pub Identity);

impl FromRequestParts<AppState> for RequireAuth {
	type Rejection = ApiError;

	async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
		match state.sessions.authenticate(&parts.headers).await {
			Ok(identity) => Ok(RequireAuth(identity)),
			Err(e) if e.is_auth_failure() => Err(ApiError::Unauthorized(e.to_string())),
			Err(SessionError::Store(e)) => Err(ApiError::Internal(format!("session store: {e}"))),
			Err(e) => Err(ApiError::Internal(e.to_string())),
		}
	}
}
