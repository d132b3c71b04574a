// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use axum::{
	extract::State,
	http::{header::SET_COOKIE, HeaderMap, StatusCode},
	response::{IntoResponse, Response},
	Json,
};
use wgaccess_server_session::Identity;

use crate::{api::AppState, api_response::ApiError, auth_middleware::RequireAuth};

/// GET /api/session - the caller's identity.
pub async fn current_session(RequireAuth(identity): RequireAuth) -> Json<Identity> {
	Json(identity)
}

/// DELETE /api/session - sign out.
pub async fn logout(State(state): State<AppState>, headers: HeaderMap) -> Result<Response, ApiError> {
	let cookie = state
		.sessions
		.clear_session(&headers)
		.await
		.map_err(|e| ApiError::Internal(e.to_string()))?;
	Ok((StatusCode::NO_CONTENT, [(SET_COOKIE, cookie)]).into_response())
}
