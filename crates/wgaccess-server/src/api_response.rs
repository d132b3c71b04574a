// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! JSON error bodies shared by every handler.

use axum::{
	http::StatusCode,
	response::{IntoResponse, Response},
	Json,
};
use serde::{Deserialize, Serialize};
use wgaccess_server_devices::DeviceError;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
	pub error: String,
	pub message: String,
}

impl ErrorResponse {
	pub fn new(error: impl Into<String>, message: impl Into<String>) -> Self {
		Self {
			error: error.into(),
			message: message.into(),
		}
	}
}

/// Error returned by API handlers.
#[derive(Debug)]
pub enum ApiError {
	Device(DeviceError),
	Unauthorized(String),
	Internal(String),
}

impl From<DeviceError> for ApiError {
	fn from(err: DeviceError) -> Self {
		Self::Device(err)
	}
}

/// Status code and error code for a device error.
///
/// Subsystem failures carry the subsystem name as their code.
pub fn device_error_status(err: &DeviceError) -> (StatusCode, &'static str) {
	match err {
		DeviceError::InvalidInput(_) => (StatusCode::BAD_REQUEST, "invalid_input"),
		DeviceError::NotFound(_) => (StatusCode::NOT_FOUND, "not_found"),
		DeviceError::AlreadyExists(_) | DeviceError::PublicKeyInUse(_) => {
			(StatusCode::CONFLICT, "already_exists")
		}
		DeviceError::PoolExhausted { .. } => (StatusCode::CONFLICT, err.subsystem()),
		DeviceError::PersistenceFailure { .. } => (StatusCode::INTERNAL_SERVER_ERROR, err.subsystem()),
		DeviceError::ActivationFailure { .. } => (StatusCode::BAD_GATEWAY, err.subsystem()),
	}
}

impl IntoResponse for ApiError {
	fn into_response(self) -> Response {
		let (status, body) = match self {
			ApiError::Device(err) => {
				let (status, code) = device_error_status(&err);
				if status.is_server_error() {
					tracing::error!(error = %err, subsystem = err.subsystem(), "device operation failed");
				}
				(status, ErrorResponse::new(code, err.to_string()))
			}
			ApiError::Unauthorized(message) => {
				(StatusCode::UNAUTHORIZED, ErrorResponse::new("unauthorized", message))
			}
			ApiError::Internal(message) => {
				tracing::error!(%message, "internal error");
				(
					StatusCode::INTERNAL_SERVER_ERROR,
					ErrorResponse::new("internal_error", "Internal error"),
				)
			}
		};
		(status, Json(body)).into_response()
	}
}
