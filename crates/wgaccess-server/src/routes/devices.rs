// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Device HTTP handlers. Each is a thin adapter over [`DeviceManager`].
//!
//! [`DeviceManager`]: wgaccess_server_devices::DeviceManager

use axum::{
	extract::{Path, State},
	http::StatusCode,
	Json,
};
use serde::Deserialize;
use tracing::instrument;
use wgaccess_server_devices::{Device, SyncReport};

use crate::{api::AppState, api_response::ApiError, auth_middleware::RequireAuth};

#[derive(Debug, Deserialize)]
pub struct AddDeviceRequest {
	pub name: String,
	pub public_key: String,
}

/// GET /api/devices
#[instrument(skip(state, identity), fields(subject = %identity.subject))]
pub async fn list_devices(
	State(state): State<AppState>,
	RequireAuth(identity): RequireAuth,
) -> Result<Json<Vec<Device>>, ApiError> {
	Ok(Json(state.manager.list_devices().await?))
}

/// POST /api/devices
#[instrument(skip(state, identity, body), fields(subject = %identity.subject, name = %body.name))]
pub async fn add_device(
	State(state): State<AppState>,
	RequireAuth(identity): RequireAuth,
	Json(body): Json<AddDeviceRequest>,
) -> Result<(StatusCode, Json<Device>), ApiError> {
	let device = state.manager.add_device(&body.name, &body.public_key).await?;
	Ok((StatusCode::CREATED, Json(device)))
}

/// GET /api/devices/{name}
#[instrument(skip(state, identity), fields(subject = %identity.subject))]
pub async fn get_device(
	State(state): State<AppState>,
	RequireAuth(identity): RequireAuth,
	Path(name): Path<String>,
) -> Result<Json<Device>, ApiError> {
	Ok(Json(state.manager.get_device(&name).await?))
}

/// DELETE /api/devices/{name}
#[instrument(skip(state, identity), fields(subject = %identity.subject))]
pub async fn delete_device(
	State(state): State<AppState>,
	RequireAuth(identity): RequireAuth,
	Path(name): Path<String>,
) -> Result<StatusCode, ApiError> {
	state.manager.delete_device(&name).await?;
	Ok(StatusCode::NO_CONTENT)
}

/// POST /api/sync - run one reconciliation pass now.
#[instrument(skip(state, identity), fields(subject = %identity.subject))]
pub async fn sync_devices(
	State(state): State<AppState>,
	RequireAuth(identity): RequireAuth,
) -> Result<Json<SyncReport>, ApiError> {
	Ok(Json(state.manager.sync().await?))
}
