// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use std::sync::Arc;
use std::time::Duration;

use axum::{
	routing::{get, post},
	Router,
};
use wgaccess_server_config::ServerConfig;
use wgaccess_server_db::SqlitePool;
use wgaccess_server_devices::{AddressPool, DeviceManager, PeerGateway, SqliteDeviceRegistry};
use wgaccess_server_session::SessionGuard;

use crate::routes;

#[derive(Clone)]
pub struct AppState {
	pub manager: Arc<DeviceManager>,
	pub sessions: SessionGuard,
}

/// Wires the device manager and session guard from configuration.
pub fn create_app_state(
	pool: SqlitePool,
	gateway: Arc<dyn PeerGateway>,
	config: &ServerConfig,
) -> AppState {
	let manager = DeviceManager::new(
		Arc::new(SqliteDeviceRegistry::new(pool.clone())),
		gateway,
		AddressPool::new(config.wireguard.subnet),
	)
	.with_peer_timeout(Duration::from_secs(config.wireguard.peer_timeout_secs))
	.with_orphan_pruning(config.sync.prune_orphans);

	let sessions = SessionGuard::new(
		pool,
		config.auth.session_cookie_name.clone(),
		chrono::Duration::hours(i64::from(config.auth.session_ttl_hours)),
	)
	.with_dev_mode(config.auth.dev_mode);

	if sessions.dev_mode() {
		tracing::warn!("auth dev mode enabled; every request is treated as the dev identity");
	}

	AppState {
		manager: Arc::new(manager),
		sessions,
	}
}

pub fn create_router(state: AppState) -> Router {
	Router::new()
		.route("/health", get(routes::health::health_check))
		.route(
			"/api/devices",
			get(routes::devices::list_devices).post(routes::devices::add_device),
		)
		.route(
			"/api/devices/{name}",
			get(routes::devices::get_device).delete(routes::devices::delete_device),
		)
		.route(
			"/api/session",
			get(routes::session::current_session).delete(routes::session::logout),
		)
		.route("/api/sync", post(routes::devices::sync_devices))
		.with_state(state)
}
