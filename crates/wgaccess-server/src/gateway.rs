// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Peer gateway construction from configuration.

use std::sync::Arc;

use tracing::{info, warn};
use wgaccess_server_config::{PeerBackend, WireGuardConfig};
use wgaccess_server_devices::{CommandGateway, MemoryGateway, PeerGateway, ServerInfo};

use crate::error::ServerError;

/// Builds the configured backend.
///
/// The command backend requires an endpoint; its public key is read from the
/// interface when not configured.
pub async fn build_gateway(config: &WireGuardConfig) -> Result<Arc<dyn PeerGateway>, ServerError> {
	match config.backend {
		PeerBackend::Memory => {
			warn!("using in-memory peer backend; no kernel interface will be configured");
			Ok(Arc::new(MemoryGateway::new(server_info(config))))
		}
		PeerBackend::Command => {
			let endpoint = config.endpoint.clone().ok_or_else(|| {
				ServerError::Misconfigured(
					"wireguard.endpoint (WGACCESS_WIREGUARD_ENDPOINT) is required for the command backend".into(),
				)
			})?;

			let mut gateway = CommandGateway::new(
				config.interface.clone(),
				ServerInfo {
					endpoint,
					..server_info(config)
				},
			)
			.with_wg_path(config.wg_path.clone());

			if config.public_key.is_none() {
				let key = gateway.discover_public_key().await?;
				info!(interface = %config.interface, "discovered server public key");
				gateway = gateway.with_public_key(key);
			}

			Ok(Arc::new(gateway))
		}
	}
}

fn server_info(config: &WireGuardConfig) -> ServerInfo {
	ServerInfo {
		endpoint: config.endpoint.clone().unwrap_or_default(),
		dns: config.dns.clone(),
		public_key: config.public_key.clone().unwrap_or_default(),
	}
}
