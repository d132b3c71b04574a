// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use std::collections::BTreeMap;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::{debug, instrument};

use super::{validate_address, PeerGateway, ServerInfo};
use crate::error::GatewayError;
use crate::types::LivePeer;

/// In-process peer table.
///
/// Used when no kernel interface is available and as the healthy gateway in
/// tests.
#[derive(Debug, Default)]
pub struct MemoryGateway {
	server: ServerInfo,
	peers: RwLock<BTreeMap<String, String>>,
}

impl MemoryGateway {
	pub fn new(server: ServerInfo) -> Self {
		Self {
			server,
			peers: RwLock::new(BTreeMap::new()),
		}
	}

	/// Allowed address of a live peer, if present.
	pub async fn peer_address(&self, public_key: &str) -> Option<String> {
		self.peers.read().await.get(public_key).cloned()
	}

	pub async fn peer_count(&self) -> usize {
		self.peers.read().await.len()
	}
}

#[async_trait]
impl PeerGateway for MemoryGateway {
	fn endpoint(&self) -> &str {
		&self.server.endpoint
	}

	fn dns(&self) -> &str {
		&self.server.dns
	}

	fn public_key(&self) -> &str {
		&self.server.public_key
	}

	#[instrument(skip(self), fields(peer = %public_key))]
	async fn add_peer(&self, public_key: &str, address: &str) -> Result<(), GatewayError> {
		validate_address(address)?;
		let previous = self
			.peers
			.write()
			.await
			.insert(public_key.to_string(), address.to_string());
		debug!(replaced = previous.is_some(), "peer applied");
		Ok(())
	}

	#[instrument(skip(self), fields(peer = %public_key))]
	async fn remove_peer(&self, public_key: &str) -> Result<(), GatewayError> {
		match self.peers.write().await.remove(public_key) {
			Some(_) => Ok(()),
			None => Err(GatewayError::NotFound(public_key.to_string())),
		}
	}

	async fn list_peers(&self) -> Result<Vec<LivePeer>, GatewayError> {
		Ok(
			self
				.peers
				.read()
				.await
				.iter()
				.map(|(public_key, address)| LivePeer {
					public_key: public_key.clone(),
					allowed_ips: vec![address.clone()],
				})
				.collect(),
		)
	}
}
