// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Live tunnel peer management.

mod command;
mod memory;

pub use command::CommandGateway;
pub use memory::MemoryGateway;

use async_trait::async_trait;

use crate::error::GatewayError;
use crate::types::LivePeer;

/// Server-side settings snapshotted into each new device record.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ServerInfo {
	pub endpoint: String,
	pub dns: String,
	pub public_key: String,
}

/// Applies and removes peers on the live tunnel interface.
///
/// `add_peer` on a key that is already present updates its allowed address
/// and must not duplicate the entry.
#[async_trait]
pub trait PeerGateway: Send + Sync {
	fn endpoint(&self) -> &str;
	fn dns(&self) -> &str;
	fn public_key(&self) -> &str;

	async fn add_peer(&self, public_key: &str, address: &str) -> Result<(), GatewayError>;
	async fn remove_peer(&self, public_key: &str) -> Result<(), GatewayError>;
	async fn list_peers(&self) -> Result<Vec<LivePeer>, GatewayError>;
}

pub(crate) fn validate_address(address: &str) -> Result<ipnet::Ipv4Net, GatewayError> {
	address
		.parse::<ipnet::Ipv4Net>()
		.ok()
		.filter(|net| net.prefix_len() == 32)
		.ok_or_else(|| GatewayError::InvalidAddress(address.to_string()))
}
