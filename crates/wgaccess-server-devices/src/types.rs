// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A provisioned VPN client.
///
/// `endpoint`, `dns` and `server_public_key` are snapshots of the server
/// configuration at the time the device was added.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Device {
	pub name: String,
	pub public_key: String,
	/// Single-host CIDR, e.g. `10.0.0.2/32`.
	pub address: String,
	pub endpoint: String,
	pub dns: String,
	pub server_public_key: String,
	pub created_at: DateTime<Utc>,
}

/// A peer currently programmed on the tunnel interface.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LivePeer {
	pub public_key: String,
	pub allowed_ips: Vec<String>,
}

/// Outcome of one reconciliation pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SyncReport {
	/// Devices whose peer was (re)applied.
	pub activated: usize,
	/// Names of devices whose peer could not be applied.
	pub failed: Vec<String>,
	/// Public keys of live peers removed because no device owns them.
	pub pruned: Vec<String>,
}

impl SyncReport {
	pub fn is_clean(&self) -> bool {
		self.failed.is_empty()
	}
}
