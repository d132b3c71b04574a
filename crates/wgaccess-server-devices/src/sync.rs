// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Reconciliation of the live peer table against the registry.

use std::collections::HashSet;

use tracing::{debug, info, instrument, warn};

use crate::error::{DeviceError, GatewayError, RegistryError, Result};
use crate::manager::DeviceManager;
use crate::types::{Device, LivePeer, SyncReport};

impl DeviceManager {
	/// Re-applies every registered device's peer and, when enabled, removes
	/// live peers that no device owns.
	///
	/// Per-device failures are logged and reported, never returned. Only a
	/// failure to list the registry fails the pass.
	#[instrument(skip(self), fields(prune_orphans = self.prune_orphans))]
	pub async fn sync(&self) -> Result<SyncReport> {
		// Taken before the registry listing: a device is always persisted
		// before its peer goes live, so every peer in this snapshot that
		// belongs to a device is also in the listing below.
		let live = if self.prune_orphans {
			self.snapshot_peers().await
		} else {
			None
		};

		let devices = self
			.registry
			.list()
			.await
			.map_err(|e| DeviceError::persistence("failed to list devices for sync", e))?;

		let mut report = SyncReport::default();
		for device in &devices {
			match self.sync_device(device).await {
				Ok(true) => report.activated += 1,
				Ok(false) => debug!(name = %device.name, "device removed during sync"),
				Err(e) => {
					warn!(name = %device.name, error = %e, "failed to sync device");
					report.failed.push(device.name.clone());
				}
			}
		}

		if let Some(live) = live {
			let owned: HashSet<&str> = devices.iter().map(|d| d.public_key.as_str()).collect();
			for peer in live.iter().filter(|p| !owned.contains(p.public_key.as_str())) {
				match self.call_gateway(self.gateway.remove_peer(&peer.public_key)).await {
					Ok(()) | Err(GatewayError::NotFound(_)) => {
						info!(peer = %peer.public_key, allowed_ips = ?peer.allowed_ips, "pruned orphaned peer");
						report.pruned.push(peer.public_key.clone());
					}
					Err(e) => warn!(peer = %peer.public_key, error = %e, "failed to prune orphaned peer"),
				}
			}
		}

		info!(
			devices = devices.len(),
			activated = report.activated,
			failed = report.failed.len(),
			pruned = report.pruned.len(),
			"sync complete"
		);
		Ok(report)
	}

	/// Returns `Ok(false)` when the device disappeared before its lock was taken.
	async fn sync_device(&self, device: &Device) -> std::result::Result<bool, DeviceError> {
		let _name_guard = self.name_locks.lock(&device.name).await;

		let current = match self.registry.get(&device.name).await {
			Ok(current) => current,
			Err(RegistryError::NotFound(_)) => return Ok(false),
			Err(e) => return Err(DeviceError::persistence("failed to re-read device", e)),
		};

		match self.activate(&current).await {
			Ok(()) | Err(GatewayError::AlreadyExists(_)) => Ok(true),
			Err(e) => Err(DeviceError::activation("failed to activate peer", e)),
		}
	}

	async fn snapshot_peers(&self) -> Option<Vec<LivePeer>> {
		match self.call_gateway(self.gateway.list_peers()).await {
			Ok(peers) => Some(peers),
			Err(e) => {
				warn!(error = %e, "could not list live peers; skipping orphan pruning");
				None
			}
		}
	}
}
