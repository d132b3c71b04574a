// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Peer reconciliation configuration.

use serde::Deserialize;

#[derive(Debug, Clone, PartialEq)]
pub struct SyncConfig {
	/// Seconds between periodic reconciliation passes.
	pub interval_secs: u64,
	/// Remove live peers that have no device record.
	pub prune_orphans: bool,
}

impl Default for SyncConfig {
	fn default() -> Self {
		Self {
			interval_secs: 60,
			prune_orphans: true,
		}
	}
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SyncConfigLayer {
	#[serde(default)]
	pub interval_secs: Option<u64>,
	#[serde(default)]
	pub prune_orphans: Option<bool>,
}

impl SyncConfigLayer {
	pub fn merge(&mut self, other: SyncConfigLayer) {
		if other.interval_secs.is_some() {
			self.interval_secs = other.interval_secs;
		}
		if other.prune_orphans.is_some() {
			self.prune_orphans = other.prune_orphans;
		}
	}

	pub fn finalize(self) -> SyncConfig {
		let defaults = SyncConfig::default();
		SyncConfig {
			interval_secs: self.interval_secs.unwrap_or(defaults.interval_secs),
			prune_orphans: self.prune_orphans.unwrap_or(defaults.prune_orphans),
		}
	}
}
