// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use std::sync::Arc;

use async_trait::async_trait;
use tracing::instrument;
use wgaccess_server_devices::DeviceManager;

use super::{Job, JobError, JobOutput};

/// Reconciles the live peer table with the device registry.
pub struct SyncJob {
	manager: Arc<DeviceManager>,
}

impl SyncJob {
	pub fn new(manager: Arc<DeviceManager>) -> Self {
		Self { manager }
	}
}

#[async_trait]
impl Job for SyncJob {
	fn id(&self) -> &str {
		"device-sync"
	}

	fn name(&self) -> &str {
		"Device Sync"
	}

	#[instrument(skip(self), fields(job_id = "device-sync"))]
	async fn run(&self) -> Result<JobOutput, JobError> {
		let report = self
			.manager
			.sync()
			.await
			.map_err(|e| JobError::Failed(e.to_string()))?;

		Ok(JobOutput {
			message: format!(
				"activated {} device(s), {} failed, pruned {} orphaned peer(s)",
				report.activated,
				report.failed.len(),
				report.pruned.len()
			),
		})
	}
}
