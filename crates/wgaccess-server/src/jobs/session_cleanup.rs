// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use async_trait::async_trait;
use tracing::instrument;
use wgaccess_server_session::SessionGuard;

use super::{Job, JobError, JobOutput};

pub struct SessionCleanupJob {
	sessions: SessionGuard,
}

impl SessionCleanupJob {
	pub fn new(sessions: SessionGuard) -> Self {
		Self { sessions }
	}
}

#[async_trait]
impl Job for SessionCleanupJob {
	fn id(&self) -> &str {
		"session-cleanup"
	}

	fn name(&self) -> &str {
		"Session Cleanup"
	}

	#[instrument(skip(self), fields(job_id = "session-cleanup"))]
	async fn run(&self) -> Result<JobOutput, JobError> {
		let deleted = self
			.sessions
			.purge_expired()
			.await
			.map_err(|e| JobError::Failed(e.to_string()))?;

		Ok(JobOutput {
			message: format!("deleted {deleted} expired session(s)"),
		})
	}
}
