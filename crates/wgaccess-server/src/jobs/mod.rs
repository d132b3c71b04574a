// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Periodic background jobs.

mod scheduler;
mod session_cleanup;
mod sync;

pub use scheduler::JobScheduler;
pub use session_cleanup::SessionCleanupJob;
pub use sync::SyncJob;

use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum JobError {
	#[error("job failed: {0}")]
	Failed(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobOutput {
	pub message: String,
}

#[async_trait]
pub trait Job: Send + Sync {
	fn id(&self) -> &str;
	fn name(&self) -> &str;
	async fn run(&self) -> Result<JobOutput, JobError>;
}
