// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{broadcast, Mutex};
use tokio::task::JoinHandle;
use tracing::{info, instrument, warn};

use super::{Job, JobError, JobOutput};

struct RegisteredJob {
	job: Arc<dyn Job>,
	interval: Duration,
}

pub struct JobScheduler {
	jobs: HashMap<String, RegisteredJob>,
	shutdown_tx: broadcast::Sender<()>,
	handles: Mutex<Vec<JoinHandle<()>>>,
}

impl Default for JobScheduler {
	fn default() -> Self {
		Self::new()
	}
}

impl JobScheduler {
	pub fn new() -> Self {
		let (shutdown_tx, _) = broadcast::channel(1);
		Self {
			jobs: HashMap::new(),
			shutdown_tx,
			handles: Mutex::new(Vec::new()),
		}
	}

	pub fn register_periodic(&mut self, job: Arc<dyn Job>, interval: Duration) {
		let id = job.id().to_string();
		self.jobs.insert(id, RegisteredJob { job, interval });
	}

	/// Spawns one loop per job. The first run happens one interval after start.
	#[instrument(skip(self))]
	pub async fn start(&self) {
		let mut handles = self.handles.lock().await;

		for (job_id, registered) in &self.jobs {
			let job = Arc::clone(&registered.job);
			let interval = registered.interval;
			let mut shutdown_rx = self.shutdown_tx.subscribe();
			let job_id = job_id.clone();

			let handle = tokio::spawn(async move {
				loop {
					tokio::select! {
						_ = tokio::time::sleep(interval) => {
							let _ = run_job(job.as_ref()).await;
						}
						_ = shutdown_rx.recv() => {
							info!(job_id = %job_id, "shutting down periodic job");
							break;
						}
					}
				}
			});

			handles.push(handle);
		}

		info!(job_count = handles.len(), "job scheduler started");
	}

	#[instrument(skip(self))]
	pub async fn shutdown(&self) {
		let _ = self.shutdown_tx.send(());

		let mut handles = self.handles.lock().await;
		for handle in handles.drain(..) {
			let _ = handle.await;
		}

		info!("job scheduler shut down");
	}
}

#[instrument(skip(job), fields(job_id = %job.id()))]
async fn run_job(job: &dyn Job) -> Result<JobOutput, JobError> {
	match job.run().await {
		Ok(output) => {
			info!(job = job.name(), message = %output.message, "job completed");
			Ok(output)
		}
		Err(e) => {
			warn!(job = job.name(), error = %e, "job failed");
			Err(e)
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use async_trait::async_trait;
	use std::sync::atomic::{AtomicUsize, Ordering};

	struct CountingJob {
		runs: AtomicUsize,
	}

	#[async_trait]
	impl Job for CountingJob {
		fn id(&self) -> &str {
			"counting"
		}

		fn name(&self) -> &str {
			"Counting"
		}

		async fn run(&self) -> Result<JobOutput, JobError> {
			let n = self.runs.fetch_add(1, Ordering::SeqCst) + 1;
			Ok(JobOutput {
				message: format!("run {n}"),
			})
		}
	}

	#[tokio::test(start_paused = true)]
	async fn periodic_job_runs_until_shutdown() {
		let job = Arc::new(CountingJob {
			runs: AtomicUsize::new(0),
		});
		let mut scheduler = JobScheduler::new();
		scheduler.register_periodic(job.clone(), Duration::from_secs(10));
		scheduler.start().await;

		tokio::time::sleep(Duration::from_secs(35)).await;
		scheduler.shutdown().await;
		let runs = job.runs.load(Ordering::SeqCst);
		assert_eq!(runs, 3);

		tokio::time::sleep(Duration::from_secs(60)).await;
		assert_eq!(job.runs.load(Ordering::SeqCst), runs);
	}
}
