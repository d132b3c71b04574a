// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

/// Per-device-name async locks.
///
/// Entries are created on demand and dropped with the last guard, so the map
/// only ever holds names with an operation in flight.
#[derive(Debug, Default)]
pub(crate) struct NameLocks {
	inner: Mutex<HashMap<String, Arc<AsyncMutex<()>>>>,
}

impl NameLocks {
	pub(crate) async fn lock(&self, name: &str) -> NameGuard<'_> {
		let entry = {
			let mut map = self.map();
			Arc::clone(map.entry(name.to_string()).or_default())
		};
		let guard = Arc::clone(&entry).lock_owned().await;
		NameGuard {
			locks: self,
			name: name.to_string(),
			entry,
			_guard: Some(guard),
		}
	}

	#[cfg(test)]
	fn len(&self) -> usize {
		self.map().len()
	}

	fn map(&self) -> MutexGuard<'_, HashMap<String, Arc<AsyncMutex<()>>>> {
		self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
	}
}

pub(crate) struct NameGuard<'a> {
	locks: &'a NameLocks,
	name: String,
	entry: Arc<AsyncMutex<()>>,
	_guard: Option<OwnedMutexGuard<()>>,
}

impl Drop for NameGuard<'_> {
	fn drop(&mut self) {
		let mut map = self.locks.map();
		// map + `entry` + the owned guard; anything above that is a waiter.
		if Arc::strong_count(&self.entry) <= 3 {
			map.remove(&self.name);
		}
		self._guard.take();
	}
}
