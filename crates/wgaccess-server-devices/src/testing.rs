// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Failure-injecting collaborators for exercising partial-failure paths.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;

use crate::error::{GatewayError, RegistryError};
use crate::gateway::{MemoryGateway, PeerGateway, ServerInfo};
use crate::registry::DeviceRegistry;
use crate::types::{Device, LivePeer};

pub fn test_server_info() -> ServerInfo {
	ServerInfo {
		endpoint: "vpn.example.com:51820".to_string(),
		dns: "1.1.1.1".to_string(),
		public_key: "c2VydmVyLXB1YmxpYy1rZXk=".to_string(),
	}
}

/// A [`MemoryGateway`] whose operations can be made to fail or hang.
#[derive(Debug)]
pub struct FlakyGateway {
	inner: MemoryGateway,
	fail_add: AtomicBool,
	fail_remove: AtomicBool,
	fail_list: AtomicBool,
	hang: AtomicBool,
	add_calls: AtomicUsize,
}

impl FlakyGateway {
	pub fn new() -> Self {
		Self {
			inner: MemoryGateway::new(test_server_info()),
			fail_add: AtomicBool::new(false),
			fail_remove: AtomicBool::new(false),
			fail_list: AtomicBool::new(false),
			hang: AtomicBool::new(false),
			add_calls: AtomicUsize::new(0),
		}
	}

	pub fn fail_add(&self, fail: bool) {
		self.fail_add.store(fail, Ordering::SeqCst);
	}

	pub fn fail_remove(&self, fail: bool) {
		self.fail_remove.store(fail, Ordering::SeqCst);
	}

	pub fn fail_list(&self, fail: bool) {
		self.fail_list.store(fail, Ordering::SeqCst);
	}

	/// Every subsequent call blocks forever.
	pub fn hang(&self, hang: bool) {
		self.hang.store(hang, Ordering::SeqCst);
	}

	pub fn add_calls(&self) -> usize {
		self.add_calls.load(Ordering::SeqCst)
	}

	pub async fn peer_address(&self, public_key: &str) -> Option<String> {
		self.inner.peer_address(public_key).await
	}

	pub async fn peer_count(&self) -> usize {
		self.inner.peer_count().await
	}

	async fn maybe_hang(&self) {
		if self.hang.load(Ordering::SeqCst) {
			std::future::pending::<()>().await;
		}
	}
}

impl Default for FlakyGateway {
	fn default() -> Self {
		Self::new()
	}
}

#[async_trait]
impl PeerGateway for FlakyGateway {
	fn endpoint(&self) -> &str {
		self.inner.endpoint()
	}

	fn dns(&self) -> &str {
		self.inner.dns()
	}

	fn public_key(&self) -> &str {
		self.inner.public_key()
	}

	async fn add_peer(&self, public_key: &str, address: &str) -> Result<(), GatewayError> {
		self.add_calls.fetch_add(1, Ordering::SeqCst);
		self.maybe_hang().await;
		if self.fail_add.load(Ordering::SeqCst) {
			return Err(GatewayError::Unavailable("injected add failure".into()));
		}
		self.inner.add_peer(public_key, address).await
	}

	async fn remove_peer(&self, public_key: &str) -> Result<(), GatewayError> {
		self.maybe_hang().await;
		if self.fail_remove.load(Ordering::SeqCst) {
			return Err(GatewayError::Unavailable("injected remove failure".into()));
		}
		self.inner.remove_peer(public_key).await
	}

	async fn list_peers(&self) -> Result<Vec<LivePeer>, GatewayError> {
		self.maybe_hang().await;
		if self.fail_list.load(Ordering::SeqCst) {
			return Err(GatewayError::Unavailable("injected list failure".into()));
		}
		self.inner.list_peers().await
	}
}

/// Wraps a real registry and fails selected operations on demand.
pub struct FlakyRegistry {
	inner: Arc<dyn DeviceRegistry>,
	fail_save: AtomicBool,
	fail_list: AtomicBool,
	fail_delete: AtomicBool,
}

impl FlakyRegistry {
	pub fn new(inner: Arc<dyn DeviceRegistry>) -> Self {
		Self {
			inner,
			fail_save: AtomicBool::new(false),
			fail_list: AtomicBool::new(false),
			fail_delete: AtomicBool::new(false),
		}
	}

	pub fn fail_save(&self, fail: bool) {
		self.fail_save.store(fail, Ordering::SeqCst);
	}

	pub fn fail_list(&self, fail: bool) {
		self.fail_list.store(fail, Ordering::SeqCst);
	}

	pub fn fail_delete(&self, fail: bool) {
		self.fail_delete.store(fail, Ordering::SeqCst);
	}
}

#[async_trait]
impl DeviceRegistry for FlakyRegistry {
	async fn save(&self, device: &Device) -> Result<(), RegistryError> {
		if self.fail_save.load(Ordering::SeqCst) {
			return Err(RegistryError::Unavailable("injected save failure".into()));
		}
		self.inner.save(device).await
	}

	async fn get(&self, name: &str) -> Result<Device, RegistryError> {
		self.inner.get(name).await
	}

	async fn list(&self) -> Result<Vec<Device>, RegistryError> {
		if self.fail_list.load(Ordering::SeqCst) {
			return Err(RegistryError::Unavailable("injected list failure".into()));
		}
		self.inner.list().await
	}

	async fn delete(&self, device: &Device) -> Result<(), RegistryError> {
		if self.fail_delete.load(Ordering::SeqCst) {
			return Err(RegistryError::Unavailable("injected delete failure".into()));
		}
		self.inner.delete(device).await
	}
}
