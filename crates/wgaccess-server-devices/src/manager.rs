// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Device lifecycle coordination.
//!
//! The registry is the source of truth. Adding a device always persists the
//! record before the peer is activated, so the only gap a failure can leave
//! is a saved device without a live peer, which [`DeviceManager::sync`] heals.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::Mutex;
use tracing::{debug, info, instrument, warn};

use crate::address_pool::AddressPool;
use crate::error::{DeviceError, GatewayError, RegistryError, Result};
use crate::gateway::PeerGateway;
use crate::locks::NameLocks;
use crate::registry::DeviceRegistry;
use crate::types::Device;

pub const DEFAULT_PEER_TIMEOUT: Duration = Duration::from_secs(5);

/// Saves attempted per add when another writer keeps taking the chosen address.
const MAX_ALLOCATION_ATTEMPTS: u32 = 3;

pub struct DeviceManager {
	pub(crate) registry: Arc<dyn DeviceRegistry>,
	pub(crate) gateway: Arc<dyn PeerGateway>,
	pool: AddressPool,
	allocation_lock: Mutex<()>,
	pub(crate) name_locks: NameLocks,
	peer_timeout: Duration,
	pub(crate) prune_orphans: bool,
}

impl DeviceManager {
	pub fn new(
		registry: Arc<dyn DeviceRegistry>,
		gateway: Arc<dyn PeerGateway>,
		pool: AddressPool,
	) -> Self {
		Self {
			registry,
			gateway,
			pool,
			allocation_lock: Mutex::new(()),
			name_locks: NameLocks::default(),
			peer_timeout: DEFAULT_PEER_TIMEOUT,
			prune_orphans: false,
		}
	}

	pub fn with_peer_timeout(mut self, timeout: Duration) -> Self {
		self.peer_timeout = timeout;
		self
	}

	/// Let [`DeviceManager::sync`] remove live peers that no device owns.
	pub fn with_orphan_pruning(mut self, enabled: bool) -> Self {
		self.prune_orphans = enabled;
		self
	}

	pub fn address_pool(&self) -> &AddressPool {
		&self.pool
	}

	/// Allocates an address, persists the device, then activates its peer.
	///
	/// An `ActivationFailure` means the device was saved and is listed; the
	/// next sync applies its peer.
	#[instrument(skip(self, public_key), fields(name = %name, peer = %public_key))]
	pub async fn add_device(&self, name: &str, public_key: &str) -> Result<Device> {
		let name = name.trim();
		if name.is_empty() {
			return Err(DeviceError::InvalidInput("device name must not be empty".into()));
		}
		let public_key = public_key.trim();
		if public_key.is_empty() {
			return Err(DeviceError::InvalidInput("public key must not be empty".into()));
		}

		let _name_guard = self.name_locks.lock(name).await;

		let device = {
			let _allocation = self.allocation_lock.lock().await;
			self.persist_new(name, public_key).await?
		};

		self
			.activate(&device)
			.await
			.map_err(|e| {
				warn!(error = %e, "device saved but peer activation failed");
				DeviceError::activation(
					format!("device '{name}' was saved but its peer could not be activated"),
					e,
				)
			})?;

		info!(address = %device.address, "device added");
		Ok(device)
	}

	/// Allocates and saves under the allocation lock.
	///
	/// Another process sharing the registry can take the chosen address between
	/// the listing and the insert; the allocation is then redone against a
	/// fresh listing.
	async fn persist_new(&self, name: &str, public_key: &str) -> Result<Device> {
		let mut attempt = 1;
		loop {
			let existing = self
				.registry
				.list()
				.await
				.map_err(|e| DeviceError::persistence("failed to list devices", e))?;
			if existing.iter().any(|d| d.name == name) {
				return Err(DeviceError::AlreadyExists(name.to_string()));
			}
			if let Some(owner) = existing.iter().find(|d| d.public_key == public_key) {
				debug!(owner = %owner.name, "public key already registered");
				return Err(DeviceError::PublicKeyInUse(public_key.to_string()));
			}

			let address = self
				.pool
				.allocate(existing.iter().map(|d| d.address.as_str()))?;

			let device = Device {
				name: name.to_string(),
				public_key: public_key.to_string(),
				address: address.to_string(),
				endpoint: self.gateway.endpoint().to_string(),
				dns: self.gateway.dns().to_string(),
				server_public_key: self.gateway.public_key().to_string(),
				created_at: Utc::now(),
			};

			match self.registry.save(&device).await {
				Ok(()) => return Ok(device),
				Err(RegistryError::AlreadyExists(_)) => {
					return Err(DeviceError::AlreadyExists(name.to_string()))
				}
				Err(RegistryError::PublicKeyInUse(_)) => {
					return Err(DeviceError::PublicKeyInUse(public_key.to_string()))
				}
				Err(RegistryError::AddressTaken(taken)) if attempt < MAX_ALLOCATION_ATTEMPTS => {
					debug!(address = %taken, attempt, "address taken concurrently, allocating again");
					attempt += 1;
				}
				Err(e) => {
					return Err(DeviceError::persistence(format!("failed to save device '{name}'"), e))
				}
			}
		}
	}

	/// Removes the device record, then its peer.
	///
	/// An `ActivationFailure` means the record is gone but the peer may still
	/// be live; a sync with orphan pruning enabled removes it.
	#[instrument(skip(self), fields(name = %name))]
	pub async fn delete_device(&self, name: &str) -> Result<()> {
		let name = name.trim();
		let _name_guard = self.name_locks.lock(name).await;

		let device = self.get_device(name).await?;

		self.registry.delete(&device).await.map_err(|e| match e {
			RegistryError::NotFound(_) => DeviceError::NotFound(name.to_string()),
			other => DeviceError::persistence(format!("failed to delete device '{name}'"), other),
		})?;

		match self.call_gateway(self.gateway.remove_peer(&device.public_key)).await {
			Ok(()) | Err(GatewayError::NotFound(_)) => {}
			Err(e) => {
				warn!(error = %e, peer = %device.public_key, "device deleted but peer removal failed");
				return Err(DeviceError::activation(
					format!("device '{name}' was removed from the registry but its peer could not be removed"),
					e,
				));
			}
		}

		info!(address = %device.address, "device deleted");
		Ok(())
	}

	#[instrument(skip(self))]
	pub async fn get_device(&self, name: &str) -> Result<Device> {
		let name = name.trim();
		self.registry.get(name).await.map_err(|e| match e {
			RegistryError::NotFound(_) => DeviceError::NotFound(name.to_string()),
			other => DeviceError::persistence(format!("failed to read device '{name}'"), other),
		})
	}

	#[instrument(skip(self))]
	pub async fn list_devices(&self) -> Result<Vec<Device>> {
		self
			.registry
			.list()
			.await
			.map_err(|e| DeviceError::persistence("failed to list devices", e))
	}

	pub(crate) async fn activate(&self, device: &Device) -> std::result::Result<(), GatewayError> {
		self
			.call_gateway(self.gateway.add_peer(&device.public_key, &device.address))
			.await
	}

	/// Bounds a gateway call by the peer timeout.
	pub(crate) async fn call_gateway<T, F>(&self, call: F) -> std::result::Result<T, GatewayError>
	where
		F: Future<Output = std::result::Result<T, GatewayError>>,
	{
		tokio::time::timeout(self.peer_timeout, call)
			.await
			.unwrap_or(Err(GatewayError::Timeout(self.peer_timeout)))
	}
}
