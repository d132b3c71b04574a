// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Durable device records.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use tracing::instrument;
use wgaccess_server_db::{DeviceRepository, DeviceRowTuple, DeviceStore, NewDeviceRow, SqlitePool};

use crate::error::RegistryError;
use crate::types::Device;

/// Keyed store of devices by name.
///
/// `save` never overwrites. A taken name is [`RegistryError::AlreadyExists`],
/// a taken public key is [`RegistryError::PublicKeyInUse`] and a taken
/// address is [`RegistryError::AddressTaken`].
#[async_trait]
pub trait DeviceRegistry: Send + Sync {
	async fn save(&self, device: &Device) -> Result<(), RegistryError>;
	async fn get(&self, name: &str) -> Result<Device, RegistryError>;
	async fn list(&self) -> Result<Vec<Device>, RegistryError>;
	async fn delete(&self, device: &Device) -> Result<(), RegistryError>;
}

impl TryFrom<DeviceRowTuple> for Device {
	type Error = RegistryError;

	fn try_from(row: DeviceRowTuple) -> Result<Self, RegistryError> {
		let (name, public_key, address, endpoint, dns, server_public_key, created_at) = row;
		Ok(Device {
			created_at: parse_datetime(&created_at)
				.map_err(|_| RegistryError::Corrupt(format!("device '{name}' has invalid created_at '{created_at}'")))?,
			name,
			public_key,
			address,
			endpoint,
			dns,
			server_public_key,
		})
	}
}

fn parse_datetime(s: &str) -> Result<DateTime<Utc>, chrono::ParseError> {
	DateTime::parse_from_rfc3339(s)
		.map(|dt| dt.with_timezone(&Utc))
		.or_else(|_| chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S").map(|ndt| ndt.and_utc()))
}

/// Names the column a unique-constraint violation was raised on.
fn conflict_for(device: &Device, message: &str) -> RegistryError {
	if message.contains("devices.public_key") {
		RegistryError::PublicKeyInUse(device.public_key.clone())
	} else if message.contains("devices.address") {
		RegistryError::AddressTaken(device.address.clone())
	} else {
		RegistryError::AlreadyExists(device.name.clone())
	}
}

/// Registry backed by the `devices` table.
#[derive(Clone)]
pub struct SqliteDeviceRegistry {
	store: Arc<dyn DeviceStore>,
}

impl SqliteDeviceRegistry {
	pub fn new(pool: SqlitePool) -> Self {
		Self::from_store(Arc::new(DeviceRepository::new(pool)))
	}

	pub fn from_store(store: Arc<dyn DeviceStore>) -> Self {
		Self { store }
	}
}

#[async_trait]
impl DeviceRegistry for SqliteDeviceRegistry {
	#[instrument(skip(self, device), fields(name = %device.name, address = %device.address))]
	async fn save(&self, device: &Device) -> Result<(), RegistryError> {
		let created_at = device.created_at.to_rfc3339_opts(SecondsFormat::Micros, true);
		self
			.store
			.insert_device(NewDeviceRow {
				name: &device.name,
				public_key: &device.public_key,
				address: &device.address,
				endpoint: &device.endpoint,
				dns: &device.dns,
				server_public_key: &device.server_public_key,
				created_at: &created_at,
			})
			.await
			.map_err(|err| match RegistryError::from(err) {
				RegistryError::Conflict(message) => conflict_for(device, &message),
				other => other,
			})
	}

	#[instrument(skip(self))]
	async fn get(&self, name: &str) -> Result<Device, RegistryError> {
		match self.store.get_device(name).await? {
			Some(row) => Device::try_from(row),
			None => Err(RegistryError::NotFound(name.to_string())),
		}
	}

	#[instrument(skip(self))]
	async fn list(&self) -> Result<Vec<Device>, RegistryError> {
		self
			.store
			.list_devices()
			.await?
			.into_iter()
			.map(Device::try_from)
			.collect()
	}

	#[instrument(skip(self, device), fields(name = %device.name))]
	async fn delete(&self, device: &Device) -> Result<(), RegistryError> {
		let removed = self.store.delete_device(&device.name).await?;
		if removed == 0 {
			return Err(RegistryError::NotFound(device.name.clone()));
		}
		Ok(())
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use chrono::TimeZone;
	use wgaccess_server_db::testing::create_test_pool;

	fn device(name: &str, address: &str) -> Device {
		Device {
			name: name.to_string(),
			public_key: format!("{name}-key"),
			address: address.to_string(),
			endpoint: "vpn.example.com:51820".to_string(),
			dns: "1.1.1.1".to_string(),
			server_public_key: "server-key".to_string(),
			created_at: Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap(),
		}
	}

	async fn registry() -> SqliteDeviceRegistry {
		SqliteDeviceRegistry::new(create_test_pool().await)
	}

	#[tokio::test]
	async fn save_then_get_round_trips_all_fields() {
		let registry = registry().await;
		let laptop = device("laptop", "10.0.0.2/32");
		registry.save(&laptop).await.unwrap();

		assert_eq!(registry.get("laptop").await.unwrap(), laptop);
	}

	#[tokio::test]
	async fn get_missing_is_not_found() {
		let registry = registry().await;
		let err = registry.get("ghost").await.unwrap_err();
		assert!(matches!(err, RegistryError::NotFound(name) if name == "ghost"));
	}

	#[tokio::test]
	async fn save_does_not_overwrite() {
		let registry = registry().await;
		registry.save(&device("laptop", "10.0.0.2/32")).await.unwrap();

		let mut again = device("laptop", "10.0.0.3/32");
		again.public_key = "other-key".to_string();
		let err = registry.save(&again).await.unwrap_err();
		assert!(matches!(err, RegistryError::AlreadyExists(name) if name == "laptop"));
		assert_eq!(registry.get("laptop").await.unwrap().address, "10.0.0.2/32");
	}

	#[tokio::test]
	async fn taken_address_is_not_reported_as_taken_name() {
		let registry = registry().await;
		registry.save(&device("laptop", "10.0.0.2/32")).await.unwrap();

		let err = registry
			.save(&device("phone", "10.0.0.2/32"))
			.await
			.unwrap_err();
		assert!(matches!(err, RegistryError::AddressTaken(address) if address == "10.0.0.2/32"));
		assert!(matches!(
			registry.get("phone").await.unwrap_err(),
			RegistryError::NotFound(_)
		));
	}

	#[tokio::test]
	async fn taken_public_key_is_reported() {
		let registry = registry().await;
		registry.save(&device("laptop", "10.0.0.2/32")).await.unwrap();

		let mut phone = device("phone", "10.0.0.3/32");
		phone.public_key = "laptop-key".to_string();
		let err = registry.save(&phone).await.unwrap_err();
		assert!(matches!(err, RegistryError::PublicKeyInUse(key) if key == "laptop-key"));
	}

	#[tokio::test]
	async fn delete_removes_and_reports_missing() {
		let registry = registry().await;
		let laptop = device("laptop", "10.0.0.2/32");
		registry.save(&laptop).await.unwrap();

		registry.delete(&laptop).await.unwrap();
		assert!(registry.list().await.unwrap().is_empty());
		assert!(matches!(
			registry.delete(&laptop).await.unwrap_err(),
			RegistryError::NotFound(_)
		));
	}

	#[tokio::test]
	async fn list_returns_every_device() {
		let registry = registry().await;
		registry.save(&device("laptop", "10.0.0.2/32")).await.unwrap();
		registry.save(&device("phone", "10.0.0.3/32")).await.unwrap();

		let names: Vec<String> = registry
			.list()
			.await
			.unwrap()
			.into_iter()
			.map(|d| d.name)
			.collect();
		assert_eq!(names, vec!["laptop", "phone"]);
	}

	#[test]
	fn parses_sqlite_default_timestamp() {
		let parsed = parse_datetime("2025-03-01 12:00:00").unwrap();
		assert_eq!(parsed, Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap());
	}

	#[test]
	fn corrupt_timestamp_is_reported() {
		let row: DeviceRowTuple = (
			"laptop".into(),
			"k".into(),
			"10.0.0.2/32".into(),
			"e".into(),
			"d".into(),
			"s".into(),
			"yesterday".into(),
		);
		assert!(matches!(
			Device::try_from(row).unwrap_err(),
			RegistryError::Corrupt(_)
		));
	}
}
