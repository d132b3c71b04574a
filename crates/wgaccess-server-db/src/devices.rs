// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Device repository.
//!
//! Rows are returned as plain tuples; the devices crate owns the domain type
//! and its conversion.

use async_trait::async_trait;
use sqlx::sqlite::SqlitePool;

use crate::error::DbError;

/// `(name, public_key, address, endpoint, dns, server_public_key, created_at)`
pub type DeviceRowTuple = (String, String, String, String, String, String, String);

/// Borrowed view of a device row for inserts.
#[derive(Debug, Clone, Copy)]
pub struct NewDeviceRow<'a> {
	pub name: &'a str,
	pub public_key: &'a str,
	pub address: &'a str,
	pub endpoint: &'a str,
	pub dns: &'a str,
	pub server_public_key: &'a str,
	pub created_at: &'a str,
}

/// Repository for device records.
#[derive(Clone)]
pub struct DeviceRepository {
	pool: SqlitePool,
}

impl DeviceRepository {
	pub fn new(pool: SqlitePool) -> Self {
		Self { pool }
	}

	/// Insert a device. A duplicate name, public key or address is a
	/// `DbError::Conflict` whose message names the violated column.
	#[tracing::instrument(skip(self, row), fields(name = %row.name, address = %row.address))]
	pub async fn insert_device(&self, row: NewDeviceRow<'_>) -> Result<(), DbError> {
		sqlx::query(
			"INSERT INTO devices (name, public_key, address, endpoint, dns, server_public_key, created_at)
			 VALUES (?, ?, ?, ?, ?, ?, ?)",
		)
		.bind(row.name)
		.bind(row.public_key)
		.bind(row.address)
		.bind(row.endpoint)
		.bind(row.dns)
		.bind(row.server_public_key)
		.bind(row.created_at)
		.execute(&self.pool)
		.await?;

		Ok(())
	}

	#[tracing::instrument(skip(self))]
	pub async fn get_device(&self, name: &str) -> Result<Option<DeviceRowTuple>, DbError> {
		let row: Option<DeviceRowTuple> = sqlx::query_as(
			"SELECT name, public_key, address, endpoint, dns, server_public_key, created_at
			 FROM devices WHERE name = ?",
		)
		.bind(name)
		.fetch_optional(&self.pool)
		.await?;

		Ok(row)
	}

	#[tracing::instrument(skip(self))]
	pub async fn list_devices(&self) -> Result<Vec<DeviceRowTuple>, DbError> {
		let rows: Vec<DeviceRowTuple> = sqlx::query_as(
			"SELECT name, public_key, address, endpoint, dns, server_public_key, created_at
			 FROM devices ORDER BY created_at ASC, name ASC",
		)
		.fetch_all(&self.pool)
		.await?;

		Ok(rows)
	}

	#[tracing::instrument(skip(self))]
	pub async fn delete_device(&self, name: &str) -> Result<u64, DbError> {
		let result = sqlx::query("DELETE FROM devices WHERE name = ?")
			.bind(name)
			.execute(&self.pool)
			.await?;

		Ok(result.rows_affected())
	}
}

#[async_trait]
pub trait DeviceStore: Send + Sync {
	async fn insert_device(&self, row: NewDeviceRow<'_>) -> Result<(), DbError>;
	async fn get_device(&self, name: &str) -> Result<Option<DeviceRowTuple>, DbError>;
	async fn list_devices(&self) -> Result<Vec<DeviceRowTuple>, DbError>;
	async fn delete_device(&self, name: &str) -> Result<u64, DbError>;
}

#[async_trait]
impl DeviceStore for DeviceRepository {
	async fn insert_device(&self, row: NewDeviceRow<'_>) -> Result<(), DbError> {
		self.insert_device(row).await
	}

	async fn get_device(&self, name: &str) -> Result<Option<DeviceRowTuple>, DbError> {
		self.get_device(name).await
	}

	async fn list_devices(&self) -> Result<Vec<DeviceRowTuple>, DbError> {
		self.list_devices().await
	}

	async fn delete_device(&self, name: &str) -> Result<u64, DbError> {
		self.delete_device(name).await
	}
}
