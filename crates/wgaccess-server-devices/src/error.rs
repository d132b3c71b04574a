// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use std::time::Duration;

use ipnet::Ipv4Net;
use thiserror::Error;
use wgaccess_server_db::DbError;

use crate::address_pool::PoolExhausted;

/// Errors returned by [`crate::DeviceManager`].
///
/// Every variant identifies the failing subsystem so an operator can tell a
/// registry outage from a tunnel outage.
#[derive(Debug, Error)]
pub enum DeviceError {
	#[error("invalid input: {0}")]
	InvalidInput(String),

	#[error("device '{0}' not found")]
	NotFound(String),

	#[error("device '{0}' already exists")]
	AlreadyExists(String),

	#[error("public key '{0}' is already used by another device")]
	PublicKeyInUse(String),

	#[error("no free addresses left in {subnet}")]
	PoolExhausted { subnet: Ipv4Net },

	#[error("{context}: {source}")]
	PersistenceFailure {
		context: String,
		#[source]
		source: RegistryError,
	},

	#[error("{context}: {source}")]
	ActivationFailure {
		context: String,
		#[source]
		source: GatewayError,
	},
}

impl DeviceError {
	pub(crate) fn persistence(context: impl Into<String>, source: RegistryError) -> Self {
		Self::PersistenceFailure {
			context: context.into(),
			source,
		}
	}

	pub(crate) fn activation(context: impl Into<String>, source: GatewayError) -> Self {
		Self::ActivationFailure {
			context: context.into(),
			source,
		}
	}

	/// Short name of the subsystem the error came from.
	pub fn subsystem(&self) -> &'static str {
		match self {
			Self::InvalidInput(_)
			| Self::NotFound(_)
			| Self::AlreadyExists(_)
			| Self::PublicKeyInUse(_) => "request",
			Self::PoolExhausted { .. } => "pool",
			Self::PersistenceFailure { .. } => "registry",
			Self::ActivationFailure { .. } => "peer_gateway",
		}
	}
}

impl From<PoolExhausted> for DeviceError {
	fn from(err: PoolExhausted) -> Self {
		Self::PoolExhausted { subnet: err.subnet }
	}
}

#[derive(Debug, Error)]
pub enum RegistryError {
	#[error("device '{0}' not found")]
	NotFound(String),

	#[error("device '{0}' already exists")]
	AlreadyExists(String),

	#[error("public key '{0}' is already registered")]
	PublicKeyInUse(String),

	#[error("address {0} is already assigned")]
	AddressTaken(String),

	#[error("conflicting device record: {0}")]
	Conflict(String),

	#[error("corrupt device record: {0}")]
	Corrupt(String),

	#[error("registry unavailable: {0}")]
	Unavailable(String),

	#[error(transparent)]
	Db(DbError),
}

impl From<DbError> for RegistryError {
	fn from(err: DbError) -> Self {
		match err {
			DbError::NotFound(what) => RegistryError::NotFound(what),
			DbError::Conflict(what) => RegistryError::Conflict(what),
			other => RegistryError::Db(other),
		}
	}
}

#[derive(Debug, Error)]
pub enum GatewayError {
	#[error("peer {0} already exists")]
	AlreadyExists(String),

	#[error("peer {0} not found")]
	NotFound(String),

	#[error("invalid peer address '{0}'")]
	InvalidAddress(String),

	#[error("failed to execute {command}: {source}")]
	Spawn {
		command: String,
		#[source]
		source: std::io::Error,
	},

	#[error("{command} failed: {stderr}")]
	CommandFailed { command: String, stderr: String },

	#[error("peer operation timed out after {0:?}")]
	Timeout(Duration),

	#[error("peer gateway unavailable: {0}")]
	Unavailable(String),
}

pub type Result<T> = std::result::Result<T, DeviceError>;
