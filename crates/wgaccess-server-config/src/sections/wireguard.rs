// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! WireGuard interface and address pool configuration.

use std::net::Ipv4Addr;
use std::str::FromStr;

use ipnet::Ipv4Net;
use serde::Deserialize;

use crate::error::ConfigError;

const DEFAULT_INTERFACE: &str = "wg0";
const DEFAULT_SUBNET: &str = "10.0.0.0/24";
const DEFAULT_SUBNET_NETWORK: Ipv4Addr = Ipv4Addr::new(10, 0, 0, 0);
const DEFAULT_SUBNET_PREFIX: u8 = 24;
const DEFAULT_DNS: &str = "1.1.1.1";
const DEFAULT_WG_PATH: &str = "wg";
const DEFAULT_PEER_TIMEOUT_SECS: u64 = 5;

/// Widest prefix that still leaves one host after network, gateway and broadcast.
const MAX_SUBNET_PREFIX: u8 = 30;

/// Which peer gateway implementation programs the tunnel.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PeerBackend {
	/// Drive a kernel interface through the `wg` tool.
	#[default]
	Command,
	/// Keep peers in process memory only.
	Memory,
}

impl FromStr for PeerBackend {
	type Err = String;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s.to_ascii_lowercase().as_str() {
			"command" | "wg" => Ok(Self::Command),
			"memory" => Ok(Self::Memory),
			other => Err(format!("unknown peer backend '{other}'")),
		}
	}
}

#[derive(Debug, Clone)]
pub struct WireGuardConfig {
	pub interface: String,
	pub subnet: Ipv4Net,
	/// Public `host:port` clients dial. Snapshotted into every device.
	pub endpoint: Option<String>,
	pub dns: String,
	/// Server public key. When unset the command backend reads it from the interface.
	pub public_key: Option<String>,
	pub backend: PeerBackend,
	pub wg_path: String,
	pub peer_timeout_secs: u64,
}

impl Default for WireGuardConfig {
	fn default() -> Self {
		Self {
			interface: DEFAULT_INTERFACE.to_string(),
			subnet: Ipv4Net::new(DEFAULT_SUBNET_NETWORK, DEFAULT_SUBNET_PREFIX).unwrap_or_default(),
			endpoint: None,
			dns: DEFAULT_DNS.to_string(),
			public_key: None,
			backend: PeerBackend::default(),
			wg_path: DEFAULT_WG_PATH.to_string(),
			peer_timeout_secs: DEFAULT_PEER_TIMEOUT_SECS,
		}
	}
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct WireGuardConfigLayer {
	#[serde(default)]
	pub interface: Option<String>,
	#[serde(default)]
	pub subnet: Option<String>,
	#[serde(default)]
	pub endpoint: Option<String>,
	#[serde(default)]
	pub dns: Option<String>,
	#[serde(default)]
	pub public_key: Option<String>,
	#[serde(default)]
	pub backend: Option<PeerBackend>,
	#[serde(default)]
	pub wg_path: Option<String>,
	#[serde(default)]
	pub peer_timeout_secs: Option<u64>,
}

impl WireGuardConfigLayer {
	pub fn merge(&mut self, other: WireGuardConfigLayer) {
		if other.interface.is_some() {
			self.interface = other.interface;
		}
		if other.subnet.is_some() {
			self.subnet = other.subnet;
		}
		if other.endpoint.is_some() {
			self.endpoint = other.endpoint;
		}
		if other.dns.is_some() {
			self.dns = other.dns;
		}
		if other.public_key.is_some() {
			self.public_key = other.public_key;
		}
		if other.backend.is_some() {
			self.backend = other.backend;
		}
		if other.wg_path.is_some() {
			self.wg_path = other.wg_path;
		}
		if other.peer_timeout_secs.is_some() {
			self.peer_timeout_secs = other.peer_timeout_secs;
		}
	}

	pub fn finalize(self) -> Result<WireGuardConfig, ConfigError> {
		let raw_subnet = self.subnet.unwrap_or_else(|| DEFAULT_SUBNET.to_string());
		let subnet = parse_subnet(&raw_subnet)?;

		let peer_timeout_secs = self.peer_timeout_secs.unwrap_or(DEFAULT_PEER_TIMEOUT_SECS);
		if peer_timeout_secs == 0 {
			return Err(ConfigError::InvalidValue {
				key: "wireguard.peer_timeout_secs".to_string(),
				message: "must be greater than zero".to_string(),
			});
		}

		Ok(WireGuardConfig {
			interface: self
				.interface
				.unwrap_or_else(|| DEFAULT_INTERFACE.to_string()),
			subnet,
			endpoint: self.endpoint,
			dns: self.dns.unwrap_or_else(|| DEFAULT_DNS.to_string()),
			public_key: self.public_key,
			backend: self.backend.unwrap_or_default(),
			wg_path: self.wg_path.unwrap_or_else(|| DEFAULT_WG_PATH.to_string()),
			peer_timeout_secs,
		})
	}
}

fn parse_subnet(raw: &str) -> Result<Ipv4Net, ConfigError> {
	let subnet: Ipv4Net = raw.parse().map_err(|e| ConfigError::InvalidValue {
		key: "wireguard.subnet".to_string(),
		message: format!("'{raw}' is not an IPv4 CIDR: {e}"),
	})?;

	if subnet.prefix_len() > MAX_SUBNET_PREFIX {
		return Err(ConfigError::InvalidValue {
			key: "wireguard.subnet".to_string(),
			message: format!("/{} leaves no usable client addresses", subnet.prefix_len()),
		});
	}

	// Normalise host bits so 10.0.0.1/24 means 10.0.0.0/24.
	Ok(subnet.trunc())
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_defaults() {
		let config = WireGuardConfigLayer::default().finalize().unwrap();
		assert_eq!(config.interface, "wg0");
		assert_eq!(config.subnet.to_string(), "10.0.0.0/24");
		assert_eq!(config.dns, "1.1.1.1");
		assert_eq!(config.backend, PeerBackend::Command);
		assert_eq!(config.peer_timeout_secs, 5);
	}

	#[test]
	fn test_subnet_host_bits_are_truncated() {
		let config = WireGuardConfigLayer {
			subnet: Some("10.0.0.1/24".to_string()),
			..Default::default()
		}
		.finalize()
		.unwrap();
		assert_eq!(config.subnet.to_string(), "10.0.0.0/24");
	}

	#[test]
	fn test_rejects_ipv6_subnet() {
		let result = WireGuardConfigLayer {
			subnet: Some("fd00::/64".to_string()),
			..Default::default()
		}
		.finalize();
		assert!(matches!(result, Err(ConfigError::InvalidValue { .. })));
	}

	#[test]
	fn test_rejects_subnet_without_usable_hosts() {
		let result = WireGuardConfigLayer {
			subnet: Some("10.0.0.0/31".to_string()),
			..Default::default()
		}
		.finalize();
		assert!(result.is_err());

		let ok = WireGuardConfigLayer {
			subnet: Some("10.0.0.0/30".to_string()),
			..Default::default()
		}
		.finalize();
		assert!(ok.is_ok());
	}

	#[test]
	fn test_rejects_zero_timeout() {
		let result = WireGuardConfigLayer {
			peer_timeout_secs: Some(0),
			..Default::default()
		}
		.finalize();
		assert!(result.is_err());
	}

	#[test]
	fn test_backend_from_str() {
		assert_eq!("memory".parse::<PeerBackend>().unwrap(), PeerBackend::Memory);
		assert_eq!("Command".parse::<PeerBackend>().unwrap(), PeerBackend::Command);
		assert!("netlink".parse::<PeerBackend>().is_err());
	}
}
