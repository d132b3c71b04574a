// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Peer gateway driving the `wg` command-line tool.

use std::process::Stdio;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::{debug, instrument, trace};

use super::{validate_address, PeerGateway, ServerInfo};
use crate::error::GatewayError;
use crate::types::LivePeer;

/// Programs peers on a kernel WireGuard interface with `wg set` / `wg show`.
///
/// The interface itself (keys, listen port, addresses) is expected to be
/// brought up out of band.
#[derive(Debug, Clone)]
pub struct CommandGateway {
	interface: String,
	wg_path: String,
	server: ServerInfo,
}

impl CommandGateway {
	pub fn new(interface: impl Into<String>, server: ServerInfo) -> Self {
		Self {
			interface: interface.into(),
			wg_path: "wg".to_string(),
			server,
		}
	}

	pub fn with_wg_path(mut self, wg_path: impl Into<String>) -> Self {
		self.wg_path = wg_path.into();
		self
	}

	pub fn with_public_key(mut self, public_key: impl Into<String>) -> Self {
		self.server.public_key = public_key.into();
		self
	}

	pub fn interface(&self) -> &str {
		&self.interface
	}

	/// Reads the interface's own public key.
	#[instrument(skip(self), fields(interface = %self.interface))]
	pub async fn discover_public_key(&self) -> Result<String, GatewayError> {
		let output = self.exec(&["show", &self.interface, "public-key"]).await?;
		let key = output.trim();
		if key.is_empty() {
			return Err(GatewayError::Unavailable(format!(
				"interface {} reported no public key",
				self.interface
			)));
		}
		Ok(key.to_string())
	}

	async fn exec(&self, args: &[&str]) -> Result<String, GatewayError> {
		trace!(cmd = %self.wg_path, ?args, "executing command");

		let output = Command::new(&self.wg_path)
			.args(args)
			.stdin(Stdio::null())
			.kill_on_drop(true)
			.output()
			.await
			.map_err(|source| GatewayError::Spawn {
				command: self.wg_path.clone(),
				source,
			})?;

		if !output.status.success() {
			return Err(GatewayError::CommandFailed {
				command: format!("{} {}", self.wg_path, args.join(" ")),
				stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
			});
		}

		Ok(String::from_utf8_lossy(&output.stdout).into_owned())
	}
}

#[async_trait]
impl PeerGateway for CommandGateway {
	fn endpoint(&self) -> &str {
		&self.server.endpoint
	}

	fn dns(&self) -> &str {
		&self.server.dns
	}

	fn public_key(&self) -> &str {
		&self.server.public_key
	}

	#[instrument(skip(self), fields(interface = %self.interface, peer = %public_key))]
	async fn add_peer(&self, public_key: &str, address: &str) -> Result<(), GatewayError> {
		validate_address(address)?;
		self
			.exec(&["set", &self.interface, "peer", public_key, "allowed-ips", address])
			.await?;
		debug!(%address, "peer applied");
		Ok(())
	}

	#[instrument(skip(self), fields(interface = %self.interface, peer = %public_key))]
	async fn remove_peer(&self, public_key: &str) -> Result<(), GatewayError> {
		self
			.exec(&["set", &self.interface, "peer", public_key, "remove"])
			.await?;
		debug!("peer removed");
		Ok(())
	}

	#[instrument(skip(self), fields(interface = %self.interface))]
	async fn list_peers(&self) -> Result<Vec<LivePeer>, GatewayError> {
		let output = self.exec(&["show", &self.interface, "dump"]).await?;
		Ok(parse_dump(&output))
	}
}

/// Parses `wg show <if> dump`.
///
/// The first line describes the interface; every following line is one
/// tab-separated peer whose fourth field is the comma-separated allowed IPs.
fn parse_dump(output: &str) -> Vec<LivePeer> {
	output
		.lines()
		.skip(1)
		.filter_map(|line| {
			let fields: Vec<&str> = line.split('\t').collect();
			if fields.len() < 4 || fields[0].is_empty() {
				return None;
			}
			let allowed_ips = match fields[3] {
				"(none)" | "" => Vec::new(),
				ips => ips.split(',').map(|ip| ip.trim().to_string()).collect(),
			};
			Some(LivePeer {
				public_key: fields[0].to_string(),
				allowed_ips,
			})
		})
		.collect()
}

#[cfg(test)]
mod tests {
	use super::*;

	const DUMP: &str = "cHJpdmF0ZQ==\tc2VydmVy\t51820\toff\n\
		a2V5MQ==\t(none)\t203.0.113.5:40000\t10.0.0.2/32\t1735689600\t1024\t2048\toff\n\
		a2V5Mg==\t(none)\t(none)\t(none)\t0\t0\t0\toff\n\
		a2V5Mw==\t(none)\t(none)\t10.0.0.4/32,fd00::4/128\t0\t0\t0\t25\n";

	#[test]
	fn parse_dump_skips_interface_line() {
		let peers = parse_dump(DUMP);
		assert_eq!(peers.len(), 3);
		assert!(peers.iter().all(|p| p.public_key != "cHJpdmF0ZQ=="));
	}

	#[test]
	fn parse_dump_reads_allowed_ips() {
		let peers = parse_dump(DUMP);
		assert_eq!(peers[0].public_key, "a2V5MQ==");
		assert_eq!(peers[0].allowed_ips, vec!["10.0.0.2/32".to_string()]);
		assert!(peers[1].allowed_ips.is_empty());
		assert_eq!(
			peers[2].allowed_ips,
			vec!["10.0.0.4/32".to_string(), "fd00::4/128".to_string()]
		);
	}

	#[test]
	fn parse_dump_ignores_malformed_lines() {
		let peers = parse_dump("iface\tline\n\nshort\tline\n");
		assert!(peers.is_empty());
	}

	#[tokio::test]
	async fn missing_binary_is_spawn_error() {
		let gw = CommandGateway::new("wg0", ServerInfo::default())
			.with_wg_path("/nonexistent/wgaccess-test-wg");
		let err = gw.list_peers().await.unwrap_err();
		assert!(matches!(err, GatewayError::Spawn { .. }));
	}

	#[tokio::test]
	async fn invalid_address_is_rejected_before_exec() {
		let gw = CommandGateway::new("wg0", ServerInfo::default())
			.with_wg_path("/nonexistent/wgaccess-test-wg");
		let err = gw.add_peer("a2V5MQ==", "10.0.0.2").await.unwrap_err();
		assert!(matches!(err, GatewayError::InvalidAddress(_)));
	}

	#[test]
	fn builder_overrides_public_key() {
		let gw = CommandGateway::new("wg1", ServerInfo::default()).with_public_key("c2VydmVy");
		assert_eq!(gw.public_key(), "c2VydmVy");
		assert_eq!(gw.interface(), "wg1");
	}
}
