// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Configuration sources: environment variables and TOML files.

use std::path::PathBuf;

use tracing::{debug, trace};

use crate::error::ConfigError;
use crate::layer::ServerConfigLayer;
use crate::sections::{
	AuthConfigLayer, DatabaseConfigLayer, HttpConfigLayer, LoggingConfigLayer, PeerBackend,
	SyncConfigLayer, WireGuardConfigLayer,
};

pub const SYSTEM_CONFIG_PATH: &str = "/etc/wgaccess/server.toml";

/// Source precedence levels (higher = overrides lower).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Precedence {
	Defaults = 10,
	ConfigFile = 20,
	Environment = 50,
}

/// Trait for configuration sources.
pub trait ConfigSource: Send + Sync {
	fn name(&self) -> &'static str;
	fn precedence(&self) -> Precedence;
	fn load(&self) -> Result<ServerConfigLayer, ConfigError>;
}

/// Built-in defaults source.
pub struct DefaultsSource;

impl ConfigSource for DefaultsSource {
	fn name(&self) -> &'static str {
		"defaults"
	}

	fn precedence(&self) -> Precedence {
		Precedence::Defaults
	}

	fn load(&self) -> Result<ServerConfigLayer, ConfigError> {
		debug!("loading defaults");
		Ok(ServerConfigLayer::default())
	}
}

/// TOML file configuration source.
pub struct TomlSource {
	path: PathBuf,
}

impl TomlSource {
	pub fn new(path: impl Into<PathBuf>) -> Self {
		Self { path: path.into() }
	}

	pub fn system() -> Self {
		Self::new(SYSTEM_CONFIG_PATH)
	}
}

impl ConfigSource for TomlSource {
	fn name(&self) -> &'static str {
		"toml-config"
	}

	fn precedence(&self) -> Precedence {
		Precedence::ConfigFile
	}

	fn load(&self) -> Result<ServerConfigLayer, ConfigError> {
		if !self.path.exists() {
			debug!(path = %self.path.display(), "config file not found, skipping");
			return Ok(ServerConfigLayer::default());
		}

		debug!(path = %self.path.display(), "loading config file");
		let content = std::fs::read_to_string(&self.path).map_err(|e| ConfigError::FileRead {
			path: self.path.clone(),
			source: e,
		})?;

		let layer: ServerConfigLayer =
			toml::from_str(&content).map_err(|e| ConfigError::TomlParse {
				path: self.path.clone(),
				source: e,
			})?;

		trace!("parsed config layer from TOML");
		Ok(layer)
	}
}

/// Environment variable source.
///
/// Convention: WGACCESS_<SECTION>_<FIELD>
pub struct EnvSource;

impl ConfigSource for EnvSource {
	fn name(&self) -> &'static str {
		"environment"
	}

	fn precedence(&self) -> Precedence {
		Precedence::Environment
	}

	fn load(&self) -> Result<ServerConfigLayer, ConfigError> {
		debug!("loading environment variables");
		Ok(ServerConfigLayer {
			http: Some(load_http_from_env()?),
			database: Some(load_database_from_env()),
			wireguard: Some(load_wireguard_from_env()?),
			sync: Some(load_sync_from_env()?),
			auth: Some(load_auth_from_env()?),
			logging: Some(load_logging_from_env()),
		})
	}
}

fn env_var(name: &str) -> Option<String> {
	std::env::var(name).ok().filter(|s| !s.is_empty())
}

fn env_bool(name: &str) -> Option<bool> {
	env_var(name).map(|v| v.eq_ignore_ascii_case("true") || v == "1")
}

/// Parses a numeric variable; a present but malformed value is an error.
fn env_parse<T: std::str::FromStr>(name: &str) -> Result<Option<T>, ConfigError> {
	env_var(name)
		.map(|v| {
			v.parse().map_err(|_| ConfigError::InvalidValue {
				key: name.to_string(),
				message: format!("'{v}' is not a valid {}", std::any::type_name::<T>()),
			})
		})
		.transpose()
}

fn load_http_from_env() -> Result<HttpConfigLayer, ConfigError> {
	Ok(HttpConfigLayer {
		host: env_var("WGACCESS_HTTP_HOST"),
		port: env_parse::<u16>("WGACCESS_HTTP_PORT")?,
	})
}

fn load_database_from_env() -> DatabaseConfigLayer {
	DatabaseConfigLayer {
		url: env_var("WGACCESS_DATABASE_URL"),
	}
}

fn load_wireguard_from_env() -> Result<WireGuardConfigLayer, ConfigError> {
	let backend = env_var("WGACCESS_WIREGUARD_BACKEND")
		.map(|v| {
			v.parse::<PeerBackend>()
				.map_err(|message| ConfigError::InvalidValue {
					key: "WGACCESS_WIREGUARD_BACKEND".to_string(),
					message,
				})
		})
		.transpose()?;

	Ok(WireGuardConfigLayer {
		interface: env_var("WGACCESS_WIREGUARD_INTERFACE"),
		subnet: env_var("WGACCESS_WIREGUARD_SUBNET"),
		endpoint: env_var("WGACCESS_WIREGUARD_ENDPOINT"),
		dns: env_var("WGACCESS_WIREGUARD_DNS"),
		public_key: env_var("WGACCESS_WIREGUARD_PUBLIC_KEY"),
		backend,
		wg_path: env_var("WGACCESS_WIREGUARD_WG_PATH"),
		peer_timeout_secs: env_parse::<u64>("WGACCESS_WIREGUARD_PEER_TIMEOUT_SECS")?,
	})
}

fn load_sync_from_env() -> Result<SyncConfigLayer, ConfigError> {
	Ok(SyncConfigLayer {
		interval_secs: env_parse::<u64>("WGACCESS_SYNC_INTERVAL_SECS")?,
		prune_orphans: env_bool("WGACCESS_SYNC_PRUNE_ORPHANS"),
	})
}

fn load_auth_from_env() -> Result<AuthConfigLayer, ConfigError> {
	Ok(AuthConfigLayer {
		dev_mode: env_bool("WGACCESS_AUTH_DEV_MODE"),
		environment: env_var("WGACCESS_ENV"),
		session_cookie_name: env_var("WGACCESS_AUTH_SESSION_COOKIE_NAME"),
		session_ttl_hours: env_parse::<u32>("WGACCESS_AUTH_SESSION_TTL_HOURS")?,
	})
}

fn load_logging_from_env() -> LoggingConfigLayer {
	LoggingConfigLayer {
		level: env_var("WGACCESS_LOG_LEVEL"),
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::io::Write;

	#[test]
	fn test_precedence_ordering() {
		assert!(Precedence::Environment > Precedence::ConfigFile);
		assert!(Precedence::ConfigFile > Precedence::Defaults);
	}

	#[test]
	fn test_defaults_source_returns_empty_layer() {
		let source = DefaultsSource;
		let layer = source.load().unwrap();
		assert!(layer.http.is_none());
		assert!(layer.wireguard.is_none());
	}

	#[test]
	fn test_toml_source_missing_file_returns_empty() {
		let source = TomlSource::new("/nonexistent/config.toml");
		let layer = source.load().unwrap();
		assert!(layer.http.is_none());
	}

	#[test]
	fn test_toml_source_parses_sections() {
		let mut file = tempfile::NamedTempFile::new().unwrap();
		writeln!(
			file,
			r#"
[wireguard]
interface = "wg7"
subnet = "10.8.0.0/24"
endpoint = "vpn.example.com:51820"
backend = "memory"

[sync]
prune_orphans = false
"#
		)
		.unwrap();

		let layer = TomlSource::new(file.path()).load().unwrap();
		let wireguard = layer.wireguard.unwrap();
		assert_eq!(wireguard.interface.as_deref(), Some("wg7"));
		assert_eq!(wireguard.subnet.as_deref(), Some("10.8.0.0/24"));
		assert_eq!(wireguard.backend, Some(PeerBackend::Memory));
		assert_eq!(layer.sync.unwrap().prune_orphans, Some(false));
	}

	#[test]
	fn test_toml_source_reports_parse_errors() {
		let mut file = tempfile::NamedTempFile::new().unwrap();
		writeln!(file, "[wireguard\ninterface = ").unwrap();

		let result = TomlSource::new(file.path()).load();
		assert!(matches!(result, Err(ConfigError::TomlParse { .. })));
	}
}
