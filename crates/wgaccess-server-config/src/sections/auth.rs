// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Authentication configuration.

use serde::Deserialize;

pub const DEFAULT_SESSION_COOKIE_NAME: &str = "wgaccess_session";

#[derive(Debug, Clone)]
pub struct AuthConfig {
	/// Bypass session lookup and treat every request as the `dev` identity.
	pub dev_mode: bool,
	/// Deployment environment name (e.g. `production`).
	pub environment: String,
	pub session_cookie_name: String,
	pub session_ttl_hours: u32,
}

impl Default for AuthConfig {
	fn default() -> Self {
		Self {
			dev_mode: false,
			environment: "development".to_string(),
			session_cookie_name: DEFAULT_SESSION_COOKIE_NAME.to_string(),
			session_ttl_hours: 24,
		}
	}
}

impl AuthConfig {
	pub fn is_production(&self) -> bool {
		self.environment.eq_ignore_ascii_case("production")
	}
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AuthConfigLayer {
	#[serde(default)]
	pub dev_mode: Option<bool>,
	#[serde(default)]
	pub environment: Option<String>,
	#[serde(default)]
	pub session_cookie_name: Option<String>,
	#[serde(default)]
	pub session_ttl_hours: Option<u32>,
}

impl AuthConfigLayer {
	pub fn merge(&mut self, other: AuthConfigLayer) {
		if other.dev_mode.is_some() {
			self.dev_mode = other.dev_mode;
		}
		if other.environment.is_some() {
			self.environment = other.environment;
		}
		if other.session_cookie_name.is_some() {
			self.session_cookie_name = other.session_cookie_name;
		}
		if other.session_ttl_hours.is_some() {
			self.session_ttl_hours = other.session_ttl_hours;
		}
	}

	pub fn finalize(self) -> AuthConfig {
		let defaults = AuthConfig::default();
		AuthConfig {
			dev_mode: self.dev_mode.unwrap_or(defaults.dev_mode),
			environment: self.environment.unwrap_or(defaults.environment),
			session_cookie_name: self
				.session_cookie_name
				.unwrap_or(defaults.session_cookie_name),
			session_ttl_hours: self.session_ttl_hours.unwrap_or(defaults.session_ttl_hours),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_defaults() {
		let config = AuthConfigLayer::default().finalize();
		assert!(!config.dev_mode);
		assert!(!config.is_production());
		assert_eq!(config.session_cookie_name, "wgaccess_session");
		assert_eq!(config.session_ttl_hours, 24);
	}

	#[test]
	fn test_production_is_case_insensitive() {
		let config = AuthConfigLayer {
			environment: Some("Production".to_string()),
			..Default::default()
		}
		.finalize();
		assert!(config.is_production());
	}
}
