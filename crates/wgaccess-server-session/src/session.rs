// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use serde::{Deserialize, Serialize};

/// The authenticated principal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
	pub subject: String,
}

impl Identity {
	pub fn new(subject: impl Into<String>) -> Self {
		Self {
			subject: subject.into(),
		}
	}
}

/// Server-side session state.
///
/// `nonce` holds the login challenge while a sign-in is in progress; once it
/// completes the session carries an `identity`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthSession {
	pub nonce: Option<String>,
	pub identity: Option<Identity>,
}

impl AuthSession {
	pub fn authenticated(identity: Identity) -> Self {
		Self {
			nonce: None,
			identity: Some(identity),
		}
	}

	pub fn pending(nonce: impl Into<String>) -> Self {
		Self {
			nonce: Some(nonce.into()),
			identity: None,
		}
	}

	pub fn is_authenticated(&self) -> bool {
		self.identity.is_some()
	}
}
