// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Request authentication.
//!
//! The guard turns request headers into an explicit [`Identity`] that callers
//! pass on by value. Only the SHA-256 of a session token is ever stored.

use std::sync::Arc;

use chrono::{DateTime, Duration, SecondsFormat, Utc};
use http::HeaderMap;
use rand::RngCore;
use sha2::{Digest, Sha256};
use tracing::{debug, instrument};
use uuid::Uuid;
use wgaccess_server_db::{NewSessionRow, SessionRepository, SessionStore, SqlitePool};

use crate::cookies::{expired_session_cookie, extract_session_token, session_cookie};
use crate::error::{Result, SessionError};
use crate::session::{AuthSession, Identity};

pub const DEV_SUBJECT: &str = "dev";
const TOKEN_BYTES: usize = 32;

/// A freshly stored session and the credentials to hand back to the client.
#[derive(Debug, Clone)]
pub struct IssuedSession {
	pub token: String,
	pub set_cookie: String,
	pub expires_at: DateTime<Utc>,
}

#[derive(Clone)]
pub struct SessionGuard {
	store: Arc<dyn SessionStore>,
	cookie_name: String,
	ttl: Duration,
	dev_mode: bool,
}

impl SessionGuard {
	pub fn new(pool: SqlitePool, cookie_name: impl Into<String>, ttl: Duration) -> Self {
		Self::from_store(Arc::new(SessionRepository::new(pool)), cookie_name, ttl)
	}

	pub fn from_store(
		store: Arc<dyn SessionStore>,
		cookie_name: impl Into<String>,
		ttl: Duration,
	) -> Self {
		Self {
			store,
			cookie_name: cookie_name.into(),
			ttl,
			dev_mode: false,
		}
	}

	/// Treat every request as the `dev` identity without a lookup.
	pub fn with_dev_mode(mut self, dev_mode: bool) -> Self {
		self.dev_mode = dev_mode;
		self
	}

	pub fn dev_mode(&self) -> bool {
		self.dev_mode
	}

	pub fn cookie_name(&self) -> &str {
		&self.cookie_name
	}

	#[instrument(skip_all)]
	pub async fn get_session(&self, headers: &HeaderMap) -> Result<AuthSession> {
		if self.dev_mode {
			return Ok(AuthSession::authenticated(Identity::new(DEV_SUBJECT)));
		}

		let token = extract_session_token(headers, &self.cookie_name).ok_or(SessionError::NotAuthenticated)?;
		let token_hash = hash_token(&token);

		let Some(row) = self.store.get_session_by_token_hash(&token_hash).await? else {
			return Err(SessionError::NotAuthenticated);
		};
		let (id, _, subject, nonce, _, expires_at) = row;

		if parse_timestamp(&expires_at)? <= Utc::now() {
			debug!(session_id = %id, "session expired");
			self.store.delete_session_by_token_hash(&token_hash).await?;
			return Err(SessionError::NotAuthenticated);
		}

		Ok(AuthSession {
			nonce,
			identity: subject.map(Identity::new),
		})
	}

	/// Stores `session` under a new random token.
	#[instrument(skip_all)]
	pub async fn set_session(&self, session: &AuthSession) -> Result<IssuedSession> {
		let token = generate_token();
		let now = Utc::now();
		let expires_at = now + self.ttl;
		let id = Uuid::new_v4().to_string();
		let created_at = format_timestamp(now);
		let expires_at_str = format_timestamp(expires_at);

		self
			.store
			.insert_session(NewSessionRow {
				id: &id,
				token_hash: &hash_token(&token),
				subject: session.identity.as_ref().map(|i| i.subject.as_str()),
				nonce: session.nonce.as_deref(),
				created_at: &created_at,
				expires_at: &expires_at_str,
			})
			.await?;

		debug!(session_id = %id, "session stored");
		Ok(IssuedSession {
			set_cookie: session_cookie(&self.cookie_name, &token, self.ttl.num_seconds()),
			token,
			expires_at,
		})
	}

	/// Deletes the presented session, if any, and returns an expiring cookie.
	#[instrument(skip_all)]
	pub async fn clear_session(&self, headers: &HeaderMap) -> Result<String> {
		if let Some(token) = extract_session_token(headers, &self.cookie_name) {
			let removed = self.store.delete_session_by_token_hash(&hash_token(&token)).await?;
			debug!(removed, "session cleared");
		}
		Ok(expired_session_cookie(&self.cookie_name))
	}

	pub fn current_user(&self, session: &AuthSession) -> Result<Identity> {
		session.identity.clone().ok_or(SessionError::Unauthenticated)
	}

	pub async fn authenticate(&self, headers: &HeaderMap) -> Result<Identity> {
		let session = self.get_session(headers).await?;
		self.current_user(&session)
	}

	pub async fn is_authenticated(&self, headers: &HeaderMap) -> bool {
		self.authenticate(headers).await.is_ok()
	}

	#[instrument(skip(self))]
	pub async fn purge_expired(&self) -> Result<u64> {
		Ok(self.store.delete_expired_sessions(&format_timestamp(Utc::now())).await?)
	}
}

fn generate_token() -> String {
	let mut bytes = [0u8; TOKEN_BYTES];
	rand::thread_rng().fill_bytes(&mut bytes);
	hex::encode(bytes)
}

fn hash_token(token: &str) -> String {
	hex::encode(Sha256::digest(token.as_bytes()))
}

fn format_timestamp(at: DateTime<Utc>) -> String {
	at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn parse_timestamp(s: &str) -> Result<DateTime<Utc>> {
	DateTime::parse_from_rfc3339(s)
		.map(|dt| dt.with_timezone(&Utc))
		.map_err(|_| SessionError::Corrupt(format!("invalid expires_at: {s}")))
}
