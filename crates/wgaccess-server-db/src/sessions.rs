// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Session repository. Only token hashes are stored.

use async_trait::async_trait;
use sqlx::sqlite::SqlitePool;

use crate::error::DbError;

/// `(id, token_hash, subject, nonce, created_at, expires_at)`
pub type SessionRowTuple = (
	String,
	String,
	Option<String>,
	Option<String>,
	String,
	String,
);

#[derive(Debug, Clone, Copy)]
pub struct NewSessionRow<'a> {
	pub id: &'a str,
	pub token_hash: &'a str,
	pub subject: Option<&'a str>,
	pub nonce: Option<&'a str>,
	pub created_at: &'a str,
	pub expires_at: &'a str,
}

#[derive(Clone)]
pub struct SessionRepository {
	pool: SqlitePool,
}

impl SessionRepository {
	pub fn new(pool: SqlitePool) -> Self {
		Self { pool }
	}

	#[tracing::instrument(skip(self, row), fields(id = %row.id))]
	pub async fn insert_session(&self, row: NewSessionRow<'_>) -> Result<(), DbError> {
		sqlx::query(
			"INSERT INTO sessions (id, token_hash, subject, nonce, created_at, expires_at)
			 VALUES (?, ?, ?, ?, ?, ?)",
		)
		.bind(row.id)
		.bind(row.token_hash)
		.bind(row.subject)
		.bind(row.nonce)
		.bind(row.created_at)
		.bind(row.expires_at)
		.execute(&self.pool)
		.await?;

		Ok(())
	}

	#[tracing::instrument(skip_all)]
	pub async fn get_session_by_token_hash(
		&self,
		token_hash: &str,
	) -> Result<Option<SessionRowTuple>, DbError> {
		let row: Option<SessionRowTuple> = sqlx::query_as(
			"SELECT id, token_hash, subject, nonce, created_at, expires_at
			 FROM sessions WHERE token_hash = ?",
		)
		.bind(token_hash)
		.fetch_optional(&self.pool)
		.await?;

		Ok(row)
	}

	#[tracing::instrument(skip_all)]
	pub async fn delete_session_by_token_hash(&self, token_hash: &str) -> Result<u64, DbError> {
		let result = sqlx::query("DELETE FROM sessions WHERE token_hash = ?")
			.bind(token_hash)
			.execute(&self.pool)
			.await?;

		Ok(result.rows_affected())
	}

	/// Delete sessions whose `expires_at` is at or before `now` (RFC 3339, UTC).
	#[tracing::instrument(skip(self))]
	pub async fn delete_expired_sessions(&self, now: &str) -> Result<u64, DbError> {
		let result = sqlx::query("DELETE FROM sessions WHERE expires_at <= ?")
			.bind(now)
			.execute(&self.pool)
			.await?;

		Ok(result.rows_affected())
	}
}

#[async_trait]
pub trait SessionStore: Send + Sync {
	async fn insert_session(&self, row: NewSessionRow<'_>) -> Result<(), DbError>;
	async fn get_session_by_token_hash(
		&self,
		token_hash: &str,
	) -> Result<Option<SessionRowTuple>, DbError>;
	async fn delete_session_by_token_hash(&self, token_hash: &str) -> Result<u64, DbError>;
	async fn delete_expired_sessions(&self, now: &str) -> Result<u64, DbError>;
}

#[async_trait]
impl SessionStore for SessionRepository {
	async fn insert_session(&self, row: NewSessionRow<'_>) -> Result<(), DbError> {
		self.insert_session(row).await
	}

	async fn get_session_by_token_hash(
		&self,
		token_hash: &str,
	) -> Result<Option<SessionRowTuple>, DbError> {
		self.get_session_by_token_hash(token_hash).await
	}

	async fn delete_session_by_token_hash(&self, token_hash: &str) -> Result<u64, DbError> {
		self.delete_session_by_token_hash(token_hash).await
	}

	async fn delete_expired_sessions(&self, now: &str) -> Result<u64, DbError> {
		self.delete_expired_sessions(now).await
	}
}
