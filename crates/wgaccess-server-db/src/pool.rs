// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqliteSynchronous};
use std::str::FromStr;

use crate::error::DbError;

const MIGRATIONS: &[(&str, &str)] = &[
	(
		"devices",
		r#"
		CREATE TABLE IF NOT EXISTS devices (
			name TEXT PRIMARY KEY,
			public_key TEXT NOT NULL,
			address TEXT NOT NULL UNIQUE,
			endpoint TEXT NOT NULL,
			dns TEXT NOT NULL,
			server_public_key TEXT NOT NULL,
			created_at TEXT NOT NULL
		)
		"#,
	),
	(
		"idx_devices_public_key",
		"CREATE UNIQUE INDEX IF NOT EXISTS idx_devices_public_key ON devices(public_key)",
	),
	(
		"sessions",
		r#"
		CREATE TABLE IF NOT EXISTS sessions (
			id TEXT PRIMARY KEY,
			token_hash TEXT NOT NULL UNIQUE,
			subject TEXT,
			nonce TEXT,
			created_at TEXT NOT NULL,
			expires_at TEXT NOT NULL
		)
		"#,
	),
	(
		"idx_sessions_expires_at",
		"CREATE INDEX IF NOT EXISTS idx_sessions_expires_at ON sessions(expires_at)",
	),
];

/// Create a SqlitePool with WAL mode and common settings.
///
/// # Arguments
/// * `database_url` - SQLite connection string (e.g., "sqlite:./wgaccess.db")
///
/// # Errors
/// Returns `DbError::Internal` if the URL is invalid or connection fails.
#[tracing::instrument(skip(database_url))]
pub async fn create_pool(database_url: &str) -> Result<SqlitePool, DbError> {
	let options = SqliteConnectOptions::from_str(database_url)
		.map_err(|e| DbError::Internal(format!("Invalid database URL: {e}")))?
		.journal_mode(SqliteJournalMode::Wal)
		.synchronous(SqliteSynchronous::Normal)
		.create_if_missing(true);

	let pool = SqlitePool::connect_with(options).await?;

	tracing::debug!("database pool created");
	Ok(pool)
}

/// Create the schema. Safe to run on every start.
#[tracing::instrument(skip(pool))]
pub async fn run_migrations(pool: &SqlitePool) -> Result<(), DbError> {
	for &(name, statement) in MIGRATIONS {
		sqlx::query(statement).execute(pool).await?;
		tracing::trace!(migration = name, "applied migration");
	}

	tracing::debug!(count = MIGRATIONS.len(), "migrations applied");
	Ok(())
}
