// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use thiserror::Error;
use wgaccess_server_db::DbError;

#[derive(Debug, Error)]
pub enum SessionError {
	/// No session token was presented, or it does not match a live session.
	#[error("session not authenticated")]
	NotAuthenticated,

	/// The session exists but carries no identity.
	#[error("unauthenticated")]
	Unauthenticated,

	#[error("corrupt session record: {0}")]
	Corrupt(String),

	#[error("session store error: {0}")]
	Store(#[from] DbError),
}

impl SessionError {
	/// Whether the caller simply lacks credentials, as opposed to a server fault.
	pub fn is_auth_failure(&self) -> bool {
		matches!(self, Self::NotAuthenticated | Self::Unauthenticated)
	}
}

pub type Result<T> = std::result::Result<T, SessionError>;
