// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Session-based authentication for the wgaccess server.

pub mod cookies;
pub mod error;
pub mod guard;
pub mod session;

pub use cookies::{extract_bearer_token, extract_session_cookie_with_name, extract_session_token};
pub use error::{Result, SessionError};
pub use guard::{IssuedSession, SessionGuard, DEV_SUBJECT};
pub use session::{AuthSession, Identity};
