// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! SQLite persistence for the wgaccess server.

pub mod devices;
pub mod error;
pub mod pool;
pub mod sessions;
pub mod testing;

pub use devices::{DeviceRepository, DeviceRowTuple, DeviceStore, NewDeviceRow};
pub use error::{DbError, Result};
pub use pool::{create_pool, run_migrations};
pub use sessions::{NewSessionRow, SessionRepository, SessionRowTuple, SessionStore};
pub use sqlx::SqlitePool;
