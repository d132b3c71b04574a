// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! WireGuard access server.
//!
//! HTTP and CLI adapters over the device lifecycle manager, plus the periodic
//! reconciliation job.

pub mod api;
pub mod api_response;
pub mod auth_middleware;
pub mod error;
pub mod gateway;
pub mod jobs;
pub mod routes;

pub use api::{create_app_state, create_router, AppState};
pub use error::ServerError;
pub use gateway::build_gateway;
pub use wgaccess_server_config::ServerConfig;
