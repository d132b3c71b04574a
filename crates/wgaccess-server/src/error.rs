// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use thiserror::Error;
use wgaccess_server_devices::GatewayError;

/// Failures while assembling the server from its configuration.
#[derive(Debug, Error)]
pub enum ServerError {
	#[error("peer gateway error: {0}")]
	Gateway(#[from] GatewayError),

	#[error("{0}")]
	Misconfigured(String),
}
