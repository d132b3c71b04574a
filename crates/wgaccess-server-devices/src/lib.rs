// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Device lifecycle for the wgaccess server.
//!
//! [`DeviceManager`] coordinates three collaborators:
//! - [`AddressPool`] picks the lowest free client address in the subnet.
//! - [`DeviceRegistry`] durably stores device records.
//! - [`PeerGateway`] applies peers to the live tunnel interface.

pub mod address_pool;
pub mod error;
pub mod gateway;
mod locks;
pub mod manager;
pub mod registry;
mod sync;
pub mod testing;
pub mod types;

pub use address_pool::{AddressPool, PoolExhausted};
pub use error::{DeviceError, GatewayError, RegistryError, Result};
pub use gateway::{CommandGateway, MemoryGateway, PeerGateway, ServerInfo};
pub use manager::{DeviceManager, DEFAULT_PEER_TIMEOUT};
pub use registry::{DeviceRegistry, SqliteDeviceRegistry};
pub use types::{Device, LivePeer, SyncReport};
