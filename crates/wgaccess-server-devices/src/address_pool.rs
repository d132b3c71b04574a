// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Client address allocation within the VPN subnet.
//!
//! The pool holds no state of its own: the set of used addresses is passed in
//! on every call, so the registry stays the only source of truth. Callers that
//! allocate concurrently must serialise list-allocate-save themselves.

use std::collections::HashSet;
use std::net::Ipv4Addr;

use ipnet::Ipv4Net;

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("no free addresses left in {subnet}")]
pub struct PoolExhausted {
	pub subnet: Ipv4Net,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AddressPool {
	subnet: Ipv4Net,
}

impl AddressPool {
	pub fn new(subnet: Ipv4Net) -> Self {
		Self {
			subnet: subnet.trunc(),
		}
	}

	pub fn subnet(&self) -> Ipv4Net {
		self.subnet
	}

	/// The first host address, reserved for the server side of the tunnel.
	pub fn gateway(&self) -> Ipv4Addr {
		Ipv4Addr::from(u32::from(self.subnet.network()).saturating_add(1))
	}

	/// Whether `addr` may ever be handed to a client.
	pub fn contains(&self, addr: Ipv4Addr) -> bool {
		let (network, broadcast) = self.bounds();
		let value = u32::from(addr);
		value > network.saturating_add(1) && value < broadcast
	}

	/// Lowest free client address as a `/32`.
	///
	/// `used` entries may be single-host CIDRs or bare addresses; entries that
	/// do not parse cannot collide with a candidate and are ignored.
	pub fn allocate<'a, I>(&self, used: I) -> Result<Ipv4Net, PoolExhausted>
	where
		I: IntoIterator<Item = &'a str>,
	{
		let used: HashSet<u32> = used
			.into_iter()
			.filter_map(parse_host)
			.map(u32::from)
			.collect();

		let (network, broadcast) = self.bounds();
		let gateway = network.saturating_add(1);

		(network..=broadcast)
			.filter(|candidate| *candidate != network && *candidate != gateway && *candidate != broadcast)
			.find(|candidate| !used.contains(candidate))
			.map(|candidate| Ipv4Net::from(Ipv4Addr::from(candidate)))
			.ok_or(PoolExhausted {
				subnet: self.subnet,
			})
	}

	/// Number of addresses clients can be given in total.
	pub fn capacity(&self) -> u64 {
		let (network, broadcast) = self.bounds();
		(u64::from(broadcast) - u64::from(network) + 1).saturating_sub(3)
	}

	fn bounds(&self) -> (u32, u32) {
		(
			u32::from(self.subnet.network()),
			u32::from(self.subnet.broadcast()),
		)
	}
}

fn parse_host(entry: &str) -> Option<Ipv4Addr> {
	let entry = entry.trim();
	entry
		.parse::<Ipv4Net>()
		.map(|net| net.addr())
		.or_else(|_| entry.parse::<Ipv4Addr>())
		.ok()
}

#[cfg(test)]
mod tests {
	use super::*;
	use proptest::prelude::*;

	fn pool(cidr: &str) -> AddressPool {
		AddressPool::new(cidr.parse().unwrap())
	}

	#[test]
	fn empty_pool_starts_after_gateway() {
		let next = pool("10.0.0.0/24").allocate(std::iter::empty()).unwrap();
		assert_eq!(next.to_string(), "10.0.0.2/32");
	}

	#[test]
	fn returns_lowest_free_address() {
		let next = pool("10.0.0.0/24")
			.allocate(["10.0.0.2/32", "10.0.0.3/32"])
			.unwrap();
		assert_eq!(next.to_string(), "10.0.0.4/32");
	}

	#[test]
	fn fills_gaps_first() {
		let next = pool("10.0.0.0/24")
			.allocate(["10.0.0.2/32", "10.0.0.4/32", "10.0.0.5/32"])
			.unwrap();
		assert_eq!(next.to_string(), "10.0.0.3/32");
	}

	#[test]
	fn gateway_entries_in_used_set_are_harmless() {
		let next = pool("10.0.0.0/24")
			.allocate(["10.0.0.1/32", "10.0.0.2/32"])
			.unwrap();
		assert_eq!(next.to_string(), "10.0.0.3/32");
	}

	#[test]
	fn accepts_bare_addresses_and_ignores_garbage() {
		let next = pool("10.0.0.0/24")
			.allocate(["10.0.0.2", "not-an-address", ""])
			.unwrap();
		assert_eq!(next.to_string(), "10.0.0.3/32");
	}

	#[test]
	fn never_returns_broadcast() {
		let p = pool("10.0.0.0/24");
		let used: Vec<String> = (2..=254).map(|i| format!("10.0.0.{i}/32")).collect();
		let err = p.allocate(used.iter().map(String::as_str)).unwrap_err();
		assert_eq!(err.subnet.to_string(), "10.0.0.0/24");
	}

	#[test]
	fn smallest_subnet_has_one_client_address() {
		let p = pool("10.0.0.0/30");
		assert_eq!(p.capacity(), 1);
		assert_eq!(
			p.allocate(std::iter::empty()).unwrap().to_string(),
			"10.0.0.2/32"
		);
		assert!(p.allocate(["10.0.0.2/32"]).is_err());
	}

	#[test]
	fn walk_carries_across_octets() {
		let p = pool("10.0.0.0/23");
		let used: Vec<String> = (2..=255).map(|i| format!("10.0.0.{i}/32")).collect();
		let next = p.allocate(used.iter().map(String::as_str)).unwrap();
		assert_eq!(next.to_string(), "10.0.1.0/32");
	}

	#[test]
	fn host_bits_in_subnet_are_ignored() {
		let p = pool("10.0.0.1/24");
		assert_eq!(p.subnet().to_string(), "10.0.0.0/24");
		assert_eq!(p.gateway(), Ipv4Addr::new(10, 0, 0, 1));
	}

	#[test]
	fn contains_excludes_reserved_and_outside() {
		let p = pool("10.0.0.0/24");
		assert!(!p.contains(Ipv4Addr::new(10, 0, 0, 0)));
		assert!(!p.contains(Ipv4Addr::new(10, 0, 0, 1)));
		assert!(!p.contains(Ipv4Addr::new(10, 0, 0, 255)));
		assert!(!p.contains(Ipv4Addr::new(10, 0, 1, 2)));
		assert!(p.contains(Ipv4Addr::new(10, 0, 0, 2)));
		assert!(p.contains(Ipv4Addr::new(10, 0, 0, 254)));
	}

	proptest! {
		#[test]
		fn allocation_is_lowest_free_and_allocatable(
			taken in proptest::collection::btree_set(2u32..254, 0..200)
		) {
			let p = pool("10.0.0.0/24");
			let used: Vec<String> = taken.iter().map(|i| format!("10.0.0.{i}/32")).collect();
			let next = p.allocate(used.iter().map(String::as_str)).unwrap();
			let host = u32::from(next.addr()) & 0xff;

			prop_assert_eq!(next.prefix_len(), 32);
			prop_assert!(p.contains(next.addr()));
			prop_assert!(!taken.contains(&host));
			prop_assert!((2..host).all(|lower| taken.contains(&lower)));
		}

		#[test]
		fn repeated_allocation_yields_distinct_addresses(count in 1usize..60) {
			let p = pool("10.1.0.0/26");
			let mut used: Vec<String> = Vec::new();
			for _ in 0..count.min(p.capacity() as usize) {
				let next = p.allocate(used.iter().map(String::as_str)).unwrap();
				prop_assert!(!used.contains(&next.to_string()));
				used.push(next.to_string());
			}
		}
	}
}
