//! Fully resolved pool addresses.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::IpAddr;

/// An allocatable address with every attribute resolved.
///
/// Serializes as `{ "ip": "...", "prefix_length": n, "gateway": "..." }`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ResolvedAddress {
    pub ip: IpAddr,
    pub prefix_length: u8,
    pub gateway: IpAddr,
}

impl ResolvedAddress {
    pub fn new(ip: IpAddr, prefix_length: u8, gateway: IpAddr) -> Self {
        Self {
            ip,
            prefix_length,
            gateway,
        }
    }
}

impl fmt::Display for ResolvedAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{} via {}", self.ip, self.prefix_length, self.gateway)
    }
}
