//! Allocation requests and persisted allocation state.

use super::address::ResolvedAddress;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::net::IpAddr;

/// Desired outcome of one reconciliation: which hosts need an address from
/// which pool
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AllocationRequest {
    pub pool: String,
    pub hosts: Vec<String>,
}

impl AllocationRequest {
    pub fn new<I, S>(pool: impl Into<String>, hosts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            pool: pool.into(),
            hosts: hosts.into_iter().map(Into::into).collect(),
        }
    }

    /// Requested hosts in lexicographic order with duplicates collapsed.
    /// Assignment always walks hosts in this order.
    pub fn desired_hosts(&self) -> BTreeSet<&str> {
        self.hosts.iter().map(String::as_str).collect()
    }
}

/// Host to address mapping owned by one allocation resource
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AllocationState {
    /// Opaque id, assigned on first creation and never changed
    pub id: String,
    /// Name of the pool the addresses were drawn from
    pub pool: String,
    #[serde(rename = "hosts", default)]
    pub assignments: BTreeMap<String, ResolvedAddress>,
}

impl AllocationState {
    /// Address assigned to `host`, if any
    pub fn address_of(&self, host: &str) -> Option<&ResolvedAddress> {
        self.assignments.get(host)
    }

    /// All IPs held by this state
    pub fn ips(&self) -> impl Iterator<Item = IpAddr> + '_ {
        self.assignments.values().map(|address| address.ip)
    }

    pub fn len(&self) -> usize {
        self.assignments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assignments.is_empty()
    }
}
