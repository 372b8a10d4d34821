//! Pool-scoped allocation ledger.
//!
//! An allocation state only knows its own assignments, so two states drawn
//! from the same pool can pick the same address. The ledger records which
//! state owns which address in each pool. A reconciler built with a ledger
//! treats every address owned by another state as in use.
//!
//! The ledger lives behind a mutex and is shared through [`SharedLedger`].
//! Reconcilers hold the lock for the whole read-compute-write of one call.

use super::state::AllocationState;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::net::IpAddr;
use std::sync::{Arc, Mutex};

/// Ledger shared by every reconciler that must not double-allocate
pub type SharedLedger = Arc<Mutex<AllocationLedger>>;

/// Tracks address ownership across allocation states
#[derive(Debug, Default)]
pub struct AllocationLedger {
    /// Pool name -> IP -> owning allocation id
    pools: HashMap<String, HashMap<IpAddr, String>>,
}

impl AllocationLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Empty ledger ready to be handed to reconcilers
    pub fn shared() -> SharedLedger {
        Arc::new(Mutex::new(Self::new()))
    }

    /// Addresses in `pool` owned by any allocation other than `id`
    pub fn held_by_others(&self, pool: &str, id: &str) -> HashSet<IpAddr> {
        self.pools
            .get(pool)
            .map(|owners| {
                owners
                    .iter()
                    .filter(|(_, owner)| owner.as_str() != id)
                    .map(|(ip, _)| *ip)
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Allocation id that owns `ip` in `pool`
    pub fn owner_of(&self, pool: &str, ip: IpAddr) -> Option<&str> {
        self.pools
            .get(pool)
            .and_then(|owners| owners.get(&ip))
            .map(String::as_str)
    }

    /// Whether allocation `id` owns any address in any pool
    pub fn owns_any(&self, id: &str) -> bool {
        self.pools
            .values()
            .any(|owners| owners.values().any(|owner| owner == id))
    }

    /// Replace everything recorded for `state.id` with the state's current
    /// assignments.
    ///
    /// Addresses already owned by a different allocation are left with their
    /// owner and returned as conflicts.
    pub fn record(&mut self, state: &AllocationState) -> Vec<IpAddr> {
        self.release(&state.id);

        let owners = self.pools.entry(state.pool.clone()).or_default();
        let mut conflicts = Vec::new();
        for ip in state.ips() {
            let owned_elsewhere = owners.get(&ip).is_some_and(|owner| owner != &state.id);
            if owned_elsewhere {
                conflicts.push(ip);
            } else {
                owners.insert(ip, state.id.clone());
            }
        }
        conflicts
    }

    /// Forget every address owned by allocation `id`, returning how many
    /// were released
    pub fn release(&mut self, id: &str) -> usize {
        let mut released = 0;
        for owners in self.pools.values_mut() {
            let before = owners.len();
            owners.retain(|_, owner| owner != id);
            released += before - owners.len();
        }
        self.pools.retain(|_, owners| !owners.is_empty());
        released
    }

    /// Number of owned addresses per pool
    pub fn allocation_stats(&self) -> BTreeMap<String, usize> {
        self.pools
            .iter()
            .map(|(pool, owners)| (pool.clone(), owners.len()))
            .collect()
    }
}
