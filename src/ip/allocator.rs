//! Allocation reconciliation.
//!
//! The [`Reconciler`] drives one allocation resource through its lifecycle:
//! Absent -> Allocated (create) -> Allocated' (update) -> Absent (delete).
//!
//! Assignment walks hosts in lexicographic order and the pool catalog in its
//! declared order, handing each new host the first address not already in
//! use. Hosts that already hold an address keep it across updates, even if
//! the pool definition changed underneath them. An update that cannot place
//! every new host fails as a whole and leaves the prior state untouched.

use super::address::ResolvedAddress;
use super::ledger::{AllocationLedger, SharedLedger};
use super::state::{AllocationRequest, AllocationState};
use crate::error::AllocationError;
use crate::pool::{Catalog, PoolRegistry, RegisteredPool};
use crate::utils::IdGenerator;
use std::collections::{BTreeMap, HashSet};
use std::net::IpAddr;
use std::sync::{Arc, PoisonError};

/// Reconciles allocation resources against a fixed set of pools
#[derive(Debug, Clone)]
pub struct Reconciler {
    pools: Arc<PoolRegistry>,
    ids: Arc<IdGenerator>,
    ledger: Option<SharedLedger>,
}

impl Reconciler {
    /// Reconciler without a shared ledger: each allocation only sees its own
    /// assignments
    pub fn new(pools: Arc<PoolRegistry>) -> Self {
        Self {
            pools,
            ids: Arc::new(IdGenerator::from_entropy()),
            ledger: None,
        }
    }

    /// Use `ids` for new allocation ids
    pub fn with_ids(mut self, ids: Arc<IdGenerator>) -> Self {
        self.ids = ids;
        self
    }

    /// Exclude addresses owned by other allocations recorded in `ledger`
    pub fn with_ledger(mut self, ledger: SharedLedger) -> Self {
        self.ledger = Some(ledger);
        self
    }

    pub fn pools(&self) -> &PoolRegistry {
        &self.pools
    }

    /// Allocate one address per requested host for a new resource
    pub fn create(&self, request: &AllocationRequest) -> Result<AllocationState, AllocationError> {
        log::debug!("Beginning create in pool '{}'", request.pool);

        let pool = self.lookup(&request.pool)?;
        let hosts: Vec<&str> = request.desired_hosts().into_iter().collect();

        if hosts.len() > pool.catalog.len() {
            return Err(AllocationError::InsufficientAddresses {
                pool: request.pool.clone(),
                requested: hosts.len(),
                available: pool.catalog.len(),
            });
        }

        let state = self.with_locked_ledger(|ledger| -> Result<AllocationState, AllocationError> {
            let id = self.fresh_id(ledger.as_deref());
            let reserved = reserved_by_others(ledger.as_deref(), &request.pool, &id);
            let assignments =
                assign_next_free(&request.pool, &pool.catalog, BTreeMap::new(), &hosts, &reserved)?;

            let state = AllocationState {
                id,
                pool: request.pool.clone(),
                assignments,
            };
            if let Some(ledger) = ledger {
                warn_on_conflicts(&state, &ledger.record(&state));
            }
            Ok(state)
        })?;

        log::info!(
            "Created allocation {} with {} hosts in pool '{}'",
            state.id,
            state.len(),
            state.pool
        );
        Ok(state)
    }

    /// Return the stored state unchanged
    pub fn read(&self, state: AllocationState) -> AllocationState {
        log::debug!("Read allocation {} in pool '{}'", state.id, state.pool);
        state
    }

    /// Reconcile `prior` against a new desired host set.
    ///
    /// Retained hosts keep their addresses, new hosts get the next free ones,
    /// and hosts no longer requested are dropped. On exhaustion nothing is
    /// written and `prior` stays authoritative.
    pub fn update(
        &self,
        request: &AllocationRequest,
        prior: &AllocationState,
    ) -> Result<AllocationState, AllocationError> {
        log::debug!("Beginning update of allocation {} in pool '{}'", prior.id, request.pool);

        let pool = self.lookup(&request.pool)?;
        if prior.pool != request.pool {
            log::warn!(
                "Allocation {} moves from pool '{}' to '{}'; existing hosts keep their addresses",
                prior.id,
                prior.pool,
                request.pool
            );
        }

        let desired = request.desired_hosts();
        let retained: BTreeMap<String, ResolvedAddress> = prior
            .assignments
            .iter()
            .filter(|(host, _)| desired.contains(host.as_str()))
            .map(|(host, address)| (host.clone(), *address))
            .collect();
        let new_hosts: Vec<&str> = desired
            .iter()
            .copied()
            .filter(|host| !prior.assignments.contains_key(*host))
            .collect();

        for (host, address) in &prior.assignments {
            if !desired.contains(host.as_str()) {
                log::debug!("Release IP of {}: {}", host, address.ip);
            }
        }

        let state = self.with_locked_ledger(|ledger| -> Result<AllocationState, AllocationError> {
            let reserved = reserved_by_others(ledger.as_deref(), &request.pool, &prior.id);
            let assignments =
                assign_next_free(&request.pool, &pool.catalog, retained, &new_hosts, &reserved)?;

            let state = AllocationState {
                id: prior.id.clone(),
                pool: request.pool.clone(),
                assignments,
            };
            if let Some(ledger) = ledger {
                warn_on_conflicts(&state, &ledger.record(&state));
            }
            Ok(state)
        })?;

        log::info!(
            "Updated allocation {}: {} hosts, {} newly assigned",
            state.id,
            state.len(),
            new_hosts.len()
        );
        Ok(state)
    }

    /// Remove an allocation; its addresses become free for future
    /// reconciliations
    pub fn delete(&self, state: AllocationState) {
        let released = self.with_locked_ledger(|ledger| {
            ledger.map_or(state.len(), |ledger| ledger.release(&state.id))
        });
        log::info!(
            "Deleted allocation {} in pool '{}', released {} addresses",
            state.id,
            state.pool,
            released
        );
    }

    /// Make a persisted allocation known to the ledger, so its addresses are
    /// not handed to anyone else. Returns addresses already owned by another
    /// allocation. Without a ledger this does nothing.
    pub fn adopt(&self, state: &AllocationState) -> Vec<IpAddr> {
        self.with_locked_ledger(|ledger| match ledger {
            Some(ledger) => {
                let conflicts = ledger.record(state);
                warn_on_conflicts(state, &conflicts);
                conflicts
            }
            None => Vec::new(),
        })
    }

    /// Per-pool count of addresses recorded in the ledger, if there is one
    pub fn ledger_stats(&self) -> Option<BTreeMap<String, usize>> {
        self.with_locked_ledger(|ledger| ledger.map(|ledger| ledger.allocation_stats()))
    }

    /// Draw ids until one owns nothing in `ledger`
    fn fresh_id(&self, ledger: Option<&AllocationLedger>) -> String {
        loop {
            let id = self.ids.next_id();
            match ledger {
                Some(ledger) if ledger.owns_any(&id) => {
                    log::debug!("Allocation id {} already owns addresses, drawing another", id);
                }
                _ => return id,
            }
        }
    }

    fn lookup(&self, name: &str) -> Result<&RegisteredPool, AllocationError> {
        self.pools
            .get(name)
            .ok_or_else(|| AllocationError::PoolNotFound(name.to_string()))
    }

    fn with_locked_ledger<T>(&self, f: impl FnOnce(Option<&mut AllocationLedger>) -> T) -> T {
        match &self.ledger {
            Some(ledger) => {
                let mut guard = ledger.lock().unwrap_or_else(PoisonError::into_inner);
                f(Some(&mut *guard))
            }
            None => f(None),
        }
    }
}

fn reserved_by_others(ledger: Option<&AllocationLedger>, pool: &str, id: &str) -> HashSet<IpAddr> {
    ledger
        .map(|ledger| ledger.held_by_others(pool, id))
        .unwrap_or_default()
}

/// Give each host in `new_hosts` the first catalog entry whose IP is neither
/// held by `assignments` nor `reserved`.
///
/// All-or-nothing: on exhaustion the error reports how many free entries were
/// found and no assignments are returned.
fn assign_next_free(
    pool: &str,
    catalog: &Catalog,
    mut assignments: BTreeMap<String, ResolvedAddress>,
    new_hosts: &[&str],
    reserved: &HashSet<IpAddr>,
) -> Result<BTreeMap<String, ResolvedAddress>, AllocationError> {
    let mut in_use: HashSet<IpAddr> = assignments.values().map(|address| address.ip).collect();
    in_use.extend(reserved.iter().copied());

    let mut candidates = catalog.iter();
    for (assigned, host) in new_hosts.iter().enumerate() {
        let Some(address) = candidates.find(|address| !in_use.contains(&address.ip)) else {
            log::warn!(
                "Pool '{}' ran out of free addresses after {} of {} new hosts",
                pool,
                assigned,
                new_hosts.len()
            );
            return Err(AllocationError::InsufficientAddresses {
                pool: pool.to_string(),
                requested: new_hosts.len(),
                available: assigned,
            });
        };

        in_use.insert(address.ip);
        log::debug!("Allocate IP to {}: {}", host, address.ip);
        assignments.insert(host.to_string(), *address);
    }

    Ok(assignments)
}

fn warn_on_conflicts(state: &AllocationState, conflicts: &[IpAddr]) {
    for ip in conflicts {
        log::warn!(
            "Allocation {} holds {} in pool '{}', which another allocation already owns",
            state.id,
            ip,
            state.pool
        );
    }
}
