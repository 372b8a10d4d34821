//! IP address allocation and management module.
//!
//! This module hands out addresses from validated pools to named hosts and
//! keeps those assignments stable across reconciliations. An optional ledger
//! prevents separate allocations from claiming the same address.

pub mod address;
pub mod allocator;
pub mod ledger;
pub mod state;

// Re-export commonly used types
pub use address::ResolvedAddress;
pub use allocator::Reconciler;
pub use ledger::{AllocationLedger, SharedLedger};
pub use state::{AllocationRequest, AllocationState};
