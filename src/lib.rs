//! # IPAM - IP pool allocation engine
//!
//! This library manages finite pools of IP addresses and assigns exactly one
//! address from a pool to each of a set of named hosts, keeping assignments
//! stable across repeated reconciliation passes.
//!
//! ## Overview
//!
//! A pool is a named set of address ranges and discrete addresses, with
//! default prefix length and gateway values that entries can inherit. The
//! engine validates pools, expands them into a deterministic catalog of
//! concrete addresses, and reconciles a desired host set against previously
//! persisted allocation state.
//!
//! ## Key Features
//!
//! - **Fail-fast validation**: Malformed IPs, prefix lengths, missing defaults and reversed ranges are reported with a structured diagnostic
//! - **Deterministic catalogs**: Ranges expand ascending in declaration order, followed by discrete addresses
//! - **Bounded expansion**: A configurable catalog size limit guards against enormous IPv6 ranges
//! - **Sticky allocation**: Hosts keep their address across updates, new hosts get the next free one
//! - **All-or-nothing updates**: Exhaustion never leaves a half-applied state
//! - **Optional ledger**: Allocations sharing a pool can be kept from double-allocating
//!
//! ## Architecture
//!
//! The library is organized into several modules:
//!
//! - `config`: Raw pool configuration structures (YAML)
//! - `config_loader`: Configuration file loading, overrides and validation
//! - `pool`: Normalization, expansion and the validated pool registry
//! - `ip`: Resolved addresses, allocation state, the reconciler and the ledger
//! - `orchestrator`: State file persistence around reconciliation
//! - `error`: Validation and allocation error taxonomy
//! - `utils`: IP arithmetic and identifier generation
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use ipam::config_loader::{load_registry, ConfigOverrides};
//! use ipam::ip::{AllocationRequest, Reconciler};
//! use std::path::Path;
//! use std::sync::Arc;
//!
//! let pools = load_registry(Path::new("pools.yaml"), &ConfigOverrides::default())?;
//! let reconciler = Reconciler::new(Arc::new(pools));
//!
//! let request = AllocationRequest::new("POOL1", ["host1", "host2"]);
//! let state = reconciler.create(&request)?;
//!
//! // Later: add a host, existing hosts keep their addresses
//! let request = AllocationRequest::new("POOL1", ["host1", "host2", "host3"]);
//! let state = reconciler.update(&request, &state)?;
//! # Ok::<(), color_eyre::Report>(())
//! ```
//!
//! ## Configuration Format
//!
//! ```yaml
//! max_catalog_size: 65536   # optional
//! pools:
//!   - name: "POOL1"
//!     prefix_length: 24
//!     gateway: "10.1.1.254"
//!     ranges:
//!       - from_ip: "10.1.1.1"
//!         to_ip: "10.1.1.50"
//!       - from_ip: "10.1.2.1"
//!         to_ip: "10.1.2.9"
//!         prefix_length: 23
//!         gateway: "10.1.2.254"
//!     addresses:
//!       - ip: "10.1.3.7"
//! ```
//!
//! ## Error Handling
//!
//! Engine operations return typed errors (`ValidationError`,
//! `AllocationError`) built with `thiserror`. File-facing helpers and the
//! binary use `color_eyre` for error reporting with context.

pub mod config;
pub mod config_loader;
pub mod error;
pub mod ip;
pub mod orchestrator;
pub mod pool;
pub mod utils;

pub use error::{AllocationError, Diagnostic, ValidationError};
