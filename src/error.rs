//! Error taxonomy for pool validation and allocation.
//!
//! Two families of failures exist:
//!
//! - [`ValidationError`]: raised while loading a pool configuration. Any of
//!   these blocks every operation on the configuration that produced it.
//! - [`AllocationError`]: raised by a single reconciliation call. It only
//!   affects the allocation resource being reconciled.
//!
//! Both convert into a flat [`Diagnostic`] (`kind` + `detail`) for callers that
//! surface errors verbatim to an end user.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Pool configuration validation errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("Invalid '{field}' configured: '{value}' is not a valid IP address")]
    InvalidAddress { field: &'static str, value: String },

    #[error("Invalid 'prefix_length' configured: {0} must be a number between 0 and 128")]
    InvalidPrefixLength(i64),

    #[error("{0} has no 'prefix_length' configured and its pool has no default")]
    MissingPrefixLength(String),

    #[error("{0} has no 'gateway' configured and its pool has no default")]
    MissingGateway(String),

    #[error("Invalid range '{from}-{to}': 'from_ip' must not be greater than 'to_ip' and both must share an address family")]
    InvalidRangeOrder { from: String, to: String },

    #[error("Pool '{pool}': range '{from}-{to}' would grow the catalog beyond {limit} addresses")]
    RangeTooLarge {
        pool: String,
        from: String,
        to: String,
        limit: usize,
    },

    #[error("Pool '{0}' is defined more than once")]
    DuplicatePool(String),
}

impl ValidationError {
    /// Taxonomy name of this error
    pub fn kind(&self) -> &'static str {
        match self {
            ValidationError::InvalidAddress { .. } => "InvalidAddress",
            ValidationError::InvalidPrefixLength(_) => "InvalidPrefixLength",
            ValidationError::MissingPrefixLength(_) => "MissingPrefixLength",
            ValidationError::MissingGateway(_) => "MissingGateway",
            ValidationError::InvalidRangeOrder { .. } => "InvalidRangeOrder",
            ValidationError::RangeTooLarge { .. } => "RangeTooLarge",
            ValidationError::DuplicatePool(_) => "DuplicatePool",
        }
    }
}

/// Per-resource allocation errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AllocationError {
    #[error("Pool '{0}' not found")]
    PoolNotFound(String),

    #[error("Pool '{pool}' does not have enough IP addresses: requested {requested}, available {available}")]
    InsufficientAddresses {
        pool: String,
        requested: usize,
        available: usize,
    },
}

impl AllocationError {
    /// Taxonomy name of this error
    pub fn kind(&self) -> &'static str {
        match self {
            AllocationError::PoolNotFound(_) => "PoolNotFound",
            AllocationError::InsufficientAddresses { .. } => "InsufficientAddresses",
        }
    }
}

/// Flat, serializable form of an engine error
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub kind: String,
    pub detail: String,
}

impl From<&ValidationError> for Diagnostic {
    fn from(error: &ValidationError) -> Self {
        Diagnostic {
            kind: error.kind().to_string(),
            detail: error.to_string(),
        }
    }
}

impl From<&AllocationError> for Diagnostic {
    fn from(error: &AllocationError) -> Self {
        Diagnostic {
            kind: error.kind().to_string(),
            detail: error.to_string(),
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.detail)
    }
}
