use crate::error::ValidationError;
use crate::pool::PoolRegistry;
use serde::{Deserialize, Serialize};

/// Default upper bound on the number of addresses one pool may expand to
pub const DEFAULT_MAX_CATALOG_SIZE: usize = 65_536;

/// Top-level pool configuration that mirrors the YAML file
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Maximum catalog size per pool (falls back to DEFAULT_MAX_CATALOG_SIZE)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_catalog_size: Option<usize>,
    /// Managed IP pools, in declaration order
    #[serde(default)]
    pub pools: Vec<PoolSpec>,
}

impl Config {
    /// Resolve engine settings from the configuration
    pub fn settings(&self) -> Settings {
        Settings {
            max_catalog_size: self.max_catalog_size.unwrap_or(DEFAULT_MAX_CATALOG_SIZE),
        }
    }

    /// Validate every pool and expand its catalog.
    ///
    /// Stops at the first problem found, in pool declaration order.
    pub fn validate(&self) -> Result<PoolRegistry, ValidationError> {
        PoolRegistry::build(&self.pools, &self.settings())
    }
}

/// Engine settings derived from configuration and CLI overrides
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Settings {
    pub max_catalog_size: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            max_catalog_size: DEFAULT_MAX_CATALOG_SIZE,
        }
    }
}

/// A named pool of allocatable addresses, exactly as written by the user
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct PoolSpec {
    pub name: String,
    /// Default prefix length for ranges and addresses that omit one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prefix_length: Option<i64>,
    /// Default gateway for ranges and addresses that omit one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gateway: Option<String>,
    #[serde(default)]
    pub ranges: Vec<RangeSpec>,
    #[serde(default)]
    pub addresses: Vec<AddressSpec>,
}

/// Inclusive from/to span of addresses
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct RangeSpec {
    pub from_ip: String,
    pub to_ip: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prefix_length: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gateway: Option<String>,
}

/// A single explicitly listed address
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct AddressSpec {
    pub ip: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prefix_length: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gateway: Option<String>,
}
