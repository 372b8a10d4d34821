//! Validated pool registry.
//!
//! The registry is the immutable, name-indexed result of loading a pool
//! configuration: each pool validated and expanded exactly once. It is built
//! before any reconciliation runs and shared read-only afterwards.

use super::expander::{expand, Catalog};
use super::normalize::{validate_pool, ValidatedPool};
use crate::config::{PoolSpec, Settings};
use crate::error::ValidationError;
use std::collections::HashMap;

/// A validated pool together with its expanded catalog
#[derive(Debug, Clone)]
pub struct RegisteredPool {
    pub pool: ValidatedPool,
    pub catalog: Catalog,
}

impl RegisteredPool {
    pub fn name(&self) -> &str {
        &self.pool.name
    }
}

/// Every configured pool, in declaration order, indexed by name
#[derive(Debug, Clone, Default)]
pub struct PoolRegistry {
    pools: Vec<RegisteredPool>,
    index: HashMap<String, usize>,
}

impl PoolRegistry {
    /// Validate and expand every pool.
    ///
    /// Fails on the first invalid pool, in declaration order. A pool whose
    /// name was already used fails with `DuplicatePool` before its contents
    /// are looked at.
    pub fn build(specs: &[PoolSpec], settings: &Settings) -> Result<Self, ValidationError> {
        let mut registry = PoolRegistry::default();

        for spec in specs {
            if registry.index.contains_key(&spec.name) {
                return Err(ValidationError::DuplicatePool(spec.name.clone()));
            }

            let pool = validate_pool(spec)?;
            let catalog = expand(&pool, settings.max_catalog_size)?;
            log::info!(
                "Registered pool '{}' with {} allocatable addresses",
                pool.name,
                catalog.len()
            );

            registry.index.insert(pool.name.clone(), registry.pools.len());
            registry.pools.push(RegisteredPool { pool, catalog });
        }

        Ok(registry)
    }

    /// Look up a pool by name
    pub fn get(&self, name: &str) -> Option<&RegisteredPool> {
        self.index.get(name).map(|&i| &self.pools[i])
    }

    /// Catalog of the named pool
    pub fn catalog(&self, name: &str) -> Option<&Catalog> {
        self.get(name).map(|registered| &registered.catalog)
    }

    /// Pools in declaration order
    pub fn iter(&self) -> impl Iterator<Item = &RegisteredPool> {
        self.pools.iter()
    }

    pub fn len(&self) -> usize {
        self.pools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pools.is_empty()
    }
}
