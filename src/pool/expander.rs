//! Address expansion.
//!
//! Turns a [`ValidatedPool`] into its [`Catalog`]: every range enumerated
//! ascending (inclusive of both endpoints), followed by every discrete
//! address, all in declaration order. The catalog size is bounded; a range
//! whose span would push the catalog past the limit is rejected before any
//! of it is materialized.
//!
//! Overlapping entries are not deduplicated here.

use super::normalize::{PoolEntry, ValidatedPool};
use crate::error::ValidationError;
use crate::ip::ResolvedAddress;
use crate::utils::ip_utils::{ip_range, range_len};
use serde::Serialize;

/// Ordered, fully expanded list of allocatable addresses for one pool
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Catalog {
    addresses: Vec<ResolvedAddress>,
}

impl Catalog {
    pub fn len(&self) -> usize {
        self.addresses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.addresses.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ResolvedAddress> {
        self.addresses.iter()
    }

    pub fn as_slice(&self) -> &[ResolvedAddress] {
        &self.addresses
    }
}

impl<'a> IntoIterator for &'a Catalog {
    type Item = &'a ResolvedAddress;
    type IntoIter = std::slice::Iter<'a, ResolvedAddress>;

    fn into_iter(self) -> Self::IntoIter {
        self.addresses.iter()
    }
}

/// Expand a validated pool into its catalog, holding at most
/// `max_catalog_size` addresses
pub fn expand(pool: &ValidatedPool, max_catalog_size: usize) -> Result<Catalog, ValidationError> {
    let mut addresses: Vec<ResolvedAddress> = Vec::new();

    for entry in &pool.entries {
        // Never negative: every push below is preceded by a bound check.
        let remaining = (max_catalog_size - addresses.len()) as u128;

        match *entry {
            PoolEntry::Range {
                from,
                to,
                prefix_length,
                gateway,
            } => {
                let span = range_len(from, to).unwrap_or(0);
                if span > remaining {
                    log::error!(
                        "Pool '{}': range {}-{} spans {} addresses, only {} of {} remain",
                        pool.name,
                        from,
                        to,
                        span,
                        remaining,
                        max_catalog_size
                    );
                    return Err(ValidationError::RangeTooLarge {
                        pool: pool.name.clone(),
                        from: from.to_string(),
                        to: to.to_string(),
                        limit: max_catalog_size,
                    });
                }

                addresses.reserve(span as usize);
                addresses.extend(
                    ip_range(from, to).map(|ip| ResolvedAddress::new(ip, prefix_length, gateway)),
                );
            }
            PoolEntry::Address(address) => {
                if remaining == 0 {
                    return Err(ValidationError::RangeTooLarge {
                        pool: pool.name.clone(),
                        from: address.ip.to_string(),
                        to: address.ip.to_string(),
                        limit: max_catalog_size,
                    });
                }
                addresses.push(address);
            }
        }
    }

    log::debug!("Pool '{}' expanded to {} addresses", pool.name, addresses.len());

    Ok(Catalog { addresses })
}
