//! Pool model: validation, expansion and the validated pool registry.
//!
//! A raw [`crate::config::PoolSpec`] flows through [`normalize`] into a typed
//! [`ValidatedPool`], then through [`expander`] into an ordered [`Catalog`].
//! [`PoolRegistry`] holds the results for every configured pool.

pub mod expander;
pub mod normalize;
pub mod registry;

// Re-export commonly used types
pub use expander::{expand, Catalog};
pub use normalize::{validate_pool, PoolEntry, ValidatedPool};
pub use registry::{PoolRegistry, RegisteredPool};
