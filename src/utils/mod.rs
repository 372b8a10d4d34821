//! Shared utilities: IP address arithmetic and identifier generation.

pub mod id;
pub mod ip_utils;

pub use id::IdGenerator;
pub use ip_utils::{ip_range, next_ip, range_len, same_family};
