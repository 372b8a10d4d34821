//! Pool configuration normalization and validation.
//!
//! Turns a raw [`PoolSpec`] into a [`ValidatedPool`]: every IP literal parsed,
//! every prefix length range-checked, and every range or address resolved
//! against the pool defaults. Validation is fail-fast: the first problem in
//! declaration order is returned.
//!
//! Per entry, checks run in this order:
//! 1. own `prefix_length` is in range
//! 2. a `prefix_length` resolves (own or pool default)
//! 3. own `gateway` parses
//! 4. a `gateway` resolves (own or pool default)
//! 5. the entry's IP literals parse
//! 6. ranges are ordered and single-family

use crate::config::PoolSpec;
use crate::error::ValidationError;
use crate::ip::ResolvedAddress;
use crate::utils::ip_utils::{range_len, same_family};
use std::net::IpAddr;

/// Largest prefix length accepted for any address family
pub const MAX_PREFIX_LENGTH: i64 = 128;

/// One typed, fully resolved pool entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PoolEntry {
    /// Inclusive range; `from <= to` and both share a family
    Range {
        from: IpAddr,
        to: IpAddr,
        prefix_length: u8,
        gateway: IpAddr,
    },
    /// Single discrete address
    Address(ResolvedAddress),
}

/// A pool that passed validation.
///
/// `entries` holds every range in declaration order followed by every
/// discrete address in declaration order, which is also catalog order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedPool {
    pub name: String,
    pub entries: Vec<PoolEntry>,
}

/// Pool-level defaults inherited by ranges and addresses
#[derive(Debug, Clone, Copy)]
struct Defaults {
    prefix_length: Option<u8>,
    gateway: Option<IpAddr>,
}

impl Defaults {
    fn resolve(
        &self,
        subject: &str,
        prefix_length: Option<i64>,
        gateway: Option<&str>,
    ) -> Result<(u8, IpAddr), ValidationError> {
        let own_prefix = prefix_length.map(check_prefix_length).transpose()?;
        let prefix_length = own_prefix
            .or(self.prefix_length)
            .ok_or_else(|| ValidationError::MissingPrefixLength(subject.to_string()))?;

        let own_gateway = gateway.map(|g| parse_address("gateway", g)).transpose()?;
        let gateway = own_gateway
            .or(self.gateway)
            .ok_or_else(|| ValidationError::MissingGateway(subject.to_string()))?;

        Ok((prefix_length, gateway))
    }
}

/// Validate one pool and resolve it into typed entries
pub fn validate_pool(spec: &PoolSpec) -> Result<ValidatedPool, ValidationError> {
    let defaults = Defaults {
        prefix_length: spec.prefix_length.map(check_prefix_length).transpose()?,
        gateway: spec
            .gateway
            .as_deref()
            .map(|g| parse_address("gateway", g))
            .transpose()?,
    };

    let mut entries = Vec::with_capacity(spec.ranges.len() + spec.addresses.len());

    for range in &spec.ranges {
        let subject = format!("Range '{}-{}'", range.from_ip, range.to_ip);
        let (prefix_length, gateway) =
            defaults.resolve(&subject, range.prefix_length, range.gateway.as_deref())?;

        let from = parse_address("from_ip", &range.from_ip)?;
        let to = parse_address("to_ip", &range.to_ip)?;
        if range_len(from, to).is_none() {
            if !same_family(from, to) {
                log::debug!("Pool '{}': {} mixes address families", spec.name, subject);
            }
            return Err(ValidationError::InvalidRangeOrder {
                from: range.from_ip.clone(),
                to: range.to_ip.clone(),
            });
        }

        warn_on_oversized_prefix(&spec.name, &subject, from, prefix_length);
        entries.push(PoolEntry::Range {
            from,
            to,
            prefix_length,
            gateway,
        });
    }

    for address in &spec.addresses {
        let subject = format!("IP '{}'", address.ip);
        let (prefix_length, gateway) =
            defaults.resolve(&subject, address.prefix_length, address.gateway.as_deref())?;

        let ip = parse_address("ip", &address.ip)?;

        warn_on_oversized_prefix(&spec.name, &subject, ip, prefix_length);
        entries.push(PoolEntry::Address(ResolvedAddress::new(ip, prefix_length, gateway)));
    }

    log::debug!("Pool '{}' validated with {} entries", spec.name, entries.len());

    Ok(ValidatedPool {
        name: spec.name.clone(),
        entries,
    })
}

/// Check a prefix length against the family-agnostic 0..=128 bound
pub fn check_prefix_length(prefix_length: i64) -> Result<u8, ValidationError> {
    if (0..=MAX_PREFIX_LENGTH).contains(&prefix_length) {
        Ok(prefix_length as u8)
    } else {
        Err(ValidationError::InvalidPrefixLength(prefix_length))
    }
}

/// Parse an IPv4 or IPv6 literal, naming `field` on failure.
///
/// Zone-scoped IPv6 literals such as `fe80::1%eth0` are rejected.
pub fn parse_address(field: &'static str, value: &str) -> Result<IpAddr, ValidationError> {
    value.parse::<IpAddr>().map_err(|_| ValidationError::InvalidAddress {
        field,
        value: value.to_string(),
    })
}

// IPv4 prefixes above 32 are accepted but almost certainly a typo.
fn warn_on_oversized_prefix(pool: &str, subject: &str, ip: IpAddr, prefix_length: u8) {
    if ip.is_ipv4() && prefix_length > 32 {
        log::warn!(
            "Pool '{}': {} uses prefix length {} with an IPv4 address",
            pool,
            subject,
            prefix_length
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pool(yaml: &str) -> PoolSpec {
        serde_yaml::from_str(yaml).unwrap()
    }

    fn ip(s: &str) -> IpAddr {
        s.parse().unwrap()
    }

    #[test]
    fn test_range_inherits_pool_defaults() {
        let spec = pool(
            r#"
name: "POOL1"
prefix_length: 24
gateway: "10.0.0.254"
ranges:
  - from_ip: "10.0.0.1"
    to_ip: "10.0.0.3"
"#,
        );

        let validated = validate_pool(&spec).unwrap();
        assert_eq!(
            validated.entries,
            vec![PoolEntry::Range {
                from: ip("10.0.0.1"),
                to: ip("10.0.0.3"),
                prefix_length: 24,
                gateway: ip("10.0.0.254"),
            }]
        );
    }

    #[test]
    fn test_partial_override_inherits_the_rest() {
        let spec = pool(
            r#"
name: "POOL1"
prefix_length: 24
gateway: "10.0.0.254"
ranges:
  - from_ip: "10.0.0.1"
    to_ip: "10.0.0.3"
    gateway: "10.0.0.1"
addresses:
  - ip: "10.0.9.9"
    prefix_length: 16
"#,
        );

        let validated = validate_pool(&spec).unwrap();
        match &validated.entries[0] {
            PoolEntry::Range {
                prefix_length,
                gateway,
                ..
            } => {
                assert_eq!(*prefix_length, 24);
                assert_eq!(*gateway, ip("10.0.0.1"));
            }
            other => panic!("Expected range, got {:?}", other),
        }
        assert_eq!(
            validated.entries[1],
            PoolEntry::Address(ResolvedAddress::new(ip("10.0.9.9"), 16, ip("10.0.0.254")))
        );
    }

    #[test]
    fn test_ranges_precede_addresses() {
        // Field order in the file does not matter; ranges always come first.
        let spec = pool(
            r#"
name: "POOL1"
prefix_length: 24
gateway: "10.0.0.254"
addresses:
  - ip: "10.0.0.100"
ranges:
  - from_ip: "10.0.0.1"
    to_ip: "10.0.0.1"
"#,
        );

        let validated = validate_pool(&spec).unwrap();
        assert!(matches!(validated.entries[0], PoolEntry::Range { .. }));
        assert!(matches!(validated.entries[1], PoolEntry::Address(_)));
    }

    #[test]
    fn test_single_address_range_is_valid() {
        let spec = pool(
            r#"
name: "POOL1"
prefix_length: 24
gateway: "10.0.0.254"
ranges:
  - from_ip: "10.0.0.7"
    to_ip: "10.0.0.7"
"#,
        );
        assert!(validate_pool(&spec).is_ok());
    }

    #[test]
    fn test_rejects_prefix_length_out_of_bounds() {
        let spec = pool(
            r#"
name: "POOL1"
prefix_length: 200
gateway: "10.0.0.254"
"#,
        );
        assert_eq!(
            validate_pool(&spec),
            Err(ValidationError::InvalidPrefixLength(200))
        );

        let spec = pool(
            r#"
name: "POOL1"
gateway: "10.0.0.254"
addresses:
  - ip: "10.0.0.1"
    prefix_length: -1
"#,
        );
        assert_eq!(
            validate_pool(&spec),
            Err(ValidationError::InvalidPrefixLength(-1))
        );
    }

    #[test]
    fn test_rejects_invalid_gateway() {
        let spec = pool(
            r#"
name: "POOL1"
prefix_length: 24
gateway: "not-an-ip"
"#,
        );
        assert_eq!(
            validate_pool(&spec),
            Err(ValidationError::InvalidAddress {
                field: "gateway",
                value: "not-an-ip".to_string(),
            })
        );
    }

    #[test]
    fn test_rejects_invalid_range_endpoints() {
        let spec = pool(
            r#"
name: "POOL1"
prefix_length: 24
gateway: "10.0.0.254"
ranges:
  - from_ip: "10.0.0.1"
    to_ip: "10.0.0.300"
"#,
        );
        assert_eq!(
            validate_pool(&spec),
            Err(ValidationError::InvalidAddress {
                field: "to_ip",
                value: "10.0.0.300".to_string(),
            })
        );
    }

    #[test]
    fn test_rejects_reversed_range() {
        let spec = pool(
            r#"
name: "POOL1"
prefix_length: 24
gateway: "10.0.0.254"
ranges:
  - from_ip: "10.0.0.5"
    to_ip: "10.0.0.1"
"#,
        );
        assert_eq!(
            validate_pool(&spec),
            Err(ValidationError::InvalidRangeOrder {
                from: "10.0.0.5".to_string(),
                to: "10.0.0.1".to_string(),
            })
        );
    }

    #[test]
    fn test_rejects_mixed_family_range() {
        let spec = pool(
            r#"
name: "POOL1"
prefix_length: 24
gateway: "10.0.0.254"
ranges:
  - from_ip: "10.0.0.1"
    to_ip: "2001:db8::1"
"#,
        );
        assert!(matches!(
            validate_pool(&spec),
            Err(ValidationError::InvalidRangeOrder { .. })
        ));
    }

    #[test]
    fn test_missing_defaults_name_the_entry() {
        let spec = pool(
            r#"
name: "POOL1"
gateway: "10.0.0.254"
ranges:
  - from_ip: "10.0.0.1"
    to_ip: "10.0.0.3"
"#,
        );
        match validate_pool(&spec) {
            Err(ValidationError::MissingPrefixLength(subject)) => {
                assert!(subject.contains("10.0.0.1-10.0.0.3"))
            }
            other => panic!("Expected MissingPrefixLength, got {:?}", other),
        }

        let spec = pool(
            r#"
name: "POOL1"
prefix_length: 24
addresses:
  - ip: "10.0.0.9"
"#,
        );
        match validate_pool(&spec) {
            Err(ValidationError::MissingGateway(subject)) => assert!(subject.contains("10.0.0.9")),
            other => panic!("Expected MissingGateway, got {:?}", other),
        }
    }

    #[test]
    fn test_missing_gateway_names_the_range() {
        let spec = pool(
            r#"
name: "POOL1"
prefix_length: 24
ranges:
  - from_ip: "10.0.0.1"
    to_ip: "10.0.0.3"
"#,
        );
        assert_eq!(
            validate_pool(&spec),
            Err(ValidationError::MissingGateway("Range '10.0.0.1-10.0.0.3'".to_string()))
        );
    }

    #[test]
    fn test_missing_prefix_length_names_the_address() {
        let spec = pool(
            r#"
name: "POOL1"
gateway: "10.0.0.254"
addresses:
  - ip: "10.0.0.9"
"#,
        );
        assert_eq!(
            validate_pool(&spec),
            Err(ValidationError::MissingPrefixLength("IP '10.0.0.9'".to_string()))
        );
    }

    #[test]
    fn test_rejects_invalid_from_ip() {
        let spec = pool(
            r#"
name: "POOL1"
prefix_length: 24
gateway: "10.0.0.254"
ranges:
  - from_ip: "10.0.0"
    to_ip: "10.0.0.3"
"#,
        );
        assert_eq!(
            validate_pool(&spec),
            Err(ValidationError::InvalidAddress {
                field: "from_ip",
                value: "10.0.0".to_string(),
            })
        );
    }

    #[test]
    fn test_rejects_invalid_discrete_address() {
        let spec = pool(
            r#"
name: "POOL1"
prefix_length: 24
gateway: "10.0.0.254"
addresses:
  - ip: "10.0.0.1/24"
"#,
        );
        assert_eq!(
            validate_pool(&spec),
            Err(ValidationError::InvalidAddress {
                field: "ip",
                value: "10.0.0.1/24".to_string(),
            })
        );
    }

    #[test]
    fn test_parse_address_accepts_plain_literals_only() {
        assert_eq!(parse_address("ip", "10.0.0.1"), Ok(ip("10.0.0.1")));
        assert_eq!(parse_address("ip", "2001:db8::1"), Ok(ip("2001:db8::1")));

        // Zone-scoped IPv6 literals have no `IpAddr` representation.
        assert_eq!(
            parse_address("gateway", "fe80::1%eth0"),
            Err(ValidationError::InvalidAddress {
                field: "gateway",
                value: "fe80::1%eth0".to_string(),
            })
        );
        assert!(parse_address("ip", "10.0.0.256").is_err());
    }

    #[test]
    fn test_fail_fast_reports_first_problem() {
        // The range is checked before the address, and within the range the
        // missing prefix length is reported before the bad endpoint.
        let spec = pool(
            r#"
name: "POOL1"
gateway: "10.0.0.254"
ranges:
  - from_ip: "garbage"
    to_ip: "10.0.0.3"
addresses:
  - ip: "also-garbage"
    prefix_length: 24
"#,
        );
        assert!(matches!(
            validate_pool(&spec),
            Err(ValidationError::MissingPrefixLength(_))
        ));
    }

    #[test]
    fn test_ipv6_pool() {
        let spec = pool(
            r#"
name: "V6"
prefix_length: 64
gateway: "2001:db8::1"
ranges:
  - from_ip: "2001:db8::10"
    to_ip: "2001:db8::1f"
"#,
        );
        assert!(validate_pool(&spec).is_ok());
    }
}
