use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

/// IP utility functions for parsing and address arithmetic

/// Check whether two addresses belong to the same address family
pub fn same_family(a: IpAddr, b: IpAddr) -> bool {
    a.is_ipv4() == b.is_ipv4()
}

/// Return the address immediately after `ip`, or `None` at the end of the
/// address space. Never wraps around.
///
/// # Examples
/// ```
/// use ipam::utils::ip_utils::next_ip;
/// use std::net::IpAddr;
///
/// let ip: IpAddr = "10.0.0.255".parse().unwrap();
/// assert_eq!(next_ip(ip), Some("10.0.1.0".parse().unwrap()));
///
/// let last: IpAddr = "255.255.255.255".parse().unwrap();
/// assert_eq!(next_ip(last), None);
/// ```
pub fn next_ip(ip: IpAddr) -> Option<IpAddr> {
    match ip {
        IpAddr::V4(v4) => u32::from(v4)
            .checked_add(1)
            .map(|n| IpAddr::V4(Ipv4Addr::from(n))),
        IpAddr::V6(v6) => u128::from(v6)
            .checked_add(1)
            .map(|n| IpAddr::V6(Ipv6Addr::from(n))),
    }
}

/// Number of addresses in the inclusive range `from..=to`.
///
/// Returns `None` when the range is reversed or mixes address families.
/// A range covering the whole IPv6 space saturates at `u128::MAX`.
///
/// # Examples
/// ```
/// use ipam::utils::ip_utils::range_len;
///
/// assert_eq!(range_len("10.0.0.1".parse().unwrap(), "10.0.0.3".parse().unwrap()), Some(3));
/// assert_eq!(range_len("10.0.0.5".parse().unwrap(), "10.0.0.1".parse().unwrap()), None);
/// assert_eq!(range_len("10.0.0.1".parse().unwrap(), "::1".parse().unwrap()), None);
/// ```
pub fn range_len(from: IpAddr, to: IpAddr) -> Option<u128> {
    match (from, to) {
        (IpAddr::V4(from), IpAddr::V4(to)) => {
            let (from, to) = (u32::from(from), u32::from(to));
            (from <= to).then(|| u128::from(to - from) + 1)
        }
        (IpAddr::V6(from), IpAddr::V6(to)) => {
            let (from, to) = (u128::from(from), u128::from(to));
            (from <= to).then(|| (to - from).saturating_add(1))
        }
        _ => None,
    }
}

/// Ascending iterator over the inclusive range `from..=to`.
///
/// Yields nothing for a reversed or mixed-family range.
pub fn ip_range(from: IpAddr, to: IpAddr) -> IpRange {
    let next = range_len(from, to).map(|_| from);
    IpRange { next, last: to }
}

/// Iterator returned by [`ip_range`]
#[derive(Debug, Clone)]
pub struct IpRange {
    next: Option<IpAddr>,
    last: IpAddr,
}

impl Iterator for IpRange {
    type Item = IpAddr;

    fn next(&mut self) -> Option<IpAddr> {
        let current = self.next?;
        self.next = if current == self.last {
            None
        } else {
            next_ip(current)
        };
        Some(current)
    }
}
