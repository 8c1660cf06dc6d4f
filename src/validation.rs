//! Centralized validation for values taken from requests.
//!
//! - Source addresses (family detection)
//! - Set names passed on to the ipset backend

use std::net::{Ipv4Addr, Ipv6Addr};

use crate::protocol::AddressFamily;

/// Longest set name ipset accepts (IPSET_MAXNAMELEN minus the NUL).
pub const MAX_SET_NAME_LEN: usize = 31;

/// Resolve the address family from the address text.
///
/// A colon means the address must parse as IPv6, otherwise it must parse as
/// dotted-quad IPv4. Anything else, including CIDR notation, is rejected.
///
/// # Examples
/// ```
/// use ipset_responder::protocol::AddressFamily;
/// use ipset_responder::validation::address_family;
/// assert_eq!(address_family("192.168.1.1"), Some(AddressFamily::V4));
/// assert_eq!(address_family("::1"), Some(AddressFamily::V6));
/// assert_eq!(address_family("invalid"), None);
/// ```
pub fn address_family(address: &str) -> Option<AddressFamily> {
    if address.contains(':') {
        address
            .parse::<Ipv6Addr>()
            .ok()
            .map(|_| AddressFamily::V6)
    } else {
        address
            .parse::<Ipv4Addr>()
            .ok()
            .map(|_| AddressFamily::V4)
    }
}

/// Check that a set name is safe to hand to ipset as a positional argument.
///
/// Names come straight from the request, so a leading `-` would be read as
/// an option.
pub fn is_safe_set_name(name: &str) -> bool {
    !name.is_empty()
        && name.len() <= MAX_SET_NAME_LEN
        && !name.starts_with('-')
        && name
            .chars()
            .all(|c| !c.is_whitespace() && !c.is_control())
}
