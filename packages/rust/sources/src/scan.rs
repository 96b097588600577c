//! Regex scanning for dotted-quad addresses in free text.

use std::net::Ipv4Addr;
use std::sync::LazyLock;

use regex::Regex;

use ipcatalog_shared::Address;

/// Dotted quad, optionally port-qualified (`:8443`), optionally carrying a
/// CIDR suffix (`/24`) which is always stripped.
static ADDRESS_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(\d{1,3}(?:\.\d{1,3}){3})(?::(\d{1,5}))?(?:/(\d{1,2}))?")
        .expect("address pattern compiles")
});

/// Scan free text for candidate addresses.
///
/// CIDR suffixes are normalized away (the prefix length is discarded); a
/// `:port` suffix is retained only when `keep_port` is set, and an
/// out-of-range port falls back to the bare host rather than losing the
/// address. Fragments whose octets fall out of range are skipped, never
/// fatal.
pub fn scan_addresses(text: &str, keep_port: bool) -> impl Iterator<Item = Address> + '_ {
    ADDRESS_PATTERN.captures_iter(text).filter_map(move |caps| {
        let host = caps.get(1)?.as_str().parse::<Ipv4Addr>().ok()?;
        match caps.get(2) {
            Some(port) if keep_port => match port.as_str().parse::<u16>() {
                Ok(port) => Some(Address::with_port(host, port)),
                Err(_) => Some(Address::host_only(host)),
            },
            _ => Some(Address::host_only(host)),
        }
    })
}

/// Parse a single structured cell as a host, normalizing a CIDR suffix.
///
/// Used by the CSV adapter, where the host arrives in its own column and the
/// generic scan would be overkill.
pub fn parse_host(cell: &str) -> Option<Ipv4Addr> {
    let base = cell.trim().split('/').next()?;
    base.parse::<Ipv4Addr>().ok()
}
