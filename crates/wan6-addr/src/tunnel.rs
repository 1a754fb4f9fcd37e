//! Endpoint derivation for the SIT based transition mechanisms.
//!
//! 6to4 always lives under `2002::/16` with the full WAN IPv4 address in bits
//! 16..48. 6RD uses an ISP assigned prefix and only embeds the IPv4 bits that
//! are not common to the whole 6RD domain.

use crate::prefix::{embed_ipv4, set_group};
use crate::Result;
use ipnet::{Ipv4Net, Ipv6Net};
use std::net::{Ipv4Addr, Ipv6Addr};

/// Prefix length of the 6to4 WAN address.
pub const SIXTO4_PREFIX_LEN: u8 = 16;

const SIXTO4_PREFIX: Ipv6Addr = Ipv6Addr::new(0x2002, 0, 0, 0, 0, 0, 0, 0);

/// WAN side 6to4 address: `2002:VVVV:VVVV::1`, to be used as a /16.
pub fn sixto4_wan(ipv4: Ipv4Addr) -> Ipv6Addr {
    let addr = sixto4_base(ipv4);
    set_group(addr, 7, 1)
}

/// LAN side 6to4 address: subnet 1 of the derived /48, host `::1`.
pub fn sixto4_lan(ipv4: Ipv4Addr) -> Ipv6Addr {
    let addr = set_group(sixto4_base(ipv4), 3, 1);
    set_group(addr, 7, 1)
}

fn sixto4_base(ipv4: Ipv4Addr) -> Ipv6Addr {
    // 16 + 32 always fits
    let bits = (u128::from(u32::from(ipv4))) << 80;
    Ipv6Addr::from(u128::from(SIXTO4_PREFIX) | bits)
}

/// The 6RD prefix handed to `ip tunnel 6rd ... 6rd-prefix`.
pub fn sixrd_prefix(addr: Ipv6Addr, len: u8) -> Ipv6Net {
    Ipv6Net::new(addr, len.min(128))
        .map(|n| n.trunc())
        .unwrap_or_default()
}

/// The 6RD relay prefix: the IPv4 bits common to the domain, or `0.0.0.0/0`
/// when the common length is not in `1..=32`.
pub fn sixrd_relay_prefix(ipv4: Ipv4Addr, size4: u8) -> Ipv4Net {
    if (1..=32).contains(&size4) {
        Ipv4Net::new(ipv4, size4)
            .map(|n| n.trunc())
            .unwrap_or_default()
    } else {
        Ipv4Net::default()
    }
}

/// Delegated 6RD address: the ISP prefix with the IPv4 suffix embedded right
/// after it and host `::1`.
pub fn sixrd_wan(prefix: Ipv6Addr, len: u8, ipv4: Ipv4Addr, size4: u8) -> Result<Ipv6Addr> {
    let addr = embed_ipv4(prefix, len, ipv4, effective_size4(size4))?;
    Ok(set_group(addr, 7, 1))
}

/// LAN side 6RD address. The bridge gets the same delegated address as the
/// tunnel; only the prefix length differs. The IPv4 bits follow the actual
/// 6RD prefix length rather than a fixed bit 32, so prefixes other than /32
/// give a LAN address inside the delegated prefix.
pub fn sixrd_lan(prefix: Ipv6Addr, len: u8, ipv4: Ipv4Addr, size4: u8) -> Result<Ipv6Addr> {
    sixrd_wan(prefix, len, ipv4, size4)
}

/// Default gateway through a 6to4/6RD relay: the IPv4-compatible `::a.b.c.d`.
pub fn relay_gateway(relay: Ipv4Addr) -> Ipv6Addr {
    relay.to_ipv6_compatible()
}

fn effective_size4(size4: u8) -> u8 {
    if (1..=32).contains(&size4) {
        size4
    } else {
        0
    }
}
