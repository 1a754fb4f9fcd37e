use crate::{AddrError, Result};
use ipnet::Ipv6Net;
use std::fmt;
use std::net::{Ipv4Addr, Ipv6Addr};

/// An IPv6 address as entered by the user or leased from a server, with an
/// optional prefix length (`2001:db8::1/64` or just `2001:db8::1`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Addr6 {
    pub addr: Ipv6Addr,
    pub len: Option<u8>,
}

impl Addr6 {
    /// Prefix length, treating a missing one as zero.
    pub fn len_or_zero(&self) -> u8 {
        self.len.unwrap_or(0)
    }

    /// The prefix this address belongs to, host bits cleared. A missing
    /// length yields `::/0`.
    pub fn network(&self) -> Ipv6Net {
        Ipv6Net::new(self.addr, self.len_or_zero())
            .map(|n| n.trunc())
            .unwrap_or_default()
    }
}

impl fmt::Display for Addr6 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&format_addr6(self.addr, self.len_or_zero()))
    }
}

impl std::str::FromStr for Addr6 {
    type Err = AddrError;

    fn from_str(s: &str) -> Result<Self> {
        parse_addr6(s)
    }
}

/// Parse `addr[/len]`. Surrounding whitespace is ignored.
pub fn parse_addr6(s: &str) -> Result<Addr6> {
    let s = s.trim();
    let Some((addr, len)) = s.split_once('/') else {
        let addr = s
            .parse::<Ipv6Addr>()
            .map_err(|_| AddrError::InvalidAddress(s.to_string()))?;
        return Ok(Addr6 { addr, len: None });
    };

    match s.parse::<Ipv6Net>() {
        Ok(net) => Ok(Addr6 {
            addr: net.addr(),
            len: Some(net.prefix_len()),
        }),
        Err(_) if addr.parse::<Ipv6Addr>().is_ok() => {
            Err(AddrError::InvalidPrefixLen(len.to_string()))
        }
        Err(_) => Err(AddrError::InvalidAddress(s.to_string())),
    }
}

/// Print an address, appending `/len` only for a real prefix (0 < len < 128).
pub fn format_addr6(addr: Ipv6Addr, len: u8) -> String {
    if len > 0 && len < 128 {
        format!("{addr}/{len}")
    } else {
        addr.to_string()
    }
}

/// Embed the low `32 - ipv4_mask_len` bits of `ipv4` into `addr` starting at
/// bit `prefix_len`.
///
/// The leading `ipv4_mask_len` bits of the IPv4 address are the part shared by
/// every customer of a 6RD domain and are therefore dropped. Bits of `addr`
/// outside the embedded field are left untouched. A mask length above 32 is
/// treated as zero.
pub fn embed_ipv4(addr: Ipv6Addr, prefix_len: u8, ipv4: Ipv4Addr, ipv4_mask_len: u8) -> Result<Ipv6Addr> {
    let ipv4_mask_len = if ipv4_mask_len > 32 { 0 } else { ipv4_mask_len };
    let bits = 32 - ipv4_mask_len;
    if bits == 0 {
        return Ok(addr);
    }
    if u32::from(prefix_len) + u32::from(bits) > 128 {
        return Err(AddrError::FieldOverflow { prefix_len, bits });
    }

    let field = (1u128 << bits) - 1;
    let shift = 128 - u32::from(prefix_len) - u32::from(bits);
    let suffix = u128::from(u32::from(ipv4)) & field;

    let out = (u128::from(addr) & !(field << shift)) | (suffix << shift);
    Ok(Ipv6Addr::from(out))
}

/// Replace 16-bit group `index` (0..8) of an address.
pub fn set_group(addr: Ipv6Addr, index: usize, value: u16) -> Ipv6Addr {
    let mut segments = addr.segments();
    segments[index] = value;
    Ipv6Addr::from(segments)
}
