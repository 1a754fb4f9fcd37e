use crate::prefix::format_addr6;
use crate::{AddrError, Result};
use std::net::{Ipv4Addr, Ipv6Addr};

/// The 6RD DHCPv4 option (212) as handed to the IPv4 client script:
/// `"<ipv4 mask len> <6rd prefix len> <6rd prefix> <border relay>"`.
///
/// Example: `"0 32 2001:db8:: 192.0.2.1"`. Extra trailing fields are ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SixRdOption {
    pub ipv4_mask_len: u8,
    pub prefix_len: u8,
    pub prefix: Ipv6Addr,
    pub relay: Ipv4Addr,
}

impl SixRdOption {
    pub fn parse(value: &str) -> Result<Self> {
        let fields: Vec<&str> = value.split_whitespace().take(4).collect();
        let &[mask, len, prefix, relay] = fields.as_slice() else {
            return Err(AddrError::InvalidOption(format!(
                "expected 4 fields, got {}",
                fields.len()
            )));
        };

        let ipv4_mask_len: u8 = mask
            .parse()
            .ok()
            .filter(|n| *n <= 32)
            .ok_or_else(|| AddrError::InvalidOption(format!("bad IPv4 mask length: {mask}")))?;
        let prefix_len: u8 = len
            .parse()
            .ok()
            .filter(|n| *n <= 128)
            .ok_or_else(|| AddrError::InvalidOption(format!("bad prefix length: {len}")))?;
        let prefix: Ipv6Addr = prefix
            .parse()
            .map_err(|_| AddrError::InvalidOption(format!("bad prefix: {prefix}")))?;
        let relay: Ipv4Addr = relay
            .parse()
            .map_err(|_| AddrError::InvalidOption(format!("bad relay: {relay}")))?;

        Ok(Self {
            ipv4_mask_len,
            prefix_len,
            prefix,
            relay,
        })
    }

    /// `prefix/len`, the form stored as the WAN IPv6 address.
    pub fn prefix_string(&self) -> String {
        format_addr6(self.prefix, self.prefix_len)
    }
}

impl std::str::FromStr for SixRdOption {
    type Err = AddrError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_option() {
        let opt = SixRdOption::parse("0 32 2001:db8:: 192.0.2.1").unwrap();
        assert_eq!(opt.ipv4_mask_len, 0);
        assert_eq!(opt.prefix_len, 32);
        assert_eq!(opt.prefix_string(), "2001:db8::/32");
        assert_eq!(opt.relay, Ipv4Addr::new(192, 0, 2, 1));
    }

    #[test]
    fn test_parse_trailing_space_and_extras() {
        let opt: SixRdOption = "32 128 FFFF:FFFF:FFFF:FFFF:FFFF:FFFF:FFFF:FFFF 255.255.255.255 "
            .parse()
            .unwrap();
        assert_eq!(opt.ipv4_mask_len, 32);
        assert_eq!(opt.prefix_len, 128);
        // no /len suffix for a full-length prefix
        assert_eq!(opt.prefix_string(), "ffff:ffff:ffff:ffff:ffff:ffff:ffff:ffff");

        assert!(SixRdOption::parse("8 32 2001:db8:: 10.0.0.1 trailing").is_ok());
    }

    #[test]
    fn test_parse_errors() {
        assert!(SixRdOption::parse("").is_err());
        assert!(SixRdOption::parse("0 32 2001:db8::").is_err());
        assert!(SixRdOption::parse("33 32 2001:db8:: 192.0.2.1").is_err());
        assert!(SixRdOption::parse("0 129 2001:db8:: 192.0.2.1").is_err());
        assert!(SixRdOption::parse("0 32 zzz 192.0.2.1").is_err());
        assert!(SixRdOption::parse("0 32 2001:db8:: 2001:db8::1").is_err());
    }
}
