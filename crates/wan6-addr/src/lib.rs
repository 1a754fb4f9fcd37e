//! IPv6 address derivation for the WAN side of the router.
//!
//! Everything in this crate is pure: it takes configured or leased values and
//! computes the addresses, prefixes and gateways that the link layer later
//! hands to `ip`. The interesting part is the 6to4/6RD arithmetic, which
//! embeds (part of) the WAN IPv4 address into an IPv6 prefix.

pub mod clamp;
pub mod option;
pub mod prefix;
pub mod tunnel;

pub use option::SixRdOption;
pub use prefix::{embed_ipv4, format_addr6, parse_addr6, Addr6};

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AddrError {
    #[error("invalid IPv6 address: {0}")]
    InvalidAddress(String),

    #[error("invalid prefix length: {0}")]
    InvalidPrefixLen(String),

    #[error("IPv4 field of {bits} bits does not fit after a /{prefix_len} prefix")]
    FieldOverflow { prefix_len: u8, bits: u8 },

    #[error("invalid 6rd option: {0}")]
    InvalidOption(String),
}

pub type Result<T> = std::result::Result<T, AddrError>;
