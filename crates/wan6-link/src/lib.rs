//! Bringing the IPv6 side of the WAN up and down.

pub mod sit;
pub mod vars;
pub mod wan;

pub use wan::Wan6;
