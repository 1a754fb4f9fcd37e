//! Glue around the helper daemons of the IPv6 WAN: the WIDE DHCPv6 client,
//! radvd on the LAN bridge and the resolver configuration.

pub mod dhcp6c;
pub mod hook;
pub mod radvd;
pub mod resolv;
pub mod sixrd;
