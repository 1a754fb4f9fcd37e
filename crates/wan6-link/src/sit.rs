//! SIT tunnel (6in4, 6to4, 6RD) planning and bring-up.
//!
//! [`plan_sit_tunnel`] is pure: it turns settings, runtime variables and the
//! WAN IPv4 address into the exact tunnel parameters and addresses.
//! [`crate::Wan6::start_sit_tunnel`] then applies the plan.

use anyhow::{bail, Context};
use ipnet::{Ipv4Net, Ipv6Net};
use std::net::{Ipv4Addr, Ipv6Addr};
use wan6_addr::clamp::{clamp_lan_size, clamp_sit_mtu, clamp_sit_ttl};
use wan6_addr::tunnel::{
    relay_gateway, sixrd_lan, sixrd_prefix, sixrd_relay_prefix, sixrd_wan, sixto4_lan, sixto4_wan,
    SIXTO4_PREFIX_LEN,
};
use wan6_addr::{format_addr6, parse_addr6};
use wan6_core::config::Ipv6Config;
use wan6_core::types::{Ipv6Type, WanState};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SixRdParams {
    pub prefix: Ipv6Net,
    pub relay_prefix: Ipv4Net,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SitPlan {
    pub ifname: String,
    /// Tunnel remote: the 6in4 broker, or `any` for the relay based types.
    pub remote: String,
    pub local: Ipv4Addr,
    pub ttl: u8,
    pub mtu: u16,
    pub sixrd: Option<SixRdParams>,
    /// Tunnel address, `addr[/len]`.
    pub wan_addr6: String,
    /// Add a `dev`-only default route next to the gateway route.
    pub direct_default: bool,
    pub gateway: Option<String>,
    /// Address for the LAN bridge, `addr/len`.
    pub lan_addr6: Option<String>,
}

/// Parse the WAN IPv4 address. Empty, malformed and unspecified addresses
/// yield `None`; a SIT tunnel cannot be built without a local endpoint.
pub fn wan_ipv4(addr: &str) -> Option<Ipv4Addr> {
    addr.trim()
        .parse::<Ipv4Addr>()
        .ok()
        .filter(|a| !a.is_unspecified())
}

pub fn plan_sit_tunnel(
    ipv6: &Ipv6Config,
    ipv6_type: Ipv6Type,
    ipv4: Ipv4Addr,
    state: &WanState,
) -> anyhow::Result<SitPlan> {
    if !ipv6_type.is_sit() {
        bail!("{ipv6_type} does not use a SIT tunnel");
    }

    let parsed = parse_addr6(&state.addr6).ok();
    let mut addr6 = parsed.map(|a| a.addr).unwrap_or(Ipv6Addr::UNSPECIFIED);
    let mut size6 = parsed.map(|a| a.len_or_zero()).unwrap_or(0);

    let remote = match ipv6_type {
        Ipv6Type::SixInFour => ipv6.sixin4_remote.trim().to_string(),
        _ => "any".to_string(),
    };

    let mut sixrd = None;
    let mut relay = "";
    let mut lan = None;

    match ipv6_type {
        Ipv6Type::SixToFour => {
            addr6 = sixto4_wan(ipv4);
            size6 = SIXTO4_PREFIX_LEN;
            relay = ipv6.sixto4_relay.trim();
            lan = Some(sixto4_lan(ipv4));
        }
        Ipv6Type::SixRd => {
            if parsed.is_none() {
                bail!("6rd prefix unknown (wan addr6 {:?})", state.addr6);
            }
            let size4 = state.sixrd_size;
            sixrd = Some(SixRdParams {
                prefix: sixrd_prefix(addr6, size6),
                relay_prefix: sixrd_relay_prefix(ipv4, size4),
            });
            let prefix = addr6;
            addr6 = sixrd_wan(prefix, size6, ipv4, size4).context("deriving 6rd address")?;
            relay = state.sixrd_relay.trim();
            lan = Some(sixrd_lan(prefix, size6, ipv4, size4)?);
        }
        _ => {}
    }

    let (direct_default, gateway) = if ipv6_type.is_derived() {
        // a relay that is not an IPv4 address leaves only the direct route
        let gateway = relay
            .parse::<Ipv4Addr>()
            .ok()
            .map(|r| relay_gateway(r).to_string());
        (true, gateway)
    } else {
        let gate6 = state.gate6.trim();
        (false, (!gate6.is_empty()).then(|| gate6.to_string()))
    };

    let lan_size = clamp_lan_size(ipv6.lan_size);

    Ok(SitPlan {
        ifname: ipv6.sit_ifname.clone(),
        remote,
        local: ipv4,
        ttl: clamp_sit_ttl(ipv6.sit_ttl),
        mtu: clamp_sit_mtu(ipv6.sit_mtu),
        sixrd,
        wan_addr6: format_addr6(addr6, size6),
        direct_default,
        gateway,
        lan_addr6: lan.map(|a| format!("{a}/{lan_size}")),
    })
}
