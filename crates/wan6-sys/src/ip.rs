//! Command lines for iproute2's `ip`.

use crate::system::Cmd;
use ipnet::{Ipv4Net, Ipv6Net};
use std::net::{Ipv4Addr, Ipv6Addr};

/// Metric of the direct (`dev` only) default route added for tunnels and
/// DHCPv6 links so newer kernels do not answer "No route to host" before a
/// gateway is known.
pub const DIRECT_DEFAULT_METRIC: u32 = 2048;

/// Metric of the default route through an explicit gateway.
pub const GATEWAY_DEFAULT_METRIC: u32 = 1;

fn ip() -> Cmd {
    Cmd::new("ip")
}

pub fn tunnel_add_sit(name: &str, remote: &str, local: Ipv4Addr, ttl: u8) -> Cmd {
    ip().args(["tunnel", "add", name, "mode", "sit", "remote", remote])
        .arg("local")
        .arg(local)
        .arg("ttl")
        .arg(ttl)
}

pub fn tunnel_del(name: &str) -> Cmd {
    ip().args(["tunnel", "del", name])
}

pub fn tunnel_6rd(name: &str, prefix: Ipv6Net, relay_prefix: Ipv4Net) -> Cmd {
    ip().args(["tunnel", "6rd", "dev", name])
        .arg("6rd-prefix")
        .arg(prefix)
        .arg("6rd-relay_prefix")
        .arg(relay_prefix)
}

pub fn link_up_mtu(name: &str, mtu: u16) -> Cmd {
    ip().args(["link", "set", "mtu"]).arg(mtu).args(["dev", name, "up"])
}

pub fn link_down(name: &str) -> Cmd {
    ip().args(["link", "set", "dev", name, "down"])
}

/// `addr` is an address with optional `/len`.
pub fn addr6_add(addr: &str, dev: &str) -> Cmd {
    ip().args(["-6", "addr", "add", addr, "dev", dev])
}

/// Remove global addresses; link-local ones stay.
pub fn addr6_flush(dev: &str) -> Cmd {
    ip().args(["-6", "addr", "flush", "dev", dev, "scope", "global"])
}

pub fn addr6_show(dev: &str) -> Cmd {
    ip().args(["-6", "-o", "addr", "show", "dev", dev, "scope", "global"])
}

pub fn route6_flush(dev: &str) -> Cmd {
    ip().args(["-6", "route", "flush", "dev", dev])
}

pub fn route6_add_default_dev(dev: &str, metric: u32) -> Cmd {
    ip().args(["-6", "route", "add", "default", "dev", dev, "metric"])
        .arg(metric)
}

pub fn route6_add_default_via(gateway: &str, dev: Option<&str>, metric: u32) -> Cmd {
    let mut cmd = ip().args(["-6", "route", "add", "default", "via", gateway]);
    if let Some(dev) = dev {
        cmd = cmd.args(["dev", dev]);
    }
    cmd.arg("metric").arg(metric)
}

/// On-link host route to a gateway outside the configured prefix.
pub fn route6_add_host(dest: &str, dev: &str) -> Cmd {
    ip().args(["-6", "route", "add", dest, "dev", dev])
}

/// Parse the first global address (`addr/len`) out of `ip -6 -o addr show`.
pub fn parse_first_addr6(output: &str) -> Option<String> {
    output.lines().find_map(|line| {
        let mut tokens = line.split_whitespace();
        tokens.find(|t| *t == "inet6")?;
        let cidr = tokens.next()?;
        let addr = cidr.split('/').next()?;
        addr.parse::<Ipv6Addr>().ok().map(|_| cidr.to_string())
    })
}
