//! Per-interface IPv6 knobs and address/route housekeeping.

use crate::ip;
use crate::system::{exec, System};
use tracing::warn;

fn conf_key(ifname: &str, knob: &str) -> String {
    format!("net/ipv6/conf/{ifname}/{knob}")
}

async fn set(sys: &dyn System, ifname: &str, knob: &str, value: &str) {
    if let Err(e) = sys.write_sysctl(&conf_key(ifname, knob), value).await {
        warn!(ifname, knob, value, "sysctl write failed: {e}");
    }
}

/// Enable or disable IPv6 on an interface.
pub async fn control_if_ipv6(sys: &dyn System, ifname: &str, enable: bool) {
    set(sys, ifname, "disable_ipv6", if enable { "0" } else { "1" }).await;
}

/// Accept router advertisements. The router forwards, so acceptance needs
/// mode 2.
pub async fn control_if_ipv6_radv(sys: &dyn System, ifname: &str, enable: bool) {
    set(sys, ifname, "accept_ra", if enable { "2" } else { "0" }).await;
}

/// Stateless address autoconfiguration from received prefixes.
pub async fn control_if_ipv6_autoconf(sys: &dyn System, ifname: &str, enable: bool) {
    set(sys, ifname, "autoconf", if enable { "1" } else { "0" }).await;
}

/// Duplicate address detection.
pub async fn control_if_ipv6_dad(sys: &dyn System, ifname: &str, enable: bool) {
    let value = if enable { "1" } else { "0" };
    set(sys, ifname, "accept_dad", value).await;
    set(sys, ifname, "dad_transmits", value).await;
}

pub async fn clear_if_addr6(sys: &dyn System, ifname: &str) {
    exec(sys, &ip::addr6_flush(ifname)).await;
}

pub async fn clear_if_route6(sys: &dyn System, ifname: &str) {
    exec(sys, &ip::route6_flush(ifname)).await;
}

/// First global IPv6 address on the interface, as `addr/len`.
pub async fn get_ifaddr6(sys: &dyn System, ifname: &str) -> Option<String> {
    match sys.run(&ip::addr6_show(ifname)).await {
        Ok(out) if out.success => ip::parse_first_addr6(&out.stdout),
        Ok(_) => None,
        Err(e) => {
            warn!(ifname, "failed to read ipv6 address: {e}");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockSystem;
    use crate::system::CmdOutput;

    #[tokio::test]
    async fn test_knobs() {
        let sys = MockSystem::new();
        control_if_ipv6(&sys, "sit1", true).await;
        control_if_ipv6_radv(&sys, "eth3", true).await;
        control_if_ipv6_autoconf(&sys, "eth3", false).await;
        control_if_ipv6_dad(&sys, "br0", true).await;

        assert_eq!(
            sys.sysctls(),
            vec![
                "net/ipv6/conf/sit1/disable_ipv6=0",
                "net/ipv6/conf/eth3/accept_ra=2",
                "net/ipv6/conf/eth3/autoconf=0",
                "net/ipv6/conf/br0/accept_dad=1",
                "net/ipv6/conf/br0/dad_transmits=1",
            ]
        );
    }

    #[tokio::test]
    async fn test_housekeeping_commands() {
        let sys = MockSystem::new();
        clear_if_route6(&sys, "ppp0").await;
        clear_if_addr6(&sys, "ppp0").await;
        assert_eq!(
            sys.commands(),
            vec![
                "ip -6 route flush dev ppp0",
                "ip -6 addr flush dev ppp0 scope global",
            ]
        );
    }

    #[tokio::test]
    async fn test_get_ifaddr6() {
        let sys = MockSystem::new();
        assert_eq!(get_ifaddr6(&sys, "br0").await, None);

        sys.respond(
            "ip -6 -o addr show dev br0 scope global",
            CmdOutput::ok("7: br0    inet6 2001:db8:0:1::1/64 scope global dynamic\n"),
        );
        assert_eq!(get_ifaddr6(&sys, "br0").await.as_deref(), Some("2001:db8:0:1::1/64"));
    }
}
