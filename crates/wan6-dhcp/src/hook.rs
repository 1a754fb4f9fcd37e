use crate::radvd::Radvd;
use crate::resolv::ResolvConf;
use std::sync::Arc;
use tracing::{debug, info};
use wan6_core::config::Config;
use wan6_core::db::StateStore;
use wan6_core::types::Ipv6Type;
use wan6_sys::iface::get_ifaddr6;
use wan6_sys::System;

/// Handler for the dhcp6c `script`, run whenever the client (re)binds.
pub struct Dhcp6cHook {
    ipv6_type: Ipv6Type,
    lan_auto: bool,
    dns_auto: bool,
    bridge: String,
    state: StateStore,
    sys: Arc<dyn System>,
    radvd: Radvd,
    resolv: ResolvConf,
}

impl Dhcp6cHook {
    pub fn new(config: &Config, state: StateStore, sys: Arc<dyn System>) -> Self {
        Self {
            ipv6_type: config.ipv6.ipv6_type,
            lan_auto: config.ipv6.lan_auto,
            dns_auto: config.ipv6.dns_auto,
            bridge: config.lan.bridge.clone(),
            radvd: Radvd::new(config, state.clone(), sys.clone()),
            resolv: ResolvConf::new(&config.paths.resolv_conf),
            state,
            sys,
        }
    }

    /// `new_domain_name_servers` is the space separated list exported by
    /// dhcp6c, if the server sent any.
    pub async fn run(&self, new_domain_name_servers: Option<&str>) -> anyhow::Result<()> {
        if self.ipv6_type != Ipv6Type::NativeDhcp6 {
            debug!(ipv6_type = %self.ipv6_type, "dhcp6c hook ignored");
            return Ok(());
        }

        if self.lan_auto {
            // the kernel has configured the delegated prefix on the bridge
            let lan_addr6 = get_ifaddr6(self.sys.as_ref(), &self.bridge)
                .await
                .unwrap_or_default();
            info!(bridge = %self.bridge, lan_addr6 = %lan_addr6, "delegated LAN address");
            self.radvd.update_lan_addr6(&lan_addr6)?;
        }

        if self.dns_auto {
            if let Some(dns6) = new_domain_name_servers.map(str::trim) {
                let state = self.state.load()?;
                if state.dns6 != dns6 {
                    let state = self.state.update(|s| s.dns6 = dns6.to_string())?;
                    let servers: Vec<&str> = state.dns6_servers().collect();
                    self.resolv.update(&servers).await?;
                }
            }
        }

        self.radvd.reload().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;
    use wan6_sys::mock::MockSystem;
    use wan6_sys::CmdOutput;

    struct Fixture {
        hook: Dhcp6cHook,
        state: StateStore,
        sys: Arc<MockSystem>,
        dir: TempDir,
    }

    fn fixture(ipv6_type: Ipv6Type) -> Fixture {
        let dir = TempDir::new().unwrap();
        let mut config = Config::default();
        config.ipv6.ipv6_type = ipv6_type;
        config.paths.radvd_conf = dir.path().join("radvd.conf");
        config.paths.resolv_conf = dir.path().join("resolv.conf");
        let state = StateStore::open(&dir.path().join("state.redb")).unwrap();
        let sys = Arc::new(MockSystem::new());
        let hook = Dhcp6cHook::new(&config, state.clone(), sys.clone());
        Fixture { hook, state, sys, dir }
    }

    #[tokio::test]
    async fn test_hook_ignored_for_other_types() {
        let f = fixture(Ipv6Type::SixToFour);
        f.hook.run(Some("2001:db8::53")).await.unwrap();
        assert!(f.sys.actions().is_empty());
        assert!(f.state.load().unwrap().dns6.is_empty());
    }

    #[tokio::test]
    async fn test_hook_stores_prefix_and_dns() {
        let f = fixture(Ipv6Type::NativeDhcp6);
        f.sys.respond(
            "ip -6 -o addr show dev br0 scope global",
            CmdOutput::ok("4: br0    inet6 2001:db8:77:1::1/64 scope global\n"),
        );

        f.hook.run(Some(" 2001:db8::53 2001:db8::54 ")).await.unwrap();

        let state = f.state.load().unwrap();
        assert_eq!(state.lan_addr6, "2001:db8:77:1::1/64");
        assert_eq!(state.dns6, "2001:db8::53 2001:db8::54");

        let resolv = std::fs::read_to_string(f.dir.path().join("resolv.conf")).unwrap();
        assert_eq!(resolv, "nameserver 2001:db8::53\nnameserver 2001:db8::54\n");

        let radvd = std::fs::read_to_string(f.dir.path().join("radvd.conf")).unwrap();
        assert!(radvd.contains("prefix 2001:db8:77:1::/64"));
    }

    #[tokio::test]
    async fn test_hook_unchanged_dns_keeps_resolv() {
        let f = fixture(Ipv6Type::NativeDhcp6);
        f.state.update(|s| s.dns6 = "2001:db8::53".into()).unwrap();

        f.hook.run(Some("2001:db8::53")).await.unwrap();
        assert!(!f.dir.path().join("resolv.conf").exists());
    }

    #[tokio::test]
    async fn test_hook_without_prefix_stops_radvd() {
        let f = fixture(Ipv6Type::NativeDhcp6);
        f.hook.run(None).await.unwrap();

        assert!(f.state.load().unwrap().lan_addr6.is_empty());
        // no LAN address: radvd is checked for and not started
        assert!(f.sys.commands().contains(&"pidof radvd".to_string()));
        assert!(!f.dir.path().join("radvd.conf").exists());
    }
}
