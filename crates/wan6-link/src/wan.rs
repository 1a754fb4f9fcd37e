use crate::sit::{plan_sit_tunnel, wan_ipv4, SitPlan};
use crate::vars;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};
use wan6_core::config::Config;
use wan6_core::db::StateStore;
use wan6_core::types::Ipv6Type;
use wan6_dhcp::dhcp6c::{Dhcp6Client, StartOutcome};
use wan6_dhcp::radvd::Radvd;
use wan6_sys::iface::{
    clear_if_addr6, clear_if_route6, control_if_ipv6, control_if_ipv6_autoconf,
    control_if_ipv6_dad, control_if_ipv6_radv,
};
use wan6_sys::ip::{self, DIRECT_DEFAULT_METRIC, GATEWAY_DEFAULT_METRIC};
use wan6_sys::{exec, System};

/// Time given to a native WAN link to settle before the DHCPv6 client starts.
const LINK_SETTLE: Duration = Duration::from_secs(2);

/// IPv6 WAN controller.
pub struct Wan6 {
    config: Config,
    state: StateStore,
    sys: Arc<dyn System>,
    dhcp6c: Dhcp6Client,
    radvd: Radvd,
}

impl Wan6 {
    pub fn new(config: Config, state: StateStore, sys: Arc<dyn System>) -> Self {
        let dhcp6c = Dhcp6Client::new(&config, sys.clone());
        let radvd = Radvd::new(&config, state.clone(), sys.clone());
        Self {
            config,
            state,
            sys,
            dhcp6c,
            radvd,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn state(&self) -> &StateStore {
        &self.state
    }

    fn sys(&self) -> &dyn System {
        self.sys.as_ref()
    }

    fn ipv6_type(&self) -> Ipv6Type {
        self.config.ipv6.ipv6_type
    }

    /// Record the current WAN IPv4 address, the local endpoint of SIT tunnels.
    pub fn set_wan_ipv4(&self, addr: &str) -> wan6_core::error::Result<()> {
        self.state.update(|s| s.ipv4_addr = addr.trim().to_string())?;
        Ok(())
    }

    pub fn reset_vars(&self) -> wan6_core::error::Result<()> {
        vars::reset_wan6_vars(&self.config.ipv6, &self.state)
    }

    pub fn build_dns6_var(&self) -> wan6_core::error::Result<()> {
        vars::build_dns6_var(&self.config.ipv6, &self.state)
    }

    /// Bring IPv6 up on `wan_ifname` once the WAN link is up.
    pub async fn up(&self, wan_ifname: &str) -> anyhow::Result<()> {
        if !self.config.ipv6.is_enabled() {
            return Ok(());
        }
        let ipv6_type = self.ipv6_type();
        info!(%ipv6_type, wan = wan_ifname, "wan6 up");

        self.dhcp6c.stop().await;
        self.build_dns6_var()?;

        let sys = self.sys();
        control_if_ipv6_dad(sys, &self.config.lan.bridge, true).await;

        let mut start_radvd_now = true;

        if ipv6_type.is_sit() {
            let state = self.state.load()?;
            self.start_sit_tunnel(ipv6_type, &state.ipv4_addr).await?;
        } else {
            control_if_ipv6_dad(sys, wan_ifname, true).await;

            if ipv6_type == Ipv6Type::NativeStatic {
                let state = self.state.load()?;
                control_if_ipv6_radv(sys, wan_ifname, false).await;
                clear_if_addr6(sys, wan_ifname).await;
                if !state.addr6.is_empty() {
                    exec(sys, &ip::addr6_add(&state.addr6, wan_ifname)).await;
                }
                if !state.gate6.is_empty() {
                    exec(sys, &ip::route6_add_host(&state.gate6, wan_ifname)).await;
                    exec(
                        sys,
                        &ip::route6_add_default_via(&state.gate6, None, GATEWAY_DEFAULT_METRIC),
                    )
                    .await;
                }
            } else {
                exec(sys, &ip::route6_add_default_dev(wan_ifname, DIRECT_DEFAULT_METRIC)).await;
                control_if_ipv6_autoconf(sys, wan_ifname, !self.config.ipv6.wan_dhcp).await;
                control_if_ipv6_radv(sys, wan_ifname, true).await;
                sys.sleep(LINK_SETTLE).await;

                match self.dhcp6c.start(wan_ifname).await {
                    Ok(StartOutcome::Started) => {}
                    Ok(StartOutcome::Skipped) => info!("DHCPv6 client not needed"),
                    Err(e) => error!("DHCPv6 client failed to start: {e:#}"),
                }
                // the client hook reloads radvd once a prefix is delegated
                if self.config.ipv6.lan_auto {
                    start_radvd_now = false;
                }
            }
        }

        if start_radvd_now {
            self.radvd.reload().await?;
        }
        Ok(())
    }

    /// Tear IPv6 down on `wan_ifname` when the WAN link goes away.
    pub async fn down(&self, wan_ifname: &str) -> anyhow::Result<()> {
        if !self.config.ipv6.is_enabled() {
            return Ok(());
        }
        let ipv6_type = self.ipv6_type();
        info!(%ipv6_type, wan = wan_ifname, "wan6 down");

        let sys = self.sys();
        self.radvd.stop().await;
        self.dhcp6c.stop().await;
        control_if_ipv6_radv(sys, wan_ifname, false).await;
        control_if_ipv6_autoconf(sys, wan_ifname, false).await;

        let sit_ifname = self.config.ipv6.sit_ifname.as_str();
        let wan6_ifname = if ipv6_type.is_sit() {
            if sys.interface_exists(sit_ifname).await {
                exec(sys, &ip::link_down(sit_ifname)).await;
            }
            sit_ifname
        } else {
            wan_ifname
        };

        clear_if_route6(sys, wan6_ifname).await;
        clear_if_addr6(sys, wan6_ifname).await;
        self.stop_sit_tunnel().await;

        self.state.clear_dns6()?;
        Ok(())
    }

    /// Build the SIT tunnel for `ipv6_type` over the WAN IPv4 address.
    /// Without a usable IPv4 address nothing is done.
    pub async fn start_sit_tunnel(&self, ipv6_type: Ipv6Type, wan_addr4: &str) -> anyhow::Result<()> {
        let Some(ipv4) = wan_ipv4(wan_addr4) else {
            warn!(wan_addr4, "no WAN IPv4 address, cannot start SIT tunnel");
            return Ok(());
        };

        let state = self.state.load()?;
        let plan = plan_sit_tunnel(&self.config.ipv6, ipv6_type, ipv4, &state)?;
        self.apply_sit_plan(&plan).await?;

        info!(
            ifname = %plan.ifname,
            local = %plan.local,
            remote = %plan.remote,
            addr6 = %plan.wan_addr6,
            gateway = ?plan.gateway,
            lan_addr6 = ?plan.lan_addr6,
            "SIT tunnel up"
        );
        Ok(())
    }

    async fn apply_sit_plan(&self, plan: &SitPlan) -> anyhow::Result<()> {
        let sys = self.sys();
        let sit = plan.ifname.as_str();

        if sys.interface_exists(sit).await {
            exec(sys, &ip::tunnel_del(sit)).await;
        }
        exec(sys, &ip::tunnel_add_sit(sit, &plan.remote, plan.local, plan.ttl)).await;
        if let Some(sixrd) = &plan.sixrd {
            exec(sys, &ip::tunnel_6rd(sit, sixrd.prefix, sixrd.relay_prefix)).await;
        }

        control_if_ipv6_radv(sys, sit, false).await;
        exec(sys, &ip::link_up_mtu(sit, plan.mtu)).await;
        control_if_ipv6(sys, sit, true).await;
        clear_if_addr6(sys, sit).await;
        exec(sys, &ip::addr6_add(&plan.wan_addr6, sit)).await;

        if plan.direct_default {
            exec(sys, &ip::route6_add_default_dev(sit, DIRECT_DEFAULT_METRIC)).await;
        }
        if let Some(gateway) = &plan.gateway {
            exec(
                sys,
                &ip::route6_add_default_via(gateway, Some(sit), GATEWAY_DEFAULT_METRIC),
            )
            .await;
        }

        if let Some(lan_addr6) = &plan.lan_addr6 {
            let bridge = self.config.lan.bridge.as_str();
            clear_if_addr6(sys, bridge).await;
            exec(sys, &ip::addr6_add(lan_addr6, bridge)).await;
            self.radvd.update_lan_addr6(lan_addr6)?;
        }
        Ok(())
    }

    pub async fn stop_sit_tunnel(&self) {
        let sit = self.config.ipv6.sit_ifname.as_str();
        if self.sys().interface_exists(sit).await {
            exec(self.sys(), &ip::tunnel_del(sit)).await;
        }
    }
}
