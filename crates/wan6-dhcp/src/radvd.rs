use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};
use wan6_addr::{parse_addr6, Addr6};
use wan6_core::config::Config;
use wan6_core::db::StateStore;
use wan6_sys::process::{is_running, kill_services, signal_service};
use wan6_sys::{exec, Cmd, System};

const RADVD: &str = "radvd";

/// Prefixes of this length are advertised for SLAAC.
const SLAAC_PREFIX_LEN: u8 = 64;

/// Render radvd.conf advertising the LAN prefix of `lan_addr6` on `bridge`.
///
/// The router itself is advertised as recursive DNS server.
pub fn render_radvd_conf(bridge: &str, lan_addr6: &Addr6) -> String {
    let len = lan_addr6.len.filter(|l| *l > 0 && *l < 128).unwrap_or(SLAAC_PREFIX_LEN);
    let prefix = Addr6 {
        addr: lan_addr6.addr,
        len: Some(len),
    }
    .network();
    let autonomous = if len == SLAAC_PREFIX_LEN { "on" } else { "off" };

    format!(
        "interface {bridge} {{\n \
         AdvSendAdvert on;\n \
         MinRtrAdvInterval 3;\n \
         MaxRtrAdvInterval 30;\n \
         AdvManagedFlag off;\n \
         AdvOtherConfigFlag on;\n \
         prefix {prefix} {{\n  \
         AdvOnLink on;\n  \
         AdvAutonomous {autonomous};\n \
         }};\n \
         RDNSS {addr} {{\n \
         }};\n\
         }};\n",
        addr = lan_addr6.addr,
    )
}

/// Router advertisement daemon on the LAN bridge.
pub struct Radvd {
    conf_path: PathBuf,
    bin: PathBuf,
    bridge: String,
    state: StateStore,
    sys: Arc<dyn System>,
}

impl Radvd {
    pub fn new(config: &Config, state: StateStore, sys: Arc<dyn System>) -> Self {
        Self {
            conf_path: config.paths.radvd_conf.clone(),
            bin: config.paths.radvd_bin.clone(),
            bridge: config.lan.bridge.clone(),
            state,
            sys,
        }
    }

    /// Remember the address assigned to the LAN bridge for the next reload.
    pub fn update_lan_addr6(&self, lan_addr6: &str) -> wan6_core::error::Result<()> {
        self.state.update(|s| s.lan_addr6 = lan_addr6.trim().to_string())?;
        Ok(())
    }

    /// Regenerate the configuration and make radvd pick it up. Without a
    /// usable LAN address there is nothing to advertise and radvd is stopped.
    pub async fn reload(&self) -> anyhow::Result<()> {
        let state = self.state.load()?;
        let lan_addr6 = match parse_addr6(&state.lan_addr6) {
            Ok(a) => a,
            Err(_) => {
                if !state.lan_addr6.is_empty() {
                    warn!(lan_addr6 = %state.lan_addr6, "unusable LAN address, not advertising");
                }
                self.stop().await;
                return Ok(());
            }
        };

        let conf = render_radvd_conf(&self.bridge, &lan_addr6);
        tokio::fs::write(&self.conf_path, conf).await.map_err(|e| {
            anyhow::anyhow!("failed to write {}: {e}", self.conf_path.display())
        })?;

        let sys = self.sys.as_ref();
        if is_running(sys, RADVD).await {
            info!(lan = %lan_addr6, "reloading radvd");
            signal_service(sys, RADVD, "HUP").await;
        } else {
            info!(lan = %lan_addr6, "starting radvd");
            if let Err(e) = sys.write_sysctl("net/ipv6/conf/all/forwarding", "1").await {
                warn!("failed to enable ipv6 forwarding: {e}");
            }
            let cmd = Cmd::new(self.bin.display().to_string())
                .arg("-C")
                .arg(self.conf_path.display());
            exec(sys, &cmd).await;
        }
        Ok(())
    }

    pub async fn stop(&self) {
        kill_services(self.sys.as_ref(), &[RADVD], 3, true).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;
    use wan6_sys::mock::MockSystem;
    use wan6_sys::CmdOutput;

    fn setup() -> (Radvd, Arc<MockSystem>, TempDir) {
        let dir = TempDir::new().unwrap();
        let mut config = Config::default();
        config.paths.radvd_conf = dir.path().join("radvd.conf");
        let state = StateStore::open(&dir.path().join("state.redb")).unwrap();
        let sys = Arc::new(MockSystem::new());
        (Radvd::new(&config, state, sys.clone()), sys, dir)
    }

    #[test]
    fn test_render_slaac_prefix() {
        let conf = render_radvd_conf("br0", &parse_addr6("2002:c000:201:1::1/64").unwrap());
        assert!(conf.starts_with("interface br0 {\n AdvSendAdvert on;\n"));
        assert!(conf.contains(" prefix 2002:c000:201:1::/64 {\n  AdvOnLink on;\n  AdvAutonomous on;\n };\n"));
        assert!(conf.contains(" RDNSS 2002:c000:201:1::1 {\n };\n"));
        assert!(conf.ends_with("};\n"));
    }

    #[test]
    fn test_render_non_slaac_prefix() {
        let conf = render_radvd_conf("br0", &parse_addr6("2001:db8:0:100::1/56").unwrap());
        assert!(conf.contains(" prefix 2001:db8:0:100::/56 {\n"));
        assert!(conf.contains("AdvAutonomous off;"));
    }

    #[tokio::test]
    async fn test_reload_starts_radvd() {
        let (radvd, sys, dir) = setup();
        radvd.update_lan_addr6("2001:db8:1::1/64").unwrap();
        radvd.reload().await.unwrap();

        assert!(dir.path().join("radvd.conf").exists());
        let conf_path = dir.path().join("radvd.conf");
        assert_eq!(
            sys.commands(),
            vec![
                "pidof radvd".to_string(),
                format!("/usr/sbin/radvd -C {}", conf_path.display()),
            ]
        );
        assert_eq!(sys.sysctls(), vec!["net/ipv6/conf/all/forwarding=1"]);
    }

    #[tokio::test]
    async fn test_reload_signals_running_radvd() {
        let (radvd, sys, _dir) = setup();
        sys.respond("pidof radvd", CmdOutput::ok("77\n"));
        radvd.update_lan_addr6("2001:db8:1::1/64").unwrap();
        radvd.reload().await.unwrap();

        assert_eq!(sys.commands(), vec!["pidof radvd", "killall -HUP radvd"]);
    }

    #[tokio::test]
    async fn test_reload_without_lan_addr_stops() {
        let (radvd, sys, dir) = setup();
        sys.respond("pidof radvd", CmdOutput::ok("77\n"));
        sys.respond("pidof radvd", CmdOutput::failed(1, ""));
        radvd.reload().await.unwrap();

        assert!(!dir.path().join("radvd.conf").exists());
        assert_eq!(sys.commands(), vec!["pidof radvd", "killall radvd", "pidof radvd"]);
    }
}
