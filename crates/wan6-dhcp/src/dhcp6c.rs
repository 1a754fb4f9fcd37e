use std::fmt::Write as _;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use wan6_addr::clamp::sla_len;
use wan6_core::config::Config;
use wan6_sys::process::kill_services;
use wan6_sys::{Cmd, System};

/// Identity association id used for both IA_NA and IA_PD.
const IA_ID: u32 = 0;

/// Subnet id of the LAN bridge within the delegated prefix.
const SLA_ID: u32 = 1;

const DHCP6C: &str = "dhcp6c";

/// Inputs of the dhcp6c configuration file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dhcp6cOptions {
    pub wan_ifname: String,
    pub lan_ifname: String,
    /// Request a WAN address (IA_NA).
    pub wan_dhcp: bool,
    pub dns_auto: bool,
    /// Request a delegated prefix (IA_PD) for the LAN.
    pub lan_auto: bool,
    pub sla_len: u8,
    pub script: PathBuf,
}

impl Dhcp6cOptions {
    /// Nothing to ask the server for.
    pub fn is_idle(&self) -> bool {
        !self.wan_dhcp && !self.dns_auto && !self.lan_auto
    }
}

pub fn render_dhcp6c_conf(opts: &Dhcp6cOptions) -> String {
    let mut out = String::new();

    // writeln! into a String cannot fail
    let _ = writeln!(out, "interface {} {{", opts.wan_ifname);
    if opts.wan_dhcp {
        let _ = writeln!(out, " send ia-na {IA_ID};");
    }
    if opts.lan_auto {
        let _ = writeln!(out, " send ia-pd {IA_ID};");
    }
    if opts.wan_dhcp || opts.lan_auto {
        out.push_str(" send rapid-commit;\n");
    } else {
        out.push_str(" information-only;\n");
    }
    if opts.dns_auto {
        out.push_str(" request domain-name-servers;\n");
    }
    let _ = writeln!(out, " script \"{}\";", opts.script.display());
    out.push_str("};\n");

    if opts.wan_dhcp {
        let _ = writeln!(out, "id-assoc na {IA_ID} {{ }};");
    }
    if opts.lan_auto {
        let _ = writeln!(out, "id-assoc pd {IA_ID} {{");
        let _ = writeln!(out, " prefix-interface {} {{", opts.lan_ifname);
        let _ = writeln!(out, "  sla-id {SLA_ID};");
        let _ = writeln!(out, "  sla-len {};", opts.sla_len);
        out.push_str(" };\n");
        out.push_str("};\n");
    }

    out
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartOutcome {
    /// Every DHCPv6 feature is turned off.
    Skipped,
    Started,
}

/// The WAN DHCPv6 client.
pub struct Dhcp6Client {
    conf_path: PathBuf,
    bin: PathBuf,
    script: PathBuf,
    lan_ifname: String,
    wan_dhcp: bool,
    dns_auto: bool,
    lan_auto: bool,
    lan_size: u8,
    sys: Arc<dyn System>,
}

impl Dhcp6Client {
    pub fn new(config: &Config, sys: Arc<dyn System>) -> Self {
        Self {
            conf_path: config.paths.dhcp6c_conf.clone(),
            bin: config.paths.dhcp6c_bin.clone(),
            script: config.paths.dhcp6c_script.clone(),
            lan_ifname: config.lan.bridge.clone(),
            wan_dhcp: config.ipv6.wan_dhcp,
            dns_auto: config.ipv6.dns_auto,
            lan_auto: config.ipv6.lan_auto,
            lan_size: config.ipv6.lan_size,
            sys,
        }
    }

    pub fn options(&self, wan_ifname: &str) -> Dhcp6cOptions {
        Dhcp6cOptions {
            wan_ifname: wan_ifname.to_string(),
            lan_ifname: self.lan_ifname.clone(),
            wan_dhcp: self.wan_dhcp,
            dns_auto: self.dns_auto,
            lan_auto: self.lan_auto,
            sla_len: sla_len(self.lan_size),
            script: self.script.clone(),
        }
    }

    /// Write the configuration and launch the client on `wan_ifname`.
    pub async fn start(&self, wan_ifname: &str) -> anyhow::Result<StartOutcome> {
        let opts = self.options(wan_ifname);
        if opts.is_idle() {
            return Ok(StartOutcome::Skipped);
        }

        let conf = render_dhcp6c_conf(&opts);
        tokio::fs::write(&self.conf_path, conf).await.map_err(|e| {
            anyhow::anyhow!("failed to write {}: {e}", self.conf_path.display())
        })?;

        info!(wan = wan_ifname, "DHCPv6 WAN client starting");

        let cmd = Cmd::new(self.bin.display().to_string()).args(["-D", "LL", wan_ifname]);
        let out = self.sys.run(&cmd).await?;
        if !out.success {
            anyhow::bail!("dhcp6c exited with {:?}: {}", out.code, out.stderr.trim());
        }
        Ok(StartOutcome::Started)
    }

    pub async fn stop(&self) {
        kill_services(self.sys.as_ref(), &[DHCP6C], 3, true).await;
    }
}
