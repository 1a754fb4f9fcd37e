use crate::types::{Ipv6Type, WanIfKind};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Maximum number of static IPv6 DNS servers.
pub const MAX_DNS6: usize = 3;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub wan: WanConfig,
    #[serde(default)]
    pub lan: LanConfig,
    #[serde(default)]
    pub ipv6: Ipv6Config,
    #[serde(default)]
    pub paths: PathsConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WanConfig {
    #[serde(default = "default_wan_ifname")]
    pub ifname: String,
    #[serde(default = "default_ppp_ifname")]
    pub ppp_ifname: String,
}

impl Default for WanConfig {
    fn default() -> Self {
        Self {
            ifname: default_wan_ifname(),
            ppp_ifname: default_ppp_ifname(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LanConfig {
    #[serde(default = "default_bridge")]
    pub bridge: String,
}

impl Default for LanConfig {
    fn default() -> Self {
        Self {
            bridge: default_bridge(),
        }
    }
}

/// Persisted IPv6 settings as entered in the router UI.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ipv6Config {
    #[serde(default, rename = "type")]
    pub ipv6_type: Ipv6Type,
    #[serde(default)]
    pub wan_if: WanIfKind,
    /// Obtain the WAN address by DHCP (DHCPv6 IA_NA, or option 212 for 6RD).
    #[serde(default = "default_true")]
    pub wan_dhcp: bool,
    #[serde(default)]
    pub wan_addr: String,
    #[serde(default)]
    pub wan_size: u8,
    #[serde(default)]
    pub wan_gate: String,
    #[serde(default = "default_true")]
    pub dns_auto: bool,
    #[serde(default)]
    pub dns: Vec<String>,
    /// Obtain the LAN prefix by DHCPv6 prefix delegation.
    #[serde(default = "default_true")]
    pub lan_auto: bool,
    #[serde(default = "default_lan_size")]
    pub lan_size: u8,
    #[serde(default = "default_sit_ifname")]
    pub sit_ifname: String,
    #[serde(default = "default_sit_mtu")]
    pub sit_mtu: i64,
    #[serde(default = "default_sit_ttl")]
    pub sit_ttl: i64,
    #[serde(default, rename = "6in4_remote")]
    pub sixin4_remote: String,
    #[serde(default = "default_sixto4_relay", rename = "6to4_relay")]
    pub sixto4_relay: String,
    #[serde(default, rename = "6rd_relay")]
    pub sixrd_relay: String,
    #[serde(default, rename = "6rd_size")]
    pub sixrd_size: u8,
}

impl Default for Ipv6Config {
    fn default() -> Self {
        Self {
            ipv6_type: Ipv6Type::Disabled,
            wan_if: WanIfKind::Ppp,
            wan_dhcp: true,
            wan_addr: String::new(),
            wan_size: 0,
            wan_gate: String::new(),
            dns_auto: true,
            dns: Vec::new(),
            lan_auto: true,
            lan_size: default_lan_size(),
            sit_ifname: default_sit_ifname(),
            sit_mtu: default_sit_mtu(),
            sit_ttl: default_sit_ttl(),
            sixin4_remote: String::new(),
            sixto4_relay: default_sixto4_relay(),
            sixrd_relay: String::new(),
            sixrd_size: 0,
        }
    }
}

impl Ipv6Config {
    pub fn is_enabled(&self) -> bool {
        self.ipv6_type != Ipv6Type::Disabled
    }

    /// Whether the WAN address comes from configuration rather than a server.
    /// `None` when IPv6 is disabled.
    pub fn is_wan_addr6_static(&self) -> Option<bool> {
        match self.ipv6_type {
            Ipv6Type::Disabled => None,
            Ipv6Type::NativeDhcp6 | Ipv6Type::SixToFour => Some(false),
            // a 6RD without DHCP option 212 is configured by hand
            _ if !self.wan_dhcp => Some(true),
            Ipv6Type::NativeStatic | Ipv6Type::SixInFour => Some(true),
            Ipv6Type::SixRd => Some(false),
        }
    }

    /// Whether DNS servers come from configuration. `None` when disabled.
    pub fn is_wan_dns6_static(&self) -> Option<bool> {
        match self.ipv6_type {
            Ipv6Type::Disabled => None,
            _ if !self.dns_auto => Some(true),
            t => Some(t != Ipv6Type::NativeDhcp6),
        }
    }

    /// `None` when disabled.
    pub fn is_wan_ipv6_type_sit(&self) -> Option<bool> {
        match self.ipv6_type {
            Ipv6Type::Disabled => None,
            t => Some(t.is_sit()),
        }
    }

    pub fn is_wan_ipv6_if_ppp(&self) -> bool {
        self.wan_if == WanIfKind::Ppp
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathsConfig {
    #[serde(default = "default_state_db")]
    pub state_db: PathBuf,
    #[serde(default = "default_dhcp6c_conf")]
    pub dhcp6c_conf: PathBuf,
    #[serde(default = "default_dhcp6c_bin")]
    pub dhcp6c_bin: PathBuf,
    #[serde(default = "default_dhcp6c_script")]
    pub dhcp6c_script: PathBuf,
    #[serde(default = "default_radvd_conf")]
    pub radvd_conf: PathBuf,
    #[serde(default = "default_radvd_bin")]
    pub radvd_bin: PathBuf,
    #[serde(default = "default_resolv_conf")]
    pub resolv_conf: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            state_db: default_state_db(),
            dhcp6c_conf: default_dhcp6c_conf(),
            dhcp6c_bin: default_dhcp6c_bin(),
            dhcp6c_script: default_dhcp6c_script(),
            radvd_conf: default_radvd_conf(),
            radvd_bin: default_radvd_bin(),
            resolv_conf: default_resolv_conf(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

// Default value functions
fn default_true() -> bool {
    true
}
fn default_wan_ifname() -> String {
    "eth3".to_string()
}
fn default_ppp_ifname() -> String {
    "ppp0".to_string()
}
fn default_bridge() -> String {
    "br0".to_string()
}
fn default_lan_size() -> u8 {
    64
}
fn default_sit_ifname() -> String {
    "sit1".to_string()
}
fn default_sit_mtu() -> i64 {
    1280
}
fn default_sit_ttl() -> i64 {
    64
}
fn default_sixto4_relay() -> String {
    "192.88.99.1".to_string()
}
fn default_state_db() -> PathBuf {
    PathBuf::from("/var/lib/wan6/state.redb")
}
fn default_dhcp6c_conf() -> PathBuf {
    PathBuf::from("/etc/dhcp6c.conf")
}
fn default_dhcp6c_bin() -> PathBuf {
    PathBuf::from("/sbin/dhcp6c")
}
fn default_dhcp6c_script() -> PathBuf {
    PathBuf::from("/sbin/dhcp6c.script")
}
fn default_radvd_conf() -> PathBuf {
    PathBuf::from("/etc/radvd.conf")
}
fn default_radvd_bin() -> PathBuf {
    PathBuf::from("/usr/sbin/radvd")
}
fn default_resolv_conf() -> PathBuf {
    PathBuf::from("/etc/resolv.conf")
}
fn default_log_level() -> String {
    "info".to_string()
}
fn default_log_format() -> String {
    "text".to_string()
}

impl Config {
    pub fn from_file(path: &std::path::Path) -> crate::error::Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| crate::error::Error::Config(format!("failed to read config: {e}")))?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> crate::error::Result<Self> {
        let config: Config = toml::from_str(content)
            .map_err(|e| crate::error::Error::Config(format!("failed to parse config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> crate::error::Result<()> {
        if self.ipv6.dns.len() > MAX_DNS6 {
            return Err(crate::error::Error::Config(format!(
                "at most {MAX_DNS6} ipv6 dns servers allowed, got {}",
                self.ipv6.dns.len()
            )));
        }
        if self.ipv6.ipv6_type == crate::types::Ipv6Type::SixInFour
            && self.ipv6.sixin4_remote.trim().is_empty()
        {
            return Err(crate::error::Error::Config(
                "6in4 requires ipv6.6in4_remote".to_string(),
            ));
        }
        Ok(())
    }

    /// Device that carries native IPv6 on the WAN side.
    pub fn wan6_ifname(&self) -> &str {
        if self.ipv6.is_wan_ipv6_if_ppp() {
            &self.wan.ppp_ifname
        } else {
            &self.wan.ifname
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use tempfile::TempDir;

    fn with_type(t: Ipv6Type) -> Ipv6Config {
        Ipv6Config {
            ipv6_type: t,
            ..Default::default()
        }
    }

    #[test]
    fn test_parse_minimal_config() {
        let config = Config::from_toml("").unwrap();
        assert_eq!(config.ipv6.ipv6_type, Ipv6Type::Disabled);
        assert_eq!(config.lan.bridge, "br0");
        assert_eq!(config.ipv6.sit_ifname, "sit1");
        assert_eq!(config.paths.dhcp6c_conf, PathBuf::from("/etc/dhcp6c.conf"));
        assert_eq!(config.logging.format, "text");
    }

    #[test]
    fn test_parse_full_config() {
        let toml_str = r#"
[wan]
ifname = "eth0"
ppp_ifname = "ppp1"

[lan]
bridge = "br-lan"

[ipv6]
type = "6rd"
wan_if = "physical"
wan_dhcp = false
wan_addr = "2001:db8::"
wan_size = 32
dns_auto = false
dns = ["2001:db8::53", "2001:db8::54"]
lan_size = 56
sit_mtu = 1480
sit_ttl = 128
6rd_relay = "192.0.2.1"
6rd_size = 8

[paths]
state_db = "/tmp/wan6.redb"

[logging]
level = "debug"
format = "json"
"#;
        let config = Config::from_toml(toml_str).unwrap();
        assert_eq!(config.ipv6.ipv6_type, Ipv6Type::SixRd);
        assert_eq!(config.ipv6.wan_if, WanIfKind::Physical);
        assert_eq!(config.wan6_ifname(), "eth0");
        assert_eq!(config.ipv6.sixrd_relay, "192.0.2.1");
        assert_eq!(config.ipv6.sixrd_size, 8);
        assert_eq!(config.ipv6.dns.len(), 2);
        assert_eq!(config.ipv6.sixto4_relay, "192.88.99.1"); // default
        assert_eq!(config.paths.state_db, PathBuf::from("/tmp/wan6.redb"));
    }

    #[test]
    fn test_reject_too_many_dns() {
        let toml_str = r#"
[ipv6]
type = "native-static"
dns = ["::1", "::2", "::3", "::4"]
"#;
        assert!(matches!(
            Config::from_toml(toml_str),
            Err(crate::error::Error::Config(_))
        ));
    }

    #[test]
    fn test_from_file_missing() {
        let dir = TempDir::new().unwrap();
        let err = Config::from_file(&dir.path().join("absent.toml")).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_from_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("wan6.toml");
        std::fs::write(&path, "[ipv6]\ntype = \"6to4\"\n").unwrap();
        let config = Config::from_file(&path).unwrap();
        assert_eq!(config.ipv6.ipv6_type, Ipv6Type::SixToFour);
    }

    #[test]
    fn test_out_of_range_tunnel_values_load() {
        let config =
            Config::from_toml("[ipv6]\ntype = \"6to4\"\nsit_ttl = 70000\nsit_mtu = -1\n").unwrap();
        assert_eq!(config.ipv6.sit_ttl, 70000);
        assert_eq!(config.ipv6.sit_mtu, -1);
    }

    #[test]
    fn test_is_enabled() {
        assert!(!with_type(Ipv6Type::Disabled).is_enabled());
        assert!(with_type(Ipv6Type::NativeDhcp6).is_enabled());
    }

    #[test]
    fn test_reject_6in4_without_remote() {
        assert!(Config::from_toml("[ipv6]\ntype = \"6in4\"\n").is_err());
        assert!(Config::from_toml("[ipv6]\ntype = \"6in4\"\n6in4_remote = \"203.0.113.1\"\n").is_ok());
    }

    #[test]
    fn test_reject_unknown_type() {
        assert!(Config::from_toml("[ipv6]\ntype = \"teredo\"\n").is_err());
    }

    #[test]
    fn test_wan6_ifname_defaults_to_ppp() {
        let config = Config::default();
        assert!(config.ipv6.is_wan_ipv6_if_ppp());
        assert_eq!(config.wan6_ifname(), "ppp0");
    }

    #[test]
    fn test_addr6_static_predicate() {
        assert_eq!(with_type(Ipv6Type::Disabled).is_wan_addr6_static(), None);
        assert_eq!(with_type(Ipv6Type::NativeDhcp6).is_wan_addr6_static(), Some(false));
        assert_eq!(with_type(Ipv6Type::SixToFour).is_wan_addr6_static(), Some(false));
        assert_eq!(with_type(Ipv6Type::NativeStatic).is_wan_addr6_static(), Some(true));
        assert_eq!(with_type(Ipv6Type::SixInFour).is_wan_addr6_static(), Some(true));
        assert_eq!(with_type(Ipv6Type::SixRd).is_wan_addr6_static(), Some(false));

        let mut manual_6rd = with_type(Ipv6Type::SixRd);
        manual_6rd.wan_dhcp = false;
        assert_eq!(manual_6rd.is_wan_addr6_static(), Some(true));

        // dhcp6 and 6to4 ignore the wan_dhcp toggle
        let mut dhcp6 = with_type(Ipv6Type::NativeDhcp6);
        dhcp6.wan_dhcp = false;
        assert_eq!(dhcp6.is_wan_addr6_static(), Some(false));
    }

    #[test]
    fn test_dns6_static_predicate() {
        assert_eq!(with_type(Ipv6Type::Disabled).is_wan_dns6_static(), None);
        assert_eq!(with_type(Ipv6Type::NativeDhcp6).is_wan_dns6_static(), Some(false));
        for t in [
            Ipv6Type::NativeStatic,
            Ipv6Type::SixInFour,
            Ipv6Type::SixToFour,
            Ipv6Type::SixRd,
        ] {
            assert_eq!(with_type(t).is_wan_dns6_static(), Some(true), "{t}");
        }

        let mut manual = with_type(Ipv6Type::NativeDhcp6);
        manual.dns_auto = false;
        assert_eq!(manual.is_wan_dns6_static(), Some(true));
    }

    #[test]
    fn test_sit_predicate() {
        assert_eq!(with_type(Ipv6Type::Disabled).is_wan_ipv6_type_sit(), None);
        assert_eq!(with_type(Ipv6Type::SixRd).is_wan_ipv6_type_sit(), Some(true));
        assert_eq!(with_type(Ipv6Type::NativeStatic).is_wan_ipv6_type_sit(), Some(false));
    }
}
