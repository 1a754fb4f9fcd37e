use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// IPv6 transition mechanism selected for the WAN.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Ipv6Type {
    #[default]
    #[serde(rename = "disabled")]
    Disabled,
    #[serde(rename = "native-static")]
    NativeStatic,
    #[serde(rename = "native-dhcp6")]
    NativeDhcp6,
    #[serde(rename = "6to4")]
    SixToFour,
    #[serde(rename = "6in4")]
    SixInFour,
    #[serde(rename = "6rd")]
    SixRd,
}

impl Ipv6Type {
    /// 6in4, 6to4 and 6RD all ride a SIT tunnel over the IPv4 WAN.
    pub fn is_sit(self) -> bool {
        matches!(self, Ipv6Type::SixInFour | Ipv6Type::SixToFour | Ipv6Type::SixRd)
    }

    /// 6to4 and 6RD derive their addresses from the WAN IPv4 address.
    pub fn is_derived(self) -> bool {
        matches!(self, Ipv6Type::SixToFour | Ipv6Type::SixRd)
    }
}

impl std::fmt::Display for Ipv6Type {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Ipv6Type::Disabled => write!(f, "disabled"),
            Ipv6Type::NativeStatic => write!(f, "native-static"),
            Ipv6Type::NativeDhcp6 => write!(f, "native-dhcp6"),
            Ipv6Type::SixToFour => write!(f, "6to4"),
            Ipv6Type::SixInFour => write!(f, "6in4"),
            Ipv6Type::SixRd => write!(f, "6rd"),
        }
    }
}

impl std::str::FromStr for Ipv6Type {
    type Err = crate::error::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "disabled" | "off" => Ok(Ipv6Type::Disabled),
            "native-static" | "static" => Ok(Ipv6Type::NativeStatic),
            "native-dhcp6" | "dhcp6" => Ok(Ipv6Type::NativeDhcp6),
            "6to4" => Ok(Ipv6Type::SixToFour),
            "6in4" => Ok(Ipv6Type::SixInFour),
            "6rd" => Ok(Ipv6Type::SixRd),
            _ => Err(crate::error::Error::Config(format!(
                "unknown ipv6 type: {s}"
            ))),
        }
    }
}

/// Which device carries native IPv6 on the WAN.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WanIfKind {
    #[default]
    Ppp,
    Physical,
}

/// Runtime WAN variables derived from configuration, leases and the IPv4
/// link. Persisted between invocations of the tool.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WanState {
    /// Current WAN IPv4 address, empty when unknown.
    #[serde(default)]
    pub ipv4_addr: String,
    /// WAN IPv6 address, optionally with `/len`.
    #[serde(default)]
    pub addr6: String,
    #[serde(default)]
    pub gate6: String,
    /// Space separated IPv6 DNS servers.
    #[serde(default)]
    pub dns6: String,
    #[serde(default)]
    pub sixrd_relay: String,
    #[serde(default)]
    pub sixrd_size: u8,
    /// Address assigned to the LAN bridge, advertised by radvd.
    #[serde(default)]
    pub lan_addr6: String,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl WanState {
    pub fn dns6_servers(&self) -> impl Iterator<Item = &str> {
        self.dns6.split_whitespace()
    }
}
