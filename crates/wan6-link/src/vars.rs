//! Derivation of the runtime WAN variables from the persisted settings.

use tracing::{info, warn};
use wan6_addr::{format_addr6, parse_addr6};
use wan6_core::config::{Ipv6Config, MAX_DNS6};
use wan6_core::db::StateStore;
use wan6_core::error::Result;

/// Static DNS servers joined by single spaces, or empty when DNS is learned
/// from the network.
pub fn static_dns6(ipv6: &Ipv6Config) -> String {
    if ipv6.is_wan_dns6_static() != Some(true) {
        return String::new();
    }
    ipv6.dns
        .iter()
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .take(MAX_DNS6)
        .collect::<Vec<_>>()
        .join(" ")
}

pub fn build_dns6_var(ipv6: &Ipv6Config, state: &StateStore) -> Result<()> {
    let dns6 = static_dns6(ipv6);
    state.update(|s| s.dns6 = dns6)?;
    Ok(())
}

/// Static WAN address normalised to `addr[/len]`. The configured size wins;
/// a length typed into the address is used when no size is configured.
pub fn static_addr6(ipv6: &Ipv6Config) -> String {
    let raw = ipv6.wan_addr.trim();
    if raw.is_empty() {
        return String::new();
    }
    match parse_addr6(raw) {
        Ok(a) => {
            let len = if ipv6.wan_size > 0 { ipv6.wan_size } else { a.len_or_zero() };
            format_addr6(a.addr, len)
        }
        Err(e) => {
            warn!(wan_addr = raw, "ignoring static ipv6 address: {e}");
            String::new()
        }
    }
}

/// Reset the runtime variables to what the configuration dictates, before
/// any lease or tunnel information is applied.
pub fn reset_wan6_vars(ipv6: &Ipv6Config, state: &StateStore) -> Result<()> {
    let (addr6, gate6) = if ipv6.is_wan_addr6_static() == Some(true) {
        (static_addr6(ipv6), ipv6.wan_gate.trim().to_string())
    } else {
        (String::new(), String::new())
    };
    let dns6 = static_dns6(ipv6);

    let state = state.update(|s| {
        s.addr6 = addr6;
        s.gate6 = gate6;
        s.sixrd_relay = ipv6.sixrd_relay.trim().to_string();
        s.sixrd_size = ipv6.sixrd_size;
        s.dns6 = dns6;
    })?;

    info!(
        ipv6_type = %ipv6.ipv6_type,
        addr6 = %state.addr6,
        gate6 = %state.gate6,
        dns6 = %state.dns6,
        "wan6 variables reset"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;
    use wan6_core::types::Ipv6Type;

    fn test_store() -> (StateStore, TempDir) {
        let dir = TempDir::new().unwrap();
        let store = StateStore::open(&dir.path().join("test.redb")).unwrap();
        (store, dir)
    }

    fn static_config() -> Ipv6Config {
        Ipv6Config {
            ipv6_type: Ipv6Type::NativeStatic,
            wan_addr: "2001:DB8:0:1::2".into(),
            wan_size: 64,
            wan_gate: "2001:db8:0:1::1".into(),
            dns: vec!["2001:db8::53".into(), "".into(), "2001:db8::54".into()],
            ..Default::default()
        }
    }

    #[test]
    fn test_static_dns_skips_blanks() {
        assert_eq!(static_dns6(&static_config()), "2001:db8::53 2001:db8::54");

        let auto = Ipv6Config {
            ipv6_type: Ipv6Type::NativeDhcp6,
            dns: vec!["2001:db8::53".into()],
            ..Default::default()
        };
        assert_eq!(static_dns6(&auto), "");
    }

    #[test]
    fn test_static_addr6_len_rules() {
        let mut ipv6 = static_config();
        assert_eq!(static_addr6(&ipv6), "2001:db8:0:1::2/64");

        ipv6.wan_size = 128;
        assert_eq!(static_addr6(&ipv6), "2001:db8:0:1::2");

        ipv6.wan_size = 0;
        ipv6.wan_addr = "2001:db8:0:1::2/56".into();
        assert_eq!(static_addr6(&ipv6), "2001:db8:0:1::2/56");

        ipv6.wan_addr = "bogus".into();
        assert_eq!(static_addr6(&ipv6), "");
    }

    #[test]
    fn test_reset_static() {
        let (store, _dir) = test_store();
        reset_wan6_vars(&static_config(), &store).unwrap();

        let state = store.load().unwrap();
        assert_eq!(state.addr6, "2001:db8:0:1::2/64");
        assert_eq!(state.gate6, "2001:db8:0:1::1");
        assert_eq!(state.dns6, "2001:db8::53 2001:db8::54");
    }

    #[test]
    fn test_reset_dynamic_clears_addresses() {
        let (store, _dir) = test_store();
        store
            .update(|s| {
                s.addr6 = "2001:db8::/32".into();
                s.gate6 = "fe80::1".into();
                s.ipv4_addr = "192.0.2.10".into();
            })
            .unwrap();

        let ipv6 = Ipv6Config {
            ipv6_type: Ipv6Type::SixRd,
            sixrd_relay: "192.0.2.1".into(),
            sixrd_size: 8,
            ..Default::default()
        };
        reset_wan6_vars(&ipv6, &store).unwrap();

        let state = store.load().unwrap();
        assert!(state.addr6.is_empty());
        assert!(state.gate6.is_empty());
        assert_eq!(state.sixrd_relay, "192.0.2.1");
        assert_eq!(state.sixrd_size, 8);
        // unrelated variables survive
        assert_eq!(state.ipv4_addr, "192.0.2.10");
    }

    #[test]
    fn test_build_dns6_var() {
        let (store, _dir) = test_store();
        store.update(|s| s.dns6 = "stale".into()).unwrap();

        let ipv6 = Ipv6Config {
            ipv6_type: Ipv6Type::NativeDhcp6,
            ..Default::default()
        };
        build_dns6_var(&ipv6, &store).unwrap();
        assert_eq!(store.load().unwrap().dns6, "");
    }
}
