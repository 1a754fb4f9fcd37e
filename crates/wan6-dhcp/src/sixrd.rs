use tracing::info;
use wan6_addr::SixRdOption;
use wan6_core::config::Ipv6Config;
use wan6_core::db::StateStore;
use wan6_core::error::Result;

/// Store the 6RD parameters received in DHCPv4 option 212.
///
/// Ignored (returns `false`) when the 6RD parameters are configured by hand.
pub fn store_ip6rd_from_dhcp(ipv6: &Ipv6Config, state: &StateStore, value: &str) -> Result<bool> {
    if !ipv6.wan_dhcp {
        return Ok(false);
    }

    let opt = SixRdOption::parse(value)?;
    state.update(|s| {
        s.addr6 = opt.prefix_string();
        s.sixrd_size = opt.ipv4_mask_len;
        s.sixrd_relay = opt.relay.to_string();
    })?;

    info!(
        prefix = %opt.prefix_string(),
        ipv4_mask_len = opt.ipv4_mask_len,
        relay = %opt.relay,
        "6rd parameters received via dhcp"
    );
    Ok(true)
}
