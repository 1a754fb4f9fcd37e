//! Range rules applied to user supplied tunnel and LAN parameters.

pub const MIN_SIT_MTU: u16 = 1280;
pub const DEFAULT_LAN_PREFIX_LEN: u8 = 64;

/// Any configured integer is accepted; out of range values are pulled into
/// `1280..=65535`.
pub fn clamp_sit_mtu(mtu: i64) -> u16 {
    u16::try_from(mtu.max(i64::from(MIN_SIT_MTU))).unwrap_or(u16::MAX)
}

pub fn clamp_sit_ttl(ttl: i64) -> u8 {
    u8::try_from(ttl.max(1)).unwrap_or(u8::MAX)
}

/// LAN prefix lengths outside 48..=80 fall back to /64.
pub fn clamp_lan_size(size: u8) -> u8 {
    if (48..=80).contains(&size) {
        size
    } else {
        DEFAULT_LAN_PREFIX_LEN
    }
}

/// Subnet-id length for a delegated prefix: `64 - lan_size`, kept within 0..=16.
pub fn sla_len(lan_size: u8) -> u8 {
    64u8.saturating_sub(lan_size).min(16)
}
