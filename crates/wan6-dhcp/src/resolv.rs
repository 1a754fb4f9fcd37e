use std::path::PathBuf;
use tracing::info;
use wan6_core::error::Result;

/// Keeps the IPv6 `nameserver` entries of resolv.conf in sync with the WAN.
pub struct ResolvConf {
    path: PathBuf,
}

impl ResolvConf {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Replace all IPv6 nameservers with `dns6`. IPv4 servers, search
    /// domains and options are kept as they are.
    pub async fn update(&self, dns6: &[&str]) -> Result<()> {
        let current = match tokio::fs::read_to_string(&self.path).await {
            Ok(s) => s,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => String::new(),
            Err(e) => return Err(e.into()),
        };

        let content = merge_dns6(&current, dns6);
        tokio::fs::write(&self.path, content).await?;
        info!(path = %self.path.display(), dns6 = ?dns6, "resolv.conf updated");
        Ok(())
    }
}

fn is_v6_nameserver(line: &str) -> bool {
    let mut tokens = line.split_whitespace();
    tokens.next() == Some("nameserver") && tokens.next().is_some_and(|addr| addr.contains(':'))
}

pub fn merge_dns6(current: &str, dns6: &[&str]) -> String {
    let mut out: String = current
        .lines()
        .filter(|line| !is_v6_nameserver(line))
        .map(|line| format!("{line}\n"))
        .collect();
    for server in dns6 {
        out.push_str(&format!("nameserver {server}\n"));
    }
    out
}
