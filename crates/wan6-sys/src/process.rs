//! Lifecycle of helper daemons (dhcp6c, radvd) by process name.

use crate::system::{exec, Cmd, System};
use std::time::Duration;
use tracing::{info, warn};

pub async fn is_running(sys: &dyn System, name: &str) -> bool {
    match sys.run(&Cmd::new("pidof").arg(name)).await {
        Ok(out) => out.success && !out.stdout.trim().is_empty(),
        Err(_) => false,
    }
}

/// Send a named signal (`HUP`, `KILL`, ...) to every process called `name`.
pub async fn signal_service(sys: &dyn System, name: &str, signal: &str) -> bool {
    exec(sys, &Cmd::new("killall").arg(format!("-{signal}")).arg(name)).await
}

/// Terminate services: SIGTERM, wait up to `wait_secs` for them to exit, then
/// SIGKILL the stragglers when `force` is set.
pub async fn kill_services(sys: &dyn System, names: &[&str], wait_secs: u32, force: bool) {
    let mut running = Vec::new();
    for name in names {
        if is_running(sys, name).await {
            running.push(*name);
        }
    }
    if running.is_empty() {
        return;
    }

    for name in &running {
        info!(service = %name, "stopping");
        exec(sys, &Cmd::new("killall").arg(name)).await;
    }

    for _ in 0..wait_secs {
        let mut still = Vec::new();
        for name in &running {
            if is_running(sys, name).await {
                still.push(*name);
            }
        }
        running = still;
        if running.is_empty() {
            return;
        }
        sys.sleep(Duration::from_secs(1)).await;
    }

    if force {
        for name in &running {
            warn!(service = %name, "did not exit, killing");
            signal_service(sys, name, "KILL").await;
        }
    }
}
