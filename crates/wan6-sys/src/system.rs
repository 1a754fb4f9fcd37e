use async_trait::async_trait;
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, warn};
use wan6_core::error::{Error, Result};

/// An external command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cmd {
    pub program: String,
    pub args: Vec<String>,
}

impl Cmd {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    pub fn arg(mut self, arg: impl ToString) -> Self {
        self.args.push(arg.to_string());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: ToString,
    {
        self.args.extend(args.into_iter().map(|a| a.to_string()));
        self
    }
}

impl fmt::Display for Cmd {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.program)?;
        for arg in &self.args {
            write!(f, " {arg}")?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CmdOutput {
    pub success: bool,
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl CmdOutput {
    pub fn ok(stdout: impl Into<String>) -> Self {
        Self {
            success: true,
            code: Some(0),
            stdout: stdout.into(),
            stderr: String::new(),
        }
    }

    pub fn failed(code: i32, stderr: impl Into<String>) -> Self {
        Self {
            success: false,
            code: Some(code),
            stdout: String::new(),
            stderr: stderr.into(),
        }
    }
}

/// The seam between WAN orchestration and the host.
#[async_trait]
pub trait System: Send + Sync {
    /// Run a command to completion and capture its output.
    async fn run(&self, cmd: &Cmd) -> Result<CmdOutput>;

    /// Write a value under `/proc/sys`, `key` being the relative path
    /// (`net/ipv6/conf/br0/accept_ra`).
    async fn write_sysctl(&self, key: &str, value: &str) -> Result<()>;

    async fn interface_exists(&self, ifname: &str) -> bool;

    async fn sleep(&self, duration: Duration);
}

/// Run a command, logging failures and carrying on. Returns whether it
/// succeeded.
pub async fn exec(sys: &dyn System, cmd: &Cmd) -> bool {
    match sys.run(cmd).await {
        Ok(out) if out.success => {
            debug!(command = %cmd, "command ok");
            true
        }
        Ok(out) => {
            warn!(
                command = %cmd,
                code = ?out.code,
                stderr = %out.stderr.trim(),
                "command failed"
            );
            false
        }
        Err(e) => {
            warn!(command = %cmd, "command failed: {e}");
            false
        }
    }
}

/// The real host, through `tokio::process`, `/proc/sys` and `/sys/class/net`.
pub struct LinuxSystem {
    proc_sys: PathBuf,
    sys_class_net: PathBuf,
}

impl LinuxSystem {
    pub fn new() -> Self {
        Self::with_roots("/proc/sys", "/sys/class/net")
    }

    pub fn with_roots(proc_sys: impl AsRef<Path>, sys_class_net: impl AsRef<Path>) -> Self {
        Self {
            proc_sys: proc_sys.as_ref().to_path_buf(),
            sys_class_net: sys_class_net.as_ref().to_path_buf(),
        }
    }
}

impl Default for LinuxSystem {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl System for LinuxSystem {
    async fn run(&self, cmd: &Cmd) -> Result<CmdOutput> {
        debug!(command = %cmd, "exec");
        let output = tokio::process::Command::new(&cmd.program)
            .args(&cmd.args)
            .output()
            .await
            .map_err(|e| Error::Command {
                command: cmd.to_string(),
                detail: e.to_string(),
            })?;

        Ok(CmdOutput {
            success: output.status.success(),
            code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }

    async fn write_sysctl(&self, key: &str, value: &str) -> Result<()> {
        let path = self.proc_sys.join(key);
        debug!(path = %path.display(), value, "sysctl");
        tokio::fs::write(&path, value).await?;
        Ok(())
    }

    async fn interface_exists(&self, ifname: &str) -> bool {
        tokio::fs::try_exists(self.sys_class_net.join(ifname))
            .await
            .unwrap_or(false)
    }

    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}
