//! Operating system side effects: running networking tools, flipping
//! per-interface sysctls and controlling helper daemons.
//!
//! Everything goes through the [`System`] trait so the orchestration code can
//! be exercised against [`mock::MockSystem`].

pub mod iface;
pub mod ip;
pub mod mock;
pub mod process;
pub mod system;

pub use system::{exec, Cmd, CmdOutput, LinuxSystem, System};
