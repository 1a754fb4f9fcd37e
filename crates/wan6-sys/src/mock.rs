//! An in-memory [`System`] that records every side effect.

use crate::system::{Cmd, CmdOutput, System};
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;
use wan6_core::error::Result;

/// Records commands, sysctl writes and sleeps in order. Commands succeed with
/// empty output unless a response was scripted for the exact command line.
#[derive(Default)]
pub struct MockSystem {
    actions: Mutex<Vec<String>>,
    interfaces: Mutex<HashSet<String>>,
    responses: Mutex<HashMap<String, Vec<CmdOutput>>>,
}

impl MockSystem {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_interface(self, ifname: &str) -> Self {
        self.add_interface(ifname);
        self
    }

    pub fn add_interface(&self, ifname: &str) {
        self.interfaces.lock().unwrap_or_else(PoisonError::into_inner).insert(ifname.to_string());
    }

    /// Script the output of `command_line`. Responses queue up; the last one
    /// keeps being returned once the queue is drained.
    pub fn respond(&self, command_line: &str, output: CmdOutput) {
        self.responses
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(command_line.to_string())
            .or_default()
            .push(output);
    }

    /// Every recorded action: `run <cmd>`, `sysctl <key>=<value>`, `sleep <ms>ms`.
    pub fn actions(&self) -> Vec<String> {
        self.actions.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// Just the command lines that were run.
    pub fn commands(&self) -> Vec<String> {
        self.actions()
            .into_iter()
            .filter_map(|a| a.strip_prefix("run ").map(String::from))
            .collect()
    }

    pub fn sysctls(&self) -> Vec<String> {
        self.actions()
            .into_iter()
            .filter_map(|a| a.strip_prefix("sysctl ").map(String::from))
            .collect()
    }

    fn record(&self, action: String) {
        self.actions.lock().unwrap_or_else(PoisonError::into_inner).push(action);
    }
}

#[async_trait]
impl System for MockSystem {
    async fn run(&self, cmd: &Cmd) -> Result<CmdOutput> {
        let line = cmd.to_string();
        self.record(format!("run {line}"));

        let output = {
            let mut responses = self.responses.lock().unwrap_or_else(PoisonError::into_inner);
            match responses.get_mut(&line) {
                Some(queue) if queue.len() > 1 => queue.remove(0),
                Some(queue) if !queue.is_empty() => queue[0].clone(),
                _ => CmdOutput::ok(""),
            }
        };
        Ok(output)
    }

    async fn write_sysctl(&self, key: &str, value: &str) -> Result<()> {
        self.record(format!("sysctl {key}={value}"));
        Ok(())
    }

    async fn interface_exists(&self, ifname: &str) -> bool {
        self.interfaces.lock().unwrap_or_else(PoisonError::into_inner).contains(ifname)
    }

    async fn sleep(&self, duration: Duration) {
        self.record(format!("sleep {}ms", duration.as_millis()));
    }
}
