//! Script execution seam for the `execute` command.
//!
//! The bridge hands arbitrary snippets to whatever automation capability
//! the host exposes. The default capability is the system shell: the
//! snippet runs in a spawned child process, which is also the isolation
//! boundary: nothing a snippet declares can reach service state.

use std::process::Stdio;

use async_trait::async_trait;
use serde_json::Value;
use tokio::process::Command;
use tracing::debug;

use crate::error::BridgeError;

/// Capability object that runs an `execute` snippet and yields its result.
///
/// Embedding hosts substitute their own automation surface here instead of
/// granting shell access.
#[async_trait]
pub trait ScriptRunner: Send + Sync {
    /// Run the snippet to completion. `Ok(None)` means the script
    /// succeeded without producing a value. Failures must come back as
    /// [`BridgeError::Execution`]; nothing here may panic.
    async fn run(&self, script: &str) -> Result<Option<Value>, BridgeError>;
}

/// Default runner: executes the snippet through the system shell.
///
/// There is deliberately no timeout: a snippet that never exits stalls the
/// current poll tick, which is the protocol's accepted trade for keeping
/// execution semantics simple.
#[derive(Debug, Clone)]
pub struct ShellRunner {
    shell: String,
    flag: String,
}

impl ShellRunner {
    pub fn new(shell: impl Into<String>, flag: impl Into<String>) -> Self {
        Self {
            shell: shell.into(),
            flag: flag.into(),
        }
    }
}

#[cfg(unix)]
impl Default for ShellRunner {
    fn default() -> Self {
        Self::new("sh", "-c")
    }
}

#[cfg(not(unix))]
impl Default for ShellRunner {
    fn default() -> Self {
        Self::new("cmd", "/C")
    }
}

#[async_trait]
impl ScriptRunner for ShellRunner {
    async fn run(&self, script: &str) -> Result<Option<Value>, BridgeError> {
        debug!(shell = %self.shell, "running script snippet");

        let output = Command::new(&self.shell)
            .arg(&self.flag)
            .arg(script)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| BridgeError::Execution(format!("failed to spawn shell: {e}")))?;

        if output.status.success() {
            let stdout = String::from_utf8_lossy(&output.stdout);
            Ok(value_from_output(stdout.trim()))
        } else {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let cause = match stderr.trim() {
                "" => format!("script exited with {}", output.status),
                text => text.to_string(),
            };
            Err(BridgeError::Execution(cause))
        }
    }
}

/// Promote captured stdout to a response result. Scripts return structured
/// data by printing JSON; anything else comes back as a plain string.
fn value_from_output(stdout: &str) -> Option<Value> {
    if stdout.is_empty() {
        return None;
    }
    match serde_json::from_str(stdout) {
        Ok(value) => Some(value),
        Err(_) => Some(Value::String(stdout.to_string())),
    }
}
