//! Command dispatch.
//!
//! The dispatch table is intentionally small: `ping` for liveness, plus
//! `execute` as the open-ended escape hatch into the host's automation
//! capability. Every branch yields a response; nothing thrown inside a
//! command may cross this boundary, so one bad request can never stop the
//! poll loop.

use tracing::{debug, info, warn};

use crate::commands::script::{ScriptRunner, ShellRunner};
use crate::error::BridgeError;
use crate::protocol::{Request, Response};

pub struct CommandExecutor {
    runner: Box<dyn ScriptRunner>,
}

impl CommandExecutor {
    pub fn new() -> Self {
        Self {
            runner: Box::new(ShellRunner::default()),
        }
    }

    /// Substitute the automation capability used by `execute` requests.
    pub fn with_runner(runner: Box<dyn ScriptRunner>) -> Self {
        Self { runner }
    }

    /// Run one decoded request to its terminal response.
    pub async fn execute(&self, request: &Request) -> Response {
        debug!(command = %request.command, id = ?request.id, "dispatching request");

        match request.command.as_str() {
            "ping" => {
                debug!("ping received");
                Response::ok(request.id.clone(), Some("pong".into()))
            }
            "execute" => self.run_script(request).await,
            other => {
                warn!(command = %other, "unknown command");
                Response::error(
                    request.id.clone(),
                    BridgeError::UnknownCommand(other.to_string()).to_string(),
                )
            }
        }
    }

    async fn run_script(&self, request: &Request) -> Response {
        let Some(script) = request.script.as_deref() else {
            return Response::error(
                request.id.clone(),
                BridgeError::Execution("`script` field must be a string".to_string()).to_string(),
            );
        };

        match self.runner.run(script).await {
            Ok(result) => {
                info!(id = ?request.id, "script executed successfully");
                Response::ok(request.id.clone(), result)
            }
            Err(err) => {
                warn!(id = ?request.id, error = %err, "script execution failed");
                Response::error(request.id.clone(), err.to_string())
            }
        }
    }
}

impl Default for CommandExecutor {
    fn default() -> Self {
        Self::new()
    }
}
