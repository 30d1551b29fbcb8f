use thiserror::Error;

/// Failure classes of the file protocol.
///
/// Display strings double as the `message` field of error responses, so
/// wording here is part of the wire contract (notably `UnknownCommand`).
#[derive(Debug, Error)]
pub enum BridgeError {
    /// A required communication directory could not be created or accessed.
    /// Fatal when starting the service; during polling it only triggers a
    /// recreation attempt on the next tick.
    #[error("folder setup failed: {0}")]
    FolderSetup(String),

    /// The request file body was not valid JSON or did not match the
    /// request schema. Isolated to the one file that carried it.
    #[error("invalid request: {0}")]
    Parse(#[from] serde_json::Error),

    /// The script handed to the `execute` command failed to run, or exited
    /// abnormally. Captured into the response, never propagated.
    #[error("script execution failed: {0}")]
    Execution(String),

    /// The request named a command outside the dispatch table.
    #[error("Unknown command: {0}")]
    UnknownCommand(String),

    /// The response file could not be materialized. Logged and dropped;
    /// the client recovers by resubmitting the request.
    #[error("failed to write response file: {0}")]
    ResponseWrite(#[from] std::io::Error),
}
