//! Wire format of the file protocol.
//!
//! Requests and responses travel as JSON files in a watched directory
//! tree; the structs here are the typed envelopes for both sides, plus
//! the discovery payload clients read to detect a live service.

pub mod codec;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Discovery file written at the base of the communication folder.
pub const INFO_FILE_NAME: &str = "ae-mcp-info.json";
/// Subdirectory scanned for pending request files.
pub const REQUESTS_DIR: &str = "requests";
/// Subdirectory receiving completed response files.
pub const RESPONSES_DIR: &str = "responses";
/// Transport identifier advertised in the discovery file.
pub const PROTOCOL_NAME: &str = "file";

/// Epoch milliseconds, the timestamp unit used throughout the protocol.
pub fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}

/// A command dropped into the request directory by an external controller.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Request {
    /// Caller-supplied correlation id; the service derives one from the
    /// file name (or generates one) when absent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub command: String,
    /// Present only for `execute` requests.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub script: Option<String>,
    /// Creation time, informational only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<i64>,
}

impl Request {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            id: None,
            command: command.into(),
            script: None,
            timestamp: Some(now_millis()),
        }
    }

    pub fn ping() -> Self {
        Self::new("ping")
    }

    pub fn execute(script: impl Into<String>) -> Self {
        let mut req = Self::new("execute");
        req.script = Some(script.into());
        req
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseStatus {
    Ok,
    Error,
}

/// Terminal outcome of a consumed request, written once as
/// `responses/{id}.json` and never mutated afterward.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Response {
    /// Always present on disk; optional here because the executor may not
    /// know the id yet. The response writer resolves a fallback before
    /// the file is materialized.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub timestamp: i64,
    pub status: ResponseStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl Response {
    pub fn ok(id: Option<String>, result: Option<Value>) -> Self {
        Self {
            id,
            timestamp: now_millis(),
            status: ResponseStatus::Ok,
            result,
            message: None,
        }
    }

    pub fn error(id: Option<String>, message: impl Into<String>) -> Self {
        Self {
            id,
            timestamp: now_millis(),
            status: ResponseStatus::Error,
            result: None,
            message: Some(message.into()),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.status == ResponseStatus::Ok
    }
}

/// Contents of the discovery file. Lets clients check for a compatible
/// live instance without a request round trip.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceInfo {
    pub version: String,
    pub status: String,
    pub timestamp: i64,
    #[serde(rename = "hostVersion")]
    pub host_version: String,
    pub protocol: String,
}

impl ServiceInfo {
    pub fn new(status: impl Into<String>) -> Self {
        Self {
            version: crate::VERSION.to_string(),
            status: status.into(),
            timestamp: now_millis(),
            host_version: format!("{}-{}", std::env::consts::OS, std::env::consts::ARCH),
            protocol: PROTOCOL_NAME.to_string(),
        }
    }

    pub fn is_running(&self) -> bool {
        self.status == "running"
    }
}
