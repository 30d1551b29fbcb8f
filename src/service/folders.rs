//! Communication folder layout and the discovery file.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::error::BridgeError;
use crate::protocol::{ServiceInfo, INFO_FILE_NAME, REQUESTS_DIR, RESPONSES_DIR};

/// Resolved paths of one communication tree:
/// `<base>/requests`, `<base>/responses`, `<base>/ae-mcp-info.json`.
#[derive(Debug, Clone)]
pub struct CommsLayout {
    pub base: PathBuf,
    pub requests: PathBuf,
    pub responses: PathBuf,
    pub info_file: PathBuf,
}

impl CommsLayout {
    pub fn new(base: impl Into<PathBuf>) -> Self {
        let base = base.into();
        Self {
            requests: base.join(REQUESTS_DIR),
            responses: base.join(RESPONSES_DIR),
            info_file: base.join(INFO_FILE_NAME),
            base,
        }
    }

    /// Create any missing directories, leaving existing ones and their
    /// contents untouched. Safe to call repeatedly; also used by the poll
    /// loop to self-heal when a directory vanishes mid-run.
    pub fn ensure(&self) -> Result<(), BridgeError> {
        for dir in [&self.base, &self.requests, &self.responses] {
            fs::create_dir_all(dir)
                .map_err(|e| BridgeError::FolderSetup(format!("{}: {e}", dir.display())))?;
            debug!(dir = %dir.display(), "communication folder ready");
        }
        Ok(())
    }

    /// Write the discovery file advertising protocol version and
    /// liveness. Clients read this to detect a compatible instance
    /// without a request round trip.
    pub fn write_info(&self, status: &str) -> Result<(), BridgeError> {
        let info = ServiceInfo::new(status);
        let text = serde_json::to_string_pretty(&info)?;
        fs::write(&self.info_file, text)
            .map_err(|e| BridgeError::FolderSetup(format!("{}: {e}", self.info_file.display())))?;
        info!(status = %status, "service info file written");
        Ok(())
    }

    /// Read back the discovery file, if present.
    pub fn read_info(&self) -> Result<Option<ServiceInfo>, BridgeError> {
        let text = match fs::read_to_string(&self.info_file) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(BridgeError::FolderSetup(format!(
                    "{}: {e}",
                    self.info_file.display()
                )))
            }
        };
        Ok(Some(serde_json::from_str(&text)?))
    }

    pub fn request_path(&self, id: &str) -> PathBuf {
        self.requests.join(format!("{id}.json"))
    }

    pub fn response_path(&self, id: &str) -> PathBuf {
        self.responses.join(format!("{id}.json"))
    }
}

impl CommsLayout {
    /// Convenience used by tests and the client: a layout rooted at an
    /// arbitrary path, folders guaranteed to exist.
    pub fn ensured(base: impl AsRef<Path>) -> Result<Self, BridgeError> {
        let layout = Self::new(base.as_ref());
        layout.ensure()?;
        Ok(layout)
    }
}
