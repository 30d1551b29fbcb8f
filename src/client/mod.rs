//! Controller side of the file protocol.
//!
//! Mirrors what the service expects: write `requests/{id}.json`, then
//! poll for `responses/{id}.json` until it appears. The service makes no
//! latency promise, so waiting is always existence-polling with a
//! deadline, never a fixed sleep. Responses are consumed (deleted) after
//! reading; the protocol has no other garbage collection.

use std::path::Path;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use tokio::time::{sleep, Instant};
use tracing::debug;

use crate::protocol::{codec, now_millis, Request, Response};
use crate::service::folders::CommsLayout;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// How often to probe for the response file while waiting.
const PROBE_INTERVAL: Duration = Duration::from_millis(100);

/// Check the discovery file for a live instance. No round trip involved;
/// a stale "running" entry from a crashed service will still read as
/// running until something overwrites it.
pub fn service_running(base: &Path) -> Result<bool> {
    let layout = CommsLayout::new(base);
    match layout.read_info().context("reading service info file")? {
        Some(info) => Ok(info.is_running()),
        None => Ok(false),
    }
}

/// Submit one request and wait for its terminal response.
///
/// Fills in the id (`cli_<millis>_<pid>`) and timestamp when the caller
/// left them out. The request file is published with a temp-write +
/// rename so the service can never observe a partial body. Returns the
/// response envelope whatever its status; callers inspect `status`
/// themselves.
pub async fn send_command(base: &Path, mut request: Request, timeout: Duration) -> Result<Response> {
    let layout = CommsLayout::ensured(base).context("setting up communication folders")?;

    if !service_running(base)? {
        bail!("no running bridge service advertised at {}", base.display());
    }

    let id = request
        .id
        .clone()
        .unwrap_or_else(|| format!("cli_{}_{}", now_millis(), std::process::id()));
    request.id = Some(id.clone());
    if request.timestamp.is_none() {
        request.timestamp = Some(now_millis());
    }

    let text = codec::encode_request(&request)?;
    let request_path = layout.request_path(&id);
    let tmp_path = layout.requests.join(format!(".{id}.json.tmp"));
    tokio::fs::write(&tmp_path, text)
        .await
        .context("writing request file")?;
    tokio::fs::rename(&tmp_path, &request_path)
        .await
        .context("publishing request file")?;
    debug!(id = %id, "request file published");

    let response_path = layout.response_path(&id);
    let deadline = Instant::now() + timeout;

    loop {
        sleep(PROBE_INTERVAL).await;

        match tokio::fs::read_to_string(&response_path).await {
            Ok(text) => {
                let response = codec::decode_response(&text).context("parsing response file")?;
                let _ = tokio::fs::remove_file(&response_path).await;
                debug!(id = %id, "response consumed");
                return Ok(response);
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(e).context("reading response file"),
        }

        if Instant::now() >= deadline {
            bail!("timed out waiting for response to request {id}");
        }
    }
}

pub async fn ping(base: &Path) -> Result<Response> {
    send_command(base, Request::ping(), DEFAULT_TIMEOUT).await
}

pub async fn execute_script(base: &Path, script: &str) -> Result<Response> {
    send_command(base, Request::execute(script), DEFAULT_TIMEOUT).await
}
