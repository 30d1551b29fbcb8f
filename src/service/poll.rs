//! The poll loop: scan, dispatch, respond, delete, reschedule.
//!
//! Every per-file failure is converted into a best-effort error response
//! or a log line inside the tick; nothing here may prevent the next
//! scheduled scan. Request files are deleted only after the response
//! write attempt, so a file that disappears always has a response keyed
//! to it (or a log entry for the dropped write).

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::time::sleep;
use uuid::Uuid;

use crate::commands::CommandExecutor;
use crate::error::BridgeError;
use crate::protocol::{codec, Response};
use crate::service::folders::CommsLayout;
use crate::service::ServiceLog;

/// Body of the spawned poll task. Runs until the shutdown channel fires;
/// a tick already in progress always runs to completion, only the next
/// one is cancelled.
pub(crate) async fn run(
    layout: CommsLayout,
    executor: Arc<CommandExecutor>,
    log: ServiceLog,
    interval: Duration,
    mut shutdown: watch::Receiver<bool>,
) {
    log.debug(&format!(
        "poll loop started, scanning every {} ms",
        interval.as_millis()
    ));

    loop {
        run_tick(&layout, &executor, &log).await;

        tokio::select! {
            _ = sleep(interval) => {}
            _ = shutdown.changed() => break,
        }
    }

    log.debug("poll loop exited");
}

/// One scan-and-process pass over the request directory.
pub(crate) async fn run_tick(layout: &CommsLayout, executor: &CommandExecutor, log: &ServiceLog) {
    // Self-heal: the watched directories may have been deleted under us.
    if !layout.requests.is_dir() || !layout.responses.is_dir() {
        log.info("communication folders missing, recreating");
        if let Err(e) = layout.ensure() {
            log.info(&format!("failed to recreate communication folders: {e}"));
            return;
        }
    }

    let mut entries = match tokio::fs::read_dir(&layout.requests).await {
        Ok(entries) => entries,
        Err(e) => {
            log.info(&format!("failed to scan request folder: {e}"));
            return;
        }
    };

    // Directory-listing order; the protocol guarantees nothing more.
    loop {
        let entry = match entries.next_entry().await {
            Ok(Some(entry)) => entry,
            Ok(None) => break,
            Err(e) => {
                log.info(&format!("request folder scan interrupted: {e}"));
                break;
            }
        };

        let path = entry.path();
        if path.extension().and_then(|ext| ext.to_str()) != Some("json") {
            continue;
        }

        let name = entry.file_name().to_string_lossy().into_owned();
        match entry.file_type().await {
            Ok(kind) if kind.is_file() => {}
            _ => {
                log.info(&format!("skipping non-regular entry: {name}"));
                continue;
            }
        }

        log.info(&format!("found request file: {name}"));
        process_request_file(layout, executor, &path, log).await;

        match tokio::fs::remove_file(&path).await {
            Ok(()) => log.debug(&format!("deleted request file: {name}")),
            Err(e) => log.info(&format!("failed to delete request file {name}: {e}")),
        }
    }
}

/// Decode and execute a single request file, then write its response.
/// The response is always attempted, even for unreadable or malformed
/// files, keyed by the file stem when the body yields no id.
async fn process_request_file(
    layout: &CommsLayout,
    executor: &CommandExecutor,
    path: &Path,
    log: &ServiceLog,
) {
    let fallback_id = path.file_stem().and_then(|stem| stem.to_str());

    let content = match tokio::fs::read_to_string(path).await {
        Ok(content) => content,
        Err(e) => {
            log.info(&format!("failed to read request file: {e}"));
            let response = Response::error(None, format!("failed to read request file: {e}"));
            write_response(layout, response, fallback_id, log).await;
            return;
        }
    };

    log.verbose(&format!("request body: {}", preview(&content)));

    let response = match codec::decode_request(&content) {
        Ok(request) => {
            log.info(&format!("processing request: {}", request.command));
            executor.execute(&request).await
        }
        Err(e) => {
            log.info(&format!("failed to decode request: {e}"));
            Response::error(None, e.to_string())
        }
    };

    write_response(layout, response, fallback_id, log).await;
}

/// Materialize a response file under `responses/{id}.json`.
///
/// Id resolution: the response's own id, else the originating file stem,
/// else a fresh UUID, so every response is addressable. The file appears
/// atomically (temp write + rename) and overwrites any previous response
/// under the same id. Write failures are logged and dropped; they must
/// not cross the poll-loop boundary.
pub(crate) async fn write_response(
    layout: &CommsLayout,
    mut response: Response,
    fallback_id: Option<&str>,
    log: &ServiceLog,
) {
    let id = match response.id.take() {
        Some(id) => id,
        None => fallback_id
            .map(str::to_string)
            .unwrap_or_else(|| Uuid::new_v4().to_string()),
    };
    response.id = Some(id.clone());

    let final_path = layout.response_path(&id);
    let tmp_path = layout.responses.join(format!(".{id}.json.tmp"));

    let written: Result<(), BridgeError> = async {
        let text = codec::encode_response(&response)?;
        tokio::fs::write(&tmp_path, text)
            .await
            .map_err(BridgeError::ResponseWrite)?;
        tokio::fs::rename(&tmp_path, &final_path)
            .await
            .map_err(BridgeError::ResponseWrite)?;
        Ok(())
    }
    .await;

    match written {
        Ok(()) => log.info(&format!("response written: {id}.json")),
        Err(e) => {
            log.info(&format!("failed to write response {id}.json: {e}"));
            let _ = tokio::fs::remove_file(&tmp_path).await;
        }
    }
}

fn preview(content: &str) -> String {
    const LIMIT: usize = 100;
    if content.len() <= LIMIT {
        content.to_string()
    } else {
        let cut = content
            .char_indices()
            .take_while(|(i, _)| *i < LIMIT)
            .last()
            .map(|(i, c)| i + c.len_utf8())
            .unwrap_or(0);
        format!("{}...", &content[..cut])
    }
}
