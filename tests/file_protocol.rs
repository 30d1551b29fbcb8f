//! End-to-end protocol tests: a real service polling a temp folder,
//! driven the way an external controller would drive it.

use std::path::Path;
use std::time::Duration;

use serde_json::json;

use filebridge::client;
use filebridge::protocol::{codec, Response, ResponseStatus};
use filebridge::service::{CommsLayout, Service, ServiceConfig};

fn test_service(base: &Path) -> Service {
    Service::new(
        ServiceConfig::default()
            .with_base_path(base)
            .with_poll_interval(Duration::from_millis(25)),
    )
}

/// Publish a request body the way a well-behaved controller does:
/// temp write + rename, so the service never sees a partial file.
fn publish_request(layout: &CommsLayout, id: &str, body: &str) {
    let tmp = layout.requests.join(format!(".{id}.tmp"));
    std::fs::write(&tmp, body).unwrap();
    std::fs::rename(&tmp, layout.request_path(id)).unwrap();
}

async fn await_response(layout: &CommsLayout, id: &str) -> Response {
    let path = layout.response_path(id);
    for _ in 0..150 {
        if path.exists() {
            let text = std::fs::read_to_string(&path).unwrap();
            return codec::decode_response(&text).unwrap();
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    panic!("no response file appeared for {id}");
}

#[tokio::test]
async fn ping_round_trip() {
    let tmp = tempfile::tempdir().unwrap();
    let service = test_service(tmp.path());
    service.start().unwrap();

    publish_request(service.layout(), "t1", r#"{"id":"t1","command":"ping"}"#);

    let resp = await_response(service.layout(), "t1").await;
    assert_eq!(resp.id.as_deref(), Some("t1"));
    assert_eq!(resp.status, ResponseStatus::Ok);
    assert_eq!(resp.result, Some(json!("pong")));
    assert!(resp.timestamp > 0);
    assert!(!service.layout().request_path("t1").exists());

    service.stop().await;
}

#[cfg(unix)]
#[tokio::test]
async fn execute_returns_the_script_output() {
    let tmp = tempfile::tempdir().unwrap();
    let service = test_service(tmp.path());
    service.start().unwrap();

    publish_request(
        service.layout(),
        "t2",
        r#"{"id":"t2","command":"execute","script":"expr 1 + 1"}"#,
    );

    let resp = await_response(service.layout(), "t2").await;
    assert_eq!(resp.status, ResponseStatus::Ok);
    assert_eq!(resp.result, Some(json!(2)));

    service.stop().await;
}

#[cfg(unix)]
#[tokio::test]
async fn execute_failure_is_reported_in_the_message() {
    let tmp = tempfile::tempdir().unwrap();
    let service = test_service(tmp.path());
    service.start().unwrap();

    publish_request(
        service.layout(),
        "t3",
        r#"{"id":"t3","command":"execute","script":"echo boom >&2; exit 1"}"#,
    );

    let resp = await_response(service.layout(), "t3").await;
    assert_eq!(resp.status, ResponseStatus::Error);
    assert!(resp.message.unwrap().contains("boom"));
    assert!(resp.result.is_none());

    service.stop().await;
}

#[tokio::test]
async fn malformed_request_gets_an_error_response_and_the_loop_survives() {
    let tmp = tempfile::tempdir().unwrap();
    let service = test_service(tmp.path());
    service.start().unwrap();

    publish_request(service.layout(), "t4", r#"{"id":"t4","comman"#);

    let resp = await_response(service.layout(), "t4").await;
    assert_eq!(resp.id.as_deref(), Some("t4"));
    assert_eq!(resp.status, ResponseStatus::Error);
    assert!(!service.layout().request_path("t4").exists());

    // the still-running loop serves the next request normally
    publish_request(service.layout(), "t5", r#"{"id":"t5","command":"ping"}"#);
    let resp = await_response(service.layout(), "t5").await;
    assert_eq!(resp.result, Some(json!("pong")));

    service.stop().await;
}

#[tokio::test]
async fn unknown_command_names_the_offender() {
    let tmp = tempfile::tempdir().unwrap();
    let service = test_service(tmp.path());
    service.start().unwrap();

    publish_request(
        service.layout(),
        "t6",
        r#"{"id":"t6","command":"teleport"}"#,
    );

    let resp = await_response(service.layout(), "t6").await;
    assert_eq!(resp.status, ResponseStatus::Error);
    assert_eq!(
        resp.message.as_deref(),
        Some("Unknown command: teleport")
    );

    service.stop().await;
}

#[tokio::test]
async fn request_without_an_id_is_answered_under_the_file_name() {
    let tmp = tempfile::tempdir().unwrap();
    let service = test_service(tmp.path());
    service.start().unwrap();

    publish_request(service.layout(), "anon", r#"{"command":"ping"}"#);

    let resp = await_response(service.layout(), "anon").await;
    assert_eq!(resp.id.as_deref(), Some("anon"));
    assert_eq!(resp.result, Some(json!("pong")));

    service.stop().await;
}

#[tokio::test]
async fn client_round_trip_consumes_the_response() {
    let tmp = tempfile::tempdir().unwrap();
    let service = test_service(tmp.path());
    service.start().unwrap();

    let resp = client::ping(tmp.path()).await.unwrap();
    assert_eq!(resp.result, Some(json!("pong")));

    // the client deleted the response file after reading it
    assert_eq!(
        std::fs::read_dir(&service.layout().responses).unwrap().count(),
        0
    );

    service.stop().await;
    assert!(!client::service_running(tmp.path()).unwrap());
}

#[cfg(unix)]
#[tokio::test]
async fn client_scripts_can_return_structured_data() {
    let tmp = tempfile::tempdir().unwrap();
    let service = test_service(tmp.path());
    service.start().unwrap();

    let resp = client::execute_script(tmp.path(), r#"printf '{"sum": 2, "ok": true}'"#)
        .await
        .unwrap();
    assert_eq!(resp.status, ResponseStatus::Ok);
    assert_eq!(resp.result, Some(json!({"sum": 2, "ok": true})));

    service.stop().await;
}

#[tokio::test]
async fn accumulated_requests_are_all_answered_in_one_sweep() {
    let tmp = tempfile::tempdir().unwrap();
    let service = test_service(tmp.path());

    // drop a backlog before the service ever starts
    let layout = CommsLayout::ensured(tmp.path()).unwrap();
    for i in 0..5 {
        publish_request(
            &layout,
            &format!("bulk{i}"),
            &format!(r#"{{"id":"bulk{i}","command":"ping"}}"#),
        );
    }

    service.start().unwrap();
    for i in 0..5 {
        let resp = await_response(service.layout(), &format!("bulk{i}")).await;
        assert_eq!(resp.result, Some(json!("pong")));
    }
    assert_eq!(
        std::fs::read_dir(&service.layout().requests).unwrap().count(),
        0
    );

    service.stop().await;
}
