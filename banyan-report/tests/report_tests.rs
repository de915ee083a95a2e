//! Forwarding and endpoint tests against mock sinks.

use banyan_core::{HttpRequest, RuntimeMode};
use banyan_report::{
    CspReportController, ForwardedViolation, HttpLogSink, ReportError, ReportForwarder,
    SentrySink, ViolationSink, REPORT_PATH,
};
use serde_json::{Value, json};
use std::time::Duration;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const TIMEOUT: Duration = Duration::from_secs(2);

fn report() -> Value {
    json!({
        "csp-report": {
            "blocked-uri": "https://cdn.untrusted.example/lib.js",
            "document-uri": "https://console.banyanclaims.com/claims/42",
            "effective-directive": "script-src-elem",
            "violated-directive": "script-src",
            "original-policy": "default-src 'self'; report-uri /api/csp-report",
            "referrer": "https://console.banyanclaims.com/",
            "status-code": 200,
            "source-file": "https://console.banyanclaims.com/app.js",
            "line-number": 12,
            "script-sample": "alert(1)"
        }
    })
}

fn violation() -> ForwardedViolation {
    ForwardedViolation::from_report(RuntimeMode::Production, report()).unwrap()
}

async fn wait_for_requests(server: &MockServer, count: usize) -> Vec<wiremock::Request> {
    for _ in 0..50 {
        let requests = server.received_requests().await.unwrap_or_default();
        if requests.len() >= count {
            return requests;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    server.received_requests().await.unwrap_or_default()
}

#[tokio::test]
async fn test_log_sink_posts_json_with_bearer_token() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/ingest"))
        .and(header("authorization", "Bearer secret-token"))
        .respond_with(ResponseTemplate::new(202))
        .expect(1)
        .mount(&server)
        .await;

    let sink = HttpLogSink::new(
        format!("{}/ingest", server.uri()),
        Some("secret-token".to_string()),
        TIMEOUT,
    )
    .unwrap();

    sink.send(&violation()).await.unwrap();

    let requests = server.received_requests().await.unwrap();
    let body: Value = requests[0].body_json().unwrap();
    assert_eq!(body["type"], "csp-violation");
    assert_eq!(body["environment"], "production");
    assert_eq!(body["report"]["blocked-uri"], "https://cdn.untrusted.example/lib.js");
    assert_eq!(body["report"], report()["csp-report"]);
    assert!(body["timestamp"].as_str().unwrap().ends_with('Z'));
}

#[tokio::test]
async fn test_log_sink_without_token_sends_no_authorization() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let sink = HttpLogSink::new(server.uri(), None, TIMEOUT).unwrap();
    sink.send(&violation()).await.unwrap();

    let requests = server.received_requests().await.unwrap();
    assert!(!requests[0].headers.contains_key("authorization"));
}

#[tokio::test]
async fn test_log_sink_reports_rejection() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let sink = HttpLogSink::new(server.uri(), None, TIMEOUT).unwrap();
    let err = sink.send(&violation()).await.unwrap_err();

    assert!(matches!(
        err,
        ReportError::Status {
            sink: "logging-endpoint",
            status: 503
        }
    ));
}

#[tokio::test]
async fn test_sentry_sink_posts_raw_report() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/7/security/"))
        .and(query_param("sentry_key", "publickey"))
        .and(header("content-type", "application/csp-report"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let address = server.address();
    let dsn = format!("http://publickey@{}:{}/7", address.ip(), address.port());
    let sink = SentrySink::new(&dsn, TIMEOUT).unwrap();

    sink.send(&violation()).await.unwrap();

    let requests = server.received_requests().await.unwrap();
    let body: Value = requests[0].body_json().unwrap();
    assert_eq!(body, report());
    assert_eq!(body["csp-report"]["status-code"], 200);
    assert_eq!(body["csp-report"]["script-sample"], "alert(1)");
}

#[tokio::test]
async fn test_forwarder_survives_one_failing_sink() {
    let healthy = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&healthy)
        .await;

    let forwarder = ReportForwarder::new()
        .with_sink(HttpLogSink::new(healthy.uri(), None, TIMEOUT).unwrap())
        .with_sink(HttpLogSink::new("http://127.0.0.1:9/unreachable", None, TIMEOUT).unwrap());

    let outcome = forwarder.forward(&violation()).await;

    assert_eq!(outcome.delivered, 1);
    assert_eq!(outcome.failed, 1);
}

#[tokio::test]
async fn test_controller_forwards_accepted_report() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/ingest"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let forwarder = ReportForwarder::new().with_sink(
        HttpLogSink::new(format!("{}/ingest", server.uri()), None, TIMEOUT).unwrap(),
    );
    let controller = CspReportController::new(RuntimeMode::Production, forwarder);

    let request = HttpRequest::new("POST", REPORT_PATH)
        .with_header("Content-Type", "application/csp-report")
        .with_body(serde_json::to_vec(&report()).unwrap());
    let response = controller.handle(&request).unwrap();

    assert_eq!(response.status, 200);
    let body: Value = response.json().unwrap();
    assert_eq!(body["status"], "received");

    let requests = wait_for_requests(&server, 1).await;
    assert_eq!(requests.len(), 1);
    let forwarded: Value = requests[0].body_json().unwrap();
    assert_eq!(forwarded["report"], report()["csp-report"]);
}

#[tokio::test]
async fn test_controller_acknowledges_when_sink_unreachable() {
    let forwarder = ReportForwarder::new()
        .with_sink(HttpLogSink::new("http://127.0.0.1:9/ingest", None, TIMEOUT).unwrap());
    let controller = CspReportController::new(RuntimeMode::Development, forwarder);

    let request = HttpRequest::new("POST", REPORT_PATH)
        .with_body(serde_json::to_vec(&report()).unwrap());
    let response = controller.handle(&request).unwrap();

    assert_eq!(response.status, 200);
}

#[tokio::test]
async fn test_controller_rejects_without_forwarding() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let forwarder =
        ReportForwarder::new().with_sink(HttpLogSink::new(server.uri(), None, TIMEOUT).unwrap());
    let controller = CspReportController::new(RuntimeMode::Production, forwarder);

    let incomplete = json!({ "csp-report": { "blocked-uri": "inline" } });
    let request = HttpRequest::new("POST", REPORT_PATH)
        .with_body(serde_json::to_vec(&incomplete).unwrap());
    let response = controller.handle(&request).unwrap();

    assert_eq!(response.status, 400);
    let body: Value = response.json().unwrap();
    assert_eq!(body["error"], "Invalid CSP report format");
}
