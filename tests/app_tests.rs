//! End-to-end tests for the banyan-shield application over HTTP.

use banyan_config::ShieldConfig;
use banyan_security::{parse_policy, policy_for_mode};
use banyan_shield::prelude::*;
use serde_json::{Value, json};
use tokio::net::TcpListener;
use tokio::sync::oneshot;

async fn spawn_app(app: ShieldApp) -> (String, oneshot::Sender<()>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (tx, rx) = oneshot::channel::<()>();

    tokio::spawn(async move {
        Server::new(addr, app)
            .serve_listener(listener, async {
                let _ = rx.await;
            })
            .await
            .unwrap();
    });

    (format!("http://{}", addr), tx)
}

fn config(vars: &'static [(&'static str, &'static str)]) -> ShieldConfig {
    ShieldConfig::from_lookup(move |key| {
        vars.iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| v.to_string())
    })
    .unwrap()
}

fn report() -> Value {
    json!({
        "csp-report": {
            "blocked-uri": "https://tracker.example.net/pixel.gif",
            "document-uri": "https://console.banyanclaims.com/dashboard",
            "effective-directive": "img-src",
            "violated-directive": "img-src",
            "original-policy": policy_for_mode(RuntimeMode::Production),
            "referrer": "",
            "status-code": 200
        }
    })
}

#[tokio::test]
async fn test_production_headers_over_http() {
    let app = ShieldApp::from_config(&config(&[("BANYAN_ENV", "production")])).unwrap();
    let (base, shutdown) = spawn_app(app).await;

    let response = reqwest::get(format!("{}/health", base)).await.unwrap();

    assert_eq!(response.status(), 200);
    let headers = response.headers().clone();
    assert_eq!(
        headers["content-security-policy"],
        policy_for_mode(RuntimeMode::Production).as_str()
    );
    assert_eq!(headers["x-frame-options"], "DENY");
    assert_eq!(headers["x-content-type-options"], "nosniff");
    assert!(headers.contains_key("strict-transport-security"));

    let body: Value = response.json().await.unwrap();
    assert_eq!(body["mode"], "production");

    let _ = shutdown.send(());
}

#[tokio::test]
async fn test_report_round_trip() {
    let app = ShieldApp::from_config(&config(&[])).unwrap();
    let (base, shutdown) = spawn_app(app).await;
    let client = reqwest::Client::new();

    let accepted = client
        .post(format!("{}/api/csp-report", base))
        .header("Content-Type", "application/csp-report")
        .body(serde_json::to_vec(&report()).unwrap())
        .send()
        .await
        .unwrap();
    assert_eq!(accepted.status(), 200);
    assert!(accepted.headers().contains_key("content-security-policy"));
    let body: Value = accepted.json().await.unwrap();
    assert_eq!(body["status"], "received");

    let rejected = client
        .post(format!("{}/api/csp-report", base))
        .json(&json!({ "csp-report": {} }))
        .send()
        .await
        .unwrap();
    assert_eq!(rejected.status(), 400);

    let liveness = client
        .get(format!("{}/api/csp-report", base))
        .send()
        .await
        .unwrap();
    assert_eq!(liveness.status(), 200);

    let _ = shutdown.send(());
}

#[tokio::test]
async fn test_strict_report_only_mode() {
    let app = ShieldApp::from_config(&config(&[
        ("BANYAN_ENV", "production"),
        ("BANYAN_CSP_STRICT", "true"),
        ("BANYAN_CSP_REPORT_ONLY", "yes"),
    ]))
    .unwrap();
    let (base, shutdown) = spawn_app(app).await;

    let first = reqwest::get(format!("{}/health", base)).await.unwrap();
    let second = reqwest::get(format!("{}/health", base)).await.unwrap();

    assert!(!first.headers().contains_key("content-security-policy"));

    let nonce = first.headers()["x-nonce"].to_str().unwrap().to_string();
    let policy = first.headers()["content-security-policy-report-only"]
        .to_str()
        .unwrap()
        .to_string();
    let directives = parse_policy(&policy);
    assert!(directives["script-src"].contains(&format!("'nonce-{}'", nonce)));
    assert_ne!(second.headers()["x-nonce"], nonce.as_str());

    let _ = shutdown.send(());
}

#[tokio::test]
async fn test_unknown_route() {
    let app = ShieldApp::from_config(&config(&[])).unwrap();
    let (base, shutdown) = spawn_app(app).await;

    let response = reqwest::get(format!("{}/wp-admin", base)).await.unwrap();

    assert_eq!(response.status(), 404);
    assert!(response.headers().contains_key("content-security-policy"));
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["status"], 404);

    let _ = shutdown.send(());
}
