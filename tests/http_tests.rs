//! Integration tests that spin up a real HTTP server (in-memory fetcher,
//! ephemeral port) and exercise `/policies`, `/repositories`, and `/health`
//! against it, rather than mocking the router directly.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use pass_policy_service::http::{create_router, AppState};
use policy_core::error::Result as PolicyResult;
use policy_core::{BaseUris, Fetcher, RulesDocument};
use serde_json::{json, Map, Value};

struct FixtureFetcher(HashMap<String, Value>);

#[async_trait]
impl Fetcher for FixtureFetcher {
    async fn fetch(&self, url: &str) -> PolicyResult<Map<String, Value>> {
        self.0
            .get(url)
            .cloned()
            .and_then(|v| v.as_object().cloned())
            .ok_or_else(|| policy_core::PolicyError::External(format!("no fixture for {url}")))
    }
}

const RULES_DOC: &str = r#"{
    "policy-rules": [
        {
            "policy-id": "http://example.org/policies/nih",
            "description": "NIH public access policy",
            "type": "funder",
            "repositories": [
                { "repository-id": "http://example.org/repositories/pmc" }
            ],
            "conditions": [
                { "equals": { "${submission.funder.name}": "NIH" } }
            ]
        },
        {
            "policy-id": "http://example.org/policies/institution",
            "description": "Institutional deposit policy",
            "type": "institution",
            "repositories": [
                { "repository-id": "http://example.org/repositories/institutional" },
                { "repository-id": "*" }
            ]
        }
    ]
}"#;

async fn spawn_server(fetcher: FixtureFetcher) -> (std::net::SocketAddr, tokio::sync::oneshot::Sender<()>) {
    let rules = RulesDocument::parse(RULES_DOC.as_bytes()).expect("fixture rules document is schema-valid");
    let baseuris = BaseUris::new("http://example.org", "http://example.org");

    let state = Arc::new(AppState {
        rules: Arc::new(rules),
        fetcher: Arc::new(fetcher),
        baseuris,
    });

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("failed to bind ephemeral port");
    let addr = listener.local_addr().expect("failed to read local addr");

    let router = create_router(state);
    let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel();

    tokio::spawn(async move {
        axum::serve(listener, router)
            .with_graceful_shutdown(async {
                let _ = shutdown_rx.await;
            })
            .await
            .expect("test server error");
    });

    (addr, shutdown_tx)
}

fn submission_fixture() -> HashMap<String, Value> {
    let mut entities = HashMap::new();
    entities.insert(
        "http://example.org/submissions/1".to_string(),
        json!({
            "funder": "http://example.org/funders/nih",
            "effectivePolicies": [
                "http://example.org/policies/nih",
                "http://example.org/policies/institution"
            ]
        }),
    );
    entities.insert(
        "http://example.org/funders/nih".to_string(),
        json!({ "name": "NIH" }),
    );
    entities
}

#[tokio::test]
async fn health_check_reports_ok() {
    let (addr, _shutdown) = spawn_server(FixtureFetcher(submission_fixture())).await;

    let response = reqwest::get(format!("http://{addr}/health")).await.unwrap();
    assert_eq!(response.status(), reqwest::StatusCode::OK);

    let body: Value = response.json().await.unwrap();
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn policies_get_resolves_matching_policies_and_rewrites_ids() {
    let (addr, _shutdown) = spawn_server(FixtureFetcher(submission_fixture())).await;

    let response = reqwest::get(format!(
        "http://{addr}/policies?submission=http://example.org/submissions/1"
    ))
    .await
    .unwrap();
    assert_eq!(response.status(), reqwest::StatusCode::OK);

    let body: Vec<Value> = response.json().await.unwrap();
    let ids: Vec<&str> = body.iter().map(|p| p["id"].as_str().unwrap()).collect();
    assert_eq!(
        ids,
        vec![
            "http://example.org/policies/nih",
            "http://example.org/policies/institution",
        ]
    );
    assert_eq!(body[0]["type"], "funder");
    assert_eq!(body[1]["type"], "institution");
}

#[tokio::test]
async fn policies_get_without_submission_param_is_bad_request() {
    let (addr, _shutdown) = spawn_server(FixtureFetcher(submission_fixture())).await;

    let response = reqwest::get(format!("http://{addr}/policies")).await.unwrap();
    assert_eq!(response.status(), reqwest::StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn policies_post_accepts_form_encoded_submission() {
    let (addr, _shutdown) = spawn_server(FixtureFetcher(submission_fixture())).await;

    let client = reqwest::Client::new();
    let response = client
        .post(format!("http://{addr}/policies"))
        .form(&[("submission", "http://example.org/submissions/1")])
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), reqwest::StatusCode::OK);

    let body: Vec<Value> = response.json().await.unwrap();
    assert_eq!(body.len(), 2);
}

#[tokio::test]
async fn policies_post_with_wrong_content_type_is_rejected() {
    let (addr, _shutdown) = spawn_server(FixtureFetcher(submission_fixture())).await;

    let client = reqwest::Client::new();
    let response = client
        .post(format!("http://{addr}/policies"))
        .header("content-type", "application/json")
        .body("{\"submission\":\"http://example.org/submissions/1\"}")
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), reqwest::StatusCode::UNSUPPORTED_MEDIA_TYPE);
}

#[tokio::test]
async fn repositories_get_reconciles_against_effective_policies() {
    let (addr, _shutdown) = spawn_server(FixtureFetcher(submission_fixture())).await;

    let response = reqwest::get(format!(
        "http://{addr}/repositories?submission=http://example.org/submissions/1"
    ))
    .await
    .unwrap();
    assert_eq!(response.status(), reqwest::StatusCode::OK);

    let body: Value = response.json().await.unwrap();
    let required: Vec<&str> = body["required"]
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["id"].as_str().unwrap())
        .collect();
    let optional: Vec<&str> = body["optional"]
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["id"].as_str().unwrap())
        .collect();

    // The institution policy's wildcard branch [institutional, "*"] goes
    // through the one-of bucket, gets cut by the wildcard rule, and
    // demotes to optional (it never collides with the required bucket,
    // so there's nothing left to re-promote it).
    assert_eq!(required, vec!["http://example.org/repositories/pmc"]);
    assert_eq!(optional, vec!["http://example.org/repositories/institutional"]);
    assert!(body["oneOf"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn repositories_get_with_empty_submission_value_is_bad_request() {
    let (addr, _shutdown) = spawn_server(FixtureFetcher(submission_fixture())).await;

    let response = reqwest::get(format!("http://{addr}/repositories?submission=")).await.unwrap();
    assert_eq!(response.status(), reqwest::StatusCode::BAD_REQUEST);
}
