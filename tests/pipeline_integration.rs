//! Integration tests for the end-to-end test pipeline

use std::time::Duration;

use httpmock::prelude::*;
use pretty_assertions::assert_eq;
use serde_json::{Value, json};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

use web_pilot::browser::BrowserClient;
use web_pilot::config::LlmSettings;
use web_pilot::llm::Provider;
use web_pilot::runner::{RunConfig, RunOutcome, run_test};

fn plan_value() -> Value {
    json!({
        "url": "http://example.com",
        "test_plan": {
            "description": "Check the landing page headline",
            "steps": [
                {"action": "navigate", "value": "http://example.com"},
                {"action": "check", "selector": "h1", "value": "Example Domain"}
            ]
        }
    })
}

/// Mock the Anthropic messages endpoint: one response for plan
/// generation, one for analysis, told apart by their prompts.
async fn mock_llm(server: &MockServer, plan: &Value, analysis: &str) {
    let plan_text = plan.to_string();
    server
        .mock_async(move |when, then| {
            when.method(POST)
                .path("/messages")
                .body_includes("Create a test plan");
            then.status(200)
                .json_body(json!({"content": [{"type": "text", "text": plan_text}]}));
        })
        .await;

    let analysis = analysis.to_string();
    server
        .mock_async(move |when, then| {
            when.method(POST)
                .path("/messages")
                .body_includes("Analyze these test results");
            then.status(200)
                .json_body(json!({"content": [{"type": "text", "text": analysis}]}));
        })
        .await;
}

fn config_for(server: &MockServer, output_dir: &std::path::Path) -> RunConfig {
    let mut llm = LlmSettings::defaults();
    llm.anthropic_url = server.base_url();
    llm.anthropic_api_key = "test-key".to_string();

    RunConfig {
        target_url: "http://example.com".to_string(),
        requirement: "the headline reads Example Domain".to_string(),
        executor_url: server.base_url(),
        output_dir: output_dir.to_path_buf(),
        timeout: Duration::from_secs(30),
        max_retries: 1,
        provider: Provider::Anthropic,
        llm,
    }
}

#[tokio::test]
async fn test_full_pipeline_happy_path() {
    let server = MockServer::start_async().await;
    let output = tempfile::tempdir().unwrap();

    server
        .mock_async(|when, then| {
            when.method(POST).path("/navigate");
            then.status(200).body("<html><h1>Example Domain</h1></html>");
        })
        .await;
    let execute = server
        .mock_async(|when, then| {
            when.method(POST).path("/execute").json_body(plan_value());
            then.status(200)
                .json_body(json!({"result": "success", "steps_executed": 2}));
        })
        .await;
    mock_llm(&server, &plan_value(), "## Summary\nBoth steps passed.").await;

    let outcome = run_test(&config_for(&server, output.path())).await;

    match &outcome {
        RunOutcome::Success {
            test_plan,
            results,
            analysis,
        } => {
            assert_eq!(*test_plan, plan_value());
            assert_eq!(*results, json!({"result": "success", "steps_executed": 2}));
            assert!(analysis.contains("Both steps passed."));
        }
        RunOutcome::Failure { error } => panic!("pipeline failed: {}", error),
    }
    execute.assert_hits_async(1).await;

    // All three artifacts land in the output directory.
    let plan_raw = std::fs::read_to_string(output.path().join("plan.json")).unwrap();
    assert_eq!(serde_json::from_str::<Value>(&plan_raw).unwrap(), plan_value());
    assert!(output.path().join("results.json").exists());
    let analysis_raw = std::fs::read_to_string(output.path().join("analysis.md")).unwrap();
    assert!(analysis_raw.contains("Both steps passed."));
}

#[tokio::test]
async fn test_pipeline_reports_malformed_plan() {
    let server = MockServer::start_async().await;
    let output = tempfile::tempdir().unwrap();

    server
        .mock_async(|when, then| {
            when.method(POST).path("/navigate");
            then.status(200).body("<html></html>");
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/messages");
            then.status(200)
                .json_body(json!({"content": [{"type": "text", "text": "not json"}]}));
        })
        .await;

    let outcome = run_test(&config_for(&server, output.path())).await;
    let error = outcome.error().expect("malformed LLM output fails the run");
    assert!(error.contains("Failed to decode JSON from LLM response"));
    assert!(error.contains("not json"));
    // Nothing was persisted for a plan that never parsed.
    assert!(!output.path().join("plan.json").exists());
}

#[tokio::test]
async fn test_pipeline_reports_invalid_plan_structure() {
    let server = MockServer::start_async().await;
    let output = tempfile::tempdir().unwrap();

    server
        .mock_async(|when, then| {
            when.method(POST).path("/navigate");
            then.status(200).body("<html></html>");
        })
        .await;
    let missing_steps = json!({"test_plan": {"description": "x"}});
    mock_llm(&server, &missing_steps, "unused").await;

    let outcome = run_test(&config_for(&server, output.path())).await;
    let error = outcome.error().expect("a plan without steps fails validation");
    assert!(error.contains("Test plan does not contain steps"));
}

#[tokio::test]
async fn test_pipeline_maps_executor_client_error() {
    let server = MockServer::start_async().await;
    let output = tempfile::tempdir().unwrap();

    server
        .mock_async(|when, then| {
            when.method(POST).path("/navigate");
            then.status(200).body("<html></html>");
        })
        .await;
    let execute = server
        .mock_async(|when, then| {
            when.method(POST).path("/execute");
            then.status(404).body("no such session");
        })
        .await;
    mock_llm(&server, &plan_value(), "unused").await;

    let outcome = run_test(&config_for(&server, output.path())).await;
    let error = outcome.error().expect("a 404 from the executor fails the run");
    assert!(error.contains("HTTP 404"));
    assert!(error.contains("no such session"));
    // Fatal client errors are not retried.
    execute.assert_hits_async(1).await;
    // The plan was persisted before execution was attempted.
    assert!(output.path().join("plan.json").exists());
    assert!(!output.path().join("results.json").exists());
}

/// Raw TCP fixture for attempt-by-attempt behavior mock servers cannot
/// express: the first connection is held open past the client timeout,
/// the second gets a 200.
async fn flaky_executor(body: &'static str) -> std::net::SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        let (mut first, _) = listener.accept().await.unwrap();
        let mut buf = [0u8; 8192];
        let _ = first.read(&mut buf).await;

        let (mut second, _) = listener.accept().await.unwrap();
        let _ = second.read(&mut buf).await;
        let response = format!(
            "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
            body.len(),
            body
        );
        second.write_all(response.as_bytes()).await.unwrap();
        second.flush().await.unwrap();

        drop(first);
    });

    addr
}

#[tokio::test]
async fn test_execute_timeout_then_success() {
    let addr = flaky_executor("{\"result\":\"success\"}").await;
    let client = BrowserClient::new(reqwest::Client::new(), format!("http://{}", addr));

    let results = client
        .execute_plan(&plan_value(), 2, Duration::from_millis(250))
        .await
        .unwrap();

    // The first attempt timed out, the second returned the body.
    assert_eq!(results, json!({"result": "success"}));
}
