//! Bot wire protocol and distributed execution tests

use axum::routing::get;
use axum::{Json, Router};
use serde_json::json;
use std::collections::HashSet;
use std::io::Cursor;
use std::time::Duration;
use tokio::net::TcpListener;
use volley_core::{
    BotInfo, CaptureSource, RequestScenario, RequestTemplate, ResponseCapture, ResponseInfo,
};
use volley_engine::execute_scenario;
use volley_server::{BotServer, version_string};

const API_KEY: &str = "test-api-key";

async fn spawn_echo_server() -> String {
    let app = Router::new()
        .route("/ok", get(|| async { Json(json!({"ok": true})) }))
        .route(
            "/slow",
            get(|| async {
                tokio::time::sleep(Duration::from_millis(200)).await;
                Json(json!({"ok": true}))
            }),
        );

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    format!("http://{}", addr)
}

async fn spawn_bot() -> String {
    let mut config = volley_config::ServerConfig::default();
    config.api_key = Some(API_KEY.to_string());
    let server = BotServer::new(config).unwrap();

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        server.serve_on(listener).await.unwrap();
    });

    format!("http://{}/", addr)
}

fn scenario_json(target: &str, count: u64) -> String {
    serde_json::to_string(&RequestScenario {
        requests: vec![RequestTemplate {
            url: target.to_string(),
            count,
            ..Default::default()
        }],
        ..Default::default()
    })
    .unwrap()
}

#[tokio::test]
async fn get_returns_version_string() {
    let bot = spawn_bot().await;

    let response = reqwest::get(&bot).await.unwrap();
    assert_eq!(response.status(), 200);
    assert_eq!(response.text().await.unwrap(), version_string());
}

#[tokio::test]
async fn post_without_valid_api_key_is_unauthorized() {
    let echo = spawn_echo_server().await;
    let bot = spawn_bot().await;
    let client = reqwest::Client::new();
    let body = scenario_json(&format!("{}/ok", echo), 1);

    let missing = client.post(&bot).body(body.clone()).send().await.unwrap();
    assert_eq!(missing.status(), 401);

    let wrong = client
        .post(&bot)
        .header("API-KEY", "nope")
        .body(body)
        .send()
        .await
        .unwrap();
    assert_eq!(wrong.status(), 401);
}

#[tokio::test]
async fn post_streams_ndjson_records() {
    let echo = spawn_echo_server().await;
    let bot = spawn_bot().await;
    let client = reqwest::Client::new();

    let response = client
        .post(&bot)
        .header("API-KEY", API_KEY)
        .body(scenario_json(&format!("{}/ok", echo), 2))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 200);
    assert_eq!(
        response
            .headers()
            .get("content-type")
            .and_then(|v| v.to_str().ok()),
        Some("application/json-row")
    );

    let body = response.text().await.unwrap();
    let records: Vec<ResponseInfo> = body
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect();
    assert_eq!(records.len(), 2);
    let indices: HashSet<u64> = records.iter().map(|r| r.idx).collect();
    assert_eq!(indices, HashSet::from([0, 1]));
}

#[tokio::test]
async fn concurrent_scenario_is_rejected_with_503() {
    let echo = spawn_echo_server().await;
    let bot = spawn_bot().await;
    let client = reqwest::Client::new();

    // First scenario keeps the bot busy for ~600ms
    let first = client
        .post(&bot)
        .header("API-KEY", API_KEY)
        .body(scenario_json(&format!("{}/slow", echo), 3))
        .send()
        .await
        .unwrap();
    assert_eq!(first.status(), 200);

    // Overlapping scenario bounces immediately
    let second = client
        .post(&bot)
        .header("API-KEY", API_KEY)
        .body(scenario_json(&format!("{}/ok", echo), 1))
        .send()
        .await
        .unwrap();
    assert_eq!(second.status(), 503);

    // The first stream still completes
    let body = first.text().await.unwrap();
    assert_eq!(body.lines().count(), 3);
}

#[tokio::test]
async fn unparsable_scenario_body_is_a_server_error() {
    let bot = spawn_bot().await;
    let client = reqwest::Client::new();

    let response = client
        .post(&bot)
        .header("API-KEY", API_KEY)
        .body("this is not json")
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 500);
}

#[tokio::test]
async fn unknown_route_is_not_found() {
    let bot = spawn_bot().await;

    let response = reqwest::get(format!("{}missing", bot)).await.unwrap();
    assert_eq!(response.status(), 404);
}

#[tokio::test]
async fn midstream_failure_appends_fatal_sentinel() {
    let echo = spawn_echo_server().await;
    let bot = spawn_bot().await;
    let client = reqwest::Client::new();

    // First template succeeds, second one dies on an unresolvable capture
    let scenario = RequestScenario {
        requests: vec![
            RequestTemplate {
                url: format!("{}/ok", echo),
                ..Default::default()
            },
            RequestTemplate {
                url: format!("{}/ok", echo),
                captures: vec![ResponseCapture {
                    source: CaptureSource::Body,
                    name: "x".to_string(),
                    expression: "no.such.path".to_string(),
                }],
                ..Default::default()
            },
        ],
        ..Default::default()
    };

    let response = client
        .post(&bot)
        .header("API-KEY", API_KEY)
        .body(serde_json::to_string(&scenario).unwrap())
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);

    let body = response.text().await.unwrap();
    let first_line = body.lines().next().unwrap();
    let record: ResponseInfo = serde_json::from_str(first_line).unwrap();
    assert_eq!(record.status_code, 200);

    let tail: serde_json::Value = serde_json::from_str(body.lines().last().unwrap()).unwrap();
    assert!(tail["fatalError"].as_str().unwrap().contains("path error"));
}

#[tokio::test]
async fn distributed_run_splits_index_ranges_across_bots() {
    let echo = spawn_echo_server().await;
    let bot0 = spawn_bot().await;
    let bot1 = spawn_bot().await;

    let scenario = RequestScenario {
        bots: vec![
            BotInfo {
                url: bot0,
                api_key: API_KEY.to_string(),
            },
            BotInfo {
                url: bot1,
                api_key: API_KEY.to_string(),
            },
        ],
        requests: vec![RequestTemplate {
            url: format!("{}/ok", echo),
            count: 3,
            ..Default::default()
        }],
        ..Default::default()
    };

    let mut sink = Cursor::new(Vec::new());
    execute_scenario(&scenario, &mut sink).await.unwrap();

    let output = String::from_utf8(sink.into_inner()).unwrap();
    let records: Vec<ResponseInfo> = output
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect();

    assert_eq!(records.len(), 6);
    let indices: HashSet<u64> = records.iter().map(|r| r.idx).collect();
    assert_eq!(indices, (0..6).collect());
}
