// tests/api_tests.rs

use quizdesk::{config::Config, routes, state::AppState};
use serde_json::{Value, json};

const OPERATOR: i64 = 7926224444;

/// Spawns the app on a random port with a throwaway data file.
/// Returns the base URL (e.g., "http://127.0.0.1:12345") and the temp dir guard.
async fn spawn_app() -> (String, tempfile::TempDir) {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let data_file = dir.path().join("data.json").display().to_string();

    let config = Config::from_lookup(|key| match key {
        "OPERATOR_IDS" => Some(format!("{}, 1229135388", OPERATOR)),
        "DATA_FILE" => Some(data_file.clone()),
        "RUST_LOG" => Some("error".to_string()),
        _ => None,
    })
    .expect("Failed to build test config");

    let app = routes::create_router(AppState::new(config));

    // Bind to port 0 to get a random available port
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind random port");

    let port = listener.local_addr().unwrap().port();
    let address = format!("http://127.0.0.1:{}", port);

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (address, dir)
}

async fn send(client: &reqwest::Client, address: &str, caller: Value, text: &str) -> Vec<Value> {
    let response = client
        .post(format!("{}/api/events", address))
        .json(&json!({
            "conversation_id": caller["id"],
            "caller": caller,
            "text": text
        }))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status().as_u16(), 200);
    response.json::<Vec<Value>>().await.unwrap()
}

#[tokio::test]
async fn unknown_path_404() {
    let (address, _dir) = spawn_app().await;
    let client = reqwest::Client::new();

    let response = client
        .get(format!("{}/random_path_that_does_not_exist", address))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status().as_u16(), 404);
}

#[tokio::test]
async fn malformed_event_rejected() {
    let (address, _dir) = spawn_app().await;
    let client = reqwest::Client::new();

    let response = client
        .post(format!("{}/api/events", address))
        .json(&json!({"text": "missing ids"}))
        .send()
        .await
        .expect("Failed to execute request");

    assert!(response.status().is_client_error());
}

#[tokio::test]
async fn operator_status_comes_from_allow_list() {
    let (address, _dir) = spawn_app().await;
    let client = reqwest::Client::new();

    // Claiming nothing special: the learner is greeted and asked for a name.
    let out = send(&client, &address, json!({"id": 55, "username": "eve"}), "/start").await;
    assert_eq!(out[0]["kind"], "message");
    assert!(out[0]["text"].as_str().unwrap().contains("full name"));

    let out = send(&client, &address, json!({"id": OPERATOR}), "/admin").await;
    assert_eq!(out[0]["menu"]["type"], "main_menu");
}

#[tokio::test]
async fn full_test_flow_over_http() {
    let (address, _dir) = spawn_app().await;
    let client = reqwest::Client::new();
    let operator = json!({"id": OPERATOR, "username": "boss"});
    let learner = json!({"id": 501, "username": "ann"});

    send(&client, &address, operator.clone(), "➕ Add test").await;
    send(&client, &address, operator.clone(), "Algebra").await;
    let out = send(&client, &address, operator.clone(), "T100-1a2b3c4d").await;
    assert!(out[0]["text"].as_str().unwrap().contains("T100"));

    send(&client, &address, learner.clone(), "/start").await;
    send(&client, &address, learner.clone(), "Ann Lee").await;
    let out = send(&client, &address, learner.clone(), "T100 abcx").await;

    assert_eq!(out.len(), 2);
    assert!(out[0]["text"].as_str().unwrap().contains("✅ 3"));
    assert_eq!(out[1]["kind"], "notify_operators");
    assert_eq!(out[1]["recipients"], json!([OPERATOR, 1229135388_i64]));

    // Same day again: blocked.
    send(&client, &address, learner.clone(), "/start").await;
    send(&client, &address, learner.clone(), "Ann Lee").await;
    let out = send(&client, &address, learner.clone(), "T100 abcd").await;
    assert!(out[0]["text"].as_str().unwrap().contains("already taken"));
}
