mod common;

use common::{TestApp, get_test_config, run_id};
use serde_json::json;

#[tokio::test]
async fn test_message_sends_are_throttled_per_client() {
    let mut config = get_test_config();
    config.rate_limit.send_per_minute = 5;
    config.rate_limit.send_burst = 5;

    let app = TestApp::spawn_with_config(config).await;
    let alice = app.register_user(&format!("alice_{}", run_id())).await;
    let conversation_id = app.create_conversation(&alice.token, "flood").await;

    for i in 0..5 {
        let resp = app
            .client
            .post(format!("{}/v1/conversations/{conversation_id}/messages", app.server_url))
            .bearer_auth(&alice.token)
            .json(&json!({ "content": format!("burst {i}") }))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 201, "send {i} should be within the burst");
    }

    let resp = app
        .client
        .post(format!("{}/v1/conversations/{conversation_id}/messages", app.server_url))
        .bearer_auth(&alice.token)
        .json(&json!({ "content": "one too many" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 429);
}

#[tokio::test]
async fn test_send_throttle_does_not_block_reads() {
    let mut config = get_test_config();
    config.rate_limit.send_per_minute = 1;
    config.rate_limit.send_burst = 1;

    let app = TestApp::spawn_with_config(config).await;
    let alice = app.register_user(&format!("alice_{}", run_id())).await;
    let conversation_id = app.create_conversation(&alice.token, "reads-ok").await;

    app.send_message(&alice.token, conversation_id, "only one allowed").await;

    let resp = app
        .client
        .post(format!("{}/v1/conversations/{conversation_id}/messages", app.server_url))
        .bearer_auth(&alice.token)
        .json(&json!({ "content": "throttled" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 429);

    // Reads ride the standard tier and keep working
    let resp = app
        .client
        .get(format!("{}/v1/conversations/{conversation_id}/messages", app.server_url))
        .bearer_auth(&alice.token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
}

#[tokio::test]
async fn test_auth_tier_is_throttled_independently() {
    let mut config = get_test_config();
    config.rate_limit.auth_per_second = 1;
    config.rate_limit.auth_burst = 2;

    let app = TestApp::spawn_with_config(config).await;

    let mut throttled = false;
    for i in 0..5 {
        let resp = app
            .client
            .post(format!("{}/v1/sessions", app.server_url))
            .json(&json!({ "username": format!("nobody_{i}"), "password": "irrelevant" }))
            .send()
            .await
            .unwrap();
        if resp.status() == 429 {
            throttled = true;
            break;
        }
    }
    assert!(throttled, "login hammering should hit the auth rate limit");
}
