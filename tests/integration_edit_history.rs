mod common;

use common::{TestApp, run_id};
use serde_json::{Value, json};
use uuid::Uuid;

#[tokio::test]
async fn test_edit_snapshots_exactly_one_history_row() {
    let app = TestApp::spawn().await;
    let run_id = run_id();
    let alice = app.register_user(&format!("alice_{run_id}")).await;
    let bob = app.register_user(&format!("bob_{run_id}")).await;
    let conversation_id = app.two_person_conversation(&alice, &bob, "edits").await;

    let message = app.send_message(&alice.token, conversation_id, "orignal text").await;
    let message_id = Uuid::parse_str(message["id"].as_str().unwrap()).unwrap();

    let resp = app
        .client
        .patch(format!("{}/v1/messages/{message_id}", app.server_url))
        .bearer_auth(&alice.token)
        .json(&json!({ "content": "original text", "edit_reason": "typo" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);

    let edited: Value = resp.json().await.unwrap();
    assert_eq!(edited["content"], "original text");
    assert_eq!(edited["edited"], true);
    assert_eq!(edited["edit_count"], 1);
    assert!(edited["last_edited_at"].is_string());

    let history_count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM message_history WHERE message_id = $1")
        .bind(message_id)
        .fetch_one(&app.pool)
        .await
        .unwrap();
    assert_eq!(history_count, 1);

    let old_content: String =
        sqlx::query_scalar("SELECT old_content FROM message_history WHERE message_id = $1")
            .bind(message_id)
            .fetch_one(&app.pool)
            .await
            .unwrap();
    assert_eq!(old_content, "orignal text");
}

#[tokio::test]
async fn test_unchanged_content_creates_no_history() {
    let app = TestApp::spawn().await;
    let alice = app.register_user(&format!("alice_{}", run_id())).await;
    let conversation_id = app.create_conversation(&alice.token, "noop-edit").await;

    let message = app.send_message(&alice.token, conversation_id, "same text").await;
    let message_id = Uuid::parse_str(message["id"].as_str().unwrap()).unwrap();

    let resp = app
        .client
        .patch(format!("{}/v1/messages/{message_id}", app.server_url))
        .bearer_auth(&alice.token)
        .json(&json!({ "content": "same text" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);

    let history_count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM message_history WHERE message_id = $1")
        .bind(message_id)
        .fetch_one(&app.pool)
        .await
        .unwrap();
    assert_eq!(history_count, 0);

    let edit_count: i32 = sqlx::query_scalar("SELECT edit_count FROM messages WHERE id = $1")
        .bind(message_id)
        .fetch_one(&app.pool)
        .await
        .unwrap();
    assert_eq!(edit_count, 0);
}

#[tokio::test]
async fn test_only_sender_may_edit() {
    let app = TestApp::spawn().await;
    let run_id = run_id();
    let alice = app.register_user(&format!("alice_{run_id}")).await;
    let bob = app.register_user(&format!("bob_{run_id}")).await;
    let conversation_id = app.two_person_conversation(&alice, &bob, "ownership").await;

    let message = app.send_message(&alice.token, conversation_id, "mine").await;

    let resp = app
        .client
        .patch(format!("{}/v1/messages/{}", app.server_url, message["id"].as_str().unwrap()))
        .bearer_auth(&bob.token)
        .json(&json!({ "content": "hijacked" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 403);
}

#[tokio::test]
async fn test_edit_cap_is_enforced() {
    let app = TestApp::spawn().await;
    let alice = app.register_user(&format!("alice_{}", run_id())).await;
    let conversation_id = app.create_conversation(&alice.token, "cap").await;

    let message = app.send_message(&alice.token, conversation_id, "v0").await;
    let message_id = message["id"].as_str().unwrap();

    for i in 1..=5 {
        let resp = app
            .client
            .patch(format!("{}/v1/messages/{message_id}", app.server_url))
            .bearer_auth(&alice.token)
            .json(&json!({ "content": format!("v{i}") }))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 200, "edit {i} should pass");
    }

    let resp = app
        .client
        .patch(format!("{}/v1/messages/{message_id}", app.server_url))
        .bearer_auth(&alice.token)
        .json(&json!({ "content": "v6" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 403);
}

#[tokio::test]
async fn test_edit_window_is_enforced() {
    let app = TestApp::spawn().await;
    let alice = app.register_user(&format!("alice_{}", run_id())).await;
    let conversation_id = app.create_conversation(&alice.token, "stale").await;

    let message = app.send_message(&alice.token, conversation_id, "ancient").await;
    let message_id = Uuid::parse_str(message["id"].as_str().unwrap()).unwrap();

    // Age the message past the 24h window
    sqlx::query("UPDATE messages SET created_at = NOW() - INTERVAL '2 days' WHERE id = $1")
        .bind(message_id)
        .execute(&app.pool)
        .await
        .unwrap();

    let resp = app
        .client
        .patch(format!("{}/v1/messages/{message_id}", app.server_url))
        .bearer_auth(&alice.token)
        .json(&json!({ "content": "too late" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 403);
}

#[tokio::test]
async fn test_history_listing_is_sender_or_staff_only() {
    let app = TestApp::spawn().await;
    let run_id = run_id();
    let alice = app.register_user(&format!("alice_{run_id}")).await;
    let bob = app.register_user(&format!("bob_{run_id}")).await;
    let admin = app.register_user(&format!("admin_{run_id}")).await;
    app.make_staff(admin.user_id).await;

    let conversation_id = app.two_person_conversation(&alice, &bob, "audit").await;
    let message = app.send_message(&alice.token, conversation_id, "v1").await;
    let message_id = message["id"].as_str().unwrap();

    for content in ["v2", "v3"] {
        let resp = app
            .client
            .patch(format!("{}/v1/messages/{message_id}", app.server_url))
            .bearer_auth(&alice.token)
            .json(&json!({ "content": content }))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 200);
    }

    // Bob is a participant, but not the sender
    let resp = app
        .client
        .get(format!("{}/v1/messages/{message_id}/history", app.server_url))
        .bearer_auth(&bob.token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 403);

    // The sender sees newest-first snapshots
    let entries: Value = app
        .client
        .get(format!("{}/v1/messages/{message_id}/history", app.server_url))
        .bearer_auth(&alice.token)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let entries = entries.as_array().unwrap();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0]["old_content"], "v2");
    assert_eq!(entries[1]["old_content"], "v1");

    // Staff may audit anyone's history
    let resp = app
        .client
        .get(format!("{}/v1/messages/{message_id}/history", app.server_url))
        .bearer_auth(&admin.token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
}
