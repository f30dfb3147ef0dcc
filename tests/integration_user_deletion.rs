mod common;

use common::{TestApp, run_id};
use serde_json::{Value, json};
use uuid::Uuid;

#[tokio::test]
async fn test_deleting_a_user_cascades_to_their_data() {
    let app = TestApp::spawn().await;
    let run_id = run_id();
    let alice = app.register_user(&format!("alice_{run_id}")).await;
    let bob = app.register_user(&format!("bob_{run_id}")).await;
    let conversation_id = app.two_person_conversation(&alice, &bob, "farewell").await;

    // Bob sends, edits, and receives, accruing rows in every dependent table
    let message = app.send_message(&bob.token, conversation_id, "bobs message").await;
    let message_id = message["id"].as_str().unwrap();
    let resp = app
        .client
        .patch(format!("{}/v1/messages/{message_id}", app.server_url))
        .bearer_auth(&bob.token)
        .json(&json!({ "content": "bobs edited message" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    app.send_message(&alice.token, conversation_id, "for bob").await;

    let report: Value = app
        .client
        .delete(format!("{}/v1/users/me", app.server_url))
        .bearer_auth(&bob.token)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_eq!(report["messages"], 1);
    assert_eq!(report["notifications"], 1);
    assert_eq!(report["history_entries"], 1);

    // Everything Bob owned is gone
    let messages: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM messages WHERE sender_id = $1")
        .bind(bob.user_id)
        .fetch_one(&app.pool)
        .await
        .unwrap();
    assert_eq!(messages, 0);

    let notifications: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM notifications WHERE user_id = $1")
        .bind(bob.user_id)
        .fetch_one(&app.pool)
        .await
        .unwrap();
    assert_eq!(notifications, 0);

    let history: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM message_history WHERE edited_by = $1")
        .bind(bob.user_id)
        .fetch_one(&app.pool)
        .await
        .unwrap();
    assert_eq!(history, 0);

    let participations: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM conversation_participants WHERE user_id = $1")
            .bind(bob.user_id)
            .fetch_one(&app.pool)
            .await
            .unwrap();
    assert_eq!(participations, 0);

    // Alice's side of the conversation survives
    let alice_messages: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM messages WHERE sender_id = $1")
        .bind(alice.user_id)
        .fetch_one(&app.pool)
        .await
        .unwrap();
    assert_eq!(alice_messages, 1);

    let conversation_exists: bool =
        sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM conversations WHERE id = $1)")
            .bind(conversation_id)
            .fetch_one(&app.pool)
            .await
            .unwrap();
    assert!(conversation_exists);
}

#[tokio::test]
async fn test_deleted_user_token_stops_working() {
    let app = TestApp::spawn().await;
    let casper = app.register_user(&format!("casper_{}", run_id())).await;

    let resp = app
        .client
        .delete(format!("{}/v1/users/me", app.server_url))
        .bearer_auth(&casper.token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);

    // Profile lookups fail once the row is gone
    let resp = app
        .client
        .get(format!("{}/v1/users/me", app.server_url))
        .bearer_auth(&casper.token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 404);

    // And the refresh token was cascaded away
    let resp = app
        .client
        .post(format!("{}/v1/sessions/refresh", app.server_url))
        .json(&json!({ "refresh_token": casper.refresh_token }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 401);
}

#[tokio::test]
async fn test_deleting_unknown_user_is_not_found() {
    let app = TestApp::spawn().await;
    let ghost = app.register_user(&format!("ghost_{}", run_id())).await;

    // Delete once, fine; the second attempt hits a missing row
    let first = app
        .client
        .delete(format!("{}/v1/users/me", app.server_url))
        .bearer_auth(&ghost.token)
        .send()
        .await
        .unwrap();
    assert_eq!(first.status(), 200);

    let second = app
        .client
        .delete(format!("{}/v1/users/me", app.server_url))
        .bearer_auth(&ghost.token)
        .send()
        .await
        .unwrap();
    assert_eq!(second.status(), 404);
}

#[tokio::test]
async fn test_message_from_deleted_sender_disappears_from_recipient_view() {
    let app = TestApp::spawn().await;
    let run_id = run_id();
    let alice = app.register_user(&format!("alice_{run_id}")).await;
    let bob = app.register_user(&format!("bob_{run_id}")).await;
    let conversation_id = app.two_person_conversation(&alice, &bob, "vanishing").await;

    let message = app.send_message(&alice.token, conversation_id, "now you see me").await;
    let message_id = Uuid::parse_str(message["id"].as_str().unwrap()).unwrap();

    let resp = app
        .client
        .delete(format!("{}/v1/users/me", app.server_url))
        .bearer_auth(&alice.token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);

    let exists: bool = sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM messages WHERE id = $1)")
        .bind(message_id)
        .fetch_one(&app.pool)
        .await
        .unwrap();
    assert!(!exists);

    let inbox: Value = app
        .client
        .get(format!("{}/v1/inbox/unread", app.server_url))
        .bearer_auth(&bob.token)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(inbox["items"].as_array().unwrap().len(), 0);
}
