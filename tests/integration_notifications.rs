mod common;

use common::{TestApp, TestUser, run_id};
use serde_json::{Value, json};
use uuid::Uuid;

async fn notifications_for(app: &TestApp, user: &TestUser) -> Vec<Value> {
    let page: Value = app
        .client
        .get(format!("{}/v1/notifications", app.server_url))
        .bearer_auth(&user.token)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    page["items"].as_array().unwrap().clone()
}

#[tokio::test]
async fn test_send_notifies_recipients_but_not_sender() {
    let app = TestApp::spawn().await;
    let run_id = run_id();
    let alice = app.register_user(&format!("alice_{run_id}")).await;
    let bob = app.register_user(&format!("bob_{run_id}")).await;
    let conversation_id = app.two_person_conversation(&alice, &bob, "pings").await;

    app.send_message(&alice.token, conversation_id, "hello").await;

    let bob_notifications = notifications_for(&app, &bob).await;
    assert_eq!(bob_notifications.len(), 1);
    assert_eq!(bob_notifications[0]["kind"], "new_message");
    assert_eq!(
        bob_notifications[0]["body"],
        format!("You have a new message from {}", alice.username)
    );

    let alice_notifications = notifications_for(&app, &alice).await;
    assert!(alice_notifications.is_empty());
}

#[tokio::test]
async fn test_group_send_fans_out_to_every_other_participant() {
    let app = TestApp::spawn().await;
    let run_id = run_id();
    let alice = app.register_user(&format!("alice_{run_id}")).await;
    let bob = app.register_user(&format!("bob_{run_id}")).await;
    let carol = app.register_user(&format!("carol_{run_id}")).await;

    let conversation_id = app.two_person_conversation(&alice, &bob, "group").await;
    app.add_participant(&alice.token, conversation_id, carol.user_id).await;

    app.send_message(&bob.token, conversation_id, "hi all").await;

    assert_eq!(notifications_for(&app, &alice).await.len(), 1);
    assert_eq!(notifications_for(&app, &carol).await.len(), 1);
    assert!(notifications_for(&app, &bob).await.is_empty());
}

#[tokio::test]
async fn test_edit_and_delete_produce_their_kinds() {
    let app = TestApp::spawn().await;
    let run_id = run_id();
    let alice = app.register_user(&format!("alice_{run_id}")).await;
    let bob = app.register_user(&format!("bob_{run_id}")).await;
    let conversation_id = app.two_person_conversation(&alice, &bob, "lifecycle").await;

    let message = app.send_message(&alice.token, conversation_id, "v1").await;
    let message_id = Uuid::parse_str(message["id"].as_str().unwrap()).unwrap();

    let resp = app
        .client
        .patch(format!("{}/v1/messages/{message_id}", app.server_url))
        .bearer_auth(&alice.token)
        .json(&json!({ "content": "v2" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);

    let resp = app
        .client
        .delete(format!("{}/v1/messages/{message_id}", app.server_url))
        .bearer_auth(&alice.token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 204);

    let notifications = notifications_for(&app, &bob).await;
    let kinds: Vec<&str> = notifications.iter().map(|n| n["kind"].as_str().unwrap()).collect();
    assert_eq!(kinds, vec!["message_deleted", "message_edited", "new_message"]);

    // The deletion notice outlives its message
    let deleted = &notifications[0];
    assert!(deleted["message_id"].is_null());
    assert_eq!(deleted["body"], format!("{} deleted a message", alice.username));
}

#[tokio::test]
async fn test_mark_read_and_unread_filter() {
    let app = TestApp::spawn().await;
    let run_id = run_id();
    let alice = app.register_user(&format!("alice_{run_id}")).await;
    let bob = app.register_user(&format!("bob_{run_id}")).await;
    let conversation_id = app.two_person_conversation(&alice, &bob, "read-state").await;

    app.send_message(&alice.token, conversation_id, "one").await;
    app.send_message(&alice.token, conversation_id, "two").await;

    let notifications = notifications_for(&app, &bob).await;
    assert_eq!(notifications.len(), 2);
    let first_id = notifications[0]["id"].as_str().unwrap();

    let resp = app
        .client
        .post(format!("{}/v1/notifications/{first_id}/read", app.server_url))
        .bearer_auth(&bob.token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 204);

    let unread: Value = app
        .client
        .get(format!("{}/v1/notifications?unread=true", app.server_url))
        .bearer_auth(&bob.token)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(unread["items"].as_array().unwrap().len(), 1);
    assert_eq!(unread["unread_count"], 1);
}

#[tokio::test]
async fn test_foreign_notification_cannot_be_marked_read() {
    let app = TestApp::spawn().await;
    let run_id = run_id();
    let alice = app.register_user(&format!("alice_{run_id}")).await;
    let bob = app.register_user(&format!("bob_{run_id}")).await;
    let conversation_id = app.two_person_conversation(&alice, &bob, "theft").await;

    app.send_message(&alice.token, conversation_id, "for bob").await;
    let bob_notification = &notifications_for(&app, &bob).await[0];
    let id = bob_notification["id"].as_str().unwrap();

    // Alice cannot consume Bob's notification
    let resp = app
        .client
        .post(format!("{}/v1/notifications/{id}/read", app.server_url))
        .bearer_auth(&alice.token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 404);
}

#[tokio::test]
async fn test_read_all_reports_count() {
    let app = TestApp::spawn().await;
    let run_id = run_id();
    let alice = app.register_user(&format!("alice_{run_id}")).await;
    let bob = app.register_user(&format!("bob_{run_id}")).await;
    let conversation_id = app.two_person_conversation(&alice, &bob, "sweep").await;

    for i in 0..4 {
        app.send_message(&alice.token, conversation_id, &format!("msg {i}")).await;
    }

    let marked: Value = app
        .client
        .post(format!("{}/v1/notifications/read-all", app.server_url))
        .bearer_auth(&bob.token)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(marked["marked"], 4);
}
