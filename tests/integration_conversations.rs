mod common;

use common::{TestApp, run_id};
use serde_json::{Value, json};
use uuid::Uuid;

#[tokio::test]
async fn test_creator_is_automatically_a_participant() {
    let app = TestApp::spawn().await;
    let alice = app.register_user(&format!("alice_{}", run_id())).await;

    let conversation_id = app.create_conversation(&alice.token, "standup").await;

    let resp = app
        .client
        .get(format!("{}/v1/conversations/{conversation_id}", app.server_url))
        .bearer_auth(&alice.token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);

    let detail: Value = resp.json().await.unwrap();
    assert_eq!(detail["title"], "standup");
    let participants = detail["participants"].as_array().unwrap();
    assert_eq!(participants.len(), 1);
    assert_eq!(participants[0]["user_id"].as_str().unwrap(), alice.user_id.to_string());
}

#[tokio::test]
async fn test_non_participant_is_rejected() {
    let app = TestApp::spawn().await;
    let run_id = run_id();
    let alice = app.register_user(&format!("alice_{run_id}")).await;
    let mallory = app.register_user(&format!("mallory_{run_id}")).await;

    let conversation_id = app.create_conversation(&alice.token, "private").await;

    let resp = app
        .client
        .get(format!("{}/v1/conversations/{conversation_id}", app.server_url))
        .bearer_auth(&mallory.token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 403);

    let resp = app
        .client
        .get(format!("{}/v1/conversations/{conversation_id}/messages", app.server_url))
        .bearer_auth(&mallory.token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 403);
}

#[tokio::test]
async fn test_add_participant_grants_access() {
    let app = TestApp::spawn().await;
    let run_id = run_id();
    let alice = app.register_user(&format!("alice_{run_id}")).await;
    let bob = app.register_user(&format!("bob_{run_id}")).await;

    let conversation_id = app.create_conversation(&alice.token, "shared").await;
    app.add_participant(&alice.token, conversation_id, bob.user_id).await;

    let resp = app
        .client
        .get(format!("{}/v1/conversations/{conversation_id}", app.server_url))
        .bearer_auth(&bob.token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
}

#[tokio::test]
async fn test_add_participant_twice_conflicts() {
    let app = TestApp::spawn().await;
    let run_id = run_id();
    let alice = app.register_user(&format!("alice_{run_id}")).await;
    let bob = app.register_user(&format!("bob_{run_id}")).await;

    let conversation_id = app.create_conversation(&alice.token, "twice").await;
    app.add_participant(&alice.token, conversation_id, bob.user_id).await;

    let resp = app
        .client
        .post(format!("{}/v1/conversations/{conversation_id}/participants", app.server_url))
        .bearer_auth(&alice.token)
        .json(&json!({ "user_id": bob.user_id }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 409);
}

#[tokio::test]
async fn test_add_unknown_participant_not_found() {
    let app = TestApp::spawn().await;
    let alice = app.register_user(&format!("alice_{}", run_id())).await;
    let conversation_id = app.create_conversation(&alice.token, "ghosts").await;

    let resp = app
        .client
        .post(format!("{}/v1/conversations/{conversation_id}/participants", app.server_url))
        .bearer_auth(&alice.token)
        .json(&json!({ "user_id": Uuid::new_v4() }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 404);
}

#[tokio::test]
async fn test_participant_may_leave_but_not_evict() {
    let app = TestApp::spawn().await;
    let run_id = run_id();
    let alice = app.register_user(&format!("alice_{run_id}")).await;
    let bob = app.register_user(&format!("bob_{run_id}")).await;

    let conversation_id = app.two_person_conversation(&alice, &bob, "exit").await;

    // Bob cannot remove Alice
    let resp = app
        .client
        .delete(format!(
            "{}/v1/conversations/{conversation_id}/participants/{}",
            app.server_url, alice.user_id
        ))
        .bearer_auth(&bob.token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 403);

    // But Bob can leave
    let resp = app
        .client
        .delete(format!(
            "{}/v1/conversations/{conversation_id}/participants/{}",
            app.server_url, bob.user_id
        ))
        .bearer_auth(&bob.token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 204);
}

#[tokio::test]
async fn test_delete_conversation_is_staff_only() {
    let app = TestApp::spawn().await;
    let run_id = run_id();
    let alice = app.register_user(&format!("alice_{run_id}")).await;
    let admin = app.register_user(&format!("admin_{run_id}")).await;
    app.make_staff(admin.user_id).await;

    let conversation_id = app.create_conversation(&alice.token, "doomed").await;
    app.send_message(&alice.token, conversation_id, "soon gone").await;

    let resp = app
        .client
        .delete(format!("{}/v1/conversations/{conversation_id}", app.server_url))
        .bearer_auth(&alice.token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 403);

    let resp = app
        .client
        .delete(format!("{}/v1/conversations/{conversation_id}", app.server_url))
        .bearer_auth(&admin.token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 204);

    // Messages cascade with the conversation
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM messages WHERE conversation_id = $1")
        .bind(conversation_id)
        .fetch_one(&app.pool)
        .await
        .unwrap();
    assert_eq!(count, 0);
}

#[tokio::test]
async fn test_list_orders_by_recent_activity() {
    let app = TestApp::spawn().await;
    let alice = app.register_user(&format!("alice_{}", run_id())).await;

    let first = app.create_conversation(&alice.token, "first").await;
    let second = app.create_conversation(&alice.token, "second").await;

    // Writing into the older conversation bumps it to the top
    app.send_message(&alice.token, first, "bump").await;

    let page: Value = app
        .client
        .get(format!("{}/v1/conversations", app.server_url))
        .bearer_auth(&alice.token)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    let items = page["items"].as_array().unwrap();
    assert!(items.len() >= 2);
    assert_eq!(items[0]["id"].as_str().unwrap(), first.to_string());
    assert_eq!(items[1]["id"].as_str().unwrap(), second.to_string());
}
