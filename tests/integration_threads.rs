mod common;

use common::{TestApp, run_id};
use serde_json::{Value, json};
use uuid::Uuid;

#[tokio::test]
async fn test_reply_derives_depth_and_root() {
    let app = TestApp::spawn().await;
    let run_id = run_id();
    let alice = app.register_user(&format!("alice_{run_id}")).await;
    let bob = app.register_user(&format!("bob_{run_id}")).await;
    let conversation_id = app.two_person_conversation(&alice, &bob, "threading").await;

    let root = app.send_message(&alice.token, conversation_id, "root post").await;
    let root_id = Uuid::parse_str(root["id"].as_str().unwrap()).unwrap();

    let reply = app.send_reply(&bob.token, conversation_id, "first reply", Some(root_id)).await;
    assert_eq!(reply["thread_depth"], 1);
    assert_eq!(reply["parent_id"].as_str().unwrap(), root_id.to_string());
    assert_eq!(reply["root_id"].as_str().unwrap(), root_id.to_string());

    let reply_id = Uuid::parse_str(reply["id"].as_str().unwrap()).unwrap();
    let nested = app.send_reply(&alice.token, conversation_id, "nested reply", Some(reply_id)).await;
    assert_eq!(nested["thread_depth"], 2);
    assert_eq!(nested["parent_id"].as_str().unwrap(), reply_id.to_string());
    // Root propagates down the chain, not the immediate parent
    assert_eq!(nested["root_id"].as_str().unwrap(), root_id.to_string());
}

#[tokio::test]
async fn test_reply_to_foreign_conversation_parent_is_rejected() {
    let app = TestApp::spawn().await;
    let run_id = run_id();
    let alice = app.register_user(&format!("alice_{run_id}")).await;

    let here = app.create_conversation(&alice.token, "here").await;
    let there = app.create_conversation(&alice.token, "there").await;
    let foreign = app.send_message(&alice.token, there, "other room").await;
    let foreign_id = Uuid::parse_str(foreign["id"].as_str().unwrap()).unwrap();

    let resp = app
        .client
        .post(format!("{}/v1/conversations/{here}/messages", app.server_url))
        .bearer_auth(&alice.token)
        .json(&json!({ "content": "crossover", "parent_id": foreign_id }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
}

#[tokio::test]
async fn test_reply_to_unknown_parent_is_rejected() {
    let app = TestApp::spawn().await;
    let alice = app.register_user(&format!("alice_{}", run_id())).await;
    let conversation_id = app.create_conversation(&alice.token, "ghosts").await;

    let resp = app
        .client
        .post(format!("{}/v1/conversations/{conversation_id}/messages", app.server_url))
        .bearer_auth(&alice.token)
        .json(&json!({ "content": "into the void", "parent_id": Uuid::new_v4() }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
}

#[tokio::test]
async fn test_thread_endpoint_returns_whole_tree_from_any_member() {
    let app = TestApp::spawn().await;
    let run_id = run_id();
    let alice = app.register_user(&format!("alice_{run_id}")).await;
    let bob = app.register_user(&format!("bob_{run_id}")).await;
    let conversation_id = app.two_person_conversation(&alice, &bob, "tree").await;

    let root = app.send_message(&alice.token, conversation_id, "root").await;
    let root_id = Uuid::parse_str(root["id"].as_str().unwrap()).unwrap();

    let first = app.send_reply(&bob.token, conversation_id, "first", Some(root_id)).await;
    let first_id = Uuid::parse_str(first["id"].as_str().unwrap()).unwrap();

    app.send_reply(&alice.token, conversation_id, "first.child", Some(first_id)).await;
    app.send_reply(&alice.token, conversation_id, "second", Some(root_id)).await;

    // Ask for the thread from a leaf; it still comes back rooted
    let thread: Value = app
        .client
        .get(format!("{}/v1/messages/{first_id}/thread", app.server_url))
        .bearer_auth(&bob.token)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_eq!(thread["root_id"].as_str().unwrap(), root_id.to_string());

    let flat = thread["flat"].as_array().unwrap();
    assert_eq!(flat.len(), 4);
    // Thread order: each message before its replies
    let contents: Vec<&str> = flat.iter().map(|m| m["content"].as_str().unwrap()).collect();
    assert_eq!(contents, vec!["root", "first", "first.child", "second"]);

    let tree = thread["tree"].as_array().unwrap();
    assert_eq!(tree.len(), 1);
    let root_node = &tree[0];
    assert_eq!(root_node["message"]["content"], "root");
    assert_eq!(root_node["replies"].as_array().unwrap().len(), 2);
    assert_eq!(root_node["replies"][0]["message"]["content"], "first");
    assert_eq!(root_node["replies"][0]["replies"][0]["message"]["content"], "first.child");
}

#[tokio::test]
async fn test_deleting_root_removes_subtree() {
    let app = TestApp::spawn().await;
    let run_id = run_id();
    let alice = app.register_user(&format!("alice_{run_id}")).await;
    let bob = app.register_user(&format!("bob_{run_id}")).await;
    let conversation_id = app.two_person_conversation(&alice, &bob, "pruned").await;

    let root = app.send_message(&alice.token, conversation_id, "root").await;
    let root_id = Uuid::parse_str(root["id"].as_str().unwrap()).unwrap();
    app.send_reply(&bob.token, conversation_id, "reply", Some(root_id)).await;

    let resp = app
        .client
        .delete(format!("{}/v1/messages/{root_id}", app.server_url))
        .bearer_auth(&alice.token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 204);

    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM messages WHERE conversation_id = $1")
        .bind(conversation_id)
        .fetch_one(&app.pool)
        .await
        .unwrap();
    assert_eq!(count, 0);
}

#[tokio::test]
async fn test_thread_of_non_participant_is_forbidden() {
    let app = TestApp::spawn().await;
    let run_id = run_id();
    let alice = app.register_user(&format!("alice_{run_id}")).await;
    let mallory = app.register_user(&format!("mallory_{run_id}")).await;

    let conversation_id = app.create_conversation(&alice.token, "private-thread").await;
    let message = app.send_message(&alice.token, conversation_id, "secret").await;

    let resp = app
        .client
        .get(format!("{}/v1/messages/{}/thread", app.server_url, message["id"].as_str().unwrap()))
        .bearer_auth(&mallory.token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 403);
}
