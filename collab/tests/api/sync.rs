use futures::SinkExt;
use serde_json::json;
use tokio_tungstenite::tungstenite;

use crate::helpers::{next_json, spawn_app};

#[tokio::test]
async fn joining_pushes_current_content() {
    let app = spawn_app().await;
    let test_doc = app.test_document().await;
    sqlx::query("UPDATE documents SET content = $2 WHERE id = $1")
        .bind(test_doc.0)
        .bind("stored draft")
        .execute(&app.db_pool)
        .await
        .expect("content seeded");

    let mut client = app.create_owner_client().await;

    let frame = next_json(&mut client).await;
    assert_eq!(frame["type"], "documentContent");
    assert_eq!(frame["content"], "stored draft");
}

#[tokio::test]
async fn other_client_receives_edit() {
    let app = spawn_app().await;
    let mut client_a = app.create_owner_client().await;
    let mut client_b = app.create_owner_client().await;

    // Both connections get the initial content push first.
    next_json(&mut client_a).await;
    next_json(&mut client_b).await;

    let edit = json!({ "type": "editDocument", "content": "hello from a" });
    client_a
        .send(tungstenite::Message::Text(edit.to_string()))
        .await
        .unwrap();

    let frame = next_json(&mut client_b).await;
    assert_eq!(frame["type"], "documentContent");
    assert_eq!(frame["content"], "hello from a");
}

#[tokio::test]
async fn edit_overwrites_stored_content() {
    let app = spawn_app().await;
    let test_doc = app.test_document().await;
    let mut client_a = app.create_owner_client().await;
    let mut client_b = app.create_owner_client().await;
    next_json(&mut client_a).await;
    next_json(&mut client_b).await;

    let edit = json!({ "type": "editDocument", "content": "persisted text" });
    client_a
        .send(tungstenite::Message::Text(edit.to_string()))
        .await
        .unwrap();

    // The edit is stored before it is relayed, so once the peer sees it the
    // database must already hold it.
    next_json(&mut client_b).await;

    let (content,) = sqlx::query_as::<_, (String,)>("SELECT content FROM documents WHERE id = $1")
        .bind(test_doc.0)
        .fetch_one(&app.db_pool)
        .await
        .expect("fetched content");
    assert_eq!(content, "persisted text");
}
