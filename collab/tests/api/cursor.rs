use futures::SinkExt;
use serde_json::json;
use tokio_tungstenite::tungstenite;

use crate::helpers::{next_json, spawn_app};

#[tokio::test]
async fn other_client_receives_cursor_position() {
    let app = spawn_app().await;
    let test_doc = app.test_document().await;
    let mut client_a = app.create_owner_client().await;
    let mut client_b = app.create_owner_client().await;
    next_json(&mut client_a).await;
    next_json(&mut client_b).await;

    let cursor = json!({ "type": "cursorMove", "position": 42 });
    client_a
        .send(tungstenite::Message::Text(cursor.to_string()))
        .await
        .unwrap();

    let frame = next_json(&mut client_b).await;
    assert_eq!(frame["type"], "remoteCursorMove");
    assert_eq!(frame["userId"], test_doc.1.to_string());
    assert_eq!(frame["position"], 42);
}
