mod client;
mod room;

use axum::extract::ws::WebSocket;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc::Sender;
use uuid::Uuid;

use crate::{auth::User, comment::Comment};

use self::client::Client;
pub use room::Room;

pub async fn handle_socket(socket: WebSocket, user: User, room_handle: Sender<RoomMessage>) {
    let client = Client::new(user, room_handle);
    client.run(socket).await;
}

// Frames are JSON text tagged with `type`, using the event names the web
// client already speaks.
#[derive(Debug, Deserialize)]
#[serde(tag = "type")]
pub enum ClientEvent {
    #[serde(rename = "editDocument")]
    Edit { content: String },
    #[serde(rename = "cursorMove")]
    Cursor { position: i64 },
    #[serde(rename = "joinComments")]
    JoinComments,
    #[serde(rename = "newComment")]
    Comment { text: String },
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type")]
pub enum ServerEvent {
    #[serde(rename = "documentContent")]
    DocumentContent { content: String },
    #[serde(rename = "remoteCursorMove", rename_all = "camelCase")]
    RemoteCursorMove { user_id: Uuid, position: i64 },
    #[serde(rename = "userLeft", rename_all = "camelCase")]
    UserLeft { user_id: Uuid },
    #[serde(rename = "commentsList")]
    CommentsList { comments: Vec<Comment> },
    #[serde(rename = "commentAdded")]
    CommentAdded { comment: Comment },
}

#[derive(Debug, Clone)]
pub enum RoomMessage {
    Connect(Uuid, User, Sender<ServerEvent>),
    Disconnect(Uuid),
    Edit(Uuid, String),
    Cursor(Uuid, i64),
    JoinComments(Uuid),
    Comment(Uuid, String),
}
