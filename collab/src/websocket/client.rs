use std::ops::ControlFlow;

use axum::extract::ws::{Message, WebSocket};
use futures::{sink::SinkExt, stream::StreamExt};
use tokio::sync::mpsc::{channel, Sender};
use tracing::instrument;
use uuid::Uuid;

use crate::auth::User;

use super::{ClientEvent, RoomMessage, ServerEvent};

#[derive(Debug)]
pub struct Client {
    id: Uuid,
    user: User,
    room_handle: Sender<RoomMessage>,
}

impl Client {
    pub fn new(user: User, room_handle: Sender<RoomMessage>) -> Self {
        Self {
            id: Uuid::new_v4(),
            user,
            room_handle,
        }
    }

    #[instrument(name="websocket connection", skip(self, socket), fields(user = ?self.user))]
    pub async fn run(self, socket: WebSocket) {
        tracing::info!("new client connected");

        let (events_tx, mut events_rx) = channel::<ServerEvent>(128);
        if self
            .room_handle
            .send(RoomMessage::Connect(self.id, self.user.clone(), events_tx))
            .await
            .is_err()
        {
            tracing::error!("room stopped before the connection could join");
            return;
        }

        let (mut sink, mut stream) = socket.split();
        let send_task = tokio::spawn(async move {
            while let Some(event) = events_rx.recv().await {
                let payload = match serde_json::to_string(&event) {
                    Ok(payload) => payload,
                    Err(error) => {
                        tracing::error!(?error, "event serialization failed");
                        continue;
                    }
                };
                if sink.send(Message::Text(payload)).await.is_err() {
                    break;
                }
            }
        });

        while let Some(Ok(msg)) = stream.next().await {
            if self.process_message(msg).await.is_break() {
                break;
            }
        }

        send_task.abort();
        let _ = self
            .room_handle
            .send(RoomMessage::Disconnect(self.id))
            .await;
    }

    async fn process_message(&self, msg: Message) -> ControlFlow<(), ()> {
        match msg {
            Message::Text(payload) => {
                match serde_json::from_str::<ClientEvent>(&payload) {
                    Ok(event) => return self.forward_event(event).await,
                    Err(error) => {
                        tracing::warn!(?error, %payload, "discarding unparseable frame");
                    }
                };
            }
            Message::Binary(d) => {
                tracing::debug!(content=?d, "ignoring binary frame");
            }
            Message::Close(c) => {
                if let Some(cf) = c {
                    tracing::info!(code = %cf.code, reason = %cf.reason, "received close message");
                } else {
                    tracing::warn!("somehow received close message without CloseFrame");
                }
                return ControlFlow::Break(());
            }
            Message::Pong(_) => (),
            Message::Ping(_) => (),
        }
        ControlFlow::Continue(())
    }

    async fn forward_event(&self, event: ClientEvent) -> ControlFlow<(), ()> {
        let message = match event {
            ClientEvent::Edit { content } => RoomMessage::Edit(self.id, content),
            ClientEvent::Cursor { position } => RoomMessage::Cursor(self.id, position),
            ClientEvent::JoinComments => RoomMessage::JoinComments(self.id),
            ClientEvent::Comment { text } => RoomMessage::Comment(self.id, text),
        };

        if self.room_handle.send(message).await.is_err() {
            tracing::warn!("room is gone, closing connection");
            return ControlFlow::Break(());
        }
        ControlFlow::Continue(())
    }
}
