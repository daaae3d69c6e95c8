use futures::future::join_all;
use std::{collections::HashMap, ops::ControlFlow, sync::Arc};
use tokio::sync::mpsc::{Receiver, Sender};
use tracing::{instrument, Instrument};
use uuid::Uuid;

use crate::{auth::User, comment, document, server::ApplicationState};

use super::{RoomMessage, ServerEvent};

struct Peer {
    user: User,
    tx: Sender<ServerEvent>,
    in_comments: bool,
}

// One task per open document. Membership is process-local and lives only as
// long as the connections do; the task unregisters itself when the last peer
// leaves.
pub struct Room {
    peers: HashMap<Uuid, Peer>,
    document_id: Uuid,
    rx: Receiver<RoomMessage>,
    state: Arc<ApplicationState>,
}

impl Room {
    pub fn new(
        state: Arc<ApplicationState>,
        document_id: Uuid,
        rx: Receiver<RoomMessage>,
    ) -> Self {
        Self {
            peers: HashMap::new(),
            rx,
            state,
            document_id,
        }
    }

    #[instrument(name="Room", parent=None, skip(self), fields(document_id=%self.document_id))]
    pub fn run(mut self) {
        tokio::spawn(
            async move {
                tracing::info!("starting room");
                while let Some(message) = self.rx.recv().await {
                    if self.process_message(message).await.is_break() {
                        tracing::info!("stopping room");
                        break;
                    };
                }
            }
            .instrument(tracing::Span::current()),
        );
    }

    async fn process_message(&mut self, message: RoomMessage) -> ControlFlow<(), ()> {
        match message {
            RoomMessage::Connect(id, user, tx) => {
                // The newcomer sees the stored text before any relays reach it.
                match document::fetch_content(&self.state.pool, self.document_id).await {
                    Ok(content) => {
                        let _ = tx.send(ServerEvent::DocumentContent { content }).await;
                    }
                    Err(error) => {
                        tracing::error!(?error, "error fetching document content");
                    }
                }
                self.peers.insert(
                    id,
                    Peer {
                        user,
                        tx,
                        in_comments: false,
                    },
                );
            }
            RoomMessage::Disconnect(id) => {
                if let Some(peer) = self.peers.remove(&id) {
                    self.broadcast(
                        id,
                        ServerEvent::UserLeft {
                            user_id: peer.user.id,
                        },
                    )
                    .await;
                }
                if self.peers.is_empty() {
                    let mut rooms = self.state.rooms.lock().expect("received rooms lock");
                    rooms.remove(&self.document_id);
                    return ControlFlow::Break(());
                };
            }
            RoomMessage::Edit(id, content) => {
                // Persist before relaying; a failed write must not fan out.
                if let Err(error) =
                    document::overwrite_content(&self.state.pool, self.document_id, &content).await
                {
                    tracing::error!(?error, "error storing edit");
                    return ControlFlow::Continue(());
                }
                self.broadcast(id, ServerEvent::DocumentContent { content })
                    .await;
            }
            RoomMessage::Cursor(id, position) => {
                let Some(peer) = self.peers.get(&id) else {
                    return ControlFlow::Continue(());
                };
                let user_id = peer.user.id;
                self.broadcast(id, ServerEvent::RemoteCursorMove { user_id, position })
                    .await;
            }
            RoomMessage::JoinComments(id) => {
                let comments =
                    match comment::list_for_document(&self.state.pool, self.document_id).await {
                        Ok(comments) => comments,
                        Err(error) => {
                            tracing::error!(?error, "error listing comments");
                            return ControlFlow::Continue(());
                        }
                    };
                let Some(peer) = self.peers.get_mut(&id) else {
                    return ControlFlow::Continue(());
                };
                peer.in_comments = true;
                let _ = peer.tx.send(ServerEvent::CommentsList { comments }).await;
            }
            RoomMessage::Comment(id, text) => {
                let Some(peer) = self.peers.get(&id) else {
                    return ControlFlow::Continue(());
                };
                let author_id = peer.user.id;
                let comment = match comment::insert(
                    &self.state.pool,
                    self.document_id,
                    author_id,
                    &text,
                )
                .await
                {
                    Ok(comment) => comment,
                    Err(error) => {
                        tracing::error!(?error, "error storing comment");
                        return ControlFlow::Continue(());
                    }
                };
                // The comment stream echoes back to the poster as well.
                self.broadcast_comments(ServerEvent::CommentAdded { comment })
                    .await;
            }
        };
        ControlFlow::Continue(())
    }

    async fn broadcast(&self, sender: Uuid, event: ServerEvent) {
        join_all(
            self.peers
                .iter()
                .filter(|(peer_id, _)| *peer_id != &sender)
                .map(|(_, peer)| peer.tx.send(event.clone()))
                .collect::<Vec<_>>(),
        )
        .await;
    }

    async fn broadcast_comments(&self, event: ServerEvent) {
        join_all(
            self.peers
                .values()
                .filter(|peer| peer.in_comments)
                .map(|peer| peer.tx.send(event.clone()))
                .collect::<Vec<_>>(),
        )
        .await;
    }
}
