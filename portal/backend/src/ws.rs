//! WebSocket handling for live ticket notifications

use async_trait::async_trait;
use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Query, State,
    },
    response::Response,
};
use dashmap::DashMap;
use futures_util::{Sink, SinkExt, Stream, StreamExt};
use std::sync::Arc;
use tokio::sync::{mpsc, Notify};

use techdesk_core::domain::services::Caller;
use techdesk_core::domain::value_objects::ConnectionId;
use techdesk_core::ports::outbound::{Transport, TransportError};

use crate::auth::resolve_caller;
use crate::error::ApiError;
use crate::models::WsQuery;
use crate::AppState;

/// Frames buffered per socket before sends start waiting
const OUTBOX_CAPACITY: usize = 64;

struct Outbox {
    frames: mpsc::Sender<Message>,
    shutdown: Arc<Notify>,
}

/// Outbound half of every open socket, keyed by connection
#[derive(Default)]
pub struct WsTransport {
    outboxes: DashMap<ConnectionId, Outbox>,
}

impl WsTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn attach(&self, connection: ConnectionId, frames: mpsc::Sender<Message>, shutdown: Arc<Notify>) {
        self.outboxes.insert(connection, Outbox { frames, shutdown });
    }

    fn detach(&self, connection: &ConnectionId) {
        self.outboxes.remove(connection);
    }

    pub fn open_connections(&self) -> usize {
        self.outboxes.len()
    }
}

#[async_trait]
impl Transport for WsTransport {
    async fn send(&self, connection: ConnectionId, payload: Arc<str>) -> Result<(), TransportError> {
        let outbox = self
            .outboxes
            .get(&connection)
            .map(|entry| entry.value().frames.clone())
            .ok_or(TransportError::Closed(connection))?;

        outbox
            .send(Message::Text(payload.to_string()))
            .await
            .map_err(|_| TransportError::Closed(connection))
    }

    fn close(&self, connection: ConnectionId) {
        if let Some((_, outbox)) = self.outboxes.remove(&connection) {
            // Stored as a permit if the session is not waiting yet.
            outbox.shutdown.notify_one();
            tracing::debug!(%connection, "websocket outbox closed");
        }
    }
}

pub async fn ws_handler(
    ws: WebSocketUpgrade,
    Query(query): Query<WsQuery>,
    State(state): State<AppState>,
) -> Result<Response, ApiError> {
    let caller = resolve_caller(&state, &query.token).await?;
    Ok(ws.on_upgrade(move |socket| handle_socket(socket, state, caller)))
}

pub async fn handle_socket(socket: WebSocket, state: AppState, caller: Caller) {
    let (sink, stream) = socket.split();
    run_session(sink, stream, state, caller).await;
}

/// Pump one connection until the peer leaves, the writer fails or the
/// transport closes it.
async fn run_session<Si, St>(mut sink: Si, stream: St, state: AppState, caller: Caller)
where
    Si: Sink<Message> + Unpin + Send + 'static,
    St: Stream<Item = Result<Message, axum::Error>>,
{
    let (tx, mut rx) = mpsc::channel::<Message>(OUTBOX_CAPACITY);
    let shutdown = Arc::new(Notify::new());

    let connection = state.registry.register(caller.user_id);
    state.sockets.attach(connection, tx.clone(), shutdown.clone());
    tracing::info!(
        user_id = %caller.user_id,
        %connection,
        open = state.sockets.open_connections(),
        "websocket connected"
    );

    let mut writer = tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            if sink.send(msg).await.is_err() {
                break;
            }
        }
    });

    let reader = async {
        let mut stream = std::pin::pin!(stream);
        while let Some(Ok(msg)) = stream.next().await {
            match msg {
                Message::Text(_) => {
                    state.users.touch(&caller.user_id).await;
                    if tx.send(Message::Text("pong".into())).await.is_err() {
                        break;
                    }
                }
                Message::Close(_) => break,
                _ => {}
            }
        }
    };

    tokio::select! {
        _ = reader => {}
        _ = &mut writer => {}
        _ = shutdown.notified() => {
            tracing::warn!(user_id = %caller.user_id, %connection, "websocket dropped after failed delivery");
        }
    }

    state.registry.unregister(&caller.user_id, &connection);
    state.sockets.detach(&connection);
    writer.abort();
    tracing::info!(user_id = %caller.user_id, %connection, "websocket disconnected");
}
