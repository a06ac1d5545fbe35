use axum::extract::ws::{Message, WebSocket};
use futures::{SinkExt, StreamExt};
use tokio::{sync::mpsc, task::JoinHandle};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::{
    dto::ws::{ClientMessage, ServerMessage},
    services::matchmaking::{self, QueueOptions},
    state::{ClientConnection, SharedState},
};

/// Handle the full lifecycle for an individual client WebSocket connection.
pub async fn handle_socket(state: SharedState, socket: WebSocket) {
    let (mut sender, mut receiver) = socket.split();
    let (outbound_tx, mut outbound_rx) = mpsc::unbounded_channel::<Message>();

    // Dedicated writer task keeps outbound messages flowing even while we await inbound frames.
    let writer_task = tokio::spawn(async move {
        while let Some(message) = outbound_rx.recv().await {
            if sender.send(message).await.is_err() {
                break;
            }
        }
    });

    let connection_id = Uuid::new_v4();
    state.connections().insert(
        connection_id,
        ClientConnection {
            id: connection_id,
            user_id: None,
            debate_id: None,
            tx: outbound_tx.clone(),
        },
    );

    info!(id = %connection_id, "client connected");

    if !send_envelope(
        &outbound_tx,
        &ServerMessage::ConnectionAck { connection_id },
        "connection ack",
    ) {
        info!(id = %connection_id, "connection closed before acknowledgement, terminating");
        state.connections().remove(&connection_id);
        finalize(writer_task, outbound_tx).await;
        return;
    }

    while let Some(message) = receiver.next().await {
        match message {
            Ok(Message::Text(text)) => match ClientMessage::from_json_str(&text) {
                Ok(inbound) => handle_message(&state, connection_id, inbound).await,
                Err(err) => {
                    warn!(id = %connection_id, error = %err, "failed to parse client message");
                }
            },
            Ok(Message::Ping(payload)) => {
                let _ = outbound_tx.send(Message::Pong(payload));
            }
            Ok(Message::Close(frame)) => {
                info!(id = %connection_id, "client closed");
                let _ = outbound_tx.send(Message::Close(frame));
                break;
            }
            Ok(Message::Binary(_)) => {}
            Ok(Message::Pong(_)) => {}
            Err(err) => {
                warn!(id = %connection_id, error = %err, "websocket error");
                break;
            }
        }
    }

    cleanup_connection(&state, connection_id).await;
    finalize(writer_task, outbound_tx).await;
}

/// Dispatch a parsed inbound message to the owning service.
async fn handle_message(state: &SharedState, connection_id: Uuid, message: ClientMessage) {
    match message {
        ClientMessage::Authenticate { user_id } => {
            if let Some(mut connection) = state.connections().get_mut(&connection_id) {
                connection.user_id = Some(user_id);
            }
            info!(id = %connection_id, %user_id, "connection authenticated");
        }
        ClientMessage::JoinMatchmaking {
            user_id,
            min_level,
            max_level,
            preferred_topic_ids,
        } => {
            state.matchmaking_subscribers().insert(connection_id);
            let options = QueueOptions {
                min_level,
                max_level,
                preferred_topic_ids,
            };
            if let Err(err) = matchmaking::join(state, user_id, options).await {
                warn!(id = %connection_id, %user_id, error = %err, "matchmaking join failed");
            }
        }
        ClientMessage::LeaveMatchmaking { user_id } => {
            state.matchmaking_subscribers().remove(&connection_id);
            if let Err(err) = matchmaking::leave(state, user_id).await {
                warn!(id = %connection_id, %user_id, error = %err, "matchmaking leave failed");
            }
        }
        ClientMessage::SubscribeToDebate { debate_id } => {
            if let Some(mut connection) = state.connections().get_mut(&connection_id) {
                connection.debate_id = Some(debate_id);
            }
            debug!(id = %connection_id, %debate_id, "connection subscribed to debate");
        }
        ClientMessage::Unknown => {
            warn!(id = %connection_id, "ignoring unknown message type");
        }
    }
}

/// Drop the connection from all registries; a disconnect counts as an
/// implicit matchmaking leave for the authenticated user.
async fn cleanup_connection(state: &SharedState, connection_id: Uuid) {
    let removed = state
        .connections()
        .remove(&connection_id)
        .map(|(_, connection)| connection);
    state.matchmaking_subscribers().remove(&connection_id);

    if let Some(debate_id) = removed.as_ref().and_then(|connection| connection.debate_id) {
        debug!(id = %connection_id, %debate_id, "dropping debate subscription");
    }

    if let Some(user_id) = removed.and_then(|connection| connection.user_id) {
        if let Err(err) = matchmaking::leave(state, user_id).await {
            warn!(%user_id, error = %err, "failed to remove disconnected user from matchmaking");
        } else {
            info!(%user_id, "user disconnected and removed from matchmaking");
        }
    }

    info!(id = %connection_id, "client disconnected");
}

/// Serialize a payload and push it onto the provided WebSocket sender.
///
/// Returns `false` only when the writer channel is closed; serialization
/// failures are permanent and logged without retry.
fn send_envelope(
    tx: &mpsc::UnboundedSender<Message>,
    message: &ServerMessage,
    context: &str,
) -> bool {
    let payload = match serde_json::to_string(message) {
        Ok(payload) => payload,
        Err(err) => {
            warn!(context, error = %err, "failed to serialize outbound message");
            return true;
        }
    };

    tx.send(Message::Text(payload.into())).is_ok()
}

/// Deliver a message to every currently-open connection bound to `user_id`.
///
/// Multiple connections per user are supported; each open tab or device
/// receives its own copy. Connections whose writer has gone away are pruned.
pub fn send_to_user(state: &SharedState, user_id: Uuid, message: &ServerMessage, context: &str) {
    let mut stale = Vec::new();

    for connection in state.connections().iter() {
        if connection.user_id == Some(user_id) && !send_envelope(&connection.tx, message, context) {
            stale.push(connection.id);
        }
    }

    for id in stale {
        warn!(id = %id, context, "writer closed, removing client connection");
        state.connections().remove(&id);
        state.matchmaking_subscribers().remove(&id);
    }
}

/// Deliver a message to every connection subscribed to matchmaking updates.
pub fn broadcast_matchmaking(state: &SharedState, message: &ServerMessage, context: &str) {
    let subscribers: Vec<Uuid> = state.matchmaking_subscribers().iter().map(|id| *id).collect();

    for id in subscribers {
        match state.connections().get(&id) {
            Some(connection) => {
                if !send_envelope(&connection.tx, message, context) {
                    drop(connection);
                    warn!(id = %id, context, "writer closed, removing matchmaking subscriber");
                    state.connections().remove(&id);
                    state.matchmaking_subscribers().remove(&id);
                }
            }
            None => {
                state.matchmaking_subscribers().remove(&id);
            }
        }
    }
}

/// Ensure the writer task winds down before we return from the socket handler.
async fn finalize(writer_task: JoinHandle<()>, outbound_tx: mpsc::UnboundedSender<Message>) {
    drop(outbound_tx);
    let _ = writer_task.await;
}
