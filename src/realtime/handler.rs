use axum::{
    extract::{
        ws::{Message, WebSocket},
        State, WebSocketUpgrade,
    },
    response::Response,
};
use futures::{sink::SinkExt, stream::StreamExt};
use tokio::sync::mpsc;
use uuid::Uuid;

use crate::{
    error::{AppError, Result},
    middleware::AuthUser,
    state::AppState,
};

use super::types::{ClientMessage, ErrorPayload, UnreadCountPayload, WsMessage};

/// WebSocket upgrade handler
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
    auth: AuthUser,
) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, auth, state))
}

/// Handle individual WebSocket connection
async fn handle_socket(socket: WebSocket, auth: AuthUser, state: AppState) {
    let (mut sender, mut receiver) = socket.split();
    let (tx, mut rx) = mpsc::unbounded_channel::<WsMessage>();
    let user_id = auth.id;

    state.connections.add_connection(user_id, auth.role, tx.clone());

    // Seed the session with the current unread count so clients render a
    // badge without an extra round-trip.
    match state.notification_repository.unread_count(user_id).await {
        Ok(count) => {
            let _ = tx.send(WsMessage::UnreadCount(UnreadCountPayload { count }));
        }
        Err(e) => tracing::debug!("Unread count unavailable on connect: {:?}", e),
    }

    // Spawn task to send messages from channel to WebSocket
    let mut send_task = tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            if let Ok(json) = serde_json::to_string(&msg) {
                if sender.send(Message::Text(json)).await.is_err() {
                    break;
                }
            }
        }
    });

    // Spawn task to receive messages from WebSocket
    let state_clone = state.clone();
    let tx_clone = tx.clone();
    let mut recv_task = tokio::spawn(async move {
        while let Some(Ok(msg)) = receiver.next().await {
            if let Message::Text(text) = msg {
                if let Err(e) = process_client_message(&text, user_id, &state_clone).await {
                    tracing::error!("Error processing message: {:?}", e);
                    let error_msg = WsMessage::Error(ErrorPayload {
                        message: e.to_string(),
                    });
                    let _ = tx_clone.send(error_msg);
                }
            } else if let Message::Close(_) = msg {
                break;
            }
        }
    });

    // Wait for either task to finish
    tokio::select! {
        _ = &mut send_task => recv_task.abort(),
        _ = &mut recv_task => send_task.abort(),
    }

    state.connections.remove_connection(&user_id);
    tracing::info!("WebSocket connection closed for user {}", user_id);
}

/// Process incoming client messages
async fn process_client_message(text: &str, user_id: Uuid, state: &AppState) -> Result<()> {
    let client_msg: ClientMessage = serde_json::from_str(text)
        .map_err(|e| AppError::BadRequest(format!("Invalid message format: {}", e)))?;

    match client_msg {
        ClientMessage::MarkRead { notification_id } => {
            let updated = state
                .notification_repository
                .mark_as_read(notification_id, user_id)
                .await?;

            if updated.is_none() {
                return Err(AppError::NotFound("Notification not found".to_string()));
            }

            push_unread_count(state, user_id).await;
        }
        ClientMessage::MarkAllRead => {
            state.notification_repository.mark_all_as_read(user_id).await?;
            push_unread_count(state, user_id).await;
        }
    }

    Ok(())
}

async fn push_unread_count(state: &AppState, user_id: Uuid) {
    match state.notification_repository.unread_count(user_id).await {
        Ok(count) => state.dispatcher.push_unread_count(user_id, count),
        Err(e) => tracing::debug!("Unread count refresh failed: {:?}", e),
    }
}
