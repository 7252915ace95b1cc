//! services/api/src/web/ws_handler.rs
//!
//! The entry point and control loop for a WebSocket connection. The client
//! receives a snapshot of the conversation on connect and after every change,
//! and drives the conversation with `ClientMessage`s.

use crate::web::{
    protocol::{ClientMessage, ConversationView, ServerMessage},
    state::AppState,
};
use axum::{
    extract::{
        ws::{Message, WebSocket},
        State, WebSocketUpgrade,
    },
    response::Response,
};
use futures::{
    stream::{SplitSink, StreamExt},
    SinkExt,
};
use resume_tailor_core::ResumeFile;
use std::sync::Arc;
use tokio::sync::{watch, Mutex};
use tracing::{error, info, warn};

type WsSender = Arc<Mutex<SplitSink<WebSocket, Message>>>;

/// A resume whose binary frames are still arriving.
struct PendingUpload {
    file_name: String,
    buffer: Vec<u8>,
}

enum UploadState {
    Idle,
    Receiving(PendingUpload),
    /// The upload went over the size limit. Its remaining frames and its
    /// `UploadEnded` are dropped without further errors.
    Discarding,
}

/// Per-connection protocol state. Each inbound frame yields at most one reply.
pub struct Connection {
    app_state: Arc<AppState>,
    upload: UploadState,
}

/// The handler for upgrading HTTP requests to WebSocket connections.
pub async fn ws_handler(ws: WebSocketUpgrade, State(app_state): State<Arc<AppState>>) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, app_state))
}

async fn handle_socket(socket: WebSocket, app_state: Arc<AppState>) {
    info!("New WebSocket connection established.");

    // The sender is wrapped in an Arc<Mutex<>> to allow for shared mutable access across tasks.
    let (sender, mut receiver) = socket.split();
    let ws_sender: WsSender = Arc::new(Mutex::new(sender));

    // --- 1. Stream Conversation Snapshots ---
    let mut updates = app_state.conversation.subscribe();
    let snapshot_task = {
        let ws_sender = ws_sender.clone();
        tokio::spawn(async move {
            loop {
                if send_message(&ws_sender, &snapshot(&mut updates))
                    .await
                    .is_err()
                {
                    warn!("Failed to send conversation snapshot. Client may have disconnected.");
                    break;
                }
                if updates.changed().await.is_err() {
                    break;
                }
            }
        })
    };

    // --- 2. Main Message Loop ---
    let mut connection = Connection::new(app_state);
    loop {
        let reply = match receiver.next().await {
            Some(Ok(Message::Text(text))) => connection.handle_text(text.as_str()).await,
            Some(Ok(Message::Binary(data))) => connection.handle_binary(&data),
            Some(Ok(Message::Close(_))) => {
                info!("Client sent close message.");
                break;
            }
            Some(Ok(_)) => None,
            Some(Err(_)) | None => {
                info!("Client disconnected.");
                break;
            }
        };
        if let Some(reply) = reply {
            if send_message(&ws_sender, &reply).await.is_err() {
                error!("Failed to send reply to client.");
            }
        }
    }

    // --- 3. Cleanup ---
    snapshot_task.abort();
    info!("WebSocket connection closed.");
}

/// Marks the current view as seen and wraps it for the client.
fn snapshot(updates: &mut watch::Receiver<ConversationView>) -> ServerMessage {
    let conversation = updates.borrow_and_update().clone();
    ServerMessage::Snapshot { conversation }
}

impl Connection {
    pub fn new(app_state: Arc<AppState>) -> Self {
        Self {
            app_state,
            upload: UploadState::Idle,
        }
    }

    /// Handles a JSON `ClientMessage`.
    pub async fn handle_text(&mut self, text: &str) -> Option<ServerMessage> {
        let client_msg = match serde_json::from_str::<ClientMessage>(text) {
            Ok(client_msg) => client_msg,
            Err(e) => {
                warn!("Failed to deserialize client message: {}", e);
                return Some(error_message("Unrecognised message."));
            }
        };

        match client_msg {
            ClientMessage::SubmitText { text } => {
                let result = self.app_state.conversation.submit_text(&text).await;
                result.err().map(rejection)
            }
            ClientMessage::UploadStarted { file_name } => {
                if matches!(self.upload, UploadState::Receiving(_)) {
                    warn!("UploadStarted received mid-upload; discarding the earlier file.");
                }
                info!(file_name = %file_name, "Receiving resume upload.");
                self.upload = UploadState::Receiving(PendingUpload {
                    file_name,
                    buffer: Vec::new(),
                });
                None
            }
            ClientMessage::UploadEnded => {
                match std::mem::replace(&mut self.upload, UploadState::Idle) {
                    UploadState::Receiving(PendingUpload { file_name, buffer }) => {
                        self.submit_upload(file_name, buffer).await
                    }
                    UploadState::Discarding => None,
                    UploadState::Idle => Some(error_message(
                        "UploadEnded received without UploadStarted.",
                    )),
                }
            }
            ClientMessage::Reset => {
                info!("Reset message received.");
                self.upload = UploadState::Idle;
                self.app_state.conversation.reset().await;
                None
            }
        }
    }

    /// Appends a chunk of the file announced by `UploadStarted`.
    pub fn handle_binary(&mut self, data: &[u8]) -> Option<ServerMessage> {
        let max_upload_bytes = self.app_state.config.max_upload_bytes;
        match &mut self.upload {
            UploadState::Receiving(pending) => {
                if pending.buffer.len() + data.len() > max_upload_bytes {
                    warn!(
                        file_name = %pending.file_name,
                        "Upload exceeds the size limit; discarding."
                    );
                    self.upload = UploadState::Discarding;
                    return Some(error_message("The resume file is too large."));
                }
                pending.buffer.extend_from_slice(data);
                None
            }
            UploadState::Discarding => None,
            UploadState::Idle => {
                warn!("Binary frame received outside of an upload; ignoring.");
                None
            }
        }
    }

    async fn submit_upload(&self, file_name: String, buffer: Vec<u8>) -> Option<ServerMessage> {
        match ResumeFile::new(file_name, buffer) {
            Ok(file) => {
                let result = self.app_state.conversation.submit_file(file).await;
                result.err().map(rejection)
            }
            Err(e) => {
                warn!("Rejected resume upload: {}", e);
                Some(error_message(&e.to_string()))
            }
        }
    }
}

fn rejection(reason: resume_tailor_core::IgnoreReason) -> ServerMessage {
    ServerMessage::Rejected {
        reason: reason.as_str().to_string(),
    }
}

fn error_message(text: &str) -> ServerMessage {
    ServerMessage::Error {
        message: text.to_string(),
    }
}

async fn send_message(ws_sender: &WsSender, message: &ServerMessage) -> Result<(), axum::Error> {
    let json = serde_json::to_string(message).map_err(axum::Error::new)?;
    ws_sender.lock().await.send(Message::Text(json.into())).await
}
