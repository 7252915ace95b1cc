//! services/api/src/web/protocol.rs
//!
//! Defines the wire representation of the conversation, shared by the REST
//! handlers and the WebSocket protocol between the browser client and the server.

use resume_tailor_core::{ConversationController, ConversationPhase, Message, Sender};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

//=========================================================================================
// Conversation Views
//=========================================================================================

#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum SenderView {
    Bot,
    User,
}

#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum PhaseView {
    CollectingResume,
    CollectingJobDescription,
    AnsweringFollowups,
}

/// One rendered turn of the conversation.
#[derive(Serialize, Debug, Clone, PartialEq, Eq, ToSchema)]
pub struct MessageView {
    pub sender: SenderView,
    pub content: String,
}

/// A read-only snapshot of the conversation, in submission order.
///
/// Clients disable their input while `busy` is true.
#[derive(Serialize, Debug, Clone, PartialEq, ToSchema)]
pub struct ConversationView {
    pub conversation_id: Uuid,
    pub phase: PhaseView,
    pub busy: bool,
    pub followups_used: u32,
    pub followups_remaining: u32,
    pub messages: Vec<MessageView>,
}

impl From<ConversationPhase> for PhaseView {
    fn from(phase: ConversationPhase) -> Self {
        match phase {
            ConversationPhase::CollectingResume => PhaseView::CollectingResume,
            ConversationPhase::CollectingJobDescription => PhaseView::CollectingJobDescription,
            ConversationPhase::AnsweringFollowups => PhaseView::AnsweringFollowups,
        }
    }
}

impl From<&Message> for MessageView {
    fn from(message: &Message) -> Self {
        let sender = match message.sender {
            Sender::Bot => SenderView::Bot,
            Sender::User => SenderView::User,
        };
        Self {
            sender,
            content: message.content.clone(),
        }
    }
}

impl From<&ConversationController> for ConversationView {
    fn from(controller: &ConversationController) -> Self {
        Self {
            conversation_id: controller.conversation_id(),
            phase: controller.phase().into(),
            busy: controller.is_busy(),
            followups_used: controller.followups_used(),
            followups_remaining: controller.followups_remaining(),
            messages: controller.messages().iter().map(MessageView::from).collect(),
        }
    }
}

//=========================================================================================
// Messages Sent FROM the Client (Browser) TO the Server
//=========================================================================================
// NOTE: Resume file content is sent as raw Binary frames between `UploadStarted`
// and `UploadEnded`, not as part of this enum.
//=========================================================================================

/// Represents the structured text messages a client can send over the WebSocket.
#[derive(Deserialize, Debug, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Text typed into the input box.
    SubmitText { text: String },

    /// Announces a resume upload. Binary frames that follow carry the file.
    UploadStarted { file_name: String },

    /// Marks the end of the file's binary frames.
    UploadEnded,

    /// Starts a fresh conversation.
    Reset,
}

//=========================================================================================
// Messages Sent FROM the Server TO the Client (Browser)
//=========================================================================================

/// Represents the structured text messages the server can send to the client.
#[derive(Serialize, Debug, Clone)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    /// The current state of the conversation. Sent on connect and after every change.
    Snapshot { conversation: ConversationView },

    /// The client's input was ignored (e.g. the conversation is busy).
    Rejected { reason: String },

    /// The client broke the protocol or sent an unusable file.
    Error { message: String },
}
