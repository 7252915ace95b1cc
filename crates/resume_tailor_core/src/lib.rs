pub mod controller;
pub mod domain;
pub mod message_log;
pub mod ports;
pub mod quota;

pub use controller::{
    Completion, ConversationController, Gateways, IgnoreReason, PendingRequest, Settlement,
    Submission, TextOutcome,
};
pub use domain::{
    AnalysisReport, ConversationPhase, FollowupAnswer, Message, PendingArtifacts, ResumeFile,
    ResumeFileError, ResumeFormat, Sender,
};
pub use message_log::MessageLog;
pub use ports::{AnalysisGateway, FollowupGateway, PortError, PortResult};
pub use quota::{QuotaTracker, FOLLOWUP_LIMIT};
