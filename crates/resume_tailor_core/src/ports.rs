//! crates/resume_tailor_core/src/ports.rs
//!
//! Defines the service contracts (traits) for the remote analysis service.
//! These traits form the boundary of the hexagonal architecture, allowing the
//! conversation controller to be independent of the HTTP transport.

use crate::domain::{AnalysisReport, FollowupAnswer, ResumeFile};
use async_trait::async_trait;

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// The error type for all gateway operations.
///
/// The controller shows the user the same message for both variants; the
/// distinction only survives into the logs.
#[derive(Debug, thiserror::Error)]
pub enum PortError {
    /// The service could not be reached (connection refused, timeout, reset).
    #[error("Gateway unavailable: {0}")]
    Unavailable(String),
    /// The service answered, but not with a usable success payload.
    #[error("Gateway rejected the request (status {status}): {message}")]
    Rejected { status: u16, message: String },
}

impl PortError {
    /// A stable label for log fields.
    pub fn kind(&self) -> &'static str {
        match self {
            PortError::Unavailable(_) => "gateway_unavailable",
            PortError::Rejected { .. } => "gateway_rejected",
        }
    }
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

//=========================================================================================
// Service Ports (Traits)
//=========================================================================================

#[async_trait]
pub trait AnalysisGateway: Send + Sync {
    /// Scores a resume against a job description and suggests improvements.
    async fn analyze(&self, resume: &ResumeFile, job_description: &str)
        -> PortResult<AnalysisReport>;
}

#[async_trait]
pub trait FollowupGateway: Send + Sync {
    /// Answers a question about previously generated suggestions.
    async fn ask(&self, suggestions: &str, question: &str) -> PortResult<FollowupAnswer>;
}
