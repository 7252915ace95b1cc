//! crates/resume_tailor_core/src/domain.rs
//!
//! Defines the pure, core data structures for the conversation.
//! These structs are independent of any transport or serialization format.

use bytes::Bytes;
use std::fmt;

//=========================================================================================
// Messages
//=========================================================================================

/// Who authored a message in the conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sender {
    Bot,
    User,
}

/// A single turn in the conversation log. Immutable once appended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub sender: Sender,
    pub content: String,
}

impl Message {
    pub fn bot(content: impl Into<String>) -> Self {
        Self {
            sender: Sender::Bot,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            sender: Sender::User,
            content: content.into(),
        }
    }
}

//=========================================================================================
// Conversation Phase
//=========================================================================================

/// The active stage of the fixed conversation sequence.
///
/// Variants are declared in conversation order, so `Ord` reflects how far
/// the conversation has progressed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ConversationPhase {
    CollectingResume,
    CollectingJobDescription,
    AnsweringFollowups,
}

impl ConversationPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConversationPhase::CollectingResume => "collecting_resume",
            ConversationPhase::CollectingJobDescription => "collecting_job_description",
            ConversationPhase::AnsweringFollowups => "answering_followups",
        }
    }
}

impl fmt::Display for ConversationPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

//=========================================================================================
// Resume Files
//=========================================================================================

/// Why an uploaded file cannot be used as a resume.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ResumeFileError {
    #[error("The uploaded file '{0}' is empty")]
    Empty(String),
    #[error("Unsupported resume format for '{0}'; expected .pdf, .docx or .txt")]
    UnsupportedFormat(String),
}

/// The document formats the analysis service knows how to extract text from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResumeFormat {
    Pdf,
    Docx,
    PlainText,
}

impl ResumeFormat {
    /// Detects the format from a file name's extension, ignoring case.
    pub fn from_file_name(name: &str) -> Option<Self> {
        let (_, extension) = name.rsplit_once('.')?;
        match extension.to_ascii_lowercase().as_str() {
            "pdf" => Some(ResumeFormat::Pdf),
            "docx" => Some(ResumeFormat::Docx),
            "txt" => Some(ResumeFormat::PlainText),
            _ => None,
        }
    }

    pub fn mime_type(&self) -> &'static str {
        match self {
            ResumeFormat::Pdf => "application/pdf",
            ResumeFormat::Docx => {
                "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
            }
            ResumeFormat::PlainText => "text/plain",
        }
    }
}

/// An uploaded resume. Always non-empty and of a supported format.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResumeFile {
    name: String,
    format: ResumeFormat,
    bytes: Bytes,
}

impl ResumeFile {
    pub fn new(name: impl Into<String>, bytes: impl Into<Bytes>) -> Result<Self, ResumeFileError> {
        let name = name.into();
        let bytes = bytes.into();
        let format = ResumeFormat::from_file_name(&name)
            .ok_or_else(|| ResumeFileError::UnsupportedFormat(name.clone()))?;
        if bytes.is_empty() {
            return Err(ResumeFileError::Empty(name));
        }
        Ok(Self { name, format, bytes })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn format(&self) -> ResumeFormat {
        self.format
    }

    /// Cloning the returned `Bytes` is cheap; the buffer is shared.
    pub fn bytes(&self) -> &Bytes {
        &self.bytes
    }
}

//=========================================================================================
// Artifacts Collected During the Conversation
//=========================================================================================

/// Inputs gathered so far, plus the suggestions every follow-up is asked about.
#[derive(Debug, Clone, Default)]
pub struct PendingArtifacts {
    /// Free-text resume typed instead of uploaded. Recorded but never sent.
    pub resume_text: Option<String>,
    pub resume_file: Option<ResumeFile>,
    pub job_description_text: Option<String>,
    /// Set once by a successful analysis; read-only afterwards.
    pub last_suggestions: Option<String>,
}

//=========================================================================================
// Gateway Payloads
//=========================================================================================

/// The result of analysing a resume against a job description.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisReport {
    /// Between 0 and 100.
    pub fit_score: f64,
    pub missing_keywords: Vec<String>,
    pub suggestions: String,
}

/// The remote service's answer to a follow-up question. May be empty.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FollowupAnswer {
    pub answer: String,
}
