//! crates/resume_tailor_core/src/controller.rs
//!
//! The conversation state machine. It is the single authority over phase
//! transitions and the only caller of the gateways.
//!
//! Text submissions that need the remote service are split in two halves so
//! the embedding layer can release its lock while the request is in flight:
//! `begin_text` validates and returns a `PendingRequest`, the request is
//! dispatched, and the resulting `Completion` goes back through `finish`.
//! Every request is stamped with the generation it was issued in; `reset`
//! bumps the generation so late results from a previous conversation are
//! discarded instead of applied.

use crate::{
    domain::{
        AnalysisReport, ConversationPhase, FollowupAnswer, Message, PendingArtifacts, ResumeFile,
    },
    message_log::MessageLog,
    ports::{AnalysisGateway, FollowupGateway, PortResult},
    quota::QuotaTracker,
};
use std::sync::Arc;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

//=========================================================================================
// Bot Copy
//=========================================================================================

pub const GREETING: &str = "👋 Hi! Let's tailor your resume.\n📄 Please upload your resume.";
pub const JOB_DESCRIPTION_PROMPT: &str = "✏️ Great! Now paste the job description.";
pub const RESUME_TEXT_ACK: &str = "✅ Got it. Now paste the job description.";
pub const ANALYZING_PLACEHOLDER: &str = "⏳ Analyzing resume...";
pub const THINKING_PLACEHOLDER: &str = "✏️ Let me think...";
pub const NO_RESPONSE: &str = "🤖 No response available.";
pub const ANALYSIS_FAILED: &str = "❌ Error analyzing the resume.";
pub const FOLLOWUP_FAILED: &str = "❌ Could not fetch follow-up answer.";

fn upload_echo(file_name: &str) -> String {
    format!("📎 Uploaded: {}", file_name)
}

fn followup_intro(limit: u32) -> String {
    format!(
        "💬 You can now ask up to {} follow-up questions about these suggestions.",
        limit
    )
}

fn limit_reached(limit: u32) -> String {
    format!("⚠️ You have reached the {}-question limit.", limit)
}

//=========================================================================================
// Submission Types
//=========================================================================================

/// The gateways the controller calls, shared so requests can run unlocked.
#[derive(Clone)]
pub struct Gateways {
    pub analysis: Arc<dyn AnalysisGateway>,
    pub followup: Arc<dyn FollowupGateway>,
}

/// Why an input was dropped without changing the conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IgnoreReason {
    /// A gateway request is outstanding.
    Busy,
    /// The input does not belong to the current phase.
    OutOfPhase,
    /// Whitespace-only text.
    EmptyInput,
    /// A job description arrived before any resume file was uploaded.
    MissingResumeFile,
}

impl IgnoreReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            IgnoreReason::Busy => "busy",
            IgnoreReason::OutOfPhase => "out_of_phase",
            IgnoreReason::EmptyInput => "empty_input",
            IgnoreReason::MissingResumeFile => "missing_resume_file",
        }
    }
}

/// What the controller did with an input.
#[derive(Debug)]
#[must_use]
pub enum Submission {
    /// The input was handled without contacting the remote service.
    Applied,
    Ignored(IgnoreReason),
    /// A gateway request was issued. The conversation stays busy until the
    /// request's `Completion` is handed to `finish`.
    Pending(PendingRequest),
}

#[derive(Debug)]
enum GatewayCall {
    Analyze {
        resume: ResumeFile,
        job_description: String,
    },
    Followup {
        suggestions: String,
        question: String,
        placeholder: usize,
    },
}

/// A gateway call that has been admitted but not yet performed.
#[derive(Debug)]
#[must_use = "the conversation stays busy until the request is dispatched and finished"]
pub struct PendingRequest {
    generation: u64,
    call: GatewayCall,
}

impl PendingRequest {
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Performs the call. Never borrows the controller.
    pub async fn dispatch(self, gateways: &Gateways) -> Completion {
        let outcome = match self.call {
            GatewayCall::Analyze {
                resume,
                job_description,
            } => Outcome::Analysis(gateways.analysis.analyze(&resume, &job_description).await),
            GatewayCall::Followup {
                suggestions,
                question,
                placeholder,
            } => Outcome::Followup {
                placeholder,
                result: gateways.followup.ask(&suggestions, &question).await,
            },
        };
        Completion {
            generation: self.generation,
            outcome,
        }
    }
}

#[derive(Debug)]
enum Outcome {
    Analysis(PortResult<AnalysisReport>),
    Followup {
        placeholder: usize,
        result: PortResult<FollowupAnswer>,
    },
}

/// The result of a dispatched request, waiting to be applied by `finish`.
#[derive(Debug)]
pub struct Completion {
    generation: u64,
    outcome: Outcome,
}

/// How a `Completion` was settled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Settlement {
    /// The response was applied to the conversation.
    Applied,
    /// The request failed and an error message was appended.
    Failed,
    /// The conversation was reset while the request was in flight; the
    /// result was discarded.
    Stale,
}

/// The result of `submit_text` when the whole turn runs inline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextOutcome {
    Applied,
    Ignored(IgnoreReason),
    Settled(Settlement),
}

//=========================================================================================
// The Controller
//=========================================================================================

pub struct ConversationController {
    gateways: Gateways,
    phase: ConversationPhase,
    artifacts: PendingArtifacts,
    quota: QuotaTracker,
    log: MessageLog,
    busy: bool,
    generation: u64,
    conversation_id: Uuid,
}

impl ConversationController {
    pub fn new(analysis: Arc<dyn AnalysisGateway>, followup: Arc<dyn FollowupGateway>) -> Self {
        let mut controller = Self {
            gateways: Gateways { analysis, followup },
            phase: ConversationPhase::CollectingResume,
            artifacts: PendingArtifacts::default(),
            quota: QuotaTracker::default(),
            log: MessageLog::new(),
            busy: false,
            generation: 0,
            conversation_id: Uuid::new_v4(),
        };
        controller.log.append(Message::bot(GREETING));
        controller
    }

    //-------------------------------------------------------------------------------------
    // Accessors
    //-------------------------------------------------------------------------------------

    pub fn phase(&self) -> ConversationPhase {
        self.phase
    }

    pub fn is_busy(&self) -> bool {
        self.busy
    }

    pub fn messages(&self) -> &[Message] {
        self.log.all()
    }

    pub fn artifacts(&self) -> &PendingArtifacts {
        &self.artifacts
    }

    pub fn followups_used(&self) -> u32 {
        self.quota.used()
    }

    pub fn followups_remaining(&self) -> u32 {
        self.quota.remaining()
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn conversation_id(&self) -> Uuid {
        self.conversation_id
    }

    pub fn gateways(&self) -> Gateways {
        self.gateways.clone()
    }

    //-------------------------------------------------------------------------------------
    // Operations
    //-------------------------------------------------------------------------------------

    /// Accepts an uploaded resume. Only meaningful while collecting the resume.
    pub fn submit_file(&mut self, file: ResumeFile) -> Submission {
        if self.busy {
            return self.ignore(IgnoreReason::Busy);
        }
        if self.phase != ConversationPhase::CollectingResume {
            return self.ignore(IgnoreReason::OutOfPhase);
        }

        info!(
            conversation_id = %self.conversation_id,
            file_name = file.name(),
            size = file.bytes().len(),
            "Resume file received."
        );
        self.log.append(Message::user(upload_echo(file.name())));
        self.log.append(Message::bot(JOB_DESCRIPTION_PROMPT));
        self.artifacts.resume_file = Some(file);
        self.advance(ConversationPhase::CollectingJobDescription);
        Submission::Applied
    }

    /// Handles text from the input box. Returns `Submission::Pending` when the
    /// remote service must be called; the caller then dispatches the request
    /// and passes the completion to `finish`.
    pub fn begin_text(&mut self, text: &str) -> Submission {
        if self.busy {
            return self.ignore(IgnoreReason::Busy);
        }
        if text.trim().is_empty() {
            return self.ignore(IgnoreReason::EmptyInput);
        }

        match self.phase {
            ConversationPhase::CollectingResume => {
                // The typed resume is kept, but only an uploaded file is ever
                // sent for analysis.
                self.artifacts.resume_text = Some(text.to_string());
                self.log.append(Message::user(text));
                self.log.append(Message::bot(RESUME_TEXT_ACK));
                self.advance(ConversationPhase::CollectingJobDescription);
                Submission::Applied
            }
            ConversationPhase::CollectingJobDescription => {
                let Some(resume) = self.artifacts.resume_file.clone() else {
                    return self.ignore(IgnoreReason::MissingResumeFile);
                };
                self.log.append(Message::user(text));
                self.log.append_placeholder(Message::bot(ANALYZING_PLACEHOLDER));
                self.artifacts.job_description_text = Some(text.to_string());
                self.busy = true;
                info!(
                    conversation_id = %self.conversation_id,
                    file_name = resume.name(),
                    "Requesting resume analysis."
                );
                Submission::Pending(PendingRequest {
                    generation: self.generation,
                    call: GatewayCall::Analyze {
                        resume,
                        job_description: text.to_string(),
                    },
                })
            }
            ConversationPhase::AnsweringFollowups => {
                if self.quota.is_exhausted() {
                    info!(
                        conversation_id = %self.conversation_id,
                        "Follow-up limit reached; not contacting the service."
                    );
                    self.log.append(Message::user(text));
                    self.log.append(Message::bot(limit_reached(self.quota.limit())));
                    return Submission::Applied;
                }
                let suggestions = self.artifacts.last_suggestions.clone().unwrap_or_default();
                self.log.append(Message::user(text));
                let placeholder = self
                    .log
                    .append_placeholder(Message::bot(THINKING_PLACEHOLDER));
                self.busy = true;
                info!(
                    conversation_id = %self.conversation_id,
                    followups_used = self.quota.used(),
                    "Requesting follow-up answer."
                );
                Submission::Pending(PendingRequest {
                    generation: self.generation,
                    call: GatewayCall::Followup {
                        suggestions,
                        question: text.to_string(),
                        placeholder,
                    },
                })
            }
        }
    }

    /// Applies a completed request and clears the busy flag. Results from a
    /// conversation that has since been reset are dropped.
    pub fn finish(&mut self, completion: Completion) -> Settlement {
        if completion.generation != self.generation {
            warn!(
                conversation_id = %self.conversation_id,
                request_generation = completion.generation,
                current_generation = self.generation,
                "Discarding response from a conversation that was reset."
            );
            return Settlement::Stale;
        }
        self.busy = false;

        match completion.outcome {
            Outcome::Analysis(Ok(report)) => {
                self.apply_report(report);
                Settlement::Applied
            }
            Outcome::Analysis(Err(e)) => {
                error!(
                    conversation_id = %self.conversation_id,
                    kind = e.kind(),
                    "Resume analysis failed: {}",
                    e
                );
                self.log.append(Message::bot(ANALYSIS_FAILED));
                Settlement::Failed
            }
            Outcome::Followup {
                placeholder,
                result: Ok(answer),
            } => {
                let content = if answer.answer.trim().is_empty() {
                    NO_RESPONSE.to_string()
                } else {
                    answer.answer
                };
                if !self.log.replace_at(placeholder, Message::bot(content.clone())) {
                    warn!(placeholder, "Placeholder slot was not replaceable; appending answer.");
                    self.log.append(Message::bot(content));
                }
                self.quota.consume();
                info!(
                    conversation_id = %self.conversation_id,
                    followups_used = self.quota.used(),
                    "Follow-up answered."
                );
                Settlement::Applied
            }
            Outcome::Followup { result: Err(e), .. } => {
                error!(
                    conversation_id = %self.conversation_id,
                    kind = e.kind(),
                    "Follow-up request failed: {}",
                    e
                );
                // The thinking placeholder stays where it is.
                self.log.append(Message::bot(FOLLOWUP_FAILED));
                Settlement::Failed
            }
        }
    }

    /// Settles a request of `generation` that produced no `Completion`, e.g.
    /// because the task running it panicked. The turn fails as if the
    /// gateway had returned an error.
    pub fn abandon(&mut self, generation: u64) -> Settlement {
        if generation != self.generation || !self.busy {
            return Settlement::Stale;
        }
        self.busy = false;
        error!(
            conversation_id = %self.conversation_id,
            phase = %self.phase,
            "Gateway request was abandoned without a response."
        );
        let message = match self.phase {
            ConversationPhase::AnsweringFollowups => FOLLOWUP_FAILED,
            _ => ANALYSIS_FAILED,
        };
        self.log.append(Message::bot(message));
        Settlement::Failed
    }

    /// Runs a whole text turn inline, including any gateway call.
    pub async fn submit_text(&mut self, text: &str) -> TextOutcome {
        match self.begin_text(text) {
            Submission::Applied => TextOutcome::Applied,
            Submission::Ignored(reason) => TextOutcome::Ignored(reason),
            Submission::Pending(request) => {
                let gateways = self.gateways.clone();
                let completion = request.dispatch(&gateways).await;
                TextOutcome::Settled(self.finish(completion))
            }
        }
    }

    /// Starts a fresh conversation. Any request still in flight becomes stale.
    pub fn reset(&mut self) {
        self.generation += 1;
        self.conversation_id = Uuid::new_v4();
        self.phase = ConversationPhase::CollectingResume;
        self.artifacts = PendingArtifacts::default();
        self.quota.reset();
        self.busy = false;
        self.log.clear();
        self.log.append(Message::bot(GREETING));
        info!(
            conversation_id = %self.conversation_id,
            generation = self.generation,
            "Conversation reset."
        );
    }

    //-------------------------------------------------------------------------------------
    // Helpers
    //-------------------------------------------------------------------------------------

    fn apply_report(&mut self, report: AnalysisReport) {
        let keywords = if report.missing_keywords.is_empty() {
            "None 🎉".to_string()
        } else {
            report.missing_keywords.join(", ")
        };
        self.log
            .append(Message::bot(format!("⭐ Fit Score: {}%", report.fit_score)));
        self.log
            .append(Message::bot(format!("🔍 Missing Keywords: {}", keywords)));
        self.log.append(Message::bot(format!(
            "🛠️ Suggestions:\n{}",
            report.suggestions
        )));
        self.log
            .append(Message::bot(followup_intro(self.quota.limit())));
        self.artifacts.last_suggestions = Some(report.suggestions);
        info!(
            conversation_id = %self.conversation_id,
            fit_score = report.fit_score,
            missing_keywords = report.missing_keywords.len(),
            "Resume analysis complete."
        );
        self.advance(ConversationPhase::AnsweringFollowups);
    }

    fn advance(&mut self, next: ConversationPhase) {
        debug_assert!(next >= self.phase, "phase may only move forward");
        debug!(from = %self.phase, to = %next, "Advancing conversation phase.");
        self.phase = next;
    }

    fn ignore(&self, reason: IgnoreReason) -> Submission {
        debug!(
            conversation_id = %self.conversation_id,
            phase = %self.phase,
            reason = reason.as_str(),
            "Ignoring input."
        );
        Submission::Ignored(reason)
    }
}
