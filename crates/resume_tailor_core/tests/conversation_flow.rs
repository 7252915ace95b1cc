//! End-to-end behaviour of the conversation controller against scripted gateways.

use async_trait::async_trait;
use resume_tailor_core::{
    controller::{
        ANALYSIS_FAILED, ANALYZING_PLACEHOLDER, FOLLOWUP_FAILED, GREETING,
        JOB_DESCRIPTION_PROMPT, NO_RESPONSE, RESUME_TEXT_ACK, THINKING_PLACEHOLDER,
    },
    AnalysisGateway, AnalysisReport, ConversationController, ConversationPhase, FollowupAnswer,
    FollowupGateway, IgnoreReason, Message, PortError, PortResult, ResumeFile, Settlement,
    Submission, TextOutcome,
};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

//=========================================================================================
// Test Doubles
//=========================================================================================

/// Plays back queued responses and records every call it receives.
#[derive(Default)]
struct ScriptedService {
    analyses: Mutex<VecDeque<PortResult<AnalysisReport>>>,
    answers: Mutex<VecDeque<PortResult<FollowupAnswer>>>,
    analyze_calls: AtomicUsize,
    ask_calls: AtomicUsize,
    last_question: Mutex<Option<(String, String)>>,
}

impl ScriptedService {
    fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    fn push_analysis(&self, result: PortResult<AnalysisReport>) {
        self.analyses.lock().unwrap().push_back(result);
    }

    fn push_answer(&self, result: PortResult<FollowupAnswer>) {
        self.answers.lock().unwrap().push_back(result);
    }

    fn analyze_calls(&self) -> usize {
        self.analyze_calls.load(Ordering::SeqCst)
    }

    fn ask_calls(&self) -> usize {
        self.ask_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AnalysisGateway for ScriptedService {
    async fn analyze(
        &self,
        _resume: &ResumeFile,
        _job_description: &str,
    ) -> PortResult<AnalysisReport> {
        self.analyze_calls.fetch_add(1, Ordering::SeqCst);
        self.analyses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(PortError::Unavailable("nothing scripted".to_string())))
    }
}

#[async_trait]
impl FollowupGateway for ScriptedService {
    async fn ask(&self, suggestions: &str, question: &str) -> PortResult<FollowupAnswer> {
        self.ask_calls.fetch_add(1, Ordering::SeqCst);
        *self.last_question.lock().unwrap() = Some((suggestions.to_string(), question.to_string()));
        self.answers
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(PortError::Unavailable("nothing scripted".to_string())))
    }
}

fn controller(service: &Arc<ScriptedService>) -> ConversationController {
    ConversationController::new(service.clone(), service.clone())
}

fn resume() -> ResumeFile {
    ResumeFile::new("resume.pdf", b"%PDF-1.4 jane doe".to_vec()).unwrap()
}

fn report() -> AnalysisReport {
    AnalysisReport {
        fit_score: 82.0,
        missing_keywords: vec!["Kubernetes".to_string()],
        suggestions: "Add more metrics experience.".to_string(),
    }
}

fn answer(text: &str) -> PortResult<FollowupAnswer> {
    Ok(FollowupAnswer {
        answer: text.to_string(),
    })
}

fn contents(messages: &[Message]) -> Vec<&str> {
    messages.iter().map(|m| m.content.as_str()).collect()
}

/// Drives a controller up to the follow-up phase.
async fn analysed(service: &Arc<ScriptedService>) -> ConversationController {
    service.push_analysis(Ok(report()));
    let mut c = controller(service);
    assert!(matches!(c.submit_file(resume()), Submission::Applied));
    assert_eq!(
        c.submit_text("Senior backend role").await,
        TextOutcome::Settled(Settlement::Applied)
    );
    c
}

//=========================================================================================
// Scenarios
//=========================================================================================

#[tokio::test]
async fn starts_with_a_single_greeting() {
    let service = ScriptedService::new();
    let c = controller(&service);

    assert_eq!(c.messages(), &[Message::bot(GREETING)]);
    assert_eq!(c.phase(), ConversationPhase::CollectingResume);
    assert_eq!(c.followups_used(), 0);
    assert_eq!(c.followups_remaining(), 3);
    assert!(!c.is_busy());
}

#[tokio::test]
async fn full_conversation_consumes_the_followup_quota() {
    let service = ScriptedService::new();
    service.push_analysis(Ok(report()));
    for i in 0..3 {
        service.push_answer(answer(&format!("Answer {}", i)));
    }
    let mut c = controller(&service);

    assert!(matches!(c.submit_file(resume()), Submission::Applied));
    assert_eq!(c.phase(), ConversationPhase::CollectingJobDescription);
    assert_eq!(
        &c.messages()[1..],
        &[
            Message::user("📎 Uploaded: resume.pdf"),
            Message::bot(JOB_DESCRIPTION_PROMPT),
        ]
    );

    assert_eq!(
        c.submit_text("Senior backend role").await,
        TextOutcome::Settled(Settlement::Applied)
    );
    assert_eq!(c.phase(), ConversationPhase::AnsweringFollowups);
    assert_eq!(
        contents(&c.messages()[3..]),
        vec![
            "Senior backend role",
            ANALYZING_PLACEHOLDER,
            "⭐ Fit Score: 82%",
            "🔍 Missing Keywords: Kubernetes",
            "🛠️ Suggestions:\nAdd more metrics experience.",
            "💬 You can now ask up to 3 follow-up questions about these suggestions.",
        ]
    );
    assert_eq!(
        c.artifacts().last_suggestions.as_deref(),
        Some("Add more metrics experience.")
    );

    for i in 0..3 {
        let before = c.messages().len();
        let question = format!("Question {}?", i);
        assert_eq!(
            c.submit_text(&question).await,
            TextOutcome::Settled(Settlement::Applied)
        );
        // The thinking placeholder was replaced, not followed.
        assert_eq!(
            &c.messages()[before..],
            &[
                Message::user(question.as_str()),
                Message::bot(format!("Answer {}", i)),
            ]
        );
    }
    assert_eq!(c.followups_used(), 3);
    assert_eq!(c.followups_remaining(), 0);
    assert_eq!(service.ask_calls(), 3);
    assert_eq!(
        *service.last_question.lock().unwrap(),
        Some((
            "Add more metrics experience.".to_string(),
            "Question 2?".to_string()
        ))
    );

    let before = c.messages().len();
    assert_eq!(c.submit_text("One more?").await, TextOutcome::Applied);
    assert_eq!(
        &c.messages()[before..],
        &[
            Message::user("One more?"),
            Message::bot("⚠️ You have reached the 3-question limit."),
        ]
    );
    assert_eq!(service.ask_calls(), 3);
    assert_eq!(c.followups_used(), 3);
    assert!(!c.is_busy());
}

#[tokio::test]
async fn failed_analysis_keeps_the_file_and_allows_a_retry() {
    for failure in [
        PortError::Unavailable("connection refused".to_string()),
        PortError::Rejected {
            status: 500,
            message: "boom".to_string(),
        },
    ] {
        let service = ScriptedService::new();
        service.push_analysis(Err(failure));
        service.push_analysis(Ok(report()));
        let mut c = controller(&service);
        let _ = c.submit_file(resume());

        let before = c.messages().len();
        assert_eq!(
            c.submit_text("Senior backend role").await,
            TextOutcome::Settled(Settlement::Failed)
        );
        assert_eq!(
            contents(&c.messages()[before..]),
            vec!["Senior backend role", ANALYZING_PLACEHOLDER, ANALYSIS_FAILED]
        );
        assert_eq!(c.phase(), ConversationPhase::CollectingJobDescription);
        assert!(!c.is_busy());
        assert_eq!(c.artifacts().resume_file.as_ref(), Some(&resume()));
        assert!(c.artifacts().last_suggestions.is_none());

        assert_eq!(
            c.submit_text("Senior backend role").await,
            TextOutcome::Settled(Settlement::Applied)
        );
        assert_eq!(c.phase(), ConversationPhase::AnsweringFollowups);
        assert_eq!(service.analyze_calls(), 2);
    }
}

#[tokio::test]
async fn typed_resume_leaves_the_job_description_step_waiting_for_a_file() {
    let service = ScriptedService::new();
    let mut c = controller(&service);

    assert_eq!(c.submit_text("10 years of Rust").await, TextOutcome::Applied);
    assert_eq!(c.phase(), ConversationPhase::CollectingJobDescription);
    assert_eq!(
        contents(&c.messages()[1..]),
        vec!["10 years of Rust", RESUME_TEXT_ACK]
    );
    assert_eq!(c.artifacts().resume_text.as_deref(), Some("10 years of Rust"));

    // Without an uploaded file the job description is dropped silently, and
    // the upload is no longer accepted in this phase.
    let snapshot = c.messages().to_vec();
    assert_eq!(
        c.submit_text("Senior backend role").await,
        TextOutcome::Ignored(IgnoreReason::MissingResumeFile)
    );
    assert!(matches!(
        c.submit_file(resume()),
        Submission::Ignored(IgnoreReason::OutOfPhase)
    ));
    assert_eq!(c.messages(), snapshot.as_slice());
    assert_eq!(c.phase(), ConversationPhase::CollectingJobDescription);
    assert_eq!(service.analyze_calls(), 0);
}

#[tokio::test]
async fn failed_followup_leaves_the_placeholder_and_keeps_quota() {
    let service = ScriptedService::new();
    let mut c = analysed(&service).await;
    service.push_answer(Err(PortError::Unavailable("timed out".to_string())));

    let before = c.messages().len();
    assert_eq!(
        c.submit_text("How do I show impact?").await,
        TextOutcome::Settled(Settlement::Failed)
    );
    assert_eq!(
        contents(&c.messages()[before..]),
        vec!["How do I show impact?", THINKING_PLACEHOLDER, FOLLOWUP_FAILED]
    );
    assert_eq!(c.followups_used(), 0);
    assert_eq!(c.phase(), ConversationPhase::AnsweringFollowups);
    assert!(!c.is_busy());
}

#[tokio::test]
async fn empty_answer_is_rendered_with_a_fallback() {
    let service = ScriptedService::new();
    let mut c = analysed(&service).await;
    service.push_answer(answer(""));

    assert_eq!(
        c.submit_text("Anything else?").await,
        TextOutcome::Settled(Settlement::Applied)
    );
    assert_eq!(c.messages().last(), Some(&Message::bot(NO_RESPONSE)));
    assert_eq!(c.followups_used(), 1);
}

#[tokio::test]
async fn report_without_missing_keywords_celebrates() {
    let service = ScriptedService::new();
    service.push_analysis(Ok(AnalysisReport {
        fit_score: 91.25,
        missing_keywords: vec![],
        suggestions: "Looks good.".to_string(),
    }));
    let mut c = controller(&service);
    let _ = c.submit_file(resume());
    let _ = c.submit_text("Staff engineer").await;

    let messages = contents(c.messages());
    assert!(messages.contains(&"⭐ Fit Score: 91.25%"));
    assert!(messages.contains(&"🔍 Missing Keywords: None 🎉"));
}

#[tokio::test]
async fn blank_text_is_ignored_in_every_phase() {
    let service = ScriptedService::new();
    let mut c = controller(&service);
    assert_eq!(
        c.submit_text("   \n").await,
        TextOutcome::Ignored(IgnoreReason::EmptyInput)
    );
    assert_eq!(c.messages().len(), 1);

    let mut c = analysed(&service).await;
    let before = c.messages().len();
    assert_eq!(
        c.submit_text("").await,
        TextOutcome::Ignored(IgnoreReason::EmptyInput)
    );
    assert_eq!(c.messages().len(), before);
    assert_eq!(service.ask_calls(), 0);
}

//=========================================================================================
// Busy Flag and Generations
//=========================================================================================

#[tokio::test]
async fn inputs_are_refused_while_a_request_is_outstanding() {
    let service = ScriptedService::new();
    service.push_analysis(Ok(report()));
    let mut c = controller(&service);
    let _ = c.submit_file(resume());

    let Submission::Pending(request) = c.begin_text("Senior backend role") else {
        panic!("expected an analysis request");
    };
    assert!(c.is_busy());
    assert!(matches!(
        c.begin_text("Senior backend role"),
        Submission::Ignored(IgnoreReason::Busy)
    ));
    assert!(matches!(
        c.submit_file(resume()),
        Submission::Ignored(IgnoreReason::Busy)
    ));

    let completion = request.dispatch(&c.gateways()).await;
    assert_eq!(c.finish(completion), Settlement::Applied);
    assert!(!c.is_busy());
    assert_eq!(service.analyze_calls(), 1);
}

#[tokio::test]
async fn reset_during_flight_discards_the_late_response() {
    let service = ScriptedService::new();
    service.push_analysis(Ok(report()));
    let mut c = controller(&service);
    let _ = c.submit_file(resume());

    let Submission::Pending(request) = c.begin_text("Senior backend role") else {
        panic!("expected an analysis request");
    };
    c.reset();
    assert!(!c.is_busy());

    let completion = request.dispatch(&c.gateways()).await;
    assert_eq!(c.finish(completion), Settlement::Stale);
    assert_eq!(c.messages(), &[Message::bot(GREETING)]);
    assert_eq!(c.phase(), ConversationPhase::CollectingResume);
    assert!(c.artifacts().last_suggestions.is_none());
}

#[tokio::test]
async fn stale_response_does_not_release_a_newer_request() {
    let service = ScriptedService::new();
    service.push_analysis(Err(PortError::Unavailable("late".to_string())));
    service.push_analysis(Ok(report()));
    let mut c = controller(&service);
    let _ = c.submit_file(resume());
    let Submission::Pending(old) = c.begin_text("First attempt") else {
        panic!("expected an analysis request");
    };

    c.reset();
    let _ = c.submit_file(resume());
    let Submission::Pending(new) = c.begin_text("Second attempt") else {
        panic!("expected an analysis request");
    };
    assert_ne!(old.generation(), new.generation());

    let gateways = c.gateways();
    let old_completion = old.dispatch(&gateways).await;
    assert_eq!(c.finish(old_completion), Settlement::Stale);
    assert!(c.is_busy());
    assert!(!contents(c.messages()).contains(&ANALYSIS_FAILED));

    let new_completion = new.dispatch(&gateways).await;
    assert_eq!(c.finish(new_completion), Settlement::Applied);
    assert!(!c.is_busy());
    assert_eq!(c.phase(), ConversationPhase::AnsweringFollowups);
}

#[tokio::test]
async fn abandoned_request_fails_the_turn_and_frees_the_conversation() {
    let service = ScriptedService::new();
    let mut c = controller(&service);
    let _ = c.submit_file(resume());
    let Submission::Pending(request) = c.begin_text("Senior backend role") else {
        panic!("expected an analysis request");
    };

    assert_eq!(c.abandon(request.generation()), Settlement::Failed);
    assert!(!c.is_busy());
    assert_eq!(c.phase(), ConversationPhase::CollectingJobDescription);
    assert_eq!(c.messages().last(), Some(&Message::bot(ANALYSIS_FAILED)));
    assert!(c.artifacts().resume_file.is_some());

    // Settling the same request twice changes nothing.
    let len = c.messages().len();
    assert_eq!(c.abandon(request.generation()), Settlement::Stale);
    assert_eq!(c.messages().len(), len);
}

#[tokio::test]
async fn abandoned_followup_keeps_the_quota() {
    let service = ScriptedService::new();
    let mut c = analysed(&service).await;
    let Submission::Pending(request) = c.begin_text("Which metrics?") else {
        panic!("expected a follow-up request");
    };

    assert_eq!(c.abandon(request.generation()), Settlement::Failed);
    assert!(!c.is_busy());
    assert_eq!(c.followups_used(), 0);
    assert_eq!(c.messages().last(), Some(&Message::bot(FOLLOWUP_FAILED)));
}

#[tokio::test]
async fn abandoning_after_reset_is_stale() {
    let service = ScriptedService::new();
    let mut c = controller(&service);
    let _ = c.submit_file(resume());
    let Submission::Pending(request) = c.begin_text("Senior backend role") else {
        panic!("expected an analysis request");
    };
    c.reset();

    assert_eq!(c.abandon(request.generation()), Settlement::Stale);
    assert_eq!(c.messages(), &[Message::bot(GREETING)]);
}

//=========================================================================================
// Invariants
//=========================================================================================

#[tokio::test]
async fn reset_is_idempotent() {
    let service = ScriptedService::new();
    service.push_answer(answer("Sure."));
    let mut c = analysed(&service).await;
    let _ = c.submit_text("Question?").await;
    assert_eq!(c.followups_used(), 1);

    c.reset();
    let once = (c.messages().to_vec(), c.phase(), c.followups_used(), c.is_busy());
    c.reset();
    let twice = (c.messages().to_vec(), c.phase(), c.followups_used(), c.is_busy());

    assert_eq!(once, twice);
    assert_eq!(
        once,
        (
            vec![Message::bot(GREETING)],
            ConversationPhase::CollectingResume,
            0,
            false
        )
    );
    let artifacts = c.artifacts();
    assert!(artifacts.resume_file.is_none());
    assert!(artifacts.resume_text.is_none());
    assert!(artifacts.job_description_text.is_none());
    assert!(artifacts.last_suggestions.is_none());
}

#[tokio::test]
async fn phase_never_moves_backwards_and_busy_never_leaks() {
    let service = ScriptedService::new();
    service.push_analysis(Err(PortError::Rejected {
        status: 200,
        message: "model offline".to_string(),
    }));
    service.push_analysis(Ok(report()));
    service.push_answer(Err(PortError::Unavailable("reset".to_string())));
    for _ in 0..3 {
        service.push_answer(answer("ok"));
    }
    let mut c = controller(&service);
    let mut phases = vec![c.phase()];

    let _ = c.submit_text("").await;
    phases.push(c.phase());
    let _ = c.submit_file(resume());
    phases.push(c.phase());
    let _ = c.submit_file(resume());
    phases.push(c.phase());
    for text in ["jd", "jd", "q1", "q2", "q3", "q4", "q5"] {
        let _ = c.submit_text(text).await;
        assert!(!c.is_busy());
        phases.push(c.phase());
    }

    assert!(phases.windows(2).all(|w| w[0] <= w[1]));
    assert_eq!(phases.last(), Some(&ConversationPhase::AnsweringFollowups));
    assert_eq!(c.followups_used(), 3);
    assert_eq!(service.ask_calls(), 4);
}
