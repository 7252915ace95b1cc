//! services/api/src/web/conversation.rs
//!
//! The embedding layer around the conversation controller. It serializes every
//! input through one lock, refuses input while a gateway call is outstanding,
//! and runs that call in a background task with the lock released so snapshots
//! and resets stay responsive.

use crate::web::protocol::ConversationView;
use resume_tailor_core::{ConversationController, IgnoreReason, ResumeFile, Submission};
use std::sync::Arc;
use tokio::sync::{watch, Mutex};
use tracing::{debug, error, info};

/// How an accepted input was handled.
#[derive(Debug, Clone)]
pub enum Accepted {
    /// Fully applied; the view is final.
    Applied(ConversationView),
    /// A gateway call is running; the view shows the conversation as busy.
    Dispatched(ConversationView),
}

impl Accepted {
    pub fn into_view(self) -> ConversationView {
        match self {
            Accepted::Applied(view) | Accepted::Dispatched(view) => view,
        }
    }
}

/// The single shared conversation.
pub struct ConversationHandle {
    controller: Mutex<ConversationController>,
    updates: watch::Sender<ConversationView>,
}

impl ConversationHandle {
    pub fn new(controller: ConversationController) -> Arc<Self> {
        let (updates, _) = watch::channel(ConversationView::from(&controller));
        Arc::new(Self {
            controller: Mutex::new(controller),
            updates,
        })
    }

    pub async fn view(&self) -> ConversationView {
        ConversationView::from(&*self.controller.lock().await)
    }

    /// Receives a new view after every change, including background completions.
    pub fn subscribe(&self) -> watch::Receiver<ConversationView> {
        self.updates.subscribe()
    }

    pub async fn submit_file(self: &Arc<Self>, file: ResumeFile) -> Result<Accepted, IgnoreReason> {
        let mut controller = self.controller.lock().await;
        let submission = controller.submit_file(file);
        self.admit(&controller, submission)
    }

    pub async fn submit_text(self: &Arc<Self>, text: &str) -> Result<Accepted, IgnoreReason> {
        let mut controller = self.controller.lock().await;
        let submission = controller.begin_text(text);
        self.admit(&controller, submission)
    }

    pub async fn reset(&self) -> ConversationView {
        let mut controller = self.controller.lock().await;
        controller.reset();
        self.publish(&controller)
    }

    fn admit(
        self: &Arc<Self>,
        controller: &ConversationController,
        submission: Submission,
    ) -> Result<Accepted, IgnoreReason> {
        match submission {
            Submission::Applied => Ok(Accepted::Applied(self.publish(controller))),
            Submission::Ignored(reason) => Err(reason),
            Submission::Pending(request) => {
                let view = self.publish(controller);
                let gateways = controller.gateways();
                let handle = Arc::clone(self);
                let generation = request.generation();
                info!(
                    conversation_id = %view.conversation_id,
                    generation,
                    "Dispatching gateway request."
                );
                tokio::spawn(async move {
                    // A panicking gateway still settles the turn.
                    let call =
                        tokio::spawn(async move { request.dispatch(&gateways).await }).await;
                    let mut controller = handle.controller.lock().await;
                    let settlement = match call {
                        Ok(completion) => controller.finish(completion),
                        Err(e) => {
                            error!(generation, "Gateway task failed: {}", e);
                            controller.abandon(generation)
                        }
                    };
                    debug!(?settlement, "Gateway request settled.");
                    handle.publish(&controller);
                });
                Ok(Accepted::Dispatched(view))
            }
        }
    }

    fn publish(&self, controller: &ConversationController) -> ConversationView {
        let view = ConversationView::from(controller);
        self.updates.send_replace(view.clone());
        view
    }
}
