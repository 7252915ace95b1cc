//! services/api/src/adapters/followup_http.rs
//!
//! This module contains the adapter for the remote follow-up question endpoint.
//! It implements the `FollowupGateway` port from the `core` crate.

use super::response::decode_json;
use async_trait::async_trait;
use reqwest::Client;
use resume_tailor_core::{
    domain::FollowupAnswer,
    ports::{FollowupGateway, PortError, PortResult},
};
use serde::{Deserialize, Serialize};
use tracing::info;

#[derive(Debug, Serialize)]
struct FollowupRequest<'a> {
    suggestions: &'a str,
    question: &'a str,
}

/// The success payload of `POST /ask-followup`. A missing answer is valid.
#[derive(Debug, Deserialize)]
struct FollowupResponse {
    #[serde(default)]
    answer: Option<String>,
}

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// An adapter that implements `FollowupGateway` with a JSON POST.
#[derive(Clone)]
pub struct HttpFollowupAdapter {
    client: Client,
    endpoint: String,
}

impl HttpFollowupAdapter {
    /// Creates a new `HttpFollowupAdapter` for the service at `base_url`.
    pub fn new(client: Client, base_url: &str) -> Self {
        Self {
            client,
            endpoint: format!("{}/ask-followup", base_url.trim_end_matches('/')),
        }
    }
}

//=========================================================================================
// `FollowupGateway` Trait Implementation
//=========================================================================================

#[async_trait]
impl FollowupGateway for HttpFollowupAdapter {
    async fn ask(&self, suggestions: &str, question: &str) -> PortResult<FollowupAnswer> {
        info!(endpoint = %self.endpoint, "Asking follow-up question.");
        let response = self
            .client
            .post(&self.endpoint)
            .json(&FollowupRequest {
                suggestions,
                question,
            })
            .send()
            .await
            .map_err(|e| PortError::Unavailable(e.to_string()))?;

        let body: FollowupResponse = decode_json(response).await?;
        Ok(FollowupAnswer {
            answer: body.answer.unwrap_or_default(),
        })
    }
}
