//! services/api/src/adapters/analysis_http.rs
//!
//! This module contains the adapter for the remote resume analysis endpoint.
//! It implements the `AnalysisGateway` port from the `core` crate.

use super::response::decode_json;
use async_trait::async_trait;
use reqwest::{multipart, Client};
use resume_tailor_core::{
    domain::{AnalysisReport, ResumeFile},
    ports::{AnalysisGateway, PortError, PortResult},
};
use serde::Deserialize;
use tracing::info;

/// The success payload of `POST /analyze/upload`.
#[derive(Debug, Deserialize)]
struct AnalyzeResponse {
    fit_score: f64,
    missing_keywords: Vec<String>,
    suggestions: String,
}

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// An adapter that implements `AnalysisGateway` over HTTP multipart uploads.
#[derive(Clone)]
pub struct HttpAnalysisAdapter {
    client: Client,
    endpoint: String,
}

impl HttpAnalysisAdapter {
    /// Creates a new `HttpAnalysisAdapter` for the service at `base_url`.
    pub fn new(client: Client, base_url: &str) -> Self {
        Self {
            client,
            endpoint: format!("{}/analyze/upload", base_url.trim_end_matches('/')),
        }
    }
}

//=========================================================================================
// `AnalysisGateway` Trait Implementation
//=========================================================================================

#[async_trait]
impl AnalysisGateway for HttpAnalysisAdapter {
    /// Uploads the resume and job description as `resume_file` and `job_description`.
    async fn analyze(
        &self,
        resume: &ResumeFile,
        job_description: &str,
    ) -> PortResult<AnalysisReport> {
        let file_part = multipart::Part::bytes(resume.bytes().to_vec())
            .file_name(resume.name().to_string())
            .mime_str(resume.format().mime_type())
            .map_err(|e| PortError::Unavailable(format!("Failed to build upload: {}", e)))?;
        let form = multipart::Form::new()
            .part("resume_file", file_part)
            .text("job_description", job_description.to_string());

        info!(endpoint = %self.endpoint, file_name = resume.name(), "Uploading resume for analysis.");
        let response = self
            .client
            .post(&self.endpoint)
            .multipart(form)
            .send()
            .await
            .map_err(|e| PortError::Unavailable(e.to_string()))?;

        let body: AnalyzeResponse = decode_json(response).await?;
        Ok(AnalysisReport {
            fit_score: body.fit_score,
            missing_keywords: body.missing_keywords,
            suggestions: body.suggestions,
        })
    }
}
