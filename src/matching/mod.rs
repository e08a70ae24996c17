//! Scoring service client
//!
//! One submission per diagnosis: the client transforms the survey answers
//! into the service's request shape, performs the call, and maps the ranked
//! response verbatim. It never re-ranks, never retries silently (repeated
//! calls may be ranked differently by the service), and never lets a
//! transport failure escape as anything other than an errored session.

mod types;

pub use types::{
    MatchingRequest, MatchingResponse, MatchingResponseItem, TalentDetails, TrackClickRequest,
};

use crate::config::AppConfig;
use crate::models::{ranking_is_consistent, DiagnosisSession, FormInput, MatchResult};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, warn};

const USER_AGENT: &str = concat!("castmatch/", env!("CARGO_PKG_VERSION"));

/// Scoring client errors
#[derive(Debug, Error)]
pub enum MatchingError {
    #[error("Network error: {0}")]
    Network(String),

    /// Structured failure body from the service.
    #[error("API Error: {message} ({code})")]
    Api { code: String, message: String },

    /// Non-2xx without a structured body.
    #[error("Scoring service returned HTTP {status}: {body}")]
    Http { status: u16, body: String },

    /// 2xx transport with `success: false` and no error detail.
    #[error("Scoring service reported failure")]
    Unsuccessful,

    #[error("Parse error: {0}")]
    Parse(String),
}

/// HTTP client for the scoring service and its sibling endpoints.
pub struct MatchingClient {
    http: reqwest::Client,
    base_url: String,
}

impl MatchingClient {
    pub fn new(
        base_url: impl Into<String>,
        timeout: Option<Duration>,
    ) -> Result<Self, MatchingError> {
        let mut builder = reqwest::Client::builder().user_agent(USER_AGENT);
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder
            .build()
            .map_err(|e| MatchingError::Network(e.to_string()))?;

        let mut base_url = base_url.into();
        while base_url.ends_with('/') {
            base_url.pop();
        }
        Ok(Self { http, base_url })
    }

    pub fn from_config(config: &AppConfig) -> Result<Self, MatchingError> {
        Self::new(
            config.matching_base_url.clone(),
            config.request_timeout_secs.map(Duration::from_secs),
        )
    }

    /// Submit one diagnosis. Failures come back as an errored session, not
    /// an `Err`: the wizard still reaches the results view either way.
    pub async fn submit(&self, input: &FormInput) -> DiagnosisSession {
        match self.request_matching(input).await {
            Ok((results, session_id)) => {
                info!(
                    results = results.len(),
                    session_id = session_id.as_deref().unwrap_or("-"),
                    "matching succeeded"
                );
                DiagnosisSession::completed(input.clone(), results, session_id)
            }
            Err(e) => {
                warn!(error = %e, "matching failed");
                DiagnosisSession::errored(input.clone(), e.to_string())
            }
        }
    }

    async fn request_matching(
        &self,
        input: &FormInput,
    ) -> Result<(Vec<MatchResult>, Option<String>), MatchingError> {
        let request = MatchingRequest::from(input);
        debug!(industry = %request.industry, budget = %request.budget, "submitting matching request");

        let response = self
            .http
            .post(format!("{}/api/matching", self.base_url))
            .json(&request)
            .send()
            .await
            .map_err(|e| MatchingError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(failure_from_body(status.as_u16(), body));
        }

        let parsed: MatchingResponse = response
            .json()
            .await
            .map_err(|e| MatchingError::Parse(e.to_string()))?;

        if !parsed.success {
            return Err(match (parsed.error_code, parsed.error_message) {
                (Some(code), Some(message)) => MatchingError::Api { code, message },
                _ => MatchingError::Unsuccessful,
            });
        }

        let results: Vec<MatchResult> = parsed.results.into_iter().map(MatchResult::from).collect();
        if !ranking_is_consistent(&results) {
            warn!("scoring service returned an inconsistent ranking");
        }
        Ok((results, parsed.session_id))
    }

    /// Fire-and-forget click correlation. Never blocks navigation, never
    /// surfaces an error.
    pub async fn track_button_click(&self, session_id: &str, button_type: &str, button_text: &str) {
        let request = TrackClickRequest {
            session_id: session_id.to_string(),
            button_type: button_type.to_string(),
            button_text: button_text.to_string(),
        };

        let sent = self
            .http
            .post(format!("{}/api/track-button-click", self.base_url))
            .json(&request)
            .send()
            .await;

        match sent {
            Ok(response) if response.status().is_success() => {
                debug!(button_type, "click tracked");
            }
            Ok(response) => {
                debug!(status = response.status().as_u16(), "click tracking rejected");
            }
            Err(e) => {
                debug!(error = %e, "click tracking unreachable");
            }
        }
    }

    /// Enrichment lookup for one candidate on the results view.
    pub async fn talent_details(
        &self,
        talent_id: i64,
        target_segment_id: &str,
    ) -> Result<TalentDetails, MatchingError> {
        let response = self
            .http
            .get(format!("{}/api/talents/{talent_id}/details", self.base_url))
            .query(&[("target_segment_id", target_segment_id)])
            .send()
            .await
            .map_err(|e| MatchingError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(MatchingError::Http {
                status: status.as_u16(),
                body,
            });
        }

        response
            .json()
            .await
            .map_err(|e| MatchingError::Parse(e.to_string()))
    }
}

/// Triage a non-2xx body: structured error fields win, anything else is
/// reported raw.
fn failure_from_body(status: u16, body: String) -> MatchingError {
    if let Ok(parsed) = serde_json::from_str::<MatchingResponse>(&body) {
        if let (Some(code), Some(message)) = (parsed.error_code, parsed.error_message) {
            return MatchingError::Api { code, message };
        }
    }
    MatchingError::Http { status, body }
}
