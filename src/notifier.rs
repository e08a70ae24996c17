//! Cross-frame notification toward a hosting parent page
//!
//! When the app runs inside an iframe, the hosting page learns about
//! completion and reset through structured messages posted to the parent
//! window. Posting is fire-and-forget: no acknowledgment is expected for
//! completion messages, and the reset request races a timer against a
//! reaction that in practice never arrives, falling back to a full
//! top-level navigation.

use crate::matching::MatchingRequest;
use crate::models::DiagnosisSession;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Notify;
use tracing::{debug, info};

/// Message schema posted to the hosting page.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum HostMessage {
    /// Submission finished, successfully or not.
    #[serde(rename = "diagnosis_complete")]
    DiagnosisComplete { data: CompletionData },

    /// The results view decoded a session and is rendering it.
    #[serde(rename = "DIAGNOSIS_RESULTS_READY")]
    ResultsReady { payload: CompletionData },

    /// User asked to start over; the host may tear the frame down.
    #[serde(rename = "diagnosis_reset")]
    DiagnosisReset,
}

/// Outcome description shared by the completion messages.
///
/// Carries the transformed form as submitted; unlike the URL transport,
/// the host receives the full data.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionData {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub result_count: usize,
    pub form: MatchingRequest,
    #[serde(default)]
    pub session_id: Option<String>,
}

impl CompletionData {
    pub fn from_session(session: &DiagnosisSession) -> Self {
        Self {
            success: !session.is_errored(),
            error: session.error.clone(),
            result_count: session.results.len(),
            form: MatchingRequest::from(&session.form_input),
            session_id: session.session_id.clone(),
        }
    }
}

/// Posting side of `window.parent.postMessage`.
pub trait ParentPort: Send + Sync {
    fn post(&self, message: &HostMessage);
}

/// Top-level navigation away from the app.
pub trait Navigator: Send + Sync {
    fn navigate(&self, url: &str);
}

/// How a reset request was ultimately honored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResetOutcome {
    /// The hosting page reacted before the timeout.
    HandledByHost,
    /// Fallback navigation was performed.
    Navigated,
}

/// Notifier bound to one tab's embedding situation.
///
/// `port` is `Some` only when the page detected it is embedded (its own
/// window reference differs from the top-level one).
pub struct HostNotifier {
    port: Option<Arc<dyn ParentPort>>,
    navigator: Arc<dyn Navigator>,
    reset_ack_timeout: Duration,
    reset_target: String,
    reset_ack: Arc<Notify>,
}

impl HostNotifier {
    pub fn new(
        port: Option<Arc<dyn ParentPort>>,
        navigator: Arc<dyn Navigator>,
        reset_ack_timeout: Duration,
        reset_target: impl Into<String>,
    ) -> Self {
        Self {
            port,
            navigator,
            reset_ack_timeout,
            reset_target: reset_target.into(),
            reset_ack: Arc::new(Notify::new()),
        }
    }

    pub fn is_embedded(&self) -> bool {
        self.port.is_some()
    }

    /// Post the completion message. Returns whether anything was posted.
    pub fn notify_completion(&self, session: &DiagnosisSession) -> bool {
        let Some(port) = &self.port else {
            debug!("not embedded; completion message skipped");
            return false;
        };
        port.post(&HostMessage::DiagnosisComplete {
            data: CompletionData::from_session(session),
        });
        info!(
            success = !session.is_errored(),
            results = session.results.len(),
            "completion posted to hosting page"
        );
        true
    }

    /// Post the results-ready message from the results view.
    pub fn notify_results_ready(&self, session: &DiagnosisSession) -> bool {
        let Some(port) = &self.port else {
            return false;
        };
        port.post(&HostMessage::ResultsReady {
            payload: CompletionData::from_session(session),
        });
        true
    }

    /// Record that the hosting page reacted to a reset request.
    pub fn acknowledge_reset(&self) {
        self.reset_ack.notify_one();
    }

    /// Reset protocol: post the request when embedded and wait out the
    /// timeout; otherwise navigate right away.
    pub async fn request_reset(&self) -> ResetOutcome {
        let Some(port) = &self.port else {
            self.navigate_to_reset_target();
            return ResetOutcome::Navigated;
        };

        port.post(&HostMessage::DiagnosisReset);
        match tokio::time::timeout(self.reset_ack_timeout, self.reset_ack.notified()).await {
            Ok(()) => {
                info!("reset handled by hosting page");
                ResetOutcome::HandledByHost
            }
            Err(_) => {
                debug!(
                    timeout_ms = self.reset_ack_timeout.as_millis() as u64,
                    "no reaction from hosting page; navigating"
                );
                self.navigate_to_reset_target();
                ResetOutcome::Navigated
            }
        }
    }

    fn navigate_to_reset_target(&self) {
        let separator = if self.reset_target.contains('?') { '&' } else { '?' };
        // The timestamp defeats caches on the way back to the entry page.
        let url = format!(
            "{}{}reset=1&ts={}",
            self.reset_target,
            separator,
            chrono::Utc::now().timestamp_millis()
        );
        info!(url = %url, "navigating to reset target");
        self.navigator.navigate(&url);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::FormInput;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingPort {
        messages: Mutex<Vec<HostMessage>>,
    }

    impl ParentPort for RecordingPort {
        fn post(&self, message: &HostMessage) {
            self.messages.lock().unwrap().push(message.clone());
        }
    }

    impl RecordingPort {
        fn types(&self) -> Vec<String> {
            self.messages
                .lock()
                .unwrap()
                .iter()
                .map(|m| {
                    serde_json::to_value(m).unwrap()["type"]
                        .as_str()
                        .unwrap()
                        .to_string()
                })
                .collect()
        }
    }

    #[derive(Default)]
    struct RecordingNavigator {
        urls: Mutex<Vec<String>>,
    }

    impl Navigator for RecordingNavigator {
        fn navigate(&self, url: &str) {
            self.urls.lock().unwrap().push(url.to_string());
        }
    }

    fn session() -> DiagnosisSession {
        DiagnosisSession::completed(FormInput::default(), Vec::new(), Some("sess-1".into()))
    }

    fn notifier(
        port: Option<Arc<dyn ParentPort>>,
        navigator: Arc<RecordingNavigator>,
        timeout_ms: u64,
    ) -> HostNotifier {
        HostNotifier::new(
            port,
            navigator,
            Duration::from_millis(timeout_ms),
            "/diagnosis",
        )
    }

    #[test]
    fn test_message_schema_tags_and_payload_keys() {
        let complete = HostMessage::DiagnosisComplete {
            data: CompletionData::from_session(&session()),
        };
        let value = serde_json::to_value(&complete).unwrap();
        assert_eq!(value["type"], "diagnosis_complete");
        assert!(value.get("data").is_some());

        let ready = HostMessage::ResultsReady {
            payload: CompletionData::from_session(&session()),
        };
        let value = serde_json::to_value(&ready).unwrap();
        assert_eq!(value["type"], "DIAGNOSIS_RESULTS_READY");
        assert!(value.get("payload").is_some());

        let reset = serde_json::to_value(&HostMessage::DiagnosisReset).unwrap();
        assert_eq!(reset["type"], "diagnosis_reset");
    }

    #[test]
    fn test_completion_posts_only_when_embedded() {
        let navigator = Arc::new(RecordingNavigator::default());
        let detached = notifier(None, navigator.clone(), 100);
        assert!(!detached.notify_completion(&session()));

        let port = Arc::new(RecordingPort::default());
        let embedded = notifier(Some(port.clone()), navigator, 100);
        assert!(embedded.notify_completion(&session()));
        assert_eq!(port.types(), vec!["diagnosis_complete".to_string()]);
    }

    #[tokio::test]
    async fn test_reset_navigates_immediately_when_not_embedded() {
        let navigator = Arc::new(RecordingNavigator::default());
        let detached = notifier(None, navigator.clone(), 5_000);

        let outcome = detached.request_reset().await;

        assert_eq!(outcome, ResetOutcome::Navigated);
        let urls = navigator.urls.lock().unwrap();
        assert_eq!(urls.len(), 1);
        assert!(urls[0].starts_with("/diagnosis?reset=1&ts="));
    }

    #[tokio::test]
    async fn test_reset_falls_back_to_navigation_after_timeout() {
        let port = Arc::new(RecordingPort::default());
        let navigator = Arc::new(RecordingNavigator::default());
        let embedded = notifier(Some(port.clone()), navigator.clone(), 20);

        let outcome = embedded.request_reset().await;

        assert_eq!(outcome, ResetOutcome::Navigated);
        assert_eq!(port.types(), vec!["diagnosis_reset".to_string()]);
        assert_eq!(navigator.urls.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_acknowledged_reset_does_not_navigate() {
        let port = Arc::new(RecordingPort::default());
        let navigator = Arc::new(RecordingNavigator::default());
        let embedded = notifier(Some(port), navigator.clone(), 5_000);

        embedded.acknowledge_reset();
        let outcome = embedded.request_reset().await;

        assert_eq!(outcome, ResetOutcome::HandledByHost);
        assert!(navigator.urls.lock().unwrap().is_empty());
    }

    #[test]
    fn test_query_separator_respects_existing_params() {
        let navigator = Arc::new(RecordingNavigator::default());
        let n = HostNotifier::new(
            None,
            navigator.clone(),
            Duration::from_millis(10),
            "/diagnosis?lang=ja",
        );
        n.navigate_to_reset_target();
        let urls = navigator.urls.lock().unwrap();
        assert!(urls[0].starts_with("/diagnosis?lang=ja&reset=1&ts="));
    }

    #[test]
    fn test_completion_data_reflects_errored_session() {
        let errored =
            DiagnosisSession::errored(FormInput::default(), "API Error: bad input (E1)".into());
        let data = CompletionData::from_session(&errored);
        assert!(!data.success);
        assert_eq!(data.result_count, 0);
        assert_eq!(data.error.as_deref(), Some("API Error: bad input (E1)"));
    }
}
