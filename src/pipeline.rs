//! End-to-end diagnosis session orchestration
//!
//! Wires the wizard, scoring client, transport codec, session stores,
//! lifecycle guard, and host notifier into the flow one tab goes through:
//! collect validated input, submit it, carry the result to the results
//! view, announce the outcome, and tear everything down on reset.

use crate::codec::{self, EncodeTarget, LoadOutcome};
use crate::config::AppConfig;
use crate::error::Result;
use crate::lifecycle::LifecycleGuard;
use crate::matching::MatchingClient;
use crate::models::{DiagnosisSession, FormInput};
use crate::notifier::{HostNotifier, Navigator, ParentPort, ResetOutcome};
use crate::store::{KeySpace, SessionStore, SessionStores};
use crate::wizard::{FormWizard, Transition, WizardStep};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// What a successful (or errored-but-complete) submission produced.
#[derive(Debug, Clone)]
pub struct SubmissionOutcome {
    pub session: DiagnosisSession,
    /// Compact payload, escaped and ready for the transport parameter.
    pub url_payload: String,
}

/// One tab's diagnosis pipeline.
pub struct DiagnosisPipeline {
    wizard: FormWizard,
    client: MatchingClient,
    stores: SessionStores,
    keys: KeySpace,
    guard: LifecycleGuard,
    notifier: HostNotifier,
}

impl DiagnosisPipeline {
    /// Build the pipeline for a fresh wizard entry. Performs the cold-start
    /// purge before anything else, so every diagnosis starts clean.
    pub fn new(
        config: &AppConfig,
        stores: SessionStores,
        port: Option<Arc<dyn ParentPort>>,
        navigator: Arc<dyn Navigator>,
    ) -> Result<Self> {
        let keys = if config.shared_key_space {
            KeySpace::shared()
        } else {
            KeySpace::per_tab()
        };
        let client = MatchingClient::from_config(config)?;
        let guard = LifecycleGuard::new(stores.clone(), keys.clone());
        let notifier = HostNotifier::new(
            port,
            navigator,
            Duration::from_millis(config.reset_ack_timeout_ms),
            config.reset_target_url.clone(),
        );

        guard.purge_at_startup();

        Ok(Self {
            wizard: FormWizard::new(),
            client,
            stores,
            keys,
            guard,
            notifier,
        })
    }

    pub fn wizard(&self) -> &FormWizard {
        &self.wizard
    }

    pub fn guard(&self) -> &LifecycleGuard {
        &self.guard
    }

    pub fn notifier(&self) -> &HostNotifier {
        &self.notifier
    }

    pub fn keys(&self) -> &KeySpace {
        &self.keys
    }

    /// Apply a change to the in-progress answers and retain the draft.
    pub fn update_input<F: FnOnce(&mut FormInput)>(&mut self, f: F) -> Result<()> {
        self.wizard.update(f)?;
        self.save_draft();
        Ok(())
    }

    pub fn advance(&mut self) -> Result<Transition> {
        Ok(self.wizard.advance()?)
    }

    pub fn retreat(&mut self) -> Result<WizardStep> {
        Ok(self.wizard.retreat()?)
    }

    /// Retain the in-progress answers in the persistent draft slot so a
    /// re-entry within the same tab can pick them back up.
    fn save_draft(&self) {
        match serde_json::to_string(self.wizard.input()) {
            Ok(raw) => self
                .stores
                .persistent
                .put(&self.keys.form_draft(), &raw),
            Err(e) => warn!(error = %e, "could not retain draft"),
        }
    }

    /// Re-enter the wizard within the same tab, picking the draft back up
    /// if one was retained.
    pub fn restore_draft(&mut self) -> bool {
        let Some(raw) = self.stores.persistent.get(&self.keys.form_draft()) else {
            return false;
        };
        match serde_json::from_str(&raw) {
            Ok(input) => {
                self.wizard = FormWizard::with_draft(input);
                debug!("wizard draft restored");
                true
            }
            Err(e) => {
                warn!(error = %e, "retained draft unreadable; starting clean");
                self.stores.persistent.remove(&self.keys.form_draft());
                false
            }
        }
    }

    /// Drive the terminal transition: freeze the input, call the scoring
    /// service, store the session, and announce the outcome. Works from the
    /// final step or from an already-started submission.
    pub async fn submit(&mut self) -> Result<SubmissionOutcome> {
        let input = if self.wizard.step() == WizardStep::Submitting {
            self.wizard.input().clone()
        } else {
            self.wizard.begin_submission()?
        };

        info!("submitting diagnosis");
        let session = self.client.submit(&input).await;

        // Ownership of the session moves to the store here.
        codec::save_to_store(self.stores.ephemeral.as_ref(), &self.keys, &session)?;
        self.stores.persistent.remove(&self.keys.form_draft());
        self.wizard.finish_submission()?;

        self.notifier.notify_completion(&session);

        let url_payload = codec::encode(&session, EncodeTarget::ForUrl)?;
        Ok(SubmissionOutcome {
            session,
            url_payload,
        })
    }

    /// Results-view load point: decode from the URL or the store, posting
    /// the results-ready message when a session materializes.
    pub fn load_results(&self, query: &mut Vec<(String, String)>) -> LoadOutcome {
        let outcome = codec::load_session(query, self.stores.ephemeral.as_ref(), &self.keys);
        if let LoadOutcome::Session(session) = &outcome {
            self.notifier.notify_results_ready(session);
        }
        outcome
    }

    /// User-initiated start-over: purge everything, reset the wizard, then
    /// run the notifier's reset protocol.
    pub async fn reset(&mut self) -> ResetOutcome {
        self.guard.purge_session();
        self.stores.persistent.remove(&self.keys.form_draft());
        self.wizard.reset();
        self.notifier.request_reset().await
    }

    /// Correlate a results-view click with the scoring session, when one
    /// exists. Fire-and-forget.
    pub async fn track_click(
        &self,
        session: &DiagnosisSession,
        button_type: &str,
        button_text: &str,
    ) {
        match &session.session_id {
            Some(id) => {
                self.client
                    .track_button_click(id, button_type, button_text)
                    .await;
            }
            None => debug!("no session id; click not tracked"),
        }
    }
}
