//! Multi-step survey wizard
//!
//! The input flow is an explicit state machine: one state per survey step in
//! a fixed order, plus the `Submitting`/`Submitted` terminal pseudo-states.
//! Forward transitions are guarded by the current step's validation
//! predicate; going back never discards entered data. Reaching the end of
//! the step order freezes the input and yields the submission snapshot.

pub mod validation;

pub use validation::{email_is_valid, phone_is_valid, ValidationError, MOBILE_PREFIXES};

use crate::models::FormInput;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

/// Wizard states, in presentation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WizardStep {
    Terms,
    Industry,
    Audience,
    Purpose,
    Budget,
    CompanyInfo,
    Privacy,
    /// Scoring call in flight; input frozen.
    Submitting,
    /// Pipeline handed off to the results transport.
    Submitted,
}

/// The fixed forward order of the input steps.
pub const INPUT_STEPS: [WizardStep; 7] = [
    WizardStep::Terms,
    WizardStep::Industry,
    WizardStep::Audience,
    WizardStep::Purpose,
    WizardStep::Budget,
    WizardStep::CompanyInfo,
    WizardStep::Privacy,
];

const FINAL_INPUT_STEP: WizardStep = WizardStep::Privacy;

impl WizardStep {
    pub fn next(self) -> Option<WizardStep> {
        let index = INPUT_STEPS.iter().position(|s| *s == self)?;
        INPUT_STEPS.get(index + 1).copied()
    }

    pub fn prev(self) -> Option<WizardStep> {
        let index = INPUT_STEPS.iter().position(|s| *s == self)?;
        index.checked_sub(1).and_then(|i| INPUT_STEPS.get(i)).copied()
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, WizardStep::Submitting | WizardStep::Submitted)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WizardError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("input is frozen once submission has started")]
    InputFrozen,

    #[error("already at the first step")]
    AtFirstStep,

    #[error("submission is only available from the final step")]
    NotAtFinalStep,

    #[error("no submission in progress")]
    NotSubmitting,
}

/// Outcome of a forward transition.
#[derive(Debug, Clone, PartialEq)]
pub enum Transition {
    MovedTo(WizardStep),
    /// The machine entered `Submitting`; the snapshot is what goes to the
    /// scoring service.
    SubmissionStarted(FormInput),
}

impl Default for WizardStep {
    fn default() -> Self {
        WizardStep::Terms
    }
}

/// The wizard state machine: current step plus the accumulating answers.
#[derive(Debug, Clone, Default)]
pub struct FormWizard {
    step: WizardStep,
    input: FormInput,
}

impl FormWizard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resume from a retained draft, starting at the first step.
    pub fn with_draft(input: FormInput) -> Self {
        Self {
            step: WizardStep::Terms,
            input,
        }
    }

    pub fn step(&self) -> WizardStep {
        self.step
    }

    pub fn input(&self) -> &FormInput {
        &self.input
    }

    /// Apply a change to the in-progress answers.
    pub fn update<F: FnOnce(&mut FormInput)>(&mut self, f: F) -> Result<(), WizardError> {
        if self.step.is_terminal() {
            return Err(WizardError::InputFrozen);
        }
        f(&mut self.input);
        Ok(())
    }

    /// Move forward one step, or start submission from the final step.
    pub fn advance(&mut self) -> Result<Transition, WizardError> {
        if self.step.is_terminal() {
            return Err(WizardError::InputFrozen);
        }
        validation::validate_step(self.step, &self.input)?;

        match self.step.next() {
            Some(next) => {
                debug!(from = ?self.step, to = ?next, "wizard advanced");
                self.step = next;
                Ok(Transition::MovedTo(next))
            }
            None => self.begin_submission().map(Transition::SubmissionStarted),
        }
    }

    /// Move back one step. Never touches entered data.
    pub fn retreat(&mut self) -> Result<WizardStep, WizardError> {
        if self.step.is_terminal() {
            return Err(WizardError::InputFrozen);
        }
        match self.step.prev() {
            Some(prev) => {
                debug!(from = ?self.step, to = ?prev, "wizard moved back");
                self.step = prev;
                Ok(prev)
            }
            None => Err(WizardError::AtFirstStep),
        }
    }

    /// Re-validate every step, freeze the input, and return the snapshot.
    pub fn begin_submission(&mut self) -> Result<FormInput, WizardError> {
        if self.step.is_terminal() {
            return Err(WizardError::InputFrozen);
        }
        if self.step != FINAL_INPUT_STEP {
            return Err(WizardError::NotAtFinalStep);
        }
        validation::validate_through(FINAL_INPUT_STEP, &self.input)?;
        self.step = WizardStep::Submitting;
        debug!("wizard entered submitting");
        Ok(self.input.clone())
    }

    /// Record that the scoring call finished, successfully or not.
    pub fn finish_submission(&mut self) -> Result<(), WizardError> {
        if self.step != WizardStep::Submitting {
            return Err(WizardError::NotSubmitting);
        }
        self.step = WizardStep::Submitted;
        Ok(())
    }

    /// Full reset: back to the first step with empty answers.
    pub fn reset(&mut self) {
        *self = Self::new();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::GenrePreference;

    fn valid_input() -> FormInput {
        FormInput {
            terms_accepted: true,
            industry: "食品".to_string(),
            target_segment: "男性20-34歳".to_string(),
            purpose: "商品サービスの知名度アップ".to_string(),
            purpose_detail: String::new(),
            budget: "500万円以下".to_string(),
            company_name: "テスト株式会社".to_string(),
            contact_name: "山田太郎".to_string(),
            email: "taro@example.jp".to_string(),
            phone: "090-1234-5678".to_string(),
            genre_preference: Some(GenrePreference::NoPreference),
            genres: Vec::new(),
            privacy_accepted: true,
        }
    }

    #[test]
    fn test_valid_input_walks_every_step_in_order() {
        let mut wizard = FormWizard::with_draft(valid_input());
        let mut visited = vec![wizard.step()];

        loop {
            match wizard.advance().unwrap() {
                Transition::MovedTo(step) => visited.push(step),
                Transition::SubmissionStarted(snapshot) => {
                    assert_eq!(snapshot, valid_input());
                    break;
                }
            }
        }

        assert_eq!(visited, INPUT_STEPS.to_vec());
        assert_eq!(wizard.step(), WizardStep::Submitting);
        wizard.finish_submission().unwrap();
        assert_eq!(wizard.step(), WizardStep::Submitted);
    }

    #[test]
    fn test_advance_blocked_by_current_step_validation() {
        let mut wizard = FormWizard::new();
        assert_eq!(
            wizard.advance(),
            Err(WizardError::Validation(ValidationError::TermsNotAccepted))
        );
        assert_eq!(wizard.step(), WizardStep::Terms);

        wizard.update(|input| input.terms_accepted = true).unwrap();
        assert_eq!(wizard.advance(), Ok(Transition::MovedTo(WizardStep::Industry)));
    }

    #[test]
    fn test_back_is_blocked_only_at_first_step() {
        let mut wizard = FormWizard::with_draft(valid_input());
        assert_eq!(wizard.retreat(), Err(WizardError::AtFirstStep));

        wizard.advance().unwrap();
        wizard.advance().unwrap();
        assert_eq!(wizard.retreat(), Ok(WizardStep::Industry));
        assert_eq!(wizard.step(), WizardStep::Industry);
    }

    #[test]
    fn test_back_preserves_entered_data() {
        let mut wizard = FormWizard::with_draft(valid_input());
        wizard.advance().unwrap();
        wizard.advance().unwrap();
        wizard.retreat().unwrap();
        assert_eq!(wizard.input(), &valid_input());
    }

    #[test]
    fn test_bad_email_blocks_company_info_step() {
        let mut input = valid_input();
        input.email = "taro-at-example.jp".to_string();
        let mut wizard = FormWizard::with_draft(input);

        for _ in 0..5 {
            wizard.advance().unwrap();
        }
        assert_eq!(wizard.step(), WizardStep::CompanyInfo);
        assert_eq!(
            wizard.advance(),
            Err(WizardError::Validation(ValidationError::InvalidEmail))
        );
    }

    #[test]
    fn test_submission_freezes_input_and_transitions() {
        let mut wizard = FormWizard::with_draft(valid_input());
        while !matches!(wizard.step(), WizardStep::Privacy) {
            wizard.advance().unwrap();
        }
        let snapshot = wizard.begin_submission().unwrap();
        assert_eq!(snapshot.company_name, "テスト株式会社");
        assert_eq!(wizard.step(), WizardStep::Submitting);

        assert_eq!(
            wizard.update(|input| input.email.clear()),
            Err(WizardError::InputFrozen)
        );
        assert_eq!(wizard.advance(), Err(WizardError::InputFrozen));
        assert_eq!(wizard.retreat(), Err(WizardError::InputFrozen));
    }

    #[test]
    fn test_begin_submission_requires_final_step() {
        let mut wizard = FormWizard::with_draft(valid_input());
        assert_eq!(wizard.begin_submission(), Err(WizardError::NotAtFinalStep));
    }

    #[test]
    fn test_finish_without_submission_in_progress_fails() {
        let mut wizard = FormWizard::new();
        assert_eq!(wizard.finish_submission(), Err(WizardError::NotSubmitting));
    }

    #[test]
    fn test_submission_validates_prior_steps_too() {
        // Reach the final step legitimately, then hollow out an earlier
        // answer through a direct draft restore.
        let mut input = valid_input();
        input.industry = String::new();
        let mut wizard = FormWizard::with_draft(input);
        wizard.update(|i| i.terms_accepted = true).unwrap();
        // Walk past Industry by filling it, then clear it again.
        wizard.update(|i| i.industry = "食品".to_string()).unwrap();
        for _ in 0..6 {
            wizard.advance().unwrap();
        }
        assert_eq!(wizard.step(), WizardStep::Privacy);
        wizard.update(|i| i.industry = String::new()).unwrap();

        assert_eq!(
            wizard.begin_submission(),
            Err(WizardError::Validation(ValidationError::MissingField(
                "industry"
            )))
        );
        assert_eq!(wizard.step(), WizardStep::Privacy);
    }

    #[test]
    fn test_reset_returns_to_clean_first_step() {
        let mut wizard = FormWizard::with_draft(valid_input());
        wizard.advance().unwrap();
        wizard.reset();
        assert_eq!(wizard.step(), WizardStep::Terms);
        assert_eq!(wizard.input(), &FormInput::default());
    }
}
