//! Per-step validation predicates
//!
//! Validation errors are step-local values: they block the forward
//! transition and are surfaced inline, never sent to the network.

use super::WizardStep;
use crate::models::{FormInput, GenrePreference};
use thiserror::Error;

/// Accepted Japanese mobile number prefixes.
pub const MOBILE_PREFIXES: [&str; 3] = ["070", "080", "090"];

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("terms of service must be accepted")]
    TermsNotAccepted,

    #[error("required field is empty: {0}")]
    MissingField(&'static str),

    #[error("email address is malformed")]
    InvalidEmail,

    #[error("phone number is not a Japanese mobile number")]
    InvalidPhone,

    #[error("at least one genre must be selected")]
    GenreRequired,

    #[error("privacy policy must be accepted")]
    PrivacyNotAccepted,
}

/// Must contain an `@` with a dot somewhere after it.
pub fn email_is_valid(email: &str) -> bool {
    match email.split_once('@') {
        Some((_, domain)) => domain.contains('.'),
        None => false,
    }
}

/// Eleven digits after separator removal, starting with a mobile prefix.
pub fn phone_is_valid(phone: &str) -> bool {
    let digits: String = phone.chars().filter(|c| !matches!(c, '-' | ' ')).collect();
    digits.len() == 11
        && digits.chars().all(|c| c.is_ascii_digit())
        && MOBILE_PREFIXES.iter().any(|p| digits.starts_with(p))
}

/// Guard predicate for the forward transition out of `step`.
pub fn validate_step(step: WizardStep, input: &FormInput) -> Result<(), ValidationError> {
    match step {
        WizardStep::Terms => {
            if input.terms_accepted {
                Ok(())
            } else {
                Err(ValidationError::TermsNotAccepted)
            }
        }
        WizardStep::Industry => require(&input.industry, "industry"),
        WizardStep::Audience => require(&input.target_segment, "target_segment"),
        WizardStep::Purpose => require(&input.purpose, "purpose"),
        WizardStep::Budget => require(&input.budget, "budget"),
        WizardStep::CompanyInfo => {
            require(&input.company_name, "company_name")?;
            require(&input.contact_name, "contact_name")?;
            require(&input.email, "email")?;
            if !email_is_valid(&input.email) {
                return Err(ValidationError::InvalidEmail);
            }
            require(&input.phone, "phone")?;
            if !phone_is_valid(&input.phone) {
                return Err(ValidationError::InvalidPhone);
            }
            Ok(())
        }
        WizardStep::Privacy => {
            if input.genre_preference == Some(GenrePreference::HasPreference)
                && input.genres.is_empty()
            {
                return Err(ValidationError::GenreRequired);
            }
            if input.privacy_accepted {
                Ok(())
            } else {
                Err(ValidationError::PrivacyNotAccepted)
            }
        }
        // Terminal pseudo-states accept no input and have nothing to check.
        WizardStep::Submitting | WizardStep::Submitted => Ok(()),
    }
}

/// Validate every input step up to and including `last`.
pub fn validate_through(last: WizardStep, input: &FormInput) -> Result<(), ValidationError> {
    for step in super::INPUT_STEPS {
        validate_step(step, input)?;
        if step == last {
            break;
        }
    }
    Ok(())
}

fn require(value: &str, field: &'static str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        Err(ValidationError::MissingField(field))
    } else {
        Ok(())
    }
}
