//! Core data model for one diagnosis session
//!
//! A session is: the survey answers (`FormInput`), the ranked candidates the
//! scoring service returned (`MatchResult`), and the aggregate that travels
//! through storage and the URL transport (`DiagnosisSession`).

use serde::{Deserialize, Serialize};

/// Ranks at or below this value are treated as recommended picks when the
/// transport encoding has dropped the explicit flag.
pub const RECOMMENDED_RANK_MAX: u32 = 3;

/// Fixed hiring-purpose option that accepts free text.
pub const OTHER_PURPOSE: &str = "その他";

/// Whether the respondent wants specific talent genres considered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GenrePreference {
    HasPreference,
    NoPreference,
}

/// Survey answers accumulated across the wizard steps.
///
/// Fields are filled in step order and never partially rolled back; only a
/// full reset clears them. Personal-identifying fields (contact name, email,
/// phone, genre selections) never enter the compact URL encoding.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FormInput {
    pub terms_accepted: bool,
    pub industry: String,
    pub target_segment: String,
    pub purpose: String,
    /// Free text, only meaningful when `purpose` is the "other" option.
    pub purpose_detail: String,
    pub budget: String,
    pub company_name: String,
    pub contact_name: String,
    pub email: String,
    pub phone: String,
    pub genre_preference: Option<GenrePreference>,
    pub genres: Vec<String>,
    pub privacy_accepted: bool,
}

impl FormInput {
    /// Purpose as sent to the scoring service: the fixed "other" reason gets
    /// the free-text detail appended.
    pub fn effective_purpose(&self) -> String {
        if self.purpose == OTHER_PURPOSE && !self.purpose_detail.trim().is_empty() {
            format!("{}：{}", self.purpose, self.purpose_detail.trim())
        } else {
            self.purpose.clone()
        }
    }
}

/// One ranked candidate from the scoring service.
///
/// Produced atomically as a batch from one scoring response and immutable
/// thereafter. The score carries one decimal place; the client never
/// re-ranks or re-scores.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchResult {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub kana: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub company_name: Option<String>,
    pub score: f64,
    pub rank: u32,
    #[serde(default)]
    pub is_recommended: bool,
    #[serde(default)]
    pub is_competitor_contracted: bool,
}

/// The aggregate transported across the pipeline.
///
/// Created once per scoring call (successful or failed), handed to the
/// session store at submission time, and destroyed only by the lifecycle
/// guard.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DiagnosisSession {
    pub results: Vec<MatchResult>,
    pub form_input: FormInput,
    pub error: Option<String>,
    /// Opaque identifier assigned by the scoring service, reused for
    /// click-tracking correlation.
    pub session_id: Option<String>,
}

impl DiagnosisSession {
    /// Successful scoring outcome.
    pub fn completed(
        form_input: FormInput,
        results: Vec<MatchResult>,
        session_id: Option<String>,
    ) -> Self {
        Self {
            results,
            form_input,
            error: None,
            session_id,
        }
    }

    /// Failed scoring outcome: empty result list, error string populated.
    pub fn errored(form_input: FormInput, error: String) -> Self {
        Self {
            results: Vec::new(),
            form_input,
            error: Some(error),
            session_id: None,
        }
    }

    pub fn is_errored(&self) -> bool {
        self.error.is_some()
    }
}

/// Diagnostic check: ranks are unique and follow non-increasing score order.
pub fn ranking_is_consistent(results: &[MatchResult]) -> bool {
    let mut ordered: Vec<(u32, f64)> = results.iter().map(|r| (r.rank, r.score)).collect();
    ordered.sort_by_key(|(rank, _)| *rank);
    ordered
        .windows(2)
        .all(|pair| pair[0].0 < pair[1].0 && pair[0].1 >= pair[1].1)
}
