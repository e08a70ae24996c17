//! Wire types for the scoring service HTTP contract

use crate::models::{FormInput, GenrePreference, MatchResult};
use serde::{Deserialize, Serialize};

/// Request body for the matching submission.
///
/// The transform is a straight pass-through of the survey answers; the
/// only shaping is the purpose/free-text merge and the genre flag's string
/// form. No score handling happens on this side.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchingRequest {
    pub industry: String,
    pub target_segment: String,
    pub purpose: String,
    pub budget: String,
    pub company_name: String,
    pub contact_name: String,
    pub email: String,
    pub phone: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub genre_preference: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub genres: Vec<String>,
}

impl From<&FormInput> for MatchingRequest {
    fn from(input: &FormInput) -> Self {
        Self {
            industry: input.industry.clone(),
            target_segment: input.target_segment.clone(),
            purpose: input.effective_purpose(),
            budget: input.budget.clone(),
            company_name: input.company_name.clone(),
            contact_name: input.contact_name.clone(),
            email: input.email.clone(),
            phone: input.phone.clone(),
            genre_preference: input.genre_preference.map(|p| {
                match p {
                    GenrePreference::HasPreference => "has_preference",
                    GenrePreference::NoPreference => "no_preference",
                }
                .to_string()
            }),
            genres: input.genres.clone(),
        }
    }
}

/// Response body of the matching submission.
///
/// Success and failure share one shape: the error fields are only populated
/// when `success` is false, and failure bodies also arrive on non-2xx
/// statuses.
#[derive(Debug, Clone, Deserialize)]
pub struct MatchingResponse {
    pub success: bool,
    #[serde(default)]
    pub total_results: Option<u32>,
    #[serde(default)]
    pub results: Vec<MatchingResponseItem>,
    #[serde(default)]
    pub session_id: Option<String>,
    #[serde(default)]
    pub timestamp: Option<String>,
    #[serde(default)]
    pub error_code: Option<String>,
    #[serde(default)]
    pub error_message: Option<String>,
}

/// One ranked candidate as the scoring service sends it.
#[derive(Debug, Clone, Deserialize)]
pub struct MatchingResponseItem {
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

impl From<MatchingResponseItem> for MatchResult {
    fn from(item: MatchingResponseItem) -> Self {
        Self {
            id: item.id,
            name: item.name,
            kana: item.kana,
            category: item.category,
            company_name: item.company_name,
            score: item.score,
            rank: item.rank,
            is_recommended: item.is_recommended,
            is_competitor_contracted: item.is_competitor_contracted,
        }
    }
}

/// Click-correlation payload. Failures never surface to the user.
#[derive(Debug, Clone, Serialize)]
pub struct TrackClickRequest {
    pub session_id: String,
    pub button_type: String,
    pub button_text: String,
}

/// Enrichment for one selected candidate on the results view.
#[derive(Debug, Clone, Deserialize)]
pub struct TalentDetails {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub kana: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub company_name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub achievements: Vec<String>,
}
