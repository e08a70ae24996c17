//! Result transport encodings
//!
//! A `DiagnosisSession` travels two ways: as four keys in the ephemeral
//! store (same-tab navigation), and as a single URL query parameter (fresh
//! tab or frame). The URL form uses a compact, key-renamed encoding that
//! drops every personal-identifying field; the storage form is a direct
//! structural encoding with full fidelity.
//!
//! Decoding dispatches structurally: a payload carrying both `r` and `f`
//! is compact, anything else is treated as verbose. The results-view load
//! point consumes the URL payload exactly once, so a refreshed or forwarded
//! URL cannot re-expose the data.

use crate::models::{DiagnosisSession, FormInput, MatchResult, RECOMMENDED_RANK_MAX};
use crate::store::{KeySpace, SessionStore};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};

/// Query parameter carrying an encoded session.
pub const TRANSPORT_PARAM: &str = "result";

/// Result transport errors
#[derive(Debug, Error)]
pub enum CodecError {
    #[error("Malformed payload: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("Payload is not valid percent-encoding: {0}")]
    Escape(String),

    #[error("Payload shape not recognized")]
    UnrecognizedShape,
}

/// Where an encoded session is headed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EncodeTarget {
    /// Compact, PII-stripped, percent-escaped for a query parameter.
    ForUrl,
    /// Verbose single-blob JSON, full fidelity.
    ForStorage,
}

/// What the results view found at its load point.
#[derive(Debug, Clone, PartialEq)]
pub enum LoadOutcome {
    Session(DiagnosisSession),
    /// No payload and no stored data, or a payload that failed to decode.
    /// Routes to the empty-state view, never the error panel.
    NoSession,
}

#[derive(Debug, Serialize, Deserialize)]
struct CompactResult {
    i: i64,
    n: String,
    #[serde(default)]
    k: Option<String>,
    #[serde(default)]
    c: Option<String>,
    #[serde(default)]
    cn: Option<String>,
    s: f64,
    rk: u32,
}

#[derive(Debug, Serialize, Deserialize)]
struct CompactForm {
    i: String,
    t: String,
    p: String,
    b: String,
    cn: String,
}

#[derive(Debug, Serialize, Deserialize)]
struct CompactSession {
    r: Vec<CompactResult>,
    f: CompactForm,
}

impl CompactSession {
    fn from_session(session: &DiagnosisSession) -> Self {
        Self {
            r: session
                .results
                .iter()
                .map(|m| CompactResult {
                    i: m.id,
                    n: m.name.clone(),
                    k: m.kana.clone(),
                    c: m.category.clone(),
                    cn: m.company_name.clone(),
                    s: round_to_tenth(m.score),
                    rk: m.rank,
                })
                .collect(),
            f: CompactForm {
                i: session.form_input.industry.clone(),
                t: session.form_input.target_segment.clone(),
                p: session.form_input.effective_purpose(),
                b: session.form_input.budget.clone(),
                cn: session.form_input.company_name.clone(),
            },
        }
    }

    fn into_session(self) -> DiagnosisSession {
        let results = self
            .r
            .into_iter()
            .map(|c| MatchResult {
                id: c.i,
                name: c.n,
                kana: c.k,
                category: c.c,
                company_name: c.cn,
                score: c.s,
                rank: c.rk,
                // The compact form drops both flags; recommendation is
                // recoverable from the rank, competitor usage is not.
                is_recommended: c.rk <= RECOMMENDED_RANK_MAX,
                is_competitor_contracted: false,
            })
            .collect();

        let form_input = FormInput {
            industry: self.f.i,
            target_segment: self.f.t,
            purpose: self.f.p,
            budget: self.f.b,
            company_name: self.f.cn,
            ..Default::default()
        };

        DiagnosisSession {
            results,
            form_input,
            error: None,
            session_id: None,
        }
    }
}

fn round_to_tenth(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Encode a session for the given target.
pub fn encode(session: &DiagnosisSession, target: EncodeTarget) -> Result<String, CodecError> {
    match target {
        EncodeTarget::ForUrl => {
            let json = serde_json::to_string(&CompactSession::from_session(session))?;
            Ok(urlencoding::encode(&json).into_owned())
        }
        EncodeTarget::ForStorage => Ok(serde_json::to_string(session)?),
    }
}

/// Decode a raw JSON payload in either form.
pub fn decode(payload: &str) -> Result<DiagnosisSession, CodecError> {
    let value: Value = serde_json::from_str(payload)?;
    let object = value.as_object().ok_or(CodecError::UnrecognizedShape)?;

    if object.contains_key("r") && object.contains_key("f") {
        let compact: CompactSession = serde_json::from_value(value)?;
        Ok(compact.into_session())
    } else if object.contains_key("results") || object.contains_key("formInput") {
        Ok(serde_json::from_value(value)?)
    } else {
        Err(CodecError::UnrecognizedShape)
    }
}

/// Decode a still-escaped query parameter value.
pub fn decode_url_param(raw: &str) -> Result<DiagnosisSession, CodecError> {
    let json = urlencoding::decode(raw).map_err(|e| CodecError::Escape(e.to_string()))?;
    decode(&json)
}

/// Remove and return the transport parameter from a parsed query string.
///
/// The parameter is consumed even when the payload later fails to decode,
/// so the caller's location never retains the encoded data.
pub fn take_transport_param(query: &mut Vec<(String, String)>) -> Option<String> {
    let index = query.iter().position(|(key, _)| key == TRANSPORT_PARAM)?;
    Some(query.remove(index).1)
}

/// Write a session through the store adapter as its four logical keys.
pub fn save_to_store(
    store: &dyn SessionStore,
    keys: &KeySpace,
    session: &DiagnosisSession,
) -> Result<(), CodecError> {
    store.put(&keys.results(), &serde_json::to_string(&session.results)?);
    store.put(
        &keys.form_input(),
        &serde_json::to_string(&session.form_input)?,
    );
    match &session.error {
        Some(error) => store.put(&keys.error(), error),
        None => store.remove(&keys.error()),
    }
    match &session.session_id {
        Some(id) => store.put(&keys.session_id(), id),
        None => store.remove(&keys.session_id()),
    }
    Ok(())
}

/// Reassemble a session from the store, if one was ever written.
pub fn load_from_store(store: &dyn SessionStore, keys: &KeySpace) -> Option<DiagnosisSession> {
    let results_raw = store.get(&keys.results());
    let error = store.get(&keys.error());
    if results_raw.is_none() && error.is_none() {
        return None;
    }

    let results = results_raw
        .and_then(|raw| {
            serde_json::from_str(&raw)
                .map_err(|e| warn!(error = %e, "stored results unreadable"))
                .ok()
        })
        .unwrap_or_default();
    let form_input = store
        .get(&keys.form_input())
        .and_then(|raw| {
            serde_json::from_str(&raw)
                .map_err(|e| warn!(error = %e, "stored form input unreadable"))
                .ok()
        })
        .unwrap_or_default();

    Some(DiagnosisSession {
        results,
        form_input,
        error,
        session_id: store.get(&keys.session_id()),
    })
}

/// Single load point for the results view.
///
/// A URL payload wins over stored data and is stripped from the query on
/// extraction. A malformed payload is a hard no-session condition; only the
/// absent-payload path consults the store.
pub fn load_session(
    query: &mut Vec<(String, String)>,
    store: &dyn SessionStore,
    keys: &KeySpace,
) -> LoadOutcome {
    if let Some(raw) = take_transport_param(query) {
        return match decode_url_param(&raw) {
            Ok(session) => {
                debug!(results = session.results.len(), "session decoded from URL");
                LoadOutcome::Session(session)
            }
            Err(e) => {
                warn!(error = %e, "discarding malformed transport payload");
                LoadOutcome::NoSession
            }
        };
    }

    match load_from_store(store, keys) {
        Some(session) => LoadOutcome::Session(session),
        None => LoadOutcome::NoSession,
    }
}
