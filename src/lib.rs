//! # CastMatch
//!
//! Diagnosis session pipeline for a talent-casting survey:
//! - multi-step survey wizard with per-step validation
//! - scoring-service client (request/response transform)
//! - result transport codec (compact URL form, verbose storage form)
//! - tab-scoped session storage with lifecycle purging
//! - cross-frame notification toward a hosting parent page

pub mod codec;
pub mod config;
pub mod error;
pub mod lifecycle;
pub mod matching;
pub mod models;
pub mod notifier;
pub mod pipeline;
pub mod store;
pub mod wizard;

pub use error::{Error, Result};
pub use models::{DiagnosisSession, FormInput, MatchResult};
