//! Request-fatal failures.
//!
//! Anything listed here aborts the request with no itinerary. Lookup and
//! routing failures never appear here; they are absorbed into fallback values
//! and recorded as [`crate::report::Degradation`]s instead.
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PlanError {
    #[error("travel request is empty")]
    InvalidInput,

    #[error("language service call failed: {0:#}")]
    LanguageService(anyhow::Error),

    #[error("language service reply could not be decoded: {0}")]
    UpstreamParseError(String),

    #[error("intent is missing required field `{field}`")]
    IncompleteIntent { field: &'static str },
}

pub type PlanResult<T> = std::result::Result<T, PlanError>;
