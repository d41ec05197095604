//! Primary/fallback bookkeeping shared by the transcription and generation chains.

use serde::Serialize;
use std::sync::Arc;

/// Which strategy produced a result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Method {
    Primary,
    Fallback,
}

impl std::fmt::Display for Method {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Method::Primary => write!(f, "primary"),
            Method::Fallback => write!(f, "fallback"),
        }
    }
}

/// Why a single strategy attempt produced nothing usable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum StrategyFailure {
    /// The collaborator has no access credential configured; the attempt was skipped.
    MissingCredential(String),
    /// No local audio could be obtained.
    AcquisitionFailed(String),
    /// The speech-recognition call failed.
    TranscriptionFailed(String),
    /// Captions are turned off for the video.
    CaptionsDisabled,
    /// Captions exist but none in an accepted language.
    CaptionsNotFound,
    /// Caption listing or download failed.
    LookupFailed(String),
    /// A text-generation service returned an error.
    ServiceError(String),
    /// The call succeeded but returned blank text.
    EmptyOutput,
}

impl std::fmt::Display for StrategyFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StrategyFailure::MissingCredential(name) => write!(f, "{} not configured", name),
            StrategyFailure::AcquisitionFailed(e) => write!(f, "audio acquisition failed: {}", e),
            StrategyFailure::TranscriptionFailed(e) => write!(f, "transcription failed: {}", e),
            StrategyFailure::CaptionsDisabled => write!(f, "captions are disabled"),
            StrategyFailure::CaptionsNotFound => write!(f, "no caption track in an accepted language"),
            StrategyFailure::LookupFailed(e) => write!(f, "caption lookup failed: {}", e),
            StrategyFailure::ServiceError(e) => write!(f, "service error: {}", e),
            StrategyFailure::EmptyOutput => write!(f, "empty output"),
        }
    }
}

/// A collaborator that may be unavailable because its credential is absent.
///
/// Absence is not an error: the owning chain records it as
/// [`StrategyFailure::MissingCredential`] and moves on.
pub enum Provider<T: ?Sized> {
    Configured(Arc<T>),
    Unconfigured { credential: String },
}

impl<T: ?Sized> Provider<T> {
    /// Wrap an optional collaborator, naming the credential it would need.
    pub fn from_option(inner: Option<Arc<T>>, credential: &str) -> Self {
        match inner {
            Some(inner) => Provider::Configured(inner),
            None => Provider::Unconfigured {
                credential: credential.to_string(),
            },
        }
    }

    pub fn is_configured(&self) -> bool {
        matches!(self, Provider::Configured(_))
    }

    /// Borrow the collaborator, or the failure to record when it is missing.
    pub fn get(&self) -> std::result::Result<&Arc<T>, StrategyFailure> {
        match self {
            Provider::Configured(inner) => Ok(inner),
            Provider::Unconfigured { credential } => {
                Err(StrategyFailure::MissingCredential(credential.clone()))
            }
        }
    }
}

impl<T: ?Sized> Clone for Provider<T> {
    fn clone(&self) -> Self {
        match self {
            Provider::Configured(inner) => Provider::Configured(inner.clone()),
            Provider::Unconfigured { credential } => Provider::Unconfigured {
                credential: credential.clone(),
            },
        }
    }
}

/// Returns the text if it has any non-whitespace content.
pub(crate) fn non_empty(text: String) -> std::result::Result<String, StrategyFailure> {
    if text.trim().is_empty() {
        Err(StrategyFailure::EmptyOutput)
    } else {
        Ok(text)
    }
}
