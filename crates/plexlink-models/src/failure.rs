use serde::{Deserialize, Serialize};
use std::fmt;

/// Pipeline stage at which a resolution gave up
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase")]
pub enum ResolutionStep {
    MissingToken,
    FetchMetadata,
    ResolveExternalIds,
    ResolveBySearch,
}

impl fmt::Display for ResolutionStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ResolutionStep::MissingToken => "missing token",
            ResolutionStep::FetchMetadata => "fetch metadata",
            ResolutionStep::ResolveExternalIds => "resolve external ids",
            ResolutionStep::ResolveBySearch => "resolve by search",
        };
        f.write_str(label)
    }
}

/// Structured diagnosis of a failed resolution.
///
/// Returned as a value so callers can show the step, reason and the notes
/// collected along the way, plus offer a manual search seeded with
/// `search_query`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, thiserror::Error)]
#[error("{step}: {}", .reason.as_deref().unwrap_or("no reason given"))]
pub struct ResolutionFailure {
    pub step: ResolutionStep,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(default)]
    pub notes: Vec<String>,
    /// Series or item title to seed a manual catalog search
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search_query: Option<String>,
}

impl ResolutionFailure {
    pub fn new(step: ResolutionStep, reason: impl Into<String>, notes: Vec<String>) -> Self {
        Self {
            step,
            reason: Some(reason.into()),
            notes,
            search_query: None,
        }
    }

    pub fn with_search_query(mut self, query: impl Into<String>) -> Self {
        let query = query.into();
        if !query.trim().is_empty() {
            self.search_query = Some(query);
        }
        self
    }
}
