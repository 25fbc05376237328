//! Crisis gate: literal, case-insensitive substring matching of the query
//! against a set of crisis-indicator phrases. Not word-boundary aware.

use std::collections::BTreeSet;
use std::path::Path;

use super::sanitize::sanitize_query;
use crate::pipeline::agent::topic::normalize_query;
use crate::pipeline::AgentError;

/// Built-in crisis phrases, used when no external list is configured or the
/// configured resource cannot be read.
pub const DEFAULT_CRISIS_TERMS: &[&str] = &[
    "suicide",
    "kill myself",
    "self harm",
    "end my life",
    "harm myself",
    // Roman-Urdu
    "khudkushi",
    "zakhmi",
    // Urdu script
    "انتحار",
    "قتل",
];

/// A normalized, non-empty set of crisis phrases.
///
/// Terms are trimmed and lowercased on construction. The set is shared
/// read-only between requests once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrisisTerms {
    terms: BTreeSet<String>,
}

impl CrisisTerms {
    /// Build a term set from raw phrases. Input that normalizes to nothing
    /// is a configuration error.
    pub fn new<I, S>(raw: I) -> Result<Self, AgentError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let terms: BTreeSet<String> = raw
            .into_iter()
            .map(|t| t.as_ref().trim().to_lowercase())
            .filter(|t| !t.is_empty())
            .collect();

        if terms.is_empty() {
            return Err(AgentError::Configuration(
                "crisis term set is empty".to_string(),
            ));
        }

        Ok(Self { terms })
    }

    pub fn defaults() -> Self {
        Self {
            terms: DEFAULT_CRISIS_TERMS.iter().map(|t| t.to_string()).collect(),
        }
    }

    /// Parse a line-delimited term list. Blank lines and `#` comments are skipped.
    pub fn parse(text: &str) -> Result<Self, AgentError> {
        Self::new(
            text.lines()
                .map(str::trim)
                .filter(|line| !line.starts_with('#')),
        )
    }

    pub fn matches(&self, query: &str) -> bool {
        is_crisis(query, &self.terms)
    }

    /// Match raw user input: strip invisible and control characters and
    /// collapse whitespace first, exactly as the pipeline does before Guard.
    /// Every crisis check on user-supplied text goes through here.
    pub fn matches_query(&self, raw_query: &str) -> bool {
        self.matches(&normalize_query(&sanitize_query(raw_query)))
    }

    pub fn len(&self) -> usize {
        self.terms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.terms.iter().map(String::as_str)
    }

    pub fn as_set(&self) -> &BTreeSet<String> {
        &self.terms
    }
}

impl Default for CrisisTerms {
    fn default() -> Self {
        Self::defaults()
    }
}

/// True iff the lowercased query contains any term as a literal substring.
///
/// `terms` are expected to be lowercase already. An empty set never matches;
/// callers that must not fail open should hold a [`CrisisTerms`] instead.
pub fn is_crisis(query: &str, terms: &BTreeSet<String>) -> bool {
    if terms.is_empty() {
        return false;
    }
    let lower = query.to_lowercase();
    terms.iter().any(|term| lower.contains(term.as_str()))
}

/// Load the crisis-term resource.
///
/// - no path: built-in defaults
/// - unreadable file: warn, built-in defaults
/// - readable file with no usable lines: configuration error
pub fn load_crisis_terms(path: Option<&Path>) -> Result<CrisisTerms, AgentError> {
    let Some(path) = path else {
        return Ok(CrisisTerms::defaults());
    };

    match std::fs::read_to_string(path) {
        Ok(text) => {
            let terms = CrisisTerms::parse(&text).map_err(|_| {
                AgentError::Configuration(format!(
                    "crisis term resource {} contains no terms",
                    path.display()
                ))
            })?;
            tracing::info!(
                path = %path.display(),
                term_count = terms.len(),
                "Loaded crisis terms"
            );
            Ok(terms)
        }
        Err(e) => {
            tracing::warn!(
                path = %path.display(),
                error = %e,
                "Crisis term resource unreadable, using built-in defaults"
            );
            Ok(CrisisTerms::defaults())
        }
    }
}
