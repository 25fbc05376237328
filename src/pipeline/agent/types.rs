use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::pipeline::safety::crisis::CrisisTerms;

pub const DEFAULT_ORG_ID: &str = "demo";
pub const DEFAULT_USER_ID: &str = "u1";

/// Coarse answer-reliability label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    Low,
    Med,
    High,
}

impl Confidence {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Med => "med",
            Self::High => "high",
        }
    }
}

impl fmt::Display for Confidence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Tenant and caller identifiers threaded through a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scope {
    pub org_id: String,
    pub user_id: String,
}

impl Scope {
    pub fn new(org_id: &str, user_id: &str) -> Self {
        Self {
            org_id: org_id.to_string(),
            user_id: user_id.to_string(),
        }
    }
}

impl Default for Scope {
    fn default() -> Self {
        Self::new(DEFAULT_ORG_ID, DEFAULT_USER_ID)
    }
}

/// Incoming request, before normalization.
///
/// `q` is the canonical query field; `query` is accepted from older callers
/// and only used when `q` is absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AskRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub q: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub org_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    /// Per-request override of the configured crisis-term set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub crisis_terms: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trace_id: Option<String>,
}

impl AskRequest {
    pub fn new(query: &str) -> Self {
        Self {
            q: Some(query.to_string()),
            ..Self::default()
        }
    }

    pub fn with_scope(mut self, org_id: &str, user_id: &str) -> Self {
        self.org_id = Some(org_id.to_string());
        self.user_id = Some(user_id.to_string());
        self
    }

    pub fn with_crisis_terms<I, S>(mut self, terms: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.crisis_terms = Some(terms.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_trace_id(mut self, trace_id: &str) -> Self {
        self.trace_id = Some(trace_id.to_string());
        self
    }

    /// The effective query text: `q`, else the legacy `query` field.
    pub fn query_text(&self) -> Option<&str> {
        self.q.as_deref().or(self.query.as_deref())
    }
}

/// The external contract returned to callers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentResult {
    pub answer: String,
    pub sources: Vec<String>,
    pub confidence: Confidence,
    /// Wall-clock time of the whole run. The only non-deterministic field.
    pub cost_ms: u64,
    pub tokens: usize,
}

impl AgentResult {
    /// Equality on everything except `cost_ms`.
    pub fn same_content(&self, other: &AgentResult) -> bool {
        self.answer == other.answer
            && self.sources == other.sources
            && self.confidence == other.confidence
            && self.tokens == other.tokens
    }
}

/// Cross-stage scratch data.
#[derive(Debug, Clone)]
pub struct Notes {
    pub crisis_terms: Arc<CrisisTerms>,
    pub trace_id: String,
}

/// Per-request state threaded through the stages.
///
/// `S` is the stage marker. Each stage consumes the previous state and
/// returns the next one, so a stage can only ever see earlier stages' output.
#[derive(Debug, Clone)]
pub struct PipelineState<S> {
    pub scope: Scope,
    pub query: String,
    pub notes: Notes,
    pub stage: S,
}

impl<S> PipelineState<S> {
    /// Move to the next stage, consuming the current marker by value.
    pub(crate) fn map_stage<T>(self, next: impl FnOnce(S) -> T) -> PipelineState<T> {
        PipelineState {
            scope: self.scope,
            query: self.query,
            notes: self.notes,
            stage: next(self.stage),
        }
    }
}

/// Normalized, not yet planned.
#[derive(Debug, Clone)]
pub struct Received;

#[derive(Debug, Clone)]
pub struct Planned {
    pub plan: String,
}

#[derive(Debug, Clone)]
pub struct Retrieved {
    pub plan: String,
    pub sources: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct Guarded {
    pub plan: String,
    pub sources: Vec<String>,
    pub crisis: bool,
}

#[derive(Debug, Clone)]
pub struct Composed {
    pub plan: String,
    pub sources: Vec<String>,
    pub crisis: bool,
    pub answer: String,
    pub confidence: Confidence,
    pub tokens: usize,
}

/// The four stages, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageName {
    Plan,
    Retrieve,
    Guard,
    Compose,
}

pub const STAGES: [StageName; 4] = [
    StageName::Plan,
    StageName::Retrieve,
    StageName::Guard,
    StageName::Compose,
];

impl StageName {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Plan => "plan",
            Self::Retrieve => "retrieve",
            Self::Guard => "guard",
            Self::Compose => "compose",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn confidence_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Confidence::Low).unwrap(), "\"low\"");
        assert_eq!(serde_json::to_string(&Confidence::Med).unwrap(), "\"med\"");
        let parsed: Confidence = serde_json::from_str("\"high\"").unwrap();
        assert_eq!(parsed, Confidence::High);
    }

    #[test]
    fn request_prefers_canonical_field() {
        let req: AskRequest =
            serde_json::from_str(r#"{"q":"new","query":"old"}"#).unwrap();
        assert_eq!(req.query_text(), Some("new"));
    }

    #[test]
    fn request_accepts_legacy_field() {
        let req: AskRequest = serde_json::from_str(r#"{"query":"old"}"#).unwrap();
        assert_eq!(req.query_text(), Some("old"));
    }

    #[test]
    fn request_without_query_has_none() {
        let req: AskRequest = serde_json::from_str(r#"{"org_id":"acme"}"#).unwrap();
        assert_eq!(req.query_text(), None);
    }

    #[test]
    fn result_serializes_contract_fields() {
        let result = AgentResult {
            answer: "a".into(),
            sources: vec!["s".into()],
            confidence: Confidence::Low,
            cost_ms: 3,
            tokens: 1,
        };
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["confidence"], "low");
        assert_eq!(json["cost_ms"], 3);
        assert_eq!(json["tokens"], 1);
        assert_eq!(json["sources"][0], "s");
    }

    #[test]
    fn same_content_ignores_cost() {
        let a = AgentResult {
            answer: "a".into(),
            sources: vec![],
            confidence: Confidence::Low,
            cost_ms: 0,
            tokens: 1,
        };
        let b = AgentResult { cost_ms: 42, ..a.clone() };
        assert!(a.same_content(&b));
        assert_ne!(a, b);
    }

    #[test]
    fn stages_in_fixed_order() {
        let names: Vec<&str> = STAGES.iter().map(StageName::as_str).collect();
        assert_eq!(names, vec!["plan", "retrieve", "guard", "compose"]);
    }

    #[test]
    fn default_scope() {
        assert_eq!(Scope::default(), Scope::new("demo", "u1"));
    }
}
