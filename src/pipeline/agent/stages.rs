//! The four pipeline stages and request normalization.
//!
//! Each stage consumes the state produced by the previous one. Plan, Guard
//! and Compose are pure. Retrieve is pure with the default keyword curator
//! and only fails when a network-backed curator does.

use std::sync::Arc;

use uuid::Uuid;

use super::topic::{dedupe_preserve_order, extract_topic, normalize_query};
use super::types::{
    AskRequest, Composed, Confidence, Guarded, Notes, PipelineState, Planned, Received,
    Retrieved, Scope, StageName,
};
use crate::pipeline::rag::compose::{compose_grounded_answer, estimate_tokens};
use crate::pipeline::rag::curate::SourceCurator;
use crate::pipeline::safety::crisis::CrisisTerms;
use crate::pipeline::safety::escalation::crisis_message;
use crate::pipeline::safety::sanitize::sanitize_query;
use crate::pipeline::AgentError;

/// Decides the confidence label attached to a composed answer.
pub trait ConfidencePolicy {
    fn assess(&self, crisis: bool, sources: &[String]) -> Confidence;
}

/// Always reports the same label.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedConfidence(pub Confidence);

impl Default for FixedConfidence {
    fn default() -> Self {
        Self(Confidence::Low)
    }
}

impl ConfidencePolicy for FixedConfidence {
    fn assess(&self, _crisis: bool, _sources: &[String]) -> Confidence {
        self.0
    }
}

/// Turn a raw request into the initial state.
///
/// Fills missing identifiers from `defaults`, resolves the legacy query
/// alias, strips invisible and control characters, and picks the crisis-term
/// set (per-request override, else `default_terms`).
pub fn normalize_request(
    request: AskRequest,
    defaults: &Scope,
    default_terms: &Arc<CrisisTerms>,
) -> Result<PipelineState<Received>, AgentError> {
    let raw = request
        .query_text()
        .ok_or_else(|| AgentError::Validation("Request has no query".into()))?;
    let query = normalize_query(&sanitize_query(raw));
    if query.is_empty() {
        return Err(AgentError::Validation("Query is empty".into()));
    }

    let crisis_terms = match request.crisis_terms {
        Some(list) => Arc::new(CrisisTerms::new(list).map_err(|_| {
            AgentError::Validation("Request crisis_terms must contain at least one term".into())
        })?),
        None => Arc::clone(default_terms),
    };

    let scope = Scope {
        org_id: non_blank(request.org_id).unwrap_or_else(|| defaults.org_id.clone()),
        user_id: non_blank(request.user_id).unwrap_or_else(|| defaults.user_id.clone()),
    };
    let trace_id = non_blank(request.trace_id).unwrap_or_else(|| Uuid::new_v4().to_string());

    Ok(PipelineState {
        scope,
        query,
        notes: Notes {
            crisis_terms,
            trace_id,
        },
        stage: Received,
    })
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Record a human-readable plan naming the topic.
pub fn plan(state: PipelineState<Received>) -> PipelineState<Planned> {
    let topic = extract_topic(&state.query);
    let plan = format!("plan: analyze \u{2192} retrieve \u{2192} guard \u{2192} compose | topic='{topic}'");
    tracing::debug!(
        stage = StageName::Plan.as_str(),
        trace_id = %state.notes.trace_id,
        "Plan recorded"
    );
    state.map_stage(|Received| Planned { plan })
}

/// Attach the curated source list.
pub fn retrieve<C: SourceCurator + ?Sized>(
    state: PipelineState<Planned>,
    curator: &C,
) -> Result<PipelineState<Retrieved>, AgentError> {
    let sources = curator.curate(&state.query, &state.scope)?;
    tracing::debug!(
        stage = StageName::Retrieve.as_str(),
        trace_id = %state.notes.trace_id,
        source_count = sources.len(),
        "Sources curated"
    );
    Ok(state.map_stage(|Planned { plan }| Retrieved { plan, sources }))
}

/// Set the crisis flag. Does not alter the query or the sources.
pub fn guard(state: PipelineState<Retrieved>) -> PipelineState<Guarded> {
    let crisis = state.notes.crisis_terms.matches_query(&state.query);
    if crisis {
        // Query text stays out of the logs.
        tracing::warn!(
            trace_id = %state.notes.trace_id,
            term_count = state.notes.crisis_terms.len(),
            "Crisis indicators detected; escalating"
        );
    } else {
        tracing::debug!(
            stage = StageName::Guard.as_str(),
            trace_id = %state.notes.trace_id,
            "No crisis indicators"
        );
    }

    state.map_stage(|Retrieved { plan, sources }| Guarded {
        plan,
        sources,
        crisis,
    })
}

/// Produce the final answer, sources, confidence and token estimate.
///
/// A crisis answer carries no sources and no citation markers.
pub fn compose(
    state: PipelineState<Guarded>,
    policy: &dyn ConfidencePolicy,
) -> PipelineState<Composed> {
    let topic = extract_topic(&state.query);
    let composed = state.map_stage(|Guarded { plan, sources, crisis }| {
        let (answer, sources) = if crisis {
            (crisis_message(), Vec::new())
        } else {
            let sources = dedupe_preserve_order(sources);
            (compose_grounded_answer(&topic, &sources), sources)
        };
        let confidence = policy.assess(crisis, &sources);
        let tokens = estimate_tokens(&answer);

        Composed {
            plan,
            sources,
            crisis,
            answer,
            confidence,
            tokens,
        }
    });

    tracing::debug!(
        stage = StageName::Compose.as_str(),
        trace_id = %composed.notes.trace_id,
        crisis = composed.stage.crisis,
        tokens = composed.stage.tokens,
        "Answer composed"
    );
    composed
}
