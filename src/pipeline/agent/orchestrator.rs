use std::sync::Arc;
use std::time::Instant;

use super::stages::{
    compose, guard, normalize_request, plan, retrieve, ConfidencePolicy, FixedConfidence,
};
use super::types::{AgentResult, AskRequest, Composed, PipelineState, Received, Scope};
use crate::config::AgentConfig;
use crate::pipeline::rag::curate::{KeywordCurator, SourceCurator};
use crate::pipeline::safety::crisis::CrisisTerms;
use crate::pipeline::AgentError;

/// Agent pipeline orchestrator.
///
/// Runs normalize → plan → retrieve → guard → compose for one request and
/// builds the [`AgentResult`]. Holds no per-request state, so a single
/// instance can serve concurrent callers.
pub struct AgentPipeline<C: SourceCurator = KeywordCurator> {
    curator: C,
    defaults: Scope,
    crisis_terms: Arc<CrisisTerms>,
    confidence: Box<dyn ConfidencePolicy + Send + Sync>,
}

impl AgentPipeline<KeywordCurator> {
    /// Keyword curation, `demo`/`u1` defaults, low confidence.
    pub fn new(crisis_terms: Arc<CrisisTerms>) -> Self {
        Self {
            curator: KeywordCurator,
            defaults: Scope::default(),
            crisis_terms,
            confidence: Box::new(FixedConfidence::default()),
        }
    }

    pub fn from_config(config: &AgentConfig) -> Self {
        Self::new(Arc::clone(config.crisis_terms())).with_defaults(Scope::new(
            &config.settings.org_id,
            &config.settings.user_id,
        ))
    }
}

impl Default for AgentPipeline<KeywordCurator> {
    fn default() -> Self {
        Self::new(Arc::new(CrisisTerms::defaults()))
    }
}

impl<C: SourceCurator> AgentPipeline<C> {
    /// Swap the Retrieve-stage collaborator.
    pub fn with_curator<D: SourceCurator>(self, curator: D) -> AgentPipeline<D> {
        AgentPipeline {
            curator,
            defaults: self.defaults,
            crisis_terms: self.crisis_terms,
            confidence: self.confidence,
        }
    }

    pub fn with_defaults(mut self, defaults: Scope) -> Self {
        self.defaults = defaults;
        self
    }

    pub fn with_confidence_policy<P>(mut self, policy: P) -> Self
    where
        P: ConfidencePolicy + Send + Sync + 'static,
    {
        self.confidence = Box::new(policy);
        self
    }

    pub fn crisis_terms(&self) -> &Arc<CrisisTerms> {
        &self.crisis_terms
    }

    /// Whether `query` trips the crisis gate, with the same input cleanup
    /// `run` applies.
    pub fn is_crisis_query(&self, query: &str) -> bool {
        self.crisis_terms.matches_query(query)
    }

    /// Answer one request.
    pub fn run(&self, request: AskRequest) -> Result<AgentResult, AgentError> {
        let started = Instant::now();
        let state = normalize_request(request, &self.defaults, &self.crisis_terms)?;

        let span = tracing::info_span!(
            "agent_run",
            trace_id = %state.notes.trace_id,
            org_id = %state.scope.org_id
        );
        let _entered = span.enter();

        let done = self.execute(state)?;
        let cost_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);

        tracing::info!(
            crisis = done.stage.crisis,
            source_count = done.stage.sources.len(),
            tokens = done.stage.tokens,
            cost_ms,
            "Agent run complete"
        );

        let Composed {
            answer,
            sources,
            confidence,
            tokens,
            ..
        } = done.stage;

        Ok(AgentResult {
            answer,
            sources,
            confidence,
            cost_ms,
            tokens,
        })
    }

    /// Convenience for a bare query with every other field defaulted.
    pub fn ask(&self, query: &str) -> Result<AgentResult, AgentError> {
        self.run(AskRequest::new(query))
    }

    /// Drive an already-normalized state through the four stages.
    pub fn execute(
        &self,
        state: PipelineState<Received>,
    ) -> Result<PipelineState<Composed>, AgentError> {
        let planned = plan(state);
        let retrieved = retrieve(planned, &self.curator)?;
        let guarded = guard(retrieved);
        Ok(compose(guarded, self.confidence.as_ref()))
    }
}
