//! Source curation for the Retrieve stage.
//!
//! The default curator is a static keyword lookup with no I/O. A
//! retrieval-backed curator can be swapped in behind the same trait.

use super::embedder::EmbeddingModel;
use super::retrieval::{search_hits, SearchFilters, VectorSearch};
use crate::pipeline::agent::topic::dedupe_preserve_order;
use crate::pipeline::agent::types::Scope;
use crate::pipeline::AgentError;

/// General medical reference, always cited first.
pub const GENERAL_REFERENCE: &str = "https://medlineplus.gov/encyclopedia.html";
pub const SLEEP_REFERENCE: &str = "https://www.who.int/health-topics/sleep";
pub const MENTAL_HEALTH_REFERENCE: &str = "https://www.who.int/health-topics/mental-health";
pub const GENERAL_TOPIC_REFERENCE: &str = "https://www.who.int/";

/// A keyword group and the topic reference it selects.
struct TopicGroup {
    keywords: &'static [&'static str],
    reference: &'static str,
}

/// Groups in precedence order: the first group with a matching keyword wins.
/// New groups must be inserted at the position that reflects their precedence.
static TOPIC_GROUPS: &[TopicGroup] = &[
    TopicGroup {
        keywords: &["sleep hygiene", "sleep", "insomnia", "neend", "be-khwabi"],
        reference: SLEEP_REFERENCE,
    },
    TopicGroup {
        keywords: &[
            "anxiety", "depression", "stress", "panic", "ghabrahat", "pareshani", "udaasi",
        ],
        reference: MENTAL_HEALTH_REFERENCE,
    },
];

/// Map a query to its ordered reference list: the general reference, then
/// one topic reference.
pub fn curate_sources(query: &str) -> Vec<String> {
    let lower = query.to_lowercase();
    let topic = TOPIC_GROUPS
        .iter()
        .find(|group| group.keywords.iter().any(|kw| lower.contains(kw)))
        .map_or(GENERAL_TOPIC_REFERENCE, |group| group.reference);

    vec![GENERAL_REFERENCE.to_string(), topic.to_string()]
}

/// Produces the ordered source list for the Retrieve stage.
pub trait SourceCurator {
    fn curate(&self, query: &str, scope: &Scope) -> Result<Vec<String>, AgentError>;
}

/// Static keyword curator. Pure; never fails.
#[derive(Debug, Clone, Copy, Default)]
pub struct KeywordCurator;

impl SourceCurator for KeywordCurator {
    fn curate(&self, query: &str, _scope: &Scope) -> Result<Vec<String>, AgentError> {
        Ok(curate_sources(query))
    }
}

/// Curator backed by the embedding + vector-search collaborators.
///
/// Hits are ranked by descending score only. Sources are taken in rank order
/// and deduplicated; a pinned reference, when set, is always first.
pub struct RetrievalCurator<'a, E: EmbeddingModel, V: VectorSearch> {
    embedder: &'a E,
    store: &'a V,
    top_k: usize,
    pinned: Option<String>,
}

impl<'a, E: EmbeddingModel, V: VectorSearch> RetrievalCurator<'a, E, V> {
    pub fn new(embedder: &'a E, store: &'a V, top_k: usize) -> Self {
        Self {
            embedder,
            store,
            top_k,
            pinned: None,
        }
    }

    /// Always cite `reference` first, ahead of retrieved sources.
    pub fn with_pinned_reference(mut self, reference: &str) -> Self {
        self.pinned = Some(reference.to_string());
        self
    }
}

impl<E: EmbeddingModel, V: VectorSearch> SourceCurator for RetrievalCurator<'_, E, V> {
    fn curate(&self, query: &str, scope: &Scope) -> Result<Vec<String>, AgentError> {
        let filters = SearchFilters::for_org(&scope.org_id);
        let hits = search_hits(query, self.embedder, self.store, self.top_k, &filters)?;

        let sources = self
            .pinned
            .iter()
            .cloned()
            .chain(
                hits.iter()
                    .filter_map(|h| h.document.identifier().map(str::to_string)),
            )
            .collect();

        Ok(dedupe_preserve_order(sources))
    }
}
