use serde::{Deserialize, Serialize};

use super::embedder::EmbeddingModel;
use super::snippet::{make_snippet, SNIPPET_MAX_CHARS};
use crate::pipeline::AgentError;

/// Upper clamp on requested result counts, regardless of what the caller asks for.
pub const MAX_TOP_K: usize = 20;

/// Document-level metadata attached to a search hit.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SourceMeta {
    pub title: Option<String>,
    pub source_url: Option<String>,
    pub external_id: Option<String>,
}

impl SourceMeta {
    /// Stable identifier for citation: URL, else external id, else title.
    pub fn identifier(&self) -> Option<&str> {
        self.source_url
            .as_deref()
            .or(self.external_id.as_deref())
            .or(self.title.as_deref())
            .filter(|s| !s.trim().is_empty())
    }
}

/// A ranked chunk returned by vector search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VectorHit {
    pub score: f32,
    pub content: String,
    /// Chunk position within its document.
    pub ordinal: u32,
    pub document: SourceMeta,
}

/// Search filters. Every field is optional; `None` means unconstrained.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchFilters {
    pub org_id: Option<String>,
    pub source_url: Option<String>,
    pub external_id: Option<String>,
    #[serde(alias = "title")]
    pub title_substring: Option<String>,
    pub min_score: Option<f32>,
}

impl SearchFilters {
    pub fn for_org(org_id: &str) -> Self {
        Self {
            org_id: Some(org_id.to_string()),
            ..Self::default()
        }
    }

    /// Parse document filters from a JSON object. Malformed input is treated
    /// as "no filters" rather than an error.
    pub fn from_json(raw: Option<&str>) -> Self {
        let Some(raw) = raw.filter(|r| !r.trim().is_empty()) else {
            return Self::default();
        };
        match serde_json::from_str::<SearchFilters>(raw) {
            Ok(filters) => filters,
            Err(e) => {
                tracing::debug!(error = %e, "Ignoring malformed search filters");
                Self::default()
            }
        }
    }
}

/// Vector-similarity search backend.
pub trait VectorSearch {
    fn search(
        &self,
        query_embedding: &[f32],
        top_k: usize,
        filters: &SearchFilters,
    ) -> Result<Vec<VectorHit>, AgentError>;
}

/// Clamp a requested result count into `1..=MAX_TOP_K`.
pub fn clamp_top_k(k: usize) -> usize {
    k.clamp(1, MAX_TOP_K)
}

/// Embed `query`, search, snippet each hit, and order by descending score.
///
/// The sort is stable and keyed on score alone: hits with equal scores keep
/// whatever order the backend returned them in, so ties are only as
/// deterministic as the backend.
pub fn search_hits(
    query: &str,
    embedder: &dyn EmbeddingModel,
    store: &dyn VectorSearch,
    top_k: usize,
    filters: &SearchFilters,
) -> Result<Vec<VectorHit>, AgentError> {
    let k = clamp_top_k(top_k);
    let embedding = embedder.embed(query)?;
    if embedding.len() != embedder.dimension() {
        return Err(AgentError::upstream(
            "embedding",
            format!(
                "dimension mismatch: expected {}, got {}",
                embedder.dimension(),
                embedding.len()
            ),
        ));
    }

    let mut hits = store.search(&embedding, k, filters)?;
    hits.truncate(k);
    for hit in &mut hits {
        hit.content = make_snippet(&hit.content, query, SNIPPET_MAX_CHARS);
    }
    hits.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    tracing::debug!(requested = top_k, effective = k, hits = hits.len(), "Vector search complete");
    Ok(hits)
}

/// One chunk of a JSON corpus file loaded into [`InMemoryVectorSearch`].
#[derive(Debug, Clone, Deserialize)]
pub struct CorpusEntry {
    pub org_id: String,
    #[serde(default)]
    pub ordinal: u32,
    pub content: String,
    #[serde(flatten)]
    pub document: SourceMeta,
}

/// In-memory vector search using cosine similarity.
pub struct InMemoryVectorSearch {
    entries: Vec<StoredEntry>,
}

struct StoredEntry {
    org_id: String,
    content: String,
    ordinal: u32,
    embedding: Vec<f32>,
    document: SourceMeta,
}

impl InMemoryVectorSearch {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    pub fn add(
        &mut self,
        org_id: &str,
        document: SourceMeta,
        ordinal: u32,
        content: &str,
        embedding: Vec<f32>,
    ) {
        self.entries.push(StoredEntry {
            org_id: org_id.to_string(),
            content: content.to_string(),
            ordinal,
            embedding,
            document,
        });
    }

    /// Embed every corpus entry and index it.
    pub fn from_corpus(
        corpus: Vec<CorpusEntry>,
        embedder: &dyn EmbeddingModel,
    ) -> Result<Self, AgentError> {
        let mut store = Self::new();
        for entry in corpus {
            let embedding = embedder.embed(&entry.content)?;
            store.add(
                &entry.org_id,
                entry.document,
                entry.ordinal,
                &entry.content,
                embedding,
            );
        }
        tracing::debug!(entries = store.len(), "Corpus indexed");
        Ok(store)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for InMemoryVectorSearch {
    fn default() -> Self {
        Self::new()
    }
}

impl StoredEntry {
    fn passes(&self, filters: &SearchFilters) -> bool {
        if let Some(org) = &filters.org_id {
            if &self.org_id != org {
                return false;
            }
        }
        if let Some(url) = &filters.source_url {
            if self.document.source_url.as_ref() != Some(url) {
                return false;
            }
        }
        if let Some(ext) = &filters.external_id {
            if self.document.external_id.as_ref() != Some(ext) {
                return false;
            }
        }
        if let Some(needle) = &filters.title_substring {
            let needle = needle.to_lowercase();
            let matches = self
                .document
                .title
                .as_deref()
                .is_some_and(|t| t.to_lowercase().contains(&needle));
            if !matches {
                return false;
            }
        }
        true
    }
}

impl VectorSearch for InMemoryVectorSearch {
    fn search(
        &self,
        query_embedding: &[f32],
        top_k: usize,
        filters: &SearchFilters,
    ) -> Result<Vec<VectorHit>, AgentError> {
        let mut scored: Vec<(f32, &StoredEntry)> = self
            .entries
            .iter()
            .filter(|entry| entry.passes(filters))
            .map(|entry| (cosine_similarity(query_embedding, &entry.embedding), entry))
            .filter(|(score, _)| filters.min_score.map_or(true, |min| *score >= min))
            .collect();

        scored.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));

        Ok(scored
            .into_iter()
            .take(top_k)
            .map(|(score, entry)| VectorHit {
                score,
                content: entry.content.clone(),
                ordinal: entry.ordinal,
                document: entry.document.clone(),
            })
            .collect())
    }
}

fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot / (norm_a * norm_b)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Embedder returning a fixed unit vector.
    pub(crate) struct FixedEmbedder(pub Vec<f32>);

    impl EmbeddingModel for FixedEmbedder {
        fn embed(&self, _text: &str) -> Result<Vec<f32>, AgentError> {
            Ok(self.0.clone())
        }
        fn dimension(&self) -> usize {
            self.0.len()
        }
    }

    pub(crate) fn meta(title: &str, url: &str) -> SourceMeta {
        SourceMeta {
            title: Some(title.to_string()),
            source_url: Some(url.to_string()),
            external_id: None,
        }
    }

    pub(crate) fn sleep_store() -> InMemoryVectorSearch {
        let mut store = InMemoryVectorSearch::new();
        store.add(
            "demo",
            meta("Sleep Hygiene Basics", "https://example.org/sleep"),
            0,
            "Good sleep habits improve mood and reduce anxiety.",
            vec![1.0, 0.0, 0.0],
        );
        store.add(
            "demo",
            meta("Sleep Hygiene Basics", "https://example.org/sleep"),
            1,
            "Avoid caffeine late; keep a regular bedtime routine.",
            vec![0.8, 0.6, 0.0],
        );
        store.add(
            "demo",
            meta("Managing Stress", "https://example.org/stress"),
            0,
            "Breathing and movement help with stress.",
            vec![0.0, 1.0, 0.0],
        );
        store.add(
            "other-org",
            meta("Private", "https://internal.example/private"),
            0,
            "Tenant-specific content.",
            vec![1.0, 0.0, 0.0],
        );
        store
    }

    #[test]
    fn cosine_similarity_identical_vectors() {
        let sim = cosine_similarity(&[1.0, 0.0, 0.0], &[1.0, 0.0, 0.0]);
        assert!((sim - 1.0).abs() < 0.01);
    }

    #[test]
    fn cosine_similarity_mismatched_lengths_is_zero() {
        assert_eq!(cosine_similarity(&[1.0, 0.0], &[1.0, 0.0, 0.0]), 0.0);
    }

    #[test]
    fn clamp_bounds() {
        assert_eq!(clamp_top_k(0), 1);
        assert_eq!(clamp_top_k(6), 6);
        assert_eq!(clamp_top_k(1000), MAX_TOP_K);
    }

    #[test]
    fn identifier_prefers_url_then_external_id_then_title() {
        let full = meta("T", "https://u");
        assert_eq!(full.identifier(), Some("https://u"));

        let ext = SourceMeta {
            title: Some("T".into()),
            source_url: None,
            external_id: Some("ext-1".into()),
        };
        assert_eq!(ext.identifier(), Some("ext-1"));

        assert_eq!(SourceMeta::default().identifier(), None);
    }

    #[test]
    fn filters_from_json_reads_fields_and_title_alias() {
        let f = SearchFilters::from_json(Some(r#"{"source_url":"https://u","title":"depression"}"#));
        assert_eq!(f.source_url.as_deref(), Some("https://u"));
        assert_eq!(f.title_substring.as_deref(), Some("depression"));
        assert!(f.org_id.is_none());
    }

    #[test]
    fn malformed_filters_mean_no_filters() {
        assert_eq!(SearchFilters::from_json(Some("[1,2")), SearchFilters::default());
        assert_eq!(SearchFilters::from_json(Some("[1,2]")), SearchFilters::default());
        assert_eq!(SearchFilters::from_json(None), SearchFilters::default());
    }

    #[test]
    fn search_scoped_to_org_and_sorted() {
        let store = sleep_store();
        let embedder = FixedEmbedder(vec![1.0, 0.0, 0.0]);
        let hits = search_hits("sleep anxiety", &embedder, &store, 6, &SearchFilters::for_org("demo"))
            .unwrap();

        assert_eq!(hits.len(), 3);
        assert!(hits.windows(2).all(|w| w[0].score >= w[1].score));
        assert!(hits
            .iter()
            .all(|h| h.document.source_url.as_deref() != Some("https://internal.example/private")));
        assert!(hits[0].content.contains("**sleep**"));
        assert!(hits[0].content.contains("**anxiety**"));
    }

    #[test]
    fn search_respects_requested_k() {
        let store = sleep_store();
        let embedder = FixedEmbedder(vec![1.0, 0.0, 0.0]);
        let hits = search_hits("sleep", &embedder, &store, 2, &SearchFilters::for_org("demo")).unwrap();
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].ordinal, 0);
    }

    #[test]
    fn corpus_json_indexed_and_searchable() {
        let raw = r#"[
            {"org_id":"demo","title":"Sleep","source_url":"https://example.org/sleep","content":"Keep a regular bedtime."},
            {"org_id":"demo","external_id":"kb-7","ordinal":2,"content":"Breathing helps with stress."}
        ]"#;
        let corpus: Vec<CorpusEntry> = serde_json::from_str(raw).unwrap();
        let embedder = FixedEmbedder(vec![1.0, 0.0, 0.0]);
        let store = InMemoryVectorSearch::from_corpus(corpus, &embedder).unwrap();
        assert_eq!(store.len(), 2);

        let filters = SearchFilters::from_json(Some(r#"{"org_id":"demo","external_id":"kb-7"}"#));
        let hits = search_hits("stress", &embedder, &store, 5, &filters).unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].ordinal, 2);
        assert_eq!(hits[0].document.identifier(), Some("kb-7"));
    }

    #[test]
    fn min_score_filters_weak_hits() {
        let store = sleep_store();
        let embedder = FixedEmbedder(vec![1.0, 0.0, 0.0]);
        let filters = SearchFilters {
            org_id: Some("demo".into()),
            min_score: Some(0.5),
            ..SearchFilters::default()
        };
        let hits = search_hits("sleep", &embedder, &store, 20, &filters).unwrap();
        assert_eq!(hits.len(), 2);
    }

    #[test]
    fn title_substring_filter_is_case_insensitive() {
        let store = sleep_store();
        let embedder = FixedEmbedder(vec![1.0, 0.0, 0.0]);
        let filters = SearchFilters {
            title_substring: Some("STRESS".into()),
            ..SearchFilters::default()
        };
        let hits = search_hits("stress", &embedder, &store, 20, &filters).unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].document.title.as_deref(), Some("Managing Stress"));
    }

    #[test]
    fn embedder_dimension_mismatch_is_upstream_error() {
        struct Liar;
        impl EmbeddingModel for Liar {
            fn embed(&self, _text: &str) -> Result<Vec<f32>, AgentError> {
                Ok(vec![1.0])
            }
            fn dimension(&self) -> usize {
                3
            }
        }
        let err = search_hits("q", &Liar, &sleep_store(), 5, &SearchFilters::default()).unwrap_err();
        assert!(matches!(err, AgentError::Upstream { .. }));
    }
}
