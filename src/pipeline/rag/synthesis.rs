//! Open-ended LLM synthesis over retrieved hits.
//!
//! Sits outside the deterministic pipeline but keeps the same crisis gate:
//! a crisis query gets the fixed escalation message and the generator is
//! never called.

use serde::Serialize;

use super::citation::format_reference_list;
use super::retrieval::VectorHit;
use crate::pipeline::agent::topic::dedupe_preserve_order;
use crate::pipeline::safety::crisis::CrisisTerms;
use crate::pipeline::safety::escalation::{crisis_message, disclaimer, DISCLAIMER_EN};
use crate::pipeline::AgentError;

/// Number of hits placed in the prompt context.
const CONTEXT_HITS: usize = 3;
/// Characters kept from each hit.
const CONTEXT_SNIPPET_CHARS: usize = 300;

pub const SYNTHESIS_SYSTEM_PROMPT: &str = r#"You are Sukoon, a bilingual (English + Roman Urdu) mind-wellness assistant. Give concise, conversational answers in two languages.

Always follow this structure:
1. English answer: at most 3-4 sentences.
2. Roman Urdu answer: at most 3-4 sentences.
3. Sources: name the knowledge sources you used.

RULES:
- Answer ONLY from the provided context. If the context does not cover the question, say so.
- Never diagnose, prescribe, or recommend treatment.
- Keep the tone warm and natural. Write short paragraphs, not bullet lists."#;

/// LLM text generation collaborator.
pub trait LlmGenerate {
    fn generate(&self, system: &str, prompt: &str) -> Result<String, AgentError>;
}

/// Outcome of a synthesis call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Synthesis {
    pub answer: String,
    pub sources: Vec<String>,
    pub crisis: bool,
}

/// Build the user prompt from the query and the top hits.
pub fn build_synthesis_prompt(query: &str, hits: &[VectorHit]) -> String {
    let context = hits
        .iter()
        .take(CONTEXT_HITS)
        .map(|hit| {
            let source = hit.document.identifier().unwrap_or("unknown");
            let snippet: String = hit.content.chars().take(CONTEXT_SNIPPET_CHARS).collect();
            format!("Source: {source}\nContent: {snippet}")
        })
        .collect::<Vec<_>>()
        .join("\n\n");
    let references = format_reference_list(&context_sources(hits));

    format!(
        "User query: {query}\n\n\
         Relevant context from knowledge sources:\n{context}\n\n\
         References: {references}\n\n\
         Now answer bilingually (English + Roman Urdu) in a natural conversational style."
    )
}

/// Distinct identifiers of the hits placed in the prompt, in rank order.
fn context_sources(hits: &[VectorHit]) -> Vec<String> {
    dedupe_preserve_order(
        hits.iter()
            .take(CONTEXT_HITS)
            .filter_map(|h| h.document.identifier().map(str::to_string))
            .collect(),
    )
}

/// Synthesize a free-form bilingual answer, crisis gate first.
pub fn synthesize<G: LlmGenerate>(
    generator: &G,
    query: &str,
    hits: &[VectorHit],
    crisis_terms: &CrisisTerms,
) -> Result<Synthesis, AgentError> {
    if crisis_terms.matches_query(query) {
        tracing::warn!(term_count = crisis_terms.len(), "Crisis gate fired before synthesis");
        return Ok(Synthesis {
            answer: crisis_message(),
            sources: Vec::new(),
            crisis: true,
        });
    }

    let prompt = build_synthesis_prompt(query, hits);
    let raw = generator.generate(SYNTHESIS_SYSTEM_PROMPT, &prompt)?;

    let mut answer = raw.trim().to_string();
    if !answer.contains(DISCLAIMER_EN) {
        answer.push_str("\n\n");
        answer.push_str(&disclaimer());
    }

    let sources = context_sources(hits);

    Ok(Synthesis {
        answer,
        sources,
        crisis: false,
    })
}
