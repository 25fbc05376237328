//! Bilingual grounded-answer template.

use super::citation::render_citations;

/// Display topic when the query yields no words.
pub const DEFAULT_TOPIC_EN: &str = "This topic";
pub const DEFAULT_TOPIC_UR: &str = "Is mawzu\u{02bc}";

/// Compose the normal (non-crisis) answer: an English paragraph and a
/// Roman-Urdu paragraph separated by a blank line, both carrying the same
/// citation markers and both stating the content is educational only.
pub fn compose_grounded_answer<S: AsRef<str>>(topic: &str, sources: &[S]) -> String {
    let citations = render_citations(sources);
    let (topic_en, topic_ur) = if topic.is_empty() {
        (DEFAULT_TOPIC_EN, DEFAULT_TOPIC_UR)
    } else {
        (topic, topic)
    };

    let en = format!(
        "{topic_en}: Here\u{2019}s a brief, general overview based on trusted health references\
         {citations}. This is educational information only and not a medical diagnosis or treatment."
    );
    let ur = format!(
        "{topic_ur} ke baare mein mukhtasar, aam maloomat di gayi hai{citations}. \
         Yeh taleemi maqsad ke liye hai, yeh tibbi tashkhis ya ilaaj ka mashwara nahi hai."
    );

    format!("{en}\n\n{ur}")
}

/// Deterministic cost proxy: one token per four characters, never below one.
pub fn estimate_tokens(text: &str) -> usize {
    (text.chars().count() / 4).max(1)
}
