use std::sync::LazyLock;

use regex::Regex;

static CITATION_MARKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[(\d+)\]").expect("Invalid citation marker regex"));

/// Render inline citation markers for `sources`, in order: `" [1][2][3]"`.
///
/// Empty input renders as the empty string (no leading space).
pub fn render_citations<S: AsRef<str>>(sources: &[S]) -> String {
    if sources.is_empty() {
        return String::new();
    }
    let markers: String = (1..=sources.len()).map(|i| format!("[{i}]")).collect();
    format!(" {markers}")
}

/// Render the reference list `"[1] <source>, [2] <source>"`.
///
/// Ordinals are assigned exactly as in [`render_citations`].
pub fn format_reference_list<S: AsRef<str>>(sources: &[S]) -> String {
    sources
        .iter()
        .enumerate()
        .map(|(i, s)| format!("[{}] {}", i + 1, s.as_ref()))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Whether `text` contains any digit-bracket citation marker.
pub fn has_citation_markers(text: &str) -> bool {
    CITATION_MARKER.is_match(text)
}

/// Ordinals of every citation marker in `text`, in order of appearance.
pub fn citation_ordinals(text: &str) -> Vec<usize> {
    CITATION_MARKER
        .captures_iter(text)
        .filter_map(|cap| cap.get(1)?.as_str().parse().ok())
        .collect()
}
