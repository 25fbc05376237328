use std::sync::LazyLock;

use regex::{Regex, RegexBuilder};

/// Default snippet length in characters (before ellipses and bolding).
pub const SNIPPET_MAX_CHARS: usize = 480;

/// Query terms shorter than this are not highlighted or used for windowing.
const MIN_TERM_CHARS: usize = 3;

static WHITESPACE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("Invalid whitespace regex"));
static QUERY_TERM: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[A-Za-z0-9]+").expect("Invalid query term regex"));

/// Collapse whitespace runs to a single space and trim both ends.
pub fn normalize_ws(text: &str) -> String {
    WHITESPACE.replace_all(text, " ").trim().to_string()
}

/// ASCII alphanumeric query terms of at least three characters, in query order.
fn query_terms(query: &str) -> Vec<&str> {
    QUERY_TERM
        .find_iter(query)
        .map(|m| m.as_str())
        .filter(|t| t.len() >= MIN_TERM_CHARS)
        .collect()
}

/// Wrap case-insensitive occurrences of query terms in `**`, longest term first.
pub fn bold_keywords(text: &str, query: &str) -> String {
    if text.is_empty() || query.is_empty() {
        return text.to_string();
    }

    let mut terms = query_terms(query);
    terms.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));
    terms.dedup();

    let mut out = text.to_string();
    for term in terms {
        let Ok(re) = RegexBuilder::new(&regex::escape(term))
            .case_insensitive(true)
            .build()
        else {
            continue;
        };
        out = re.replace_all(&out, "**$0**").into_owned();
    }
    out
}

/// Cut `content` to about `max_chars` characters centred on the first query
/// term found, marking cut ends with `…`, then highlight query terms.
pub fn make_snippet(content: &str, query: &str, max_chars: usize) -> String {
    let text = normalize_ws(content);
    let chars: Vec<char> = text.chars().collect();
    if chars.len() <= max_chars {
        return bold_keywords(&text, query);
    }

    let lower = text.to_lowercase();
    let hit = query_terms(query)
        .into_iter()
        .find_map(|t| lower.find(&t.to_lowercase()));

    let Some(byte_idx) = hit else {
        let head: String = chars[..max_chars].iter().collect();
        return bold_keywords(&format!("{head}\u{2026}"), query);
    };

    // Lowercasing can shift byte offsets for non-ASCII text; map through the
    // lowered string's own char count.
    let idx = lower[..byte_idx].chars().count().min(chars.len());
    let start = idx.saturating_sub(max_chars / 2);
    let end = (start + max_chars).min(chars.len());

    let prefix = if start > 0 { "\u{2026}" } else { "" };
    let suffix = if end < chars.len() { "\u{2026}" } else { "" };
    let window: String = chars[start..end].iter().collect();

    bold_keywords(&format!("{prefix}{window}{suffix}"), query)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_collapses_runs() {
        assert_eq!(normalize_ws("  a \n\t b  "), "a b");
    }

    #[test]
    fn bolds_terms_case_insensitively() {
        assert_eq!(
            bold_keywords("Good Sleep habits help sleep", "sleep"),
            "Good **Sleep** habits help **sleep**"
        );
    }

    #[test]
    fn short_terms_not_bolded() {
        assert_eq!(bold_keywords("an ox", "an ox"), "an ox");
    }

    #[test]
    fn short_content_kept_whole() {
        let s = make_snippet("Avoid caffeine late.", "caffeine", SNIPPET_MAX_CHARS);
        assert_eq!(s, "Avoid **caffeine** late.");
    }

    #[test]
    fn long_content_windowed_around_term() {
        let content = format!("{} anxiety {}", "x".repeat(600), "y".repeat(600));
        let s = make_snippet(&content, "anxiety", 100);
        assert!(s.starts_with('\u{2026}'));
        assert!(s.ends_with('\u{2026}'));
        assert!(s.contains("**anxiety**"));
        // window + two ellipses + four bold asterisks
        assert_eq!(s.chars().count(), 100 + 2 + 4);
    }

    #[test]
    fn long_content_without_term_takes_head() {
        let content = "z".repeat(700);
        let s = make_snippet(&content, "sleep", 480);
        assert_eq!(s.chars().count(), 481);
        assert!(s.ends_with('\u{2026}'));
    }
}
