use std::collections::HashSet;

/// Words kept in a topic label.
pub const TOPIC_MAX_WORDS: usize = 8;

/// Collapse whitespace runs to single spaces and trim the ends.
pub fn normalize_query(query: &str) -> String {
    query.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// First eight whitespace-delimited words of the query, single-space joined.
/// Empty or whitespace-only input yields the empty string.
pub fn extract_topic(query: &str) -> String {
    query
        .split_whitespace()
        .take(TOPIC_MAX_WORDS)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Drop repeated entries, keeping the first occurrence of each.
pub fn dedupe_preserve_order(items: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::with_capacity(items.len());
    items
        .into_iter()
        .filter(|item| seen.insert(item.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn normalize_collapses_and_trims() {
        assert_eq!(normalize_query("  what \t is\n sleep  "), "what is sleep");
    }

    #[test]
    fn eight_words_kept_whole() {
        let q = "one two three four five six seven eight";
        assert_eq!(extract_topic(q), q);
    }

    #[test]
    fn twenty_words_cut_to_eight() {
        let words: Vec<String> = (1..=20).map(|i| format!("w{i}")).collect();
        let topic = extract_topic(&words.join(" "));
        assert_eq!(topic, "w1 w2 w3 w4 w5 w6 w7 w8");
    }

    #[test]
    fn whitespace_only_is_empty() {
        assert_eq!(extract_topic("   "), "");
        assert_eq!(extract_topic(""), "");
    }

    #[test]
    fn irregular_spacing_normalized_in_topic() {
        assert_eq!(extract_topic("  What   is\tsleep\nhygiene? "), "What is sleep hygiene?");
    }

    #[test]
    fn dedupe_keeps_first_occurrence() {
        let out = dedupe_preserve_order(strings(&["b", "a", "b", "c", "a"]));
        assert_eq!(out, strings(&["b", "a", "c"]));
    }

    #[test]
    fn dedupe_is_idempotent() {
        let input = strings(&["x", "y", "x", "z", "y", "x"]);
        let once = dedupe_preserve_order(input);
        let twice = dedupe_preserve_order(once.clone());
        assert_eq!(once, twice);
    }

    #[test]
    fn dedupe_empty() {
        assert!(dedupe_preserve_order(Vec::new()).is_empty());
    }
}
