/// Strip characters that can hide text from the crisis gate or the topic
/// extractor: zero-width and directional formatting marks, then control
/// characters other than newline and tab.
pub fn sanitize_query(raw_query: &str) -> String {
    let visible = remove_invisible_unicode(raw_query);
    let sanitized = remove_control_characters(&visible);

    if sanitized.len() != raw_query.len() {
        tracing::debug!(
            removed_bytes = raw_query.len() - sanitized.len(),
            "Query sanitized"
        );
    }

    sanitized
}

/// Remove zero-width and invisible Unicode characters.
fn remove_invisible_unicode(text: &str) -> String {
    text.chars()
        .filter(|c| {
            !matches!(
                *c,
                '\u{200B}'..='\u{200F}'  // Zero-width chars
                | '\u{202A}'..='\u{202E}' // Directional formatting
                | '\u{2060}'..='\u{2064}' // Invisible operators
                | '\u{2066}'..='\u{2069}' // Directional isolates
                | '\u{FEFF}'              // BOM
                | '\u{00AD}'              // Soft hyphen
                | '\u{034F}'              // Combining grapheme joiner
                | '\u{061C}'              // Arabic letter mark
                | '\u{180E}'              // Mongolian vowel separator
            )
        })
        .collect()
}

/// Remove control characters except newline and tab.
fn remove_control_characters(text: &str) -> String {
    text.chars()
        .filter(|c| !c.is_control() || *c == '\n' || *c == '\t')
        .collect()
}
