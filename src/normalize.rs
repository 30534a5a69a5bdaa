use unicode_normalization::UnicodeNormalization;

/// Canonical comparable form of a player or team name.
///
/// Lower-cases, decomposes accented characters and drops their marks, turns
/// everything outside `a-z` into a separator, collapses separators into a
/// single space and trims both ends. The same function runs over catalogue
/// rows and query names, so two names are the same identity exactly when
/// their normalized strings are equal. Empty output never matches anything.
pub fn normalize_name(input: &str) -> String {
    let lower = input.to_lowercase();
    let mut out = String::with_capacity(lower.len());
    let mut pending_space = false;
    for ch in lower.nfd() {
        // Combining marks and anything else outside ASCII vanish without
        // splitting the word they belonged to.
        if !ch.is_ascii() {
            continue;
        }
        if ch.is_ascii_lowercase() {
            if pending_space && !out.is_empty() {
                out.push(' ');
            }
            pending_space = false;
            out.push(ch);
        } else {
            pending_space = true;
        }
    }
    out
}

/// Whitespace-delimited tokens of an already normalized name.
pub fn tokens(normalized: &str) -> impl Iterator<Item = &str> {
    normalized.split_whitespace()
}
