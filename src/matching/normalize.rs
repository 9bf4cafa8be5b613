// src/matching/normalize.rs
use once_cell::sync::Lazy;
use regex::Regex;

static NON_WORD_CHARS: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^\w\s]").unwrap());
static NON_WORD_RUNS: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^\w]+").unwrap());

/// Canonical comparison form of a free-text name: lowercase, punctuation
/// removed, whitespace collapsed to single spaces, trimmed.
pub fn normalize(text: &str) -> String {
    let lowered = text.to_lowercase();
    let stripped = NON_WORD_CHARS.replace_all(&lowered, "");
    stripped.split_whitespace().collect::<Vec<_>>().join(" ")
}

pub fn tokens(text: &str) -> Vec<String> {
    normalize(text)
        .split_whitespace()
        .map(str::to_string)
        .collect()
}

/// Identifier-safe form of a name, used for generated entity ids.
pub fn slugify(text: &str) -> String {
    let normalized = normalize(text);
    NON_WORD_RUNS.replace_all(&normalized, "_").into_owned()
}
