use std::sync::LazyLock;

use regex::Regex;
use unicode_normalization::UnicodeNormalization;

/// Name used when nothing survives normalization
pub const FALLBACK_FILENAME: &str = "upload";

static WHITESPACE_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("valid whitespace regex"));
static DISALLOWED_CHARS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^a-zA-Z0-9.-]").expect("valid character class regex"));
static HYPHEN_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"-+").expect("valid hyphen regex"));

/// Normalizes a user-supplied filename into a safe object key segment
///
/// The result only contains `[a-z0-9.-]`, never starts or ends with a
/// hyphen, and normalizing it again yields the same string.
#[must_use]
pub fn normalize_filename(filename: &str) -> String {
    let decomposed: String = filename.nfkd().collect();
    let hyphenated = WHITESPACE_RUN.replace_all(&decomposed, "-");
    let stripped = DISALLOWED_CHARS.replace_all(&hyphenated, "");
    let collapsed = HYPHEN_RUN.replace_all(&stripped, "-");
    let normalized = collapsed.trim_matches('-').to_lowercase();

    if normalized.is_empty() {
        FALLBACK_FILENAME.to_string()
    } else {
        normalized
    }
}
