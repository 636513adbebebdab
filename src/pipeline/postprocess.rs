//! Post-processing: deterministic cleanup of raw OCR engine output.
//!
//! Engines hand back text with platform quirks that are not content:
//! Tesseract terminates every page with a form feed (`\x0c`), some builds
//! emit `\r\n`, and recognisers occasionally produce zero-width characters
//! or trailing spaces at line ends. These rules strip that noise without
//! touching the recognised words, so the two engines' results can be
//! compared line by line.
//!
//! ## Rule Order
//!
//! Line endings are normalised before per-line trimming, and trailing empty
//! lines are removed last so they are counted after the other rules have
//! blanked whitespace-only lines.

use once_cell::sync::Lazy;
use regex::Regex;

/// Apply all cleanup rules to a block of engine output.
///
/// Rules (applied in order):
/// 1. Normalise line endings (CRLF / CR → LF)
/// 2. Remove form feeds (Tesseract page terminators)
/// 3. Strip invisible Unicode (zero-width spaces, BOM, soft hyphens)
/// 4. Trim trailing whitespace per line
/// 5. Drop trailing empty lines
pub fn clean_text(input: &str) -> String {
    let s = normalise_line_endings(input);
    let s = remove_form_feeds(&s);
    let s = remove_invisible_chars(&s);
    let s = trim_trailing_whitespace(&s);
    drop_trailing_empty_lines(&s)
}

/// Clean a raw text block and split it into line fragments.
///
/// An empty or whitespace-only block yields no fragments.
pub fn split_fragments(raw: &str) -> Vec<String> {
    let cleaned = clean_text(raw);
    if cleaned.is_empty() {
        return Vec::new();
    }
    cleaned.lines().map(str::to_string).collect()
}

/// Clean fragments that an engine already returned line by line.
///
/// Fragments that become empty are dropped: an engine's "line" with no
/// visible characters is a detection artefact, not content.
pub fn clean_fragments<I>(fragments: I) -> Vec<String>
where
    I: IntoIterator<Item = String>,
{
    fragments
        .into_iter()
        .map(|f| clean_text(&f))
        .filter(|f| !f.is_empty())
        .collect()
}

// ── Rule 1: Normalise line endings ───────────────────────────────────────────

fn normalise_line_endings(input: &str) -> String {
    input.replace("\r\n", "\n").replace('\r', "\n")
}

// ── Rule 2: Remove form feeds ────────────────────────────────────────────────

fn remove_form_feeds(input: &str) -> String {
    input.replace('\x0c', "")
}

// ── Rule 3: Strip invisible Unicode ──────────────────────────────────────────

fn remove_invisible_chars(input: &str) -> String {
    input
        .chars()
        .filter(|c| !matches!(c, '\u{200B}' | '\u{200C}' | '\u{200D}' | '\u{2060}' | '\u{FEFF}' | '\u{00AD}'))
        .collect()
}

// ── Rule 4: Trim trailing whitespace per line ────────────────────────────────

static RE_TRAILING_WS: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?m)[ \t]+$").unwrap());

fn trim_trailing_whitespace(input: &str) -> String {
    RE_TRAILING_WS.replace_all(input, "").into_owned()
}

// ── Rule 5: Drop trailing empty lines ────────────────────────────────────────

fn drop_trailing_empty_lines(input: &str) -> String {
    input.trim_end_matches('\n').to_string()
}
