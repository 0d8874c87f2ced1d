//! Vietnamese text normalization
//!
//! Two independent paths:
//! - [`normalize_text`]: cleanup, case folding and teencode expansion. Its
//!   output is what the model sees and what the lexical scorer reads.
//! - [`strip_accents`]: pure accent folding used only for lexicon lookups,
//!   memoized process-wide.

use once_cell::sync::Lazy;
use parking_lot::Mutex;
use std::collections::HashMap;
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// Ordered teencode/abbreviation expansions.
///
/// Replacement is substring-based and applied top to bottom, so a later
/// entry sees the output of earlier ones. Short needles also match inside
/// longer words ("phong" becomes "pkhông"); that loss is accepted as-is.
pub const TEENCODE_REPLACEMENTS: &[(&str, &str)] = &[
    ("hok biet", "không biết"),
    ("hok", "không"),
    ("hong", "không"),
    ("ko", "không"),
    ("hem", "không"),
    ("kg", "không"),
    ("biet", "biết"),
    ("bít", "biết"),
    ("đc", "được"),
    ("dc", "được"),
    ("okela", "ổn"),
    ("oge", "ổn"),
    ("zui", "vui"),
    ("qa", "quá"),
    ("wa", "quá"),
    ("wá", "quá"),
    ("dep", "đẹp"),
];

/// Zero-width characters and the byte-order mark
const INVISIBLE_CHARS: &[char] = &['\u{200b}', '\u{200c}', '\u{200d}', '\u{2060}', '\u{feff}'];

const ACCENT_CACHE_CAPACITY: usize = 2048;

/// Longer inputs are folded without being cached
const ACCENT_CACHE_MAX_KEY_BYTES: usize = 1024;

static ACCENT_CACHE: Lazy<Mutex<HashMap<String, String>>> =
    Lazy::new(|| Mutex::new(HashMap::with_capacity(ACCENT_CACHE_CAPACITY)));

/// Normalize raw user input before inference and lexical scoring.
///
/// Returns an empty string only when the input is empty or made entirely of
/// whitespace and zero-width characters.
pub fn normalize_text(raw: &str) -> String {
    let visible: String = raw.chars().filter(|c| !INVISIBLE_CHARS.contains(c)).collect();
    let collapsed = visible.split_whitespace().collect::<Vec<_>>().join(" ");

    // NFC first so decomposed input still matches the table entries
    let mut text = collapsed.nfc().collect::<String>().to_lowercase();
    for (needle, replacement) in TEENCODE_REPLACEMENTS {
        if text.contains(needle) {
            text = text.replace(needle, replacement);
        }
    }
    text
}

/// Lower-case and remove diacritics for lexicon lookups.
///
/// No word substitution happens here. `đ` has no canonical decomposition and
/// is folded to `d` explicitly.
pub fn strip_accents(text: &str) -> String {
    if text.len() > ACCENT_CACHE_MAX_KEY_BYTES {
        return fold_accents(text);
    }

    if let Some(hit) = ACCENT_CACHE.lock().get(text) {
        return hit.clone();
    }

    let folded = fold_accents(text);

    let mut cache = ACCENT_CACHE.lock();
    if cache.len() >= ACCENT_CACHE_CAPACITY {
        cache.clear();
    }
    cache.insert(text.to_string(), folded.clone());
    folded
}

fn fold_accents(text: &str) -> String {
    text.to_lowercase()
        .nfd()
        .filter(|c| !is_combining_mark(*c))
        .map(|c| match c {
            'đ' => 'd',
            other => other,
        })
        .collect()
}
