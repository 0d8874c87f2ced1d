//! Fixed Vietnamese sentiment lexicon and the lexical scorer
//!
//! Terms are stored accent-folded. Compound entries such as `tuyetvoi` cover
//! the run-together spellings users type without spaces.

use crate::text::strip_accents;
use once_cell::sync::Lazy;
use std::collections::HashSet;

/// Accent-folded positive terms
pub const POSITIVE_TERMS: &[&str] = &[
    "vui", "vuiqua", "tuyet", "tuyetvoi", "tot", "rattot", "hao", "hungthu", "khen", "ngon",
    "thich", "yeu", "hailong", "cuctot", "on", "onap", "dep",
];

/// Accent-folded negative terms
pub const NEGATIVE_TERMS: &[&str] = &[
    "ghet", "te", "tequa", "tethat", "toite", "buon", "chan", "chanqua", "tuc", "gian",
    "thatvong", "khochiu", "kinhkhung", "xau", "xauxi", "do", "dote", "tehai",
];

static BUILTIN: Lazy<Lexicon> = Lazy::new(|| Lexicon::new(POSITIVE_TERMS, NEGATIVE_TERMS));

/// Read-only pair of disjoint term sets
#[derive(Debug, Clone)]
pub struct Lexicon {
    positive: HashSet<&'static str>,
    negative: HashSet<&'static str>,
}

impl Lexicon {
    /// Build a lexicon from term lists. A term listed on both sides counts
    /// as positive only.
    pub fn new(positive: &[&'static str], negative: &[&'static str]) -> Self {
        let positive: HashSet<&'static str> = positive.iter().copied().collect();
        let negative = negative
            .iter()
            .copied()
            .filter(|term| !positive.contains(term))
            .collect();
        Self { positive, negative }
    }

    /// The process-wide built-in lexicon
    pub fn builtin() -> &'static Lexicon {
        &BUILTIN
    }

    pub fn is_positive(&self, token: &str) -> bool {
        self.positive.contains(token)
    }

    pub fn is_negative(&self, token: &str) -> bool {
        self.negative.contains(token)
    }

    /// Signed lexical score in [-1, 1].
    ///
    /// Each whitespace token of the accent-folded text contributes +1, -1 or
    /// 0; the sum is divided by the token count. Empty input scores 0.
    pub fn score(&self, normalized_text: &str) -> f64 {
        let folded = strip_accents(normalized_text);
        let mut tokens = 0usize;
        let mut total = 0i64;

        for token in folded.split_whitespace() {
            tokens += 1;
            if self.is_positive(token) {
                total += 1;
            } else if self.is_negative(token) {
                total -= 1;
            }
        }

        if tokens == 0 {
            return 0.0;
        }
        total as f64 / tokens as f64
    }
}

/// Score text against the built-in lexicon
pub fn lexical_score(normalized_text: &str) -> f64 {
    Lexicon::builtin().score(normalized_text)
}
