//! Keyword-based sentiment model
//!
//! Used when no transformer weights are configured. Matches accent-folded
//! keywords with Aho-Corasick, so "tuyệt vời" and "tuyet voi" hit the same
//! pattern.

use crate::classifier::{RawPrediction, SentimentModel};
use crate::text::strip_accents;
use aho_corasick::{AhoCorasick, MatchKind};
use async_trait::async_trait;
use std::time::Instant;
use vietsent_core::{Error, Result};

const POSITIVE_KEYWORDS: &[&str] = &[
    "vui",
    "tuyet voi",
    "tuyet",
    "tot",
    "hai long",
    "thich",
    "yeu",
    "ngon",
    "dep",
    "de thuong",
    "hanh phuc",
    "xuat sac",
    "on ap",
];

const NEGATIVE_KEYWORDS: &[&str] = &[
    "buon",
    "do",
    "te",
    "chan",
    "ghet",
    "that vong",
    "kinh khung",
    "kho chiu",
    "tuc",
    "gian",
    "xau",
    "cham",
    "toi te",
];

pub struct LexiconModel {
    name: String,
    positive: AhoCorasick,
    negative: AhoCorasick,
}

impl LexiconModel {
    pub fn new() -> Result<Self> {
        Self::with_name("builtin-lexicon")
    }

    pub fn with_name(name: impl Into<String>) -> Result<Self> {
        let positive = build_matcher(POSITIVE_KEYWORDS).map_err(|e| {
            Error::classifier_unavailable(format!("Failed to build positive matcher: {e}"))
        })?;
        let negative = build_matcher(NEGATIVE_KEYWORDS).map_err(|e| {
            Error::classifier_unavailable(format!("Failed to build negative matcher: {e}"))
        })?;

        Ok(Self {
            name: name.into(),
            positive,
            negative,
        })
    }
}

fn build_matcher(keywords: &[&str]) -> std::result::Result<AhoCorasick, aho_corasick::BuildError> {
    AhoCorasick::builder()
        .ascii_case_insensitive(true)
        .match_kind(MatchKind::LeftmostLongest)
        .build(keywords)
}

/// Count matches that start and end on word boundaries
fn count_words(matcher: &AhoCorasick, haystack: &str) -> usize {
    let bytes = haystack.as_bytes();
    matcher
        .find_iter(haystack)
        .filter(|m| {
            let starts = m.start() == 0 || !bytes[m.start() - 1].is_ascii_alphanumeric();
            let ends = m.end() == bytes.len() || !bytes[m.end()].is_ascii_alphanumeric();
            starts && ends
        })
        .count()
}

#[async_trait]
impl SentimentModel for LexiconModel {
    async fn predict(&self, text: &str) -> Result<RawPrediction> {
        let start = Instant::now();
        let folded = strip_accents(text);

        let positive_hits = count_words(&self.positive, &folded) as f32;
        let negative_hits = count_words(&self.negative, &folded) as f32;
        let total = positive_hits + negative_hits;

        let (label, score) = if total == 0.0 {
            ("neutral", 0.6)
        } else if positive_hits == negative_hits {
            ("neutral", 0.5)
        } else {
            let margin = (positive_hits - negative_hits).abs() / total;
            let label = if positive_hits > negative_hits {
                "positive"
            } else {
                "negative"
            };
            (label, (0.6 + 0.35 * margin).min(0.95))
        };

        let positive_share = if total == 0.0 { 0.5 } else { positive_hits / total };

        Ok(RawPrediction {
            label: label.to_string(),
            score,
            all_scores: vec![
                ("negative".to_string(), 1.0 - positive_share),
                ("positive".to_string(), positive_share),
            ],
            latency_us: start.elapsed().as_micros() as u64,
        })
    }

    fn name(&self) -> &str {
        &self.name
    }
}
