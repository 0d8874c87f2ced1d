//! Mapping of raw classifier labels onto the canonical three-way set

use vietsent_core::Sentiment;

/// Known raw label vocabularies, keyed lower-case.
///
/// Covers plain English names, `pos`/`neg`/`neu` abbreviations, the
/// positional `LABEL_n` scheme, star ratings and Vietnamese names.
const LABEL_ALIASES: &[(&str, Sentiment)] = &[
    ("positive", Sentiment::Positive),
    ("positive sentiment", Sentiment::Positive),
    ("pos", Sentiment::Positive),
    ("negative", Sentiment::Negative),
    ("negative sentiment", Sentiment::Negative),
    ("neg", Sentiment::Negative),
    ("neutral", Sentiment::Neutral),
    ("neutral sentiment", Sentiment::Neutral),
    ("neu", Sentiment::Neutral),
    ("label_0", Sentiment::Negative),
    ("label_1", Sentiment::Positive),
    ("label_2", Sentiment::Neutral),
    ("1 star", Sentiment::Negative),
    ("2 stars", Sentiment::Negative),
    ("3 stars", Sentiment::Neutral),
    ("4 stars", Sentiment::Positive),
    ("5 stars", Sentiment::Positive),
    ("tích cực", Sentiment::Positive),
    ("tiêu cực", Sentiment::Negative),
    ("trung lập", Sentiment::Neutral),
];

/// Look up a raw label without any fallback
pub fn lookup_label(raw_label: &str) -> Option<Sentiment> {
    let key = raw_label.trim().to_lowercase();
    LABEL_ALIASES
        .iter()
        .find(|(alias, _)| *alias == key)
        .map(|(_, sentiment)| *sentiment)
}

/// Map a raw classifier label to a canonical sentiment.
///
/// Unknown labels fall back to `Neutral` and are reported as a gap in the
/// alias table instead of failing the request.
pub fn map_label(raw_label: &str) -> Sentiment {
    match lookup_label(raw_label) {
        Some(sentiment) => sentiment,
        None => {
            tracing::warn!(
                target: "vietsent::calibration",
                label = raw_label,
                "unknown classifier label, falling back to NEUTRAL"
            );
            metrics::counter!("vietsent_unknown_labels_total").increment(1);
            Sentiment::Neutral
        }
    }
}
