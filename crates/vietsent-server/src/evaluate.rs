//! Offline accuracy check against a fixed Vietnamese evaluation set
//!
//! Runs the analyzer only; nothing is written to history.

use serde::Serialize;
use std::fmt;
use vietsent_classifiers::SentimentAnalyzer;
use vietsent_core::Sentiment;

/// Minimum accuracy for a passing run
pub const PASS_THRESHOLD: f64 = 0.65;

pub const EVALUATION_CASES: &[(&str, Sentiment)] = &[
    ("Hôm nay tôi rất vui", Sentiment::Positive),
    ("Món ăn này dở quá", Sentiment::Negative),
    ("Cũng bình thường thôi", Sentiment::Neutral),
    ("Dịch vụ okela, nhân viên dễ thương", Sentiment::Positive),
    ("Chán chẳng muốn nói", Sentiment::Negative),
    ("Tạm ổn, không có gì đặc biệt", Sentiment::Neutral),
    ("Trải nghiệm thật tuyệt vời", Sentiment::Positive),
    ("Ứng dụng chạy chậm kinh khủng", Sentiment::Negative),
    ("Khá được, nhưng cần cải thiện", Sentiment::Neutral),
    ("Tôi cực kỳ hài lòng", Sentiment::Positive),
];

#[derive(Debug, Clone, Serialize)]
pub struct CaseOutcome {
    pub text: String,
    pub expected: Sentiment,
    pub predicted: Sentiment,
    pub confidence: f64,
}

impl CaseOutcome {
    pub fn is_correct(&self) -> bool {
        self.expected == self.predicted
    }
}

impl fmt::Display for CaseOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} => {} ({:.2}) | expected {}",
            self.text, self.predicted, self.confidence, self.expected
        )
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct EvaluationReport {
    pub outcomes: Vec<CaseOutcome>,
}

impl EvaluationReport {
    pub fn total(&self) -> usize {
        self.outcomes.len()
    }

    pub fn correct(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_correct()).count()
    }

    /// Fraction of correct cases, 0.0 for an empty report
    pub fn accuracy(&self) -> f64 {
        if self.outcomes.is_empty() {
            return 0.0;
        }
        self.correct() as f64 / self.total() as f64
    }

    pub fn passed(&self) -> bool {
        self.accuracy() >= PASS_THRESHOLD
    }

    /// Summary line, e.g. `Accuracy: 70.0% (7/10) => PASS`
    pub fn summary(&self) -> String {
        format!(
            "Accuracy: {:.1}% ({}/{}) => {}",
            self.accuracy() * 100.0,
            self.correct(),
            self.total(),
            if self.passed() { "PASS" } else { "FAIL" }
        )
    }
}

/// Classify every evaluation case
pub async fn run_evaluation(analyzer: &SentimentAnalyzer) -> EvaluationReport {
    run_cases(analyzer, EVALUATION_CASES).await
}

pub async fn run_cases(
    analyzer: &SentimentAnalyzer,
    cases: &[(&str, Sentiment)],
) -> EvaluationReport {
    let mut outcomes = Vec::with_capacity(cases.len());
    for &(text, expected) in cases {
        let analysis = analyzer.analyze(text).await;
        outcomes.push(CaseOutcome {
            text: text.to_string(),
            expected,
            predicted: analysis.result.sentiment(),
            confidence: analysis.result.confidence(),
        });
    }
    EvaluationReport { outcomes }
}
