use crate::SentimentScore;

/// Trait for headline polarity scorers.
///
/// Implementations must be deterministic: the same text always yields the
/// same score, which is what lets cached scores stand in for a rescore.
pub trait TextScorer {
    fn score(&self, text: &str) -> SentimentScore;
}
