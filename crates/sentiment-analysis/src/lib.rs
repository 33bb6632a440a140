use analysis_core::{SentimentScore, TextScorer};
use vader_sentiment::SentimentIntensityAnalyzer;

pub mod daily;
pub use daily::{aggregate_daily, HeadlineSet};

/// Headline scorer backed by the VADER lexicon.
///
/// The lexicon is immutable once built, so one scorer can serve any number
/// of headline sets.
pub struct SentimentScorer {
    analyzer: SentimentIntensityAnalyzer<'static>,
}

impl SentimentScorer {
    /// Build the scorer. This is the explicit initialization step for the
    /// lexicon; nothing is loaded until it is called.
    pub fn new() -> Self {
        tracing::debug!("initialising VADER lexicon");
        Self {
            analyzer: SentimentIntensityAnalyzer::new(),
        }
    }

    /// Score every unscored headline in `headlines` (a no-op if they are
    /// already cached), then average the scores per day for `ticker`.
    pub fn aggregate(
        &self,
        headlines: &mut HeadlineSet,
        ticker: &str,
    ) -> analysis_core::AnalysisResult<analysis_core::DailySentimentTable> {
        aggregate_daily(headlines, self, ticker)
    }
}

impl TextScorer for SentimentScorer {
    fn score(&self, text: &str) -> SentimentScore {
        let scores = self.analyzer.polarity_scores(text);
        let field = |name: &str| scores.get(name).copied().unwrap_or(0.0);
        SentimentScore::new(field("neg"), field("neu"), field("pos"), field("compound"))
    }
}

impl Default for SentimentScorer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_positive_headline() {
        let scorer = SentimentScorer::new();
        let score = scorer.score("Apple posts great results, investors are happy");

        assert!(score.compound > 0.0);
        assert!(score.positive > score.negative);
    }

    #[test]
    fn test_negative_headline() {
        let scorer = SentimentScorer::new();
        let score = scorer.score("Terrible quarter as lawsuit fears hurt the stock");

        assert!(score.compound < 0.0);
        assert!(score.negative > score.positive);
    }

    #[test]
    fn test_score_ranges() {
        let scorer = SentimentScorer::new();
        for text in [
            "Stocks That Hit 52-Week Highs On Friday",
            "Company announces dividend",
            "Shares crash after awful guidance",
            "",
        ] {
            let score = scorer.score(text);
            assert!((-1.0..=1.0).contains(&score.compound), "{}", text);
            for part in [score.negative, score.neutral, score.positive] {
                assert!((0.0..=1.0).contains(&part), "{}", text);
            }
        }
    }

    #[test]
    fn test_scoring_is_deterministic() {
        let scorer = SentimentScorer::new();
        let text = "Analysts upgrade the shares, citing strong growth";
        assert_eq!(scorer.score(text), scorer.score(text));
    }
}
