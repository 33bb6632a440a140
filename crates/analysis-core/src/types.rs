use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Column names of the four sentiment fields, in [`SentimentScore::as_array`] order.
pub const SENTIMENT_COLUMNS: [&str; 4] = ["neg", "neu", "pos", "compound"];

/// A single ticker-tagged headline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewsEvent {
    pub date: NaiveDate,
    pub ticker: String,
    pub headline: String,
}

impl NewsEvent {
    pub fn new(date: NaiveDate, ticker: impl Into<String>, headline: impl Into<String>) -> Self {
        Self {
            date,
            ticker: ticker.into(),
            headline: headline.into(),
        }
    }
}

/// Polarity scores for one piece of text.
///
/// `compound` is normalized to [-1, 1]; the three proportions sum to ~1.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SentimentScore {
    pub negative: f64,
    pub neutral: f64,
    pub positive: f64,
    pub compound: f64,
}

impl SentimentScore {
    pub fn new(negative: f64, neutral: f64, positive: f64, compound: f64) -> Self {
        Self {
            negative,
            neutral,
            positive,
            compound,
        }
    }

    pub fn as_array(&self) -> [f64; 4] {
        [self.negative, self.neutral, self.positive, self.compound]
    }
}

/// Pearson correlation plus the number of rows that survived NaN-dropping
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CorrelationResult {
    pub coefficient: f64,
    pub observations: usize,
}
