//! Daily aggregation of headline sentiment.
//!
//! Headlines arrive irregularly; a trading day with no headline for the
//! ticker simply has no row. Consumers must not assume daily continuity.

use std::collections::BTreeMap;

use analysis_core::{
    AnalysisError, AnalysisResult, Column, DailySentimentTable, NewsEvent, SentimentScore,
    TextScorer, TimeSeriesTable, NEWS_DATE_COLUMN, SENTIMENT_COLUMNS,
};
use chrono::NaiveDate;

/// Headlines plus their (lazily computed) scores.
///
/// Scores are computed at most once; later aggregations reuse them, so
/// repeated calls see bit-identical inputs.
#[derive(Debug, Clone, PartialEq)]
pub struct HeadlineSet {
    events: Vec<NewsEvent>,
    scores: Option<Vec<SentimentScore>>,
}

impl HeadlineSet {
    pub fn new(events: Vec<NewsEvent>) -> Self {
        Self {
            events,
            scores: None,
        }
    }

    /// Headlines whose scores were computed elsewhere (e.g. loaded with the data).
    pub fn with_scores(events: Vec<NewsEvent>, scores: Vec<SentimentScore>) -> AnalysisResult<Self> {
        if events.len() != scores.len() {
            return Err(AnalysisError::InvalidData(format!(
                "{} headlines but {} cached sentiment scores",
                events.len(),
                scores.len()
            )));
        }
        Ok(Self {
            events,
            scores: Some(scores),
        })
    }

    pub fn events(&self) -> &[NewsEvent] {
        &self.events
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn is_scored(&self) -> bool {
        self.scores.is_some()
    }

    /// Cached scores, one per event, if computed or supplied
    pub fn scores(&self) -> Option<&[SentimentScore]> {
        self.scores.as_deref()
    }

    /// Headline texts, in event order
    pub fn headlines(&self) -> impl Iterator<Item = &str> {
        self.events.iter().map(|e| e.headline.as_str())
    }

    /// Score every headline unless a cached score set already exists.
    /// Returns the events alongside their scores.
    pub fn ensure_scored(&mut self, scorer: &dyn TextScorer) -> (&[NewsEvent], &[SentimentScore]) {
        let events = &self.events;
        let scores = self.scores.get_or_insert_with(|| {
            tracing::info!("scoring {} headlines", events.len());
            events.iter().map(|e| scorer.score(&e.headline)).collect()
        });
        (events, scores)
    }
}

#[derive(Default)]
struct DayAccumulator {
    sums: [f64; 4],
    count: usize,
}

/// Mean sentiment per calendar day for one ticker (matched case-insensitively).
///
/// Produces a `date`-keyed table with `neg, neu, pos, compound` columns.
pub fn aggregate_daily(
    headlines: &mut HeadlineSet,
    scorer: &dyn TextScorer,
    ticker: &str,
) -> AnalysisResult<DailySentimentTable> {
    let ticker = ticker.trim();
    if ticker.is_empty() {
        return Err(AnalysisError::InvalidParameter(
            "ticker must not be empty".to_string(),
        ));
    }

    let (events, scores) = headlines.ensure_scored(scorer);
    let mut days: BTreeMap<NaiveDate, DayAccumulator> = BTreeMap::new();
    for (event, score) in events.iter().zip(scores) {
        if !event.ticker.trim().eq_ignore_ascii_case(ticker) {
            continue;
        }
        let day = days.entry(event.date).or_default();
        for (sum, value) in day.sums.iter_mut().zip(score.as_array()) {
            *sum += value;
        }
        day.count += 1;
    }

    if days.is_empty() {
        tracing::warn!("no headlines found for ticker {}", ticker.to_uppercase());
    }

    let dates: Vec<NaiveDate> = days.keys().copied().collect();
    let columns = SENTIMENT_COLUMNS
        .iter()
        .enumerate()
        .map(|(field, name)| {
            Column::new(
                *name,
                days.values()
                    .map(|day| day.sums[field] / day.count as f64)
                    .collect(),
            )
        })
        .collect();

    tracing::debug!(
        "aggregated {} headlines into {} days for {}",
        days.values().map(|d| d.count).sum::<usize>(),
        dates.len(),
        ticker.to_uppercase()
    );

    TimeSeriesTable::from_columns(NEWS_DATE_COLUMN, dates, columns)
}
