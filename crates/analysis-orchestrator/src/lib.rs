//! End-to-end headline sentiment analysis for one ticker.
//!
//! prices -> indicators -> (headlines -> daily sentiment) -> aligned rows
//! -> correlation, with an optional topic model over every headline.

use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::Read;
use std::path::{Path, PathBuf};

use analysis_core::{
    AnalysisError, AnalysisResult, CorrelationResult, TextScorer, TimeSeriesTable,
};
use anyhow::{Context, Result};
use data_loader::{write_table_path, SeriesLoader};
use quant_analysis::{align, correlate};
use sentiment_analysis::{aggregate_daily, HeadlineSet, SentimentScorer};
use serde::Serialize;
use technical_analysis::{IndicatorEngine, MacdParams, DAILY_RETURN_COLUMN};
use topic_modeling::{init_stopwords, TopicModeler, TopicTerms};

pub mod config;
pub use config::{PipelineConfig, ReturnBasis, USAGE};

/// Sentiment field correlated against returns
pub const SENTIMENT_FIELD: &str = "compound";

/// Summary of one pipeline run, printed as JSON by the binary.
#[derive(Debug, Clone, Serialize)]
pub struct PipelineReport {
    pub ticker: String,
    pub price_rows: usize,
    pub headline_count: usize,
    pub sentiment_days: usize,
    pub aligned_rows: usize,
    pub return_basis: ReturnBasis,
    /// Absent when there were too few aligned rows or no variance
    pub correlation: Option<CorrelationResult>,
    /// Indicator values on the last price row; undefined values omitted
    pub latest_indicators: BTreeMap<String, f64>,
    /// Absent when skipped or when no term survived pruning
    pub topics: Option<Vec<TopicTerms>>,
    pub outputs: Vec<PathBuf>,
}

/// Tables produced along the way
#[derive(Debug, Clone)]
pub struct PipelineTables {
    pub indicators: TimeSeriesTable,
    pub daily_sentiment: TimeSeriesTable,
    pub aligned: TimeSeriesTable,
}

pub struct SentimentPipeline {
    config: PipelineConfig,
    scorer: Box<dyn TextScorer>,
}

impl SentimentPipeline {
    /// Pipeline scoring headlines with the VADER lexicon
    pub fn new(config: PipelineConfig) -> Self {
        Self::with_scorer(config, Box::new(SentimentScorer::new()))
    }

    pub fn with_scorer(config: PipelineConfig, scorer: Box<dyn TextScorer>) -> Self {
        Self { config, scorer }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Run against the configured CSV files.
    pub fn run(&self) -> Result<PipelineReport> {
        let prices = open(&self.config.price_csv)?;
        let headlines = open(&self.config.headlines_csv)?;
        let (report, _) = self.run_on(
            prices,
            &self.config.price_csv.display().to_string(),
            headlines,
            &self.config.headlines_csv.display().to_string(),
        )?;
        Ok(report)
    }

    /// Run against any pair of CSV sources.
    pub fn run_on<P: Read, H: Read>(
        &self,
        prices: P,
        price_origin: &str,
        headlines: H,
        headline_origin: &str,
    ) -> Result<(PipelineReport, PipelineTables)> {
        let ticker = self.config.ticker.as_str();
        tracing::info!("running sentiment pipeline for {}", ticker);

        let prices = SeriesLoader::load_prices(prices, price_origin)
            .with_context(|| format!("loading prices for {} from {}", ticker, price_origin))?;
        let price_rows = prices.len();
        let indicators = self
            .indicators(prices)
            .with_context(|| format!("computing indicators for {}", ticker))?;

        let mut headlines = SeriesLoader::load_headlines(headlines, headline_origin)
            .with_context(|| format!("loading headlines from {}", headline_origin))?;
        let daily_sentiment = aggregate_daily(&mut headlines, self.scorer.as_ref(), ticker)
            .with_context(|| format!("aggregating headline sentiment for {}", ticker))?;

        let mut aligned = align(&indicators, &daily_sentiment)
            .with_context(|| format!("aligning prices and sentiment for {}", ticker))?;
        if self.config.return_basis == ReturnBasis::Aligned {
            aligned = IndicatorEngine::new(aligned)
                .and_then(IndicatorEngine::daily_return)
                .map(IndicatorEngine::build)
                .with_context(|| format!("computing aligned returns for {}", ticker))?;
        }
        tracing::info!(
            "{}: {} price rows, {} sentiment days, {} aligned rows",
            ticker,
            price_rows,
            daily_sentiment.len(),
            aligned.len()
        );

        let correlation = self.correlation(&aligned)?;
        let topics = self.topics(&headlines)?;
        let outputs = self.write_outputs(&indicators, &daily_sentiment, &aligned)?;

        let report = PipelineReport {
            ticker: ticker.to_string(),
            price_rows,
            headline_count: headlines.len(),
            sentiment_days: daily_sentiment.len(),
            aligned_rows: aligned.len(),
            return_basis: self.config.return_basis,
            correlation,
            latest_indicators: latest_values(&indicators),
            topics,
            outputs,
        };
        let tables = PipelineTables {
            indicators,
            daily_sentiment,
            aligned,
        };
        Ok((report, tables))
    }

    fn indicators(&self, prices: TimeSeriesTable) -> AnalysisResult<TimeSeriesTable> {
        let engine = IndicatorEngine::new(prices)?
            .simple_moving_average(self.config.sma_period)?
            .exponential_moving_average(self.config.ema_period)?
            .relative_strength_index(self.config.rsi_period)?
            .macd(MacdParams::default())?;
        let engine = match self.config.return_basis {
            ReturnBasis::Price => engine.daily_return()?,
            ReturnBasis::Aligned => engine,
        };
        Ok(engine.build())
    }

    fn correlation(&self, aligned: &TimeSeriesTable) -> Result<Option<CorrelationResult>> {
        let ticker = &self.config.ticker;
        match correlate(aligned, DAILY_RETURN_COLUMN, SENTIMENT_FIELD) {
            Ok(result) => {
                tracing::info!(
                    "Pearson correlation between daily news sentiment (compound) and {} stock returns: {:.4}",
                    ticker,
                    result.coefficient
                );
                Ok(Some(result))
            }
            Err(e @ AnalysisError::InsufficientData { .. })
            | Err(e @ AnalysisError::CalculationError(_)) => {
                tracing::warn!("{}: no correlation computed: {}", ticker, e);
                Ok(None)
            }
            Err(e) => Err(e).with_context(|| format!("correlating sentiment with {} returns", ticker)),
        }
    }

    fn topics(&self, headlines: &HeadlineSet) -> Result<Option<Vec<TopicTerms>>> {
        if self.config.skip_topics {
            tracing::info!("topic modeling skipped");
            return Ok(None);
        }

        let stopwords = init_stopwords(&self.config.stopwords).context("loading stopwords")?;
        let corpus: Vec<&str> = headlines.headlines().collect();
        let fitted = TopicModeler::new(stopwords)
            .min_df(self.config.topic_min_df)
            .max_df(self.config.topic_max_df)
            .num_topics(self.config.topic_count)
            .fit(&corpus);

        let model = match fitted {
            Ok(model) => model,
            Err(e @ AnalysisError::EmptyVocabulary { .. }) => {
                tracing::warn!("no topics fitted: {}", e);
                return Ok(None);
            }
            Err(e) => return Err(e).context("fitting topic model"),
        };

        let topics: Vec<TopicTerms> = model.top_terms(self.config.top_terms).collect();
        for topic in &topics {
            tracing::info!("Topic #{}: {}", topic.topic + 1, topic.terms.join(" "));
        }
        Ok(Some(topics))
    }

    fn write_outputs(
        &self,
        indicators: &TimeSeriesTable,
        daily_sentiment: &TimeSeriesTable,
        aligned: &TimeSeriesTable,
    ) -> Result<Vec<PathBuf>> {
        let Some(dir) = &self.config.output_dir else {
            return Ok(Vec::new());
        };
        fs::create_dir_all(dir)
            .with_context(|| format!("creating output directory {}", dir.display()))?;

        let ticker = &self.config.ticker;
        let mut written = Vec::new();
        for (suffix, table) in [
            ("indicators", indicators),
            ("daily_sentiment", daily_sentiment),
            ("aligned", aligned),
        ] {
            let path = dir.join(format!("{}_{}.csv", ticker, suffix));
            write_table_path(&path, table)
                .with_context(|| format!("writing {}", path.display()))?;
            written.push(path);
        }
        Ok(written)
    }
}

fn open(path: &Path) -> Result<File> {
    File::open(path).with_context(|| format!("opening {}", path.display()))
}

/// Defined values on the last row of `table`
fn latest_values(table: &TimeSeriesTable) -> BTreeMap<String, f64> {
    let Some(last) = table.len().checked_sub(1) else {
        return BTreeMap::new();
    };
    table
        .columns()
        .iter()
        .filter(|c| !c.values[last].is_nan())
        .map(|c| (c.name.clone(), c.values[last]))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use analysis_core::SentimentScore;
    use approx::assert_abs_diff_eq;
    use chrono::{Duration, NaiveDate};
    use std::collections::HashMap;
    use std::fmt::Write;

    /// Scores headlines from a fixed table of compound values
    struct FixedScorer(HashMap<&'static str, f64>);

    impl TextScorer for FixedScorer {
        fn score(&self, text: &str) -> SentimentScore {
            let compound = self.0.get(text).copied().unwrap_or(0.0);
            SentimentScore::new((-compound).max(0.0), 1.0 - compound.abs(), compound.max(0.0), compound)
        }
    }

    const HEADLINES: [(u32, &str, &str, f64); 8] = [
        (3, "AAPL", "Apple unveils new chip lineup", 0.6),
        (5, "AAPL", "Apple faces chip supply delays", -0.4),
        (5, "AAPL", "Analysts see new demand for Apple", 0.2),
        (9, "AAPL", "Apple shares slide on chip delays", -0.5),
        (14, "AAPL", "Apple beats estimates with new iPhone demand", 0.7),
        (20, "AAPL", "Apple supply chain recovers", 0.3),
        (9, "MSFT", "Microsoft cloud demand grows", 0.5),
        (14, "MSFT", "Microsoft unveils new chip", 0.1),
    ];

    fn day(offset: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2023, 3, 1).unwrap() + Duration::days(offset as i64)
    }

    fn price_csv() -> String {
        let mut csv = String::from("Date,Open,Close,Volume\n");
        for i in 0..40u32 {
            let close = 150.0 + i as f64 * 0.5 + [0.0, 1.5, -1.0, 2.5, -0.5][i as usize % 5];
            writeln!(csv, "{},{},{},{}", day(i), close - 0.3, close, 1_000_000 + i * 1000).unwrap();
        }
        csv
    }

    fn headline_csv() -> String {
        let mut csv = String::from("date,stock,headline\n");
        for (offset, ticker, headline, _) in HEADLINES {
            writeln!(csv, "{} 09:30:00-04:00,{},{}", day(offset), ticker, headline).unwrap();
        }
        csv
    }

    fn scorer() -> Box<dyn TextScorer> {
        Box::new(FixedScorer(HEADLINES.iter().map(|&(_, _, h, c)| (h, c)).collect()))
    }

    fn config() -> PipelineConfig {
        PipelineConfig::new("prices.csv", "headlines.csv", "aapl")
    }

    fn run(config: PipelineConfig) -> (PipelineReport, PipelineTables) {
        SentimentPipeline::with_scorer(config, scorer())
            .run_on(price_csv().as_bytes(), "prices", headline_csv().as_bytes(), "headlines")
            .unwrap()
    }

    #[test]
    fn test_end_to_end_price_returns() {
        let (report, tables) = run(config());

        assert_eq!(report.ticker, "AAPL");
        assert_eq!(report.price_rows, 40);
        assert_eq!(report.headline_count, 8);
        assert_eq!(report.sentiment_days, 5);
        assert_eq!(report.aligned_rows, 5);

        let correlation = report.correlation.unwrap();
        assert_eq!(correlation.observations, 5);
        assert!((-1.0..=1.0).contains(&correlation.coefficient));

        // Day 5 averages two headlines
        let compound = tables.aligned.value(day(5), "compound").unwrap();
        assert_abs_diff_eq!(compound, -0.1, epsilon = 1e-12);

        // Returns come from the full series, so the first aligned row has one
        let closes = tables.indicators.column("Close").unwrap();
        let expected = (closes[3] / closes[2] - 1.0) * 100.0;
        assert_abs_diff_eq!(
            tables.aligned.value(day(3), DAILY_RETURN_COLUMN).unwrap(),
            expected,
            epsilon = 1e-9
        );

        for column in ["SMA_20", "EMA_20", "RSI_14", "MACD", "MACD_signal", "MACD_hist", "daily_return"] {
            assert!(report.latest_indicators.contains_key(column), "{}", column);
        }
    }

    #[test]
    fn test_aligned_return_basis() {
        let mut config = config();
        config.return_basis = ReturnBasis::Aligned;
        let (report, tables) = run(config);

        assert!(!tables.indicators.has_column(DAILY_RETURN_COLUMN));
        let returns = tables.aligned.column(DAILY_RETURN_COLUMN).unwrap();
        assert!(returns[0].is_nan());

        // Change between day 3 and day 5, the next aligned date
        let expected = (tables.aligned.value(day(5), "Close").unwrap()
            / tables.aligned.value(day(3), "Close").unwrap()
            - 1.0)
            * 100.0;
        assert_abs_diff_eq!(returns[1], expected, epsilon = 1e-9);
        assert_eq!(report.correlation.unwrap().observations, 4);
    }

    #[test]
    fn test_topics_reported() {
        let (report, _) = run(config());
        let topics = report.topics.unwrap();

        assert_eq!(topics.len(), 5);
        assert!(topics.iter().all(|t| !t.terms.is_empty() && t.terms.len() <= 10));
    }

    #[test]
    fn test_topics_skipped() {
        let mut config = config();
        config.skip_topics = true;
        let (report, _) = run(config);
        assert!(report.topics.is_none());
    }

    #[test]
    fn test_empty_vocabulary_is_not_fatal() {
        let mut config = config();
        config.topic_min_df = topic_modeling::DocFrequency::Count(50);
        let (report, _) = run(config);

        assert!(report.topics.is_none());
        assert!(report.correlation.is_some());
    }

    #[test]
    fn test_unknown_ticker_has_no_correlation() {
        let mut config = config();
        config.ticker = "TSLA".into();
        config.skip_topics = true;
        let (report, tables) = run(config);

        assert_eq!(report.sentiment_days, 0);
        assert!(tables.aligned.is_empty());
        assert!(report.correlation.is_none());
    }

    #[test]
    fn test_missing_close_aborts() {
        let prices = "Date,Open\n2023-03-01,1.0\n";
        let err = SentimentPipeline::with_scorer(config(), scorer())
            .run_on(prices.as_bytes(), "prices", headline_csv().as_bytes(), "headlines")
            .unwrap_err();

        assert!(format!("{:#}", err).contains("Close"));
    }

    #[test]
    fn test_outputs_written() {
        let dir = std::env::temp_dir().join(format!("sentiment-pipeline-{}", std::process::id()));
        let mut config = config();
        config.output_dir = Some(dir.clone());
        config.skip_topics = true;
        let (report, _) = run(config);

        assert_eq!(report.outputs.len(), 3);
        assert!(dir.join("AAPL_indicators.csv").exists());
        assert!(dir.join("AAPL_daily_sentiment.csv").exists());
        let aligned = fs::read_to_string(dir.join("AAPL_aligned.csv")).unwrap();
        assert!(aligned.starts_with("Date,Open,Close,Volume"));
        assert_eq!(aligned.lines().count(), 6);

        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_report_serializes() {
        let (report, _) = run(config());
        let json = serde_json::to_value(&report).unwrap();

        assert_eq!(json["ticker"], "AAPL");
        assert_eq!(json["return_basis"], "price");
        assert_eq!(json["correlation"]["observations"], 5);
    }
}
