use std::collections::HashMap;
use std::env;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use anyhow::{bail, Context, Result};
use serde::Serialize;
use topic_modeling::{DocFrequency, StopwordSource};

pub const USAGE: &str = "\
Usage: sentiment-pipeline [OPTIONS]

Options (each overrides the environment variable in brackets):
  --price PATH         price CSV with Date and Close columns   [PRICE_CSV]
  --headlines PATH     headline CSV with date, stock, headline [HEADLINES_CSV]
  --ticker SYMBOL      ticker to analyse                       [TICKER]
  --output DIR         write indicator/sentiment/aligned CSVs  [OUTPUT_DIR]
  --topics N           number of topics                        [TOPIC_COUNT]
  --top-terms N        terms listed per topic                  [TOP_TERMS]
  --skip-topics        do not fit the topic model              [SKIP_TOPICS]
  --aligned-returns    returns between aligned dates           [RETURN_BASIS=aligned]
  -h, --help           print this message
";

/// Which rows `daily_return` is measured across
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ReturnBasis {
    /// Consecutive rows of the full price series
    #[default]
    Price,
    /// Consecutive rows that survive the join with sentiment
    Aligned,
}

impl FromStr for ReturnBasis {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "price" => Ok(ReturnBasis::Price),
            "aligned" => Ok(ReturnBasis::Aligned),
            other => bail!("RETURN_BASIS must be 'price' or 'aligned', got '{}'", other),
        }
    }
}

impl fmt::Display for ReturnBasis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReturnBasis::Price => write!(f, "price"),
            ReturnBasis::Aligned => write!(f, "aligned"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PipelineConfig {
    // Inputs
    pub price_csv: PathBuf,
    pub headlines_csv: PathBuf,
    pub ticker: String,
    pub stopwords: StopwordSource,

    // Indicators
    pub sma_period: usize,  // 20
    pub ema_period: usize,  // 20
    pub rsi_period: usize,  // 14
    pub return_basis: ReturnBasis,

    // Topics
    pub skip_topics: bool,
    pub topic_count: usize,         // 5
    pub topic_min_df: DocFrequency, // 2 documents
    pub topic_max_df: DocFrequency, // 95 documents
    pub top_terms: usize,           // 10

    pub output_dir: Option<PathBuf>,
}

impl PipelineConfig {
    /// Defaults for everything except the inputs.
    pub fn new(
        price_csv: impl Into<PathBuf>,
        headlines_csv: impl Into<PathBuf>,
        ticker: &str,
    ) -> Self {
        Self {
            price_csv: price_csv.into(),
            headlines_csv: headlines_csv.into(),
            ticker: ticker.trim().to_uppercase(),
            stopwords: StopwordSource::English,
            sma_period: 20,
            ema_period: 20,
            rsi_period: 14,
            return_basis: ReturnBasis::Price,
            skip_topics: false,
            topic_count: 5,
            topic_min_df: DocFrequency::Count(2),
            topic_max_df: DocFrequency::Count(95),
            top_terms: 10,
            output_dir: None,
        }
    }

    /// Environment variables only
    pub fn from_env() -> Result<Self> {
        Self::from_sources(|key| env::var(key).ok(), std::iter::empty::<String>())
    }

    /// Environment variables overridden by command-line flags
    pub fn from_env_and_args<I>(args: I) -> Result<Self>
    where
        I: IntoIterator<Item = String>,
    {
        Self::from_sources(|key| env::var(key).ok(), args)
    }

    /// Build from a variable lookup, letting `args` override it.
    pub fn from_sources<F, I>(lookup: F, args: I) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
        I: IntoIterator<Item = String>,
    {
        let overrides = parse_args(args)?;
        let var = |key: &str| overrides.get(key).cloned().or_else(|| lookup(key));
        let parsed = |key: &str, default: &str| -> Result<usize> {
            let raw = var(key).unwrap_or_else(|| default.to_string());
            raw.trim()
                .parse()
                .with_context(|| format!("{} must be a whole number, got '{}'", key, raw))
        };

        let price_csv = var("PRICE_CSV").context("PRICE_CSV not set (or pass --price)")?;
        let headlines_csv =
            var("HEADLINES_CSV").context("HEADLINES_CSV not set (or pass --headlines)")?;
        let ticker = var("TICKER").context("TICKER not set (or pass --ticker)")?;

        let mut config = Self::new(price_csv, headlines_csv, &ticker);
        config.stopwords = match var("STOPWORDS_PATH") {
            Some(path) if !path.trim().is_empty() => StopwordSource::File(PathBuf::from(path)),
            _ => StopwordSource::English,
        };
        config.sma_period = parsed("SMA_PERIOD", "20")?;
        config.ema_period = parsed("EMA_PERIOD", "20")?;
        config.rsi_period = parsed("RSI_PERIOD", "14")?;
        config.return_basis = match var("RETURN_BASIS") {
            Some(raw) => raw.parse()?,
            None => ReturnBasis::Price,
        };
        config.skip_topics = match var("SKIP_TOPICS") {
            Some(raw) => parse_flag(&raw).context("SKIP_TOPICS must be true or false")?,
            None => false,
        };
        config.topic_count = parsed("TOPIC_COUNT", "5")?;
        config.topic_min_df = parse_doc_frequency(&var("TOPIC_MIN_DF").unwrap_or_else(|| "2".into()))
            .context("TOPIC_MIN_DF")?;
        config.topic_max_df = parse_doc_frequency(&var("TOPIC_MAX_DF").unwrap_or_else(|| "95".into()))
            .context("TOPIC_MAX_DF")?;
        config.top_terms = parsed("TOP_TERMS", "10")?;
        config.output_dir = var("OUTPUT_DIR")
            .filter(|dir| !dir.trim().is_empty())
            .map(PathBuf::from);

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.ticker.is_empty() {
            bail!("TICKER must not be empty");
        }
        for (name, period) in [
            ("SMA_PERIOD", self.sma_period),
            ("EMA_PERIOD", self.ema_period),
            ("RSI_PERIOD", self.rsi_period),
        ] {
            if period < 2 {
                bail!("{} must be at least 2, got {}", name, period);
            }
        }
        if self.topic_count == 0 {
            bail!("TOPIC_COUNT must be at least 1");
        }
        Ok(())
    }
}

/// Whether the arguments ask for usage text
pub fn wants_help<S: AsRef<str>>(args: &[S]) -> bool {
    args.iter().any(|a| matches!(a.as_ref(), "-h" | "--help"))
}

/// Map command-line flags onto the variable names they override.
fn parse_args<I>(args: I) -> Result<HashMap<&'static str, String>>
where
    I: IntoIterator<Item = String>,
{
    let mut overrides = HashMap::new();
    let mut args = args.into_iter();
    while let Some(flag) = args.next() {
        let key = match flag.as_str() {
            "--skip-topics" => {
                overrides.insert("SKIP_TOPICS", "true".to_string());
                continue;
            }
            "--aligned-returns" => {
                overrides.insert("RETURN_BASIS", "aligned".to_string());
                continue;
            }
            "--price" => "PRICE_CSV",
            "--headlines" => "HEADLINES_CSV",
            "--ticker" => "TICKER",
            "--output" => "OUTPUT_DIR",
            "--topics" => "TOPIC_COUNT",
            "--top-terms" => "TOP_TERMS",
            other => bail!("unknown argument '{}'\n\n{}", other, USAGE),
        };
        let value = args
            .next()
            .with_context(|| format!("{} expects a value", flag))?;
        overrides.insert(key, value);
    }
    Ok(overrides)
}

fn parse_flag(raw: &str) -> Result<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" => Ok(true),
        "0" | "false" | "no" | "" => Ok(false),
        other => bail!("not a boolean: '{}'", other),
    }
}

/// `"2"` is a document count, `"0.95"` a share of documents.
pub fn parse_doc_frequency(raw: &str) -> Result<DocFrequency> {
    let raw = raw.trim();
    if raw.contains('.') {
        let share: f64 = raw
            .parse()
            .with_context(|| format!("'{}' is not a proportion", raw))?;
        Ok(DocFrequency::Proportion(share))
    } else {
        let count: usize = raw
            .parse()
            .with_context(|| format!("'{}' is not a document count", raw))?;
        Ok(DocFrequency::Count(count))
    }
}
