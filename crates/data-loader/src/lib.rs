//! data-loader: read price and headline tables from CSV.
//!
//! Dates are parsed leniently, converted to UTC when they carry an offset,
//! then truncated to the calendar day so that later joins match on day
//! rather than timestamp.

use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;

use analysis_core::{
    AnalysisError, AnalysisResult, Column, NewsEvent, SentimentScore, TimeSeriesTable,
    NEWS_DATE_COLUMN, PRICE_DATE_COLUMN, SENTIMENT_COLUMNS,
};
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use sentiment_analysis::HeadlineSet;

pub const TICKER_COLUMN: &str = "stock";
pub const HEADLINE_COLUMN: &str = "headline";

const OFFSET_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%:z",
    "%Y-%m-%d %H:%M:%S%.f%:z",
    "%Y-%m-%d %H:%M:%S%z",
];

const NAIVE_DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
];

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%m/%d/%Y", "%Y/%m/%d"];

/// Parse a date-like string to a UTC calendar day.
///
/// Values with an offset are converted to UTC first; naive timestamps are
/// taken as UTC already.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let value = raw.trim();
    if value.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.with_timezone(&Utc).date_naive());
    }
    for fmt in OFFSET_FORMATS {
        if let Ok(dt) = DateTime::parse_from_str(value, fmt) {
            return Some(dt.with_timezone(&Utc).date_naive());
        }
    }
    for fmt in NAIVE_DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(value, fmt) {
            return Some(dt.date());
        }
    }
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(value, fmt).ok())
}

fn parse_number(raw: &str) -> Option<f64> {
    let value = raw.trim();
    if value.is_empty() || value.eq_ignore_ascii_case("nan") {
        return Some(f64::NAN);
    }
    value.parse().ok()
}

/// Header row plus all data rows of a CSV source
struct RawTable {
    headers: csv::StringRecord,
    records: Vec<csv::StringRecord>,
}

impl RawTable {
    fn read<R: Read>(reader: R, origin: &str) -> AnalysisResult<Self> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::All)
            .from_reader(reader);

        let headers = reader
            .headers()
            .map_err(|e| AnalysisError::Io(format!("{}: {}", origin, e)))?
            .clone();
        let records = reader
            .records()
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| AnalysisError::Io(format!("{}: {}", origin, e)))?;

        Ok(Self { headers, records })
    }

    fn position(&self, column: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == column)
    }

    fn cells(&self, index: usize) -> impl Iterator<Item = &str> {
        self.records.iter().map(move |r| r.get(index).unwrap_or(""))
    }

    fn dates(&self, column: &str, origin: &str) -> AnalysisResult<Vec<NaiveDate>> {
        let index = self
            .position(column)
            .ok_or_else(|| AnalysisError::MissingDateColumn {
                column: column.to_string(),
                origin: origin.to_string(),
            })?;

        self.cells(index)
            .enumerate()
            .map(|(row, cell)| {
                parse_date(cell).ok_or_else(|| AnalysisError::DateParse {
                    column: column.to_string(),
                    row: row + 1,
                    value: cell.to_string(),
                })
            })
            .collect()
    }
}

fn open(path: &Path) -> AnalysisResult<File> {
    File::open(path).map_err(|e| AnalysisError::Io(format!("{}: {}", path.display(), e)))
}

/// Reads date-keyed tables from CSV sources
pub struct SeriesLoader;

impl SeriesLoader {
    /// Load a table keyed by `date_column` (matched case-sensitively).
    ///
    /// Every other column is parsed as numbers; empty cells become `NaN`.
    /// A column with any non-numeric cell is skipped with a warning.
    pub fn load<R: Read>(reader: R, date_column: &str, origin: &str) -> AnalysisResult<TimeSeriesTable> {
        let raw = RawTable::read(reader, origin)?;
        let dates = raw.dates(date_column, origin)?;

        let mut columns = Vec::new();
        for (index, name) in raw.headers.iter().enumerate() {
            if name == date_column {
                continue;
            }
            let parsed: Option<Vec<f64>> = raw.cells(index).map(parse_number).collect();
            match parsed {
                Some(values) => columns.push(Column::new(name, values)),
                None => tracing::warn!("{}: skipping non-numeric column '{}'", origin, name),
            }
        }

        let table = TimeSeriesTable::from_columns(date_column, dates, columns)?;
        tracing::info!(
            "loaded {} rows x {} columns from {}",
            table.len(),
            table.columns().len(),
            origin
        );
        Ok(table)
    }

    /// Price table keyed by `Date`
    pub fn load_prices<R: Read>(reader: R, origin: &str) -> AnalysisResult<TimeSeriesTable> {
        Self::load(reader, PRICE_DATE_COLUMN, origin)
    }

    pub fn load_prices_path(path: &Path) -> AnalysisResult<TimeSeriesTable> {
        Self::load_prices(open(path)?, &path.display().to_string())
    }

    /// Headline table with `date`, `stock` and `headline` columns.
    ///
    /// If the source already carries `neg, neu, pos, compound` the scores
    /// come back cached and will not be recomputed.
    pub fn load_headlines<R: Read>(reader: R, origin: &str) -> AnalysisResult<HeadlineSet> {
        let raw = RawTable::read(reader, origin)?;
        let dates = raw.dates(NEWS_DATE_COLUMN, origin)?;

        let required = |column: &str| {
            raw.position(column).ok_or_else(|| AnalysisError::MissingColumn {
                column: column.to_string(),
                context: origin.to_string(),
            })
        };
        let ticker_index = required(TICKER_COLUMN)?;
        let headline_index = required(HEADLINE_COLUMN)?;

        let events: Vec<NewsEvent> = dates
            .into_iter()
            .zip(raw.cells(ticker_index).zip(raw.cells(headline_index)))
            .map(|(date, (ticker, headline))| NewsEvent::new(date, ticker, headline))
            .collect();

        let score_indices: Option<Vec<usize>> =
            SENTIMENT_COLUMNS.iter().map(|c| raw.position(c)).collect();

        let headlines = match score_indices {
            Some(indices) => {
                let scores = Self::cached_scores(&raw, &indices, origin)?;
                tracing::info!("{}: using {} cached sentiment scores", origin, scores.len());
                HeadlineSet::with_scores(events, scores)?
            }
            None => HeadlineSet::new(events),
        };

        tracing::info!("loaded {} headlines from {}", headlines.len(), origin);
        Ok(headlines)
    }

    pub fn load_headlines_path(path: &Path) -> AnalysisResult<HeadlineSet> {
        Self::load_headlines(open(path)?, &path.display().to_string())
    }

    fn cached_scores(raw: &RawTable, indices: &[usize], origin: &str) -> AnalysisResult<Vec<SentimentScore>> {
        raw.records
            .iter()
            .enumerate()
            .map(|(row, record)| -> AnalysisResult<SentimentScore> {
                let mut fields = [0.0; 4];
                for (field, &index) in fields.iter_mut().zip(indices) {
                    let cell = record.get(index).unwrap_or("");
                    *field = cell.trim().parse().map_err(|_| {
                        AnalysisError::InvalidData(format!(
                            "{}: bad sentiment score {:?} in column '{}' at row {}",
                            origin,
                            cell,
                            &raw.headers[index],
                            row + 1
                        ))
                    })?;
                }
                Ok(SentimentScore::new(fields[0], fields[1], fields[2], fields[3]))
            })
            .collect()
    }
}

/// Write a table as CSV: key column first, dates as `YYYY-MM-DD`, `NaN` as an empty cell.
pub fn write_table<W: Write>(writer: W, table: &TimeSeriesTable) -> AnalysisResult<()> {
    let io_err = |e: csv::Error| AnalysisError::Io(e.to_string());
    let mut writer = csv::Writer::from_writer(writer);

    let mut header = vec![table.key_name().to_string()];
    header.extend(table.column_names().map(str::to_string));
    writer.write_record(&header).map_err(io_err)?;

    for (row, date) in table.dates().iter().enumerate() {
        let mut record = vec![date.format("%Y-%m-%d").to_string()];
        record.extend(table.columns().iter().map(|c| {
            let value = c.values[row];
            if value.is_nan() {
                String::new()
            } else {
                value.to_string()
            }
        }));
        writer.write_record(&record).map_err(io_err)?;
    }

    writer
        .flush()
        .map_err(|e| AnalysisError::Io(e.to_string()))
}

pub fn write_table_path(path: &Path, table: &TimeSeriesTable) -> AnalysisResult<()> {
    let file = File::create(path).map_err(|e| AnalysisError::Io(format!("{}: {}", path.display(), e)))?;
    write_table(file, table)?;
    tracing::info!("wrote {} rows to {}", table.len(), path.display());
    Ok(())
}
