use chrono::NaiveDate;

use crate::{AnalysisError, AnalysisResult};

/// Key column name used by price tables
pub const PRICE_DATE_COLUMN: &str = "Date";

/// Key column name used by headline and daily sentiment tables
pub const NEWS_DATE_COLUMN: &str = "date";

/// Named numeric column. Missing values are `NaN`.
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub name: String,
    pub values: Vec<f64>,
}

impl Column {
    pub fn new(name: impl Into<String>, values: Vec<f64>) -> Self {
        Self {
            name: name.into(),
            values,
        }
    }
}

/// Date-keyed table of numeric columns.
///
/// Rows are kept sorted by date and every date appears at most once, so
/// windowed indicators can walk the columns in order and lookups by date
/// can binary search.
#[derive(Debug, Clone, PartialEq)]
pub struct TimeSeriesTable {
    key: String,
    dates: Vec<NaiveDate>,
    columns: Vec<Column>,
}

/// Daily sentiment is a plain table keyed by `date` with `neg, neu, pos, compound`.
pub type DailySentimentTable = TimeSeriesTable;

/// Result of joining a price table with a daily sentiment table.
pub type AlignedTable = TimeSeriesTable;

impl TimeSeriesTable {
    /// Table with only a date key and no value columns.
    pub fn new(key: impl Into<String>, dates: Vec<NaiveDate>) -> AnalysisResult<Self> {
        Self::from_columns(key, dates, Vec::new())
    }

    /// Build a table from unsorted rows. Rows are reordered by date; a
    /// repeated date is rejected.
    pub fn from_columns(
        key: impl Into<String>,
        dates: Vec<NaiveDate>,
        columns: Vec<Column>,
    ) -> AnalysisResult<Self> {
        let key = key.into();
        for column in &columns {
            if column.values.len() != dates.len() {
                return Err(AnalysisError::InvalidData(format!(
                    "column '{}' has {} values but the '{}' key has {} rows",
                    column.name,
                    column.values.len(),
                    key,
                    dates.len()
                )));
            }
        }
        for (i, column) in columns.iter().enumerate() {
            if columns[..i].iter().any(|c| c.name == column.name) {
                return Err(AnalysisError::InvalidData(format!(
                    "column '{}' appears twice",
                    column.name
                )));
            }
        }

        let mut order: Vec<usize> = (0..dates.len()).collect();
        order.sort_by_key(|&i| dates[i]);
        if let Some(pair) = order.windows(2).find(|w| dates[w[0]] == dates[w[1]]) {
            return Err(AnalysisError::DuplicateDate {
                date: dates[pair[0]],
            });
        }

        let sorted_dates = order.iter().map(|&i| dates[i]).collect();
        let sorted_columns = columns
            .into_iter()
            .map(|c| Column {
                values: order.iter().map(|&i| c.values[i]).collect(),
                name: c.name,
            })
            .collect();

        Ok(Self {
            key,
            dates: sorted_dates,
            columns: sorted_columns,
        })
    }

    /// Name of the date key column as it appeared in the source.
    pub fn key_name(&self) -> &str {
        &self.key
    }

    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    pub fn len(&self) -> usize {
        self.dates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|c| c.name.as_str())
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.columns.iter().any(|c| c.name == name)
    }

    pub fn column(&self, name: &str) -> Option<&[f64]> {
        self.columns
            .iter()
            .find(|c| c.name == name)
            .map(|c| c.values.as_slice())
    }

    /// Like [`column`](Self::column) but reports which operation needed it.
    pub fn require_column(&self, name: &str, context: &str) -> AnalysisResult<&[f64]> {
        self.column(name).ok_or_else(|| AnalysisError::MissingColumn {
            column: name.to_string(),
            context: context.to_string(),
        })
    }

    /// Append a column, or overwrite the values of an existing one with the
    /// same name. Columns are never removed.
    pub fn insert_column(&mut self, name: impl Into<String>, values: Vec<f64>) -> AnalysisResult<()> {
        let name = name.into();
        if values.len() != self.dates.len() {
            return Err(AnalysisError::InvalidData(format!(
                "column '{}' has {} values but the table has {} rows",
                name,
                values.len(),
                self.dates.len()
            )));
        }
        match self.columns.iter_mut().find(|c| c.name == name) {
            Some(existing) => existing.values = values,
            None => self.columns.push(Column { name, values }),
        }
        Ok(())
    }

    /// Row position of a date, if present.
    pub fn position(&self, date: NaiveDate) -> Option<usize> {
        self.dates.binary_search(&date).ok()
    }

    pub fn value(&self, date: NaiveDate, column: &str) -> Option<f64> {
        let row = self.position(date)?;
        self.column(column).map(|values| values[row])
    }

    /// New table holding the given rows, in the given order. Callers pass
    /// ascending positions so the date order is preserved.
    pub fn take_rows(&self, rows: &[usize]) -> Self {
        Self {
            key: self.key.clone(),
            dates: rows.iter().map(|&i| self.dates[i]).collect(),
            columns: self
                .columns
                .iter()
                .map(|c| Column {
                    name: c.name.clone(),
                    values: rows.iter().map(|&i| c.values[i]).collect(),
                })
                .collect(),
        }
    }
}
