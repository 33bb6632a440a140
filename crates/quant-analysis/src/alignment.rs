use analysis_core::{
    AlignedTable, AnalysisError, AnalysisResult, DailySentimentTable, TimeSeriesTable,
};

/// Inner join of a price table and a daily sentiment table on date.
///
/// Output rows are exactly the dates present in both inputs, keyed like the
/// price table, carrying the price columns followed by the sentiment
/// columns. Disjoint date ranges give an empty table, not an error.
///
/// The sentiment table must carry at least one value column, and a column
/// name present in both inputs must hold the same values on every shared
/// date; otherwise the inputs are rejected with `AlignmentError` before
/// anything is joined.
pub fn align(
    price: &TimeSeriesTable,
    sentiment: &DailySentimentTable,
) -> AnalysisResult<AlignedTable> {
    if sentiment.columns().is_empty() {
        return Err(AnalysisError::AlignmentError(format!(
            "sentiment table keyed by '{}' has no value columns",
            sentiment.key_name()
        )));
    }

    let (price_rows, sentiment_rows) = matching_rows(price, sentiment);

    let mut aligned = price.take_rows(&price_rows);
    for column in sentiment.columns() {
        let values: Vec<f64> = sentiment_rows.iter().map(|&j| column.values[j]).collect();
        match aligned.column(&column.name) {
            Some(existing) => {
                let agrees = existing
                    .iter()
                    .zip(&values)
                    .all(|(a, b)| a == b || (a.is_nan() && b.is_nan()));
                if !agrees {
                    return Err(AnalysisError::AlignmentError(format!(
                        "column '{}' exists in both tables with different values",
                        column.name
                    )));
                }
            }
            None => aligned.insert_column(column.name.clone(), values)?,
        }
    }

    tracing::debug!(
        "aligned {} price rows with {} sentiment rows: {} shared dates",
        price.len(),
        sentiment.len(),
        aligned.len()
    );
    Ok(aligned)
}

/// Row positions of the shared dates, walking both sorted indexes once.
fn matching_rows(left: &TimeSeriesTable, right: &TimeSeriesTable) -> (Vec<usize>, Vec<usize>) {
    let (a, b) = (left.dates(), right.dates());
    let mut left_rows = Vec::new();
    let mut right_rows = Vec::new();
    let (mut i, mut j) = (0, 0);

    while i < a.len() && j < b.len() {
        match a[i].cmp(&b[j]) {
            std::cmp::Ordering::Less => i += 1,
            std::cmp::Ordering::Greater => j += 1,
            std::cmp::Ordering::Equal => {
                left_rows.push(i);
                right_rows.push(j);
                i += 1;
                j += 1;
            }
        }
    }
    (left_rows, right_rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use analysis_core::{Column, NEWS_DATE_COLUMN, PRICE_DATE_COLUMN};
    use chrono::NaiveDate;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2021, 8, d).unwrap()
    }

    fn prices(days: &[u32]) -> TimeSeriesTable {
        TimeSeriesTable::from_columns(
            PRICE_DATE_COLUMN,
            days.iter().map(|&d| day(d)).collect(),
            vec![Column::new("Close", days.iter().map(|&d| 100.0 + d as f64).collect())],
        )
        .unwrap()
    }

    fn sentiment(days: &[u32]) -> TimeSeriesTable {
        TimeSeriesTable::from_columns(
            NEWS_DATE_COLUMN,
            days.iter().map(|&d| day(d)).collect(),
            vec![Column::new("compound", days.iter().map(|&d| d as f64 / 100.0).collect())],
        )
        .unwrap()
    }

    #[test]
    fn test_inner_join_keeps_shared_dates() {
        let aligned = align(&prices(&[2, 3, 4, 5, 6]), &sentiment(&[1, 3, 5, 7])).unwrap();

        assert_eq!(aligned.dates(), &[day(3), day(5)]);
        assert_eq!(aligned.key_name(), "Date");
        assert_eq!(aligned.column("Close").unwrap(), &[103.0, 105.0]);
        assert_eq!(aligned.column("compound").unwrap(), &[0.03, 0.05]);
    }

    #[test]
    fn test_disjoint_ranges_give_empty_table() {
        let aligned = align(&prices(&[1, 2, 3]), &sentiment(&[10, 11])).unwrap();

        assert!(aligned.is_empty());
        assert!(aligned.has_column("Close"));
        assert!(aligned.has_column("compound"));
    }

    #[test]
    fn test_sentiment_without_values_rejected() {
        let bare = TimeSeriesTable::new(NEWS_DATE_COLUMN, vec![day(1)]).unwrap();
        let err = align(&prices(&[1]), &bare).unwrap_err();

        assert!(matches!(err, AnalysisError::AlignmentError(_)));
    }

    #[test]
    fn test_identical_overlapping_column_allowed() {
        let mut news = sentiment(&[2, 3]);
        news.insert_column("Close", vec![102.0, 103.0]).unwrap();

        let aligned = align(&prices(&[1, 2, 3]), &news).unwrap();
        assert_eq!(aligned.columns().len(), 2);
    }

    #[test]
    fn test_conflicting_overlapping_column_rejected() {
        let mut news = sentiment(&[2, 3]);
        news.insert_column("Close", vec![1.0, 2.0]).unwrap();

        let err = align(&prices(&[1, 2, 3]), &news).unwrap_err();
        assert!(matches!(err, AnalysisError::AlignmentError(_)));
    }
}
