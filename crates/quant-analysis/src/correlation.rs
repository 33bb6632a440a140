use analysis_core::{AnalysisError, AnalysisResult, CorrelationResult, TimeSeriesTable};
use statrs::statistics::Statistics;

/// Rows where both fields are present, as `(x, y)` pairs.
///
/// These are the points a sentiment-vs-return scatter chart would plot.
pub fn scatter_points(
    table: &TimeSeriesTable,
    x_field: &str,
    y_field: &str,
) -> AnalysisResult<Vec<(f64, f64)>> {
    let xs = table.require_column(x_field, "correlation")?;
    let ys = table.require_column(y_field, "correlation")?;

    Ok(xs
        .iter()
        .zip(ys)
        .filter(|(x, y)| !x.is_nan() && !y.is_nan())
        .map(|(&x, &y)| (x, y))
        .collect())
}

/// Pearson correlation between two columns after dropping rows where either
/// is missing.
///
/// Fewer than two usable rows is `InsufficientData`; a constant column has
/// no defined correlation and is a `CalculationError`.
pub fn correlate(
    table: &TimeSeriesTable,
    return_field: &str,
    sentiment_field: &str,
) -> AnalysisResult<CorrelationResult> {
    let points = scatter_points(table, return_field, sentiment_field)?;
    if points.len() < 2 {
        return Err(AnalysisError::InsufficientData {
            operation: format!("correlation of {} and {}", return_field, sentiment_field),
            valid_rows: points.len(),
            required: 2,
        });
    }

    let (xs, ys): (Vec<f64>, Vec<f64>) = points.into_iter().unzip();
    let xs = xs.as_slice();
    let ys = ys.as_slice();

    let std_x = xs.std_dev();
    let std_y = ys.std_dev();
    if std_x == 0.0 || std_y == 0.0 {
        return Err(AnalysisError::CalculationError(format!(
            "correlation of {} and {} undefined: zero variance",
            return_field, sentiment_field
        )));
    }

    let coefficient = (xs.covariance(ys) / (std_x * std_y)).clamp(-1.0, 1.0);
    tracing::debug!(
        "pearson({}, {}) = {:.4} over {} rows",
        return_field,
        sentiment_field,
        coefficient,
        xs.len()
    );

    Ok(CorrelationResult {
        coefficient,
        observations: xs.len(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use analysis_core::{Column, PRICE_DATE_COLUMN};
    use approx::assert_abs_diff_eq;
    use chrono::{Duration, NaiveDate};

    fn table(returns: &[f64], compound: &[f64]) -> TimeSeriesTable {
        let start = NaiveDate::from_ymd_opt(2022, 5, 2).unwrap();
        TimeSeriesTable::from_columns(
            PRICE_DATE_COLUMN,
            (0..returns.len()).map(|i| start + Duration::days(i as i64)).collect(),
            vec![
                Column::new("daily_return", returns.to_vec()),
                Column::new("compound", compound.to_vec()),
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_two_rows_positive_slope() {
        let t = table(&[1.0, 3.0], &[0.1, 0.5]);
        let result = correlate(&t, "daily_return", "compound").unwrap();

        assert_abs_diff_eq!(result.coefficient, 1.0, epsilon = 1e-12);
        assert_eq!(result.observations, 2);
    }

    #[test]
    fn test_two_rows_negative_slope() {
        let t = table(&[f64::NAN, 2.0, -4.0], &[0.3, -0.2, 0.4]);
        let result = correlate(&t, "daily_return", "compound").unwrap();

        assert_abs_diff_eq!(result.coefficient, -1.0, epsilon = 1e-12);
        assert_eq!(result.observations, 2);
    }

    #[test]
    fn test_one_valid_row_is_insufficient() {
        let t = table(&[f64::NAN, 2.0, 5.0], &[0.3, f64::NAN, 0.1]);
        let err = correlate(&t, "daily_return", "compound").unwrap_err();

        assert_eq!(
            err,
            AnalysisError::InsufficientData {
                operation: "correlation of daily_return and compound".into(),
                valid_rows: 1,
                required: 2,
            }
        );
    }

    #[test]
    fn test_empty_table_is_insufficient() {
        let t = table(&[], &[]);
        let err = correlate(&t, "daily_return", "compound").unwrap_err();
        assert!(matches!(err, AnalysisError::InsufficientData { valid_rows: 0, .. }));
    }

    #[test]
    fn test_known_coefficient() {
        // r = 0.8 for this textbook pair
        let t = table(&[1.0, 2.0, 3.0, 4.0, 5.0], &[2.0, 1.0, 4.0, 3.0, 5.0]);
        let result = correlate(&t, "daily_return", "compound").unwrap();

        assert_abs_diff_eq!(result.coefficient, 0.8, epsilon = 1e-12);
        assert_eq!(result.observations, 5);
    }

    #[test]
    fn test_constant_column_is_undefined() {
        let t = table(&[1.0, 2.0, 3.0], &[0.2, 0.2, 0.2]);
        let err = correlate(&t, "daily_return", "compound").unwrap_err();
        assert!(matches!(err, AnalysisError::CalculationError(_)));
    }

    #[test]
    fn test_missing_field() {
        let t = table(&[1.0, 2.0], &[0.1, 0.2]);
        let err = correlate(&t, "daily_return", "sentiment").unwrap_err();
        assert!(matches!(err, AnalysisError::MissingColumn { ref column, .. } if column == "sentiment"));
    }

    #[test]
    fn test_scatter_points_drop_missing() {
        let t = table(&[f64::NAN, 1.5, 2.5], &[0.1, 0.2, f64::NAN]);
        let points = scatter_points(&t, "compound", "daily_return").unwrap();
        assert_eq!(points, vec![(0.2, 1.5)]);
    }
}
