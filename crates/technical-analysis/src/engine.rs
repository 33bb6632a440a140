use analysis_core::{AnalysisResult, TimeSeriesTable};

use crate::indicators;

pub const CLOSE_COLUMN: &str = "Close";
pub const MACD_COLUMN: &str = "MACD";
pub const MACD_SIGNAL_COLUMN: &str = "MACD_signal";
pub const MACD_HIST_COLUMN: &str = "MACD_hist";
pub const DAILY_RETURN_COLUMN: &str = "daily_return";

pub fn sma_column(period: usize) -> String {
    format!("SMA_{}", period)
}

pub fn ema_column(period: usize) -> String {
    format!("EMA_{}", period)
}

pub fn rsi_column(period: usize) -> String {
    format!("RSI_{}", period)
}

/// MACD periods
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MacdParams {
    pub fast: usize,
    pub slow: usize,
    pub signal: usize,
}

impl Default for MacdParams {
    fn default() -> Self {
        Self {
            fast: 12,
            slow: 26,
            signal: 9,
        }
    }
}

/// Appends indicator columns to a price table it owns.
///
/// Each step consumes the engine and hands it back, so the augmented table
/// has exactly one owner until [`build`](Self::build) releases it:
///
/// ```ignore
/// let table = IndicatorEngine::new(prices)?
///     .simple_moving_average(20)?
///     .daily_return()?
///     .build();
/// ```
#[derive(Debug, Clone)]
pub struct IndicatorEngine {
    table: TimeSeriesTable,
}

impl IndicatorEngine {
    pub fn new(table: TimeSeriesTable) -> AnalysisResult<Self> {
        table.require_column(CLOSE_COLUMN, "indicator engine input")?;
        Ok(Self { table })
    }

    fn close(&self, context: &str) -> AnalysisResult<&[f64]> {
        self.table.require_column(CLOSE_COLUMN, context)
    }

    fn append(mut self, name: String, values: Vec<f64>) -> AnalysisResult<Self> {
        let defined = values.iter().filter(|v| !v.is_nan()).count();
        tracing::debug!("appended {} ({} of {} rows defined)", name, defined, values.len());
        self.table.insert_column(name, values)?;
        Ok(self)
    }

    /// `SMA_<period>`
    pub fn simple_moving_average(self, period: usize) -> AnalysisResult<Self> {
        let name = sma_column(period);
        let values = indicators::sma(self.close(&name)?, period)?;
        self.append(name, values)
    }

    /// `EMA_<period>`
    pub fn exponential_moving_average(self, period: usize) -> AnalysisResult<Self> {
        let name = ema_column(period);
        let values = indicators::ema(self.close(&name)?, period)?;
        self.append(name, values)
    }

    /// `RSI_<period>`
    pub fn relative_strength_index(self, period: usize) -> AnalysisResult<Self> {
        let name = rsi_column(period);
        let values = indicators::rsi(self.close(&name)?, period)?;
        self.append(name, values)
    }

    /// `MACD`, `MACD_signal` and `MACD_hist`
    pub fn macd(self, params: MacdParams) -> AnalysisResult<Self> {
        let result = indicators::macd(
            self.close(MACD_COLUMN)?,
            params.fast,
            params.slow,
            params.signal,
        )?;
        self.append(MACD_COLUMN.to_string(), result.macd_line)?
            .append(MACD_SIGNAL_COLUMN.to_string(), result.signal_line)?
            .append(MACD_HIST_COLUMN.to_string(), result.histogram)
    }

    /// `daily_return`, in percent
    pub fn daily_return(self) -> AnalysisResult<Self> {
        let values = indicators::daily_return(self.close(DAILY_RETURN_COLUMN)?);
        self.append(DAILY_RETURN_COLUMN.to_string(), values)
    }

    /// EMA(20), RSI(14), SMA(20) and MACD(12, 26, 9)
    pub fn technical_indicators(self) -> AnalysisResult<Self> {
        self.exponential_moving_average(20)?
            .relative_strength_index(14)?
            .simple_moving_average(20)?
            .macd(MacdParams::default())
    }

    pub fn table(&self) -> &TimeSeriesTable {
        &self.table
    }

    pub fn build(self) -> TimeSeriesTable {
        self.table
    }
}
