//! Indicator kernels over a price slice.
//!
//! Every kernel returns a vector the same length as its input, `NaN` where
//! the window has not filled yet, so results line up row-for-row with the
//! table they came from.

use analysis_core::{AnalysisError, AnalysisResult};

fn check_period(name: &str, period: usize, min: usize) -> AnalysisResult<()> {
    if period < min {
        return Err(AnalysisError::InvalidParameter(format!(
            "{} period must be at least {}, got {}",
            name, min, period
        )));
    }
    Ok(())
}

/// Simple Moving Average
pub fn sma(data: &[f64], period: usize) -> AnalysisResult<Vec<f64>> {
    check_period("SMA", period, 2)?;

    let mut result = vec![f64::NAN; data.len()];
    if data.len() < period {
        return Ok(result);
    }

    let mut total: f64 = data[..period - 1].iter().sum();
    for i in period - 1..data.len() {
        total += data[i];
        result[i] = total / period as f64;
        total -= data[i + 1 - period];
    }
    Ok(result)
}

/// EMA seeded at `seed_index` with the mean of the `period` values ending there.
fn ema_seeded(data: &[f64], period: usize, seed_index: usize) -> Vec<f64> {
    let mut result = vec![f64::NAN; data.len()];
    if seed_index >= data.len() || seed_index + 1 < period {
        return result;
    }

    let multiplier = 2.0 / (period as f64 + 1.0);
    let mut prev = data[seed_index + 1 - period..=seed_index].iter().sum::<f64>() / period as f64;
    result[seed_index] = prev;

    for i in seed_index + 1..data.len() {
        prev = (data[i] - prev) * multiplier + prev;
        result[i] = prev;
    }
    result
}

/// Exponential Moving Average
pub fn ema(data: &[f64], period: usize) -> AnalysisResult<Vec<f64>> {
    check_period("EMA", period, 2)?;
    Ok(ema_seeded(data, period, period - 1))
}

/// Relative Strength Index (Wilder smoothing)
///
/// A window with no losses reads 100; a window with neither gains nor
/// losses reads 0.
pub fn rsi(data: &[f64], period: usize) -> AnalysisResult<Vec<f64>> {
    check_period("RSI", period, 2)?;

    let mut result = vec![f64::NAN; data.len()];
    if data.len() <= period {
        return Ok(result);
    }

    let mut avg_gain = 0.0;
    let mut avg_loss = 0.0;
    for i in 1..=period {
        let change = data[i] - data[i - 1];
        if change < 0.0 {
            avg_loss -= change;
        } else {
            avg_gain += change;
        }
    }
    avg_gain /= period as f64;
    avg_loss /= period as f64;
    result[period] = rsi_value(avg_gain, avg_loss);

    let smoothing = (period - 1) as f64;
    for i in period + 1..data.len() {
        let change = data[i] - data[i - 1];
        avg_gain *= smoothing;
        avg_loss *= smoothing;
        if change < 0.0 {
            avg_loss -= change;
        } else {
            avg_gain += change;
        }
        avg_gain /= period as f64;
        avg_loss /= period as f64;
        result[i] = rsi_value(avg_gain, avg_loss);
    }
    Ok(result)
}

fn rsi_value(avg_gain: f64, avg_loss: f64) -> f64 {
    let total = avg_gain + avg_loss;
    if total == 0.0 {
        0.0
    } else {
        100.0 * (avg_gain / total)
    }
}

/// MACD (Moving Average Convergence Divergence)
pub struct MacdResult {
    pub macd_line: Vec<f64>,
    pub signal_line: Vec<f64>,
    pub histogram: Vec<f64>,
}

/// Both EMAs are anchored on the slow window, and all three outputs stay
/// undefined until the signal EMA has warmed up on top of that.
pub fn macd(
    data: &[f64],
    fast_period: usize,
    slow_period: usize,
    signal_period: usize,
) -> AnalysisResult<MacdResult> {
    check_period("MACD fast", fast_period, 2)?;
    check_period("MACD slow", slow_period, 2)?;
    check_period("MACD signal", signal_period, 1)?;

    let (fast_period, slow_period) = if slow_period < fast_period {
        (slow_period, fast_period)
    } else {
        (fast_period, slow_period)
    };

    let n = data.len();
    let mut macd_line = vec![f64::NAN; n];
    let mut signal_line = vec![f64::NAN; n];
    let mut histogram = vec![f64::NAN; n];

    let anchor = slow_period - 1;
    let first_output = anchor + signal_period - 1;
    if n <= first_output {
        return Ok(MacdResult { macd_line, signal_line, histogram });
    }

    let ema_fast = ema_seeded(data, fast_period, anchor);
    let ema_slow = ema_seeded(data, slow_period, anchor);

    let raw: Vec<f64> = (anchor..n).map(|i| ema_fast[i] - ema_slow[i]).collect();
    let signal = ema_seeded(&raw, signal_period, signal_period - 1);

    for i in first_output..n {
        let j = i - anchor;
        macd_line[i] = raw[j];
        signal_line[i] = signal[j];
        histogram[i] = raw[j] - signal[j];
    }

    Ok(MacdResult {
        macd_line,
        signal_line,
        histogram,
    })
}

/// Percent change between consecutive rows
pub fn daily_return(data: &[f64]) -> Vec<f64> {
    let mut result = vec![f64::NAN; data.len()];
    for i in 1..data.len() {
        result[i] = (data[i] / data[i - 1] - 1.0) * 100.0;
    }
    result
}
