//! Wave feature extraction

use crate::types::{Pivot, Result, Wave, WaveDirection, WaveEngineError};

/// Build one wave per consecutive pivot pair.
///
/// Fewer than two pivots produce no waves. A pivot sitting on a zero price
/// cannot start a wave (the relative change is undefined) and is rejected
/// with [`WaveEngineError::DegenerateWave`].
pub fn extract_waves(prices: &[f64], pivots: &[Pivot]) -> Result<Vec<Wave>> {
    if let Some(p) = pivots.iter().find(|p| p.index >= prices.len()) {
        return Err(WaveEngineError::PivotOutOfRange {
            index: p.index,
            len: prices.len(),
        });
    }

    pivots
        .windows(2)
        .map(|pair| build_wave(prices, &pair[0], &pair[1]))
        .collect()
}

fn build_wave(prices: &[f64], start: &Pivot, end: &Pivot) -> Result<Wave> {
    if start.price == 0.0 {
        return Err(WaveEngineError::DegenerateWave {
            start_index: start.index,
        });
    }

    let duration = end.index.saturating_sub(start.index);
    let change = (end.price - start.price) / start.price;
    let slope = if duration > 0 {
        change / duration as f64
    } else {
        0.0
    };
    let volatility = if duration > 0 {
        population_std_dev(&prices[start.index..end.index])
    } else {
        0.0
    };

    Ok(Wave {
        start_index: start.index,
        end_index: end.index,
        start_price: start.price,
        end_price: end.price,
        duration,
        change,
        slope,
        volatility,
        direction: WaveDirection::from_change(change),
    })
}

/// Population standard deviation; 0 for slices shorter than two
pub fn population_std_dev(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    variance.sqrt()
}
