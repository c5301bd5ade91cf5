// Normalization logic for chart responses before they reach the analysis
use crate::types::*;
use chrono::DateTime;

/// Zip raw timestamps and closes into bars, dropping entries with a missing
/// close or an unrepresentable timestamp
pub fn bars_from_columns(timestamps: &[i64], closes: &[Option<f64>]) -> Vec<PriceBar> {
    timestamps
        .iter()
        .zip(closes)
        .filter_map(|(&ts, close)| {
            let close = (*close)?;
            if !close.is_finite() {
                return None;
            }
            Some(PriceBar {
                timestamp: DateTime::from_timestamp(ts, 0)?,
                close,
            })
        })
        .collect()
}

/// Validate that every close is positive and bars are in time order
pub fn validate_history(history: &PriceHistory) -> Result<()> {
    if let Some(bar) = history.bars.iter().find(|b| b.close <= 0.0) {
        return Err(DataRetrievalError::InvalidResponse(format!(
            "{}: non-positive close {} at {}",
            history.ticker, bar.close, bar.timestamp
        )));
    }

    if history.bars.windows(2).any(|w| w[1].timestamp < w[0].timestamp) {
        return Err(DataRetrievalError::InvalidResponse(format!(
            "{}: bars out of order",
            history.ticker
        )));
    }

    Ok(())
}
