//! Zigzag pivot detection
//!
//! Walks the series once, tracking the running extreme of the current trend.
//! A reversal of at least `threshold` (as a fraction of the extreme) confirms
//! the extreme as a pivot and flips the trend.

use crate::types::{Pivot, PivotKind, Result, WaveEngineError};
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq)]
enum Trend {
    Up,
    Down,
}

/// Reject thresholds outside the open interval (0, 1)
pub fn validate_threshold(threshold: f64) -> Result<()> {
    if threshold > 0.0 && threshold < 1.0 {
        Ok(())
    } else {
        Err(WaveEngineError::InvalidThreshold(threshold))
    }
}

/// Detect alternating highs and lows in `prices`.
///
/// The first bar is always the opening pivot and the last bar is always the
/// terminal pivot, even when the final move never crossed the threshold.
///
/// The terminal kind continues the alternation: it is `High` while the
/// running trend is up and `Low` while it is down, whatever the last price
/// is. A walk that rises slightly and then drifts below its start therefore
/// closes on a `High` that sits under the opening `Low`. Kinds always
/// alternate, which is what the triangle windows rely on; prices of
/// neighbouring pivots are only ordered for confirmed pivots.
pub fn detect_pivots(prices: &[f64], threshold: f64) -> Result<Vec<Pivot>> {
    validate_threshold(threshold)?;
    let first = *prices.first().ok_or(WaveEngineError::EmptySeries)?;
    let last_index = prices.len() - 1;

    // Opening kind is settled once the first move is known
    let mut pivots = vec![Pivot::low(0, first)];
    let mut trend: Option<Trend> = None;
    let mut anchor_index = 0;
    let mut anchor_price = first;

    for (i, &price) in prices.iter().enumerate().skip(1) {
        let change = (price - anchor_price) / anchor_price;

        match trend {
            None => {
                if change > 0.0 {
                    trend = Some(Trend::Up);
                    pivots[0].kind = PivotKind::Low;
                } else if change < 0.0 {
                    trend = Some(Trend::Down);
                    pivots[0].kind = PivotKind::High;
                } else {
                    continue;
                }
                anchor_index = i;
                anchor_price = price;
            }
            Some(Trend::Up) => {
                if change <= -threshold {
                    debug!(index = anchor_index, price = anchor_price, "pivot high confirmed");
                    pivots.push(Pivot::high(anchor_index, anchor_price));
                    trend = Some(Trend::Down);
                    anchor_index = i;
                    anchor_price = price;
                } else if price > anchor_price {
                    anchor_index = i;
                    anchor_price = price;
                }
            }
            Some(Trend::Down) => {
                if change >= threshold {
                    debug!(index = anchor_index, price = anchor_price, "pivot low confirmed");
                    pivots.push(Pivot::low(anchor_index, anchor_price));
                    trend = Some(Trend::Up);
                    anchor_index = i;
                    anchor_price = price;
                } else if price < anchor_price {
                    anchor_index = i;
                    anchor_price = price;
                }
            }
        }
    }

    if last_index > 0 {
        let kind = match trend {
            Some(Trend::Up) => PivotKind::High,
            Some(Trend::Down) => PivotKind::Low,
            None => pivots[0].kind.opposite(),
        };
        pivots.push(Pivot {
            index: last_index,
            price: prices[last_index],
            kind,
        });
    }

    Ok(pivots)
}
