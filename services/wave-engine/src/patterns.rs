//! Triangle classification over sliding five-pivot windows

use crate::types::{Pivot, PivotKind, Result, TriangleKind, TrianglePattern, WaveEngineError};
use tracing::debug;

/// Pivots per classification window
pub const TRIANGLE_WINDOW: usize = 5;

/// Classify every five-pivot window that opens on a high.
///
/// Windows opening on a low are skipped: the rules read positions 0, 2, 4 as
/// highs and 1, 3 as lows, which only holds when position 0 is a high.
pub fn detect_triangles(pivots: &[Pivot]) -> Result<Vec<TrianglePattern>> {
    if pivots.len() < TRIANGLE_WINDOW {
        return Err(WaveEngineError::InsufficientPivots {
            found: pivots.len(),
        });
    }

    let mut patterns = Vec::new();
    for window in pivots.windows(TRIANGLE_WINDOW) {
        if window[0].kind != PivotKind::High {
            debug!(start = window[0].index, "window opens on a low, skipped");
            continue;
        }
        if let Some(kind) = classify_window(window) {
            patterns.push(TrianglePattern {
                pivot_index: window[2].index,
                kind,
            });
        }
    }

    Ok(patterns)
}

/// Apply the triangle rules to a window of exactly five pivots, assuming
/// position 0 is a high. First matching rule wins.
pub fn classify_window(window: &[Pivot]) -> Option<TriangleKind> {
    if window.len() != TRIANGLE_WINDOW {
        return None;
    }

    let highs = [window[0].price, window[2].price, window[4].price];
    let lows = [window[1].price, window[3].price];

    let highs_falling = highs.windows(2).all(|w| w[1] < w[0]);
    let lows_rising = lows.windows(2).all(|w| w[1] > w[0]);

    if highs_falling && lows_rising {
        Some(TriangleKind::Contracting)
    } else if highs[2] > highs[0] && lows[1] > lows[0] {
        Some(TriangleKind::Running)
    } else if highs[2] == highs[0] || lows[1] == lows[0] {
        Some(TriangleKind::Barrier)
    } else {
        None
    }
}
