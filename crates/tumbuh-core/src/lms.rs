//! # LMS Transform
//!
//! Cole's LMS method: a raw measurement `x` and the reference parameters
//! `L` (skewness), `M` (median) and `S` (coefficient of variation) give
//!
//! ```text
//! L == 0:  Z = ln(x / M) / S
//! L != 0:  Z = ((x / M)^L - 1) / (L * S)
//! ```
//!
//! ## Restricted Tails
//!
//! For weight-based indicators the WHO reference applies a linear
//! correction outside ±3 SD, using the spacing between the 2 SD and 3 SD
//! curves instead of the LMS curve itself. See [`restricted_z_score`].

use crate::primitives::Z_TAIL;
use crate::reference::GrowthReferenceRow;
use crate::{GrowthError, Indicator};

/// Z-score of `x` against raw LMS parameters.
///
/// Returns `GrowthError::InvalidInput` if `x`, `m` or `s` is not positive,
/// or if any argument is not finite.
pub fn lms_z_score(x: f64, l: f64, m: f64, s: f64) -> Result<f64, GrowthError> {
    if !x.is_finite() || x <= 0.0 {
        return Err(GrowthError::InvalidInput(format!(
            "measurement must be positive, got {}",
            x
        )));
    }
    if !l.is_finite() || !m.is_finite() || !s.is_finite() || m <= 0.0 || s <= 0.0 {
        return Err(GrowthError::InvalidInput(format!(
            "LMS parameters out of domain (L={}, M={}, S={})",
            l, m, s
        )));
    }

    let ratio = x / m;
    let z = if l == 0.0 {
        ratio.ln() / s
    } else {
        (ratio.powf(l) - 1.0) / (l * s)
    };
    Ok(z)
}

/// Z-score of `x` against a reference row.
pub fn z_score(x: f64, row: &GrowthReferenceRow) -> Result<f64, GrowthError> {
    lms_z_score(x, row.l, row.m, row.s)
}

/// Measurement sitting exactly `z` standard deviations from the median.
///
/// Inverse of [`lms_z_score`]: `M * (1 + L*S*z)^(1/L)`, or `M * e^(S*z)`
/// when `L == 0`. Returns `None` where the curve is undefined
/// (`1 + L*S*z <= 0`).
#[must_use]
pub fn centile_value(row: &GrowthReferenceRow, z: f64) -> Option<f64> {
    if row.l == 0.0 {
        return Some(row.m * (row.s * z).exp());
    }
    let base = 1.0 + row.l * row.s * z;
    if base <= 0.0 {
        return None;
    }
    Some(row.m * base.powf(1.0 / row.l))
}

/// Z-score with the WHO restricted-tail correction.
///
/// Inside ±3 this equals [`z_score`]. Beyond it:
///
/// ```text
/// z >  3:  3 + (x - SD3)  / (SD3 - SD2)
/// z < -3: -3 + (x - SD-3) / (SD-2 - SD-3)
/// ```
///
/// Falls back to the plain score if the SD curves are undefined for this row.
pub fn restricted_z_score(x: f64, row: &GrowthReferenceRow) -> Result<f64, GrowthError> {
    let z = z_score(x, row)?;

    if z > Z_TAIL {
        if let (Some(sd3), Some(sd2)) = (centile_value(row, Z_TAIL), centile_value(row, 2.0)) {
            return Ok(Z_TAIL + (x - sd3) / (sd3 - sd2));
        }
    } else if z < -Z_TAIL {
        if let (Some(sd3), Some(sd2)) = (centile_value(row, -Z_TAIL), centile_value(row, -2.0)) {
            return Ok(-Z_TAIL + (x - sd3) / (sd2 - sd3));
        }
    }

    Ok(z)
}

/// Z-score of `x` for `indicator`.
///
/// Weight-for-age takes the restricted-tail score when
/// `weight_tail_adjustment` is set; height-for-age always takes the plain one.
pub fn indicator_z_score(
    indicator: Indicator,
    x: f64,
    row: &GrowthReferenceRow,
    weight_tail_adjustment: bool,
) -> Result<f64, GrowthError> {
    match indicator {
        Indicator::WeightForAge if weight_tail_adjustment => restricted_z_score(x, row),
        _ => z_score(x, row),
    }
}

// =============================================================================
// TESTS
// =============================================================================
