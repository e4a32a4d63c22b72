//! Rate normalization: RAI and the aerial-to-camera ratio.
//!
//! Both rates are tagged values rather than raw floats so that "no data"
//! can never masquerade as a rate of zero. The rules here are the
//! safety-critical half of the comparison: a camera with zero
//! operational nights has no RAI, and a cell with no aerial individuals
//! has no ratio.

use hexcensus_models::{Rai, Ratio};

/// Detections per operational night.
///
/// Undefined when `nights == 0`: a camera that never ran produced no
/// evidence either way, which must propagate as missing instead of
/// deflating downstream means.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn compute_rai(detections: u64, nights: u32) -> Rai {
    if nights == 0 {
        Rai::Undefined
    } else {
        Rai::Defined(detections as f64 / f64::from(nights))
    }
}

/// Aerial individual count divided by RAI.
///
/// Short-circuits to undefined when the aerial count is zero (a zero
/// ratio would read as "under-detected by air" when the species simply
/// was not there), when RAI is undefined, and when RAI is zero (aerial
/// presence with no camera signal is a sentinel, not infinity).
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn compute_ratio(aerial_individuals: u64, rai: Rai) -> Ratio {
    if aerial_individuals == 0 {
        return Ratio::Undefined;
    }
    match rai {
        Rai::Defined(value) if value > 0.0 => {
            Ratio::Defined(aerial_individuals as f64 / value)
        }
        Rai::Defined(_) | Rai::Undefined => Ratio::Undefined,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_nights_is_undefined_never_zero() {
        assert_eq!(compute_rai(0, 0), Rai::Undefined);
        assert_eq!(compute_rai(5, 0), Rai::Undefined);
    }

    #[test]
    fn operational_camera_with_no_detections_has_zero_rai() {
        assert_eq!(compute_rai(0, 14), Rai::Defined(0.0));
    }

    #[test]
    fn rai_is_detections_per_night() {
        assert_eq!(compute_rai(7, 14), Rai::Defined(0.5));
    }

    #[test]
    fn ratio_undefined_on_aerial_absence_regardless_of_rai() {
        assert_eq!(compute_ratio(0, Rai::Defined(0.5)), Ratio::Undefined);
        assert_eq!(compute_ratio(0, Rai::Defined(0.0)), Ratio::Undefined);
        assert_eq!(compute_ratio(0, Rai::Undefined), Ratio::Undefined);
    }

    #[test]
    fn ratio_undefined_on_zero_or_missing_rai() {
        // Aerial presence with zero camera signal: no division artifact.
        assert_eq!(compute_ratio(7, Rai::Defined(0.0)), Ratio::Undefined);
        assert_eq!(compute_ratio(7, Rai::Undefined), Ratio::Undefined);
    }

    #[test]
    fn ratio_is_individuals_over_rai() {
        assert_eq!(compute_ratio(7, Rai::Defined(0.5)), Ratio::Defined(14.0));
    }
}
