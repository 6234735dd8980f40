//! Classification of magnitude enclosures. This is the soundness boundary of
//! the whole engine: every `zero_likely` decision and every accepted
//! refinement step is justified by the bounds computed here.

use crate::ball::RealBall;
use rug::Float;

/// True if the ball is consistent with a magnitude below `threshold`.
///
/// A ball whose radius already covers its midpoint (`rad >= |mid|`) counts as
/// small: the enclosure cannot exclude zero, so no stronger claim than
/// "consistent with zero" is possible. Note this conservative rule can mask a
/// genuinely large value behind an enormous radius at insufficient precision;
/// callers wanting to rule that out must re-run at higher precision.
pub fn is_small(ball: &RealBall, threshold: f64) -> bool {
    let mid_abs = ball.mid().clone().abs();
    if *ball.rad() >= mid_abs {
        return true;
    }
    let ub = mid_abs + ball.rad();
    ub < threshold
}

/// Provable upper bound of the ball, `mid + rad`, as a plain scalar.
pub fn upper_bound(ball: &RealBall) -> f64 {
    let p = ball.mid().prec();
    Float::with_val(p, ball.mid() + ball.rad()).to_f64()
}

/// Sound lower bound of a magnitude ball, `max(0, mid - rad)`.
pub fn lower_bound_nonneg(ball: &RealBall) -> f64 {
    let p = ball.mid().prec();
    let lb = Float::with_val(p, ball.mid() - ball.rad()).to_f64();
    lb.max(0.0)
}

#[cfg(test)]
mod tests {
    use super::{is_small, lower_bound_nonneg, upper_bound};
    use crate::ball::RealBall;
    use rug::Float;

    fn ball(mid: f64, rad: f64) -> RealBall {
        RealBall::new(Float::with_val(64, mid), Float::with_val(64, rad))
    }

    #[test]
    fn degenerate_enclosure_is_small_at_any_threshold() {
        // rad >= |mid| means the ball cannot exclude zero.
        assert!(is_small(&ball(1.0, 1.0), 1e-300));
        assert!(is_small(&ball(-3.0, 5.0), 1e-300));
        assert!(is_small(&ball(0.0, 0.0), 1e-300));
    }

    #[test]
    fn tight_enclosure_compares_upper_bound_to_threshold() {
        assert!(is_small(&ball(1e-12, 1e-13), 1e-10));
        assert!(!is_small(&ball(1e-9, 1e-13), 1e-10));
        // |mid| + rad exactly at threshold is not strictly below it.
        assert!(!is_small(&ball(0.5, 0.25), 0.75));
    }

    #[test]
    fn bounds_are_midpoint_plus_minus_radius() {
        let b = ball(2.0, 0.5);
        assert_eq!(upper_bound(&b), 2.5);
        assert_eq!(lower_bound_nonneg(&b), 1.5);
    }

    #[test]
    fn lower_bound_clamps_at_zero() {
        assert_eq!(lower_bound_nonneg(&ball(0.25, 0.5)), 0.0);
    }
}
