use std::f64::consts::{E, PI};

/// Local estimate of the gap between consecutive zeta zeros near height t,
/// `2π / log(t / 2π)`, with the argument floored at 10 and the logarithm
/// floored at 1 so the estimate stays positive and bounded for small t.
///
/// Advisory only: used to cap refinement steps, never for a rigor decision.
pub fn estimate_spacing(t: f64) -> f64 {
    let two_pi = 2.0 * PI;
    let t_guard = t.max(10.0);
    let x = t_guard / two_pi;
    let denom = x.max(E).ln().max(1.0);
    two_pi / denom
}

#[cfg(test)]
mod tests {
    use super::estimate_spacing;
    use std::f64::consts::PI;

    #[test]
    fn floors_small_heights_at_ten() {
        assert_eq!(estimate_spacing(0.0), estimate_spacing(10.0));
        assert_eq!(estimate_spacing(5.0), estimate_spacing(10.0));
        // At the floor the log is clamped to 1, so the estimate is 2π.
        assert_eq!(estimate_spacing(0.0), 2.0 * PI);
    }

    #[test]
    fn is_pure_and_bit_stable() {
        let a = estimate_spacing(100.0);
        let b = estimate_spacing(100.0);
        assert_eq!(a.to_bits(), b.to_bits());
    }

    #[test]
    fn shrinks_with_height() {
        let low = estimate_spacing(100.0);
        let high = estimate_spacing(10_000.0);
        assert!(high < low);
        assert!(high > 0.0);
    }
}
