//! Built-in zeta backend: Euler-Maclaurin summation carried out entirely in
//! ball arithmetic, with the truncation remainder folded into the result
//! radius.
//!
//! ```text
//! ζ(s) = Σ_{n=1}^{N-1} n^{-s} + N^{1-s}/(s-1) + N^{-s}/2
//!      + Σ_{k=1}^{M} B_{2k}/(2k)! · Π_{j=0}^{2k-2}(s+j) · N^{1-s-2k} + R
//! ```
//!
//! Derivatives are produced by term-by-term analytic differentiation; every
//! term picks up a -ln factor per order, and the Pochhammer product is
//! tracked as a (P, P', P'') triple under the product rule.

use anyhow::{bail, Result};
use rug::Float;

use crate::ball::{ComplexBall, RealBall};
use crate::enclosure;
use crate::precision::PrecisionCtx;
use crate::provider::{DerivativeOrder, ProviderError, ZetaProvider};

/// Exact Bernoulli numbers B_{2k} for k = 1..=13 as (numerator, denominator).
const BERNOULLI: [(i64, u32); 13] = [
    (1, 6),
    (-1, 30),
    (1, 42),
    (-1, 30),
    (5, 66),
    (-691, 2730),
    (7, 6),
    (-3617, 510),
    (43867, 798),
    (-174611, 330),
    (854513, 138),
    (-236364091, 2730),
    (8553103, 6),
];

#[derive(Debug, Clone)]
pub struct EulerMaclaurinZeta {
    tail_terms: usize,
}

impl Default for EulerMaclaurinZeta {
    fn default() -> Self {
        Self { tail_terms: 11 }
    }
}

impl EulerMaclaurinZeta {
    /// `tail_terms` is M above. The Bernoulli table must cover the first
    /// omitted term used for the remainder bound, hence the cap at 12.
    pub fn new(tail_terms: usize) -> Result<Self> {
        if tail_terms < 1 || tail_terms > BERNOULLI.len() - 1 {
            bail!(
                "tail_terms must be between 1 and {}.",
                BERNOULLI.len() - 1
            );
        }
        Ok(Self { tail_terms })
    }

    fn eval_triple(
        &self,
        s: &ComplexBall,
        ctx: &PrecisionCtx,
    ) -> Result<[ComplexBall; 3], ProviderError> {
        let shift = s.add_scalar(-1.0);
        if shift.re().contains_zero() && shift.im().contains_zero() {
            return Err(ProviderError::AtPole);
        }
        let m = self.tail_terms;
        let sigma = s.re().mid_f64();
        if sigma <= -((2 * m - 1) as f64) {
            return Err(ProviderError::OutOfDomain(format!(
                "sigma = {sigma} is below the Euler-Maclaurin validity line"
            )));
        }

        // The head length scales with the height so the first omitted tail
        // term stays far below any practical zero threshold.
        let t_abs = s.im().mid_f64().abs();
        let n = ((2.0 * t_abs).ceil() as u64 + 8).max(32);

        let neg_s = -s;
        let one_c = ComplexBall::one(ctx);
        let one_r = RealBall::exact_f64(1.0, ctx);
        let p_bits = ctx.float_prec();

        // Head: Σ n^{-s} with its first two s-derivatives. n = 1 contributes
        // (1, 0, 0).
        let mut sum0 = one_c.clone();
        let mut sum1 = ComplexBall::zero(ctx);
        let mut sum2 = ComplexBall::zero(ctx);
        for k in 2..n {
            let ln_k = RealBall::exact_u64(k, ctx).ln();
            let g = neg_s.scale_real(&ln_k).exp();
            let g1 = -&g.scale_real(&ln_k);
            let g2 = g.scale_real(&(&ln_k * &ln_k));
            sum0 = &sum0 + &g;
            sum1 = &sum1 + &g1;
            sum2 = &sum2 + &g2;
        }

        let ln_n = RealBall::exact_u64(n, ctx).ln();
        let ln_n2 = &ln_n * &ln_n;

        // T1 = N^{1-s}/(s-1), with u = N^{1-s} and u' = -ln N · u.
        let u = neg_s.add_scalar(1.0).scale_real(&ln_n).exp();
        let inv1 = &one_c / &shift;
        let inv2 = &inv1 * &inv1;
        let inv3 = &inv2 * &inv1;
        let ul = u.scale_real(&ln_n);
        let t1_0 = &u * &inv1;
        let t1_1 = -&(&(&ul * &inv1) + &(&u * &inv2));
        let t1_2 = &(&(&u.scale_real(&ln_n2) * &inv1) + &(&ul * &inv2).scale_f64(2.0))
            + &(&u * &inv3).scale_f64(2.0);

        // T2 = N^{-s}/2.
        let v = neg_s.scale_real(&ln_n).exp();
        let t2_0 = v.scale_f64(0.5);
        let t2_1 = -&t2_0.scale_real(&ln_n);
        let t2_2 = t2_0.scale_real(&ln_n2);

        sum0 = &(&sum0 + &t1_0) + &t2_0;
        sum1 = &(&sum1 + &t1_1) + &t2_1;
        sum2 = &(&sum2 + &t1_2) + &t2_2;

        // Bernoulli tail. pw walks N^{1-s-2k}; (p0, p1, p2) is the
        // Pochhammer product Π_{j=0}^{2k-2}(s+j) and its derivatives.
        let inv_n2 = &one_r / &RealBall::exact_u64(n * n, ctx);
        let mut pw = u.clone();
        let mut p0 = s.clone();
        let mut p1 = one_c.clone();
        let mut p2 = ComplexBall::zero(ctx);
        let mut rem = [0.0f64; 3];

        for k in 1..=(m + 1) {
            pw = pw.scale_real(&inv_n2);
            let (b_num, b_den) = BERNOULLI[k - 1];
            let mut den = Float::with_val(p_bits, Float::factorial(2 * k as u32));
            den *= b_den;
            let coeff = &RealBall::new(Float::with_val(p_bits, b_num), Float::with_val(p_bits, 0))
                / &RealBall::new(den, Float::with_val(p_bits, 0));

            let base = pw.scale_real(&coeff);
            let f0 = &base * &p0;
            let f1 = &base * &(&p1 - &p0.scale_real(&ln_n));
            let f2 = &base
                * &(&(&p2 - &p1.scale_real(&ln_n).scale_f64(2.0)) + &p0.scale_real(&ln_n2));

            if k <= m {
                sum0 = &sum0 + &f0;
                sum1 = &sum1 + &f1;
                sum2 = &sum2 + &f2;
            } else {
                // Truncation remainder: first omitted term scaled by the
                // classical |s+2M+1|/(σ+2M+1) factor. The derivative tails
                // alternate less cleanly, so they carry an extra factor of 4.
                let fac_num = enclosure::upper_bound(&s.add_scalar((2 * m + 1) as f64).abs());
                let fac = fac_num / (sigma + (2 * m + 1) as f64);
                rem[0] = enclosure::upper_bound(&f0.abs()) * fac;
                rem[1] = enclosure::upper_bound(&f1.abs()) * fac * 4.0;
                rem[2] = enclosure::upper_bound(&f2.abs()) * fac * 4.0;
            }

            // Advance the Pochhammer triple by the factors (s+2k-1)(s+2k).
            for a in [(2 * k - 1) as f64, (2 * k) as f64] {
                let q = s.add_scalar(a);
                let next_p2 = &(&p2 * &q) + &p1.scale_f64(2.0);
                let next_p1 = &(&p1 * &q) + &p0;
                let next_p0 = &p0 * &q;
                p2 = next_p2;
                p1 = next_p1;
                p0 = next_p0;
            }
        }

        sum0.add_error_f64(rem[0]);
        sum1.add_error_f64(rem[1]);
        sum2.add_error_f64(rem[2]);
        Ok([sum0, sum1, sum2])
    }
}

impl ZetaProvider for EulerMaclaurinZeta {
    fn zeta(
        &self,
        s: &ComplexBall,
        order: DerivativeOrder,
        ctx: &PrecisionCtx,
    ) -> Result<ComplexBall, ProviderError> {
        let [z0, z1, z2] = self.eval_triple(s, ctx)?;
        Ok(match order {
            DerivativeOrder::Zeta => z0,
            DerivativeOrder::First => z1,
            DerivativeOrder::Second => z2,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::EulerMaclaurinZeta;
    use crate::ball::{ComplexBall, RealBall};
    use crate::enclosure;
    use crate::precision::PrecisionCtx;
    use crate::provider::{DerivativeOrder, ProviderError, ZetaProvider};

    fn ctx() -> PrecisionCtx {
        PrecisionCtx::from_bits(256).unwrap()
    }

    fn at(sigma: f64, t: f64, ctx: &PrecisionCtx) -> ComplexBall {
        ComplexBall::new(RealBall::exact_f64(sigma, ctx), RealBall::exact_f64(t, ctx))
    }

    #[test]
    fn zeta_two_is_pi_squared_over_six() {
        let ctx = ctx();
        let provider = EulerMaclaurinZeta::default();
        let z = provider
            .zeta(&at(2.0, 0.0, &ctx), DerivativeOrder::Zeta, &ctx)
            .unwrap();
        let expected = std::f64::consts::PI * std::f64::consts::PI / 6.0;
        assert!((z.re().mid_f64() - expected).abs() < 1e-12);
        assert!(z.im().mid_f64().abs() < 1e-12);
        assert!(z.re().rad_f64() < 1e-12);
    }

    #[test]
    fn zeta_zero_is_minus_half() {
        let ctx = ctx();
        let provider = EulerMaclaurinZeta::default();
        let z = provider
            .zeta(&at(0.0, 0.0, &ctx), DerivativeOrder::Zeta, &ctx)
            .unwrap();
        assert!((z.re().mid_f64() + 0.5).abs() < 1e-12);
        assert!(z.im().mid_f64().abs() < 1e-12);
    }

    #[test]
    fn zeta_prime_at_zero_matches_known_value() {
        // ζ'(0) = -½ ln(2π)
        let ctx = ctx();
        let provider = EulerMaclaurinZeta::default();
        let z = provider
            .zeta(&at(0.0, 0.0, &ctx), DerivativeOrder::First, &ctx)
            .unwrap();
        let expected = -0.5 * (2.0 * std::f64::consts::PI).ln();
        assert!((z.re().mid_f64() - expected).abs() < 1e-12);
    }

    #[test]
    fn zeta_prime_at_two_matches_known_value() {
        let ctx = ctx();
        let provider = EulerMaclaurinZeta::default();
        let z = provider
            .zeta(&at(2.0, 0.0, &ctx), DerivativeOrder::First, &ctx)
            .unwrap();
        assert!((z.re().mid_f64() + 0.937_548_254_315_843_8).abs() < 1e-12);
    }

    #[test]
    fn second_derivative_agrees_with_difference_quotient() {
        let ctx = ctx();
        let provider = EulerMaclaurinZeta::default();
        let h = 1e-4;
        let d2 = provider
            .zeta(&at(2.0, 0.0, &ctx), DerivativeOrder::Second, &ctx)
            .unwrap();
        let hi = provider
            .zeta(&at(2.0 + h, 0.0, &ctx), DerivativeOrder::First, &ctx)
            .unwrap();
        let lo = provider
            .zeta(&at(2.0 - h, 0.0, &ctx), DerivativeOrder::First, &ctx)
            .unwrap();
        let quotient = (hi.re().mid_f64() - lo.re().mid_f64()) / (2.0 * h);
        assert!((d2.re().mid_f64() - quotient).abs() < 1e-6);
    }

    #[test]
    fn magnitude_is_tiny_at_the_first_zero_ordinate() {
        let ctx = ctx();
        let provider = EulerMaclaurinZeta::default();
        let t = RealBall::lift(&"14.134725141734693790".into(), &ctx).unwrap();
        let s = ComplexBall::new(RealBall::exact_f64(0.5, &ctx), t);
        let z = provider.zeta(&s, DerivativeOrder::Zeta, &ctx).unwrap();
        assert!(enclosure::upper_bound(&z.abs()) < 1e-8);
    }

    #[test]
    fn evaluation_at_the_pole_is_rejected() {
        let ctx = ctx();
        let provider = EulerMaclaurinZeta::default();
        let err = provider
            .zeta(&at(1.0, 0.0, &ctx), DerivativeOrder::Zeta, &ctx)
            .expect_err("pole should be rejected");
        assert!(matches!(err, ProviderError::AtPole));
    }

    #[test]
    fn constructor_rejects_uncovered_tail_lengths() {
        assert!(EulerMaclaurinZeta::new(0).is_err());
        assert!(EulerMaclaurinZeta::new(13).is_err());
        assert!(EulerMaclaurinZeta::new(8).is_ok());
    }
}
