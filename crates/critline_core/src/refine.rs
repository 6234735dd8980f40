//! Validation and refinement of a candidate zeta zero on a vertical line.
//!
//! Given σ and an approximate ordinate t, the refiner proves (to an explicit
//! error bound) whether |ζ(σ+it)| is below a threshold, and otherwise walks t
//! with Newton/Halley steps constrained to the line, each step capped by the
//! local zero-spacing estimate and accepted only when it provably lowers the
//! certified upper bound on |ζ|.

use anyhow::{bail, Result};
use num_complex::Complex;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::ball::{BallLiteral, ComplexBall, RealBall};
use crate::enclosure;
use crate::precision::PrecisionCtx;
use crate::provider::{DerivativeOrder, ZetaProvider};
use crate::spacing;

/// Magnitude below which the Halley denominator is treated as degenerate and
/// the plain Newton increment is kept.
const HALLEY_DENOM_FLOOR: f64 = 1e-40;

/// Fixed fallback decrement applied to t when no justified step exists.
const NUDGE: &str = "1e-12";

/// Fraction of the local spacing estimate a single step may cover.
const STEP_CAP_FRACTION: f64 = 0.3;

/// Maximum halvings tried by the backtracking line search.
const BACKTRACK_HALVINGS: usize = 5;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationRequest {
    pub sigma: f64,
    pub t: BallLiteral,
    pub precision_bits: u32,
    pub zero_threshold: f64,
    pub max_newton_iterations: usize,
    pub use_halley: bool,
}

impl Default for ValidationRequest {
    fn default() -> Self {
        Self {
            sigma: 0.5,
            t: BallLiteral::Scalar(0.0),
            precision_bits: 256,
            zero_threshold: 1e-10,
            max_newton_iterations: 6,
            use_halley: true,
        }
    }
}

/// Outcome of one validation call. `zeta_at_input` is always the value at the
/// original input point, even when refinement moved t afterwards; the refined
/// view lives in `final_zeta`/`final_upper_bound`.
#[derive(Debug, Clone)]
pub struct ValidationResult {
    pub zeta_at_input: ComplexBall,
    pub zero_likely: bool,
    pub refined_t: RealBall,
    /// Present only when the refinement loop ran.
    pub final_zeta: Option<ComplexBall>,
    pub final_upper_bound: f64,
    /// Sound lower bound on |ζ′| at the final point; a nonzero value hints
    /// the zero is simple. Present only when the refinement loop ran.
    pub derivative_lower_bound: Option<f64>,
    pub iterations: usize,
    /// Decimal working precision at the end of the run (monotonically
    /// escalated, never lowered).
    pub decimal_digits: u32,
}

impl ValidationResult {
    pub fn summary(&self, sigma: f64) -> ValidationSummary {
        ValidationSummary {
            sigma,
            zero_likely: self.zero_likely,
            refined_t: self.refined_t.mid_f64(),
            zeta_at_input: self.zeta_at_input.mid_complex(),
            final_zeta: self.final_zeta.as_ref().map(ComplexBall::mid_complex),
            upper_bound: self.final_upper_bound,
            derivative_lower_bound: self.derivative_lower_bound,
            iterations: self.iterations,
            decimal_digits: self.decimal_digits,
        }
    }
}

/// Plain-scalar view of a [`ValidationResult`] for reporting.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationSummary {
    pub sigma: f64,
    pub zero_likely: bool,
    pub refined_t: f64,
    pub zeta_at_input: Complex<f64>,
    pub final_zeta: Option<Complex<f64>>,
    pub upper_bound: f64,
    pub derivative_lower_bound: Option<f64>,
    pub iterations: usize,
    pub decimal_digits: u32,
}

/// Validates ζ(σ + it) and, when the initial enclosure is not provably
/// small, refines t along the vertical line.
pub fn validate_zero<P: ZetaProvider>(
    provider: &P,
    request: &ValidationRequest,
) -> Result<ValidationResult> {
    if request.zero_threshold <= 0.0 {
        bail!("zero_threshold must be positive.");
    }
    let mut ctx = PrecisionCtx::from_bits(request.precision_bits)?;

    let sigma = RealBall::exact_f64(request.sigma, &ctx);
    let t0 = RealBall::lift(&request.t, &ctx)?;
    let s0 = ComplexBall::new(sigma.clone(), t0.clone());

    let zeta_at_input = provider.zeta(&s0, DerivativeOrder::Zeta, &ctx)?;
    let a0 = zeta_at_input.abs();
    let mut zero_likely = enclosure::is_small(&a0, request.zero_threshold);
    let mut final_upper_bound = enclosure::upper_bound(&a0);
    debug!(
        upper_bound = final_upper_bound,
        zero_likely, "initial enclosure"
    );

    let mut refined_t = t0;
    let mut iterations = 0usize;
    let mut final_zeta = None;
    let mut derivative_lower_bound = None;

    if !zero_likely {
        for iteration in 0..request.max_newton_iterations {
            let s = ComplexBall::new(sigma.clone(), refined_t.clone());
            let mut z0 = provider.zeta(&s, DerivativeOrder::Zeta, &ctx)?;
            let mut z1 = provider.zeta(&s, DerivativeOrder::First, &ctx)?;
            let a = z0.abs();

            if enclosure::is_small(&a, request.zero_threshold) {
                debug!(iteration, "enclosure classified small before stepping");
                zero_likely = true;
                break;
            }
            iterations = iteration + 1;

            // A Newton step is only justified if the derivative enclosure
            // excludes zero. Escalate precision once, then fall back to a
            // fixed nudge.
            if enclosure::lower_bound_nonneg(&z1.abs()) == 0.0 {
                ctx.escalate(10);
                debug!(
                    decimal_digits = ctx.decimal_digits(),
                    "derivative enclosure degenerate, precision escalated"
                );
                z0 = provider.zeta(&s, DerivativeOrder::Zeta, &ctx)?;
                z1 = provider.zeta(&s, DerivativeOrder::First, &ctx)?;
                if enclosure::lower_bound_nonneg(&z1.abs()) == 0.0 {
                    refined_t = &refined_t - &nudge(&ctx)?;
                    debug!(iteration, "derivative still degenerate, nudged t");
                    continue;
                }
            }

            // Newton increment along the vertical line: dt = Im(ζ/ζ′).
            let quotient = &z0 / &z1;
            let mut dt = quotient.im().clone();

            if request.use_halley {
                let z2 = provider.zeta(&s, DerivativeOrder::Second, &ctx)?;
                // In the line parameter t: F = ζ, F' = iζ′, F'' = -ζ″.
                let f = z0;
                let fp = z1.mul_i();
                let fpp = -&z2;
                let denom = &(&fp * &fp).scale_f64(2.0) - &(&f * &fpp);
                if !enclosure::is_small(&denom.abs(), HALLEY_DENOM_FLOOR) {
                    let halley = &(&f * &fp).scale_f64(2.0) / &denom;
                    dt = halley.re().clone();
                }
            }

            // Cap the step at a fraction of the expected zero spacing so a
            // single step cannot jump past an adjacent zero.
            let cap = STEP_CAP_FRACTION * spacing::estimate_spacing(refined_t.mid_f64()).max(1e-12);
            let dt_mid = dt.mid_f64();
            if dt_mid.abs() > cap {
                dt = dt.scale_f64(cap / dt_mid.abs());
            }

            // Backtracking line search on the certified upper bound.
            let old_upper = enclosure::upper_bound(&a);
            let mut trial_dt = dt;
            let mut accepted = false;
            for _ in 0..BACKTRACK_HALVINGS {
                let trial_t = &refined_t - &trial_dt;
                let trial_s = ComplexBall::new(sigma.clone(), trial_t.clone());
                let z_try = provider.zeta(&trial_s, DerivativeOrder::Zeta, &ctx)?;
                let trial_upper = enclosure::upper_bound(&z_try.abs());
                if trial_upper < old_upper {
                    debug!(iteration, trial_upper, old_upper, "step accepted");
                    refined_t = trial_t;
                    accepted = true;
                    break;
                }
                trial_dt = trial_dt.scale_f64(0.5);
            }
            if !accepted {
                refined_t = &refined_t - &nudge(&ctx)?;
                debug!(iteration, "no halving improved the bound, nudged t");
            }
        }

        // Final report at the refined point; the rigor decision is re-made
        // here regardless of how the loop exited.
        let s_final = ComplexBall::new(sigma.clone(), refined_t.clone());
        let z_final = provider.zeta(&s_final, DerivativeOrder::Zeta, &ctx)?;
        let z1_final = provider.zeta(&s_final, DerivativeOrder::First, &ctx)?;
        let a_final = z_final.abs();
        zero_likely = enclosure::is_small(&a_final, request.zero_threshold);
        final_upper_bound = enclosure::upper_bound(&a_final);
        derivative_lower_bound = Some(enclosure::lower_bound_nonneg(&z1_final.abs()));
        final_zeta = Some(z_final);
    }

    Ok(ValidationResult {
        zeta_at_input,
        zero_likely,
        refined_t,
        final_zeta,
        final_upper_bound,
        derivative_lower_bound,
        iterations,
        decimal_digits: ctx.decimal_digits(),
    })
}

fn nudge(ctx: &PrecisionCtx) -> Result<RealBall> {
    Ok(RealBall::lift(&BallLiteral::Text(NUDGE.to_owned()), ctx)?)
}
