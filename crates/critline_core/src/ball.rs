use std::fmt;
use std::ops::{Add, Div, Mul, Neg, Sub};

use num_complex::Complex;
use rug::float::Special;
use rug::Float;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::precision::PrecisionCtx;

#[derive(Debug, Error)]
pub enum BallError {
    #[error("invalid decimal literal \"{0}\"")]
    InvalidLiteral(String),
}

/// Input shapes accepted where a real ball is expected. Each kind has one
/// defined lifting behavior: decimal text is rounded once at the working
/// precision, an `f64` is taken as exact (every `f64` is representable), and
/// an existing ball passes through untouched.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum BallLiteral {
    Text(String),
    Scalar(f64),
    #[serde(skip)]
    Ball(RealBall),
}

impl From<&str> for BallLiteral {
    fn from(value: &str) -> Self {
        Self::Text(value.to_owned())
    }
}

impl From<f64> for BallLiteral {
    fn from(value: f64) -> Self {
        Self::Scalar(value)
    }
}

impl From<RealBall> for BallLiteral {
    fn from(value: RealBall) -> Self {
        Self::Ball(value)
    }
}

/// A real value known to lie within `rad` of `mid`. The radius is a sound
/// bound, not an estimate: every operation widens it by the propagated input
/// radii plus a rounding slack covering the midpoint arithmetic.
#[derive(Debug, Clone)]
pub struct RealBall {
    mid: Float,
    rad: Float,
}

fn prec2(a: &RealBall, b: &RealBall) -> u32 {
    a.mid.prec().max(b.mid.prec())
}

impl RealBall {
    /// Builds a ball from explicit midpoint and radius. A negative radius is
    /// clamped to zero.
    pub fn new(mid: Float, mut rad: Float) -> Self {
        if rad < 0 {
            rad = Float::with_val(rad.prec(), 0);
        }
        Self { mid, rad }
    }

    /// Builds a ball whose radius additionally covers one ulp of the midpoint
    /// and the drift of radius arithmetic itself. All arithmetic funnels
    /// through here.
    fn carrying(mid: Float, mut rad: Float) -> Self {
        if mid.is_finite() && !mid.is_zero() {
            let mut slack = mid.clone().abs();
            slack >>= mid.prec().saturating_sub(1);
            rad += slack;
        }
        if rad.is_finite() && !rad.is_zero() {
            let drift = rad.clone() >> 30u32;
            rad += drift;
        }
        Self::new(mid, rad)
    }

    pub fn lift(literal: &BallLiteral, ctx: &PrecisionCtx) -> Result<Self, BallError> {
        let p = ctx.float_prec();
        match literal {
            BallLiteral::Text(text) => {
                let parsed = Float::parse(text.as_str())
                    .map_err(|_| BallError::InvalidLiteral(text.clone()))?;
                let mid = Float::with_val(p, parsed);
                Ok(Self::carrying(mid, Float::with_val(p, 0)))
            }
            BallLiteral::Scalar(value) => Ok(Self::exact_f64(*value, ctx)),
            BallLiteral::Ball(ball) => Ok(ball.clone()),
        }
    }

    pub fn exact_f64(value: f64, ctx: &PrecisionCtx) -> Self {
        let p = ctx.float_prec();
        Self {
            mid: Float::with_val(p, value),
            rad: Float::with_val(p, 0),
        }
    }

    pub fn exact_u64(value: u64, ctx: &PrecisionCtx) -> Self {
        let p = ctx.float_prec();
        Self {
            mid: Float::with_val(p, value),
            rad: Float::with_val(p, 0),
        }
    }

    pub fn zero(ctx: &PrecisionCtx) -> Self {
        Self::exact_f64(0.0, ctx)
    }

    pub fn mid(&self) -> &Float {
        &self.mid
    }

    pub fn rad(&self) -> &Float {
        &self.rad
    }

    pub fn mid_f64(&self) -> f64 {
        self.mid.to_f64()
    }

    pub fn rad_f64(&self) -> f64 {
        self.rad.to_f64()
    }

    /// True when the enclosure cannot exclude zero (`rad >= |mid|`).
    pub fn contains_zero(&self) -> bool {
        self.rad >= self.mid.clone().abs()
    }

    /// Sound enclosure of |x|: the range of the absolute value over the
    /// interval, re-centered.
    pub fn abs(&self) -> Self {
        let p = self.mid.prec();
        let ma = self.mid.clone().abs();
        let mut hi = ma.clone();
        hi += &self.rad;
        let mut lo = ma;
        lo -= &self.rad;
        if lo < 0 {
            lo = Float::with_val(p, 0);
        }
        let mut mid = Float::with_val(p, &hi + &lo);
        mid >>= 1u32;
        let mut rad = Float::with_val(p, &hi - &lo);
        rad >>= 1u32;
        Self::carrying(mid, rad)
    }

    /// Square root over the nonnegative part of the enclosure, by monotone
    /// endpoints.
    pub fn sqrt(&self) -> Self {
        let p = self.mid.prec();
        let mut hi = self.mid.clone();
        hi += &self.rad;
        let mut lo = self.mid.clone();
        lo -= &self.rad;
        if lo < 0 {
            lo = Float::with_val(p, 0);
        }
        if hi < 0 {
            hi = Float::with_val(p, 0);
        }
        let shi = hi.sqrt();
        let slo = lo.sqrt();
        let mut mid = Float::with_val(p, &shi + &slo);
        mid >>= 1u32;
        let mut rad = Float::with_val(p, &shi - &slo);
        rad >>= 1u32;
        Self::carrying(mid, rad)
    }

    /// Natural logarithm by monotone endpoints. An enclosure reaching into
    /// the nonpositive reals yields an infinite radius.
    pub fn ln(&self) -> Self {
        let p = self.mid.prec();
        let mut lo = self.mid.clone();
        lo -= &self.rad;
        if lo <= 0 {
            return Self {
                mid: Float::with_val(p, 0),
                rad: Float::with_val(p, Special::Infinity),
            };
        }
        let mut hi = self.mid.clone();
        hi += &self.rad;
        let lhi = hi.ln();
        let llo = lo.ln();
        let mut mid = Float::with_val(p, &lhi + &llo);
        mid >>= 1u32;
        let mut rad = Float::with_val(p, &lhi - &llo);
        rad >>= 1u32;
        Self::carrying(mid, rad)
    }

    /// Exponential by monotone endpoints.
    pub fn exp(&self) -> Self {
        let p = self.mid.prec();
        let mut hi = self.mid.clone();
        hi += &self.rad;
        let mut lo = self.mid.clone();
        lo -= &self.rad;
        let ehi = hi.exp();
        let elo = lo.exp();
        let mut mid = Float::with_val(p, &ehi + &elo);
        mid >>= 1u32;
        let mut rad = Float::with_val(p, &ehi - &elo);
        rad >>= 1u32;
        Self::carrying(mid, rad)
    }

    /// Sine; the radius carries through unchanged since |sin'| <= 1.
    pub fn sin(&self) -> Self {
        Self::carrying(self.mid.clone().sin(), self.rad.clone())
    }

    /// Cosine; the radius carries through unchanged since |cos'| <= 1.
    pub fn cos(&self) -> Self {
        Self::carrying(self.mid.clone().cos(), self.rad.clone())
    }

    /// Multiplication by an exact scalar.
    pub fn scale_f64(&self, k: f64) -> Self {
        let mut mid = self.mid.clone();
        mid *= k;
        let mut rad = self.rad.clone();
        rad *= k.abs();
        Self::carrying(mid, rad)
    }

    /// Widens the radius by an explicit error bound.
    pub fn add_error_f64(&mut self, extra: f64) {
        if extra > 0.0 {
            self.rad += extra;
        }
    }
}

impl Add for &RealBall {
    type Output = RealBall;

    fn add(self, rhs: Self) -> RealBall {
        let p = prec2(self, rhs);
        let mid = Float::with_val(p, &self.mid + &rhs.mid);
        let rad = Float::with_val(p, &self.rad + &rhs.rad);
        RealBall::carrying(mid, rad)
    }
}

impl Sub for &RealBall {
    type Output = RealBall;

    fn sub(self, rhs: Self) -> RealBall {
        let p = prec2(self, rhs);
        let mid = Float::with_val(p, &self.mid - &rhs.mid);
        let rad = Float::with_val(p, &self.rad + &rhs.rad);
        RealBall::carrying(mid, rad)
    }
}

impl Mul for &RealBall {
    type Output = RealBall;

    fn mul(self, rhs: Self) -> RealBall {
        let p = prec2(self, rhs);
        let mid = Float::with_val(p, &self.mid * &rhs.mid);
        // |a|·rb + |b|·ra + ra·rb
        let mut rad = Float::with_val(p, &self.mid * &rhs.rad);
        rad.abs_mut();
        let mut cross = Float::with_val(p, &rhs.mid * &self.rad);
        cross.abs_mut();
        rad += cross;
        let tail = Float::with_val(p, &self.rad * &rhs.rad);
        rad += tail;
        RealBall::carrying(mid, rad)
    }
}

impl Div for &RealBall {
    type Output = RealBall;

    fn div(self, rhs: Self) -> RealBall {
        let p = prec2(self, rhs);
        let mid = Float::with_val(p, &self.mid / &rhs.mid);
        if rhs.contains_zero() {
            // The denominator cannot be bounded away from zero.
            return RealBall::new(mid, Float::with_val(p, Special::Infinity));
        }
        // |x/y - ma/mb| <= (|mb|·ra + |ma|·rb) / (|mb|·(|mb| - rb))
        let bm = rhs.mid.clone().abs();
        let mut num = self.mid.clone().abs();
        num *= &rhs.rad;
        let mut num2 = bm.clone();
        num2 *= &self.rad;
        num += num2;
        let mut den = bm.clone();
        den -= &rhs.rad;
        den *= &bm;
        let rad = num / den;
        RealBall::carrying(mid, rad)
    }
}

impl Neg for &RealBall {
    type Output = RealBall;

    fn neg(self) -> RealBall {
        RealBall {
            mid: -self.mid.clone(),
            rad: self.rad.clone(),
        }
    }
}

impl fmt::Display for RealBall {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{} +/- {:.3e}]",
            self.mid.to_string_radix(10, Some(30)),
            self.rad.to_f64()
        )
    }
}

/// A complex value enclosed component-wise: the true value's real and
/// imaginary parts each lie within the respective component ball.
#[derive(Debug, Clone)]
pub struct ComplexBall {
    re: RealBall,
    im: RealBall,
}

impl ComplexBall {
    pub fn new(re: RealBall, im: RealBall) -> Self {
        Self { re, im }
    }

    pub fn exact_f64(re: f64, im: f64, ctx: &PrecisionCtx) -> Self {
        Self {
            re: RealBall::exact_f64(re, ctx),
            im: RealBall::exact_f64(im, ctx),
        }
    }

    pub fn zero(ctx: &PrecisionCtx) -> Self {
        Self::exact_f64(0.0, 0.0, ctx)
    }

    pub fn one(ctx: &PrecisionCtx) -> Self {
        Self::exact_f64(1.0, 0.0, ctx)
    }

    pub fn re(&self) -> &RealBall {
        &self.re
    }

    pub fn im(&self) -> &RealBall {
        &self.im
    }

    pub fn mid_complex(&self) -> Complex<f64> {
        Complex::new(self.re.mid_f64(), self.im.mid_f64())
    }

    /// Sound enclosure of the magnitude |z| = sqrt(re² + im²).
    pub fn abs(&self) -> RealBall {
        let rr = self.re.abs();
        let ii = self.im.abs();
        let sum = &(&rr * &rr) + &(&ii * &ii);
        sum.sqrt()
    }

    /// Multiplication by the imaginary unit.
    pub fn mul_i(&self) -> Self {
        Self {
            re: (-&self.im),
            im: self.re.clone(),
        }
    }

    /// Complex exponential, exp(x + iy) = e^x (cos y + i sin y).
    pub fn exp(&self) -> Self {
        let ex = self.re.exp();
        let c = self.im.cos();
        let s = self.im.sin();
        Self {
            re: &ex * &c,
            im: &ex * &s,
        }
    }

    /// Multiplication by a real ball, applied to both components.
    pub fn scale_real(&self, k: &RealBall) -> Self {
        Self {
            re: &self.re * k,
            im: &self.im * k,
        }
    }

    pub fn scale_f64(&self, k: f64) -> Self {
        Self {
            re: self.re.scale_f64(k),
            im: self.im.scale_f64(k),
        }
    }

    /// Adds an exact scalar to the real component.
    pub fn add_scalar(&self, a: f64) -> Self {
        let p = self.re.mid().prec();
        let shifted = RealBall {
            mid: Float::with_val(p, a),
            rad: Float::with_val(p, 0),
        };
        Self {
            re: &self.re + &shifted,
            im: self.im.clone(),
        }
    }

    /// Widens both component radii by an explicit error bound, covering any
    /// complex perturbation of magnitude `extra`.
    pub fn add_error_f64(&mut self, extra: f64) {
        self.re.add_error_f64(extra);
        self.im.add_error_f64(extra);
    }
}

impl Add for &ComplexBall {
    type Output = ComplexBall;

    fn add(self, rhs: Self) -> ComplexBall {
        ComplexBall {
            re: &self.re + &rhs.re,
            im: &self.im + &rhs.im,
        }
    }
}

impl Sub for &ComplexBall {
    type Output = ComplexBall;

    fn sub(self, rhs: Self) -> ComplexBall {
        ComplexBall {
            re: &self.re - &rhs.re,
            im: &self.im - &rhs.im,
        }
    }
}

impl Mul for &ComplexBall {
    type Output = ComplexBall;

    fn mul(self, rhs: Self) -> ComplexBall {
        let re = &(&self.re * &rhs.re) - &(&self.im * &rhs.im);
        let im = &(&self.re * &rhs.im) + &(&self.im * &rhs.re);
        ComplexBall { re, im }
    }
}

impl Div for &ComplexBall {
    type Output = ComplexBall;

    fn div(self, rhs: Self) -> ComplexBall {
        // z/w = z·conj(w) / |w|²; the real division guards denominators whose
        // enclosure reaches zero.
        let d = &(&rhs.re * &rhs.re) + &(&rhs.im * &rhs.im);
        let nr = &(&self.re * &rhs.re) + &(&self.im * &rhs.im);
        let ni = &(&self.im * &rhs.re) - &(&self.re * &rhs.im);
        ComplexBall {
            re: &nr / &d,
            im: &ni / &d,
        }
    }
}

impl Neg for &ComplexBall {
    type Output = ComplexBall;

    fn neg(self) -> ComplexBall {
        ComplexBall {
            re: -&self.re,
            im: -&self.im,
        }
    }
}

impl fmt::Display for ComplexBall {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} + {}i", self.re, self.im)
    }
}

#[cfg(test)]
mod tests {
    use super::{BallLiteral, ComplexBall, RealBall};
    use crate::precision::PrecisionCtx;
    use rug::Float;

    fn ctx() -> PrecisionCtx {
        PrecisionCtx::from_bits(128).unwrap()
    }

    fn ball(mid: f64, rad: f64) -> RealBall {
        RealBall::new(Float::with_val(128, mid), Float::with_val(128, rad))
    }

    #[test]
    fn lift_handles_each_literal_kind() {
        let ctx = ctx();
        let text = RealBall::lift(&"14.134725141734693790".into(), &ctx).unwrap();
        assert!((text.mid_f64() - 14.134725141734694).abs() < 1e-12);
        assert!(text.rad_f64() < 1e-30);

        let scalar = RealBall::lift(&0.5f64.into(), &ctx).unwrap();
        assert_eq!(scalar.mid_f64(), 0.5);
        assert_eq!(scalar.rad_f64(), 0.0);

        let passthrough = RealBall::lift(&BallLiteral::Ball(ball(1.0, 0.25)), &ctx).unwrap();
        assert_eq!(passthrough.rad_f64(), 0.25);
    }

    #[test]
    fn lift_rejects_garbage_text() {
        let err = RealBall::lift(&"not a number".into(), &ctx()).expect_err("should fail");
        assert!(format!("{err}").contains("invalid decimal literal"));
    }

    #[test]
    fn arithmetic_propagates_radii_soundly() {
        let a = ball(2.0, 0.1);
        let b = ball(3.0, 0.2);

        let sum = &a + &b;
        assert!((sum.mid_f64() - 5.0).abs() < 1e-20);
        assert!(sum.rad_f64() >= 0.3);

        // 2·0.2 + 3·0.1 + 0.1·0.2 = 0.72
        let prod = &a * &b;
        assert!((prod.mid_f64() - 6.0).abs() < 1e-20);
        assert!(prod.rad_f64() >= 0.72);
        assert!(prod.rad_f64() < 0.73);
    }

    #[test]
    fn division_by_zero_straddling_ball_is_unbounded() {
        let a = ball(1.0, 0.0);
        let b = ball(0.5, 0.5);
        let q = &a / &b;
        assert!(q.rad().is_infinite());
    }

    #[test]
    fn abs_of_straddling_ball_clamps_at_zero() {
        let a = ball(0.5, 2.0);
        let m = a.abs();
        // |x| over [-1.5, 2.5] is [0, 2.5]
        assert!((m.mid_f64() - 1.25).abs() < 1e-12);
        assert!((m.rad_f64() - 1.25).abs() < 1e-6);
    }

    #[test]
    fn complex_magnitude_matches_hypotenuse() {
        let ctx = ctx();
        let z = ComplexBall::exact_f64(3.0, 4.0, &ctx);
        let m = z.abs();
        assert!((m.mid_f64() - 5.0).abs() < 1e-20);
        assert!(m.rad_f64() < 1e-20);
    }

    #[test]
    fn complex_division_inverts_multiplication() {
        let ctx = ctx();
        let z = ComplexBall::exact_f64(1.0, 2.0, &ctx);
        let w = ComplexBall::exact_f64(3.0, -1.0, &ctx);
        let back = &(&z * &w) / &w;
        assert!((back.re().mid_f64() - 1.0).abs() < 1e-20);
        assert!((back.im().mid_f64() - 2.0).abs() < 1e-20);
    }

    #[test]
    fn complex_exp_of_pure_imaginary_lands_on_unit_circle() {
        let ctx = ctx();
        let z = ComplexBall::exact_f64(0.0, std::f64::consts::FRAC_PI_2, &ctx);
        let e = z.exp();
        assert!(e.re().mid_f64().abs() < 1e-15);
        assert!((e.im().mid_f64() - 1.0).abs() < 1e-15);
    }
}
