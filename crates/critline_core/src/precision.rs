use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};

/// Number of guard digits added on top of the requested binary precision.
const GUARD_DIGITS: u32 = 20;

/// Working-precision context threaded through every ball construction and
/// provider call. Escalation is monotonic: digits only ever increase within
/// the lifetime of one context, so a validation run can tighten enclosures
/// mid-flight without leaking precision state between unrelated runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrecisionCtx {
    decimal_digits: u32,
}

impl PrecisionCtx {
    /// Converts a requested binary precision into a decimal working
    /// precision: `ceil(bits * log10(2)) + 20`.
    pub fn from_bits(bits: u32) -> Result<Self> {
        if bits < 1 {
            bail!("precision bits must be at least 1.");
        }
        let digits = (bits as f64 * std::f64::consts::LOG10_2).ceil() as u32 + GUARD_DIGITS;
        Ok(Self {
            decimal_digits: digits,
        })
    }

    pub fn decimal_digits(&self) -> u32 {
        self.decimal_digits
    }

    /// Binary precision handed to the floating-point backend, sized so the
    /// decimal working precision is representable.
    pub fn float_prec(&self) -> u32 {
        (self.decimal_digits as f64 * std::f64::consts::LOG2_10).ceil() as u32
    }

    /// Increases the decimal working precision. Never decreases it.
    pub fn escalate(&mut self, extra_digits: u32) {
        self.decimal_digits += extra_digits;
    }
}

#[cfg(test)]
mod tests {
    use super::PrecisionCtx;

    #[test]
    fn decimal_digits_match_guarded_formula() {
        // ceil(bits * log10(2)) + 20
        let cases = [(1u32, 21u32), (8, 23), (64, 40), (256, 98), (1000, 322)];
        for (bits, expected) in cases {
            let ctx = PrecisionCtx::from_bits(bits).expect("valid bits");
            assert_eq!(ctx.decimal_digits(), expected, "bits = {bits}");
        }
    }

    #[test]
    fn rejects_zero_bits() {
        let err = PrecisionCtx::from_bits(0).expect_err("zero bits should fail");
        assert!(format!("{err}").contains("precision bits"));
    }

    #[test]
    fn escalation_is_monotonic() {
        let mut ctx = PrecisionCtx::from_bits(256).unwrap();
        let before = ctx.decimal_digits();
        ctx.escalate(10);
        assert_eq!(ctx.decimal_digits(), before + 10);
        ctx.escalate(0);
        assert_eq!(ctx.decimal_digits(), before + 10);
    }

    #[test]
    fn float_prec_covers_decimal_digits() {
        let ctx = PrecisionCtx::from_bits(256).unwrap();
        // 98 decimal digits need ceil(98 * log2(10)) = 326 bits.
        assert_eq!(ctx.float_prec(), 326);
    }
}
