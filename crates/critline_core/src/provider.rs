use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::ball::ComplexBall;
use crate::precision::PrecisionCtx;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DerivativeOrder {
    Zeta,
    First,
    Second,
}

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("zeta evaluation undefined at the pole s = 1")]
    AtPole,
    #[error("evaluation outside the provider's domain: {0}")]
    OutOfDomain(String),
}

/// Capability interface every zeta backend must satisfy in full: evaluate
/// ζ, ζ′ and ζ″ at a complex ball, at the working precision carried by `ctx`.
/// There are no optional orders and no fallback paths; whether a backend is
/// usable is decided at integration time, not per call.
pub trait ZetaProvider {
    fn zeta(
        &self,
        s: &ComplexBall,
        order: DerivativeOrder,
        ctx: &PrecisionCtx,
    ) -> Result<ComplexBall, ProviderError>;
}
