//! The `critline_core` crate validates candidate zeros of the Riemann zeta
//! function on a vertical line using ball (enclosure) arithmetic: every value
//! carries an explicit error radius, and every decision is justified by it.
//!
//! Key components:
//! - **Ball**: real/complex enclosures over arbitrary-precision floats.
//! - **Precision**: the working-precision context threaded through a run.
//! - **Enclosure**: the small/degenerate classification policy.
//! - **Provider**: the ζ/ζ′/ζ″ capability interface, with a built-in
//!   Euler-Maclaurin backend.
//! - **Refine**: Newton/Halley refinement along σ = const with step capping
//!   and a backtracking line search on the certified upper bound.

pub mod ball;
pub mod enclosure;
pub mod euler_maclaurin;
pub mod precision;
pub mod provider;
pub mod refine;
pub mod spacing;
