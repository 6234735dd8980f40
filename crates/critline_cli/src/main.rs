use anyhow::Result;
use clap::Parser;
use tracing::debug;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use critline_core::ball::BallLiteral;
use critline_core::enclosure;
use critline_core::euler_maclaurin::EulerMaclaurinZeta;
use critline_core::refine::{validate_zero, ValidationRequest};

/// Validate a candidate zeta zero at σ + it and refine t if needed.
#[derive(Parser)]
#[command(name = "critline", version)]
struct Cli {
    /// Real part of the evaluation point.
    sigma: f64,

    /// Imaginary part, as a decimal literal (kept at full precision).
    t: String,

    /// Working precision in bits.
    #[arg(long = "prec", default_value_t = 256)]
    prec: u32,

    /// Maximum number of Newton/Halley iterations.
    #[arg(long = "iters", default_value_t = 3)]
    iters: usize,

    /// Magnitude threshold under which the point counts as a zero.
    #[arg(long = "thr", default_value_t = 1e-10)]
    thr: f64,

    /// Disable the Halley correction and use plain Newton steps.
    #[arg(long = "no-halley")]
    no_halley: bool,
}

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    let request = ValidationRequest {
        sigma: cli.sigma,
        t: BallLiteral::Text(cli.t.clone()),
        precision_bits: cli.prec,
        zero_threshold: cli.thr,
        max_newton_iterations: cli.iters,
        use_halley: !cli.no_halley,
    };

    debug!(
        sigma = cli.sigma,
        t = %cli.t,
        prec = cli.prec,
        iters = cli.iters,
        thr = cli.thr,
        halley = !cli.no_halley,
        "validating candidate zero"
    );

    let provider = EulerMaclaurinZeta::default();
    let result = validate_zero(&provider, &request)?;

    println!("s = {} + {} i", cli.sigma, cli.t);
    println!("zeta(s)     = {}", result.zeta_at_input);
    println!(
        "|zeta(s)|_UB <= {:e}",
        enclosure::upper_bound(&result.zeta_at_input.abs())
    );

    if let Some(final_zeta) = &result.final_zeta {
        println!("refined t   = {}", result.refined_t);
        println!("zeta(final) = {final_zeta}");
        println!("|zeta|_UB   = {:e}", result.final_upper_bound);
        if let Some(lb) = result.derivative_lower_bound {
            println!("|zeta'|_LB  = {lb:e}");
        }
    }

    if result.zero_likely {
        println!("zero_likely = true ({} iterations)", result.iterations);
    } else {
        println!("zero_likely = false ({} iterations)", result.iterations);
    }

    Ok(())
}
