//! Prices a European option and recovers its implied volatility.
//!
//! The scenario comes from built-in defaults (S = K = 105, r = 1%, 30 days,
//! σ = 30%), optionally replaced by a JSON file, then overridden field by
//! field from the command line:
//!
//! ```text
//! implied_vol_cli --model arithmetic --side put --guess 0.2 --trace
//! implied_vol_cli --scenario scenario.json --log-level debug
//! ```

use clap::{Parser, ValueEnum};
use impliedvol_rs::prelude::*;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ModelArg {
    LogNormal,
    Arithmetic,
}

impl From<ModelArg> for PricingModel {
    fn from(arg: ModelArg) -> Self {
        match arg {
            ModelArg::LogNormal => PricingModel::LogNormal,
            ModelArg::Arithmetic => PricingModel::Arithmetic,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum SideArg {
    Call,
    Put,
}

impl From<SideArg> for OptionType {
    fn from(arg: SideArg) -> Self {
        match arg {
            SideArg::Call => OptionType::Call,
            SideArg::Put => OptionType::Put,
        }
    }
}

/// Implied volatility round trip: price at a known volatility, then solve back
#[derive(Parser, Debug)]
#[command(name = "implied_vol_cli")]
#[command(version, about, long_about = None)]
struct Args {
    /// Scenario file (JSON). Missing fields take the built-in defaults
    #[arg(short, long, value_name = "FILE")]
    scenario: Option<PathBuf>,

    /// Solver configuration file (JSON), replacing the scenario's `solver`
    #[arg(long, value_name = "FILE")]
    solver_config: Option<PathBuf>,

    /// Spot price of the underlying
    #[arg(long)]
    spot: Option<f64>,

    /// Strike price
    #[arg(long)]
    strike: Option<f64>,

    /// Continuously compounded risk-free rate
    #[arg(long)]
    rate: Option<f64>,

    /// Calendar days to expiry
    #[arg(long)]
    days: Option<f64>,

    /// Day count used to annualize `days`
    #[arg(long)]
    days_per_year: Option<f64>,

    /// Volatility used to produce the quote, as a fraction of spot
    #[arg(long)]
    vol: Option<f64>,

    /// Initial guess as a fraction of spot; omitted uses the quote heuristic
    #[arg(long)]
    guess: Option<f64>,

    /// Pricing model
    #[arg(long, value_enum)]
    model: Option<ModelArg>,

    /// Option side
    #[arg(long, value_enum)]
    side: Option<SideArg>,

    /// Solver iteration cap
    #[arg(long)]
    max_iterations: Option<u32>,

    /// Solver tolerance
    #[arg(long)]
    tolerance: Option<f64>,

    /// Print every Newton iteration
    #[arg(long)]
    trace: bool,

    /// Print the result as JSON instead of log lines
    #[arg(long)]
    json: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "IMPLIED_VOL_LOG_LEVEL", default_value = "info")]
    log_level: String,
}

/// Inputs of one round trip.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
struct Scenario {
    spot: f64,
    strike: f64,
    rate: f64,
    days_to_expiry: f64,
    days_per_year: f64,
    volatility: f64,
    initial_guess: Option<f64>,
    model: PricingModel,
    side: OptionType,
    solver: SolverConfig,
}

impl Default for Scenario {
    fn default() -> Self {
        Self {
            spot: 105.0,
            strike: 105.0,
            rate: 0.01,
            days_to_expiry: 30.0,
            days_per_year: 365.0,
            volatility: 0.30,
            initial_guess: None,
            model: PricingModel::Arithmetic,
            side: OptionType::Call,
            solver: SolverConfig::default(),
        }
    }
}

impl Scenario {
    fn load(path: Option<&PathBuf>) -> Result<Self, Box<dyn std::error::Error>> {
        match path {
            Some(path) => {
                let raw = std::fs::read_to_string(path)?;
                Ok(serde_json::from_str(&raw)?)
            }
            None => Ok(Self::default()),
        }
    }

    fn apply(mut self, args: &Args) -> Self {
        self.spot = args.spot.unwrap_or(self.spot);
        self.strike = args.strike.unwrap_or(self.strike);
        self.rate = args.rate.unwrap_or(self.rate);
        self.days_to_expiry = args.days.unwrap_or(self.days_to_expiry);
        self.days_per_year = args.days_per_year.unwrap_or(self.days_per_year);
        self.volatility = args.vol.unwrap_or(self.volatility);
        self.initial_guess = args.guess.or(self.initial_guess);
        self.model = args.model.map(PricingModel::from).unwrap_or(self.model);
        self.side = args.side.map(OptionType::from).unwrap_or(self.side);
        if let Some(max_iterations) = args.max_iterations {
            self.solver.max_iterations = max_iterations;
        }
        if let Some(tolerance) = args.tolerance {
            self.solver.tolerance = tolerance;
        }
        self.solver.trace |= args.trace;
        self
    }

    fn market(&self) -> MarketParams {
        MarketParams::new(
            self.spot,
            self.strike,
            self.days_to_expiry / self.days_per_year,
            self.rate,
        )
    }

    /// Volatility expressed in the model's units.
    fn model_units(&self, fraction: f64) -> f64 {
        match self.model {
            PricingModel::LogNormal => fraction,
            PricingModel::Arithmetic => fraction * self.spot,
        }
    }
}

#[derive(Debug, Serialize)]
struct Report {
    scenario: Scenario,
    quote: f64,
    initial_guess: f64,
    result: IVResult,
}

fn init_tracing(log_level: &str) {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level)),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    init_tracing(&args.log_level);

    let mut scenario = Scenario::load(args.scenario.as_ref())?;
    if let Some(path) = args.solver_config.as_ref() {
        scenario.solver = SolverConfig::from_json(&std::fs::read_to_string(path)?)?;
    }
    let scenario = scenario.apply(&args);
    scenario.solver.validate()?;
    let params = scenario.market();

    let calculator = ImpliedVolatility::new(scenario.model, scenario.side, scenario.solver.clone());
    let quote = calculator
        .engine()
        .price(&params, scenario.model_units(scenario.volatility));
    let guess = match scenario.initial_guess {
        Some(fraction) => scenario.model_units(fraction),
        None => calculator.initial_guess(&params, quote),
    };

    info!(
        model = ?scenario.model,
        side = ?scenario.side,
        spot = scenario.spot,
        strike = scenario.strike,
        time = params.time_to_expiry,
        rate = scenario.rate,
        "scenario loaded"
    );
    info!(quote, guess, "priced at volatility {}", scenario.model_units(scenario.volatility));

    let mut result = calculator.solve(&params, quote, guess)?;
    if !result.is_converged() {
        warn!(
            iterations = result.iterations,
            epsilon = result.epsilon,
            "solver aborted before reaching the tolerance"
        );
    }

    if args.json {
        let report = Report {
            scenario,
            quote,
            initial_guess: guess,
            result,
        };
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        for (iteration, entry) in result.trace.take().into_iter().flatten().enumerate() {
            info!(
                iteration = iteration + 1,
                residual = entry.residual,
                vega = entry.derivative,
                "newton step"
            );
        }
        info!(
            iv = result.iv,
            iterations = result.iterations,
            epsilon = result.epsilon,
            residual = result.residual,
            vega = result.vega,
            status = ?result.status,
            "implied volatility"
        );
    }

    Ok(())
}
