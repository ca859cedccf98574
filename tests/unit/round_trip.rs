use approx::assert_abs_diff_eq;
use impliedvol_rs::prelude::*;
use proptest::prelude::*;

const SPOT: f64 = 105.0;
const DAYS_TO_EXPIRY: f64 = 30.0;
const DAYS_PER_YEAR: f64 = 365.0;
const RATE: f64 = 0.01;

fn reference_market() -> MarketParams {
    MarketParams::new(SPOT, SPOT, DAYS_TO_EXPIRY / DAYS_PER_YEAR, RATE)
}

fn tight() -> SolverConfig {
    SolverConfig::new().with_tolerance(1e-8)
}

#[test]
fn arithmetic_reference_scenario() {
    let params = reference_market();
    let calculator =
        ImpliedVolatility::new(PricingModel::Arithmetic, OptionType::Call, SolverConfig::default());

    let quote = calculator.engine().price(&params, 0.30 * SPOT);
    assert_abs_diff_eq!(quote, 3.6446, epsilon = 1e-3);

    let result = calculator.solve(&params, quote, 20.0).unwrap();
    assert!(result.is_converged());
    assert_abs_diff_eq!(result.iv, 31.5, epsilon = 0.05);
    assert!(result.residual.abs() < 1e-2);
}

#[test]
fn log_normal_reference_scenario() {
    let params = reference_market();
    let calculator =
        ImpliedVolatility::new(PricingModel::LogNormal, OptionType::Call, SolverConfig::default());

    let quote = calculator.engine().price(&params, 0.30);
    assert_abs_diff_eq!(quote, 3.6435, epsilon = 1e-3);

    let result = calculator.solve(&params, quote, 0.2).unwrap();
    assert!(result.is_converged());
    assert_abs_diff_eq!(result.iv, 0.30, epsilon = 1e-3);
    assert!(result.vega > 0.0);
}

#[test]
fn reference_scenario_converges_quickly_from_any_reasonable_guess() {
    let params = reference_market();
    let calculator = ImpliedVolatility::new(PricingModel::Arithmetic, OptionType::Put, tight());
    let quote = calculator.engine().price(&params, 31.5);

    for guess in [5.0, 20.0, 31.5, 60.0, 120.0] {
        let result = calculator.solve(&params, quote, guess).unwrap();
        assert!(result.is_converged(), "guess {guess} did not converge");
        assert!(result.iterations <= 20, "guess {guess} took {}", result.iterations);
        assert_abs_diff_eq!(result.iv, 31.5, epsilon = 1e-6);
    }
}

#[test]
fn solves_are_deterministic() {
    let params = reference_market();
    let calculator = ImpliedVolatility::new(PricingModel::LogNormal, OptionType::Put, tight());
    let quote = calculator.engine().price(&params, 0.42);

    let first = calculator.solve(&params, quote, 0.25).unwrap();
    let second = calculator.solve(&params, quote, 0.25).unwrap();
    assert_eq!(first, second);
}

#[test]
fn batch_recovers_every_element() {
    let strikes = [90.0, 95.0, 100.0, 105.0, 110.0];
    let target = [0.32, 0.28, 0.25, 0.27, 0.30];
    let batch = MarketBatch::from_columns(&[100.0], &strikes, &[0.5], &[0.03]).unwrap();

    for option_type in [OptionType::Call, OptionType::Put] {
        let calculator = ImpliedVolatility::new(PricingModel::LogNormal, option_type, tight());
        let quotes = calculator.engine().price_batch(&batch, &target).unwrap();

        let result = calculator.solve_batch(&batch, &quotes, vec![0.2; 5]).unwrap();
        assert!(result.is_converged());
        assert!(result.max_abs_residual() < 1e-6);
        for (iv, expected) in result.ivs.iter().zip(target) {
            assert_abs_diff_eq!(*iv, expected, epsilon = 1e-6);
        }
    }
}

#[test]
fn batch_and_scalar_solves_agree() {
    let strikes = [95.0, 100.0, 105.0];
    let batch = MarketBatch::from_columns(&[100.0], &strikes, &[1.0], &[0.02]).unwrap();
    let calculator = ImpliedVolatility::new(PricingModel::Arithmetic, OptionType::Call, tight());
    let quotes = calculator
        .engine()
        .price_batch(&batch, &[22.0, 25.0, 28.0])
        .unwrap();

    let batch_result = calculator.solve_batch(&batch, &quotes, vec![20.0; 3]).unwrap();
    for ((params, quote), iv) in batch.iter().zip(&quotes).zip(&batch_result.ivs) {
        let scalar = calculator.solve(params, *quote, 20.0).unwrap();
        assert_abs_diff_eq!(scalar.iv, *iv, epsilon = 1e-6);
    }
}

#[test]
fn solve_many_recovers_a_chain() {
    let calculator = ImpliedVolatility::new(PricingModel::LogNormal, OptionType::Call, tight());
    let problems: Vec<(MarketParams, f64)> = (0..16)
        .map(|i| {
            let step = i as f64;
            let params = MarketParams::new(100.0, 90.0 + step * 1.5, 0.25 + step * 0.05, 0.02);
            let vol = 0.2 + i as f64 * 0.01;
            (params, calculator.engine().price(&params, vol))
        })
        .collect();

    let results = calculator.solve_many(&problems, None);
    for (i, result) in results.into_iter().enumerate() {
        let result = result.unwrap();
        assert!(result.is_converged());
        assert_abs_diff_eq!(result.iv, 0.2 + i as f64 * 0.01, epsilon = 1e-6);
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    #[test]
    fn log_normal_round_trip_from_heuristic_guess(
        spot in 50.0f64..200.0,
        moneyness in 0.9f64..1.1,
        time in 0.25f64..1.5,
        rate in 0.005f64..0.08,
        vol in 0.15f64..0.6,
        put in any::<bool>(),
    ) {
        let option_type = if put { OptionType::Put } else { OptionType::Call };
        let params = MarketParams::new(spot, spot * moneyness, time, rate);
        let calculator = ImpliedVolatility::new(PricingModel::LogNormal, option_type, tight());
        let quote = calculator.engine().price(&params, vol);

        let guess = calculator.initial_guess(&params, quote);
        let result = calculator.solve(&params, quote, guess).unwrap();

        prop_assert!(result.is_converged());
        prop_assert!(result.iterations <= 20);
        prop_assert!((result.iv - vol).abs() < 1e-5);
    }

    #[test]
    fn arithmetic_round_trip_from_heuristic_guess(
        spot in 50.0f64..200.0,
        moneyness in 0.9f64..1.1,
        time in 0.25f64..1.5,
        rate in 0.005f64..0.08,
        vol_fraction in 0.15f64..0.6,
        put in any::<bool>(),
    ) {
        let option_type = if put { OptionType::Put } else { OptionType::Call };
        let params = MarketParams::new(spot, spot * moneyness, time, rate);
        let calculator = ImpliedVolatility::new(PricingModel::Arithmetic, option_type, tight());
        let vol = vol_fraction * spot;
        let quote = calculator.engine().price(&params, vol);

        let guess = calculator.initial_guess(&params, quote);
        let result = calculator.solve(&params, quote, guess).unwrap();

        prop_assert!(result.is_converged());
        prop_assert!(result.iterations <= 20);
        prop_assert!((result.iv - vol).abs() / spot < 1e-5);
    }
}
