use approx::assert_abs_diff_eq;
use impliedvol_rs::prelude::*;
use impliedvol_rs::solver::TraceEntry;

#[test]
fn rootless_objective_aborts_exactly_at_the_cap() {
    // x² + 1 has no real root, so Newton wanders forever.
    for max_iterations in [50, 1000] {
        for start in [3.0, 0.7, -2.0] {
            let solver = NewtonSolver::new(SolverConfig::new().with_max_iterations(max_iterations));
            let outcome = solver
                .solve_scalar(|x| x * x + 1.0, |x| 2.0 * x, start)
                .unwrap();

            assert_eq!(outcome.status, SolverStatus::Aborted);
            assert_eq!(outcome.iterations, max_iterations);
            assert!(outcome.root.is_finite());
        }
    }
}

#[test]
fn negative_slope_elements_are_damped_others_are_not() {
    let solver = NewtonSolver::new(SolverConfig::new().with_tolerance(1e-12));

    // Element 0 has slope +1 and lands on its root; element 1 has slope -1
    // so its Newton step (to 2) is scaled to 3, where it then sits.
    let outcome = solver
        .solve(
            |r: &Vec<f64>| Ok(vec![r[0] - 2.0, -(r[1] - 2.0)]),
            |_: &Vec<f64>| Ok(vec![1.0, -1.0]),
            vec![1.0, 1.0],
        )
        .unwrap();

    assert!(outcome.is_converged());
    assert_eq!(outcome.iterations, 2);
    assert_abs_diff_eq!(outcome.root[0], 2.0);
    assert_abs_diff_eq!(outcome.root[1], 3.0);
}

#[test]
fn vector_elements_advance_in_lockstep() {
    let solver = NewtonSolver::new(SolverConfig::new().with_tolerance(1e-10).with_trace(true));

    let outcome = solver
        .solve(
            |r: &Vec<f64>| Ok(vec![r[0] - 2.0, r[1] * r[1] - 2.0]),
            |r: &Vec<f64>| Ok(vec![1.0, 2.0 * r[1]]),
            vec![1.0, 1.0],
        )
        .unwrap();

    assert!(outcome.is_converged());
    assert!(outcome.iterations > 1);
    assert_abs_diff_eq!(outcome.root[0], 2.0);
    assert_abs_diff_eq!(outcome.root[1], std::f64::consts::SQRT_2, epsilon = 1e-10);

    let trace = outcome.trace.unwrap();
    assert_eq!(trace.len(), outcome.iterations as usize);

    // The linear element is solved after one step but keeps being evaluated.
    let entries: Vec<TraceEntry<Vec<f64>>> = trace.into_iter().collect();
    assert_eq!(entries[0].residual, vec![-1.0, -1.0]);
    for entry in &entries[1..] {
        assert_eq!(entry.residual.len(), 2);
        assert_eq!(entry.residual[0], 0.0);
    }
}

#[test]
fn trace_matches_iterations_on_abort() {
    let solver = NewtonSolver::new(SolverConfig::new().with_max_iterations(7).with_trace(true));
    let outcome = solver
        .solve_scalar(|x| x * x + 1.0, |x| 2.0 * x, 3.0)
        .unwrap();

    assert_eq!(outcome.status, SolverStatus::Aborted);
    let trace = outcome.trace.unwrap();
    assert_eq!(trace.len(), 7);

    let last = trace.into_iter().last().unwrap();
    assert_eq!(last.residual, outcome.residual);
    assert_eq!(last.derivative, outcome.derivative);
}

#[test]
fn trace_is_absent_unless_requested() {
    let outcome = NewtonSolver::with_defaults()
        .solve_scalar(|x| x * x - 2.0, |x| 2.0 * x, 1.0)
        .unwrap();
    assert!(outcome.trace.is_none());
}

#[test]
fn invalid_inputs_are_errors_not_outcomes() {
    let solver = NewtonSolver::with_defaults();

    let err = solver
        .solve(
            |r: &Vec<f64>| Ok(r.clone()),
            |r: &Vec<f64>| Ok(r.clone()),
            vec![0.3, 0.0],
        )
        .unwrap_err();
    assert_eq!(err, IVError::InvalidGuess { index: 1, value: 0.0 });

    let err = solver
        .solve(
            |_: &Vec<f64>| Ok(vec![1.0]),
            |r: &Vec<f64>| Ok(r.clone()),
            vec![0.3, 0.4],
        )
        .unwrap_err();
    assert!(matches!(err, IVError::ShapeMismatch { context: "residual", expected: 2, actual: 1 }));

    let err = NewtonSolver::new(SolverConfig::new().with_tolerance(-1.0))
        .solve_scalar(|x| x, |_| 1.0, 1.0)
        .unwrap_err();
    assert!(matches!(err, IVError::InvalidConfig { .. }));
}

#[test]
fn implied_volatility_batch_shares_one_iteration_count() {
    let batch = MarketBatch::from_columns(&[100.0], &[80.0, 100.0, 120.0], &[0.5], &[0.02])
        .unwrap();
    let config = SolverConfig::new().with_tolerance(1e-8);
    let calculator =
        ImpliedVolatility::new(PricingModel::LogNormal, OptionType::Call, config.clone());
    let quotes = calculator.engine().price_batch(&batch, &[0.4, 0.25, 0.3]).unwrap();

    let batch_result = calculator.solve_batch(&batch, &quotes, vec![0.5; 3]).unwrap();
    assert!(batch_result.is_converged());

    let scalar_max = batch
        .iter()
        .zip(&quotes)
        .map(|(params, quote)| {
            let scalar = ImpliedVolatility::new(
                PricingModel::LogNormal,
                OptionType::Call,
                config.clone().with_metric(ConvergenceMetric::MaxAbsoluteChange),
            );
            scalar.solve(params, *quote, 0.5).unwrap().iterations
        })
        .max()
        .unwrap();
    assert_eq!(batch_result.iterations, scalar_max);
}
