mod common;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use powertrain::integrated::{
    channel_observer, CancelToken, IntegratedSolver, PropFilter, RankMetric, ResultAnalyzer,
};
use pretty_assertions::assert_eq;

use common::{cell_db, motor_catalog, prop_db, small_batch_config};

fn solver() -> IntegratedSolver {
    IntegratedSolver::new(
        small_batch_config(),
        Arc::new(motor_catalog()),
        Arc::new(prop_db()),
        Arc::new(cell_db()),
    )
    .unwrap()
}

#[test]
fn permutation_count_is_the_cartesian_product() {
    let solver = solver();
    // 1 motor × 2 props × 1 cell × 2 arrangements × 1 env × 2 speeds
    assert_eq!(solver.permutation_count(), 8);
    let items = solver.permutations();
    assert_eq!(items.len(), 8);
    for (i, item) in items.iter().enumerate() {
        assert_eq!(item.index, i);
    }
}

#[test]
fn batch_is_deterministic_across_worker_counts() {
    let run_with = |threads: usize| {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build()
            .unwrap();
        pool.install(|| solver().run_batch(None, None))
    };

    let serial = run_with(1);
    let parallel = run_with(4);

    assert_eq!(serial.results.len(), parallel.results.len());
    assert_eq!(serial.results, parallel.results);
    assert_eq!(serial.best_by_efficiency, parallel.best_by_efficiency);
    assert_eq!(serial.best_by_runtime, parallel.best_by_runtime);
    assert_eq!(serial.best_by_max_speed, parallel.best_by_max_speed);
}

#[test]
fn results_cover_every_combination_in_order() {
    let batch = solver().run_batch(None, None);
    assert!(!batch.cancelled);
    assert_eq!(batch.results.len(), 8);
    assert_eq!(batch.valid_count + batch.invalid_count, 8);
    for (i, result) in batch.results.iter().enumerate() {
        assert_eq!(result.index, i);
    }

    // The 45 m/s points sit outside the prop envelope and must be invalid
    let fast_points: Vec<_> = batch
        .results
        .iter()
        .filter(|r| r.cruise.airspeed_ms > 40.0)
        .collect();
    assert!(!fast_points.is_empty());
    assert!(fast_points.iter().all(|r| !r.valid));

    // And the 15 m/s cruise points should mostly work
    assert!(batch.valid_count >= 2, "valid: {}", batch.valid_count);
}

#[test]
fn valid_results_carry_thermal_and_runtime_figures() {
    let batch = solver().run_batch(None, None);
    for result in batch.results.iter().filter(|r| r.valid) {
        assert!(result.cruise_runtime_minutes > 0.0);
        assert!(result.pack_mass_kg > 0.0);
        assert!(result.energy_density_wh_kg > 0.0);
        assert!(result.power_density_w_kg > 0.0);
        let thermal = result.cruise_thermal.expect("cruise thermal present");
        assert!(thermal.within_limits);
        assert!(thermal.steady_state_temp_c >= 25.0);
        // Max speed was requested in the config
        assert!(result.max_achievable_speed_ms > 0.0);
        assert!(result.max_speed_thermal.is_some());
    }
}

#[test]
fn invalid_results_carry_a_reason_tag() {
    let batch = solver().run_batch(None, None);
    for result in batch.results.iter().filter(|r| !r.valid) {
        assert!(
            result.invalidity_reason.is_some(),
            "invalid without reason: {} + {} @ {:.0} m/s",
            result.motor_id,
            result.prop_id,
            result.cruise.airspeed_ms
        );
    }
}

#[test]
fn unknown_cell_fails_only_its_items() {
    let mut config = small_batch_config();
    config
        .battery
        .cell_ids
        .push("Unobtainium 9000".to_string());
    let solver = IntegratedSolver::new(
        config,
        Arc::new(motor_catalog()),
        Arc::new(prop_db()),
        Arc::new(cell_db()),
    )
    .unwrap();

    let batch = solver.run_batch(None, None);
    assert_eq!(batch.results.len(), 16);
    let unknown: Vec<_> = batch
        .results
        .iter()
        .filter(|r| r.cell_id == "Unobtainium 9000")
        .collect();
    assert_eq!(unknown.len(), 8);
    assert!(unknown.iter().all(|r| !r.valid));
    // The known-cell half still solves
    assert!(batch.valid_count >= 2);
}

#[test]
fn prop_filter_narrows_the_space() {
    let mut config = small_batch_config();
    config.prop_filter = PropFilter {
        diameter_in: Some((9.0, 11.0)),
        pitch_in: None,
    };
    let solver = IntegratedSolver::new(
        config,
        Arc::new(motor_catalog()),
        Arc::new(prop_db()),
        Arc::new(cell_db()),
    )
    .unwrap();
    assert_eq!(solver.selected_props(), ["10x5".to_string()]);
    assert_eq!(solver.permutation_count(), 4);
}

#[test]
fn cancellation_returns_partial_results() {
    let solver = solver();
    let token = CancelToken::new();
    let seen = AtomicUsize::new(0);
    let token_for_observer = token.clone();

    let observer = move |_: &powertrain::BatchProgress| {
        // Cancel after the second completed item
        if seen.fetch_add(1, Ordering::SeqCst) + 1 >= 2 {
            token_for_observer.cancel();
        }
    };

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(1)
        .build()
        .unwrap();
    let batch = pool.install(|| solver.run_batch(Some(&observer), Some(&token)));

    assert!(batch.cancelled);
    assert!(batch.results.len() >= 2);
    assert!(batch.results.len() < 8, "got {}", batch.results.len());
    // Whatever completed is still well-formed
    for result in &batch.results {
        assert!(!result.pack_config.is_empty());
    }
}

#[test]
fn pre_cancelled_batch_runs_nothing() {
    let token = CancelToken::new();
    token.cancel();
    let batch = solver().run_batch(None, Some(&token));
    assert!(batch.cancelled);
    assert!(batch.results.is_empty());
}

#[test]
fn progress_reaches_completion_and_is_monotonic_single_threaded() {
    let solver = solver();
    let (callback, rx) = channel_observer(64);

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(1)
        .build()
        .unwrap();
    let batch = pool.install(|| solver.run_batch(Some(callback.as_ref()), None));
    drop(callback);

    let updates: Vec<_> = rx.try_iter().collect();
    assert_eq!(updates.len(), 8);
    let mut prev = 0;
    for update in &updates {
        assert!(update.current_index >= prev);
        prev = update.current_index;
        assert_eq!(update.total, 8);
        assert!(!update.motor_label.is_empty());
    }
    assert_eq!(updates.last().unwrap().current_index, 8);
    assert_eq!(batch.results.len(), 8);
}

#[test]
fn ranking_orders_and_best_pointers_agree() {
    let batch = solver().run_batch(None, None);
    let analyzer = ResultAnalyzer::new(&batch);

    let by_eff = analyzer.ranked_by(RankMetric::SystemEfficiency);
    assert!(!by_eff.is_empty());
    for pair in by_eff.windows(2) {
        assert!(pair[0].cruise.system_efficiency >= pair[1].cruise.system_efficiency);
    }
    assert_eq!(
        by_eff[0].cruise.system_efficiency,
        batch.best_by_efficiency().unwrap().cruise.system_efficiency
    );

    let by_current = analyzer.ranked_by(RankMetric::CruiseCurrent);
    for pair in by_current.windows(2) {
        assert!(pair[0].cruise.battery_current_a <= pair[1].cruise.battery_current_a);
    }

    let top = analyzer.top_by(RankMetric::Runtime, 2);
    assert!(top.len() <= 2);
}

#[test]
fn statistics_summarize_the_batch() {
    let batch = solver().run_batch(None, None);
    let analyzer = ResultAnalyzer::new(&batch);
    let stats = analyzer.statistics();

    assert_eq!(stats.total, 8);
    assert_eq!(stats.valid + stats.invalid, 8);
    let eff = stats.efficiency.expect("some valid results");
    assert!(eff.min <= eff.mean && eff.mean <= eff.max);
    assert!(eff.max <= 1.0);

    let report = analyzer.summary_report();
    assert!(report.contains("INTEGRATED ANALYSIS SUMMARY"));
    assert!(report.contains("Best by efficiency"));
}

#[test]
fn battery_filters_select_consistent_subsets() {
    let batch = solver().run_batch(None, None);
    let analyzer = ResultAnalyzer::new(&batch);

    let four_s = analyzer.results_for_battery(Some("Molicel P45B"), Some(4), None, None);
    assert!(four_s.iter().all(|r| r.series == 4));

    let per_battery = analyzer.best_for_each_battery_config();
    for (key, result) in &per_battery {
        assert!(key.contains(&result.pack_config));
        assert!(result.valid);
    }

    let per_motor_prop = analyzer.best_for_each_motor_prop();
    assert!(per_motor_prop.len() <= 2); // at most one entry per prop here
}
