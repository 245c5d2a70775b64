use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::ThreadPoolBuilder;
use spikecorr::{
    cross_spike_analysis, AnalysisError, AnalysisParams, BehaviorTable, CellSubset, Comparison,
    Covariate, CrossCorrResults, SpikeMatrix,
};

const RATE: f64 = 1000.0;

fn timeline(n: usize) -> BehaviorTable {
    BehaviorTable::new((0..n).map(|i| i as f64 / RATE).collect()).unwrap()
}

/// Position sweeps 0..100 once every `lap` samples.
fn track(n: usize, lap: usize) -> BehaviorTable {
    let position = (0..n).map(|i| (i % lap) as f64 * 100.0 / lap as f64).collect();
    timeline(n).with_column("position", position).unwrap()
}

fn poisson(rng: &mut StdRng, n: usize, rate_hz: f64) -> Vec<f64> {
    let p = rate_hz / RATE;
    (0..n).map(|_| rng.random_bool(p) as u8 as f64).collect()
}

fn params(n_shuffle: usize, seed: u64) -> AnalysisParams {
    AnalysisParams {
        smoothing_window: 0.005,
        max_lag: 0.02,
        n_shuffle,
        seed,
        ..AnalysisParams::default()
    }
}

fn assert_p_values_quantised(results: &CrossCorrResults, n_shuffle: usize) {
    for &p in results.p_value.values().iter().flatten() {
        assert!((0.0..=1.0).contains(&p), "p-value {} out of range", p);
        let k = p * n_shuffle as f64;
        assert!((k - k.round()).abs() < 1e-9, "p-value {} not a multiple of 1/{}", p, n_shuffle);
    }
}

#[test]
fn test_identical_cells_peak_at_zero_lag() {
    let mut rng = StdRng::seed_from_u64(11);
    let train = poisson(&mut rng, 1000, 20.0);
    let spikes = SpikeMatrix::from_columns(vec![train.clone(), train]).unwrap();

    let results = cross_spike_analysis(&timeline(1000), &spikes, params(50, 3)).unwrap();

    assert_eq!(results.cell_indices, vec![0, 1]);
    for (i, j) in [(0, 1), (1, 0)] {
        assert!((results.best_corr.get(i, j).unwrap() - 1.0).abs() < 1e-9);
        assert_eq!(results.best_lag.get(i, j), Some(0.0));
        assert_eq!(results.p_value.get(i, j), Some(0.0));
    }
    assert_eq!(results.best_corr.get(0, 0), None);
    assert_p_values_quantised(&results, 50);
}

#[test]
fn test_independent_cells_are_not_significant() {
    let mut rng = StdRng::seed_from_u64(42);
    let n = 5000;
    let cells = (0..6).map(|_| poisson(&mut rng, n, 15.0)).collect();
    let spikes = SpikeMatrix::from_columns(cells).unwrap();

    let results = cross_spike_analysis(&timeline(n), &spikes, params(40, 5)).unwrap();
    assert_p_values_quantised(&results, 40);

    let upper: Vec<f64> = (0..6)
        .flat_map(|i| ((i + 1)..6).map(move |j| (i, j)))
        .filter_map(|(i, j)| results.p_value.get(i, j))
        .collect();
    assert_eq!(upper.len(), 15);
    let mean = upper.iter().sum::<f64>() / upper.len() as f64;
    assert!(mean > 0.2, "mean p-value {} too small for independent cells", mean);
}

#[test]
fn test_shuffle_within_position_bins_explains_shared_tuning() {
    // Two cells with the same place field, independent otherwise
    let n = 10_000;
    let lap = 1000;
    let behavior = track(n, lap);
    let position = behavior.column("position").unwrap().to_vec();
    let mut rng = StdRng::seed_from_u64(8);
    let mut place_cell = || -> Vec<f64> {
        position
            .iter()
            .map(|&x| ((40.0..50.0).contains(&x) && rng.random_bool(0.3)) as u8 as f64)
            .collect()
    };
    let spikes = SpikeMatrix::from_columns(vec![place_cell(), place_cell()]).unwrap();

    let base = AnalysisParams {
        smoothing_window: 0.0005,
        max_lag: 0.005,
        n_shuffle: 30,
        seed: 1,
        ..AnalysisParams::default()
    };
    let constrained = AnalysisParams {
        shuffle_covariates: vec![Covariate::new(
            "position",
            (0..=10).map(|i| i as f64 * 10.0).collect(),
        )],
        ..base.clone()
    };

    let free = cross_spike_analysis(&behavior, &spikes, base).unwrap();
    let tuned = cross_spike_analysis(&behavior, &spikes, constrained).unwrap();
    assert_eq!(free.effective.smoothing_samples, 1);

    let zero = free.lags.iter().position(|&l| l == 0.0).unwrap();
    let real = tuned.real.get(0, 1, zero).unwrap();
    assert_eq!(free.real.get(0, 1, zero), Some(real));
    let free_signal = free.signal.get(0, 1, zero).unwrap();
    let tuned_signal = tuned.signal.get(0, 1, zero).unwrap();

    assert!(real > 0.2);
    assert!(tuned_signal > 2.0 * free_signal);
    assert!(tuned.noise.get(0, 1, zero).unwrap().abs() < 0.1);
    assert!(tuned.noise_sd.get(0, 1, zero).unwrap() > 0.0);
}

#[test]
fn test_same_seed_is_reproducible() {
    let mut rng = StdRng::seed_from_u64(2);
    let cells = (0..4).map(|_| poisson(&mut rng, 2000, 20.0)).collect();
    let spikes = SpikeMatrix::from_columns(cells).unwrap();
    let behavior = timeline(2000);

    let first = cross_spike_analysis(&behavior, &spikes, params(16, 99)).unwrap();
    let second = cross_spike_analysis(&behavior, &spikes, params(16, 99)).unwrap();
    assert_eq!(first, second);

    let other = cross_spike_analysis(&behavior, &spikes, params(16, 100)).unwrap();
    assert_eq!(first.real, other.real);
    assert_ne!(first.signal, other.signal);

    // Different seeds agree on the grand-average signal within sampling noise
    let grand_mean = |r: &CrossCorrResults| {
        let present: Vec<f64> = r.signal.values().iter().flatten().copied().collect();
        present.iter().sum::<f64>() / present.len() as f64
    };
    assert!((grand_mean(&first) - grand_mean(&other)).abs() < 0.03);
}

#[test]
fn test_results_independent_of_thread_count() {
    let mut rng = StdRng::seed_from_u64(14);
    let cells = (0..5).map(|_| poisson(&mut rng, 2000, 20.0)).collect();
    let spikes = SpikeMatrix::from_columns(cells).unwrap();
    let behavior = track(2000, 400);
    let p = AnalysisParams {
        shuffle_covariates: vec![Covariate::new("position", vec![0.0, 50.0, 100.0])],
        ..params(12, 31)
    };

    let run_with = |threads: usize| {
        ThreadPoolBuilder::new()
            .num_threads(threads)
            .build()
            .unwrap()
            .install(|| cross_spike_analysis(&behavior, &spikes, p.clone()).unwrap())
    };
    let single = run_with(1);
    let multi = run_with(4);
    assert_eq!(single, multi);
}

#[test]
fn test_silent_cell_is_dropped() {
    let mut rng = StdRng::seed_from_u64(4);
    let behavior = track(2000, 500);
    let mut a = poisson(&mut rng, 2000, 20.0);
    let b = poisson(&mut rng, 2000, 20.0);
    // Cell 0 only fires outside the selected window
    for (v, &x) in a.iter_mut().zip(behavior.column("position").unwrap()) {
        if x < 50.0 {
            *v = 0.0;
        }
    }
    let c = poisson(&mut rng, 2000, 20.0);
    let spikes = SpikeMatrix::from_columns(vec![a, b, c]).unwrap();

    let mut p = params(10, 0);
    p.predicates.insert("position".into(), Comparison::Less(50.0));
    let results = cross_spike_analysis(&behavior, &spikes, p).unwrap();

    assert_eq!(results.cell_indices, vec![1, 2]);
    assert_eq!(results.real.n_cells(), 3);
    assert!(results.real.pair(0, 1).iter().all(Option::is_none));
    assert!(results.real.pair(2, 0).iter().all(Option::is_none));
    assert_eq!(results.p_value.get(0, 2), None);
    assert!(results.best_corr.get(1, 2).is_some());
}

#[test]
fn test_subset_matches_prefiltered_input() {
    let mut rng = StdRng::seed_from_u64(6);
    let cells: Vec<Vec<f64>> = (0..4).map(|_| poisson(&mut rng, 3000, 25.0)).collect();
    let behavior = track(3000, 600);
    let covariate = Covariate::new("position", vec![0.0, 25.0, 50.0, 75.0, 100.0]);

    let full = SpikeMatrix::from_columns(cells.clone()).unwrap();
    let subset_params = AnalysisParams {
        cells: CellSubset::Indices(vec![1, 3]),
        shuffle_covariates: vec![covariate.clone()],
        ..params(12, 21)
    };
    let from_full = cross_spike_analysis(&behavior, &full, subset_params).unwrap();

    let reduced = SpikeMatrix::from_columns(vec![cells[1].clone(), cells[3].clone()]).unwrap();
    let reduced_params = AnalysisParams {
        shuffle_covariates: vec![covariate],
        ..params(12, 21)
    };
    let from_reduced = cross_spike_analysis(&behavior, &reduced, reduced_params).unwrap();

    assert_eq!(from_full.cell_indices, vec![1, 3]);
    for (a, b, i, j) in [(1, 3, 0, 1), (3, 1, 1, 0)] {
        assert_eq!(from_full.real.pair(a, b), from_reduced.real.pair(i, j));
        assert_eq!(from_full.signal.pair(a, b), from_reduced.signal.pair(i, j));
        assert_eq!(from_full.noise_sd.pair(a, b), from_reduced.noise_sd.pair(i, j));
        assert_eq!(from_full.best_corr.get(a, b), from_reduced.best_corr.get(i, j));
        assert_eq!(from_full.p_value.get(a, b), from_reduced.p_value.get(i, j));
    }
}

#[test]
fn test_unknown_predicate_is_ignored() {
    let mut rng = StdRng::seed_from_u64(9);
    let cells = (0..3).map(|_| poisson(&mut rng, 1500, 20.0)).collect();
    let spikes = SpikeMatrix::from_columns(cells).unwrap();
    let behavior = timeline(1500);

    let plain = cross_spike_analysis(&behavior, &spikes, params(8, 4)).unwrap();
    let mut p = params(8, 4);
    p.predicates.insert("lap_type".into(), Comparison::Equals(2.0));
    let with_unknown = cross_spike_analysis(&behavior, &spikes, p).unwrap();

    assert_eq!(plain.real, with_unknown.real);
    assert_eq!(plain.p_value, with_unknown.p_value);
    assert!(with_unknown.effective.time_mask.iter().all(|&m| m));
}

#[test]
fn test_single_cell_gives_empty_pairs() {
    let mut rng = StdRng::seed_from_u64(10);
    let spikes =
        SpikeMatrix::from_columns(vec![poisson(&mut rng, 800, 20.0), vec![0.0; 800]]).unwrap();

    let results = cross_spike_analysis(&timeline(800), &spikes, params(5, 0)).unwrap();
    assert_eq!(results.cell_indices, vec![0]);
    assert!(results.real.values().iter().all(Option::is_none));
    assert!(results.p_value.values().iter().all(Option::is_none));
}

#[test]
fn test_zero_max_lag_has_single_bin() {
    let mut rng = StdRng::seed_from_u64(12);
    let cells = (0..2).map(|_| poisson(&mut rng, 1000, 30.0)).collect();
    let spikes = SpikeMatrix::from_columns(cells).unwrap();
    let p = AnalysisParams {
        max_lag: 0.0,
        ..params(6, 1)
    };

    let results = cross_spike_analysis(&timeline(1000), &spikes, p).unwrap();
    assert_eq!(results.lags, vec![0.0]);
    assert_eq!(results.real.n_lags(), 1);
    assert_eq!(results.best_lag.get(0, 1), Some(0.0));
    assert_eq!(results.best_corr.get(0, 1), results.best_corr.get(1, 0));
}

#[test]
fn test_structural_errors() {
    let spikes = SpikeMatrix::from_columns(vec![vec![0.0; 100], vec![1.0; 100]]).unwrap();

    let err = cross_spike_analysis(&timeline(120), &spikes, params(4, 0)).unwrap_err();
    assert!(matches!(err, AnalysisError::LengthMismatch { .. }));

    let p = AnalysisParams {
        cells: CellSubset::Indices(vec![0, 5]),
        ..params(4, 0)
    };
    let err = cross_spike_analysis(&timeline(100), &spikes, p).unwrap_err();
    assert_eq!(
        err,
        AnalysisError::CellIndexOutOfRange {
            index: 5,
            n_cells: 2
        }
    );

    let p = AnalysisParams {
        cells: CellSubset::Indices(vec![0, 0, 1]),
        ..params(4, 0)
    };
    let err = cross_spike_analysis(&timeline(100), &spikes, p).unwrap_err();
    assert_eq!(err, AnalysisError::DuplicateCellIndex(0));

    let p = AnalysisParams {
        smoothing_window: -1.0,
        ..params(4, 0)
    };
    let err = cross_spike_analysis(&timeline(100), &spikes, p).unwrap_err();
    assert_eq!(err, AnalysisError::InvalidSmoothingWindow(-1.0));
}

#[test]
fn test_oversized_windows_are_capped_by_timeline() {
    let mut rng = StdRng::seed_from_u64(15);
    let cells = (0..2).map(|_| poisson(&mut rng, 100, 100.0)).collect();
    let spikes = SpikeMatrix::from_columns(cells).unwrap();
    let p = AnalysisParams {
        smoothing_window: 1e30,
        max_lag: 1e30,
        ..params(4, 0)
    };

    let results = cross_spike_analysis(&timeline(100), &spikes, p).unwrap();
    assert_eq!(results.effective.smoothing_samples, 201);
    assert_eq!(results.lags.len(), 199);
    assert_eq!(results.real.n_lags(), 199);
    assert_p_values_quantised(&results, 4);
}

#[test]
fn test_results_serialise() {
    let mut rng = StdRng::seed_from_u64(13);
    let cells = (0..2).map(|_| poisson(&mut rng, 500, 30.0)).collect();
    let spikes = SpikeMatrix::from_columns(cells).unwrap();
    let results = cross_spike_analysis(&timeline(500), &spikes, params(4, 0)).unwrap();

    let json = serde_json::to_string(&results).unwrap();
    let back: CrossCorrResults = serde_json::from_str(&json).unwrap();
    assert_eq!(back.cell_indices, results.cell_indices);
    assert_eq!(back.lags.len(), results.lags.len());
}
