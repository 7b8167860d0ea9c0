// crates/swing_pipeline/tests/engine.rs
//
// End-to-end runs over small in-memory datasets.

use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveDate;
use swing_core::{Constituency, Dataset, Party, PartyMap, SimParams, SimRng, SupportRatio, VoteCount};
use swing_io::prelude::PollRecord;
use swing_pipeline::montecarlo::perturb_targets;
use swing_pipeline::{
    run_ensemble, run_poll_series, run_sequential, simulate_once, ElectionModel, RunOptions,
    RunnerError, Targets,
};

fn votes(con: u64, lab: u64) -> VoteCount {
    let mut m = PartyMap::splat(0u64);
    m.set(Party::Conservative, con);
    m.set(Party::Labour, lab);
    VoteCount::new(m)
}

fn two_party_dataset(n: usize) -> Dataset {
    Dataset::new(
        (0..n)
            .map(|i| Constituency {
                name: format!("Seat {i}"),
                region: if i % 2 == 0 { "North".into() } else { "South".into() },
                prev2: votes(20_000, 15_000),
                prev1: votes(18_000, 17_000),
            })
            .collect(),
    )
}

fn target(con: f64) -> Targets {
    let mut m = PartyMap::splat(0.0);
    m.set(Party::Conservative, con);
    m.set(Party::Labour, 1.0 - con);
    Targets::national(SupportRatio::from_normalized(m))
}

fn quiet_params() -> SimParams {
    SimParams { swing_scale_factor: 0.0, support_variation: 0.0, iterations: 20, ..SimParams::default() }
}

#[test]
fn deterministic_two_seat_election() {
    let model = ElectionModel::new(&two_party_dataset(2), quiet_params()).expect("model");
    let r = simulate_once(&model, &target(0.55), 1);

    for s in &r.seats {
        assert_eq!(s.votes.get(Party::Conservative), 19_250);
        assert_eq!(s.votes.get(Party::Labour), 15_750);
        assert_eq!(s.winner, Party::Conservative);
    }
    assert_eq!(r.seat_totals[Party::Conservative], 2);
    assert_eq!(r.largest_party, Party::Conservative);
    assert_eq!(r.threshold, 1);
    assert_eq!(r.margin, 1);
    assert_eq!(r.summary, "Conservative victory (majority 1)");
    assert!(!r.too_divergent);
}

#[test]
fn zero_noise_ensemble_is_all_wins() {
    let model = ElectionModel::new(&two_party_dataset(2), quiet_params()).expect("model");
    let opts = RunOptions::from_params(model.params());
    let rep = run_sequential(&model, &target(0.55), &opts, None);
    assert_eq!(rep.accepted, 20);
    assert_eq!(rep.discarded, 0);
    assert_eq!(rep.win_pct[Party::Conservative], 100.0);
    assert_eq!(rep.seats[Party::Conservative].mean, 2.0);
    assert_eq!(rep.seats[Party::Conservative].sd, 0.0);
    assert_eq!(rep.margin.mean, 1.0);
}

#[test]
fn divergent_realizations_are_discarded_not_folded() {
    let params = SimParams {
        // Two seats at the default scale factor put the simulated share about
        // 0.001 from target, so this tolerance rejects most draws.
        result_tolerance: 0.0005,
        iterations: 50,
        seed: 17,
        workers: Some(1),
        ..SimParams::default()
    };
    let model = ElectionModel::new(&two_party_dataset(2), params).expect("model");
    let opts = RunOptions::from_params(model.params());
    let base = target(0.55);
    let rep = run_sequential(&model, &base, &opts, None);
    assert_eq!(rep.accepted, 50);
    assert!(rep.discarded > 0, "expected some divergent draws at this tolerance");

    // Replay stream 0 by hand and count.
    let mut rng = SimRng::for_stream(17, 0);
    let (mut ok, mut bad) = (0u64, 0u64);
    while ok < 50 {
        let t = perturb_targets(&base, model.params().support_variation, &mut rng);
        let r = model.simulate(&t, &mut rng);
        if r.too_divergent {
            bad += 1;
        } else {
            for p in Party::ALL {
                assert!((r.support.get(p) - r.target.get(p)).abs() <= 0.0005);
            }
            ok += 1;
        }
    }
    assert_eq!(bad, rep.discarded);
}

#[test]
fn one_worker_matches_sequential() {
    let params = SimParams { iterations: 40, seed: 99, workers: Some(1), ..SimParams::default() };
    let model = Arc::new(ElectionModel::new(&two_party_dataset(6), params).expect("model"));
    let opts = RunOptions::from_params(model.params());
    let seq = run_sequential(&model, &target(0.53), &opts, None);
    let par = run_ensemble(Arc::clone(&model), Arc::new(target(0.53)), &opts, None).expect("run");
    assert_eq!(seq, par);
}

#[test]
fn many_workers_accept_exactly_n() {
    let params = SimParams { iterations: 64, seed: 3, workers: Some(4), ..SimParams::default() };
    let model = Arc::new(ElectionModel::new(&two_party_dataset(8), params).expect("model"));
    let opts = RunOptions::from_params(model.params());
    let seen = std::cell::Cell::new(0u64);
    let cb = |p: &swing_pipeline::Progress| seen.set(p.accepted);
    let rep = run_ensemble(model, Arc::new(target(0.52)), &opts, Some(&cb)).expect("run");
    assert_eq!(rep.accepted, 64);
    assert_eq!(seen.get(), 64);
    let total: f64 = Party::ALL.iter().map(|&p| rep.win_pct[p]).sum::<f64>() + rep.hung_pct;
    assert!((total - 100.0).abs() < 1e-9);
}

#[test]
fn stalled_run_returns_partial_report() {
    let params = SimParams { iterations: 1_000, workers: Some(2), ..SimParams::default() };
    let model = Arc::new(ElectionModel::new(&two_party_dataset(20_000), params).expect("model"));
    let opts = RunOptions { result_timeout: Duration::from_nanos(1), ..RunOptions::from_params(model.params()) };
    match run_ensemble(model, Arc::new(target(0.55)), &opts, None) {
        Err(RunnerError::Stalled { accepted, requested, partial, .. }) => {
            assert_eq!(requested, 1_000);
            assert!(accepted < 1_000);
            assert_eq!(partial.accepted, accepted);
            assert_eq!(partial.requested, 1_000);
        }
        other => panic!("expected a stall, got {other:?}"),
    }
}

#[test]
fn regional_targets_steer_their_region() {
    let params = SimParams {
        swing_mode: swing_core::SwingMode::Regional,
        ..quiet_params()
    };
    let model = ElectionModel::new(&two_party_dataset(4), params).expect("model");
    let mut t = target(0.55);
    t.regional.insert("South".into(), target(0.40).national);
    let r = simulate_once(&model, &t, 0);
    for s in &r.seats {
        let expect = if s.region == "South" { Party::Labour } else { Party::Conservative };
        assert_eq!(s.winner, expect, "{}", s.name);
    }
}

#[test]
fn poll_series_runs_in_date_order() {
    let model = Arc::new(ElectionModel::new(&two_party_dataset(2), quiet_params()).expect("model"));
    let opts = RunOptions { workers: 1, ..RunOptions::from_params(model.params()) };
    let day = |d: u32| NaiveDate::from_ymd_opt(2015, 5, d).expect("valid date");
    let poll = |d: u32, con: f64| {
        let mut shares = PartyMap::splat(0.0);
        shares.set(Party::Conservative, con);
        shares.set(Party::Labour, 100.0 - con);
        PollRecord { date: day(d), pollster: "ICM".into(), sponsor: String::new(), sample_size: 1000, shares }
    };
    let polls = vec![poll(2, 45.0), poll(1, 55.0), poll(1, 55.0)];

    let series = run_poll_series(&model, polls, &opts, None).expect("series");
    assert_eq!(series.outcomes.len(), 2);
    assert_eq!(series.outcomes[0].poll.date, day(1));
    let con = &series.trends[Party::Conservative];
    assert_eq!(con.len(), 2);
    assert_eq!(con[0].mean, 2.0);
    assert_eq!(con[1].mean, 0.0);
}
