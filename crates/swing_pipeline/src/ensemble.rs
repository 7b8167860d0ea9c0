//! Ensemble statistics.
//!
//! The accumulator keeps only integer counts, sums and sums of squares, so
//! folding the same realizations in any order (or merging partial
//! accumulators from different workers) produces a bit-identical report.

use serde::Serialize;
use swing_core::{Party, PartyMap};

use crate::election::Realization;
use crate::scenario::CompiledRule;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EnsembleAccumulator {
    requested: usize,
    accepted: u64,
    discarded: u64,
    wins: PartyMap<u64>,
    hung: u64,
    largest: PartyMap<u64>,
    seat_sum: PartyMap<u64>,
    seat_sq: PartyMap<u128>,
    margin_sum: i128,
    margin_sq: u128,
    max_seats: Option<(u32, Party)>,
    scenario_labels: Vec<String>,
    scenario_hits: Vec<u64>,
    pop_winner_hits: u64,
}

impl EnsembleAccumulator {
    pub fn new(rules: &[CompiledRule], requested: usize) -> Self {
        Self::with_labels(rules.iter().map(|r| r.label().to_string()).collect(), requested)
    }

    pub fn with_labels(scenario_labels: Vec<String>, requested: usize) -> Self {
        let n = scenario_labels.len();
        Self {
            requested,
            accepted: 0,
            discarded: 0,
            wins: PartyMap::splat(0),
            hung: 0,
            largest: PartyMap::splat(0),
            seat_sum: PartyMap::splat(0),
            seat_sq: PartyMap::splat(0),
            margin_sum: 0,
            margin_sq: 0,
            max_seats: None,
            scenario_labels,
            scenario_hits: vec![0; n],
            pop_winner_hits: 0,
        }
    }

    pub fn accepted(&self) -> u64 {
        self.accepted
    }

    pub fn discarded(&self) -> u64 {
        self.discarded
    }

    /// Count a realization rejected for divergence.
    pub fn discard(&mut self) {
        self.discarded += 1;
    }

    pub fn fold(&mut self, r: &Realization) {
        self.accepted += 1;
        match r.winner {
            Some(p) => self.wins[p] += 1,
            None => self.hung += 1,
        }
        self.largest[r.largest_party] += 1;
        for (p, &seats) in r.seat_totals.iter() {
            let s = u64::from(seats);
            self.seat_sum[p] += s;
            self.seat_sq[p] += u128::from(s * s);
            self.max_seats = better_max(self.max_seats, Some((seats, p)));
        }
        self.margin_sum += i128::from(r.margin);
        self.margin_sq += (i128::from(r.margin) * i128::from(r.margin)) as u128;
        for (hits, o) in self.scenario_hits.iter_mut().zip(&r.scenarios) {
            if o.hit {
                *hits += 1;
            }
        }
        if r.seat_winner_is_pop_winner {
            self.pop_winner_hits += 1;
        }
    }

    /// Combine with an accumulator built over the same scenario rules.
    pub fn merge(&mut self, other: &EnsembleAccumulator) {
        self.accepted += other.accepted;
        self.discarded += other.discarded;
        self.hung += other.hung;
        for p in Party::ALL {
            self.wins[p] += other.wins[p];
            self.largest[p] += other.largest[p];
            self.seat_sum[p] += other.seat_sum[p];
            self.seat_sq[p] += other.seat_sq[p];
        }
        self.margin_sum += other.margin_sum;
        self.margin_sq += other.margin_sq;
        self.max_seats = better_max(self.max_seats, other.max_seats);
        for (a, b) in self.scenario_hits.iter_mut().zip(&other.scenario_hits) {
            *a += b;
        }
        self.pop_winner_hits += other.pop_winner_hits;
    }

    pub fn finish(&self) -> SimulationReport {
        let n = self.accepted;
        let pct = |k: u64| if n == 0 { 0.0 } else { k as f64 / n as f64 * 100.0 };

        SimulationReport {
            requested: self.requested,
            accepted: n,
            discarded: self.discarded,
            win_pct: self.wins.map(|_, &k| pct(k)),
            hung_pct: pct(self.hung),
            largest_pct: self.largest.map(|_, &k| pct(k)),
            seats: PartyMap::from_fn(|p| {
                Stats::from_sums(n, i128::from(self.seat_sum[p]), self.seat_sq[p])
            }),
            margin: Stats::from_sums(n, self.margin_sum, self.margin_sq),
            max_seats: self.max_seats.map(|(seats, party)| MaxSeats { party, seats }),
            scenarios: self
                .scenario_labels
                .iter()
                .zip(&self.scenario_hits)
                .map(|(label, &k)| ScenarioFrequency { label: label.clone(), pct: pct(k) })
                .collect(),
            pop_winner_pct: pct(self.pop_winner_hits),
        }
    }
}

/// Highest seat count wins; equal counts go to the earlier party.
fn better_max(a: Option<(u32, Party)>, b: Option<(u32, Party)>) -> Option<(u32, Party)> {
    match (a, b) {
        (None, x) | (x, None) => x,
        (Some(x), Some(y)) => {
            if y.0 > x.0 || (y.0 == x.0 && y.1 < x.1) {
                Some(y)
            } else {
                Some(x)
            }
        }
    }
}

// ----------------------------- Report -----------------------------

/// Mean and sample standard deviation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
pub struct Stats {
    pub mean: f64,
    pub sd: f64,
}

impl Stats {
    fn from_sums(n: u64, sum: i128, sum_sq: u128) -> Self {
        if n == 0 {
            return Self::default();
        }
        let nf = n as f64;
        let mean = sum as f64 / nf;
        let sd = if n < 2 {
            0.0
        } else {
            // n·Σx² − (Σx)² is exact in integers.
            let n_i = i128::from(n);
            let num = n_i * (sum_sq as i128) - sum * sum;
            let var = num.max(0) as f64 / (nf * (nf - 1.0));
            var.sqrt()
        };
        Self { mean, sd }
    }

    /// mean ± 2 sd, lower bound clamped at 0.
    pub fn band95(&self) -> (f64, f64) {
        ((self.mean - 2.0 * self.sd).max(0.0), self.mean + 2.0 * self.sd)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct MaxSeats {
    pub party: Party,
    pub seats: u32,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ScenarioFrequency {
    pub label: String,
    pub pct: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SimulationReport {
    pub requested: usize,
    pub accepted: u64,
    pub discarded: u64,
    pub win_pct: PartyMap<f64>,
    pub hung_pct: f64,
    pub largest_pct: PartyMap<f64>,
    pub seats: PartyMap<Stats>,
    pub margin: Stats,
    pub max_seats: Option<MaxSeats>,
    pub scenarios: Vec<ScenarioFrequency>,
    pub pop_winner_pct: f64,
}
