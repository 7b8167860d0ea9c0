// crates/swing_pipeline/src/election.rs
//
// One realization of a general election: every constituency predicted and
// resolved, then seats tallied against the majority threshold.

use std::collections::BTreeMap;

use log::{debug, trace, warn};
use serde::Serialize;
use swing_algo::{
    calculate_support, calculate_swing, predict_constituency, resolve_constituency,
    ConstituencyBasis, SwingMatrix,
};
use swing_core::{
    determinism::sort_desc_by_value, Dataset, Party, PartyMap, SimParams, SimRng, SupportRatio,
    SwingMode, VoteCount,
};

use crate::scenario::{compile_rules, evaluate_all, seat_winner_is_pop_winner, CompiledRule, ScenarioOutcome};
use crate::PipelineError;

// ----------------------------- Inputs -----------------------------

/// Target vote shares for one realization (or the immutable base they are perturbed from).
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Targets {
    pub national: SupportRatio,
    /// Per-region targets, used only in `SwingMode::Regional`.
    pub regional: BTreeMap<String, SupportRatio>,
}

impl Targets {
    pub fn national(national: SupportRatio) -> Self {
        Self { national, regional: BTreeMap::new() }
    }
}

#[derive(Clone, Debug)]
struct PreparedSeat {
    name: String,
    region: String,
    basis: ConstituencyBasis,
}

/// Everything derived from the dataset that stays fixed across realizations.
/// Shared read-only by all workers.
#[derive(Clone, Debug)]
pub struct ElectionModel {
    seats: Vec<PreparedSeat>,
    national_prev1: SupportRatio,
    regional_prev1: BTreeMap<String, SupportRatio>,
    rules: Vec<CompiledRule>,
    params: SimParams,
}

impl ElectionModel {
    /// Validate parameters and precompute per-seat support and historical swing.
    pub fn new(dataset: &Dataset, params: SimParams) -> Result<Self, PipelineError> {
        params.validate_domains()?;
        if dataset.is_empty() {
            return Err(PipelineError::Setup("dataset has no constituencies".into()));
        }

        let mut seats = Vec::with_capacity(dataset.len());
        for c in &dataset.constituencies {
            let basis = ConstituencyBasis::prepare(c)
                .map_err(|e| PipelineError::Setup(format!("{}: {e}", c.name)))?;
            seats.push(PreparedSeat { name: c.name.clone(), region: c.region.clone(), basis });
        }

        let national_prev1 = calculate_support(&dataset.prev1_totals(None))?;
        let mut regional_prev1 = BTreeMap::new();
        for region in dataset.regions() {
            let s = calculate_support(&dataset.prev1_totals(Some(region)))?;
            regional_prev1.insert(region.to_string(), s);
        }

        let rules = compile_rules(
            &params.scenarios,
            dataset.constituencies.iter().map(|c| c.name.as_str()),
        );

        debug!(
            "model ready: {} seats, {} regions, majority threshold {}",
            seats.len(),
            regional_prev1.len(),
            majority_threshold(seats.len())
        );
        Ok(Self { seats, national_prev1, regional_prev1, rules, params })
    }

    pub fn params(&self) -> &SimParams {
        &self.params
    }

    pub fn seat_count(&self) -> usize {
        self.seats.len()
    }

    pub fn rules(&self) -> &[CompiledRule] {
        &self.rules
    }

    /// Log mismatches between the targets and the dataset's regions.
    pub fn check_targets(&self, targets: &Targets) {
        for region in targets.regional.keys() {
            if !self.regional_prev1.contains_key(region) {
                warn!("regional target for unknown region {region} is ignored");
            }
        }
        if self.params.swing_mode == SwingMode::Regional && targets.regional.is_empty() {
            warn!("regional swing requested but no regional targets given; using national swing");
        }
    }

    /// Predict and resolve every seat against already-perturbed `targets`.
    pub fn simulate(&self, targets: &Targets, rng: &mut SimRng) -> Realization {
        let national = calculate_swing(&self.national_prev1, &targets.national);

        let mut regional: BTreeMap<&str, (SwingMatrix, &SupportRatio)> = BTreeMap::new();
        if self.params.swing_mode == SwingMode::Regional {
            for (region, t) in &targets.regional {
                if let Some(prev) = self.regional_prev1.get(region) {
                    regional.insert(region.as_str(), (calculate_swing(prev, t), t));
                }
            }
        }

        let mut seats = Vec::with_capacity(self.seats.len());
        for s in &self.seats {
            let (general, target) = match regional.get(s.region.as_str()) {
                Some((m, t)) => (m, *t),
                None => (&national, &targets.national),
            };
            let votes = predict_constituency(&s.basis, general, target, self.params.swing_scale_factor, rng);
            let r = resolve_constituency(&votes, rng);
            trace!("{}: {} (tie width {})", s.name, r.winner, r.tie_width);
            seats.push(SeatResult {
                name: s.name.clone(),
                region: s.region.clone(),
                votes,
                winner: r.winner,
                tie_width: r.tie_width,
            });
        }

        Realization::from_seats(seats, &targets.national, &self.rules, self.params.result_tolerance)
    }
}

// ----------------------------- Outputs -----------------------------

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SeatResult {
    pub name: String,
    pub region: String,
    pub votes: VoteCount,
    pub winner: Party,
    pub tie_width: usize,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct RankEntry {
    pub party: Party,
    pub seats: u32,
}

/// One complete simulated election.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Realization {
    pub seats: Vec<SeatResult>,
    pub seat_totals: PartyMap<u32>,
    pub votes: VoteCount,
    /// Simulated national vote share.
    pub support: SupportRatio,
    /// The (perturbed) national target this realization was steered toward.
    pub target: SupportRatio,
    pub ranking: Vec<RankEntry>,
    pub largest_party: Party,
    pub threshold: u32,
    pub margin: i64,
    /// `None` = hung parliament.
    pub winner: Option<Party>,
    pub scenarios: Vec<ScenarioOutcome>,
    pub seat_winner_is_pop_winner: bool,
    pub too_divergent: bool,
    pub ties_resolved: usize,
    pub summary: String,
}

/// Seats needed for a majority: ceil(n / 2).
pub fn majority_threshold(n: usize) -> u32 {
    ((n + 1) / 2) as u32
}

impl Realization {
    pub fn from_seats(
        seats: Vec<SeatResult>,
        target: &SupportRatio,
        rules: &[CompiledRule],
        tolerance: f64,
    ) -> Self {
        let mut seat_totals = PartyMap::splat(0u32);
        let mut votes = VoteCount::default();
        let mut ties_resolved = 0;
        for s in &seats {
            seat_totals[s.winner] += 1;
            votes.accumulate(&s.votes);
            if s.tie_width > 1 {
                ties_resolved += 1;
            }
        }

        let support = SupportRatio::renormalize(votes.as_map().map(|_, &v| v as f64)).unwrap_or_default();

        let mut rows: Vec<(Party, u32)> = seat_totals.iter().map(|(p, &n)| (p, n)).collect();
        sort_desc_by_value(&mut rows);
        let ranking: Vec<RankEntry> = rows.iter().map(|&(party, seats)| RankEntry { party, seats }).collect();
        let largest_party = ranking.first().map_or(Party::ALL[0], |r| r.party);

        let threshold = majority_threshold(seats.len());
        let margin = i64::from(seat_totals[largest_party]) - i64::from(threshold);
        let winner = (margin >= 0).then_some(largest_party);
        let summary = match winner {
            Some(p) => format!("{p} victory (majority {margin})"),
            None => format!("Hung Parliament ({largest_party} needs {})", -margin),
        };

        let scenarios = evaluate_all(rules, &seats, &seat_totals);
        let seat_winner_is_pop_winner = seat_winner_is_pop_winner(largest_party, &support);
        let too_divergent = Party::ALL
            .iter()
            .any(|&p| (support.get(p) - target.get(p)).abs() > tolerance);

        Self {
            seats,
            seat_totals,
            votes,
            support,
            target: *target,
            ranking,
            largest_party,
            threshold,
            margin,
            winner,
            scenarios,
            seat_winner_is_pop_winner,
            too_divergent,
            ties_resolved,
            summary,
        }
    }

    pub fn is_hung(&self) -> bool {
        self.winner.is_none()
    }
}
