//! crates/swing_report/src/structure.rs
//! Report data model + mappers from pipeline results.
//! Figures are formatted here once; renderers only lay them out.

use serde::Serialize;
use swing_core::{Party, SimParams, SwingMode};
use swing_pipeline::polls::PollSeries;
use swing_pipeline::{Realization, SimulationReport};

use crate::ReportError;

// -------------------- Run record --------------------

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunMode {
    SingleElection,
    MonteCarlo,
    PollSeries,
}

impl RunMode {
    pub fn as_str(self) -> &'static str {
        match self {
            RunMode::SingleElection => "single_election",
            RunMode::MonteCarlo => "monte_carlo",
            RunMode::PollSeries => "poll_series",
        }
    }

    fn title(self) -> &'static str {
        match self {
            RunMode::SingleElection => "Single election",
            RunMode::MonteCarlo => "Monte Carlo ensemble",
            RunMode::PollSeries => "Poll series",
        }
    }
}

/// Enough to re-run: engine, seed, effective parameters and input digests.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct RunRecord {
    pub engine: String,
    pub version: String,
    pub mode: RunMode,
    pub seed: u64,
    pub workers: usize,
    pub dataset_sha256: String,
    pub params_sha256: String,
    pub params: SimParams,
}

impl RunRecord {
    pub fn new(mode: RunMode, params: &SimParams, dataset_sha256: &str, params_sha256: &str) -> Self {
        Self {
            engine: "swingometer".into(),
            version: env!("CARGO_PKG_VERSION").into(),
            mode,
            seed: params.seed,
            workers: params.worker_count(),
            dataset_sha256: dataset_sha256.into(),
            params_sha256: params_sha256.into(),
            params: params.clone(),
        }
    }
}

// -------------------- Model --------------------

#[derive(Clone, Debug)]
pub struct ReportModel {
    pub title: String,
    pub run: RunRecord,
    pub body: ReportBody,
    /// The unformatted pipeline result, emitted verbatim under `"data"`.
    pub data: serde_json::Value,
}

#[derive(Clone, Debug)]
pub enum ReportBody {
    Election(ElectionBlock),
    Ensemble(EnsembleBlock),
    Polls(PollsBlock),
}

#[derive(Clone, Debug, PartialEq)]
pub struct FlagRow {
    pub label: String,
    pub value: String,
}

#[derive(Clone, Debug, PartialEq)]
pub struct SeatRow {
    pub party: Party,
    pub seats: u32,
    pub share_pct: String,
    pub target_pct: String,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ElectionBlock {
    pub summary: String,
    pub hung: bool,
    pub total_seats: usize,
    pub threshold: u32,
    pub rows: Vec<SeatRow>,
    pub scenarios: Vec<FlagRow>,
    pub seat_winner_is_pop_winner: bool,
    pub ties_resolved: usize,
    pub too_divergent: bool,
}

#[derive(Clone, Debug, PartialEq)]
pub struct EnsembleRow {
    pub party: Party,
    pub win_pct: String,
    pub largest_pct: String,
    pub seats_mean: String,
    pub seats_sd: String,
    /// mean ± 2 sd, lower bound clamped at zero.
    pub band95: (String, String),
}

#[derive(Clone, Debug, PartialEq)]
pub struct EnsembleBlock {
    pub requested: usize,
    pub accepted: u64,
    pub discarded: u64,
    pub rows: Vec<EnsembleRow>,
    pub hung_pct: String,
    pub margin_mean: String,
    pub margin_sd: String,
    pub max_seats: Option<String>,
    pub scenarios: Vec<FlagRow>,
    pub pop_winner_pct: String,
}

#[derive(Clone, Debug, PartialEq)]
pub struct PollRow {
    pub date: String,
    pub pollster: String,
    pub sponsor: String,
    pub sample_size: u64,
    /// Party with the highest mean seat count in that poll's ensemble.
    pub leader: Party,
    pub leader_seats_mean: String,
    pub hung_pct: String,
}

#[derive(Clone, Debug, PartialEq)]
pub struct TrendRow {
    pub party: Party,
    /// (date, mean, sd)
    pub points: Vec<(String, String, String)>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct PollsBlock {
    pub polls: Vec<PollRow>,
    pub trends: Vec<TrendRow>,
}

// -------------------- Formatting --------------------

pub(crate) fn pct_1dp(v: f64) -> String {
    format!("{v:.1}%")
}

pub(crate) fn num_1dp(v: f64) -> String {
    format!("{v:.1}")
}

fn yes_no(b: bool) -> String {
    let s = if b { "yes" } else { "no" };
    s.to_string()
}

fn title(mode: RunMode, params: &SimParams) -> String {
    let swing = match params.swing_mode {
        SwingMode::National => "national swing",
        SwingMode::Regional => "regional swing",
    };
    format!("{} ({swing})", mode.title())
}

// -------------------- Mappers --------------------

pub fn build_election(run: RunRecord, r: &Realization) -> Result<ReportModel, ReportError> {
    // Ranking order; parties with neither seats nor votes are left out.
    let rows = r
        .ranking
        .iter()
        .filter(|e| e.seats > 0 || r.support.get(e.party) > 0.0)
        .map(|e| SeatRow {
            party: e.party,
            seats: e.seats,
            share_pct: pct_1dp(r.support.get(e.party) * 100.0),
            target_pct: pct_1dp(r.target.get(e.party) * 100.0),
        })
        .collect();
    let scenarios = r
        .scenarios
        .iter()
        .map(|o| FlagRow { label: o.label.clone(), value: yes_no(o.hit) })
        .collect();

    let block = ElectionBlock {
        summary: r.summary.clone(),
        hung: r.is_hung(),
        total_seats: r.seats.len(),
        threshold: r.threshold,
        rows,
        scenarios,
        seat_winner_is_pop_winner: r.seat_winner_is_pop_winner,
        ties_resolved: r.ties_resolved,
        too_divergent: r.too_divergent,
    };
    Ok(ReportModel {
        title: title(run.mode, &run.params),
        data: serde_json::to_value(r)?,
        run,
        body: ReportBody::Election(block),
    })
}

pub fn build_ensemble(run: RunRecord, rep: &SimulationReport) -> Result<ReportModel, ReportError> {
    let block = ensemble_block(rep);
    Ok(ReportModel {
        title: title(run.mode, &run.params),
        data: serde_json::to_value(rep)?,
        run,
        body: ReportBody::Ensemble(block),
    })
}

fn ensemble_block(rep: &SimulationReport) -> EnsembleBlock {
    let rows = Party::ALL
        .iter()
        .filter(|&&p| rep.seats[p].mean > 0.0 || rep.win_pct[p] > 0.0)
        .map(|&p| {
            let s = rep.seats[p];
            let (lo, hi) = s.band95();
            EnsembleRow {
                party: p,
                win_pct: pct_1dp(rep.win_pct[p]),
                largest_pct: pct_1dp(rep.largest_pct[p]),
                seats_mean: num_1dp(s.mean),
                seats_sd: num_1dp(s.sd),
                band95: (num_1dp(lo), num_1dp(hi)),
            }
        })
        .collect();

    EnsembleBlock {
        requested: rep.requested,
        accepted: rep.accepted,
        discarded: rep.discarded,
        rows,
        hung_pct: pct_1dp(rep.hung_pct),
        margin_mean: num_1dp(rep.margin.mean),
        margin_sd: num_1dp(rep.margin.sd),
        max_seats: rep.max_seats.map(|m| format!("{} {}", m.party, m.seats)),
        scenarios: rep
            .scenarios
            .iter()
            .map(|s| FlagRow { label: s.label.clone(), value: pct_1dp(s.pct) })
            .collect(),
        pop_winner_pct: pct_1dp(rep.pop_winner_pct),
    }
}

pub fn build_poll_series(run: RunRecord, series: &PollSeries) -> Result<ReportModel, ReportError> {
    let polls = series
        .outcomes
        .iter()
        .map(|o| {
            // Highest mean; equal means go to the earlier party.
            let leader = Party::ALL
                .iter()
                .copied()
                .fold(Party::ALL[0], |best, p| {
                    if o.report.seats[p].mean > o.report.seats[best].mean { p } else { best }
                });
            PollRow {
                date: o.poll.date.to_string(),
                pollster: o.poll.pollster.clone(),
                sponsor: o.poll.sponsor.clone(),
                sample_size: o.poll.sample_size,
                leader,
                leader_seats_mean: num_1dp(o.report.seats[leader].mean),
                hung_pct: pct_1dp(o.report.hung_pct),
            }
        })
        .collect();

    let trends = Party::ALL
        .iter()
        .filter(|&&p| series.trends[p].iter().any(|t| t.mean > 0.0))
        .map(|&p| TrendRow {
            party: p,
            points: series.trends[p]
                .iter()
                .map(|t| (t.date.to_string(), num_1dp(t.mean), num_1dp(t.sd)))
                .collect(),
        })
        .collect();

    Ok(ReportModel {
        title: title(run.mode, &run.params),
        data: serde_json::to_value(series)?,
        run,
        body: ReportBody::Polls(PollsBlock { polls, trends }),
    })
}
