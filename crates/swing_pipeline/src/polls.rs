// crates/swing_pipeline/src/polls.rs
//
// One full ensemble per opinion poll, in date order, plus per-party seat trends.

use std::cmp::Ordering;
use std::sync::Arc;

use chrono::NaiveDate;
use log::info;
use serde::Serialize;
use swing_core::{Party, PartyMap};
use swing_io::prelude::PollRecord;

use crate::election::{ElectionModel, Targets};
use crate::ensemble::SimulationReport;
use crate::montecarlo::{run_monte_carlo, Progress, RunOptions};
use crate::PipelineError;

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PollOutcome {
    pub poll: PollRecord,
    pub report: SimulationReport,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SeatTrend {
    pub date: NaiveDate,
    pub mean: f64,
    pub sd: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PollSeries {
    pub outcomes: Vec<PollOutcome>,
    pub trends: PartyMap<Vec<SeatTrend>>,
}

/// Stable sort by date, pollster, sponsor and shares, then drop exact repeats
/// (same date, pollster, sponsor and shares). Repeats are adjacent after the
/// sort, so the first of each run is kept. Sample size is not compared.
pub fn sort_and_dedup(mut polls: Vec<PollRecord>) -> Vec<PollRecord> {
    polls.sort_by(poll_order);
    polls.dedup_by(|b, a| poll_order(a, b) == Ordering::Equal);
    polls
}

fn poll_order(a: &PollRecord, b: &PollRecord) -> Ordering {
    a.date
        .cmp(&b.date)
        .then_with(|| a.pollster.cmp(&b.pollster))
        .then_with(|| a.sponsor.cmp(&b.sponsor))
        .then_with(|| {
            Party::ALL
                .iter()
                .map(|&p| a.shares[p].total_cmp(&b.shares[p]))
                .find(|o| o.is_ne())
                .unwrap_or(Ordering::Equal)
        })
}

/// Run the ensemble for every poll. Poll `i` (after sorting) uses seed
/// `opts.seed + i`, so each poll is reproducible on its own.
pub fn run_poll_series(
    model: &Arc<ElectionModel>,
    polls: Vec<PollRecord>,
    opts: &RunOptions,
    progress: Option<&dyn Fn(&Progress)>,
) -> Result<PollSeries, PipelineError> {
    let polls = sort_and_dedup(polls);
    let mut outcomes = Vec::with_capacity(polls.len());
    let mut trends: PartyMap<Vec<SeatTrend>> = PartyMap::from_fn(|_| Vec::new());

    for (i, poll) in polls.into_iter().enumerate() {
        let support = poll.support()?;
        let poll_opts = RunOptions { seed: opts.seed.wrapping_add(i as u64), ..opts.clone() };
        info!("poll {} {} ({})", poll.date, poll.pollster, i + 1);
        let report = run_monte_carlo(model, Targets::national(support), &poll_opts, progress)?;
        for p in Party::ALL {
            let s = report.seats[p];
            trends[p].push(SeatTrend { date: poll.date, mean: s.mean, sd: s.sd });
        }
        outcomes.push(PollOutcome { poll, report });
    }
    Ok(PollSeries { outcomes, trends })
}
