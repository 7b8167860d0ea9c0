//! Named scenario flags evaluated on every realization.
//!
//! Rules are compiled once against the dataset so seat lookups are by index.
//! A `PartyHoldsSeat` rule naming a seat the dataset lacks is kept (it always
//! reads false) and logged once at setup.

use log::warn;
use serde::Serialize;
use swing_core::{determinism::argmax_f64, Party, PartyMap, ScenarioRule, SupportRatio};

use crate::election::SeatResult;

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ScenarioOutcome {
    pub label: String,
    pub hit: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Check {
    Holds { party: Party, seat: Option<usize> },
    AnySeat(Party),
    WipedOut(Party),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CompiledRule {
    label: String,
    check: Check,
}

impl CompiledRule {
    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn evaluate(&self, seats: &[SeatResult], totals: &PartyMap<u32>) -> bool {
        match self.check {
            Check::Holds { party, seat } => seat
                .and_then(|i| seats.get(i))
                .map_or(false, |s| s.winner == party),
            Check::AnySeat(p) => totals[p] > 0,
            Check::WipedOut(p) => totals[p] == 0,
        }
    }
}

pub fn compile_rules<'a>(
    rules: &[ScenarioRule],
    names: impl IntoIterator<Item = &'a str>,
) -> Vec<CompiledRule> {
    let names: Vec<&str> = names.into_iter().collect();
    rules
        .iter()
        .map(|r| {
            let check = match r {
                ScenarioRule::PartyHoldsSeat { party, constituency } => {
                    let seat = names.iter().position(|n| *n == constituency.as_str());
                    if seat.is_none() {
                        warn!("scenario \"{}\": no constituency named {constituency}", r.label());
                    }
                    Check::Holds { party: *party, seat }
                }
                ScenarioRule::PartyWinsAnySeat { party } => Check::AnySeat(*party),
                ScenarioRule::PartyWipedOut { party } => Check::WipedOut(*party),
            };
            CompiledRule { label: r.label(), check }
        })
        .collect()
}

pub fn evaluate_all(
    rules: &[CompiledRule],
    seats: &[SeatResult],
    totals: &PartyMap<u32>,
) -> Vec<ScenarioOutcome> {
    rules
        .iter()
        .map(|r| ScenarioOutcome { label: r.label.clone(), hit: r.evaluate(seats, totals) })
        .collect()
}

/// True when the party with most seats also has the highest simulated vote
/// share (share ties go to canonical order).
pub fn seat_winner_is_pop_winner(largest: Party, support: &SupportRatio) -> bool {
    argmax_f64(support.iter()) == Some(largest)
}
