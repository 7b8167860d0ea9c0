//! swing_core: Core types, party domain, vote/support value types, seeded RNG.
//!
//! This crate is **I/O-free**. It defines the stable types used across the
//! engine (`swing_io`, `swing_algo`, `swing_pipeline`, `swing_report`, `swing_cli`).
//!
//! - Closed party enumeration + fixed-size `PartyMap<T>`
//! - Historical constituency records (`Constituency`, `Dataset`)
//! - `VoteCount` / `SupportRatio` value types with their invariants
//! - Simulation parameters and scenario rules (`SimParams`, `ScenarioRule`)
//! - Seedable RNG (ChaCha20) with per-worker streams
//!
//! Everything here is immutable once built; per-realization state lives in
//! `swing_pipeline`.

#![forbid(unsafe_code)]

pub mod errors {
    use core::fmt;

    use crate::party::Party;

    /// Error set for core-domain validation & parsing.
    #[derive(Clone, Debug, PartialEq)]
    pub enum CoreError {
        /// A vote count summed to zero; support cannot be derived.
        ZeroTotalVotes,
        /// Party token not recognised.
        UnknownParty(String),
        /// A support share outside [0, 1] (or not finite).
        SupportOutOfRange { party: Party, value: f64 },
        /// Shares did not sum to 1.0 within tolerance.
        SupportNotNormalized { sum: f64 },
        /// Named shares exceeded 100% before Other was filled in.
        NamedSupportExceedsTotal { sum_pct: f64 },
        DomainOutOfRange(&'static str),
        EmptyChoiceSet,
    }

    impl fmt::Display for CoreError {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            match self {
                CoreError::ZeroTotalVotes => write!(f, "total votes is zero"),
                CoreError::UnknownParty(t) => write!(f, "unknown party: {t}"),
                CoreError::SupportOutOfRange { party, value } => {
                    write!(f, "support for {party} out of range: {value}")
                }
                CoreError::SupportNotNormalized { sum } => {
                    write!(f, "support does not sum to 1.0 (sum = {sum})")
                }
                CoreError::NamedSupportExceedsTotal { sum_pct } => {
                    write!(f, "named party support exceeds 100% ({sum_pct}%)")
                }
                CoreError::DomainOutOfRange(k) => write!(f, "domain out of range: {k}"),
                CoreError::EmptyChoiceSet => write!(f, "empty choice set"),
            }
        }
    }

    impl std::error::Error for CoreError {}
}

pub mod entities;
pub mod party;
pub mod rng;
pub mod variables;
pub mod votes;

pub use entities::{Constituency, Dataset};
pub use errors::CoreError;
pub use party::{Party, PartyMap};
pub use rng::SimRng;
pub use variables::{ScenarioRule, SimParams, SwingMode};
pub use votes::{SupportRatio, VoteCount};

pub mod determinism {
    //! Stable ordering helpers.

    use core::cmp::Ordering;

    use crate::party::Party;

    /// Sort `(party, value)` pairs by value descending, then canonical party order.
    pub fn sort_desc_by_value<T: Ord + Copy>(rows: &mut [(Party, T)]) {
        rows.sort_by(|a, b| match b.1.cmp(&a.1) {
            Ordering::Equal => a.0.cmp(&b.0),
            o => o,
        });
    }

    /// First party (in canonical order) holding the maximum of `f`.
    /// Float variant: NaN never wins.
    pub fn argmax_f64(values: impl Iterator<Item = (Party, f64)>) -> Option<Party> {
        let mut best: Option<(Party, f64)> = None;
        for (p, v) in values {
            match best {
                None if !v.is_nan() => best = Some((p, v)),
                Some((_, b)) if v > b => best = Some((p, v)),
                _ => {}
            }
        }
        best.map(|(p, _)| p)
    }

}
