// crates/swing_core/src/votes.rs
//
// Vote counts and support ratios. A party missing from an input mapping is
// stored as 0, so absent and zero behave identically downstream.

use log::warn;
use serde::{Deserialize, Serialize};

use crate::errors::CoreError;
use crate::party::{Party, PartyMap};

/// Validation tolerance on Σ support.
pub const SUPPORT_TOLERANCE: f64 = 1e-6;

// ---------------------------------- VoteCount ----------------------------------

/// Per-party vote counts for one constituency in one election.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VoteCount(PartyMap<u64>);

impl VoteCount {
    pub fn new(map: PartyMap<u64>) -> Self {
        Self(map)
    }

    /// Build from named-party counts and the total votes cast. `Other` takes
    /// `total − Σ named`, clamped at 0; any `Other` slot in `named` is ignored.
    pub fn from_named_with_total(named: PartyMap<u64>, total: u64) -> Self {
        let mut map = named;
        map.set(Party::Other, 0);
        let named_sum: u64 = map.values().sum();
        if named_sum > total {
            warn!(
                "named votes ({named_sum}) exceed total votes ({total}); Other clamped to 0"
            );
        }
        map.set(Party::Other, total.saturating_sub(named_sum));
        Self(map)
    }

    #[inline]
    pub fn get(&self, p: Party) -> u64 {
        self.0[p]
    }

    #[inline]
    pub fn set(&mut self, p: Party, v: u64) {
        self.0.set(p, v);
    }

    pub fn total(&self) -> u64 {
        self.0.values().sum()
    }

    pub fn as_map(&self) -> &PartyMap<u64> {
        &self.0
    }

    pub fn iter(&self) -> impl Iterator<Item = (Party, u64)> + '_ {
        self.0.iter().map(|(p, v)| (p, *v))
    }

    /// Saturating element-wise sum.
    pub fn accumulate(&mut self, other: &VoteCount) {
        for (p, v) in self.0.iter_mut() {
            *v = v.saturating_add(other.get(p));
        }
    }
}

// --------------------------------- SupportRatio ---------------------------------

/// Per-party share of total votes, each in [0, 1], summing to 1.
#[derive(Clone, Copy, Debug, PartialEq, Default, Serialize, Deserialize)]
#[serde(try_from = "PartyMap<f64>", into = "PartyMap<f64>")]
pub struct SupportRatio(PartyMap<f64>);

impl SupportRatio {
    /// Validated constructor.
    pub fn new(map: PartyMap<f64>) -> Result<Self, CoreError> {
        for (party, &value) in map.iter() {
            if !value.is_finite() || !(0.0..=1.0 + SUPPORT_TOLERANCE).contains(&value) {
                return Err(CoreError::SupportOutOfRange { party, value });
            }
        }
        let sum: f64 = map.values().sum();
        if (sum - 1.0).abs() > SUPPORT_TOLERANCE {
            return Err(CoreError::SupportNotNormalized { sum });
        }
        Ok(Self(map))
    }

    /// Wraps shares the caller has already normalized.
    pub fn from_normalized(map: PartyMap<f64>) -> Self {
        Self(map)
    }

    /// Divide non-negative weights through by their sum. `None` when the sum is 0.
    pub fn renormalize(weights: PartyMap<f64>) -> Option<Self> {
        let sum: f64 = weights.values().sum();
        if !(sum.is_finite() && sum > 0.0) {
            return None;
        }
        Some(Self(weights.map(|_, w| w / sum)))
    }

    /// Named-party percentages (0..=100); `Other` becomes `100 − Σ named` and
    /// any `Other` slot passed in is ignored.
    pub fn from_percentages(named: &PartyMap<f64>) -> Result<Self, CoreError> {
        let mut map = PartyMap::splat(0.0);
        let mut sum_pct = 0.0;
        for p in Party::named() {
            let pct = named[p];
            if !pct.is_finite() || pct < 0.0 || pct > 100.0 {
                return Err(CoreError::SupportOutOfRange { party: p, value: pct / 100.0 });
            }
            sum_pct += pct;
            map.set(p, pct / 100.0);
        }
        if sum_pct > 100.0 + 1e-9 {
            return Err(CoreError::NamedSupportExceedsTotal { sum_pct });
        }
        map.set(Party::Other, ((100.0 - sum_pct) / 100.0).max(0.0));
        Ok(Self(map))
    }

    #[inline]
    pub fn get(&self, p: Party) -> f64 {
        self.0[p]
    }

    pub fn sum(&self) -> f64 {
        self.0.values().sum()
    }

    pub fn as_map(&self) -> &PartyMap<f64> {
        &self.0
    }

    pub fn iter(&self) -> impl Iterator<Item = (Party, f64)> + '_ {
        self.0.iter().map(|(p, v)| (p, *v))
    }
}

impl TryFrom<PartyMap<f64>> for SupportRatio {
    type Error = CoreError;
    fn try_from(map: PartyMap<f64>) -> Result<Self, Self::Error> {
        SupportRatio::new(map)
    }
}

impl From<SupportRatio> for PartyMap<f64> {
    fn from(s: SupportRatio) -> Self {
        s.0
    }
}
