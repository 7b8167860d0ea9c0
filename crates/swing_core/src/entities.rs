//! entities.rs: Historical constituency records and the immutable dataset.
//!
//! Loaded once by `swing_io` and then shared read-only (behind `Arc`) by every
//! worker. Per-realization results live in `swing_pipeline`.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::votes::VoteCount;

/// One seat with its two prior results. `prev2` is the older election.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Constituency {
    pub name: String,
    pub region: String,
    pub prev2: VoteCount,
    pub prev1: VoteCount,
}

/// All constituencies in load order. Names are unique (checked by the loader).
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dataset {
    pub constituencies: Vec<Constituency>,
}

impl Dataset {
    pub fn new(constituencies: Vec<Constituency>) -> Self {
        Self { constituencies }
    }

    pub fn len(&self) -> usize {
        self.constituencies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.constituencies.is_empty()
    }

    /// Distinct region names, sorted.
    pub fn regions(&self) -> BTreeSet<&str> {
        self.constituencies.iter().map(|c| c.region.as_str()).collect()
    }

    /// Σ prev1 votes across every constituency, optionally restricted to one region.
    pub fn prev1_totals(&self, region: Option<&str>) -> VoteCount {
        let mut acc = VoteCount::default();
        for c in self
            .constituencies
            .iter()
            .filter(|c| region.map_or(true, |r| c.region == r))
        {
            acc.accumulate(&c.prev1);
        }
        acc
    }
}
