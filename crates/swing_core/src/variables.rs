//! variables.rs
//! Simulation parameters with safe defaults, swing-reference mode, and
//! named scenario rules. Loaded from JSON by `swing_io`, overridden by the CLI.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::errors::CoreError;
use crate::party::Party;

/// ------------ Macros ------------

/// Define a serde'd enum with explicit wire tokens.
macro_rules! serde_enum {
    ($name:ident => { $($variant:ident = $token:expr),+ $(,)? }) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
        pub enum $name {
            $(
                #[serde(rename = $token)]
                $variant,
            )+
        }
    };
}

serde_enum!(SwingMode => {
    National = "national",
    Regional = "regional"
});

impl Default for SwingMode {
    fn default() -> Self {
        SwingMode::National
    }
}

/// ------------ Scenario rules ------------

/// A named boolean question evaluated against every realization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ScenarioRule {
    PartyHoldsSeat { party: Party, constituency: String },
    PartyWinsAnySeat { party: Party },
    PartyWipedOut { party: Party },
}

impl ScenarioRule {
    /// Stable, human-readable label; also the key in reports.
    pub fn label(&self) -> String {
        match self {
            ScenarioRule::PartyHoldsSeat { party, constituency } => {
                format!("{party} holds {constituency}")
            }
            ScenarioRule::PartyWinsAnySeat { party } => format!("{party} wins a seat"),
            ScenarioRule::PartyWipedOut { party } => format!("{party} wiped out"),
        }
    }

    pub fn default_set() -> Vec<ScenarioRule> {
        vec![
            ScenarioRule::PartyHoldsSeat {
                party: Party::Green,
                constituency: "Brighton, Pavilion".to_string(),
            },
            ScenarioRule::PartyWinsAnySeat { party: Party::Ukip },
            ScenarioRule::PartyWipedOut { party: Party::LibDem },
        ]
    }
}

/// ------------ Params ------------

pub const DEFAULT_RESULT_TOLERANCE: f64 = 0.02;
pub const DEFAULT_SUPPORT_VARIATION: f64 = 0.005;
pub const DEFAULT_SWING_SCALE_FACTOR: f64 = 1.5;
pub const DEFAULT_ITERATIONS: usize = 1000;
pub const DEFAULT_RESULT_TIMEOUT_SECS: u64 = 60;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SimParams {
    /// Max allowed |simulated national share − target share| per party.
    pub result_tolerance: f64,
    /// Half-width of the uniform noise added to each positive target share.
    pub support_variation: f64,
    /// Multiplier on the per-party variance.
    pub swing_scale_factor: f64,
    /// Accepted realizations per ensemble.
    pub iterations: usize,
    /// Worker threads; `None` means hardware parallelism.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub workers: Option<usize>,
    pub result_timeout_secs: u64,
    /// Bounded result channel size; `None` means 2 × workers.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub channel_capacity: Option<usize>,
    pub swing_mode: SwingMode,
    pub seed: u64,
    pub scenarios: Vec<ScenarioRule>,
}

impl Default for SimParams {
    fn default() -> Self {
        Self {
            result_tolerance: DEFAULT_RESULT_TOLERANCE,
            support_variation: DEFAULT_SUPPORT_VARIATION,
            swing_scale_factor: DEFAULT_SWING_SCALE_FACTOR,
            iterations: DEFAULT_ITERATIONS,
            workers: None,
            result_timeout_secs: DEFAULT_RESULT_TIMEOUT_SECS,
            channel_capacity: None,
            swing_mode: SwingMode::National,
            seed: 0,
            scenarios: ScenarioRule::default_set(),
        }
    }
}

impl SimParams {
    /// Validate numeric domains. Called once at setup, before any worker starts.
    pub fn validate_domains(&self) -> Result<(), CoreError> {
        if !(self.result_tolerance.is_finite() && self.result_tolerance > 0.0) {
            return Err(CoreError::DomainOutOfRange("result_tolerance"));
        }
        if !(self.support_variation.is_finite()
            && self.support_variation >= 0.0
            && self.support_variation < 1.0)
        {
            return Err(CoreError::DomainOutOfRange("support_variation"));
        }
        if !(self.swing_scale_factor.is_finite() && self.swing_scale_factor >= 0.0) {
            return Err(CoreError::DomainOutOfRange("swing_scale_factor"));
        }
        if self.iterations == 0 {
            return Err(CoreError::DomainOutOfRange("iterations"));
        }
        if self.workers == Some(0) {
            return Err(CoreError::DomainOutOfRange("workers"));
        }
        if self.channel_capacity == Some(0) {
            return Err(CoreError::DomainOutOfRange("channel_capacity"));
        }
        if self.result_timeout_secs == 0 {
            return Err(CoreError::DomainOutOfRange("result_timeout_secs"));
        }
        Ok(())
    }

    pub fn worker_count(&self) -> usize {
        self.workers.unwrap_or_else(|| {
            std::thread::available_parallelism().map(|n| n.get()).unwrap_or(1)
        })
    }

    pub fn channel_capacity(&self) -> usize {
        self.channel_capacity.unwrap_or_else(|| 2 * self.worker_count())
    }

    pub fn result_timeout(&self) -> Duration {
        Duration::from_secs(self.result_timeout_secs)
    }
}
