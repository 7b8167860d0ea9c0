//! swing_pipeline: election aggregation and the Monte Carlo ensemble.
//!
//! Stages: prepare (`election::ElectionModel`) → per-realization perturb + predict +
//! resolve + aggregate (`election`, `scenario`) → fold into an ensemble
//! (`ensemble`) across worker threads (`montecarlo`). `polls` repeats the
//! ensemble once per opinion poll.
//!
//! Loading lives in `swing_io`, the statistical core in `swing_algo`.

#![forbid(unsafe_code)]

use swing_core::CoreError;
use swing_io::IoError;
use thiserror::Error;

pub mod election;
pub mod ensemble;
pub mod montecarlo;
pub mod polls;
pub mod scenario;

pub use election::{majority_threshold, ElectionModel, Realization, SeatResult, Targets};
pub use ensemble::{EnsembleAccumulator, SimulationReport};
pub use montecarlo::{
    run_ensemble, run_monte_carlo, run_sequential, simulate_once, Progress, RunOptions, RunnerError,
};
pub use polls::{run_poll_series, sort_and_dedup, PollSeries};

/// Single error surface for pipeline orchestration.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Io(#[from] IoError),
    #[error("invalid input: {0}")]
    Core(#[from] CoreError),
    #[error("setup: {0}")]
    Setup(String),
    #[error(transparent)]
    Run(#[from] RunnerError),
}
