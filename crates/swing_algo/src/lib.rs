// crates/swing_algo/src/lib.rs
#![forbid(unsafe_code)]

//! Statistical core. Pure functions over `swing_core` values; the only side
//! effect anywhere in this crate is drawing from a caller-supplied `SimRng`.

pub mod predict;
pub mod resolve;
pub mod support;
pub mod swing;

// Convenience re-exports (pipeline imports these from crate root)
pub use predict::{predict_constituency, ConstituencyBasis};
pub use resolve::{resolve_constituency, Resolution};
pub use support::calculate_support;
pub use swing::{calculate_swing, SwingMatrix};
