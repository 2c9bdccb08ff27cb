//! End-to-end coordinator: oracles for the seed, local search to improve it.
//!
//! - [`Matheuristic`] — runs packing, assignment, and local search
//! - [`lower_bound`] — makespan lower bounds for both charge modes
//! - [`RunReport`] — bounds, gap, seed path, and stage timings of a run

mod bounds;
mod coordinator;
mod error;

pub use bounds::{fixed_lower_bound, gap, lower_bound, variable_lower_bound};
pub use coordinator::{
    Matheuristic, MatheuristicConfig, MatheuristicOutcome, RunReport, SeedPath, StageTimings,
};
pub use error::SolveError;
