//! Local search over charge-slot assignments.
//!
//! - [`LocalSearch`] — best-improvement driver and its configuration
//! - [`Move`] — Add, Remove, and Swap neighborhoods with exact savings
//! - [`best_two_excluding`] — critical vehicles and the competitor bound

mod engine;
mod moves;
mod rivals;

pub use engine::{run_local_search, LocalSearch, LocalSearchConfig, LocalSearchResult};
pub use moves::{Move, MoveKind, ScoredMove};
pub use rivals::{best_two_excluding, critical_machines, BestTwo};
