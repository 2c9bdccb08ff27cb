//! # u-charging
//!
//! Makespan minimization for a fleet of battery-powered vehicles (EV/AGV)
//! sharing a set of jobs, where running out of charge forces a recharge
//! stop. A matheuristic seeds a schedule from two exact subproblems (bin
//! packing of job energies, generalized assignment to vehicles) and improves
//! it with a best-improvement local search.
//!
//! ## Modules
//!
//! - [`models`] — Instance, charge modes, and the assignment state
//! - [`evaluation`] — Completion-time cost models (fixed and variable charging)
//! - [`oracle`] — Subproblem oracle traits and exact reference oracles
//! - [`constructive`] — Seed states built from oracle results
//! - [`local_search`] — Add / Remove / Swap local search
//! - [`matheuristic`] — End-to-end coordinator, lower bounds, run report

pub mod constructive;
pub mod evaluation;
pub mod local_search;
pub mod matheuristic;
pub mod models;
pub mod oracle;
