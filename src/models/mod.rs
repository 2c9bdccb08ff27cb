//! Domain model types for fleet scheduling with battery charging.
//!
//! Provides the immutable instance data (jobs, fleet, battery, charge
//! parameters), the mutable assignment state the local search improves, and
//! the error type for malformed inputs.

mod error;
mod instance;
mod state;

pub use error::ModelError;
pub use instance::{ChargeMode, Instance, InstanceRecord};
pub use state::{AssignmentState, Placement};
