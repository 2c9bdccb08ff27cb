//! Initial-solution builders that turn oracle results into an
//! [`AssignmentState`](crate::models::AssignmentState).
//!
//! - [`from_constrained`] — jobs assigned directly to vehicles, one charge each
//! - [`from_charge_groups`] — packed charge groups assigned to vehicles

mod seed;

pub use seed::{from_charge_groups, from_constrained};
