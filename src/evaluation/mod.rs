//! Completion-time evaluation under the two charging regimes.
//!
//! - [`CostModel`] — capability interface used by the local search
//! - [`FixedCharge`] — every recharge takes a constant time
//! - [`VariableCharge`] — recharge time proportional to the energy consumed

pub(crate) mod cost_model;
mod fixed;
mod variable;

pub use cost_model::{CostModel, TieBreak, EPSILON};
pub use fixed::FixedCharge;
pub use variable::VariableCharge;

use crate::models::ChargeMode;

/// The cost model matching an instance's charge mode.
///
/// Lets callers that only hold a [`ChargeMode`] price schedules without
/// matching on it themselves.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AnyCharge {
    /// Fixed-duration charging.
    Fixed(FixedCharge),
    /// Energy-proportional charging.
    Variable(VariableCharge),
}

impl From<ChargeMode> for AnyCharge {
    fn from(mode: ChargeMode) -> Self {
        match mode {
            ChargeMode::Fixed { duration } => Self::Fixed(FixedCharge::new(duration)),
            ChargeMode::Variable { rate, setup } => {
                Self::Variable(VariableCharge::new(rate).with_setup(setup))
            }
        }
    }
}

impl CostModel for AnyCharge {
    fn charge_overhead(&self, slot_energy: &[f64]) -> f64 {
        match self {
            Self::Fixed(m) => m.charge_overhead(slot_energy),
            Self::Variable(m) => m.charge_overhead(slot_energy),
        }
    }

    fn insertion_cost(&self, slot_energy: &[f64], slot: usize, energy: f64) -> f64 {
        match self {
            Self::Fixed(m) => m.insertion_cost(slot_energy, slot, energy),
            Self::Variable(m) => m.insertion_cost(slot_energy, slot, energy),
        }
    }

    fn removal_cost(&self, slot_energy: &[f64], slot: usize, energy: f64, empties: bool) -> f64 {
        match self {
            Self::Fixed(m) => m.removal_cost(slot_energy, slot, energy, empties),
            Self::Variable(m) => m.removal_cost(slot_energy, slot, energy, empties),
        }
    }

    fn exchange_cost(&self, slot_energy: &[f64], slot: usize, energy_out: f64, energy_in: f64)
        -> f64 {
        match self {
            Self::Fixed(m) => m.exchange_cost(slot_energy, slot, energy_out, energy_in),
            Self::Variable(m) => m.exchange_cost(slot_energy, slot, energy_out, energy_in),
        }
    }

    fn default_tie_break(&self) -> TieBreak {
        match self {
            Self::Fixed(m) => m.default_tie_break(),
            Self::Variable(m) => m.default_tie_break(),
        }
    }
}
