//! Fixed-duration charging.

use super::{CostModel, TieBreak};

/// Every recharge takes the same time, regardless of energy consumed.
///
/// A vehicle with `k` active slots recharges `k - 1` times, so its
/// completion time is `busy + duration * (k - 1)`.
///
/// # Examples
///
/// ```
/// use u_charging::evaluation::{CostModel, FixedCharge};
///
/// let model = FixedCharge::new(2.0);
/// assert_eq!(model.completion_time(10.0, &[4.0, 5.0, 1.0]), 14.0);
/// // Opening a fourth slot costs one more recharge.
/// assert_eq!(model.insertion_cost(&[4.0, 5.0, 1.0], 3, 2.0), 2.0);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FixedCharge {
    duration: f64,
}

impl FixedCharge {
    /// Creates a model with the given recharge duration.
    pub fn new(duration: f64) -> Self {
        Self { duration }
    }

    /// Time per recharge.
    pub fn duration(&self) -> f64 {
        self.duration
    }
}

impl CostModel for FixedCharge {
    fn charge_overhead(&self, slot_energy: &[f64]) -> f64 {
        self.duration * slot_energy.len().saturating_sub(1) as f64
    }

    fn insertion_cost(&self, slot_energy: &[f64], slot: usize, _energy: f64) -> f64 {
        if slot >= slot_energy.len() {
            self.duration
        } else {
            0.0
        }
    }

    fn removal_cost(&self, slot_energy: &[f64], _slot: usize, _energy: f64, empties: bool) -> f64 {
        if empties && slot_energy.len() > 1 {
            -self.duration
        } else {
            0.0
        }
    }

    fn exchange_cost(&self, _: &[f64], _: usize, _: f64, _: f64) -> f64 {
        0.0
    }

    fn default_tie_break(&self) -> TieBreak {
        TieBreak::Shuffle
    }
}
