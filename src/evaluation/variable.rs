//! Energy-proportional (variable-duration) charging.

use super::{CostModel, TieBreak};

/// The recharge before slot `r + 1` restores what slot `r` consumed.
///
/// With `k` active slots and slot energies `E[0..k]`, the completion time is
///
/// ```text
/// busy + setup * (k - 1) + rate * (E[0] + ... + E[k - 2])
/// ```
///
/// The last slot's energy is never recharged. Moving energy into or out of
/// a slot therefore shifts completion time only when the slot is followed by
/// another one, and opening a new slot pays for recharging the current last
/// slot.
///
/// # Examples
///
/// ```
/// use u_charging::evaluation::{CostModel, VariableCharge};
///
/// let model = VariableCharge::new(0.5);
/// // Slots consumed 4 and 6 energy: one recharge of 4 units.
/// assert_eq!(model.completion_time(10.0, &[4.0, 6.0]), 12.0);
/// // A third slot must first recharge the 6 units of slot 1.
/// assert_eq!(model.insertion_cost(&[4.0, 6.0], 2, 1.0), 3.0);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VariableCharge {
    rate: f64,
    setup: f64,
}

impl VariableCharge {
    /// Creates a model with the given time per energy unit and no setup term.
    pub fn new(rate: f64) -> Self {
        Self { rate, setup: 0.0 }
    }

    /// Adds a constant time per recharge.
    pub fn with_setup(mut self, setup: f64) -> Self {
        self.setup = setup;
        self
    }

    /// Time per unit of energy restored.
    pub fn rate(&self) -> f64 {
        self.rate
    }

    /// Constant time per recharge.
    pub fn setup(&self) -> f64 {
        self.setup
    }

    fn recharge(&self, energy: f64) -> f64 {
        self.setup + self.rate * energy
    }
}

impl CostModel for VariableCharge {
    fn charge_overhead(&self, slot_energy: &[f64]) -> f64 {
        match slot_energy.split_last() {
            Some((_, charged)) => charged.iter().map(|&e| self.recharge(e)).sum(),
            None => 0.0,
        }
    }

    fn insertion_cost(&self, slot_energy: &[f64], slot: usize, energy: f64) -> f64 {
        let k = slot_energy.len();
        if slot >= k {
            // New last slot: the previous last one now needs a recharge.
            slot_energy.last().map_or(0.0, |&last| self.recharge(last))
        } else if slot + 1 < k {
            self.rate * energy
        } else {
            0.0
        }
    }

    fn removal_cost(&self, slot_energy: &[f64], slot: usize, energy: f64, empties: bool) -> f64 {
        let k = slot_energy.len();
        let is_last = slot + 1 == k;
        match (empties && k > 1, is_last) {
            // A middle slot disappears together with its recharge.
            (true, false) => -self.recharge(energy),
            // The last slot disappears; its predecessor is no longer recharged.
            (true, true) => -self.recharge(slot_energy[slot - 1]),
            (false, false) => -self.rate * energy,
            (false, true) => 0.0,
        }
    }

    fn exchange_cost(&self, slot_energy: &[f64], slot: usize, energy_out: f64, energy_in: f64)
        -> f64 {
        if slot + 1 < slot_energy.len() {
            self.rate * (energy_in - energy_out)
        } else {
            0.0
        }
    }

    fn default_tie_break(&self) -> TieBreak {
        TieBreak::IndexOrder
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evaluation::cost_model::tests::assert_marginals_exact;
    use crate::evaluation::FixedCharge;

    #[test]
    fn test_last_slot_is_not_recharged() {
        let model = VariableCharge::new(2.0);
        assert_eq!(model.charge_overhead(&[7.0]), 0.0);
        assert_eq!(model.charge_overhead(&[3.0, 7.0]), 6.0);
        assert_eq!(model.charge_overhead(&[3.0, 1.0, 7.0]), 8.0);
    }

    #[test]
    fn test_setup_term() {
        let model = VariableCharge::new(1.0).with_setup(4.0);
        assert_eq!(model.charge_overhead(&[3.0, 1.0, 7.0]), 12.0);
    }

    #[test]
    fn test_emptying_last_slot_drops_previous_recharge() {
        let model = VariableCharge::new(2.0);
        // [3, 5]: overhead 6. Emptying slot 1 leaves [3]: overhead 0.
        assert_eq!(model.removal_cost(&[3.0, 5.0], 1, 5.0, true), -6.0);
        // Emptying slot 0 leaves [5]: overhead 0 as well.
        assert_eq!(model.removal_cost(&[3.0, 5.0], 0, 3.0, true), -6.0);
    }

    #[test]
    fn test_marginals_match_recomputation() {
        for model in [
            VariableCharge::new(0.5),
            VariableCharge::new(1.25).with_setup(3.0),
        ] {
            assert_marginals_exact(&model, &[4.0]);
            assert_marginals_exact(&model, &[4.0, 3.0]);
            assert_marginals_exact(&model, &[4.0, 3.0, 6.0, 1.0]);
        }
    }

    #[test]
    fn test_zero_rate_matches_fixed() {
        let fixed = FixedCharge::new(2.0);
        let variable = VariableCharge::new(0.0).with_setup(2.0);
        for profile in [&[1.0][..], &[1.0, 2.0], &[5.0, 2.0, 8.0, 3.0]] {
            assert_eq!(
                fixed.charge_overhead(profile),
                variable.charge_overhead(profile)
            );
            for slot in 0..=profile.len() {
                assert_eq!(
                    fixed.insertion_cost(profile, slot, 1.0),
                    variable.insertion_cost(profile, slot, 1.0)
                );
            }
        }
    }
}
