//! Cost-model capability interface shared by both charging regimes.

/// Tolerance for comparing completion times, savings, and energy loads.
pub const EPSILON: f64 = 1e-9;

/// Order in which tied critical vehicles are examined during a pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TieBreak {
    /// Shuffle the critical set with the run's random source.
    Shuffle,
    /// Visit critical vehicles by ascending index.
    IndexOrder,
}

/// Completion-time arithmetic for one charging regime.
///
/// A vehicle's schedule is described by its total busy time (sum of job
/// durations) and its *slot profile*: the energy consumed under each active
/// charge slot, in slot order. The profile is always non-empty (slot 0 is
/// always active) and packed without gaps.
///
/// The marginal methods return the exact change in charging overhead for a
/// single-job edit, so the local search never has to rebuild a profile to
/// price a candidate move. Removing the last job of a slot removes the slot
/// (later slots shift down) unless it is the vehicle's only slot.
pub trait CostModel {
    /// Time spent recharging between consecutive active slots.
    fn charge_overhead(&self, slot_energy: &[f64]) -> f64;

    /// Change in overhead when a job with `energy` joins `slot`.
    ///
    /// `slot == slot_energy.len()` opens a brand-new slot after the last one.
    fn insertion_cost(&self, slot_energy: &[f64], slot: usize, energy: f64) -> f64;

    /// Change in overhead when a job with `energy` leaves `slot`.
    ///
    /// `empties` is `true` when the job is the slot's only occupant.
    fn removal_cost(&self, slot_energy: &[f64], slot: usize, energy: f64, empties: bool) -> f64;

    /// Change in overhead when a job with `energy_out` in `slot` is replaced
    /// by one with `energy_in`.
    fn exchange_cost(&self, slot_energy: &[f64], slot: usize, energy_out: f64, energy_in: f64)
        -> f64;

    /// Tie-break used when the caller does not pick one.
    fn default_tie_break(&self) -> TieBreak;

    /// Completion time of a vehicle with the given busy time and slot profile.
    fn completion_time(&self, busy: f64, slot_energy: &[f64]) -> f64 {
        busy + self.charge_overhead(slot_energy)
    }

    /// Whether `energy` more fits in a slot with `remaining` capacity.
    ///
    /// `energy` may be negative (a swap that frees energy), which always fits.
    fn fits(&self, remaining: f64, energy: f64) -> bool {
        remaining + EPSILON >= energy
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Applies a single-job edit to a profile the slow way: rebuild, then
    /// compact away an emptied slot.
    pub(crate) fn edited_profile(
        profile: &[f64],
        slot: usize,
        delta: f64,
        empties: bool,
    ) -> Vec<f64> {
        let mut out = profile.to_vec();
        if slot == out.len() {
            out.push(delta);
        } else {
            out[slot] += delta;
            if empties && out.len() > 1 {
                out.remove(slot);
            }
        }
        out
    }

    /// Checks every marginal method against full recomputation on `profile`.
    pub(crate) fn assert_marginals_exact<C: CostModel>(model: &C, profile: &[f64]) {
        let base = model.charge_overhead(profile);
        let e = 1.5;
        for slot in 0..=profile.len() {
            let after = edited_profile(profile, slot, e, false);
            let predicted = model.insertion_cost(profile, slot, e);
            let actual = model.charge_overhead(&after) - base;
            assert!(
                (predicted - actual).abs() < 1e-9,
                "insertion slot {slot}: {predicted} vs {actual}"
            );
        }
        for slot in 0..profile.len() {
            // Remove a part of the slot's energy.
            let part = profile[slot] / 2.0;
            let after = edited_profile(profile, slot, -part, false);
            let predicted = model.removal_cost(profile, slot, part, false);
            let actual = model.charge_overhead(&after) - base;
            assert!((predicted - actual).abs() < 1e-9, "removal slot {slot}");

            // Remove the sole occupant.
            let after = edited_profile(profile, slot, -profile[slot], true);
            let predicted = model.removal_cost(profile, slot, profile[slot], true);
            let actual = model.charge_overhead(&after) - base;
            assert!(
                (predicted - actual).abs() < 1e-9,
                "emptying slot {slot}: {predicted} vs {actual}"
            );

            let after = edited_profile(profile, slot, 0.75, false);
            let predicted = model.exchange_cost(profile, slot, 1.0, 1.75);
            let actual = model.charge_overhead(&after) - base;
            assert!((predicted - actual).abs() < 1e-9, "exchange slot {slot}");
        }
    }

    #[test]
    fn test_fits_tolerance() {
        struct Dummy;
        impl CostModel for Dummy {
            fn charge_overhead(&self, _: &[f64]) -> f64 {
                0.0
            }
            fn insertion_cost(&self, _: &[f64], _: usize, _: f64) -> f64 {
                0.0
            }
            fn removal_cost(&self, _: &[f64], _: usize, _: f64, _: bool) -> f64 {
                0.0
            }
            fn exchange_cost(&self, _: &[f64], _: usize, _: f64, _: f64) -> f64 {
                0.0
            }
            fn default_tie_break(&self) -> TieBreak {
                TieBreak::IndexOrder
            }
        }
        assert!(Dummy.fits(3.0, 3.0));
        assert!(Dummy.fits(3.0, -2.0));
        assert!(!Dummy.fits(3.0, 3.1));
        assert_eq!(Dummy.completion_time(7.0, &[1.0]), 7.0);
    }
}
