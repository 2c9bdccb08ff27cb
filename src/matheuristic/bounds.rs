//! Lower bounds on the optimal makespan and the optimality gap.
//!
//! Both bounds average the unavoidable work over the fleet. They are
//! rounded up only when every completion time is known to be integral
//! (integer durations plus integral charge overheads).

use crate::evaluation::EPSILON;
use crate::models::{ChargeMode, Instance};

/// Lower bound for the instance's charge mode, given the minimum number of
/// charge groups `min_groups` (ζ) found by the bin packing.
pub fn lower_bound(instance: &Instance, min_groups: usize) -> f64 {
    match instance.charge() {
        ChargeMode::Fixed { duration } => fixed_lower_bound(instance, min_groups, duration),
        ChargeMode::Variable { rate, .. } => variable_lower_bound(instance, rate),
    }
}

/// Fixed-duration bound.
///
/// At least `ζ - M` recharges happen across the fleet, and some vehicle
/// performs at least `ceil((ζ - M) / M)` of them:
///
/// `max(ceil(((ζ - M)·t + Σd) / M), ceil((ζ - M) / M)·t)`
///
/// # Examples
///
/// ```
/// use u_charging::matheuristic::fixed_lower_bound;
/// use u_charging::models::{ChargeMode, Instance};
///
/// let inst = Instance::new(
///     2,
///     vec![1, 2, 3, 4],
///     vec![6.0, 3.0, 1.0, 6.0],
///     11.0,
///     ChargeMode::Fixed { duration: 2.0 },
/// )
/// .unwrap();
/// assert_eq!(fixed_lower_bound(&inst, 2, 2.0), 5.0);
/// // Five groups on two vehicles force three recharges.
/// assert_eq!(fixed_lower_bound(&inst, 5, 2.0), 8.0);
/// ```
pub fn fixed_lower_bound(instance: &Instance, min_groups: usize, duration: f64) -> f64 {
    let fleet = instance.fleet_size();
    let m = fleet as f64;
    let extra = min_groups.saturating_sub(fleet);
    let spread = (extra as f64 * duration + instance.total_duration()) / m;
    let per_vehicle = extra.div_ceil(fleet) as f64 * duration;
    let spread = if is_integral(duration) {
        round_up(spread)
    } else {
        spread
    };
    spread.max(per_vehicle)
}

/// Energy-proportional bound.
///
/// A vehicle recharges everything it consumes except its last slot, which
/// holds at most `b`, so `C_m ≥ D_m + τ·(E_m - b)`:
///
/// `max(0, ceil(Σ(d + τ·e) / M - τ·b), ceil(Σd / M))`
pub fn variable_lower_bound(instance: &Instance, rate: f64) -> f64 {
    let m = instance.fleet_size() as f64;
    let work = instance.total_duration() + rate * instance.total_energy();
    let charged = (work / m - rate * instance.capacity()).max(0.0);
    let integral = instance
        .energies()
        .iter()
        .all(|&e| is_integral(rate * e))
        && is_integral(rate * instance.capacity());
    let charged = if integral { round_up(charged) } else { charged };
    charged.max(round_up(instance.total_duration() / m))
}

/// Relative gap `(ub - lb) / lb`; `None` when the bound is zero.
///
/// # Examples
///
/// ```
/// use u_charging::matheuristic::gap;
///
/// assert_eq!(gap(4.0, 5.0), Some(0.25));
/// assert_eq!(gap(0.0, 5.0), None);
/// ```
pub fn gap(lower: f64, upper: f64) -> Option<f64> {
    if lower <= 0.0 {
        None
    } else {
        Some((upper - lower) / lower)
    }
}

fn is_integral(x: f64) -> bool {
    (x - x.round()).abs() < EPSILON
}

fn round_up(x: f64) -> f64 {
    (x - EPSILON).ceil()
}
