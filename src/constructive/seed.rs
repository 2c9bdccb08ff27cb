//! Seed states built from oracle results.
//!
//! # Algorithm
//!
//! Two layouts, picked once by the coordinator:
//!
//! - **Constrained** (ζ ≤ M): each vehicle performs all its jobs on a single
//!   charge, so every job sits in slot 0 of its vehicle.
//! - **Charge groups** (ζ > M): each packed group becomes one charge slot on
//!   the vehicle it was assigned to. A vehicle's groups are laid out in
//!   ascending group order and re-indexed to slots `0..k`, so the slots form
//!   a gap-free prefix whatever indices the packing used.
//!
//! The seed makespan is recomputed from the layout under the active cost
//! model; the oracle objective is only compared against it.

use tracing::{debug, warn};

use crate::evaluation::CostModel;
use crate::models::{AssignmentState, Instance, ModelError};
use crate::oracle::{AssignmentSolution, BinPacking};

/// Builds the seed from a job → vehicle assignment (all jobs in slot 0).
///
/// Fails if the assignment is malformed or a vehicle's jobs exceed one
/// battery charge.
///
/// # Examples
///
/// ```
/// use u_charging::constructive::from_constrained;
/// use u_charging::evaluation::FixedCharge;
/// use u_charging::models::{ChargeMode, Instance};
/// use u_charging::oracle::AssignmentSolution;
///
/// let inst = Instance::new(
///     2,
///     vec![1, 2, 3, 4],
///     vec![6.0, 3.0, 1.0, 6.0],
///     11.0,
///     ChargeMode::Fixed { duration: 2.0 },
/// )
/// .unwrap();
/// let x = AssignmentSolution::from_machines(6.0, &[0, 1, 0, 1], 2);
/// let state = from_constrained(&inst, &FixedCharge::new(2.0), &x).unwrap();
/// assert_eq!(state.cmax(), 6.0);
/// assert_eq!(state.num_slots(0), 1);
/// ```
pub fn from_constrained<C: CostModel>(
    instance: &Instance,
    model: &C,
    solution: &AssignmentSolution,
) -> Result<AssignmentState, ModelError> {
    let m_count = instance.fleet_size();
    let machine_of = solution.machine_of("x", instance.num_jobs(), m_count)?;

    let mut slots = vec![vec![Vec::new()]; m_count];
    for (j, &m) in machine_of.iter().enumerate() {
        slots[m][0].push(j);
    }

    let state = AssignmentState::from_slots(instance, model, slots)?;
    compare_objective(&state, solution.objective);
    Ok(state)
}

/// Builds the seed from a charge-group packing and a group → vehicle
/// assignment.
///
/// Row `i` of `solution.assignment` refers to the `i`-th active group of
/// `packing`, in ascending group index.
///
/// # Examples
///
/// ```
/// use u_charging::constructive::from_charge_groups;
/// use u_charging::evaluation::VariableCharge;
/// use u_charging::models::{ChargeMode, Instance};
/// use u_charging::oracle::{AssignmentSolution, BinPacking};
///
/// let inst = Instance::new(
///     1,
///     vec![2, 2, 2],
///     vec![5.0, 5.0, 5.0],
///     10.0,
///     ChargeMode::variable(1.0),
/// )
/// .unwrap();
/// let packing = BinPacking::from_groups(&[0, 0, 1], 3);
/// let theta = AssignmentSolution::from_machines(16.0, &[0, 0], 1);
/// let state = from_charge_groups(&inst, &VariableCharge::new(1.0), &packing, &theta).unwrap();
/// // Six time units of work plus recharging the 10 units of the first group.
/// assert_eq!(state.cmax(), 16.0);
/// assert_eq!(state.num_slots(0), 2);
/// ```
pub fn from_charge_groups<C: CostModel>(
    instance: &Instance,
    model: &C,
    packing: &BinPacking,
    solution: &AssignmentSolution,
) -> Result<AssignmentState, ModelError> {
    packing.validate(instance)?;
    let groups = packing.active_groups();
    let m_count = instance.fleet_size();
    let machine_of = solution.machine_of("theta", groups.len(), m_count)?;

    let mut slots: Vec<Vec<Vec<usize>>> = vec![Vec::new(); m_count];
    for (&g, &m) in groups.iter().zip(&machine_of) {
        let jobs = packing.jobs_in(g);
        if jobs.is_empty() {
            continue;
        }
        debug!(group = g, machine = m, slot = slots[m].len(), "group placed");
        slots[m].push(jobs);
    }

    let state = AssignmentState::from_slots(instance, model, slots)?;
    compare_objective(&state, solution.objective);
    Ok(state)
}

fn compare_objective(state: &AssignmentState, objective: f64) {
    if (state.cmax() - objective).abs() > 1e-6 {
        warn!(
            objective,
            cmax = state.cmax(),
            "oracle objective differs from the seed makespan"
        );
    }
}
