//! Exact reference oracles by depth-first branch and bound.
//!
//! # Algorithm
//!
//! Units are assigned one at a time in a fixed order. Each unit either joins
//! one of the bins (groups or vehicles) opened so far or opens the next one;
//! opening at most one new bin per level removes bin-relabeling symmetry. A
//! branch is cut as soon as its partial objective cannot beat the incumbent,
//! which is valid because both objectives only grow as units are added.
//!
//! # Complexity
//!
//! Exponential in the number of units; guarded by a configurable limit.
//! Suited to tests, demos, and tiny instances, not to production sizes.

use super::{AssignmentOracle, AssignmentSolution, BinPacking, BinPackingOracle, OracleError};
use crate::evaluation::{AnyCharge, CostModel, EPSILON};
use crate::models::ChargeMode;

const DEFAULT_LIMIT: usize = 14;

/// Minimum bin packing by exhaustive search.
///
/// # Examples
///
/// ```
/// use u_charging::oracle::{BinPackingOracle, ExhaustiveBinPacking};
///
/// let packing = ExhaustiveBinPacking::new()
///     .pack(&[6.0, 3.0, 1.0, 6.0], 11.0, 4)
///     .unwrap();
/// assert_eq!(packing.min_groups, 2);
/// assert_eq!(packing.active, vec![true, true, false, false]);
/// ```
#[derive(Debug, Clone, Copy)]
pub struct ExhaustiveBinPacking {
    max_units: usize,
}

impl ExhaustiveBinPacking {
    /// Creates an oracle accepting up to 14 jobs.
    pub fn new() -> Self {
        Self {
            max_units: DEFAULT_LIMIT,
        }
    }

    /// Sets the largest number of jobs accepted.
    pub fn with_max_units(mut self, max_units: usize) -> Self {
        self.max_units = max_units;
        self
    }
}

impl Default for ExhaustiveBinPacking {
    fn default() -> Self {
        Self::new()
    }
}

impl BinPackingOracle for ExhaustiveBinPacking {
    fn pack(
        &self,
        energies: &[f64],
        capacity: f64,
        slots: usize,
    ) -> Result<BinPacking, OracleError> {
        if energies.len() > self.max_units {
            return Err(OracleError::TooLarge {
                units: energies.len(),
                limit: self.max_units,
            });
        }
        if energies.iter().any(|&e| e > capacity + EPSILON) {
            return Err(OracleError::Infeasible);
        }

        // Largest items first tightens the search considerably.
        let mut order: Vec<usize> = (0..energies.len()).collect();
        order.sort_by(|&a, &b| energies[b].total_cmp(&energies[a]));

        let total: f64 = energies.iter().sum();
        let lower = ((total - EPSILON) / capacity).ceil().max(1.0) as usize;

        let mut search = PackingSearch {
            energies,
            capacity,
            order: &order,
            loads: Vec::new(),
            group_of: vec![0; energies.len()],
            best: None,
            best_count: slots + 1,
            lower,
        };
        search.descend(0);

        match search.best {
            Some(group_of) => Ok(BinPacking::from_groups(&group_of, slots)),
            None => Err(OracleError::Infeasible),
        }
    }
}

struct PackingSearch<'a> {
    energies: &'a [f64],
    capacity: f64,
    order: &'a [usize],
    loads: Vec<f64>,
    group_of: Vec<usize>,
    best: Option<Vec<usize>>,
    best_count: usize,
    lower: usize,
}

impl PackingSearch<'_> {
    fn descend(&mut self, depth: usize) {
        if self.best_count <= self.lower {
            return;
        }
        if depth == self.order.len() {
            self.best_count = self.loads.len();
            self.best = Some(self.group_of.clone());
            return;
        }
        let j = self.order[depth];
        let e = self.energies[j];
        for g in 0..self.loads.len() {
            if self.loads[g] + e <= self.capacity + EPSILON {
                self.loads[g] += e;
                self.group_of[j] = g;
                self.descend(depth + 1);
                self.loads[g] -= e;
            }
        }
        if self.loads.len() + 1 < self.best_count {
            self.loads.push(e);
            self.group_of[j] = self.loads.len() - 1;
            self.descend(depth + 1);
            self.loads.pop();
        }
    }
}

/// Generalized assignment by exhaustive search.
///
/// Group-shaped calls price a vehicle's groups in ascending group order with
/// the cost model of the given [`ChargeMode`], matching how the initial
/// solution builder lays groups out as charge slots.
///
/// # Examples
///
/// ```
/// use u_charging::oracle::{AssignmentOracle, ExhaustiveAssignment};
///
/// let sol = ExhaustiveAssignment::new()
///     .assign_jobs(2, &[1.0, 2.0, 3.0, 4.0], &[6.0, 3.0, 1.0, 6.0], 11.0)
///     .unwrap();
/// assert_eq!(sol.objective, 6.0);
/// ```
#[derive(Debug, Clone, Copy)]
pub struct ExhaustiveAssignment {
    max_units: usize,
}

impl ExhaustiveAssignment {
    /// Creates an oracle accepting up to 14 units.
    pub fn new() -> Self {
        Self {
            max_units: DEFAULT_LIMIT,
        }
    }

    /// Sets the largest number of units accepted.
    pub fn with_max_units(mut self, max_units: usize) -> Self {
        self.max_units = max_units;
        self
    }

    fn guard(&self, units: usize) -> Result<(), OracleError> {
        if units > self.max_units {
            return Err(OracleError::TooLarge {
                units,
                limit: self.max_units,
            });
        }
        Ok(())
    }
}

impl Default for ExhaustiveAssignment {
    fn default() -> Self {
        Self::new()
    }
}

impl AssignmentOracle for ExhaustiveAssignment {
    fn assign_jobs(
        &self,
        fleet_size: usize,
        durations: &[f64],
        energies: &[f64],
        capacity: f64,
    ) -> Result<AssignmentSolution, OracleError> {
        self.guard(durations.len())?;
        let mut order: Vec<usize> = (0..durations.len()).collect();
        order.sort_by(|&a, &b| durations[b].total_cmp(&durations[a]));

        let cost = |units: &[usize]| units.iter().map(|&u| durations[u]).sum::<f64>();
        let feasible = |units: &[usize]| {
            units.iter().map(|&u| energies[u]).sum::<f64>() <= capacity + EPSILON
        };
        solve_assignment(fleet_size, &order, cost, feasible)
    }

    fn assign_groups(
        &self,
        fleet_size: usize,
        durations: &[f64],
        energies: &[f64],
        _capacity: f64,
        slot_limit: usize,
        charge: ChargeMode,
    ) -> Result<AssignmentSolution, OracleError> {
        self.guard(durations.len())?;
        let model = AnyCharge::from(charge);
        // Ascending order keeps each vehicle's groups sorted as they are added.
        let order: Vec<usize> = (0..durations.len()).collect();

        let cost = |units: &[usize]| {
            let busy: f64 = units.iter().map(|&u| durations[u]).sum();
            let profile: Vec<f64> = units.iter().map(|&u| energies[u]).collect();
            model.completion_time(busy, &profile)
        };
        solve_assignment(fleet_size, &order, cost, |units: &[usize]| {
            units.len() <= slot_limit
        })
    }
}

fn solve_assignment<F, G>(
    fleet_size: usize,
    order: &[usize],
    cost: F,
    feasible: G,
) -> Result<AssignmentSolution, OracleError>
where
    F: Fn(&[usize]) -> f64,
    G: Fn(&[usize]) -> bool,
{
    if fleet_size == 0 {
        return Err(OracleError::Infeasible);
    }
    let mut search = AssignmentSearch {
        fleet_size,
        order,
        cost: &cost,
        feasible: &feasible,
        bins: vec![Vec::new(); fleet_size],
        machine_of: vec![0; order.len()],
        best: None,
        best_value: f64::INFINITY,
    };
    search.descend(0, 0, 0.0);

    match search.best {
        Some(machine_of) => Ok(AssignmentSolution::from_machines(
            search.best_value,
            &machine_of,
            fleet_size,
        )),
        None => Err(OracleError::Infeasible),
    }
}

struct AssignmentSearch<'a, F, G> {
    fleet_size: usize,
    order: &'a [usize],
    cost: &'a F,
    feasible: &'a G,
    bins: Vec<Vec<usize>>,
    machine_of: Vec<usize>,
    best: Option<Vec<usize>>,
    best_value: f64,
}

impl<F, G> AssignmentSearch<'_, F, G>
where
    F: Fn(&[usize]) -> f64,
    G: Fn(&[usize]) -> bool,
{
    fn descend(&mut self, depth: usize, opened: usize, partial: f64) {
        if partial >= self.best_value - EPSILON {
            return;
        }
        if depth == self.order.len() {
            self.best_value = partial;
            self.best = Some(self.machine_of.clone());
            return;
        }
        let u = self.order[depth];
        let reach = (opened + 1).min(self.fleet_size);
        for m in 0..reach {
            self.bins[m].push(u);
            if (self.feasible)(&self.bins[m]) {
                let value = partial.max((self.cost)(&self.bins[m]));
                self.machine_of[u] = m;
                self.descend(depth + 1, opened.max(m + 1), value);
            }
            self.bins[m].pop();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_packing_uses_minimum_groups() {
        let oracle = ExhaustiveBinPacking::new();
        let p = oracle
            .pack(&[4.0, 4.0, 4.0, 3.0, 3.0, 2.0], 10.0, 6)
            .expect("feasible");
        assert_eq!(p.min_groups, 2);
        for r in p.active_groups() {
            let e: f64 = p
                .jobs_in(r)
                .iter()
                .map(|&j| [4.0, 4.0, 4.0, 3.0, 3.0, 2.0][j])
                .sum();
            assert!(e <= 10.0);
        }
    }

    #[test]
    fn test_packing_too_few_slots_is_infeasible() {
        let oracle = ExhaustiveBinPacking::new();
        assert_eq!(
            oracle.pack(&[6.0, 6.0, 6.0], 10.0, 2),
            Err(OracleError::Infeasible)
        );
    }

    #[test]
    fn test_packing_size_guard() {
        let oracle = ExhaustiveBinPacking::new().with_max_units(2);
        assert_eq!(
            oracle.pack(&[1.0, 1.0, 1.0], 10.0, 3),
            Err(OracleError::TooLarge { units: 3, limit: 2 })
        );
    }

    #[test]
    fn test_assign_jobs_respects_energy() {
        let oracle = ExhaustiveAssignment::new();
        let sol = oracle
            .assign_jobs(2, &[1.0, 2.0, 3.0, 4.0], &[6.0, 3.0, 1.0, 6.0], 11.0)
            .expect("feasible");
        assert_eq!(sol.objective, 6.0);
        let machines = sol.machine_of("x", 4, 2).expect("well formed");
        // The two 6-energy jobs cannot share a vehicle.
        assert_ne!(machines[0], machines[3]);
    }

    #[test]
    fn test_assign_jobs_infeasible() {
        let oracle = ExhaustiveAssignment::new();
        assert_eq!(
            oracle.assign_jobs(1, &[1.0, 1.0], &[6.0, 6.0], 10.0),
            Err(OracleError::Infeasible)
        );
    }

    #[test]
    fn test_assign_groups_fixed_charge() {
        let oracle = ExhaustiveAssignment::new();
        // Three groups of duration 5, 4, 3 on two vehicles with t = 2:
        // {5} and {4, 3} + one recharge = 9.
        let sol = oracle
            .assign_groups(
                2,
                &[5.0, 4.0, 3.0],
                &[8.0, 8.0, 8.0],
                10.0,
                3,
                ChargeMode::Fixed { duration: 2.0 },
            )
            .expect("feasible");
        assert_eq!(sol.objective, 9.0);
    }

    #[test]
    fn test_assign_groups_variable_charge() {
        let oracle = ExhaustiveAssignment::new();
        // Groups on one vehicle: overhead recharges every group but the last.
        let sol = oracle
            .assign_groups(
                1,
                &[1.0, 1.0],
                &[4.0, 6.0],
                10.0,
                2,
                ChargeMode::variable(0.5),
            )
            .expect("feasible");
        assert_eq!(sol.objective, 4.0);
    }

    #[test]
    fn test_assign_groups_caps_groups_per_vehicle() {
        let oracle = ExhaustiveAssignment::new();
        let fixed = ChargeMode::Fixed { duration: 0.0 };
        // Uncapped: {10} and {1, 1, 1} → 10.
        let free = oracle
            .assign_groups(2, &[10.0, 1.0, 1.0, 1.0], &[6.0; 4], 10.0, 4, fixed)
            .expect("feasible");
        assert_eq!(free.objective, 10.0);

        let capped = oracle
            .assign_groups(2, &[10.0, 1.0, 1.0, 1.0], &[6.0; 4], 10.0, 2, fixed)
            .expect("feasible");
        assert_eq!(capped.objective, 11.0);
        let machines = capped.machine_of("theta", 4, 2).expect("well formed");
        for m in 0..2 {
            assert_eq!(machines.iter().filter(|&&v| v == m).count(), 2);
        }

        assert_eq!(
            oracle.assign_groups(2, &[1.0; 5], &[6.0; 5], 10.0, 2, fixed),
            Err(OracleError::Infeasible)
        );
    }
}
