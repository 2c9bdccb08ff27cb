//! Exact subproblem oracles consumed by the matheuristic.
//!
//! The two subproblems are small integer programs normally handed to an
//! off-the-shelf MIP solver. This module defines their contracts and result
//! types; any solver can be plugged in by implementing the traits.
//!
//! - [`BinPackingOracle`] — minimum number of charge groups and a packing of
//!   jobs into them
//! - [`AssignmentOracle`] — makespan-optimal assignment of jobs, or of packed
//!   charge groups, to vehicles
//! - [`ExhaustiveBinPacking`], [`ExhaustiveAssignment`] — exact reference
//!   oracles for small instances

mod exhaustive;

pub use exhaustive::{ExhaustiveAssignment, ExhaustiveBinPacking};

use std::fmt;

use crate::evaluation::EPSILON;
use crate::models::{ChargeMode, Instance, ModelError};

/// Failure reported by an oracle.
#[derive(Debug, Clone, PartialEq)]
pub enum OracleError {
    /// The subproblem has no feasible solution.
    Infeasible,
    /// The oracle refuses instances of this size.
    TooLarge {
        /// Number of units (jobs or groups) requested.
        units: usize,
        /// Largest number the oracle accepts.
        limit: usize,
    },
    /// The solver hit its time limit without a proven answer.
    TimedOut,
    /// Any other solver failure.
    Failed(String),
}

impl fmt::Display for OracleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Infeasible => write!(f, "subproblem is infeasible"),
            Self::TooLarge { units, limit } => {
                write!(f, "{units} units exceed the oracle limit of {limit}")
            }
            Self::TimedOut => write!(f, "oracle timed out"),
            Self::Failed(msg) => write!(f, "oracle failed: {msg}"),
        }
    }
}

impl std::error::Error for OracleError {}

/// Result of the charge-group bin packing.
///
/// `membership[r][j]` is `true` when job `j` is packed into candidate group
/// `r`; `active[r]` marks groups actually used.
#[derive(Debug, Clone, PartialEq)]
pub struct BinPacking {
    /// Minimum number of groups (ζ).
    pub min_groups: usize,
    /// Which of the R candidate groups are used (γ).
    pub active: Vec<bool>,
    /// Group → job membership (χ), R × J.
    pub membership: Vec<Vec<bool>>,
}

impl BinPacking {
    /// Builds a packing from a job → group vector over `slots` candidates.
    ///
    /// # Panics
    ///
    /// Panics if any group index is `slots` or larger.
    pub fn from_groups(group_of: &[usize], slots: usize) -> Self {
        let mut active = vec![false; slots];
        let mut membership = vec![vec![false; group_of.len()]; slots];
        for (j, &g) in group_of.iter().enumerate() {
            active[g] = true;
            membership[g][j] = true;
        }
        Self {
            min_groups: active.iter().filter(|&&a| a).count(),
            active,
            membership,
        }
    }

    /// Indices of the active groups, ascending.
    pub fn active_groups(&self) -> Vec<usize> {
        (0..self.active.len()).filter(|&r| self.active[r]).collect()
    }

    /// Jobs packed into group `r`.
    pub fn jobs_in(&self, r: usize) -> Vec<usize> {
        (0..self.membership[r].len())
            .filter(|&j| self.membership[r][j])
            .collect()
    }

    /// Checks shape, exact cover, group activity, and group capacity.
    pub fn validate(&self, instance: &Instance) -> Result<(), ModelError> {
        let rows = self.active.len();
        let jobs = instance.num_jobs();
        if self.membership.len() != rows {
            return Err(ModelError::ShapeMismatch {
                matrix: "chi",
                expected: (rows, jobs),
                actual: (self.membership.len(), jobs),
            });
        }
        if let Some(row) = self.membership.iter().find(|row| row.len() != jobs) {
            return Err(ModelError::ShapeMismatch {
                matrix: "chi",
                expected: (rows, jobs),
                actual: (rows, row.len()),
            });
        }
        for j in 0..jobs {
            let count = self.membership.iter().filter(|row| row[j]).count();
            if count != 1 {
                return Err(ModelError::NotExactlyOne {
                    matrix: "chi",
                    row: j,
                    count,
                });
            }
        }
        for (r, row) in self.membership.iter().enumerate() {
            let energy: f64 = (0..jobs)
                .filter(|&j| row[j])
                .map(|j| instance.energy(j))
                .sum();
            if !self.active[r] && energy > 0.0 {
                return Err(ModelError::InactiveGroupUsed { group: r });
            }
            if energy > instance.capacity() + EPSILON {
                return Err(ModelError::GroupOverCapacity {
                    group: r,
                    energy,
                    capacity: instance.capacity(),
                });
            }
        }
        let used = self.active.iter().filter(|&&a| a).count();
        if used != self.min_groups {
            return Err(ModelError::BrokenState(format!(
                "packing reports {} groups but marks {used} active",
                self.min_groups
            )));
        }
        Ok(())
    }
}

/// Result of a generalized-assignment call: `assignment[u][m]` is `true`
/// when unit `u` (a job or a charge group) goes to vehicle `m`.
#[derive(Debug, Clone, PartialEq)]
pub struct AssignmentSolution {
    /// Optimal makespan reported by the oracle (z).
    pub objective: f64,
    /// Unit → vehicle matrix (x for jobs, θ for groups).
    pub assignment: Vec<Vec<bool>>,
}

impl AssignmentSolution {
    /// Builds a solution from a unit → vehicle vector.
    pub fn from_machines(objective: f64, machine_of: &[usize], fleet_size: usize) -> Self {
        let assignment = machine_of
            .iter()
            .map(|&m| (0..fleet_size).map(|k| k == m).collect())
            .collect();
        Self {
            objective,
            assignment,
        }
    }

    /// Vehicle of each unit, checking the matrix is `units × fleet_size`
    /// with exactly one `true` per row.
    pub fn machine_of(
        &self,
        matrix: &'static str,
        units: usize,
        fleet_size: usize,
    ) -> Result<Vec<usize>, ModelError> {
        if self.assignment.len() != units {
            return Err(ModelError::ShapeMismatch {
                matrix,
                expected: (units, fleet_size),
                actual: (self.assignment.len(), fleet_size),
            });
        }
        self.assignment
            .iter()
            .enumerate()
            .map(|(u, row)| {
                if row.len() != fleet_size {
                    return Err(ModelError::ShapeMismatch {
                        matrix,
                        expected: (units, fleet_size),
                        actual: (units, row.len()),
                    });
                }
                let set: Vec<usize> = (0..fleet_size).filter(|&m| row[m]).collect();
                match set.as_slice() {
                    [m] => Ok(*m),
                    _ => Err(ModelError::NotExactlyOne {
                        matrix,
                        row: u,
                        count: set.len(),
                    }),
                }
            })
            .collect()
    }
}

/// Minimum bin packing of job energies into battery charges.
pub trait BinPackingOracle {
    /// Packs `energies` into as few groups as possible, each holding at most
    /// `capacity`, using at most `slots` candidate groups. Active groups must
    /// form a prefix of the candidates.
    fn pack(&self, energies: &[f64], capacity: f64, slots: usize)
        -> Result<BinPacking, OracleError>;
}

/// Makespan-minimizing generalized assignment onto the fleet.
pub trait AssignmentOracle {
    /// Assigns raw jobs to vehicles, minimizing the largest total duration,
    /// with each vehicle's total energy at most `capacity` (one charge each).
    fn assign_jobs(
        &self,
        fleet_size: usize,
        durations: &[f64],
        energies: &[f64],
        capacity: f64,
    ) -> Result<AssignmentSolution, OracleError>;

    /// Assigns packed charge groups to vehicles, minimizing the makespan
    /// including recharges between the groups a vehicle receives.
    ///
    /// `durations[g]` and `energies[g]` are the totals of group `g`'s jobs.
    /// No vehicle may receive more than `slot_limit` groups; if that cannot
    /// be met the call fails with [`OracleError::Infeasible`].
    fn assign_groups(
        &self,
        fleet_size: usize,
        durations: &[f64],
        energies: &[f64],
        capacity: f64,
        slot_limit: usize,
        charge: ChargeMode,
    ) -> Result<AssignmentSolution, OracleError>;
}
