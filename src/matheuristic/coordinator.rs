//! The three-stage matheuristic.
//!
//! # Algorithm
//!
//! 1. Bin-pack job energies into the fewest battery charges (ζ) and derive a
//!    lower bound.
//! 2. If ζ ≤ M every vehicle can run on a single charge: assign jobs to
//!    vehicles directly. Otherwise assign the packed charge groups.
//! 3. Turn the assignment into a seed state and improve it with the local
//!    search under the instance's cost model.
//!
//! # Reference
//!
//! Classic matheuristic scheme: exact subproblems for the seed, heuristic
//! improvement for the full problem.

use std::time::{Duration, Instant};

use serde::Serialize;
use tracing::info;

use super::bounds::{gap, lower_bound};
use super::SolveError;
use crate::constructive::{from_charge_groups, from_constrained};
use crate::evaluation::AnyCharge;
use crate::local_search::{LocalSearch, LocalSearchConfig};
use crate::models::{AssignmentState, Instance};
use crate::oracle::{AssignmentOracle, BinPackingOracle};

/// Configuration for a matheuristic run.
///
/// # Examples
///
/// ```
/// use u_charging::matheuristic::MatheuristicConfig;
///
/// let config = MatheuristicConfig::default().with_seed(7);
/// assert_eq!(config.local_search.seed, Some(7));
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct MatheuristicConfig {
    /// Settings for the improvement stage.
    pub local_search: LocalSearchConfig,
}

impl MatheuristicConfig {
    /// Sets the local-search configuration.
    pub fn with_local_search(mut self, local_search: LocalSearchConfig) -> Self {
        self.local_search = local_search;
        self
    }

    /// Sets the random seed of the improvement stage.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.local_search = self.local_search.with_seed(seed);
        self
    }
}

/// Which initial-solution builder produced the seed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SeedPath {
    /// ζ ≤ M: jobs assigned directly, one charge per vehicle.
    Constrained,
    /// ζ > M: packed charge groups assigned to vehicles.
    ChargeGroups,
}

/// Wall-clock time of each stage.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct StageTimings {
    /// Bin packing.
    pub packing: Duration,
    /// Vehicle assignment.
    pub assignment: Duration,
    /// Local search.
    pub local_search: Duration,
}

impl StageTimings {
    /// Sum of all stages.
    pub fn total(&self) -> Duration {
        self.packing + self.assignment + self.local_search
    }
}

/// Bounds and statistics of a run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunReport {
    /// Lower bound on the optimal makespan.
    pub lower_bound: f64,
    /// Objective reported by the assignment oracle.
    pub initial_upper_bound: f64,
    /// Makespan of the seed state under the instance's cost model.
    pub seed_makespan: f64,
    /// Final makespan.
    pub upper_bound: f64,
    /// `(upper_bound - lower_bound) / lower_bound`, if the bound is positive.
    pub gap: Option<f64>,
    /// Minimum number of charge groups (ζ).
    pub min_groups: usize,
    /// Seed builder used.
    pub seed_path: SeedPath,
    /// Stage timings.
    pub timings: StageTimings,
    /// Local-search moves applied.
    pub iterations: usize,
}

/// Final schedule and report.
#[derive(Debug, Clone)]
pub struct MatheuristicOutcome {
    /// Locally optimal schedule.
    pub state: AssignmentState,
    /// Bounds and statistics.
    pub report: RunReport,
}

/// Matheuristic coordinator over pluggable subproblem oracles.
///
/// # Examples
///
/// ```
/// use u_charging::matheuristic::{Matheuristic, SeedPath};
/// use u_charging::models::{ChargeMode, Instance};
/// use u_charging::oracle::{ExhaustiveAssignment, ExhaustiveBinPacking};
///
/// let inst = Instance::new(
///     2,
///     vec![1, 2, 3, 4],
///     vec![6.0, 3.0, 1.0, 6.0],
///     11.0,
///     ChargeMode::Fixed { duration: 2.0 },
/// )
/// .unwrap();
/// let solver = Matheuristic::new(ExhaustiveBinPacking::new(), ExhaustiveAssignment::new());
/// let outcome = solver.solve(&inst).unwrap();
///
/// assert_eq!(outcome.report.seed_path, SeedPath::Constrained);
/// assert_eq!(outcome.report.lower_bound, 5.0);
/// assert_eq!(outcome.report.upper_bound, 6.0);
/// ```
#[derive(Debug, Clone)]
pub struct Matheuristic<P, A> {
    packing: P,
    assignment: A,
    config: MatheuristicConfig,
}

impl<P: BinPackingOracle, A: AssignmentOracle> Matheuristic<P, A> {
    /// Creates a coordinator with the default configuration.
    pub fn new(packing: P, assignment: A) -> Self {
        Self {
            packing,
            assignment,
            config: MatheuristicConfig::default(),
        }
    }

    /// Sets the configuration.
    pub fn with_config(mut self, config: MatheuristicConfig) -> Self {
        self.config = config;
        self
    }

    /// Runs all three stages on `instance`.
    ///
    /// Fails if an oracle fails or returns a result that does not fit the
    /// instance. Finding no improving move is not a failure.
    #[tracing::instrument(
        level = "debug",
        skip_all,
        fields(jobs = instance.num_jobs(), fleet = instance.fleet_size())
    )]
    pub fn solve(&self, instance: &Instance) -> Result<MatheuristicOutcome, SolveError> {
        let model = AnyCharge::from(instance.charge());
        let fleet = instance.fleet_size();

        let clock = Instant::now();
        let packing = self.packing.pack(
            instance.energies(),
            instance.capacity(),
            instance.num_jobs(),
        )?;
        packing.validate(instance)?;
        let packing_time = clock.elapsed();
        let min_groups = packing.min_groups;
        let lb = lower_bound(instance, min_groups);
        info!(min_groups, lower_bound = lb, "charge groups packed");

        let clock = Instant::now();
        let durations: Vec<f64> = (0..instance.num_jobs())
            .map(|j| instance.duration(j))
            .collect();
        let (seed_path, solution) = if min_groups <= fleet {
            let x = self.assignment.assign_jobs(
                fleet,
                &durations,
                instance.energies(),
                instance.capacity(),
            )?;
            (SeedPath::Constrained, x)
        } else {
            let groups: Vec<Vec<usize>> = packing
                .active_groups()
                .into_iter()
                .map(|g| packing.jobs_in(g))
                .collect();
            let group_durations: Vec<f64> = groups
                .iter()
                .map(|jobs| jobs.iter().map(|&j| durations[j]).sum())
                .collect();
            let group_energies: Vec<f64> = groups
                .iter()
                .map(|jobs| jobs.iter().map(|&j| instance.energy(j)).sum())
                .collect();
            let theta = self.assignment.assign_groups(
                fleet,
                &group_durations,
                &group_energies,
                instance.capacity(),
                instance.slot_limit(),
                instance.charge(),
            )?;
            (SeedPath::ChargeGroups, theta)
        };
        let assignment_time = clock.elapsed();
        info!(path = ?seed_path, objective = solution.objective, "vehicles assigned");

        let seed = match seed_path {
            SeedPath::Constrained => from_constrained(instance, &model, &solution)?,
            SeedPath::ChargeGroups => from_charge_groups(instance, &model, &packing, &solution)?,
        };
        let seed_makespan = seed.cmax();

        let mut rng = self.config.local_search.rng();
        let result = LocalSearch::from_config(instance, &model, &self.config.local_search)
            .run(seed, &mut rng);
        let ub = result.state.cmax();

        let report = RunReport {
            lower_bound: lb,
            initial_upper_bound: solution.objective,
            seed_makespan,
            upper_bound: ub,
            gap: gap(lb, ub),
            min_groups,
            seed_path,
            timings: StageTimings {
                packing: packing_time,
                assignment: assignment_time,
                local_search: result.elapsed,
            },
            iterations: result.iterations,
        };
        info!(
            lower_bound = lb,
            upper_bound = ub,
            gap = ?report.gap,
            iterations = report.iterations,
            elapsed = ?report.timings.total(),
            "matheuristic finished"
        );
        Ok(MatheuristicOutcome {
            state: result.state,
            report,
        })
    }
}
