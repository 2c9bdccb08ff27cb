//! Best-improvement local search driver.
//!
//! # Algorithm
//!
//! Each pass computes every vehicle's completion time, collects the
//! critical vehicles (those at the makespan), and scans the Add, Remove, and
//! Swap neighborhoods of each critical vehicle in that order. The single
//! move with the largest saving is applied; ties keep the first candidate
//! found. The search stops when no move saves more than [`EPSILON`].
//!
//! Savings are exact (see [`CostModel`]), so every applied move lowers the
//! makespan by at least [`EPSILON`] and the search terminates.
//!
//! # Complexity
//!
//! O(J × M × S) for Add and Remove and O(J²) for Swap per pass, where
//! S is the slot limit.

use std::time::{Duration, Instant};

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use tracing::{debug, trace};

use super::moves::{Move, Pass, ScoredMove};
use super::rivals::{best_two_excluding, critical_machines};
use crate::evaluation::{CostModel, TieBreak, EPSILON};
use crate::models::{AssignmentState, Instance};

const DEFAULT_SEED: u64 = 42;

/// Configuration for a local-search run.
///
/// # Examples
///
/// ```
/// use u_charging::evaluation::TieBreak;
/// use u_charging::local_search::LocalSearchConfig;
///
/// let config = LocalSearchConfig::default()
///     .with_tie_break(TieBreak::IndexOrder)
///     .with_seed(7);
/// assert_eq!(config.seed, Some(7));
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct LocalSearchConfig {
    /// Order for tied critical vehicles (None for the cost model's default).
    pub tie_break: Option<TieBreak>,
    /// Random seed (None for default seed).
    pub seed: Option<u64>,
}

impl LocalSearchConfig {
    /// Sets the tie-break order.
    pub fn with_tie_break(mut self, tie_break: TieBreak) -> Self {
        self.tie_break = Some(tie_break);
        self
    }

    /// Sets the random seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// A random source seeded from this configuration.
    pub fn rng(&self) -> StdRng {
        StdRng::seed_from_u64(self.seed.unwrap_or(DEFAULT_SEED))
    }
}

/// Outcome of a local-search run.
#[derive(Debug, Clone)]
pub struct LocalSearchResult {
    /// The locally optimal state.
    pub state: AssignmentState,
    /// Wall-clock time spent.
    pub elapsed: Duration,
    /// Number of moves applied.
    pub iterations: usize,
    /// Makespan before the first move and after each move.
    pub history: Vec<f64>,
}

impl LocalSearchResult {
    /// Total makespan reduction achieved.
    pub fn improvement(&self) -> f64 {
        match (self.history.first(), self.history.last()) {
            (Some(first), Some(last)) => first - last,
            _ => 0.0,
        }
    }
}

/// Local search over an [`AssignmentState`] under a [`CostModel`].
///
/// The state passed to [`run`](Self::run) must have been built for the same
/// instance and cost model.
///
/// # Examples
///
/// ```
/// use rand::SeedableRng;
/// use u_charging::constructive::from_constrained;
/// use u_charging::evaluation::FixedCharge;
/// use u_charging::local_search::LocalSearch;
/// use u_charging::models::{ChargeMode, Instance};
/// use u_charging::oracle::AssignmentSolution;
///
/// let inst = Instance::new(
///     2,
///     vec![3, 3, 2, 2],
///     vec![1.0, 1.0, 1.0, 1.0],
///     10.0,
///     ChargeMode::Fixed { duration: 1.0 },
/// )
/// .unwrap();
/// let model = FixedCharge::new(1.0);
/// let everything_on_one = AssignmentSolution::from_machines(10.0, &[0, 0, 0, 0], 2);
/// let seed = from_constrained(&inst, &model, &everything_on_one).unwrap();
///
/// let mut rng = rand::rngs::StdRng::seed_from_u64(42);
/// let result = LocalSearch::new(&inst, &model).run(seed, &mut rng);
/// assert_eq!(result.state.cmax(), 5.0);
/// assert_eq!(result.history, vec![10.0, 7.0, 5.0]);
/// ```
#[derive(Debug, Clone)]
pub struct LocalSearch<'a, C> {
    instance: &'a Instance,
    model: &'a C,
    tie_break: TieBreak,
}

impl<'a, C: CostModel> LocalSearch<'a, C> {
    /// Creates a search using the cost model's default tie-break.
    pub fn new(instance: &'a Instance, model: &'a C) -> Self {
        Self {
            instance,
            model,
            tie_break: model.default_tie_break(),
        }
    }

    /// Creates a search from a configuration.
    pub fn from_config(instance: &'a Instance, model: &'a C, config: &LocalSearchConfig) -> Self {
        let search = Self::new(instance, model);
        match config.tie_break {
            Some(tie_break) => search.with_tie_break(tie_break),
            None => search,
        }
    }

    /// Overrides the tie-break order.
    pub fn with_tie_break(mut self, tie_break: TieBreak) -> Self {
        self.tie_break = tie_break;
        self
    }

    /// The tie-break order in use.
    pub fn tie_break(&self) -> TieBreak {
        self.tie_break
    }

    /// Improves `state` until no move lowers the makespan.
    #[tracing::instrument(
        level = "debug",
        skip_all,
        fields(jobs = state.num_jobs(), machines = state.num_machines(), cmax = state.cmax())
    )]
    pub fn run<R: Rng + ?Sized>(&self, state: AssignmentState, rng: &mut R) -> LocalSearchResult {
        let start = Instant::now();
        let mut state = state;
        debug_assert!(state.check_invariants(self.instance, self.model).is_ok());

        let mut history = vec![state.cmax()];
        while let Some(best) = self.best_move(&state, rng) {
            let before = state.cmax();
            self.apply(&mut state, best.mv);
            debug!(
                kind = ?best.mv.kind(),
                step = ?best.mv.as_tuple(),
                saving = best.saving,
                cmax = state.cmax(),
                "move applied"
            );
            debug_assert!(state.check_invariants(self.instance, self.model).is_ok());
            debug_assert!((before - best.saving - state.cmax()).abs() < 1e-6);
            history.push(state.cmax());
        }

        let iterations = history.len() - 1;
        debug!(iterations, cmax = state.cmax(), "local optimum reached");
        LocalSearchResult {
            state,
            elapsed: start.elapsed(),
            iterations,
            history,
        }
    }

    /// The best improving move from `state`, if any.
    pub fn best_move<R: Rng + ?Sized>(
        &self,
        state: &AssignmentState,
        rng: &mut R,
    ) -> Option<ScoredMove> {
        let cm = state.completion_times(self.model);
        let mut critical = critical_machines(&cm);
        if self.tie_break == TieBreak::Shuffle {
            critical.shuffle(rng);
        }
        trace!(cmax = state.cmax(), critical = ?critical, "evaluation pass");

        let rivals: Vec<_> = critical
            .iter()
            .map(|&m1| (m1, best_two_excluding(&cm, m1)))
            .collect();
        let pass = Pass::new(self.instance, self.model, state, &cm);
        for &(m1, top) in &rivals {
            pass.scan_add(m1, top);
        }
        for &(m1, top) in &rivals {
            pass.scan_remove(m1, top);
        }
        for &(m1, top) in &rivals {
            pass.scan_swap(m1, top);
        }
        pass.into_best().filter(|b| b.saving > EPSILON)
    }

    /// Applies `mv` and refreshes the stored makespan.
    pub(crate) fn apply(&self, state: &mut AssignmentState, mv: Move) {
        match mv {
            Move::Add { job, to, .. } | Move::Remove { job, to, .. } => {
                state.relocate(self.instance, job, to.machine, to.slot);
            }
            Move::Swap { first, second, .. } => state.swap(self.instance, first, second),
        }
        state.refresh_makespan(self.model);
    }
}

/// Runs the local search with the cost model's default tie-break.
///
/// Shorthand for [`LocalSearch::new`] followed by [`LocalSearch::run`].
pub fn run_local_search<C: CostModel, R: Rng + ?Sized>(
    instance: &Instance,
    state: AssignmentState,
    model: &C,
    rng: &mut R,
) -> LocalSearchResult {
    LocalSearch::new(instance, model).run(state, rng)
}
