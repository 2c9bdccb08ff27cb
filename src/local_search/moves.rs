//! The three move neighborhoods and their exact savings.
//!
//! Every move takes load off a critical vehicle `m1` and puts load on some
//! other vehicle `m2`:
//!
//! - **Add** — a job leaves its slot on `m1` and opens a new slot on `m2`
//!   (always energy-feasible, pays for one more recharge on `m2`)
//! - **Remove** — a job leaves its slot on `m1` and joins an existing slot
//!   on `m2` with enough remaining capacity
//! - **Swap** — two jobs on `m1` and `m2` trade slots, if both slots can
//!   absorb the energy difference
//!
//! A candidate's saving is `max(0, cmax - max(new(m1), new(m2), rival))`
//! where `rival` is the largest completion time of the other vehicles.

use std::cell::Cell;

use super::rivals::BestTwo;
use crate::evaluation::{CostModel, EPSILON};
use crate::models::{AssignmentState, Instance, Placement};

/// Move categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MoveKind {
    /// Job to a new slot on another vehicle.
    Add,
    /// Job to an existing slot on another vehicle.
    Remove,
    /// Two jobs exchange slots.
    Swap,
}

/// A single local-search move.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Move {
    /// Move `job` from `from` onto a new slot `to` (`to.slot` is the target
    /// vehicle's current slot count).
    Add {
        /// Job moved.
        job: usize,
        /// Current placement.
        from: Placement,
        /// New placement.
        to: Placement,
    },
    /// Move `job` from `from` into the existing slot `to`.
    Remove {
        /// Job moved.
        job: usize,
        /// Current placement.
        from: Placement,
        /// New placement.
        to: Placement,
    },
    /// Exchange job `first` (at `first_at`) with job `second` (at `second_at`).
    Swap {
        /// Job on the critical vehicle.
        first: usize,
        /// Its placement.
        first_at: Placement,
        /// Job on the other vehicle.
        second: usize,
        /// Its placement.
        second_at: Placement,
    },
}

impl Move {
    /// The move's category.
    pub fn kind(&self) -> MoveKind {
        match self {
            Self::Add { .. } => MoveKind::Add,
            Self::Remove { .. } => MoveKind::Remove,
            Self::Swap { .. } => MoveKind::Swap,
        }
    }

    /// The move as `(m1, r1, j1, m2, r2, j2)`; `j1 == j2` unless swapping.
    pub fn as_tuple(&self) -> (usize, usize, usize, usize, usize, usize) {
        match *self {
            Self::Add { job, from, to } | Self::Remove { job, from, to } => {
                (from.machine, from.slot, job, to.machine, to.slot, job)
            }
            Self::Swap {
                first,
                first_at,
                second,
                second_at,
            } => (
                first_at.machine,
                first_at.slot,
                first,
                second_at.machine,
                second_at.slot,
                second,
            ),
        }
    }
}

/// A move with the makespan reduction it achieves.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoredMove {
    /// Reduction in makespan.
    pub saving: f64,
    /// The move.
    pub mv: Move,
}

/// One evaluation pass over a frozen state.
pub(crate) struct Pass<'s, C> {
    instance: &'s Instance,
    model: &'s C,
    state: &'s AssignmentState,
    cm: &'s [f64],
    /// `(slot, job)` pairs per vehicle, listed once per pass.
    jobs: Vec<Vec<(usize, usize)>>,
    best: Cell<Option<ScoredMove>>,
}

impl<'s, C: CostModel> Pass<'s, C> {
    pub(crate) fn new(
        instance: &'s Instance,
        model: &'s C,
        state: &'s AssignmentState,
        cm: &'s [f64],
    ) -> Self {
        let jobs = (0..state.num_machines())
            .map(|m| {
                (0..state.num_slots(m))
                    .flat_map(|r| state.jobs_in(m, r).iter().map(move |&j| (r, j)))
                    .collect()
            })
            .collect();
        Self {
            instance,
            model,
            state,
            cm,
            jobs,
            best: Cell::new(None),
        }
    }

    pub(crate) fn into_best(self) -> Option<ScoredMove> {
        self.best.into_inner()
    }

    /// Keeps `mv` if it strictly beats every candidate seen so far.
    fn offer(&self, m1_new: f64, m2_new: f64, rival: f64, mv: Move) {
        let saving = (self.state.cmax() - m1_new.max(m2_new).max(rival)).max(0.0);
        let floor = self.best.get().map_or(0.0, |b| b.saving);
        if saving > floor + EPSILON {
            self.best.set(Some(ScoredMove { saving, mv }));
        }
    }

    /// Completion time of `m1` once job `j` leaves slot `r1`.
    fn without(&self, m1: usize, r1: usize, j: usize) -> f64 {
        let empties = self.state.jobs_in(m1, r1).len() == 1;
        self.cm[m1] - self.instance.duration(j)
            + self.model.removal_cost(
                self.state.slot_energy(m1),
                r1,
                self.instance.energy(j),
                empties,
            )
    }

    pub(crate) fn scan_add(&self, m1: usize, rivals: BestTwo) {
        let state = self.state;
        for &(r1, j) in &self.jobs[m1] {
            let m1_new = self.without(m1, r1, j);
            for m2 in 0..state.num_machines() {
                // An idle vehicle's empty slot 0 is reached by Remove instead.
                if m2 == m1 || state.is_idle(m2) {
                    continue;
                }
                let r2 = state.num_slots(m2);
                if r2 >= state.slot_limit() {
                    continue;
                }
                let m2_new = self.cm[m2]
                    + self.instance.duration(j)
                    + self.model.insertion_cost(
                        state.slot_energy(m2),
                        r2,
                        self.instance.energy(j),
                    );
                let mv = Move::Add {
                    job: j,
                    from: Placement::new(m1, r1),
                    to: Placement::new(m2, r2),
                };
                self.offer(m1_new, m2_new, rivals.competitor(self.cm, m2), mv);
            }
        }
    }

    pub(crate) fn scan_remove(&self, m1: usize, rivals: BestTwo) {
        let state = self.state;
        for &(r1, j) in &self.jobs[m1] {
            let m1_new = self.without(m1, r1, j);
            let e = self.instance.energy(j);
            for m2 in 0..state.num_machines() {
                if m2 == m1 {
                    continue;
                }
                let rival = rivals.competitor(self.cm, m2);
                for r2 in 0..state.num_slots(m2) {
                    if !self.model.fits(state.remaining_capacity(m2, r2), e) {
                        continue;
                    }
                    let m2_new = self.cm[m2]
                        + self.instance.duration(j)
                        + self.model.insertion_cost(state.slot_energy(m2), r2, e);
                    let mv = Move::Remove {
                        job: j,
                        from: Placement::new(m1, r1),
                        to: Placement::new(m2, r2),
                    };
                    self.offer(m1_new, m2_new, rival, mv);
                }
            }
        }
    }

    pub(crate) fn scan_swap(&self, m1: usize, rivals: BestTwo) {
        let state = self.state;
        let inst = self.instance;
        for &(r1, j1) in &self.jobs[m1] {
            let (d1, e1) = (inst.duration(j1), inst.energy(j1));
            for m2 in 0..state.num_machines() {
                if m2 == m1 {
                    continue;
                }
                let rival = rivals.competitor(self.cm, m2);
                for &(r2, j2) in &self.jobs[m2] {
                    let (d2, e2) = (inst.duration(j2), inst.energy(j2));
                    let fits = self.model.fits(state.remaining_capacity(m1, r1), e2 - e1)
                        && self.model.fits(state.remaining_capacity(m2, r2), e1 - e2);
                    if !fits {
                        continue;
                    }
                    let m1_new = self.cm[m1] - d1
                        + d2
                        + self
                            .model
                            .exchange_cost(state.slot_energy(m1), r1, e1, e2);
                    let m2_new = self.cm[m2] - d2
                        + d1
                        + self
                            .model
                            .exchange_cost(state.slot_energy(m2), r2, e2, e1);
                    let mv = Move::Swap {
                        first: j1,
                        first_at: Placement::new(m1, r1),
                        second: j2,
                        second_at: Placement::new(m2, r2),
                    };
                    self.offer(m1_new, m2_new, rival, mv);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evaluation::{FixedCharge, VariableCharge};
    use crate::local_search::best_two_excluding;
    use crate::models::ChargeMode;

    fn instance(fleet: usize) -> Instance {
        Instance::new(
            fleet,
            vec![4, 3, 2, 1],
            vec![5.0, 4.0, 3.0, 2.0],
            8.0,
            ChargeMode::Fixed { duration: 2.0 },
        )
        .expect("valid")
    }

    fn best<C: CostModel>(
        inst: &Instance,
        model: &C,
        state: &AssignmentState,
        kind: MoveKind,
    ) -> Option<ScoredMove> {
        let cm = state.completion_times(model);
        let pass = Pass::new(inst, model, state, &cm);
        let rivals = best_two_excluding(&cm, 0);
        match kind {
            MoveKind::Add => pass.scan_add(0, rivals),
            MoveKind::Remove => pass.scan_remove(0, rivals),
            MoveKind::Swap => pass.scan_swap(0, rivals),
        }
        pass.into_best()
    }

    #[test]
    fn test_pass_lists_jobs_once_per_vehicle() {
        let inst = instance(3);
        let model = FixedCharge::new(2.0);
        let state = AssignmentState::from_slots(
            &inst,
            &model,
            vec![vec![vec![0, 2], vec![1]], vec![vec![3]], vec![]],
        )
        .expect("valid");
        let cm = state.completion_times(&model);
        let pass = Pass::new(&inst, &model, &state, &cm);
        assert_eq!(pass.jobs[0], vec![(0, 0), (0, 2), (1, 1)]);
        assert_eq!(pass.jobs[1], vec![(0, 3)]);
        assert!(pass.jobs[2].is_empty());
    }

    #[test]
    fn test_remove_into_idle_vehicle() {
        let inst = instance(2);
        let model = FixedCharge::new(2.0);
        // Vehicle 0: [0, 2] [1, 3] → 10 + 2 = 12; vehicle 1 idle.
        let state =
            AssignmentState::from_slots(&inst, &model, vec![vec![vec![0, 2], vec![1, 3]], vec![]])
                .expect("valid");
        let found = best(&inst, &model, &state, MoveKind::Remove).expect("improving");
        // Best: move job 0 (d = 4) → vehicle 0 keeps 6 + 2 = 8, vehicle 1 gets 4.
        // Moving job 1 (d = 3) empties nothing → 9. Job 0 wins with saving 4.
        assert_eq!(found.saving, 4.0);
        assert_eq!(found.mv.as_tuple(), (0, 0, 0, 1, 0, 0));
        assert_eq!(found.mv.kind(), MoveKind::Remove);
    }

    #[test]
    fn test_add_skips_idle_and_pays_recharge() {
        let inst = instance(2);
        let model = FixedCharge::new(2.0);
        let idle =
            AssignmentState::from_slots(&inst, &model, vec![vec![vec![0, 2], vec![1, 3]], vec![]])
                .expect("valid");
        assert_eq!(best(&inst, &model, &idle, MoveKind::Add), None);

        // Vehicle 0: [0] [1] [2]; vehicle 1: [3].
        let state = AssignmentState::from_slots(
            &inst,
            &model,
            vec![vec![vec![0], vec![1], vec![2]], vec![vec![3]]],
        )
        .expect("valid");
        // cm = [9 + 4, 1] = [13, 1]. Adding job 0 (sole occupant of slot 0):
        // m1 = 13 - 4 - 2 = 7, m2 = 1 + 4 + 2 = 7 → saving 6.
        let found = best(&inst, &model, &state, MoveKind::Add).expect("improving");
        assert_eq!(found.saving, 6.0);
        assert_eq!(found.mv.as_tuple(), (0, 0, 0, 1, 1, 0));
    }

    #[test]
    fn test_swap_respects_capacity() {
        let inst = instance(2);
        let model = FixedCharge::new(2.0);
        // Vehicle 0: [0, 3] (7 energy), vehicle 1: [1, 2] (7 energy).
        // Swapping 3 (e 2) for 1 (e 4) would put 9 in vehicle 0's slot.
        let state =
            AssignmentState::from_slots(&inst, &model, vec![vec![vec![0, 3]], vec![vec![1, 2]]])
                .expect("valid");
        assert_eq!(state.completion_times(&model), vec![5.0, 5.0]);
        let cm = state.completion_times(&model);
        let pass = Pass::new(&inst, &model, &state, &cm);
        pass.scan_swap(0, best_two_excluding(&cm, 0));
        assert_eq!(pass.into_best(), None);
    }

    #[test]
    fn test_swap_reduces_both_vehicles() {
        let inst = Instance::new(
            3,
            vec![6, 1, 5, 2, 4],
            vec![1.0, 1.0, 1.0, 1.0, 1.0],
            10.0,
            ChargeMode::Fixed { duration: 2.0 },
        )
        .expect("valid");
        let model = FixedCharge::new(2.0);
        // cm = [7, 7, 4]: two critical vehicles, a swap must lower both.
        let state = AssignmentState::from_slots(
            &inst,
            &model,
            vec![vec![vec![0, 1]], vec![vec![2, 3]], vec![vec![4]]],
        )
        .expect("valid");
        let found = best(&inst, &model, &state, MoveKind::Swap);
        // Any swap between 0 and 1 keeps the pair sum at 14 → no gain.
        assert_eq!(found, None);

        let found = best(&inst, &model, &state, MoveKind::Remove);
        // Job 1 (d 1) to vehicle 2 leaves vehicle 1 at 7 → no gain either.
        assert_eq!(found, None);
    }

    #[test]
    fn test_variable_swap_prices_non_last_slot() {
        let inst = Instance::new(
            2,
            vec![3, 3, 3],
            vec![2.0, 6.0, 1.0],
            8.0,
            ChargeMode::variable(1.0),
        )
        .expect("valid");
        let model = VariableCharge::new(1.0);
        // Vehicle 0: [1] [0] → 6 + 6 = 12; vehicle 1: [2] → 3.
        let state =
            AssignmentState::from_slots(&inst, &model, vec![vec![vec![1], vec![0]], vec![vec![2]]])
                .expect("valid");
        assert_eq!(state.cmax(), 12.0);
        let found = best(&inst, &model, &state, MoveKind::Swap).expect("improving");
        // Swap 1 (e 6, slot 0) with 2 (e 1): vehicle 0 → 6 + 1 = 7, vehicle 1 → 3.
        assert_eq!(found.saving, 5.0);
        assert_eq!(found.mv.as_tuple(), (0, 0, 1, 1, 0, 2));
    }
}
