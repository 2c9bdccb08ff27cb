//! Assignment state: which vehicle runs each job, under which charge slot.

use super::{Instance, ModelError};
use crate::evaluation::{CostModel, EPSILON};

/// Where a job sits: vehicle (machine) index and charge-slot index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Placement {
    /// Vehicle index.
    pub machine: usize,
    /// Charge-slot index on that vehicle.
    pub slot: usize,
}

impl Placement {
    /// Creates a placement.
    pub fn new(machine: usize, slot: usize) -> Self {
        Self { machine, slot }
    }
}

/// Per-vehicle slot arena with cached busy time and slot energies.
#[derive(Debug, Clone, PartialEq)]
struct MachineLoad {
    busy: f64,
    slots: Vec<Vec<usize>>,
    energy: Vec<f64>,
}

impl MachineLoad {
    fn empty() -> Self {
        Self {
            busy: 0.0,
            slots: vec![Vec::new()],
            energy: vec![0.0],
        }
    }

    fn refresh_slot(&mut self, slot: usize, instance: &Instance) {
        self.energy[slot] = self.slots[slot].iter().map(|&j| instance.energy(j)).sum();
    }
}

/// The mutable schedule the local search improves.
///
/// Stores, per vehicle, an ordered list of active charge slots, each holding
/// the jobs performed on that charge, plus a job → [`Placement`] index. The
/// dense `x`, `y`, `q` matrices of the mathematical model are available as
/// views ([`x`](Self::x), [`y`](Self::y), [`q`](Self::q)).
///
/// Invariants (see [`check_invariants`](Self::check_invariants)):
/// - every job is placed on exactly one vehicle and one slot;
/// - every vehicle has at least slot 0; slots form a gap-free prefix and only
///   a vehicle's sole slot may be empty;
/// - no slot holds more energy than the battery capacity;
/// - the stored makespan equals the largest completion time.
///
/// States are built by the functions in [`crate::constructive`] and mutated
/// only by the local search.
#[derive(Debug, Clone, PartialEq)]
pub struct AssignmentState {
    machines: Vec<MachineLoad>,
    placement: Vec<Placement>,
    slot_limit: usize,
    capacity: f64,
    cmax: f64,
}

impl AssignmentState {
    /// Builds a state from explicit per-vehicle slot contents.
    ///
    /// `slots[m][r]` lists the jobs vehicle `m` performs under slot `r`. A
    /// vehicle given no slots receives an empty slot 0.
    pub(crate) fn from_slots<C: CostModel>(
        instance: &Instance,
        model: &C,
        slots: Vec<Vec<Vec<usize>>>,
    ) -> Result<Self, ModelError> {
        let m_count = instance.fleet_size();
        if slots.len() != m_count {
            return Err(ModelError::ShapeMismatch {
                matrix: "slots",
                expected: (m_count, instance.slot_limit()),
                actual: (slots.len(), slots.first().map_or(0, Vec::len)),
            });
        }

        let mut placement: Vec<Option<Placement>> = vec![None; instance.num_jobs()];
        let mut machines = Vec::with_capacity(m_count);

        for (m, machine_slots) in slots.into_iter().enumerate() {
            if machine_slots.is_empty() {
                machines.push(MachineLoad::empty());
                continue;
            }
            if machine_slots.len() > instance.slot_limit() {
                return Err(ModelError::TooManySlots {
                    machine: m,
                    required: machine_slots.len(),
                    limit: instance.slot_limit(),
                });
            }
            let single = machine_slots.len() == 1;
            let mut load = MachineLoad {
                busy: 0.0,
                energy: vec![0.0; machine_slots.len()],
                slots: machine_slots,
            };
            for r in 0..load.slots.len() {
                if load.slots[r].is_empty() && !single {
                    return Err(ModelError::BrokenState(format!(
                        "slot {r} on vehicle {m} is empty but not the only slot"
                    )));
                }
                for &j in &load.slots[r] {
                    let cell = placement.get_mut(j).ok_or_else(|| {
                        ModelError::BrokenState(format!("job {j} does not exist"))
                    })?;
                    if cell.is_some() {
                        return Err(ModelError::NotExactlyOne {
                            matrix: "x",
                            row: j,
                            count: 2,
                        });
                    }
                    *cell = Some(Placement::new(m, r));
                    load.busy += instance.duration(j);
                }
                load.refresh_slot(r, instance);
                if load.energy[r] > instance.capacity() + EPSILON {
                    return Err(ModelError::SlotOverCapacity {
                        machine: m,
                        slot: r,
                        energy: load.energy[r],
                        capacity: instance.capacity(),
                    });
                }
            }
            machines.push(load);
        }

        let placement = placement
            .into_iter()
            .enumerate()
            .map(|(j, p)| {
                p.ok_or(ModelError::NotExactlyOne {
                    matrix: "x",
                    row: j,
                    count: 0,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let mut state = Self {
            machines,
            placement,
            slot_limit: instance.slot_limit(),
            capacity: instance.capacity(),
            cmax: 0.0,
        };
        state.cmax = state.recompute_makespan(model);
        Ok(state)
    }

    /// Number of vehicles.
    pub fn num_machines(&self) -> usize {
        self.machines.len()
    }

    /// Number of jobs.
    pub fn num_jobs(&self) -> usize {
        self.placement.len()
    }

    /// Charge slots available per vehicle.
    pub fn slot_limit(&self) -> usize {
        self.slot_limit
    }

    /// Current makespan.
    pub fn cmax(&self) -> f64 {
        self.cmax
    }

    /// Where job `j` currently sits.
    pub fn placement(&self, j: usize) -> Placement {
        self.placement[j]
    }

    /// Number of active slots on vehicle `m` (always at least 1).
    pub fn num_slots(&self, m: usize) -> usize {
        self.machines[m].slots.len()
    }

    /// Jobs performed by vehicle `m` under slot `r`.
    pub fn jobs_in(&self, m: usize, r: usize) -> &[usize] {
        &self.machines[m].slots[r]
    }

    /// Jobs performed by vehicle `m`, slot by slot.
    pub fn jobs_on(&self, m: usize) -> impl Iterator<Item = usize> + '_ {
        self.machines[m].slots.iter().flatten().copied()
    }

    /// Returns `true` if vehicle `m` performs no job.
    pub fn is_idle(&self, m: usize) -> bool {
        self.machines[m].slots.iter().all(Vec::is_empty)
    }

    /// Energy consumed under each active slot of vehicle `m`.
    pub fn slot_energy(&self, m: usize) -> &[f64] {
        &self.machines[m].energy
    }

    /// Total job duration on vehicle `m`.
    pub fn busy(&self, m: usize) -> f64 {
        self.machines[m].busy
    }

    /// Battery capacity left in slot `r` of vehicle `m`.
    pub fn remaining_capacity(&self, m: usize, r: usize) -> f64 {
        self.capacity - self.machines[m].energy[r]
    }

    /// Completion time of vehicle `m`.
    pub fn completion_time<C: CostModel>(&self, model: &C, m: usize) -> f64 {
        let load = &self.machines[m];
        model.completion_time(load.busy, &load.energy)
    }

    /// Completion time of every vehicle.
    pub fn completion_times<C: CostModel>(&self, model: &C) -> Vec<f64> {
        (0..self.machines.len())
            .map(|m| self.completion_time(model, m))
            .collect()
    }

    /// Largest completion time, recomputed from scratch.
    pub fn recompute_makespan<C: CostModel>(&self, model: &C) -> f64 {
        self.completion_times(model)
            .into_iter()
            .fold(0.0, f64::max)
    }

    pub(crate) fn refresh_makespan<C: CostModel>(&mut self, model: &C) {
        self.cmax = self.recompute_makespan(model);
    }

    /// `x[j][m]`: job `j` is performed by vehicle `m`.
    pub fn x(&self) -> Vec<Vec<bool>> {
        let mut x = vec![vec![false; self.machines.len()]; self.placement.len()];
        for (j, p) in self.placement.iter().enumerate() {
            x[j][p.machine] = true;
        }
        x
    }

    /// `y[r][j][m]`: job `j` is performed by vehicle `m` under slot `r`.
    pub fn y(&self) -> Vec<Vec<Vec<bool>>> {
        let mut y =
            vec![vec![vec![false; self.machines.len()]; self.placement.len()]; self.slot_limit];
        for (j, p) in self.placement.iter().enumerate() {
            y[p.slot][j][p.machine] = true;
        }
        y
    }

    /// `q[r][m]`: slot `r` is active on vehicle `m`.
    pub fn q(&self) -> Vec<Vec<bool>> {
        let mut q = vec![vec![false; self.machines.len()]; self.slot_limit];
        for (m, load) in self.machines.iter().enumerate() {
            for row in q.iter_mut().take(load.slots.len()) {
                row[m] = true;
            }
        }
        q
    }

    /// Places job `j` (currently unplaced) on vehicle `m`, slot `r`.
    ///
    /// `r == num_slots(m)` opens a new slot.
    fn attach(&mut self, instance: &Instance, j: usize, m: usize, r: usize) {
        let load = &mut self.machines[m];
        if r == load.slots.len() {
            load.slots.push(Vec::new());
            load.energy.push(0.0);
        }
        load.slots[r].push(j);
        load.busy += instance.duration(j);
        load.refresh_slot(r, instance);
        self.placement[j] = Placement::new(m, r);
    }

    /// Takes job `j` off its slot, removing the slot if it becomes empty
    /// and is not the vehicle's only one.
    fn detach(&mut self, instance: &Instance, j: usize) {
        let from = self.placement[j];
        let load = &mut self.machines[from.machine];
        load.slots[from.slot].retain(|&other| other != j);
        load.busy -= instance.duration(j);
        if load.slots[from.slot].is_empty() && load.slots.len() > 1 {
            load.slots.remove(from.slot);
            load.energy.remove(from.slot);
            for (r, jobs) in load.slots.iter().enumerate().skip(from.slot) {
                for &other in jobs {
                    self.placement[other].slot = r;
                }
            }
        } else {
            load.refresh_slot(from.slot, instance);
        }
    }

    /// Moves job `j` to vehicle `m`, slot `r` (`r == num_slots(m)` opens a
    /// new slot). `m` must differ from the job's current vehicle, so slot
    /// compaction on the source vehicle never shifts `r`.
    pub(crate) fn relocate(&mut self, instance: &Instance, j: usize, m: usize, r: usize) {
        debug_assert_ne!(self.placement[j].machine, m);
        self.detach(instance, j);
        self.attach(instance, j, m, r);
    }

    /// Exchanges two jobs on different vehicles, each taking the other's slot.
    pub(crate) fn swap(&mut self, instance: &Instance, j1: usize, j2: usize) {
        let p1 = self.placement[j1];
        let p2 = self.placement[j2];
        debug_assert_ne!(p1.machine, p2.machine);
        for (p, out, inn) in [(p1, j1, j2), (p2, j2, j1)] {
            let load = &mut self.machines[p.machine];
            if let Some(cell) = load.slots[p.slot].iter_mut().find(|j| **j == out) {
                *cell = inn;
            }
            load.busy += instance.duration(inn) - instance.duration(out);
            load.refresh_slot(p.slot, instance);
        }
        self.placement[j1] = p2;
        self.placement[j2] = p1;
    }

    /// Verifies every structural invariant and that the stored makespan
    /// matches the one recomputed under `model`.
    pub fn check_invariants<C: CostModel>(
        &self,
        instance: &Instance,
        model: &C,
    ) -> Result<(), ModelError> {
        let x = self.x();
        for (j, row) in x.iter().enumerate() {
            let count = row.iter().filter(|&&v| v).count();
            if count != 1 {
                return Err(ModelError::NotExactlyOne {
                    matrix: "x",
                    row: j,
                    count,
                });
            }
        }

        let y = self.y();
        for (j, row) in x.iter().enumerate() {
            for (m, &assigned) in row.iter().enumerate() {
                let count = y.iter().filter(|slot| slot[j][m]).count();
                if count != usize::from(assigned) {
                    return Err(ModelError::BrokenState(format!(
                        "job {j} on vehicle {m} sits in {count} slots"
                    )));
                }
            }
        }

        let q = self.q();
        for m in 0..self.machines.len() {
            if !q[0][m] {
                return Err(ModelError::BrokenState(format!(
                    "slot 0 inactive on vehicle {m}"
                )));
            }
            for r in 1..self.slot_limit {
                if q[r][m] && !q[r - 1][m] {
                    return Err(ModelError::BrokenState(format!(
                        "gap before slot {r} on vehicle {m}"
                    )));
                }
            }
            let load = &self.machines[m];
            for (r, jobs) in load.slots.iter().enumerate() {
                if jobs.is_empty() && load.slots.len() > 1 {
                    return Err(ModelError::BrokenState(format!(
                        "slot {r} on vehicle {m} is active but empty"
                    )));
                }
                let energy: f64 = jobs.iter().map(|&j| instance.energy(j)).sum();
                if energy > instance.capacity() + EPSILON {
                    return Err(ModelError::SlotOverCapacity {
                        machine: m,
                        slot: r,
                        energy,
                        capacity: instance.capacity(),
                    });
                }
                for &j in jobs {
                    if self.placement[j] != Placement::new(m, r) {
                        return Err(ModelError::BrokenState(format!(
                            "index for job {j} disagrees with slot contents"
                        )));
                    }
                }
            }
        }

        let computed = self.recompute_makespan(model);
        if (computed - self.cmax).abs() > 1e-6 {
            return Err(ModelError::MakespanMismatch {
                stored: self.cmax,
                computed,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evaluation::{FixedCharge, VariableCharge};
    use crate::models::ChargeMode;

    fn instance() -> Instance {
        Instance::new(
            3,
            vec![4, 2, 3, 1, 5],
            vec![3.0, 2.0, 4.0, 1.0, 5.0],
            6.0,
            ChargeMode::Fixed { duration: 2.0 },
        )
        .expect("valid")
    }

    fn state(model: &impl CostModel) -> AssignmentState {
        AssignmentState::from_slots(
            &instance(),
            model,
            vec![vec![vec![0, 1], vec![2, 3]], vec![vec![4]], vec![]],
        )
        .expect("valid")
    }

    #[test]
    fn test_from_slots_computes_makespan() {
        let model = FixedCharge::new(2.0);
        let s = state(&model);
        assert_eq!(s.completion_times(&model), vec![12.0, 5.0, 0.0]);
        assert_eq!(s.cmax(), 12.0);
        assert_eq!(s.placement(3), Placement::new(0, 1));
        assert!(s.is_idle(2));
        assert_eq!(s.num_slots(2), 1);
        assert!((s.remaining_capacity(0, 0) - 1.0).abs() < 1e-10);
        s.check_invariants(&instance(), &model).expect("consistent");
    }

    #[test]
    fn test_dense_views() {
        let model = FixedCharge::new(2.0);
        let s = state(&model);
        let x = s.x();
        assert!(x[4][1] && !x[4][0]);
        let y = s.y();
        assert_eq!(y.len(), 5);
        assert!(y[1][2][0]);
        let q = s.q();
        assert_eq!(
            q.iter().map(|row| row[0]).collect::<Vec<_>>(),
            vec![true, true, false, false, false]
        );
        assert!(q[0][2]);
    }

    #[test]
    fn test_rejects_missing_and_duplicate_jobs() {
        let model = FixedCharge::new(2.0);
        let inst = instance();
        let missing =
            AssignmentState::from_slots(
            &inst,
            &model,
            vec![vec![vec![0, 1]], vec![vec![2]], vec![vec![3]]],
        );
        assert!(matches!(
            missing,
            Err(ModelError::NotExactlyOne { row: 4, count: 0, .. })
        ));
        let dup = AssignmentState::from_slots(
            &inst,
            &model,
            vec![vec![vec![0, 1]], vec![vec![1, 2, 3, 4]], vec![]],
        );
        assert!(matches!(dup, Err(ModelError::NotExactlyOne { row: 1, count: 2, .. })));
    }

    #[test]
    fn test_rejects_over_capacity_slot() {
        let model = FixedCharge::new(2.0);
        let res = AssignmentState::from_slots(
            &instance(),
            &model,
            vec![vec![vec![0, 2], vec![1, 3]], vec![vec![4]], vec![]],
        );
        assert!(matches!(res, Err(ModelError::SlotOverCapacity { machine: 0, slot: 0, .. })));
    }

    #[test]
    fn test_relocate_compacts_emptied_slot() {
        let model = FixedCharge::new(2.0);
        let inst = instance();
        let mut s = AssignmentState::from_slots(
            &inst,
            &model,
            vec![vec![vec![0], vec![1], vec![3]], vec![vec![4]], vec![vec![2]]],
        )
        .expect("valid");
        s.relocate(&inst, 1, 2, 0);
        s.refresh_makespan(&model);
        assert_eq!(s.num_slots(0), 2);
        assert_eq!(s.jobs_in(0, 1), &[3]);
        assert_eq!(s.placement(3), Placement::new(0, 1));
        assert_eq!(s.placement(1), Placement::new(2, 0));
        s.check_invariants(&inst, &model).expect("consistent");
    }

    #[test]
    fn test_relocate_to_new_slot_and_back_to_idle() {
        let model = VariableCharge::new(1.0);
        let inst = instance();
        let mut s = state(&model);
        s.relocate(&inst, 4, 0, 2);
        s.refresh_makespan(&model);
        assert_eq!(s.num_slots(0), 3);
        assert!(s.is_idle(1));
        assert_eq!(s.num_slots(1), 1);
        assert_eq!(s.busy(1), 0.0);
        s.check_invariants(&inst, &model).expect("consistent");
    }

    #[test]
    fn test_swap_exchanges_slots() {
        let model = FixedCharge::new(2.0);
        let inst = instance();
        let mut s = state(&model);
        s.swap(&inst, 3, 4);
        s.refresh_makespan(&model);
        assert_eq!(s.placement(4), Placement::new(0, 1));
        assert_eq!(s.placement(3), Placement::new(1, 0));
        assert_eq!(s.busy(1), 1.0);
        assert!(s.check_invariants(&inst, &model).is_err(), "slot 1 of vehicle 0 now holds 9");
    }

    #[test]
    fn test_stale_makespan_detected() {
        let model = FixedCharge::new(2.0);
        let inst = instance();
        let mut s = state(&model);
        s.relocate(&inst, 1, 2, 0);
        assert!(matches!(
            s.check_invariants(&inst, &model),
            Err(ModelError::MakespanMismatch { .. })
        ));
    }
}
