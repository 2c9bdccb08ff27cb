//! Input-invariant violations.

use std::fmt;

/// A malformed instance or oracle result.
///
/// These are precondition failures: they are raised before any local-search
/// work starts and are never recovered from inside the engine.
#[derive(Debug, Clone, PartialEq)]
pub enum ModelError {
    /// The fleet has no vehicles.
    EmptyFleet,
    /// The instance has no jobs.
    NoJobs,
    /// A per-job array does not have the declared job count.
    LengthMismatch {
        /// Name of the offending field.
        field: &'static str,
        /// Declared number of jobs.
        expected: usize,
        /// Actual array length.
        actual: usize,
    },
    /// A job duration is zero.
    NonPositiveDuration {
        /// Job index.
        job: usize,
    },
    /// A job energy cost is not a positive finite number.
    NonPositiveEnergy {
        /// Job index.
        job: usize,
        /// The rejected value.
        energy: f64,
    },
    /// The battery capacity is not a positive finite number.
    InvalidCapacity(f64),
    /// A single job needs more energy than a full battery holds.
    JobExceedsCapacity {
        /// Job index.
        job: usize,
        /// Energy cost of the job.
        energy: f64,
        /// Battery capacity.
        capacity: f64,
    },
    /// A charge duration, rate, or setup term is negative or not finite.
    InvalidChargeParameter {
        /// Parameter name.
        name: &'static str,
        /// The rejected value.
        value: f64,
    },
    /// The number of charge slots per vehicle is zero.
    InvalidSlotLimit(usize),
    /// An oracle matrix has the wrong number of rows or columns.
    ShapeMismatch {
        /// Matrix name.
        matrix: &'static str,
        /// Expected `(rows, cols)`.
        expected: (usize, usize),
        /// Actual `(rows, cols)`; `cols` is the first mismatching row length.
        actual: (usize, usize),
    },
    /// A row of an assignment matrix does not contain exactly one `true`.
    NotExactlyOne {
        /// Matrix name.
        matrix: &'static str,
        /// Row index.
        row: usize,
        /// Number of `true` entries found.
        count: usize,
    },
    /// An inactive charge group still holds jobs or a vehicle.
    InactiveGroupUsed {
        /// Group index.
        group: usize,
    },
    /// A packed charge group holds more energy than the battery capacity.
    GroupOverCapacity {
        /// Group index.
        group: usize,
        /// Energy packed into the group.
        energy: f64,
        /// Battery capacity.
        capacity: f64,
    },
    /// A vehicle needs more charge slots than the instance allows.
    TooManySlots {
        /// Vehicle index.
        machine: usize,
        /// Slots required.
        required: usize,
        /// Slot limit.
        limit: usize,
    },
    /// A charge slot holds more energy than the battery capacity.
    SlotOverCapacity {
        /// Vehicle index.
        machine: usize,
        /// Slot index.
        slot: usize,
        /// Energy held by the slot.
        energy: f64,
        /// Battery capacity.
        capacity: f64,
    },
    /// The recorded makespan disagrees with the recomputed one.
    MakespanMismatch {
        /// Stored makespan.
        stored: f64,
        /// Makespan recomputed from the assignment.
        computed: f64,
    },
    /// The assignment state breaks a structural invariant.
    BrokenState(String),
}

impl fmt::Display for ModelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyFleet => write!(f, "fleet size must be at least 1"),
            Self::NoJobs => write!(f, "instance has no jobs"),
            Self::LengthMismatch {
                field,
                expected,
                actual,
            } => write!(f, "{field} has {actual} entries, expected {expected}"),
            Self::NonPositiveDuration { job } => write!(f, "job {job} has zero duration"),
            Self::NonPositiveEnergy { job, energy } => {
                write!(f, "job {job} has invalid energy cost {energy}")
            }
            Self::InvalidCapacity(b) => write!(f, "invalid battery capacity {b}"),
            Self::JobExceedsCapacity {
                job,
                energy,
                capacity,
            } => write!(
                f,
                "job {job} needs {energy} energy but battery capacity is {capacity}"
            ),
            Self::InvalidChargeParameter { name, value } => {
                write!(f, "invalid charge parameter {name} = {value}")
            }
            Self::InvalidSlotLimit(r) => write!(f, "invalid charge slot limit {r}"),
            Self::ShapeMismatch {
                matrix,
                expected,
                actual,
            } => write!(
                f,
                "{matrix} has shape {}x{}, expected {}x{}",
                actual.0, actual.1, expected.0, expected.1
            ),
            Self::NotExactlyOne { matrix, row, count } => {
                write!(f, "row {row} of {matrix} has {count} entries set, expected 1")
            }
            Self::InactiveGroupUsed { group } => {
                write!(f, "charge group {group} is inactive but in use")
            }
            Self::GroupOverCapacity {
                group,
                energy,
                capacity,
            } => write!(
                f,
                "charge group {group} holds {energy} energy, capacity is {capacity}"
            ),
            Self::TooManySlots {
                machine,
                required,
                limit,
            } => write!(
                f,
                "vehicle {machine} needs {required} charge slots, limit is {limit}"
            ),
            Self::SlotOverCapacity {
                machine,
                slot,
                energy,
                capacity,
            } => write!(
                f,
                "slot {slot} on vehicle {machine} holds {energy} energy, capacity is {capacity}"
            ),
            Self::MakespanMismatch { stored, computed } => {
                write!(f, "stored makespan {stored} differs from computed {computed}")
            }
            Self::BrokenState(msg) => write!(f, "broken assignment state: {msg}"),
        }
    }
}

impl std::error::Error for ModelError {}
