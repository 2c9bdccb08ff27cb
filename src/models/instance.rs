//! Immutable problem data: jobs, fleet, battery, and charging parameters.

use serde::{Deserialize, Serialize};

use super::ModelError;

/// How long a vehicle spends recharging between two charge slots.
///
/// # Examples
///
/// ```
/// use u_charging::models::ChargeMode;
///
/// let fixed = ChargeMode::Fixed { duration: 2.0 };
/// let variable = ChargeMode::variable(0.5);
/// assert!(fixed.is_fixed());
/// assert!(!variable.is_fixed());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum ChargeMode {
    /// Every recharge takes the same `duration`.
    Fixed {
        /// Time per recharge.
        duration: f64,
    },
    /// A recharge takes `setup + rate * energy`, where `energy` is what the
    /// previous slot consumed.
    Variable {
        /// Time per unit of energy restored.
        rate: f64,
        /// Constant time per recharge.
        #[serde(default)]
        setup: f64,
    },
}

impl ChargeMode {
    /// Energy-proportional charging with no constant term.
    pub fn variable(rate: f64) -> Self {
        Self::Variable { rate, setup: 0.0 }
    }

    /// Returns `true` for fixed-duration charging.
    pub fn is_fixed(&self) -> bool {
        matches!(self, Self::Fixed { .. })
    }

    fn validate(&self) -> Result<(), ModelError> {
        let params: &[(&'static str, f64)] = match self {
            Self::Fixed { duration } => &[("duration", *duration)],
            Self::Variable { rate, setup } => &[("rate", *rate), ("setup", *setup)],
        };
        for &(name, value) in params {
            if !value.is_finite() || value < 0.0 {
                return Err(ModelError::InvalidChargeParameter { name, value });
            }
        }
        Ok(())
    }
}

/// The structured instance record as delivered by an instance parser.
///
/// Carries the declared job count separately so that length mismatches in
/// the per-job arrays are caught on conversion to [`Instance`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstanceRecord {
    /// Number of vehicles.
    pub fleet_size: usize,
    /// Declared number of jobs.
    pub job_count: usize,
    /// Duration of each job.
    pub job_durations: Vec<u64>,
    /// Energy consumed by each job.
    pub energy_costs: Vec<f64>,
    /// Usable battery capacity per charge.
    pub battery_capacity: f64,
    /// Charging time model.
    pub charge: ChargeMode,
    /// Charge slots available per vehicle (defaults to the job count).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub charge_slots: Option<usize>,
}

/// A validated fleet-charging scheduling instance.
///
/// # Examples
///
/// ```
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
/// assert_eq!(inst.num_jobs(), 4);
/// assert_eq!(inst.slot_limit(), 4);
/// assert_eq!(inst.total_duration(), 10.0);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "InstanceRecord", into = "InstanceRecord")]
pub struct Instance {
    fleet_size: usize,
    durations: Vec<u64>,
    energies: Vec<f64>,
    capacity: f64,
    charge: ChargeMode,
    slot_limit: usize,
}

impl Instance {
    /// Creates and validates an instance. The slot limit defaults to the
    /// number of jobs, which is always enough.
    pub fn new(
        fleet_size: usize,
        durations: Vec<u64>,
        energies: Vec<f64>,
        capacity: f64,
        charge: ChargeMode,
    ) -> Result<Self, ModelError> {
        let slot_limit = durations.len();
        let inst = Self {
            fleet_size,
            durations,
            energies,
            capacity,
            charge,
            slot_limit,
        };
        inst.validate()?;
        Ok(inst)
    }

    /// Overrides the number of charge slots per vehicle.
    pub fn with_slot_limit(mut self, slots: usize) -> Result<Self, ModelError> {
        if slots == 0 {
            return Err(ModelError::InvalidSlotLimit(slots));
        }
        self.slot_limit = slots;
        Ok(self)
    }

    fn validate(&self) -> Result<(), ModelError> {
        if self.fleet_size == 0 {
            return Err(ModelError::EmptyFleet);
        }
        if self.durations.is_empty() {
            return Err(ModelError::NoJobs);
        }
        if self.energies.len() != self.durations.len() {
            return Err(ModelError::LengthMismatch {
                field: "energy_costs",
                expected: self.durations.len(),
                actual: self.energies.len(),
            });
        }
        if !self.capacity.is_finite() || self.capacity <= 0.0 {
            return Err(ModelError::InvalidCapacity(self.capacity));
        }
        if let Some(job) = self.durations.iter().position(|&d| d == 0) {
            return Err(ModelError::NonPositiveDuration { job });
        }
        for (job, &energy) in self.energies.iter().enumerate() {
            if !energy.is_finite() || energy <= 0.0 {
                return Err(ModelError::NonPositiveEnergy { job, energy });
            }
            if energy > self.capacity {
                return Err(ModelError::JobExceedsCapacity {
                    job,
                    energy,
                    capacity: self.capacity,
                });
            }
        }
        self.charge.validate()?;
        if self.slot_limit == 0 {
            return Err(ModelError::InvalidSlotLimit(self.slot_limit));
        }
        Ok(())
    }

    /// Number of vehicles (M).
    pub fn fleet_size(&self) -> usize {
        self.fleet_size
    }

    /// Number of jobs (J).
    pub fn num_jobs(&self) -> usize {
        self.durations.len()
    }

    /// Duration of job `j`.
    pub fn duration(&self, j: usize) -> f64 {
        self.durations[j] as f64
    }

    /// All job durations.
    pub fn durations(&self) -> &[u64] {
        &self.durations
    }

    /// Energy cost of job `j`.
    pub fn energy(&self, j: usize) -> f64 {
        self.energies[j]
    }

    /// All job energy costs.
    pub fn energies(&self) -> &[f64] {
        &self.energies
    }

    /// Battery capacity per charge (b).
    pub fn capacity(&self) -> f64 {
        self.capacity
    }

    /// Charging time model.
    pub fn charge(&self) -> ChargeMode {
        self.charge
    }

    /// Charge slots available per vehicle (R).
    pub fn slot_limit(&self) -> usize {
        self.slot_limit
    }

    /// Sum of all job durations.
    pub fn total_duration(&self) -> f64 {
        self.durations.iter().map(|&d| d as f64).sum()
    }

    /// Sum of all job energy costs.
    pub fn total_energy(&self) -> f64 {
        self.energies.iter().sum()
    }
}

impl TryFrom<InstanceRecord> for Instance {
    type Error = ModelError;

    fn try_from(record: InstanceRecord) -> Result<Self, Self::Error> {
        if record.job_durations.len() != record.job_count {
            return Err(ModelError::LengthMismatch {
                field: "job_durations",
                expected: record.job_count,
                actual: record.job_durations.len(),
            });
        }
        if record.energy_costs.len() != record.job_count {
            return Err(ModelError::LengthMismatch {
                field: "energy_costs",
                expected: record.job_count,
                actual: record.energy_costs.len(),
            });
        }
        let inst = Self::new(
            record.fleet_size,
            record.job_durations,
            record.energy_costs,
            record.battery_capacity,
            record.charge,
        )?;
        match record.charge_slots {
            Some(slots) => inst.with_slot_limit(slots),
            None => Ok(inst),
        }
    }
}

impl From<Instance> for InstanceRecord {
    fn from(inst: Instance) -> Self {
        let charge_slots = (inst.slot_limit != inst.durations.len()).then_some(inst.slot_limit);
        Self {
            fleet_size: inst.fleet_size,
            job_count: inst.durations.len(),
            job_durations: inst.durations,
            energy_costs: inst.energies,
            battery_capacity: inst.capacity,
            charge: inst.charge,
            charge_slots,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record() -> InstanceRecord {
        InstanceRecord {
            fleet_size: 2,
            job_count: 4,
            job_durations: vec![1, 2, 3, 4],
            energy_costs: vec![6.0, 3.0, 1.0, 6.0],
            battery_capacity: 11.0,
            charge: ChargeMode::Fixed { duration: 2.0 },
            charge_slots: None,
        }
    }

    #[test]
    fn test_record_conversion() {
        let inst = Instance::try_from(record()).expect("valid");
        assert_eq!(inst.fleet_size(), 2);
        assert_eq!(inst.num_jobs(), 4);
        assert_eq!(inst.slot_limit(), 4);
        assert!((inst.total_energy() - 16.0).abs() < 1e-10);
    }

    #[test]
    fn test_declared_count_mismatch() {
        let mut rec = record();
        rec.job_count = 5;
        assert_eq!(
            Instance::try_from(rec),
            Err(ModelError::LengthMismatch {
                field: "job_durations",
                expected: 5,
                actual: 4,
            })
        );
    }

    #[test]
    fn test_energy_length_mismatch() {
        let mut rec = record();
        rec.energy_costs.pop();
        assert!(matches!(
            Instance::try_from(rec),
            Err(ModelError::LengthMismatch {
                field: "energy_costs",
                ..
            })
        ));
    }

    #[test]
    fn test_rejects_bad_values() {
        let fixed = ChargeMode::Fixed { duration: 2.0 };
        assert_eq!(
            Instance::new(0, vec![1], vec![1.0], 5.0, fixed),
            Err(ModelError::EmptyFleet)
        );
        assert_eq!(
            Instance::new(1, vec![0], vec![1.0], 5.0, fixed),
            Err(ModelError::NonPositiveDuration { job: 0 })
        );
        assert!(matches!(
            Instance::new(1, vec![1], vec![6.0], 5.0, fixed),
            Err(ModelError::JobExceedsCapacity { job: 0, .. })
        ));
        assert!(matches!(
            Instance::new(1, vec![1], vec![1.0], 5.0, ChargeMode::variable(-1.0)),
            Err(ModelError::InvalidChargeParameter { name: "rate", .. })
        ));
        assert!(Instance::new(1, vec![1], vec![1.0], 5.0, fixed)
            .unwrap()
            .with_slot_limit(0)
            .is_err());
    }

    #[test]
    fn test_json_round_trip_keeps_validation() {
        let json = r#"{
            "fleet_size": 3,
            "job_count": 2,
            "job_durations": [5, 7],
            "energy_costs": [2.5, 4.0],
            "battery_capacity": 10.0,
            "charge": { "mode": "variable", "rate": 0.5 },
            "charge_slots": 1
        }"#;
        let inst: Instance = serde_json::from_str(json).expect("valid json");
        assert_eq!(inst.slot_limit(), 1);
        assert_eq!(inst.charge(), ChargeMode::Variable { rate: 0.5, setup: 0.0 });

        let back = serde_json::to_string(&inst).expect("serializable");
        let again: Instance = serde_json::from_str(&back).expect("valid json");
        assert_eq!(inst, again);

        let bad = json.replace("\"job_count\": 2", "\"job_count\": 3");
        assert!(serde_json::from_str::<Instance>(&bad).is_err());
    }
}
