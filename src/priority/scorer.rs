//! Priority weight lookup.

use serde::{Deserialize, Serialize};

use crate::error::CorridorError;
use crate::models::{Vehicle, VehicleType};

/// Weight per vehicle class.
///
/// Emergency vehicles weigh 5–10× a regular vehicle; the default
/// multiplier is 5.
///
/// # Examples
///
/// ```
/// use u_corridor::priority::PriorityTable;
///
/// let table = PriorityTable::default().with_emergency_multiplier(8.0);
/// assert_eq!(table.emergency, 8.0);
/// assert_eq!(table.multiplier(), 8.0);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriorityTable {
    /// Weight of a regular vehicle.
    pub regular: f64,
    /// Weight of an emergency vehicle.
    pub emergency: f64,
}

impl PriorityTable {
    /// Smallest accepted [`multiplier`](Self::multiplier).
    pub const MIN_MULTIPLIER: f64 = 5.0;
    /// Largest accepted [`multiplier`](Self::multiplier).
    pub const MAX_MULTIPLIER: f64 = 10.0;

    /// Creates a table from explicit weights.
    pub fn new(regular: f64, emergency: f64) -> Self {
        Self { regular, emergency }
    }

    /// Sets the emergency weight to `multiplier × regular`.
    pub fn with_emergency_multiplier(mut self, multiplier: f64) -> Self {
        self.emergency = self.regular * multiplier;
        self
    }

    /// Emergency weight relative to regular weight.
    pub fn multiplier(&self) -> f64 {
        self.emergency / self.regular
    }

    /// Checks that both weights are positive and the emergency multiplier
    /// lies in `[MIN_MULTIPLIER, MAX_MULTIPLIER]`.
    pub fn validate(&self) -> Result<(), CorridorError> {
        let positive = |w: f64| w.is_finite() && w > 0.0;
        if !positive(self.regular) || !positive(self.emergency) {
            return Err(CorridorError::InvalidConfiguration(format!(
                "priority weights must be positive and finite (regular {}, emergency {})",
                self.regular, self.emergency
            )));
        }
        if self.emergency <= self.regular {
            return Err(CorridorError::InvalidConfiguration(format!(
                "emergency weight {} must exceed regular weight {}",
                self.emergency, self.regular
            )));
        }
        let m = self.multiplier();
        let eps = 1e-9;
        if m < Self::MIN_MULTIPLIER - eps || m > Self::MAX_MULTIPLIER + eps {
            return Err(CorridorError::InvalidConfiguration(format!(
                "emergency multiplier {m} outside [{}, {}]",
                Self::MIN_MULTIPLIER,
                Self::MAX_MULTIPLIER
            )));
        }
        Ok(())
    }
}

impl Default for PriorityTable {
    fn default() -> Self {
        Self {
            regular: 1.0,
            emergency: 5.0,
        }
    }
}

/// Maps vehicles to positive priority weights.
///
/// # Examples
///
/// ```
/// use u_corridor::models::VehicleType;
/// use u_corridor::priority::{PriorityScorer, PriorityTable};
///
/// let scorer = PriorityScorer::new(PriorityTable::default()).unwrap();
/// assert_eq!(scorer.weight(VehicleType::Regular), 1.0);
/// assert_eq!(scorer.weight(VehicleType::Emergency), 5.0);
/// assert!(scorer.weight_for_label("tractor").is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PriorityScorer {
    table: PriorityTable,
}

impl PriorityScorer {
    /// Creates a scorer after validating the table.
    pub fn new(table: PriorityTable) -> Result<Self, CorridorError> {
        table.validate()?;
        Ok(Self { table })
    }

    /// Weight of a vehicle class.
    pub fn weight(&self, vehicle_type: VehicleType) -> f64 {
        match vehicle_type {
            VehicleType::Regular => self.table.regular,
            VehicleType::Emergency => self.table.emergency,
        }
    }

    /// Weight of a vehicle.
    pub fn weight_of(&self, vehicle: &Vehicle) -> f64 {
        self.weight(vehicle.vehicle_type())
    }

    /// Weight of a free-form type label, rejecting unknown labels.
    pub fn weight_for_label(&self, label: &str) -> Result<f64, CorridorError> {
        Ok(self.weight(label.parse()?))
    }

    /// The underlying table.
    pub fn table(&self) -> &PriorityTable {
        &self.table
    }
}

impl Default for PriorityScorer {
    fn default() -> Self {
        Self {
            table: PriorityTable::default(),
        }
    }
}
