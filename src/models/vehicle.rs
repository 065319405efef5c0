//! Vehicle and vehicle type.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CorridorError;

use super::NodeId;

/// Closed set of vehicle classes recognised by the optimizer.
///
/// Parsing from free-form strings goes through [`FromStr`], so misspelled
/// labels are rejected instead of silently falling back to a default.
///
/// # Examples
///
/// ```
/// use u_corridor::models::VehicleType;
///
/// let t: VehicleType = "Emergency".parse().unwrap();
/// assert_eq!(t, VehicleType::Emergency);
/// assert!("ambulanse".parse::<VehicleType>().is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum VehicleType {
    /// Ordinary traffic.
    Regular,
    /// Ambulances, fire engines, police; routed first and protected by a corridor.
    Emergency,
}

impl VehicleType {
    /// Returns `true` for [`VehicleType::Emergency`].
    pub fn is_emergency(self) -> bool {
        matches!(self, VehicleType::Emergency)
    }
}

impl fmt::Display for VehicleType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VehicleType::Regular => f.write_str("regular"),
            VehicleType::Emergency => f.write_str("emergency"),
        }
    }
}

impl FromStr for VehicleType {
    type Err = CorridorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "regular" => Ok(VehicleType::Regular),
            "emergency" => Ok(VehicleType::Emergency),
            _ => Err(CorridorError::UnknownVehicleType(s.to_string())),
        }
    }
}

/// A vehicle taking part in one optimization request.
///
/// The priority weight is not stored here; it is derived from the type by
/// [`PriorityScorer`](crate::priority::PriorityScorer) at build time.
///
/// # Examples
///
/// ```
/// use u_corridor::models::{Vehicle, VehicleType};
///
/// let v = Vehicle::new(3, VehicleType::Emergency).with_endpoints(10, 42);
/// assert_eq!(v.id(), 3);
/// assert!(v.is_emergency());
/// assert_eq!(v.origin(), Some(10));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vehicle {
    id: usize,
    vehicle_type: VehicleType,
    origin: Option<NodeId>,
    destination: Option<NodeId>,
}

impl Vehicle {
    /// Creates a vehicle with the given ID and type and no endpoints.
    pub fn new(id: usize, vehicle_type: VehicleType) -> Self {
        Self {
            id,
            vehicle_type,
            origin: None,
            destination: None,
        }
    }

    /// Shorthand for a regular vehicle.
    pub fn regular(id: usize) -> Self {
        Self::new(id, VehicleType::Regular)
    }

    /// Shorthand for an emergency vehicle.
    pub fn emergency(id: usize) -> Self {
        Self::new(id, VehicleType::Emergency)
    }

    /// Sets origin and destination network nodes.
    pub fn with_endpoints(mut self, origin: NodeId, destination: NodeId) -> Self {
        self.origin = Some(origin);
        self.destination = Some(destination);
        self
    }

    /// Vehicle ID.
    pub fn id(&self) -> usize {
        self.id
    }

    /// Vehicle class.
    pub fn vehicle_type(&self) -> VehicleType {
        self.vehicle_type
    }

    /// Returns `true` if this is an emergency vehicle.
    pub fn is_emergency(&self) -> bool {
        self.vehicle_type.is_emergency()
    }

    /// Origin node, if known.
    pub fn origin(&self) -> Option<NodeId> {
        self.origin
    }

    /// Destination node, if known.
    pub fn destination(&self) -> Option<NodeId> {
        self.destination
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vehicle_new() {
        let v = Vehicle::regular(0);
        assert_eq!(v.id(), 0);
        assert_eq!(v.vehicle_type(), VehicleType::Regular);
        assert!(!v.is_emergency());
        assert!(v.origin().is_none());
        assert!(v.destination().is_none());
    }

    #[test]
    fn test_vehicle_endpoints() {
        let v = Vehicle::emergency(7).with_endpoints(1, 9);
        assert!(v.is_emergency());
        assert_eq!(v.origin(), Some(1));
        assert_eq!(v.destination(), Some(9));
    }

    #[test]
    fn test_parse_vehicle_type() {
        assert_eq!("regular".parse::<VehicleType>().unwrap(), VehicleType::Regular);
        assert_eq!(" EMERGENCY ".parse::<VehicleType>().unwrap(), VehicleType::Emergency);
        let err = "user".parse::<VehicleType>().unwrap_err();
        assert!(matches!(err, CorridorError::UnknownVehicleType(ref s) if s == "user"));
    }

    #[test]
    fn test_display_roundtrip() {
        for t in [VehicleType::Regular, VehicleType::Emergency] {
            assert_eq!(t.to_string().parse::<VehicleType>().unwrap(), t);
        }
    }
}
