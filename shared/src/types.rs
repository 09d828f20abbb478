//! Common types used across the platform

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// GPS coordinates
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct GpsCoordinates {
    pub latitude: Decimal,
    pub longitude: Decimal,
}

impl GpsCoordinates {
    pub fn new(latitude: Decimal, longitude: Decimal) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Latitude within [-90, 90] and longitude within [-180, 180]
    pub fn is_valid(&self) -> bool {
        self.latitude >= Decimal::from(-90)
            && self.latitude <= Decimal::from(90)
            && self.longitude >= Decimal::from(-180)
            && self.longitude <= Decimal::from(180)
    }
}

/// A field boundary as a closed ring of coordinates (first point == last point)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FieldBoundary {
    pub points: Vec<GpsCoordinates>,
}

impl FieldBoundary {
    pub fn new(points: Vec<GpsCoordinates>) -> Self {
        Self { points }
    }

    /// Arithmetic mean of the ring vertices, used for weather lookups.
    ///
    /// The closing vertex is counted like any other, matching how the
    /// boundary is delivered by the geometry collaborator.
    pub fn center(&self) -> Option<GpsCoordinates> {
        if self.points.is_empty() {
            return None;
        }
        let n = Decimal::from(self.points.len() as u64);
        let lat: Decimal = self.points.iter().map(|p| p.latitude).sum();
        let lon: Decimal = self.points.iter().map(|p| p.longitude).sum();
        Some(GpsCoordinates::new(lat / n, lon / n))
    }
}

/// One of the four geographic quadrants of a field raster
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Quadrant {
    #[serde(rename = "NW")]
    NorthWest,
    #[serde(rename = "NE")]
    NorthEast,
    #[serde(rename = "SW")]
    SouthWest,
    #[serde(rename = "SE")]
    SouthEast,
}

impl Quadrant {
    pub const ALL: [Quadrant; 4] = [
        Quadrant::NorthWest,
        Quadrant::NorthEast,
        Quadrant::SouthWest,
        Quadrant::SouthEast,
    ];

    pub fn code(&self) -> &'static str {
        match self {
            Quadrant::NorthWest => "NW",
            Quadrant::NorthEast => "NE",
            Quadrant::SouthWest => "SW",
            Quadrant::SouthEast => "SE",
        }
    }
}

impl std::fmt::Display for Quadrant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.code())
    }
}
