use crate::error::{ProcessingError, Result};
use crate::utils::constants::EARTH_RADIUS_KM;
use serde::{Deserialize, Serialize};
use validator::Validate;

/// A point on the Earth's surface in decimal degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Validate)]
pub struct GeoPoint {
    #[validate(range(min = -90.0, max = 90.0))]
    pub latitude: f64,

    #[validate(range(min = -180.0, max = 180.0))]
    pub longitude: f64,
}

impl GeoPoint {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    pub fn distance_km(&self, other: &GeoPoint) -> f64 {
        haversine_distance(
            self.latitude,
            self.longitude,
            other.latitude,
            other.longitude,
        )
    }
}

/// Convert DMS (Degrees:Minutes:Seconds) format to decimal degrees
///
/// # Examples
/// ```
/// use site_etl::utils::dms_to_decimal;
///
/// let decimal = dms_to_decimal("37:46:29").unwrap();
/// assert!((decimal - 37.774722).abs() < 0.000001);
/// ```
pub fn dms_to_decimal(dms: &str) -> Result<f64> {
    let parts: Vec<&str> = dms.split(':').collect();

    if parts.len() != 3 {
        return Err(ProcessingError::InvalidCoordinate(format!(
            "Invalid DMS format: '{}'. Expected format: 'DD:MM:SS'",
            dms
        )));
    }

    // Sign is carried on the degrees part only
    let is_negative = dms.starts_with('-');

    let degrees = parts[0].parse::<f64>().map_err(|_| {
        ProcessingError::InvalidCoordinate(format!("Invalid degrees value: '{}'", parts[0]))
    })?;

    if !degrees.is_finite() {
        return Err(ProcessingError::InvalidCoordinate(format!(
            "Degrees must be finite, got: '{}'",
            parts[0]
        )));
    }

    let minutes = parts[1].parse::<f64>().map_err(|_| {
        ProcessingError::InvalidCoordinate(format!("Invalid minutes value: '{}'", parts[1]))
    })?;

    let seconds = parts[2].parse::<f64>().map_err(|_| {
        ProcessingError::InvalidCoordinate(format!("Invalid seconds value: '{}'", parts[2]))
    })?;

    if !(0.0..60.0).contains(&minutes) {
        return Err(ProcessingError::InvalidCoordinate(format!(
            "Minutes must be between 0 and 60, got: {}",
            minutes
        )));
    }

    if !(0.0..60.0).contains(&seconds) {
        return Err(ProcessingError::InvalidCoordinate(format!(
            "Seconds must be between 0 and 60, got: {}",
            seconds
        )));
    }

    let decimal_value = degrees.abs() + minutes / 60.0 + seconds / 3600.0;

    if is_negative {
        Ok(-decimal_value)
    } else {
        Ok(decimal_value)
    }
}

/// Parse coordinate that might be in DMS or decimal format
pub fn parse_coordinate(coord_str: &str) -> Result<f64> {
    let trimmed = coord_str.trim();

    if !trimmed.contains(':') {
        let value = trimmed.parse::<f64>().map_err(|_| {
            ProcessingError::InvalidCoordinate(format!("Invalid coordinate value: '{}'", coord_str))
        })?;
        if !value.is_finite() {
            return Err(ProcessingError::InvalidCoordinate(format!(
                "Coordinate must be finite, got: '{}'",
                coord_str
            )));
        }
        Ok(value)
    } else {
        dms_to_decimal(trimmed)
    }
}

/// Calculate the distance between two points using the Haversine formula
pub fn haversine_distance(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let lat1_rad = lat1.to_radians();
    let lat2_rad = lat2.to_radians();
    let delta_lat = (lat2 - lat1).to_radians();
    let delta_lon = (lon2 - lon1).to_radians();

    let a = (delta_lat / 2.0).sin().powi(2)
        + lat1_rad.cos() * lat2_rad.cos() * (delta_lon / 2.0).sin().powi(2);
    // Rounding can push `a` a hair above 1 for antipodal points
    let c = 2.0 * a.sqrt().min(1.0).asin();

    EARTH_RADIUS_KM * c
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dms_to_decimal() {
        assert!((dms_to_decimal("37:46:29").unwrap() - 37.774722).abs() < 0.000001);

        // -122:25:10 = -(122 + 25/60 + 10/3600)
        let result = dms_to_decimal("-122:25:10").unwrap();
        assert!((result - -122.419444).abs() < 0.0001);
    }

    #[test]
    fn test_invalid_dms_format() {
        assert!(dms_to_decimal("37:46").is_err());
        assert!(dms_to_decimal("37:70:15").is_err()); // Invalid minutes
        assert!(dms_to_decimal("37:30:70").is_err()); // Invalid seconds
        assert!(dms_to_decimal("NaN:00:00").is_err());
        assert!(dms_to_decimal("-inf:00:00").is_err());
        assert!(dms_to_decimal("37:NaN:00").is_err());
    }

    #[test]
    fn test_parse_coordinate() {
        assert!((parse_coordinate("37.7749").unwrap() - 37.7749).abs() < 0.000001);
        assert!((parse_coordinate("37:46:29").unwrap() - 37.774722).abs() < 0.000001);
        assert!((parse_coordinate(" -122.4194 ").unwrap() - -122.4194).abs() < 0.000001);
        assert!(parse_coordinate("north").is_err());
        assert!(parse_coordinate("NaN").is_err());
    }

    #[test]
    fn test_haversine_distance() {
        // San Francisco to Los Angeles
        let distance = haversine_distance(37.7749, -122.4194, 34.0522, -118.2437);
        assert!((distance - 559.0).abs() < 10.0);

        assert_eq!(haversine_distance(37.7749, -122.4194, 37.7749, -122.4194), 0.0);
    }

    #[test]
    fn test_geo_point_distance_is_symmetric() {
        let oakland = GeoPoint::new(37.8044, -122.2712);
        let bakersfield = GeoPoint::new(35.3733, -119.0187);

        let there = oakland.distance_km(&bakersfield);
        let back = bakersfield.distance_km(&oakland);
        assert!((there - back).abs() < 1e-9);
        assert!(there > 350.0 && there < 450.0);
    }

    #[test]
    fn test_geo_point_validation() {
        assert!(GeoPoint::new(37.0, -122.0).validate().is_ok());
        assert!(GeoPoint::new(120.0, -122.0).validate().is_err());
    }
}
