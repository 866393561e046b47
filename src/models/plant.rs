use crate::error::RecordError;
use crate::utils::coordinates::{parse_coordinate, GeoPoint};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::fmt;
use validator::Validate;

/// A scalar as it appeared in the source: JSON number, free text, or any
/// other JSON value (kept so the record can be rejected on its own later).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawField {
    Number(f64),
    Text(String),
    Other(Value),
}

impl RawField {
    /// Blank text is treated as absent
    pub fn from_cell(cell: &str) -> Option<Self> {
        let trimmed = cell.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(RawField::Text(trimmed.to_string()))
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            RawField::Number(n) if n.is_finite() => Some(*n),
            RawField::Number(_) => None,
            RawField::Text(s) => s.trim().parse::<f64>().ok().filter(|n| n.is_finite()),
            RawField::Other(_) => None,
        }
    }

    pub fn as_text(&self) -> String {
        match self {
            RawField::Number(n) if n.fract() == 0.0 && n.abs() < 1e15 => format!("{}", *n as i64),
            RawField::Number(n) => n.to_string(),
            RawField::Text(s) => s.trim().to_string(),
            RawField::Other(v) => v.to_string(),
        }
    }
}

/// Text fields accept any JSON scalar; numbers and booleans keep their
/// textual form so a mistyped name never fails the whole file.
fn lenient_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Null => None,
        Value::String(s) => Some(s),
        other => Some(other.to_string()),
    })
}

impl fmt::Display for RawField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_text())
    }
}

/// A power-plant record exactly as extracted. Every field may be missing or
/// malformed; `into_plant` decides whether the record is usable.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawPlantRecord {
    #[serde(default, alias = "plant_code", alias = "id", alias = "identifier")]
    pub plant_code: Option<RawField>,

    #[serde(default, deserialize_with = "lenient_text", alias = "plant_name", alias = "name")]
    pub plant_name: Option<String>,

    #[serde(default, deserialize_with = "lenient_text", alias = "operator_name")]
    pub operator_name: Option<String>,

    #[serde(default, deserialize_with = "lenient_text", alias = "place", alias = "raw_place_name")]
    pub city: Option<String>,

    #[serde(default, deserialize_with = "lenient_text")]
    pub county: Option<String>,

    #[serde(default, deserialize_with = "lenient_text")]
    pub state: Option<String>,

    #[serde(default, alias = "lat")]
    pub latitude: Option<RawField>,

    #[serde(default, alias = "lon", alias = "lng")]
    pub longitude: Option<RawField>,

    #[serde(default, alias = "capacity_mw", alias = "capacityMw")]
    pub capacity: Option<RawField>,

    #[serde(default, deserialize_with = "lenient_text", alias = "zoning_category", alias = "zoningCategory")]
    pub zoning: Option<String>,

    #[serde(default, deserialize_with = "lenient_text", alias = "fuel_type")]
    pub fuel_type: Option<String>,

    #[serde(default, deserialize_with = "lenient_text", alias = "operational_status")]
    pub status: Option<String>,

    #[serde(default, alias = "operational_year")]
    pub operational_year: Option<RawField>,

    /// Set by the reader when the source item could not be read as a record
    #[serde(skip)]
    pub parse_error: Option<String>,
}

impl RawPlantRecord {
    /// Identifier used in diagnostics, falling back to the input position
    pub fn display_id(&self, index: usize) -> String {
        self.plant_code
            .as_ref()
            .map(RawField::as_text)
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| format!("#{}", index + 1))
    }

    /// Validate and convert into a typed record. Fails with a
    /// `RecordError::Validation` naming the first offending field.
    pub fn into_plant(self, index: usize) -> Result<PlantRecord, RecordError> {
        let record_id = self.display_id(index);

        if let Some(reason) = &self.parse_error {
            return Err(RecordError::validation(&record_id, "record", reason.clone()));
        }

        let plant_code = match self.plant_code.as_ref() {
            Some(RawField::Other(v)) => {
                return Err(RecordError::validation(
                    &record_id,
                    "plant_code",
                    format!("not a string or number: {}", v),
                ))
            }
            Some(code) => Some(code.as_text()).filter(|s| !s.is_empty()),
            None => None,
        }
        .ok_or_else(|| RecordError::validation(&record_id, "plant_code", "missing"))?;

        let latitude = coordinate_field(&record_id, "latitude", self.latitude.as_ref())?;
        let longitude = coordinate_field(&record_id, "longitude", self.longitude.as_ref())?;

        let capacity_mw = match self.capacity.as_ref() {
            None => return Err(RecordError::validation(&record_id, "capacity", "missing")),
            Some(raw) => raw.as_number().ok_or_else(|| {
                RecordError::validation(&record_id, "capacity", format!("not numeric: '{}'", raw))
            })?,
        };

        // A malformed year is not worth dropping the plant over
        let operational_year = self
            .operational_year
            .as_ref()
            .and_then(RawField::as_number)
            .map(|y| y as i32);

        let plant = PlantRecord {
            plant_name: self.plant_name.unwrap_or_else(|| plant_code.clone()),
            plant_code,
            operator_name: self.operator_name,
            raw_place_name: self.city,
            county: self.county,
            state: self.state,
            latitude,
            longitude,
            capacity_mw,
            zoning: self.zoning,
            fuel_type: self.fuel_type,
            status: self.status,
            operational_year,
        };

        plant.validate().map_err(|errors| {
            let mut fields: Vec<String> = errors
                .field_errors()
                .keys()
                .map(|field| field.to_string())
                .collect();
            fields.sort();
            let field = fields.first().cloned().unwrap_or_else(|| "record".to_string());
            RecordError::validation(&record_id, &field, errors.to_string().trim().to_string())
        })?;

        Ok(plant)
    }
}

fn coordinate_field(
    record_id: &str,
    field: &str,
    raw: Option<&RawField>,
) -> Result<f64, RecordError> {
    match raw {
        None => Err(RecordError::validation(record_id, field, "missing")),
        Some(RawField::Number(n)) if n.is_finite() => Ok(*n),
        Some(RawField::Number(n)) => Err(RecordError::validation(
            record_id,
            field,
            format!("not finite: {}", n),
        )),
        Some(RawField::Text(text)) => match parse_coordinate(text) {
            Ok(value) if value.is_finite() => Ok(value),
            Ok(value) => Err(RecordError::validation(
                record_id,
                field,
                format!("not finite: {}", value),
            )),
            Err(e) => Err(RecordError::validation(record_id, field, e.to_string())),
        },
        Some(RawField::Other(v)) => Err(RecordError::validation(
            record_id,
            field,
            format!("not numeric: {}", v),
        )),
    }
}

/// A validated power-plant record. Immutable once built; scoring produces a
/// separate `ScoredRecord`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct PlantRecord {
    #[validate(length(min = 1))]
    pub plant_code: String,

    pub plant_name: String,
    pub operator_name: Option<String>,

    /// Place name as received, before standardization
    pub raw_place_name: Option<String>,

    pub county: Option<String>,
    pub state: Option<String>,

    #[validate(range(min = -90.0, max = 90.0))]
    pub latitude: f64,

    #[validate(range(min = -180.0, max = 180.0))]
    pub longitude: f64,

    #[validate(range(min = 0.0))]
    pub capacity_mw: f64,

    /// Zoning label as received. Resolved against the scorer's table.
    pub zoning: Option<String>,

    pub fuel_type: Option<String>,
    pub status: Option<String>,
    pub operational_year: Option<i32>,
}

impl PlantRecord {
    pub fn location(&self) -> GeoPoint {
        GeoPoint::new(self.latitude, self.longitude)
    }

    pub fn is_operating(&self) -> bool {
        self.status
            .as_deref()
            .map(|s| {
                s.trim()
                    .eq_ignore_ascii_case(crate::utils::constants::STATUS_OPERATING)
            })
            .unwrap_or(false)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ZoningCategory {
    Industrial,
    Commercial,
    Agricultural,
    Residential,
}

impl ZoningCategory {
    /// Case-insensitive; anything else is unknown
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "industrial" => Some(ZoningCategory::Industrial),
            "commercial" => Some(ZoningCategory::Commercial),
            "agricultural" => Some(ZoningCategory::Agricultural),
            "residential" => Some(ZoningCategory::Residential),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ZoningCategory::Industrial => "Industrial",
            ZoningCategory::Commercial => "Commercial",
            ZoningCategory::Agricultural => "Agricultural",
            ZoningCategory::Residential => "Residential",
        }
    }
}

impl fmt::Display for ZoningCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw_oakland() -> RawPlantRecord {
        RawPlantRecord {
            plant_code: Some(RawField::Number(56789.0)),
            plant_name: Some("Oakland Power Plant".to_string()),
            city: Some("Oakland".to_string()),
            state: Some("CA".to_string()),
            latitude: Some(RawField::Number(37.8044)),
            longitude: Some(RawField::Number(-122.2712)),
            capacity: Some(RawField::Number(165.0)),
            zoning: Some("Industrial".to_string()),
            status: Some("Operating".to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_into_plant() {
        let plant = raw_oakland().into_plant(0).unwrap();

        assert_eq!(plant.plant_code, "56789");
        assert_eq!(plant.raw_place_name.as_deref(), Some("Oakland"));
        assert_eq!(plant.capacity_mw, 165.0);
        assert!(plant.is_operating());
    }

    #[test]
    fn test_missing_capacity_names_field() {
        let mut raw = raw_oakland();
        raw.capacity = None;

        let err = raw.into_plant(0).unwrap_err();
        assert!(err.is_validation());
        assert!(matches!(err, RecordError::Validation { ref field, .. } if field == "capacity"));
    }

    #[test]
    fn test_non_numeric_capacity_names_field() {
        let mut raw = raw_oakland();
        raw.capacity = Some(RawField::Text("lots".to_string()));

        let err = raw.into_plant(0).unwrap_err();
        assert!(matches!(err, RecordError::Validation { ref field, .. } if field == "capacity"));
    }

    #[test]
    fn test_numeric_text_and_dms_coordinates_accepted() {
        let mut raw = raw_oakland();
        raw.capacity = Some(RawField::Text(" 165.5 ".to_string()));
        raw.latitude = Some(RawField::Text("37:48:16".to_string()));

        let plant = raw.into_plant(0).unwrap();
        assert_eq!(plant.capacity_mw, 165.5);
        assert!((plant.latitude - 37.804444).abs() < 1e-5);
    }

    #[test]
    fn test_negative_capacity_rejected() {
        let mut raw = raw_oakland();
        raw.capacity = Some(RawField::Number(-5.0));

        let err = raw.into_plant(0).unwrap_err();
        assert!(matches!(err, RecordError::Validation { ref field, .. } if field == "capacity_mw"));
    }

    #[test]
    fn test_out_of_range_latitude_rejected() {
        let mut raw = raw_oakland();
        raw.latitude = Some(RawField::Number(123.0));

        let err = raw.into_plant(0).unwrap_err();
        assert!(matches!(err, RecordError::Validation { ref field, .. } if field == "latitude"));
    }

    #[test]
    fn test_non_finite_text_coordinates_rejected() {
        for text in ["NaN", "inf", "NaN:00:00"] {
            let mut raw = raw_oakland();
            raw.latitude = Some(RawField::Text(text.to_string()));

            let err = raw.into_plant(0).unwrap_err();
            assert!(
                matches!(err, RecordError::Validation { ref field, .. } if field == "latitude"),
                "{} accepted",
                text
            );
        }
    }

    #[test]
    fn test_unexpected_json_types_name_field() {
        let mut raw = raw_oakland();
        raw.longitude = Some(RawField::Other(serde_json::json!([1, 2])));
        let err = raw.into_plant(0).unwrap_err();
        assert!(matches!(err, RecordError::Validation { ref field, .. } if field == "longitude"));

        let mut raw = raw_oakland();
        raw.plant_code = Some(RawField::Other(serde_json::json!({"id": 1})));
        let err = raw.into_plant(0).unwrap_err();
        assert!(matches!(err, RecordError::Validation { ref field, .. } if field == "plant_code"));
    }

    #[test]
    fn test_missing_code_uses_position_in_diagnostics() {
        let mut raw = raw_oakland();
        raw.plant_code = None;

        let err = raw.into_plant(4).unwrap_err();
        assert_eq!(err.record_id(), "#5");
    }

    #[test]
    fn test_zoning_parse() {
        assert_eq!(ZoningCategory::parse("industrial"), Some(ZoningCategory::Industrial));
        assert_eq!(ZoningCategory::parse(" COMMERCIAL "), Some(ZoningCategory::Commercial));
        assert_eq!(ZoningCategory::parse("Mixed Use"), None);
    }

    #[test]
    fn test_raw_record_from_camel_case_json() {
        let json = r#"{
            "plantCode": 12345, "plantName": "Kern Solar", "city": "Kern County",
            "latitude": "35.3733", "longitude": -119.0187, "capacity": 250,
            "zoning": "Agricultural", "status": "Operating", "fuelType": "Solar"
        }"#;
        let raw: RawPlantRecord = serde_json::from_str(json).unwrap();

        assert_eq!(raw.plant_code, Some(RawField::Number(12345.0)));
        assert_eq!(raw.latitude, Some(RawField::Text("35.3733".to_string())));
        assert_eq!(raw.fuel_type.as_deref(), Some("Solar"));

        let plant = raw.into_plant(0).unwrap();
        assert_eq!(plant.plant_code, "12345");
        assert_eq!(plant.capacity_mw, 250.0);
    }
}
