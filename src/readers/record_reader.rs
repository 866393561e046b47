use crate::error::{ProcessingError, Result};
use crate::models::{RawField, RawPlantRecord};
use serde_json::Value;
use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputFormat {
    Json,
    Csv,
}

impl InputFormat {
    pub fn from_path(path: &Path) -> Result<Self> {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase());

        match extension.as_deref() {
            Some("json") => Ok(InputFormat::Json),
            Some("csv") => Ok(InputFormat::Csv),
            _ => Err(ProcessingError::InvalidFormat(format!(
                "Cannot infer input format from '{}'; expected .json or .csv",
                path.display()
            ))),
        }
    }
}

/// Extract step: loads raw plant records from JSON or CSV
pub struct RecordReader {
    format: Option<InputFormat>,
}

impl RecordReader {
    pub fn new() -> Self {
        Self { format: None }
    }

    pub fn with_format(format: InputFormat) -> Self {
        Self {
            format: Some(format),
        }
    }

    fn format_for(&self, path: &Path) -> Result<InputFormat> {
        match self.format {
            Some(format) => Ok(format),
            None => InputFormat::from_path(path),
        }
    }

    /// Read all records from a file
    pub fn read_records(&self, path: &Path) -> Result<Vec<RawPlantRecord>> {
        let format = self.format_for(path)?;
        let mut bytes = Vec::new();
        File::open(path)?.read_to_end(&mut bytes)?;

        let records = self.parse(&bytes, format)?;
        info!("Loaded {} records from {}", records.len(), path.display());
        Ok(records)
    }

    /// Same as `read_records` without blocking the runtime on file I/O
    pub async fn read_records_async(&self, path: &Path) -> Result<Vec<RawPlantRecord>> {
        let format = self.format_for(path)?;
        let bytes = tokio::fs::read(path).await?;

        let records = self.parse(&bytes, format)?;
        info!("Loaded {} records from {}", records.len(), path.display());
        Ok(records)
    }

    pub fn parse(&self, bytes: &[u8], format: InputFormat) -> Result<Vec<RawPlantRecord>> {
        match format {
            InputFormat::Json => parse_json(bytes),
            InputFormat::Csv => parse_csv(bytes),
        }
    }
}

impl Default for RecordReader {
    fn default() -> Self {
        Self::new()
    }
}

/// Accepts `{"data": [...]}` or a bare array of records. An item that is not
/// a record object comes back as a placeholder carrying the parse error, so
/// it is skipped during validation instead of failing the file.
fn parse_json(bytes: &[u8]) -> Result<Vec<RawPlantRecord>> {
    let document: Value = serde_json::from_slice(bytes)?;

    let items = match document {
        Value::Array(items) => items,
        Value::Object(mut object) => match object.remove("data") {
            Some(Value::Array(items)) => items,
            _ => {
                return Err(ProcessingError::InvalidFormat(
                    "JSON object input must contain a \"data\" array".to_string(),
                ))
            }
        },
        _ => {
            return Err(ProcessingError::InvalidFormat(
                "JSON input must be an array or an object with a \"data\" array".to_string(),
            ))
        }
    };

    let records = items
        .into_iter()
        .enumerate()
        .map(|(index, item)| {
            serde_json::from_value(item).unwrap_or_else(|e| {
                warn!("Record #{} is not a plant record: {}", index + 1, e);
                RawPlantRecord {
                    parse_error: Some(e.to_string()),
                    ..Default::default()
                }
            })
        })
        .collect();

    Ok(records)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Column {
    PlantCode,
    PlantName,
    OperatorName,
    City,
    County,
    State,
    Latitude,
    Longitude,
    Capacity,
    Zoning,
    FuelType,
    Status,
    OperationalYear,
}

impl Column {
    /// Header names compared with case, underscores and spaces removed
    fn from_header(header: &str) -> Option<Self> {
        let key: String = header
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .map(|c| c.to_ascii_lowercase())
            .collect();

        match key.as_str() {
            "plantcode" | "id" | "identifier" => Some(Column::PlantCode),
            "plantname" | "name" => Some(Column::PlantName),
            "operatorname" => Some(Column::OperatorName),
            "city" | "place" | "rawplacename" => Some(Column::City),
            "county" => Some(Column::County),
            "state" => Some(Column::State),
            "latitude" | "lat" => Some(Column::Latitude),
            "longitude" | "lon" | "lng" => Some(Column::Longitude),
            "capacity" | "capacitymw" => Some(Column::Capacity),
            "zoning" | "zoningcategory" => Some(Column::Zoning),
            "fueltype" => Some(Column::FuelType),
            "status" | "operationalstatus" => Some(Column::Status),
            "operationalyear" => Some(Column::OperationalYear),
            _ => None,
        }
    }
}

fn parse_csv(bytes: &[u8]) -> Result<Vec<RawPlantRecord>> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(bytes);

    let columns: HashMap<Column, usize> = reader
        .headers()?
        .iter()
        .enumerate()
        .filter_map(|(i, header)| Column::from_header(header).map(|c| (c, i)))
        .collect();

    let mut records = Vec::new();
    for row in reader.records() {
        let row = row?;
        let cell = |column: Column| columns.get(&column).and_then(|&i| row.get(i));
        let text = |column: Column| {
            cell(column)
                .filter(|s| !s.trim().is_empty())
                .map(|s| s.trim().to_string())
        };
        let field = |column: Column| cell(column).and_then(RawField::from_cell);

        records.push(RawPlantRecord {
            plant_code: field(Column::PlantCode),
            plant_name: text(Column::PlantName),
            operator_name: text(Column::OperatorName),
            city: text(Column::City),
            county: text(Column::County),
            state: text(Column::State),
            latitude: field(Column::Latitude),
            longitude: field(Column::Longitude),
            capacity: field(Column::Capacity),
            zoning: text(Column::Zoning),
            fuel_type: text(Column::FuelType),
            status: text(Column::Status),
            operational_year: field(Column::OperationalYear),
            parse_error: None,
        });
    }

    Ok(records)
}
