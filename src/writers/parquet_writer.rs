use crate::error::{ProcessingError, Result};
use crate::models::ScoredRecord;
use crate::utils::constants::*;
use arrow::array::*;
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;
use parquet::basic::{Compression, GzipLevel, ZstdLevel};
use parquet::file::properties::WriterProperties;
use std::fs::File;
use std::path::Path;
use std::sync::Arc;
use tracing::info;

/// Columnar snapshot of scored sites
pub struct ParquetWriter {
    compression: Compression,
    row_group_size: usize,
}

impl ParquetWriter {
    pub fn new() -> Self {
        Self {
            compression: Compression::SNAPPY,
            row_group_size: DEFAULT_ROW_GROUP_SIZE,
        }
    }

    pub fn with_compression(mut self, compression: &str) -> Result<Self> {
        self.compression = match compression.to_lowercase().as_str() {
            COMPRESSION_SNAPPY => Compression::SNAPPY,
            COMPRESSION_GZIP => Compression::GZIP(GzipLevel::default()),
            COMPRESSION_LZ4 => Compression::LZ4,
            COMPRESSION_ZSTD => Compression::ZSTD(ZstdLevel::default()),
            COMPRESSION_NONE => Compression::UNCOMPRESSED,
            _ => {
                return Err(ProcessingError::Config(format!(
                    "Unsupported compression: {}",
                    compression
                )))
            }
        };
        Ok(self)
    }

    pub fn with_row_group_size(mut self, size: usize) -> Self {
        self.row_group_size = size.max(1);
        self
    }

    pub fn write_records(&self, records: &[ScoredRecord], path: &Path) -> Result<()> {
        self.write_records_batched(records, path, records.len().max(1))
    }

    /// Write records in chunks of `batch_size` rows
    pub fn write_records_batched(
        &self,
        records: &[ScoredRecord],
        path: &Path,
        batch_size: usize,
    ) -> Result<()> {
        if records.is_empty() {
            return Ok(());
        }

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let schema = Self::schema();
        let file = File::create(path)?;
        let props = WriterProperties::builder()
            .set_compression(self.compression)
            .set_max_row_group_size(self.row_group_size)
            .build();

        let mut writer = ArrowWriter::try_new(file, schema.clone(), Some(props))?;

        for chunk in records.chunks(batch_size.max(1)) {
            let batch = Self::records_to_batch(chunk, schema.clone())?;
            writer.write(&batch)?;
        }

        writer.close()?;
        info!("Wrote {} scored records to {}", records.len(), path.display());
        Ok(())
    }

    fn schema() -> Arc<Schema> {
        Arc::new(Schema::new(vec![
            Field::new("plant_code", DataType::Utf8, false),
            Field::new("plant_name", DataType::Utf8, false),
            Field::new("operator_name", DataType::Utf8, true),
            Field::new("raw_place_name", DataType::Utf8, true),
            Field::new("standardized_place_name", DataType::Utf8, true),
            Field::new("match_method", DataType::Utf8, false),
            Field::new("fuzzy_score", DataType::UInt8, true),
            Field::new("county", DataType::Utf8, true),
            Field::new("state", DataType::Utf8, true),
            Field::new("latitude", DataType::Float64, false),
            Field::new("longitude", DataType::Float64, false),
            Field::new("capacity_mw", DataType::Float64, false),
            Field::new("zoning", DataType::Utf8, false),
            Field::new("fuel_type", DataType::Utf8, true),
            Field::new("status", DataType::Utf8, true),
            Field::new("operational_year", DataType::Int32, true),
            Field::new("distance_to_target_km", DataType::Float64, false),
            Field::new("proximity_score", DataType::Float64, false),
            Field::new("zoning_score", DataType::Float64, false),
            Field::new("capacity_score", DataType::Float64, false),
            Field::new("site_potential_score", DataType::Float64, false),
        ]))
    }

    fn records_to_batch(records: &[ScoredRecord], schema: Arc<Schema>) -> Result<RecordBatch> {
        let text = |f: fn(&ScoredRecord) -> Option<&str>| -> ArrayRef {
            Arc::new(StringArray::from(
                records.iter().map(f).collect::<Vec<Option<&str>>>(),
            ))
        };
        let float = |f: fn(&ScoredRecord) -> f64| -> ArrayRef {
            Arc::new(Float64Array::from(
                records.iter().map(f).collect::<Vec<f64>>(),
            ))
        };

        let columns: Vec<ArrayRef> = vec![
            text(|r| Some(r.record.plant_code.as_str())),
            text(|r| Some(r.record.plant_name.as_str())),
            text(|r| r.record.operator_name.as_deref()),
            text(|r| r.record.raw_place_name.as_deref()),
            text(|r| r.standardized_place_name.as_deref()),
            text(|r| Some(r.match_method.label())),
            Arc::new(UInt8Array::from(
                records
                    .iter()
                    .map(|r| r.match_method.fuzzy_score())
                    .collect::<Vec<Option<u8>>>(),
            )),
            text(|r| r.record.county.as_deref()),
            text(|r| r.record.state.as_deref()),
            float(|r| r.record.latitude),
            float(|r| r.record.longitude),
            float(|r| r.record.capacity_mw),
            text(|r| Some(r.zoning.as_str())),
            text(|r| r.record.fuel_type.as_deref()),
            text(|r| r.record.status.as_deref()),
            Arc::new(Int32Array::from(
                records
                    .iter()
                    .map(|r| r.record.operational_year)
                    .collect::<Vec<Option<i32>>>(),
            )),
            float(|r| r.distance_to_target_km),
            float(|r| r.proximity_score),
            float(|r| r.zoning_score),
            float(|r| r.capacity_score_normalized),
            float(|r| r.site_potential_score),
        ];

        Ok(RecordBatch::try_new(schema, columns)?)
    }

    /// Read back the identifier and score of the first `limit` rows
    pub fn read_sample_scores(&self, path: &Path, limit: usize) -> Result<Vec<(String, f64)>> {
        use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;

        let file = File::open(path)?;
        let reader = ParquetRecordBatchReaderBuilder::try_new(file)?
            .with_batch_size(limit.clamp(1, 8192))
            .build()?;

        let mut samples = Vec::new();
        for batch in reader {
            let batch = batch?;
            let codes = batch
                .column_by_name("plant_code")
                .and_then(|c| c.as_any().downcast_ref::<StringArray>())
                .ok_or_else(|| {
                    ProcessingError::InvalidFormat("Invalid plant_code column".to_string())
                })?;
            let scores = batch
                .column_by_name("site_potential_score")
                .and_then(|c| c.as_any().downcast_ref::<Float64Array>())
                .ok_or_else(|| {
                    ProcessingError::InvalidFormat(
                        "Invalid site_potential_score column".to_string(),
                    )
                })?;

            for i in 0..batch.num_rows() {
                if samples.len() >= limit {
                    return Ok(samples);
                }
                samples.push((codes.value(i).to_string(), scores.value(i)));
            }
        }

        Ok(samples)
    }

    pub fn get_file_info(&self, path: &Path) -> Result<ParquetFileInfo> {
        use parquet::file::reader::{FileReader, SerializedFileReader};

        let file = File::open(path)?;
        let reader = SerializedFileReader::new(file)?;
        let metadata = reader.metadata();

        let row_groups = metadata.num_row_groups();
        let row_group_sizes = (0..row_groups)
            .map(|i| metadata.row_group(i).num_rows())
            .collect();
        let compression = if row_groups > 0 && metadata.row_group(0).num_columns() > 0 {
            Some(metadata.row_group(0).column(0).compression())
        } else {
            None
        };

        Ok(ParquetFileInfo {
            total_rows: metadata.file_metadata().num_rows(),
            row_groups,
            row_group_sizes,
            file_size: std::fs::metadata(path)?.len(),
            compression,
        })
    }
}

impl Default for ParquetWriter {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug)]
pub struct ParquetFileInfo {
    pub total_rows: i64,
    pub row_groups: usize,
    pub row_group_sizes: Vec<i64>,
    pub file_size: u64,
    pub compression: Option<Compression>,
}

impl ParquetFileInfo {
    pub fn summary(&self) -> String {
        let avg_rows = if self.row_groups == 0 {
            0.0
        } else {
            self.total_rows as f64 / self.row_groups as f64
        };
        let compression = self
            .compression
            .map(|c| format!("{:?}", c))
            .unwrap_or_else(|| "n/a".to_string());

        format!(
            "Parquet File Summary:\n\
            - Total rows: {}\n\
            - Row groups: {}\n\
            - File size: {:.2} KB\n\
            - Compression: {}\n\
            - Avg rows per group: {:.0}",
            self.total_rows,
            self.row_groups,
            self.file_size as f64 / 1024.0,
            compression,
            avg_rows
        )
    }
}
