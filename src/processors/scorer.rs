use crate::config::ScoringConfig;
use crate::error::{ProcessingError, RecordError, Result};
use crate::models::{PlantRecord, ScoredRecord, Standardization, ZoningCategory};
use crate::utils::constants::WEIGHT_SUM_TOLERANCE;
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Capacity range over a whole batch. Built once (pass 1) and never updated
/// while records are scored (pass 2).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BatchStats {
    pub min_capacity: f64,
    pub max_capacity: f64,
    pub count: usize,
}

impl BatchStats {
    /// `None` for an empty batch
    pub fn from_capacities<I>(capacities: I) -> Option<Self>
    where
        I: IntoIterator<Item = f64>,
    {
        let mut stats: Option<BatchStats> = None;

        for capacity in capacities {
            stats = Some(match stats {
                None => BatchStats {
                    min_capacity: capacity,
                    max_capacity: capacity,
                    count: 1,
                },
                Some(s) => BatchStats {
                    min_capacity: s.min_capacity.min(capacity),
                    max_capacity: s.max_capacity.max(capacity),
                    count: s.count + 1,
                },
            });
        }

        stats
    }

    pub fn from_records<'a, I>(records: I) -> Option<Self>
    where
        I: IntoIterator<Item = &'a PlantRecord>,
    {
        Self::from_capacities(records.into_iter().map(|r| r.capacity_mw))
    }

    /// Every capacity in the batch is the same value
    pub fn is_degenerate(&self) -> bool {
        self.max_capacity == self.min_capacity
    }

    pub fn range(&self) -> f64 {
        self.max_capacity - self.min_capacity
    }
}

/// Weighted site potential from proximity, zoning and relative capacity
#[derive(Debug, Clone)]
pub struct SiteScorer {
    config: ScoringConfig,
}

impl SiteScorer {
    /// Reject field-level violations and weights that do not sum to 1
    pub fn try_new(config: ScoringConfig) -> Result<Self> {
        let mut problems = Vec::new();

        if let Err(errors) = config.validate() {
            problems.push(errors.to_string().replace('\n', " "));
        }

        for field in config.non_finite_fields() {
            problems.push(format!("{} must be a finite number", field));
        }

        let sum = config.weights.sum();
        if !sum.is_finite() || (sum - 1.0).abs() > WEIGHT_SUM_TOLERANCE {
            problems.push(format!("scoring weights must sum to 1.0, got {:.6}", sum));
        }

        if problems.is_empty() {
            Ok(Self { config })
        } else {
            Err(ProcessingError::Config(problems.join("; ")))
        }
    }

    pub fn config(&self) -> &ScoringConfig {
        &self.config
    }

    pub fn distance_to_target_km(&self, record: &PlantRecord) -> f64 {
        record.location().distance_km(&self.config.target)
    }

    /// Linear decay from 1.0 at the target to 0.0 at `max_distance_km`
    pub fn proximity_score(&self, distance_km: f64) -> f64 {
        (1.0 - distance_km / self.config.max_distance_km).clamp(0.0, 1.0)
    }

    pub fn resolve_zoning(&self, record: &PlantRecord) -> std::result::Result<ZoningCategory, RecordError> {
        match record.zoning.as_deref() {
            None => Err(RecordError::configuration(
                &record.plant_code,
                "zoning category is missing",
            )),
            Some(label) => ZoningCategory::parse(label).ok_or_else(|| {
                RecordError::configuration(
                    &record.plant_code,
                    format!("unknown zoning category '{}'", label),
                )
            }),
        }
    }

    pub fn zoning_score(&self, category: ZoningCategory) -> f64 {
        let table = &self.config.zoning;
        match category {
            ZoningCategory::Industrial => table.industrial,
            ZoningCategory::Commercial => table.commercial,
            ZoningCategory::Agricultural => table.agricultural,
            ZoningCategory::Residential => table.residential,
        }
    }

    /// Min-max normalized capacity; a flat batch gets the configured
    /// neutral value
    pub fn capacity_score(&self, capacity_mw: f64, stats: &BatchStats) -> f64 {
        if stats.is_degenerate() {
            return self.config.degenerate_capacity_score;
        }
        ((capacity_mw - stats.min_capacity) / stats.range()).clamp(0.0, 1.0)
    }

    pub fn combine(&self, proximity: f64, zoning: f64, capacity: f64) -> f64 {
        let w = &self.config.weights;
        (w.proximity * proximity + w.zoning * zoning + w.capacity * capacity).clamp(0.0, 1.0)
    }

    /// Pass 2 for one record. Pure given the record, the fixed batch
    /// statistics and the configuration.
    pub fn score_record(
        &self,
        record: &PlantRecord,
        standardization: Standardization,
        stats: &BatchStats,
    ) -> std::result::Result<ScoredRecord, RecordError> {
        let zoning = self.resolve_zoning(record)?;

        let distance_to_target_km = self.distance_to_target_km(record);
        let proximity_score = self.proximity_score(distance_to_target_km);
        let zoning_score = self.zoning_score(zoning);
        let capacity_score_normalized = self.capacity_score(record.capacity_mw, stats);
        let site_potential_score =
            self.combine(proximity_score, zoning_score, capacity_score_normalized);

        Ok(ScoredRecord {
            record: record.clone(),
            standardized_place_name: standardization.name,
            match_method: standardization.method,
            zoning,
            distance_to_target_km,
            proximity_score,
            zoning_score,
            capacity_score_normalized,
            site_potential_score,
        })
    }
}
