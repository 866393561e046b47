use crate::models::plant::{PlantRecord, ZoningCategory};
use serde::{Deserialize, Serialize};

/// How a place name was resolved
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "method", rename_all = "snake_case")]
pub enum MatchMethod {
    Exact,
    Fuzzy { score: u8, matched_variant: String },
    Unmatched { best_score: Option<u8> },
    /// No usable input name
    Missing,
}

impl MatchMethod {
    pub fn label(&self) -> &'static str {
        match self {
            MatchMethod::Exact => "exact",
            MatchMethod::Fuzzy { .. } => "fuzzy",
            MatchMethod::Unmatched { .. } => "unmatched",
            MatchMethod::Missing => "missing",
        }
    }

    pub fn fuzzy_score(&self) -> Option<u8> {
        match self {
            MatchMethod::Fuzzy { score, .. } => Some(*score),
            _ => None,
        }
    }
}

/// Result of standardizing one place name
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Standardization {
    pub name: Option<String>,
    pub method: MatchMethod,
}

/// A plant record with every derived field attached
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredRecord {
    pub record: PlantRecord,
    pub standardized_place_name: Option<String>,
    pub match_method: MatchMethod,
    pub zoning: ZoningCategory,
    pub distance_to_target_km: f64,
    pub proximity_score: f64,
    pub zoning_score: f64,
    pub capacity_score_normalized: f64,
    pub site_potential_score: f64,
}

impl ScoredRecord {
    pub fn plant_code(&self) -> &str {
        &self.record.plant_code
    }

    /// Whether standardization changed the name
    pub fn was_renamed(&self) -> bool {
        self.standardized_place_name.as_deref() != self.record.raw_place_name.as_deref()
    }

    pub fn scores_in_unit_range(&self) -> bool {
        [
            self.proximity_score,
            self.zoning_score,
            self.capacity_score_normalized,
            self.site_potential_score,
        ]
        .iter()
        .all(|s| (0.0..=1.0).contains(s))
    }
}
