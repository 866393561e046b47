use crate::utils::constants::*;
use crate::utils::coordinates::GeoPoint;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use validator::Validate;

/// Top-level pipeline configuration.
///
/// Every section falls back to the reference values, so an empty file (or no
/// file at all) yields a usable configuration.
///
/// Example TOML:
/// ```toml
/// [scoring]
/// max_distance_km = 300.0
///
/// [scoring.target]
/// latitude = 37.3382
/// longitude = -121.8863
///
/// [standardizer]
/// threshold = 85
///
/// [[standardizer.mappings]]
/// canonical = "San Jose"
/// variants = ["SJ", "San Jose City"]
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate)]
#[serde(default, deny_unknown_fields)]
pub struct EtlConfig {
    #[validate(nested)]
    pub scoring: ScoringConfig,

    #[validate(nested)]
    pub standardizer: StandardizerConfig,

    #[validate(nested)]
    pub database: DatabaseConfig,
}

/// Site scorer parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(default, deny_unknown_fields)]
pub struct ScoringConfig {
    #[validate(nested)]
    pub target: GeoPoint,

    /// Distance at which the proximity score reaches zero
    #[validate(range(exclusive_min = 0.0))]
    pub max_distance_km: f64,

    #[validate(nested)]
    pub weights: ScoreWeights,

    #[validate(nested)]
    pub zoning: ZoningScores,

    /// Capacity score given to every record when the whole batch shares one
    /// capacity value
    #[validate(range(min = 0.0, max = 1.0))]
    pub degenerate_capacity_score: f64,
}

impl ScoringConfig {
    /// Names of float settings holding NaN or an infinity. Range rules let
    /// NaN through, so these are checked separately.
    pub fn non_finite_fields(&self) -> Vec<&'static str> {
        [
            ("scoring.target.latitude", self.target.latitude),
            ("scoring.target.longitude", self.target.longitude),
            ("scoring.max_distance_km", self.max_distance_km),
            ("scoring.weights.proximity", self.weights.proximity),
            ("scoring.weights.zoning", self.weights.zoning),
            ("scoring.weights.capacity", self.weights.capacity),
            ("scoring.zoning.industrial", self.zoning.industrial),
            ("scoring.zoning.commercial", self.zoning.commercial),
            ("scoring.zoning.agricultural", self.zoning.agricultural),
            ("scoring.zoning.residential", self.zoning.residential),
            (
                "scoring.degenerate_capacity_score",
                self.degenerate_capacity_score,
            ),
        ]
        .into_iter()
        .filter(|(_, value)| !value.is_finite())
        .map(|(name, _)| name)
        .collect()
    }
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            target: GeoPoint::new(DEFAULT_TARGET_LAT, DEFAULT_TARGET_LON),
            max_distance_km: DEFAULT_MAX_DISTANCE_KM,
            weights: ScoreWeights::default(),
            zoning: ZoningScores::default(),
            degenerate_capacity_score: DEFAULT_DEGENERATE_CAPACITY_SCORE,
        }
    }
}

/// Convex combination weights. Must sum to 1.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Validate)]
#[serde(default, deny_unknown_fields)]
pub struct ScoreWeights {
    #[validate(range(min = 0.0, max = 1.0))]
    pub proximity: f64,

    #[validate(range(min = 0.0, max = 1.0))]
    pub zoning: f64,

    #[validate(range(min = 0.0, max = 1.0))]
    pub capacity: f64,
}

impl ScoreWeights {
    pub fn sum(&self) -> f64 {
        self.proximity + self.zoning + self.capacity
    }
}

impl Default for ScoreWeights {
    fn default() -> Self {
        Self {
            proximity: DEFAULT_PROXIMITY_WEIGHT,
            zoning: DEFAULT_ZONING_WEIGHT,
            capacity: DEFAULT_CAPACITY_WEIGHT,
        }
    }
}

/// Favorability per zoning category
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Validate)]
#[serde(default, deny_unknown_fields)]
pub struct ZoningScores {
    #[validate(range(min = 0.0, max = 1.0))]
    pub industrial: f64,

    #[validate(range(min = 0.0, max = 1.0))]
    pub commercial: f64,

    #[validate(range(min = 0.0, max = 1.0))]
    pub agricultural: f64,

    #[validate(range(min = 0.0, max = 1.0))]
    pub residential: f64,
}

impl Default for ZoningScores {
    fn default() -> Self {
        Self {
            industrial: ZONING_INDUSTRIAL,
            commercial: ZONING_COMMERCIAL,
            agricultural: ZONING_AGRICULTURAL,
            residential: ZONING_RESIDENTIAL,
        }
    }
}

/// Name standardizer parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(default, deny_unknown_fields)]
pub struct StandardizerConfig {
    /// Minimum fuzzy score (0-100, inclusive) for a fallback match
    #[validate(range(max = 100))]
    pub threshold: u8,

    /// Canonical places in lookup order. Order decides fuzzy ties.
    #[validate(nested)]
    pub mappings: Vec<PlaceMapping>,
}

impl Default for StandardizerConfig {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_FUZZY_THRESHOLD,
            mappings: default_place_mappings(),
        }
    }
}

/// One canonical place and the spellings accepted for it. The canonical name
/// is always accepted as its own variant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct PlaceMapping {
    #[validate(length(min = 1))]
    pub canonical: String,

    #[serde(default)]
    pub variants: Vec<String>,
}

impl PlaceMapping {
    pub fn new(canonical: &str, variants: &[&str]) -> Self {
        Self {
            canonical: canonical.to_string(),
            variants: variants.iter().map(|v| v.to_string()).collect(),
        }
    }
}

/// Bay Area / Central California places seen in the sample plant data
pub fn default_place_mappings() -> Vec<PlaceMapping> {
    vec![
        PlaceMapping::new("San Francisco", &["SF", "San Francisco County"]),
        PlaceMapping::new("San Mateo", &["San Mateo County"]),
        PlaceMapping::new("San Luis Obispo", &["San Luis Obispo County"]),
        PlaceMapping::new("Oakland", &[]),
        PlaceMapping::new("Alameda", &["Alameda County"]),
        PlaceMapping::new("Kern", &["Kern County"]),
    ]
}

/// Load target for scored records
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(default, deny_unknown_fields)]
pub struct DatabaseConfig {
    pub path: PathBuf,

    /// Rows per insert transaction
    #[validate(range(min = 1))]
    pub batch_size: usize,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from(DEFAULT_DATABASE_FILE),
            batch_size: DEFAULT_CHUNK_SIZE,
        }
    }
}
