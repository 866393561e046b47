/// Geodesy
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Default target site (San Francisco, CA)
pub const DEFAULT_TARGET_LAT: f64 = 37.7749;
pub const DEFAULT_TARGET_LON: f64 = -122.4194;

/// Distance at which the proximity score reaches zero
pub const DEFAULT_MAX_DISTANCE_KM: f64 = 500.0;

/// Score weights (must sum to 1.0)
pub const DEFAULT_PROXIMITY_WEIGHT: f64 = 0.40;
pub const DEFAULT_ZONING_WEIGHT: f64 = 0.35;
pub const DEFAULT_CAPACITY_WEIGHT: f64 = 0.25;
pub const WEIGHT_SUM_TOLERANCE: f64 = 1e-6;

/// Zoning favorability
pub const ZONING_INDUSTRIAL: f64 = 1.0;
pub const ZONING_COMMERCIAL: f64 = 0.7;
pub const ZONING_AGRICULTURAL: f64 = 0.4;
pub const ZONING_RESIDENTIAL: f64 = 0.2;

/// Capacity score when every record in the batch has the same capacity
pub const DEFAULT_DEGENERATE_CAPACITY_SCORE: f64 = 1.0;

/// Fuzzy matching (0-100 scale, inclusive)
pub const DEFAULT_FUZZY_THRESHOLD: u8 = 80;

/// Operational status kept by the "operational only" filter
pub const STATUS_OPERATING: &str = "Operating";

/// File names
pub const DEFAULT_CONFIG_FILE: &str = "site_etl";
pub const DEFAULT_INPUT_FILE: &str = "data/sample_data.json";
pub const DEFAULT_DATABASE_FILE: &str = "output/site_etl.db";
pub const ENV_PREFIX: &str = "SITE_ETL";

/// Processing defaults
pub const DEFAULT_CHUNK_SIZE: usize = 1000;
pub const DEFAULT_ROW_GROUP_SIZE: usize = 10000;
pub const DEFAULT_TOP_SITES: usize = 10;

/// Parquet compression options
pub const COMPRESSION_SNAPPY: &str = "snappy";
pub const COMPRESSION_GZIP: &str = "gzip";
pub const COMPRESSION_LZ4: &str = "lz4";
pub const COMPRESSION_ZSTD: &str = "zstd";
pub const COMPRESSION_NONE: &str = "none";
