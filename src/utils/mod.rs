pub mod constants;
pub mod coordinates;
pub mod filename;
pub mod fuzzy;
pub mod progress;

pub use constants::*;
pub use coordinates::{dms_to_decimal, haversine_distance, GeoPoint};
pub use filename::generate_default_parquet_filename;
pub use progress::ProgressReporter;
