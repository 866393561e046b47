use chrono::{Datelike, Local};
use std::path::PathBuf;

/// Generate default Parquet filename with format: site-scores-{YYMMDD}.parquet
pub fn generate_default_parquet_filename() -> PathBuf {
    let now = Local::now();
    let year = now.year() % 100;
    let month = now.month();
    let day = now.day();

    let filename = format!("site-scores-{:02}{:02}{:02}.parquet", year, month, day);
    PathBuf::from("output").join(filename)
}
