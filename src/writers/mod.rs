pub mod parquet_writer;
pub mod sqlite_loader;

pub use parquet_writer::{ParquetFileInfo, ParquetWriter};
pub use sqlite_loader::{NameChange, RegionCapacity, SqliteLoader, TopSite};
