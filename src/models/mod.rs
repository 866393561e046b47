pub mod plant;
pub mod scored;

pub use plant::{PlantRecord, RawField, RawPlantRecord, ZoningCategory};
pub use scored::{MatchMethod, ScoredRecord, Standardization};
