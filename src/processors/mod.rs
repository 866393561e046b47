pub mod ranking;
pub mod report;
pub mod scorer;
pub mod site_processor;
pub mod standardizer;

pub use ranking::{rank_by_score, RankingFilter};
pub use report::TransformReport;
pub use scorer::{BatchStats, SiteScorer};
pub use site_processor::SiteProcessor;
pub use standardizer::NameStandardizer;
