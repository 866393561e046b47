use crate::models::ScoredRecord;

/// Sort best-first. The sort is stable, so equal scores keep input order.
pub fn rank_by_score(records: &mut [ScoredRecord]) {
    records.sort_by(|a, b| b.site_potential_score.total_cmp(&a.site_potential_score));
}

/// Post-ranking selection applied before output
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RankingFilter {
    pub operational_only: bool,
    pub min_score: Option<f64>,
    pub limit: Option<usize>,
}

impl RankingFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_operational_only(mut self, operational_only: bool) -> Self {
        self.operational_only = operational_only;
        self
    }

    pub fn with_min_score(mut self, min_score: Option<f64>) -> Self {
        self.min_score = min_score;
        self
    }

    pub fn with_limit(mut self, limit: Option<usize>) -> Self {
        self.limit = limit;
        self
    }

    pub fn accepts(&self, record: &ScoredRecord) -> bool {
        if self.operational_only && !record.record.is_operating() {
            return false;
        }
        match self.min_score {
            Some(min) => record.site_potential_score >= min,
            None => true,
        }
    }

    /// Rank, filter and truncate
    pub fn apply(&self, mut records: Vec<ScoredRecord>) -> Vec<ScoredRecord> {
        rank_by_score(&mut records);
        let selected = records.into_iter().filter(|r| self.accepts(r));

        match self.limit {
            Some(limit) => selected.take(limit).collect(),
            None => selected.collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{MatchMethod, PlantRecord, ZoningCategory};

    fn scored(code: &str, score: f64, status: &str) -> ScoredRecord {
        ScoredRecord {
            record: PlantRecord {
                plant_code: code.to_string(),
                plant_name: code.to_string(),
                operator_name: None,
                raw_place_name: None,
                county: None,
                state: None,
                latitude: 0.0,
                longitude: 0.0,
                capacity_mw: 1.0,
                zoning: Some("Industrial".to_string()),
                fuel_type: None,
                status: Some(status.to_string()),
                operational_year: None,
            },
            standardized_place_name: None,
            match_method: MatchMethod::Missing,
            zoning: ZoningCategory::Industrial,
            distance_to_target_km: 0.0,
            proximity_score: score,
            zoning_score: score,
            capacity_score_normalized: score,
            site_potential_score: score,
        }
    }

    fn codes(records: &[ScoredRecord]) -> Vec<&str> {
        records.iter().map(|r| r.plant_code()).collect()
    }

    #[test]
    fn test_rank_descending_and_stable() {
        let mut records = vec![
            scored("a", 0.5, "Operating"),
            scored("b", 0.9, "Operating"),
            scored("c", 0.5, "Operating"),
            scored("d", 0.7, "Operating"),
        ];
        rank_by_score(&mut records);

        assert_eq!(codes(&records), vec!["b", "d", "a", "c"]);
    }

    #[test]
    fn test_filter_operational_min_score_and_limit() {
        let records = vec![
            scored("a", 0.8, "Operating"),
            scored("b", 0.95, "Retired"),
            scored("c", 0.6, "operating"),
            scored("d", 0.3, "Operating"),
            scored("e", 0.7, "Operating"),
        ];

        let filter = RankingFilter::new()
            .with_operational_only(true)
            .with_min_score(Some(0.5))
            .with_limit(Some(2));

        assert_eq!(codes(&filter.apply(records)), vec!["a", "e"]);
    }

    #[test]
    fn test_default_filter_keeps_everything() {
        let records = vec![scored("a", 0.1, "Planned"), scored("b", 0.2, "Retired")];
        assert_eq!(codes(&RankingFilter::new().apply(records)), vec!["b", "a"]);
    }
}
