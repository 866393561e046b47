use crate::error::RecordError;
use crate::models::{MatchMethod, ScoredRecord};
use crate::processors::scorer::BatchStats;

/// What happened to one batch on its way through the transform
#[derive(Debug, Clone, Default)]
pub struct TransformReport {
    pub total_records: usize,
    pub scored_records: usize,
    pub validation_failures: Vec<RecordError>,
    pub configuration_failures: Vec<RecordError>,
    pub exact_matches: usize,
    pub fuzzy_matches: usize,
    pub unmatched_names: usize,
    pub missing_names: usize,
    pub renamed_places: usize,
    pub batch_stats: Option<BatchStats>,
    pub min_score: Option<f64>,
    pub max_score: Option<f64>,
}

impl TransformReport {
    pub fn new(total_records: usize) -> Self {
        Self {
            total_records,
            ..Default::default()
        }
    }

    pub fn skipped_records(&self) -> usize {
        self.validation_failures.len() + self.configuration_failures.len()
    }

    pub fn record_failure(&mut self, error: RecordError) {
        if error.is_validation() {
            self.validation_failures.push(error);
        } else {
            self.configuration_failures.push(error);
        }
    }

    /// Tally name resolution and score range for the scored records
    pub fn record_scored(&mut self, records: &[ScoredRecord]) {
        for record in records {
            self.scored_records += 1;

            match record.match_method {
                MatchMethod::Exact => self.exact_matches += 1,
                MatchMethod::Fuzzy { .. } => self.fuzzy_matches += 1,
                MatchMethod::Unmatched { .. } => self.unmatched_names += 1,
                MatchMethod::Missing => self.missing_names += 1,
            }

            if record.was_renamed() {
                self.renamed_places += 1;
            }

            let score = record.site_potential_score;
            self.min_score = Some(self.min_score.map_or(score, |s| s.min(score)));
            self.max_score = Some(self.max_score.map_or(score, |s| s.max(score)));
        }
    }

    /// Every input record is either scored or skipped
    pub fn is_balanced(&self) -> bool {
        self.scored_records + self.skipped_records() == self.total_records
    }

    pub fn generate_summary(&self) -> String {
        let percent = |n: usize| {
            if self.total_records == 0 {
                0.0
            } else {
                100.0 * n as f64 / self.total_records as f64
            }
        };

        let mut summary = String::new();

        summary.push_str("=== Transform Report ===\n");
        summary.push_str(&format!("Input Records: {}\n", self.total_records));
        summary.push_str(&format!(
            "Scored Records: {} ({:.1}%)\n",
            self.scored_records,
            percent(self.scored_records)
        ));
        summary.push_str(&format!(
            "Skipped Records: {} (validation: {}, configuration: {})\n",
            self.skipped_records(),
            self.validation_failures.len(),
            self.configuration_failures.len()
        ));
        summary.push_str(&format!(
            "\nPlace Names: {} exact, {} fuzzy, {} unmatched, {} missing ({} renamed)\n",
            self.exact_matches,
            self.fuzzy_matches,
            self.unmatched_names,
            self.missing_names,
            self.renamed_places
        ));

        if let Some(stats) = &self.batch_stats {
            summary.push_str(&format!(
                "Capacity Range: {:.1} - {:.1} MW{}\n",
                stats.min_capacity,
                stats.max_capacity,
                if stats.is_degenerate() {
                    " (all equal)"
                } else {
                    ""
                }
            ));
        }

        if let (Some(min), Some(max)) = (self.min_score, self.max_score) {
            summary.push_str(&format!("Score Range: {:.3} - {:.3}\n", min, max));
        }

        let failures: Vec<&RecordError> = self
            .validation_failures
            .iter()
            .chain(self.configuration_failures.iter())
            .collect();
        if !failures.is_empty() {
            summary.push_str("\nSkipped (first 10):\n");
            for (i, failure) in failures.iter().take(10).enumerate() {
                summary.push_str(&format!("  {}. {}\n", i + 1, failure));
            }
        }

        summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failures_are_split_by_kind() {
        let mut report = TransformReport::new(3);
        report.record_failure(RecordError::validation("1", "capacity", "missing"));
        report.record_failure(RecordError::configuration("2", "unknown zoning category 'X'"));

        assert_eq!(report.skipped_records(), 2);
        assert_eq!(report.validation_failures.len(), 1);
        assert_eq!(report.configuration_failures.len(), 1);
        assert!(!report.is_balanced());
    }

    #[test]
    fn test_summary_for_empty_batch() {
        let summary = TransformReport::new(0).generate_summary();
        assert!(summary.contains("Input Records: 0"));
        assert!(summary.contains("(0.0%)"));
        assert!(!summary.contains("Score Range"));
    }

    #[test]
    fn test_summary_lists_skipped_records() {
        let mut report = TransformReport::new(1);
        report.record_failure(RecordError::validation("P-9", "latitude", "missing"));

        let summary = report.generate_summary();
        assert!(summary.contains("Skipped Records: 1 (validation: 1, configuration: 0)"));
        assert!(summary.contains("P-9"));
    }
}
