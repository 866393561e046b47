use crate::config::EtlConfig;
use crate::error::{ProcessingError, Result};
use crate::models::{PlantRecord, RawPlantRecord, ScoredRecord, Standardization};
use crate::processors::report::TransformReport;
use crate::processors::scorer::{BatchStats, SiteScorer};
use crate::processors::standardizer::NameStandardizer;
use crate::utils::progress::ProgressReporter;
use rayon::prelude::*;
use tracing::{info, warn};

/// Runs the transform over one batch: validate, standardize, collect batch
/// statistics, then score every surviving record.
pub struct SiteProcessor {
    standardizer: NameStandardizer,
    scorer: SiteScorer,
    max_workers: usize,
}

impl SiteProcessor {
    /// Fails on any configuration problem, before a record is touched
    pub fn new(config: &EtlConfig) -> Result<Self> {
        config.ensure_valid()?;

        Ok(Self {
            standardizer: NameStandardizer::new(&config.standardizer),
            scorer: SiteScorer::try_new(config.scoring.clone())?,
            max_workers: num_cpus::get(),
        })
    }

    pub fn with_max_workers(mut self, max_workers: usize) -> Self {
        self.max_workers = max_workers.max(1);
        self
    }

    pub fn standardizer(&self) -> &NameStandardizer {
        &self.standardizer
    }

    pub fn scorer(&self) -> &SiteScorer {
        &self.scorer
    }

    /// Transform a raw batch. Bad records are skipped and listed in the
    /// report; only configuration or thread-pool problems abort.
    pub fn process(
        &self,
        raw_records: Vec<RawPlantRecord>,
        progress: Option<&ProgressReporter>,
    ) -> Result<(Vec<ScoredRecord>, TransformReport)> {
        let mut report = TransformReport::new(raw_records.len());

        if let Some(p) = progress {
            p.set_message("Validating records...");
        }

        let eligible = self.prepare(raw_records, &mut report);

        // Pass 1: batch statistics over every record that will be scored
        let Some(stats) = BatchStats::from_records(eligible.iter().map(|(record, _)| record)) else {
            warn!("No valid records to score");
            return Ok((Vec::new(), report));
        };
        report.batch_stats = Some(stats);

        info!(
            records = stats.count,
            min_capacity = stats.min_capacity,
            max_capacity = stats.max_capacity,
            degenerate = stats.is_degenerate(),
            "Batch statistics computed"
        );

        if let Some(p) = progress {
            p.set_message(&format!("Scoring {} records...", eligible.len()));
        }

        // Pass 2: stats are frozen, records score independently
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.max_workers)
            .build()
            .map_err(|e| ProcessingError::Config(e.to_string()))?;

        let results: Vec<_> = pool.install(|| {
            eligible
                .par_iter()
                .map(|(record, standardization)| {
                    let result = self
                        .scorer
                        .score_record(record, standardization.clone(), &stats);
                    if let Some(p) = progress {
                        p.increment(1);
                    }
                    result
                })
                .collect()
        });

        let mut scored = Vec::with_capacity(results.len());
        for result in results {
            match result {
                Ok(record) => scored.push(record),
                Err(e) => {
                    warn!("Skipping record: {}", e);
                    report.record_failure(e);
                }
            }
        }

        report.record_scored(&scored);

        info!(
            scored = report.scored_records,
            skipped = report.skipped_records(),
            fuzzy = report.fuzzy_matches,
            "Transformation complete"
        );

        if let Some(p) = progress {
            p.finish_with_message(&format!("Scored {} records", scored.len()));
        }

        Ok((scored, report))
    }

    /// Validation, zoning resolution and name standardization. Records that
    /// fail here never reach the batch statistics.
    fn prepare(
        &self,
        raw_records: Vec<RawPlantRecord>,
        report: &mut TransformReport,
    ) -> Vec<(PlantRecord, Standardization)> {
        let mut eligible = Vec::with_capacity(raw_records.len());

        for (index, raw) in raw_records.into_iter().enumerate() {
            let record = match raw.into_plant(index) {
                Ok(record) => record,
                Err(e) => {
                    warn!("Skipping record: {}", e);
                    report.record_failure(e);
                    continue;
                }
            };

            if let Err(e) = self.scorer.resolve_zoning(&record) {
                warn!("Skipping record: {}", e);
                report.record_failure(e);
                continue;
            }

            let standardization = self.standardizer.standardize(record.raw_place_name.as_deref());
            eligible.push((record, standardization));
        }

        eligible
    }
}
