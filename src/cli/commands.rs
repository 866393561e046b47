use crate::cli::args::{Cli, Commands};
use crate::config::EtlConfig;
use crate::error::{ProcessingError, Result};
use crate::models::ScoredRecord;
use crate::processors::{rank_by_score, NameStandardizer, RankingFilter, SiteProcessor};
use crate::readers::RecordReader;
use crate::utils::filename::generate_default_parquet_filename;
use crate::utils::progress::ProgressReporter;
use crate::writers::{NameChange, ParquetWriter, RegionCapacity, SqliteLoader, TopSite};
use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Console logging to stderr, plus a plain-text copy when `log_file` is set.
/// `RUST_LOG` overrides the default level.
pub fn init_logging(verbose: bool, log_file: Option<&Path>) -> Result<()> {
    let default_directive = if verbose { "site_etl=debug" } else { "site_etl=info" };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive));

    let file_layer = match log_file {
        Some(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent)?;
            }
            let file = File::create(path)?;
            Some(fmt::layer().with_ansi(false).with_writer(Mutex::new(file)))
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .with(file_layer)
        .try_init()
        .map_err(|e| ProcessingError::Config(format!("Failed to initialize logging: {}", e)))
}

pub async fn run(cli: Cli) -> Result<()> {
    init_logging(cli.verbose, cli.log_file.as_deref())?;

    let config_path = cli.config.clone();
    let quiet = cli.quiet;

    match cli.command {
        Commands::Run {
            input,
            database,
            parquet,
            compression,
            max_workers,
            top,
            validate_only,
        } => {
            let config = EtlConfig::load(config_path.as_deref())?;
            println!("Running site ETL...");
            println!("Input file: {}", input.display());
            println!("Workers: {}", max_workers);

            let (scored, report) = transform(&config, &input, max_workers, quiet).await?;
            println!("\n{}", report.generate_summary());

            if validate_only {
                println!("Validation complete - nothing loaded");
                return Ok(());
            }

            if scored.is_empty() {
                println!("No records to load");
                return Ok(());
            }

            if let Some(parquet) = parquet {
                let output = parquet.unwrap_or_else(generate_default_parquet_filename);
                let writer = ParquetWriter::new().with_compression(&compression)?;
                writer.write_records_batched(&scored, &output, config.database.batch_size)?;
                println!("\n{}", writer.get_file_info(&output)?.summary());
            }

            let db_path = database.unwrap_or_else(|| config.database.path.clone());
            println!("\nLoading {} records into {}", scored.len(), db_path.display());

            let progress = ProgressReporter::new_spinner("Loading into SQLite...", quiet);
            let batch_size = config.database.batch_size;
            let verification = tokio::task::spawn_blocking(move || {
                load_and_verify(&db_path, &scored, batch_size, top)
            })
            .await??;
            progress.finish_with_message(&format!(
                "Database holds {} plants",
                verification.total_rows
            ));

            print_verification(&verification);
            println!("\nETL complete!");
        }

        Commands::Score {
            input,
            operational_only,
            min_score,
            limit,
            max_workers,
            json,
        } => {
            let config = EtlConfig::load(config_path.as_deref())?;
            let (scored, report) = transform(&config, &input, max_workers, true).await?;

            let filter = RankingFilter::new()
                .with_operational_only(operational_only)
                .with_min_score(min_score)
                .with_limit(limit);
            let ranked = filter.apply(scored);

            if json {
                println!("{}", serde_json::to_string_pretty(&ranked)?);
            } else {
                if !quiet {
                    println!("{}", report.generate_summary());
                }
                print_ranking(&ranked);
            }
        }

        Commands::Standardize { names } => {
            let config = EtlConfig::load(config_path.as_deref())?;
            let standardizer = NameStandardizer::new(&config.standardizer);
            println!(
                "Mapping table: {} spellings, threshold {}",
                standardizer.variant_count(),
                standardizer.threshold()
            );

            for name in &names {
                let result = standardizer.standardize(Some(name.as_str()));
                let detail = match result.method.fuzzy_score() {
                    Some(score) => format!("{}, score {}", result.method.label(), score),
                    None => result.method.label().to_string(),
                };
                println!(
                    "  {:<30} -> {:<30} ({})",
                    name,
                    result.name.as_deref().unwrap_or("-"),
                    detail
                );
            }
        }

        Commands::Info { file, sample } => {
            println!("Analyzing Parquet file: {}", file.display());

            let writer = ParquetWriter::new();
            let file_info = writer.get_file_info(&file)?;
            println!("\n{}", file_info.summary());

            if sample > 0 {
                println!("\nSample Records (showing up to {}):", sample);
                for (i, (plant_code, score)) in
                    writer.read_sample_scores(&file, sample)?.iter().enumerate()
                {
                    println!("{}. {} score={:.3}", i + 1, plant_code, score);
                }
            }
        }

        Commands::Check { input, database } => {
            run_setup_check(config_path.as_deref(), &input, database).await?;
        }
    }

    Ok(())
}

/// Extract and transform one input file
async fn transform(
    config: &EtlConfig,
    input: &Path,
    max_workers: usize,
    quiet: bool,
) -> Result<(Vec<ScoredRecord>, crate::processors::TransformReport)> {
    let processor = SiteProcessor::new(config)?.with_max_workers(max_workers);

    let raw = RecordReader::new().read_records_async(input).await?;
    let progress = ProgressReporter::new(raw.len() as u64, "Scoring sites...", quiet);

    let (mut scored, report) = processor.process(raw, Some(&progress))?;
    rank_by_score(&mut scored);

    if report.skipped_records() > 0 {
        warn!("{} records skipped", report.skipped_records());
    }
    Ok((scored, report))
}

struct Verification {
    total_rows: usize,
    top_sites: Vec<TopSite>,
    regions: Vec<RegionCapacity>,
    name_changes: Vec<NameChange>,
}

fn load_and_verify(
    db_path: &Path,
    scored: &[ScoredRecord],
    batch_size: usize,
    top: usize,
) -> Result<Verification> {
    let mut loader = SqliteLoader::open(db_path)?;
    loader.load(scored, batch_size)?;

    Ok(Verification {
        total_rows: loader.count()?,
        top_sites: loader.top_sites(top)?,
        regions: loader.capacity_by_region()?,
        name_changes: loader.standardization_examples(top)?,
    })
}

fn print_verification(v: &Verification) {
    println!("\nTop {} operating sites:", v.top_sites.len());
    for (i, site) in v.top_sites.iter().enumerate() {
        println!(
            "{:>3}. {:<10} {:<30} {:<20} {:>9.1} MW  score={:.3}",
            i + 1,
            site.plant_code,
            site.plant_name,
            site.city.as_deref().unwrap_or("-"),
            site.capacity_mw,
            site.site_potential_score
        );
    }

    println!("\nCapacity by region:");
    for region in &v.regions {
        println!(
            "  {:<4} {:<25} plants={:<4} capacity={:>10.1} MW  avg={:.3} max={:.3}",
            region.state.as_deref().unwrap_or("-"),
            region.county.as_deref().unwrap_or("-"),
            region.plant_count,
            region.total_capacity_mw,
            region.avg_score,
            region.max_score
        );
    }

    println!("\nPlace name standardization:");
    if v.name_changes.is_empty() {
        println!("  (no names changed)");
    }
    for change in &v.name_changes {
        println!(
            "  {:<30} -> {:<20} {} x{}",
            change.original, change.standardized, change.match_method, change.occurrences
        );
    }
}

fn print_ranking(records: &[ScoredRecord]) {
    println!(
        "{:>4} {:<10} {:<25} {:<20} {:>8} {:>6} {:>6} {:>6} {:>6}",
        "rank", "code", "name", "place", "km", "prox", "zone", "cap", "score"
    );
    for (i, r) in records.iter().enumerate() {
        println!(
            "{:>4} {:<10} {:<25} {:<20} {:>8.1} {:>6.3} {:>6.3} {:>6.3} {:>6.3}",
            i + 1,
            r.plant_code(),
            r.record.plant_name,
            r.standardized_place_name.as_deref().unwrap_or("-"),
            r.distance_to_target_km,
            r.proximity_score,
            r.zoning_score,
            r.capacity_score_normalized,
            r.site_potential_score
        );
    }
}

/// Pre-flight check: configuration, input file and database. Prints a
/// PASS/FAIL line per check and fails if any check failed.
async fn run_setup_check(
    config_path: Option<&Path>,
    input: &Path,
    database: Option<PathBuf>,
) -> Result<()> {
    let mut results: Vec<(&str, std::result::Result<String, String>)> = Vec::new();

    let config = match EtlConfig::load(config_path) {
        Ok(config) => {
            results.push((
                "Configuration",
                Ok(format!(
                    "{} place mappings, target ({:.4}, {:.4})",
                    config.standardizer.mappings.len(),
                    config.scoring.target.latitude,
                    config.scoring.target.longitude
                )),
            ));
            Some(config)
        }
        Err(e) => {
            results.push(("Configuration", Err(e.to_string())));
            None
        }
    };

    let input_check = match RecordReader::new().read_records_async(input).await {
        Ok(records) if records.is_empty() => Err(format!("{} has no records", input.display())),
        Ok(records) => Ok(format!("{} records in {}", records.len(), input.display())),
        Err(e) => Err(e.to_string()),
    };
    results.push(("Input data", input_check));

    let db_path = database
        .or_else(|| config.as_ref().map(|c| c.database.path.clone()))
        .unwrap_or_else(|| PathBuf::from(crate::utils::constants::DEFAULT_DATABASE_FILE));
    let db_check = tokio::task::spawn_blocking(move || check_database(&db_path)).await?;
    results.push(("Database", db_check));

    println!("=== Setup Check ===");
    let mut failed = 0;
    for (name, result) in &results {
        match result {
            Ok(detail) => println!("[PASS] {:<15} {}", name, detail),
            Err(reason) => {
                failed += 1;
                println!("[FAIL] {:<15} {}", name, reason);
            }
        }
    }
    println!("{}/{} checks passed", results.len() - failed, results.len());

    if failed > 0 {
        return Err(ProcessingError::Config(format!(
            "{} setup check(s) failed",
            failed
        )));
    }

    info!("Setup check passed");
    Ok(())
}

/// Report on the load target without creating or migrating it
fn check_database(path: &Path) -> std::result::Result<String, String> {
    if path.exists() {
        let loader = SqliteLoader::open_existing(path).map_err(|e| e.to_string())?;
        return Ok(match loader.count() {
            Ok(rows) => format!("{} ({} rows)", path.display(), rows),
            Err(_) => format!("{} (no power_plants table yet)", path.display()),
        });
    }

    let parent = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let nearest = parent.ancestors().find(|dir| dir.exists()).ok_or_else(|| {
        format!("no existing directory above {}", path.display())
    })?;

    match std::fs::metadata(nearest) {
        Ok(meta) if meta.permissions().readonly() => {
            Err(format!("{} is read-only", nearest.display()))
        }
        Ok(_) => Ok(format!("{} (will be created)", path.display())),
        Err(e) => Err(format!("{}: {}", nearest.display(), e)),
    }
}
