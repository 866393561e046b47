use crate::utils::constants::{COMPRESSION_SNAPPY, DEFAULT_INPUT_FILE, DEFAULT_TOP_SITES};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "site-etl")]
#[command(about = "Power plant ETL: standardize place names, score site potential, load to SQLite")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[arg(short, long, global = true, help = "Enable verbose logging")]
    pub verbose: bool,

    #[arg(short, long, global = true, help = "Hide progress output")]
    pub quiet: bool,

    #[arg(long, global = true, help = "Log file path")]
    pub log_file: Option<PathBuf>,

    #[arg(
        short,
        long,
        global = true,
        help = "Configuration file [default: site_etl.toml if present]"
    )]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Extract, transform and load a batch of plant records
    Run {
        #[arg(short, long, default_value = DEFAULT_INPUT_FILE, help = "Input JSON or CSV file")]
        input: PathBuf,

        #[arg(short, long, help = "SQLite database path [default: from config]")]
        database: Option<PathBuf>,

        #[arg(
            short,
            long,
            help = "Also write a Parquet snapshot [default name: site-scores-{YYMMDD}.parquet]"
        )]
        parquet: Option<Option<PathBuf>>,

        #[arg(long, default_value = COMPRESSION_SNAPPY)]
        compression: String,

        #[arg(long, default_value_t = num_cpus::get())]
        max_workers: usize,

        #[arg(long, default_value_t = DEFAULT_TOP_SITES, help = "Rows per verification query")]
        top: usize,

        #[arg(long, default_value = "false", help = "Transform only, load nothing")]
        validate_only: bool,
    },

    /// Score a batch and print the ranking without loading it
    Score {
        #[arg(short, long, default_value = DEFAULT_INPUT_FILE)]
        input: PathBuf,

        #[arg(long, help = "Only plants with status 'Operating'")]
        operational_only: bool,

        #[arg(long)]
        min_score: Option<f64>,

        #[arg(short, long)]
        limit: Option<usize>,

        #[arg(long, default_value_t = num_cpus::get())]
        max_workers: usize,

        #[arg(long, help = "Print scored records as JSON")]
        json: bool,
    },

    /// Standardize place names against the configured mapping table
    Standardize {
        #[arg(required = true)]
        names: Vec<String>,
    },

    /// Display information about a Parquet snapshot
    Info {
        #[arg(short, long)]
        file: PathBuf,

        #[arg(short, long, default_value = "10")]
        sample: usize,
    },

    /// Check configuration, input and database before a run
    Check {
        #[arg(short, long, default_value = DEFAULT_INPUT_FILE)]
        input: PathBuf,

        #[arg(short, long, help = "SQLite database path [default: from config]")]
        database: Option<PathBuf>,
    },
}
