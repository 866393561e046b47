use clap::Parser;
use site_etl::cli::{run, Cli};
use site_etl::error::Result;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    run(cli).await
}
