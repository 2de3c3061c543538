use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{filter::EnvFilter, fmt, prelude::*};

use verdict::cli::{execute, Cli};

#[tokio::main]
async fn main() -> Result<()> {
  let cli = Cli::parse();

  // RUST_LOG wins over --verbose
  let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
    if cli.verbose {
      EnvFilter::new("verdict=debug,reqwest=info")
    } else {
      EnvFilter::new("verdict=info,reqwest=warn")
    }
  });
  tracing_subscriber::registry().with(fmt::layer().with_writer(std::io::stderr)).with(filter).init();

  if let Err(e) = execute(cli).await {
    bentley::showstopper(&format!("{e:#}"));
    return Err(e);
  }

  Ok(())
}
