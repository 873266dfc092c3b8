//! SPL CoPilot CLI
//!
//! Translates a natural-language security question into a validated
//! SPL search from the command line.

mod app;
mod cli;
mod telemetry;

use anyhow::Result;
use clap::Parser;
use tracing::error;

use crate::app::App;
use crate::cli::Args;
use crate::telemetry::init_telemetry;

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();

    let args = Args::parse();
    init_telemetry(&args)?;

    let result = run_application(args).await;
    if let Err(ref e) = result {
        error!("Application error: {:#}", e);
    }
    result
}

async fn run_application(args: Args) -> Result<()> {
    let app = App::build(args).await?;
    app.run().await
}
