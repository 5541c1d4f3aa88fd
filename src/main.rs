mod cli;
mod defaults;
mod engine;
mod error;
mod model;
mod normalize;
mod orchestrator;
mod session;
#[cfg(feature = "tui")]
mod tui;

use anyhow::Result;
use clap::Parser;

#[tokio::main]
async fn main() -> Result<()> {
    let args = cli::Cli::parse();
    let is_headless = args.json || args.text;

    match cli::run(args).await {
        Ok(()) => {
            // Explicitly exit with code 0 on success for scripted headless usage
            if is_headless {
                std::process::exit(0);
            }
            Ok(())
        }
        Err(e) => {
            if is_headless {
                eprintln!("{e:#}");
                std::process::exit(1);
            } else {
                Err(e)
            }
        }
    }
}
