use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(
    name = "tips-ladder",
    about = "TIPS ladder income calculator (yield-curve pricing + tax analytics)"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the HTTP API server
    Serve {
        #[arg(long, default_value_t = 8080)]
        port: u16,
    },
    /// Compute a ladder from a JSON request document and print the result
    Calc {
        /// Path to a JSON file matching the /calculate-ladder request schema
        input: PathBuf,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    env_logger::init();

    match Cli::parse().command {
        Command::Serve { port } => {
            if let Err(e) = tips_ladder::api::run_http_server(port).await {
                eprintln!("Server error: {e}");
                return ExitCode::FAILURE;
            }
            ExitCode::SUCCESS
        }
        Command::Calc { input } => {
            let json = match std::fs::read_to_string(&input) {
                Ok(json) => json,
                Err(e) => {
                    eprintln!("Failed to read {}: {e}", input.display());
                    return ExitCode::FAILURE;
                }
            };
            let result = match tips_ladder::api::ladder_result_from_json(&json) {
                Ok(result) => result,
                Err(msg) => {
                    eprintln!("{msg}");
                    return ExitCode::FAILURE;
                }
            };
            match serde_json::to_string_pretty(&result) {
                Ok(rendered) => {
                    println!("{rendered}");
                    ExitCode::SUCCESS
                }
                Err(e) => {
                    eprintln!("Failed to serialize result: {e}");
                    ExitCode::FAILURE
                }
            }
        }
    }
}
