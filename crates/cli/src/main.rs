use clap::{Parser, Subcommand};
use std::path::PathBuf;

use medex_core::{validate, CoreConfig, CoreError, FileStore, MemoryStore, TransformService};
use medex_uuid::{Clock, SystemClock};

#[derive(Parser)]
#[command(name = "medex")]
#[command(about = "Medex encounter-to-FHIR transformer CLI")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate an encounter payload and report every violation
    Validate {
        /// Path to the JSON payload file
        file: PathBuf,
    },
    /// Transform an encounter payload into a FHIR bundle and print it
    Transform {
        /// Path to the JSON payload file
        file: PathBuf,
        /// Persist the bundle under this data directory (must exist)
        #[arg(long)]
        data_dir: Option<PathBuf>,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Validate { file }) => {
            let payload = read_payload(&file)?;
            match validate(&payload, SystemClock.now()) {
                Ok(request) => {
                    println!(
                        "OK: {} diagnosis(es), {} procedure(s), {} lab result(s)",
                        request.diagnoses.len(),
                        request.procedures.len(),
                        request.lab_results.len()
                    );
                }
                Err(failure) => {
                    eprintln!("Validation failed with {}:", failure);
                    for violation in &failure.violations {
                        eprintln!("  {}: {} ({:?})", violation.path, violation.message, violation.kind);
                    }
                    std::process::exit(1);
                }
            }
        }
        Some(Commands::Transform { file, data_dir }) => {
            let payload = read_payload(&file)?;

            let result = match data_dir {
                Some(dir) => {
                    let cfg = CoreConfig::new(dir)?;
                    TransformService::new(FileStore::new(cfg.bundle_dir())).process(&payload)
                }
                None => TransformService::new(MemoryStore::new()).process(&payload),
            };

            match result {
                Ok(bundle) => println!("{}", serde_json::to_string_pretty(&bundle)?),
                Err(CoreError::Validation(failure)) => {
                    eprintln!("Validation failed with {}:", failure);
                    for violation in &failure.violations {
                        eprintln!("  {}: {} ({:?})", violation.path, violation.message, violation.kind);
                    }
                    std::process::exit(1);
                }
                Err(e) => {
                    eprintln!("Error transforming payload: {}", e);
                    std::process::exit(2);
                }
            }
        }
        None => {
            println!("Use 'medex --help' for commands");
        }
    }

    Ok(())
}

fn read_payload(file: &PathBuf) -> Result<serde_json::Value, Box<dyn std::error::Error>> {
    let text = std::fs::read_to_string(file)?;
    Ok(serde_json::from_str(&text)?)
}
