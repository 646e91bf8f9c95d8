//! salesdesk-export: write the stored sales records to a dated CSV file.
//!
//! Usage: `salesdesk-export [OUTPUT_DIR]`
//!
//! Reads ~/.salesdesk/config.json for the storage root, the default output
//! directory and whether to quote values. Prints the written path, or a
//! notice when there are no records.

use std::path::PathBuf;
use std::process::ExitCode;

use salesdesk_lib::commands::export_csv;
use salesdesk_lib::state::{load_config, AppState};

fn run() -> Result<Option<PathBuf>, String> {
    let output_dir = std::env::args_os().nth(1).map(PathBuf::from);

    let config = load_config()?;
    let state = AppState::open(&config)?;
    export_csv(&state, output_dir.as_deref())
}

fn main() -> ExitCode {
    salesdesk_lib::init_logging();

    match run() {
        Ok(Some(path)) => {
            println!("{}", path.display());
            ExitCode::SUCCESS
        }
        Ok(None) => {
            println!("No sales records to export");
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("salesdesk-export: {}", e);
            ExitCode::FAILURE
        }
    }
}
