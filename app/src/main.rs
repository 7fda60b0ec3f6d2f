//! FILENAME: app/src/main.rs
// PURPOSE: Headless entry point. Loads the config named by the first argument
// (if any), both datasets, and prints the default pivot as JSON.

use std::path::PathBuf;
use std::process::ExitCode;

fn main() -> ExitCode {
    let config_path = std::env::args().nth(1).map(PathBuf::from);

    let state = match app_lib::run(config_path.as_deref()) {
        Ok(state) => state,
        Err(e) => {
            eprintln!("startup failed: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let response = app_lib::get_pivot_table(&state, app_lib::PivotRequest::default())
        .and_then(|r| serde_json::to_string_pretty(&r).map_err(|e| e.to_string()));
    match response {
        Ok(json) => {
            println!("{}", json);
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("{}", e);
            ExitCode::FAILURE
        }
    }
}
