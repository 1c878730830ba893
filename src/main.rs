//! OpenAPI from decorators - Command-line tool for assembling OpenAPI documents.
//!
//! Reads the metadata extracted from a decorator-annotated controller codebase (endpoint
//! methods, the raw schema pool and validation constraints) and writes a deterministic
//! OpenAPI 3.0.x or 3.1 document.
//!
//! # Usage
//!
//! ```bash
//! openapi-from-decorators [OPTIONS] <INPUT>
//! ```
//!
//! # Examples
//!
//! Generate YAML documentation:
//! ```bash
//! openapi-from-decorators metadata.json -c openapi.config.yaml -o openapi.yaml
//! ```
//!
//! Generate OpenAPI 3.1 JSON and fail on dangling references:
//! ```bash
//! openapi-from-decorators metadata.json -f json --openapi-version 3.1.0 --strict
//! ```

use anyhow::Result;
use clap::Parser;
use log::info;
use openapi_from_decorators::cli;

fn main() -> Result<()> {
    // Parse once to read the verbose flag before the logger exists
    let args_for_verbose = cli::CliArgs::parse();

    let log_level = if args_for_verbose.verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };

    env_logger::Builder::from_default_env()
        .filter_level(log_level)
        .init();

    info!("OpenAPI generator starting...");

    let args = cli::parse_args_from_parsed(args_for_verbose)?;
    cli::run(args)?;

    info!("OpenAPI document generation completed successfully");

    Ok(())
}
