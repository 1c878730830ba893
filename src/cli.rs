use crate::config::{read_structured_file, GeneratorConfig};
use crate::descriptor::GeneratorInput;
use crate::error::Error;
use crate::openapi_builder::OpenApiBuilder;
use crate::serializer::{serialize_json, serialize_yaml, write_to_file};
use crate::version::OpenApiVersion;
use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use log::{debug, info, warn};
use std::path::PathBuf;

/// OpenAPI from decorators - Build an OpenAPI document from extracted controller and DTO metadata
#[derive(Parser, Debug)]
#[command(name = "openapi-from-decorators")]
#[command(author, version, about, long_about = None)]
pub struct CliArgs {
    /// Path to the extracted metadata (methods, schemas, constraints) as JSON or YAML
    #[arg(value_name = "INPUT")]
    pub input_path: PathBuf,

    /// Generator configuration file (info, servers, tags, security)
    #[arg(short = 'c', long = "config", value_name = "FILE")]
    pub config_path: Option<PathBuf>,

    /// Output format (yaml or json)
    #[arg(short = 'f', long = "format", value_enum, default_value = "yaml")]
    pub output_format: OutputFormat,

    /// Output file path (if not specified, outputs to stdout)
    #[arg(short = 'o', long = "output", value_name = "FILE")]
    pub output_path: Option<PathBuf>,

    /// Target OpenAPI version, overriding the configuration (e.g. 3.0.3, 3.1.0)
    #[arg(long = "openapi-version", value_name = "VERSION")]
    pub openapi_version: Option<String>,

    /// Fail when any schema reference is left unresolved
    #[arg(long = "strict")]
    pub strict: bool,

    /// Enable verbose output
    #[arg(short = 'v', long = "verbose")]
    pub verbose: bool,
}

/// Output format options
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    /// YAML format
    Yaml,
    /// JSON format
    Json,
}

/// Parse command line arguments
pub fn parse_args() -> Result<CliArgs> {
    let args = CliArgs::parse();
    parse_args_from_parsed(args)
}

/// Validate and log already-parsed arguments
pub fn parse_args_from_parsed(args: CliArgs) -> Result<CliArgs> {
    debug!("Parsed arguments: {:?}", args);

    if !args.input_path.is_file() {
        anyhow::bail!("Input file does not exist: {}", args.input_path.display());
    }
    if let Some(config_path) = &args.config_path {
        if !config_path.is_file() {
            anyhow::bail!("Config file does not exist: {}", config_path.display());
        }
    }
    if let Some(version) = &args.openapi_version {
        OpenApiVersion::parse(version)?;
    }

    info!("Input: {}", args.input_path.display());
    info!("Output format: {:?}", args.output_format);
    if let Some(ref output) = args.output_path {
        info!("Output file: {}", output.display());
    } else {
        info!("Output: stdout");
    }

    Ok(args)
}

/// Run the main workflow
pub fn run(args: CliArgs) -> Result<()> {
    let mut config = match &args.config_path {
        Some(path) => GeneratorConfig::from_file(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => GeneratorConfig::default(),
    };
    if let Some(version) = &args.openapi_version {
        config.openapi = version.clone();
    }
    info!("Target OpenAPI version: {}", config.openapi);

    let input: GeneratorInput = read_structured_file(&args.input_path)
        .with_context(|| format!("Failed to read input {}", args.input_path.display()))?;
    info!(
        "Loaded {} method(s), {} schema(s), constraints for {} class(es)",
        input.methods.len(),
        input.schemas.len(),
        input.constraints.len()
    );
    if input.methods.is_empty() {
        warn!("No endpoint methods in the input");
    }

    let mut builder = OpenApiBuilder::new(config);
    for method in &input.methods {
        debug!("Adding method: {} {}", method.method.as_str(), method.path);
        builder.add_method(method);
    }

    let result = builder.build(input.schemas, &input.constraints)?;

    if !result.unresolved.is_empty() {
        if args.strict {
            let names = result.unresolved.keys().cloned().collect();
            return Err(Error::UnresolvedReferences(names).into());
        }
        for (name, count) in &result.unresolved {
            warn!("Unresolved schema reference `{}` ({} use(s))", name, count);
        }
    }

    info!("Serializing to {:?} format...", args.output_format);
    let content = match args.output_format {
        OutputFormat::Yaml => serialize_yaml(&result.document)?,
        OutputFormat::Json => serialize_json(&result.document)?,
    };

    if let Some(output_path) = &args.output_path {
        write_to_file(&content, output_path)?;
        info!("Successfully wrote OpenAPI document to {}", output_path.display());
    } else {
        println!("{}", content);
    }

    let schema_count = result
        .document
        .components
        .as_ref()
        .map_or(0, |components| components.schemas.len());
    info!("Generation complete!");
    info!("Summary:");
    info!("  - Paths: {}", result.document.paths.len());
    info!("  - Schemas: {}", schema_count);
    info!("  - Unresolved references: {}", result.unresolved.len());

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    const INPUT: &str = r##"{
        "methods": [
            {"method": "get", "path": "users/:id", "operationId": "findOne",
             "parameters": [{"name": "id", "in": "path", "typeText": "string", "required": true}],
             "returnType": "UserDto"}
        ],
        "schemas": {
            "UserDto": {"type": "object", "properties": {"id": {"type": "string"}}}
        }
    }"##;

    fn args_for(input: PathBuf, output: PathBuf) -> CliArgs {
        CliArgs {
            input_path: input,
            config_path: None,
            output_format: OutputFormat::Json,
            output_path: Some(output),
            openapi_version: None,
            strict: false,
            verbose: false,
        }
    }

    #[test]
    fn test_cli_parses_flags() {
        let args = CliArgs::try_parse_from([
            "openapi-from-decorators",
            "input.json",
            "-c",
            "config.yaml",
            "-f",
            "json",
            "--openapi-version",
            "3.1.0",
            "--strict",
        ])
        .unwrap();

        assert_eq!(args.input_path, PathBuf::from("input.json"));
        assert_eq!(args.config_path, Some(PathBuf::from("config.yaml")));
        assert!(matches!(args.output_format, OutputFormat::Json));
        assert_eq!(args.openapi_version.as_deref(), Some("3.1.0"));
        assert!(args.strict);
        assert!(!args.verbose);
    }

    #[test]
    fn test_missing_input_rejected() {
        let temp_dir = TempDir::new().unwrap();
        let args = args_for(temp_dir.path().join("nope.json"), temp_dir.path().join("out.json"));
        assert!(parse_args_from_parsed(args).is_err());
    }

    #[test]
    fn test_bad_version_rejected() {
        let temp_dir = TempDir::new().unwrap();
        let input = temp_dir.path().join("input.json");
        fs::write(&input, INPUT).unwrap();
        let mut args = args_for(input, temp_dir.path().join("out.json"));
        args.openapi_version = Some("2.0".to_string());

        assert!(parse_args_from_parsed(args).is_err());
    }

    #[test]
    fn test_run_writes_document() {
        let temp_dir = TempDir::new().unwrap();
        let input = temp_dir.path().join("input.json");
        let output = temp_dir.path().join("out").join("openapi.json");
        fs::write(&input, INPUT).unwrap();

        run(args_for(input, output.clone())).unwrap();

        let document: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&output).unwrap()).unwrap();
        assert_eq!(document["openapi"], "3.0.3");
        assert!(document["paths"]["/users/{id}"]["get"].is_object());
        assert!(document["components"]["schemas"]["UserDto"].is_object());
    }

    #[test]
    fn test_strict_fails_on_unresolved() {
        let temp_dir = TempDir::new().unwrap();
        let input = temp_dir.path().join("input.yaml");
        fs::write(
            &input,
            "methods:\n  - method: get\n    path: /orders\n    operationId: list\n    returnType: OrderDto[]\n",
        )
        .unwrap();
        let output = temp_dir.path().join("openapi.json");

        let mut args = args_for(input.clone(), output.clone());
        args.strict = true;
        let err = run(args).unwrap_err();
        assert!(err.to_string().contains("OrderDto"));
        assert!(!output.exists());

        run(args_for(input, output.clone())).unwrap();
        assert!(output.exists());
    }
}
