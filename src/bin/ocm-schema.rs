//! OCM Schema CLI
//!
//! Command-line interface for compiling OData service metadata into an object
//! code model and inspecting its capabilities.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use ocm_schema::{
    capability_summary, load_metadata_auto, model_to_json, read_model, validate_csdl,
    ContainerPolicy, Model, ReadError, ReadOptions, SchemaError, ServiceType, ValidateError,
    METADATA_KEY,
};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "ocm-schema")]
#[command(about = "Compile OData CSDL metadata into an object code model")]
#[command(version)]
struct Cli {
    /// Log debug output to stderr (overridden by RUST_LOG)
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compile service metadata into a model and print it as JSON
    Compile {
        /// Metadata source: file path or URL (http:// or https://)
        source: String,

        /// Treat the service as OData v3 (no capability resolution)
        #[arg(long)]
        v3: bool,

        /// Fail if the metadata declares more than one entity container
        #[arg(long)]
        unique_container: bool,

        /// Skip capability resolution
        #[arg(long)]
        no_capabilities: bool,

        /// Skip structural validation of the document
        #[arg(long)]
        no_validate: bool,

        /// Output file (stdout if not specified)
        #[arg(long)]
        output: Option<PathBuf>,

        /// Pretty-print JSON output
        #[arg(long)]
        pretty: bool,
    },

    /// List the capabilities projected onto properties
    Capabilities {
        /// Metadata source: file path or URL (http:// or https://)
        source: String,

        /// Output results as JSON (for automation)
        #[arg(long)]
        json: bool,
    },

    /// Check that a metadata document is structurally valid CSDL JSON
    Check {
        /// Metadata source: file path or URL (http:// or https://)
        source: String,

        /// Output results as JSON (for automation)
        #[arg(long)]
        json: bool,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = match cli.command {
        Commands::Compile {
            source,
            v3,
            unique_container,
            no_capabilities,
            no_validate,
            output,
            pretty,
        } => {
            let service_type = if v3 {
                ServiceType::ODataV3
            } else {
                ServiceType::ODataV4
            };
            let policy = if unique_container {
                ContainerPolicy::Unique
            } else {
                ContainerPolicy::First
            };
            let options = ReadOptions::new(service_type)
                .container_policy(policy)
                .resolve_capabilities(!no_capabilities)
                .validate(!no_validate);
            run_compile(&source, &options, output, pretty)
        }

        Commands::Capabilities { source, json } => run_capabilities(&source, json),

        Commands::Check { source, json } => run_check(&source, json),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(code) => ExitCode::from(code),
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| default.into()))
        .with_writer(std::io::stderr)
        .init();
}

fn load_model(source: &str, options: &ReadOptions, json_output: bool) -> Result<Model, u8> {
    let metadata = load_metadata_auto(source).map_err(|e| fail(json_output, &e))?;
    read_model(metadata, options).map_err(|e| fail(json_output, &e))
}

fn fail(json_output: bool, error: &ReadError) -> u8 {
    if let ReadError::Validate(ValidateError::Invalid { errors }) = error {
        report_invalid(json_output, errors);
    } else {
        report_error(json_output, &error.to_string());
    }
    error.exit_code() as u8
}

fn run_compile(
    source: &str,
    options: &ReadOptions,
    output: Option<PathBuf>,
    pretty: bool,
) -> Result<(), u8> {
    let model = load_model(source, options, false)?;
    let compiled = model_to_json(&model);

    let json_output = if pretty {
        serde_json::to_string_pretty(&compiled)
    } else {
        serde_json::to_string(&compiled)
    }
    .map_err(|e| {
        eprintln!("Error serializing output: {}", e);
        2u8
    })?;

    match output {
        Some(path) => {
            std::fs::write(&path, &json_output).map_err(|e| {
                eprintln!("Error writing to {}: {}", path.display(), e);
                3u8
            })?;
        }
        None => {
            println!("{}", json_output);
        }
    }

    Ok(())
}

fn run_capabilities(source: &str, json_output: bool) -> Result<(), u8> {
    let model = load_model(source, &ReadOptions::default(), json_output)?;
    let summary = capability_summary(&model);

    if json_output {
        println!("{}", serde_json::json!(summary));
        return Ok(());
    }

    if summary.is_empty() {
        println!("No capabilities");
    }
    for entry in &summary {
        let capabilities: Vec<String> = entry
            .capabilities
            .iter()
            .map(|c| format!("{}={}", c.kind().as_str(), c.is_allowed()))
            .collect();
        println!("{}: {}", entry.property, capabilities.join(", "));
    }
    Ok(())
}

fn run_check(source: &str, json_output: bool) -> Result<(), u8> {
    let metadata = load_metadata_auto(source).map_err(|e| fail(json_output, &e))?;
    let text = metadata.get(METADATA_KEY).unwrap_or_default();
    let document: serde_json::Value = serde_json::from_str(text).map_err(|source| {
        fail(json_output, &ReadError::InvalidJson { source })
    })?;

    match validate_csdl(&document) {
        Ok(()) => {
            if json_output {
                println!(r#"{{"valid":true}}"#);
            } else {
                println!("Valid");
            }
            Ok(())
        }
        Err(ValidateError::Invalid { errors }) => {
            report_invalid(json_output, &errors);
            Err(1)
        }
        Err(e) => {
            report_error(json_output, &e.to_string());
            Err(e.exit_code() as u8)
        }
    }
}

fn report_invalid(json_output: bool, errors: &[SchemaError]) {
    if json_output {
        let output = serde_json::json!({
            "valid": false,
            "errors": errors
        });
        println!("{}", output);
    } else {
        eprintln!("Validation failed:");
        for error in errors {
            eprintln!("  {}", error);
        }
    }
}

/// Output an error message in plain text or JSON format.
fn report_error(json_output: bool, msg: &str) {
    if json_output {
        println!("{}", serde_json::json!({ "valid": false, "error": msg }));
    } else {
        eprintln!("Error: {}", msg);
    }
}
