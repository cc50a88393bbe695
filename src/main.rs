//! Model loader CLI entry point.
//!
//! ## CLI Subcommands
//!
//! - `model-loader-cli load [--model NAME]` - Stream, deserialize and cache
//! - `model-loader-cli validate [--model NAME]` - HEAD probe only
//! - `model-loader-cli predict --text TEXT [--model NAME]` - Predict an intent
//! - `model-loader-cli config show|defaults|validate` - Configuration

use std::process::ExitCode;

use model_loader::cli::{self, config_cmd, EXIT_SETUP_FAILURE};
use model_loader::config::{self as loader_config, EnvConfig};
use model_loader::telemetry::init_logging;
use model_loader::ModelService;

#[tokio::main]
async fn main() -> ExitCode {
    let args: Vec<String> = std::env::args().collect();
    let command = args.get(1).map(|s| s.as_str()).unwrap_or("help");

    match command {
        "load" | "validate" | "predict" => {
            let config = loader_config::load();
            if let Err(e) = init_logging(&config.log) {
                eprintln!("Logging setup failed: {}", e);
            }
            let code = run_model_command(command, &args, &config).await;
            ExitCode::from(code as u8)
        }
        "config" => {
            let subcommand = args.get(2).map(|s| s.as_str()).unwrap_or("show");
            match subcommand {
                "show" => {
                    config_cmd::run_show();
                    ExitCode::SUCCESS
                }
                "defaults" => {
                    config_cmd::run_defaults();
                    ExitCode::SUCCESS
                }
                "validate" => {
                    let code = config_cmd::run_validate();
                    ExitCode::from(code as u8)
                }
                _ => {
                    eprintln!("Unknown config subcommand: {}", subcommand);
                    print_command_help("config");
                    ExitCode::FAILURE
                }
            }
        }
        "help" | "--help" | "-h" => {
            if let Some(subcommand) = args.get(2) {
                print_command_help(subcommand);
            } else {
                print_usage();
            }
            ExitCode::SUCCESS
        }
        "version" | "--version" | "-V" => {
            println!("model-loader {}", env!("CARGO_PKG_VERSION"));
            ExitCode::SUCCESS
        }
        _ => {
            eprintln!("Unknown command: {}", command);
            print_usage();
            ExitCode::FAILURE
        }
    }
}

struct ModelArgs {
    model: Option<String>,
    text: Option<String>,
}

fn parse_model_args(args: &[String]) -> Result<ModelArgs, String> {
    let mut parsed = ModelArgs { model: None, text: None };

    let mut i = 2;
    while i < args.len() {
        match args[i].as_str() {
            "--model" => {
                let value = args.get(i + 1).ok_or("Missing value for --model")?;
                parsed.model = Some(value.clone());
                i += 2;
            }
            "--text" => {
                let value = args.get(i + 1).ok_or("Missing value for --text")?;
                parsed.text = Some(value.clone());
                i += 2;
            }
            other => return Err(format!("Unknown argument: {}", other)),
        }
    }
    Ok(parsed)
}

async fn run_model_command(command: &str, args: &[String], config: &EnvConfig) -> i32 {
    let parsed = match parse_model_args(args) {
        Ok(parsed) => parsed,
        Err(e) => {
            eprintln!("{}", e);
            print_command_help(command);
            return 2;
        }
    };

    let service = match ModelService::from_config(config) {
        Ok(service) => service,
        Err(e) => {
            eprintln!("Failed to initialize model service: {}", e);
            return EXIT_SETUP_FAILURE;
        }
    };

    let model = parsed.model.as_deref();
    match command {
        "load" => cli::run_load(&service, model).await,
        "validate" => cli::run_validate(&service, model).await,
        _ => match parsed.text {
            Some(text) => cli::run_predict(&service, &text, model).await,
            None => {
                eprintln!("Usage: model-loader-cli predict --text <TEXT> [--model <NAME>]");
                2
            }
        },
    }
}

fn print_usage() {
    let version = env!("CARGO_PKG_VERSION");
    eprintln!(
        "model-loader-cli v{}

USAGE:
    model-loader-cli [COMMAND] [OPTIONS]

COMMANDS:
    load         Download, deserialize and cache a model
    validate     Check that a model exists without downloading it
    predict      Predict the intent of a text
    config       Manage configuration (show, defaults, validate)
    version      Show version information
    help         Show this help message

EXAMPLES:
    model-loader-cli load
    model-loader-cli load --model model_2.0.0.mlmodel
    model-loader-cli validate
    model-loader-cli predict --text \"hello there\"
    MEMORY_ONLY_MODE=True model-loader-cli load

ENVIRONMENT:
    BASE_MODEL_NAME                Model used when --model is omitted
    MEMORY_ONLY_MODE               Stream into memory instead of temp files
    MODEL_LOADER_STORAGE_MANIFEST  Storage layout manifest (TOML)
    MODEL_LOADER_LOG_LEVEL         Log filter (info, debug, model_loader=trace)

EXIT CODES:
    0  Success
    1  Load or prediction failed
    2  Usage error
    3  Service setup failed (manifest, HTTP client)
",
        version
    );
}

fn print_command_help(command: &str) {
    match command {
        "load" => {
            eprintln!(
                "model-loader-cli load - Load a model

USAGE:
    model-loader-cli load [--model <NAME>]

DESCRIPTION:
    Resolves the model URL, streams the artifact in 1 MiB chunks into
    scratch storage, deserializes it and prints the load summary as JSON.
"
            );
        }
        "validate" => {
            eprintln!(
                "model-loader-cli validate - Validate a model

USAGE:
    model-loader-cli validate [--model <NAME>]

DESCRIPTION:
    Sends a HEAD request for the model and prints the metadata taken from
    the response headers. Without --model the base model is validated.
"
            );
        }
        "predict" => {
            eprintln!(
                "model-loader-cli predict - Predict an intent

USAGE:
    model-loader-cli predict --text <TEXT> [--model <NAME>]

DESCRIPTION:
    Loads the model on demand and prints the intent and per-class
    probabilities as JSON.
"
            );
        }
        "config" => {
            eprintln!(
                "model-loader-cli config - Configuration

USAGE:
    model-loader-cli config [show|defaults|validate]

SUBCOMMANDS:
    show      Print the effective configuration
    defaults  Print default values
    validate  Check the storage manifest and scratch directory
"
            );
        }
        _ => print_usage(),
    }
}
