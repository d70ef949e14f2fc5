//! llmprobe - Provider probing for LLM HTTP APIs
//!
//! CLI entry point.

#![forbid(unsafe_code)]
#![warn(clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

use clap::{CommandFactory, Parser};
use std::process::ExitCode;

use llmprobe::cli::{Cli, Commands};
use llmprobe::cli::probe::{self, Operation};
use llmprobe::core::logging;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = cli
        .log_level
        .as_deref()
        .and_then(logging::LogLevel::from_arg)
        .or_else(|| logging::parse_log_level_from_env().map(logging::LogLevel::from_tracing_level))
        .unwrap_or_default();
    let log_format = if cli.json_output {
        logging::LogFormat::Json
    } else {
        logging::parse_log_format_from_env().unwrap_or_default()
    };
    let log_file = logging::parse_log_file_from_env();
    logging::init(log_level, log_format, log_file, cli.verbose);

    let format = cli.effective_format();
    let no_color = cli.no_color || std::env::var_os("NO_COLOR").is_some();
    if no_color {
        colored::control::set_override(false);
    }

    let result = run(cli, no_color).await;

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{}", e);
            eprintln!("{}", llmprobe::render::render_error(&e, format, no_color));
            ExitCode::from(e.exit_code() as u8)
        }
    }
}

async fn run(cli: Cli, no_color: bool) -> llmprobe::Result<()> {
    let format = cli.effective_format();
    let pretty = cli.pretty;

    match cli.command {
        None => {
            print_quickstart();
            Ok(())
        }

        Some(Commands::Providers(args)) => {
            llmprobe::cli::providers::execute(&args, format, pretty, no_color)
        }

        Some(Commands::Ping(args)) => {
            probe::execute(Operation::Ping, &args, format, pretty, no_color).await
        }

        Some(Commands::Models(args)) => {
            probe::execute(Operation::Models, &args, format, pretty, no_color).await
        }

        Some(Commands::Call(args)) => {
            probe::execute(Operation::Call, &args, format, pretty, no_color).await
        }

        Some(Commands::Probe(args)) => {
            probe::execute(Operation::Full, &args, format, pretty, no_color).await
        }

        Some(Commands::Completions { shell }) => {
            clap_complete::generate(shell, &mut Cli::command(), "llmprobe", &mut std::io::stdout());
            Ok(())
        }
    }
}

/// Print quickstart help when no command is given.
fn print_quickstart() {
    println!(
        r#"llmprobe - Probe LLM HTTP APIs

Check connectivity, list models, and run a minimal generation test against
any provider from a declarative definition.

USAGE:
    llmprobe [OPTIONS] <COMMAND>

COMMANDS:
    providers    List known providers, or show one definition
    ping         Connectivity check against a provider's base URL
    models       Fetch a provider's model catalog
    call         Run the minimal generation test call
    probe        Full probe: ping, models, then the test call

QUICK START:
    llmprobe providers                          # See what is configured
    llmprobe ping openai                        # Reachability only
    llmprobe models openai --api-key sk-...     # List the catalog
    llmprobe call openai --api-key sk-...       # One tiny completion
    llmprobe probe custom --base-url https://gw.example.com/v1 --api-key sk-...

ROBOT MODE (for scripts):
    llmprobe call openai --json                 # JSON run record
    llmprobe probe openai --json --pretty       # Full report, pretty JSON

The API key can also come from the LLMPROBE_API_KEY environment variable.

For more help: llmprobe --help
"#
    );

    println!("Version: {}", env!("CARGO_PKG_VERSION"));
}
