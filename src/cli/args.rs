//! CLI argument definitions using clap.

use clap::{Parser, Subcommand, ValueEnum};
use clap_complete::Shell;

/// Probe LLM HTTP APIs from declarative provider definitions.
#[derive(Parser, Debug)]
#[command(name = "llmprobe")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    // === Global flags ===
    /// Output format
    #[arg(long, value_enum, default_value = "human", global = true)]
    pub format: OutputFormat,

    /// Shorthand for --format json
    #[arg(long, global = true)]
    pub json: bool,

    /// Pretty-print JSON output
    #[arg(long, global = true)]
    pub pretty: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Log level
    #[arg(long, value_name = "LEVEL", global = true)]
    pub log_level: Option<String>,

    /// Emit JSONL logs to stderr
    #[arg(long, global = true)]
    pub json_output: bool,

    /// Verbose output (sets log level to debug)
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

impl Cli {
    /// Resolve the effective output format.
    #[must_use]
    pub const fn effective_format(&self) -> OutputFormat {
        if self.json {
            OutputFormat::Json
        } else {
            self.format
        }
    }
}

/// Available commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List known providers, or show one definition
    Providers(ProvidersArgs),

    /// Connectivity check against a provider's base URL
    Ping(ProbeArgs),

    /// Fetch a provider's model catalog
    Models(ProbeArgs),

    /// Run the minimal generation test call
    Call(ProbeArgs),

    /// Full probe: ping, model catalog, then the test call
    Probe(ProbeArgs),

    /// Generate shell completions
    Completions {
        /// Target shell
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Output format for probe results.
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable summary
    Human,
    /// JSON run records
    Json,
}

/// Arguments for the `providers` command.
#[derive(Parser, Debug)]
pub struct ProvidersArgs {
    /// Provider id to show; omit to list all
    #[arg(value_name = "ID")]
    pub id: Option<String>,
}

/// Arguments shared by the probing commands.
#[derive(Parser, Debug)]
pub struct ProbeArgs {
    /// Provider id (see `llmprobe providers`)
    #[arg(value_name = "PROVIDER")]
    pub provider: String,

    /// API key, passed through to the provider verbatim
    #[arg(long, env = "LLMPROBE_API_KEY", default_value = "", hide_env_values = true)]
    pub api_key: String,

    /// Model override
    #[arg(long, value_name = "MODEL")]
    pub model: Option<String>,

    /// Prompt override for the test call
    #[arg(long, value_name = "TEXT")]
    pub prompt: Option<String>,

    /// Base URL override
    #[arg(long, value_name = "URL")]
    pub base_url: Option<String>,

    /// Request timeout in milliseconds
    #[arg(long, value_name = "MS")]
    pub timeout_ms: Option<u64>,

    /// Route requests through the configured relay
    #[arg(long)]
    pub proxy: bool,

    /// Relay base URL (implies --proxy)
    #[arg(long, value_name = "URL")]
    pub proxy_url: Option<String>,
}
