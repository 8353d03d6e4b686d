use clap::{Args as ClapArgs, Parser, Subcommand, ValueEnum};
use serde::{Deserialize, Serialize};

/// Command line arguments for KhiTerm
#[derive(Parser, Debug)]
#[command(
    name = "khiterm",
    version = env!("CARGO_PKG_VERSION"),
    about = "Terminal for the Kawasaki AS monitor shell",
    long_about = "Connects to a Kawasaki robot controller's AS monitor over TCP, logs in, and exchanges shell commands or reads and writes real variables."
)]
pub struct Args {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress logging
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Configuration file path
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    /// Controller address, overrides the configuration
    #[arg(long, global = true)]
    pub host: Option<String>,

    /// Controller port, overrides the configuration
    #[arg(short, long, global = true)]
    pub port: Option<u16>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    pub output: OutputFormat,

    /// Command to execute
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Interactive AS monitor session
    Terminal,
    /// Real variable commands
    Var(VarArgs),
    /// Configuration management commands
    Config(ConfigArgs),
    /// Display version information
    Version,
}

/// Output format options
#[derive(ValueEnum, Debug, Clone, Default, Serialize, Deserialize)]
pub enum OutputFormat {
    /// Human-readable text output
    #[default]
    Text,
    /// JSON output
    Json,
    /// Table output
    Table,
    /// CSV output
    Csv,
}

/// Real variable arguments
#[derive(ClapArgs, Debug)]
pub struct VarArgs {
    /// Variable subcommand
    #[command(subcommand)]
    pub command: VarCommand,
}

/// Configuration management arguments
#[derive(ClapArgs, Debug)]
pub struct ConfigArgs {
    /// Config subcommand
    #[command(subcommand)]
    pub command: ConfigCommand,
}

/// Real variable subcommands
#[derive(Subcommand, Debug)]
pub enum VarCommand {
    /// Read a variable from the controller
    Get {
        /// Variable name
        name: String,
    },
    /// Assign a variable on the controller
    Set {
        /// Variable name
        name: String,
        /// New value
        #[arg(allow_negative_numbers = true)]
        value: f64,
    },
    /// Nudge a variable by its configured step and read it back
    Adjust {
        /// Variable name
        name: String,
        /// Amount to add instead of the preset step
        #[arg(long, allow_negative_numbers = true)]
        by: Option<f64>,
        /// Subtract instead of add
        #[arg(long)]
        down: bool,
    },
    /// Read every configured variable
    List,
}

/// Configuration subcommands
#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// Show current configuration
    Show,
    /// Validate configuration file
    Validate {
        /// Configuration file to validate
        file: Option<String>,
    },
    /// Initialize configuration
    Init {
        /// Directory to create `.khiterm/config.toml` in
        #[arg(long)]
        dir: Option<String>,
        /// Write the global configuration instead
        #[arg(long)]
        global: bool,
    },
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Text => write!(f, "text"),
            OutputFormat::Json => write!(f, "json"),
            OutputFormat::Table => write!(f, "table"),
            OutputFormat::Csv => write!(f, "csv"),
        }
    }
}
