use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "reportdeck")]
#[command(version, about = "Upload, search and download diagnostic reports", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Verbose output (info-level logs on stderr)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Probability (0.0 - 1.0) that a simulated upload is rejected
    #[arg(long, global = true, value_name = "P")]
    pub fail_rate: Option<f64>,

    /// Skip the simulated network latency
    #[arg(long, global = true)]
    pub fast: bool,

    /// Directory holding config.json
    #[arg(long, global = true, env = "REPORTDECK_HOME", value_name = "DIR")]
    pub home: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List reports
    #[command(alias = "ls")]
    List {
        /// Only show reports whose name contains this text
        #[arg(short, long)]
        search: Option<String>,
    },

    /// Upload one or more PDF or CSV files
    #[command(alias = "up")]
    Upload {
        #[arg(required = true, num_args = 1..)]
        files: Vec<PathBuf>,
    },

    /// Download a report by name
    #[command(alias = "dl")]
    Download {
        /// Exact report name, e.g. motor_thermal_B.csv
        name: String,

        /// Directory to write the report manifest into (defaults to the current directory)
        #[arg(short, long)]
        out: Option<PathBuf>,
    },

    /// Show or change configuration
    Config {
        /// Field name, e.g. debounce_ms
        key: Option<String>,

        /// New value; written to config.json
        value: Option<String>,
    },

    /// Interactive session over a single in-memory deck (default)
    Shell,
}
