use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "vietsent")]
#[command(author, version, about = "Vietnamese sentiment classification service")]
#[command(propagate_version = true)]
pub struct Cli {
    /// Configuration file path
    #[arg(short, long, default_value = "vietsent.yaml", env = "VIETSENT_CONFIG", global = true)]
    pub config: String,

    /// Model identifier: HuggingFace repo, local directory or "builtin"
    #[arg(long, env = "SENTIMENT_MODEL_NAME", global = true)]
    pub model: Option<String>,

    /// Minimum input length in characters
    #[arg(long, env = "MIN_TEXT_LENGTH", global = true)]
    pub min_text_length: Option<usize>,

    /// History database path
    #[arg(long, env = "SQLITE_PATH", global = true)]
    pub sqlite_path: Option<PathBuf>,

    /// Records kept in history (0 or negative keeps everything)
    #[arg(long, env = "HISTORY_SOFT_LIMIT", allow_negative_numbers = true, global = true)]
    pub history_limit: Option<i64>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    pub json_logs: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the HTTP API and web UI
    Serve {
        /// Listen address
        #[arg(short = 'l', long)]
        listen: Option<String>,

        /// Listen port
        #[arg(short = 'P', long)]
        port: Option<u16>,

        /// Allowed CORS origins (comma-separated, empty allows any)
        #[arg(long, env = "ALLOWED_CORS_ORIGINS")]
        allowed_origins: Option<String>,
    },

    /// Classify one text and record it in history
    Classify {
        /// Text to classify
        text: String,
    },

    /// Print recent classifications, newest first
    History {
        /// Number of records
        #[arg(short = 'n', long, default_value = "20")]
        limit: usize,
    },

    /// Remove all recorded classifications
    ClearHistory,

    /// Run the fixed Vietnamese evaluation set against the configured model
    Evaluate,
}
