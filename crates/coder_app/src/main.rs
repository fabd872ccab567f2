mod commands;
mod config;
mod effects;
mod logging;

use std::io;
use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use coder_engine::formats::FileFormat;
use coder_logging::{coder_info, coder_warn};

use crate::commands::CodeArgs;
use crate::config::{AppConfig, ConfigError, DEFAULT_CONFIG_FILE};

#[derive(Parser)]
#[command(name = "coder", about = "Assign classification codes to free-text job records")]
struct Cli {
    /// Path to the RON configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Directory holding the persisted coding state
    #[arg(long, global = true)]
    storage_dir: Option<PathBuf>,

    /// Classification endpoint, overriding the configuration
    #[arg(long, global = true)]
    classifier_url: Option<String>,

    /// Session service base URL, overriding the configuration
    #[arg(long, global = true)]
    session_url: Option<String>,

    /// Log at debug level
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Load a job file into a new session, classify it and write the result
    Code {
        /// Job file to ingest
        input: PathBuf,

        /// Layout of the input file
        #[arg(long, value_enum, default_value_t = Layout::Csv)]
        format: Layout,

        /// Layout of the output file
        #[arg(long, value_enum, default_value_t = Layout::Fixed)]
        output_format: Layout,

        /// The input starts with a header row
        #[arg(long)]
        header: bool,

        /// Output path; defaults to a timestamped file next to the input
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Accept confident top suggestions automatically
        #[arg(long)]
        autocode: bool,
    },

    /// Continue the last session stored by the session service
    Resume {
        /// Accept confident top suggestions automatically
        #[arg(long)]
        autocode: bool,
    },

    /// Summarise the locally stored session
    Status {
        /// Also list every visible job
        #[arg(long)]
        list: bool,
    },

    /// Code the stored session with key names read from stdin
    Review,

    /// Forget all locally stored state
    Clear,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Layout {
    Csv,
    Tsv,
    Semicolon,
    Fixed,
}

impl Layout {
    fn file_format(self, has_header: bool) -> FileFormat {
        let delimited = |delimiter| FileFormat::Delimited {
            delimiter,
            has_header,
        };
        match self {
            Layout::Csv => delimited(','),
            Layout::Tsv => delimited('\t'),
            Layout::Semicolon => delimited(';'),
            Layout::Fixed => FileFormat::FixedWidth,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config_path = cli
        .config
        .clone()
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE));
    let (mut config, config_error) = match AppConfig::load(&config_path) {
        Ok(config) => (config, None),
        Err(err) => (AppConfig::default(), Some(err)),
    };
    logging::initialize(config.log_destination, cli.verbose);
    match config_error {
        None => coder_info!("Loaded configuration from {:?}", config_path),
        Some(ConfigError::NotFound(_)) if cli.config.is_none() => {
            coder_info!("No {} found, using defaults", DEFAULT_CONFIG_FILE)
        }
        Some(err) => coder_warn!("{}; using defaults", err),
    }

    if let Some(dir) = cli.storage_dir {
        config.storage_dir = dir;
    }
    if let Some(url) = cli.classifier_url {
        config.classifier_url = url;
    }
    if let Some(url) = cli.session_url {
        config.session_url = Some(url);
    }

    match cli.command {
        Commands::Code {
            input,
            format,
            output_format,
            header,
            output,
            autocode,
        } => {
            let args = CodeArgs {
                input,
                format: format.file_format(header),
                output,
                output_format: output_format.file_format(header),
                autocode,
            };
            commands::run_code(&config, args).await
        }
        Commands::Resume { autocode } => commands::run_resume(&config, autocode).await,
        Commands::Status { list } => commands::run_status(&config, list),
        Commands::Review => commands::run_review(&config, io::stdin().lock()).await,
        Commands::Clear => commands::run_clear(&config).await,
    }
}
