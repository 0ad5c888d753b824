//! Argument parsing and command dispatch.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::anyhow;
use clap::{Args, Parser, Subcommand, ValueEnum};
use loqui_sync::SyncConfig;
use loqui_telemetry::{CommandSpanGuard, LogFormat, LoggingConfig, init_logging};
use reqwest::{Client, Url};

use crate::client::{AppContext, CliError, CliResult, parse_url};
use crate::commands::generate::handle_generate;
use crate::commands::history::{handle_history_clear, handle_history_delete, handle_history_list};
use crate::commands::models::{handle_models_list, handle_models_load, handle_models_unload};
use crate::commands::stats::{handle_stats, handle_system};
use crate::commands::watch::handle_watch;

const DEFAULT_API_URL: &str = "http://127.0.0.1:8000/api";
const DEFAULT_TIMEOUT_SECS: u64 = 300;

/// Parses CLI arguments, executes the requested command, and returns the
/// process exit code.
pub async fn run() -> i32 {
    let cli = Cli::parse();
    if let Err(err) = init_logging(&LoggingConfig {
        level: &cli.log_level,
        format: cli.log_format,
        build_sha: env!("CARGO_PKG_VERSION"),
    }) {
        eprintln!("warning: {err:#}");
    }
    let _span = CommandSpanGuard::enter(command_label(&cli.command));

    match dispatch(cli).await {
        Ok(()) => 0,
        Err(err) => {
            eprintln!("error: {}", err.display_message());
            err.exit_code()
        }
    }
}

async fn dispatch(cli: Cli) -> CliResult<()> {
    let client = Client::builder()
        .timeout(Duration::from_secs(cli.timeout))
        .build()
        .map_err(|err| CliError::failure(anyhow!("failed to build HTTP client: {err}")))?;
    let config = SyncConfig {
        api_base: cli.api_url.to_string(),
        ..SyncConfig::default()
    };
    config
        .validate()
        .map_err(|err| CliError::validation(err.to_string()))?;
    let ctx = AppContext::new(client, cli.api_url, config);

    match cli.command {
        Command::Models(models) => match models {
            ModelsCommand::List => handle_models_list(&ctx, cli.output).await,
            ModelsCommand::Load(args) => handle_models_load(&ctx, args).await,
            ModelsCommand::Unload => handle_models_unload(&ctx).await,
        },
        Command::Generate(args) => handle_generate(&ctx, args, cli.output).await,
        Command::History(history) => match history {
            HistoryCommand::List(args) => handle_history_list(&ctx, args, cli.output).await,
            HistoryCommand::Delete(args) => handle_history_delete(&ctx, args).await,
            HistoryCommand::Clear(args) => handle_history_clear(&ctx, args).await,
        },
        Command::Stats(args) => handle_stats(&ctx, args, cli.output).await,
        Command::System => handle_system(&ctx, cli.output).await,
        Command::Watch(args) => handle_watch(&ctx, args).await,
    }
}

#[derive(Parser)]
#[command(name = "loqui", about = "Terminal client for a Loqui TTS backend")]
pub(crate) struct Cli {
    #[arg(
        long,
        global = true,
        env = "LOQUI_API_URL",
        value_parser = parse_url,
        default_value = DEFAULT_API_URL
    )]
    pub(crate) api_url: Url,
    #[arg(
        long,
        global = true,
        env = "LOQUI_HTTP_TIMEOUT_SECS",
        default_value_t = DEFAULT_TIMEOUT_SECS
    )]
    pub(crate) timeout: u64,
    #[arg(
        long = "output",
        alias = "format",
        global = true,
        value_enum,
        default_value_t = OutputFormat::Table,
        help = "Select output format for commands that render structured data"
    )]
    pub(crate) output: OutputFormat,
    #[arg(long, global = true, env = "LOQUI_LOG", default_value = loqui_telemetry::DEFAULT_LOG_LEVEL)]
    pub(crate) log_level: String,
    #[arg(long, global = true, env = "LOQUI_LOG_FORMAT", default_value = "pretty")]
    pub(crate) log_format: LogFormat,
    #[command(subcommand)]
    pub(crate) command: Command,
}

#[derive(Subcommand)]
pub(crate) enum Command {
    /// Inspect and load models.
    #[command(subcommand)]
    Models(ModelsCommand),
    /// Synthesize speech.
    Generate(GenerateArgs),
    /// Browse and prune past generations.
    #[command(subcommand)]
    History(HistoryCommand),
    /// Usage statistics over the history.
    Stats(StatsArgs),
    /// Host and runtime facts.
    System,
    /// Follow live model status changes.
    Watch(WatchArgs),
}

#[derive(Subcommand)]
pub(crate) enum ModelsCommand {
    /// Show every variant with its status.
    List,
    /// Download and load a variant.
    Load(LoadArgs),
    /// Unload the resident model.
    Unload,
}

#[derive(Subcommand)]
pub(crate) enum HistoryCommand {
    /// List generations, newest first.
    List(HistoryListArgs),
    /// Delete one generation.
    Delete(HistoryDeleteArgs),
    /// Delete every generation.
    Clear(HistoryClearArgs),
}

#[derive(Args, Debug, Clone)]
pub(crate) struct LoadArgs {
    pub(crate) variant: String,
    /// Block until the model is loaded.
    #[arg(long)]
    pub(crate) wait: bool,
    /// Give up waiting after this many seconds.
    #[arg(long, default_value_t = 900)]
    pub(crate) wait_timeout_secs: u64,
}

#[derive(Args, Debug, Clone)]
pub(crate) struct GenerateArgs {
    /// Text to speak.
    #[arg(conflicts_with = "text_file")]
    pub(crate) text: Option<String>,
    /// Read the text from a file.
    #[arg(long = "file")]
    pub(crate) text_file: Option<PathBuf>,
    /// Variant to use; defaults to the loaded one.
    #[arg(long)]
    pub(crate) variant: Option<String>,
    /// Load the variant first if needed.
    #[arg(long)]
    pub(crate) load: bool,
    #[arg(long)]
    pub(crate) language: Option<String>,
    #[arg(long)]
    pub(crate) exaggeration: Option<f64>,
    #[arg(long)]
    pub(crate) cfg_weight: Option<f64>,
    #[arg(long)]
    pub(crate) temperature: Option<f64>,
    #[arg(long)]
    pub(crate) speed: Option<f64>,
    /// Reference voice clip for cloning.
    #[arg(long)]
    pub(crate) reference: Option<PathBuf>,
    /// Transcript of the reference clip.
    #[arg(long)]
    pub(crate) ref_text: Option<String>,
    /// Save the generated audio here.
    #[arg(long, short = 'o')]
    pub(crate) save: Option<PathBuf>,
}

#[derive(Args, Debug, Clone)]
pub(crate) struct HistoryListArgs {
    #[arg(long, default_value_t = 50)]
    pub(crate) limit: u32,
    #[arg(long, default_value_t = 0)]
    pub(crate) offset: u32,
}

#[derive(Args, Debug, Clone)]
pub(crate) struct HistoryDeleteArgs {
    pub(crate) id: String,
}

#[derive(Args, Debug, Clone)]
pub(crate) struct HistoryClearArgs {
    /// Required; clearing cannot be undone.
    #[arg(long)]
    pub(crate) yes: bool,
}

#[derive(Args, Debug, Clone)]
pub(crate) struct StatsArgs {
    /// Page through the whole history instead of the newest page.
    #[arg(long)]
    pub(crate) all: bool,
}

#[derive(Args, Debug, Clone)]
pub(crate) struct WatchArgs {
    /// Also poll model status on the regular interval.
    #[arg(long)]
    pub(crate) poll: bool,
}

#[derive(Copy, Clone, Debug, ValueEnum, PartialEq, Eq)]
pub(crate) enum OutputFormat {
    Table,
    Json,
}

const fn command_label(command: &Command) -> &'static str {
    match command {
        Command::Models(ModelsCommand::List) => "models_list",
        Command::Models(ModelsCommand::Load(_)) => "models_load",
        Command::Models(ModelsCommand::Unload) => "models_unload",
        Command::Generate(_) => "generate",
        Command::History(HistoryCommand::List(_)) => "history_list",
        Command::History(HistoryCommand::Delete(_)) => "history_delete",
        Command::History(HistoryCommand::Clear(_)) => "history_clear",
        Command::Stats(_) => "stats",
        Command::System => "system",
        Command::Watch(_) => "watch",
    }
}
