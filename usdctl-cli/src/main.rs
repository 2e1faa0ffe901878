//! usdctl CLI - batch converter between binary and text USD scene files
//!
//! This is the main entry point for the usdctl command-line tool, which
//! wraps the external `usdcat` converter with:
//! - Single-file conversion in either direction (`convert`)
//! - Recursive directory conversion with bounded parallelism (`batch`)
//! - Read-through previews materialized in the temp directory (`open`)
//! - Configuration management (`config`) and shell completions

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use tracing::info;
use tracing_subscriber::EnvFilter;

use usdctl_core::{
    convert_one, convert_to_dir, enumerate, launch_viewer, run_batch, BatchResult, CancelToken,
    ConversionTask, Converter, Invoker, UsdConfig, UsdFormat,
};

mod config_cmd;
mod ui;

#[derive(Parser, Debug)]
#[command(
    name = "usdctl",
    author,
    version,
    about = "Convert USD scene files between binary (.usdc) and text (.usda) form",
    long_about = "Batch-oriented wrapper around the external `usdcat` converter: convert \
                  single files, sweep whole directory trees with bounded parallelism, or \
                  materialize temporary text previews of binary stages."
)]
struct Cli {
    /// Suppress progress bars (for script/LLM consumption)
    #[arg(long, short = 'q', global = true)]
    quiet: bool,

    /// Root of the USD install (overrides config file and USDCTL_USD_ROOT)
    #[arg(long, global = true, value_name = "DIR")]
    usd_root: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Convert one file to its counterpart form beside the input
    Convert(ConvertArgs),
    /// Recursively convert every matching file under a directory
    Batch(BatchArgs),
    /// Materialize a temporary converted copy and print (or view) its path
    Open(OpenArgs),
    /// Manage usdctl configuration (init, path, list, validate)
    Config(config_cmd::ConfigArgs),
    /// Generate shell completion scripts
    Completions(CompletionsArgs),
}

#[derive(Parser, Debug)]
struct ConvertArgs {
    /// Input file (.usdc or .usda)
    input: PathBuf,

    /// Output path (default: sibling with the counterpart extension)
    #[arg(long = "out", value_name = "PATH")]
    output: Option<PathBuf>,
}

#[derive(Parser, Debug)]
struct BatchArgs {
    /// Directory to scan recursively
    root: PathBuf,

    /// Source representation to look for
    #[arg(long, value_enum, default_value = "usdc")]
    from: SourceFormat,

    /// Concurrent conversions (overrides config file and USDCTL_WORKERS)
    #[arg(long, value_name = "N")]
    workers: Option<usize>,

    /// Summary output format
    #[arg(long, value_enum, default_value = "text")]
    format: OutputFormat,
}

#[derive(Parser, Debug)]
struct OpenArgs {
    /// Input file to preview in its counterpart form
    input: PathBuf,

    /// Launch the configured viewer on the converted copy
    #[arg(long)]
    view: bool,
}

#[derive(Parser, Debug)]
struct CompletionsArgs {
    /// Shell to generate completions for
    #[arg(value_enum)]
    shell: Shell,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
enum SourceFormat {
    Usdc,
    Usda,
}

impl From<SourceFormat> for UsdFormat {
    fn from(format: SourceFormat) -> Self {
        match format {
            SourceFormat::Usdc => UsdFormat::Binary,
            SourceFormat::Usda => UsdFormat::Text,
        }
    }
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
enum OutputFormat {
    Text,
    Json,
}

#[derive(ValueEnum, Debug, Clone, Copy)]
#[allow(clippy::enum_variant_names)] // PowerShell is a proper noun
enum Shell {
    Bash,
    Zsh,
    Fish,
    PowerShell,
    Elvish,
}

fn init_tracing() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .compact()
        .try_init()
        .map_err(|err| anyhow!(err))
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing().ok();
    let cli = Cli::parse();

    // Initialize UI quiet mode from flag, env var, and TTY detection
    ui::init_quiet_mode(cli.quiet);

    match cli.command {
        Commands::Convert(args) => run_convert(&load_config(cli.usd_root)?, args).await?,
        Commands::Batch(args) => run_batch_cmd(&load_config(cli.usd_root)?, args).await?,
        Commands::Open(args) => run_open(&load_config(cli.usd_root)?, args).await?,
        Commands::Config(args) => config_cmd::run_config(args)?,
        Commands::Completions(args) => run_completions(args)?,
    }
    Ok(())
}

/// Config file plus `USDCTL_*` env, with the global flag winning over both.
fn load_config(usd_root_flag: Option<PathBuf>) -> Result<UsdConfig> {
    let mut config = UsdConfig::load()?;
    if let Some(usd_root) = usd_root_flag {
        config.usd_root = Some(usd_root);
    }
    Ok(config)
}

fn build_invoker(config: &UsdConfig) -> Result<Invoker> {
    let mut invoker = Invoker::new(config.require_usd_root()?);
    if let Some(secs) = config.timeout_secs {
        invoker = invoker.with_timeout(Duration::from_secs(secs));
    }
    Ok(invoker)
}

async fn run_convert(config: &UsdConfig, args: ConvertArgs) -> Result<()> {
    let invoker = build_invoker(config)?;

    let output = match args.output {
        Some(output) => {
            // Explicit output path: validate the input, honor the override.
            let task = ConversionTask {
                input: args.input.clone(),
                output,
            };
            UsdFormat::from_path(&task.input)?;
            invoker.convert(&task.input, &task.output).await?;
            task.output
        }
        None => convert_one(&invoker, &args.input).await?.output,
    };

    println!("{}", output.display());
    Ok(())
}

async fn run_open(config: &UsdConfig, args: OpenArgs) -> Result<()> {
    let invoker = build_invoker(config)?;

    let task = convert_to_dir(&invoker, &args.input, &std::env::temp_dir())
        .await
        .context("failed to materialize preview copy")?;

    println!("{}", task.output.display());

    if args.view {
        let viewer = config.viewer.as_deref().unwrap_or("usdview");
        launch_viewer(viewer, &task.output);
    }
    Ok(())
}

async fn run_batch_cmd(config: &UsdConfig, args: BatchArgs) -> Result<()> {
    let invoker = build_invoker(config)?;
    let workers = match args.workers {
        Some(workers) => workers,
        None => config.require_workers()?,
    };

    let root = args
        .root
        .canonicalize()
        .with_context(|| format!("cannot resolve {:?}", args.root))?;
    let format: UsdFormat = args.from.into();

    let files = enumerate(&root, format)?;
    let tasks = files
        .iter()
        .map(|file| ConversionTask::sibling(file))
        .collect::<usdctl_core::Result<Vec<_>>>()?;

    info!(
        root = %root.display(),
        files = tasks.len(),
        workers,
        "converting .{} tree",
        format.extension()
    );

    // Ctrl-C lets in-flight conversions finish and stops new claims.
    let cancel = CancelToken::new();
    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                eprintln!("cancellation requested, letting in-flight conversions finish...");
                cancel.cancel();
            }
        });
    }

    let progress = ui::BatchProgress::new(tasks.len(), &root);
    let result = run_batch(&invoker, &tasks, workers, &cancel, &progress).await?;
    progress.finish();

    print_summary(&result, args.format, cancel.is_cancelled())?;

    if result.failed > 0 {
        std::process::exit(1);
    }
    Ok(())
}

fn print_summary(result: &BatchResult, format: OutputFormat, cancelled: bool) -> Result<()> {
    match format {
        OutputFormat::Text => {
            println!(
                "Converted {}/{} file(s) in {:.1}s ({} failed, {} not attempted)",
                result.succeeded,
                result.total,
                result.elapsed.as_secs_f64(),
                result.failed,
                result.not_attempted,
            );
            if cancelled {
                println!("Batch was cancelled before completion.");
            }
            for failure in &result.failures {
                eprintln!(
                    "  failed: {}: {}",
                    failure.input.display(),
                    failure.error.as_deref().unwrap_or("unknown error")
                );
            }
        }
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(result)?);
        }
    }
    Ok(())
}

fn run_completions(args: CompletionsArgs) -> Result<()> {
    use clap::CommandFactory;
    use clap_complete::{generate, Shell as CompletionShell};
    use std::io;

    let mut cmd = Cli::command();
    let bin_name = cmd.get_name().to_string();

    let shell = match args.shell {
        Shell::Bash => CompletionShell::Bash,
        Shell::Zsh => CompletionShell::Zsh,
        Shell::Fish => CompletionShell::Fish,
        Shell::PowerShell => CompletionShell::PowerShell,
        Shell::Elvish => CompletionShell::Elvish,
    };

    generate(shell, &mut cmd, bin_name, &mut io::stdout());

    Ok(())
}
