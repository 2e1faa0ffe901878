use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use usdctl_core::UsdConfig;

#[derive(Parser, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommands,
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Write a starter config file
    Init(InitArgs),
    /// Show config file path
    Path,
    /// List all config values
    List,
    /// Validate paths and required settings
    Validate,
}

#[derive(Parser, Debug)]
pub struct InitArgs {
    /// Force overwrite existing config
    #[arg(long, short)]
    pub force: bool,
}

pub fn run_config(args: ConfigArgs) -> Result<()> {
    match args.command {
        ConfigCommands::Init(args) => run_init(args),
        ConfigCommands::Path => run_path(),
        ConfigCommands::List => run_list(),
        ConfigCommands::Validate => run_validate(),
    }
}

fn run_init(args: InitArgs) -> Result<()> {
    let config_path = UsdConfig::config_path();

    if config_path.exists() && !args.force {
        return Err(anyhow::anyhow!(
            "Config already exists at {:?}\n\nUse --force to overwrite",
            config_path
        ));
    }

    if let Some(parent) = config_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    // Suggested pool size: one worker per core, capped so a big machine
    // does not hammer the filesystem.
    let workers = num_cpus::get().min(8);
    let template = format!(
        "# usdctl configuration\n\
         \n\
         # Root of the USD install (contains bin/, lib/, lib/python).\n\
         # usd_root = \"/opt/usd\"\n\
         \n\
         # Concurrent conversions per batch.\n\
         workers = {workers}\n\
         \n\
         # Viewer executable for `usdctl open --view`.\n\
         # viewer = \"usdview\"\n\
         \n\
         # Per-invocation timeout, seconds.\n\
         # timeout_secs = 300\n"
    );

    std::fs::write(&config_path, template)
        .context(format!("Failed to write config file: {config_path:?}"))?;

    println!("Created config at: {config_path:?}");
    println!("\nNext steps:");
    println!("  1. Edit the config: $EDITOR {config_path:?}");
    println!("  2. Set usd_root to your USD install");
    println!("  3. Run: usdctl config validate");

    Ok(())
}

fn run_path() -> Result<()> {
    println!("{}", UsdConfig::config_path().display());
    Ok(())
}

fn run_list() -> Result<()> {
    let config = UsdConfig::load()?;

    let toml_str =
        toml::to_string_pretty(&config).context("Failed to serialize config to TOML")?;
    println!("{toml_str}");

    Ok(())
}

fn run_validate() -> Result<()> {
    println!("Validating configuration...");

    let config = UsdConfig::load()?;
    println!("  config loaded from {:?}", UsdConfig::config_path());

    let mut failed = false;

    match config.require_usd_root() {
        Ok(root) => match config.validate_paths() {
            Ok(()) => println!("  usd_root: {} (exists)", root.display()),
            Err(err) => {
                eprintln!("  usd_root: {err}");
                failed = true;
            }
        },
        Err(err) => {
            eprintln!("  usd_root: {err}");
            failed = true;
        }
    }

    match config.require_workers() {
        Ok(workers) => println!("  workers: {workers}"),
        Err(err) => {
            eprintln!("  workers: {err}");
            failed = true;
        }
    }

    if failed {
        std::process::exit(1);
    }

    println!("Configuration OK");
    Ok(())
}
