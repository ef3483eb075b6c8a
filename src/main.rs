use anyhow::{Context, Result};
use clap::error::ErrorKind;
use clap::{Parser, Subcommand};
use std::ffi::OsString;
use std::path::PathBuf;

use hashguard::config::Config;
use hashguard::logging;
use hashguard::report::{self, Format};
use hashguard::scan::{self, hasher::Algorithm};
use hashguard::store::BaselineStore;

const COMMANDS: [&str; 3] = ["init", "check", "update"];

/// Global options that consume the following argument as their value.
const VALUE_OPTIONS: [&str; 4] = ["--baseline", "--config", "--algorithm", "--format"];

#[derive(Parser)]
#[command(
    name = "hashguard",
    version,
    about = "Detect unauthorized file changes against a recorded baseline",
    arg_required_else_help = true
)]
struct Cli {
    /// Baseline record file (default: file_hashes.json in the working directory)
    #[arg(long, global = true)]
    baseline: Option<PathBuf>,
    /// Config file (default: hashguard.toml in the working directory, if present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Digest algorithm
    #[arg(long, global = true, value_enum)]
    algorithm: Option<Algorithm>,
    /// Report format
    #[arg(long, global = true, value_enum)]
    format: Option<Format>,
    /// Increase log verbosity on stderr (-v, -vv, -vvv)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Record a fresh baseline for a file or directory
    Init {
        /// File or directory to baseline
        target: PathBuf,
    },
    /// Compare files against the baseline and report tampering
    Check {
        /// File or directory to verify
        target: PathBuf,
    },
    /// Refresh the baseline entry of one file after a legitimate change
    Update {
        /// File whose fingerprint should be re-recorded
        file: PathBuf,
    },
}

fn main() -> Result<()> {
    let args = normalize_args(std::env::args_os().collect());
    let cli = match Cli::try_parse_from(&args) {
        Ok(cli) => cli,
        Err(e) if is_unknown_command(&e, &args) => {
            println!("⚠️ Invalid command. Use init, check, or update.");
            return Ok(());
        }
        Err(e) => e.exit(),
    };

    let cwd = std::env::current_dir().context("resolving working directory")?;
    let mut config = Config::load(cli.config.as_deref(), &cwd)?;
    if let Some(path) = cli.baseline {
        config.baseline.path = path;
    }
    if let Some(algorithm) = cli.algorithm {
        config.digest.algorithm = algorithm;
    }
    if let Some(format) = cli.format {
        config.report.format = format;
    }
    logging::init(&config.logging.level, cli.verbose)?;

    let store = BaselineStore::new(&config.baseline.path);
    let format = config.report.format;

    let output = match cli.command {
        Commands::Init { target } => {
            let result = scan::init_baseline(&target, &store, &config)?;
            report::render_init(&result, format)?
        }
        Commands::Check { target } => {
            let report = scan::check_integrity(&target, &store, &config)?;
            report::render_check(&report, format, config.report.show_new)?
        }
        Commands::Update { file } => {
            let outcome = scan::update_entry(&file, &store, &config)?;
            report::render_update(&outcome, format)?
        }
    };
    println!("{output}");

    Ok(())
}

/// A word in command position that names no command, given with a path
/// argument. Bare invocations still get clap's usage error.
fn is_unknown_command(err: &clap::Error, args: &[OsString]) -> bool {
    if !matches!(err.kind(), ErrorKind::InvalidSubcommand | ErrorKind::UnknownArgument) {
        return false;
    }
    let Some(idx) = command_index(args) else {
        return false;
    };
    idx + 1 < args.len()
        && args[idx]
            .to_str()
            .is_some_and(|cmd| !COMMANDS.contains(&cmd))
}

/// Position of the command word: the first argument that is neither an
/// option nor the value of a value-taking global option.
fn command_index(args: &[OsString]) -> Option<usize> {
    let mut i = 1;
    while i < args.len() {
        let arg = args[i].to_str()?;
        if VALUE_OPTIONS.contains(&arg) {
            i += 2;
        } else if arg.starts_with('-') {
            i += 1;
        } else {
            return Some(i);
        }
    }
    None
}

/// Command names are case-insensitive: `CHECK dir` behaves like `check dir`.
fn normalize_args(mut args: Vec<OsString>) -> Vec<OsString> {
    let Some(idx) = command_index(&args) else {
        return args;
    };
    if let Some(lower) = args[idx].to_str().map(str::to_lowercase) {
        if COMMANDS.contains(&lower.as_str()) {
            args[idx] = OsString::from(lower);
        }
    }
    args
}
