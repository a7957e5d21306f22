//! Top-level CLI definition and dispatch.

use std::io;
use std::path::PathBuf;

use clap::{Args, CommandFactory, Parser, Subcommand};
use clap_complete::{Shell as CompletionShell, generate};
use colored::{Colorize, control};

use coreshed::core::config::Config;
use coreshed::core::errors::Result;
use coreshed::logger::jsonl::{JsonlConfig, JsonlWriter};
use coreshed::portal::SharePortal;
use coreshed::validate::BatchRecord;

/// coreshed — cached share scans and batch validation for drill-core imagery.
#[derive(Debug, Parser)]
#[command(
    name = "coreshed",
    author,
    version,
    about = "Drill-core share helper - cached scans and batch validation",
    long_about = None,
    arg_required_else_help = true
)]
pub struct Cli {
    /// Override config file path.
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,
    /// Treat the share as mounted at this local directory.
    #[arg(long, global = true, value_name = "DIR")]
    mount: Option<PathBuf>,
    /// Force JSON output mode.
    #[arg(long, global = true)]
    json: bool,
    /// Disable colored output.
    #[arg(long, global = true)]
    no_color: bool,
    /// Quiet mode (summaries only).
    #[arg(short, long, global = true)]
    quiet: bool,
    /// Subcommand to execute.
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Clone, Subcommand)]
enum Command {
    /// Verify the share is reachable and the base path lists.
    Check,
    /// Scan the share for image files.
    Scan(ScanArgs),
    /// List batches discovered on the share.
    Batches(BatchesArgs),
    /// Validate an operator-entered batch against the share.
    Validate(ValidateArgs),
    /// Generate shell completions.
    Completions(CompletionsArgs),
}

#[derive(Debug, Clone, Args, Default)]
struct ScanArgs {
    /// Scan this subtree instead of the configured base path.
    #[arg(long, value_name = "PATH")]
    base_path: Option<String>,
}

#[derive(Debug, Clone, Args, Default)]
struct BatchesArgs {
    /// Restrict discovery to one hole.
    #[arg(long, value_name = "HOLE_ID")]
    hole: Option<String>,
}

#[derive(Debug, Clone, Args)]
struct ValidateArgs {
    /// Hole the batch was recorded for.
    #[arg(long, value_name = "HOLE_ID")]
    hole: String,
    /// Machine the batch was recorded for.
    #[arg(long, value_name = "MACHINE_ID")]
    machine: String,
    /// Recorded start depth.
    #[arg(long = "from", value_name = "DEPTH")]
    depth_from: f64,
    /// Recorded final depth.
    #[arg(long = "to", value_name = "DEPTH")]
    depth_to: f64,
}

#[derive(Debug, Clone, Args)]
struct CompletionsArgs {
    /// Target shell.
    #[arg(value_enum)]
    shell: CompletionShell,
}

/// Dispatch a parsed command line.
pub fn run(cli: &Cli) -> Result<()> {
    if cli.no_color {
        control::set_override(false);
    }

    if let Command::Completions(args) = &cli.command {
        generate(args.shell, &mut Cli::command(), "coreshed", &mut io::stdout());
        return Ok(());
    }

    let mut config = Config::load(cli.config.as_deref())?;
    if let Some(mount) = &cli.mount {
        config.share.mount_path = Some(mount.clone());
    }

    let logger = JsonlWriter::open(JsonlConfig::at(config.paths.jsonl_log.clone()));
    let portal = SharePortal::from_config(&config)?.with_logger(logger);

    match &cli.command {
        Command::Check => cmd_check(cli, &portal),
        Command::Scan(args) => cmd_scan(cli, &portal, args),
        Command::Batches(args) => cmd_batches(cli, &portal, args),
        Command::Validate(args) => cmd_validate(cli, &portal, args),
        Command::Completions(_) => Ok(()),
    }
}

fn cmd_check(cli: &Cli, portal: &SharePortal) -> Result<()> {
    portal.check_connection()?;
    if cli.json {
        println!(
            "{}",
            serde_json::json!({ "ok": true, "share": portal.describe_share() })
        );
    } else {
        println!(
            "{} share reachable: {}",
            "ok".green().bold(),
            portal.describe_share()
        );
    }
    Ok(())
}

fn cmd_scan(cli: &Cli, portal: &SharePortal, args: &ScanArgs) -> Result<()> {
    let result = match &args.base_path {
        Some(base) => portal.scan_path(base)?,
        None => portal.get_images()?,
    };

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&*result)?);
        return Ok(());
    }

    println!(
        "{} file(s) under {} ({} unreadable director{})",
        result.entries.len(),
        result.base_path.bold(),
        result.errors.len(),
        if result.errors.len() == 1 { "y" } else { "ies" }
    );
    if !cli.quiet {
        for entry in &result.entries {
            println!("  {:>10}  {}", entry.size_bytes, entry.relative_path);
        }
    }
    for issue in &result.errors {
        println!("  {} {}: {}", "skipped".yellow(), issue.path, issue.message);
    }
    Ok(())
}

fn cmd_batches(cli: &Cli, portal: &SharePortal, args: &BatchesArgs) -> Result<()> {
    let (batches, errors) = match &args.hole {
        Some(hole) => (portal.batches_for_hole(hole)?, Vec::new()),
        None => {
            let result = portal.discover_batches()?;
            (result.batches.clone(), result.errors.clone())
        }
    };

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&batches)?);
        return Ok(());
    }

    println!("{} batch(es) discovered", batches.len());
    if !cli.quiet {
        for batch in &batches {
            println!(
                "  {}  batch-{}  {:.2}..{:.2}  {}",
                batch.hole_id, batch.batch_to, batch.depth_from, batch.depth_to, batch.machine_id
            );
        }
    }
    for issue in &errors {
        println!("  {} {}: {}", "skipped".yellow(), issue.path, issue.message);
    }
    Ok(())
}

fn cmd_validate(cli: &Cli, portal: &SharePortal, args: &ValidateArgs) -> Result<()> {
    let record = BatchRecord {
        hole_id: args.hole.clone(),
        machine_id: args.machine.clone(),
        depth_from: args.depth_from,
        depth_to: args.depth_to,
    };
    let result = portal.validate_batch(&record)?;

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else if result.has_discrepancies {
        println!("{} {}", "discrepancies".red().bold(), result.message);
        for d in &result.discrepancies {
            println!(
                "  {}: expected {:?}, share says {:?} ({})",
                d.field, d.expected, d.actual, d.message
            );
        }
    } else {
        println!("{} {}", "consistent".green().bold(), result.message);
    }

    if result.has_discrepancies {
        // Scripts key off the exit code; 2 distinguishes "ran fine, data
        // disagrees" from hard failures.
        portal.flush_logs();
        std::process::exit(2);
    }
    Ok(())
}
