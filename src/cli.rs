use anyhow::{Context, Result};
use clap::{ArgAction, Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::commands::{self, CommandReport};
use crate::logging;
use crate::upload::config::load_config;
use crate::upload::paths::{PathOverrides, resolve_paths};

#[derive(Debug, Parser)]
#[command(
    name = "upload-index",
    version,
    about = "Record repository uploads in a JSON ledger and a newest-first Markdown table"
)]
struct Cli {
    /// Repository root; relative paths resolve against it.
    #[arg(long, global = true)]
    root: Option<PathBuf>,
    /// JSON record store.
    #[arg(long, global = true)]
    records: Option<PathBuf>,
    /// Markdown document holding the upload table.
    #[arg(long, global = true)]
    document: Option<PathBuf>,
    /// Print the command report as JSON.
    #[arg(long, global = true)]
    json: bool,
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Record one uploaded file.
    Record(RecordArgs),
    /// Record several files that share one upload timestamp.
    RecordBatch(RecordBatchArgs),
    /// Download a file into the assets dir and record it.
    Fetch(FetchArgs),
    /// Show resolved paths, settings and store health.
    Status,
}

#[derive(Debug, Args)]
struct RecordArgs {
    filename: String,
    path: String,
    timestamp: String,
    #[arg(long)]
    uploader: Option<String>,
}

#[derive(Debug, Args)]
struct RecordBatchArgs {
    /// JSON array of {"name": ..., "path": ...} objects.
    #[arg(long)]
    files: String,
    #[arg(long)]
    timestamp: String,
}

#[derive(Debug, Args)]
struct FetchArgs {
    filename: String,
    url: String,
    #[arg(long)]
    uploader: Option<String>,
}

fn print_report(report: &CommandReport, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(report)?);
        return Ok(());
    }

    let status = if report.ok { "ok" } else { "failed" };
    println!("{}: {status}", report.command);
    for detail in &report.details {
        println!("  {detail}");
    }
    for issue in &report.issues {
        println!("  issue: {issue}");
    }
    Ok(())
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    let paths = resolve_paths(&PathOverrides {
        root: cli.root,
        records_file: cli.records,
        document_file: cli.document,
    });
    let config = load_config(paths).context("stage=config")?;

    let report = match cli.command {
        Command::Record(args) => commands::record::run(
            &config,
            &commands::record::RecordOptions {
                filename: args.filename,
                path: args.path,
                timestamp: args.timestamp,
                uploader: args.uploader,
            },
        )?,
        Command::RecordBatch(args) => commands::record_batch::run(
            &config,
            &commands::record_batch::RecordBatchOptions {
                files: args.files,
                timestamp: args.timestamp,
            },
        )?,
        Command::Fetch(args) => commands::fetch::run(
            &config,
            &commands::fetch::FetchOptions {
                filename: args.filename,
                url: args.url,
                uploader: args.uploader,
            },
        )?,
        Command::Status => commands::status::run(&config)?,
    };

    print_report(&report, cli.json)?;
    if !report.ok {
        anyhow::bail!(
            "{} reported {} issue(s)",
            report.command,
            report.issues.len()
        );
    }
    Ok(())
}
