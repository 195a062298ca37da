//! Command-line interface: argument parsing and outcome rendering

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use colored::Colorize;

use fileflow::{BatchEvent, BatchOrganizer, BatchReport, GeminiClient, GeminiConfig, ItemOutcome};

#[derive(Parser)]
#[command(name = "fileflow")]
#[command(about = "Rename and organize folders of files with AI suggestions")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Rename each file from its content (descriptive snake_case names)
    Rename(RunArgs),

    /// Move each file into an AI-suggested category folder
    Organize(RunArgs),
}

#[derive(Args)]
pub struct RunArgs {
    /// Folder whose files should be processed
    pub folder: PathBuf,

    /// Gemini API key (default: GEMINI_API_KEY, then GOOGLE_API_KEY)
    #[arg(long)]
    pub api_key: Option<String>,

    /// Gemini model to use
    #[arg(long, default_value = "gemini-2.5-flash")]
    pub model: String,
}

enum Mode {
    Rename,
    Organize,
}

pub async fn run(cli: Cli) -> ExitCode {
    let (mode, args) = match cli.command {
        Commands::Rename(args) => (Mode::Rename, args),
        Commands::Organize(args) => (Mode::Organize, args),
    };

    let Some(api_key) = resolve_api_key(args.api_key) else {
        eprintln!(
            "{} No API key. Pass --api-key or set GEMINI_API_KEY.",
            "[ERROR]".red().bold()
        );
        return ExitCode::FAILURE;
    };

    let config = GeminiConfig {
        api_key,
        model: args.model,
        ..Default::default()
    };
    let client = match GeminiClient::new(config) {
        Ok(client) => client,
        Err(e) => {
            eprintln!("{} {}", "[ERROR]".red().bold(), e);
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = client.validate().await {
        eprintln!(
            "{} Gemini rejected the configuration: {}",
            "[ERROR]".red().bold(),
            e
        );
        return ExitCode::FAILURE;
    }

    let organizer = BatchOrganizer::new(client);
    let result = match mode {
        Mode::Rename => organizer.rename_files(&args.folder, render_event).await,
        Mode::Organize => organizer.organize_files(&args.folder, render_event).await,
    };

    match result {
        Ok(report) => {
            println!("{}", summary_line(&report));
            if report.failed() > 0 {
                ExitCode::FAILURE
            } else {
                ExitCode::SUCCESS
            }
        }
        Err(e) => {
            eprintln!("{} {}", "[ERROR]".red().bold(), e);
            ExitCode::FAILURE
        }
    }
}

/// First usable key wins: the flag, then the conventional env vars.
fn resolve_api_key(flag: Option<String>) -> Option<String> {
    let candidates = [
        flag,
        std::env::var("GEMINI_API_KEY").ok(),
        std::env::var("GOOGLE_API_KEY").ok(),
    ];
    candidates
        .into_iter()
        .flatten()
        .find(|key| !key.trim().is_empty())
}

fn render_event(event: BatchEvent) {
    match event {
        BatchEvent::Processing(p) => {
            println!(
                "{} {}",
                format!("[{}/{}]", p.current, p.total).dimmed(),
                p.file
            );
        }
        BatchEvent::Completed(outcome) => match outcome {
            ItemOutcome::Renamed { from, to } => {
                println!("  {} {} -> {}", "renamed:".green(), from, to);
            }
            ItemOutcome::Moved { from, to } => {
                println!("  {} {} -> {}", "moved:".green(), from, to);
            }
            ItemOutcome::Skipped { reason, .. } => {
                println!("  {} {}", "skipped:".yellow(), reason);
            }
            ItemOutcome::Failed { error, .. } => {
                println!("  {} {}", "failed:".red(), error);
            }
        },
    }
}

fn summary_line(report: &BatchReport) -> String {
    if report.is_empty() {
        return "No files to process.".to_string();
    }

    let counts = [
        (report.renamed(), "renamed"),
        (report.moved(), "moved"),
        (report.skipped(), "skipped"),
        (report.failed(), "failed"),
    ];
    let parts: Vec<String> = counts
        .into_iter()
        .filter(|(n, _)| *n > 0)
        .map(|(n, what)| format!("{} {}", n, what))
        .collect();

    format!("{} {}", "Done:".green().bold(), parts.join(", "))
}
