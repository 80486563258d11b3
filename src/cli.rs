use anyhow::{Result, bail};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::commands::summaries::SummariesAction;
use crate::commands::summarize::SummarizeOptions;
use crate::commands::{self, CommandReport};

#[derive(Debug, Parser)]
#[command(
    name = "page-digest",
    version,
    about = "Summarize web page text with OpenAI chat completions"
)]
struct Cli {
    /// Print the command report as JSON.
    #[arg(long, global = true)]
    json: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Summarize page text read from a file (`-` for stdin).
    Summarize {
        file: PathBuf,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        url: Option<String>,
        /// Save the summary to the store and download a text export.
        #[arg(long)]
        save: bool,
        /// Also show the extracted text the summary was built from.
        #[arg(long)]
        original: bool,
        #[arg(long)]
        copy: bool,
        #[arg(long)]
        share: bool,
        /// Open the original text and copy it to the clipboard.
        #[arg(long)]
        copy_original: bool,
    },
    /// Show the cleaned page text without summarizing.
    Extract {
        file: PathBuf,
        #[arg(long)]
        copy: bool,
    },
    SetKey {
        api_key: String,
    },
    ClearKey,
    Enable,
    Disable,
    Status,
    Summaries {
        #[command(subcommand)]
        action: SummariesCommand,
    },
    /// Create the data directories and seed default settings.
    Install,
}

#[derive(Debug, Subcommand)]
enum SummariesCommand {
    List,
    Show { index: usize },
    Delete { index: usize },
}

async fn dispatch(command: Command) -> Result<CommandReport> {
    match command {
        Command::Summarize {
            file,
            title,
            url,
            save,
            original,
            copy,
            share,
            copy_original,
        } => {
            commands::summarize::run(SummarizeOptions {
                file,
                title,
                url,
                save,
                original,
                copy,
                share,
                copy_original,
            })
            .await
        }
        Command::Extract { file, copy } => commands::extract::run(&file, copy).await,
        Command::SetKey { api_key } => commands::credentials::set_key(&api_key).await,
        Command::ClearKey => commands::credentials::clear_key().await,
        Command::Enable => commands::toggle::run(true),
        Command::Disable => commands::toggle::run(false),
        Command::Status => commands::status::run(),
        Command::Summaries { action } => commands::summaries::run(match action {
            SummariesCommand::List => SummariesAction::List,
            SummariesCommand::Show { index } => SummariesAction::Show(index),
            SummariesCommand::Delete { index } => SummariesAction::Delete(index),
        }),
        Command::Install => commands::install::run(),
    }
}

fn print_report(report: &CommandReport, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(report)?);
        return Ok(());
    }

    println!(
        "{}: {}",
        report.command,
        if report.ok { "ok" } else { "failed" }
    );
    for detail in &report.details {
        println!("{detail}");
    }
    for issue in &report.issues {
        println!("issue: {issue}");
    }
    Ok(())
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;

    let report = runtime.block_on(dispatch(cli.command))?;
    print_report(&report, cli.json)?;

    if !report.ok {
        bail!(
            "{} finished with {} issue(s)",
            report.command,
            report.issues.len()
        );
    }
    Ok(())
}
