//! aicm - CLI entry point.

use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use aicm::commit::{CommitFormat, DiffResolver, commit_staged};
use aicm::config::{ProviderConfig, ProviderStore, YamlConfigStore};
use aicm::git::SystemGit;
use aicm::llm::{CompletionClient, GenerationResult, list_models};
use aicm::ui::{
    MenuAction, TerminalProgress, TerminalPrompter, choose_action, edit_message, preset_listing,
    provider_label,
};

/// Write git commit messages with any OpenAI-compatible model.
#[derive(Parser, Debug)]
#[command(name = "aicm")]
#[command(about = "AI commit messages from your local changes")]
#[command(version)]
struct Cli {
    /// Print the diff sent to the model, token usage and debug logs
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Commit message format for this run (simple, conventional, gitmoji)
    #[arg(short, long)]
    format: Option<CommitFormat>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List the models served by the active provider
    Models,
    /// Save the default commit message format
    Format {
        /// simple, conventional or gitmoji
        format: CommitFormat,
    },
}

fn init_tracing(verbose: bool) {
    let level = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .init();
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{}", format!("▲ {:#}", e).red());
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<ExitCode> {
    let store = YamlConfigStore::from_env().context("Failed to locate the config directory")?;

    if !store.exists() {
        println!("{}", "▲ Configuration not found. Generating default config...".yellow());
        store
            .generate_defaults()
            .context("Failed to write default config")?;
        println!(
            "{}",
            format!(
                "▲ Set `active_provider` and its `model` in {}, and its `api_key` in {}.",
                store.main_path().display(),
                store.local_path().display()
            )
            .yellow()
        );
        println!(
            "{}",
            "▲ Remember to keep config.local.yml out of version control.".yellow()
        );
        println!("\nAvailable providers:");
        for line in preset_listing() {
            println!("  {}", line.dimmed());
        }
        return Ok(ExitCode::FAILURE);
    }

    match cli.command {
        Some(Command::Models) => run_models(&store).await,
        Some(Command::Format { format }) => {
            store
                .set_commit_format(format)
                .context("Failed to save commit format")?;
            println!("{}", format!("▲ Default commit format set to {}.", format).green());
            Ok(ExitCode::SUCCESS)
        }
        None => run_commit(&store, cli.format, cli.verbose).await,
    }
}

async fn run_models(store: &YamlConfigStore) -> Result<ExitCode> {
    let provider = store.active_provider()?;
    let models = list_models(&provider)
        .await
        .with_context(|| format!("Failed to list models for {}", provider.name))?;

    println!("{}", format!("Models from {}:", provider_label(&provider.name)).bold());
    for model in models {
        if model == provider.model {
            println!("{}", format!("{} (active)", model).bright_green());
        } else {
            println!("{}", model);
        }
    }
    Ok(ExitCode::SUCCESS)
}

async fn run_commit(
    store: &YamlConfigStore,
    format_override: Option<CommitFormat>,
    verbose: bool,
) -> Result<ExitCode> {
    let config = store.load()?;
    let mut provider: ProviderConfig = config.active()?.clone();
    provider.ensure_ready()?;
    let format = format_override
        .or(config.commit_format)
        .unwrap_or_default();

    let cwd = std::env::current_dir().context("Failed to read the current directory")?;
    let git = SystemGit::discover(&cwd).context("This is not a git repository")?;

    let mut prompter = TerminalPrompter;
    let Some(bundle) = DiffResolver::new(&git).resolve(provider.diff_len, &mut prompter)? else {
        return Ok(ExitCode::FAILURE);
    };

    if verbose {
        println!(
            "{}",
            format!("▲ Git diff ({} chars):", bundle.text.chars().count()).cyan()
        );
        println!("{}\n", bundle.text);
    }

    let client = CompletionClient::new().context("Failed to build HTTP client")?;

    loop {
        println!("{}", "▲ Generating your AI commit message...".dimmed());
        let mut progress = TerminalProgress::new(verbose);
        let result = client
            .generate(
                &bundle.text,
                &provider,
                format,
                store,
                &mut prompter,
                &mut progress,
            )
            .await;
        progress.finish();

        let message = match result {
            GenerationResult::Success(message) => message,
            GenerationResult::FatalFailure(reason) => {
                eprintln!("{}", format!("▲ {}", reason).red());
                return Ok(ExitCode::FAILURE);
            }
            GenerationResult::RetryableFailure(reason) => {
                eprintln!("{}", format!("▲ {}", reason).red());
                return Ok(ExitCode::FAILURE);
            }
        };

        match choose_action(&message) {
            MenuAction::Commit => return commit(&git, &message),
            MenuAction::Regenerate => {
                // Pick up any remediation saved by the previous attempt.
                if let Ok(reloaded) = store.load_provider(&provider.name) {
                    provider = reloaded;
                }
            }
            MenuAction::Edit => match edit_message(&message) {
                Some(edited) => return commit(&git, &edited),
                None => {
                    println!("{}", "▲ Commit aborted (empty message).".red());
                    return Ok(ExitCode::FAILURE);
                }
            },
            MenuAction::Exit => {
                println!("{}", "▲ Exit without commit.".yellow());
                return Ok(ExitCode::FAILURE);
            }
        }
    }
}

fn commit(git: &SystemGit, message: &str) -> Result<ExitCode> {
    println!(
        "\n{}",
        format!("▲ Executing: git commit -m \"{}\"", message).dimmed()
    );
    let log = commit_staged(git, message).context("git commit failed")?;
    println!("\n{}", log);
    Ok(ExitCode::SUCCESS)
}
