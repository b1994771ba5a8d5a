//! Terminal prompts and progress output.

use std::fmt;
use std::io::{self, Write};

use colored::Colorize;
use dialoguer::{Input, Select};

use crate::commit::{
    FileListing, OversizeAction, RepositoryDiffState, ResolveNotice, ResolvePrompter,
    StagingAction,
};
use crate::config::{PROVIDER_PRESETS, find_preset};
use crate::llm::{BudgetPrompter, ProgressSink, TokenUsage};

/// What to do with a generated message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuAction {
    Commit,
    Regenerate,
    Edit,
    Exit,
}

pub const MENU_ACTIONS: [MenuAction; 4] = [
    MenuAction::Commit,
    MenuAction::Regenerate,
    MenuAction::Edit,
    MenuAction::Exit,
];

impl MenuAction {
    pub fn label(&self) -> &'static str {
        match self {
            MenuAction::Commit => "Commit",
            MenuAction::Regenerate => "Regenerate",
            MenuAction::Edit => "Edit",
            MenuAction::Exit => "Exit without commit",
        }
    }
}

fn staging_label(action: StagingAction) -> &'static str {
    match action {
        StagingAction::StageAll => "Run 'git add .' to stage all changes",
        StagingAction::UseStaged => "Use staged changes only",
        StagingAction::Abort => "Exit",
    }
}

fn oversize_label(action: OversizeAction, limit: usize) -> String {
    match action {
        OversizeAction::Truncate => {
            format!("Use first {} characters to generate commit message", limit)
        }
        OversizeAction::UseFull => "Use unlimited characters (may fail or be slow)".to_string(),
        OversizeAction::Abort => "Exit".to_string(),
    }
}

/// Single-choice menu. Any terminal error counts as a cancel.
fn select<T: fmt::Display>(prompt: &str, items: &[T]) -> Option<usize> {
    Select::new()
        .with_prompt(prompt)
        .items(items)
        .default(0)
        .interact_opt()
        .ok()
        .flatten()
}

fn status(text: String) -> String {
    format!("▲ {}", text)
}

/// `dialoguer`-backed prompter for diff resolution and token budgets.
#[derive(Debug, Default)]
pub struct TerminalPrompter;

impl ResolvePrompter for TerminalPrompter {
    fn choose_staging(
        &mut self,
        state: RepositoryDiffState,
        listing: Option<&FileListing>,
        actions: &[StagingAction],
    ) -> Option<StagingAction> {
        match state {
            RepositoryDiffState::Mixed => {
                println!("{}", status("You have both staged and unstaged changes:".into()).yellow());
                if let Some(listing) = listing {
                    println!("\n{}", "Staged:".bold());
                    println!("{}", listing.staged.green());
                    println!("\n{}", "Unstaged:".bold());
                    println!("{}\n", listing.unstaged.red());
                }
            }
            RepositoryDiffState::UntrackedOnly => {
                println!("{}", status("Only untracked files found.".into()).yellow());
            }
            _ => {
                println!("{}", status("No staged changes found.".into()).yellow());
            }
        }

        let labels: Vec<&str> = actions.iter().map(|a| staging_label(*a)).collect();
        let index = select("What would you like to do?", &labels)?;
        actions.get(index).copied()
    }

    fn choose_oversize(
        &mut self,
        length: usize,
        limit: usize,
        actions: &[OversizeAction],
    ) -> Option<OversizeAction> {
        println!(
            "{}",
            status(format!("The diff is too large ({} chars, max {}).", length, limit)).yellow()
        );

        let labels: Vec<String> = actions.iter().map(|a| oversize_label(*a, limit)).collect();
        let index = select("Choose an option", &labels)?;
        actions.get(index).copied()
    }

    fn notify(&mut self, notice: ResolveNotice) {
        let line = match notice {
            ResolveNotice::Clean => status("No changes to commit. Working tree clean.".into()).red(),
            ResolveNotice::StagingAll => status("Staging all changes...".into()).yellow(),
            ResolveNotice::StillEmpty => status("Still no changes to commit.".into()).red(),
            ResolveNotice::Truncating { limit } => {
                status(format!("Truncating diff to {} chars...", limit)).yellow()
            }
            ResolveNotice::UsingFull { length } => {
                status(format!("Using full diff ({} chars)...", length)).yellow()
            }
        };
        println!("{}", line);
    }
}

impl BudgetPrompter for TerminalPrompter {
    fn choose_budget(&mut self, current: u32) -> Option<u32> {
        println!(
            "{}",
            status(format!(
                "The model used all {} tokens on reasoning and gave no answer.",
                current
            ))
            .yellow()
        );

        let doubled = current.saturating_mul(2);
        let items = [
            format!("Double max_tokens to {}", doubled),
            "Enter a custom max_tokens".to_string(),
            "Exit".to_string(),
        ];
        match select("Increase the token budget?", &items)? {
            0 => Some(doubled),
            1 => Input::<u32>::new()
                .with_prompt("max_tokens")
                .default(doubled)
                .validate_with(|value: &u32| {
                    if *value > current {
                        Ok(())
                    } else {
                        Err(format!("must be greater than {}", current))
                    }
                })
                .interact_text()
                .ok(),
            _ => None,
        }
    }
}

/// Show the generated message and ask what to do with it.
pub fn choose_action(message: &str) -> MenuAction {
    println!(
        "\n{}\n",
        status(format!("Commit message: git commit -m \"{}\"", message)).bright_green()
    );

    let labels: Vec<&str> = MENU_ACTIONS.iter().map(MenuAction::label).collect();
    select("What would you like to do?", &labels)
        .and_then(|i| MENU_ACTIONS.get(i).copied())
        .unwrap_or(MenuAction::Exit)
}

/// Ask for a replacement message. `None` when the answer is blank.
pub fn edit_message(current: &str) -> Option<String> {
    let edited: String = Input::new()
        .with_prompt("Commit message")
        .with_initial_text(current)
        .allow_empty(true)
        .interact_text()
        .ok()?;
    normalize_edit(&edited)
}

fn normalize_edit(input: &str) -> Option<String> {
    let trimmed = input.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

/// Streams reasoning (dimmed) and content to stdout as they arrive.
#[derive(Debug, Default)]
pub struct TerminalProgress {
    in_reasoning: bool,
    wrote_any: bool,
    usage: Option<TokenUsage>,
    show_usage: bool,
}

impl TerminalProgress {
    pub fn new(show_usage: bool) -> Self {
        Self {
            show_usage,
            ..Self::default()
        }
    }

    /// End the streamed block and print token usage if requested.
    pub fn finish(&mut self) {
        if self.wrote_any {
            println!();
        }
        if self.show_usage
            && let Some(usage) = self.usage
        {
            println!("{}", format_usage(&usage).dimmed());
        }
        self.wrote_any = false;
        self.in_reasoning = false;
    }

    fn write(&mut self, text: &str) {
        print!("{}", text);
        let _ = io::stdout().flush();
        self.wrote_any = true;
    }
}

impl ProgressSink for TerminalProgress {
    fn on_reasoning(&mut self, text: &str) {
        self.in_reasoning = true;
        self.write(&text.dimmed().to_string());
    }

    fn on_content(&mut self, text: &str) {
        if self.in_reasoning {
            self.in_reasoning = false;
            self.write("\n");
        }
        self.write(text);
    }

    fn on_usage(&mut self, usage: &TokenUsage) {
        self.usage = Some(*usage);
    }
}

/// Display name for a configured provider, falling back to its config name.
pub fn provider_label(name: &str) -> &str {
    find_preset(name).map_or(name, |preset| preset.label)
}

/// One line per preset: `name` padded, then its label and endpoint.
pub fn preset_listing() -> Vec<String> {
    PROVIDER_PRESETS
        .iter()
        .map(|p| format!("{:<12} {} ({})", p.name, p.label, p.base_url))
        .collect()
}

fn format_usage(usage: &TokenUsage) -> String {
    format!(
        "tokens: {} prompt, {} completion, {} total",
        usage.prompt_tokens, usage.completion_tokens, usage.total_tokens
    )
}
