//! Prompt construction for AI-generated commit messages.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Base directive shared by every format.
const BASE_DIRECTIVE: &str = "Generate a concise git commit message title in present tense that precisely describes the key changes in the following code diff. Focus on what was changed, not just file names. Provide only the title, no description or body.\n\
Message language: English. Rules:\n\
- Commit message must be a maximum of 100 characters.\n\
- Exclude anything unnecessary such as translation. Your entire response will be passed directly into git commit.\n\
- Be specific: include concrete details (package names, versions, functionality) rather than generic statements.";

/// Conventional Commits types the model must choose from.
pub const CONVENTIONAL_TYPES: &[(&str, &str)] = &[
    ("docs", "Documentation only changes"),
    ("style", "Changes that do not affect the meaning of the code (white-space, formatting, missing semi-colons, etc)"),
    ("refactor", "A code change that neither fixes a bug nor adds a feature"),
    ("perf", "A code change that improves performance"),
    ("test", "Adding missing tests or correcting existing tests"),
    ("build", "Changes that affect the build system or external dependencies"),
    ("ci", "Changes to CI configuration files and scripts"),
    ("chore", "Other changes that don't modify src or test files"),
    ("revert", "Reverts a previous commit"),
    ("feat", "A new feature"),
    ("fix", "A bug fix"),
];

/// Gitmoji codes the model must choose from.
pub const GITMOJI_TYPES: &[(&str, &str)] = &[
    ("🎨", "Improve structure / format of the code"),
    ("⚡", "Improve performance"),
    ("🔥", "Remove code or files"),
    ("🐛", "Fix a bug"),
    ("🚑", "Critical hotfix"),
    ("✨", "Introduce new features"),
    ("📝", "Add or update documentation"),
    ("🚀", "Deploy stuff"),
    ("💄", "Add or update the UI and style files"),
    ("🎉", "Begin a project"),
    ("✅", "Add, update, or pass tests"),
    ("🔒", "Fix security or privacy issues"),
    ("🔖", "Release / Version tags"),
    ("🚨", "Fix compiler / linter warnings"),
    ("🚧", "Work in progress"),
    ("💚", "Fix CI build"),
    ("⬇️", "Downgrade dependencies"),
    ("⬆️", "Upgrade dependencies"),
    ("📌", "Pin dependencies to specific versions"),
    ("👷", "Add or update CI build system"),
    ("♻️", "Refactor code"),
    ("➕", "Add a dependency"),
    ("➖", "Remove a dependency"),
    ("🔧", "Add or update configuration files"),
    ("🌐", "Internationalization and localization"),
    ("✏️", "Fix typos"),
    ("⏪", "Revert changes"),
    ("🔀", "Merge branches"),
    ("📦", "Add or update compiled files or packages"),
    ("🚚", "Move or rename resources (e.g.: files, paths, routes)"),
    ("💥", "Introduce breaking changes"),
    ("🗑️", "Deprecate code that needs to be cleaned up"),
];

/// Shape of the commit message the model is asked to produce.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CommitFormat {
    #[default]
    Simple,
    Conventional,
    Gitmoji,
}

impl CommitFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            CommitFormat::Simple => "simple",
            CommitFormat::Conventional => "conventional",
            CommitFormat::Gitmoji => "gitmoji",
        }
    }

    /// The exact one-line shape the answer must follow.
    pub fn output_shape(&self) -> &'static str {
        match self {
            CommitFormat::Simple => "<commit message>",
            CommitFormat::Conventional => "<type>(<optional scope>): <commit message>",
            CommitFormat::Gitmoji => "<emoji> <commit message>",
        }
    }

    /// Lookup table of prefixes for this format, empty for `Simple`.
    pub fn types(&self) -> &'static [(&'static str, &'static str)] {
        match self {
            CommitFormat::Simple => &[],
            CommitFormat::Conventional => CONVENTIONAL_TYPES,
            CommitFormat::Gitmoji => GITMOJI_TYPES,
        }
    }

    fn addendum(&self) -> String {
        let table = render_table(self.types());
        match self {
            CommitFormat::Simple => String::new(),
            CommitFormat::Conventional => format!(
                "Choose a type from the type-to-description JSON below that best describes the git diff:\n{table}"
            ),
            CommitFormat::Gitmoji => format!(
                "Choose an emoji from the emoji-to-description JSON below that best describes the git diff:\n{table}"
            ),
        }
    }
}

impl fmt::Display for CommitFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CommitFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "simple" => Ok(CommitFormat::Simple),
            "conventional" => Ok(CommitFormat::Conventional),
            "gitmoji" => Ok(CommitFormat::Gitmoji),
            other => Err(format!(
                "unknown commit format '{other}' (expected simple, conventional or gitmoji)"
            )),
        }
    }
}

/// Render a prefix table as a JSON object, keeping its declared order.
fn render_table(entries: &[(&str, &str)]) -> String {
    let body = entries
        .iter()
        .map(|(key, desc)| {
            format!(
                "  {}: {}",
                serde_json::Value::from(*key),
                serde_json::Value::from(*desc)
            )
        })
        .collect::<Vec<_>>()
        .join(",\n");
    format!("{{\n{body}\n}}")
}

/// Build the system instruction for the given format.
pub fn build_system_prompt(format: CommitFormat) -> String {
    let mut prompt = String::from(BASE_DIRECTIVE);

    let addendum = format.addendum();
    if !addendum.is_empty() {
        prompt.push_str("\n\n");
        prompt.push_str(&addendum);
    }

    prompt.push_str(&format!(
        "\n\nThe output response must be in format:\n{}\n\
IMPORTANT: Do not include any explanations, introductions, or additional text. Do not wrap the commit message in quotes or any other formatting. Respond with ONLY the commit message text on a single line.",
        format.output_shape()
    ));
    prompt
}

/// Build the user message carrying the diff.
pub fn build_user_prompt(diff: &str) -> String {
    format!("Generate a commit message for the following git diff:\n\n{diff}")
}
