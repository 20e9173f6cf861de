//! Keyword heuristic deciding where generated text should go.
//!
//! This is deliberately approximate: any keyword appearing anywhere in the
//! lower-cased prompt routes to the terminal. There is no override syntax.

/// Destination for generated text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputTarget {
    Editor,
    Terminal,
}

/// Words associated with shell and CLI work.
const TERMINAL_KEYWORDS: &[&str] = &[
    // version control
    "git",
    // containers
    "docker",
    "kubectl",
    // package managers
    "npm",
    "npx",
    "yarn",
    "pnpm",
    "pip ",
    "cargo ",
    "brew ",
    "apt-get",
    // filesystem navigation
    "mkdir",
    "cd ",
    "ls ",
    "folder",
    "directory",
    // generic
    "list",
    "show",
    "files",
    "command",
    "terminal",
    "shell",
    "cli",
];

/// Classifies `prompt` as a terminal or editor request.
pub fn classify(prompt: &str) -> OutputTarget {
    let prompt = prompt.to_lowercase();
    if TERMINAL_KEYWORDS.iter().any(|keyword| prompt.contains(keyword)) {
        OutputTarget::Terminal
    } else {
        OutputTarget::Editor
    }
}
