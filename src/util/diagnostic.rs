//! Operator-facing diagnostic messages.
//!
//! Per-unit failures never stop a run, so the log is the only place an
//! operator learns about them. Every failure is rendered with its cause,
//! the captured tool output and, where there is one, a suggested fix.

use std::fmt;

/// Common suggestion messages for consistent error handling.
pub mod suggestions {
    /// Suggestion when cloning the target repository fails.
    pub const CLONE_FAILED: &str =
        "Make sure the repository exists and git has access to it (credential helper configured)";

    /// Suggestion when a descriptor names an unsupported language.
    pub const UNSUPPORTED_LANGUAGE: &str = "Supported languages: go";

    /// Suggestion when the descriptor cannot be parsed.
    pub const BAD_DESCRIPTOR: &str =
        "Expected a `languages` list of entries with `language` and `repository` keys";

    /// Suggestion when a descriptor names a repository as a full URL.
    pub const BAD_REPOSITORY: &str =
        "Give the repository as host and path only, e.g. `github.com/acme/greeter-go`";

    /// Suggestion when pushing fails.
    pub const PUSH_FAILED: &str =
        "Check that the credentials in the environment allow pushing to the repository";

    /// Suggestion when a tool cannot be spawned.
    pub const TOOL_MISSING: &str = "Make sure the tool is installed and on PATH";
}

/// Severity level for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Error,
    Warning,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => write!(f, "error"),
            Severity::Warning => write!(f, "warning"),
        }
    }
}

/// A diagnostic message with optional suggestions.
#[derive(Debug, Clone)]
pub struct Diagnostic {
    /// Primary message
    pub message: String,
    /// Severity level
    pub severity: Severity,
    /// Additional context lines
    pub context: Vec<String>,
    /// Suggested fixes
    pub suggestions: Vec<String>,
}

impl Diagnostic {
    /// Create a new error diagnostic.
    pub fn error(message: impl Into<String>) -> Self {
        Diagnostic {
            message: message.into(),
            severity: Severity::Error,
            context: Vec::new(),
            suggestions: Vec::new(),
        }
    }

    /// Create a new warning diagnostic.
    pub fn warning(message: impl Into<String>) -> Self {
        Diagnostic {
            message: message.into(),
            severity: Severity::Warning,
            context: Vec::new(),
            suggestions: Vec::new(),
        }
    }

    /// Add context to the diagnostic.
    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context.push(context.into());
        self
    }

    /// Add captured tool output, one context line per non-empty line.
    pub fn with_output(mut self, output: &str) -> Self {
        self.context.extend(
            output
                .lines()
                .filter(|line| !line.trim().is_empty())
                .map(|line| line.to_string()),
        );
        self
    }

    /// Add a suggestion for fixing the issue.
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestions.push(suggestion.into());
        self
    }

    /// Format the diagnostic as plain text.
    pub fn format(&self) -> String {
        let mut output = format!("{}: {}\n", self.severity, self.message);

        for ctx in &self.context {
            output.push_str(&format!("  | {}\n", ctx));
        }

        if !self.suggestions.is_empty() {
            output.push_str("help: consider:\n");
            for (i, suggestion) in self.suggestions.iter().enumerate() {
                output.push_str(&format!("  {}. {}\n", i + 1, suggestion));
            }
        }

        output
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format())
    }
}
