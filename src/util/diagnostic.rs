//! User-friendly diagnostic messages.
//!
//! Every error printed by the CLI carries its cause chain and, where one
//! exists, a suggested fix.

use std::fmt;

use miette::Diagnostic as MietteDiagnostic;

use crate::core::VersionError;
use crate::builder::cmake::CommandFailed;
use crate::ops::{AggregationError, ConfigureError, PrepareError, ProvisionError};
use crate::util::context::RootNotFound;

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
    pub message: String,
    pub severity: Severity,
    /// Cause lines, outermost first
    pub context: Vec<String>,
    pub suggestions: Vec<String>,
}

impl Diagnostic {
    pub fn error(message: impl Into<String>) -> Self {
        Diagnostic {
            message: message.into(),
            severity: Severity::Error,
            context: Vec::new(),
            suggestions: Vec::new(),
        }
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Diagnostic {
            message: message.into(),
            severity: Severity::Warning,
            context: Vec::new(),
            suggestions: Vec::new(),
        }
    }

    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context.push(context.into());
        self
    }

    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestions.push(suggestion.into());
        self
    }

    /// Build a diagnostic from an error chain.
    ///
    /// Help texts attached to typed errors anywhere in the chain become
    /// suggestions.
    pub fn from_error(err: &anyhow::Error) -> Self {
        let mut diag = Diagnostic::error(err.to_string());
        for cause in err.chain().skip(1) {
            diag = diag.with_context(cause.to_string());
        }

        let mut help = Vec::new();
        for cause in err.chain() {
            if let Some(d) = as_diagnostic(cause) {
                collect_help(d, &mut help);
            }
        }
        for h in help {
            if !diag.suggestions.contains(&h) {
                diag.suggestions.push(h);
            }
        }
        diag
    }

    /// Format the diagnostic for terminal output.
    pub fn format(&self, color: bool) -> String {
        let mut output = String::new();

        let severity_str = match (self.severity, color) {
            (Severity::Error, true) => "\x1b[1;31merror\x1b[0m",
            (Severity::Warning, true) => "\x1b[1;33mwarning\x1b[0m",
            (Severity::Error, false) => "error",
            (Severity::Warning, false) => "warning",
        };

        output.push_str(&format!("{}: {}\n", severity_str, self.message));

        for ctx in &self.context {
            for (i, line) in ctx.lines().enumerate() {
                let lead = if i == 0 { "  → " } else { "    " };
                output.push_str(&format!("{}{}\n", lead, line));
            }
        }

        if !self.suggestions.is_empty() {
            output.push('\n');
            let help_prefix = if color {
                "\x1b[1;32mhelp\x1b[0m"
            } else {
                "help"
            };
            if self.suggestions.len() == 1 {
                output.push_str(&format!("{}: {}\n", help_prefix, self.suggestions[0]));
            } else {
                output.push_str(&format!("{}: consider:\n", help_prefix));
                for (i, suggestion) in self.suggestions.iter().enumerate() {
                    output.push_str(&format!("  {}. {}\n", i + 1, suggestion));
                }
            }
        }

        output
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format(false))
    }
}

fn as_diagnostic<'a>(
    err: &'a (dyn std::error::Error + 'static),
) -> Option<&'a dyn MietteDiagnostic> {
    if let Some(e) = err.downcast_ref::<PrepareError>() {
        return Some(e);
    }
    if let Some(e) = err.downcast_ref::<ProvisionError>() {
        return Some(e);
    }
    if let Some(e) = err.downcast_ref::<AggregationError>() {
        return Some(e);
    }
    if let Some(e) = err.downcast_ref::<ConfigureError>() {
        return Some(e);
    }
    if let Some(e) = err.downcast_ref::<VersionError>() {
        return Some(e);
    }
    if let Some(e) = err.downcast_ref::<RootNotFound>() {
        return Some(e);
    }
    if let Some(e) = err.downcast_ref::<CommandFailed>() {
        return Some(e);
    }
    None
}

fn collect_help(diag: &dyn MietteDiagnostic, out: &mut Vec<String>) {
    if let Some(help) = diag.help() {
        out.push(help.to_string());
    }
}

/// Print a diagnostic to stderr.
pub fn emit(diagnostic: &Diagnostic, color: bool) {
    eprint!("{}", diagnostic.format(color));
}
