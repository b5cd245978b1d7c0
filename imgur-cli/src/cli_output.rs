// ABOUTME: Centralized CLI output utilities for consistent user-facing messages
// ABOUTME: Formats upload results and SDK errors with optional color on stderr and stdout

use imgur_sdk::{UploadError, Url};
use owo_colors::OwoColorize;
use serde::Serialize;
use std::io::IsTerminal;

/// Machine-readable result of one upload, printed with `--json`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UploadReport {
    pub link: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    pub source: String,
}

impl UploadReport {
    pub fn new(link: &Url, title: Option<&str>, source: impl Into<String>) -> Self {
        Self {
            link: link.to_string(),
            title: title.map(str::to_string),
            source: source.into(),
        }
    }

    pub fn to_json(&self, pretty: bool) -> serde_json::Result<String> {
        if pretty {
            serde_json::to_string_pretty(self)
        } else {
            serde_json::to_string(self)
        }
    }
}

/// Centralized CLI output utilities for consistent formatting
pub struct CliOutput {
    use_color: bool,
}

impl CliOutput {
    /// Create CLI output utility with explicit color setting
    pub fn with_color(use_color: bool) -> Self {
        Self { use_color }
    }

    pub fn use_color(&self) -> bool {
        self.use_color
    }

    /// Display an error message
    pub fn error(&self, message: &str) {
        if self.use_color {
            eprintln!("{} {}", "error:".red().bold(), message);
        } else {
            eprintln!("error: {}", message);
        }
    }

    /// Display a warning message
    pub fn warning(&self, message: &str) {
        if self.use_color {
            eprintln!("{} {}", "warning:".yellow().bold(), message);
        } else {
            eprintln!("warning: {}", message);
        }
    }

    /// Display a hint line under an error
    pub fn hint(&self, message: &str) {
        if self.use_color {
            eprintln!("  {} {}", "hint:".cyan(), message.dimmed());
        } else {
            eprintln!("  hint: {}", message);
        }
    }

    /// Report a failed upload with its code and help text
    pub fn upload_error(&self, err: &UploadError) {
        self.error(&format!("{} [{}]", err, err.code()));
        if let Some(help) = err.help_text() {
            self.hint(help);
        }
    }

    /// The uploaded link goes to stdout so it can be piped
    pub fn link(&self, link: &Url) {
        if std::io::stdout().is_terminal() && self.use_color {
            println!("{}", link.as_str().green().underline());
        } else {
            println!("{}", link);
        }
    }
}
