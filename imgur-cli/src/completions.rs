// ABOUTME: Shell completion generation for the imgur binary using clap_complete
// ABOUTME: Provides static completions for bash, zsh, fish, and powershell

use anyhow::{anyhow, Result};
use clap::{Command, ValueEnum};
use clap_complete::{generate, shells};
use std::fmt;
use std::io::Write;
use std::str::FromStr;

/// Name completions are registered under
pub const BIN_NAME: &str = "imgur";

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Shell {
    Bash,
    Zsh,
    Fish,
    #[allow(clippy::enum_variant_names)]
    PowerShell,
}

impl Shell {
    pub fn all() -> Vec<Shell> {
        vec![Shell::Bash, Shell::Zsh, Shell::Fish, Shell::PowerShell]
    }
}

impl fmt::Display for Shell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let shell_str = match self {
            Shell::Bash => "bash",
            Shell::Zsh => "zsh",
            Shell::Fish => "fish",
            Shell::PowerShell => "powershell",
        };
        write!(f, "{}", shell_str)
    }
}

impl FromStr for Shell {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "bash" => Ok(Shell::Bash),
            "zsh" => Ok(Shell::Zsh),
            "fish" => Ok(Shell::Fish),
            "powershell" | "pwsh" => Ok(Shell::PowerShell),
            _ => Err(anyhow!(
                "Unsupported shell: {}. Supported shells: bash, zsh, fish, powershell",
                s
            )),
        }
    }
}

#[derive(Debug, Default)]
pub struct CompletionGenerator;

impl CompletionGenerator {
    pub fn new() -> Self {
        Self
    }

    /// Write the completion script for `shell` to `writer`
    pub fn generate<W: Write>(
        &self,
        shell: Shell,
        cmd: &mut Command,
        writer: &mut W,
    ) -> Result<()> {
        match shell {
            Shell::Bash => generate(shells::Bash, cmd, BIN_NAME, writer),
            Shell::Zsh => generate(shells::Zsh, cmd, BIN_NAME, writer),
            Shell::Fish => generate(shells::Fish, cmd, BIN_NAME, writer),
            Shell::PowerShell => generate(shells::PowerShell, cmd, BIN_NAME, writer),
        }
        writer.flush()?;

        Ok(())
    }

    /// Where to put the generated script for each shell
    pub fn installation_instructions() -> String {
        r#"Shell Completion Installation

The completions subcommand outputs shell completion code to stdout. To install:

Bash:
  Linux: imgur completions bash > ~/.local/share/bash-completion/completions/imgur
  macOS: imgur completions bash > $(brew --prefix)/etc/bash_completion.d/imgur

Zsh:
  imgur completions zsh > ~/.zfunc/_imgur
  # Add ~/.zfunc to $fpath in your ~/.zshrc:
  # fpath=(~/.zfunc $fpath)

Fish:
  imgur completions fish > ~/.config/fish/completions/imgur.fish

PowerShell:
  imgur completions powershell > imgur_completions.ps1
  # Then source it in your PowerShell profile

Note: You may need to restart your shell or source the completion file.
"#
        .to_string()
    }
}
