// ABOUTME: CLI argument definitions for the Imgur upload tool
// ABOUTME: Defines the command-line interface structure using clap derive macros

use crate::completions::Shell;
use clap::{Parser, Subcommand, ValueEnum};
use imgur_sdk::ImageFormat;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "imgur")]
#[command(about = "Upload images to Imgur anonymously", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Force colored output even when piped
    #[arg(long, global = true, conflicts_with = "no_color")]
    pub force_color: bool,

    /// Enable verbose output for debugging
    #[arg(long, short, global = true)]
    pub verbose: bool,

    /// Imgur application client ID (overrides IMGUR_CLIENT_ID and config)
    #[arg(long, global = true)]
    pub client_id: Option<String>,

    /// Read configuration from this file instead of the standard locations
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Upload an image file, or standard input when PATH is "-"
    Upload {
        /// Image file to upload
        path: String,

        /// Title shown on the Imgur page
        #[arg(long)]
        title: Option<String>,

        /// File name reported to Imgur
        #[arg(long)]
        name: Option<String>,

        #[command(flatten)]
        output: OutputArgs,
    },
    /// Decode an image, re-encode it in another format and upload the result
    #[command(name = "convert-upload")]
    ConvertUpload {
        /// Image file to convert
        path: PathBuf,

        /// Encoding to upload
        #[arg(long, short, value_enum, default_value_t = UploadFormat::Png)]
        format: UploadFormat,

        /// Title shown on the Imgur page
        #[arg(long)]
        title: Option<String>,

        #[command(flatten)]
        output: OutputArgs,
    },
    /// Upload a bundled asset by reference (e.g. asset://icons/logo.png)
    Asset {
        /// Asset reference URL
        url: String,

        /// Directory that asset references resolve against
        #[arg(long)]
        asset_dir: Option<PathBuf>,

        /// Title shown on the Imgur page
        #[arg(long)]
        title: Option<String>,

        #[command(flatten)]
        output: OutputArgs,
    },
    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Output switches shared by every upload command
#[derive(clap::Args, Debug, Clone, Copy, Default)]
pub struct OutputArgs {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,

    /// Pretty print JSON output
    #[arg(long, requires = "json")]
    pub pretty: bool,

    /// Do not render a progress bar
    #[arg(long)]
    pub no_progress: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum UploadFormat {
    Png,
    Jpeg,
    Gif,
    Webp,
}

impl From<UploadFormat> for ImageFormat {
    fn from(format: UploadFormat) -> Self {
        match format {
            UploadFormat::Png => ImageFormat::Png,
            UploadFormat::Jpeg => ImageFormat::Jpeg,
            UploadFormat::Gif => ImageFormat::Gif,
            UploadFormat::Webp => ImageFormat::WebP,
        }
    }
}
