// ABOUTME: Centralized constants for the Imgur CLI application
// ABOUTME: Contains config locations, environment keys, and progress display settings

/// Configuration file locations
pub mod config {
    /// Directory name under the XDG config home
    pub const APP_DIR: &str = "imgur-cli";

    /// File name inside the config directory
    pub const FILE_NAME: &str = "config.toml";

    /// Project-local config file name
    pub const PROJECT_FILE_NAME: &str = "imgur-cli.toml";
}

/// Environment variables read by the CLI
pub mod env {
    /// Suppresses progress output when set
    pub const QUIET: &str = "IMGUR_CLI_QUIET";

    /// Standard opt-out for colored output
    pub const NO_COLOR: &str = "NO_COLOR";
}

/// Progress bar configuration
pub mod progress {
    /// Spinner tick interval for smooth animation
    pub const TICK_MS: u64 = 80;

    pub const BAR_TEMPLATE: &str =
        "{msg} [{bar:25.cyan/blue}] {bytes}/{total_bytes} ({bytes_per_sec})";

    pub const SPINNER_TEMPLATE: &str = "{spinner:.green} {msg} {bytes}";
}

/// Output formats accepted in the config file
pub mod formats {
    pub const TEXT: &str = "text";
    pub const JSON: &str = "json";

    pub const ALL: &[&str] = &[TEXT, JSON];
}
