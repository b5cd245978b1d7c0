// ABOUTME: Library exports for the Imgur CLI modules for testing and external use
// ABOUTME: Makes command execution and configuration available to integration tests

pub mod cli;
pub mod cli_output;
pub mod commands;
pub mod completions;
pub mod config;
pub mod constants;
pub mod progress;
