//! Command line arguments for the selectengine driver

use clap::{Parser, ValueEnum};
use std::path::PathBuf;

/// How resolved options are printed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

// Every flag overrides the matching config file value where one exists
#[derive(Parser, Debug, Clone)]
#[command(name = "selectengine")]
#[command(about = "Resolve select options from a service or a JSON fixture")]
#[command(version)]
pub struct Args {
    /// Configuration file path
    #[arg(short = 'c', long = "config-file", value_name = "FILE")]
    pub config_file: Option<PathBuf>,

    /// JSON fixture mapping method names to record arrays
    #[arg(short = 'x', long = "fixture", value_name = "FILE", conflicts_with = "endpoint")]
    pub fixture: Option<PathBuf>,

    /// Base URL of an HTTP service (overrides data_source.endpoint)
    #[arg(short = 'e', long = "endpoint", value_name = "URL")]
    pub endpoint: Option<String>,

    /// Service method to call (overrides data_source.api)
    #[arg(short = 'a', long = "api", value_name = "METHOD")]
    pub api: Option<String>,

    /// Search text to resolve
    #[arg(short = 's', long = "search", value_name = "TEXT")]
    pub search: Option<String>,

    /// Extra pages to load after the first
    #[arg(short = 'n', long = "pages", value_name = "COUNT", default_value_t = 0)]
    pub pages: usize,

    /// Pasted text to split and look up
    #[arg(long = "paste", value_name = "TEXT")]
    pub paste: Option<String>,

    /// Output format
    #[arg(short = 'O', long = "output", value_enum, default_value_t = OutputFormat::Text)]
    pub output: OutputFormat,

    /// Color output control:
    /// --color true forces, --color false disables, unspecified = auto (TTY)
    #[arg(short = 'g', long = "color")]
    pub color: Option<bool>,

    /// Log level
    #[arg(short = 'l', long = "log-level", value_name = "LEVEL", value_parser = ["trace", "debug", "info", "warn", "error", "off"])]
    pub log_level: Option<String>,

    /// Log file path
    #[arg(short = 'f', long = "log-file", value_name = "FILE")]
    pub log_file: Option<PathBuf>,

    /// Log output format
    #[arg(short = 'o', long = "log-format", value_name = "FORMAT", value_parser = ["text", "ext", "json"])]
    pub log_format: Option<String>,
}
