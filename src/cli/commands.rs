//! CLI argument definitions.
//!
//! This module defines the command-line surface using clap. Endpoint and
//! credential flags fall back to environment variables so tokens can stay
//! out of shell history.

use clap::Parser;

/// resync - mirror resources from a source deployment onto a target.
#[derive(Parser, Debug)]
#[command(name = "resync")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Base URL of the source deployment.
    #[arg(long, env = "RESYNC_SOURCE_URL")]
    pub source_url: String,

    /// API token for the source deployment.
    #[arg(long, env = "RESYNC_SOURCE_TOKEN", hide_env_values = true)]
    pub source_token: String,

    /// Base URL of the target deployment.
    #[arg(long, env = "RESYNC_TARGET_URL")]
    pub target_url: String,

    /// API token for the target deployment.
    #[arg(long, env = "RESYNC_TARGET_TOKEN", hide_env_values = true)]
    pub target_token: String,

    /// Comma-separated list of modules to synchronize (functions, buckets).
    #[arg(short, long, value_delimiter = ',', required = true)]
    pub modules: Vec<String>,

    /// Compute and display the diffs without mutating the target.
    #[arg(long)]
    pub dry_run: bool,

    /// Include function environments in the diff and apply them.
    #[arg(long)]
    pub include_environment: bool,

    /// Enable verbose output.
    #[arg(short, long)]
    pub verbose: bool,

    /// Output format (text, json).
    #[arg(long, default_value = "text")]
    pub output: OutputFormat,
}

/// Output format options.
#[derive(Debug, Clone, Copy, Default, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text output.
    #[default]
    Text,
    /// JSON output for scripting.
    Json,
}

impl Cli {
    /// Returns the module selection with surrounding whitespace trimmed and
    /// empty entries dropped.
    #[must_use]
    pub fn module_selection(&self) -> Vec<String> {
        self.modules
            .iter()
            .map(|m| m.trim().to_string())
            .filter(|m| !m.is_empty())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(args).unwrap()
    }

    const BASE: &[&str] = &[
        "resync",
        "--source-url",
        "https://src.example.com",
        "--source-token",
        "s",
        "--target-url",
        "https://tgt.example.com",
        "--target-token",
        "t",
    ];

    fn with_args<'a>(extra: &'a [&'a str]) -> Vec<&'a str> {
        let mut args = BASE.to_vec();
        args.extend_from_slice(extra);
        args
    }

    #[test]
    fn test_modules_split_on_commas() {
        let cli = parse(&with_args(&["--modules", "functions,buckets"]));
        assert_eq!(cli.module_selection(), vec!["functions", "buckets"]);
    }

    #[test]
    fn test_module_selection_trims_whitespace() {
        let cli = parse(&with_args(&["--modules", "functions, buckets ,"]));
        assert_eq!(cli.module_selection(), vec!["functions", "buckets"]);
    }

    #[test]
    fn test_modules_are_required() {
        assert!(Cli::try_parse_from(BASE).is_err());
    }

    #[test]
    fn test_flags_default_off() {
        let cli = parse(&with_args(&["--modules", "functions"]));
        assert!(!cli.dry_run);
        assert!(!cli.include_environment);
        assert!(!cli.verbose);
    }
}
