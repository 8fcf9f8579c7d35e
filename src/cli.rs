// src/cli.rs
// =============================================================================
// This file defines our command-line interface using the `clap` crate.
//
// Two subcommands:
// - check:  audit a local Markdown file
// - github: fetch documentation from a GitHub repository and audit it
//
// Document types are taken as free text on purpose: an unrecognized type
// falls back to the readme policy instead of being rejected.
// =============================================================================

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "doc-guardian",
    version,
    about = "Audit repository documentation for structural quality",
    long_about = "doc-guardian checks README, CONTRIBUTING, LICENSE and other repository documents: \
                  link reachability, code block language tags, heading structure, expected \
                  sections and Markdown syntax. Exit code 0 means every check passed."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

/// Options shared by every subcommand
#[derive(Args, Debug, Clone)]
pub struct OutputOptions {
    /// Output the report(s) as JSON instead of a table
    #[arg(long)]
    pub json: bool,

    /// Path to a doc-guardian.toml configuration file
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Check a local Markdown file
    ///
    /// Example: doc-guardian check CONTRIBUTING.md --doc-type contributing
    Check {
        /// The file to check
        file: PathBuf,

        /// Document type (readme, contributing, changelog, code_of_conduct,
        /// license, security, support, wiki, docs, installation, usage, api)
        #[arg(long, default_value = "readme")]
        doc_type: String,

        #[command(flatten)]
        output: OutputOptions,
    },

    /// Fetch documents from a GitHub repository and check them
    ///
    /// Example: doc-guardian github https://github.com/rust-lang/rust --doc-type readme
    Github {
        /// GitHub repository URL (e.g., https://github.com/user/repo)
        repo_url: String,

        /// Only check this document type; without it every type found is checked
        #[arg(long)]
        doc_type: Option<String>,

        #[command(flatten)]
        output: OutputOptions,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_check_defaults_to_readme() {
        let cli = Cli::try_parse_from(["doc-guardian", "check", "README.md"]).unwrap();
        match cli.command {
            Commands::Check { file, doc_type, output } => {
                assert_eq!(file, PathBuf::from("README.md"));
                assert_eq!(doc_type, "readme");
                assert!(!output.json);
                assert!(output.config.is_none());
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_github_flags() {
        let cli = Cli::try_parse_from([
            "doc-guardian",
            "github",
            "https://github.com/user/repo",
            "--doc-type",
            "security",
            "--json",
            "--config",
            "ci.toml",
        ])
        .unwrap();
        match cli.command {
            Commands::Github { repo_url, doc_type, output } => {
                assert_eq!(repo_url, "https://github.com/user/repo");
                assert_eq!(doc_type.as_deref(), Some("security"));
                assert!(output.json);
                assert_eq!(output.config, Some(PathBuf::from("ci.toml")));
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }
}
