// src/lib.rs
// =============================================================================
// doc-guardian: a rule-based auditor for repository documentation.
//
// Entry point for embedders:
//
//   let checker = Checker::new(Config::default())?;
//   let report = checker.check(markdown, DocType::Readme).await;
//   println!("{}", serde_json::to_string_pretty(&report)?);
//
// Module map:
// - policy:  document types and per-type strictness
// - config:  optional TOML configuration
// - checker: scanner, link resolver, category checks, orchestrator
// - github:  fetching documents from GitHub repositories
// =============================================================================

pub mod checker;
pub mod config;
pub mod error;
pub mod github;
pub mod policy;

pub use checker::report::CheckReport;
pub use checker::Checker;
pub use config::Config;
pub use error::{CheckError, Result};
pub use policy::{CheckPolicy, DocType, Strictness};
