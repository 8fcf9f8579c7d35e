// src/policy.rs
// =============================================================================
// Document types and per-type check strictness.
//
// Every document type gets a CheckPolicy: three independent strictness
// dials (code blocks, links, heading structure). The table is static and
// immutable; the config file can only replace whole entries at load time.
//
// Rust concepts:
// - Enums with serde: DocType/Strictness serialize as snake_case strings
// - const fn: the policy table is evaluated without any runtime state
// =============================================================================

use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

/// The fixed set of repository documentation categories
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum DocType {
    #[default]
    Readme,
    Contributing,
    Changelog,
    CodeOfConduct,
    License,
    Security,
    Support,
    Wiki,
    Docs,
    Installation,
    Usage,
    Api,
}

impl DocType {
    /// All document types, in the order repository discovery reports them
    pub const ALL: [DocType; 12] = [
        DocType::Readme,
        DocType::Contributing,
        DocType::Changelog,
        DocType::CodeOfConduct,
        DocType::License,
        DocType::Security,
        DocType::Support,
        DocType::Wiki,
        DocType::Docs,
        DocType::Installation,
        DocType::Usage,
        DocType::Api,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DocType::Readme => "readme",
            DocType::Contributing => "contributing",
            DocType::Changelog => "changelog",
            DocType::CodeOfConduct => "code_of_conduct",
            DocType::License => "license",
            DocType::Security => "security",
            DocType::Support => "support",
            DocType::Wiki => "wiki",
            DocType::Docs => "docs",
            DocType::Installation => "installation",
            DocType::Usage => "usage",
            DocType::Api => "api",
        }
    }

    // Exact lookup by name. Accepts any case and '-' in place of '_'.
    pub fn parse(name: &str) -> Option<DocType> {
        let normalized = name.trim().to_ascii_lowercase().replace('-', "_");
        DocType::ALL
            .into_iter()
            .find(|doc_type| doc_type.as_str() == normalized)
    }

    // Lenient lookup used for caller-supplied hints.
    // Unknown or empty hints silently fall back to Readme.
    pub fn from_hint(hint: &str) -> DocType {
        match DocType::parse(hint) {
            Some(doc_type) => doc_type,
            None => {
                debug!(hint, "unknown document type, falling back to readme");
                DocType::Readme
            }
        }
    }
}

impl fmt::Display for DocType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How harshly a check category penalizes deviations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Strictness {
    /// The check is bypassed entirely
    Skip,
    /// The check records what it sees but raises nothing
    Loose,
    Normal,
    Strict,
}

impl Strictness {
    pub fn as_str(&self) -> &'static str {
        match self {
            Strictness::Skip => "skip",
            Strictness::Loose => "loose",
            Strictness::Normal => "normal",
            Strictness::Strict => "strict",
        }
    }
}

impl fmt::Display for Strictness {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-document-type strictness record, looked up once per check run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckPolicy {
    pub code_block_check: Strictness,
    pub link_check: Strictness,
    pub heading_structure_check: Strictness,
}

impl CheckPolicy {
    const fn new(code_block: Strictness, link: Strictness, heading: Strictness) -> Self {
        CheckPolicy {
            code_block_check: code_block,
            link_check: link,
            heading_structure_check: heading,
        }
    }

    // The built-in policy table.
    //
    // Documents that rarely carry code (license, changelog, policies) skip the
    // code-block check; licenses don't get their links probed at all.
    pub const fn builtin(doc_type: DocType) -> CheckPolicy {
        use Strictness::*;
        match doc_type {
            DocType::Readme => CheckPolicy::new(Strict, Strict, Strict),
            DocType::Contributing => CheckPolicy::new(Strict, Strict, Strict),
            DocType::License => CheckPolicy::new(Skip, Loose, Loose),
            DocType::Changelog => CheckPolicy::new(Skip, Normal, Normal),
            DocType::CodeOfConduct => CheckPolicy::new(Skip, Normal, Normal),
            DocType::Security => CheckPolicy::new(Skip, Strict, Normal),
            DocType::Support => CheckPolicy::new(Skip, Strict, Normal),
            DocType::Wiki => CheckPolicy::new(Normal, Strict, Strict),
            DocType::Docs => CheckPolicy::new(Normal, Strict, Strict),
            DocType::Installation => CheckPolicy::new(Strict, Normal, Strict),
            DocType::Usage => CheckPolicy::new(Strict, Normal, Strict),
            DocType::Api => CheckPolicy::new(Strict, Normal, Strict),
        }
    }
}
