// src/config.rs
// =============================================================================
// Optional TOML configuration.
//
// Everything has a built-in default, so running without a config file is
// the normal case. A file can:
// - tune link probing ([link]: timeout, worker cap, cache bound, user agent)
// - override strictness per document type ([policy.<type>])
// - replace the expected sections per document type ([[sections.<type>]])
//
// Section patterns are NOT compiled here. A bad pattern degrades only the
// section check of the documents that use it; the rest of the report stays.
// =============================================================================

use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;

use crate::checker::sections::{builtin_sections, SectionSpec};
use crate::error::{CheckError, Result};
use crate::policy::{CheckPolicy, DocType, Strictness};

/// Link probing settings
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LinkSettings {
    /// Per-probe deadline
    pub timeout_secs: u64,
    /// Maximum probes in flight at once
    pub max_concurrent: usize,
    /// Maximum number of cached link outcomes
    pub cache_capacity: usize,
    pub user_agent: String,
}

impl Default for LinkSettings {
    fn default() -> Self {
        LinkSettings {
            timeout_secs: 3,
            max_concurrent: 10,
            cache_capacity: 1024,
            user_agent: concat!("doc-guardian/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

/// Partial policy: unset fields keep the built-in value
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PolicyOverride {
    pub code_block_check: Option<Strictness>,
    pub link_check: Option<Strictness>,
    pub heading_structure_check: Option<Strictness>,
}

impl PolicyOverride {
    fn apply(&self, base: CheckPolicy) -> CheckPolicy {
        CheckPolicy {
            code_block_check: self.code_block_check.unwrap_or(base.code_block_check),
            link_check: self.link_check.unwrap_or(base.link_check),
            heading_structure_check: self
                .heading_structure_check
                .unwrap_or(base.heading_structure_check),
        }
    }
}

// The file as written. Table keys are document type names.
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct RawConfig {
    link: LinkSettings,
    policy: BTreeMap<String, PolicyOverride>,
    sections: BTreeMap<String, Vec<SectionSpec>>,
}

/// Resolved configuration
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Config {
    pub link: LinkSettings,
    policies: BTreeMap<DocType, PolicyOverride>,
    sections: BTreeMap<DocType, Vec<SectionSpec>>,
}

impl Config {
    // Loads and validates a config file
    pub fn load(path: &Path) -> Result<Config> {
        let content = std::fs::read_to_string(path).map_err(|source| CheckError::ConfigRead {
            path: path.to_path_buf(),
            source,
        })?;
        Config::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Config> {
        let raw: RawConfig = toml::from_str(content)?;

        if raw.link.max_concurrent == 0 {
            return Err(CheckError::Config("link.max_concurrent must be at least 1".into()));
        }
        if raw.link.timeout_secs == 0 {
            return Err(CheckError::Config("link.timeout_secs must be at least 1".into()));
        }
        if raw.link.cache_capacity == 0 {
            return Err(CheckError::Config("link.cache_capacity must be at least 1".into()));
        }

        Ok(Config {
            link: raw.link,
            policies: keyed_by_doc_type("policy", raw.policy)?,
            sections: keyed_by_doc_type("sections", raw.sections)?,
        })
    }

    // The effective policy for a document type
    pub fn policy_for(&self, doc_type: DocType) -> CheckPolicy {
        let base = CheckPolicy::builtin(doc_type);
        match self.policies.get(&doc_type) {
            Some(overrides) => overrides.apply(base),
            None => base,
        }
    }

    // The effective section list for a document type
    pub fn sections_for(&self, doc_type: DocType) -> Vec<SectionSpec> {
        match self.sections.get(&doc_type) {
            Some(specs) => specs.clone(),
            None => builtin_sections(doc_type),
        }
    }
}

// Unknown document type names in a config file are errors, not fallbacks
fn keyed_by_doc_type<T>(table: &str, entries: BTreeMap<String, T>) -> Result<BTreeMap<DocType, T>> {
    entries
        .into_iter()
        .map(|(name, value)| match DocType::parse(&name) {
            Some(doc_type) => Ok((doc_type, value)),
            None => Err(CheckError::Config(format!(
                "unknown document type '{}' in [{}]",
                name, table
            ))),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_empty_config_is_builtin_behavior() {
        let config = Config::from_toml("").unwrap();
        assert_eq!(config.link, LinkSettings::default());
        assert_eq!(config.link.timeout_secs, 3);
        assert_eq!(config.link.max_concurrent, 10);
        for doc_type in DocType::ALL {
            assert_eq!(config.policy_for(doc_type), CheckPolicy::builtin(doc_type));
            assert_eq!(config.sections_for(doc_type), builtin_sections(doc_type));
        }
    }

    #[test]
    fn test_policy_override_keeps_unset_fields() {
        let config = Config::from_toml(
            r#"
[policy.wiki]
link_check = "loose"
"#,
        )
        .unwrap();
        let wiki = config.policy_for(DocType::Wiki);
        assert_eq!(wiki.link_check, Strictness::Loose);
        assert_eq!(wiki.code_block_check, Strictness::Normal);
        assert_eq!(wiki.heading_structure_check, Strictness::Strict);
    }

    #[test]
    fn test_sections_replace_builtin_list() {
        let config = Config::from_toml(
            r#"
[[sections.code-of-conduct]]
name = "Scope"
patterns = ["scope", "适用范围"]

[[sections.code-of-conduct]]
name = "Attribution"
patterns = ["attribution"]
required = false
"#,
        )
        .unwrap();
        let specs = config.sections_for(DocType::CodeOfConduct);
        assert_eq!(specs.len(), 2);
        assert!(specs[0].required);
        assert!(!specs[1].required);
        assert_eq!(config.sections_for(DocType::Readme), builtin_sections(DocType::Readme));
    }

    #[test]
    fn test_unknown_doc_type_is_rejected() {
        let err = Config::from_toml("[policy.manual]\nlink_check = \"strict\"\n").unwrap_err();
        assert!(matches!(err, CheckError::Config(_)));
        assert!(err.to_string().contains("manual"));
    }

    #[test]
    fn test_zero_limits_are_rejected() {
        assert!(Config::from_toml("[link]\nmax_concurrent = 0\n").is_err());
        assert!(Config::from_toml("[link]\ntimeout_secs = 0\n").is_err());
        assert!(Config::from_toml("[link]\ncache_capacity = 0\n").is_err());
    }

    #[test]
    fn test_bad_strictness_is_a_toml_error() {
        let err = Config::from_toml("[policy.readme]\nlink_check = \"brutal\"\n").unwrap_err();
        assert!(matches!(err, CheckError::TomlParse(_)));
    }

    #[test]
    fn test_load_from_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("doc-guardian.toml");
        fs::write(&path, "[link]\ntimeout_secs = 5\nuser_agent = \"ci-bot\"\n").unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.link.timeout_secs, 5);
        assert_eq!(config.link.user_agent, "ci-bot");
        assert_eq!(config.link.max_concurrent, 10);
    }

    #[test]
    fn test_missing_file_names_the_path() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("absent.toml");
        let err = Config::load(&path).unwrap_err();
        assert!(matches!(err, CheckError::ConfigRead { .. }));
        assert!(err.to_string().contains("absent.toml"));
    }
}
