// src/checker/mod.rs
// =============================================================================
// The check orchestrator.
//
// Checker::check() takes a document and its type and always returns a
// complete CheckReport:
// 1. resolve the CheckPolicy for the type (unknown hints -> readme)
// 2. scan the Markdown once (markdown.rs)
// 3. run the five category checks against the scan:
//      links            -> http.rs (network, bounded fan-out, cache)
//      code blocks      -> structure.rs
//      heading structure-> structure.rs
//      sections         -> sections.rs
//      markdown syntax  -> syntax.rs
// 4. aggregate into the summary (report.rs)
//
// Each category runs behind its own boundary: an error or panic inside one
// check turns into a failed entry for that category and nothing else.
// =============================================================================

pub mod batch;
pub mod http;
pub mod markdown;
pub mod report;
pub mod sections;
pub mod structure;
pub mod syntax;

use futures::FutureExt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use tracing::{debug, warn};

use crate::config::Config;
use crate::error::{CheckError, Result};
use crate::policy::{CheckPolicy, DocType};
use http::{HttpProbe, LinkProbe, LinkResolver};
use report::{
    CheckReport, CodeBlockCheck, HeadingStructureCheck, LinkCheck, MarkdownSyntaxCheck,
    SectionCompletenessCheck,
};

pub use http::{LinkCheckResult, LinkStatus};
pub use markdown::{scan, Heading, LinkKind, LinkRecord, ScannedDocument};

/// The document auditor
///
/// Holds the configuration and the link resolver (and with it the link
/// cache), so reusing one Checker across documents avoids re-probing URLs.
pub struct Checker {
    config: Config,
    resolver: LinkResolver,
}

impl Checker {
    // Creates a checker that probes links over HTTP
    pub fn new(config: Config) -> Result<Self> {
        let probe = HttpProbe::new(&config.link)?;
        Ok(Checker::with_probe(config, Arc::new(probe)))
    }

    // Creates a checker with a custom link probe
    pub fn with_probe(config: Config, probe: Arc<dyn LinkProbe>) -> Self {
        let resolver = LinkResolver::new(probe, &config.link);
        Checker { config, resolver }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn resolver(&self) -> &LinkResolver {
        &self.resolver
    }

    pub fn policy_for(&self, doc_type: DocType) -> CheckPolicy {
        self.config.policy_for(doc_type)
    }

    // Checks a document whose type comes from a free-form hint
    pub async fn check_hint(&self, markdown: &str, doc_type_hint: &str) -> CheckReport {
        self.check(markdown, DocType::from_hint(doc_type_hint)).await
    }

    // Runs every category check and aggregates the report
    //
    // Parameters:
    //   markdown: the raw document (never modified)
    //   doc_type: drives the strictness policy and the expected sections
    //
    // Returns: a complete report; this never fails
    pub async fn check(&self, markdown: &str, doc_type: DocType) -> CheckReport {
        let policy = self.policy_for(doc_type);
        debug!(%doc_type, ?policy, bytes = markdown.len(), "checking document");

        let scanned = scan(markdown);

        let link_check = self.guarded_link_check(&scanned, policy).await;

        let code_block_check = guarded(
            "code_block_check",
            |error| CodeBlockCheck::failed(policy.code_block_check, error),
            || {
                Ok(structure::check_code_blocks(
                    &scanned.code_blocks,
                    policy.code_block_check,
                ))
            },
        );

        let heading_structure_check = guarded(
            "heading_structure_check",
            |error| HeadingStructureCheck::failed(policy.heading_structure_check, error),
            || {
                Ok(structure::check_heading_structure(
                    &scanned.headings,
                    policy.heading_structure_check,
                ))
            },
        );

        let section_completeness_check = guarded(
            "section_completeness_check",
            |error| SectionCompletenessCheck::failed(doc_type, error),
            || {
                let specs = self.config.sections_for(doc_type);
                sections::check_sections(&scanned.headings, doc_type, &specs)
            },
        );

        let markdown_syntax_check = guarded(
            "markdown_syntax_check",
            MarkdownSyntaxCheck::failed,
            || Ok(syntax::check_syntax(markdown, &scanned)),
        );

        CheckReport::new(
            link_check,
            code_block_check,
            heading_structure_check,
            section_completeness_check,
            markdown_syntax_check,
        )
    }

    async fn guarded_link_check(&self, scanned: &ScannedDocument, policy: CheckPolicy) -> LinkCheck {
        let strictness = policy.link_check;
        let run = self.resolver.check_links(&scanned.links, strictness);
        match AssertUnwindSafe(run).catch_unwind().await {
            Ok(check) => check,
            Err(payload) => {
                let error = CheckError::Internal {
                    category: "link_check".to_string(),
                    message: syntax::panic_message(payload.as_ref()),
                };
                warn!(%error, "link check degraded");
                LinkCheck::failed(strictness, error.to_string())
            }
        }
    }
}

// Runs one synchronous category check behind an error/panic boundary
fn guarded<T>(
    category: &str,
    on_failure: impl FnOnce(String) -> T,
    run: impl FnOnce() -> Result<T>,
) -> T {
    let error = match panic::catch_unwind(AssertUnwindSafe(run)) {
        Ok(Ok(result)) => return result,
        Ok(Err(error)) => error,
        Err(payload) => CheckError::Internal {
            category: category.to_string(),
            message: syntax::panic_message(payload.as_ref()),
        },
    };
    warn!(category, %error, "category check degraded");
    on_failure(error.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::Strictness;
    use super::http::tests::FakeProbe;

    fn checker_with(probe: Arc<FakeProbe>) -> Checker {
        Checker::with_probe(Config::default(), probe)
    }

    fn checker() -> Checker {
        checker_with(Arc::new(FakeProbe::new(&[])))
    }

    const SCENARIO: &str =
        "# Title\n\n## Installation\n\n```bash\npip install x\n```\n\n##Usage\n- item";

    #[tokio::test]
    async fn test_end_to_end_readme_scenario() {
        let report = checker().check(SCENARIO, DocType::Readme).await;

        assert!(report.code_block_check.check_passed);
        assert_eq!(report.code_block_check.strictness, Strictness::Strict);
        assert_eq!(report.code_block_check.languages_used, vec!["bash"]);

        // "##Usage" is not a heading
        let texts: Vec<&str> = report
            .heading_structure_check
            .headings
            .iter()
            .map(|h| h.text.as_str())
            .collect();
        assert_eq!(texts, vec!["Title", "Installation"]);

        let sections = &report.section_completeness_check;
        assert!(sections.missing_sections.contains(&"Usage".to_string()));
        assert!(!sections.check_passed);

        // "- item" is a well-formed list item
        assert!(!report
            .markdown_syntax_check
            .issues
            .iter()
            .any(|issue| issue.kind == markdown::FormatKind::ListFormat));

        assert_eq!(report.link_check.total_links, 0);
        assert!(report.link_check.check_passed);
        assert!(!report.summary.overall_passed);
        assert_eq!(report.summary.total_checks, 5);
    }

    #[tokio::test]
    async fn test_report_has_exactly_the_documented_top_level_keys() {
        let report = checker().check(SCENARIO, DocType::Readme).await;
        let json = serde_json::to_value(&report).unwrap();
        let mut keys: Vec<&str> = json.as_object().unwrap().keys().map(|k| k.as_str()).collect();
        keys.sort_unstable();
        assert_eq!(
            keys,
            vec![
                "code_block_check",
                "heading_structure_check",
                "link_check",
                "markdown_syntax_check",
                "section_completeness_check",
                "summary",
            ]
        );
        for key in ["link_check", "code_block_check", "heading_structure_check"] {
            assert!(json[key]["strictness"].is_string(), "{}", key);
        }
        for key in keys.iter().filter(|k| **k != "summary") {
            assert!(json[*key]["check_passed"].is_boolean(), "{}", key);
        }
    }

    #[tokio::test]
    async fn test_identical_input_gives_identical_report() {
        let markdown = "# A\nSee [x](https://a.dev), [y](https://b.dev) and https://c.dev\n### C\n";
        let probe = || {
            Arc::new(FakeProbe::new(&[(
                "https://b.dev",
                LinkCheckResult::invalid(Some(500), "HTTP 500"),
            )]))
        };
        let first = checker_with(probe()).check(markdown, DocType::Readme).await;
        let second = checker_with(probe()).check(markdown, DocType::Readme).await;
        assert_eq!(
            serde_json::to_string(&first).unwrap(),
            serde_json::to_string(&second).unwrap()
        );
    }

    #[tokio::test]
    async fn test_links_are_probed_once_across_documents() {
        let probe = Arc::new(FakeProbe::new(&[]));
        let checker = checker_with(Arc::clone(&probe));
        let markdown = "[a](https://a.dev) https://b.dev";

        checker.check(markdown, DocType::Readme).await;
        let report = checker.check(markdown, DocType::Readme).await;

        assert_eq!(probe.calls(), 2);
        assert_eq!(checker.resolver().cache().len(), 2);
        assert_eq!(report.link_check.valid_links, 2);
    }

    #[tokio::test]
    async fn test_license_skips_network_and_sections() {
        let probe = Arc::new(FakeProbe::new(&[]));
        let checker = checker_with(Arc::clone(&probe));
        let license = "MIT License\n\nCopyright (c) 2024\n\nhttps://opensource.org/licenses/MIT\n";

        let report = checker.check(license, DocType::License).await;

        assert_eq!(probe.calls(), 0);
        assert!(report.passed(), "{:?}", report.summary.all_issues);
        assert_eq!(report.link_check.strictness, Strictness::Loose);
        assert_eq!(report.link_check.total_links, 1);
        assert_eq!(report.code_block_check.strictness, Strictness::Skip);
        assert_eq!(report.section_completeness_check.total_required_sections, 0);
    }

    #[test]
    fn test_config_overrides_reach_the_policy() {
        let config = Config::from_toml("[policy.readme]\nlink_check = \"normal\"\n").unwrap();
        let checker = Checker::with_probe(config, Arc::new(FakeProbe::new(&[])));
        assert_eq!(checker.config().link.max_concurrent, 10);
        assert_eq!(checker.policy_for(DocType::Readme).link_check, Strictness::Normal);
    }

    #[tokio::test]
    async fn test_unknown_hint_uses_readme_policy() {
        let report = checker().check_hint("# Title\n", "manual").await;
        assert_eq!(report.section_completeness_check.doc_type, DocType::Readme);
        assert_eq!(report.heading_structure_check.strictness, Strictness::Strict);
    }

    #[tokio::test]
    async fn test_bad_section_pattern_degrades_only_that_category() {
        let config = Config::from_toml(
            "[[sections.readme]]\nname = \"Broken\"\npatterns = [\"(unclosed\"]\n",
        )
        .unwrap();
        let checker = Checker::with_probe(config, Arc::new(FakeProbe::new(&[])));

        let report = checker.check("# Title\n\n```rust\nfn main() {}\n```\n", DocType::Readme).await;

        let sections = &report.section_completeness_check;
        assert!(!sections.check_passed);
        assert!(sections.error.as_deref().unwrap().contains("Broken"));
        assert!(sections.missing_sections.is_empty());

        assert!(report.code_block_check.check_passed);
        assert!(report.markdown_syntax_check.check_passed);
        assert_eq!(report.summary.failed_checks, 1);
        assert_eq!(report.summary.total_issues, 1);
    }

    #[tokio::test]
    async fn test_strict_link_failures_roll_up_into_summary() {
        let probe = Arc::new(FakeProbe::new(&[
            ("https://gone.dev", LinkCheckResult::invalid(Some(404), "HTTP 404")),
            ("https://slow.dev", LinkCheckResult::timeout()),
        ]));
        let markdown = "\
# Tool
## About
## Features
## Install
## Usage
[gone](https://gone.dev) [slow](https://slow.dev) [ok](https://ok.dev)
";
        let report = checker_with(probe).check(markdown, DocType::Readme).await;

        assert!(!report.link_check.check_passed);
        assert_eq!(report.summary.failed_checks, 1);
        assert_eq!(report.summary.total_issues, 2);
        assert_eq!(
            report.summary.all_issues,
            vec![
                "Broken link: https://gone.dev (HTTP 404)".to_string(),
                "Link timed out: https://slow.dev".to_string(),
            ]
        );
    }

    #[test]
    fn test_guarded_converts_errors_and_panics() {
        let from_error = guarded("x", |e| e, || {
            Err(CheckError::Config("bad".to_string()))
        });
        assert_eq!(from_error, "Configuration error: bad");

        let from_panic: String = guarded("x", |e| e, || panic!("kaboom"));
        assert_eq!(from_panic, "Internal error in x: kaboom");

        let ok = guarded("x", |e| e, || Ok("fine".to_string()));
        assert_eq!(ok, "fine");
    }
}
