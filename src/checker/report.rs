// src/checker/report.rs
// =============================================================================
// The CheckReport and its per-category result records.
//
// A report always has all five categories plus a summary. A category that
// hit an internal error is still present: check_passed is false, counts are
// zero, lists are empty and `error` says what went wrong. Consumers never
// see a null where they expect a list.
//
// Everything here serializes to the JSON shape returned to callers.
// =============================================================================

use serde::Serialize;
use std::collections::BTreeMap;

use super::http::LinkStatus;
use super::markdown::{FormatIssue, Heading, LinkKind};
use crate::policy::{DocType, Strictness};

/// The terminal artifact of one check run
#[derive(Debug, Clone, Serialize)]
pub struct CheckReport {
    pub link_check: LinkCheck,
    pub code_block_check: CodeBlockCheck,
    pub heading_structure_check: HeadingStructureCheck,
    pub section_completeness_check: SectionCompletenessCheck,
    pub markdown_syntax_check: MarkdownSyntaxCheck,
    pub summary: Summary,
}

impl CheckReport {
    // Assembles the report and derives the summary from the five categories
    pub fn new(
        link_check: LinkCheck,
        code_block_check: CodeBlockCheck,
        heading_structure_check: HeadingStructureCheck,
        section_completeness_check: SectionCompletenessCheck,
        markdown_syntax_check: MarkdownSyntaxCheck,
    ) -> Self {
        let summary = Summary::from_categories(&[
            &link_check,
            &code_block_check,
            &heading_structure_check,
            &section_completeness_check,
            &markdown_syntax_check,
        ]);
        CheckReport {
            link_check,
            code_block_check,
            heading_structure_check,
            section_completeness_check,
            markdown_syntax_check,
            summary,
        }
    }

    pub fn passed(&self) -> bool {
        self.summary.overall_passed
    }
}

/// What the summary needs to know about each category
pub trait CategoryOutcome {
    fn passed(&self) -> bool;

    /// Set when the category degraded because of an internal error
    fn error(&self) -> Option<&str>;

    /// Number of issues this category contributes when it fails
    fn issue_count(&self) -> usize;

    /// Human-readable issue lines this category contributes when it fails
    fn issue_messages(&self) -> Vec<String>;
}

/// Roll-up of the five categories
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Summary {
    pub total_checks: usize,
    pub passed_checks: usize,
    pub failed_checks: usize,
    pub total_issues: usize,
    pub all_issues: Vec<String>,
    pub overall_passed: bool,
}

impl Summary {
    pub fn from_categories(categories: &[&dyn CategoryOutcome]) -> Self {
        let mut passed_checks = 0;
        let mut failed_checks = 0;
        let mut total_issues = 0;
        let mut all_issues = Vec::new();

        for category in categories {
            if category.passed() {
                passed_checks += 1;
                continue;
            }
            failed_checks += 1;
            match category.error() {
                Some(error) => {
                    total_issues += 1;
                    all_issues.push(error.to_string());
                }
                None => {
                    total_issues += category.issue_count();
                    all_issues.extend(category.issue_messages());
                }
            }
        }

        Summary {
            total_checks: passed_checks + failed_checks,
            passed_checks,
            failed_checks,
            total_issues,
            all_issues,
            overall_passed: failed_checks == 0,
        }
    }
}

// -----------------------------------------------------------------------------
// Links
// -----------------------------------------------------------------------------

/// One probed (or trivially accepted) link
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LinkOutcome {
    pub text: String,
    pub url: String,
    #[serde(rename = "type")]
    pub kind: LinkKind,
    pub status: LinkStatus,
    pub status_code: Option<u16>,
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LinkCheck {
    pub total_links: usize,
    pub valid_links: usize,
    pub invalid_links: usize,
    pub timeout_links: usize,
    pub valid_links_list: Vec<LinkOutcome>,
    pub invalid_links_list: Vec<LinkOutcome>,
    pub timeout_links_list: Vec<LinkOutcome>,
    pub check_passed: bool,
    pub strictness: Strictness,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl LinkCheck {
    pub fn failed(strictness: Strictness, error: String) -> Self {
        LinkCheck {
            total_links: 0,
            valid_links: 0,
            invalid_links: 0,
            timeout_links: 0,
            valid_links_list: Vec::new(),
            invalid_links_list: Vec::new(),
            timeout_links_list: Vec::new(),
            check_passed: false,
            strictness,
            note: None,
            error: Some(error),
        }
    }

    fn timeouts_count(&self) -> bool {
        self.strictness == Strictness::Strict
    }
}

impl CategoryOutcome for LinkCheck {
    fn passed(&self) -> bool {
        self.check_passed
    }

    fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    fn issue_count(&self) -> usize {
        let timeouts = if self.timeouts_count() { self.timeout_links } else { 0 };
        self.invalid_links + timeouts
    }

    fn issue_messages(&self) -> Vec<String> {
        let mut messages: Vec<String> = self
            .invalid_links_list
            .iter()
            .map(|link| match &link.error {
                Some(detail) => format!("Broken link: {} ({})", link.url, detail),
                None => format!("Broken link: {}", link.url),
            })
            .collect();
        if self.timeouts_count() {
            messages.extend(
                self.timeout_links_list
                    .iter()
                    .map(|link| format!("Link timed out: {}", link.url)),
            );
        }
        messages
    }
}

// -----------------------------------------------------------------------------
// Code blocks
// -----------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CodeBlockCheck {
    pub total_code_blocks: usize,
    pub blocks_with_language: usize,
    pub blocks_without_language: usize,
    /// Sorted, unique
    pub languages_used: Vec<String>,
    pub language_counts: BTreeMap<String, usize>,
    pub check_passed: bool,
    pub strictness: Strictness,
    pub issues: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl CodeBlockCheck {
    pub fn failed(strictness: Strictness, error: String) -> Self {
        CodeBlockCheck {
            total_code_blocks: 0,
            blocks_with_language: 0,
            blocks_without_language: 0,
            languages_used: Vec::new(),
            language_counts: BTreeMap::new(),
            check_passed: false,
            strictness,
            issues: Vec::new(),
            note: None,
            error: Some(error),
        }
    }
}

impl CategoryOutcome for CodeBlockCheck {
    fn passed(&self) -> bool {
        self.check_passed
    }

    fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    fn issue_count(&self) -> usize {
        self.blocks_without_language
    }

    fn issue_messages(&self) -> Vec<String> {
        self.issues.clone()
    }
}

// -----------------------------------------------------------------------------
// Heading structure
// -----------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum HeadingIssueKind {
    LevelSkip,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HeadingIssue {
    #[serde(rename = "type")]
    pub kind: HeadingIssueKind,
    pub heading: String,
    pub level: u8,
    pub prev_level: u8,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HeadingStructureCheck {
    pub total_headings: usize,
    /// "h1".."h6" -> count
    pub level_counts: BTreeMap<String, usize>,
    pub headings: Vec<Heading>,
    pub issues: Vec<HeadingIssue>,
    pub check_passed: bool,
    pub strictness: Strictness,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl HeadingStructureCheck {
    pub fn failed(strictness: Strictness, error: String) -> Self {
        HeadingStructureCheck {
            total_headings: 0,
            level_counts: BTreeMap::new(),
            headings: Vec::new(),
            issues: Vec::new(),
            check_passed: false,
            strictness,
            note: None,
            error: Some(error),
        }
    }
}

impl CategoryOutcome for HeadingStructureCheck {
    fn passed(&self) -> bool {
        self.check_passed
    }

    fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    fn issue_count(&self) -> usize {
        self.issues.len()
    }

    fn issue_messages(&self) -> Vec<String> {
        self.issues.iter().map(|issue| issue.message.clone()).collect()
    }
}

// -----------------------------------------------------------------------------
// Section completeness
// -----------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FoundSection {
    pub name: String,
    /// The heading text that matched
    pub heading: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SectionCompletenessCheck {
    pub doc_type: DocType,
    pub total_required_sections: usize,
    pub found_sections: usize,
    pub missing_sections: Vec<String>,
    pub found_sections_list: Vec<FoundSection>,
    pub check_passed: bool,
    pub issues: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl SectionCompletenessCheck {
    pub fn failed(doc_type: DocType, error: String) -> Self {
        SectionCompletenessCheck {
            doc_type,
            total_required_sections: 0,
            found_sections: 0,
            missing_sections: Vec::new(),
            found_sections_list: Vec::new(),
            check_passed: false,
            issues: Vec::new(),
            error: Some(error),
        }
    }
}

impl CategoryOutcome for SectionCompletenessCheck {
    fn passed(&self) -> bool {
        self.check_passed
    }

    fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    fn issue_count(&self) -> usize {
        self.missing_sections.len()
    }

    fn issue_messages(&self) -> Vec<String> {
        self.issues.clone()
    }
}

// -----------------------------------------------------------------------------
// Markdown syntax
// -----------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MarkdownSyntaxCheck {
    pub parse_success: bool,
    pub total_issues: usize,
    pub total_warnings: usize,
    /// Error severity: must be fixed
    pub issues: Vec<FormatIssue>,
    /// Warning severity: stylistic
    pub warnings: Vec<FormatIssue>,
    pub check_passed: bool,
    pub summary: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl MarkdownSyntaxCheck {
    pub fn failed(error: String) -> Self {
        MarkdownSyntaxCheck {
            parse_success: false,
            total_issues: 0,
            total_warnings: 0,
            issues: Vec::new(),
            warnings: Vec::new(),
            check_passed: false,
            summary: "0 errors, 0 warnings".to_string(),
            error: Some(error),
        }
    }
}

impl CategoryOutcome for MarkdownSyntaxCheck {
    fn passed(&self) -> bool {
        self.check_passed
    }

    fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    fn issue_count(&self) -> usize {
        self.total_issues
    }

    fn issue_messages(&self) -> Vec<String> {
        self.issues.iter().map(|issue| issue.message.clone()).collect()
    }
}
