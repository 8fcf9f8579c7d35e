// src/checker/sections.rs
// =============================================================================
// Section completeness: does the document have the sections its type needs?
//
// Each document type maps to an ordered list of SectionSpecs. A spec is
// found when any of its patterns matches any heading (case-insensitive,
// first match wins). Patterns cover English and Chinese phrasing.
//
// The built-in table below is plain data. The config file can replace the
// list for any document type without touching this code.
// =============================================================================

use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};

use super::markdown::Heading;
use super::report::{FoundSection, SectionCompletenessCheck};
use crate::error::{CheckError, Result};
use crate::policy::DocType;

/// One expected section of a document type
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectionSpec {
    /// Human-readable name used in the report
    pub name: String,
    /// Case-insensitive regex alternatives matched against heading text
    pub patterns: Vec<String>,
    #[serde(default = "default_required")]
    pub required: bool,
}

fn default_required() -> bool {
    true
}

type Row = (&'static str, &'static [&'static str], bool);

const README: &[Row] = &[
    ("Introduction", &["简介", "介绍", "introduction", "about"], true),
    ("Features", &["功能", "特性", "features"], true),
    ("Installation", &["安装", "installation", "install", "getting started"], true),
    ("Usage", &["使用", "用法", "usage", "使用方法", "how to use"], true),
];

const CONTRIBUTING: &[Row] = &[
    (
        "Contribution Workflow",
        &["贡献", "contributing", "how to contribute", "pull request", "流程", "workflow"],
        true,
    ),
    ("Development Setup", &["环境", "setup", "development", "environment", "install"], true),
    ("Code Style", &["代码规范", "code style", "coding standards", "style guide"], true),
    ("Testing", &["测试", "test", "testing"], false),
];

const CHANGELOG: &[Row] = &[
    ("Unreleased", &["unreleased", "未发布"], false),
    ("Version History", &[r"v?\d+\.\d+", "version", r"\d{4}-\d{2}-\d{2}"], true),
];

const CODE_OF_CONDUCT: &[Row] = &[
    ("Pledge", &["pledge", "commitment", "承诺"], false),
    ("Standards", &["standards", "behavior", "准则", "行为"], true),
    ("Enforcement", &["enforcement", "reporting", "contact", "举报", "联系"], true),
];

// Licenses are boilerplate; their structure is not audited
const LICENSE: &[Row] = &[];

const SECURITY: &[Row] = &[
    (
        "Reporting a Vulnerability",
        &["reporting", "report", "漏洞", "vulnerability", "security issue"],
        true,
    ),
    ("Contact", &["contact", "email", "联系", "报告地址"], true),
    ("Response Process", &["process", "response", "disclosure", "流程"], false),
    ("Supported Versions", &["supported versions", "支持版本", "version"], false),
];

const SUPPORT: &[Row] = &[
    (
        "Getting Help",
        &["getting help", "how to get help", "获取帮助", "如何提问", "how to ask", "asking for help"],
        true,
    ),
    ("Resources", &["resources", "documentation", "资源", "文档", "links"], false),
    ("Community", &["community", "forum", "社区", "论坛", "discussion"], false),
];

const WIKI: &[Row] = &[
    ("Table of Contents", &["table of contents", "index", "目录", "索引", "导航"], false),
    ("Overview", &["overview", "introduction", "概述", "简介"], false),
];

const DOCS: &[Row] = &[
    ("Quick Start", &["quick start", "getting started", "快速开始", "入门"], true),
    ("Navigation", &["table of contents", "navigation", "目录", "导航"], false),
    ("Structure", &["documentation", "structure", "文档", "guide"], false),
];

const INSTALLATION: &[Row] = &[
    ("Prerequisites", &["requirements", "prerequisites", "前置", "依赖"], true),
    ("Installation Steps", &["installation", "install", "setup", "安装步骤", "安装方法"], true),
    ("Verify Installation", &["verify", "test", "验证", "测试"], false),
    ("Troubleshooting", &["troubleshooting", "问题", "常见错误", "faq"], false),
];

const USAGE: &[Row] = &[
    ("Basic Usage", &["basic usage", "基本用法", "快速开始", "getting started"], true),
    ("Examples", &["examples", "示例", "example"], true),
    ("Advanced Usage", &["advanced", "高级", "进阶"], false),
];

const API: &[Row] = &[
    ("Overview", &["overview", "introduction", "概述", "简介"], false),
    (
        "Methods",
        &["methods", "functions", "endpoints", "接口", "方法", "api"],
        true,
    ),
    ("Parameters", &["parameters", "arguments", "参数"], false),
    ("Examples", &["examples", "示例", "usage"], false),
];

// The built-in section list for a document type
pub fn builtin_sections(doc_type: DocType) -> Vec<SectionSpec> {
    let rows = match doc_type {
        DocType::Readme => README,
        DocType::Contributing => CONTRIBUTING,
        DocType::Changelog => CHANGELOG,
        DocType::CodeOfConduct => CODE_OF_CONDUCT,
        DocType::License => LICENSE,
        DocType::Security => SECURITY,
        DocType::Support => SUPPORT,
        DocType::Wiki => WIKI,
        DocType::Docs => DOCS,
        DocType::Installation => INSTALLATION,
        DocType::Usage => USAGE,
        DocType::Api => API,
    };
    rows.iter()
        .map(|(name, patterns, required)| SectionSpec {
            name: name.to_string(),
            patterns: patterns.iter().map(|p| p.to_string()).collect(),
            required: *required,
        })
        .collect()
}

// Compiles every pattern of a spec, case-insensitively
fn compile(spec: &SectionSpec) -> Result<Vec<Regex>> {
    spec.patterns
        .iter()
        .map(|pattern| {
            RegexBuilder::new(pattern)
                .case_insensitive(true)
                .build()
                .map_err(|source| CheckError::InvalidPattern {
                    section: spec.name.clone(),
                    pattern: pattern.clone(),
                    source,
                })
        })
        .collect()
}

// The section completeness category check
//
// Parameters:
//   headings: headings extracted by the scanner
//   doc_type: the resolved document type (echoed in the report)
//   specs: the section list for that type
//
// Returns: the category result, or InvalidPattern if a configured pattern
//          does not compile (the orchestrator turns that into a failed entry)
pub fn check_sections(
    headings: &[Heading],
    doc_type: DocType,
    specs: &[SectionSpec],
) -> Result<SectionCompletenessCheck> {
    let mut found = Vec::new();
    let mut missing = Vec::new();

    for spec in specs {
        let patterns = compile(spec)?;
        let matched = headings
            .iter()
            .find(|heading| patterns.iter().any(|re| re.is_match(&heading.text)));

        match matched {
            Some(heading) => found.push(FoundSection {
                name: spec.name.clone(),
                heading: heading.text.clone(),
            }),
            None if spec.required => missing.push(spec.name.clone()),
            None => {}
        }
    }

    let issues = missing
        .iter()
        .map(|name| format!("Missing required section: {}", name))
        .collect();

    Ok(SectionCompletenessCheck {
        doc_type,
        total_required_sections: specs.iter().filter(|spec| spec.required).count(),
        found_sections: found.len(),
        check_passed: missing.is_empty(),
        missing_sections: missing,
        found_sections_list: found,
        issues,
        error: None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checker::markdown::scan;

    fn headings(markdown: &str) -> Vec<Heading> {
        scan(markdown).headings
    }

    #[test]
    fn test_every_builtin_pattern_compiles() {
        for doc_type in DocType::ALL {
            for spec in builtin_sections(doc_type) {
                assert!(compile(&spec).is_ok(), "{} / {}", doc_type, spec.name);
            }
        }
    }

    #[test]
    fn test_no_headings_reports_every_required_section_missing() {
        for doc_type in DocType::ALL {
            let specs = builtin_sections(doc_type);
            let required = specs.iter().filter(|s| s.required).count();
            let check = check_sections(&[], doc_type, &specs).unwrap();
            assert_eq!(check.missing_sections.len(), required, "{}", doc_type);
            assert_eq!(check.check_passed, required == 0);
        }
    }

    #[test]
    fn test_license_has_no_required_sections() {
        let check = check_sections(&[], DocType::License, &builtin_sections(DocType::License)).unwrap();
        assert_eq!(check.total_required_sections, 0);
        assert!(check.check_passed);
    }

    #[test]
    fn test_complete_readme_passes() {
        let hs = headings("# My Tool\n## About\n## Features\n## Getting Started\n## How to use\n");
        let check = check_sections(&hs, DocType::Readme, &builtin_sections(DocType::Readme)).unwrap();
        assert!(check.check_passed, "{:?}", check.missing_sections);
        assert_eq!(check.total_required_sections, 4);
        assert_eq!(check.found_sections, 4);
        assert_eq!(check.found_sections_list[2].heading, "Getting Started");
    }

    #[test]
    fn test_matching_is_case_insensitive_and_bilingual() {
        let hs = headings("# 项目简介\n## 功能特性\n## INSTALLATION\n## 使用方法\n");
        let check = check_sections(&hs, DocType::Readme, &builtin_sections(DocType::Readme)).unwrap();
        assert!(check.check_passed, "{:?}", check.missing_sections);
    }

    #[test]
    fn test_optional_sections_are_listed_but_never_missing() {
        let hs = headings("# Contributing\n## Development setup\n## Code style\n");
        let check = check_sections(&hs, DocType::Contributing, &builtin_sections(DocType::Contributing)).unwrap();
        assert!(check.check_passed);
        assert_eq!(check.total_required_sections, 3);
        assert!(!check.found_sections_list.iter().any(|f| f.name == "Testing"));
    }

    #[test]
    fn test_changelog_versions_match_version_history() {
        let hs = headings("# Changelog\n## [1.2.0] - 2024-01-01\n");
        let check = check_sections(&hs, DocType::Changelog, &builtin_sections(DocType::Changelog)).unwrap();
        assert!(check.check_passed);
    }

    #[test]
    fn test_missing_sections_produce_issues() {
        let hs = headings("# Title\n## Installation\n");
        let check = check_sections(&hs, DocType::Readme, &builtin_sections(DocType::Readme)).unwrap();
        assert!(!check.check_passed);
        assert_eq!(check.missing_sections, vec!["Introduction", "Features", "Usage"]);
        assert_eq!(check.issues[2], "Missing required section: Usage");
    }

    #[test]
    fn test_invalid_pattern_is_an_error() {
        let specs = vec![SectionSpec {
            name: "Broken".to_string(),
            patterns: vec!["(unclosed".to_string()],
            required: true,
        }];
        let err = check_sections(&[], DocType::Readme, &specs).unwrap_err();
        assert!(matches!(err, CheckError::InvalidPattern { .. }));
    }
}
