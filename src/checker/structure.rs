// src/checker/structure.rs
// =============================================================================
// Code-block and heading-structure category checks.
//
// Both are pure functions over the scanner output: no I/O, no failure modes.
//
// Code blocks: every fenced block should name its language (```bash).
//   strict -> any untagged block fails
//   normal -> fails when more than 20% of blocks are untagged
//   loose  -> counted, never fails
//   skip   -> not even counted
//
// Headings: levels should not jump downwards by more than one (H1 -> H3).
//   strict -> any jump of two or more levels is an issue
//   normal -> only jumps of three or more levels are issues
//   loose/skip -> counted, never an issue
// =============================================================================

use std::collections::BTreeMap;

use super::markdown::{CodeBlock, Heading};
use super::report::{CodeBlockCheck, HeadingIssue, HeadingIssueKind, HeadingStructureCheck};
use crate::policy::Strictness;

pub fn check_code_blocks(blocks: &[CodeBlock], strictness: Strictness) -> CodeBlockCheck {
    if strictness == Strictness::Skip {
        return CodeBlockCheck {
            total_code_blocks: 0,
            blocks_with_language: 0,
            blocks_without_language: 0,
            languages_used: Vec::new(),
            language_counts: BTreeMap::new(),
            check_passed: true,
            strictness,
            issues: Vec::new(),
            note: Some(
                "Code block check skipped (suited to LICENSE, CHANGELOG and similar documents)"
                    .to_string(),
            ),
            error: None,
        };
    }

    let mut language_counts: BTreeMap<String, usize> = BTreeMap::new();
    for language in blocks.iter().filter_map(|block| block.language.as_ref()) {
        *language_counts.entry(language.clone()).or_insert(0) += 1;
    }

    let total = blocks.len();
    let with_language: usize = language_counts.values().sum();
    let without_language = total - with_language;

    let (check_passed, issues) = match strictness {
        Strictness::Strict if without_language > 0 => (
            false,
            vec![format!(
                "Found {} code block(s) without a language tag",
                without_language
            )],
        ),
        // At most one block in five may be untagged
        Strictness::Normal if without_language * 5 > total => {
            let percent = without_language as f64 * 100.0 / total as f64;
            (
                false,
                vec![format!(
                    "{}/{} code blocks lack a language tag ({:.1}%)",
                    without_language, total, percent
                )],
            )
        }
        _ => (true, Vec::new()),
    };

    CodeBlockCheck {
        total_code_blocks: total,
        blocks_with_language: with_language,
        blocks_without_language: without_language,
        languages_used: language_counts.keys().cloned().collect(),
        language_counts,
        check_passed,
        strictness,
        issues,
        note: None,
        error: None,
    }
}

pub fn check_heading_structure(headings: &[Heading], strictness: Strictness) -> HeadingStructureCheck {
    let mut level_counts: BTreeMap<String, usize> = BTreeMap::new();
    for heading in headings {
        *level_counts.entry(format!("h{}", heading.level)).or_insert(0) += 1;
    }

    // Largest allowed downward step between consecutive headings
    let max_step = match strictness {
        Strictness::Strict => Some(1),
        Strictness::Normal => Some(2),
        Strictness::Loose | Strictness::Skip => None,
    };

    let mut issues = Vec::new();
    if let Some(max_step) = max_step {
        let mut prev_level = 0u8;
        for heading in headings {
            let level = heading.level;
            if prev_level > 0 && level > prev_level + max_step {
                issues.push(HeadingIssue {
                    kind: HeadingIssueKind::LevelSkip,
                    heading: heading.text.clone(),
                    level,
                    prev_level,
                    message: format!(
                        "Heading '{}' jumps from H{} to H{}; use H{}",
                        heading.text,
                        prev_level,
                        level,
                        prev_level + 1
                    ),
                });
            }
            prev_level = level;
        }
    }

    let note = max_step.is_none().then(|| {
        "Loose mode: heading level jumps are not checked (suited to LICENSE and similar documents)"
            .to_string()
    });

    HeadingStructureCheck {
        total_headings: headings.len(),
        level_counts,
        headings: headings.to_vec(),
        check_passed: issues.is_empty(),
        issues,
        strictness,
        note,
        error: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checker::markdown::scan;

    fn blocks(tagged: usize, untagged: usize) -> Vec<CodeBlock> {
        let mut blocks = Vec::new();
        for i in 0..tagged {
            blocks.push(CodeBlock { language: Some("bash".to_string()), line: i + 1 });
        }
        for i in 0..untagged {
            blocks.push(CodeBlock { language: None, line: tagged + i + 1 });
        }
        blocks
    }

    #[test]
    fn test_one_untagged_of_three_fails_strict_passes_normal_threshold() {
        let blocks = blocks(2, 1);
        let strict = check_code_blocks(&blocks, Strictness::Strict);
        assert!(!strict.check_passed);
        assert_eq!(strict.blocks_without_language, 1);
        assert_eq!(strict.issues.len(), 1);

        // 1/3 is above the 20% allowance
        let normal = check_code_blocks(&blocks, Strictness::Normal);
        assert!(!normal.check_passed);
        assert_eq!(normal.issues[0], "1/3 code blocks lack a language tag (33.3%)");
    }

    #[test]
    fn test_one_untagged_of_five_passes_normal() {
        let blocks = blocks(4, 1);
        assert!(check_code_blocks(&blocks, Strictness::Normal).check_passed);
        assert!(!check_code_blocks(&blocks, Strictness::Strict).check_passed);
    }

    #[test]
    fn test_skip_bypasses_recording() {
        let check = check_code_blocks(&blocks(0, 3), Strictness::Skip);
        assert!(check.check_passed);
        assert_eq!(check.total_code_blocks, 0);
        assert!(check.note.is_some());
    }

    #[test]
    fn test_loose_counts_but_passes() {
        let check = check_code_blocks(&blocks(1, 3), Strictness::Loose);
        assert!(check.check_passed);
        assert_eq!(check.total_code_blocks, 4);
        assert_eq!(check.blocks_without_language, 3);
    }

    #[test]
    fn test_language_statistics() {
        let doc = scan("```rust\na\n```\n```python\nb\n```\n```rust\nc\n```\n");
        let check = check_code_blocks(&doc.code_blocks, Strictness::Strict);
        assert!(check.check_passed);
        assert_eq!(check.blocks_with_language, 3);
        assert_eq!(check.languages_used, vec!["python", "rust"]);
        assert_eq!(check.language_counts["rust"], 2);
    }

    #[test]
    fn test_no_code_blocks_passes_normal_and_strict() {
        assert!(check_code_blocks(&[], Strictness::Normal).check_passed);
        assert!(check_code_blocks(&[], Strictness::Strict).check_passed);
    }

    #[test]
    fn test_h1_to_h3_is_one_issue_under_strict() {
        let doc = scan("# Title\n### Deep\n");
        let strict = check_heading_structure(&doc.headings, Strictness::Strict);
        assert_eq!(strict.issues.len(), 1);
        assert!(!strict.check_passed);
        assert_eq!(strict.issues[0].prev_level, 1);
        assert_eq!(strict.issues[0].level, 3);
        assert_eq!(strict.issues[0].message, "Heading 'Deep' jumps from H1 to H3; use H2");

        let loose = check_heading_structure(&doc.headings, Strictness::Loose);
        assert!(loose.issues.is_empty());
        assert!(loose.check_passed);
        assert_eq!(loose.level_counts["h3"], 1);
    }

    #[test]
    fn test_normal_only_flags_jumps_of_three_levels() {
        let doc = scan("# A\n### B\n# C\n#### D\n");
        let normal = check_heading_structure(&doc.headings, Strictness::Normal);
        assert_eq!(normal.issues.len(), 1);
        assert_eq!(normal.issues[0].heading, "D");
    }

    #[test]
    fn test_going_back_up_is_fine() {
        let doc = scan("# A\n## B\n### C\n# D\n## E\n");
        let strict = check_heading_structure(&doc.headings, Strictness::Strict);
        assert!(strict.check_passed);
        assert_eq!(strict.total_headings, 5);
        assert_eq!(strict.level_counts["h1"], 2);
    }

    #[test]
    fn test_first_heading_may_start_at_any_level() {
        let doc = scan("### Starts deep\n#### Next\n");
        assert!(check_heading_structure(&doc.headings, Strictness::Strict).check_passed);
    }
}
