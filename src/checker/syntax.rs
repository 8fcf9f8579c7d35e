// src/checker/syntax.rs
// =============================================================================
// Markdown syntax category check.
//
// Two passes:
// 1. A full CommonMark parse with pulldown-cmark, to surface hard parse
//    failures. pulldown-cmark accepts any input, so a failure here means
//    the parser itself panicked; that is reported as one parse_error issue.
// 2. The format issues the scanner already collected (lists, tables, links,
//    fences, blockquotes), split by severity: errors must be fixed and
//    fail the check, warnings are stylistic and don't.
// =============================================================================

use pulldown_cmark::{Event, Options, Parser};
use std::panic::{self, AssertUnwindSafe};

use super::markdown::{FormatIssue, FormatKind, ScannedDocument, Severity};
use super::report::MarkdownSyntaxCheck;

// Runs the CommonMark parser over the whole document
//
// Returns: Ok(number of block/inline elements opened) or Err(panic message)
fn full_parse(markdown: &str) -> Result<usize, String> {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_TASKLISTS);
    options.insert(Options::ENABLE_STRIKETHROUGH);

    panic::catch_unwind(AssertUnwindSafe(|| {
        Parser::new_ext(markdown, options)
            .filter(|event| matches!(event, Event::Start(_)))
            .count()
    }))
    .map_err(|payload| panic_message(payload.as_ref()))
}

pub(crate) fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}

pub fn check_syntax(markdown: &str, scanned: &ScannedDocument) -> MarkdownSyntaxCheck {
    let mut issues = Vec::new();
    let mut warnings = Vec::new();

    let parse_success = match full_parse(markdown) {
        Ok(_) => true,
        Err(message) => {
            issues.push(FormatIssue {
                kind: FormatKind::ParseError,
                line: None,
                message: format!("Markdown parse failed: {}", message),
                severity: Severity::Error,
            });
            false
        }
    };

    for issue in &scanned.format_issues {
        match issue.severity {
            Severity::Error => issues.push(issue.clone()),
            Severity::Warning => warnings.push(issue.clone()),
        }
    }

    MarkdownSyntaxCheck {
        parse_success,
        total_issues: issues.len(),
        total_warnings: warnings.len(),
        check_passed: issues.is_empty(),
        summary: format!("{} errors, {} warnings", issues.len(), warnings.len()),
        issues,
        warnings,
        error: None,
    }
}
