// src/checker/markdown.rs
// =============================================================================
// This module scans raw Markdown text for structural primitives.
//
// We deliberately do NOT build an AST here. The checks care about what the
// author literally typed ("##Usage" is not a heading, "-item" is a broken
// list item), and a CommonMark parser would silently normalize exactly the
// mistakes we want to report. So the scan is line-oriented plus a few regexes.
//
// One scan produces a ScannedDocument which every check then reads:
// - headings (level + text, in document order)
// - fenced code blocks (with their optional language tag)
// - links (markdown `[text](url)` and bare http(s) URLs, deduplicated)
// - format issues (list/table/blockquote/link/fence problems)
//
// Content inside fenced code blocks is opaque: a `# comment` in a bash
// block is not a heading and `http://localhost` in an example is not a link.
//
// Rust concepts:
// - LazyLock: compile each regex once, on first use
// - Byte offsets: regex matches give us ranges we can compare across patterns
// =============================================================================

use regex::Regex;
use serde::Serialize;
use std::collections::HashSet;
use std::ops::Range;
use std::sync::LazyLock;

// These patterns are constants, so a failure to compile is a programmer
// error and panicking on first use is fine.
static HEADING: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(#{1,6})\s+(.+)$").expect("valid heading regex"));
static CLOSING_HASHES: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+#+\s*$").expect("valid closing hashes regex"));
static MARKDOWN_LINK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[([^\[\]]+)\]\(([^)]+)\)").expect("valid link regex"));
static BARE_URL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"https?://[^\s<>"{}|\\^`\[\]]+"#).expect("valid bare url regex")
});
static ORDERED_MARKER_NO_SPACE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d+\.[^\s\d]").expect("valid ordered list regex"));
static HEADING_NO_SPACE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^#{1,6}[^#\s]").expect("valid heading marker regex"));

/// A heading as written in the document
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Heading {
    /// 1-6, the number of leading `#` characters
    pub level: u8,
    pub text: String,
}

/// A complete (opened and closed) fenced code block
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeBlock {
    /// The word right after the opening fence, e.g. "bash" in ```bash
    pub language: Option<String>,
    /// 1-based line of the opening fence
    pub line: usize,
}

/// Where a link was found
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LinkKind {
    /// `[text](url)` or `![alt](url)`
    Markdown,
    /// A bare http(s) URL in running text
    Direct,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkRecord {
    pub text: String,
    pub url: String,
    pub kind: LinkKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Error,
    Warning,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FormatKind {
    ParseError,
    ListFormat,
    TableFormat,
    LinkFormat,
    ImageFormat,
    CodeBlockFormat,
    InlineCodeFormat,
    BlockquoteFormat,
    HeadingFormat,
}

/// One formatting problem found by the line scan
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FormatIssue {
    #[serde(rename = "type")]
    pub kind: FormatKind,
    /// 1-based line number; None for document-wide problems
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line: Option<usize>,
    pub message: String,
    pub severity: Severity,
}

/// Everything the checks need, extracted in a single pass
#[derive(Debug, Clone, Default)]
pub struct ScannedDocument {
    pub headings: Vec<Heading>,
    pub code_blocks: Vec<CodeBlock>,
    /// Every ``` fence line seen, opening or closing
    pub fence_count: usize,
    pub links: Vec<LinkRecord>,
    pub format_issues: Vec<FormatIssue>,
}

// Scans a Markdown document
//
// Parameters:
//   markdown: the raw document text (borrowed, never modified)
//
// Returns: a ScannedDocument shared by all checks
pub fn scan(markdown: &str) -> ScannedDocument {
    let mut doc = ScannedDocument::default();

    // The document with fenced content blanked out; links are extracted
    // from this once the line scan is done.
    let mut prose = String::with_capacity(markdown.len());
    let mut open_fence: Option<CodeBlock> = None;
    let mut open_brackets: Vec<OpenBracket> = Vec::new();
    let mut inline_backticks = 0usize;

    for (index, line) in markdown.lines().enumerate() {
        let line_no = index + 1;
        let trimmed = line.trim();

        if is_fence_line(trimmed, open_fence.is_some()) {
            let rest = trimmed.trim_start_matches('`');
            flush_open_brackets(&mut open_brackets, &mut doc.format_issues);
            doc.fence_count += 1;
            match open_fence.take() {
                Some(block) => doc.code_blocks.push(block),
                None => {
                    open_fence = Some(CodeBlock {
                        language: fence_language(rest),
                        line: line_no,
                    })
                }
            }
            prose.push('\n');
            continue;
        }

        if open_fence.is_some() {
            prose.push('\n');
            continue;
        }

        prose.push_str(line);
        prose.push('\n');

        // Link text may wrap onto the next line, but not past the paragraph
        if trimmed.is_empty() {
            flush_open_brackets(&mut open_brackets, &mut doc.format_issues);
            continue;
        }

        if let Some(heading) = parse_heading(trimmed) {
            flush_open_brackets(&mut open_brackets, &mut doc.format_issues);
            doc.headings.push(heading);
            continue;
        }

        let (masked, backticks) = mask_inline_code(trimmed);
        inline_backticks += backticks;

        check_heading_marker(trimmed, line_no, &mut doc.format_issues);
        check_list_marker(trimmed, line_no, &mut doc.format_issues);
        check_blockquote_marker(trimmed, line_no, &mut doc.format_issues);
        check_table_row(&masked, line_no, &mut doc.format_issues);
        check_link_format(&masked, line_no, &mut open_brackets, &mut doc.format_issues);
    }
    flush_open_brackets(&mut open_brackets, &mut doc.format_issues);

    if doc.fence_count % 2 != 0 {
        doc.format_issues.push(FormatIssue {
            kind: FormatKind::CodeBlockFormat,
            line: open_fence.as_ref().map(|block| block.line),
            message: format!(
                "Unpaired code fence (found {} ``` markers)",
                doc.fence_count
            ),
            severity: Severity::Error,
        });
    }

    if inline_backticks % 2 != 0 {
        doc.format_issues.push(FormatIssue {
            kind: FormatKind::InlineCodeFormat,
            line: None,
            message: format!("Unpaired inline code marker (found {} `)", inline_backticks),
            severity: Severity::Warning,
        });
    }

    // Document-wide findings (None) go last
    doc.format_issues.sort_by_key(|issue| issue.line.unwrap_or(usize::MAX));

    doc.links = extract_links(&prose);
    doc
}

// A backtick fence line. An opening fence's info string may not contain
// backticks ("```js x```" is inline code), and a closing fence carries no
// info string at all.
fn is_fence_line(trimmed: &str, inside_fence: bool) -> bool {
    let Some(rest) = trimmed.strip_prefix("```") else {
        return false;
    };
    let info = rest.trim_start_matches('`');
    if inside_fence {
        info.trim().is_empty()
    } else {
        !info.contains('`')
    }
}

// Parses a single (already trimmed) line as an ATX heading
//
// "## Install" -> Some(level 2, "Install")
// "##Install"  -> None (the space after the markers is required)
// "####### x"  -> None (more than six markers)
pub fn parse_heading(line: &str) -> Option<Heading> {
    let captures = HEADING.captures(line)?;
    let level = captures[1].len() as u8;
    let text = CLOSING_HASHES.replace(&captures[2], "");
    let text = text.trim();
    if text.is_empty() {
        return None;
    }
    Some(Heading {
        level,
        text: text.to_string(),
    })
}

// The language tag is the run of word characters right after the fence
fn fence_language(after_fence: &str) -> Option<String> {
    let tag: String = after_fence
        .chars()
        .take_while(|c| c.is_alphanumeric() || *c == '_')
        .collect();
    if tag.is_empty() {
        None
    } else {
        Some(tag)
    }
}

// Replaces inline code spans with nothing so that `[`, `|` and friends
// inside code are not mistaken for markup. Also returns the backtick count.
fn mask_inline_code(line: &str) -> (String, usize) {
    let mut masked = String::with_capacity(line.len());
    let mut in_code = false;
    let mut backticks = 0;
    for c in line.chars() {
        if c == '`' {
            backticks += 1;
            in_code = !in_code;
            continue;
        }
        if !in_code {
            masked.push(c);
        }
    }
    (masked, backticks)
}

fn check_heading_marker(line: &str, line_no: usize, issues: &mut Vec<FormatIssue>) {
    if HEADING_NO_SPACE.is_match(line) {
        issues.push(FormatIssue {
            kind: FormatKind::HeadingFormat,
            line: Some(line_no),
            message: format!("Missing space after heading marker: '{}'", line),
            severity: Severity::Warning,
        });
    }
}

fn check_list_marker(line: &str, line_no: usize, issues: &mut Vec<FormatIssue>) {
    let mut chars = line.chars();
    let first = chars.next();
    let second = chars.next();

    if let (Some(marker @ ('-' | '*' | '+')), Some(next)) = (first, second) {
        // "---", "**bold**" and "*emphasis*" are not list items
        let is_rule_or_emphasis =
            next == marker || (marker == '*' && line[1..].contains('*'));
        if !next.is_whitespace() && !is_rule_or_emphasis {
            issues.push(FormatIssue {
                kind: FormatKind::ListFormat,
                line: Some(line_no),
                message: format!("Missing space after list marker: '{}'", line),
                severity: Severity::Error,
            });
        }
    }

    if ORDERED_MARKER_NO_SPACE.is_match(line) {
        issues.push(FormatIssue {
            kind: FormatKind::ListFormat,
            line: Some(line_no),
            message: format!("Missing space after ordered list marker: '{}'", line),
            severity: Severity::Error,
        });
    }
}

fn check_blockquote_marker(line: &str, line_no: usize, issues: &mut Vec<FormatIssue>) {
    let Some(rest) = line.strip_prefix('>') else {
        return;
    };
    match rest.chars().next() {
        Some(next) if !next.is_whitespace() && next != '>' => {
            issues.push(FormatIssue {
                kind: FormatKind::BlockquoteFormat,
                line: Some(line_no),
                message: format!("Missing space after blockquote marker: '{}'", line),
                severity: Severity::Warning,
            });
        }
        _ => {}
    }
}

// A line is treated as a table row when it has a leading or trailing pipe,
// or at least two pipes. Rows must both start and end with `|`.
fn check_table_row(line: &str, line_no: usize, issues: &mut Vec<FormatIssue>) {
    let starts = line.starts_with('|');
    let ends = line.ends_with('|');
    let pipes = line.matches('|').count();
    if !(starts || ends || pipes >= 2) {
        return;
    }
    if !starts {
        issues.push(FormatIssue {
            kind: FormatKind::TableFormat,
            line: Some(line_no),
            message: "Table row should start with |".to_string(),
            severity: Severity::Warning,
        });
    }
    if !ends {
        issues.push(FormatIssue {
            kind: FormatKind::TableFormat,
            line: Some(line_no),
            message: "Table row should end with |".to_string(),
            severity: Severity::Warning,
        });
    }
}

/// A `[` whose `]` has not been seen yet
struct OpenBracket {
    line: usize,
    /// Byte offset of the `[` within its (masked) line
    start: usize,
    /// The rest of the line after the `[`
    label: String,
}

// Matches brackets on one line against the brackets still open in the
// paragraph, and reports:
// - "[text]()" links with an empty target
// - "![alt]()" images with an empty target
// Brackets left open are reported by flush_open_brackets at paragraph end.
fn check_link_format(
    line: &str,
    line_no: usize,
    open: &mut Vec<OpenBracket>,
    issues: &mut Vec<FormatIssue>,
) {
    for (index, c) in line.char_indices() {
        match c {
            '[' => open.push(OpenBracket {
                line: line_no,
                start: index,
                label: line[index + 1..].trim_end().to_string(),
            }),
            ']' => {
                let Some(bracket) = open.pop() else {
                    continue;
                };
                let empty_target = line[index + 1..]
                    .strip_prefix('(')
                    .and_then(|target| target.find(')').map(|end| target[..end].trim().is_empty()))
                    .unwrap_or(false);
                if !empty_target {
                    continue;
                }

                let (label, is_image) = if bracket.line == line_no {
                    (&line[bracket.start + 1..index], line[..bracket.start].ends_with('!'))
                } else {
                    (bracket.label.as_str(), false)
                };
                if is_image {
                    issues.push(FormatIssue {
                        kind: FormatKind::ImageFormat,
                        line: Some(line_no),
                        message: format!("Empty image link: '![{}]()'", label),
                        severity: Severity::Error,
                    });
                } else if !label.is_empty() {
                    issues.push(FormatIssue {
                        kind: FormatKind::LinkFormat,
                        line: Some(line_no),
                        message: format!("Empty link: '[{}]()'", label),
                        severity: Severity::Error,
                    });
                }
            }
            _ => {}
        }
    }
}

fn flush_open_brackets(open: &mut Vec<OpenBracket>, issues: &mut Vec<FormatIssue>) {
    for bracket in open.drain(..) {
        if bracket.label.is_empty() {
            continue;
        }
        issues.push(FormatIssue {
            kind: FormatKind::LinkFormat,
            line: Some(bracket.line),
            message: format!("Unclosed link: '[{}'", bracket.label),
            severity: Severity::Error,
        });
    }
}

// Extracts all HTTP/HTTPS links from the prose of a document
//
// Markdown links come first, then bare URLs that are not part of a markdown
// link. Each URL is kept once (first occurrence wins).
//
// Example:
//   "See [Rust](https://www.rust-lang.org) or https://crates.io."
//   -> [Markdown("Rust", https://www.rust-lang.org), Direct(https://crates.io)]
pub fn extract_links(markdown: &str) -> Vec<LinkRecord> {
    let mut links = Vec::new();
    let mut seen = HashSet::new();
    let mut link_spans: Vec<Range<usize>> = Vec::new();

    for captures in MARKDOWN_LINK.captures_iter(markdown) {
        // Wrapped link text stays inside one paragraph
        if captures[1].lines().skip(1).any(|line| line.trim().is_empty()) {
            continue;
        }
        if let Some(whole) = captures.get(0) {
            link_spans.push(whole.range());
        }
        let text = captures[1].split_whitespace().collect::<Vec<_>>().join(" ");
        let Some(url) = link_target(&captures[2]) else {
            continue;
        };
        if is_http_link(url) && seen.insert(url.to_string()) {
            links.push(LinkRecord {
                text,
                url: url.to_string(),
                kind: LinkKind::Markdown,
            });
        }
    }

    for found in BARE_URL.find_iter(markdown) {
        let inside_markdown_link = link_spans
            .iter()
            .any(|span| span.contains(&found.start()));
        if inside_markdown_link {
            continue;
        }
        let url = trim_bare_url(found.as_str());
        if seen.insert(url.to_string()) {
            links.push(LinkRecord {
                text: url.to_string(),
                url: url.to_string(),
                kind: LinkKind::Direct,
            });
        }
    }

    links
}

// `(<https://x> "title")` -> "https://x"
fn link_target(raw: &str) -> Option<&str> {
    let first = raw.split_whitespace().next()?;
    Some(
        first
            .strip_prefix('<')
            .and_then(|s| s.strip_suffix('>'))
            .unwrap_or(first),
    )
}

// Sentence punctuation right after a bare URL is not part of it.
// A trailing ')' is kept only when the URL itself opened a parenthesis.
fn trim_bare_url(url: &str) -> &str {
    let mut end = url.len();
    while let Some(last) = url[..end].chars().last() {
        let strip = match last {
            '.' | ',' | ';' | ':' | '!' | '?' | '\'' | '*' | '_' => true,
            ')' => url[..end].matches('(').count() < url[..end].matches(')').count(),
            _ => false,
        };
        if !strip {
            break;
        }
        end -= last.len_utf8();
    }
    &url[..end]
}

// We want to skip mailto:, tel:, relative paths and anchors
fn is_http_link(url: &str) -> bool {
    url.starts_with("http://") || url.starts_with("https://")
}
