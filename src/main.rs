// src/main.rs
// =============================================================================
// This is the entry point of the doc-guardian CLI.
//
// What happens here:
// 1. Parse command-line arguments using clap
// 2. Install logging (RUST_LOG, stderr) and load the optional config file
// 3. Get the document(s): a local file, or files fetched from GitHub
// 4. Run the checker and print each report (table or JSON)
// 5. Exit with proper code (0 = all checks passed, 1 = failed checks, 2 = error)
// =============================================================================

mod cli;

use anyhow::{Context, Result};
use clap::Parser;
use std::path::Path;
use tracing_subscriber::EnvFilter;

use cli::{Cli, Commands, OutputOptions};
use doc_guardian::checker::report::CategoryOutcome;
use doc_guardian::{github, CheckReport, Checker, Config, DocType};

#[tokio::main]
async fn main() {
    init_tracing();

    let exit_code = match run().await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            2
        }
    };

    std::process::exit(exit_code);
}

// Logs go to stderr so that --json output on stdout stays parseable
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

// Returns:
//   Ok(0) = every check passed
//   Ok(1) = at least one check failed
//   Err   = could not even run (bad config, unreadable file, bad repo URL)
async fn run() -> Result<i32> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Check { file, doc_type, output } => {
            handle_check(&file, &doc_type, &output).await
        }
        Commands::Github { repo_url, doc_type, output } => {
            handle_github(&repo_url, doc_type.as_deref(), &output).await
        }
    }
}

fn load_config(output: &OutputOptions) -> Result<Config> {
    match &output.config {
        Some(path) => Config::load(path)
            .with_context(|| format!("Could not load config {}", path.display())),
        None => Ok(Config::default()),
    }
}

// Handles the 'check' subcommand
async fn handle_check(file: &Path, doc_type: &str, output: &OutputOptions) -> Result<i32> {
    let config = load_config(output)?;
    let checker = Checker::new(config)?;

    let markdown = std::fs::read_to_string(file)
        .with_context(|| format!("Could not read {}", file.display()))?;
    let doc_type = DocType::from_hint(doc_type);

    if !output.json {
        println!("🔍 Checking {} as {}", file.display(), doc_type);
    }

    let report = checker.check(&markdown, doc_type).await;
    let label = file.display().to_string();
    print_results(&[(label, report.clone())], output.json)?;

    Ok(exit_code(&[report]))
}

// Handles the 'github' subcommand
async fn handle_github(repo_url: &str, doc_type: Option<&str>, output: &OutputOptions) -> Result<i32> {
    // One checker for all documents so shared links are probed once
    let checker = Checker::new(load_config(output)?)?;
    let settings = &checker.config().link;

    if !output.json {
        println!("🔍 Scanning GitHub repository: {}", repo_url);
    }

    let documents = match doc_type {
        Some(hint) => {
            let doc_type = DocType::from_hint(hint);
            github::fetch_document(repo_url, doc_type, settings)
                .await?
                .into_iter()
                .collect::<Vec<_>>()
        }
        None => github::discover_documents(repo_url, settings).await?,
    };

    if documents.is_empty() {
        if !output.json {
            println!("⚠️  No documentation files found in repository");
        } else {
            println!("[]");
        }
        return Ok(0);
    }

    if !output.json {
        println!("📄 Found {} document(s) to check", documents.len());
    }

    let mut results = Vec::new();
    for document in &documents {
        let report = checker.check(&document.content, document.doc_type).await;
        results.push((format!("{} ({})", document.url, document.doc_type), report));
    }

    print_results(&results, output.json)?;

    let reports: Vec<CheckReport> = results.into_iter().map(|(_, report)| report).collect();
    Ok(exit_code(&reports))
}

fn exit_code(reports: &[CheckReport]) -> i32 {
    if reports.iter().all(CheckReport::passed) {
        0
    } else {
        1
    }
}

// Prints the results either as tables or JSON
fn print_results(results: &[(String, CheckReport)], json: bool) -> Result<()> {
    if json {
        let json_output = if let [(_, report)] = results {
            serde_json::to_string_pretty(report)?
        } else {
            let reports: Vec<&CheckReport> = results.iter().map(|(_, report)| report).collect();
            serde_json::to_string_pretty(&reports)?
        };
        println!("{}", json_output);
    } else {
        for (label, report) in results {
            print_table(label, report);
        }
    }
    Ok(())
}

// Prints one report as a human-readable table in the terminal
fn print_table(label: &str, report: &CheckReport) {
    println!();
    println!("📋 {}", label);
    println!("{:<30} {:<12} {:<10} {:<8}", "CHECK", "STRICTNESS", "RESULT", "ISSUES");
    println!("{}", "=".repeat(62));

    let rows: [(&str, Option<String>, &dyn CategoryOutcome); 5] = [
        ("links", Some(report.link_check.strictness.to_string()), &report.link_check),
        (
            "code blocks",
            Some(report.code_block_check.strictness.to_string()),
            &report.code_block_check,
        ),
        (
            "heading structure",
            Some(report.heading_structure_check.strictness.to_string()),
            &report.heading_structure_check,
        ),
        ("sections", None, &report.section_completeness_check),
        ("markdown syntax", None, &report.markdown_syntax_check),
    ];

    for (name, strictness, outcome) in rows {
        let result = if outcome.passed() { "✅ PASS" } else { "❌ FAIL" };
        let issues = if outcome.passed() {
            0
        } else if outcome.error().is_some() {
            1
        } else {
            outcome.issue_count()
        };
        println!(
            "{:<30} {:<12} {:<10} {:<8}",
            name,
            strictness.as_deref().unwrap_or("-"),
            result,
            issues
        );
    }

    println!();

    let summary = &report.summary;
    println!("📊 Summary:");
    println!("   ✅ Passed: {}", summary.passed_checks);
    println!("   ❌ Failed: {}", summary.failed_checks);
    println!("   📋 Issues: {}", summary.total_issues);

    for issue in &summary.all_issues {
        println!("   - {}", issue);
    }

    let warnings = &report.markdown_syntax_check.warnings;
    if !warnings.is_empty() {
        println!("   ⚠️  {} warning(s):", warnings.len());
        for warning in warnings {
            match warning.line {
                Some(line) => println!("   - line {}: {}", line, warning.message),
                None => println!("   - {}", warning.message),
            }
        }
    }
}
