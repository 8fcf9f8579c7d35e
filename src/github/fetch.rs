// src/github/fetch.rs
// =============================================================================
// This module fetches documentation files from GitHub repositories.
//
// Strategy:
// - Parse the GitHub URL to extract owner and repo name
// - Every document type has an ordered list of likely paths
//   (README.md, readme.md, ..., .github/CONTRIBUTING.md, docs/api.md, ...)
// - Probe all candidate paths concurrently on raw.githubusercontent.com
//   (HEAD resolves to the default branch, whatever it is called)
// - The highest-priority path that exists wins
//
// Why raw.githubusercontent.com and not the contents API?
// - No base64 decoding, no token needed for public repos
// - The API's rate limit is much lower without authentication
// =============================================================================

use anyhow::{anyhow, Context, Result};
use reqwest::{Client, StatusCode};
use std::time::Duration;
use tracing::{debug, info, warn};
use url::Url;

use crate::checker::batch::fan_out;
use crate::config::LinkSettings;
use crate::policy::DocType;

const RAW_BASE: &str = "https://raw.githubusercontent.com";
const FETCH_TIMEOUT: Duration = Duration::from_secs(10);

/// owner/repo pair parsed from a repository URL
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoRef {
    pub owner: String,
    pub repo: String,
}

impl RepoRef {
    fn raw_url(&self, path: &str) -> String {
        format!("{}/{}/{}/HEAD/{}", RAW_BASE, self.owner, self.repo, path)
    }
}

/// A documentation file found in a repository
#[derive(Debug, Clone)]
pub struct FetchedDocument {
    pub doc_type: DocType,
    /// Path inside the repository, e.g. ".github/CONTRIBUTING.md"
    pub path: String,
    pub url: String,
    pub content: String,
}

// Where each document type usually lives, most likely first
pub fn candidate_paths(doc_type: DocType) -> &'static [&'static str] {
    match doc_type {
        DocType::Readme => &["README.md", "readme.md", "README.MD", "Readme.md", "README", "readme", "README.txt"],
        DocType::Contributing => &[
            "CONTRIBUTING.md",
            "contributing.md",
            "CONTRIBUTING",
            "contributing",
            ".github/CONTRIBUTING.md",
            "docs/CONTRIBUTING.md",
        ],
        DocType::Changelog => &[
            "CHANGELOG.md",
            "changelog.md",
            "CHANGELOG",
            "HISTORY.md",
            "history.md",
            "CHANGES.md",
        ],
        DocType::CodeOfConduct => &[
            "CODE_OF_CONDUCT.md",
            "code_of_conduct.md",
            "CODE_OF_CONDUCT",
            ".github/CODE_OF_CONDUCT.md",
        ],
        DocType::License => &["LICENSE", "license", "LICENSE.md", "license.md", "LICENSE.txt", "license.txt"],
        DocType::Security => &["SECURITY.md", "security.md", "SECURITY", ".github/SECURITY.md"],
        DocType::Support => &["SUPPORT.md", "support.md", "SUPPORT", ".github/SUPPORT.md"],
        DocType::Wiki => &[
            "wiki/Home.md",
            "wiki/home.md",
            "wiki/README.md",
            "Wiki/Home.md",
            "WIKI/Home.md",
            "docs/wiki/Home.md",
            "docs/Wiki/Home.md",
        ],
        DocType::Docs => &[
            "docs/README.md",
            "docs/index.md",
            "docs/INDEX.md",
            "Docs/README.md",
            "DOCS/README.md",
            "documentation/README.md",
            "Documentation/README.md",
        ],
        DocType::Installation => &[
            "INSTALL.md",
            "install.md",
            "INSTALLATION.md",
            "installation.md",
            "docs/installation.md",
            "docs/INSTALLATION.md",
            "docs/install.md",
            "docs/INSTALL.md",
        ],
        DocType::Usage => &[
            "USAGE.md",
            "usage.md",
            "docs/usage.md",
            "docs/USAGE.md",
            "docs/getting-started.md",
            "docs/guide.md",
        ],
        DocType::Api => &[
            "API.md",
            "api.md",
            "docs/api.md",
            "docs/API.md",
            "docs/api-reference.md",
            "docs/API-Reference.md",
        ],
    }
}

// Parses a GitHub URL to extract owner and repository name
//
// Supported formats:
//   - https://github.com/owner/repo
//   - https://github.com/owner/repo.git
//   - https://github.com/owner/repo/tree/main/docs (extra path is ignored)
//   - github.com/owner/repo
pub fn parse_github_url(repo_url: &str) -> Result<RepoRef> {
    let trimmed = repo_url.trim();
    let with_scheme = if trimmed.contains("://") {
        trimmed.to_string()
    } else {
        format!("https://{}", trimmed)
    };

    let url = Url::parse(&with_scheme).map_err(|e| anyhow!("Invalid URL '{}': {}", repo_url, e))?;

    let host = url.host_str().unwrap_or_default();
    if host != "github.com" && host != "www.github.com" {
        return Err(anyhow!("Not a GitHub URL: {}", repo_url));
    }

    let mut segments = url
        .path_segments()
        .map(|segments| segments.filter(|s| !s.is_empty()).collect::<Vec<_>>())
        .unwrap_or_default()
        .into_iter();

    let (Some(owner), Some(repo)) = (segments.next(), segments.next()) else {
        return Err(anyhow!("Invalid GitHub URL format: {}", repo_url));
    };

    Ok(RepoRef {
        owner: owner.to_string(),
        repo: repo.trim_end_matches(".git").to_string(),
    })
}

fn build_client(settings: &LinkSettings) -> Result<Client> {
    Client::builder()
        .timeout(FETCH_TIMEOUT)
        .user_agent(settings.user_agent.as_str())
        .build()
        .context("Failed to create HTTP client")
}

// Fetches the highest-priority candidate file for one document type
//
// Returns:
//   Ok(Some(doc)) - found
//   Ok(None)      - no candidate path exists in the repository
//   Err           - the repository URL is not a GitHub URL
pub async fn fetch_document(
    repo_url: &str,
    doc_type: DocType,
    settings: &LinkSettings,
) -> Result<Option<FetchedDocument>> {
    let repo = parse_github_url(repo_url)?;
    let client = build_client(settings)?;
    Ok(find_document(&client, &repo, doc_type, settings.max_concurrent).await)
}

// Looks for every document type and returns the ones that exist,
// in DocType::ALL order
pub async fn discover_documents(
    repo_url: &str,
    settings: &LinkSettings,
) -> Result<Vec<FetchedDocument>> {
    let repo = parse_github_url(repo_url)?;
    let client = build_client(settings)?;

    let mut found = Vec::new();
    for doc_type in DocType::ALL {
        if let Some(doc) = find_document(&client, &repo, doc_type, settings.max_concurrent).await {
            found.push(doc);
        }
    }
    info!(owner = %repo.owner, repo = %repo.repo, found = found.len(), "discovered documents");
    Ok(found)
}

async fn find_document(
    client: &Client,
    repo: &RepoRef,
    doc_type: DocType,
    limit: usize,
) -> Option<FetchedDocument> {
    let paths = candidate_paths(doc_type);

    // Presence probes for all candidates at once; results keep path order
    let results = fan_out(paths.to_vec(), limit, |path| {
        let url = repo.raw_url(path);
        async move {
            let result = fetch_file(client, &url).await;
            (path, url, result)
        }
    })
    .await;

    for (path, url, result) in results {
        match result {
            Ok(Some(content)) => {
                info!(%doc_type, path, bytes = content.len(), "fetched document");
                return Some(FetchedDocument {
                    doc_type,
                    path: path.to_string(),
                    url,
                    content,
                });
            }
            Ok(None) => debug!(%doc_type, path, "not present"),
            Err(e) => warn!(%doc_type, path, error = %e, "could not fetch candidate"),
        }
    }
    None
}

// Fetches content from a URL
//
// Returns: Ok(Some(content)), Ok(None) on 404, or an error for anything else
async fn fetch_file(client: &Client, url: &str) -> Result<Option<String>> {
    let response = client.get(url).send().await?;

    if response.status() == StatusCode::NOT_FOUND {
        return Ok(None);
    }
    if !response.status().is_success() {
        return Err(anyhow!("Failed to fetch {}: HTTP {}", url, response.status()));
    }

    let content = response.text().await?;
    Ok(Some(content))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_github_url() {
        let repo = parse_github_url("https://github.com/rust-lang/rust").unwrap();
        assert_eq!(repo.owner, "rust-lang");
        assert_eq!(repo.repo, "rust");
    }

    #[test]
    fn test_parse_github_url_with_git_and_extra_path() {
        let repo = parse_github_url("https://github.com/user/repo.git").unwrap();
        assert_eq!(repo.repo, "repo");

        let repo = parse_github_url("github.com/user/repo/tree/main/docs").unwrap();
        assert_eq!(repo, RepoRef { owner: "user".into(), repo: "repo".into() });
    }

    #[test]
    fn test_parse_invalid_url() {
        assert!(parse_github_url("https://gitlab.com/user/repo").is_err());
        assert!(parse_github_url("https://github.com/only-owner").is_err());
    }

    #[test]
    fn test_raw_url_uses_default_branch() {
        let repo = RepoRef { owner: "o".into(), repo: "r".into() };
        assert_eq!(
            repo.raw_url(".github/SECURITY.md"),
            "https://raw.githubusercontent.com/o/r/HEAD/.github/SECURITY.md"
        );
    }

    #[test]
    fn test_every_doc_type_has_candidates() {
        for doc_type in DocType::ALL {
            assert!(!candidate_paths(doc_type).is_empty(), "{}", doc_type);
        }
        assert_eq!(candidate_paths(DocType::Readme)[0], "README.md");
        assert!(candidate_paths(DocType::Contributing).contains(&".github/CONTRIBUTING.md"));
    }
}
