// src/github/mod.rs
// =============================================================================
// This module handles fetching documentation files from GitHub repositories.
//
// Currently implements:
// - Parsing GitHub URLs to extract owner/repo
// - Per-document-type candidate paths (README.md, .github/SECURITY.md, ...)
// - Concurrent presence probes through the checker's fan-out runner
//
// Future enhancements:
// - Use the contents API with a token for private repos
// =============================================================================

mod fetch;

pub use fetch::{
    candidate_paths, discover_documents, fetch_document, parse_github_url, FetchedDocument,
    RepoRef,
};
