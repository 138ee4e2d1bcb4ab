//! Docs directory scanner.
//!
//! Walks the configured docs root for markdown chapters, applies
//! include/exclude globs, and produces [`Document`]s in deterministic path
//! order. A file that cannot be read is reported in the scan outcome and
//! skipped; it never aborts the scan.

use anyhow::{bail, Result};
use globset::{Glob, GlobSet, GlobSetBuilder};
use std::path::Path;
use walkdir::WalkDir;

use crate::config::DocsConfig;
use crate::error::TomeError;
use crate::models::{Document, DocumentMeta};

/// Result of scanning the docs directory: readable documents plus the
/// per-file failures the indexing run will count as skipped.
#[derive(Debug, Default)]
pub struct ScanOutcome {
    pub documents: Vec<Document>,
    pub failures: Vec<TomeError>,
}

/// Scan the docs root and read every matching chapter file.
///
/// Documents are ordered by relative path so repeated runs over identical
/// input produce identical output. `title` and `order` stay unset here; the
/// indexing pipeline fills them from frontmatter.
pub fn scan_docs(config: &DocsConfig) -> Result<ScanOutcome> {
    let root = &config.root;
    if !root.exists() {
        bail!("Docs root does not exist: {}", root.display());
    }

    let include_set = build_globset(&config.include_globs)?;

    let mut default_excludes = vec![
        "**/.git/**".to_string(),
        "**/node_modules/**".to_string(),
    ];
    default_excludes.extend(config.exclude_globs.clone());
    let exclude_set = build_globset(&default_excludes)?;

    let mut outcome = ScanOutcome::default();

    for entry in WalkDir::new(root) {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }

        let path = entry.path();
        let relative = path.strip_prefix(root).unwrap_or(path);
        let rel_str = relative.to_string_lossy().replace('\\', "/");

        if exclude_set.is_match(&rel_str) || !include_set.is_match(&rel_str) {
            continue;
        }

        match std::fs::read_to_string(path) {
            Ok(body) => outcome.documents.push(Document {
                id: rel_str.clone(),
                body,
                meta: DocumentMeta {
                    title: None,
                    order: None,
                    module: extract_module(&rel_str),
                    source_path: rel_str,
                },
            }),
            Err(e) => outcome.failures.push(TomeError::Parse {
                path: rel_str,
                reason: e.to_string(),
            }),
        }
    }

    outcome.documents.sort_by(|a, b| a.id.cmp(&b.id));

    Ok(outcome)
}

/// Derive the module name from a chapter's relative path.
///
/// A `module-*` path component wins; a handful of well-known top-level
/// files map to fixed names; everything else is `general`.
pub fn extract_module(relative_path: &str) -> String {
    for part in relative_path.split('/') {
        if part.starts_with("module-") {
            return part.to_string();
        }
    }

    let file_name = Path::new(relative_path)
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();

    match file_name.as_str() {
        "intro.md" => "introduction".to_string(),
        "hardware.md" => "hardware".to_string(),
        "setup.md" => "setup".to_string(),
        "faq.md" => "faq".to_string(),
        _ => "general".to_string(),
    }
}

fn build_globset(patterns: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        builder.add(Glob::new(pattern)?);
    }
    Ok(builder.build()?)
}
