// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use camino::Utf8PathBuf;
use std::{collections::HashMap, fmt};
use surefire_index::{ArtifactResolver, errors::ResourceNotFoundError};
use tracing::debug;

/// What metrics for a class are attached to.
#[derive(Clone, Debug, Eq, PartialEq)]
pub(crate) enum SourceArtifact {
    /// The source file for the class.
    Resolved(Utf8PathBuf),

    /// The class's source file wasn't found.
    Placeholder(String),
}

impl SourceArtifact {
    pub(crate) fn is_resolved(&self) -> bool {
        matches!(self, SourceArtifact::Resolved(_))
    }
}

impl fmt::Display for SourceArtifact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceArtifact::Resolved(path) => write!(f, "{path}"),
            SourceArtifact::Placeholder(identity) => write!(f, "{identity}"),
        }
    }
}

/// Finds source files by name under a set of directories.
///
/// The directories are walked once, on first use. If several files have the same name, the one
/// found first wins: earlier directories take precedence, and within a directory entries are
/// visited in file name order.
#[derive(Debug)]
pub(crate) struct SourceDirResolver {
    roots: Vec<Utf8PathBuf>,
    files: Option<HashMap<String, Utf8PathBuf>>,
}

impl SourceDirResolver {
    pub(crate) fn new(roots: Vec<Utf8PathBuf>) -> Self {
        Self { roots, files: None }
    }

    fn files(&mut self) -> &HashMap<String, Utf8PathBuf> {
        self.files.get_or_insert_with(|| index_files(&self.roots))
    }
}

impl ArtifactResolver for SourceDirResolver {
    type Artifact = SourceArtifact;

    fn resolve(
        &mut self,
        identity: &str,
        suffix: &str,
    ) -> Result<SourceArtifact, ResourceNotFoundError> {
        let err = ResourceNotFoundError::new(identity, suffix);
        match self.files().get(err.file_name()) {
            Some(path) => Ok(SourceArtifact::Resolved(path.clone())),
            None => Err(err),
        }
    }

    fn placeholder(&mut self, identity: &str) -> SourceArtifact {
        SourceArtifact::Placeholder(identity.to_owned())
    }
}

fn index_files(roots: &[Utf8PathBuf]) -> HashMap<String, Utf8PathBuf> {
    let mut files = HashMap::new();
    for root in roots {
        let mut count = 0;
        for entry in walkdir::WalkDir::new(root)
            .follow_links(true)
            .sort_by_file_name()
            .into_iter()
            .filter_map(|entry| entry.ok())
        {
            if !entry.file_type().is_file() {
                continue;
            }
            let Ok(path) = Utf8PathBuf::try_from(entry.into_path()) else {
                continue;
            };
            if let Some(file_name) = path.file_name().map(str::to_owned) {
                files.entry(file_name).or_insert(path);
                count += 1;
            }
        }
        debug!("indexed {count} file(s) under {root}");
    }
    files
}

#[cfg(test)]
mod tests {
    use super::*;
    use camino_tempfile::Utf8TempDir;
    use pretty_assertions::assert_eq;
    use std::fs;

    #[test]
    fn resolves_by_file_name() {
        let first = Utf8TempDir::new().unwrap();
        let second = Utf8TempDir::new().unwrap();
        fs::create_dir_all(first.path().join("src/parser")).unwrap();
        fs::write(first.path().join("src/parser/Parser.pas"), "").unwrap();
        fs::write(first.path().join("src/Shared.pas"), "").unwrap();
        fs::write(second.path().join("Shared.pas"), "").unwrap();
        fs::write(second.path().join("Other.pas"), "").unwrap();

        let mut resolver =
            SourceDirResolver::new(vec![first.path().to_owned(), second.path().to_owned()]);

        assert_eq!(
            resolver.resolve("Parser", ".pas").unwrap(),
            SourceArtifact::Resolved(first.path().join("src/parser/Parser.pas"))
        );
        // The first directory takes precedence.
        assert_eq!(
            resolver.resolve("Shared", ".pas").unwrap(),
            SourceArtifact::Resolved(first.path().join("src/Shared.pas"))
        );
        assert_eq!(
            resolver.resolve("Other", ".pas").unwrap(),
            SourceArtifact::Resolved(second.path().join("Other.pas"))
        );

        let err = resolver.resolve("Parser", ".java").unwrap_err();
        assert_eq!(err.file_name(), "Parser.java");
    }

    #[test]
    fn no_roots_resolves_nothing() {
        let mut resolver = SourceDirResolver::new(Vec::new());
        let err = resolver.resolve("Foo", ".pas").unwrap_err();
        assert_eq!(err.identity(), "Foo");

        let placeholder = resolver.placeholder("Foo");
        assert!(!placeholder.is_resolved());
        assert_eq!(placeholder.to_string(), "Foo");
    }
}
