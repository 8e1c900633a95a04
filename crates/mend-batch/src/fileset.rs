//! File sets: explicit lists or root + include/exclude globs
//!
//! Globs match paths relative to the root with `/` separators; `*` also
//! crosses directories, so `*.html` selects every HTML file under the root.
//! Hidden directories (`.git`, `.cache`, ...) are never entered. Entries
//! below the root that cannot be read are logged and left out of the set.

use crate::error::BatchError;
use globset::{Glob, GlobSet, GlobSetBuilder};
use std::path::{Path, PathBuf};
use walkdir::{DirEntry, WalkDir};

/// Files a batch runs over
#[derive(Debug, Clone)]
pub enum FileSet {
    /// Exactly these paths, as given
    Explicit(Vec<PathBuf>),
    /// Files under `root` matching `include` and not `exclude`
    Glob {
        /// Directory to walk
        root: PathBuf,
        /// At least one must match
        include: GlobSet,
        /// None may match
        exclude: GlobSet,
    },
}

impl FileSet {
    /// Explicit list
    #[must_use]
    pub fn explicit<I, P>(paths: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        Self::Explicit(paths.into_iter().map(Into::into).collect())
    }

    /// Glob set under `root`
    ///
    /// # Errors
    /// `BatchError::InvalidGlob` for a pattern that does not compile.
    pub fn glob<S: AsRef<str>>(
        root: impl Into<PathBuf>,
        include: &[S],
        exclude: &[S],
    ) -> Result<Self, BatchError> {
        Ok(Self::Glob {
            root: root.into(),
            include: compile_globset(include)?,
            exclude: compile_globset(exclude)?,
        })
    }

    /// Paths in sorted order
    ///
    /// # Errors
    /// `BatchError::Walk` when the root cannot be traversed.
    pub fn resolve(&self) -> Result<Vec<PathBuf>, BatchError> {
        match self {
            Self::Explicit(paths) => {
                let mut paths = paths.clone();
                paths.sort();
                paths.dedup();
                Ok(paths)
            }
            Self::Glob {
                root,
                include,
                exclude,
            } => walk(root, include, exclude),
        }
    }
}

fn walk(root: &Path, include: &GlobSet, exclude: &GlobSet) -> Result<Vec<PathBuf>, BatchError> {
    let mut paths = Vec::new();
    let walker = WalkDir::new(root)
        .follow_links(false)
        .into_iter()
        .filter_entry(|entry| entry.depth() == 0 || !is_hidden_dir(entry));
    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            // only an unreadable root aborts; anything deeper is skipped
            Err(err) if err.depth() > 0 => {
                tracing::warn!(
                    root = %root.display(),
                    path = ?err.path(),
                    error = %err,
                    "skipping unreadable entry"
                );
                continue;
            }
            Err(err) => {
                return Err(BatchError::Walk {
                    root: root.to_path_buf(),
                    message: err.to_string(),
                });
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }
        let rel = entry.path().strip_prefix(root).unwrap_or(entry.path());
        if include.is_match(rel) && !exclude.is_match(rel) {
            paths.push(entry.path().to_path_buf());
        }
    }
    paths.sort();
    tracing::debug!(root = %root.display(), files = paths.len(), "file set resolved");
    Ok(paths)
}

fn is_hidden_dir(entry: &DirEntry) -> bool {
    entry.file_type().is_dir() && entry.file_name().to_string_lossy().starts_with('.')
}

fn compile_globset<S: AsRef<str>>(globs: &[S]) -> Result<GlobSet, BatchError> {
    let mut builder = GlobSetBuilder::new();
    for g in globs {
        let g = g.as_ref();
        builder.add(Glob::new(g).map_err(|source| BatchError::InvalidGlob {
            glob: g.to_string(),
            source,
        })?);
    }
    builder.build().map_err(|source| BatchError::InvalidGlob {
        glob: globs.iter().map(AsRef::as_ref).collect::<Vec<_>>().join(", "),
        source,
    })
}
