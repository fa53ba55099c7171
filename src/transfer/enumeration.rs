use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use super::helpers::display_path;
use super::wildcard_match;

/// A file found under the source directory whose name matches the pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateFile {
    pub path: PathBuf,
    pub name: String,
}

/// Lazy recursive walk yielding matching regular files.
///
/// Entries are visited sorted by file name so runs are reproducible.
/// Directory links are not descended into, but a link to a regular file is a
/// candidate like the file itself. Entries that cannot be read, and names
/// that are not valid UTF-8, are logged and skipped.
pub struct FindFiles {
    walker: walkdir::IntoIter,
    pattern: String,
}

pub fn find_files(root: impl AsRef<Path>, pattern: &str) -> FindFiles {
    FindFiles {
        walker: WalkDir::new(root).sort_by_file_name().into_iter(),
        pattern: pattern.to_string(),
    }
}

impl Iterator for FindFiles {
    type Item = CandidateFile;

    fn next(&mut self) -> Option<CandidateFile> {
        loop {
            let entry = match self.walker.next()? {
                Ok(e) => e,
                Err(e) => {
                    match e.path() {
                        Some(p) => tracing::warn!("skipping {}: {}", display_path(p), e),
                        None => tracing::warn!("skipping unreadable entry: {}", e),
                    }
                    continue;
                }
            };
            if !is_file(&entry) {
                continue;
            }
            let Some(name) = entry.file_name().to_str() else {
                tracing::warn!("skipping {}: file name is not valid UTF-8", display_path(entry.path()));
                continue;
            };
            if wildcard_match(&self.pattern, name) {
                let name = name.to_string();
                return Some(CandidateFile { path: entry.into_path(), name });
            }
        }
    }
}

// Links are resolved here only; the walker itself never follows them.
fn is_file(entry: &walkdir::DirEntry) -> bool {
    if entry.path_is_symlink() {
        entry.path().is_file()
    } else {
        entry.file_type().is_file()
    }
}
