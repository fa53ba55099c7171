use std::collections::HashSet;
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;

use crate::UploadError;

/// Durable record of base file names already confirmed uploaded.
///
/// Members are only ever added, and only after a confirmed transfer. The
/// backing set is private so callers cannot bypass that rule.
#[derive(Debug, Clone, Default)]
pub struct Ledger {
    path: PathBuf,
    names: HashSet<String>,
}

impl Ledger {
    /// Read the ledger at `path`. A missing file is an empty ledger.
    ///
    /// Every line is taken verbatim after dropping its terminator, so an
    /// empty line becomes an empty-string member.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, UploadError> {
        let path = path.as_ref().to_path_buf();
        let mut names = HashSet::new();
        match File::open(&path) {
            Ok(f) => {
                for line in BufReader::new(f).lines() {
                    let line = line.map_err(|e| UploadError::ledger(&path, e))?;
                    names.insert(line);
                }
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!("ledger {} not found, starting empty", path.display());
            }
            Err(e) => return Err(UploadError::ledger(&path, e)),
        }
        tracing::debug!("ledger loaded: {} entries from {}", names.len(), path.display());
        Ok(Self { path, names })
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.contains(name)
    }

    /// Record `name`. Returns false if it was already present.
    pub fn add(&mut self, name: impl Into<String>) -> bool {
        self.names.insert(name.into())
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// The path the ledger was loaded from; `save` writes back here.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Members in sorted order, the same order they are written in.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        let mut sorted: Vec<&str> = self.names.iter().map(String::as_str).collect();
        sorted.sort_unstable();
        sorted.into_iter()
    }

    pub fn save(&self) -> Result<(), UploadError> {
        self.save_to(&self.path)
    }

    /// Atomically replace `path` with the current members.
    ///
    /// Readers see either the previous complete file or the new one, never a
    /// partial write. The containing directory is synced after the rename so
    /// the new entry survives a power loss.
    pub fn save_to(&self, path: impl AsRef<Path>) -> Result<(), UploadError> {
        let path = path.as_ref();
        let staged = self.stage(path)?;
        staged.persist(path).map_err(|e| UploadError::ledger(path, e.error))?;
        sync_dir(parent_dir(path)).map_err(|e| UploadError::ledger(path, e))?;
        tracing::info!("persistent file saved: {} ({} entries)", path.display(), self.len());
        Ok(())
    }

    /// Write every member to a temp file beside `path` and fsync it.
    /// Nothing is visible at `path` until the returned file is persisted.
    fn stage(&self, path: &Path) -> Result<NamedTempFile, UploadError> {
        let tmp = NamedTempFile::new_in(parent_dir(path)).map_err(|e| UploadError::ledger(path, e))?;
        {
            let mut w = BufWriter::new(tmp.as_file());
            for name in self.iter() {
                writeln!(w, "{}", name).map_err(|e| UploadError::ledger(path, e))?;
            }
            w.flush().map_err(|e| UploadError::ledger(path, e))?;
        }
        tmp.as_file().sync_all().map_err(|e| UploadError::ledger(path, e))?;
        Ok(tmp)
    }
}

fn parent_dir(path: &Path) -> &Path {
    match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    }
}

#[cfg(unix)]
fn sync_dir(dir: &Path) -> std::io::Result<()> {
    File::open(dir)?.sync_all()
}

// Directories cannot be opened as files here; the rename is already durable.
#[cfg(not(unix))]
fn sync_dir(_dir: &Path) -> std::io::Result<()> {
    Ok(())
}
