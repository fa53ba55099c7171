use std::fs::{File, OpenOptions};
use std::io::{Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use fs2::FileExt;

use crate::UploadError;

/// Exclusive, non-blocking advisory lock on a well-known file.
///
/// Only one holder per path may exist at a time across processes. The
/// holder's pid is written into the file for operators; nothing reads it
/// back. Dropping the guard unlocks and closes the file on every exit path.
#[derive(Debug)]
pub struct InstanceLock {
    path: PathBuf,
    file: File,
}

impl InstanceLock {
    /// Try to take the lock once. A held lock yields
    /// [`UploadError::AlreadyRunning`] immediately; there is no waiting.
    pub fn acquire(path: impl AsRef<Path>) -> Result<Self, UploadError> {
        let path = path.as_ref().to_path_buf();
        // do not truncate yet: the current holder's pid must survive a failed attempt
        let mut file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(&path)
            .map_err(|e| UploadError::Lock(path.clone(), e.to_string()))?;

        if let Err(e) = file.try_lock_exclusive() {
            if e.kind() == fs2::lock_contended_error().kind() {
                return Err(UploadError::AlreadyRunning(path));
            }
            return Err(UploadError::Lock(path, e.to_string()));
        }

        write_pid(&mut file).map_err(|e| UploadError::Lock(path.clone(), e.to_string()))?;
        tracing::debug!("instance lock acquired: {} (pid {})", path.display(), std::process::id());
        Ok(Self { path, file })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

fn write_pid(file: &mut File) -> std::io::Result<()> {
    file.set_len(0)?;
    file.seek(SeekFrom::Start(0))?;
    writeln!(file, "{}", std::process::id())?;
    file.flush()
}

impl Drop for InstanceLock {
    fn drop(&mut self) {
        // closing the descriptor releases the lock as well; unlock explicitly for clarity in logs
        if let Err(e) = FileExt::unlock(&self.file) {
            tracing::warn!("unlock {} failed: {}", self.path.display(), e);
        }
        tracing::debug!("instance lock released: {}", self.path.display());
    }
}
