use std::path::{Path, PathBuf};

/// Crate-wide error type for the lock, ledger and transfer layers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadError {
    /// Another live process holds the instance lock.
    AlreadyRunning(PathBuf),
    /// The lock file could not be opened or written.
    Lock(PathBuf, String),
    /// `put` was called before a ledger was loaded.
    LedgerNotLoaded,
    /// Reading or persisting the ledger file failed.
    Ledger(PathBuf, String),
    /// Local file could not be opened or read.
    LocalIo(PathBuf, String),
    // SSH / connection related
    SshNoAddress(String),
    SshConnectFailed(String, String),
    SshHandshakeFailed(String, String),
    SshAuthFailed(String),
    SftpCreateFailed(String),
    RemoteWrite(String, String),
}

impl std::fmt::Display for UploadError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        use UploadError::*;
        match self {
            AlreadyRunning(p) => write!(f, "another instance is running (lock held: {})", p.display()),
            Lock(p, msg) => write!(f, "cannot acquire lock {}: {}", p.display(), msg),
            LedgerNotLoaded => write!(f, "uploaded set not loaded"),
            Ledger(p, msg) => write!(f, "ledger {}: {}", p.display(), msg),
            LocalIo(p, msg) => write!(f, "local file {}: {}", p.display(), msg),
            SshNoAddress(addr) => write!(f, "cannot resolve address: {}", addr),
            SshConnectFailed(addr, msg) => write!(f, "connect to {} failed: {}", addr, msg),
            SshHandshakeFailed(addr, msg) => write!(f, "SSH handshake with {} failed: {}", addr, msg),
            SshAuthFailed(addr) => write!(f, "SSH authentication failed: {}", addr),
            SftpCreateFailed(msg) => write!(f, "SFTP subsystem unavailable: {}", msg),
            RemoteWrite(path, msg) => write!(f, "remote store of {} failed: {}", path, msg),
        }
    }
}

impl std::error::Error for UploadError {}

impl UploadError {
    pub(crate) fn local_io(path: &Path, err: impl std::fmt::Display) -> Self {
        UploadError::LocalIo(path.to_path_buf(), err.to_string())
    }

    pub(crate) fn ledger(path: &Path, err: impl std::fmt::Display) -> Self {
        UploadError::Ledger(path.to_path_buf(), err.to_string())
    }

    /// Whether the failure happened while talking to the remote endpoint.
    /// Transport failures are retried by the transfer session and, once the
    /// attempts run out, only abandon the current file. Everything else
    /// aborts the run.
    pub fn is_transport(&self) -> bool {
        use UploadError::*;
        match self {
            SshNoAddress(_)
            | SshConnectFailed(_, _)
            | SshHandshakeFailed(_, _)
            | SshAuthFailed(_)
            | SftpCreateFailed(_)
            | RemoteWrite(_, _) => true,
            AlreadyRunning(_)
            | Lock(_, _)
            | LedgerNotLoaded
            | Ledger(_, _)
            | LocalIo(_, _) => false,
        }
    }
}
