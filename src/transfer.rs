// transfer module: remote session, enumeration and path helpers
pub mod enumeration;
mod helpers;
pub mod remote;
pub mod session;

use std::fs::File;
use std::io::{Seek, SeekFrom};
use std::path::Path;
use std::time::Duration;

pub use enumeration::{CandidateFile, FindFiles, find_files};
pub use helpers::{base_name, normalize_path, remote_path, wildcard_match};
pub use remote::{Connector, RemoteStore};
pub use session::SftpConnector;

use self::helpers::display_path;
use crate::UploadError;
use crate::util::{human_bytes, retry_operation};

pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// Stateful handle on one logical connection to the remote endpoint.
///
/// Nothing is opened until the first `put`. A connection survives across
/// calls until a transport failure discards it; the next attempt reconnects
/// transparently. Dropping the session closes a live connection.
pub struct TransferSession<C: Connector> {
    connector: C,
    conn: Option<Box<dyn RemoteStore>>,
    max_attempts: u32,
    backoff: Duration,
    connects: u32,
    store_attempts: u32,
}

impl<C: Connector> TransferSession<C> {
    pub fn new(connector: C) -> Self {
        Self {
            connector,
            conn: None,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            backoff: Duration::ZERO,
            connects: 0,
            store_attempts: 0,
        }
    }

    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts.max(1);
        self
    }

    pub fn with_backoff(mut self, backoff: Duration) -> Self {
        self.backoff = backoff;
        self
    }

    /// Upload `local` under its base name.
    ///
    /// Returns `Ok(false)` once every attempt failed with a transport error.
    /// Local I/O failures are returned as errors and not retried.
    pub fn put(&mut self, local: &Path) -> Result<bool, UploadError> {
        let name = base_name(local)?;
        let mut file = File::open(local).map_err(|e| UploadError::local_io(local, e))?;
        let max_attempts = self.max_attempts;

        let res = retry_operation(max_attempts, self.backoff, |attempt| {
            file.seek(SeekFrom::Start(0)).map_err(|e| UploadError::local_io(local, e))?;
            match self.try_store(&name, &mut file, local) {
                Ok(bytes) => Ok(bytes),
                Err(e) => {
                    // the connection may be half-broken; rebuild it on the next attempt
                    self.conn = None;
                    if e.is_transport() {
                        tracing::warn!(
                            "attempt {}/{} for {} failed: {}",
                            attempt,
                            max_attempts,
                            name,
                            e
                        );
                    }
                    Err(e)
                }
            }
        });

        match res {
            Ok(bytes) => {
                tracing::debug!("stored {} ({})", display_path(local), human_bytes(bytes));
                Ok(true)
            }
            Err(e) if e.is_transport() => {
                tracing::warn!("giving up on {} after {} attempts", name, max_attempts);
                Ok(false)
            }
            Err(e) => Err(e),
        }
    }

    fn try_store(&mut self, name: &str, file: &mut File, local: &Path) -> Result<u64, UploadError> {
        let conn = match self.conn.take() {
            Some(conn) => conn,
            None => {
                self.connects += 1;
                self.connector.connect()?
            }
        };
        let conn = self.conn.insert(conn);
        self.store_attempts += 1;
        conn.store(name, file, local)
    }

    /// End the remote session if one is live. Never fails; errors are logged.
    pub fn close(&mut self) {
        if let Some(mut conn) = self.conn.take() {
            if let Err(e) = conn.close() {
                tracing::warn!("closing remote session failed: {}", e);
            } else {
                tracing::debug!("remote session closed");
            }
        }
    }

    pub fn is_connected(&self) -> bool {
        self.conn.is_some()
    }

    /// Number of connections opened so far.
    pub fn connects(&self) -> u32 {
        self.connects
    }

    /// Number of store operations issued so far, failed ones included.
    pub fn store_attempts(&self) -> u32 {
        self.store_attempts
    }
}

impl<C: Connector> Drop for TransferSession<C> {
    fn drop(&mut self) {
        self.close();
    }
}
