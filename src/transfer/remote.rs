use std::io::{Read, Write};
use std::path::Path;

use crate::UploadError;
use crate::transfer::helpers::remote_path;

/// One live connection to the remote endpoint. Tests inject scripted
/// implementations; production uses [`SftpStore`].
pub trait RemoteStore {
    /// Store everything `src` yields under `name`, returning the byte count.
    /// Read errors on `src` must surface as [`UploadError::LocalIo`] so the
    /// caller can tell them apart from transport failures.
    fn store(&mut self, name: &str, src: &mut dyn Read, local: &Path) -> Result<u64, UploadError>;

    /// End the session with the remote endpoint.
    fn close(&mut self) -> Result<(), UploadError>;
}

/// Opens new connections on demand.
pub trait Connector {
    fn connect(&self) -> Result<Box<dyn RemoteStore>, UploadError>;
}

/// SFTP-backed store owning the SSH session it runs on.
pub struct SftpStore {
    sess: ssh2::Session,
    sftp: ssh2::Sftp,
    remote_dir: String,
    buf: Vec<u8>,
}

const COPY_BUF_SIZE: usize = 256 * 1024;

impl SftpStore {
    pub fn new(sess: ssh2::Session, remote_dir: &str) -> Result<Self, UploadError> {
        let sftp = sess.sftp().map_err(|e| UploadError::SftpCreateFailed(e.to_string()))?;
        Ok(Self { sess, sftp, remote_dir: remote_dir.to_string(), buf: vec![0u8; COPY_BUF_SIZE] })
    }
}

impl RemoteStore for SftpStore {
    fn store(&mut self, name: &str, src: &mut dyn Read, local: &Path) -> Result<u64, UploadError> {
        let target = remote_path(&self.remote_dir, name);
        let mut remote_f = self
            .sftp
            .create(Path::new(&target))
            .map_err(|e| UploadError::RemoteWrite(target.clone(), e.to_string()))?;
        let mut written: u64 = 0;
        loop {
            let n = match src.read(&mut self.buf) {
                Ok(0) => break,
                Ok(n) => n,
                Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(UploadError::local_io(local, e)),
            };
            remote_f
                .write_all(&self.buf[..n])
                .map_err(|e| UploadError::RemoteWrite(target.clone(), e.to_string()))?;
            written += n as u64;
        }
        remote_f.flush().map_err(|e| UploadError::RemoteWrite(target.clone(), e.to_string()))?;
        Ok(written)
    }

    fn close(&mut self) -> Result<(), UploadError> {
        self.sess
            .disconnect(None, "upload finished", None)
            .map_err(|e| UploadError::RemoteWrite(self.remote_dir.clone(), e.to_string()))
    }
}
