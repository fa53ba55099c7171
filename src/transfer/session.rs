use std::net::{TcpStream, ToSocketAddrs};
use std::time::Duration;

use crate::UploadError;
use crate::config::RemoteConfig;
use crate::transfer::remote::{Connector, RemoteStore, SftpStore};

/// SSH key authentication fallback using the usual files under ~/.ssh.
fn try_key_authentication(sess: &mut ssh2::Session, username: &str) -> bool {
    if sess.authenticated() {
        return true;
    }
    if let Some(home_p) = dirs::home_dir() {
        for name in ["id_ed25519", "id_rsa", "id_ecdsa"] {
            let p = home_p.join(".ssh").join(name);
            if p.exists() {
                let _ = sess.userauth_pubkey_file(username, None, &p, None);
                if sess.authenticated() {
                    return true;
                }
            }
        }
    }
    false
}

/// Resolve `addr`, connect with the configured timeout and bound socket I/O.
fn create_tcp_connection(addr: &str, remote: &RemoteConfig) -> Result<TcpStream, UploadError> {
    let mut addrs = addr
        .to_socket_addrs()
        .map_err(|_| UploadError::SshNoAddress(addr.to_string()))?;
    let sock = addrs.next().ok_or_else(|| UploadError::SshNoAddress(addr.to_string()))?;
    let tcp = TcpStream::connect_timeout(&sock, Duration::from_secs(remote.connect_timeout_secs))
        .map_err(|e| UploadError::SshConnectFailed(addr.to_string(), e.to_string()))?;
    let io_timeout = Some(Duration::from_secs(remote.io_timeout_secs));
    let _ = tcp.set_read_timeout(io_timeout);
    let _ = tcp.set_write_timeout(io_timeout);
    Ok(tcp)
}

// libssh2 takes milliseconds as u32; large values clamp instead of wrapping.
fn session_timeout_ms(secs: u64) -> u32 {
    secs.saturating_mul(1000).min(u32::MAX as u64) as u32
}

/// Connect, handshake and authenticate. Password auth is tried first when a
/// password is configured, then key files.
pub fn connect_session(remote: &RemoteConfig) -> Result<ssh2::Session, UploadError> {
    let addr = format!("{}:{}", remote.host, remote.port);
    let tcp = create_tcp_connection(&addr, remote)?;
    let mut sess = ssh2::Session::new()
        .map_err(|e| UploadError::SshConnectFailed(addr.clone(), e.to_string()))?;
    sess.set_tcp_stream(tcp);
    sess.set_timeout(session_timeout_ms(remote.io_timeout_secs));
    sess.handshake().map_err(|e| UploadError::SshHandshakeFailed(addr.clone(), e.to_string()))?;

    if let Some(password) = remote.password.as_deref()
        && let Err(e) = sess.userauth_password(&remote.username, password)
    {
        tracing::debug!("password authentication for {} failed: {}", remote.username, e);
    }
    if try_key_authentication(&mut sess, &remote.username) {
        Ok(sess)
    } else {
        Err(UploadError::SshAuthFailed(addr))
    }
}

/// Production connector: SFTP over SSH to the configured endpoint.
#[derive(Debug, Clone)]
pub struct SftpConnector {
    remote: RemoteConfig,
}

impl SftpConnector {
    pub fn new(remote: RemoteConfig) -> Self {
        Self { remote }
    }
}

impl Connector for SftpConnector {
    fn connect(&self) -> Result<Box<dyn RemoteStore>, UploadError> {
        let sess = connect_session(&self.remote)?;
        tracing::info!("connected to {}:{} as {}", self.remote.host, self.remote.port, self.remote.username);
        Ok(Box::new(SftpStore::new(sess, &self.remote.remote_dir)?))
    }
}
