#![allow(dead_code)]
use std::cell::RefCell;
use std::collections::VecDeque;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use upload_once::UploadError;
use upload_once::config::{Config, RemoteConfig};
use upload_once::transfer::{Connector, RemoteStore};

/// What a scripted store should do on one `store` call.
#[derive(Clone, Debug)]
pub enum Step {
    Ok,
    Transient,
    // a failure that is not a transport error and must abort the run
    LocalFailure,
}

/// In-memory stand-in for the remote endpoint. Shared between runs so
/// tests can observe every transfer that reached it.
#[derive(Default)]
pub struct RemoteLog {
    pub script: VecDeque<Step>,
    pub attempts: Vec<String>,
    pub stored: Vec<(String, Vec<u8>)>,
    pub connects: u32,
    pub closes: u32,
}

impl RemoteLog {
    pub fn stored_names(&self) -> Vec<String> {
        self.stored.iter().map(|(n, _)| n.clone()).collect()
    }
}

#[derive(Clone, Default)]
pub struct ScriptedConnector {
    pub log: Rc<RefCell<RemoteLog>>,
}

impl ScriptedConnector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_script(steps: &[Step]) -> Self {
        let c = Self::default();
        c.log.borrow_mut().script = steps.iter().cloned().collect();
        c
    }
}

struct ScriptedStore {
    log: Rc<RefCell<RemoteLog>>,
}

impl RemoteStore for ScriptedStore {
    fn store(&mut self, name: &str, src: &mut dyn Read, local: &Path) -> Result<u64, UploadError> {
        let mut log = self.log.borrow_mut();
        log.attempts.push(name.to_string());
        let mut data = Vec::new();
        src.read_to_end(&mut data).map_err(|e| UploadError::LocalIo(local.to_path_buf(), e.to_string()))?;
        match log.script.pop_front().unwrap_or(Step::Ok) {
            Step::Ok => {
                let n = data.len() as u64;
                log.stored.push((name.to_string(), data));
                Ok(n)
            }
            Step::Transient => Err(UploadError::RemoteWrite(name.to_string(), "426 connection closed".into())),
            Step::LocalFailure => Err(UploadError::LocalIo(local.to_path_buf(), "read failed".into())),
        }
    }

    fn close(&mut self) -> Result<(), UploadError> {
        self.log.borrow_mut().closes += 1;
        Ok(())
    }
}

impl Connector for ScriptedConnector {
    fn connect(&self) -> Result<Box<dyn RemoteStore>, UploadError> {
        self.log.borrow_mut().connects += 1;
        Ok(Box::new(ScriptedStore { log: self.log.clone() }))
    }
}

/// Scratch layout: `<tmp>/log` holds candidates, ledger and lock sit beside it.
pub struct Workspace {
    pub dir: tempfile::TempDir,
    pub config: Config,
}

impl Workspace {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().expect("tempdir");
        let source = dir.path().join("log");
        std::fs::create_dir_all(&source).unwrap();
        let config = Config {
            remote: RemoteConfig {
                host: "ftp.host.com".to_string(),
                port: 22,
                username: "ftpuser".to_string(),
                password: Some("ftppass".to_string()),
                remote_dir: ".".to_string(),
                connect_timeout_secs: 1,
                io_timeout_secs: 1,
            },
            source_dir: source,
            pattern: "L*.BIN".to_string(),
            ledger_path: dir.path().join("uploaded.txt"),
            lock_path: dir.path().join("upload.lock"),
            log_path: dir.path().join("upload.log"),
            max_attempts: 3,
            retry_backoff_ms: 0,
        };
        Self { dir, config }
    }

    pub fn add_file(&self, rel: &str, contents: &[u8]) -> PathBuf {
        let p = self.config.source_dir.join(rel);
        if let Some(parent) = p.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(&p, contents).unwrap();
        p
    }

    pub fn write_ledger(&self, contents: &str) {
        std::fs::write(&self.config.ledger_path, contents).unwrap();
    }

    pub fn ledger_text(&self) -> String {
        std::fs::read_to_string(&self.config.ledger_path).unwrap_or_default()
    }
}
