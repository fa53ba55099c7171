use crate::UploadError;
use crate::config::Config;
use crate::ledger::Ledger;
use crate::lock::InstanceLock;
use crate::orchestrator::{RunSummary, Uploader};
use crate::transfer::{CandidateFile, Connector, SftpConnector, TransferSession, find_files};

pub const EXIT_OK: i32 = 0;
pub const EXIT_FAILURE: i32 = 1;

/// One upload pass against the configured SFTP endpoint.
pub fn run(config: &Config) -> i32 {
    run_with(config, SftpConnector::new(config.remote.clone()))
}

/// Run one pass and map the result to a process exit code.
///
/// A run that finds another instance holding the lock logs it and exits
/// successfully; any other error is logged and yields [`EXIT_FAILURE`].
pub fn run_with<C: Connector>(config: &Config, connector: C) -> i32 {
    tracing::info!("*** starting");
    match upload_pending(config, connector) {
        Ok(summary) => {
            if summary.failed > 0 {
                tracing::warn!("{} file(s) left for the next run", summary.failed);
            }
            tracing::info!("{}", summary);
            tracing::info!("*** normal exit");
            EXIT_OK
        }
        Err(UploadError::AlreadyRunning(path)) => {
            tracing::info!("previous run still in progress (lock {}), exiting", path.display());
            EXIT_OK
        }
        Err(e) => {
            tracing::error!("{}", e);
            EXIT_FAILURE
        }
    }
}

/// Lock, load the ledger, send every unseen candidate, save the ledger.
///
/// The ledger is saved and the lock released on every exit path, including
/// errors half-way through the candidates.
pub fn upload_pending<C: Connector>(config: &Config, connector: C) -> Result<RunSummary, UploadError> {
    let _lock = InstanceLock::acquire(&config.lock_path)?;

    let session = TransferSession::new(connector)
        .with_max_attempts(config.max_attempts)
        .with_backoff(config.retry_backoff());
    let mut uploader = Uploader::new(session);
    let loaded = uploader.load_ledger(&config.ledger_path)?.len();
    tracing::debug!(
        "scanning {} for {} ({} already sent)",
        config.source_dir.display(),
        config.pattern,
        loaded
    );

    for candidate in find_files(&config.source_dir, &config.pattern) {
        uploader.put(&candidate.path)?;
    }
    uploader.finish()
}

/// Candidates not yet in the ledger. Reads only; takes no lock.
pub fn pending_files(config: &Config) -> Result<Vec<CandidateFile>, UploadError> {
    let ledger = Ledger::load(&config.ledger_path)?;
    Ok(find_files(&config.source_dir, &config.pattern)
        .filter(|c| !ledger.contains(&c.name))
        .collect())
}
