use std::path::Path;
use std::time::{Duration, Instant};

use crate::UploadError;
use crate::ledger::Ledger;
use crate::transfer::{Connector, TransferSession, base_name};

/// What `Uploader::put` did with one file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PutOutcome {
    /// Already in the ledger; nothing was sent.
    Skipped,
    /// Transferred and recorded.
    Uploaded,
    /// Every attempt failed; the file stays a candidate for the next run.
    Failed,
}

/// Counters for one run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub seen: usize,
    pub skipped: usize,
    pub uploaded: usize,
    pub failed: usize,
    pub duration: Duration,
}

impl RunSummary {
    fn record(&mut self, outcome: PutOutcome) {
        self.seen += 1;
        match outcome {
            PutOutcome::Skipped => self.skipped += 1,
            PutOutcome::Uploaded => self.uploaded += 1,
            PutOutcome::Failed => self.failed += 1,
        }
    }
}

impl std::fmt::Display for RunSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "candidates={} uploaded={} skipped={} failed={} elapsed={:.2}s",
            self.seen,
            self.uploaded,
            self.skipped,
            self.failed,
            self.duration.as_secs_f64()
        )
    }
}

/// Sends each file at most once by consulting the ledger before handing it
/// to the transfer session.
///
/// The ledger is written back when the uploader is finished or dropped, so a
/// run that aborts half-way still records what it sent. Fields drop in
/// declaration order: the ledger save in `Drop` happens before the session
/// closes its connection.
pub struct Uploader<C: Connector> {
    ledger: Option<Ledger>,
    summary: RunSummary,
    started: Instant,
    session: TransferSession<C>,
}

impl<C: Connector> Uploader<C> {
    pub fn new(session: TransferSession<C>) -> Self {
        Self { ledger: None, summary: RunSummary::default(), started: Instant::now(), session }
    }

    pub fn load_ledger(&mut self, path: impl AsRef<Path>) -> Result<&Ledger, UploadError> {
        let ledger = Ledger::load(path)?;
        Ok(self.ledger.insert(ledger))
    }

    pub fn ledger(&self) -> Option<&Ledger> {
        self.ledger.as_ref()
    }

    pub fn session(&self) -> &TransferSession<C> {
        &self.session
    }

    pub fn summary(&self) -> &RunSummary {
        &self.summary
    }

    pub fn put(&mut self, local: &Path) -> Result<PutOutcome, UploadError> {
        let Some(ledger) = self.ledger.as_mut() else {
            tracing::error!("!!! uploaded set not loaded");
            return Err(UploadError::LedgerNotLoaded);
        };
        let name = base_name(local)?;
        let outcome = if ledger.contains(&name) {
            tracing::trace!("{} already sent, skipping", name);
            PutOutcome::Skipped
        } else if self.session.put(local)? {
            ledger.add(name.as_str());
            tracing::info!("{} successfully sent", name);
            PutOutcome::Uploaded
        } else {
            PutOutcome::Failed
        };
        self.summary.record(outcome);
        Ok(outcome)
    }

    /// Persist the ledger and close the session.
    pub fn finish(mut self) -> Result<RunSummary, UploadError> {
        self.summary.duration = self.started.elapsed();
        if let Some(ledger) = self.ledger.take() {
            ledger.save()?;
        }
        self.session.close();
        Ok(std::mem::take(&mut self.summary))
    }
}

impl<C: Connector> Drop for Uploader<C> {
    fn drop(&mut self) {
        if let Some(ledger) = self.ledger.take() {
            tracing::debug!("saving ledger on early exit");
            if let Err(e) = ledger.save() {
                tracing::error!("ledger save failed: {}", e);
            }
        }
    }
}
