pub mod app;
pub mod cli;
pub mod config;
pub mod error;
pub mod ledger;
pub mod lock;
pub mod logging;
pub mod orchestrator;
pub mod transfer;
pub mod util;

pub use error::UploadError;
pub use ledger::Ledger;
pub use lock::InstanceLock;
pub use orchestrator::{PutOutcome, RunSummary, Uploader};
pub use transfer::TransferSession;
