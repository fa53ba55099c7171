use std::time::Duration;

use crate::UploadError;

/// Generic retry helper for transport operations.
///
/// `op` receives the 1-based attempt number. Transport failures are retried
/// until `max_attempts` attempts have been made; any other error is returned
/// immediately. When `backoff` is non-zero the wait grows linearly with the
/// attempt number; a zero backoff retries straight away.
pub fn retry_operation<F, T>(max_attempts: u32, backoff: Duration, mut op: F) -> Result<T, UploadError>
where
    F: FnMut(u32) -> Result<T, UploadError>,
{
    let max_attempts = max_attempts.max(1);
    let mut attempt = 1;
    loop {
        match op(attempt) {
            Ok(v) => return Ok(v),
            Err(e) if e.is_transport() && attempt < max_attempts => {
                if !backoff.is_zero() {
                    std::thread::sleep(backoff.saturating_mul(attempt));
                }
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}

/// Convert a byte count into a human readable string using IEC units (KiB/MiB/GiB).
pub fn human_bytes(bytes: u64) -> String {
    const KB: f64 = 1024.0;
    const MB: f64 = KB * 1024.0;
    const GB: f64 = MB * 1024.0;
    let b = bytes as f64;
    if b >= GB {
        format!("{:.2} GiB", b / GB)
    } else if b >= MB {
        format!("{:.2} MiB", b / MB)
    } else if b >= KB {
        format!("{:.2} KiB", b / KB)
    } else {
        format!("{} B", bytes)
    }
}
