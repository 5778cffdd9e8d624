//! Write-with-retry and batch materialization.
//!
//! Each file gets up to `max_attempts` writes, sleeping `base_delay × attempt`
//! after a failed attempt. Failures are collected per file; one bad file
//! never stops the rest of the batch.

use serde::Serialize;
use std::time::Duration;

use super::parser::FileUnit;
use super::writer::FileWriter;
use crate::error::Result;

#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_secs(1),
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct FailedWrite {
    pub path: String,
    pub error: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ImportReport {
    pub total: usize,
    pub written: Vec<String>,
    pub failed: Vec<FailedWrite>,
}

impl ImportReport {
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }
}

pub async fn write_with_retry<W: FileWriter>(
    writer: &W,
    unit: &FileUnit,
    policy: &RetryPolicy,
) -> Result<()> {
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 1;
    loop {
        match writer.write_file(&unit.path, &unit.content).await {
            Ok(()) => return Ok(()),
            Err(e) if attempt < max_attempts => {
                let delay = policy.base_delay * attempt;
                tracing::warn!(
                    "Write of {} failed (attempt {}/{}): {}; retrying in {:?}",
                    unit.path,
                    attempt,
                    max_attempts,
                    e,
                    delay
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(e) => {
                tracing::error!("Giving up on {} after {} attempts: {}", unit.path, attempt, e);
                return Err(e);
            }
        }
    }
}

pub async fn materialize<W: FileWriter>(
    writer: &W,
    units: &[FileUnit],
    policy: &RetryPolicy,
) -> ImportReport {
    let mut report = ImportReport {
        total: units.len(),
        ..Default::default()
    };

    for unit in units {
        match write_with_retry(writer, unit, policy).await {
            Ok(()) => report.written.push(unit.path.clone()),
            Err(e) => report.failed.push(FailedWrite {
                path: unit.path.clone(),
                error: e.to_string(),
            }),
        }
    }

    tracing::info!(
        "Materialized {}/{} files ({} failed)",
        report.written.len(),
        report.total,
        report.failed.len()
    );
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;
    use std::collections::HashMap;
    use std::sync::Mutex;
    use tokio::time::Instant;

    /// Fails each path a configured number of times before succeeding.
    #[derive(Default)]
    struct FlakyWriter {
        failures: Mutex<HashMap<String, u32>>,
        calls: Mutex<Vec<(String, Instant)>>,
    }

    impl FlakyWriter {
        fn failing(path: &str, times: u32) -> Self {
            let writer = Self::default();
            writer.failures.lock().unwrap().insert(path.to_string(), times);
            writer
        }
    }

    impl FileWriter for FlakyWriter {
        async fn write_file(&self, path: &str, _content: &str) -> Result<()> {
            self.calls.lock().unwrap().push((path.to_string(), Instant::now()));
            let mut failures = self.failures.lock().unwrap();
            match failures.get_mut(path) {
                Some(remaining) if *remaining > 0 => {
                    *remaining -= 1;
                    Err(AppError::Upstream { status: 503, message: "busy".into() })
                }
                _ => Ok(()),
            }
        }
    }

    fn unit(path: &str) -> FileUnit {
        FileUnit { path: path.to_string(), content: "x\n".to_string() }
    }

    #[tokio::test(start_paused = true)]
    async fn succeeds_on_third_attempt_with_linear_backoff() {
        let writer = FlakyWriter::failing("a.txt", 2);
        let start = Instant::now();

        write_with_retry(&writer, &unit("a.txt"), &RetryPolicy::default())
            .await
            .unwrap();

        let calls = writer.calls.lock().unwrap();
        assert_eq!(calls.len(), 3);
        assert_eq!(calls[0].1 - start, Duration::from_secs(0));
        assert_eq!(calls[1].1 - calls[0].1, Duration::from_secs(1));
        assert_eq!(calls[2].1 - calls[1].1, Duration::from_secs(2));
    }

    #[tokio::test(start_paused = true)]
    async fn gives_up_after_three_attempts() {
        let writer = FlakyWriter::failing("a.txt", 5);
        let result = write_with_retry(&writer, &unit("a.txt"), &RetryPolicy::default()).await;
        assert!(result.is_err());
        assert_eq!(writer.calls.lock().unwrap().len(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn one_failure_does_not_block_others() {
        let writer = FlakyWriter::failing("bad.txt", 10);
        let units = vec![unit("a.txt"), unit("bad.txt"), unit("c.txt")];

        let report = materialize(&writer, &units, &RetryPolicy::default()).await;

        assert_eq!(report.total, 3);
        assert_eq!(report.written, vec!["a.txt", "c.txt"]);
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].path, "bad.txt");
        assert!(!report.is_success());
    }
}
