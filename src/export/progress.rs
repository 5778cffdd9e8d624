//! Progress snapshots for a running export.
//!
//! The tracker calls a plain synchronous callback on the pipeline's own task.
//! `total` counts one step per fetched file plus the final assembly step, so
//! `current == total` holds exactly on the completion snapshot.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ExportPhase {
    #[default]
    Idle,
    Preparing,
    Processing,
    Complete,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ProgressSnapshot {
    pub current: usize,
    pub total: usize,
    pub file_name: String,
    pub is_complete: bool,
    pub phase: ExportPhase,
}

pub struct ProgressTracker<F>
where
    F: FnMut(ProgressSnapshot),
{
    on_progress: F,
    current: usize,
    total: usize,
    phase: ExportPhase,
}

impl<F> ProgressTracker<F>
where
    F: FnMut(ProgressSnapshot),
{
    /// `file_count` is the number of files that will be fetched.
    pub fn new(file_count: usize, on_progress: F) -> Self {
        Self {
            on_progress,
            current: 0,
            total: file_count + 1,
            phase: ExportPhase::Idle,
        }
    }

    pub fn preparing(&mut self) {
        self.phase = ExportPhase::Preparing;
        self.emit(String::new());
    }

    /// Reports one finished file, successful or not.
    pub fn file_done(&mut self, path: &str) {
        if self.phase == ExportPhase::Complete {
            return;
        }
        // The last step is reserved for assembly.
        self.current = (self.current + 1).min(self.total - 1);
        self.phase = ExportPhase::Processing;
        self.emit(path.to_string());
    }

    pub fn complete(&mut self) {
        if self.phase == ExportPhase::Complete {
            return;
        }
        self.current = self.total;
        self.phase = ExportPhase::Complete;
        self.emit(String::new());
    }

    fn emit(&mut self, file_name: String) {
        let snapshot = ProgressSnapshot {
            current: self.current,
            total: self.total,
            file_name,
            is_complete: self.phase == ExportPhase::Complete,
            phase: self.phase,
        };
        (self.on_progress)(snapshot);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_are_monotonic_and_complete_once() {
        let mut seen = Vec::new();
        {
            let mut tracker = ProgressTracker::new(2, |s| seen.push(s));
            tracker.preparing();
            tracker.file_done("a.rs");
            tracker.file_done("b.rs");
            tracker.complete();
            tracker.complete();
        }

        assert_eq!(seen.len(), 4);
        assert!(seen.windows(2).all(|w| w[0].current <= w[1].current));
        assert_eq!(seen.iter().filter(|s| s.is_complete).count(), 1);
        for s in &seen {
            assert_eq!(s.current == s.total, s.is_complete);
        }
        assert_eq!(seen[1].file_name, "a.rs");
        assert_eq!(seen[1].phase, ExportPhase::Processing);
        assert_eq!(seen[3].phase, ExportPhase::Complete);
    }

    #[test]
    fn empty_run_still_completes() {
        let mut seen = Vec::new();
        {
            let mut tracker = ProgressTracker::new(0, |s| seen.push(s));
            tracker.preparing();
            tracker.complete();
        }
        assert_eq!(seen[0].current, 0);
        assert_eq!(seen[0].total, 1);
        assert!(!seen[0].is_complete);
        assert!(seen[1].is_complete);
        assert_eq!(seen[1].current, 1);
    }

    #[test]
    fn extra_files_never_reach_total_early() {
        let mut seen = Vec::new();
        {
            let mut tracker = ProgressTracker::new(1, |s| seen.push(s));
            tracker.file_done("a");
            tracker.file_done("b");
        }
        assert!(seen.iter().all(|s| s.current < s.total));
    }

    #[test]
    fn serializes_camel_case() {
        let json = serde_json::to_value(ProgressSnapshot {
            current: 1,
            total: 3,
            file_name: "src/lib.rs".into(),
            is_complete: false,
            phase: ExportPhase::Processing,
        })
        .unwrap();
        assert_eq!(json["fileName"], "src/lib.rs");
        assert_eq!(json["isComplete"], false);
        assert_eq!(json["phase"], "processing");
    }
}
