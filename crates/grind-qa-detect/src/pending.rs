//! One-shot completion channel between a detector and its caller.

use std::sync::mpsc::{self, Receiver, RecvTimeoutError, SyncSender};
use std::time::Duration;

use crate::detector::DetectionOutput;
use crate::error::DetectionError;

type DetectionResult = Result<DetectionOutput, DetectionError>;

/// Create a linked completer / pending pair.
///
/// The detector keeps the completer (possibly moving it to a worker thread)
/// and returns the pending half to the caller.
pub fn detection_channel() -> (DetectionCompleter, PendingDetection) {
    let (tx, rx) = mpsc::sync_channel(1);
    (DetectionCompleter { tx }, PendingDetection { rx })
}

/// Detector-side handle that signals the terminal result exactly once.
///
/// Dropping it without calling [`complete`](Self::complete) resolves the
/// pending side with [`DetectionError::Abandoned`].
#[derive(Debug)]
pub struct DetectionCompleter {
    tx: SyncSender<DetectionResult>,
}

impl DetectionCompleter {
    pub fn complete(self, result: DetectionResult) {
        // The caller may have given up waiting; nothing to do then.
        let _ = self.tx.send(result);
    }
}

/// Caller-side handle to an in-flight detection.
#[derive(Debug)]
pub struct PendingDetection {
    rx: Receiver<DetectionResult>,
}

impl PendingDetection {
    /// A pending detection that is already resolved.
    pub fn ready(result: DetectionResult) -> Self {
        let (completer, pending) = detection_channel();
        completer.complete(result);
        pending
    }

    /// Block until the detector reports. There is no timeout.
    pub fn wait(self) -> DetectionResult {
        self.rx.recv().unwrap_or(Err(DetectionError::Abandoned))
    }

    /// Block for at most `timeout`.
    pub fn wait_timeout(self, timeout: Duration) -> DetectionResult {
        match self.rx.recv_timeout(timeout) {
            Ok(result) => result,
            Err(RecvTimeoutError::Timeout) => Err(DetectionError::TimedOut {
                timeout_ms: timeout.as_millis() as u64,
            }),
            Err(RecvTimeoutError::Disconnected) => Err(DetectionError::Abandoned),
        }
    }

    /// Block with an optional timeout.
    pub fn wait_for(self, timeout: Option<Duration>) -> DetectionResult {
        match timeout {
            Some(t) => self.wait_timeout(t),
            None => self.wait(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use grind_qa_core::AggregateStats;
    use std::thread;

    fn empty_output() -> DetectionOutput {
        DetectionOutput {
            particles: Vec::new(),
            stats: AggregateStats::default(),
        }
    }

    #[test]
    fn ready_resolves_immediately() {
        let pending = PendingDetection::ready(Err(DetectionError::NoParticlesFound { threshold: 7 }));
        assert_eq!(
            pending.wait(),
            Err(DetectionError::NoParticlesFound { threshold: 7 })
        );
    }

    #[test]
    fn wait_blocks_until_worker_completes() {
        let (completer, pending) = detection_channel();
        let worker = thread::spawn(move || {
            thread::sleep(Duration::from_millis(20));
            completer.complete(Ok(empty_output()));
        });
        assert_eq!(pending.wait(), Ok(empty_output()));
        worker.join().expect("worker");
    }

    #[test]
    fn dropped_completer_is_abandoned() {
        let (completer, pending) = detection_channel();
        drop(completer);
        assert_eq!(pending.wait(), Err(DetectionError::Abandoned));
    }

    #[test]
    fn wait_timeout_expires() {
        let (completer, pending) = detection_channel();
        let res = pending.wait_timeout(Duration::from_millis(10));
        assert_eq!(res, Err(DetectionError::TimedOut { timeout_ms: 10 }));
        // Completing after the caller left must not panic.
        completer.complete(Ok(empty_output()));
    }

    #[test]
    fn wait_for_without_timeout_waits() {
        let (completer, pending) = detection_channel();
        completer.complete(Ok(empty_output()));
        assert!(pending.wait_for(None).is_ok());
    }
}
