use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

/// Fraction reported once the payload is assembled, before any byte is sent
pub const ASSEMBLY_FRACTION: f64 = 0.25;

/// Receives upload progress as a fraction in `0.0..=1.0`
///
/// May be called any number of times, from whichever task polls the request body.
pub trait ProgressObserver: Send + Sync {
    fn on_progress(&self, fraction: f64);
}

impl<F> ProgressObserver for F
where
    F: Fn(f64) + Send + Sync,
{
    fn on_progress(&self, fraction: f64) {
        self(fraction)
    }
}

/// Observer that ignores every event
pub struct NoProgress;

impl ProgressObserver for NoProgress {
    fn on_progress(&self, _fraction: f64) {}
}

/// Observer that keeps every reported fraction
#[derive(Default)]
pub struct ProgressRecorder {
    values: Mutex<Vec<f64>>,
}

impl ProgressRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn values(&self) -> Vec<f64> {
        self.values.lock().clone()
    }

    pub fn last(&self) -> Option<f64> {
        self.values.lock().last().copied()
    }
}

impl ProgressObserver for ProgressRecorder {
    fn on_progress(&self, fraction: f64) {
        self.values.lock().push(fraction);
    }
}

/// Progress context owned by a single upload
///
/// Byte counts are rescaled into the range after [`ASSEMBLY_FRACTION`]. Reported
/// values never decrease.
pub struct ProgressTracker {
    total_bytes: u64,
    sent_bytes: AtomicU64,
    last_reported: Mutex<f64>,
    observer: Arc<dyn ProgressObserver>,
}

impl ProgressTracker {
    pub fn new(total_bytes: u64, observer: Arc<dyn ProgressObserver>) -> Self {
        Self {
            total_bytes,
            sent_bytes: AtomicU64::new(0),
            last_reported: Mutex::new(0.0),
            observer,
        }
    }

    pub fn total_bytes(&self) -> u64 {
        self.total_bytes
    }

    pub fn sent_bytes(&self) -> u64 {
        self.sent_bytes.load(Ordering::Relaxed)
    }

    /// Payload assembled, transmission about to start
    pub fn assembled(&self) {
        self.report(ASSEMBLY_FRACTION);
    }

    /// Record `bytes` more handed to the transport
    pub fn advance(&self, bytes: u64) {
        if self.total_bytes == 0 {
            return;
        }
        let sent = self.sent_bytes.fetch_add(bytes, Ordering::Relaxed) + bytes;
        let ratio = sent.min(self.total_bytes) as f64 / self.total_bytes as f64;
        self.report(ASSEMBLY_FRACTION + (1.0 - ASSEMBLY_FRACTION) * ratio);
    }

    /// Response received
    pub fn complete(&self) {
        self.report(1.0);
    }

    fn report(&self, fraction: f64) {
        let mut last = self.last_reported.lock();
        let fraction = fraction.clamp(0.0, 1.0).max(*last);
        *last = fraction;
        self.observer.on_progress(fraction);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_two_phase_rescaling() {
        let recorder = Arc::new(ProgressRecorder::new());
        let tracker = ProgressTracker::new(200, recorder.clone());

        tracker.assembled();
        tracker.advance(100);
        tracker.advance(100);
        tracker.complete();

        assert_eq!(recorder.values(), vec![0.25, 0.625, 1.0, 1.0]);
    }

    #[test]
    fn test_never_decreases() {
        let recorder = Arc::new(ProgressRecorder::new());
        let tracker = ProgressTracker::new(10, recorder.clone());

        tracker.advance(10);
        tracker.assembled();
        tracker.advance(50);

        let values = recorder.values();
        assert!(values.windows(2).all(|w| w[0] <= w[1]));
        assert_eq!(recorder.last(), Some(1.0));
    }

    #[test]
    fn test_empty_payload_skips_byte_phase() {
        let recorder = Arc::new(ProgressRecorder::new());
        let tracker = ProgressTracker::new(0, recorder.clone());

        tracker.assembled();
        tracker.advance(0);
        tracker.complete();

        assert_eq!(recorder.values(), vec![0.25, 1.0]);
    }

    #[test]
    fn test_closure_observer() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let tracker = ProgressTracker::new(4, Arc::new(move |f: f64| sink.lock().push(f)));

        tracker.assembled();
        tracker.advance(2);

        assert_eq!(*seen.lock(), vec![0.25, 0.625]);
    }
}
