use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Instant;

use crossbeam_channel::{bounded, Receiver, Sender, TrySendError};
use serde::{Deserialize, Serialize};

/// Snapshot handed to a progress observer at a work-item boundary.
///
/// Individual fields are monotonic in their own right, but a snapshot is
/// not a consistent cut across counters: the writers are independent
/// atomics by design.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchProgress {
    pub current_index: usize,
    pub total: usize,
    pub percent: f64,
    pub valid_count: usize,
    pub invalid_count: usize,
    pub motor_label: String,
    pub prop_label: String,
    pub speed_label: String,
    pub elapsed_s: f64,
    pub best_efficiency: f64,
}

/// Callback invoked by workers after each completed work item.
pub type ProgressCallback = dyn Fn(&BatchProgress) + Send + Sync;

/// Cooperative cancellation flag, sampled at work-item boundaries.
/// In-flight items always run to completion.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}

#[derive(Debug, Default)]
struct LastLabels {
    motor: String,
    prop: String,
    speed: String,
}

/// Live counters shared between the workers and the observer.
///
/// Counts are plain atomics; the best-so-far efficiency is an f64 kept in
/// an `AtomicU64` via its bit pattern and raised with compare-exchange.
pub(crate) struct ProgressCounters {
    total: usize,
    started: Instant,
    completed: AtomicUsize,
    valid: AtomicUsize,
    invalid: AtomicUsize,
    best_efficiency_bits: AtomicU64,
    labels: Mutex<LastLabels>,
}

impl ProgressCounters {
    pub fn new(total: usize) -> Self {
        Self {
            total,
            started: Instant::now(),
            completed: AtomicUsize::new(0),
            valid: AtomicUsize::new(0),
            invalid: AtomicUsize::new(0),
            best_efficiency_bits: AtomicU64::new(0.0_f64.to_bits()),
            labels: Mutex::new(LastLabels::default()),
        }
    }

    pub fn record_item(
        &self,
        valid: bool,
        efficiency: f64,
        motor_label: &str,
        prop_label: &str,
        speed_label: &str,
    ) {
        self.completed.fetch_add(1, Ordering::Relaxed);
        if valid {
            self.valid.fetch_add(1, Ordering::Relaxed);
        } else {
            self.invalid.fetch_add(1, Ordering::Relaxed);
        }

        // Raise-only update of the best efficiency
        let mut current = self.best_efficiency_bits.load(Ordering::Relaxed);
        while efficiency > f64::from_bits(current) {
            match self.best_efficiency_bits.compare_exchange_weak(
                current,
                efficiency.to_bits(),
                Ordering::Relaxed,
                Ordering::Relaxed,
            ) {
                Ok(_) => break,
                Err(actual) => current = actual,
            }
        }

        if let Ok(mut labels) = self.labels.lock() {
            labels.motor = motor_label.to_string();
            labels.prop = prop_label.to_string();
            labels.speed = speed_label.to_string();
        }
    }

    pub fn snapshot(&self) -> BatchProgress {
        let completed = self.completed.load(Ordering::Relaxed);
        let (motor_label, prop_label, speed_label) = match self.labels.lock() {
            Ok(labels) => (labels.motor.clone(), labels.prop.clone(), labels.speed.clone()),
            Err(_) => Default::default(),
        };
        BatchProgress {
            current_index: completed,
            total: self.total,
            percent: if self.total > 0 {
                completed as f64 / self.total as f64 * 100.0
            } else {
                100.0
            },
            valid_count: self.valid.load(Ordering::Relaxed),
            invalid_count: self.invalid.load(Ordering::Relaxed),
            motor_label,
            prop_label,
            speed_label,
            elapsed_s: self.started.elapsed().as_secs_f64(),
            best_efficiency: f64::from_bits(self.best_efficiency_bits.load(Ordering::Relaxed)),
        }
    }

    pub fn elapsed_s(&self) -> f64 {
        self.started.elapsed().as_secs_f64()
    }
}

/// Bounded-channel observer: returns a callback to hand to `run_batch` and
/// the receiving end for a UI thread to drain. Updates are dropped rather
/// than blocking the workers when the channel is full.
pub fn channel_observer(capacity: usize) -> (Box<ProgressCallback>, Receiver<BatchProgress>) {
    let (tx, rx): (Sender<BatchProgress>, Receiver<BatchProgress>) = bounded(capacity);
    let callback = Box::new(move |progress: &BatchProgress| {
        match tx.try_send(progress.clone()) {
            Ok(()) | Err(TrySendError::Full(_)) | Err(TrySendError::Disconnected(_)) => {}
        }
    });
    (callback, rx)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_accumulate() {
        let counters = ProgressCounters::new(4);
        counters.record_item(true, 0.3, "m1", "p1", "15");
        counters.record_item(false, 0.0, "m1", "p2", "15");
        counters.record_item(true, 0.5, "m2", "p1", "20");

        let snap = counters.snapshot();
        assert_eq!(snap.current_index, 3);
        assert_eq!(snap.valid_count, 2);
        assert_eq!(snap.invalid_count, 1);
        assert_eq!(snap.percent, 75.0);
        assert_eq!(snap.best_efficiency, 0.5);
        assert_eq!(snap.motor_label, "m2");
    }

    #[test]
    fn best_efficiency_never_decreases() {
        let counters = ProgressCounters::new(3);
        counters.record_item(true, 0.5, "m", "p", "v");
        counters.record_item(true, 0.2, "m", "p", "v");
        assert_eq!(counters.snapshot().best_efficiency, 0.5);
    }

    #[test]
    fn cancel_token_latches() {
        let token = CancelToken::new();
        assert!(!token.is_cancelled());
        let clone = token.clone();
        clone.cancel();
        assert!(token.is_cancelled());
    }

    #[test]
    fn channel_observer_drops_when_full() {
        let (callback, rx) = channel_observer(1);
        let counters = ProgressCounters::new(2);
        counters.record_item(true, 0.1, "m", "p", "v");
        callback(&counters.snapshot());
        callback(&counters.snapshot()); // dropped, channel full
        assert_eq!(rx.len(), 1);
    }
}
