//! Reusable allocation observer fixtures.
//!
//! - [`RecordingObserver`]: keeps every [`AllocationStep`] it receives.
//! - [`CountingObserver`]: counts steps and bytes without storing them.
//! - [`VaryingStepObserver`]: cycles through a list of step sizes.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use heapline_alloc::{AllocationObserver, AllocationStep};

/// Records every step it is given.
pub struct RecordingObserver {
    step: usize,
    steps: Mutex<Vec<AllocationStep>>,
}

impl RecordingObserver {
    pub fn new(step: usize) -> Arc<Self> {
        Arc::new(Self {
            step,
            steps: Mutex::new(Vec::new()),
        })
    }

    pub fn steps(&self) -> Vec<AllocationStep> {
        self.steps.lock().unwrap().clone()
    }

    pub fn count(&self) -> usize {
        self.steps.lock().unwrap().len()
    }
}

impl AllocationObserver for RecordingObserver {
    fn step_size(&self) -> usize {
        self.step
    }

    fn step(&self, step: &AllocationStep) {
        self.steps.lock().unwrap().push(*step);
    }
}

/// Counts steps and the bytes reported between them.
pub struct CountingObserver {
    step: usize,
    calls: AtomicUsize,
    bytes: AtomicUsize,
}

impl CountingObserver {
    pub fn new(step: usize) -> Arc<Self> {
        Arc::new(Self {
            step,
            calls: AtomicUsize::new(0),
            bytes: AtomicUsize::new(0),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::Relaxed)
    }

    /// Sum of `bytes_since_last` over all steps.
    pub fn bytes(&self) -> usize {
        self.bytes.load(Ordering::Relaxed)
    }
}

impl AllocationObserver for CountingObserver {
    fn step_size(&self) -> usize {
        self.step
    }

    fn step(&self, step: &AllocationStep) {
        self.calls.fetch_add(1, Ordering::Relaxed);
        self.bytes.fetch_add(step.bytes_since_last, Ordering::Relaxed);
    }
}

/// Asks for a different interval after each step, cycling through `steps`.
pub struct VaryingStepObserver {
    steps: Vec<usize>,
    fired: AtomicUsize,
}

impl VaryingStepObserver {
    pub fn new(steps: Vec<usize>) -> Arc<Self> {
        assert!(!steps.is_empty());
        Arc::new(Self {
            steps,
            fired: AtomicUsize::new(0),
        })
    }

    pub fn fired(&self) -> usize {
        self.fired.load(Ordering::Relaxed)
    }
}

impl AllocationObserver for VaryingStepObserver {
    fn step_size(&self) -> usize {
        self.steps[0]
    }

    fn step(&self, _step: &AllocationStep) {
        self.fired.fetch_add(1, Ordering::Relaxed);
    }

    fn next_step_size(&self) -> usize {
        self.steps[self.fired() % self.steps.len()]
    }
}
