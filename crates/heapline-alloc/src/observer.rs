//! Allocation observers and the per-space registry that drives them.
//!
//! An [`AllocationObserver`] asks to be told every time roughly `step_size`
//! bytes have been allocated. The [`AllocationCounter`] keeps one
//! monotonically increasing byte counter per space and, per observer, the
//! counter values at its previous and next sample.
//!
//! ```text
//! current_counter ──────────────► next_counter = min(observer.next)
//!          │                         │
//!          └── next_bytes() ─────────┘
//! ```
//!
//! Bytes reach the counter in two ways. [`advance`](AllocationCounter::advance)
//! reconciles bulk allocation that bypassed per-object invocation (the
//! bump fast path). [`invoke`](AllocationCounter::invoke) is called for the
//! one allocation that crosses the nearest sample and fires every observer
//! whose step has elapsed.
//!
//! The registry is only reachable through `&mut`, so registration can never
//! interleave with a running invocation.

use std::fmt;
use std::sync::Arc;

use heapline_core::Address;
use indexmap::IndexMap;
use smallvec::SmallVec;

/// What an observer is told when its step elapses.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AllocationStep {
    /// Bytes allocated since this observer last fired (or was registered).
    pub bytes_since_last: usize,
    /// Address of the object whose allocation crossed the sample.
    pub soon_object: Address,
    /// Size the caller asked for.
    pub size: usize,
    /// Size after alignment padding.
    pub aligned_size: usize,
    /// Total bytes reserved for the allocation, worst-case padding included.
    pub allocation_size: usize,
}

/// A sampling observer.
///
/// Observers are shared (`Arc`) with whatever subsystem registered them,
/// so callbacks take `&self`; keep per-observer state in atomics or a
/// lock.
pub trait AllocationObserver: Send + Sync {
    /// Byte interval between samples. Read once at registration; must be
    /// non-zero.
    fn step_size(&self) -> usize;

    /// Called when at least `step_size` bytes were allocated since the
    /// previous call.
    fn step(&self, step: &AllocationStep);

    /// Interval until the following sample, read after each [`step`](Self::step).
    fn next_step_size(&self) -> usize {
        self.step_size()
    }
}

/// Handle returned by registration, used to unregister.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObserverId(u64);

impl fmt::Display for ObserverId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "observer#{}", self.0)
    }
}

struct ObserverCounter {
    observer: Arc<dyn AllocationObserver>,
    prev_counter: usize,
    next_counter: usize,
}

/// Observers registered on one space, plus their progress.
#[derive(Default)]
pub struct AllocationCounter {
    observers: IndexMap<ObserverId, ObserverCounter>,
    current_counter: usize,
    next_counter: usize,
    pause_depth: u32,
    next_id: u64,
}

impl AllocationCounter {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `observer`. Its first sample is `step_size` bytes from now.
    pub fn add(&mut self, observer: Arc<dyn AllocationObserver>) -> ObserverId {
        let step = observer.step_size();
        assert!(step > 0, "allocation observer step must be non-zero");

        let id = ObserverId(self.next_id);
        self.next_id += 1;

        let observer_next = self.current_counter + step;
        self.next_counter = if self.observers.is_empty() {
            observer_next
        } else {
            self.next_counter.min(observer_next)
        };
        self.observers.insert(
            id,
            ObserverCounter {
                observer,
                prev_counter: self.current_counter,
                next_counter: observer_next,
            },
        );
        tracing::debug!(
            %id,
            step,
            next_bytes = self.next_counter - self.current_counter,
            "allocation observer added"
        );
        id
    }

    /// Unregister an observer. Returns `false` if `id` is unknown.
    pub fn remove(&mut self, id: ObserverId) -> bool {
        if self.observers.shift_remove(&id).is_none() {
            return false;
        }
        if self.observers.is_empty() {
            self.current_counter = 0;
            self.next_counter = 0;
        } else {
            self.next_counter = self.min_next_counter();
        }
        tracing::debug!(%id, remaining = self.observers.len(), "allocation observer removed");
        true
    }

    /// Suspend sampling. Nests; each call needs a matching [`resume`](Self::resume).
    pub fn pause(&mut self) {
        self.pause_depth += 1;
        tracing::trace!(depth = self.pause_depth, "allocation observers paused");
    }

    /// Undo one [`pause`](Self::pause).
    pub fn resume(&mut self) {
        debug_assert!(self.pause_depth > 0, "resume without matching pause");
        self.pause_depth = self.pause_depth.saturating_sub(1);
        tracing::trace!(depth = self.pause_depth, "allocation observers resumed");
    }

    /// Whether sampling is suspended.
    pub fn is_paused(&self) -> bool {
        self.pause_depth > 0
    }

    /// Whether any observer is registered and sampling is not paused.
    pub fn is_active(&self) -> bool {
        !self.observers.is_empty() && !self.is_paused()
    }

    /// Number of registered observers.
    pub fn len(&self) -> usize {
        self.observers.len()
    }

    /// Whether no observer is registered.
    pub fn is_empty(&self) -> bool {
        self.observers.is_empty()
    }

    /// Bytes left until the nearest observer fires.
    ///
    /// Only meaningful while an observer is registered.
    pub fn next_bytes(&self) -> usize {
        debug_assert!(!self.observers.is_empty(), "next_bytes with no observer registered");
        self.next_counter - self.current_counter
    }

    /// Account for `allocated` bytes that were handed out without
    /// per-object invocation.
    ///
    /// Must stay below [`next_bytes`](Self::next_bytes): crossing a sample
    /// has to go through [`invoke`](Self::invoke).
    pub fn advance(&mut self, allocated: usize) {
        if self.observers.is_empty() {
            return;
        }
        debug_assert!(
            allocated < self.next_counter - self.current_counter,
            "advance of {allocated} bytes would skip a sample"
        );
        self.current_counter += allocated;
    }

    /// Fire every observer whose step elapses within this allocation.
    ///
    /// `allocation_size` is what the allocation reserved and must reach
    /// the nearest sample. Returns the ids of the observers that fired.
    pub fn invoke(
        &mut self,
        soon_object: Address,
        size: usize,
        aligned_size: usize,
        allocation_size: usize,
    ) -> SmallVec<[ObserverId; 4]> {
        let mut fired = SmallVec::new();
        if self.observers.is_empty() {
            return fired;
        }
        debug_assert!(
            allocation_size >= self.next_counter - self.current_counter,
            "invoke before the next sample is reached"
        );
        debug_assert!(!soon_object.is_null());

        let current = self.current_counter;
        let mut step_size: Option<usize> = None;
        for (id, counter) in self.observers.iter_mut() {
            if counter.next_counter - current <= allocation_size {
                counter.observer.step(&AllocationStep {
                    bytes_since_last: current - counter.prev_counter,
                    soon_object,
                    size,
                    aligned_size,
                    allocation_size,
                });
                let next_step = counter.observer.next_step_size();
                counter.prev_counter = current;
                counter.next_counter = current + allocation_size + next_step;
                fired.push(*id);
            }
            let left_in_step = counter.next_counter - current;
            step_size = Some(step_size.map_or(left_in_step, |s| s.min(left_in_step)));
        }
        assert!(!fired.is_empty(), "sample reached but no observer was due");

        // Not advanced here: the object is still counted by the next
        // `advance` together with the rest of its buffer.
        self.next_counter = current + step_size.unwrap_or(0);
        tracing::trace!(
            fired = fired.len(),
            %soon_object,
            next_bytes = self.next_counter - current,
            "allocation observers stepped"
        );
        fired
    }

    fn min_next_counter(&self) -> usize {
        self.observers
            .values()
            .map(|c| c.next_counter)
            .min()
            .unwrap_or(self.current_counter)
    }
}

impl fmt::Debug for AllocationCounter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AllocationCounter")
            .field("observers", &self.observers.len())
            .field("current_counter", &self.current_counter)
            .field("next_counter", &self.next_counter)
            .field("pause_depth", &self.pause_depth)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    struct Recorder {
        step: usize,
        seen: Mutex<Vec<AllocationStep>>,
    }

    impl Recorder {
        fn new(step: usize) -> Arc<Self> {
            Arc::new(Self {
                step,
                seen: Mutex::new(Vec::new()),
            })
        }

        fn count(&self) -> usize {
            self.seen.lock().unwrap().len()
        }
    }

    impl AllocationObserver for Recorder {
        fn step_size(&self) -> usize {
            self.step
        }
        fn step(&self, step: &AllocationStep) {
            self.seen.lock().unwrap().push(*step);
        }
    }

    const OBJ: Address = Address::new(0x1000);

    #[test]
    fn empty_counter_is_inactive() {
        let counter = AllocationCounter::new();
        assert!(!counter.is_active());
        assert!(counter.is_empty());
    }

    #[test]
    fn next_bytes_tracks_smallest_step() {
        let mut counter = AllocationCounter::new();
        counter.add(Recorder::new(256));
        assert_eq!(counter.next_bytes(), 256);
        counter.add(Recorder::new(100));
        assert_eq!(counter.next_bytes(), 100);
        counter.advance(40);
        assert_eq!(counter.next_bytes(), 60);
    }

    #[test]
    fn add_then_remove_leaves_counter_inactive() {
        let mut counter = AllocationCounter::new();
        let rec = Recorder::new(64);
        let id = counter.add(rec.clone());
        assert!(counter.remove(id));
        assert!(!counter.is_active());
        counter.advance(1000);
        let fired = counter.invoke(OBJ, 16, 16, 16);
        assert!(fired.is_empty());
        assert_eq!(rec.count(), 0);
    }

    #[test]
    fn removing_unknown_id_is_false() {
        let mut counter = AllocationCounter::new();
        let id = counter.add(Recorder::new(8));
        assert!(counter.remove(id));
        assert!(!counter.remove(id));
    }

    #[test]
    fn remove_recomputes_next() {
        let mut counter = AllocationCounter::new();
        let small = counter.add(Recorder::new(50));
        counter.add(Recorder::new(200));
        assert_eq!(counter.next_bytes(), 50);
        counter.remove(small);
        assert_eq!(counter.next_bytes(), 200);
    }

    #[test]
    fn invoke_fires_only_due_observers() {
        let mut counter = AllocationCounter::new();
        let fast = Recorder::new(64);
        let slow = Recorder::new(512);
        let fast_id = counter.add(fast.clone());
        counter.add(slow.clone());

        counter.advance(56);
        assert_eq!(counter.next_bytes(), 8);
        let fired = counter.invoke(OBJ, 16, 16, 16);
        assert_eq!(fired.as_slice(), &[fast_id]);
        assert_eq!(fast.count(), 1);
        assert_eq!(slow.count(), 0);

        let step = fast.seen.lock().unwrap()[0];
        assert_eq!(step.bytes_since_last, 56);
        assert_eq!(step.soon_object, OBJ);
        assert_eq!(step.size, 16);

        // Fast observer restarts after the object: 16 + 64 from `current`.
        assert_eq!(counter.next_bytes(), 80);
    }

    #[test]
    fn object_is_counted_once_by_following_advance() {
        let mut counter = AllocationCounter::new();
        let rec = Recorder::new(32);
        counter.add(rec.clone());
        counter.advance(24);
        counter.invoke(OBJ, 8, 8, 8);
        // The buffer holding the object is reconciled afterwards.
        counter.advance(8);
        assert_eq!(counter.next_bytes(), 32);
        counter.advance(24);
        counter.invoke(OBJ, 8, 8, 8);
        assert_eq!(rec.count(), 2);
        assert_eq!(rec.seen.lock().unwrap()[1].bytes_since_last, 32);
    }

    #[test]
    fn large_object_fires_everyone() {
        let mut counter = AllocationCounter::new();
        let a = Recorder::new(16);
        let b = Recorder::new(48);
        counter.add(a.clone());
        counter.add(b.clone());
        let fired = counter.invoke(OBJ, 64, 64, 64);
        assert_eq!(fired.len(), 2);
        assert_eq!(a.count(), 1);
        assert_eq!(b.count(), 1);
    }

    #[test]
    fn pause_nests() {
        let mut counter = AllocationCounter::new();
        counter.add(Recorder::new(8));
        counter.pause();
        counter.pause();
        assert!(!counter.is_active());
        counter.resume();
        assert!(counter.is_paused());
        counter.resume();
        assert!(counter.is_active());
    }

    #[test]
    fn observer_may_change_next_step() {
        struct Doubling {
            step: Mutex<usize>,
        }
        impl AllocationObserver for Doubling {
            fn step_size(&self) -> usize {
                8
            }
            fn step(&self, _step: &AllocationStep) {
                *self.step.lock().unwrap() *= 2;
            }
            fn next_step_size(&self) -> usize {
                *self.step.lock().unwrap()
            }
        }

        let mut counter = AllocationCounter::new();
        counter.add(Arc::new(Doubling {
            step: Mutex::new(8),
        }));
        counter.invoke(OBJ, 8, 8, 8);
        assert_eq!(counter.next_bytes(), 8 + 16);
    }

    #[test]
    #[should_panic(expected = "non-zero")]
    fn zero_step_is_rejected() {
        let mut counter = AllocationCounter::new();
        counter.add(Recorder::new(0));
    }
}
