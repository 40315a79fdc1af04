//! Buffer limit policy.
//!
//! [`compute_limit`] decides how much of an available `[start, end)` range
//! becomes one linear allocation buffer. It is a pure function of its
//! arguments: everything it would otherwise read from the heap or from
//! process-wide flags is gathered up front into a [`LimitInputs`].
//!
//! # Rule order
//!
//! The first matching rule wins, and each later rule may only narrow the
//! buffer:
//!
//! 1. A collection pause gets the whole range.
//! 2. With inline allocation disabled the buffer fits `min_size` exactly.
//! 3. Otherwise start from the whole range and narrow it to stop short of
//!    the next observer sample, then to the stress cap.
//! 4. Never hand out less than `min_size`.

use heapline_core::{round_down, Address, HeapContext, TAGGED_SIZE};

/// Observer state needed to keep a buffer short of the next sample.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SamplingWindow {
    /// Bytes left until the nearest observer fires. Non-zero.
    pub next_bytes: usize,
    /// `start` of the space's current area.
    pub lab_start: Address,
    /// `top` of the space's current area. Must equal `lab_start`.
    pub lab_top: Address,
}

/// Everything [`compute_limit`] consults, captured at one point in time.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LimitInputs {
    /// A garbage collection pause is running.
    pub collection_in_progress: bool,
    /// Bump-pointer allocation may hand out slack.
    pub inline_allocation_enabled: bool,
    /// Set when sampling is active for this space.
    pub sampling: Option<SamplingWindow>,
    /// Stress mode: cap buffers at `stress_lab_limit`.
    pub stress_marking: bool,
    /// Cap applied under stress mode.
    pub stress_lab_limit: usize,
    /// Object alignment unit used to round the sampling step.
    pub object_alignment: usize,
}

impl LimitInputs {
    /// Capture the heap's phase and flags. Sampling is left unset; the
    /// owning space adds it with [`with_sampling`](Self::with_sampling).
    pub fn from_heap<H: HeapContext + ?Sized>(heap: &H) -> Self {
        let flags = heap.flags();
        Self {
            collection_in_progress: heap.is_collection_in_progress(),
            inline_allocation_enabled: heap.is_inline_allocation_enabled(),
            sampling: None,
            stress_marking: flags.stress_marking,
            stress_lab_limit: flags.stress_lab_limit,
            object_alignment: flags.object_alignment,
        }
    }

    /// Attach the sampling window.
    pub fn with_sampling(mut self, window: SamplingWindow) -> Self {
        self.sampling = Some(window);
        self
    }
}

impl Default for LimitInputs {
    fn default() -> Self {
        Self {
            collection_in_progress: false,
            inline_allocation_enabled: true,
            sampling: None,
            stress_marking: false,
            stress_lab_limit: heapline_core::HeapFlags::DEFAULT_STRESS_LAB_LIMIT,
            object_alignment: TAGGED_SIZE,
        }
    }
}

/// Pick the limit of a buffer carved from `[start, end)`.
///
/// Requires `end - start >= min_size`. The result always satisfies
/// `start + min_size <= limit <= end`.
pub fn compute_limit(
    start: Address,
    end: Address,
    min_size: usize,
    inputs: &LimitInputs,
) -> Address {
    debug_assert!(
        start <= end && end - start >= min_size,
        "range [{start}, {end}) cannot hold {min_size} bytes"
    );

    // Pauses place objects themselves; give them the full range.
    if inputs.collection_in_progress {
        return end;
    }

    if !inputs.inline_allocation_enabled {
        return start + min_size;
    }

    let mut step_size = end - start;

    if let Some(window) = inputs.sampling {
        debug_assert_eq!(
            window.lab_start, window.lab_top,
            "unaccounted allocations in the current buffer"
        );
        let step = window.next_bytes;
        debug_assert_ne!(step, 0, "observer step must be non-zero");
        // One byte short and rounded down: the sample boundary itself can
        // never be reached by an aligned bump.
        let rounded_step = round_down(step.saturating_sub(1), inputs.object_alignment);
        step_size = step_size.min(rounded_step);
    }

    if inputs.stress_marking {
        step_size = step_size.min(inputs.stress_lab_limit);
    }

    debug_assert!(start + step_size <= end);
    start + step_size.max(min_size)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const START: Address = Address::new(0x1000);

    fn end(span: usize) -> Address {
        START + span
    }

    fn sampling(next_bytes: usize) -> LimitInputs {
        LimitInputs::default().with_sampling(SamplingWindow {
            next_bytes,
            lab_start: Address::NULL,
            lab_top: Address::NULL,
        })
    }

    #[test]
    fn default_uses_whole_range() {
        let limit = compute_limit(START, end(500), 16, &LimitInputs::default());
        assert_eq!(limit, end(500));
    }

    #[test]
    fn collection_gets_whole_range_regardless_of_flags() {
        let inputs = LimitInputs {
            collection_in_progress: true,
            inline_allocation_enabled: false,
            stress_marking: true,
            ..sampling(100)
        };
        assert_eq!(compute_limit(START, end(500), 16, &inputs), end(500));
    }

    #[test]
    fn inline_disabled_fits_exactly() {
        let inputs = LimitInputs {
            inline_allocation_enabled: false,
            stress_marking: true,
            ..sampling(100)
        };
        assert_eq!(compute_limit(START, end(500), 24, &inputs), START + 24);
    }

    #[test]
    fn sampling_stops_short_of_next_step() {
        // round_down(99, 8) = 96
        let limit = compute_limit(START, end(500), 16, &sampling(100));
        assert_eq!(limit, START + 96);
    }

    #[test]
    fn sampling_step_on_alignment_boundary_still_stops_short() {
        // step 96: round_down(95, 8) = 88, never 96 itself.
        let limit = compute_limit(START, end(500), 8, &sampling(96));
        assert_eq!(limit, START + 88);
    }

    #[test]
    fn sampling_never_shrinks_below_min_size() {
        let limit = compute_limit(START, end(500), 64, &sampling(20));
        assert_eq!(limit, START + 64);
    }

    #[test]
    fn sampling_window_larger_than_range() {
        let limit = compute_limit(START, end(500), 16, &sampling(10_000));
        assert_eq!(limit, end(500));
    }

    #[test]
    fn stress_caps_at_64() {
        let inputs = LimitInputs {
            stress_marking: true,
            ..LimitInputs::default()
        };
        assert_eq!(compute_limit(START, end(500), 8, &inputs), START + 64);
    }

    #[test]
    fn stress_does_not_widen_sampling() {
        let inputs = LimitInputs {
            stress_marking: true,
            ..sampling(40)
        };
        // round_down(39, 8) = 32 < 64
        assert_eq!(compute_limit(START, end(500), 8, &inputs), START + 32);
    }

    #[test]
    fn stress_respects_large_min_size() {
        let inputs = LimitInputs {
            stress_marking: true,
            ..LimitInputs::default()
        };
        assert_eq!(compute_limit(START, end(500), 200, &inputs), START + 200);
    }

    #[test]
    fn stress_limit_is_configurable() {
        let inputs = LimitInputs {
            stress_marking: true,
            stress_lab_limit: 128,
            ..LimitInputs::default()
        };
        assert_eq!(compute_limit(START, end(500), 8, &inputs), START + 128);
    }

    #[test]
    fn exact_fit_range() {
        let inputs = LimitInputs {
            stress_marking: true,
            ..sampling(8)
        };
        assert_eq!(compute_limit(START, end(16), 16, &inputs), end(16));
    }

    #[test]
    fn rounding_per_alignment_unit() {
        for (alignment, step, expected) in [
            (4, 100, 96),
            (8, 100, 96),
            (16, 100, 96),
            (16, 97, 96),
            (4, 97, 96),
            (16, 96, 80),
        ] {
            let inputs = LimitInputs {
                object_alignment: alignment,
                ..sampling(step)
            };
            assert_eq!(
                compute_limit(START, end(1000), 0, &inputs),
                START + expected,
                "alignment {alignment}, step {step}"
            );
        }
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "cannot hold")]
    fn range_too_small_is_rejected() {
        let _ = compute_limit(START, end(8), 16, &LimitInputs::default());
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "unaccounted")]
    fn sampling_requires_accounted_buffer() {
        let inputs = LimitInputs::default().with_sampling(SamplingWindow {
            next_bytes: 100,
            lab_start: Address::new(0x10),
            lab_top: Address::new(0x18),
        });
        let _ = compute_limit(START, end(500), 16, &inputs);
    }

    fn arb_inputs() -> impl Strategy<Value = LimitInputs> {
        (
            any::<bool>(),
            any::<bool>(),
            proptest::option::of(1usize..4096),
            any::<bool>(),
            prop_oneof![Just(4usize), Just(8usize), Just(16usize)],
        )
            .prop_map(|(gc, inline, next, stress, alignment)| LimitInputs {
                collection_in_progress: gc,
                inline_allocation_enabled: inline,
                sampling: next.map(|next_bytes| SamplingWindow {
                    next_bytes,
                    lab_start: Address::NULL,
                    lab_top: Address::NULL,
                }),
                stress_marking: stress,
                stress_lab_limit: 64,
                object_alignment: alignment,
            })
    }

    proptest! {
        #[test]
        fn limit_stays_within_range(
            base in 1usize..1 << 20,
            span in 0usize..8192,
            min_frac in 0usize..=100,
            inputs in arb_inputs(),
        ) {
            let start = Address::new(base * 8);
            let end = start + span;
            let min_size = span * min_frac / 100;
            let limit = compute_limit(start, end, min_size, &inputs);
            prop_assert!(start + min_size <= limit);
            prop_assert!(limit <= end);
        }

        #[test]
        fn collection_always_returns_end(
            span in 0usize..8192,
            inputs in arb_inputs(),
        ) {
            let inputs = LimitInputs { collection_in_progress: true, ..inputs };
            prop_assert_eq!(compute_limit(START, end(span), span / 2, &inputs), end(span));
        }

        #[test]
        fn sampled_buffer_never_reaches_next_step(
            next_bytes in 1usize..4096,
            alignment in prop_oneof![Just(4usize), Just(8usize), Just(16usize)],
        ) {
            let inputs = LimitInputs {
                object_alignment: alignment,
                ..sampling(next_bytes)
            };
            let limit = compute_limit(START, end(8192), 0, &inputs);
            let size = limit - START;
            prop_assert!(size < next_bytes);
            prop_assert_eq!(size % alignment, 0);
            prop_assert!(next_bytes - size <= alignment);
        }
    }
}
