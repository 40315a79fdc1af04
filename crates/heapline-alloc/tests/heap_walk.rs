//! Walkability: once the space closes its area, every byte it was ever
//! handed is covered by an object or a filler.

use heapline_alloc::{LinearAllocationArea, LocalAllocationBuffer, SpaceWithLinearArea};
use heapline_core::{
    Address, AllocationAlignment, AllocationOrigin, HeapContext, HeapFlags, SpaceId,
};
use heapline_test_utils::fixtures::CountingObserver;
use heapline_test_utils::{coverage_gaps, MockFreeList, MockHeap};
use proptest::prelude::*;

const BASE: usize = 0x40_0000;
const REGION: usize = 1 << 20;

fn region() -> std::ops::Range<Address> {
    Address::new(BASE)..Address::new(BASE + REGION)
}

fn alignment_strategy() -> impl Strategy<Value = AllocationAlignment> {
    prop_oneof![
        Just(AllocationAlignment::TaggedAligned),
        Just(AllocationAlignment::DoubleAligned),
        Just(AllocationAlignment::DoubleUnaligned),
    ]
}

#[test]
fn closing_a_buffer_fills_its_tail() {
    let heap = MockHeap::default();
    let area = LinearAllocationArea::with_start(
        Address::new(0x100),
        Address::new(0x110),
        Address::new(0x120),
    );
    let mut lab = LocalAllocationBuffer::new(&heap, area);

    let closed = lab.close_and_make_iterable();
    assert_eq!(closed, area);
    assert!(!lab.is_valid());
    assert_eq!(heap.fillers(), vec![(Address::new(0x110), 0x10)]);

    assert!(lab.close_and_make_iterable().is_null());
    assert_eq!(heap.fillers().len(), 1);
}

#[test]
fn moved_buffer_keeps_the_area() {
    let heap = MockHeap::default();
    let area = LinearAllocationArea::new(Address::new(0x200), Address::new(0x240));
    let mut b1 = LocalAllocationBuffer::new(&heap, area);
    let b2 = b1.take();
    assert!(!b1.is_valid());
    assert_eq!(b2.area(), area);
    drop(b1);
    assert!(heap.fillers().is_empty());
    drop(b2);
    assert_eq!(heap.fillers(), vec![(Address::new(0x200), 0x40)]);
}

#[test]
fn leased_buffers_leave_a_walkable_region() {
    let heap = MockHeap::default();
    heap.set_in_gc(true);
    let mut s = SpaceWithLinearArea::new(SpaceId::Old, MockFreeList::with_region(BASE, REGION));
    let mut objects = Vec::new();

    {
        let mut lab = s.lease_buffer(&heap, 4096).unwrap();
        for size in [16, 24, 8, 64] {
            let object = lab.allocate_aligned(size, AllocationAlignment::TaggedAligned).unwrap();
            objects.push((object, size));
        }
        // Undo the last object; its bytes go back into the buffer.
        let (last, size) = objects.pop().unwrap();
        assert!(lab.try_free_last(last, size));
    }

    assert!(coverage_gaps(region(), &objects, &heap.fillers()).is_empty());
}

#[test]
fn installed_buffer_continues_in_place() {
    let heap = MockHeap::default();
    let mut s = SpaceWithLinearArea::new(SpaceId::New, MockFreeList::with_region(BASE, REGION));
    let mut lab = s.lease_buffer(&heap, 256).unwrap();
    let first = lab.allocate_aligned(32, AllocationAlignment::TaggedAligned).unwrap();
    s.install_buffer(&heap, lab);

    let second = s
        .allocate_raw(&heap, 16, AllocationAlignment::TaggedAligned, AllocationOrigin::Runtime)
        .unwrap();
    assert_eq!(second, first + 32);
    assert_eq!(s.stats().leased_buffers, 1);
    assert_eq!(s.stats().refills, 0);
}

proptest! {
    #[test]
    fn closed_space_is_walkable(
        ops in prop::collection::vec((1usize..=32, alignment_strategy()), 1..200),
        step in prop::option::of(8usize..512),
        compressed in any::<bool>(),
        stress in any::<bool>(),
        inline in any::<bool>(),
    ) {
        let flags = HeapFlags {
            object_alignment: if compressed { 4 } else { 8 },
            stress_marking: stress,
            ..HeapFlags::default()
        };
        let heap = MockHeap::new(flags);
        heap.set_inline_allocation(inline);
        let mut s = SpaceWithLinearArea::new(SpaceId::Old, MockFreeList::with_region(BASE, REGION));
        if let Some(step) = step {
            s.add_allocation_observer(&heap, CountingObserver::new(step));
        }

        let unit = heap.flags().object_alignment;
        let mut objects = Vec::new();
        for (slots, alignment) in ops {
            let size = slots * unit;
            let object = s
                .allocate_raw(&heap, size, alignment, AllocationOrigin::Runtime)
                .unwrap();
            prop_assert!(object >= Address::new(BASE));
            if alignment == AllocationAlignment::DoubleAligned {
                prop_assert!(object.is_aligned(8));
            }
            objects.push((object, size));
            s.verify_top();
        }
        s.free_linear_allocation_area(&heap);

        let gaps = coverage_gaps(region(), &objects, &heap.fillers());
        prop_assert!(gaps.is_empty(), "unwalkable ranges: {:?}", gaps);
    }
}
