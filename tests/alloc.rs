// SPDX-License-Identifier: MIT

//! Checks that a parse session releases everything it allocated, including
//! globals saved by a Push that is never popped.

use std::alloc::{GlobalAlloc, Layout, System};
use std::cell::Cell;

use hidparse::*;

struct CountingAllocator;

thread_local! {
    static LIVE_BYTES: Cell<isize> = const { Cell::new(0) };
}

fn track(delta: isize) {
    let _ = LIVE_BYTES.try_with(|live| live.set(live.get() + delta));
}

fn live_bytes() -> isize {
    LIVE_BYTES.with(|live| live.get())
}

unsafe impl GlobalAlloc for CountingAllocator {
    unsafe fn alloc(&self, layout: Layout) -> *mut u8 {
        track(layout.size() as isize);
        System.alloc(layout)
    }

    unsafe fn dealloc(&self, ptr: *mut u8, layout: Layout) {
        track(-(layout.size() as isize));
        System.dealloc(ptr, layout)
    }

    unsafe fn realloc(&self, ptr: *mut u8, layout: Layout, new_size: usize) -> *mut u8 {
        track(new_size as isize - layout.size() as isize);
        System.realloc(ptr, layout, new_size)
    }
}

#[global_allocator]
static ALLOCATOR: CountingAllocator = CountingAllocator;

#[rustfmt::skip]
const UNBALANCED: &[u8] = &[
    0x05, 0x01,       // Usage Page (Generic Desktop)
    0xa4,             // Push
    0xa4,             // Push
    0xa4,             // Push
    0x19, 0x30,       // Usage Minimum (X)
    0x29, 0x32,       // Usage Maximum (Z)
    0x75, 0x08,       // Report Size (8)
    0x95, 0x03,       // Report Count (3)
    0x81, 0x02,       // Input (Data,Var,Abs)
    0xa4,             // Push
    0xa4,             // Push
    0xb4,             // Pop
];

#[test]
fn unbalanced_push_is_released() {
    // warm up so one-time registrations are not counted
    Parser::new(UNBALANCED, ReportKind::Input).for_each(drop);

    let before = live_bytes();
    for kind in [ReportKind::Input, ReportKind::Output, ReportKind::Feature] {
        let mut parser = Parser::new(UNBALANCED, kind);
        let mut count = 0;
        while let Some(_item) = parser.get_item().unwrap() {
            count += 1;
        }
        assert_eq!(count, if kind == ReportKind::Input { 3 } else { 0 });
        assert_eq!(parser.end(), 4);
    }
    assert_eq!(live_bytes(), before);

    // Abandoning a session half-way releases it too
    {
        let mut parser = Parser::new(UNBALANCED, ReportKind::Input);
        assert!(parser.get_item().unwrap().is_some());
        assert_eq!(parser.push_depth(), 3);
    }
    assert_eq!(live_bytes(), before);

    assert_eq!(
        report_size(UNBALANCED, ReportKind::Input, ReportId(0)).unwrap(),
        3
    );
    assert_eq!(live_bytes(), before);
}
