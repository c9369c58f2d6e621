// ============================================================
// Layer 6 — Peak Memory Probe
// ============================================================
// Heap usage is counted by a thin wrapper around the system
// allocator, installed once in main.rs:
//
//   CURRENT  bytes live right now
//   PEAK     high-water mark since the last probe started
//
// MemoryProbe scopes one measurement: `start()` resets the
// high-water mark to the current usage, `finish()` consumes the
// probe and reports the growth above that baseline in MB. The
// counters are process-wide; the measurement window is not.
//
// Reference: std::alloc::GlobalAlloc documentation

use std::alloc::{GlobalAlloc, Layout, System};
use std::sync::atomic::{AtomicUsize, Ordering};

static CURRENT: AtomicUsize = AtomicUsize::new(0);
static PEAK: AtomicUsize = AtomicUsize::new(0);

const BYTES_PER_MB: f64 = 1024.0 * 1024.0;

/// System allocator that keeps live and peak byte counts.
pub struct TrackingAllocator;

impl TrackingAllocator {
    fn grow(size: usize) {
        let now = CURRENT.fetch_add(size, Ordering::Relaxed) + size;
        PEAK.fetch_max(now, Ordering::Relaxed);
    }

    fn shrink(size: usize) {
        CURRENT.fetch_sub(size, Ordering::Relaxed);
    }
}

unsafe impl GlobalAlloc for TrackingAllocator {
    unsafe fn alloc(&self, layout: Layout) -> *mut u8 {
        let ptr = System.alloc(layout);
        if !ptr.is_null() {
            Self::grow(layout.size());
        }
        ptr
    }

    unsafe fn alloc_zeroed(&self, layout: Layout) -> *mut u8 {
        let ptr = System.alloc_zeroed(layout);
        if !ptr.is_null() {
            Self::grow(layout.size());
        }
        ptr
    }

    unsafe fn dealloc(&self, ptr: *mut u8, layout: Layout) {
        System.dealloc(ptr, layout);
        Self::shrink(layout.size());
    }

    unsafe fn realloc(&self, ptr: *mut u8, layout: Layout, new_size: usize) -> *mut u8 {
        let new_ptr = System.realloc(ptr, layout, new_size);
        if !new_ptr.is_null() {
            if new_size > layout.size() {
                Self::grow(new_size - layout.size());
            } else {
                Self::shrink(layout.size() - new_size);
            }
        }
        new_ptr
    }
}

/// Bytes currently allocated through `TrackingAllocator`.
pub fn current_bytes() -> usize {
    CURRENT.load(Ordering::Relaxed)
}

/// One peak-memory measurement window.
#[derive(Debug)]
pub struct MemoryProbe {
    baseline: usize,
}

impl MemoryProbe {
    pub fn start() -> Self {
        let baseline = current_bytes();
        PEAK.store(baseline, Ordering::Relaxed);
        tracing::debug!("Memory probe started at {:.2} MB", baseline as f64 / BYTES_PER_MB);
        Self { baseline }
    }

    /// Peak growth above the baseline, in MB.
    pub fn peak_mb(&self) -> f64 {
        growth_mb(PEAK.load(Ordering::Relaxed), self.baseline)
    }

    /// Stop the measurement and return the peak in MB.
    pub fn finish(self) -> f64 {
        let peak = self.peak_mb();
        tracing::debug!("Memory probe finished, peak {:.2} MB", peak);
        peak
    }
}

fn growth_mb(peak: usize, baseline: usize) -> f64 {
    peak.saturating_sub(baseline) as f64 / BYTES_PER_MB
}
