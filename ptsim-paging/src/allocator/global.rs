//! Global-allocator backed page tables

use alloc::alloc::{alloc_zeroed, Layout};
use alloc::boxed::Box;

use ptsim_api::{Error, PageTable, Result, TableAllocator};

/// Allocates each table directly from the global allocator
#[derive(Debug, Default, Clone, Copy)]
pub struct GlobalTableAllocator;

impl GlobalTableAllocator {
    /// Create a new allocator
    pub const fn new() -> Self {
        Self
    }
}

impl TableAllocator for GlobalTableAllocator {
    fn allocate_table(&mut self) -> Result<Box<PageTable>> {
        let layout = Layout::new::<PageTable>();
        // SAFETY: `PageTable` is 4 KiB, so the layout is non-zero sized.
        let ptr = unsafe { alloc_zeroed(layout) }.cast::<PageTable>();
        if ptr.is_null() {
            #[cfg(feature = "log")]
            log::warn!("page table allocation of {} bytes failed", layout.size());
            return Err(Error::OutOfMemory);
        }
        // SAFETY: `ptr` comes from the global allocator with `PageTable`'s
        // layout, and an all-zero `PageTable` is valid (every descriptor
        // non-present).
        Ok(unsafe { Box::from_raw(ptr) })
    }

    fn release_table(&mut self, table: Box<PageTable>) {
        drop(table);
    }
}
