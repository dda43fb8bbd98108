//! Memory management interfaces

use alloc::boxed::Box;

use crate::core::types::{AccessMode, PhysAddr, PrivilegeLevel, VirtAddr, INVALID_ADDRESS};
use crate::error::Result;
use crate::memory::types::PageTable;

/// Source of page table storage.
///
/// The engine asks for one table whenever a directory slot is first used and
/// hands the table back once its last mapping is gone.
///
/// Tables still installed when a directory is dropped are freed by the
/// directory itself and never reach [`TableAllocator::release_table`].
/// Pool-backed allocators should have the context clear the directory first.
#[cfg_attr(any(test, feature = "mock"), mockall::automock)]
pub trait TableAllocator {
    /// Allocates a zero-initialised, page-aligned page table
    fn allocate_table(&mut self) -> Result<Box<PageTable>>;

    /// Takes back a table that no directory descriptor references any more
    fn release_table(&mut self, table: Box<PageTable>);
}

/// Trait for a two-level address translator
pub trait AddressTranslator {
    /// Installs or replaces the mapping of one page
    fn map_page(
        &mut self,
        virt: VirtAddr,
        phys: PhysAddr,
        mode: AccessMode,
        level: PrivilegeLevel,
    ) -> Result<()>;

    /// Translates an address, reporting which check failed on a miss
    fn translate(&mut self, virt: VirtAddr, mode: AccessMode, level: PrivilegeLevel)
        -> Result<PhysAddr>;

    /// Removes the mapping of one page
    fn unmap_page(&mut self, virt: VirtAddr) -> Result<()>;

    /// Sentinel form of [`AddressTranslator::translate`]: the physical
    /// address, or [`INVALID_ADDRESS`] on any miss
    fn translate_page_table(&mut self, virt: u32, mode: AccessMode, level: PrivilegeLevel) -> u32 {
        match self.translate(VirtAddr::new(virt), mode, level) {
            Ok(phys) => phys.as_u32(),
            Err(_) => INVALID_ADDRESS,
        }
    }
}
