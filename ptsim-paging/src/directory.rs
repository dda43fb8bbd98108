//! Page directory
//!
//! The directory is the root of the translation structure. A present
//! descriptor holds the address of a page table that the directory owns
//! exclusively; the table was handed over as a `Box` when it was installed
//! and is handed back as a `Box` when it is detached. Tables still present
//! when the directory is dropped are freed with it.

use alloc::boxed::Box;
use static_assertions::{assert_eq_size, const_assert_eq};

use ptsim_api::{DirectoryEntry, EntryFlags, PageTable, TableEntry, VirtAddr, ENTRIES_PER_TABLE};

use crate::address::AddressParts;
use crate::dump::DirectoryDump;

/// Top-level translation table
#[repr(C, align(4096))]
pub struct PageDirectory {
    entries: [DirectoryEntry; ENTRIES_PER_TABLE],
}

assert_eq_size!(PageDirectory, [u64; ENTRIES_PER_TABLE]);
const_assert_eq!(core::mem::align_of::<PageDirectory>(), 4096);

impl PageDirectory {
    /// Creates a directory with every slot non-present
    pub const fn new() -> Self {
        Self {
            entries: [DirectoryEntry::EMPTY; ENTRIES_PER_TABLE],
        }
    }

    /// Descriptor at `index`.
    ///
    /// # Panics
    /// Panics if `index >= ENTRIES_PER_TABLE`.
    pub fn entry(&self, index: usize) -> DirectoryEntry {
        self.entries[index]
    }

    /// Page table behind slot `index`, if the slot is present
    pub fn table(&self, index: usize) -> Option<&PageTable> {
        let entry = self.entries[index];
        if !entry.is_present() {
            return None;
        }
        // SAFETY: present descriptors are only written by `install`, which
        // stores a pointer obtained from `Box::into_raw`. The directory owns
        // that box until `detach` clears the present bit, so the pointer is
        // live and nobody else can alias it mutably.
        Some(unsafe { &*(entry.table_address() as usize as *const PageTable) })
    }

    /// Mutable page table behind slot `index`, if the slot is present
    pub(crate) fn table_mut(&mut self, index: usize) -> Option<&mut PageTable> {
        let entry = self.entries[index];
        if !entry.is_present() {
            return None;
        }
        // SAFETY: see `table`; `&mut self` guarantees exclusive access.
        Some(unsafe { &mut *(entry.table_address() as usize as *mut PageTable) })
    }

    /// Takes ownership of `table` and makes slot `index` present with
    /// `flags`. Any descriptor previously in the slot must be non-present.
    pub(crate) fn install(&mut self, index: usize, table: Box<PageTable>, flags: EntryFlags) {
        debug_assert!(!self.entries[index].is_present());
        let address = Box::into_raw(table) as usize as u64;
        self.entries[index] = DirectoryEntry::new(address, flags | EntryFlags::PRESENT);
    }

    /// Clears the present bit of slot `index` and returns the table it
    /// owned. The remaining descriptor bits are left as they were.
    pub(crate) fn detach(&mut self, index: usize) -> Option<Box<PageTable>> {
        let entry = self.entries[index];
        if !entry.is_present() {
            return None;
        }
        self.entries[index].remove(EntryFlags::PRESENT);
        // SAFETY: the pointer came from `Box::into_raw` in `install` and the
        // slot no longer references it, so ownership moves back to the box.
        Some(unsafe { Box::from_raw(entry.table_address() as usize as *mut PageTable) })
    }

    /// Present slots with their tables, in index order
    pub fn tables(&self) -> impl Iterator<Item = (usize, &PageTable)> + '_ {
        (0..ENTRIES_PER_TABLE).filter_map(move |index| self.table(index).map(|table| (index, table)))
    }

    /// Number of page tables currently present
    pub fn table_count(&self) -> usize {
        self.entries.iter().filter(|entry| entry.is_present()).count()
    }

    /// Leaf descriptor for `address`, present or not, if its table exists
    pub fn lookup(&self, address: VirtAddr) -> Option<TableEntry> {
        let parts = AddressParts::decompose(address);
        self.table(parts.directory).map(|table| table.entry(parts.table))
    }

    /// Every present mapping as `(page base, descriptor)`, in address order
    pub fn mappings(&self) -> impl Iterator<Item = (VirtAddr, TableEntry)> + '_ {
        self.tables().flat_map(|(directory, table)| {
            table.present_entries().map(move |(index, entry)| {
                let base = AddressParts {
                    directory,
                    table: index,
                    offset: 0,
                }
                .compose();
                (base, entry)
            })
        })
    }

    /// Diagnostic listing of present tables and entries
    pub fn dump(&self) -> DirectoryDump<'_> {
        DirectoryDump::new(self)
    }
}

impl Default for PageDirectory {
    fn default() -> Self {
        Self::new()
    }
}

/// Frees the remaining tables through the global allocator. Contexts with a
/// custom `TableAllocator` return them with `Mmu::clear` before the drop.
impl Drop for PageDirectory {
    fn drop(&mut self) {
        for index in 0..ENTRIES_PER_TABLE {
            drop(self.detach(index));
        }
    }
}

impl core::fmt::Debug for PageDirectory {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_map()
            .entries(
                self.entries
                    .iter()
                    .enumerate()
                    .filter(|(_, entry)| entry.is_present()),
            )
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ptsim_api::PhysAddr;

    fn table_with(index: usize, frame: u32) -> Box<PageTable> {
        let mut table = Box::new(PageTable::new());
        *table.entry_mut(index) = TableEntry::new(PhysAddr::new(frame), EntryFlags::PRESENT);
        table
    }

    #[test]
    fn test_new_directory_is_empty() {
        let directory = PageDirectory::new();
        assert_eq!(directory.table_count(), 0);
        assert!(directory.table(0).is_none());
        assert_eq!(directory.mappings().count(), 0);
    }

    #[test]
    fn test_install_and_detach() {
        let mut directory = PageDirectory::new();
        directory.install(64, table_with(1, 0x0202_0000), EntryFlags::USER);

        let entry = directory.entry(64);
        assert!(entry.is_present());
        assert!(entry.is_user());
        assert!(!entry.is_writable());
        assert_eq!(entry.table_address() % 4096, 0);
        assert_eq!(directory.table_count(), 1);
        assert_eq!(
            directory.lookup(VirtAddr::new(0x1000_1000)).map(|e| e.frame()),
            Some(PhysAddr::new(0x0202_0000))
        );

        let table = directory.detach(64).unwrap();
        assert_eq!(table.entry(1).frame(), PhysAddr::new(0x0202_0000));
        assert!(!directory.entry(64).is_present());
        assert!(directory.table(64).is_none());
        assert!(directory.detach(64).is_none());
    }

    #[test]
    fn test_mappings_report_page_bases() {
        let mut directory = PageDirectory::new();
        directory.install(0, table_with(3, 0x0200_3000), EntryFlags::empty());
        directory.install(64, table_with(1023, 0x0203_0000), EntryFlags::empty());

        let bases: [(u32, u32); 2] = [(0x0000_3000, 0x0200_3000), (0x103f_f000, 0x0203_0000)];
        assert!(directory
            .mappings()
            .map(|(va, e)| (va.as_u32(), e.frame().as_u32()))
            .eq(bases.iter().copied()));
    }

    #[test]
    fn test_drop_releases_tables() {
        let mut directory = Box::new(PageDirectory::new());
        for index in [0, 1, 1023] {
            directory.install(index, table_with(0, 0x1000), EntryFlags::empty());
        }
        assert_eq!(directory.table_count(), 3);
        drop(directory);
    }
}
