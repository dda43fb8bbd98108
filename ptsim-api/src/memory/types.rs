//! Descriptor layouts and the page table structure
//!
//! Both descriptor kinds share the x86 two-level flag positions. Fields are
//! exposed through masked accessors so the in-memory layout stays a plain
//! integer that can be dumped and compared bit for bit.

use core::fmt;
use static_assertions::{assert_eq_size, const_assert_eq};

use crate::core::types::{AccessMode, PhysAddr, PrivilegeLevel, ENTRIES_PER_TABLE};

/// Frame address bits of a table descriptor
pub const TABLE_ADDRESS_MASK: u32 = 0xFFFF_F000;

/// Table address bits of a directory descriptor
pub const DIRECTORY_ADDRESS_MASK: u64 = !0xFFF;

bitflags::bitflags! {
    /// Flag bits shared by directory and table descriptors
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct EntryFlags: u32 {
        /// Descriptor is valid
        const PRESENT = 1 << 0;
        /// Stores are permitted from user mode
        const WRITABLE = 1 << 1;
        /// Accessible from user mode
        const USER = 1 << 2;
        /// Set by the MMU on a successful translation
        const ACCESSED = 1 << 5;
    }
}

impl EntryFlags {
    /// Present descriptor flags granting the rights of one access.
    ///
    /// Write access yields `WRITABLE`, user privilege yields `USER`.
    pub fn for_access(mode: AccessMode, level: PrivilegeLevel) -> Self {
        let mut flags = EntryFlags::PRESENT;
        if mode.is_write() {
            flags |= EntryFlags::WRITABLE;
        }
        if level.is_user() {
            flags |= EntryFlags::USER;
        }
        flags
    }
}

/// Leaf descriptor mapping one page to one frame
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(transparent)]
pub struct TableEntry(u32);

impl TableEntry {
    /// A non-present descriptor
    pub const EMPTY: Self = Self(0);

    /// Builds a descriptor from a frame base and flags.
    ///
    /// Low bits of `frame` are masked off; callers check alignment first.
    pub const fn new(frame: PhysAddr, flags: EntryFlags) -> Self {
        Self((frame.as_u32() & TABLE_ADDRESS_MASK) | flags.bits())
    }

    /// Wraps a raw descriptor value.
    pub const fn from_raw(raw: u32) -> Self {
        Self(raw)
    }

    /// Raw descriptor value.
    pub const fn raw(self) -> u32 {
        self.0
    }

    /// Frame base address.
    pub const fn frame(self) -> PhysAddr {
        PhysAddr::new(self.0 & TABLE_ADDRESS_MASK)
    }

    /// Flag bits currently set.
    pub const fn flags(self) -> EntryFlags {
        EntryFlags::from_bits_truncate(self.0)
    }

    /// `PRESENT` is set.
    pub const fn is_present(self) -> bool {
        self.flags().contains(EntryFlags::PRESENT)
    }

    /// `WRITABLE` is set.
    pub const fn is_writable(self) -> bool {
        self.flags().contains(EntryFlags::WRITABLE)
    }

    /// `USER` is set.
    pub const fn is_user(self) -> bool {
        self.flags().contains(EntryFlags::USER)
    }

    /// `ACCESSED` is set.
    pub const fn is_accessed(self) -> bool {
        self.flags().contains(EntryFlags::ACCESSED)
    }

    /// Sets `flags`, leaving every other bit untouched.
    pub fn insert(&mut self, flags: EntryFlags) {
        self.0 |= flags.bits();
    }

    /// Clears `flags`, leaving every other bit untouched.
    pub fn remove(&mut self, flags: EntryFlags) {
        self.0 &= !flags.bits();
    }
}

impl fmt::Debug for TableEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TableEntry")
            .field("frame", &format_args!("0x{:08x}", self.frame().as_u32()))
            .field("flags", &self.flags())
            .finish()
    }
}

/// Top-level descriptor naming one page table
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(transparent)]
pub struct DirectoryEntry(u64);

impl DirectoryEntry {
    /// A non-present descriptor
    pub const EMPTY: Self = Self(0);

    /// Builds a descriptor from a page table address and flags.
    pub const fn new(table_address: u64, flags: EntryFlags) -> Self {
        Self((table_address & DIRECTORY_ADDRESS_MASK) | flags.bits() as u64)
    }

    /// Wraps a raw descriptor value.
    pub const fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    /// Raw descriptor value.
    pub const fn raw(self) -> u64 {
        self.0
    }

    /// Address of the page table this descriptor names.
    pub const fn table_address(self) -> u64 {
        self.0 & DIRECTORY_ADDRESS_MASK
    }

    /// Flag bits currently set.
    pub const fn flags(self) -> EntryFlags {
        EntryFlags::from_bits_truncate(self.0 as u32)
    }

    /// `PRESENT` is set.
    pub const fn is_present(self) -> bool {
        self.flags().contains(EntryFlags::PRESENT)
    }

    /// `WRITABLE` is set.
    pub const fn is_writable(self) -> bool {
        self.flags().contains(EntryFlags::WRITABLE)
    }

    /// `USER` is set.
    pub const fn is_user(self) -> bool {
        self.flags().contains(EntryFlags::USER)
    }

    /// Clears `flags`, leaving every other bit untouched.
    pub fn remove(&mut self, flags: EntryFlags) {
        self.0 &= !(flags.bits() as u64);
    }
}

impl fmt::Debug for DirectoryEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DirectoryEntry")
            .field("table", &format_args!("0x{:016x}", self.table_address()))
            .field("flags", &self.flags())
            .finish()
    }
}

/// Second-level page table: one page worth of leaf descriptors
#[repr(C, align(4096))]
#[derive(Clone, PartialEq, Eq)]
pub struct PageTable {
    entries: [TableEntry; ENTRIES_PER_TABLE],
}

assert_eq_size!(PageTable, [u8; 4096]);
const_assert_eq!(core::mem::align_of::<PageTable>(), 4096);

impl PageTable {
    /// Creates a table with every descriptor non-present
    pub const fn new() -> Self {
        Self {
            entries: [TableEntry::EMPTY; ENTRIES_PER_TABLE],
        }
    }

    /// Descriptor at `index`.
    ///
    /// # Panics
    /// Panics if `index >= ENTRIES_PER_TABLE`.
    pub fn entry(&self, index: usize) -> TableEntry {
        self.entries[index]
    }

    /// Mutable descriptor at `index`.
    pub fn entry_mut(&mut self, index: usize) -> &mut TableEntry {
        &mut self.entries[index]
    }

    /// True when no descriptor is present
    pub fn is_empty(&self) -> bool {
        !self.entries.iter().any(|entry| entry.is_present())
    }

    /// Present descriptors with their indices, in index order
    pub fn present_entries(&self) -> impl Iterator<Item = (usize, TableEntry)> + '_ {
        self.entries
            .iter()
            .copied()
            .enumerate()
            .filter(|(_, entry)| entry.is_present())
    }

    /// True if every descriptor is zero
    pub fn is_zeroed(&self) -> bool {
        self.entries.iter().all(|entry| entry.raw() == 0)
    }

    /// Reset every descriptor to zero
    pub fn zero(&mut self) {
        self.entries.fill(TableEntry::EMPTY);
    }
}

impl Default for PageTable {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for PageTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.present_entries()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flag_positions() {
        assert_eq!(EntryFlags::PRESENT.bits(), 0x01);
        assert_eq!(EntryFlags::WRITABLE.bits(), 0x02);
        assert_eq!(EntryFlags::USER.bits(), 0x04);
        assert_eq!(EntryFlags::ACCESSED.bits(), 0x20);
    }

    #[test]
    fn test_flags_for_access() {
        assert_eq!(
            EntryFlags::for_access(AccessMode::Read, PrivilegeLevel::Kernel),
            EntryFlags::PRESENT
        );
        assert_eq!(
            EntryFlags::for_access(AccessMode::Write, PrivilegeLevel::User),
            EntryFlags::PRESENT | EntryFlags::WRITABLE | EntryFlags::USER
        );
        assert_eq!(
            EntryFlags::for_access(AccessMode::Read, PrivilegeLevel::User),
            EntryFlags::PRESENT | EntryFlags::USER
        );
    }

    #[test]
    fn test_table_entry_fields() {
        let mut entry = TableEntry::new(
            PhysAddr::new(0x0203_0000),
            EntryFlags::PRESENT | EntryFlags::USER,
        );
        assert_eq!(entry.raw(), 0x0203_0005);
        assert_eq!(entry.frame(), PhysAddr::new(0x0203_0000));
        assert!(entry.is_present());
        assert!(entry.is_user());
        assert!(!entry.is_writable());
        assert!(!entry.is_accessed());

        entry.insert(EntryFlags::ACCESSED);
        assert!(entry.is_accessed());
        entry.remove(EntryFlags::PRESENT);
        assert!(!entry.is_present());
        // Frame and remaining flags survive clearing present.
        assert_eq!(entry.frame(), PhysAddr::new(0x0203_0000));
        assert!(entry.is_accessed());
    }

    #[test]
    fn test_table_entry_masks_offset_bits() {
        let entry = TableEntry::new(PhysAddr::new(0x0200_0fff), EntryFlags::PRESENT);
        assert_eq!(entry.frame(), PhysAddr::new(0x0200_0000));
        assert_eq!(entry.flags(), EntryFlags::PRESENT);
    }

    #[test]
    fn test_directory_entry_fields() {
        let mut entry = DirectoryEntry::new(
            0x0000_7f00_dead_b000,
            EntryFlags::PRESENT | EntryFlags::WRITABLE,
        );
        assert_eq!(entry.table_address(), 0x0000_7f00_dead_b000);
        assert!(entry.is_present());
        assert!(entry.is_writable());
        assert!(!entry.is_user());

        entry.remove(EntryFlags::PRESENT);
        assert!(!entry.is_present());
        assert_eq!(entry.table_address(), 0x0000_7f00_dead_b000);
    }

    #[test]
    fn test_page_table_presence() {
        let mut table = PageTable::new();
        assert!(table.is_empty());
        assert!(table.is_zeroed());

        *table.entry_mut(7) = TableEntry::new(PhysAddr::new(0x1000), EntryFlags::PRESENT);
        *table.entry_mut(9) = TableEntry::new(PhysAddr::new(0x2000), EntryFlags::USER);
        assert!(!table.is_empty());

        let present: [(usize, u32); 1] = [(7, 0x1001)];
        assert!(table
            .present_entries()
            .map(|(i, e)| (i, e.raw()))
            .eq(present.iter().copied()));

        table.entry_mut(7).remove(EntryFlags::PRESENT);
        assert!(table.is_empty());
        assert!(!table.is_zeroed());

        table.zero();
        assert!(table.is_zeroed());
    }
}
