//! Core types used throughout the page table engine

use core::fmt;

/// Number of low address bits addressing a byte inside a page
pub const OFFSET_BITS: u32 = 12;

/// Number of address bits selecting an entry inside one table level
pub const BITS_PER_ENTRY: u32 = 10;

/// Page (and frame) size in bytes
pub const PAGE_SIZE: u32 = 1 << OFFSET_BITS;

/// Descriptors per page table and per page directory
pub const ENTRIES_PER_TABLE: usize = 1 << BITS_PER_ENTRY;

/// Mask selecting the offset bits of an address
pub const OFFSET_MASK: u32 = PAGE_SIZE - 1;

/// Mask selecting the page base of an address
pub const BASE_MASK: u32 = !OFFSET_MASK;

/// Mask selecting a table index once the offset has been shifted out
pub const ENTRY_MASK: u32 = (ENTRIES_PER_TABLE as u32) - 1;

/// Sentinel returned by the sentinel-style translation API on any miss
pub const INVALID_ADDRESS: u32 = u32::MAX;

/// Kind of memory access requested from the MMU
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AccessMode {
    /// Load access
    Read,
    /// Store access
    Write,
}

impl AccessMode {
    /// Single-letter tag used in diagnostic output (`R` or `W`)
    pub const fn tag(self) -> char {
        match self {
            AccessMode::Read => 'R',
            AccessMode::Write => 'W',
        }
    }

    /// Returns true for store accesses
    pub const fn is_write(self) -> bool {
        matches!(self, AccessMode::Write)
    }
}

/// Privilege level the access is performed at
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrivilegeLevel {
    /// Supervisor mode
    Kernel,
    /// Unprivileged mode
    User,
}

impl PrivilegeLevel {
    /// Single-letter tag used in diagnostic output (`K` or `U`)
    pub const fn tag(self) -> char {
        match self {
            PrivilegeLevel::Kernel => 'K',
            PrivilegeLevel::User => 'U',
        }
    }

    /// Returns true for unprivileged accesses
    pub const fn is_user(self) -> bool {
        matches!(self, PrivilegeLevel::User)
    }
}

/// A 32-bit virtual address
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[repr(transparent)]
pub struct VirtAddr(pub u32);

impl VirtAddr {
    /// Creates a new virtual address from a raw value.
    pub const fn new(addr: u32) -> Self {
        Self(addr)
    }

    /// Returns the raw address value.
    pub const fn as_u32(self) -> u32 {
        self.0
    }

    /// Returns the offset within the current page.
    pub const fn page_offset(self) -> u32 {
        self.0 & OFFSET_MASK
    }

    /// Returns the address with the offset bits cleared.
    pub const fn page_base(self) -> Self {
        Self(self.0 & BASE_MASK)
    }

    /// Checks if the address is page-aligned.
    pub const fn is_page_aligned(self) -> bool {
        self.page_offset() == 0
    }

    /// Index into the page directory (top bits).
    pub const fn directory_index(self) -> usize {
        (self.0 >> (OFFSET_BITS + BITS_PER_ENTRY)) as usize
    }

    /// Index into the page table named by the directory slot (middle bits).
    pub const fn table_index(self) -> usize {
        ((self.0 >> OFFSET_BITS) & ENTRY_MASK) as usize
    }
}

impl From<u32> for VirtAddr {
    fn from(addr: u32) -> Self {
        Self(addr)
    }
}

impl From<VirtAddr> for u32 {
    fn from(addr: VirtAddr) -> Self {
        addr.0
    }
}

impl fmt::LowerHex for VirtAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::LowerHex::fmt(&self.0, f)
    }
}

/// A 32-bit physical address
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[repr(transparent)]
pub struct PhysAddr(pub u32);

impl PhysAddr {
    /// Creates a new physical address from a raw value.
    pub const fn new(addr: u32) -> Self {
        Self(addr)
    }

    /// Returns the raw address value.
    pub const fn as_u32(self) -> u32 {
        self.0
    }

    /// Returns the offset within the current frame.
    pub const fn page_offset(self) -> u32 {
        self.0 & OFFSET_MASK
    }

    /// Checks if the address is frame-aligned.
    pub const fn is_page_aligned(self) -> bool {
        self.page_offset() == 0
    }
}

impl From<u32> for PhysAddr {
    fn from(addr: u32) -> Self {
        Self(addr)
    }
}

impl From<PhysAddr> for u32 {
    fn from(addr: PhysAddr) -> Self {
        addr.0
    }
}

impl fmt::LowerHex for PhysAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::LowerHex::fmt(&self.0, f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layout_constants() {
        assert_eq!(PAGE_SIZE, 4096);
        assert_eq!(ENTRIES_PER_TABLE, 1024);
        assert_eq!(OFFSET_MASK, 0xFFF);
        assert_eq!(BASE_MASK, 0xFFFF_F000);
        assert_eq!(INVALID_ADDRESS, 0xFFFF_FFFF);
    }

    #[test]
    fn test_virt_addr_fields() {
        let addr = VirtAddr::new(0x103f_f012);
        assert_eq!(addr.directory_index(), 0x40);
        assert_eq!(addr.table_index(), 0x3ff);
        assert_eq!(addr.page_offset(), 0x012);
        assert_eq!(addr.page_base(), VirtAddr::new(0x103f_f000));
        assert!(!addr.is_page_aligned());
    }

    #[test]
    fn test_extreme_addresses() {
        let top = VirtAddr::new(u32::MAX);
        assert_eq!(top.directory_index(), ENTRIES_PER_TABLE - 1);
        assert_eq!(top.table_index(), ENTRIES_PER_TABLE - 1);
        assert_eq!(top.page_offset(), OFFSET_MASK);

        let zero = VirtAddr::default();
        assert_eq!(zero.directory_index(), 0);
        assert_eq!(zero.table_index(), 0);
        assert!(zero.is_page_aligned());
    }

    #[test]
    fn test_mode_tags() {
        assert_eq!(AccessMode::Read.tag(), 'R');
        assert_eq!(AccessMode::Write.tag(), 'W');
        assert_eq!(PrivilegeLevel::Kernel.tag(), 'K');
        assert_eq!(PrivilegeLevel::User.tag(), 'U');
        assert!(AccessMode::Write.is_write());
        assert!(!PrivilegeLevel::Kernel.is_user());
    }
}
