//! Virtual address decomposition
//!
//! A 32-bit virtual address splits into a 10-bit directory index, a 10-bit
//! table index and a 12-bit page offset. Everything here is pure.

use ptsim_api::{VirtAddr, BITS_PER_ENTRY, ENTRIES_PER_TABLE, OFFSET_BITS, OFFSET_MASK};

/// The three fields of a virtual address
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AddressParts {
    /// Directory slot
    pub directory: usize,
    /// Table slot
    pub table: usize,
    /// Byte offset inside the page
    pub offset: u32,
}

impl AddressParts {
    /// Splits `address` into its fields.
    pub const fn decompose(address: VirtAddr) -> Self {
        Self {
            directory: address.directory_index(),
            table: address.table_index(),
            offset: address.page_offset(),
        }
    }

    /// Reassembles an address. Out-of-range fields are truncated to their
    /// bit width.
    pub const fn compose(self) -> VirtAddr {
        let directory = (self.directory & (ENTRIES_PER_TABLE - 1)) as u32;
        let table = (self.table & (ENTRIES_PER_TABLE - 1)) as u32;
        VirtAddr::new(
            (directory << (OFFSET_BITS + BITS_PER_ENTRY))
                | (table << OFFSET_BITS)
                | (self.offset & OFFSET_MASK),
        )
    }
}

impl From<VirtAddr> for AddressParts {
    fn from(address: VirtAddr) -> Self {
        Self::decompose(address)
    }
}
