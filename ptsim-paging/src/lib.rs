//! ptsim Paging
//!
//! Software model of a two-level MMU: a page directory of 1024 descriptors,
//! each naming a lazily allocated page table of 1024 leaf descriptors that
//! map 4 KiB pages to frames.
//!
//! ```rust
//! use ptsim_paging::{Mmu, PageDirectory};
//! use ptsim_paging::{AccessMode, PhysAddr, PrivilegeLevel, VirtAddr};
//!
//! let mut directory = PageDirectory::new();
//! let mut mmu = Mmu::default();
//! mmu.set_page_directory(&mut directory);
//!
//! mmu.map_page(
//!     VirtAddr::new(0x1000_0000),
//!     PhysAddr::new(0x0201_0000),
//!     AccessMode::Read,
//!     PrivilegeLevel::User,
//! )
//! .unwrap();
//!
//! // User stores to a read-only page fault, supervisor stores do not.
//! let va = VirtAddr::new(0x1000_0000);
//! assert!(mmu.translate(va, AccessMode::Write, PrivilegeLevel::User).is_err());
//! assert_eq!(
//!     mmu.translate(va, AccessMode::Write, PrivilegeLevel::Kernel).unwrap(),
//!     PhysAddr::new(0x0201_0000)
//! );
//! ```

#![no_std]
#![warn(missing_docs)]
#![warn(clippy::all)]

#[cfg(feature = "std")]
extern crate std;

extern crate alloc;

// Re-export API types
pub use ptsim_api::*;

// Paging modules
pub mod address;
pub mod allocator;
pub mod config;
pub mod directory;
pub mod dump;
pub mod mmu;

// Re-export commonly used types and functions
pub use address::AddressParts;
pub use allocator::GlobalTableAllocator;
pub use config::{PagingConfig, PermissionModel};
pub use directory::PageDirectory;
pub use dump::{DirectoryDump, TableDump, TranslationRecord};
pub use mmu::{Mmu, PagingStats};
