//! ptsim API - Core interfaces and types for the two-level page table engine
//!
//! This crate provides the types shared by the translation engine and
//! anything that drives it: address newtypes, access modes, descriptor
//! layouts, the error taxonomy and the allocator seam.
//!
//! # Architecture
//!
//! - **Core**: address layout constants, address newtypes, access modes
//! - **Error**: common error type and legacy status codes
//! - **Memory**: descriptor layouts, the page table structure and the
//!   allocator / translator interfaces
//!
//! # Usage
//!
//! ```rust
//! use ptsim_api::{EntryFlags, TableEntry, PhysAddr};
//!
//! let entry = TableEntry::new(PhysAddr::new(0x0200_0000), EntryFlags::PRESENT);
//! assert!(entry.is_present());
//! assert_eq!(entry.frame(), PhysAddr::new(0x0200_0000));
//! ```

#![no_std]

#[cfg(any(feature = "std", test))]
extern crate std;

#[cfg(feature = "alloc")]
extern crate alloc;

// Core modules
pub mod core;
pub mod error;
pub mod memory;

// Re-export commonly used types
pub use crate::core::types::*;
pub use crate::error::{status_code, Error, Result, TranslationFault};
#[cfg(feature = "alloc")]
pub use crate::memory::interface::{AddressTranslator, TableAllocator};
#[cfg(any(test, feature = "mock"))]
pub use crate::memory::interface::MockTableAllocator;
pub use crate::memory::types::{DirectoryEntry, EntryFlags, PageTable, TableEntry};
