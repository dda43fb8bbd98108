//! Memory management module

#[cfg(feature = "alloc")]
pub mod interface;
pub mod types;

// Re-export commonly used items
#[cfg(feature = "alloc")]
pub use interface::*;
pub use types::*;
