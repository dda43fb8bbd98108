//! Page table storage
//!
//! Tables come from a [`TableAllocator`](ptsim_api::TableAllocator). The
//! default implementation performs one page-aligned zeroed allocation per
//! table through the global allocator.

pub mod global;

pub use global::GlobalTableAllocator;
