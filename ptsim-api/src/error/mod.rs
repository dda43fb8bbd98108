//! Error handling module for the page table engine

use core::fmt;

/// Status code reported by the legacy integer interface on success
pub const STATUS_OK: i32 = 0;

/// Status code reported by the legacy integer interface on any failure
pub const STATUS_ERROR: i32 = -1;

/// Which translation gate rejected an access
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TranslationFault {
    /// The directory slot for the address is not present
    DirectoryNotPresent,
    /// The table slot for the address is not present
    TableEntryNotPresent,
    /// User-mode store to a read-only page
    WriteProtected,
    /// User-mode access to a supervisor page
    SupervisorOnly,
}

impl fmt::Display for TranslationFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TranslationFault::DirectoryNotPresent => write!(f, "page directory entry not present"),
            TranslationFault::TableEntryNotPresent => write!(f, "page table entry not present"),
            TranslationFault::WriteProtected => write!(f, "write to read-only page from user mode"),
            TranslationFault::SupervisorOnly => write!(f, "user mode access to supervisor page"),
        }
    }
}

/// Common error type used throughout the page table engine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// Address is not a multiple of the page size
    Misaligned {
        /// Offending address
        address: u32,
    },
    /// No page table backs the address
    NotMapped {
        /// Address that was looked up
        address: u32,
    },
    /// Translation rejected by one of the gates
    Fault(TranslationFault),
    /// A page table could not be allocated
    OutOfMemory,
}

impl Error {
    /// Legacy integer status for this error.
    ///
    /// Every failure collapses to `-1`; callers that need to tell them apart
    /// match on the enum instead.
    pub const fn status_code(&self) -> i32 {
        STATUS_ERROR
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Misaligned { address } => write!(f, "Misaligned address: 0x{:08x}", address),
            Error::NotMapped { address } => write!(f, "Not mapped: 0x{:08x}", address),
            Error::Fault(fault) => write!(f, "Translation fault: {}", fault),
            Error::OutOfMemory => write!(f, "Out of memory"),
        }
    }
}

impl From<TranslationFault> for Error {
    fn from(fault: TranslationFault) -> Self {
        Error::Fault(fault)
    }
}

impl core::error::Error for Error {}

/// Result type for operations that can fail
pub type Result<T> = core::result::Result<T, Error>;

/// Collapses a unit result to the legacy `0 / -1` status code
pub fn status_code(result: &Result<()>) -> i32 {
    match result {
        Ok(()) => STATUS_OK,
        Err(err) => err.status_code(),
    }
}

/// Creates a misalignment error for `address`
pub fn misaligned(address: u32) -> Error {
    Error::Misaligned { address }
}

/// Creates a not-mapped error for `address`
pub fn not_mapped(address: u32) -> Error {
    Error::NotMapped { address }
}
