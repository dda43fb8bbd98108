//! Diagnostic listings
//!
//! Read-only views that render a directory, a single table or one
//! translation as text. None of them mutate state, including the accessed
//! bits.

use core::fmt;

use ptsim_api::{AccessMode, PageTable, PhysAddr, PrivilegeLevel, Result, TableEntry, VirtAddr};

use crate::directory::PageDirectory;

/// Listing of every present table in a directory
///
/// One header line per present slot, followed by that table's present
/// entries:
///
/// ```text
/// 0064 => Page table at 0x000055d1c2a3f000
///    Entry 0000: Page base: 0x02010000   U W
///    Entry 1023: Page base: 0x02030000 A
/// ```
pub struct DirectoryDump<'a> {
    directory: &'a PageDirectory,
}

impl<'a> DirectoryDump<'a> {
    pub(crate) fn new(directory: &'a PageDirectory) -> Self {
        Self { directory }
    }
}

impl fmt::Display for DirectoryDump<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (index, table) in self.directory.tables() {
            writeln!(
                f,
                "{:04} => Page table at 0x{:016x}",
                index,
                self.directory.entry(index).table_address()
            )?;
            write!(f, "{}", TableDump::new(table))?;
        }
        Ok(())
    }
}

/// Listing of the present entries of one table
pub struct TableDump<'a> {
    table: &'a PageTable,
}

impl<'a> TableDump<'a> {
    /// Wraps `table` for display
    pub fn new(table: &'a PageTable) -> Self {
        Self { table }
    }
}

fn flag(set: bool, letter: char) -> char {
    if set { letter } else { ' ' }
}

fn write_entry(f: &mut fmt::Formatter<'_>, index: usize, entry: TableEntry) -> fmt::Result {
    writeln!(
        f,
        "   Entry {:04}: Page base: 0x{:08x} {} {} {}",
        index,
        entry.frame().as_u32(),
        flag(entry.is_accessed(), 'A'),
        flag(entry.is_user(), 'U'),
        flag(entry.is_writable(), 'W'),
    )
}

impl fmt::Display for TableDump<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (index, entry) in self.table.present_entries() {
            write_entry(f, index, entry)?;
        }
        Ok(())
    }
}

/// Outcome of one translation, formatted the way a tracing MMU reports it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TranslationRecord {
    /// Address that was translated
    pub virt: VirtAddr,
    /// Requested access
    pub mode: AccessMode,
    /// Requested privilege
    pub level: PrivilegeLevel,
    /// Physical address or the failing gate
    pub result: Result<PhysAddr>,
}

impl fmt::Display for TranslationRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "0x{:08x} ({},{}) --> ",
            self.virt.as_u32(),
            self.mode.tag(),
            self.level.tag()
        )?;
        match self.result {
            Ok(phys) => write!(f, "0x{:08x}", phys.as_u32()),
            Err(_) => write!(f, "<invalid>"),
        }
    }
}
