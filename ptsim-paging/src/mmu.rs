//! Translation context
//!
//! [`Mmu`] plays the role of the hardware walker plus the kernel code that
//! edits its tables. It holds the registered page directory (the software
//! analogue of the base-table register), the table allocator and the
//! configuration, and implements the three operations on them:
//!
//! - `map_page` installs or replaces one mapping, creating the page table on
//!   first use of a directory slot;
//! - `translate` walks both levels, applies the permission gates and marks
//!   the leaf descriptor accessed;
//! - `unmap_page` clears one mapping and gives the table back once it no
//!   longer maps anything.

use ptsim_api::error::{misaligned, not_mapped};
use ptsim_api::{
    AccessMode, AddressTranslator, EntryFlags, Error, PhysAddr, PrivilegeLevel, Result,
    TableAllocator, TableEntry, TranslationFault, VirtAddr, ENTRIES_PER_TABLE,
};

use crate::address::AddressParts;
use crate::allocator::GlobalTableAllocator;
use crate::config::{PagingConfig, PermissionModel};
use crate::directory::PageDirectory;
use crate::dump::TranslationRecord;

/// Counters kept by a translation context
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PagingStats {
    /// Page tables created by `map_page`
    pub tables_allocated: u64,
    /// Page tables handed back to the allocator
    pub tables_released: u64,
    /// Successful translations
    pub translations: u64,
    /// Translations rejected by a gate
    pub faults: u64,
}

/// Two-level translation context over a caller-owned page directory
pub struct Mmu<'d, A: TableAllocator = GlobalTableAllocator> {
    directory: Option<&'d mut PageDirectory>,
    allocator: A,
    config: PagingConfig,
    stats: PagingStats,
}

/// The directory every operation works on. Using a context before a
/// directory is registered is a programming error.
fn registered<'a>(directory: &'a mut Option<&'_ mut PageDirectory>) -> &'a mut PageDirectory {
    match directory.as_deref_mut() {
        Some(directory) => directory,
        None => panic!("no page directory registered"),
    }
}

/// Gates 3 and 4 against one descriptor's flags.
fn check_permissions(
    flags: EntryFlags,
    mode: AccessMode,
    level: PrivilegeLevel,
) -> core::result::Result<(), TranslationFault> {
    // Supervisor stores ignore WRITABLE.
    if mode.is_write() && level.is_user() && !flags.contains(EntryFlags::WRITABLE) {
        return Err(TranslationFault::WriteProtected);
    }
    if level.is_user() && !flags.contains(EntryFlags::USER) {
        return Err(TranslationFault::SupervisorOnly);
    }
    Ok(())
}

fn walk(
    directory: &mut PageDirectory,
    virt: VirtAddr,
    mode: AccessMode,
    level: PrivilegeLevel,
    model: PermissionModel,
) -> core::result::Result<PhysAddr, TranslationFault> {
    let parts = AddressParts::decompose(virt);
    let directory_flags = directory.entry(parts.directory).flags();
    let table = directory
        .table_mut(parts.directory)
        .ok_or(TranslationFault::DirectoryNotPresent)?;

    let entry = table.entry_mut(parts.table);
    if !entry.is_present() {
        return Err(TranslationFault::TableEntryNotPresent);
    }
    check_permissions(entry.flags(), mode, level)?;
    if model == PermissionModel::Hierarchical {
        check_permissions(directory_flags, mode, level)?;
    }

    entry.insert(EntryFlags::ACCESSED);
    Ok(PhysAddr::new(entry.frame().as_u32() | parts.offset))
}

impl<'d, A: TableAllocator> Mmu<'d, A> {
    /// Create a context with the feature-selected configuration and no
    /// directory registered
    pub fn new(allocator: A) -> Self {
        Self::with_config(allocator, PagingConfig::current())
    }

    /// Create a context with an explicit configuration
    pub fn with_config(allocator: A, config: PagingConfig) -> Self {
        Self {
            directory: None,
            allocator,
            config,
            stats: PagingStats::default(),
        }
    }

    /// Register the directory all later operations act on, replacing any
    /// previously registered one
    pub fn set_page_directory(&mut self, directory: &'d mut PageDirectory) {
        self.directory = Some(directory);
    }

    /// The registered directory, if any
    pub fn page_directory(&self) -> Option<&PageDirectory> {
        self.directory.as_deref()
    }

    /// Active configuration
    pub fn config(&self) -> &PagingConfig {
        &self.config
    }

    /// Counters accumulated since creation
    pub fn stats(&self) -> PagingStats {
        self.stats
    }

    /// The table allocator
    pub fn allocator(&self) -> &A {
        &self.allocator
    }

    /// Map the page at `virt` to the frame at `phys`.
    ///
    /// Creates the page table for the directory slot on first use; the new
    /// directory descriptor records the rights of this call and keeps them
    /// for the lifetime of the table. The leaf descriptor is always
    /// overwritten, which drops any previous mapping of the page together
    /// with its accessed bit.
    ///
    /// # Errors
    /// - [`Error::Misaligned`] if either address has offset bits set
    /// - [`Error::OutOfMemory`] if a needed table cannot be created
    ///
    /// No state changes on error.
    ///
    /// # Panics
    /// Panics if no directory is registered.
    pub fn map_page(
        &mut self,
        virt: VirtAddr,
        phys: PhysAddr,
        mode: AccessMode,
        level: PrivilegeLevel,
    ) -> Result<()> {
        if !virt.is_page_aligned() {
            return Err(misaligned(virt.as_u32()));
        }
        if !phys.is_page_aligned() {
            return Err(misaligned(phys.as_u32()));
        }

        let flags = EntryFlags::for_access(mode, level);
        let parts = AddressParts::decompose(virt);
        let directory = registered(&mut self.directory);

        if !directory.entry(parts.directory).is_present() {
            if !self.config.allows_new_table(directory.table_count()) {
                #[cfg(feature = "log")]
                log::warn!("page table limit reached mapping 0x{:08x}", virt.as_u32());
                return Err(Error::OutOfMemory);
            }
            let mut table = self.allocator.allocate_table()?;
            if !table.is_zeroed() {
                #[cfg(feature = "log")]
                log::warn!("allocator returned a dirty table for slot {}", parts.directory);
                table.zero();
            }
            directory.install(parts.directory, table, flags);
            self.stats.tables_allocated += 1;
            #[cfg(feature = "log")]
            log::debug!("created page table for directory slot {}", parts.directory);
        }

        let table = directory
            .table_mut(parts.directory)
            .ok_or(not_mapped(virt.as_u32()))?;
        let slot = table.entry_mut(parts.table);
        #[cfg(feature = "log")]
        {
            if slot.is_present() {
                log::debug!(
                    "remapping 0x{:08x}: 0x{:08x} -> 0x{:08x}",
                    virt.as_u32(),
                    slot.frame().as_u32(),
                    phys.as_u32()
                );
            }
        }
        *slot = TableEntry::new(phys, flags);
        Ok(())
    }

    /// Translate `virt` for an access of `mode` at `level`.
    ///
    /// Gates, in order: directory slot present, leaf present, user stores
    /// need `WRITABLE`, user accesses need `USER`. Supervisor accesses pass
    /// both permission gates. With [`PermissionModel::Hierarchical`] the
    /// permission gates also apply to the directory descriptor.
    ///
    /// A successful translation sets the leaf's accessed bit. A failed one
    /// changes nothing.
    ///
    /// # Panics
    /// Panics if no directory is registered.
    pub fn translate(
        &mut self,
        virt: VirtAddr,
        mode: AccessMode,
        level: PrivilegeLevel,
    ) -> Result<PhysAddr> {
        let model = self.config.permission_model;
        let directory = registered(&mut self.directory);
        let result = walk(directory, virt, mode, level, model).map_err(Error::Fault);

        match result {
            Ok(_) => self.stats.translations += 1,
            Err(_) => self.stats.faults += 1,
        }
        #[cfg(feature = "log")]
        log::trace!(
            "{}",
            TranslationRecord {
                virt,
                mode,
                level,
                result
            }
        );
        result
    }

    /// Sentinel form of [`Mmu::translate`]: the physical address, or
    /// [`INVALID_ADDRESS`](ptsim_api::INVALID_ADDRESS) on any miss
    pub fn translate_page_table(&mut self, virt: u32, mode: AccessMode, level: PrivilegeLevel) -> u32 {
        AddressTranslator::translate_page_table(self, virt, mode, level)
    }

    /// Translate and keep the outcome for reporting
    pub fn trace(&mut self, virt: VirtAddr, mode: AccessMode, level: PrivilegeLevel) -> TranslationRecord {
        TranslationRecord {
            virt,
            mode,
            level,
            result: self.translate(virt, mode, level),
        }
    }

    /// Remove the mapping of the page at `virt`.
    ///
    /// Only the present bit of the leaf is cleared. When the table no longer
    /// holds a present descriptor, the directory slot is cleared first and
    /// the table is then returned to the allocator.
    ///
    /// # Errors
    /// - [`Error::Misaligned`] if `virt` has offset bits set
    /// - [`Error::NotMapped`] if no table covers `virt`
    ///
    /// # Panics
    /// Panics if no directory is registered.
    pub fn unmap_page(&mut self, virt: VirtAddr) -> Result<()> {
        if !virt.is_page_aligned() {
            return Err(misaligned(virt.as_u32()));
        }

        let parts = AddressParts::decompose(virt);
        let directory = registered(&mut self.directory);
        let table = directory
            .table_mut(parts.directory)
            .ok_or(not_mapped(virt.as_u32()))?;

        table.entry_mut(parts.table).remove(EntryFlags::PRESENT);

        if table.is_empty() {
            if let Some(table) = directory.detach(parts.directory) {
                self.allocator.release_table(table);
                self.stats.tables_released += 1;
                #[cfg(feature = "log")]
                log::debug!("released page table for directory slot {}", parts.directory);
            }
        }
        Ok(())
    }

    /// Leaf descriptor for `virt`, present or not, if its table exists
    pub fn table_entry(&self, virt: VirtAddr) -> Option<TableEntry> {
        self.page_directory().and_then(|directory| directory.lookup(virt))
    }

    /// Drop every mapping and give all tables back to the allocator.
    ///
    /// Call this before dropping a directory whose tables came from a
    /// pooling allocator; the directory's own `Drop` bypasses the allocator.
    ///
    /// # Panics
    /// Panics if no directory is registered.
    pub fn clear(&mut self) {
        let directory = registered(&mut self.directory);
        for index in 0..ENTRIES_PER_TABLE {
            if let Some(table) = directory.detach(index) {
                self.allocator.release_table(table);
                self.stats.tables_released += 1;
            }
        }
    }
}

impl Default for Mmu<'_, GlobalTableAllocator> {
    fn default() -> Self {
        Self::new(GlobalTableAllocator::new())
    }
}

impl<A: TableAllocator> AddressTranslator for Mmu<'_, A> {
    fn map_page(
        &mut self,
        virt: VirtAddr,
        phys: PhysAddr,
        mode: AccessMode,
        level: PrivilegeLevel,
    ) -> Result<()> {
        Mmu::map_page(self, virt, phys, mode, level)
    }

    fn translate(&mut self, virt: VirtAddr, mode: AccessMode, level: PrivilegeLevel) -> Result<PhysAddr> {
        Mmu::translate(self, virt, mode, level)
    }

    fn unmap_page(&mut self, virt: VirtAddr) -> Result<()> {
        Mmu::unmap_page(self, virt)
    }
}
