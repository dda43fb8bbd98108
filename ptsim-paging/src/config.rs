//! Engine configuration
//!
//! Defaults come from Cargo features so a build can pick its permission model
//! without touching call sites; individual contexts may still override them.

/// How translation combines directory and table permission bits
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PermissionModel {
    /// Only the leaf descriptor's flags gate an access. Directory flags are
    /// recorded when the table is created and never consulted afterwards.
    TableOnly,
    /// Both levels gate an access; the effective rights are the
    /// intersection of directory and table flags.
    Hierarchical,
}

/// Configuration of one translation context
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PagingConfig {
    /// Permission semantics applied by translation
    pub permission_model: PermissionModel,
    /// Upper bound on page tables present in the directory at once.
    /// `None` leaves the allocator as the only limit.
    pub max_tables: Option<usize>,
}

impl PagingConfig {
    /// Configuration selected by the enabled Cargo features
    pub const fn current() -> Self {
        Self {
            permission_model: if cfg!(feature = "hierarchical_permissions") {
                PermissionModel::Hierarchical
            } else {
                PermissionModel::TableOnly
            },
            max_tables: None,
        }
    }

    /// Replace the permission model
    pub const fn with_permission_model(mut self, model: PermissionModel) -> Self {
        self.permission_model = model;
        self
    }

    /// Cap the number of live page tables
    pub const fn with_max_tables(mut self, max_tables: usize) -> Self {
        self.max_tables = Some(max_tables);
        self
    }

    /// Whether one more table may be created while `live` exist
    pub const fn allows_new_table(&self, live: usize) -> bool {
        match self.max_tables {
            Some(max) => live < max,
            None => true,
        }
    }
}

impl Default for PagingConfig {
    fn default() -> Self {
        Self::current()
    }
}
