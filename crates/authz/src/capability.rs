//! Capability flags at application and record scope.

use serde::{Deserialize, Serialize};

/// One named application-scope permission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    View,
    Add,
    Edit,
    Delete,
    Manage,
    Export,
    Import,
}

impl Capability {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::View => "view",
            Self::Add => "add",
            Self::Edit => "edit",
            Self::Delete => "delete",
            Self::Manage => "manage",
            Self::Export => "export",
            Self::Import => "import",
        }
    }
}

impl core::fmt::Display for Capability {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Effective application-level capability set.
///
/// Defaults all-false; populated only by aggregation over the contributing
/// rules. Never persisted as "effective" state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppCapability {
    pub can_view: bool,
    pub can_add: bool,
    pub can_edit: bool,
    pub can_delete: bool,
    pub can_manage: bool,
    pub can_export: bool,
    pub can_import: bool,
}

impl AppCapability {
    /// Full grant (used by tests and the manage override).
    pub fn all() -> Self {
        Self {
            can_view: true,
            can_add: true,
            can_edit: true,
            can_delete: true,
            can_manage: true,
            can_export: true,
            can_import: true,
        }
    }

    /// OR another capability set into this one. Monotonic: flags are only
    /// ever raised, never cleared.
    pub fn union_with(&mut self, other: &AppCapability) {
        self.can_view |= other.can_view;
        self.can_add |= other.can_add;
        self.can_edit |= other.can_edit;
        self.can_delete |= other.can_delete;
        self.can_manage |= other.can_manage;
        self.can_export |= other.can_export;
        self.can_import |= other.can_import;
    }

    /// Whether this set satisfies a capability check.
    ///
    /// `manage` implies every other capability: application managers have
    /// implicit full access.
    pub fn allows(&self, capability: Capability) -> bool {
        if self.can_manage {
            return true;
        }
        match capability {
            Capability::View => self.can_view,
            Capability::Add => self.can_add,
            Capability::Edit => self.can_edit,
            Capability::Delete => self.can_delete,
            Capability::Manage => self.can_manage,
            Capability::Export => self.can_export,
            Capability::Import => self.can_import,
        }
    }

    pub fn any(&self) -> bool {
        self.can_view
            || self.can_add
            || self.can_edit
            || self.can_delete
            || self.can_manage
            || self.can_export
            || self.can_import
    }
}

/// Record-scope capability subset used by record-level overrides.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordCapability {
    pub can_view: bool,
    pub can_edit: bool,
    pub can_delete: bool,
}

impl RecordCapability {
    pub fn new(can_view: bool, can_edit: bool, can_delete: bool) -> Self {
        Self {
            can_view,
            can_edit,
            can_delete,
        }
    }

    pub fn full() -> Self {
        Self::new(true, true, true)
    }
}
