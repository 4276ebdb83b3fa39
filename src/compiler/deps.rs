//! Stylesheet dependency tracking for incremental rebuilds.
//!
//! Records which page pulled in each `.less` fragment, so a change to the
//! fragment can be traced back to the page that must recompile.
//!
//! ```text
//! DependencyTable
//! └── owners: shared.less → a.wpy
//!
//! On shared.less change:
//! 1. owners[shared.less] → a.wpy
//! 2. Recompile a.wpy
//! ```
//!
//! Each fragment has a single owner: the page that compiled most recently
//! while importing it. Entries are never pruned, so a deleted page leaves a
//! stale entry whose recompile attempt simply fails and is logged.

use rustc_hash::FxHashMap;
use std::path::{Path, PathBuf};

/// Fragment → owning page map, scoped to one build/watch session.
#[derive(Debug, Default)]
pub struct DependencyTable {
    owners: FxHashMap<PathBuf, PathBuf>,
}

impl DependencyTable {
    /// Create a new empty table.
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that `page` imported `dependency`.
    ///
    /// Returns the previous owner when a different page held the entry.
    pub fn register(&mut self, dependency: &Path, page: &Path) -> Option<PathBuf> {
        self.owners
            .insert(dependency.to_path_buf(), page.to_path_buf())
            .filter(|previous| previous != page)
    }

    /// Page that last imported `dependency`.
    #[inline]
    pub fn owner_of(&self, dependency: &Path) -> Option<&Path> {
        self.owners.get(dependency).map(PathBuf::as_path)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.owners.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.owners.is_empty()
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn path(s: &str) -> PathBuf {
        PathBuf::from(s)
    }

    #[test]
    fn test_new_table_is_empty() {
        let table = DependencyTable::new();
        assert!(table.is_empty());
        assert!(table.owner_of(&path("/p/src/shared.less")).is_none());
    }

    #[test]
    fn test_register_and_lookup() {
        let mut table = DependencyTable::new();
        let page = path("/p/src/a.wpy");
        let shared = path("/p/src/shared.less");

        assert_eq!(table.register(&shared, &page), None);
        assert_eq!(table.owner_of(&shared), Some(page.as_path()));
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_reregister_same_owner_is_silent() {
        let mut table = DependencyTable::new();
        let page = path("/p/src/a.wpy");
        let shared = path("/p/src/shared.less");

        table.register(&shared, &page);
        assert_eq!(table.register(&shared, &page), None);
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_last_writer_wins() {
        let mut table = DependencyTable::new();
        let a = path("/p/src/a.wpy");
        let b = path("/p/src/b.wpy");
        let shared = path("/p/src/shared.less");

        table.register(&shared, &a);
        assert_eq!(table.register(&shared, &b), Some(a));
        assert_eq!(table.owner_of(&shared), Some(b.as_path()));
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_one_page_many_fragments() {
        let mut table = DependencyTable::new();
        let page = path("/p/src/a.wpy");

        table.register(&path("/p/src/vars.less"), &page);
        table.register(&path("/p/src/mixins.less"), &page);

        assert_eq!(table.len(), 2);
        assert_eq!(table.owner_of(&path("/p/src/vars.less")), Some(page.as_path()));
        assert_eq!(table.owner_of(&path("/p/src/mixins.less")), Some(page.as_path()));
    }
}
