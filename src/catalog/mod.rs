pub mod reader;

use std::collections::HashMap;
use std::sync::Arc;

use crate::error::{Error, Result};
use crate::model::{RegionKind, StaticId, StaticRegion};

pub use reader::{CatalogFormat, CatalogReader};

/// Lookup boundary between the trace and the static-region descriptions
pub trait RegionCatalog {
    /// Resolve a static region id; fails when the id is absent
    fn resolve(&self, id: StaticId) -> Result<Arc<StaticRegion>>;

    /// Resolve a call-site id; fails when the id is absent
    fn resolve_call_site(&self, id: StaticId) -> Result<Arc<StaticRegion>>;
}

/// In-memory catalog of static regions and call sites
#[derive(Debug, Clone)]
pub struct StaticRegionTable {
    regions: HashMap<StaticId, Arc<StaticRegion>>,
    call_sites: HashMap<StaticId, Arc<StaticRegion>>,
}

impl StaticRegionTable {
    /// Create a table holding only the synthetic root region
    pub fn new() -> Self {
        let mut regions = HashMap::new();
        let root = StaticRegion::root();
        regions.insert(root.id, Arc::new(root));

        Self {
            regions,
            call_sites: HashMap::new(),
        }
    }

    /// Insert a descriptor; call sites go to their own namespace
    pub fn insert(&mut self, region: StaticRegion) {
        let id = region.id;
        if region.kind == RegionKind::CallSite {
            self.call_sites.insert(id, Arc::new(region));
        } else {
            self.regions.insert(id, Arc::new(region));
        }
    }

    pub fn len(&self) -> usize {
        self.regions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }

    pub fn call_site_count(&self) -> usize {
        self.call_sites.len()
    }

    /// All static regions of the given kind
    pub fn regions_of_kind(&self, kind: RegionKind) -> Vec<Arc<StaticRegion>> {
        self.regions
            .values()
            .filter(|r| r.kind == kind)
            .cloned()
            .collect()
    }
}

impl Default for StaticRegionTable {
    fn default() -> Self {
        Self::new()
    }
}

impl RegionCatalog for StaticRegionTable {
    fn resolve(&self, id: StaticId) -> Result<Arc<StaticRegion>> {
        self.regions
            .get(&id)
            .cloned()
            .ok_or(Error::UnresolvedStaticRegion(id))
    }

    fn resolve_call_site(&self, id: StaticId) -> Result<Arc<StaticRegion>> {
        self.call_sites
            .get(&id)
            .cloned()
            .ok_or(Error::UnresolvedCallSite(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_root_region_is_preloaded() {
        let table = StaticRegionTable::new();
        let root = table.resolve(0).unwrap();
        assert_eq!(root.kind, RegionKind::Loop);
        assert_eq!(root.module, "root");
    }

    #[test]
    fn test_call_sites_use_separate_namespace() {
        let mut table = StaticRegionTable::new();
        table.insert(StaticRegion::new(7, RegionKind::Function, "a.c", "main", 1, 20));
        table.insert(StaticRegion::new(9, RegionKind::CallSite, "a.c", "main", 12, 12));

        assert!(table.resolve(7).is_ok());
        assert!(matches!(table.resolve(9), Err(Error::UnresolvedStaticRegion(9))));
        assert_eq!(table.resolve_call_site(9).unwrap().start_line, 12);
        assert!(matches!(table.resolve_call_site(7), Err(Error::UnresolvedCallSite(7))));
    }
}
