//! Local cache contract
//!
//! The cache persists one keyed blob holding every template cached on the
//! device. The provided `upsert` and `remove` are read-modify-write over
//! `load` and `store`; implementations shared between threads override them
//! to hold one lock across both. Writers in separate processes can still
//! clobber each other.

use crate::error::CacheResult;
use crate::types::FunnelTemplate;

/// Synchronous, always-available, never-authoritative template storage
pub trait LocalCache: Send + Sync {
    /// Read the whole blob; a missing blob is an empty list
    fn load(&self) -> CacheResult<Vec<FunnelTemplate>>;

    /// Replace the whole blob
    fn store(&self, templates: &[FunnelTemplate]) -> CacheResult<()>;

    fn find(&self, id: &str) -> CacheResult<Option<FunnelTemplate>> {
        Ok(self.load()?.into_iter().find(|t| t.id == id))
    }

    /// Replace by id, or append when the id is new
    fn upsert(&self, template: &FunnelTemplate) -> CacheResult<()> {
        let mut templates = self.load()?;
        match templates.iter_mut().find(|t| t.id == template.id) {
            Some(existing) => *existing = template.clone(),
            None => templates.push(template.clone()),
        }
        self.store(&templates)
    }

    /// Returns whether an entry was removed
    fn remove(&self, id: &str) -> CacheResult<bool> {
        let mut templates = self.load()?;
        let before = templates.len();
        templates.retain(|t| t.id != id);
        if templates.len() == before {
            return Ok(false);
        }
        self.store(&templates)?;
        Ok(true)
    }
}
