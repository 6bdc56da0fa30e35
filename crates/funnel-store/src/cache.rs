//! Local cache implementations

use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use funnel_core::{CacheError, CacheResult, FunnelTemplate, LocalCache};
use parking_lot::Mutex;
use tempfile::NamedTempFile;
use tracing::debug;

// ============================================================================
// JSON file cache
// ============================================================================

/// Every cached template in one JSON array on disk
///
/// Writes go to a temporary file in the same directory and are renamed over
/// the blob, so a crash mid-write leaves the previous blob intact.
#[derive(Debug)]
pub struct JsonFileCache {
    path: PathBuf,
    lock: Mutex<()>,
}

impl JsonFileCache {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn dir(&self) -> &Path {
        match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        }
    }
}

impl JsonFileCache {
    fn read_blob(&self) -> CacheResult<Vec<FunnelTemplate>> {
        let raw = match std::fs::read(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };
        if raw.iter().all(u8::is_ascii_whitespace) {
            return Ok(Vec::new());
        }
        Ok(serde_json::from_slice(&raw)?)
    }

    fn write_blob(&self, templates: &[FunnelTemplate]) -> CacheResult<()> {
        let dir = self.dir();
        std::fs::create_dir_all(dir)?;

        let mut file = NamedTempFile::new_in(dir)?;
        serde_json::to_writer_pretty(&mut file, templates)?;
        file.write_all(b"\n")?;
        file.as_file().sync_all()?;
        file.persist(&self.path)
            .map_err(|e| CacheError::Io(e.error.to_string()))?;

        debug!(path = %self.path.display(), count = templates.len(), "Wrote template cache");
        Ok(())
    }
}

// Read-modify-write operations hold the lock across both halves
impl LocalCache for JsonFileCache {
    fn load(&self) -> CacheResult<Vec<FunnelTemplate>> {
        let _guard = self.lock.lock();
        self.read_blob()
    }

    fn store(&self, templates: &[FunnelTemplate]) -> CacheResult<()> {
        let _guard = self.lock.lock();
        self.write_blob(templates)
    }

    fn upsert(&self, template: &FunnelTemplate) -> CacheResult<()> {
        let _guard = self.lock.lock();
        let mut templates = self.read_blob()?;
        match templates.iter_mut().find(|t| t.id == template.id) {
            Some(existing) => *existing = template.clone(),
            None => templates.push(template.clone()),
        }
        self.write_blob(&templates)
    }

    fn remove(&self, id: &str) -> CacheResult<bool> {
        let _guard = self.lock.lock();
        let mut templates = self.read_blob()?;
        let before = templates.len();
        templates.retain(|t| t.id != id);
        if templates.len() == before {
            return Ok(false);
        }
        self.write_blob(&templates)?;
        Ok(true)
    }
}

// ============================================================================
// In-memory cache
// ============================================================================

#[derive(Debug, Default)]
struct MemoryCacheState {
    templates: Vec<FunnelTemplate>,
    fail_reads: bool,
    fail_writes: bool,
    writes: usize,
}

/// Cache held in memory, with failure injection for tests
#[derive(Debug, Default)]
pub struct MemoryCache {
    state: Mutex<MemoryCacheState>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style: start with `templates` already cached
    #[must_use]
    pub fn with_templates(self, templates: Vec<FunnelTemplate>) -> Self {
        self.state.lock().templates = templates;
        self
    }

    /// Current contents
    pub fn templates(&self) -> Vec<FunnelTemplate> {
        self.state.lock().templates.clone()
    }

    pub fn set_fail_reads(&self, fail: bool) {
        self.state.lock().fail_reads = fail;
    }

    pub fn set_fail_writes(&self, fail: bool) {
        self.state.lock().fail_writes = fail;
    }

    /// Number of successful `store` calls
    pub fn write_count(&self) -> usize {
        self.state.lock().writes
    }
}

impl LocalCache for MemoryCache {
    fn load(&self) -> CacheResult<Vec<FunnelTemplate>> {
        let state = self.state.lock();
        if state.fail_reads {
            return Err(CacheError::Io("simulated read failure".to_string()));
        }
        Ok(state.templates.clone())
    }

    fn store(&self, templates: &[FunnelTemplate]) -> CacheResult<()> {
        let mut state = self.state.lock();
        if state.fail_writes {
            return Err(CacheError::Io("simulated write failure".to_string()));
        }
        state.templates = templates.to_vec();
        state.writes += 1;
        Ok(())
    }
}
