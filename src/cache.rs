//! In-memory memo of normalized sources.
//!
//! Keyed by [`SourceFingerprint`], so an edited file (new size or mtime) is
//! read again while repeated queries against an unchanged one are free.

use anyhow::{Context, Result};
use std::{
    collections::HashMap,
    path::Path,
    sync::{Arc, Mutex},
};
use tracing::debug;

use crate::{
    grid::{load_grid, SourceFingerprint},
    normalize::{normalize, Normalized, NormalizeOptions},
};

#[derive(Debug, Default)]
pub struct NormalizedCache {
    entries: Mutex<HashMap<SourceFingerprint, Arc<Normalized>>>,
}

impl NormalizedCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Shared normalized view of `path`, loading it on a miss.
    ///
    /// The lock is not held while loading; two threads missing on the same
    /// key both load, and the first insert wins.
    pub fn get_or_load<P: AsRef<Path>>(
        &self,
        path: P,
        sheet: Option<&str>,
        options: &NormalizeOptions,
    ) -> Result<Arc<Normalized>> {
        let path = path.as_ref();
        let key = SourceFingerprint::of(path, sheet)?;

        if let Some(hit) = self.lock().get(&key) {
            debug!(path = %path.display(), "cache hit");
            return Ok(Arc::clone(hit));
        }

        let grid = load_grid(path, sheet)?;
        let normalized = normalize(&grid, options)
            .with_context(|| format!("failed to normalize {}", path.display()))?;
        let arc = Arc::new(normalized);

        let mut guard = self.lock();
        let entry = guard.entry(key).or_insert_with(|| Arc::clone(&arc));
        Ok(Arc::clone(entry))
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<SourceFingerprint, Arc<Normalized>>> {
        // A panic mid-insert leaves the map itself consistent.
        self.entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use std::io::Write;
    use tempfile::Builder;

    #[test]
    fn second_load_is_a_hit() -> Result<()> {
        let mut file = Builder::new().suffix(".csv").tempfile()?;
        writeln!(file, "REPORTE")?;
        writeln!(file, "MENTOR,CRITICIDAD")?;
        writeln!(file, "Pedro,Alta")?;

        let cache = NormalizedCache::new();
        let options = NormalizeOptions::with_markers(["MENTOR"]);
        let first = cache.get_or_load(file.path(), None, &options)?;
        let second = cache.get_or_load(file.path(), None, &options)?;

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(cache.len(), 1);
        assert_eq!(first.header.row(), 1);
        Ok(())
    }

    #[test]
    fn modified_file_is_reloaded() -> Result<()> {
        let mut file = Builder::new().suffix(".csv").tempfile()?;
        writeln!(file, "MENTOR,CRITICIDAD")?;
        writeln!(file, "Pedro,Alta")?;

        let cache = NormalizedCache::new();
        let options = NormalizeOptions::with_markers(["MENTOR"]);
        let before = cache.get_or_load(file.path(), None, &options)?;

        writeln!(file, "Rosa,Baja")?;
        file.flush()?;
        let after = cache.get_or_load(file.path(), None, &options)?;

        assert!(!Arc::ptr_eq(&before, &after));
        assert_eq!(before.table.len(), 1);
        assert_eq!(after.table.len(), 2);
        assert_eq!(cache.len(), 2);

        cache.clear();
        assert!(cache.is_empty());
        Ok(())
    }

    #[test]
    fn missing_file_is_an_error() {
        let cache = NormalizedCache::new();
        let options = NormalizeOptions::default();
        assert!(cache
            .get_or_load("/definitely/not/here.csv", None, &options)
            .is_err());
        assert!(cache.is_empty());
    }
}
