//! Collision-avoiding destination names.
//!
//! Display names come from like counts, which repeat constantly, and an
//! overwriting upload would silently swallow the earlier photo. The
//! resolver probes the store for a free slot and additionally remembers
//! every name it has handed out this run, so a name is never issued twice
//! even before its upload lands (or when that upload later fails).

use std::collections::HashSet;

use tokio::sync::Mutex;

use crate::disk::{DiskError, DiskStore};

/// Finds a free destination path for a desired base name.
///
/// Candidates are `base`, `base_1`, `base_2`, ... against the original base;
/// the first one neither present on the store nor already reserved wins.
/// The whole probe-then-reserve sequence runs under a mutex, which keeps
/// resolution safe if photos are ever processed concurrently.
pub struct NameResolver {
    reserved: Mutex<HashSet<String>>,
}

impl NameResolver {
    pub fn new() -> Self {
        Self {
            reserved: Mutex::new(HashSet::new()),
        }
    }

    /// Resolve to a full `/<directory>/<stem>.<extension>` path and reserve
    /// it. Store errors during the probe abort the resolution.
    pub async fn resolve(
        &self,
        store: &dyn DiskStore,
        directory: &str,
        base: &str,
        extension: &str,
    ) -> Result<String, DiskError> {
        let mut reserved = self.reserved.lock().await;
        let mut suffix = 0u32;
        loop {
            let path = if suffix == 0 {
                format!("/{directory}/{base}.{extension}")
            } else {
                format!("/{directory}/{base}_{suffix}.{extension}")
            };
            // Reserved names are taken by definition; only unreserved
            // candidates are worth a remote round trip.
            if !reserved.contains(&path) && !store.resource_exists(&path).await? {
                reserved.insert(path.clone());
                return Ok(path);
            }
            suffix += 1;
        }
    }
}

impl Default for NameResolver {
    fn default() -> Self {
        Self::new()
    }
}
