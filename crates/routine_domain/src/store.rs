use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use parking_lot::{Mutex, RwLock};
use routine_core::RoutineId;

use crate::routine::Routine;

/// Persistence seam for routines.
///
/// `commit` replaces the whole record in one step, so a reader never sees a
/// routine whose schedule fields come from two different saves.
pub trait RoutineStore: Send + Sync {
    fn load_all(&self) -> Result<Vec<Routine>>;
    fn commit(&self, routine: &Routine) -> Result<()>;
    /// Returns whether a record was removed.
    fn remove(&self, id: &RoutineId) -> Result<bool>;
}

#[derive(Debug, Default)]
pub struct MemoryRoutineStore {
    routines: RwLock<BTreeMap<RoutineId, Routine>>,
}

impl MemoryRoutineStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_routines(routines: impl IntoIterator<Item = Routine>) -> Self {
        let store = Self::new();
        {
            let mut guard = store.routines.write();
            for routine in routines {
                guard.insert(routine.id.clone(), routine);
            }
        }
        store
    }
}

impl RoutineStore for MemoryRoutineStore {
    fn load_all(&self) -> Result<Vec<Routine>> {
        Ok(self.routines.read().values().cloned().collect())
    }

    fn commit(&self, routine: &Routine) -> Result<()> {
        self.routines
            .write()
            .insert(routine.id.clone(), routine.clone());
        Ok(())
    }

    fn remove(&self, id: &RoutineId) -> Result<bool> {
        Ok(self.routines.write().remove(id).is_some())
    }
}

/// Routines kept as a JSON array in a single file.
///
/// Writes go to a sibling temp file which is then renamed over the target.
#[derive(Debug)]
pub struct JsonRoutineStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl JsonRoutineStore {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_map(&self) -> Result<BTreeMap<RoutineId, Routine>> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(BTreeMap::new()),
            Err(err) => {
                return Err(err)
                    .with_context(|| format!("reading routines from {}", self.path.display()))
            }
        };
        if raw.trim().is_empty() {
            return Ok(BTreeMap::new());
        }
        let routines: Vec<Routine> = serde_json::from_str(&raw)
            .with_context(|| format!("parsing routines in {}", self.path.display()))?;
        Ok(routines
            .into_iter()
            .map(|routine| (routine.id.clone(), routine))
            .collect())
    }

    fn write_map(&self, routines: &BTreeMap<RoutineId, Routine>) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)
                    .with_context(|| format!("creating {}", parent.display()))?;
            }
        }
        let records: Vec<&Routine> = routines.values().collect();
        let payload = serde_json::to_string_pretty(&records)?;
        let staging = self.staging_path();
        fs::write(&staging, payload)
            .with_context(|| format!("writing {}", staging.display()))?;
        fs::rename(&staging, &self.path)
            .with_context(|| format!("replacing {}", self.path.display()))?;
        Ok(())
    }

    fn staging_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|name| name.to_os_string())
            .unwrap_or_else(|| "routines.json".into());
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

impl RoutineStore for JsonRoutineStore {
    fn load_all(&self) -> Result<Vec<Routine>> {
        Ok(self.read_map()?.into_values().collect())
    }

    fn commit(&self, routine: &Routine) -> Result<()> {
        let _guard = self.write_lock.lock();
        let mut routines = self.read_map()?;
        routines.insert(routine.id.clone(), routine.clone());
        self.write_map(&routines)
    }

    fn remove(&self, id: &RoutineId) -> Result<bool> {
        let _guard = self.write_lock.lock();
        let mut routines = self.read_map()?;
        if routines.remove(id).is_none() {
            return Ok(false);
        }
        self.write_map(&routines)?;
        Ok(true)
    }
}
