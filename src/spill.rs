//! Side channel for bulk numeric payloads.
//!
//! Datasets are written to uniquely named files in a spill directory and only
//! a path travels through the IR. The on-disk format belongs to a
//! [`DatasetStore`]; the default one is `bincode` over serde.
use std::fmt;
use std::fs::{self, File};
use std::io::{self, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use once_cell::sync::Lazy;

use crate::error::{FlattenError, Result};
use crate::value::Dataset;

/// Extension of spilled files, recognised by [`BincodeStore`].
pub const SPILL_EXTENSION: &str = "dset";
const SPILL_PREFIX: &str = "flattener-";

/// File-based saver/loader for sets of datasets.
pub trait DatasetStore: fmt::Debug + Send + Sync {
    fn save(&self, path: &Path, datasets: &[Dataset]) -> Result<()>;

    fn load(&self, path: &Path) -> Result<Vec<Dataset>>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct BincodeStore;

fn invalid_data(path: &Path, err: impl fmt::Display) -> FlattenError {
    FlattenError::spill_io(path, io::Error::new(io::ErrorKind::InvalidData, err.to_string()))
}

impl DatasetStore for BincodeStore {
    fn save(&self, path: &Path, datasets: &[Dataset]) -> Result<()> {
        let file = File::create(path).map_err(|e| FlattenError::spill_io(path, e))?;
        let mut writer = BufWriter::new(file);
        bincode::serde::encode_into_std_write(datasets, &mut writer, bincode::config::standard())
            .map_err(|e| invalid_data(path, e))?;
        writer.flush().map_err(|e| FlattenError::spill_io(path, e))
    }

    fn load(&self, path: &Path) -> Result<Vec<Dataset>> {
        let file = File::open(path).map_err(|e| FlattenError::spill_io(path, e))?;
        let mut reader = BufReader::new(file);
        bincode::serde::decode_from_std_read(&mut reader, bincode::config::standard())
            .map_err(|e| invalid_data(path, e))
    }
}

/// Which dataset of a multi-dataset file to load.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selector {
    Index(usize),
    Name(String),
}

#[derive(Debug, Clone)]
pub struct SpillDir {
    dir: PathBuf,
    store: Arc<dyn DatasetStore>,
}

impl SpillDir {
    pub fn new(dir: impl Into<PathBuf>, store: Arc<dyn DatasetStore>) -> Self {
        Self { dir: dir.into(), store }
    }

    /// Write `datasets` to a freshly allocated file and return its path.
    ///
    /// Names come from `tempfile`, so concurrent spills never collide.
    pub fn spill(&self, datasets: &[Dataset]) -> Result<PathBuf> {
        fs::create_dir_all(&self.dir).map_err(|e| FlattenError::spill_io(&self.dir, e))?;
        let file = tempfile::Builder::new()
            .prefix(SPILL_PREFIX)
            .suffix(&format!(".{SPILL_EXTENSION}"))
            .tempfile_in(&self.dir)
            .map_err(|e| FlattenError::spill_io(&self.dir, e))?;
        let (handle, path) = file.keep().map_err(|e| FlattenError::spill_io(&self.dir, e.error))?;
        drop(handle);

        if let Err(err) = self.store.save(&path, datasets) {
            let _ = fs::remove_file(&path);
            return Err(err);
        }
        tracing::debug!(path = %path.display(), count = datasets.len(), "spilled datasets");
        Ok(path)
    }

    pub fn load(&self, path: &Path, selector: &Selector) -> Result<Dataset> {
        let mut datasets = self.store.load(path)?;
        tracing::debug!(path = %path.display(), count = datasets.len(), ?selector, "loaded spill file");
        let position = match selector {
            Selector::Index(i) => (*i < datasets.len()).then_some(*i),
            Selector::Name(name) => datasets.iter().position(|d| d.name.as_deref() == Some(name.as_str())),
        };
        match position {
            Some(i) => Ok(datasets.swap_remove(i)),
            None => Err(FlattenError::malformed(
                "Dataset",
                format!("`{}` has no dataset {selector:?}", path.display()),
            )),
        }
    }
}

// ---------------------------- deferred cleanup ---------------------------- //

static DEFERRED: Lazy<Mutex<Vec<PathBuf>>> = Lazy::new(|| Mutex::new(Vec::new()));

/// Best-effort delete. On failure the path is queued for [`purge_deferred`].
pub fn remove_after_load(path: &Path) {
    match fs::remove_file(path) {
        Ok(()) => tracing::debug!(path = %path.display(), "deleted spill file"),
        Err(err) if err.kind() == io::ErrorKind::NotFound => {}
        Err(err) => {
            tracing::warn!(path = %path.display(), %err, "could not delete spill file; deferring");
            DEFERRED
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .push(path.to_path_buf());
        }
    }
}

/// Paths still waiting for deletion.
pub fn deferred() -> Vec<PathBuf> {
    DEFERRED.lock().unwrap_or_else(PoisonError::into_inner).clone()
}

/// Retry every deferred deletion; returns how many are still pending.
pub fn purge_deferred() -> usize {
    let mut pending = DEFERRED.lock().unwrap_or_else(PoisonError::into_inner);
    pending.retain(|path| match fs::remove_file(path) {
        Ok(()) => false,
        Err(err) if err.kind() == io::ErrorKind::NotFound => false,
        Err(err) => {
            tracing::warn!(path = %path.display(), %err, "spill file still not deletable");
            true
        }
    });
    pending.len()
}

/// Runs [`purge_deferred`] when dropped. Hold one for the life of the process.
#[derive(Debug, Default)]
pub struct CleanupGuard;

impl Drop for CleanupGuard {
    fn drop(&mut self) {
        let left = purge_deferred();
        if left > 0 {
            tracing::warn!(left, "spill files left behind at exit");
        }
    }
}
