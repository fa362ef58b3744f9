//! Bulk numeric payloads, spilled to a side-channel file.
//!
//! Only a reference travels in the IR:
//! `{filename, deleteFileAfterLoad, index}` plus an optional `name`, which
//! wins over `index` when present.
use crate::error::{FlattenError, Result};
use crate::flattener::{Helper, RootFlattener};
use crate::ir::{Ir, TaggedMap};
use crate::spill::{self, Selector, SpillDir};
use crate::value::Value;

use super::{expect_tagged, not_claimed};

pub const DATASET: &str = "Dataset";
const FILENAME: &str = "filename";
const DELETE_AFTER_LOAD: &str = "deleteFileAfterLoad";
const INDEX: &str = "index";
const NAME: &str = "name";

#[derive(Debug, Clone)]
pub struct DatasetHelper {
    spill: SpillDir,
    delete_after_load: bool,
}

impl DatasetHelper {
    pub fn new(spill: SpillDir, delete_after_load: bool) -> Self {
        Self { spill, delete_after_load }
    }

    fn selector(map: &TaggedMap) -> Result<Selector> {
        match map.get(NAME) {
            Some(Ir::Str(name)) => return Ok(Selector::Name(name.clone())),
            None | Some(Ir::Null) => {}
            Some(other) => return Err(map.wrong_kind(NAME, "string", other)),
        }
        match map.get(INDEX) {
            None | Some(Ir::Null) => Ok(Selector::Index(0)),
            Some(Ir::Int(i)) => usize::try_from(*i)
                .map(Selector::Index)
                .map_err(|_| FlattenError::malformed(DATASET, format!("negative index {i}"))),
            Some(other) => Err(map.wrong_kind(INDEX, "int", other)),
        }
    }
}

impl Helper for DatasetHelper {
    fn type_name(&self) -> &'static str {
        DATASET
    }

    fn can_flatten(&self, value: &Value) -> bool {
        matches!(value, Value::Dataset(_))
    }

    fn flatten(&self, value: &Value, _: &RootFlattener) -> Result<Ir> {
        let Value::Dataset(dataset) = value else {
            return Err(not_claimed(value));
        };
        let path = self.spill.spill(std::slice::from_ref(dataset))?;
        Ok(TaggedMap::new(DATASET)
            .with(FILENAME, Ir::Str(path.to_string_lossy().into_owned()))
            .with(DELETE_AFTER_LOAD, Ir::Bool(self.delete_after_load))
            .with(INDEX, Ir::Int(0))
            .into())
    }

    fn can_unflatten(&self, ir: &Ir) -> bool {
        ir.is_tagged(DATASET)
    }

    fn unflatten(&self, ir: &Ir, _: &RootFlattener) -> Result<Value> {
        let map = expect_tagged(ir, DATASET)?;
        let path = std::path::PathBuf::from(map.require_str(FILENAME)?);
        let delete = match map.get(DELETE_AFTER_LOAD) {
            None | Some(Ir::Null) => false,
            Some(Ir::Bool(b)) => *b,
            Some(other) => return Err(map.wrong_kind(DELETE_AFTER_LOAD, "bool", other)),
        };
        let selector = Self::selector(map)?;
        // the file is consumed even when selection fails
        let loaded = self.spill.load(&path, &selector);
        if delete {
            spill::remove_after_load(&path);
        }
        loaded.map(Value::Dataset)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FlattenerConfig;
    use crate::flattener::standard;
    use crate::spill::BincodeStore;
    use crate::value::Dataset;
    use std::sync::Arc;

    fn flattener_in(dir: &std::path::Path) -> RootFlattener {
        standard(&FlattenerConfig::default().with_spill_dir(dir))
    }

    fn filename(ir: &Ir) -> std::path::PathBuf {
        match ir.as_tagged().and_then(|m| m.get(FILENAME)) {
            Some(Ir::Str(s)) => s.into(),
            other => panic!("no filename in {other:?}"),
        }
    }

    #[test]
    fn million_element_array_travels_as_a_small_reference() {
        let tmp = tempfile::tempdir().unwrap();
        let f = flattener_in(tmp.path());
        let data: Vec<f64> = (0..1_000_000).map(|i| (i as f64).sin()).collect();
        let value = Value::Dataset(Dataset::from_f64("signal", data));

        let ir = f.flatten(&value).unwrap();
        let encoded = serde_json::to_string(&ir).unwrap();
        assert!(encoded.len() < 1024, "reference is {} bytes", encoded.len());

        let path = filename(&ir);
        assert!(path.exists());
        assert_eq!(f.unflatten(&ir).unwrap(), value);
        assert!(!path.exists(), "spill file should be deleted after load");
    }

    #[test]
    fn keep_files_when_configured() {
        let tmp = tempfile::tempdir().unwrap();
        let f = standard(&FlattenerConfig::default().with_spill_dir(tmp.path()).keep_spill_files(true));
        let value = Value::Dataset(Dataset::from_i64("ids", vec![4, 5, 6]));
        let ir = f.flatten(&value).unwrap();
        assert_eq!(ir.as_tagged().unwrap().get(DELETE_AFTER_LOAD), Some(&Ir::Bool(false)));
        assert_eq!(f.unflatten(&ir).unwrap(), value);
        assert!(filename(&ir).exists());
    }

    #[test]
    fn concurrent_spills_use_distinct_files() {
        let tmp = tempfile::tempdir().unwrap();
        let f = flattener_in(tmp.path());
        let paths: Vec<_> = std::thread::scope(|s| {
            let handles: Vec<_> = (0..8)
                .map(|i| {
                    let f = &f;
                    s.spawn(move || filename(&f.flatten(&Value::Dataset(Dataset::from_i32("n", vec![i]))).unwrap()))
                })
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });
        let unique: std::collections::HashSet<_> = paths.iter().collect();
        assert_eq!(unique.len(), paths.len());
    }

    #[test]
    fn name_takes_precedence_over_index() {
        let tmp = tempfile::tempdir().unwrap();
        let spill = SpillDir::new(tmp.path(), Arc::new(BincodeStore));
        let a = Dataset::from_f64("a", vec![1.0]);
        let b = Dataset::from_f64("b", vec![2.0]);
        let path = spill.spill(&[a, b.clone()]).unwrap();

        let ir: Ir = TaggedMap::new(DATASET)
            .with(FILENAME, Ir::Str(path.to_string_lossy().into_owned()))
            .with(INDEX, Ir::Int(0))
            .with(NAME, Ir::Str("b".into()))
            .into();
        let f = flattener_in(tmp.path());
        assert_eq!(f.unflatten(&ir).unwrap(), Value::Dataset(b));
        assert!(path.exists(), "no deleteFileAfterLoad means the file stays");
    }

    #[test]
    fn failed_selection_still_deletes_the_file() {
        let tmp = tempfile::tempdir().unwrap();
        let f = flattener_in(tmp.path());
        let ir = f.flatten(&Value::Dataset(Dataset::from_f64("a", vec![1.0]))).unwrap();
        let path = filename(&ir);
        let Ir::TaggedMap(map) = ir else { panic!("expected tagged map") };
        let ir: Ir = map.with(NAME, Ir::Str("nope".into())).into();
        assert!(matches!(f.unflatten(&ir), Err(FlattenError::MalformedRepresentation { .. })));
        assert!(!path.exists());
    }

    #[test]
    fn missing_filename_is_malformed() {
        let tmp = tempfile::tempdir().unwrap();
        let ir: Ir = TaggedMap::new(DATASET).with(INDEX, Ir::Int(0)).into();
        assert!(matches!(
            flattener_in(tmp.path()).unflatten(&ir),
            Err(FlattenError::MalformedRepresentation { .. })
        ));
    }

    #[test]
    fn negative_index_is_malformed() {
        let tmp = tempfile::tempdir().unwrap();
        let ir: Ir = TaggedMap::new(DATASET)
            .with(FILENAME, Ir::Str("x.dset".into()))
            .with(INDEX, Ir::Int(-1))
            .into();
        assert!(matches!(
            flattener_in(tmp.path()).unflatten(&ir),
            Err(FlattenError::MalformedRepresentation { .. })
        ));
    }

    #[test]
    fn vanished_file_is_spill_io() {
        let tmp = tempfile::tempdir().unwrap();
        let ir: Ir = TaggedMap::new(DATASET)
            .with(FILENAME, Ir::Str(tmp.path().join("gone.dset").to_string_lossy().into_owned()))
            .with(DELETE_AFTER_LOAD, Ir::Bool(true))
            .into();
        assert!(matches!(flattener_in(tmp.path()).unflatten(&ir), Err(FlattenError::SpillIo { .. })));
    }
}
