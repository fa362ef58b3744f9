//! Runtime configuration of the codec.
use std::path::PathBuf;

/// Directory that receives spilled dataset files.
pub const SPILL_DIR_ENV: &str = "FLATTENER_SPILL_DIR";
/// When truthy, spilled files are left on disk after loading.
pub const KEEP_SPILL_FILES_ENV: &str = "FLATTENER_KEEP_SPILL_FILES";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlattenerConfig {
    pub spill_dir: PathBuf,
    /// Value written into every spilled reference's `deleteFileAfterLoad`.
    pub delete_after_load: bool,
}

impl Default for FlattenerConfig {
    fn default() -> Self {
        Self {
            spill_dir: std::env::temp_dir(),
            delete_after_load: true,
        }
    }
}

impl FlattenerConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`FlattenerConfig::from_env`] over an arbitrary variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();
        if let Some(dir) = lookup(SPILL_DIR_ENV).filter(|d| !d.trim().is_empty()) {
            config.spill_dir = PathBuf::from(dir);
        }
        if let Some(keep) = lookup(KEEP_SPILL_FILES_ENV) {
            config.delete_after_load = !is_truthy(&keep);
        }
        config
    }

    pub fn with_spill_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.spill_dir = dir.into();
        self
    }

    pub fn keep_spill_files(mut self, keep: bool) -> Self {
        self.delete_after_load = !keep;
        self
    }
}

fn is_truthy(s: &str) -> bool {
    matches!(s.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> =
            vars.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn defaults_without_variables() {
        assert_eq!(FlattenerConfig::from_lookup(lookup(&[])), FlattenerConfig::default());
    }

    #[test]
    fn variables_override_defaults() {
        let config = FlattenerConfig::from_lookup(lookup(&[
            (SPILL_DIR_ENV, "/data/spill"),
            (KEEP_SPILL_FILES_ENV, "True"),
        ]));
        assert_eq!(config.spill_dir, PathBuf::from("/data/spill"));
        assert!(!config.delete_after_load);
    }

    #[test]
    fn blank_directory_is_ignored() {
        let config = FlattenerConfig::from_lookup(lookup(&[(SPILL_DIR_ENV, "  "), (KEEP_SPILL_FILES_ENV, "0")]));
        assert_eq!(config.spill_dir, std::env::temp_dir());
        assert!(config.delete_after_load);
    }
}
