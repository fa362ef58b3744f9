//! CLI: inspect and round-trip IR documents against the standard registry.
use std::path::{Path, PathBuf};

use anyhow::{Context, bail};
use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use rayon::prelude::*;

use crate::config::FlattenerConfig;
use crate::flattener::{RootFlattener, standard};
use crate::value::Value;
use crate::wire;

// ————————————————————————————————————————————————————————————————————————————
// TYPES
// ————————————————————————————————————————————————————————————————————————————

/// flatten/unflatten tagged IR documents (JSON)
#[derive(Parser, Debug)]
pub struct CommandLineInterface {
    #[command(flatten)]
    settings: FlattenerSettings,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// print the registered helpers in dispatch order
    Helpers,
    /// unflatten each document and print the resulting value
    Inspect(InspectOut),
    /// unflatten then flatten again, emitting the new IR
    Roundtrip(RoundtripOut),
}

#[derive(Args, Debug, Clone)]
struct FlattenerSettings {
    /// directory for dataset spill files (defaults to $FLATTENER_SPILL_DIR or the system temp dir)
    #[arg(long, global = true)]
    spill_dir: Option<PathBuf>,

    /// keep spill files after they are loaded
    #[arg(long, global = true, default_value_t = false)]
    keep_spill_files: bool,
}

#[derive(Args, Debug, Clone)]
struct InputSettings {
    /// input files or glob patterns
    #[arg(long, short, num_args = 1.., required = true)]
    input: Vec<String>,
}

#[derive(clap::Parser, Debug)]
struct InspectOut {
    #[command(flatten)]
    input_settings: InputSettings,
}

#[derive(clap::Parser, Debug)]
struct RoundtripOut {
    #[command(flatten)]
    input_settings: InputSettings,

    /// output directory (stdout if omitted)
    #[arg(short, long)]
    out: Option<PathBuf>,
}

// ————————————————————————————————————————————————————————————————————————————
// IMPLEMENTATION
// ————————————————————————————————————————————————————————————————————————————

impl FlattenerSettings {
    fn config(&self) -> FlattenerConfig {
        let mut config = FlattenerConfig::from_env();
        if let Some(dir) = self.spill_dir.as_ref() {
            config = config.with_spill_dir(dir);
        }
        if self.keep_spill_files {
            config = config.keep_spill_files(true);
        }
        config
    }
}

impl InputSettings {
    /// Run `apply` on every input in parallel, reporting each outcome.
    /// Results come back in input order.
    fn load_process<T, F>(&self, flattener: &RootFlattener, apply: F) -> anyhow::Result<Vec<(PathBuf, T)>>
    where
        T: Send,
        F: Fn(&Path, Value) -> anyhow::Result<T> + Sync,
    {
        let source_paths = resolve_file_path_patterns(&self.input)
            .context("failed to resolve input file paths")?;
        let outcomes: Vec<_> = source_paths
            .par_iter()
            .map(|path| {
                let outcome = load_value(flattener, path).and_then(|value| apply(path, value));
                match outcome.as_ref() {
                    Ok(_) => eprintln!("{} {}", "✓".green(), path.display()),
                    Err(error) => eprintln!("{} {}: {error:#}", "✗".red(), path.display()),
                }
                outcome.map(|x| (path.clone(), x))
            })
            .collect();
        let failed = outcomes.iter().filter(|x| x.is_err()).count();
        if failed > 0 {
            bail!("{failed} of {} inputs failed", outcomes.len());
        }
        outcomes.into_iter().collect()
    }
}

fn load_value(flattener: &RootFlattener, path: &Path) -> anyhow::Result<Value> {
    let source = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let ir = wire::decode(&source)?;
    Ok(flattener.unflatten(&ir)?)
}

impl CommandLineInterface {
    pub fn load() -> Self {
        Self::parse()
    }

    pub fn run(&self) -> anyhow::Result<()> {
        let flattener = standard(&self.settings.config());
        match &self.cmd {
            Command::Helpers => {
                for (ix, name) in flattener.helper_names().into_iter().enumerate() {
                    println!("{ix:>2}  {name}");
                }
                Ok(())
            }
            Command::Inspect(target) => {
                let values = target.input_settings.load_process(&flattener, |_, value| Ok(value))?;
                for (path, value) in values {
                    println!("{}", format!("—— {} ——", path.display()).bold());
                    println!("{value:#?}");
                }
                Ok(())
            }
            Command::Roundtrip(target) => {
                let encoded = target
                    .input_settings
                    .load_process(&flattener, |_, value| reflatten(&flattener, &value))?;
                match target.out.as_ref() {
                    Some(out) => {
                        std::fs::create_dir_all(out)
                            .with_context(|| format!("failed to create {}", out.display()))?;
                        for (path, src) in encoded {
                            let file_name = path.file_name().context("input path has no file name")?;
                            let dest = out.join(file_name);
                            std::fs::write(&dest, src)
                                .with_context(|| format!("failed to write {}", dest.display()))?;
                        }
                    }
                    None => {
                        for (_, src) in encoded {
                            println!("{src}");
                        }
                    }
                }
                Ok(())
            }
        }
    }
}

fn reflatten(flattener: &RootFlattener, value: &Value) -> anyhow::Result<String> {
    let ir = flattener.flatten(value)?;
    Ok(wire::encode_pretty(&ir)?)
}

// ————————————————————————————————————————————————————————————————————————————
// INTERNAL HELPERS
// ————————————————————————————————————————————————————————————————————————————

fn resolve_file_path_patterns<I>(patterns: I) -> anyhow::Result<Vec<PathBuf>>
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    fn has_glob_chars(s: &str) -> bool {
        s.bytes().any(|b| matches!(b, b'*' | b'?' | b'['))
    }

    let mut out = Vec::<PathBuf>::new();

    for raw in patterns {
        let pattern = raw.as_ref();

        if has_glob_chars(pattern) {
            let mut matched_any = false;
            for entry in glob::glob(pattern)? {
                out.push(entry?);
                matched_any = true;
            }
            if !matched_any {
                bail!("glob pattern matched no files: {pattern}");
            }
        } else {
            out.push(PathBuf::from(pattern));
        }
    }

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn literal_and_glob_inputs_resolve() {
        let tmp = tempfile::tempdir().unwrap();
        for name in ["a.json", "b.json", "c.txt"] {
            std::fs::write(tmp.path().join(name), "null").unwrap();
        }
        let pattern = format!("{}/*.json", tmp.path().display());
        let literal = tmp.path().join("c.txt").to_string_lossy().into_owned();
        let paths = resolve_file_path_patterns([pattern, literal]).unwrap();
        assert_eq!(paths.len(), 3);
        assert!(paths[2].ends_with("c.txt"));
    }

    #[test]
    fn empty_glob_is_an_error() {
        let tmp = tempfile::tempdir().unwrap();
        let pattern = format!("{}/*.nothing", tmp.path().display());
        assert!(resolve_file_path_patterns([pattern]).is_err());
    }

    #[test]
    fn cli_flags_feed_the_config() {
        let cli = CommandLineInterface::parse_from([
            "flattener",
            "--spill-dir",
            "/tmp/spill-here",
            "--keep-spill-files",
            "helpers",
        ]);
        let config = cli.settings.config();
        assert_eq!(config.spill_dir, PathBuf::from("/tmp/spill-here"));
        assert!(!config.delete_after_load);
    }
}
