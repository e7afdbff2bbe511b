//! Batch
//!
//! Expands input patterns, processes every entry in parallel and writes
//! `x.css` / `x.css.json` pairs. Each entry is its own invocation, so entries
//! share no cache.

use anyhow::{bail, Context};
use css_modules::{
    AbsoluteFsPath, DiskFileLoader, ExportMap, Logger, Options, ProcessResult, Processor,
};
use indexmap::{IndexMap, IndexSet};
use rayon::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[derive(Debug, Clone, Default)]
pub struct BatchOptions {
    /// Output directory. Without one only the JSON files are written, next
    /// to their inputs.
    pub out_dir: Option<PathBuf>,
}

#[derive(Debug)]
pub struct EntryOutput {
    pub input: PathBuf,
    pub css_path: Option<PathBuf>,
    pub json_path: PathBuf,
    pub result: ProcessResult,
}

fn is_glob(pattern: &str) -> bool {
    pattern.contains(['*', '?', '['])
}

/// Expand files and glob patterns into a deduplicated list of inputs.
pub fn expand_inputs(patterns: &[String], cwd: &Path) -> anyhow::Result<Vec<PathBuf>> {
    let mut inputs = IndexSet::new();
    for pattern in patterns {
        let full = cwd.join(pattern);
        if !is_glob(pattern) {
            if !full.is_file() {
                bail!("input file not found: {}", full.display());
            }
            inputs.insert(full);
            continue;
        }

        let pattern_str = full.to_string_lossy();
        let paths = glob::glob(&pattern_str)
            .with_context(|| format!("invalid glob pattern '{}'", pattern))?;
        for entry in paths {
            match entry {
                Ok(path) if path.is_file() => {
                    inputs.insert(path);
                }
                Ok(_) => {}
                Err(e) => eprintln!("Warning: cannot read {}: {}", e.path().display(), e),
            }
        }
    }
    if inputs.is_empty() {
        bail!("no input files matched");
    }
    Ok(inputs.into_iter().collect())
}

/// Output paths for `input`. Inside `out_dir` the input's path relative to
/// `cwd` is kept.
pub fn output_paths(
    input: &Path,
    cwd: &Path,
    out_dir: Option<&Path>,
) -> (Option<PathBuf>, PathBuf) {
    let json_path = |css: &Path| {
        let mut name = css.as_os_str().to_owned();
        name.push(".json");
        PathBuf::from(name)
    };
    match out_dir {
        Some(dir) => {
            let relative = input
                .strip_prefix(cwd)
                .map(Path::to_path_buf)
                .unwrap_or_else(|_| input.file_name().map(PathBuf::from).unwrap_or_default());
            let css_path = cwd.join(dir).join(relative);
            let json = json_path(&css_path);
            (Some(css_path), json)
        }
        None => (None, json_path(input)),
    }
}

fn process_entry(
    input: &Path,
    cwd: &Path,
    options: &Options,
    logger: &Arc<dyn Logger + Send + Sync>,
) -> anyhow::Result<ProcessResult> {
    let loader = DiskFileLoader::new(AbsoluteFsPath::from_path(cwd));
    let processor = Processor::new(options.clone(), loader).with_logger(Arc::clone(logger));
    let result = processor
        .process_file(&input.to_string_lossy())
        .with_context(|| format!("failed to process {}", input.display()))?;
    Ok(result)
}

/// Process `inputs` in parallel. Fails on the first entry that fails; nothing
/// is written in that case.
pub fn run(
    inputs: &[PathBuf],
    cwd: &Path,
    options: &Options,
    batch: &BatchOptions,
    logger: Arc<dyn Logger + Send + Sync>,
) -> anyhow::Result<Vec<EntryOutput>> {
    let results = inputs
        .par_iter()
        .map(|input| process_entry(input, cwd, options, &logger))
        .collect::<anyhow::Result<Vec<_>>>()?;

    let outputs: Vec<EntryOutput> = inputs
        .iter()
        .zip(results)
        .map(|(input, result)| {
            let (css_path, json_path) = output_paths(input, cwd, batch.out_dir.as_deref());
            EntryOutput {
                input: input.clone(),
                css_path,
                json_path,
                result,
            }
        })
        .collect();

    for output in &outputs {
        write_output(output)?;
        logger.info(&format!("wrote {}", output.json_path.display()));
    }
    Ok(outputs)
}

fn write_output(output: &EntryOutput) -> anyhow::Result<()> {
    if let Some(css_path) = &output.css_path {
        if let Some(parent) = css_path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
        fs::write(css_path, &output.result.css)
            .with_context(|| format!("failed to write {}", css_path.display()))?;
    }
    let json = serde_json::to_string_pretty(&output.result.exports)?;
    fs::write(&output.json_path, json)
        .with_context(|| format!("failed to write {}", output.json_path.display()))?;
    Ok(())
}

/// `{ input path: exports }` for `--json`.
pub fn exports_by_input(outputs: &[EntryOutput]) -> IndexMap<String, ExportMap> {
    outputs
        .iter()
        .map(|output| {
            (
                output.input.to_string_lossy().into_owned(),
                output.result.exports.clone(),
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use css_modules::{NamePattern, NullLogger};

    fn scratch(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("css-modules-cli-{}", name));
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn options() -> Options {
        Options {
            generate_scoped_name: NamePattern::Literal("[name]__[local]".to_string()),
            inline_dependencies: true,
            ..Options::default()
        }
    }

    #[test]
    fn should_detect_glob_patterns() {
        assert!(is_glob("src/**/*.css"));
        assert!(is_glob("a?.css"));
        assert!(!is_glob("src/a.css"));
    }

    #[test]
    fn should_mirror_inputs_inside_the_out_dir() {
        let (css, json) = output_paths(
            Path::new("/work/src/a.css"),
            Path::new("/work"),
            Some(Path::new("dist")),
        );
        assert_eq!(css, Some(PathBuf::from("/work/dist/src/a.css")));
        assert_eq!(json, PathBuf::from("/work/dist/src/a.css.json"));

        let (css, json) = output_paths(Path::new("/work/src/a.css"), Path::new("/work"), None);
        assert_eq!(css, None);
        assert_eq!(json, PathBuf::from("/work/src/a.css.json"));
    }

    #[test]
    fn should_expand_globs_without_duplicates() {
        let dir = scratch("expand");
        fs::write(dir.join("a.css"), ".a {}").unwrap();
        fs::write(dir.join("b.css"), ".b {}").unwrap();
        fs::write(dir.join("notes.txt"), "").unwrap();

        let inputs =
            expand_inputs(&["*.css".to_string(), "a.css".to_string()], &dir).unwrap();
        assert_eq!(inputs, vec![dir.join("a.css"), dir.join("b.css")]);
        assert!(expand_inputs(&["*.scss".to_string()], &dir).is_err());
    }

    #[test]
    fn should_write_css_and_json_for_each_entry() {
        let dir = scratch("write");
        fs::write(
            dir.join("a.css"),
            r#".a { composes: shared from "./shared.css"; color: red }"#,
        )
        .unwrap();
        fs::write(dir.join("shared.css"), ".shared { margin: 0 }").unwrap();

        let batch = BatchOptions {
            out_dir: Some(PathBuf::from("dist")),
        };
        let outputs = run(
            &[dir.join("a.css")],
            &dir,
            &options(),
            &batch,
            Arc::new(NullLogger),
        )
        .unwrap();

        assert_eq!(outputs.len(), 1);
        let css = fs::read_to_string(dir.join("dist/a.css")).unwrap();
        assert_eq!(css, ".shared__shared{margin:0}.a__a{color:red}");
        let json: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(dir.join("dist/a.css.json")).unwrap())
                .unwrap();
        assert_eq!(json["a"], "a__a shared__shared");
    }

    #[test]
    fn should_fail_the_batch_when_an_entry_fails() {
        let dir = scratch("fail");
        fs::write(dir.join("a.css"), ".a { composes: nope }").unwrap();
        let result = run(
            &[dir.join("a.css")],
            &dir,
            &options(),
            &BatchOptions::default(),
            Arc::new(NullLogger),
        );
        assert!(result.is_err());
        assert!(!dir.join("a.css.json").exists());
    }
}
