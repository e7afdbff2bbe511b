//! Test Utils
//!
//! Shared helpers for the integration specs.

#![allow(dead_code)]

use css_modules::{
    CssModulesError, InMemoryFileLoader, NamePattern, Options, ProcessResult, Processor,
};

/// Scoped names are the local name plus `_x`.
pub fn suffix_options() -> Options {
    Options {
        generate_scoped_name: NamePattern::custom(|local, _, _| format!("{}_x", local)),
        ..Options::default()
    }
}

/// Scoped names are `<file stem>__<local>`.
pub fn stem_options() -> Options {
    Options {
        generate_scoped_name: NamePattern::Literal("[name]__[local]".to_string()),
        ..Options::default()
    }
}

pub fn loader(files: &[(&str, &str)]) -> InMemoryFileLoader {
    let mut loader = InMemoryFileLoader::new();
    for (path, content) in files {
        loader.add(path, content);
    }
    loader
}

pub fn processor(options: Options, files: &[(&str, &str)]) -> Processor<InMemoryFileLoader> {
    Processor::new(options, loader(files))
}

/// Process `entry` out of `files`.
pub fn run(
    options: Options,
    files: &[(&str, &str)],
    entry: &str,
) -> Result<ProcessResult, CssModulesError> {
    processor(options, files).process_file(entry)
}

/// Process `css` as `/a.css`.
pub fn run_single(options: Options, css: &str) -> Result<ProcessResult, CssModulesError> {
    run(options, &[("/a.css", css)], "/a.css")
}

pub fn export_pairs(result: &ProcessResult) -> Vec<(String, String)> {
    result
        .exports
        .iter()
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect()
}

pub fn pairs(expected: &[(&str, &str)]) -> Vec<(String, String)> {
    expected
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}
