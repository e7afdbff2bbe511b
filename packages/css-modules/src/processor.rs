//! Processor
//!
//! The top-level invocation. Each call owns a fresh [`ModuleGraph`], so no
//! state crosses invocations.

use crate::ast::Node;
use crate::config::Options;
use crate::emitter::stringify;
use crate::error::{CssModulesError, Result};
use crate::exports::{self, ExportMap};
use crate::file_system::{AbsoluteFsPath, DefaultResolver, FileLoader, PathResolver};
use crate::loader::ModuleGraph;
use crate::logging::{FacadeLogger, Logger};
use crate::parse_util::SourceLocation;
use crate::token_table::TokenTable;
use serde::Serialize;
use std::sync::Arc;

/// A processed dependency of the root file.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Dependency {
    pub path: AbsoluteFsPath,
    pub css: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProcessResult {
    pub path: AbsoluteFsPath,
    /// The root's CSS, preceded by its dependencies' when they are inlined.
    pub css: String,
    pub exports: ExportMap,
    #[serde(skip)]
    pub tokens: TokenTable,
    /// Dependencies in post-order, excluding the root file.
    pub dependencies: Vec<Dependency>,
    /// Files run through the pipeline, the root included.
    pub processed_count: usize,
}

pub struct Processor<L: FileLoader> {
    options: Options,
    loader: L,
    resolver: Box<dyn PathResolver + Send + Sync>,
    logger: Arc<dyn Logger + Send + Sync>,
}

impl<L: FileLoader> Processor<L> {
    pub fn new(options: Options, loader: L) -> Self {
        Processor {
            options,
            loader,
            resolver: Box::new(DefaultResolver),
            logger: Arc::new(FacadeLogger),
        }
    }

    pub fn with_resolver<R>(mut self, resolver: R) -> Self
    where
        R: PathResolver + Send + Sync + 'static,
    {
        self.resolver = Box::new(resolver);
        self
    }

    /// Replace the default logger, which forwards to the `log` crate.
    pub fn with_logger(mut self, logger: Arc<dyn Logger + Send + Sync>) -> Self {
        self.logger = logger;
        self
    }

    pub fn options(&self) -> &Options {
        &self.options
    }

    pub fn loader(&self) -> &L {
        &self.loader
    }

    /// Process `source` as the content of `path`. Relative paths are taken
    /// from the loader's cwd.
    pub fn process(&self, path: &str, source: &str) -> Result<ProcessResult> {
        let path = AbsoluteFsPath::resolve(&self.loader.cwd(), path);
        let graph = ModuleGraph::new(
            &self.options,
            &self.loader,
            self.resolver.as_ref(),
            self.logger.as_ref(),
        );
        let root = graph.process(path.clone(), source)?;

        let modules: Vec<_> = graph
            .modules_in_order()
            .into_iter()
            .filter(|module| module.path != path)
            .collect();

        let exports = exports::assemble(&root.table, &self.options.locals_convention, &path);
        let mut stylesheet = root.stylesheet.clone();
        if self.options.inline_dependencies {
            let mut nodes: Vec<Node> = modules
                .iter()
                .flat_map(|module| module.stylesheet.nodes.iter().cloned())
                .collect();
            nodes.append(&mut stylesheet.nodes);
            stylesheet.nodes = nodes;
        }
        if self.options.emit_export_rule {
            stylesheet.nodes.insert(0, exports::export_rule(&exports));
        }
        if let Some(get_json) = &self.options.get_json {
            get_json(&path, &exports);
        }

        let dependencies = modules
            .iter()
            .map(|module| Dependency {
                path: module.path.clone(),
                css: module.css(),
            })
            .collect();
        let processed_count = graph.processed_count();
        self.logger.info(&format!(
            "processed {} ({} file{})",
            path,
            processed_count,
            if processed_count == 1 { "" } else { "s" }
        ));

        Ok(ProcessResult {
            css: stringify(&stylesheet),
            exports,
            tokens: root.table.clone(),
            dependencies,
            processed_count,
            path,
        })
    }

    /// Read `path` through the loader and process it.
    pub fn process_file(&self, path: &str) -> Result<ProcessResult> {
        let resolved = AbsoluteFsPath::resolve(&self.loader.cwd(), path);
        let source = self
            .loader
            .read(&resolved)
            .map_err(|e| CssModulesError::UnresolvedPath {
                file: resolved.to_string(),
                specifier: path.to_string(),
                reason: e.message,
                location: SourceLocation::default(),
            })?;
        self.process(resolved.as_str(), &source)
    }
}
