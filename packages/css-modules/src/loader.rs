//! Dependency Loader
//!
//! [`ModuleGraph`] is the per-invocation file cache. Each resolved path is
//! processed at most once: the first request registers the path as in flight
//! and runs the whole pipeline on it, later requests get the cached module,
//! and requests that arrive through an import cycle see the in-flight state.

use crate::error::{CssModulesError, Result};
use crate::file_system::{AbsoluteFsPath, FileLoader, PathResolver};
use crate::config::Options;
use crate::logging::Logger;
use crate::module::{compile_module, CompiledModule, ModuleContext, ModuleState};
use crate::parse_util::SourceLocation;
use crate::scoped_name::ScopedNameGenerator;
use crate::token_table::TokenEntry;
use indexmap::IndexMap;
use std::cell::{Cell, RefCell};
use std::rc::Rc;

/// Cache slot of one resolved path.
#[derive(Debug)]
pub enum ModuleSlot {
    InFlight(Rc<RefCell<ModuleState>>),
    Done(Rc<CompiledModule>),
}

/// What [`ModuleGraph::load`] hands back.
#[derive(Debug, Clone)]
pub enum ModuleHandle {
    /// The module is still being compiled further up the stack.
    InFlight(Rc<RefCell<ModuleState>>),
    Ready(Rc<CompiledModule>),
}

/// Result of looking a name up in a module handle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lookup {
    Found(TokenEntry),
    /// The name exists but its compositions or aliases are not resolved yet.
    Unsettled,
    Missing,
}

impl ModuleHandle {
    pub fn path(&self) -> AbsoluteFsPath {
        match self {
            ModuleHandle::InFlight(state) => state.borrow().path.clone(),
            ModuleHandle::Ready(module) => module.path.clone(),
        }
    }

    pub fn lookup(&self, name: &str) -> Lookup {
        match self {
            ModuleHandle::Ready(module) => match module.table.get(name) {
                Some(entry) => Lookup::Found(entry.clone()),
                None => Lookup::Missing,
            },
            ModuleHandle::InFlight(state) => {
                let state = state.borrow();
                if !state.is_settled(name) {
                    return Lookup::Unsettled;
                }
                match state.table.get(name) {
                    Some(entry) => Lookup::Found(entry.clone()),
                    None => Lookup::Missing,
                }
            }
        }
    }
}

pub struct ModuleGraph<'a> {
    options: &'a Options,
    generator: ScopedNameGenerator,
    loader: &'a dyn FileLoader,
    resolver: &'a dyn PathResolver,
    logger: &'a dyn Logger,
    cwd: AbsoluteFsPath,
    modules: RefCell<IndexMap<AbsoluteFsPath, ModuleSlot>>,
    /// Finished modules, dependencies first.
    order: RefCell<Vec<Rc<CompiledModule>>>,
    processed: Cell<usize>,
    /// `(file, name)` pairs whose compositions are being resolved, across files.
    resolving: RefCell<Vec<(AbsoluteFsPath, String)>>,
}

impl<'a> ModuleGraph<'a> {
    pub fn new(
        options: &'a Options,
        loader: &'a dyn FileLoader,
        resolver: &'a dyn PathResolver,
        logger: &'a dyn Logger,
    ) -> Self {
        ModuleGraph {
            options,
            generator: options.name_generator(),
            loader,
            resolver,
            logger,
            cwd: loader.cwd(),
            modules: RefCell::new(IndexMap::new()),
            order: RefCell::new(Vec::new()),
            processed: Cell::new(0),
            resolving: RefCell::new(Vec::new()),
        }
    }

    pub fn options(&self) -> &Options {
        self.options
    }

    pub fn generator(&self) -> &ScopedNameGenerator {
        &self.generator
    }

    pub fn logger(&self) -> &dyn Logger {
        self.logger
    }

    /// Resolve `specifier` from `from` and return its module, processing it
    /// on first request.
    pub fn load(
        &self,
        specifier: &str,
        from: &AbsoluteFsPath,
        location: SourceLocation,
    ) -> Result<ModuleHandle> {
        let path = self
            .resolver
            .resolve(specifier, from, self.loader)
            .map_err(|reason| CssModulesError::UnresolvedPath {
                file: from.to_string(),
                specifier: specifier.to_string(),
                reason,
                location,
            })?;

        let cached = self.modules.borrow().get(&path).map(|slot| match slot {
            ModuleSlot::InFlight(state) => ModuleHandle::InFlight(Rc::clone(state)),
            ModuleSlot::Done(module) => ModuleHandle::Ready(Rc::clone(module)),
        });
        if let Some(handle) = cached {
            self.logger.debug(&format!("cache hit for {} (from {})", path, from));
            return Ok(handle);
        }

        self.logger.debug(&format!("resolved \"{}\" from {} to {}", specifier, from, path));
        let source = self
            .loader
            .read(&path)
            .map_err(|e| CssModulesError::UnresolvedPath {
                file: from.to_string(),
                specifier: specifier.to_string(),
                reason: e.message,
                location,
            })?;
        Ok(ModuleHandle::Ready(self.process(path, &source)?))
    }

    /// Run the pipeline on `source` and cache the result under `path`.
    pub fn process(&self, path: AbsoluteFsPath, source: &str) -> Result<Rc<CompiledModule>> {
        let state = Rc::new(RefCell::new(ModuleState::new(path.clone())));
        self.modules
            .borrow_mut()
            .insert(path.clone(), ModuleSlot::InFlight(Rc::clone(&state)));
        self.processed.set(self.processed.get() + 1);
        self.logger.debug(&format!("processing {}", path));

        let ctx = ModuleContext {
            graph: self,
            hash_path: self.options.hash_path(&path, &self.cwd),
            mode: self.options.file_mode(&path),
            path: path.clone(),
            source,
            state: Rc::clone(&state),
        };
        let stylesheet = compile_module(&ctx)?;

        let module = Rc::new(CompiledModule {
            path: path.clone(),
            table: state.borrow().table.clone(),
            stylesheet,
        });
        self.modules
            .borrow_mut()
            .insert(path, ModuleSlot::Done(Rc::clone(&module)));
        self.order.borrow_mut().push(Rc::clone(&module));
        Ok(module)
    }

    /// Mark `name` of `path` as being resolved. When the pair is already being
    /// resolved, returns the chain from its first visit back to itself.
    pub fn enter(
        &self,
        path: &AbsoluteFsPath,
        name: &str,
    ) -> std::result::Result<(), Vec<(AbsoluteFsPath, String)>> {
        let mut resolving = self.resolving.borrow_mut();
        if let Some(start) = resolving.iter().position(|(p, n)| p == path && n == name) {
            let mut chain = resolving[start..].to_vec();
            chain.push((path.clone(), name.to_string()));
            return Err(chain);
        }
        resolving.push((path.clone(), name.to_string()));
        Ok(())
    }

    /// Pop the pair pushed by the matching [`enter`](Self::enter).
    pub fn leave(&self) {
        self.resolving.borrow_mut().pop();
    }

    /// Number of files run through the pipeline.
    pub fn processed_count(&self) -> usize {
        self.processed.get()
    }

    /// Finished modules in post-order: every module after its dependencies.
    pub fn modules_in_order(&self) -> Vec<Rc<CompiledModule>> {
        self.order.borrow().clone()
    }

    pub fn is_cached(&self, path: &AbsoluteFsPath) -> bool {
        self.modules.borrow().contains_key(path)
    }
}
