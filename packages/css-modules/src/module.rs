//! Per-file module state and the compile pipeline.
//!
//! A file is compiled in three passes over its AST:
//!
//! 1. [`icss::collect`] scopes selectors and records imports, exports,
//!    compositions, values and keyframes.
//! 2. [`composition::resolve`] loads dependencies and settles every pending
//!    name.
//! 3. [`values::substitute`] replaces value symbols and keyframes names.
//!
//! With `remove_empty_rules` set, rules left without declarations are then
//! dropped.
//!
//! While a file is being compiled its [`ModuleState`] is shared with the
//! [`ModuleGraph`] as an in-flight entry, so import cycles observe the partial
//! table instead of re-entering the pipeline.

use crate::ast::{remove_empty_rules, Stylesheet};
use crate::emitter::stringify;
use crate::error::Result;
use crate::file_system::AbsoluteFsPath;
use crate::loader::ModuleGraph;
use crate::parse_util::SourceLocation;
use crate::parser::parse_stylesheet;
use crate::selector::Mode;
use crate::token_table::TokenTable;
use crate::{composition, icss, values};
use indexmap::{IndexMap, IndexSet};
use smallvec::SmallVec;
use std::cell::RefCell;
use std::rc::Rc;

/// `alias` in the importing file stands for `imported` in `specifier`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportReference {
    pub specifier: String,
    pub imported: String,
    pub alias: String,
    pub location: SourceLocation,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ComposeSource {
    Local,
    Global,
    File(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComposeRef {
    pub name: String,
    pub source: ComposeSource,
}

/// One `composes` declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Composition {
    pub refs: SmallVec<[ComposeRef; 4]>,
    pub location: SourceLocation,
}

/// A literal entry whose value may still reference unresolved symbols.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LiteralDef {
    pub raw: String,
    /// `@value` definitions are also substitution symbols; `:export` entries are not.
    pub is_value: bool,
    pub location: SourceLocation,
}

#[derive(Debug)]
pub struct ModuleState {
    pub path: AbsoluteFsPath,
    pub table: TokenTable,
    /// Deferred `composes`, keyed by owning local class.
    pub compositions: IndexMap<String, Vec<Composition>>,
    /// Names whose entries are not settled yet.
    pub pending: IndexSet<String>,
    pub imports: Vec<ImportReference>,
    /// Aliases introduced by `@value ... from`, exported once resolved.
    pub value_aliases: IndexSet<String>,
    pub literals: IndexMap<String, LiteralDef>,
    /// Substitutions applied to declaration values and at-rule params.
    pub symbols: IndexMap<String, String>,
    /// `:import` aliases of classes, usable in `composes`.
    pub class_aliases: IndexMap<String, Vec<String>>,
    /// Local keyframes name to scoped name.
    pub keyframes: IndexMap<String, String>,
}

impl ModuleState {
    pub fn new(path: AbsoluteFsPath) -> Self {
        ModuleState {
            path,
            table: TokenTable::new(),
            compositions: IndexMap::new(),
            pending: IndexSet::new(),
            imports: Vec::new(),
            value_aliases: IndexSet::new(),
            literals: IndexMap::new(),
            symbols: IndexMap::new(),
            class_aliases: IndexMap::new(),
            keyframes: IndexMap::new(),
        }
    }

    pub fn is_settled(&self, name: &str) -> bool {
        !self.pending.contains(name)
    }

    pub fn import_of(&self, alias: &str) -> Option<&ImportReference> {
        self.imports.iter().find(|import| import.alias == alias)
    }
}

/// Everything a pass needs to know about the file it works on.
pub struct ModuleContext<'a> {
    pub graph: &'a ModuleGraph<'a>,
    pub path: AbsoluteFsPath,
    /// Path fed to the scoped-name generator.
    pub hash_path: String,
    pub source: &'a str,
    pub mode: Mode,
    pub state: Rc<RefCell<ModuleState>>,
}

impl<'a> ModuleContext<'a> {
    pub fn file(&self) -> String {
        self.path.to_string()
    }
}

/// A fully processed file.
#[derive(Debug, Clone)]
pub struct CompiledModule {
    pub path: AbsoluteFsPath,
    pub table: TokenTable,
    pub stylesheet: Stylesheet,
}

impl CompiledModule {
    pub fn css(&self) -> String {
        stringify(&self.stylesheet)
    }
}

/// Run the three passes over `ctx.source`.
pub fn compile_module(ctx: &ModuleContext<'_>) -> Result<Stylesheet> {
    let mut sheet = parse_stylesheet(ctx.source);
    icss::collect(ctx, &mut sheet)?;
    composition::resolve(ctx)?;
    values::substitute(ctx, &mut sheet);
    if ctx.graph.options().remove_empty_rules {
        remove_empty_rules(&mut sheet.nodes);
    }
    Ok(sheet)
}
