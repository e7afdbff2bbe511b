//! Composition Resolver
//!
//! Second pass over a file. Imports are loaded first so that literals using
//! their aliases can settle, then every deferred `composes` is resolved
//! depth-first and unioned into its owner's entry.
//!
//! A dependency reached through an import cycle is still in flight. Its
//! unsettled names are settled on demand in that file's own scope, and the
//! graph-wide `(file, name)` stack of the [`ModuleGraph`] reports a cycle
//! only when a pair is re-entered.
//!
//! No `RefCell` borrow of a module state is held across a call into the
//! graph: a cyclic import reads the same state through its in-flight handle.

use crate::error::{CssModulesError, Result};
use crate::file_system::AbsoluteFsPath;
use crate::loader::{Lookup, ModuleGraph, ModuleHandle};
use crate::module::{ComposeSource, Composition, ModuleContext, ModuleState};
use crate::parse_util::SourceLocation;
use crate::token_table::TokenEntry;
use crate::values;
use std::cell::RefCell;
use std::collections::HashSet;
use std::rc::Rc;

/// The file a resolution step works in.
struct Scope<'c> {
    graph: &'c ModuleGraph<'c>,
    path: AbsoluteFsPath,
    state: Rc<RefCell<ModuleState>>,
}

impl<'c> Scope<'c> {
    fn of(ctx: &ModuleContext<'c>) -> Self {
        Scope {
            graph: ctx.graph,
            path: ctx.path.clone(),
            state: Rc::clone(&ctx.state),
        }
    }

    fn file(&self) -> String {
        self.path.to_string()
    }
}

/// Run the second pass.
pub fn resolve(ctx: &ModuleContext<'_>) -> Result<()> {
    let scope = Scope::of(ctx);
    resolve_imports(&scope)?;
    values::settle_literals(&mut scope.state.borrow_mut(), &HashSet::new());

    let owners: Vec<String> = scope.state.borrow().compositions.keys().cloned().collect();
    for owner in owners {
        resolve_owner(&scope, &owner)?;
    }
    Ok(())
}

fn resolve_imports(scope: &Scope<'_>) -> Result<()> {
    let imports = scope.state.borrow().imports.clone();
    for import in imports {
        let handle = scope.graph.load(&import.specifier, &scope.path, import.location)?;
        let entry = lookup(
            scope,
            &handle,
            &import.imported,
            &import.alias,
            &import.specifier,
            import.location,
        )?;
        let names = entry.names();
        let value = names.join(" ");

        let mut state = scope.state.borrow_mut();
        state.symbols.insert(import.alias.clone(), value.clone());
        if state.value_aliases.contains(&import.alias) {
            state.table.declare_literal(&import.alias, value);
            state.pending.shift_remove(&import.alias);
        } else if !entry.is_literal() {
            state.class_aliases.insert(import.alias.clone(), names);
        }
    }
    Ok(())
}

/// Resolve the compositions of `owner`, resolving its dependencies first.
fn resolve_owner(scope: &Scope<'_>, owner: &str) -> Result<()> {
    let compositions: Vec<Composition> = {
        let state = scope.state.borrow();
        if state.is_settled(owner) {
            return Ok(());
        }
        state.compositions.get(owner).cloned().unwrap_or_default()
    };

    if let Err(chain) = scope.graph.enter(&scope.path, owner) {
        return Err(CssModulesError::CyclicComposition {
            file: scope.file(),
            name: owner.to_string(),
            chain: format_chain(&chain),
            location: compositions
                .first()
                .map(|c| c.location)
                .unwrap_or_default(),
        });
    }
    let composed = compose_all(scope, owner, &compositions);
    scope.graph.leave();
    composed?;

    scope.state.borrow_mut().pending.shift_remove(owner);
    Ok(())
}

fn compose_all(scope: &Scope<'_>, owner: &str, compositions: &[Composition]) -> Result<()> {
    for composition in compositions {
        let mut primaries = Vec::new();
        let mut transitive = Vec::new();
        let mut external = false;

        for reference in &composition.refs {
            let names = match &reference.source {
                ComposeSource::Local => {
                    let (names, imported) =
                        local_names(scope, &reference.name, composition.location)?;
                    external |= imported;
                    names
                }
                ComposeSource::Global => {
                    external = true;
                    vec![reference.name.clone()]
                }
                ComposeSource::File(specifier) => {
                    external = true;
                    let handle = scope.graph.load(specifier, &scope.path, composition.location)?;
                    let entry = lookup(
                        scope,
                        &handle,
                        &reference.name,
                        owner,
                        specifier,
                        composition.location,
                    )?;
                    if entry.is_literal() {
                        return Err(CssModulesError::ComposesLiteral {
                            file: scope.file(),
                            name: reference.name.clone(),
                            location: composition.location,
                        });
                    }
                    entry.names()
                }
            };
            let mut names = names.into_iter();
            primaries.extend(names.next());
            transitive.extend(names);
        }

        scope
            .state
            .borrow_mut()
            .table
            .compose(owner, primaries.into_iter().chain(transitive), external);
    }
    Ok(())
}

/// Names a local `composes` reference stands for, and whether they come from
/// another file through an `:import` alias.
fn local_names(
    scope: &Scope<'_>,
    name: &str,
    location: SourceLocation,
) -> Result<(Vec<String>, bool)> {
    resolve_owner(scope, name)?;
    let state = scope.state.borrow();
    let literal = || CssModulesError::ComposesLiteral {
        file: scope.file(),
        name: name.to_string(),
        location,
    };

    if let Some(entry) = state.table.get(name) {
        if entry.is_literal() {
            return Err(literal());
        }
        return Ok((entry.names(), false));
    }
    if let Some(names) = state.class_aliases.get(name) {
        return Ok((names.clone(), true));
    }
    if state.symbols.contains_key(name) {
        return Err(literal());
    }
    if let Some(import) = state.import_of(name) {
        // Requested by a dependency before this file's imports settled.
        return Err(CssModulesError::CyclicComposition {
            file: scope.file(),
            name: name.to_string(),
            chain: vec![
                format!("{}:{}", scope.path, name),
                format!("{}:{}", import.specifier, import.imported),
                format!("{}:{}", scope.path, name),
            ],
            location,
        });
    }
    Err(CssModulesError::MissingExport {
        file: scope.file(),
        name: name.to_string(),
        source_path: scope.file(),
        location,
    })
}

/// Look `name` up in a loaded module, on behalf of `requester` in this file.
fn lookup(
    scope: &Scope<'_>,
    handle: &ModuleHandle,
    name: &str,
    requester: &str,
    specifier: &str,
    location: SourceLocation,
) -> Result<TokenEntry> {
    let mut found = handle.lookup(name);
    if matches!(found, Lookup::Unsettled) {
        if let ModuleHandle::InFlight(state) = handle {
            settle_in_flight(scope.graph, handle.path(), state, name)?;
            found = handle.lookup(name);
        }
    }

    match found {
        Lookup::Found(entry) => Ok(entry),
        Lookup::Unsettled => Err(CssModulesError::CyclicComposition {
            file: scope.file(),
            name: requester.to_string(),
            chain: vec![
                format!("{}:{}", scope.path, requester),
                format!("{}:{}", handle.path(), name),
                format!("{}:{}", scope.path, requester),
            ],
            location,
        }),
        Lookup::Missing => Err(CssModulesError::MissingExport {
            file: scope.file(),
            name: name.to_string(),
            source_path: specifier.to_string(),
            location,
        }),
    }
}

/// Settle `name` of a module that is still in flight: resolve it when it owns
/// compositions, otherwise settle the literals that no longer wait on an
/// import.
fn settle_in_flight(
    graph: &ModuleGraph<'_>,
    path: AbsoluteFsPath,
    state: &Rc<RefCell<ModuleState>>,
    name: &str,
) -> Result<()> {
    let owns = state.borrow().compositions.contains_key(name);
    if owns {
        let target = Scope {
            graph,
            path,
            state: Rc::clone(state),
        };
        return resolve_owner(&target, name);
    }

    let mut state = state.borrow_mut();
    let blocked: HashSet<String> = state
        .imports
        .iter()
        .filter(|import| !state.symbols.contains_key(&import.alias))
        .map(|import| import.alias.clone())
        .collect();
    values::settle_literals(&mut state, &blocked);
    Ok(())
}

/// Plain names for a cycle inside one file, `file:name` otherwise.
fn format_chain(chain: &[(AbsoluteFsPath, String)]) -> Vec<String> {
    let single_file = chain.windows(2).all(|pair| pair[0].0 == pair[1].0);
    chain
        .iter()
        .map(|(path, name)| {
            if single_file {
                name.clone()
            } else {
                format!("{}:{}", path, name)
            }
        })
        .collect()
}
