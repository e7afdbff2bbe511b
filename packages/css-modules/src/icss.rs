//! Export/Import Parser
//!
//! First pass over a file. It walks every rule once, scopes local selectors
//! through the Mode Gate and the Scoped-Name Generator, and records what the
//! second pass has to resolve:
//!
//! - `:import("path") { alias: name }` and `@value ... from` references
//! - `:export { name: value }` literals and `@value name: value` definitions
//! - `composes` / `compose-with` declarations
//! - local `@keyframes` names
//!
//! Metadata rules and `composes` declarations are removed from the AST.

use crate::ast::{AtRule, Declaration, Node, Rule, Stylesheet};
use crate::error::{CssModulesError, Result};
use crate::keyframes::{self, keyframes_name};
use crate::module::{
    ComposeRef, ComposeSource, Composition, ImportReference, LiteralDef, ModuleContext, ModuleState,
};
use crate::parse_util::SourceLocation;
use crate::scoped_name::ScopedNameGenerator;
use crate::selector::{annotate_selector_list, block_wrapper, render_selector_list, Mode, Segment};
use crate::util::unquote;
use crate::values::{self, parse_value_rule, ValueRule, ValueSource};
use once_cell::sync::Lazy;
use regex::Regex;
use smallvec::SmallVec;
use std::collections::{HashMap, HashSet};

static IMPORT_RULE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"^:import\(\s*(?:"([^"]*)"|'([^']*)'|([^)"'\s]+))\s*\)$"#).unwrap()
});

static COMPOSES_FROM_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"^([\s\S]+?)\s+from\s+(?:"([^"]*)"|'([^']*)'|(\S+))\s*$"#).unwrap()
});

static GLOBAL_NAME_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^global\(\s*([^)\s]+)\s*\)$").unwrap());

static NAME_SEPARATOR_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[\s,]+").unwrap());

#[derive(Debug, Clone, Copy)]
struct Frame {
    mode: Mode,
    /// Nested inside a rule that already passed the pure check.
    pure_parent: bool,
    in_keyframes: bool,
}

struct Collector<'c, 'a> {
    ctx: &'c ModuleContext<'a>,
    generator: &'c ScopedNameGenerator,
    state: &'c mut ModuleState,
    scoped: HashMap<String, String>,
}

/// Run the first pass over `sheet`.
pub fn collect(ctx: &ModuleContext<'_>, sheet: &mut Stylesheet) -> Result<()> {
    let mut state = ctx.state.borrow_mut();
    let mut collector = Collector {
        ctx,
        generator: ctx.graph.generator(),
        state: &mut *state,
        scoped: HashMap::new(),
    };
    let frame = Frame {
        mode: ctx.mode,
        pure_parent: false,
        in_keyframes: false,
    };
    collector.collect_nodes(&mut sheet.nodes, frame)?;

    // Literals that only use local values can settle now; the rest wait for imports.
    let blocked: HashSet<String> = state.imports.iter().map(|i| i.alias.clone()).collect();
    values::settle_literals(&mut state, &blocked);
    Ok(())
}

impl<'c, 'a> Collector<'c, 'a> {
    fn collect_nodes(&mut self, nodes: &mut Vec<Node>, frame: Frame) -> Result<()> {
        for node in std::mem::take(nodes) {
            match node {
                Node::Rule(rule) => self.collect_rule(rule, frame, nodes)?,
                Node::AtRule(at_rule) => {
                    if let Some(at_rule) = self.collect_at_rule(at_rule, frame)? {
                        nodes.push(Node::AtRule(at_rule));
                    }
                }
                other @ (Node::Declaration(_) | Node::Comment(_)) => nodes.push(other),
            }
        }
        Ok(())
    }

    fn collect_rule(&mut self, mut rule: Rule, frame: Frame, out: &mut Vec<Node>) -> Result<()> {
        if let Some(block_mode) = block_wrapper(&rule.selector) {
            if frame.mode.is_block() {
                return Err(self.nested_error(&rule.selector, rule.location));
            }
            let block_frame = Frame {
                mode: block_mode,
                ..frame
            };
            let mut children = std::mem::take(&mut rule.nodes);
            self.collect_nodes(&mut children, block_frame)?;
            out.extend(children);
            return Ok(());
        }

        if let Some(caps) = IMPORT_RULE_RE.captures(rule.selector.trim()) {
            let specifier = caps
                .get(1)
                .or_else(|| caps.get(2))
                .or_else(|| caps.get(3))
                .map(|m| m.as_str().to_string())
                .unwrap_or_default();
            self.record_imports(&specifier, &rule);
            return Ok(());
        }

        if rule.selector.trim() == ":export" {
            self.record_exports(&rule);
            return Ok(());
        }

        if frame.in_keyframes {
            out.push(Node::Rule(rule));
            return Ok(());
        }

        self.scope_rule(&mut rule, frame)?;
        out.push(Node::Rule(rule));
        Ok(())
    }

    fn collect_at_rule(&mut self, mut at_rule: AtRule, frame: Frame) -> Result<Option<AtRule>> {
        if at_rule.name.eq_ignore_ascii_case("value") {
            self.record_value(&at_rule)?;
            return Ok(None);
        }

        let mut child_frame = frame;
        if keyframes::is_keyframes_at_rule(&at_rule.name) {
            self.scope_keyframes(&mut at_rule, frame.mode);
            child_frame.in_keyframes = true;
        }
        if let Some(children) = at_rule.nodes.as_mut() {
            self.collect_nodes(children, child_frame)?;
        }
        Ok(Some(at_rule))
    }

    fn scope_rule(&mut self, rule: &mut Rule, frame: Frame) -> Result<()> {
        let original = rule.selector.clone();
        let annotated = annotate_selector_list(&original, frame.mode)
            .map_err(|_| self.nested_error(&original, rule.location))?;

        let is_pure = annotated.iter().all(|selector| selector.has_local());
        let pure_checked = self.ctx.mode == Mode::Pure && frame.mode != Mode::GlobalBlock;
        if pure_checked && !frame.pure_parent && !is_pure {
            return Err(CssModulesError::PureModeViolation {
                file: self.ctx.file(),
                selector: original,
                location: rule.location,
            });
        }

        for selector in &annotated {
            for segment in &selector.segments {
                match segment {
                    Segment::Class { name, local: true, .. } | Segment::Id { name, local: true, .. } => {
                        let scoped = self.scoped_name(name);
                        self.state.table.declare_local(name, scoped);
                    }
                    Segment::Class { name, local: false, .. } | Segment::Id { name, local: false, .. } => {
                        if self.ctx.graph.options().export_globals {
                            self.state.table.declare_global(name);
                        }
                    }
                    Segment::Text(_) => {}
                }
            }
        }
        let scoped = &self.scoped;
        rule.selector = render_selector_list(&annotated, |name| {
            scoped.get(name).cloned().unwrap_or_else(|| name.to_string())
        });

        let mut kept = Vec::with_capacity(rule.nodes.len());
        for child in std::mem::take(&mut rule.nodes) {
            match child {
                Node::Declaration(decl) if is_composes(&decl) => {
                    let owners = annotated
                        .iter()
                        .map(|selector| selector.single_local_class().map(str::to_string))
                        .collect::<Option<Vec<_>>>()
                        .ok_or_else(|| CssModulesError::InvalidComposition {
                            file: self.ctx.file(),
                            selector: original.clone(),
                            location: decl.location,
                        })?;
                    let composition = parse_composes(decl.value.as_deref().unwrap_or(""), decl.location);
                    for owner in owners {
                        self.state
                            .compositions
                            .entry(owner.clone())
                            .or_default()
                            .push(composition.clone());
                        self.state.pending.insert(owner);
                    }
                }
                other => kept.push(other),
            }
        }

        let child_frame = Frame {
            pure_parent: frame.pure_parent || is_pure,
            in_keyframes: false,
            ..frame
        };
        self.collect_nodes(&mut kept, child_frame)?;
        rule.nodes = kept;
        Ok(())
    }

    fn scope_keyframes(&mut self, at_rule: &mut AtRule, mode: Mode) {
        let keyframes = keyframes_name(&at_rule.params, mode.is_local());
        if keyframes.local {
            let scoped = self.scoped_name(&keyframes.name);
            self.state.table.declare_local(&keyframes.name, scoped.clone());
            self.state.keyframes.insert(keyframes.name, scoped.clone());
            at_rule.params = scoped;
        } else {
            if self.ctx.graph.options().export_globals && !keyframes.name.starts_with(|c| c == '"' || c == '\'') {
                self.state.table.declare_global(&keyframes.name);
            }
            at_rule.params = keyframes.name;
        }
    }

    fn record_imports(&mut self, specifier: &str, rule: &Rule) {
        for child in &rule.nodes {
            if let Node::Declaration(decl) = child {
                let alias = decl.prop.trim();
                let imported = decl.value.as_deref().unwrap_or("").trim();
                if alias.is_empty() || imported.is_empty() {
                    continue;
                }
                self.state.imports.push(ImportReference {
                    specifier: specifier.to_string(),
                    imported: imported.to_string(),
                    alias: alias.to_string(),
                    location: decl.location,
                });
            }
        }
    }

    fn record_exports(&mut self, rule: &Rule) {
        for child in &rule.nodes {
            if let Node::Declaration(decl) = child {
                let name = decl.prop.trim().to_string();
                let raw = decl.value.clone().unwrap_or_default();
                self.state.table.declare_literal(&name, raw.clone());
                self.state.pending.insert(name.clone());
                self.state.literals.insert(
                    name,
                    LiteralDef {
                        raw,
                        is_value: false,
                        location: decl.location,
                    },
                );
            }
        }
    }

    fn record_value(&mut self, at_rule: &AtRule) -> Result<()> {
        let rule = match parse_value_rule(&at_rule.params) {
            Some(rule) => rule,
            None => {
                self.ctx.graph.logger().warn(&format!(
                    "{}:{}: ignoring malformed @value {}",
                    self.ctx.path, at_rule.location, at_rule.params
                ));
                return Ok(());
            }
        };
        match rule {
            ValueRule::Define { name, value } => {
                self.state.table.declare_literal(&name, value.clone());
                self.state.pending.insert(name.clone());
                self.state.literals.insert(
                    name,
                    LiteralDef {
                        raw: value,
                        is_value: true,
                        location: at_rule.location,
                    },
                );
            }
            ValueRule::Import { names, source } => {
                let specifier = match source {
                    ValueSource::Path(path) => path,
                    ValueSource::Value(name) => self.value_path(&name, at_rule.location)?,
                };
                for (imported, alias) in names {
                    self.state.table.declare_literal(&alias, alias.clone());
                    self.state.pending.insert(alias.clone());
                    self.state.value_aliases.insert(alias.clone());
                    self.state.imports.push(ImportReference {
                        specifier: specifier.clone(),
                        imported,
                        alias,
                        location: at_rule.location,
                    });
                }
            }
        }
        Ok(())
    }

    /// The path held by a previously defined value, as in `@value x from colors`.
    fn value_path(&self, name: &str, location: SourceLocation) -> Result<String> {
        match self.state.literals.get(name) {
            Some(def) if def.is_value => Ok(unquote(&def.raw).to_string()),
            _ => Err(CssModulesError::UnresolvedPath {
                file: self.ctx.file(),
                specifier: name.to_string(),
                reason: "no value with that name holds a path".to_string(),
                location,
            }),
        }
    }

    fn scoped_name(&mut self, local: &str) -> String {
        if let Some(scoped) = self.scoped.get(local) {
            return scoped.clone();
        }
        let scoped = self
            .generator
            .generate(local, &self.ctx.hash_path, self.ctx.source);
        self.scoped.insert(local.to_string(), scoped.clone());
        scoped
    }

    fn nested_error(&self, selector: &str, location: SourceLocation) -> CssModulesError {
        CssModulesError::NestedGlobalLocal {
            file: self.ctx.file(),
            selector: selector.trim().to_string(),
            location,
        }
    }
}

fn is_composes(decl: &Declaration) -> bool {
    matches!(decl.prop_name().as_str(), "composes" | "compose-with")
}

/// Parse a `composes` value such as `a b from "./x.css"` or `global(a) b`.
pub fn parse_composes(value: &str, location: SourceLocation) -> Composition {
    let value = value.trim();
    let (names, source) = match COMPOSES_FROM_RE.captures(value) {
        Some(caps) => {
            let names = caps.get(1).map(|m| m.as_str()).unwrap_or("");
            let source = if let Some(bare) = caps.get(4) {
                if bare.as_str() == "global" {
                    ComposeSource::Global
                } else {
                    ComposeSource::File(bare.as_str().to_string())
                }
            } else {
                let path = caps.get(2).or_else(|| caps.get(3)).map(|m| m.as_str()).unwrap_or("");
                ComposeSource::File(path.to_string())
            };
            (names, source)
        }
        None => (value, ComposeSource::Local),
    };

    let refs: SmallVec<[ComposeRef; 4]> = NAME_SEPARATOR_RE
        .split(names)
        .filter(|name| !name.is_empty())
        .map(|name| match GLOBAL_NAME_RE.captures(name) {
            Some(caps) => ComposeRef {
                name: caps[1].to_string(),
                source: ComposeSource::Global,
            },
            None => ComposeRef {
                name: name.to_string(),
                source: source.clone(),
            },
        })
        .collect();

    Composition { refs, location }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn refs(value: &str) -> Vec<(String, ComposeSource)> {
        parse_composes(value, SourceLocation::default())
            .refs
            .into_iter()
            .map(|r| (r.name, r.source))
            .collect()
    }

    #[test]
    fn should_parse_local_compositions() {
        assert_eq!(
            refs("a b, c"),
            vec![
                ("a".to_string(), ComposeSource::Local),
                ("b".to_string(), ComposeSource::Local),
                ("c".to_string(), ComposeSource::Local),
            ]
        );
    }

    #[test]
    fn should_parse_file_and_global_sources() {
        assert_eq!(
            refs("a, b from \"./x.css\""),
            vec![
                ("a".to_string(), ComposeSource::File("./x.css".to_string())),
                ("b".to_string(), ComposeSource::File("./x.css".to_string())),
            ]
        );
        assert_eq!(refs("a from global"), vec![("a".to_string(), ComposeSource::Global)]);
        assert_eq!(
            refs("global(a) b"),
            vec![
                ("a".to_string(), ComposeSource::Global),
                ("b".to_string(), ComposeSource::Local),
            ]
        );
    }
}
