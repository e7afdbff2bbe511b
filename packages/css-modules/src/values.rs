//! Value Resolver
//!
//! `@value` definitions and imports, literal settlement, and the final symbol
//! substitution pass over declaration values and at-rule params.

use crate::ast::{visit_all, AtRule, Declaration, Stylesheet, Visitor};
use crate::keyframes;
use crate::module::{LiteralDef, ModuleContext, ModuleState};
use crate::util::{is_identifier, rewrite_identifiers, split_on_top_level_commas};
use indexmap::IndexMap;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;
use std::convert::Infallible;

static VALUE_IMPORT_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"^([\s\S]+?)\s+from\s+("[^"]*"|'[^']*'|[\w-]+)\s*$"#).unwrap()
});

static VALUE_DEFINITION_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([\w-]+)(?:\s*:\s*|\s+)([\s\S]*)$").unwrap());

static IMPORTED_NAME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([\w-]+)(?:\s+as\s+([\w-]+))?$").unwrap());

/// Where an `@value` import reads from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValueSource {
    /// A quoted path.
    Path(String),
    /// A local value whose text is a quoted path.
    Value(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValueRule {
    Define {
        name: String,
        value: String,
    },
    Import {
        /// `(imported, alias)` pairs.
        names: Vec<(String, String)>,
        source: ValueSource,
    },
}

/// Parse the params of an `@value` rule. Returns `None` for malformed rules.
pub fn parse_value_rule(params: &str) -> Option<ValueRule> {
    let params = params.trim();
    if let Some(caps) = VALUE_IMPORT_RE.captures(params) {
        let source = &caps[2];
        let source = if source.starts_with('"') || source.starts_with('\'') {
            ValueSource::Path(source[1..source.len() - 1].to_string())
        } else {
            ValueSource::Value(source.to_string())
        };
        let list = caps[1].trim();
        let list = list
            .strip_prefix('(')
            .and_then(|inner| inner.strip_suffix(')'))
            .unwrap_or(list);
        let mut names = Vec::new();
        for item in split_on_top_level_commas(list) {
            let item = item.trim();
            if item.is_empty() {
                continue;
            }
            let parsed = IMPORTED_NAME_RE.captures(item)?;
            let imported = parsed[1].to_string();
            let alias = parsed
                .get(2)
                .map(|m| m.as_str().to_string())
                .unwrap_or_else(|| imported.clone());
            names.push((imported, alias));
        }
        if !names.is_empty() {
            return Some(ValueRule::Import { names, source });
        }
    }
    let caps = VALUE_DEFINITION_RE.captures(params)?;
    Some(ValueRule::Define {
        name: caps[1].to_string(),
        value: caps[2].trim().to_string(),
    })
}

/// Replace whole identifiers found in `symbols`.
pub fn replace_symbols(text: &str, symbols: &IndexMap<String, String>) -> String {
    if symbols.is_empty() {
        return text.to_string();
    }
    rewrite_identifiers(text, |word| symbols.get(word).cloned())
}

/// Identifiers a raw value refers to.
fn referenced_identifiers(text: &str) -> Vec<String> {
    let mut found = Vec::new();
    rewrite_identifiers(text, |word| {
        if is_identifier(word) {
            found.push(word.to_string());
        }
        None
    });
    found
}

/// Settle every literal that does not depend on a name in `blocked`.
///
/// `@value` definitions settle before `:export` entries, in source order, so a
/// value sees the values defined before it. Literals left unsettled stay in
/// `state.literals` and in `state.pending`.
pub fn settle_literals(state: &mut ModuleState, blocked: &HashSet<String>) {
    let mut blocked = blocked.clone();
    let literals: Vec<(String, LiteralDef)> = state.literals.drain(..).collect();
    let (value_defs, export_defs): (Vec<_>, Vec<_>) =
        literals.into_iter().partition(|(_, def)| def.is_value);

    let mut unsettled = IndexMap::new();
    for (name, def) in value_defs.into_iter().chain(export_defs) {
        let depends_on_blocked = referenced_identifiers(&def.raw)
            .iter()
            .any(|word| blocked.contains(word));
        if depends_on_blocked {
            if def.is_value {
                blocked.insert(name.clone());
            }
            state.pending.insert(name.clone());
            unsettled.insert(name, def);
            continue;
        }
        let value = replace_symbols(&def.raw, &state.symbols);
        if def.is_value {
            state.symbols.insert(name.clone(), value.clone());
        }
        state.table.declare_literal(&name, value);
        state.pending.shift_remove(&name);
    }
    state.literals = unsettled;
}

struct SymbolReplacer<'s> {
    symbols: &'s IndexMap<String, String>,
    keyframes: &'s IndexMap<String, String>,
}

impl Visitor for SymbolReplacer<'_> {
    type Error = Infallible;

    fn visit_at_rule(&mut self, at_rule: &mut AtRule) -> Result<(), Infallible> {
        if !keyframes::is_keyframes_at_rule(&at_rule.name) {
            at_rule.params = replace_symbols(&at_rule.params, self.symbols);
        }
        match at_rule.nodes.as_mut() {
            Some(nodes) => visit_all(self, nodes),
            None => Ok(()),
        }
    }

    fn visit_declaration(&mut self, decl: &mut Declaration) -> Result<(), Infallible> {
        let is_animation = keyframes::is_animation_property(&decl.prop_name());
        if let Some(value) = decl.value.as_mut() {
            let mut replaced = replace_symbols(value, self.symbols);
            if is_animation && !self.keyframes.is_empty() {
                replaced = keyframes::rewrite_animation(&replaced, self.keyframes);
            }
            *value = replaced;
        }
        Ok(())
    }
}

/// Third pass: substitute value symbols and local keyframes names.
pub fn substitute(ctx: &ModuleContext<'_>, sheet: &mut Stylesheet) {
    let state = ctx.state.borrow();
    if state.symbols.is_empty() && state.keyframes.is_empty() {
        return;
    }
    let mut replacer = SymbolReplacer {
        symbols: &state.symbols,
        keyframes: &state.keyframes,
    };
    match visit_all(&mut replacer, &mut sheet.nodes) {
        Ok(()) => {}
        Err(never) => match never {},
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::file_system::AbsoluteFsPath;
    use crate::parse_util::SourceLocation;

    #[test]
    fn should_parse_definitions() {
        assert_eq!(
            parse_value_rule("primary: #BF4040"),
            Some(ValueRule::Define {
                name: "primary".to_string(),
                value: "#BF4040".to_string()
            })
        );
        assert_eq!(
            parse_value_rule("small (max-width: 599px)"),
            Some(ValueRule::Define {
                name: "small".to_string(),
                value: "(max-width: 599px)".to_string()
            })
        );
    }

    #[test]
    fn should_parse_imports_with_aliases() {
        assert_eq!(
            parse_value_rule("primary, secondary as accent from \"./colors.css\""),
            Some(ValueRule::Import {
                names: vec![
                    ("primary".to_string(), "primary".to_string()),
                    ("secondary".to_string(), "accent".to_string()),
                ],
                source: ValueSource::Path("./colors.css".to_string()),
            })
        );
        assert_eq!(
            parse_value_rule("primary from colors"),
            Some(ValueRule::Import {
                names: vec![("primary".to_string(), "primary".to_string())],
                source: ValueSource::Value("colors".to_string()),
            })
        );
    }

    #[test]
    fn should_settle_values_in_order() {
        let mut state = ModuleState::new(AbsoluteFsPath::new("/a.css"));
        for (name, raw, is_value) in [
            ("base", "10px", true),
            ("double", "calc(base * 2)", true),
            ("exported", "double", false),
            ("remote", "imported", true),
        ] {
            state.literals.insert(
                name.to_string(),
                LiteralDef {
                    raw: raw.to_string(),
                    is_value,
                    location: SourceLocation::default(),
                },
            );
        }
        let blocked: HashSet<String> = ["imported".to_string()].into_iter().collect();
        settle_literals(&mut state, &blocked);

        assert_eq!(state.table.get("double").unwrap().primary(), "calc(10px * 2)");
        assert_eq!(state.table.get("exported").unwrap().primary(), "calc(10px * 2)");
        assert!(state.literals.contains_key("remote"));
        assert!(state.pending.contains("remote"));
    }
}
