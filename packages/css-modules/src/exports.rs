//! Result Assembler
//!
//! Turns a module's Token Table into the export object handed to the host.

use crate::ast::{Declaration, Node, Rule};
use crate::config::LocalsConvention;
use crate::file_system::AbsoluteFsPath;
use crate::token_table::TokenTable;
use indexmap::IndexMap;
use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use serde::Serialize;

/// Export key to the space-joined scoped names.
pub type ExportMap = IndexMap<String, String>;

/// Structured form of one export entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TokenExport {
    pub name: String,
    pub composes: Vec<String>,
}

static DASHES_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"-+(\w)").unwrap());

/// Build the export object of `table` under `convention`.
pub fn assemble(table: &TokenTable, convention: &LocalsConvention, file: &AbsoluteFsPath) -> ExportMap {
    let mut exports = ExportMap::new();
    for (local, entry) in table.iter() {
        let value = entry.joined();
        match convention {
            LocalsConvention::AsIs => {
                exports.insert(local.to_string(), value);
            }
            LocalsConvention::CamelCase => {
                let alias = camel_case(local);
                exports.insert(local.to_string(), value.clone());
                exports.entry(alias).or_insert(value);
            }
            LocalsConvention::CamelCaseOnly => {
                exports.insert(camel_case(local), value);
            }
            LocalsConvention::Dashes => {
                let alias = dashes_camel_case(local);
                exports.insert(local.to_string(), value.clone());
                exports.entry(alias).or_insert(value);
            }
            LocalsConvention::DashesOnly => {
                exports.insert(dashes_camel_case(local), value);
            }
            LocalsConvention::Custom(rename) => {
                let key = rename(local, &value, file);
                exports.insert(key, value);
            }
        }
    }
    exports
}

/// `{ name, composes }` per local name, without key conventions.
pub fn structured(table: &TokenTable) -> IndexMap<String, TokenExport> {
    table
        .iter()
        .map(|(local, entry)| {
            (
                local.to_string(),
                TokenExport {
                    name: entry.primary().to_string(),
                    composes: entry.composed().map(str::to_string).collect(),
                },
            )
        })
        .collect()
}

/// A synthetic `:export { key: value }` rule for `exports`.
pub fn export_rule(exports: &ExportMap) -> Node {
    let nodes = exports
        .iter()
        .map(|(key, value)| Node::Declaration(Declaration::new(key.as_str(), value.as_str())))
        .collect();
    Node::Rule(Rule::new(":export", nodes))
}

/// `btn-primary_large` -> `btnPrimaryLarge`, `FooBar` -> `fooBar`.
pub fn camel_case(name: &str) -> String {
    let mut words: Vec<String> = Vec::new();
    let mut current = String::new();
    let mut prev_lower = false;
    for c in name.chars() {
        if !c.is_alphanumeric() {
            if !current.is_empty() {
                words.push(std::mem::take(&mut current));
            }
            prev_lower = false;
            continue;
        }
        if c.is_uppercase() && prev_lower && !current.is_empty() {
            words.push(std::mem::take(&mut current));
        }
        prev_lower = c.is_lowercase() || c.is_ascii_digit();
        current.push(c);
    }
    if !current.is_empty() {
        words.push(current);
    }

    let mut out = String::new();
    for (i, word) in words.iter().enumerate() {
        let lower = word.to_lowercase();
        if i == 0 {
            out.push_str(&lower);
        } else {
            let mut chars = lower.chars();
            if let Some(first) = chars.next() {
                out.extend(first.to_uppercase());
                out.push_str(chars.as_str());
            }
        }
    }
    out
}

/// Only dashes start a new word: `btn-primary_large` -> `btnPrimary_large`.
pub fn dashes_camel_case(name: &str) -> String {
    DASHES_RE
        .replace_all(name, |caps: &Captures| caps[1].to_uppercase())
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn table() -> TokenTable {
        let mut table = TokenTable::new();
        table.declare_local("btn-primary", "_btn_1".to_string());
        table.declare_local("title", "_title_1".to_string());
        table.compose("title", vec!["_btn_1".to_string()], false);
        table
    }

    #[test]
    fn should_convert_to_camel_case() {
        assert_eq!(camel_case("btn-primary"), "btnPrimary");
        assert_eq!(camel_case("btn_primary-large"), "btnPrimaryLarge");
        assert_eq!(camel_case("FooBar"), "fooBar");
        assert_eq!(camel_case("__FOO_BAR__"), "fooBar");
        assert_eq!(dashes_camel_case("btn-primary_large"), "btnPrimary_large");
        assert_eq!(dashes_camel_case("a--b"), "aB");
    }

    #[test]
    fn should_keep_canonical_keys_with_aliases() {
        let file = AbsoluteFsPath::new("/a.css");
        let exports = assemble(&table(), &LocalsConvention::CamelCase, &file);
        let keys: Vec<&str> = exports.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["btn-primary", "btnPrimary", "title"]);
        assert_eq!(exports["title"], "_title_1 _btn_1");
    }

    #[test]
    fn should_replace_keys_in_only_modes() {
        let file = AbsoluteFsPath::new("/a.css");
        let exports = assemble(&table(), &LocalsConvention::DashesOnly, &file);
        assert!(exports.contains_key("btnPrimary"));
        assert!(!exports.contains_key("btn-primary"));
    }

    #[test]
    fn should_apply_custom_conventions() {
        let file = AbsoluteFsPath::new("/a.css");
        let convention = LocalsConvention::Custom(Arc::new(|local: &str, _: &str, _: &AbsoluteFsPath| {
            local.to_uppercase()
        }));
        let exports = assemble(&table(), &convention, &file);
        assert_eq!(exports["TITLE"], "_title_1 _btn_1");
    }

    #[test]
    fn should_build_structured_exports_and_export_rule() {
        let structured = structured(&table());
        assert_eq!(structured["title"].name, "_title_1");
        assert_eq!(structured["title"].composes, vec!["_btn_1"]);

        let mut exports = ExportMap::new();
        exports.insert("a".to_string(), "_a_1".to_string());
        let css = crate::emitter::stringify_nodes(&[export_rule(&exports)]);
        assert_eq!(css, ":export{a:_a_1}");
    }
}
