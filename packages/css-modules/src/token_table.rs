//! Token Table
//!
//! Per-file mapping from local name to the ordered set of scoped names it
//! exports, with provenance flags.

use bitflags::bitflags;
use indexmap::{IndexMap, IndexSet};

bitflags! {
    /// Provenance of a token entry.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct TokenFlags: u8 {
        const LOCAL = 0b0000_0001;
        const COMPOSED_LOCAL = 0b0000_0010;
        const COMPOSED_EXTERNAL = 0b0000_0100;
        const GLOBAL = 0b0000_1000;
        const LITERAL = 0b0001_0000;
    }
}

/// Origin of an export entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
    Local,
    ComposedFromLocal,
    ComposedFromExternal,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenEntry {
    /// The entry's own name: a generated name, a global passthrough or a literal.
    primary: String,
    /// Names added by composition, in union order.
    composed: IndexSet<String>,
    flags: TokenFlags,
}

impl TokenEntry {
    fn new(primary: String, flags: TokenFlags) -> Self {
        TokenEntry {
            primary,
            composed: IndexSet::new(),
            flags,
        }
    }

    pub fn primary(&self) -> &str {
        &self.primary
    }

    pub fn composed(&self) -> impl Iterator<Item = &str> {
        self.composed.iter().map(String::as_str)
    }

    /// All scoped names: the primary name first, then the composed ones.
    pub fn names(&self) -> Vec<String> {
        std::iter::once(self.primary.clone())
            .chain(self.composed.iter().cloned())
            .collect()
    }

    pub fn flags(&self) -> TokenFlags {
        self.flags
    }

    pub fn is_literal(&self) -> bool {
        self.flags.contains(TokenFlags::LITERAL)
    }

    pub fn origin(&self) -> Origin {
        if self.flags.contains(TokenFlags::COMPOSED_EXTERNAL) {
            Origin::ComposedFromExternal
        } else if self.flags.contains(TokenFlags::COMPOSED_LOCAL) {
            Origin::ComposedFromLocal
        } else {
            Origin::Local
        }
    }

    /// The names joined by spaces, as exported.
    pub fn joined(&self) -> String {
        self.names().join(" ")
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TokenTable {
    entries: IndexMap<String, TokenEntry>,
}

impl TokenTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a generated name. A redeclared local name keeps its composed names
    /// but takes the new generated name.
    pub fn declare_local(&mut self, local: &str, scoped: String) {
        match self.entries.get_mut(local) {
            Some(entry) if !entry.is_literal() => {
                entry.composed.shift_remove(&scoped);
                entry.primary = scoped;
                entry.flags.remove(TokenFlags::GLOBAL);
                entry.flags.insert(TokenFlags::LOCAL);
            }
            _ => {
                self.entries
                    .insert(local.to_string(), TokenEntry::new(scoped, TokenFlags::LOCAL));
            }
        }
    }

    /// Record a global passthrough. Local declarations of the same name win.
    pub fn declare_global(&mut self, name: &str) {
        if !self.entries.contains_key(name) {
            self.entries.insert(
                name.to_string(),
                TokenEntry::new(name.to_string(), TokenFlags::GLOBAL),
            );
        }
    }

    /// Record a literal value, replacing any previous entry.
    pub fn declare_literal(&mut self, name: &str, value: String) {
        self.entries
            .insert(name.to_string(), TokenEntry::new(value, TokenFlags::LITERAL));
    }

    /// Union `names` into the composed set of `local`.
    pub fn compose<I>(&mut self, local: &str, names: I, external: bool)
    where
        I: IntoIterator<Item = String>,
    {
        let entry = self
            .entries
            .entry(local.to_string())
            .or_insert_with(|| TokenEntry::new(local.to_string(), TokenFlags::LOCAL));
        for name in names {
            if name != entry.primary {
                entry.composed.insert(name);
            }
        }
        entry.flags.insert(if external {
            TokenFlags::COMPOSED_EXTERNAL
        } else {
            TokenFlags::COMPOSED_LOCAL
        });
    }

    pub fn get(&self, local: &str) -> Option<&TokenEntry> {
        self.entries.get(local)
    }

    pub fn contains(&self, local: &str) -> bool {
        self.entries.contains_key(local)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &TokenEntry)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_overwrite_generated_name_on_redeclaration() {
        let mut table = TokenTable::new();
        table.declare_local("a", "a_1".to_string());
        table.compose("a", vec!["b_1".to_string()], false);
        table.declare_local("a", "a_2".to_string());
        assert_eq!(table.get("a").unwrap().names(), vec!["a_2", "b_1"]);
    }

    #[test]
    fn should_union_composed_names_without_duplicates() {
        let mut table = TokenTable::new();
        table.declare_local("a", "a_1".to_string());
        table.compose("a", vec!["b_1".to_string(), "a_1".to_string()], false);
        table.compose("a", vec!["c_1".to_string(), "b_1".to_string()], true);
        let entry = table.get("a").unwrap();
        assert_eq!(entry.joined(), "a_1 b_1 c_1");
        assert_eq!(entry.origin(), Origin::ComposedFromExternal);
        assert!(entry.flags().contains(TokenFlags::LOCAL | TokenFlags::COMPOSED_LOCAL));
    }

    #[test]
    fn should_prefer_local_over_global() {
        let mut table = TokenTable::new();
        table.declare_global("a");
        table.declare_local("a", "a_1".to_string());
        table.declare_global("a");
        let entry = table.get("a").unwrap();
        assert_eq!(entry.primary(), "a_1");
        assert!(!entry.flags().contains(TokenFlags::GLOBAL));
    }

    #[test]
    fn should_replace_with_literals() {
        let mut table = TokenTable::new();
        table.declare_local("a", "a_1".to_string());
        table.declare_literal("a", "#fff".to_string());
        let entry = table.get("a").unwrap();
        assert!(entry.is_literal());
        assert_eq!(entry.names(), vec!["#fff"]);
        assert_eq!(entry.origin(), Origin::Local);
    }
}
