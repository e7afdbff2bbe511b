//! Global/Local Mode Gate
//!
//! Decides, per class or id in a selector, whether the name is scoped (local)
//! or passed through untouched (global). The decision starts from the file's
//! default [`Mode`] and is flipped by `:global(...)` / `:local(...)` wrappers
//! and by bare `:global` / `:local` switches.

use crate::util::{
    escape_identifier, hex_escape_len, skip_escape_terminator, split_on_top_level_commas,
    unescape_identifier,
};
use thiserror::Error;

/// Scoping mode of a selector or of a whole block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Global,
    Local,
    /// Inside a `:global { ... }` block.
    GlobalBlock,
    /// Inside a `:local { ... }` block.
    LocalBlock,
    /// Local, and every rule must contain at least one local selector.
    Pure,
}

impl Mode {
    pub fn is_local(self) -> bool {
        matches!(self, Mode::Local | Mode::LocalBlock | Mode::Pure)
    }

    pub fn is_block(self) -> bool {
        matches!(self, Mode::GlobalBlock | Mode::LocalBlock)
    }

    fn switched(global: bool) -> Mode {
        if global {
            Mode::Global
        } else {
            Mode::Local
        }
    }
}

/// Pseudo-classes whose arguments are selector lists.
const SELECTOR_PSEUDOS: &[&str] = &[
    "not",
    "is",
    "where",
    "has",
    "matches",
    "-webkit-any",
    "-moz-any",
    "host",
    "host-context",
];

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SelectorError {
    #[error("a :global or :local wrapper cannot be nested in \"{0}\"")]
    NestedWrapper(String),
}

/// One piece of an annotated selector. `name` is the decoded identifier and
/// `raw` its source text, escapes included.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    Text(String),
    Class { name: String, raw: String, local: bool },
    Id { name: String, raw: String, local: bool },
}

/// A single complex selector (no top-level commas) with its classes and ids
/// marked local or global.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnnotatedSelector {
    pub segments: Vec<Segment>,
}

impl AnnotatedSelector {
    pub fn has_local(&self) -> bool {
        self.segments.iter().any(|segment| {
            matches!(
                segment,
                Segment::Class { local: true, .. } | Segment::Id { local: true, .. }
            )
        })
    }

    /// The class name when the selector is exactly one local class.
    pub fn single_local_class(&self) -> Option<&str> {
        let mut found = None;
        for segment in &self.segments {
            match segment {
                Segment::Text(text) if text.trim().is_empty() => {}
                Segment::Class { name, local: true, .. } if found.is_none() => found = Some(name.as_str()),
                _ => return None,
            }
        }
        found
    }

    /// Local names, in order of appearance.
    pub fn local_names(&self) -> impl Iterator<Item = &str> {
        self.segments.iter().filter_map(|segment| match segment {
            Segment::Class { name, local: true, .. } | Segment::Id { name, local: true, .. } => {
                Some(name.as_str())
            }
            _ => None,
        })
    }

    /// Print the selector, passing local names through `rename`. Global names
    /// keep their source spelling.
    pub fn render<F: FnMut(&str) -> String>(&self, rename: &mut F) -> String {
        let mut out = String::new();
        for segment in &self.segments {
            let (sigil, name, raw, local) = match segment {
                Segment::Text(text) => {
                    out.push_str(text);
                    continue;
                }
                Segment::Class { name, raw, local } => ('.', name, raw, *local),
                Segment::Id { name, raw, local } => ('#', name, raw, *local),
            };
            out.push(sigil);
            if local {
                out.push_str(&escape_identifier(&rename(name)));
            } else {
                out.push_str(raw);
            }
        }
        out.trim().to_string()
    }
}

/// Returns the block mode when `selector` is a bare `:global` or `:local`.
pub fn block_wrapper(selector: &str) -> Option<Mode> {
    let selector = selector.trim();
    if selector.eq_ignore_ascii_case(":global") {
        Some(Mode::GlobalBlock)
    } else if selector.eq_ignore_ascii_case(":local") {
        Some(Mode::LocalBlock)
    } else {
        None
    }
}

/// Annotate every selector of a comma-separated list under `mode`.
pub fn annotate_selector_list(
    selector: &str,
    mode: Mode,
) -> Result<Vec<AnnotatedSelector>, SelectorError> {
    split_on_top_level_commas(selector)
        .into_iter()
        .map(|part| {
            let mut segments = Vec::new();
            annotate_compound(part, selector, mode, mode.is_block(), &mut segments)?;
            Ok(AnnotatedSelector { segments })
        })
        .collect()
}

/// Render a list of annotated selectors back into one selector string.
pub fn render_selector_list<F: FnMut(&str) -> String>(
    selectors: &[AnnotatedSelector],
    mut rename: F,
) -> String {
    selectors
        .iter()
        .map(|selector| selector.render(&mut rename))
        .collect::<Vec<_>>()
        .join(",")
}

fn annotate_nested_list(
    input: &str,
    full: &str,
    mode: Mode,
    in_wrapper: bool,
    out: &mut Vec<Segment>,
) -> Result<(), SelectorError> {
    for (i, part) in split_on_top_level_commas(input).into_iter().enumerate() {
        if i > 0 {
            out.push(Segment::Text(",".to_string()));
        }
        annotate_compound(part.trim(), full, mode, in_wrapper, out)?;
    }
    Ok(())
}

fn annotate_compound(
    input: &str,
    full: &str,
    mut mode: Mode,
    in_wrapper: bool,
    out: &mut Vec<Segment>,
) -> Result<(), SelectorError> {
    let chars: Vec<char> = input.chars().collect();
    let mut text = String::new();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        match c {
            '\\' => {
                text.push(c);
                if let Some(&next) = chars.get(i + 1) {
                    text.push(next);
                }
                i += 2;
            }
            '"' | '\'' | '[' => {
                let end = skip_verbatim(&chars, i);
                text.extend(&chars[i..end]);
                i = end;
            }
            '.' | '#' if chars.get(i + 1).map_or(false, |&n| starts_ident(n)) => {
                let (raw, end) = read_ident(&chars, i + 1);
                flush(&mut text, out);
                let name = unescape_identifier(&raw);
                let local = mode.is_local();
                out.push(if c == '.' {
                    Segment::Class { name, raw, local }
                } else {
                    Segment::Id { name, raw, local }
                });
                i = end;
            }
            ':' if chars.get(i + 1) == Some(&':') => {
                let (name, end) = read_ident(&chars, i + 2);
                text.push_str("::");
                text.push_str(&name);
                i = end;
                if chars.get(i) == Some(&'(') {
                    let close = matching_paren(&chars, i);
                    text.extend(&chars[i..close]);
                    i = close;
                }
            }
            ':' => {
                let (name, end) = read_ident(&chars, i + 1);
                let lower = name.to_ascii_lowercase();
                let has_args = chars.get(end) == Some(&'(');

                if lower == "global" || lower == "local" {
                    if in_wrapper {
                        return Err(SelectorError::NestedWrapper(full.trim().to_string()));
                    }
                    let switched = Mode::switched(lower == "global");
                    if has_args {
                        let close = matching_paren(&chars, end);
                        let inner = paren_contents(&chars, end, close);
                        flush(&mut text, out);
                        annotate_nested_list(&inner, full, switched, true, out)?;
                        i = close;
                    } else {
                        mode = switched;
                        i = end;
                        while chars.get(i).map_or(false, |c| c.is_whitespace()) {
                            i += 1;
                        }
                    }
                } else if has_args && SELECTOR_PSEUDOS.contains(&lower.as_str()) {
                    let close = matching_paren(&chars, end);
                    let inner = paren_contents(&chars, end, close);
                    text.push(':');
                    text.push_str(&name);
                    text.push('(');
                    flush(&mut text, out);
                    annotate_nested_list(&inner, full, mode, in_wrapper, out)?;
                    text.push(')');
                    i = close;
                } else {
                    text.push(':');
                    text.push_str(&name);
                    i = end;
                    if has_args {
                        let close = matching_paren(&chars, end);
                        text.extend(&chars[end..close]);
                        i = close;
                    }
                }
            }
            _ => {
                text.push(c);
                i += 1;
            }
        }
    }

    flush(&mut text, out);
    Ok(())
}

fn flush(text: &mut String, out: &mut Vec<Segment>) {
    if !text.is_empty() {
        out.push(Segment::Text(std::mem::take(text)));
    }
}

fn starts_ident(c: char) -> bool {
    c.is_alphabetic() || c == '_' || c == '-' || c == '\\' || !c.is_ascii()
}

fn read_ident(chars: &[char], start: usize) -> (String, usize) {
    let mut name = String::new();
    let mut i = start;
    while i < chars.len() {
        let c = chars[i];
        if c == '\\' {
            let digits = hex_escape_len(chars, i + 1);
            let end = if digits > 0 {
                skip_escape_terminator(chars, i + 1 + digits)
            } else {
                (i + 2).min(chars.len())
            };
            name.extend(&chars[i..end]);
            i = end;
        } else if c.is_alphanumeric() || c == '-' || c == '_' || !c.is_ascii() {
            name.push(c);
            i += 1;
        } else {
            break;
        }
    }
    (name, i.min(chars.len()))
}

fn paren_contents(chars: &[char], open: usize, close: usize) -> String {
    let end = if chars.get(close.wrapping_sub(1)) == Some(&')') && close > open + 1 {
        close - 1
    } else {
        close
    };
    chars[open + 1..end].iter().collect()
}

/// Index just past the `)` matching the `(` at `open`.
fn matching_paren(chars: &[char], open: usize) -> usize {
    let mut depth = 0usize;
    let mut i = open;
    while i < chars.len() {
        match chars[i] {
            '\\' => i += 1,
            '"' | '\'' | '[' => {
                i = skip_verbatim(chars, i);
                continue;
            }
            '(' => depth += 1,
            ')' => {
                depth -= 1;
                if depth == 0 {
                    return i + 1;
                }
            }
            _ => {}
        }
        i += 1;
    }
    chars.len()
}

/// Index just past a string or attribute selector starting at `start`.
fn skip_verbatim(chars: &[char], start: usize) -> usize {
    let close = match chars[start] {
        '[' => ']',
        q => q,
    };
    let mut i = start + 1;
    while i < chars.len() {
        let c = chars[i];
        if c == '\\' {
            i += 2;
            continue;
        }
        if (c == '"' || c == '\'') && close == ']' {
            i = skip_verbatim(chars, i);
            continue;
        }
        i += 1;
        if c == close {
            return i;
        }
    }
    chars.len()
}
