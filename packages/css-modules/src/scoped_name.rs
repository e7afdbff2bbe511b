//! Scoped-Name Generator
//!
//! Maps `(local name, file path, file content)` to a unique, deterministic
//! selector identifier. Literal patterns are expanded by placeholder
//! substitution; custom patterns delegate to a host function.

use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use std::fmt;
use std::sync::Arc;
use xxhash_rust::xxh3::xxh3_128;

pub const DEFAULT_PATTERN: &str = "_[local]_[hash:base64:5]";

const DEFAULT_HASH_LENGTH: usize = 8;

static PLACEHOLDER_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\[(local|name|ext|folder|path|hash|contenthash)(?::([a-z0-9]+))?(?::(\d+))?\]")
        .unwrap()
});

/// `(local, file_path, content) -> scoped name`
pub type ScopedNameFn = Arc<dyn Fn(&str, &str, &str) -> String + Send + Sync>;

/// How scoped names are produced.
#[derive(Clone)]
pub enum NamePattern {
    /// A template such as `[name]__[local]___[hash:base64:5]`.
    Literal(String),
    Custom(ScopedNameFn),
}

impl NamePattern {
    pub fn custom<F>(f: F) -> Self
    where
        F: Fn(&str, &str, &str) -> String + Send + Sync + 'static,
    {
        NamePattern::Custom(Arc::new(f))
    }
}

impl Default for NamePattern {
    fn default() -> Self {
        NamePattern::Literal(DEFAULT_PATTERN.to_string())
    }
}

impl fmt::Debug for NamePattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NamePattern::Literal(pattern) => f.debug_tuple("Literal").field(pattern).finish(),
            NamePattern::Custom(_) => f.write_str("Custom(<fn>)"),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ScopedNameGenerator {
    pattern: NamePattern,
    hash_prefix: String,
}

impl ScopedNameGenerator {
    pub fn new(pattern: NamePattern, hash_prefix: impl Into<String>) -> Self {
        ScopedNameGenerator {
            pattern,
            hash_prefix: hash_prefix.into(),
        }
    }

    /// `file_path` is the context-relative path of the file.
    pub fn generate(&self, local: &str, file_path: &str, content: &str) -> String {
        match &self.pattern {
            NamePattern::Custom(f) => f(local, file_path, content),
            NamePattern::Literal(template) => {
                sanitize_identifier(&self.expand(template, local, file_path, content))
            }
        }
    }

    fn expand(&self, template: &str, local: &str, file_path: &str, content: &str) -> String {
        let parts = PathParts::new(file_path);
        PLACEHOLDER_RE
            .replace_all(template, |caps: &Captures| {
                let whole = caps.get(0).map(|m| m.as_str()).unwrap_or("");
                let encoding = caps.get(2).map(|m| m.as_str());
                let length = caps.get(3).and_then(|m| m.as_str().parse::<usize>().ok());
                match &caps[1] {
                    "local" => local.to_string(),
                    "name" => parts.name.to_string(),
                    "ext" => parts.ext.to_string(),
                    "folder" => parts.folder.to_string(),
                    "path" => parts.path.clone(),
                    kind => {
                        let digest = if kind == "hash" {
                            self.digest(local, file_path, content)
                        } else {
                            xxh3_128(content.as_bytes())
                        };
                        encode_digest(digest, encoding, length).unwrap_or_else(|| whole.to_string())
                    }
                }
            })
            .into_owned()
    }

    fn digest(&self, local: &str, file_path: &str, content: &str) -> u128 {
        let mut input = Vec::with_capacity(
            self.hash_prefix.len() + file_path.len() + local.len() + content.len() + 2,
        );
        input.extend_from_slice(self.hash_prefix.as_bytes());
        input.extend_from_slice(file_path.as_bytes());
        input.push(0);
        input.extend_from_slice(local.as_bytes());
        input.push(0);
        input.extend_from_slice(content.as_bytes());
        xxh3_128(&input)
    }
}

struct PathParts<'a> {
    name: &'a str,
    ext: &'a str,
    folder: &'a str,
    path: String,
}

impl<'a> PathParts<'a> {
    fn new(file_path: &'a str) -> Self {
        let (dir, file) = match file_path.rfind('/') {
            Some(idx) => (&file_path[..idx], &file_path[idx + 1..]),
            None => ("", file_path),
        };
        let (name, ext) = match file.rfind('.') {
            Some(idx) if idx > 0 => (&file[..idx], &file[idx + 1..]),
            _ => (file, ""),
        };
        let folder = dir.rsplit('/').next().unwrap_or("");
        let path = if dir.is_empty() {
            String::new()
        } else {
            format!("{}/", dir.trim_start_matches('/'))
        };
        PathParts {
            name,
            ext,
            folder,
            path,
        }
    }
}

/// Encode a digest; `encoding` may also be a bare length (`[hash:6]`).
fn encode_digest(digest: u128, encoding: Option<&str>, length: Option<usize>) -> Option<String> {
    let (encoding, length) = match (encoding, length) {
        (Some(enc), None) if enc.bytes().all(|b| b.is_ascii_digit()) => {
            ("base64", enc.parse::<usize>().ok())
        }
        (Some(enc), length) => (enc, length),
        (None, length) => ("base64", length.or(Some(DEFAULT_HASH_LENGTH))),
    };
    let encoded = match encoding {
        "hex" => format!("{:032x}", digest),
        "base64" => base64_url(&digest.to_be_bytes()),
        "base36" => base36(digest),
        _ => return None,
    };
    Some(match length {
        Some(n) if n < encoded.len() => encoded[..n].to_string(),
        _ => encoded,
    })
}

const BASE64_URL_CHARS: &[u8; 64] =
    b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789-_";

/// Unpadded base64 with the url-safe alphabet.
fn base64_url(bytes: &[u8]) -> String {
    let mut out = String::with_capacity((bytes.len() * 4 + 2) / 3);
    for chunk in bytes.chunks(3) {
        let b0 = chunk[0] as u32;
        let b1 = chunk.get(1).copied().unwrap_or(0) as u32;
        let b2 = chunk.get(2).copied().unwrap_or(0) as u32;
        let triple = (b0 << 16) | (b1 << 8) | b2;
        out.push(BASE64_URL_CHARS[((triple >> 18) & 0x3F) as usize] as char);
        out.push(BASE64_URL_CHARS[((triple >> 12) & 0x3F) as usize] as char);
        if chunk.len() > 1 {
            out.push(BASE64_URL_CHARS[((triple >> 6) & 0x3F) as usize] as char);
        }
        if chunk.len() > 2 {
            out.push(BASE64_URL_CHARS[(triple & 0x3F) as usize] as char);
        }
    }
    out
}

fn base36(mut value: u128) -> String {
    const DIGITS: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";
    if value == 0 {
        return "0".to_string();
    }
    let mut out = Vec::new();
    while value > 0 {
        out.push(DIGITS[(value % 36) as usize]);
        value /= 36;
    }
    out.iter().rev().map(|&b| b as char).collect()
}

/// Make `name` a valid selector identifier.
pub fn sanitize_identifier(name: &str) -> String {
    let mut out: String = name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '_' || c == '-' {
                c
            } else {
                '_'
            }
        })
        .collect();
    if out.is_empty() {
        return "_".to_string();
    }
    let bytes = out.as_bytes();
    let needs_prefix = bytes[0].is_ascii_digit()
        || (bytes[0] == b'-' && bytes.get(1).map_or(false, |b| b.is_ascii_digit()));
    if needs_prefix {
        out.insert(0, '_');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_expand_path_placeholders() {
        let generator = ScopedNameGenerator::new(
            NamePattern::Literal("[path][name]__[local]_[ext]_[folder]".to_string()),
            "",
        );
        assert_eq!(
            generator.generate("title", "src/card/button.module.css", ""),
            "src_card_button_module__title_css_card"
        );
    }

    #[test]
    fn should_honor_hash_encoding_and_length() {
        let generator =
            ScopedNameGenerator::new(NamePattern::Literal("[hash:hex:10]".to_string()), "");
        let name = generator.generate("a", "a.css", ".a{}");
        assert_eq!(name.len(), 10);
        assert!(name.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn should_treat_numeric_encoding_as_length() {
        let generator = ScopedNameGenerator::new(NamePattern::Literal("x[hash:6]".to_string()), "");
        assert_eq!(generator.generate("a", "a.css", "").len(), 7);
    }

    #[test]
    fn should_leave_unknown_encodings_verbatim() {
        let generator =
            ScopedNameGenerator::new(NamePattern::Literal("[local][hash:md5:4]".to_string()), "");
        assert_eq!(generator.generate("a", "a.css", ""), "a_hash_md5_4_");
    }

    #[test]
    fn should_vary_hash_with_prefix() {
        let plain = ScopedNameGenerator::new(NamePattern::default(), "");
        let prefixed = ScopedNameGenerator::new(NamePattern::default(), "app");
        assert_ne!(
            plain.generate("a", "a.css", ".a{}"),
            prefixed.generate("a", "a.css", ".a{}")
        );
    }

    #[test]
    fn should_not_sanitize_custom_output() {
        let generator = ScopedNameGenerator::new(NamePattern::custom(|local, _, _| format!("{}.x", local)), "");
        assert_eq!(generator.generate("a", "a.css", ""), "a.x");
    }

    #[test]
    fn should_sanitize_identifiers() {
        assert_eq!(sanitize_identifier("1abc"), "_1abc");
        assert_eq!(sanitize_identifier("-1abc"), "_-1abc");
        assert_eq!(sanitize_identifier("a/b.c"), "a_b_c");
        assert_eq!(sanitize_identifier(""), "_");
    }

    #[test]
    fn should_encode_base36() {
        assert_eq!(base36(0), "0");
        assert_eq!(base36(35), "z");
        assert_eq!(base36(36), "10");
    }

    #[test]
    fn should_encode_base64_url() {
        assert_eq!(base64_url(b"\xfb\xff"), "-_8");
        assert_eq!(base64_url(b"Man"), "TWFu");
    }
}
