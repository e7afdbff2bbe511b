// File System
//
// Normalized absolute paths, the injectable file loader and the specifier
// resolution strategy used by the dependency loader.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use thiserror::Error;

/// Regex to match a URL scheme such as `http:` or `data:`.
static URL_WITH_SCHEMA_REGEXP: Lazy<Regex> = Lazy::new(|| Regex::new(r"^([^:/?#]+):").unwrap());

/// A fully qualified path in POSIX form, with `.` and `..` resolved lexically.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct AbsoluteFsPath(String);

impl AbsoluteFsPath {
    pub fn new(path: &str) -> Self {
        AbsoluteFsPath(normalize(path))
    }

    pub fn from_path<P: AsRef<Path>>(path: P) -> Self {
        Self::new(&path.as_ref().to_string_lossy())
    }

    /// Resolve `relative` against the directory `base`.
    pub fn resolve(base: &AbsoluteFsPath, relative: &str) -> Self {
        if is_rooted(relative) {
            Self::new(relative)
        } else {
            Self::new(&format!("{}/{}", base.0, relative))
        }
    }

    pub fn join(&self, segment: &str) -> Self {
        Self::resolve(self, segment)
    }

    pub fn dirname(&self) -> Self {
        self.parent().unwrap_or_else(|| self.clone())
    }

    /// The containing directory, or `None` at the root.
    pub fn parent(&self) -> Option<Self> {
        let idx = self.0.rfind('/')?;
        let root_len = root_prefix(&self.0).len();
        if self.0.len() <= root_len {
            return None;
        }
        if idx < root_len {
            Some(AbsoluteFsPath(self.0[..root_len].to_string()))
        } else {
            Some(AbsoluteFsPath(self.0[..idx].to_string()))
        }
    }

    pub fn file_name(&self) -> &str {
        self.0.rsplit('/').next().unwrap_or("")
    }

    /// The path relative to `base`, with `/` separators and no leading `./`.
    pub fn relative_to(&self, base: &AbsoluteFsPath) -> String {
        let from: Vec<&str> = base.segments().collect();
        let to: Vec<&str> = self.segments().collect();
        if root_prefix(&self.0) != root_prefix(&base.0) {
            return self.0.clone();
        }
        let common = from.iter().zip(&to).take_while(|(a, b)| a == b).count();
        let mut parts: Vec<&str> = std::iter::repeat("..").take(from.len() - common).collect();
        parts.extend(&to[common..]);
        parts.join("/")
    }

    fn segments(&self) -> impl Iterator<Item = &str> {
        self.0[root_prefix(&self.0).len()..]
            .split('/')
            .filter(|s| !s.is_empty())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn as_path(&self) -> &Path {
        Path::new(&self.0)
    }
}

impl AsRef<str> for AbsoluteFsPath {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl AsRef<Path> for AbsoluteFsPath {
    fn as_ref(&self) -> &Path {
        Path::new(&self.0)
    }
}

impl fmt::Display for AbsoluteFsPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

fn is_rooted(path: &str) -> bool {
    path.starts_with('/') || path.starts_with('\\') || has_drive(path)
}

fn has_drive(path: &str) -> bool {
    let bytes = path.as_bytes();
    bytes.len() >= 2 && bytes[0].is_ascii_alphabetic() && bytes[1] == b':'
}

fn root_prefix(path: &str) -> &str {
    if has_drive(path) {
        &path[..3.min(path.len())]
    } else {
        "/"
    }
}

fn normalize(path: &str) -> String {
    let path = path.replace('\\', "/");
    let (root, rest) = if has_drive(&path) {
        (format!("{}/", &path[..2]), path[2..].to_string())
    } else {
        ("/".to_string(), path)
    };
    let mut segments: Vec<&str> = Vec::new();
    for segment in rest.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            other => segments.push(other),
        }
    }
    format!("{}{}", root, segments.join("/"))
}

/// True when `specifier` can be resolved to a file, i.e. it is not empty and
/// carries no URL scheme. A single-letter scheme is a Windows drive.
pub fn is_specifier_resolvable(specifier: &str) -> bool {
    if specifier.trim().is_empty() {
        return false;
    }
    match URL_WITH_SCHEMA_REGEXP.captures(specifier) {
        Some(caps) => {
            let schema = caps.get(1).map(|m| m.as_str()).unwrap_or("");
            schema.len() == 1 && schema.chars().all(|c| c.is_ascii_alphabetic())
        }
        None => true,
    }
}

/// File load error.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct LoadError {
    pub path: String,
    pub message: String,
}

impl LoadError {
    pub fn not_found(path: &AbsoluteFsPath) -> Self {
        Self {
            path: path.to_string(),
            message: format!("file not found: {}", path),
        }
    }

    pub fn load_failed(path: &AbsoluteFsPath, reason: &str) -> Self {
        Self {
            path: path.to_string(),
            message: format!("failed to read {}: {}", path, reason),
        }
    }
}

/// Host-supplied file access.
pub trait FileLoader {
    fn read(&self, path: &AbsoluteFsPath) -> Result<String, LoadError>;
    fn exists(&self, path: &AbsoluteFsPath) -> bool;
    /// Context directory used when no root is configured.
    fn cwd(&self) -> AbsoluteFsPath;
}

/// In-memory file loader. Counts reads per path.
#[derive(Debug)]
pub struct InMemoryFileLoader {
    files: HashMap<AbsoluteFsPath, String>,
    reads: RefCell<HashMap<AbsoluteFsPath, usize>>,
    cwd: AbsoluteFsPath,
}

impl Default for InMemoryFileLoader {
    fn default() -> Self {
        Self {
            files: HashMap::new(),
            reads: RefCell::new(HashMap::new()),
            cwd: AbsoluteFsPath::new("/"),
        }
    }
}

impl InMemoryFileLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_cwd(mut self, cwd: &str) -> Self {
        self.cwd = AbsoluteFsPath::new(cwd);
        self
    }

    pub fn add(&mut self, path: &str, content: &str) {
        self.files.insert(AbsoluteFsPath::new(path), content.to_string());
    }

    pub fn read_count(&self, path: &str) -> usize {
        self.reads
            .borrow()
            .get(&AbsoluteFsPath::new(path))
            .copied()
            .unwrap_or(0)
    }
}

impl FileLoader for InMemoryFileLoader {
    fn read(&self, path: &AbsoluteFsPath) -> Result<String, LoadError> {
        let content = self
            .files
            .get(path)
            .cloned()
            .ok_or_else(|| LoadError::not_found(path))?;
        *self.reads.borrow_mut().entry(path.clone()).or_insert(0) += 1;
        Ok(content)
    }

    fn exists(&self, path: &AbsoluteFsPath) -> bool {
        self.files.contains_key(path)
    }

    fn cwd(&self) -> AbsoluteFsPath {
        self.cwd.clone()
    }
}

/// File loader backed by the real file system.
#[derive(Debug, Clone)]
pub struct DiskFileLoader {
    cwd: AbsoluteFsPath,
}

impl DiskFileLoader {
    pub fn new(cwd: AbsoluteFsPath) -> Self {
        Self { cwd }
    }

    pub fn from_current_dir() -> std::io::Result<Self> {
        Ok(Self::new(AbsoluteFsPath::from_path(std::env::current_dir()?)))
    }
}

impl FileLoader for DiskFileLoader {
    fn read(&self, path: &AbsoluteFsPath) -> Result<String, LoadError> {
        std::fs::read_to_string(path.as_path()).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => LoadError::not_found(path),
            _ => LoadError::load_failed(path, &e.to_string()),
        })
    }

    fn exists(&self, path: &AbsoluteFsPath) -> bool {
        path.as_path().is_file()
    }

    fn cwd(&self) -> AbsoluteFsPath {
        self.cwd.clone()
    }
}

/// Strategy turning an import specifier into an absolute path.
pub trait PathResolver {
    fn resolve(
        &self,
        specifier: &str,
        from: &AbsoluteFsPath,
        loader: &dyn FileLoader,
    ) -> Result<AbsoluteFsPath, String>;
}

/// Relative paths resolve against the importing file's directory. Bare and
/// `~`-prefixed specifiers are searched in ancestor `node_modules` folders.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultResolver;

impl PathResolver for DefaultResolver {
    fn resolve(
        &self,
        specifier: &str,
        from: &AbsoluteFsPath,
        loader: &dyn FileLoader,
    ) -> Result<AbsoluteFsPath, String> {
        if !is_specifier_resolvable(specifier) {
            return Err("specifiers with a URL scheme cannot be resolved".to_string());
        }
        let dir = from.dirname();

        if is_rooted(specifier) || specifier.starts_with("./") || specifier.starts_with("../") {
            let candidate = AbsoluteFsPath::resolve(&dir, specifier);
            return if loader.exists(&candidate) {
                Ok(candidate)
            } else {
                Err(format!("file not found: {}", candidate))
            };
        }

        let (bare, module_only) = match specifier.strip_prefix('~') {
            Some(rest) => (rest.trim_start_matches('/'), true),
            None => (specifier, false),
        };
        if !module_only {
            let candidate = dir.join(bare);
            if loader.exists(&candidate) {
                return Ok(candidate);
            }
        }

        let mut current = Some(dir.clone());
        while let Some(directory) = current {
            let candidate = directory.join("node_modules").join(bare);
            if loader.exists(&candidate) {
                return Ok(candidate);
            }
            current = directory.parent();
        }
        Err(format!(
            "not found relative to {} or in any node_modules directory",
            dir
        ))
    }
}
