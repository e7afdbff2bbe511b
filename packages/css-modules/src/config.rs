//! Configuration
//!
//! [`Options`] is what the engine reads. [`ModulesConfig`] is its serializable
//! subset, deserialized from JSON by hosts such as the CLI.

use crate::error::{CssModulesError, Result};
use crate::exports::ExportMap;
use crate::file_system::AbsoluteFsPath;
use crate::scoped_name::{NamePattern, ScopedNameGenerator};
use crate::selector::Mode;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Default scoping of a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScopeBehaviour {
    #[default]
    #[serde(alias = "LOCAL")]
    Local,
    #[serde(alias = "GLOBAL")]
    Global,
    #[serde(alias = "PURE")]
    Pure,
}

impl ScopeBehaviour {
    pub fn mode(self) -> Mode {
        match self {
            ScopeBehaviour::Local => Mode::Local,
            ScopeBehaviour::Global => Mode::Global,
            ScopeBehaviour::Pure => Mode::Pure,
        }
    }
}

/// `(local, value, file) -> key`
pub type LocalsConventionFn = Arc<dyn Fn(&str, &str, &AbsoluteFsPath) -> String + Send + Sync>;

/// `(file, exports)`, called once per processed file.
pub type GetJsonFn = Arc<dyn Fn(&AbsoluteFsPath, &ExportMap) + Send + Sync>;

/// Key naming of the export object.
#[derive(Clone, Default)]
pub enum LocalsConvention {
    #[default]
    AsIs,
    CamelCase,
    CamelCaseOnly,
    Dashes,
    DashesOnly,
    Custom(LocalsConventionFn),
}

impl fmt::Debug for LocalsConvention {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LocalsConvention::AsIs => f.write_str("AsIs"),
            LocalsConvention::CamelCase => f.write_str("CamelCase"),
            LocalsConvention::CamelCaseOnly => f.write_str("CamelCaseOnly"),
            LocalsConvention::Dashes => f.write_str("Dashes"),
            LocalsConvention::DashesOnly => f.write_str("DashesOnly"),
            LocalsConvention::Custom(_) => f.write_str("Custom(<fn>)"),
        }
    }
}

/// Serializable names of the built-in conventions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ConventionName {
    AsIs,
    CamelCase,
    CamelCaseOnly,
    Dashes,
    DashesOnly,
}

impl From<ConventionName> for LocalsConvention {
    fn from(name: ConventionName) -> Self {
        match name {
            ConventionName::AsIs => LocalsConvention::AsIs,
            ConventionName::CamelCase => LocalsConvention::CamelCase,
            ConventionName::CamelCaseOnly => LocalsConvention::CamelCaseOnly,
            ConventionName::Dashes => LocalsConvention::Dashes,
            ConventionName::DashesOnly => LocalsConvention::DashesOnly,
        }
    }
}

#[derive(Clone, Default)]
pub struct Options {
    pub generate_scoped_name: NamePattern,
    pub scope_behaviour: ScopeBehaviour,
    /// Files whose path matches one of these are always GLOBAL.
    pub global_module_paths: Vec<Regex>,
    pub export_globals: bool,
    pub locals_convention: LocalsConvention,
    pub hash_prefix: String,
    /// Context directory. Defaults to the loader's cwd.
    pub root: Option<AbsoluteFsPath>,
    pub emit_export_rule: bool,
    /// Put the dependencies' CSS, in post-order, ahead of the root's CSS.
    pub inline_dependencies: bool,
    /// Drop rules left without declarations, such as composes-only rules.
    pub remove_empty_rules: bool,
    pub get_json: Option<GetJsonFn>,
}

impl fmt::Debug for Options {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Options")
            .field("generate_scoped_name", &self.generate_scoped_name)
            .field("scope_behaviour", &self.scope_behaviour)
            .field("global_module_paths", &self.global_module_paths)
            .field("export_globals", &self.export_globals)
            .field("locals_convention", &self.locals_convention)
            .field("hash_prefix", &self.hash_prefix)
            .field("root", &self.root)
            .field("emit_export_rule", &self.emit_export_rule)
            .field("inline_dependencies", &self.inline_dependencies)
            .field("remove_empty_rules", &self.remove_empty_rules)
            .field("get_json", &self.get_json.as_ref().map(|_| "<fn>"))
            .finish()
    }
}

impl Options {
    /// Initial mode of `path`.
    pub fn file_mode(&self, path: &AbsoluteFsPath) -> Mode {
        if self
            .global_module_paths
            .iter()
            .any(|re| re.is_match(path.as_str()))
        {
            Mode::Global
        } else {
            self.scope_behaviour.mode()
        }
    }

    /// The path fed to the scoped-name generator.
    pub fn hash_path(&self, path: &AbsoluteFsPath, cwd: &AbsoluteFsPath) -> String {
        let root = self.root.as_ref().unwrap_or(cwd);
        path.relative_to(root)
    }

    pub fn name_generator(&self) -> ScopedNameGenerator {
        ScopedNameGenerator::new(self.generate_scoped_name.clone(), self.hash_prefix.clone())
    }
}

/// JSON form of [`Options`], in camelCase.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ModulesConfig {
    pub generate_scoped_name: Option<String>,
    pub scope_behaviour: ScopeBehaviour,
    pub global_module_paths: Vec<String>,
    pub export_globals: bool,
    pub locals_convention: Option<ConventionName>,
    pub hash_prefix: String,
    pub root: Option<String>,
    pub emit_export_rule: bool,
    pub inline_dependencies: bool,
    pub remove_empty_rules: bool,
}

impl ModulesConfig {
    pub fn into_options(self) -> Result<Options> {
        let global_module_paths = self
            .global_module_paths
            .iter()
            .map(|pattern| {
                Regex::new(pattern).map_err(|e| {
                    CssModulesError::InvalidConfig(format!(
                        "globalModulePaths entry \"{}\" is not a valid regex: {}",
                        pattern, e
                    ))
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Options {
            generate_scoped_name: self
                .generate_scoped_name
                .map(NamePattern::Literal)
                .unwrap_or_default(),
            scope_behaviour: self.scope_behaviour,
            global_module_paths,
            export_globals: self.export_globals,
            locals_convention: self.locals_convention.map(Into::into).unwrap_or_default(),
            hash_prefix: self.hash_prefix,
            root: self.root.as_deref().map(AbsoluteFsPath::new),
            emit_export_rule: self.emit_export_rule,
            inline_dependencies: self.inline_dependencies,
            remove_empty_rules: self.remove_empty_rules,
            get_json: None,
        })
    }
}
