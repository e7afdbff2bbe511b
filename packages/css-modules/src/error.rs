// Errors
//
// Every failure aborts the current invocation and carries enough context
// (file, name, line:col) to locate the offending source.

use crate::parse_util::SourceLocation;
use thiserror::Error;

/// Broad classification of a [`CssModulesError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    ResolutionError,
    CyclicCompositionError,
    PureModeViolation,
    NestedGlobalLocalError,
    InvalidComposition,
    InvalidConfig,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum CssModulesError {
    #[error("{file}:{location}: cannot resolve \"{specifier}\": {reason}")]
    UnresolvedPath {
        file: String,
        specifier: String,
        reason: String,
        location: SourceLocation,
    },

    #[error("{file}:{location}: \"{name}\" is not exported by \"{source_path}\"")]
    MissingExport {
        file: String,
        name: String,
        source_path: String,
        location: SourceLocation,
    },

    #[error("{file}:{location}: cyclic composition of \"{name}\" ({})", .chain.join(" -> "))]
    CyclicComposition {
        file: String,
        name: String,
        chain: Vec<String>,
        location: SourceLocation,
    },

    #[error("{file}:{location}: selector \"{selector}\" is not pure (pure selectors must contain at least one local class or id)")]
    PureModeViolation {
        file: String,
        selector: String,
        location: SourceLocation,
    },

    #[error("{file}:{location}: a :global or :local wrapper is nested in \"{selector}\"")]
    NestedGlobalLocal {
        file: String,
        selector: String,
        location: SourceLocation,
    },

    #[error("{file}:{location}: composition is only allowed when selector is a single local class name, not in \"{selector}\"")]
    InvalidComposition {
        file: String,
        selector: String,
        location: SourceLocation,
    },

    #[error("{file}:{location}: \"{name}\" is a value, not a class, and cannot be composed")]
    ComposesLiteral {
        file: String,
        name: String,
        location: SourceLocation,
    },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

impl CssModulesError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            CssModulesError::UnresolvedPath { .. } | CssModulesError::MissingExport { .. } => {
                ErrorKind::ResolutionError
            }
            CssModulesError::CyclicComposition { .. } => ErrorKind::CyclicCompositionError,
            CssModulesError::PureModeViolation { .. } => ErrorKind::PureModeViolation,
            CssModulesError::NestedGlobalLocal { .. } => ErrorKind::NestedGlobalLocalError,
            CssModulesError::InvalidComposition { .. } | CssModulesError::ComposesLiteral { .. } => {
                ErrorKind::InvalidComposition
            }
            CssModulesError::InvalidConfig(_) => ErrorKind::InvalidConfig,
        }
    }

    /// The file the error was raised in, if any.
    pub fn file(&self) -> Option<&str> {
        match self {
            CssModulesError::UnresolvedPath { file, .. }
            | CssModulesError::MissingExport { file, .. }
            | CssModulesError::CyclicComposition { file, .. }
            | CssModulesError::PureModeViolation { file, .. }
            | CssModulesError::NestedGlobalLocal { file, .. }
            | CssModulesError::InvalidComposition { file, .. }
            | CssModulesError::ComposesLiteral { file, .. } => Some(file),
            CssModulesError::InvalidConfig(_) => None,
        }
    }

    pub fn location(&self) -> Option<SourceLocation> {
        match self {
            CssModulesError::UnresolvedPath { location, .. }
            | CssModulesError::MissingExport { location, .. }
            | CssModulesError::CyclicComposition { location, .. }
            | CssModulesError::PureModeViolation { location, .. }
            | CssModulesError::NestedGlobalLocal { location, .. }
            | CssModulesError::InvalidComposition { location, .. }
            | CssModulesError::ComposesLiteral { location, .. } => Some(*location),
            CssModulesError::InvalidConfig(_) => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, CssModulesError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_format_cycle_chain() {
        let err = CssModulesError::CyclicComposition {
            file: "/a.css".to_string(),
            name: "a".to_string(),
            chain: vec!["a".to_string(), "b".to_string(), "a".to_string()],
            location: SourceLocation::new(0, 2, 5),
        };
        assert_eq!(
            err.to_string(),
            "/a.css:2:5: cyclic composition of \"a\" (a -> b -> a)"
        );
        assert_eq!(err.kind(), ErrorKind::CyclicCompositionError);
    }

    #[test]
    fn should_classify_resolution_errors() {
        let err = CssModulesError::MissingExport {
            file: "/a.css".to_string(),
            name: "x".to_string(),
            source_path: "./b.css".to_string(),
            location: SourceLocation::default(),
        };
        assert_eq!(err.kind(), ErrorKind::ResolutionError);
        assert_eq!(err.file(), Some("/a.css"));
    }
}
