#![deny(clippy::all)]

/**
 * CSS Modules
 *
 * Scopes class, id and keyframes names of a stylesheet into unique tokens,
 * resolves `:import` / `composes` / `@value` references across files, and
 * returns the mapping from local names to scoped names.
 */

// Syntax
pub mod ast;
pub mod emitter;
pub mod parse_util;
pub mod parser;
pub mod util;

// Scoping
pub mod keyframes;
pub mod scoped_name;
pub mod selector;
pub mod token_table;

// Pipeline
pub mod composition;
pub mod icss;
pub mod loader;
pub mod module;
pub mod values;

// Host surface
pub mod config;
pub mod error;
pub mod exports;
pub mod file_system;
pub mod logging;
pub mod processor;

pub use config::{LocalsConvention, ModulesConfig, Options, ScopeBehaviour};
pub use error::{CssModulesError, ErrorKind, Result};
pub use exports::ExportMap;
pub use file_system::{
    AbsoluteFsPath, DefaultResolver, DiskFileLoader, FileLoader, InMemoryFileLoader, PathResolver,
};
pub use logging::{ConsoleLogger, FacadeLogger, LogLevel, Logger, NullLogger};
pub use processor::{Dependency, ProcessResult, Processor};
pub use scoped_name::{NamePattern, ScopedNameGenerator};
pub use token_table::{Origin, TokenFlags, TokenTable};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
