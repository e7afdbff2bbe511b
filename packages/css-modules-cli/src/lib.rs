#![deny(clippy::all)]

/**
 * CSS Modules CLI
 *
 * Batch front end over the `css-modules` library: config discovery, input
 * expansion and output writing.
 */
pub use css_modules as modules;

pub mod batch;
pub mod config;

/// CLI version
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
