//! Decorator annotator
//!
//! Lowers decorators whose declarations are marked as annotations into static metadata
//! fields on the decorated class, leaving the rest of each file byte-for-byte intact.

pub mod compile;
pub mod config;
pub mod diagnostics;
pub mod error;
pub mod logging;
pub mod program;
pub mod sourcemaps;
pub mod transform;

pub use config::{AnnotatorOptions, EmitMode};
pub use error::AnnotatorError;
pub use program::Program;
pub use transform::{convert_decorators, DecoratorOutput};

/// Annotator version
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
