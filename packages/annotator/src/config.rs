use crate::error::AnnotatorError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Shape of the metadata the transform appends to each class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum EmitMode {
    /// Initialized static fields, evaluated at runtime.
    #[default]
    Runtime,
    /// Uninitialized `static declare` fields carrying Closure JSDoc types.
    Declarations,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AnnotatorOptions {
    pub emit_mode: EmitMode,
    /// Text that marks a decorator declaration as an annotation when it appears in one of
    /// the declaration's leading comments.
    pub annotation_marker: String,
    pub source_map: bool,
}

impl Default for AnnotatorOptions {
    fn default() -> Self {
        AnnotatorOptions {
            emit_mode: EmitMode::Runtime,
            annotation_marker: "@Annotation".to_string(),
            source_map: false,
        }
    }
}

impl AnnotatorOptions {
    pub fn load(path: &Path) -> Result<Self, AnnotatorError> {
        let content = fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    pub fn from_json(content: &str) -> Result<Self, AnnotatorError> {
        let options: AnnotatorOptions = serde_json::from_str(content)?;
        Ok(options)
    }
}
