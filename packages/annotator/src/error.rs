use thiserror::Error;
use ts::FileId;

/// Failures that stop a file from being processed at all. Problems inside a file that
/// still produce output are reported as `ts::Diagnostic`s instead.
#[derive(Debug, Error)]
pub enum AnnotatorError {
    #[error("failed to parse {file_name}: {}", .messages.join("; "))]
    Parse {
        file_name: String,
        messages: Vec<String>,
    },

    #[error("source file {0} was already added to the program")]
    DuplicateFile(String),

    #[error("no source file with id {0:?} in the program")]
    UnknownFile(FileId),

    #[error("failed to encode source map for {0}")]
    SourceMap(String),

    #[error("invalid annotator configuration: {0}")]
    Config(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
