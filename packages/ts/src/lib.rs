//! TypeScript-compatible syntax, symbol and diagnostic types for the decorator annotator.
//! This crate serves as the shared model between the program front-end and the transform.

use std::fmt;

pub mod comments;
pub mod node;
pub mod type_checker;

pub use comments::*;
pub use node::*;
pub use type_checker::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DiagnosticCategory {
    Warning,
    Error,
    Suggestion,
    Message,
}

impl fmt::Display for DiagnosticCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DiagnosticCategory::Warning => "Warning",
            DiagnosticCategory::Error => "Error",
            DiagnosticCategory::Suggestion => "Suggestion",
            DiagnosticCategory::Message => "Message",
        };
        f.write_str(name)
    }
}

// --- Diagnostic Structures ---

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiagnosticMessageChain {
    String(String),
    Chain {
        message_text: String,
        category: DiagnosticCategory,
        code: i32,
        next: Option<Vec<DiagnosticMessageChain>>,
    },
}

impl DiagnosticMessageChain {
    pub fn new(message: impl Into<String>) -> Self {
        Self::String(message.into())
    }

    /// Head message of the chain.
    pub fn message_text(&self) -> &str {
        match self {
            DiagnosticMessageChain::String(s) => s,
            DiagnosticMessageChain::Chain { message_text, .. } => message_text,
        }
    }

    /// Renders the whole chain, one message per line, nested messages indented by two spaces.
    pub fn flatten(&self) -> String {
        let mut out = String::new();
        self.flatten_into(&mut out, 0);
        out
    }

    fn flatten_into(&self, out: &mut String, indent: usize) {
        if indent > 0 {
            out.push('\n');
            out.push_str(&"  ".repeat(indent));
        }
        out.push_str(self.message_text());
        if let DiagnosticMessageChain::Chain {
            next: Some(next), ..
        } = self
        {
            for chain in next {
                chain.flatten_into(out, indent + 1);
            }
        }
    }
}

impl From<String> for DiagnosticMessageChain {
    fn from(s: String) -> Self {
        DiagnosticMessageChain::String(s)
    }
}

impl From<&str> for DiagnosticMessageChain {
    fn from(s: &str) -> Self {
        DiagnosticMessageChain::String(s.to_string())
    }
}

impl fmt::Display for DiagnosticMessageChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.flatten())
    }
}

/// A problem found while processing a source file. `start` and `length` are byte offsets
/// into the text of `file`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub category: DiagnosticCategory,
    pub code: i32,
    pub file: Option<String>,
    pub start: usize,
    pub length: usize,
    pub message_text: DiagnosticMessageChain,
}

impl Diagnostic {
    pub fn error(
        file: impl Into<String>,
        start: usize,
        length: usize,
        message_text: impl Into<DiagnosticMessageChain>,
    ) -> Self {
        Diagnostic {
            category: DiagnosticCategory::Error,
            code: 0,
            file: Some(file.into()),
            start,
            length,
            message_text: message_text.into(),
        }
    }

    pub fn is_error(&self) -> bool {
        self.category == DiagnosticCategory::Error
    }
}

// --- Utilities ---

pub fn make_diagnostic_chain(
    message_text: String,
    next: Option<Vec<DiagnosticMessageChain>>,
) -> DiagnosticMessageChain {
    DiagnosticMessageChain::Chain {
        category: DiagnosticCategory::Message,
        code: 0,
        message_text,
        next,
    }
}
