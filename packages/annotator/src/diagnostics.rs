//! Human-readable rendering of diagnostics.

use ts::{Diagnostic, SourceFile};

/// Formats one diagnostic as `Error at file:line:col: message` (1-based line and column).
/// `source_file` resolves the diagnostic's file name to its text.
pub fn format_diagnostic<'a>(
    diagnostic: &Diagnostic,
    source_file: impl Fn(&str) -> Option<&'a SourceFile>,
) -> String {
    let message = diagnostic.message_text.flatten();
    match diagnostic.file.as_deref() {
        Some(file_name) => match source_file(file_name) {
            Some(file) => {
                let location = file.line_and_character_of_position(diagnostic.start as u32);
                format!(
                    "{} at {}:{}:{}: {}",
                    diagnostic.category,
                    file_name,
                    location.line + 1,
                    location.character + 1,
                    message
                )
            }
            None => format!("{} at {}: {}", diagnostic.category, file_name, message),
        },
        None => format!("{}: {}", diagnostic.category, message),
    }
}

/// Formats diagnostics one per line.
pub fn format_diagnostics<'a>(
    diagnostics: &[Diagnostic],
    source_file: impl Fn(&str) -> Option<&'a SourceFile> + Copy,
) -> String {
    diagnostics
        .iter()
        .map(|diagnostic| format_diagnostic(diagnostic, source_file))
        .collect::<Vec<_>>()
        .join("\n")
}
