// Source Rewriter
//
// Rebuilds a file by walking its syntax tree and copying source text range by range.
// Untouched regions come out byte-identical; hooks may drop ranges or insert new text.

use crate::sourcemaps::{Mapping, Position, PositionMap};
use ts::{Diagnostic, DiagnosticMessageChain, NodeId, SourceFile, TextSpan};

/// Consulted before the rewriter descends into a node.
pub trait RewriteHook {
    /// Returns true when the hook fully handled `node`, leaving the cursor at its end.
    fn maybe_process(&mut self, rewriter: &mut Rewriter<'_>, node: NodeId) -> bool;
}

/// Result of rewriting one file.
#[derive(Debug, Clone)]
pub struct RewriteOutput {
    pub output: String,
    pub diagnostics: Vec<Diagnostic>,
    pub position_map: Option<PositionMap>,
}

#[derive(Debug)]
pub struct Rewriter<'f> {
    file: &'f SourceFile,
    output: String,
    /// Source offset up to which input has been consumed.
    cursor: u32,
    /// Position of the end of `output`.
    position: Position,
    /// End of the most recently copied source range. Synthesized lines map here.
    last_source_offset: u32,
    position_map: Option<PositionMap>,
    diagnostics: Vec<Diagnostic>,
}

impl<'f> Rewriter<'f> {
    pub fn new(file: &'f SourceFile, track_positions: bool) -> Self {
        Rewriter {
            file,
            output: String::with_capacity(file.text().len()),
            cursor: 0,
            position: Position::default(),
            last_source_offset: 0,
            position_map: track_positions.then(PositionMap::new),
            diagnostics: Vec::new(),
        }
    }

    pub fn file(&self) -> &'f SourceFile {
        self.file
    }

    pub fn cursor(&self) -> u32 {
        self.cursor
    }

    pub fn output(&self) -> &str {
        &self.output
    }

    /// Rewrites the whole file.
    pub fn process(mut self, hook: &mut dyn RewriteHook) -> RewriteOutput {
        let root = self.file.root();
        self.visit(root, hook);
        self.finish()
    }

    pub fn finish(self) -> RewriteOutput {
        RewriteOutput {
            output: self.output,
            diagnostics: self.diagnostics,
            position_map: self.position_map,
        }
    }

    /// Offers `node` to the hook, falling back to a verbatim copy with children visited.
    pub fn visit(&mut self, node: NodeId, hook: &mut dyn RewriteHook) {
        if !hook.maybe_process(self, node) {
            self.write_node(node, hook);
        }
    }

    /// Copies `node`, visiting each child and copying the text between them.
    pub fn write_node(&mut self, node: NodeId, hook: &mut dyn RewriteHook) {
        let file = self.file;
        for &child in file.children(node) {
            self.copy_range(node, self.cursor, file.span(child).start);
            self.visit(child, hook);
        }
        self.copy_range(node, self.cursor, file.span(node).end);
    }

    /// Copies `[from, to)` of the source verbatim and moves the cursor to `to`.
    ///
    /// # Panics
    ///
    /// When the range is inverted or leaves the span of `node`. Either means a hook lost
    /// track of the cursor, so the output could no longer account for every input byte.
    pub fn copy_range(&mut self, node: NodeId, from: u32, to: u32) {
        let span = self.file.span(node);
        assert!(
            from <= to,
            "copy_range: start {} is after end {} in {}",
            from,
            to,
            self.describe(node)
        );
        assert!(
            span.start <= from && to <= span.end,
            "copy_range: [{}, {}) is outside of {}",
            from,
            to,
            self.describe(node)
        );
        self.write_source(from, to);
        self.cursor = to;
    }

    /// Drops the source up to `to` without copying it.
    pub fn skip(&mut self, node: NodeId, to: u32) {
        let span = self.file.span(node);
        assert!(
            self.cursor <= to && to <= span.end,
            "skip: cannot move cursor from {} to {} in {}",
            self.cursor,
            to,
            self.describe(node)
        );
        self.cursor = to;
    }

    /// Appends generated text. Each line it starts maps to the last copied source offset.
    pub fn emit(&mut self, text: &str) {
        for ch in text.chars() {
            self.push_char(ch);
            if ch == '\n' {
                self.add_mapping(self.last_source_offset);
            }
        }
    }

    /// Appends the source text of `span` without moving the cursor, mapped to where it
    /// came from.
    pub fn emit_source_text(&mut self, span: TextSpan) {
        let file = self.file;
        self.add_mapping(span.start);
        self.write_chars(file.text_of(span), span.start);
    }

    pub fn error(&mut self, node: NodeId, message: impl Into<DiagnosticMessageChain>) {
        let span = self.file.span(node);
        self.error_at(span, message);
    }

    pub fn error_at(&mut self, span: TextSpan, message: impl Into<DiagnosticMessageChain>) {
        self.diagnostics.push(Diagnostic::error(
            self.file.file_name(),
            span.start as usize,
            span.len() as usize,
            message,
        ));
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    fn write_source(&mut self, from: u32, to: u32) {
        if from == to {
            return;
        }
        let file = self.file;
        self.add_mapping(from);
        self.write_chars(file.text_of(TextSpan::new(from, to)), from);
        self.last_source_offset = to;
    }

    fn write_chars(&mut self, text: &str, source_start: u32) {
        let end = source_start + text.len() as u32;
        for (index, ch) in text.char_indices() {
            self.push_char(ch);
            let next = source_start + (index + ch.len_utf8()) as u32;
            if ch == '\n' && next < end {
                self.add_mapping(next);
            }
        }
    }

    fn push_char(&mut self, ch: char) {
        self.output.push(ch);
        if ch == '\n' {
            self.position.line += 1;
            self.position.column = 0;
        } else {
            self.position.column += ch.len_utf16() as u32;
        }
    }

    fn add_mapping(&mut self, source_offset: u32) {
        if let Some(map) = self.position_map.as_mut() {
            let original = self.file.line_and_character_of_position(source_offset);
            map.add(Mapping {
                generated: self.position,
                original: Position::new(original.line, original.character),
            });
        }
    }

    fn describe(&self, node: NodeId) -> String {
        let span = self.file.span(node);
        format!(
            "{} [{}, {}) of {}",
            self.file.kind(node).syntax_kind(),
            span.start,
            span.end,
            self.file.file_name()
        )
    }
}
