// Annotation Classifier
//
// Decides whether a decorator should be lowered. A decorator qualifies when one of the
// declarations of the function it invokes carries the annotation marker in a leading
// comment.

use ts::{NodeId, NodeKind, NodeRef, SourceFile, SymbolFlags, TypeChecker};

/// Declarations of the value a decorator invokes. Only identifier heads (`@Foo`, `@Foo(..)`,
/// `@Foo(..)(..)`) resolve; any other shape yields nothing.
pub fn get_decorator_declarations(
    checker: &dyn TypeChecker,
    file: &SourceFile,
    decorator: NodeId,
) -> Vec<NodeRef> {
    let NodeKind::Decorator(expression) = file.kind(decorator) else {
        return Vec::new();
    };
    let Some(head) = expression.head_identifier() else {
        return Vec::new();
    };
    let Some(mut symbol) = checker.get_symbol_at_location(file.id(), head) else {
        return Vec::new();
    };
    if symbol.flags.contains(SymbolFlags::ALIAS) {
        if let Some(aliased) = checker.get_aliased_symbol(&symbol) {
            symbol = aliased;
        }
    }
    symbol.declarations
}

/// Whether `decorator` invokes a declaration marked with `marker`.
pub fn is_annotation(
    checker: &dyn TypeChecker,
    file: &SourceFile,
    decorator: NodeId,
    marker: &str,
) -> bool {
    get_decorator_declarations(checker, file, decorator)
        .into_iter()
        .any(|declaration| declaration_has_marker(checker, declaration, marker))
}

fn declaration_has_marker(checker: &dyn TypeChecker, declaration: NodeRef, marker: &str) -> bool {
    let Some(file) = checker.get_source_file(declaration.file) else {
        return false;
    };
    let Some(carrier) = comment_carrier(file, declaration.node) else {
        return false;
    };
    file.get_leading_comment_ranges(carrier)
        .iter()
        .any(|comment| comment.get_text(file.text()).contains(marker))
}

/// Node whose leading comments document `declaration`. For `let Foo` that is the enclosing
/// statement, two levels up from the declarator.
fn comment_carrier(file: &SourceFile, declaration: NodeId) -> Option<NodeId> {
    file.parent(declaration)?;
    if !matches!(file.kind(declaration), NodeKind::VariableDeclaration { .. }) {
        return Some(declaration);
    }
    let list = file.parent(declaration)?;
    match file.parent(list) {
        Some(statement) if matches!(file.kind(statement), NodeKind::VariableStatement) => {
            Some(statement)
        }
        _ => Some(list),
    }
}
