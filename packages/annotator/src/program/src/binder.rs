// Binder
//
// Parses a file with oxc and, in one walk, builds the file's syntax tree and its symbol
// table. Declarations are scoped by the text range of the construct that declares them.

use super::symbol_table::{Binding, SymbolTable};
use crate::error::AnnotatorError;
use oxc_allocator::Allocator;
use oxc_ast::ast;
use oxc_ast_visit::{walk, Visit};
use oxc_parser::Parser;
use oxc_span::{GetSpan, SourceType, Span};
use oxc_syntax::scope::ScopeFlags;
use ts::{
    CommentRange, DecoratorExpression, EntityName, FileId, Identifier, ImportBinding,
    ImportedName, MemberName, NodeId, NodeKind, SourceFile, SymbolFlags, TextSpan, TypeNode,
    VariableKind,
};

/// A parsed and bound source file.
#[derive(Debug, Clone)]
pub struct BoundFile {
    pub source: SourceFile,
    pub symbols: SymbolTable,
    /// Whether the file has imports or exports. Top-level declarations of other files are
    /// visible program-wide.
    pub is_module: bool,
}

pub fn bind_source_file(
    id: FileId,
    file_name: &str,
    text: &str,
) -> Result<BoundFile, AnnotatorError> {
    let allocator = Allocator::default();
    let source_type = SourceType::from_path(file_name)
        .unwrap_or_else(|_| SourceType::default().with_typescript(true).with_module(true));
    let ret = Parser::new(&allocator, text, source_type).parse();
    if !ret.errors.is_empty() {
        return Err(AnnotatorError::Parse {
            file_name: file_name.to_string(),
            messages: ret.errors.iter().map(|error| error.to_string()).collect(),
        });
    }

    let mut binder = Binder::new(id, file_name, text);
    binder.collect_comments(&ret.program);
    binder.visit_program(&ret.program);
    Ok(binder.finish())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Export {
    Named,
    Default,
}

/// Start of an `export` keyword or statement that wraps the next declaration node.
#[derive(Debug, Clone, Copy)]
struct PendingStatement {
    start: u32,
    end: u32,
    declaration_start: u32,
    export: Option<Export>,
}

#[derive(Debug, Clone, Copy)]
struct Scope {
    span: TextSpan,
    is_function: bool,
}

struct Binder<'s> {
    text: &'s str,
    file: SourceFile,
    symbols: SymbolTable,
    open: Vec<NodeId>,
    scopes: Vec<Scope>,
    pending: Option<PendingStatement>,
    variables: Option<(VariableKind, Option<Export>)>,
    has_module_syntax: bool,
    /// Enclosing namespace declarations, innermost last.
    namespaces: Vec<NodeId>,
    /// Start of the inner declaration of a dotted namespace (`b` in `namespace a.b {}`),
    /// which is exported from its outer namespace.
    dotted_namespace: Option<u32>,
}

impl<'s> Binder<'s> {
    fn new(id: FileId, file_name: &str, text: &'s str) -> Self {
        let file = SourceFile::new(id, file_name, text);
        let module_scope = file.span(file.root());
        Binder {
            text,
            file,
            symbols: SymbolTable::new(module_scope),
            open: vec![NodeId::ROOT],
            scopes: vec![Scope {
                span: module_scope,
                is_function: true,
            }],
            pending: None,
            variables: None,
            has_module_syntax: false,
            namespaces: Vec::new(),
            dotted_namespace: None,
        }
    }

    fn finish(mut self) -> BoundFile {
        self.file.finish();
        BoundFile {
            source: self.file,
            symbols: self.symbols,
            is_module: self.has_module_syntax,
        }
    }

    fn collect_comments(&mut self, program: &ast::Program<'_>) {
        let comments = program
            .comments
            .iter()
            .filter_map(|comment| {
                CommentRange::from_span(self.text, comment.span.start, comment.span.end)
            })
            .collect();
        self.file.set_comments(comments);
    }

    // --- Tree building ---

    fn open_node(&mut self, kind: NodeKind, span: TextSpan) -> NodeId {
        let parent = self.open.last().copied().unwrap_or(NodeId::ROOT);
        let id = self.file.add_node(parent, kind, span);
        self.open.push(id);
        id
    }

    fn close_node(&mut self, id: NodeId) {
        debug_assert_eq!(self.open.last(), Some(&id));
        self.open.pop();
    }

    fn current_kind(&self) -> Option<&NodeKind> {
        self.open.last().map(|id| self.file.kind(*id))
    }

    /// Takes the pending statement if it wraps a declaration starting at `start`.
    fn take_pending(&mut self, start: u32) -> Option<PendingStatement> {
        match self.pending {
            Some(pending) if pending.declaration_start == start => self.pending.take(),
            _ => None,
        }
    }

    fn declaration_span(&mut self, span: Span) -> (TextSpan, Option<Export>) {
        match self.take_pending(span.start) {
            Some(pending) => (
                TextSpan::new(pending.start, span.end.max(pending.end)),
                pending.export,
            ),
            None => (to_span(span), None),
        }
    }

    // --- Scopes and bindings ---

    fn push_scope(&mut self, span: Span, is_function: bool) {
        self.scopes.push(Scope {
            span: to_span(span),
            is_function,
        });
    }

    fn pop_scope(&mut self) {
        self.scopes.pop();
    }

    fn block_scope(&self) -> TextSpan {
        self.scopes
            .last()
            .map_or(self.file.span(NodeId::ROOT), |scope| scope.span)
    }

    fn function_scope(&self) -> TextSpan {
        self.scopes
            .iter()
            .rev()
            .find(|scope| scope.is_function)
            .map_or(self.file.span(NodeId::ROOT), |scope| scope.span)
    }

    fn declare(
        &mut self,
        name: &Identifier,
        flags: SymbolFlags,
        node: NodeId,
        scope: TextSpan,
        export: Option<Export>,
    ) -> usize {
        let index = self.symbols.declare(Binding {
            name: name.name.clone(),
            flags,
            node,
            scope,
        });
        match (export, self.namespaces.last()) {
            (Some(Export::Named), Some(&namespace)) => {
                self.symbols
                    .add_namespace_export(namespace, name.name.clone(), index)
            }
            (Some(Export::Named), None) => self.symbols.add_export(name.name.clone(), index),
            (Some(Export::Default), _) => self.symbols.add_export("default", index),
            (None, _) => {}
        }
        index
    }

    // --- Lowering ---

    fn lower_type(&self, ty: &ast::TSType<'_>) -> TypeNode {
        let span = to_span(ty.span());
        match ty {
            ast::TSType::TSTypeReference(reference) => {
                match lower_entity_name(&reference.type_name) {
                    Some(name) => TypeNode::Reference { name, span },
                    None => TypeNode::Other { span },
                }
            }
            ast::TSType::TSArrayType(_) => TypeNode::Array { span },
            _ => TypeNode::Other { span },
        }
    }

    fn declare_parameter(
        &mut self,
        pattern: &ast::BindingPattern<'_>,
        span: Span,
        is_rest: bool,
    ) -> NodeId {
        let pattern = parameter_binding(pattern);
        let name = binding_identifier(pattern);
        let type_node = pattern
            .type_annotation
            .as_ref()
            .map(|annotation| self.lower_type(&annotation.type_annotation));
        let node = self.open_node(
            NodeKind::Parameter {
                name: name.clone(),
                type_node,
                is_rest,
            },
            to_span(span),
        );
        if let Some(name) = name {
            let scope = self.function_scope();
            self.declare(&name, SymbolFlags::FUNCTION_SCOPED_VARIABLE, node, scope, None);
        }
        node
    }
}

impl<'a> Visit<'a> for Binder<'_> {
    fn visit_statement(&mut self, it: &ast::Statement<'a>) {
        if let ast::Statement::VariableDeclaration(declaration) = it {
            self.pending = Some(PendingStatement {
                start: declaration.span.start,
                end: declaration.span.end,
                declaration_start: declaration.span.start,
                export: None,
            });
        }
        walk::walk_statement(self, it);
    }

    fn visit_export_named_declaration(&mut self, it: &ast::ExportNamedDeclaration<'a>) {
        let in_namespace = !self.namespaces.is_empty();
        self.has_module_syntax |= !in_namespace;
        if let Some(declaration) = &it.declaration {
            self.pending = Some(PendingStatement {
                start: it.span.start,
                end: it.span.end,
                declaration_start: declaration.span().start,
                export: Some(Export::Named),
            });
        } else if it.source.is_none() && !in_namespace {
            for specifier in &it.specifiers {
                self.symbols.add_export_specifier(
                    module_export_name(&specifier.local),
                    module_export_name(&specifier.exported),
                );
            }
        }
        walk::walk_export_named_declaration(self, it);
    }

    fn visit_export_default_declaration(&mut self, it: &ast::ExportDefaultDeclaration<'a>) {
        self.has_module_syntax = true;
        let declaration_start = match &it.declaration {
            ast::ExportDefaultDeclarationKind::ClassDeclaration(class) => Some(class.span.start),
            ast::ExportDefaultDeclarationKind::FunctionDeclaration(function) => {
                Some(function.span.start)
            }
            _ => None,
        };
        if let Some(declaration_start) = declaration_start {
            self.pending = Some(PendingStatement {
                start: it.span.start,
                end: it.span.end,
                declaration_start,
                export: Some(Export::Default),
            });
        }
        walk::walk_export_default_declaration(self, it);
    }

    fn visit_import_declaration(&mut self, it: &ast::ImportDeclaration<'a>) {
        self.has_module_syntax = true;
        let node = self.open_node(NodeKind::ImportDeclaration, to_span(it.span));
        let module_specifier = it.source.value.to_string();
        let declaration_type_only = matches!(it.import_kind, ast::ImportOrExportKind::Type);
        for specifier in it.specifiers.iter().flatten() {
            let (local, imported, type_only, span) = match specifier {
                ast::ImportDeclarationSpecifier::ImportSpecifier(s) => (
                    &s.local,
                    ImportedName::Named(module_export_name(&s.imported)),
                    matches!(s.import_kind, ast::ImportOrExportKind::Type),
                    s.span,
                ),
                ast::ImportDeclarationSpecifier::ImportDefaultSpecifier(s) => {
                    (&s.local, ImportedName::Default, false, s.span)
                }
                ast::ImportDeclarationSpecifier::ImportNamespaceSpecifier(s) => {
                    (&s.local, ImportedName::Namespace, false, s.span)
                }
            };
            let local = identifier(local.name.as_str(), local.span);
            let type_only = declaration_type_only || type_only;
            let specifier_node = self.open_node(
                NodeKind::ImportSpecifier(ImportBinding {
                    local: local.clone(),
                    imported,
                    module_specifier: module_specifier.clone(),
                    type_only,
                }),
                to_span(span),
            );
            self.close_node(specifier_node);
            let flags = if type_only {
                SymbolFlags::ALIAS | SymbolFlags::TYPE_ONLY
            } else {
                SymbolFlags::ALIAS
            };
            let scope = self.file.span(NodeId::ROOT);
            self.declare(&local, flags, specifier_node, scope, None);
        }
        self.close_node(node);
    }

    fn visit_variable_declaration(&mut self, it: &ast::VariableDeclaration<'a>) {
        let kind = match it.kind {
            ast::VariableDeclarationKind::Var => VariableKind::Var,
            ast::VariableDeclarationKind::Let => VariableKind::Let,
            _ => VariableKind::Const,
        };
        let statement = self.take_pending(it.span.start).map(|pending| {
            let span = TextSpan::new(pending.start, it.span.end.max(pending.end));
            (self.open_node(NodeKind::VariableStatement, span), pending.export)
        });
        let list = self.open_node(NodeKind::VariableDeclarationList(kind), to_span(it.span));

        let outer = self.variables.replace((kind, statement.and_then(|(_, export)| export)));
        walk::walk_variable_declaration(self, it);
        self.variables = outer;

        self.close_node(list);
        if let Some((statement, _)) = statement {
            self.close_node(statement);
        }
    }

    fn visit_variable_declarator(&mut self, it: &ast::VariableDeclarator<'a>) {
        let name = binding_identifier(&it.id);
        let node = self.open_node(
            NodeKind::VariableDeclaration { name: name.clone() },
            to_span(it.span),
        );
        if let Some(name) = name {
            let (kind, export) = self.variables.unwrap_or((VariableKind::Let, None));
            let (flags, scope) = match kind {
                VariableKind::Var => (SymbolFlags::FUNCTION_SCOPED_VARIABLE, self.function_scope()),
                _ => (SymbolFlags::BLOCK_SCOPED_VARIABLE, self.block_scope()),
            };
            self.declare(&name, flags, node, scope, export);
        }
        // Classes in the initializer belong to their own statements.
        let outer = self.variables.take();
        walk::walk_variable_declarator(self, it);
        self.variables = outer;
        self.close_node(node);
    }

    fn visit_function(&mut self, it: &ast::Function<'a>, flags: ScopeFlags) {
        let is_declaration = matches!(
            it.r#type,
            ast::FunctionType::FunctionDeclaration | ast::FunctionType::TSDeclareFunction
        );
        let node = if is_declaration {
            let (span, export) = self.declaration_span(it.span);
            let name = it.id.as_ref().map(|id| identifier(id.name.as_str(), id.span));
            let node = self.open_node(NodeKind::FunctionDeclaration { name: name.clone() }, span);
            if let Some(name) = name {
                let scope = self.block_scope();
                self.declare(&name, SymbolFlags::FUNCTION, node, scope, export);
            }
            Some(node)
        } else {
            None
        };
        self.push_scope(it.span, true);
        walk::walk_function(self, it, flags);
        self.pop_scope();
        if let Some(node) = node {
            self.close_node(node);
        }
    }

    fn visit_arrow_function_expression(&mut self, it: &ast::ArrowFunctionExpression<'a>) {
        self.push_scope(it.span, true);
        walk::walk_arrow_function_expression(self, it);
        self.pop_scope();
    }

    fn visit_block_statement(&mut self, it: &ast::BlockStatement<'a>) {
        self.push_scope(it.span, false);
        walk::walk_block_statement(self, it);
        self.pop_scope();
    }

    fn visit_class(&mut self, it: &ast::Class<'a>) {
        let node = if matches!(it.r#type, ast::ClassType::ClassDeclaration) {
            let (span, export) = self.declaration_span(it.span);
            let name = it.id.as_ref().map(|id| identifier(id.name.as_str(), id.span));
            let node = self.open_node(NodeKind::ClassDeclaration { name: name.clone() }, span);
            if let Some(name) = name {
                let scope = self.block_scope();
                self.declare(&name, SymbolFlags::CLASS, node, scope, export);
            }
            node
        } else {
            self.open_node(NodeKind::ClassExpression, to_span(it.span))
        };
        self.push_scope(it.span, false);
        walk::walk_class(self, it);
        self.pop_scope();
        self.close_node(node);
    }

    fn visit_decorator(&mut self, it: &ast::Decorator<'a>) {
        if !self.current_kind().is_some_and(NodeKind::can_have_decorators) {
            walk::walk_decorator(self, it);
            return;
        }
        let node = self.open_node(
            NodeKind::Decorator(lower_decorator_expression(&it.expression)),
            to_span(it.span),
        );
        walk::walk_decorator(self, it);
        self.close_node(node);
    }

    fn visit_method_definition(&mut self, it: &ast::MethodDefinition<'a>) {
        let kind = match it.kind {
            ast::MethodDefinitionKind::Constructor => NodeKind::Constructor,
            ast::MethodDefinitionKind::Method => NodeKind::MethodDeclaration(member_name(&it.key)),
            ast::MethodDefinitionKind::Get => NodeKind::GetAccessor(member_name(&it.key)),
            ast::MethodDefinitionKind::Set => NodeKind::SetAccessor(member_name(&it.key)),
        };
        let node = self.open_node(kind, to_span(it.span));
        walk::walk_method_definition(self, it);
        self.close_node(node);
    }

    fn visit_property_definition(&mut self, it: &ast::PropertyDefinition<'a>) {
        let node = self.open_node(
            NodeKind::PropertyDeclaration(member_name(&it.key)),
            to_span(it.span),
        );
        walk::walk_property_definition(self, it);
        self.close_node(node);
    }

    fn visit_accessor_property(&mut self, it: &ast::AccessorProperty<'a>) {
        let node = self.open_node(
            NodeKind::PropertyDeclaration(member_name(&it.key)),
            to_span(it.span),
        );
        walk::walk_accessor_property(self, it);
        self.close_node(node);
    }

    fn visit_formal_parameters(&mut self, it: &ast::FormalParameters<'a>) {
        for param in &it.items {
            self.visit_formal_parameter(param);
        }
        if let Some(rest) = &it.rest {
            let node = self.declare_parameter(&rest.argument, rest.span, true);
            self.visit_binding_rest_element(rest);
            self.close_node(node);
        }
    }

    fn visit_formal_parameter(&mut self, it: &ast::FormalParameter<'a>) {
        let node = self.declare_parameter(&it.pattern, it.span, false);
        walk::walk_formal_parameter(self, it);
        self.close_node(node);
    }

    fn visit_ts_interface_declaration(&mut self, it: &ast::TSInterfaceDeclaration<'a>) {
        let (span, export) = self.declaration_span(it.span);
        let name = identifier(it.id.name.as_str(), it.id.span);
        let node = self.open_node(NodeKind::InterfaceDeclaration { name: name.clone() }, span);
        let scope = self.block_scope();
        self.declare(&name, SymbolFlags::INTERFACE, node, scope, export);
        self.push_scope(it.span, false);
        walk::walk_ts_interface_declaration(self, it);
        self.pop_scope();
        self.close_node(node);
    }

    fn visit_ts_type_alias_declaration(&mut self, it: &ast::TSTypeAliasDeclaration<'a>) {
        let (span, export) = self.declaration_span(it.span);
        let name = identifier(it.id.name.as_str(), it.id.span);
        let node = self.open_node(NodeKind::TypeAliasDeclaration { name: name.clone() }, span);
        let scope = self.block_scope();
        self.declare(&name, SymbolFlags::TYPE_ALIAS, node, scope, export);
        self.push_scope(it.span, false);
        walk::walk_ts_type_alias_declaration(self, it);
        self.pop_scope();
        self.close_node(node);
    }

    fn visit_ts_enum_declaration(&mut self, it: &ast::TSEnumDeclaration<'a>) {
        let (span, export) = self.declaration_span(it.span);
        let name = identifier(it.id.name.as_str(), it.id.span);
        let is_const = it.r#const;
        let node = self.open_node(
            NodeKind::EnumDeclaration {
                name: name.clone(),
                is_const,
            },
            span,
        );
        let flags = if is_const {
            SymbolFlags::CONST_ENUM
        } else {
            SymbolFlags::REGULAR_ENUM
        };
        let scope = self.block_scope();
        self.declare(&name, flags, node, scope, export);
        walk::walk_ts_enum_declaration(self, it);
        self.close_node(node);
    }

    fn visit_ts_module_declaration(&mut self, it: &ast::TSModuleDeclaration<'a>) {
        let ast::TSModuleDeclarationName::Identifier(id) = &it.id else {
            walk::walk_ts_module_declaration(self, it);
            return;
        };
        let (span, export) = if self.dotted_namespace == Some(it.span.start) {
            self.dotted_namespace = None;
            (to_span(it.span), Some(Export::Named))
        } else {
            self.declaration_span(it.span)
        };
        if let Some(ast::TSModuleDeclarationBody::TSModuleDeclaration(inner)) = &it.body {
            self.dotted_namespace = Some(inner.span.start);
        }

        let name = identifier(id.name.as_str(), id.span);
        let node = self.open_node(NodeKind::ModuleDeclaration { name: name.clone() }, span);
        let scope = self.block_scope();
        let index = self.declare(&name, SymbolFlags::NAMESPACE_MODULE, node, scope, export);

        let body = to_span(it.span);
        self.namespaces.push(node);
        self.push_scope(it.span, true);
        walk::walk_ts_module_declaration(self, it);
        self.pop_scope();
        self.namespaces.pop();

        // Only namespaces that declare values exist at runtime.
        let instantiated = self
            .symbols
            .bindings()
            .iter()
            .any(|binding| binding.scope == body && binding.flags.intersects(SymbolFlags::VALUE));
        if instantiated {
            self.symbols.insert_flags(index, SymbolFlags::VALUE_MODULE);
        }
        self.close_node(node);
    }

    fn visit_ts_type_parameter(&mut self, it: &ast::TSTypeParameter<'a>) {
        let name = identifier(it.name.name.as_str(), it.name.span);
        let node = self.open_node(NodeKind::TypeParameter { name: name.clone() }, to_span(it.span));
        let scope = self.block_scope();
        self.declare(&name, SymbolFlags::TYPE_PARAMETER, node, scope, None);
        walk::walk_ts_type_parameter(self, it);
        self.close_node(node);
    }
}

fn to_span(span: Span) -> TextSpan {
    TextSpan::new(span.start, span.end)
}

fn identifier(name: &str, span: Span) -> Identifier {
    Identifier::new(name, to_span(span))
}

/// The pattern that carries the name and type of a parameter, looking through a default
/// value (`x: T = init`).
fn parameter_binding<'p, 'a>(pattern: &'p ast::BindingPattern<'a>) -> &'p ast::BindingPattern<'a> {
    match &pattern.kind {
        ast::BindingPatternKind::AssignmentPattern(assign) if pattern.type_annotation.is_none() => {
            &assign.left
        }
        _ => pattern,
    }
}

fn binding_identifier(pattern: &ast::BindingPattern<'_>) -> Option<Identifier> {
    match &pattern.kind {
        ast::BindingPatternKind::BindingIdentifier(id) => Some(identifier(id.name.as_str(), id.span)),
        ast::BindingPatternKind::AssignmentPattern(assign) => binding_identifier(&assign.left),
        _ => None,
    }
}

fn module_export_name(name: &ast::ModuleExportName<'_>) -> String {
    match name {
        ast::ModuleExportName::IdentifierName(id) => id.name.to_string(),
        ast::ModuleExportName::IdentifierReference(id) => id.name.to_string(),
        ast::ModuleExportName::StringLiteral(literal) => literal.value.to_string(),
    }
}

fn member_name(key: &ast::PropertyKey<'_>) -> MemberName {
    match key {
        ast::PropertyKey::StaticIdentifier(id) => {
            MemberName::Identifier(identifier(id.name.as_str(), id.span))
        }
        other => MemberName::Other {
            span: to_span(other.span()),
        },
    }
}

fn lower_entity_name(name: &ast::TSTypeName<'_>) -> Option<EntityName> {
    match name {
        ast::TSTypeName::IdentifierReference(id) => {
            Some(EntityName::Identifier(identifier(id.name.as_str(), id.span)))
        }
        ast::TSTypeName::QualifiedName(qualified) => {
            let left = lower_entity_name(&qualified.left)?;
            Some(EntityName::Qualified {
                left: Box::new(left),
                right: identifier(qualified.right.name.as_str(), qualified.right.span),
            })
        }
        #[allow(unreachable_patterns)]
        _ => None,
    }
}

fn lower_decorator_expression(expression: &ast::Expression<'_>) -> DecoratorExpression {
    match expression {
        ast::Expression::Identifier(id) => {
            DecoratorExpression::Identifier(identifier(id.name.as_str(), id.span))
        }
        ast::Expression::CallExpression(call) => DecoratorExpression::Call {
            callee: Box::new(lower_decorator_expression(&call.callee)),
            callee_span: to_span(call.callee.span()),
            arguments: call
                .arguments
                .iter()
                .map(|argument| to_span(argument.span()))
                .collect(),
        },
        other => DecoratorExpression::Other {
            span: to_span(other.span()),
        },
    }
}
