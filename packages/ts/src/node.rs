//! Syntax tree of a source file.
//!
//! Only the node kinds the decorator transform looks at are materialized. Every byte of the
//! file that is not covered by a child node is opaque text that the rewriter copies as-is.
//! Nodes live in an arena owned by their `SourceFile` and are addressed by `NodeId`.

use crate::comments::{get_leading_comments_from_cache, CommentRange};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FileId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub u32);

impl NodeId {
    pub const ROOT: NodeId = NodeId(0);

    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// A node anywhere in a program.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeRef {
    pub file: FileId,
    pub node: NodeId,
}

/// Half-open byte range `[start, end)` into the file text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct TextSpan {
    pub start: u32,
    pub end: u32,
}

impl TextSpan {
    pub fn new(start: u32, end: u32) -> Self {
        TextSpan { start, end }
    }

    pub fn len(&self) -> u32 {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    pub fn contains(&self, pos: u32) -> bool {
        self.start <= pos && pos < self.end
    }

    /// Smallest span covering both.
    pub fn cover(&self, other: TextSpan) -> TextSpan {
        TextSpan::new(self.start.min(other.start), self.end.max(other.end))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identifier {
    pub name: String,
    pub span: TextSpan,
}

impl Identifier {
    pub fn new(name: impl Into<String>, span: TextSpan) -> Self {
        Identifier {
            name: name.into(),
            span,
        }
    }
}

/// `Foo` or `ns.Foo` in type position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntityName {
    Identifier(Identifier),
    Qualified {
        left: Box<EntityName>,
        right: Identifier,
    },
}

impl EntityName {
    /// First identifier of the path (`ns` in `ns.a.Foo`).
    pub fn leftmost(&self) -> &Identifier {
        match self {
            EntityName::Identifier(identifier) => identifier,
            EntityName::Qualified { left, .. } => left.leftmost(),
        }
    }

    /// Path segments from left to right.
    pub fn segments(&self) -> Vec<&Identifier> {
        match self {
            EntityName::Identifier(identifier) => vec![identifier],
            EntityName::Qualified { left, right } => {
                let mut segments = left.segments();
                segments.push(right);
                segments
            }
        }
    }

    pub fn text(&self) -> String {
        self.segments()
            .iter()
            .map(|segment| segment.name.as_str())
            .collect::<Vec<_>>()
            .join(".")
    }
}

/// Type annotation of a parameter. Type arguments are not retained.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeNode {
    Reference { name: EntityName, span: TextSpan },
    Array { span: TextSpan },
    Other { span: TextSpan },
}

impl TypeNode {
    pub fn span(&self) -> TextSpan {
        match self {
            TypeNode::Reference { span, .. } | TypeNode::Array { span } | TypeNode::Other { span } => {
                *span
            }
        }
    }
}

/// Name of a class member. Computed and literal keys are `Other`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MemberName {
    Identifier(Identifier),
    Other { span: TextSpan },
}

impl MemberName {
    pub fn as_identifier(&self) -> Option<&Identifier> {
        match self {
            MemberName::Identifier(identifier) => Some(identifier),
            MemberName::Other { .. } => None,
        }
    }
}

/// The expression after `@`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecoratorExpression {
    Identifier(Identifier),
    Call {
        callee: Box<DecoratorExpression>,
        callee_span: TextSpan,
        arguments: Vec<TextSpan>,
    },
    Other { span: TextSpan },
}

impl DecoratorExpression {
    /// The identifier a decorator ultimately invokes: `Foo` for `@Foo`, `@Foo(x)` and
    /// `@Foo(x)(y)`. Member accesses and other shapes have none.
    pub fn head_identifier(&self) -> Option<&Identifier> {
        match self {
            DecoratorExpression::Identifier(identifier) => Some(identifier),
            DecoratorExpression::Call { callee, .. } => callee.head_identifier(),
            DecoratorExpression::Other { .. } => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImportedName {
    Named(String),
    Default,
    Namespace,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportBinding {
    pub local: Identifier,
    pub imported: ImportedName,
    pub module_specifier: String,
    pub type_only: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VariableKind {
    Var,
    Let,
    Const,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    SourceFile,
    ClassDeclaration { name: Option<Identifier> },
    ClassExpression,
    Constructor,
    MethodDeclaration(MemberName),
    PropertyDeclaration(MemberName),
    GetAccessor(MemberName),
    SetAccessor(MemberName),
    Parameter {
        name: Option<Identifier>,
        type_node: Option<TypeNode>,
        is_rest: bool,
    },
    Decorator(DecoratorExpression),
    VariableStatement,
    VariableDeclarationList(VariableKind),
    VariableDeclaration { name: Option<Identifier> },
    FunctionDeclaration { name: Option<Identifier> },
    InterfaceDeclaration { name: Identifier },
    TypeAliasDeclaration { name: Identifier },
    EnumDeclaration { name: Identifier, is_const: bool },
    /// `namespace a {}` / `module a {}`. Ambient `declare module "x"` blocks are not lowered.
    ModuleDeclaration { name: Identifier },
    ImportDeclaration,
    ImportSpecifier(ImportBinding),
    TypeParameter { name: Identifier },
}

/// Fieldless mirror of `NodeKind`, used for matching and messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SyntaxKind {
    SourceFile,
    ClassDeclaration,
    ClassExpression,
    Constructor,
    MethodDeclaration,
    PropertyDeclaration,
    GetAccessor,
    SetAccessor,
    Parameter,
    Decorator,
    VariableStatement,
    VariableDeclarationList,
    VariableDeclaration,
    FunctionDeclaration,
    InterfaceDeclaration,
    TypeAliasDeclaration,
    EnumDeclaration,
    ModuleDeclaration,
    ImportDeclaration,
    ImportSpecifier,
    TypeParameter,
}

impl fmt::Display for SyntaxKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

impl NodeKind {
    pub fn syntax_kind(&self) -> SyntaxKind {
        match self {
            NodeKind::SourceFile => SyntaxKind::SourceFile,
            NodeKind::ClassDeclaration { .. } => SyntaxKind::ClassDeclaration,
            NodeKind::ClassExpression => SyntaxKind::ClassExpression,
            NodeKind::Constructor => SyntaxKind::Constructor,
            NodeKind::MethodDeclaration(_) => SyntaxKind::MethodDeclaration,
            NodeKind::PropertyDeclaration(_) => SyntaxKind::PropertyDeclaration,
            NodeKind::GetAccessor(_) => SyntaxKind::GetAccessor,
            NodeKind::SetAccessor(_) => SyntaxKind::SetAccessor,
            NodeKind::Parameter { .. } => SyntaxKind::Parameter,
            NodeKind::Decorator(_) => SyntaxKind::Decorator,
            NodeKind::VariableStatement => SyntaxKind::VariableStatement,
            NodeKind::VariableDeclarationList(_) => SyntaxKind::VariableDeclarationList,
            NodeKind::VariableDeclaration { .. } => SyntaxKind::VariableDeclaration,
            NodeKind::FunctionDeclaration { .. } => SyntaxKind::FunctionDeclaration,
            NodeKind::InterfaceDeclaration { .. } => SyntaxKind::InterfaceDeclaration,
            NodeKind::TypeAliasDeclaration { .. } => SyntaxKind::TypeAliasDeclaration,
            NodeKind::EnumDeclaration { .. } => SyntaxKind::EnumDeclaration,
            NodeKind::ModuleDeclaration { .. } => SyntaxKind::ModuleDeclaration,
            NodeKind::ImportDeclaration => SyntaxKind::ImportDeclaration,
            NodeKind::ImportSpecifier(_) => SyntaxKind::ImportSpecifier,
            NodeKind::TypeParameter { .. } => SyntaxKind::TypeParameter,
        }
    }

    /// Name of a method, property or accessor.
    pub fn member_name(&self) -> Option<&MemberName> {
        match self {
            NodeKind::MethodDeclaration(name)
            | NodeKind::PropertyDeclaration(name)
            | NodeKind::GetAccessor(name)
            | NodeKind::SetAccessor(name) => Some(name),
            _ => None,
        }
    }

    /// Kinds that own their decorators.
    pub fn can_have_decorators(&self) -> bool {
        matches!(
            self,
            NodeKind::ClassDeclaration { .. }
                | NodeKind::MethodDeclaration(_)
                | NodeKind::PropertyDeclaration(_)
                | NodeKind::GetAccessor(_)
                | NodeKind::SetAccessor(_)
                | NodeKind::Parameter { .. }
        )
    }
}

#[derive(Debug, Clone)]
pub struct Node {
    pub kind: NodeKind,
    pub span: TextSpan,
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineAndCharacter {
    /// 0-based line.
    pub line: u32,
    /// 0-based column in UTF-16 code units.
    pub character: u32,
}

#[derive(Debug, Clone)]
pub struct SourceFile {
    id: FileId,
    file_name: String,
    text: String,
    nodes: Vec<Node>,
    comments: Vec<CommentRange>,
    line_starts: Vec<u32>,
}

impl SourceFile {
    /// Creates a file whose tree holds only the root node spanning the whole text.
    pub fn new(id: FileId, file_name: impl Into<String>, text: impl Into<String>) -> Self {
        let text = text.into();
        let line_starts = std::iter::once(0)
            .chain(
                text.bytes()
                    .enumerate()
                    .filter(|(_, b)| *b == b'\n')
                    .map(|(i, _)| i as u32 + 1),
            )
            .collect();
        let root = Node {
            kind: NodeKind::SourceFile,
            span: TextSpan::new(0, text.len() as u32),
            parent: None,
            children: Vec::new(),
        };
        SourceFile {
            id,
            file_name: file_name.into(),
            text,
            nodes: vec![root],
            comments: Vec::new(),
            line_starts,
        }
    }

    pub fn id(&self) -> FileId {
        self.id
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn is_declaration_file(&self) -> bool {
        self.file_name.ends_with(".d.ts")
    }

    pub fn root(&self) -> NodeId {
        NodeId::ROOT
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.index()]
    }

    pub fn kind(&self, id: NodeId) -> &NodeKind {
        &self.node(id).kind
    }

    pub fn span(&self, id: NodeId) -> TextSpan {
        self.node(id).span
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).parent
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.node(id).children
    }

    pub fn text_of(&self, span: TextSpan) -> &str {
        self.text
            .get(span.start as usize..span.end as usize)
            .unwrap_or("")
    }

    pub fn node_text(&self, id: NodeId) -> &str {
        self.text_of(self.span(id))
    }

    /// All nodes in document order matching `predicate`.
    pub fn find_all(&self, predicate: impl Fn(&NodeKind) -> bool) -> Vec<NodeId> {
        let mut found = Vec::new();
        let mut stack = vec![NodeId::ROOT];
        while let Some(id) = stack.pop() {
            if predicate(self.kind(id)) {
                found.push(id);
            }
            stack.extend(self.children(id).iter().rev());
        }
        found
    }

    // --- Building ---

    /// Appends a node under `parent`. Call `finish` once every node is added.
    pub fn add_node(&mut self, parent: NodeId, kind: NodeKind, span: TextSpan) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(Node {
            kind,
            span,
            parent: Some(parent),
            children: Vec::new(),
        });
        self.nodes[parent.index()].children.push(id);
        id
    }

    pub fn set_comments(&mut self, mut comments: Vec<CommentRange>) {
        comments.sort_by_key(|c| c.pos);
        comments.dedup_by_key(|c| c.pos);
        self.comments = comments;
    }

    /// Widens every node to cover its children and orders children by position.
    pub fn finish(&mut self) {
        // Children always have a larger index than their parent.
        for index in (1..self.nodes.len()).rev() {
            let span = self.nodes[index].span;
            if let Some(parent) = self.nodes[index].parent {
                let parent = &mut self.nodes[parent.index()];
                parent.span = parent.span.cover(span);
            }
        }
        let spans: Vec<TextSpan> = self.nodes.iter().map(|node| node.span).collect();
        for node in &mut self.nodes {
            node.children
                .sort_by_key(|child| (spans[child.index()].start, spans[child.index()].end));
        }
    }

    // --- Comments and positions ---

    pub fn comments(&self) -> &[CommentRange] {
        &self.comments
    }

    pub fn get_leading_comment_ranges(&self, id: NodeId) -> Vec<CommentRange> {
        get_leading_comments_from_cache(&self.comments, self.span(id).start, &self.text)
    }

    pub fn line_and_character_of_position(&self, pos: u32) -> LineAndCharacter {
        let line = self.line_starts.partition_point(|start| *start <= pos) - 1;
        let line_start = self.line_starts[line] as usize;
        let end = (pos as usize).min(self.text.len());
        let character = self
            .text
            .get(line_start..end)
            .map_or(0, |prefix| prefix.encode_utf16().count());
        LineAndCharacter {
            line: line as u32,
            character: character as u32,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ident(name: &str, start: u32) -> Identifier {
        Identifier::new(name, TextSpan::new(start, start + name.len() as u32))
    }

    #[test]
    fn finish_widens_parents_and_orders_children() {
        let text = "@Dec export class A { x; }";
        let mut file = SourceFile::new(FileId(0), "a.ts", text);
        let class = file.add_node(
            NodeId::ROOT,
            NodeKind::ClassDeclaration {
                name: Some(ident("A", 18)),
            },
            TextSpan::new(5, text.len() as u32),
        );
        let member = file.add_node(
            class,
            NodeKind::PropertyDeclaration(MemberName::Identifier(ident("x", 22))),
            TextSpan::new(22, 24),
        );
        let decorator = file.add_node(
            class,
            NodeKind::Decorator(DecoratorExpression::Identifier(ident("Dec", 1))),
            TextSpan::new(0, 4),
        );
        file.finish();

        assert_eq!(file.span(class), TextSpan::new(0, text.len() as u32));
        assert_eq!(file.children(class), &[decorator, member]);
        assert_eq!(file.node_text(decorator), "@Dec");
        assert_eq!(file.parent(member), Some(class));
    }

    #[test]
    fn columns_are_counted_in_utf16_units() {
        let file = SourceFile::new(FileId(0), "a.ts", "let a;\nlet é = '😀';");
        let pos = file.text().find(';').unwrap() as u32;
        assert_eq!(
            file.line_and_character_of_position(pos),
            LineAndCharacter { line: 0, character: 5 }
        );
        let last = file.text().rfind(';').unwrap() as u32;
        assert_eq!(
            file.line_and_character_of_position(last),
            LineAndCharacter { line: 1, character: 12 }
        );
    }

    #[test]
    fn decorator_heads_see_through_calls() {
        let call = DecoratorExpression::Call {
            callee: Box::new(DecoratorExpression::Call {
                callee: Box::new(DecoratorExpression::Identifier(ident("Foo", 1))),
                callee_span: TextSpan::new(1, 4),
                arguments: vec![],
            }),
            callee_span: TextSpan::new(1, 6),
            arguments: vec![TextSpan::new(7, 8)],
        };
        assert_eq!(call.head_identifier().map(|i| i.name.as_str()), Some("Foo"));
        let other = DecoratorExpression::Other {
            span: TextSpan::new(1, 8),
        };
        assert!(other.head_identifier().is_none());
    }
}
