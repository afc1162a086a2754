// Program
//
// The set of files converted together. Each file is parsed and bound when it is added;
// the program then answers the symbol and type queries of the decorator transform across
// all of them.

use super::binder::{bind_source_file, BoundFile};
use super::lib_symbols::lib_symbol;
use super::module_resolution::{module_candidates, normalize_path};
use super::symbol_table::Binding;
use crate::config::AnnotatorOptions;
use crate::error::AnnotatorError;
use crate::logging::Logger;
use crate::transform::{DecoratorOutput, DownlevelDecoratorsTransform};
use std::collections::HashMap;
use ts::{
    EntityName, FileId, Identifier, ImportBinding, ImportedName, NodeKind, NodeRef, SourceFile,
    Symbol, SymbolFlags, Type, TypeChecker, TypeFlags, TypeNode,
};

/// Re-export chains longer than this are treated as unresolvable.
const MAX_ALIAS_DEPTH: usize = 8;

#[derive(Debug, Default)]
pub struct Program {
    files: Vec<BoundFile>,
    by_name: HashMap<String, FileId>,
}

impl Program {
    pub fn new() -> Self {
        Program::default()
    }

    /// Parses and binds `text` as `file_name`.
    pub fn add_file(
        &mut self,
        file_name: impl Into<String>,
        text: impl AsRef<str>,
    ) -> Result<FileId, AnnotatorError> {
        let file_name = file_name.into();
        let key = normalize_path(&file_name);
        if self.by_name.contains_key(&key) {
            return Err(AnnotatorError::DuplicateFile(file_name));
        }
        let id = FileId(self.files.len() as u32);
        let bound = bind_source_file(id, &file_name, text.as_ref())?;
        self.by_name.insert(key, id);
        self.files.push(bound);
        Ok(id)
    }

    pub fn file_ids(&self) -> impl Iterator<Item = FileId> + '_ {
        self.files.iter().map(|file| file.source.id())
    }

    pub fn file_id(&self, file_name: &str) -> Option<FileId> {
        self.by_name.get(&normalize_path(file_name)).copied()
    }

    pub fn source_file(&self, file: FileId) -> Option<&SourceFile> {
        self.bound(file).map(|bound| &bound.source)
    }

    pub fn source_file_by_name(&self, file_name: &str) -> Option<&SourceFile> {
        self.file_id(file_name).and_then(|id| self.source_file(id))
    }

    pub fn convert_decorators(
        &self,
        file: FileId,
        options: &AnnotatorOptions,
    ) -> Result<DecoratorOutput, AnnotatorError> {
        let source = self
            .source_file(file)
            .ok_or(AnnotatorError::UnknownFile(file))?;
        Ok(DownlevelDecoratorsTransform::new(self, options).process(source))
    }

    pub fn convert_decorators_with_logger(
        &self,
        file: FileId,
        options: &AnnotatorOptions,
        logger: &dyn Logger,
    ) -> Result<DecoratorOutput, AnnotatorError> {
        let source = self
            .source_file(file)
            .ok_or(AnnotatorError::UnknownFile(file))?;
        Ok(DownlevelDecoratorsTransform::new(self, options)
            .with_logger(logger)
            .process(source))
    }

    fn bound(&self, file: FileId) -> Option<&BoundFile> {
        self.files.get(file.0 as usize)
    }

    fn resolve_module(&self, importing_file: &str, specifier: &str) -> Option<&BoundFile> {
        module_candidates(importing_file, specifier)
            .iter()
            .find_map(|candidate| self.by_name.get(candidate))
            .and_then(|id| self.bound(*id))
    }

    /// Resolves `identifier` in `file` among declarations with one of the `meaning` flags.
    /// Falls back to top-level declarations of script files, then to library globals.
    fn resolve_name(
        &self,
        file: FileId,
        identifier: &Identifier,
        meaning: SymbolFlags,
    ) -> Option<Symbol> {
        let bound = self.bound(file)?;
        let name = identifier.name.as_str();
        let local = bound.symbols.resolve(name, identifier.span.start, meaning);
        if !local.is_empty() {
            return Some(make_symbol(name, local.into_iter().map(|b| (file, b))));
        }

        let globals: Vec<(FileId, &Binding)> = self
            .files
            .iter()
            .filter(|other| !other.is_module && other.source.id() != file)
            .flat_map(|other| {
                other
                    .symbols
                    .module_bindings(name)
                    .map(move |binding| (other.source.id(), binding))
            })
            .collect();
        if globals.iter().any(|(_, binding)| binding.flags.intersects(meaning)) {
            return Some(make_symbol(name, globals.into_iter()));
        }

        lib_symbol(name)
    }

    fn import_binding(&self, declaration: &NodeRef) -> Option<(&BoundFile, &ImportBinding)> {
        let bound = self.bound(declaration.file)?;
        match bound.source.kind(declaration.node) {
            NodeKind::ImportSpecifier(import) => Some((bound, import)),
            _ => None,
        }
    }

    fn resolve_alias(&self, symbol: &Symbol, depth: usize) -> Option<Symbol> {
        if depth >= MAX_ALIAS_DEPTH {
            return None;
        }
        for declaration in &symbol.declarations {
            let Some((importer, import)) = self.import_binding(declaration) else {
                continue;
            };
            let export_name = match &import.imported {
                ImportedName::Named(name) => name.as_str(),
                ImportedName::Default => "default",
                ImportedName::Namespace => {
                    return Some(Symbol::new(
                        import.local.name.clone(),
                        SymbolFlags::VALUE_MODULE | SymbolFlags::NAMESPACE_MODULE,
                    ));
                }
            };
            let Some(target) =
                self.resolve_module(importer.source.file_name(), &import.module_specifier)
            else {
                continue;
            };
            let Some(mut resolved) = self.exported_symbol(target, export_name, depth) else {
                continue;
            };
            if import.type_only {
                resolved.flags |= SymbolFlags::TYPE_ONLY;
            }
            return Some(resolved);
        }
        None
    }

    /// The symbol `target` exports as `export_name`, following re-exported imports.
    fn exported_symbol(
        &self,
        target: &BoundFile,
        export_name: &str,
        depth: usize,
    ) -> Option<Symbol> {
        let bindings = target.symbols.exported(export_name);
        let first = bindings.first()?;
        let name = first.name.clone();
        let resolved = make_symbol(&name, bindings.into_iter().map(|b| (target.source.id(), b)));
        if resolved.flags.contains(SymbolFlags::ALIAS) {
            return self.resolve_alias(&resolved, depth + 1).or(Some(resolved));
        }
        Some(resolved)
    }

    fn type_of_identifier(&self, file: FileId, identifier: &Identifier) -> Type {
        let meaning = SymbolFlags::TYPE | SymbolFlags::NAMESPACE | SymbolFlags::ALIAS;
        let Some(symbol) = self.resolve_name(file, identifier, meaning) else {
            return Type::unknown();
        };
        let target = if symbol.flags.contains(SymbolFlags::ALIAS) {
            self.resolve_alias(&symbol, 0).unwrap_or(symbol)
        } else {
            symbol
        };
        if !target.has_type_meaning() {
            return Type::unknown();
        }
        if target.flags.contains(SymbolFlags::TYPE_PARAMETER) {
            return Type {
                flags: TypeFlags::TYPE_PARAMETER,
                symbol: Some(target),
            };
        }
        // Imports may rename; the runtime reference is the local name.
        Type::object(Symbol {
            name: identifier.name.clone(),
            ..target
        })
    }

    fn type_of_qualified_name(&self, file: FileId, name: &EntityName) -> Type {
        let segments = name.segments();
        let (Some(head), Some(last)) = (segments.first(), segments.last()) else {
            return Type::unknown();
        };
        let meaning = SymbolFlags::NAMESPACE | SymbolFlags::ALIAS | SymbolFlags::VALUE;
        let Some(head_symbol) = self.resolve_name(file, head, meaning) else {
            return Type::unknown();
        };

        let (flags, declarations) = if head_symbol.flags.contains(SymbolFlags::ALIAS) {
            match self.qualified_member(&head_symbol, &segments[1..]) {
                Some(member) => (member.flags, member.declarations),
                // Modules outside the program are assumed to export values.
                None => (head_symbol.flags, Vec::new()),
            }
        } else if head_symbol.flags.intersects(SymbolFlags::ENUM) {
            (SymbolFlags::ENUM_MEMBER, Vec::new())
        } else if head_symbol.flags.contains(SymbolFlags::NAMESPACE_MODULE) {
            match self.qualified_member(&head_symbol, &segments[1..]) {
                Some(member) => (member.flags, member.declarations),
                None => return Type::unknown(),
            }
        } else {
            return Type::unknown();
        };
        Type::object(Symbol {
            name: last.name.clone(),
            flags,
            declarations,
            qualified_name: Some(name.text()),
        })
    }

    /// Follows `path` from `head` through namespace imports and namespace declarations.
    fn qualified_member(&self, head: &Symbol, path: &[&Identifier]) -> Option<Symbol> {
        let mut current = head.clone();
        for segment in path {
            current = if current.flags.contains(SymbolFlags::ALIAS) {
                match self.namespace_import_member(&current, segment) {
                    Some(member) => member,
                    None => {
                        let target = self.resolve_alias(&current, 0)?;
                        self.namespace_declaration_member(&target, segment)?
                    }
                }
            } else {
                self.namespace_declaration_member(&current, segment)?
            };
        }
        Some(current)
    }

    /// Export `member` of the module bound by an `import * as` alias, when that module is
    /// part of the program.
    fn namespace_import_member(&self, alias: &Symbol, member: &Identifier) -> Option<Symbol> {
        alias.declarations.iter().find_map(|declaration| {
            let (importer, import) = self.import_binding(declaration)?;
            if import.imported != ImportedName::Namespace {
                return None;
            }
            let target = self.resolve_module(importer.source.file_name(), &import.module_specifier)?;
            let mut resolved = self.exported_symbol(target, &member.name, 0)?;
            if import.type_only {
                resolved.flags |= SymbolFlags::TYPE_ONLY;
            }
            Some(resolved)
        })
    }

    /// Export `member` of every namespace declaration merged into `namespace`.
    fn namespace_declaration_member(
        &self,
        namespace: &Symbol,
        member: &Identifier,
    ) -> Option<Symbol> {
        if !namespace.flags.contains(SymbolFlags::NAMESPACE_MODULE) {
            return None;
        }
        let bindings: Vec<(FileId, &Binding)> = namespace
            .declarations
            .iter()
            .filter_map(|declaration| {
                let bound = self.bound(declaration.file)?;
                Some((declaration.file, bound, declaration.node))
            })
            .flat_map(|(file, bound, node)| {
                bound
                    .symbols
                    .namespace_exported(node, &member.name)
                    .into_iter()
                    .map(move |binding| (file, binding))
            })
            .collect();
        if bindings.is_empty() {
            return None;
        }
        Some(make_symbol(&member.name, bindings.into_iter()))
    }
}

fn make_symbol<'b>(name: &str, bindings: impl Iterator<Item = (FileId, &'b Binding)>) -> Symbol {
    let mut flags = SymbolFlags::empty();
    let mut declarations = Vec::new();
    for (file, binding) in bindings {
        flags |= binding.flags;
        declarations.push(NodeRef {
            file,
            node: binding.node,
        });
    }
    Symbol::new(name, flags).with_declarations(declarations)
}

impl TypeChecker for Program {
    fn get_source_file(&self, file: FileId) -> Option<&SourceFile> {
        self.source_file(file)
    }

    fn get_symbol_at_location(&self, file: FileId, identifier: &Identifier) -> Option<Symbol> {
        self.resolve_name(file, identifier, SymbolFlags::VALUE | SymbolFlags::ALIAS)
    }

    fn get_aliased_symbol(&self, symbol: &Symbol) -> Option<Symbol> {
        if !symbol.flags.contains(SymbolFlags::ALIAS) {
            return None;
        }
        self.resolve_alias(symbol, 0)
    }

    fn get_type_at_location(&self, file: FileId, type_node: &TypeNode) -> Type {
        match type_node {
            TypeNode::Reference {
                name: EntityName::Identifier(identifier),
                ..
            } => self.type_of_identifier(file, identifier),
            TypeNode::Reference { name, .. } => self.type_of_qualified_name(file, name),
            TypeNode::Array { .. } => lib_symbol("Array").map_or_else(Type::unknown, Type::object),
            TypeNode::Other { .. } => Type::unknown(),
        }
    }

    fn symbol_to_string(&self, symbol: &Symbol, use_fully_qualified_name: bool) -> String {
        match &symbol.qualified_name {
            Some(qualified) if use_fully_qualified_name => qualified.clone(),
            _ => symbol.name.clone(),
        }
    }
}
