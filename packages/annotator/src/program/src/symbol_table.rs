// Symbol Table
//
// Declarations of one source file, keyed by name and scoped by the text range in which
// they are visible.

use indexmap::IndexMap;
use std::collections::HashMap;
use ts::{NodeId, SymbolFlags, TextSpan};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Binding {
    pub name: String,
    pub flags: SymbolFlags,
    pub node: NodeId,
    /// Range of the scope that declares the binding.
    pub scope: TextSpan,
}

#[derive(Debug, Clone, Default)]
pub struct SymbolTable {
    bindings: Vec<Binding>,
    by_name: HashMap<String, Vec<usize>>,
    module_scope: TextSpan,
    /// Exported name to the bindings it exports.
    exports: IndexMap<String, Vec<usize>>,
    /// `export { local as exported }` pairs, resolved lazily against module-scope bindings.
    export_specifiers: Vec<(String, String)>,
    /// Exported members of each namespace declaration.
    namespace_exports: HashMap<NodeId, IndexMap<String, Vec<usize>>>,
}

impl SymbolTable {
    pub fn new(module_scope: TextSpan) -> Self {
        SymbolTable {
            module_scope,
            ..SymbolTable::default()
        }
    }

    pub fn declare(&mut self, binding: Binding) -> usize {
        let index = self.bindings.len();
        self.by_name
            .entry(binding.name.clone())
            .or_default()
            .push(index);
        self.bindings.push(binding);
        index
    }

    pub fn add_export(&mut self, exported: impl Into<String>, binding: usize) {
        self.exports.entry(exported.into()).or_default().push(binding);
    }

    pub fn add_namespace_export(
        &mut self,
        namespace: NodeId,
        exported: impl Into<String>,
        binding: usize,
    ) {
        self.namespace_exports
            .entry(namespace)
            .or_default()
            .entry(exported.into())
            .or_default()
            .push(binding);
    }

    pub fn insert_flags(&mut self, binding: usize, flags: SymbolFlags) {
        if let Some(binding) = self.bindings.get_mut(binding) {
            binding.flags |= flags;
        }
    }

    pub fn add_export_specifier(&mut self, local: impl Into<String>, exported: impl Into<String>) {
        self.export_specifiers.push((local.into(), exported.into()));
    }

    pub fn bindings(&self) -> &[Binding] {
        &self.bindings
    }

    /// Bindings named `name` visible at `position`. The innermost scope that declares the
    /// name with one of the `meaning` flags wins, and every declaration of the name in that
    /// scope is returned so merged declarations resolve together.
    pub fn resolve(&self, name: &str, position: u32, meaning: SymbolFlags) -> Vec<&Binding> {
        let visible: Vec<&Binding> = self
            .named(name)
            .filter(|binding| binding.scope.contains(position))
            .collect();
        let Some(innermost) = visible
            .iter()
            .filter(|binding| binding.flags.intersects(meaning))
            .map(|binding| binding.scope)
            .min_by_key(|scope| scope.len())
        else {
            return Vec::new();
        };
        visible
            .into_iter()
            .filter(|binding| binding.scope == innermost)
            .collect()
    }

    /// Bindings exported under `name`.
    pub fn exported(&self, name: &str) -> Vec<&Binding> {
        let mut found: Vec<&Binding> = self
            .exports
            .get(name)
            .into_iter()
            .flatten()
            .map(|&index| &self.bindings[index])
            .collect();
        for (local, _) in self
            .export_specifiers
            .iter()
            .filter(|(_, exported)| exported == name)
        {
            found.extend(self.module_bindings(local));
        }
        found
    }

    /// Bindings the namespace declaration `namespace` exports as `name`.
    pub fn namespace_exported(&self, namespace: NodeId, name: &str) -> Vec<&Binding> {
        self.namespace_exports
            .get(&namespace)
            .and_then(|members| members.get(name))
            .into_iter()
            .flatten()
            .map(|&index| &self.bindings[index])
            .collect()
    }

    /// Top-level bindings named `name`.
    pub fn module_bindings<'t>(&'t self, name: &str) -> impl Iterator<Item = &'t Binding> + 't {
        let module_scope = self.module_scope;
        self.named(name)
            .filter(move |binding| binding.scope == module_scope)
    }

    fn named<'t>(&'t self, name: &str) -> impl Iterator<Item = &'t Binding> + 't {
        self.by_name
            .get(name)
            .into_iter()
            .flatten()
            .map(move |&index| &self.bindings[index])
    }
}
