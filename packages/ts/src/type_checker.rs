use crate::node::{FileId, Identifier, NodeRef, SourceFile, TypeNode};
use bitflags::bitflags;
use std::fmt::Debug;

/// The slice of a type checker the decorator transform needs: symbol lookup for
/// decorator heads and value resolution for constructor parameter types.
pub trait TypeChecker: Debug + Sync {
    fn get_source_file(&self, file: FileId) -> Option<&SourceFile>;

    /// Resolves an identifier in expression position (for example a decorator head).
    fn get_symbol_at_location(&self, file: FileId, identifier: &Identifier) -> Option<Symbol>;

    /// Follows an import alias to the symbol it refers to. Returns `None` when the
    /// alias target is outside the program.
    fn get_aliased_symbol(&self, symbol: &Symbol) -> Option<Symbol>;

    fn get_type_at_location(&self, file: FileId, type_node: &TypeNode) -> Type;

    /// Text that refers to `symbol` at its use site. With `use_fully_qualified_name` a
    /// qualified reference keeps its full dotted path.
    fn symbol_to_string(&self, symbol: &Symbol, use_fully_qualified_name: bool) -> String;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Symbol {
    pub name: String,
    pub flags: SymbolFlags,
    pub declarations: Vec<NodeRef>,
    /// Dotted path as written at the reference (`ns.Foo`), when it differs from `name`.
    pub qualified_name: Option<String>,
}

impl Symbol {
    pub fn new(name: impl Into<String>, flags: SymbolFlags) -> Self {
        Symbol {
            name: name.into(),
            flags,
            declarations: Vec::new(),
            qualified_name: None,
        }
    }

    pub fn with_declarations(mut self, declarations: Vec<NodeRef>) -> Self {
        self.declarations = declarations;
        self
    }

    /// Whether the symbol can be referenced from an expression at runtime.
    /// Aliases that could not be followed are assumed to be values. Anything reached through
    /// a type-only import never is.
    pub fn is_value(&self) -> bool {
        if self.flags.contains(SymbolFlags::TYPE_ONLY) {
            return false;
        }
        self.flags
            .intersects(SymbolFlags::VALUE | SymbolFlags::ALIAS)
    }

    pub fn has_type_meaning(&self) -> bool {
        self.flags
            .intersects(SymbolFlags::TYPE | SymbolFlags::NAMESPACE | SymbolFlags::ALIAS)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Type {
    pub flags: TypeFlags,
    pub symbol: Option<Symbol>,
}

impl Type {
    pub fn unknown() -> Self {
        Type {
            flags: TypeFlags::UNKNOWN,
            symbol: None,
        }
    }

    pub fn object(symbol: Symbol) -> Self {
        Type {
            flags: TypeFlags::OBJECT,
            symbol: Some(symbol),
        }
    }

    pub fn is_type_parameter(&self) -> bool {
        self.flags.contains(TypeFlags::TYPE_PARAMETER)
    }
}

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct TypeFlags: u32 {
        const ANY = 1;
        const UNKNOWN = 1 << 1;
        const STRING = 1 << 2;
        const NUMBER = 1 << 3;
        const BOOLEAN = 1 << 4;
        const ENUM = 1 << 5;
        const VOID = 1 << 14;
        const UNDEFINED = 1 << 15;
        const NULL = 1 << 16;
        const NEVER = 1 << 17;
        const TYPE_PARAMETER = 1 << 18;
        const OBJECT = 1 << 19;
        const UNION = 1 << 20;
        const INTERSECTION = 1 << 21;
    }
}

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct SymbolFlags: u32 {
        const FUNCTION_SCOPED_VARIABLE = 1;
        const BLOCK_SCOPED_VARIABLE = 1 << 1;
        const PROPERTY = 1 << 2;
        const ENUM_MEMBER = 1 << 3;
        const FUNCTION = 1 << 4;
        const CLASS = 1 << 5;
        const INTERFACE = 1 << 6;
        const CONST_ENUM = 1 << 7;
        const REGULAR_ENUM = 1 << 8;
        const VALUE_MODULE = 1 << 9;
        const NAMESPACE_MODULE = 1 << 10;
        const TYPE_PARAMETER = 1 << 18;
        const TYPE_ALIAS = 1 << 19;
        const ALIAS = 1 << 21;
        /// Alias introduced by `import type`; never denotes a value.
        const TYPE_ONLY = 1 << 28;

        const VARIABLE = Self::FUNCTION_SCOPED_VARIABLE.bits() | Self::BLOCK_SCOPED_VARIABLE.bits();
        const ENUM = Self::REGULAR_ENUM.bits() | Self::CONST_ENUM.bits();
        const VALUE = Self::VARIABLE.bits() | Self::PROPERTY.bits() | Self::ENUM_MEMBER.bits()
            | Self::FUNCTION.bits() | Self::CLASS.bits() | Self::ENUM.bits() | Self::VALUE_MODULE.bits();
        const TYPE = Self::CLASS.bits() | Self::INTERFACE.bits() | Self::ENUM.bits()
            | Self::ENUM_MEMBER.bits() | Self::TYPE_PARAMETER.bits() | Self::TYPE_ALIAS.bits();
        const NAMESPACE = Self::VALUE_MODULE.bits() | Self::NAMESPACE_MODULE.bits() | Self::ENUM.bits();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classes_and_enums_are_values() {
        assert!(Symbol::new("Foo", SymbolFlags::CLASS).is_value());
        assert!(Symbol::new("E", SymbolFlags::CONST_ENUM).is_value());
        assert!(!Symbol::new("I", SymbolFlags::INTERFACE).is_value());
    }

    #[test]
    fn interface_merged_with_variable_is_a_value() {
        let merged = Symbol::new("Thing", SymbolFlags::INTERFACE | SymbolFlags::BLOCK_SCOPED_VARIABLE);
        assert!(merged.is_value());
        assert!(merged.has_type_meaning());
    }

    #[test]
    fn unresolved_aliases_are_values_unless_type_only() {
        assert!(Symbol::new("Ext", SymbolFlags::ALIAS).is_value());
        assert!(!Symbol::new("Ext", SymbolFlags::ALIAS | SymbolFlags::TYPE_ONLY).is_value());
        assert!(!Symbol::new("Foo", SymbolFlags::CLASS | SymbolFlags::TYPE_ONLY).is_value());
    }
}
