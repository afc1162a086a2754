// Parameter Type Translation
//
// Turns a constructor parameter's type annotation into an expression that names the same
// entity at runtime, or nothing when the type has no runtime value.

use ts::{SourceFile, TypeChecker, TypeNode};

/// Runtime reference for a parameter type: `Foo` for `Foo<T>`, `ns.Foo` for a qualified
/// name, `Array` for `T[]`. `None` for primitives, interfaces, type parameters, type-only
/// imports and anything else without a value.
pub fn type_to_value(
    checker: &dyn TypeChecker,
    file: &SourceFile,
    type_node: &TypeNode,
) -> Option<String> {
    let ty = checker.get_type_at_location(file.id(), type_node);
    if ty.is_type_parameter() {
        return None;
    }
    let symbol = ty.symbol?;
    if !symbol.is_value() {
        return None;
    }
    Some(checker.symbol_to_string(&symbol, true))
}
