// Ambient Library Symbols
//
// Globals from the standard library declarations that exist both as a type and as a
// runtime value, so a parameter typed with one of them can be referenced at runtime.

use once_cell::sync::Lazy;
use std::collections::HashSet;
use ts::{Symbol, SymbolFlags};

static LIB_VALUE_TYPES: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "Array",
        "ArrayBuffer",
        "Boolean",
        "DataView",
        "Date",
        "Document",
        "Element",
        "Error",
        "Event",
        "EventTarget",
        "Float32Array",
        "Float64Array",
        "Function",
        "HTMLElement",
        "Int16Array",
        "Int32Array",
        "Int8Array",
        "Map",
        "Node",
        "Number",
        "Object",
        "Promise",
        "RegExp",
        "Set",
        "String",
        "Symbol",
        "Uint16Array",
        "Uint32Array",
        "Uint8Array",
        "Uint8ClampedArray",
        "WeakMap",
        "WeakSet",
        "Window",
    ]
    .into_iter()
    .collect()
});

/// Symbol for a global library type that is also a value, such as `Promise` or `Map`.
pub fn lib_symbol(name: &str) -> Option<Symbol> {
    LIB_VALUE_TYPES.contains(name).then(|| {
        Symbol::new(
            name,
            SymbolFlags::INTERFACE | SymbolFlags::BLOCK_SCOPED_VARIABLE,
        )
    })
}
