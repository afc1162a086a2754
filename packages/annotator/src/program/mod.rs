pub mod src {
    pub mod binder;
    pub mod lib_symbols;
    pub mod module_resolution;
    pub mod program;
    pub mod symbol_table;
}

pub use src::binder::*;
pub use src::lib_symbols::*;
pub use src::module_resolution::*;
pub use src::program::*;
pub use src::symbol_table::*;
