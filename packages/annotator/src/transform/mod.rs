pub mod src {
    pub mod annotation;
    pub mod class_visitor;
    pub mod downlevel_decorators_transform;
    pub mod rewriter;
    pub mod type_translator;
}

pub use src::annotation::*;
pub use src::class_visitor::*;
pub use src::downlevel_decorators_transform::*;
pub use src::rewriter::*;
pub use src::type_translator::*;
