// Downlevel Decorators Transform
//
// Removes decorators that are marked as annotations and re-expresses them as static
// metadata fields (`decorators`, `ctorParameters`, `propDecorators`) appended to the
// decorated class. Everything else in the file is copied through unchanged.

use super::class_visitor::{ClassDecoratorCollector, DownleveledClass, ParameterDecorationInfo};
use super::rewriter::{RewriteHook, RewriteOutput, Rewriter};
use crate::config::{AnnotatorOptions, EmitMode};
use crate::logging::{Logger, NullLogger};
use indexmap::IndexMap;
use ts::{
    make_diagnostic_chain, DecoratorExpression, DiagnosticMessageChain, NodeId, NodeKind,
    SourceFile, TextSpan, TypeChecker,
};

/// TypeScript type of a decorator invocation array.
const DECORATOR_INVOCATION_TYPE: &str = "{type: Function, args?: any[]}[]";

/// JSDoc type for decorator invocation arrays (for Closure Compiler).
const DECORATOR_INVOCATION_JSDOC_TYPE: &str =
    "!Array<{type: !Function, args: (undefined|!Array<?>)}>";

const CTOR_PARAMETERS_TYPE: &str =
    "() => ({type: any, decorators?: {type: Function, args?: any[]}[]}|null)[]";

const PROP_DECORATORS_TYPE: &str = "{[key: string]: {type: Function, args?: any[]}[]}";

pub type DecoratorOutput = RewriteOutput;

// ============================================================================
// Metadata Emission
// ============================================================================

/// Source ranges making up `{ type: ..., args: [...] }` for one decorator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecoratorMetadata {
    /// The invoked expression; `None` when the decorator shape is unsupported.
    pub type_span: Option<TextSpan>,
    pub args: Vec<TextSpan>,
}

/// Extracts the type of the decorator (the function or expression invoked), as well as all the
/// arguments passed to the decorator.
pub fn extract_metadata_from_single_decorator(
    file: &SourceFile,
    decorator: NodeId,
) -> DecoratorMetadata {
    match file.kind(decorator) {
        NodeKind::Decorator(DecoratorExpression::Identifier(identifier)) => DecoratorMetadata {
            type_span: Some(identifier.span),
            args: Vec::new(),
        },
        NodeKind::Decorator(DecoratorExpression::Call {
            callee_span,
            arguments,
            ..
        }) => DecoratorMetadata {
            type_span: Some(*callee_span),
            args: arguments.clone(),
        },
        _ => DecoratorMetadata {
            type_span: None,
            args: Vec::new(),
        },
    }
}

/// Writes `{ type: Foo, args: [a, b, ] }`.
fn emit_decorator(rewriter: &mut Rewriter<'_>, decorator: NodeId) {
    let file = rewriter.file();
    let metadata = extract_metadata_from_single_decorator(file, decorator);
    rewriter.emit("{ type: ");
    match metadata.type_span {
        Some(span) => rewriter.emit_source_text(span),
        None => {
            let message = make_diagnostic_chain(
                "unsupported decorator expression while gathering metadata".to_string(),
                Some(vec![DiagnosticMessageChain::new(format!(
                    "decorator: {}",
                    file.node_text(decorator)
                ))]),
            );
            rewriter.error(decorator, message);
            rewriter.emit("undefined");
        }
    }
    if !metadata.args.is_empty() {
        rewriter.emit(", args: [");
        for arg in metadata.args {
            rewriter.emit_source_text(arg);
            rewriter.emit(", ");
        }
        rewriter.emit("]");
    }
    rewriter.emit(" }");
}

/// Creates the static 'decorators' property.
///
/// ```typescript
/// static decorators: {type: Function, args?: any[]}[] = [
/// { type: Foo },
/// { type: Bar, args: [a, ] },
/// ];
/// ```
pub fn create_decorators_class_property(
    rewriter: &mut Rewriter<'_>,
    decorators: &[NodeId],
    mode: EmitMode,
) {
    match mode {
        EmitMode::Runtime => {
            rewriter.emit(&format!("static decorators: {} = [\n", DECORATOR_INVOCATION_TYPE));
            for &decorator in decorators {
                emit_decorator(rewriter, decorator);
                rewriter.emit(",\n");
            }
            rewriter.emit("];\n");
        }
        EmitMode::Declarations => {
            rewriter.emit(&format!(
                "/** @type {{{}}} */\nstatic declare decorators: {};\n",
                DECORATOR_INVOCATION_JSDOC_TYPE, DECORATOR_INVOCATION_TYPE
            ));
        }
    }
}

/// Creates the static 'ctorParameters' property containing downleveled decorator information.
///
/// The property contains an arrow function that returns one entry per constructor parameter:
/// ```typescript
/// static ctorParameters: () => (...)[] = () => [
/// {type: SomeClass, decorators: [{ type: Inject, args: [TOKEN, ] }, ]},
/// null, null,
/// {type: undefined, decorators: [{ type: Optional }, ]},
/// ];
/// ```
pub fn create_ctor_parameters_class_property(
    rewriter: &mut Rewriter<'_>,
    ctor_parameters: &[Option<ParameterDecorationInfo>],
    mode: EmitMode,
) {
    if mode == EmitMode::Declarations {
        rewriter.emit(&format!(
            "/**\n * @nocollapse\n * @type {{function(): !Array<(null|{{type: ?, decorators: (undefined|{})}})>}}\n */\nstatic declare ctorParameters: {};\n",
            DECORATOR_INVOCATION_JSDOC_TYPE, CTOR_PARAMETERS_TYPE
        ));
        return;
    }

    rewriter.emit(&format!(
        "/** @nocollapse */\nstatic ctorParameters: {} = () => [\n",
        CTOR_PARAMETERS_TYPE
    ));
    let mut emitted_inline = false;
    for parameter in ctor_parameters {
        let Some(parameter) = parameter else {
            rewriter.emit(if emitted_inline { " null," } else { "null," });
            emitted_inline = true;
            continue;
        };
        if emitted_inline {
            rewriter.emit("\n");
            emitted_inline = false;
        }
        rewriter.emit("{type: ");
        rewriter.emit(parameter.type_ref.as_deref().unwrap_or("undefined"));
        rewriter.emit(", ");
        if let Some(decorators) = &parameter.decorators {
            rewriter.emit("decorators: [");
            for &decorator in decorators {
                emit_decorator(rewriter, decorator);
                rewriter.emit(", ");
            }
            rewriter.emit("]");
        }
        rewriter.emit("},\n");
    }
    rewriter.emit("];\n");
}

/// Creates the static 'propDecorators' property containing type information for every
/// property that has a decorator applied.
///
/// ```typescript
/// static propDecorators: {[key: string]: {type: Function, args?: any[]}[]} = {
/// "propA": [{ type: MyDecorator, args: [1, 2, ] },],
/// };
/// ```
pub fn create_prop_decorators_class_property(
    rewriter: &mut Rewriter<'_>,
    properties: &IndexMap<String, impl AsRef<[NodeId]>>,
    mode: EmitMode,
) {
    if mode == EmitMode::Declarations {
        rewriter.emit(&format!(
            "/** @type {{!Object<string,{}>}} */\nstatic declare propDecorators: {};\n",
            DECORATOR_INVOCATION_JSDOC_TYPE, PROP_DECORATORS_TYPE
        ));
        return;
    }

    rewriter.emit(&format!(
        "static propDecorators: {} = {{\n",
        PROP_DECORATORS_TYPE
    ));
    for (name, decorators) in properties {
        rewriter.emit(&format!("\"{}\": [", name));
        for &decorator in decorators.as_ref() {
            emit_decorator(rewriter, decorator);
            rewriter.emit(",");
        }
        rewriter.emit("],\n");
    }
    rewriter.emit("};\n");
}

/// Writes every metadata field the class needs, in `decorators`, `ctorParameters`,
/// `propDecorators` order.
pub fn emit_class_metadata(rewriter: &mut Rewriter<'_>, class: &DownleveledClass, mode: EmitMode) {
    if let Some(decorators) = &class.decorators {
        create_decorators_class_property(rewriter, decorators, mode);
    }
    if class.decorators.is_some() || class.ctor_parameters.is_some() {
        let parameters = class.ctor_parameters.as_deref().unwrap_or_default();
        create_ctor_parameters_class_property(rewriter, parameters, mode);
    }
    if let Some(properties) = &class.prop_decorators {
        create_prop_decorators_class_property(rewriter, properties, mode);
    }
}

// ============================================================================
// Transform
// ============================================================================

/// Walks a file, lowering annotations of every class declaration it contains.
pub struct DownlevelDecoratorsTransform<'c> {
    checker: &'c dyn TypeChecker,
    options: &'c AnnotatorOptions,
    logger: &'c dyn Logger,
    /// Innermost class last. `None` marks a class expression, whose decorators are never
    /// lowered.
    classes: Vec<Option<ClassDecoratorCollector<'c>>>,
}

impl<'c> DownlevelDecoratorsTransform<'c> {
    pub fn new(checker: &'c dyn TypeChecker, options: &'c AnnotatorOptions) -> Self {
        DownlevelDecoratorsTransform {
            checker,
            options,
            logger: &NullLogger,
            classes: Vec::new(),
        }
    }

    pub fn with_logger(mut self, logger: &'c dyn Logger) -> Self {
        self.logger = logger;
        self
    }

    /// Rewrites `file` and returns the new text with its diagnostics.
    pub fn process(&mut self, file: &SourceFile) -> DecoratorOutput {
        self.classes.clear();
        let rewriter = Rewriter::new(file, self.options.source_map);
        rewriter.process(self)
    }

    fn current_class(&mut self) -> Option<&mut ClassDecoratorCollector<'c>> {
        self.classes.last_mut().and_then(Option::as_mut)
    }

    fn visit_class_declaration(&mut self, rewriter: &mut Rewriter<'_>, class: NodeId) {
        let file = rewriter.file();
        let options = self.options;
        self.classes.push(Some(ClassDecoratorCollector::new(
            self.checker,
            file,
            class,
            &options.annotation_marker,
        )));
        for &child in file.children(class) {
            rewriter.copy_range(class, rewriter.cursor(), file.span(child).start);
            rewriter.visit(child, self);
        }
        let collector = self.classes.pop().flatten();

        let span = file.span(class);
        let closing = span.end.saturating_sub(1).max(rewriter.cursor());
        if file.text().as_bytes().get(closing as usize) != Some(&b'}') {
            rewriter.error(class, "unexpected class terminator");
            rewriter.copy_range(class, rewriter.cursor(), span.end);
            return;
        }
        rewriter.copy_range(class, rewriter.cursor(), closing);
        if let Some(collector) = collector {
            let metadata = collector.into_metadata();
            if !metadata.is_empty() {
                self.logger.debug(&format!(
                    "lowering decorators of class {} in {}",
                    class_name(file, class),
                    file.file_name()
                ));
            }
            emit_class_metadata(rewriter, &metadata, self.options.emit_mode);
        }
        rewriter.copy_range(class, closing, span.end);
    }
}

impl RewriteHook for DownlevelDecoratorsTransform<'_> {
    fn maybe_process(&mut self, rewriter: &mut Rewriter<'_>, node: NodeId) -> bool {
        if let Some(collector) = self.current_class() {
            collector.before_process_node(rewriter, node);
        }
        match rewriter.file().kind(node) {
            NodeKind::Decorator(_) => self
                .current_class()
                .is_some_and(|collector| collector.maybe_suppress(rewriter, node)),
            NodeKind::ClassDeclaration { .. } => {
                self.visit_class_declaration(rewriter, node);
                true
            }
            NodeKind::ClassExpression => {
                self.classes.push(None);
                rewriter.write_node(node, self);
                self.classes.pop();
                true
            }
            _ => false,
        }
    }
}

fn class_name(file: &SourceFile, class: NodeId) -> &str {
    match file.kind(class) {
        NodeKind::ClassDeclaration { name: Some(name) } => &name.name,
        _ => "<anonymous>",
    }
}

/// Lowers the annotations of every class declaration in `file`.
pub fn convert_decorators(
    checker: &dyn TypeChecker,
    file: &SourceFile,
    options: &AnnotatorOptions,
) -> DecoratorOutput {
    DownlevelDecoratorsTransform::new(checker, options).process(file)
}
