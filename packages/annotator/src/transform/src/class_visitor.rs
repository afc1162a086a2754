// Class Decorator Collection
//
// Gathers the lowerable decorators of one class while the rewriter walks it: class-level
// decorators up front, then constructor parameters and members as they are reached.

use super::annotation::is_annotation;
use super::rewriter::Rewriter;
use super::type_translator::type_to_value;
use indexmap::IndexMap;
use smallvec::SmallVec;
use ts::{NodeId, NodeKind, SourceFile, TypeChecker};

pub type Decorators = SmallVec<[NodeId; 2]>;

/// Constructor parameter slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParameterDecorationInfo {
    /// Runtime reference for the parameter type, `None` when the type has no value.
    pub type_ref: Option<String>,
    pub decorators: Option<Decorators>,
}

/// Lowerable metadata of one class.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownleveledClass {
    pub class_node: NodeId,
    pub decorators: Option<Decorators>,
    /// One slot per constructor parameter; `None` slots are parameters with neither a
    /// runtime type nor lowerable decorators.
    pub ctor_parameters: Option<Vec<Option<ParameterDecorationInfo>>>,
    pub prop_decorators: Option<IndexMap<String, Decorators>>,
}

impl DownleveledClass {
    pub fn is_empty(&self) -> bool {
        self.decorators.is_none() && self.ctor_parameters.is_none() && self.prop_decorators.is_none()
    }
}

pub struct ClassDecoratorCollector<'c> {
    checker: &'c dyn TypeChecker,
    marker: &'c str,
    class: DownleveledClass,
    /// Members whose decorators must stay in place because they could not be recorded.
    skipped_members: SmallVec<[NodeId; 1]>,
}

impl<'c> ClassDecoratorCollector<'c> {
    pub fn new(
        checker: &'c dyn TypeChecker,
        file: &SourceFile,
        class_node: NodeId,
        marker: &'c str,
    ) -> Self {
        let mut collector = ClassDecoratorCollector {
            checker,
            marker,
            class: DownleveledClass {
                class_node,
                decorators: None,
                ctor_parameters: None,
                prop_decorators: None,
            },
            skipped_members: SmallVec::new(),
        };
        let decorators = collector.lowerable_decorators(file, class_node);
        if !decorators.is_empty() {
            collector.class.decorators = Some(decorators);
        }
        collector
    }

    pub fn into_metadata(self) -> DownleveledClass {
        self.class
    }

    /// Called for every node the rewriter reaches while this class is the innermost
    /// declaration being processed.
    pub fn before_process_node(&mut self, rewriter: &mut Rewriter<'_>, node: NodeId) {
        let file = rewriter.file();
        if file.parent(node) != Some(self.class.class_node) {
            return;
        }
        match file.kind(node) {
            NodeKind::Constructor => self.gather_constructor(file, node),
            kind if kind.member_name().is_some() => self.gather_member(rewriter, node),
            _ => {}
        }
    }

    /// Drops `decorator` from the output when it belongs to this class, its constructor
    /// parameters or its members and is lowerable. Returns whether it was dropped.
    pub fn maybe_suppress(&self, rewriter: &mut Rewriter<'_>, decorator: NodeId) -> bool {
        let file = rewriter.file();
        if !self.owns_decorator(file, decorator) || !self.should_lower(file, decorator) {
            return false;
        }
        rewriter.skip(decorator, file.span(decorator).end);
        true
    }

    pub fn should_lower(&self, file: &SourceFile, decorator: NodeId) -> bool {
        is_annotation(self.checker, file, decorator, self.marker)
    }

    fn owns_decorator(&self, file: &SourceFile, decorator: NodeId) -> bool {
        let class_node = self.class.class_node;
        let Some(owner) = file.parent(decorator) else {
            return false;
        };
        if owner == class_node {
            return true;
        }
        match file.kind(owner) {
            NodeKind::Parameter { .. } => file
                .parent(owner)
                .filter(|ctor| matches!(file.kind(*ctor), NodeKind::Constructor))
                .and_then(|ctor| file.parent(ctor))
                == Some(class_node),
            kind if kind.member_name().is_some() => {
                file.parent(owner) == Some(class_node) && !self.skipped_members.contains(&owner)
            }
            _ => false,
        }
    }

    fn lowerable_decorators(&self, file: &SourceFile, owner: NodeId) -> Decorators {
        file.children(owner)
            .iter()
            .copied()
            .filter(|child| matches!(file.kind(*child), NodeKind::Decorator(_)))
            .filter(|decorator| self.should_lower(file, *decorator))
            .collect()
    }

    fn gather_constructor(&mut self, file: &SourceFile, ctor: NodeId) {
        let mut parameters = Vec::new();
        let mut has_decorated_param = false;
        for &param in file.children(ctor) {
            let NodeKind::Parameter { type_node, .. } = file.kind(param) else {
                continue;
            };
            let decorators = self.lowerable_decorators(file, param);
            has_decorated_param |= !decorators.is_empty();
            let type_ref = type_node
                .as_ref()
                .and_then(|type_node| type_to_value(self.checker, file, type_node));
            let decorators = (!decorators.is_empty()).then_some(decorators);
            parameters.push(if type_ref.is_some() || decorators.is_some() {
                Some(ParameterDecorationInfo {
                    type_ref,
                    decorators,
                })
            } else {
                None
            });
        }
        if self.class.decorators.is_some() || has_decorated_param {
            self.class.ctor_parameters = Some(parameters);
        }
    }

    fn gather_member(&mut self, rewriter: &mut Rewriter<'_>, member: NodeId) {
        let file = rewriter.file();
        let has_decorators = file
            .children(member)
            .iter()
            .any(|child| matches!(file.kind(*child), NodeKind::Decorator(_)));
        if !has_decorators {
            return;
        }
        let name = match file.kind(member).member_name().and_then(|n| n.as_identifier()) {
            Some(identifier) => identifier.name.clone(),
            None => {
                // e.g. [Symbol.iterator]() {}
                rewriter.error(member, "cannot process decorators on strangely named member");
                self.skipped_members.push(member);
                return;
            }
        };
        let decorators = self.lowerable_decorators(file, member);
        if decorators.is_empty() {
            return;
        }
        self.class
            .prop_decorators
            .get_or_insert_with(IndexMap::new)
            .insert(name, decorators);
    }
}
