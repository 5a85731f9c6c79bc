//! Tree walker that links directives to scopes.

use std::rc::Rc;

use ngl_core::Value;
use ngl_runtime::{Injector, Locals, ROOT_SCOPE, Scope};
use tracing::{debug, warn};

use crate::builtins;
use crate::directive::Directive;
use crate::node::Node;

/// Links the directives of an element tree.
///
/// For each element, every attribute whose name resolves to a registered
/// directive is collected in attribute order. If any of them asks for a
/// new scope, one child scope is created before the first such directive
/// links and is used for it, the directives after it, and the element's
/// descendants.
#[derive(Debug, Clone)]
pub struct Compiler {
    injector: Rc<Injector>,
}

impl Compiler {
    #[must_use]
    pub fn new(injector: Rc<Injector>) -> Self {
        Self { injector }
    }

    /// Register the built-in directives on `injector`, then wrap it.
    #[must_use]
    pub fn with_builtins(injector: Rc<Injector>) -> Self {
        builtins::register(&injector);
        Self::new(injector)
    }

    #[must_use]
    pub fn injector(&self) -> &Rc<Injector> {
        &self.injector
    }

    /// Compile `root` against the container's root scope and return that
    /// scope.
    pub fn bootstrap(&self, root: &Node) -> Scope {
        let scope = match Scope::from_value(&self.injector.get(ROOT_SCOPE, &Locals::new())) {
            Some(scope) => scope,
            None => {
                warn!("{ROOT_SCOPE} is not a scope, using the container root");
                self.injector.root_scope()
            }
        };
        self.compile(root, &scope);
        scope
    }

    /// Link the directives of `node`, then compile its children with the
    /// resulting scope.
    pub fn compile(&self, node: &Node, scope: &Scope) {
        let mut scope = scope.clone();
        let mut scope_created = false;

        for (name, directive, expr) in self.directives_of(node) {
            if directive.creates_scope() && !scope_created {
                scope = scope.new_child();
                scope_created = true;
            }
            debug!(directive = %name, expr = %expr, scope_id = scope.id(), "linking");
            directive.link(node, &scope, &expr);
        }

        for child in node.children() {
            self.compile(&child, &scope);
        }
    }

    fn directives_of(&self, node: &Node) -> Vec<(String, Directive, String)> {
        node.attributes()
            .into_iter()
            .filter_map(|(name, expr)| {
                let resolved = self
                    .injector
                    .get(&Directive::provider_name(&name), &Locals::new());
                match resolved {
                    Value::Undefined | Value::Null => None,
                    other => match Directive::from_value(&other) {
                        Some(directive) => Some((name, directive, expr)),
                        None => {
                            warn!(attribute = %name, "directive factory did not return a directive");
                            None
                        }
                    },
                }
            })
            .collect()
    }
}
