//! Directive definitions.

use std::fmt;
use std::rc::Rc;

use ngl_core::{Function, Value};
use ngl_runtime::{DIRECTIVES_SUFFIX, Injector, Scope};

use crate::node::Node;

/// Linker: receives the element, the scope it is compiled against and the
/// attribute value.
pub type LinkFn = Rc<dyn Fn(&Node, &Scope, &str)>;

/// A named behaviour attached to elements through an attribute.
#[derive(Clone)]
pub struct Directive {
    creates_scope: bool,
    link: LinkFn,
}

impl Directive {
    /// A directive linked against the scope the element is compiled with.
    pub fn new(link: impl Fn(&Node, &Scope, &str) + 'static) -> Self {
        Self {
            creates_scope: false,
            link: Rc::new(link),
        }
    }

    /// Request a fresh child scope for the element. At most one is created
    /// per element however many of its directives ask for one.
    #[must_use]
    pub fn with_new_scope(mut self) -> Self {
        self.creates_scope = true;
        self
    }

    #[must_use]
    pub fn creates_scope(&self) -> bool {
        self.creates_scope
    }

    pub fn link(&self, node: &Node, scope: &Scope, expr: &str) {
        (self.link)(node, scope, expr);
    }

    /// Wrap the directive so it can be cached by the container.
    #[must_use]
    pub fn into_value(self) -> Value {
        Value::opaque(self)
    }

    /// Recover a directive from a resolved container value.
    #[must_use]
    pub fn from_value(value: &Value) -> Option<Directive> {
        match value {
            Value::Opaque(opaque) => opaque.downcast_ref::<Directive>().cloned(),
            _ => None,
        }
    }

    /// Register under `name + "Directive"` as a factory that yields this
    /// directive.
    pub fn register(self, injector: &Injector, name: &str) {
        let value = self.into_value();
        injector.directive(
            name,
            Function::new(std::iter::empty::<&str>(), move |_| value.clone()),
        );
    }

    /// Container name for the directive attribute `name`.
    #[must_use]
    pub fn provider_name(name: &str) -> String {
        format!("{name}{DIRECTIVES_SUFFIX}")
    }
}

impl fmt::Debug for Directive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Directive")
            .field("creates_scope", &self.creates_scope)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use ngl_runtime::Locals;

    use super::*;

    #[test]
    fn value_round_trip_keeps_the_linker() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        let directive = Directive::new(move |node, _scope, expr| {
            sink.borrow_mut().push(format!("{}:{expr}", node.tag()));
        })
        .with_new_scope();

        let value = directive.into_value();
        let back = Directive::from_value(&value).expect("directive");
        assert!(back.creates_scope());
        back.link(&Node::new("p"), &Scope::new(), "x");
        assert_eq!(*seen.borrow(), ["p:x"]);

        assert!(Directive::from_value(&Value::from(1)).is_none());
        assert!(Directive::from_value(&Value::opaque(7_u8)).is_none());
    }

    #[test]
    fn registration_uses_the_suffix() {
        let injector = Injector::new();
        Directive::new(|_, _, _| {}).register(&injector, "ngl-noop");
        assert_eq!(Directive::provider_name("ngl-noop"), "ngl-noopDirective");

        let resolved = injector.get("ngl-noopDirective", &Locals::new());
        assert!(Directive::from_value(&resolved).is_some());
    }
}
