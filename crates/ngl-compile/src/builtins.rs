//! Built-in directives.
//!
//! | Attribute        | Behaviour |
//! |------------------|-----------|
//! | `ngl-bind`       | element text follows the expression |
//! | `ngl-model`      | key-up writes the input value to the bound name and digests; the input follows the name |
//! | `ngl-controller` | new scope; resolves `<value>Controller` and invokes it with `$scope` |
//! | `ngl-click`      | click evaluates the expression and digests |
//!
//! Event digests start at the scope the directive was linked against. When
//! [`RuntimeConfig::digest_limit`](ngl_runtime::RuntimeConfig) is set they are
//! bounded and a runaway digest is logged instead of hanging.

use std::rc::{Rc, Weak};

use ngl_core::{Value, to_display_string};
use ngl_runtime::{CONTROLLERS_SUFFIX, Injector, Locals, Scope};
use tracing::{error, warn};

use crate::directive::Directive;

pub const BIND: &str = "ngl-bind";
pub const MODEL: &str = "ngl-model";
pub const CONTROLLER: &str = "ngl-controller";
pub const CLICK: &str = "ngl-click";

/// Register all built-in directives on `injector`.
pub fn register(injector: &Rc<Injector>) {
    bind().register(injector, BIND);
    model().register(injector, MODEL);
    controller(Rc::downgrade(injector)).register(injector, CONTROLLER);
    click().register(injector, CLICK);
}

/// Text shown for a bound value; `undefined` and `null` render empty.
#[must_use]
pub fn display_text(value: &Value) -> String {
    match value {
        Value::Undefined | Value::Null => String::new(),
        other => to_display_string(other),
    }
}

/// Digest after a user event, honouring the tree's digest limit.
pub fn event_digest(scope: &Scope) {
    match scope.config().digest_limit {
        None => scope.digest(),
        Some(limit) => {
            if let Err(err) = scope.digest_with_limit(limit) {
                error!(scope_id = scope.id(), error = %err, "event digest aborted");
            }
        }
    }
}

#[must_use]
pub fn bind() -> Directive {
    Directive::new(|node, scope, expr| {
        node.set_text(&display_text(&scope.eval(expr)));
        let target = node.downgrade();
        scope.watch(expr, move |value| {
            if let Some(node) = target.upgrade() {
                node.set_text(&display_text(value));
            }
        });
    })
}

#[must_use]
pub fn model() -> Directive {
    Directive::new(|node, scope, expr| {
        let (source, handler_scope, target) = (node.downgrade(), scope.clone(), expr.to_owned());
        node.on_key_up(move || {
            let Some(node) = source.upgrade() else {
                return;
            };
            let value = Value::from(node.value());
            if let Err(err) = ngl_expr::assign(&target, value, &handler_scope) {
                warn!(expr = %target, error = %err, "model assignment failed");
            }
            event_digest(&handler_scope);
        });

        let target = node.downgrade();
        scope.watch(expr, move |value| {
            if let Some(node) = target.upgrade() {
                node.set_value(&display_text(value));
            }
        });
    })
}

#[must_use]
pub fn controller(injector: Weak<Injector>) -> Directive {
    Directive::new(move |_, scope, expr| {
        let Some(injector) = injector.upgrade() else {
            warn!(controller = %expr, "container dropped before linking");
            return;
        };
        let name = format!("{expr}{CONTROLLERS_SUFFIX}");
        match injector.get(&name, &Locals::new()) {
            Value::Function(ctrl) => {
                injector.invoke(&ctrl, &Locals::new().with("$scope", scope));
            }
            _ => warn!(controller = %expr, "controller is not registered"),
        }
    })
    .with_new_scope()
}

#[must_use]
pub fn click() -> Directive {
    Directive::new(|node, scope, expr| {
        let (handler_scope, source) = (scope.clone(), expr.to_owned());
        node.on_click(move || {
            handler_scope.eval(source.as_str());
            event_digest(&handler_scope);
        });
    })
}

#[cfg(test)]
mod tests {
    use ngl_core::Object;
    use ngl_runtime::RuntimeConfig;

    use super::*;
    use crate::node::Node;

    #[test]
    fn display_text_blanks_nullish() {
        assert_eq!(display_text(&Value::Undefined), "");
        assert_eq!(display_text(&Value::Null), "");
        assert_eq!(display_text(&Value::from(0)), "0");
        assert_eq!(display_text(&Value::from(Object::new())), "[object Object]");
    }

    #[test]
    fn bind_sets_text_immediately_and_on_change() {
        let scope = Scope::new();
        scope.set("n", 1);
        let node = Node::new("span");
        bind().link(&node, &scope, "n + 1");
        assert_eq!(node.text(), "2");

        scope.set("n", 41);
        scope.digest();
        assert_eq!(node.text(), "42");
    }

    #[test]
    fn model_writes_strings_and_follows_the_scope() {
        let scope = Scope::new();
        let person = Object::new();
        scope.set("person", person.clone());
        let input = Node::new("input");
        model().link(&input, &scope, "person.name");

        input.type_text("Ada");
        assert_eq!(person.get("name"), Some(Value::from("Ada")));

        scope.eval("person.name = 'Grace'");
        scope.digest();
        assert_eq!(input.value(), "Grace");
    }

    #[test]
    fn click_evaluates_then_digests() {
        let scope = Scope::new();
        scope.set("count", 0);
        let button = Node::new("button");
        let label = Node::new("span");
        click().link(&button, &scope, "count = count + 1");
        bind().link(&label, &scope, "count");

        button.click();
        button.click();
        assert_eq!(scope.get("count"), Value::from(2));
        assert_eq!(label.text(), "2");
    }

    #[test]
    fn limited_event_digest_gives_up() {
        let scope = Scope::with_config(RuntimeConfig::default().with_digest_limit(3));
        scope.set("n", 0);
        let writer = scope.clone();
        scope.watch("n", move |_| {
            writer.eval("n = n + 1");
        });

        let button = Node::new("button");
        click().link(&button, &scope, "n = 100");
        button.click();
        assert_eq!(scope.get("n"), Value::from(103));
    }

    #[test]
    fn controller_without_registration_is_harmless() {
        let injector = Rc::new(Injector::new());
        let scope = injector.root_scope();
        controller(Rc::downgrade(&injector)).link(&Node::new("div"), &scope, "Missing");
        assert_eq!(scope.watcher_count(), 0);
    }
}
