use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use ngl_core::{Value, factory};
use ngl_runtime::{DigestError, Injector, Locals, RuntimeConfig, Scope};
use tracing::Level;
use tracing_subscriber::layer::{Context, SubscriberExt};
use tracing_subscriber::{Layer, Registry};

type Log = Rc<RefCell<Vec<String>>>;

fn log() -> Log {
    Rc::new(RefCell::new(Vec::new()))
}

fn push(log: &Log, entry: impl Into<String>) {
    log.borrow_mut().push(entry.into());
}

#[test]
fn undefined_watch_fires_only_after_it_becomes_defined() {
    let scope = Scope::new();
    let fired = log();

    let sink = Rc::clone(&fired);
    scope.watch("x", move |v| push(&sink, v.to_string()));
    assert!(fired.borrow().is_empty());

    scope.digest();
    assert!(fired.borrow().is_empty(), "still undefined, nothing to report");

    scope.set("x", "ready");
    scope.digest();
    assert_eq!(*fired.borrow(), ["ready"]);
}

#[test]
fn chained_watchers_converge_in_one_digest() {
    let scope = Scope::new();
    scope.set("x", 1);
    scope.set("y", 2);
    let fired = log();

    let (a_scope, a_log) = (scope.clone(), Rc::clone(&fired));
    scope.watch("x", move |_| {
        a_scope.eval("y = x + 1");
        push(&a_log, "A");
    });
    let b_log = Rc::clone(&fired);
    scope.watch("y", move |y| push(&b_log, format!("B:{y}")));

    scope.set("x", 10);
    scope.digest();
    assert_eq!(*fired.borrow(), ["A", "B:11"]);
}

#[test]
fn later_watcher_feeding_an_earlier_one_needs_another_pass() {
    let scope = Scope::new();
    scope.set("total", 0);
    scope.set("input", 0);
    let fired = log();

    let first = Rc::clone(&fired);
    scope.watch("total", move |t| push(&first, format!("total={t}")));
    let writer = scope.clone();
    scope.watch("input", move |_| {
        writer.eval("total = input * 2");
    });

    scope.set("input", 4);
    scope.digest();
    assert_eq!(*fired.borrow(), ["total=8"]);
}

#[test]
fn child_reads_parent_until_it_shadows() {
    let root = Scope::new();
    root.set("name", "parent");
    let child = root.new_child();

    assert_eq!(child.eval("name"), Value::from("parent"));
    child.eval("name = 'child'");
    root.set("name", "changed");
    assert_eq!(child.eval("name"), Value::from("child"));
    assert_eq!(root.eval("name"), Value::from("changed"));
}

#[test]
fn digest_reaches_every_descendant() {
    let root = Scope::new();
    let child = root.new_child();
    let grandchild = child.new_child();
    let sibling = root.new_child();
    let fired = log();

    for (scope, label) in [(&grandchild, "grandchild"), (&sibling, "sibling")] {
        let sink = Rc::clone(&fired);
        scope.watch("v", move |_| push(&sink, label));
    }

    root.set("v", 1);
    root.digest();
    assert_eq!(*fired.borrow(), ["grandchild", "sibling"]);
}

#[test]
fn destroyed_children_are_not_digested() {
    let root = Scope::new();
    let child = root.new_child();
    let fired = log();
    let sink = Rc::clone(&fired);
    child.watch("v", move |_| push(&sink, "child"));

    child.destroy().expect("attached child");
    root.set("v", 1);
    root.digest();
    assert!(fired.borrow().is_empty());
}

#[test]
fn child_writes_to_the_parent_wait_for_the_next_parent_digest() {
    let root = Scope::new();
    root.set("total", 0);
    let fired = log();
    let sink = Rc::clone(&fired);
    root.watch("total", move |t| push(&sink, format!("total={t}")));

    let child = root.new_child();
    child.set("x", 1);
    let writer = child.clone();
    child.watch("x", move |_| {
        writer.eval("$parent.total = x * 10");
    });

    child.set("x", 2);
    root.digest();
    assert_eq!(root.get("total"), Value::from(20), "child callback ran");
    assert!(fired.borrow().is_empty(), "parent loop is not re-entered");

    root.digest();
    assert_eq!(*fired.borrow(), ["total=20"]);
}

#[test]
fn overly_nested_expressions_evaluate_to_undefined() {
    let scope = Scope::new();
    let source = "!".repeat(10_000);
    assert_eq!(scope.eval(source.as_str()), Value::Undefined);
    assert!(matches!(
        scope.try_eval(&source),
        Err(ngl_expr::EvalError::Syntax { .. })
    ));

    let fired = log();
    let sink = Rc::clone(&fired);
    scope.watch(format!("{}1{}", "(".repeat(5_000), ")".repeat(5_000)), move |_| {
        push(&sink, "deep")
    });
    scope.digest();
    assert!(fired.borrow().is_empty());
}

#[test]
fn callbacks_may_register_watchers_and_digest_nested() {
    let scope = Scope::new();
    scope.set("x", 0);
    let fired = log();

    let (inner_scope, inner_log) = (scope.clone(), Rc::clone(&fired));
    scope.watch("x", move |_| {
        if inner_scope.watcher_count() == 1 {
            let sink = Rc::clone(&inner_log);
            inner_scope.watch("x * 10", move |v| push(&sink, format!("late:{v}")));
        }
        inner_scope.digest();
        push(&inner_log, "outer");
    });

    scope.set("x", 1);
    scope.digest();
    assert_eq!(scope.watcher_count(), 2);
    assert_eq!(fired.borrow().last().map(String::as_str), Some("outer"));

    scope.set("x", 2);
    scope.digest();
    assert!(fired.borrow().iter().any(|entry| entry == "late:20"));
}

#[test]
fn bounded_digest_allows_settling_scopes() {
    let root = Scope::new();
    root.set("x", 1);
    let writer = root.clone();
    root.watch("x", move |_| {
        writer.eval("y = x");
    });

    root.set("x", 2);
    assert_eq!(root.digest_with_limit(2), Ok(()));
    assert_eq!(root.get("y"), Value::from(2));
}

#[test]
fn bounded_digest_names_the_runaway_child() {
    let root = Scope::new();
    let child = root.new_child();
    child.set("n", 0);
    let writer = child.clone();
    child.watch("n", move |_| {
        writer.eval("n = n + 1");
    });
    child.set("n", 1);

    assert_eq!(
        root.digest_with_limit(10),
        Err(DigestError::IterationLimit {
            scope_id: child.id(),
            passes: 10,
        })
    );
}

#[test]
fn controllers_mutate_their_own_scopes() {
    let injector = Injector::new();
    injector.controller(
        "C",
        factory!(|scope: "scope"| {
            if let Some(scope) = Scope::from_value(&scope) {
                scope.set("v", 1);
            }
        }),
    );
    let Value::Function(ctrl) = injector.get("CController", &Locals::new()) else {
        panic!("controller factory");
    };

    let root = injector.root_scope();
    let (s1, s2) = (root.new_child(), root.new_child());
    injector.invoke(&ctrl, &Locals::new().with("scope", &s1));
    assert_eq!(s1.get("v"), Value::from(1));
    assert!(s2.get("v").is_undefined());

    s1.set("v", 5);
    injector.invoke(&ctrl, &Locals::new().with("scope", &s2));
    assert_eq!(s1.get("v"), Value::from(5));
    assert_eq!(s2.get("v"), Value::from(1));
    assert!(!root.has_own("v"));
}

struct WarnCounter(Arc<AtomicUsize>);

impl<S: tracing::Subscriber> Layer<S> for WarnCounter {
    fn on_event(&self, event: &tracing::Event<'_>, _ctx: Context<'_, S>) {
        if *event.metadata().level() == Level::WARN {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }
}

fn warnings_during(config: RuntimeConfig, source: &str) -> usize {
    let count = Arc::new(AtomicUsize::new(0));
    let subscriber = Registry::default().with(WarnCounter(Arc::clone(&count)));
    tracing::subscriber::with_default(subscriber, || {
        let scope = Scope::with_config(config);
        assert!(scope.eval(source).is_undefined());
    });
    count.load(Ordering::SeqCst)
}

#[test]
fn eval_diagnostics_promote_failures_to_warnings() {
    let loud = RuntimeConfig::default().with_eval_diagnostics(true);
    assert_eq!(warnings_during(loud, "missing.member"), 1);
    assert_eq!(warnings_during(RuntimeConfig::default(), "missing.member"), 0);
}
