#![no_main]

use libfuzzer_sys::fuzz_target;
use ngl_runtime::Scope;

// Parsing and evaluating arbitrary source must never panic; errors are fine.
fuzz_target!(|data: &[u8]| {
    let Ok(source) = std::str::from_utf8(data) else {
        return;
    };
    if source.len() > 4096 {
        return;
    }

    if let Err(ngl_expr::EvalError::Syntax { offset, .. }) = ngl_expr::parse(source) {
        assert!(offset <= source.len());
    }

    let scope = Scope::new();
    scope.set("a", 1);
    scope.set("s", "text");
    scope.set("o", ngl_core::Object::new().with("k", 2));
    let _ = scope.try_eval(source);
});
