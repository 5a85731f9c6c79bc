#![no_main]

use std::cell::Cell;
use std::rc::Rc;

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use ngl_runtime::Scope;

#[derive(Debug, Arbitrary)]
enum Op {
    Child(u8),
    Destroy(u8),
    Set { scope: u8, name: u8, value: i32 },
    Watch { scope: u8, name: u8 },
    Digest(u8),
}

const NAMES: [&str; 4] = ["a", "b", "c", "d"];

// Random tree edits interleaved with bounded digests must never panic.
fuzz_target!(|ops: Vec<Op>| {
    let fired = Rc::new(Cell::new(0_u64));
    let mut scopes = vec![Scope::new()];
    let pick = |scopes: &[Scope], i: u8| scopes[usize::from(i) % scopes.len()].clone();

    for op in ops.into_iter().take(256) {
        match op {
            Op::Child(i) => {
                let child = pick(&scopes, i).new_child();
                scopes.push(child);
            }
            Op::Destroy(i) => {
                let _ = pick(&scopes, i).destroy();
            }
            Op::Set { scope, name, value } => {
                pick(&scopes, scope).set(NAMES[usize::from(name) % NAMES.len()], value);
            }
            Op::Watch { scope, name } => {
                let seen = Rc::clone(&fired);
                pick(&scopes, scope).watch(NAMES[usize::from(name) % NAMES.len()], move |_| {
                    seen.set(seen.get() + 1);
                });
            }
            Op::Digest(i) => {
                let _ = pick(&scopes, i).digest_with_limit(32);
            }
        }
    }
});
