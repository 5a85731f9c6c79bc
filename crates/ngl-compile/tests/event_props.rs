use std::rc::Rc;

use ngl_compile::{Compiler, Node};
use ngl_runtime::Injector;
use proptest::prelude::*;

fn counter() -> (Node, Node, Node) {
    let label = Node::new("span").with_attr("ngl-bind", "count");
    let inc = Node::new("button").with_attr("ngl-click", "count = count + 1");
    let dec = Node::new("button").with_attr("ngl-click", "count = count - 1");
    let root = Node::new("div")
        .with_child(label.clone())
        .with_child(inc.clone())
        .with_child(dec.clone());
    let scope = Compiler::with_builtins(Rc::new(Injector::new())).bootstrap(&root);
    scope.set("count", 0);
    scope.digest();
    (label, inc, dec)
}

proptest! {
    #[test]
    fn label_tracks_every_click(clicks in proptest::collection::vec(any::<bool>(), 0..40)) {
        let (label, inc, dec) = counter();
        let mut expected = 0_i32;
        for up in clicks {
            if up {
                inc.click();
                expected += 1;
            } else {
                dec.click();
                expected -= 1;
            }
            prop_assert_eq!(label.text(), expected.to_string());
        }
    }

    #[test]
    fn typed_text_is_mirrored_verbatim(text in "[a-zA-Z0-9 ]{0,24}") {
        let input = Node::new("input").with_attr("ngl-model", "draft");
        let echo = Node::new("p").with_attr("ngl-bind", "draft");
        let root = Node::new("form").with_child(input.clone()).with_child(echo.clone());
        Compiler::with_builtins(Rc::new(Injector::new())).bootstrap(&root);

        input.type_text(&text);
        prop_assert_eq!(echo.text(), text);
    }
}
