//! In-memory element tree.
//!
//! A [`Node`] is a shared handle: clones see the same element. Children are
//! owned by their parent; handlers installed by directives should capture a
//! [`WeakNode`] to avoid keeping their own element alive.

use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

/// Handler for a simulated user event.
pub type EventHandler = Rc<dyn Fn()>;

#[derive(Default)]
struct NodeData {
    tag: String,
    attributes: Vec<(String, String)>,
    children: Vec<Node>,
    text: String,
    value: String,
    on_key_up: Option<EventHandler>,
    on_click: Option<EventHandler>,
}

#[derive(Clone)]
pub struct Node {
    data: Rc<RefCell<NodeData>>,
}

/// Non-owning reference to a [`Node`].
#[derive(Clone)]
pub struct WeakNode {
    data: Weak<RefCell<NodeData>>,
}

impl WeakNode {
    #[must_use]
    pub fn upgrade(&self) -> Option<Node> {
        self.data.upgrade().map(|data| Node { data })
    }
}

impl Node {
    #[must_use]
    pub fn new(tag: &str) -> Self {
        Self {
            data: Rc::new(RefCell::new(NodeData {
                tag: tag.to_owned(),
                ..NodeData::default()
            })),
        }
    }

    /// Builder form of [`Node::set_attr`].
    #[must_use]
    pub fn with_attr(self, name: &str, value: &str) -> Self {
        self.set_attr(name, value);
        self
    }

    /// Builder form of [`Node::append_child`].
    #[must_use]
    pub fn with_child(self, child: Node) -> Self {
        self.append_child(child);
        self
    }

    #[must_use]
    pub fn with_text(self, text: &str) -> Self {
        self.set_text(text);
        self
    }

    #[must_use]
    pub fn tag(&self) -> String {
        self.data.borrow().tag.clone()
    }

    /// Attributes in document order.
    #[must_use]
    pub fn attributes(&self) -> Vec<(String, String)> {
        self.data.borrow().attributes.clone()
    }

    #[must_use]
    pub fn attr(&self, name: &str) -> Option<String> {
        self.data
            .borrow()
            .attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.clone())
    }

    /// Set an attribute, keeping its position if it already exists.
    pub fn set_attr(&self, name: &str, value: &str) {
        let mut data = self.data.borrow_mut();
        match data.attributes.iter().position(|(key, _)| key == name) {
            Some(index) => value.clone_into(&mut data.attributes[index].1),
            None => data.attributes.push((name.to_owned(), value.to_owned())),
        }
    }

    pub fn append_child(&self, child: Node) {
        self.data.borrow_mut().children.push(child);
    }

    #[must_use]
    pub fn children(&self) -> Vec<Node> {
        self.data.borrow().children.clone()
    }

    #[must_use]
    pub fn text(&self) -> String {
        self.data.borrow().text.clone()
    }

    pub fn set_text(&self, text: &str) {
        text.clone_into(&mut self.data.borrow_mut().text);
    }

    /// Current input value.
    #[must_use]
    pub fn value(&self) -> String {
        self.data.borrow().value.clone()
    }

    /// Change the input value without firing any event.
    pub fn set_value(&self, value: &str) {
        value.clone_into(&mut self.data.borrow_mut().value);
    }

    pub fn on_key_up(&self, handler: impl Fn() + 'static) {
        self.data.borrow_mut().on_key_up = Some(Rc::new(handler));
    }

    pub fn on_click(&self, handler: impl Fn() + 'static) {
        self.data.borrow_mut().on_click = Some(Rc::new(handler));
    }

    /// Fire the key-up handler, if any.
    pub fn key_up(&self) {
        let handler = self.data.borrow().on_key_up.clone();
        if let Some(handler) = handler {
            handler();
        }
    }

    /// Fire the click handler, if any.
    pub fn click(&self) {
        let handler = self.data.borrow().on_click.clone();
        if let Some(handler) = handler {
            handler();
        }
    }

    /// Replace the input value and fire key-up, the way typing does.
    pub fn type_text(&self, value: &str) {
        self.set_value(value);
        self.key_up();
    }

    /// First node in depth-first order (this node included) carrying
    /// attribute `name`.
    #[must_use]
    pub fn find_by_attr(&self, name: &str) -> Option<Node> {
        if self.attr(name).is_some() {
            return Some(self.clone());
        }
        self.children()
            .iter()
            .find_map(|child| child.find_by_attr(name))
    }

    #[must_use]
    pub fn downgrade(&self) -> WeakNode {
        WeakNode {
            data: Rc::downgrade(&self.data),
        }
    }

    #[must_use]
    pub fn ptr_eq(&self, other: &Node) -> bool {
        Rc::ptr_eq(&self.data, &other.data)
    }
}

impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let data = self.data.borrow();
        f.debug_struct("Node")
            .field("tag", &data.tag)
            .field("attributes", &data.attributes)
            .field("text", &data.text)
            .field("value", &data.value)
            .field("children", &data.children)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use super::*;

    #[test]
    fn attributes_keep_document_order() {
        let node = Node::new("input")
            .with_attr("type", "text")
            .with_attr("ngl-model", "name")
            .with_attr("type", "search");
        assert_eq!(
            node.attributes(),
            [
                ("type".to_owned(), "search".to_owned()),
                ("ngl-model".to_owned(), "name".to_owned()),
            ]
        );
        assert_eq!(node.attr("ngl-model").as_deref(), Some("name"));
        assert_eq!(node.attr("missing"), None);
    }

    #[test]
    fn handlers_fire_on_events() {
        let node = Node::new("button");
        let clicks = Rc::new(Cell::new(0));
        let counter = Rc::clone(&clicks);
        node.on_click(move || counter.set(counter.get() + 1));

        node.click();
        node.click();
        node.key_up();
        assert_eq!(clicks.get(), 2);
    }

    #[test]
    fn handler_may_touch_its_own_node() {
        let node = Node::new("input");
        let weak = node.downgrade();
        node.on_key_up(move || {
            if let Some(node) = weak.upgrade() {
                let upper = node.value().to_uppercase();
                node.set_text(&upper);
            }
        });
        node.type_text("abc");
        assert_eq!(node.text(), "ABC");
        assert_eq!(node.value(), "abc");
    }

    #[test]
    fn find_by_attr_is_depth_first() {
        let deep = Node::new("b").with_attr("mark", "deep");
        let shallow = Node::new("i").with_attr("mark", "shallow");
        let root = Node::new("div")
            .with_child(Node::new("p").with_child(deep.clone()))
            .with_child(shallow);
        let found = root.find_by_attr("mark").expect("marked node");
        assert!(found.ptr_eq(&deep));
    }

    #[test]
    fn weak_handles_do_not_keep_nodes_alive() {
        let node = Node::new("span");
        let weak = node.downgrade();
        assert!(weak.upgrade().is_some());
        drop(node);
        assert!(weak.upgrade().is_none());
    }
}
