//! Shared fixtures for the selector integration tests.

#![allow(dead_code)]

use koala_dom::{DomTree, NodeId};
use serde_json::{Value, json};

/// `<html><head></head><body>{body}</body></html>` as a tree.
pub fn page(body: Value) -> DomTree {
    let snapshot = json!({
        "type": "document",
        "children": [{
            "type": "element",
            "tagName": "html",
            "children": [
                { "type": "element", "tagName": "head" },
                { "type": "element", "tagName": "body", "children": body }
            ]
        }]
    });
    DomTree::from_json(&snapshot.to_string()).unwrap()
}

fn element(tag: &str, attributes: Value, children: Value) -> Value {
    json!({ "type": "element", "tagName": tag, "attributes": attributes, "children": children })
}

fn text(content: &str) -> Value {
    json!({ "type": "text", "content": content })
}

/// A `<span>` with text, used by the shadow fixture.
fn span(attributes: Value, content: &str) -> Value {
    element("span", attributes, json!([text(content)]))
}

/// The deep shadow page:
///
/// ```text
/// section
/// └── div#root1
///     └── #shadow-root (open)
///         ├── span[data-testid=foo] "Hello from root1"
///         ├── div (root2)
///         │   └── #shadow-root (open)
///         │       └── span#target "Hello from root2"
///         └── div (root3)
///             └── #shadow-root (open)
///                 ├── span[data-testid=foo] "Hello from root3"
///                 └── span[attr="value space"] "Hello from root3 #2"
/// ```
pub fn deep_shadow() -> DomTree {
    let root2 = json!({
        "type": "element",
        "tagName": "div",
        "shadowRoot": { "mode": "open", "children": [
            span(json!({ "id": "target" }), "Hello from root2")
        ]}
    });
    let root3 = json!({
        "type": "element",
        "tagName": "div",
        "shadowRoot": { "mode": "open", "children": [
            span(json!({ "data-testid": "foo" }), "Hello from root3"),
            span(json!({ "attr": "value space" }), "Hello from root3 #2")
        ]}
    });
    let root1 = json!({
        "type": "element",
        "tagName": "div",
        "attributes": { "id": "root1" },
        "shadowRoot": { "mode": "open", "children": [
            span(json!({ "data-testid": "foo" }), "Hello from root1"),
            root2,
            root3
        ]}
    });
    page(json!([element("section", json!({}), json!([root1]))]))
}

/// `textContent` of the first match of `selector` below `root`.
pub fn text_of(tree: &DomTree, selector: &str, root: NodeId) -> Option<String> {
    koala_query::query_single(tree, selector, root)
        .unwrap()
        .map(|node| tree.text_content(node))
}

/// Upper-cased tag names of every match, comma-joined like `nodeName`s.
pub fn node_names(tree: &DomTree, selector: &str, root: NodeId) -> String {
    koala_query::query_all(tree, selector, root)
        .unwrap()
        .into_iter()
        .filter_map(|node| tree.as_element(node))
        .map(|element| element.tag_name.to_ascii_uppercase())
        .collect::<Vec<_>>()
        .join(",")
}

/// Number of matches of `selector` below the document.
pub fn count(tree: &DomTree, selector: &str) -> usize {
    koala_query::query_all(tree, selector, tree.root())
        .unwrap()
        .len()
}
