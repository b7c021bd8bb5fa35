//! Tests for `>>` chains, engine prefixes, capture, and the public API.

mod common;

use common::{count, deep_shadow, node_names, page, text_of};
use koala_query::{
    Engine, PseudoClassName, QueryEngine, QueryOptions, Selector, SelectorSyntaxError, query_all,
    query_single, tokenize,
};
use serde_json::json;

// ========== Tokenizer ==========

#[test]
fn test_tokenize_prefixes_and_capture() {
    let parts = tokenize("*css = section >> css:light=div, span >> text='a >> b'", Engine::Css)
        .unwrap();
    assert_eq!(parts.len(), 3);

    assert!(parts[0].capture);
    assert_eq!(parts[0].engine, Engine::Css);
    assert_eq!(parts[0].clause, "section");

    assert!(!parts[1].capture);
    assert_eq!(parts[1].engine, Engine::CssLight);
    assert_eq!(parts[1].clause, "div, span");

    assert_eq!(parts[2].engine, Engine::Text);
    assert_eq!(parts[2].clause, "'a >> b'");
}

#[test]
fn test_tokenize_defaults_and_universal() {
    let parts = tokenize("* >> div", Engine::Css).unwrap();
    assert_eq!(parts[0].clause, "*");
    assert!(!parts[0].capture);
    assert_eq!(parts[1].engine, Engine::Css);

    let parts = tokenize("*.item", Engine::CssLight).unwrap();
    assert_eq!(parts[0].clause, "*.item");
    assert_eq!(parts[0].engine, Engine::CssLight);
}

#[test]
fn test_tokenize_offsets_point_at_clauses() {
    let selector = "css = div >>  *css:light= span";
    let parts = tokenize(selector, Engine::Css).unwrap();
    for part in &parts {
        assert!(selector[part.offset..].starts_with(&part.clause));
    }
}

#[test]
fn test_tokenize_errors() {
    assert_eq!(tokenize("", Engine::Css), Err(SelectorSyntaxError::EmptySelector));
    assert_eq!(tokenize("   ", Engine::Css), Err(SelectorSyntaxError::EmptySelector));
    assert_eq!(tokenize("div >> ", Engine::Css), Err(SelectorSyntaxError::EmptySelector));
    assert_eq!(tokenize("css=", Engine::Css), Err(SelectorSyntaxError::EmptySelector));
    assert_eq!(
        tokenize("*css=a >> *css=b", Engine::Css),
        Err(SelectorSyntaxError::DuplicateCapture)
    );
    assert_eq!(
        tokenize("xpath=//div", Engine::Css),
        Err(SelectorSyntaxError::UnknownEngine {
            name: "xpath".to_string()
        })
    );
    assert_eq!(
        tokenize(r#"[attr="open]"#, Engine::Css),
        Err(SelectorSyntaxError::UnterminatedString { position: 6 })
    );
    assert!(matches!(
        tokenize("div[attr", Engine::Css),
        Err(SelectorSyntaxError::UnbalancedBracket { bracket: '[', position: 3 })
    ));
    assert!(matches!(
        tokenize("div)", Engine::Css),
        Err(SelectorSyntaxError::UnbalancedBracket { bracket: ')', .. })
    ));
}

#[test]
fn test_tokenize_text_parts_are_free_text() {
    let parts = tokenize("text=don't >> css=span", Engine::Css).unwrap();
    assert_eq!(parts.len(), 2);
    assert_eq!(parts[0].clause, "don't");
    assert_eq!(parts[1].clause, "span");

    let parts = tokenize("css=div >> text=Price (USD >> *text=a]", Engine::Css).unwrap();
    assert_eq!(parts[1].clause, "Price (USD");
    assert_eq!(parts[2].clause, "a]");
    assert!(parts[2].capture);

    let parts = tokenize("text=/a>>b/ >> span", Engine::Css).unwrap();
    assert_eq!(parts[0].clause, "/a>>b/");

    let light = tokenize("it's", Engine::TextLight).unwrap();
    assert_eq!(light[0].clause, "it's");

    assert_eq!(
        tokenize("div >> text=\"open", Engine::Css),
        Err(SelectorSyntaxError::UnterminatedString { position: 12 })
    );
}

#[test]
fn test_errors_are_raised_before_traversal() {
    let tree = deep_shadow();
    for selector in ["div >>", "div:hover", "[a%=b]", "span:nth-child(x)", "text=/(/"] {
        assert!(query_all(&tree, selector, tree.root()).is_err(), "{selector}");
    }
}

// ========== Chains ==========

#[test]
fn test_chain_stages_feed_contexts() {
    let tree = deep_shadow();
    let doc = tree.root();
    assert_eq!(
        text_of(&tree, "css=section >> css=#target", doc).as_deref(),
        Some("Hello from root2")
    );
    assert_eq!(
        text_of(&tree, "#root1 >> css:light=span", doc),
        None,
        "root1's spans are all in its shadow tree"
    );
    assert_eq!(count(&tree, "div >> span"), 4);
    assert_eq!(count(&tree, "div >> div >> span"), 3);
}

#[test]
fn test_empty_stage_yields_empty_result() {
    let tree = deep_shadow();
    assert_eq!(count(&tree, "nothing >> span"), 0);
    assert_eq!(count(&tree, "span >> span"), 0);
}

#[test]
fn test_capture_returns_earlier_stage() {
    let tree = deep_shadow();
    let doc = tree.root();
    // Without an engine prefix, `*` is the universal selector.
    assert_eq!(count(&tree, "* >> span"), 4);
    assert!(query_all(&tree, "*div >> span", doc).is_err());

    assert_eq!(node_names(&tree, "*css=div >> span", doc), "DIV,DIV,DIV");
    assert_eq!(count(&tree, "*css=section >> text=root3"), 1);
}

#[test]
fn test_capture_is_returned_even_when_later_stages_match_nothing() {
    let tree = deep_shadow();
    assert_eq!(count(&tree, "*css=section >> nothing"), 1);
}

#[test]
fn test_text_engine() {
    let tree = deep_shadow();
    let doc = tree.root();
    assert_eq!(count(&tree, "text=hello from"), 4);
    assert_eq!(count(&tree, "text:light=hello"), 0);
    assert_eq!(
        text_of(&tree, r#"text="Hello from root3""#, doc).as_deref(),
        Some("Hello from root3")
    );
    assert_eq!(
        text_of(&tree, "text=/root\\d #\\d/", doc).as_deref(),
        Some("Hello from root3 #2")
    );
    assert_eq!(
        text_of(&tree, "css=div >> text=ROOT2", doc).as_deref(),
        Some("Hello from root2")
    );
}

#[test]
fn test_text_engine_accepts_quotes_and_brackets_mid_clause() {
    let tree = page(json!([
        { "type": "element", "tagName": "p", "children": [
            { "type": "text", "content": "don't stop" }
        ]},
        { "type": "element", "tagName": "p", "children": [
            { "type": "text", "content": "Price (USD" }
        ]}
    ]));
    let doc = tree.root();
    assert_eq!(text_of(&tree, "text=don't", doc).as_deref(), Some("don't stop"));
    assert_eq!(text_of(&tree, "text=Price (USD", doc).as_deref(), Some("Price (USD"));
    assert_eq!(
        text_of(&tree, "css=body >> text=(usd", doc).as_deref(),
        Some("Price (USD")
    );
    assert_eq!(text_of(&tree, r#"text="don't stop""#, doc).as_deref(), Some("don't stop"));
}

#[test]
fn test_text_engine_uses_own_text_only() {
    let tree = page(json!([{
        "type": "element", "tagName": "p", "children": [
            { "type": "text", "content": "outer " },
            { "type": "element", "tagName": "b", "children": [
                { "type": "text", "content": "inner" }
            ]}
        ]
    }]));
    assert_eq!(node_names(&tree, "text=inner", tree.root()), "B");
    assert_eq!(node_names(&tree, "text=outer", tree.root()), "P");
    assert_eq!(node_names(&tree, "text=\"outer inner\"", tree.root()), "");
}

// ========== Public API ==========

#[test]
fn test_selector_compiles_once() {
    let tree = deep_shadow();
    let selector = Selector::parse("css=div div").unwrap();
    let all = selector.query_all(&tree, tree.root());
    assert_eq!(all.len(), 2);
    assert_eq!(selector.query_single(&tree, tree.root()), all.first().copied());
    assert_eq!(selector.query_all(&tree, tree.root()), all);
}

#[test]
fn test_selector_display() {
    let cases = [
        ("div>span", "css=div > span"),
        ("*css = section >> css:light=div ,span", "*css=section >> css:light=div, span"),
        (r#"[attr = "Hello World" i ]"#, r#"css=[attr="Hello World" i]"#),
        ("li:NTH-CHILD( 2n + 1 )", "css=li:nth-child(2n+1)"),
        (r"#a\.b", r"css=#a\.b"),
        ("text='x'", r#"text="x""#),
    ];
    for (input, expected) in cases {
        assert_eq!(Selector::parse(input).unwrap().to_string(), expected, "{input}");
    }
}

#[test]
fn test_query_engine_options() {
    let tree = deep_shadow();

    let light = QueryEngine::new(QueryOptions::default().with_default_engine(Engine::CssLight));
    assert_eq!(light.query_all(&tree, "span", tree.root()).unwrap().len(), 0);
    assert_eq!(light.query_all(&tree, "css=span", tree.root()).unwrap().len(), 4);

    let strict = QueryEngine::new(
        QueryOptions::default().without_pseudo_class(PseudoClassName::NthChild),
    );
    assert_eq!(
        strict.compile("span:nth-child(2)").unwrap_err(),
        SelectorSyntaxError::UnknownPseudoClass {
            name: "nth-child".to_string()
        }
    );
    assert!(strict.query_single(&tree, "span:first-child", tree.root()).unwrap().is_some());
}

#[test]
fn test_query_single_on_no_match() {
    let tree = deep_shadow();
    assert_eq!(query_single(&tree, "css=nothing", tree.root()), Ok(None));
}

#[test]
fn test_selector_is_send_and_sync() {
    fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<Selector>();
}
