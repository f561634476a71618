use stagedom::{Document, Element, Selector, SelectorError};

fn sample() -> Document {
    Document::new(
        Element::div()
            .id("root")
            .child(
                Element::div()
                    .id("h0")
                    .class("handle")
                    .data("role", "dropdown-handle"),
            )
            .child(
                Element::div()
                    .id("e0")
                    .class("panel")
                    .class("wide")
                    .data("role", "dropdown-content"),
            )
            .child(Element::span("x").id("s0").data("flag", "")),
    )
}

fn ids(doc: &Document, selector: &str) -> Vec<String> {
    let selector = Selector::parse(selector).unwrap();
    doc.select(doc.root(), &selector)
        .into_iter()
        .map(|n| doc.get(n).unwrap().id.clone())
        .collect()
}

// ============================================================================
// Matching
// ============================================================================

#[test]
fn test_attribute_equals_selector() {
    let doc = sample();
    assert_eq!(ids(&doc, r#"[data-role="dropdown-handle"]"#), vec!["h0"]);
    assert_eq!(ids(&doc, "[data-role='dropdown-content']"), vec!["e0"]);
    assert_eq!(ids(&doc, "[data-role=dropdown-content]"), vec!["e0"]);
    assert_eq!(ids(&doc, r#"[ data-role = "dropdown-content" ]"#), vec!["e0"]);
}

#[test]
fn test_attribute_presence_selector() {
    let doc = sample();
    assert_eq!(ids(&doc, "[data-role]"), vec!["h0", "e0"]);
    assert_eq!(ids(&doc, "[data-flag]"), vec!["s0"]);
    assert!(ids(&doc, "[data-missing]").is_empty());
}

#[test]
fn test_tag_id_and_class_selectors() {
    let doc = sample();
    assert_eq!(ids(&doc, "span"), vec!["s0"]);
    assert_eq!(ids(&doc, "#e0"), vec!["e0"]);
    assert_eq!(ids(&doc, ".panel.wide"), vec!["e0"]);
    assert!(ids(&doc, ".panel.narrow").is_empty());
    assert_eq!(ids(&doc, "div.handle"), vec!["h0"]);
    assert_eq!(ids(&doc, "[class='panel wide']"), vec!["e0"]);
}

#[test]
fn test_selector_list_keeps_document_order() {
    let doc = sample();
    assert_eq!(ids(&doc, "span, .handle"), vec!["h0", "s0"]);
    assert_eq!(ids(&doc, "*"), vec!["h0", "e0", "s0"]);
}

#[test]
fn test_select_excludes_scope() {
    let doc = sample();
    let div = Selector::parse("div").unwrap();
    assert_eq!(doc.select(doc.root(), &div).len(), 2);
    assert_eq!(doc.select_all(&div).len(), 3);
}

// ============================================================================
// Parse errors
// ============================================================================

#[test]
fn test_empty_selector_rejected() {
    assert_eq!(Selector::parse("   "), Err(SelectorError::Empty));
    assert_eq!(Selector::parse("a,,b"), Err(SelectorError::Empty));
}

#[test]
fn test_combinators_rejected() {
    assert!(matches!(
        Selector::parse("div span"),
        Err(SelectorError::Combinator(_))
    ));
    assert!(matches!(
        Selector::parse("div>span"),
        Err(SelectorError::Combinator(_))
    ));
}

#[test]
fn test_unterminated_attribute_rejected() {
    assert!(matches!(
        Selector::parse(r#"[data-role="x"#),
        Err(SelectorError::UnterminatedAttribute(_))
    ));
    assert!(matches!(
        Selector::parse("[data-role"),
        Err(SelectorError::UnterminatedAttribute(_))
    ));
}

#[test]
fn test_missing_name_reports_offset() {
    match Selector::parse("div.") {
        Err(SelectorError::MissingName { offset, .. }) => assert_eq!(offset, 4),
        other => panic!("unexpected: {:?}", other),
    }
    match Selector::parse("a, #") {
        Err(SelectorError::MissingName { offset, .. }) => assert_eq!(offset, 4),
        other => panic!("unexpected: {:?}", other),
    }
}

#[test]
fn test_display_and_from_str() {
    let selector: Selector = " .item ".parse().unwrap();
    assert_eq!(selector.to_string(), ".item");
    assert_eq!(selector.as_str(), ".item");
}
