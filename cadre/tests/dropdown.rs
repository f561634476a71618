//! Tests for the dropdown controller.

use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

use cadre::page::{Page, Retain};
use cadre::widgets::dropdown::{Dropdown, DropdownOptions, INDEX_KEY, PairPhase};
use stagedom::{Element, NodeId};

const ACTIVE: &str = "is-dropdown-active";

type Recorded = Rc<RefCell<Vec<(String, usize)>>>;

fn ms(n: u64) -> Duration {
    Duration::from_millis(n)
}

/// Three handle/expander pairs inside `#menu`, plus a button outside it.
fn menu_page(focusable_content: bool) -> Page {
    let pairs = (0..3).flat_map(|i| {
        [
            Element::button(format!("Item {i}"))
                .id(format!("handle-{i}"))
                .data("role", "dropdown-handle"),
            Element::div()
                .id(format!("content-{i}"))
                .data("role", "dropdown-content")
                .focusable(focusable_content)
                .child(Element::button(format!("Inner {i}")).id(format!("inner-{i}"))),
        ]
    });
    Page::new(
        Element::div()
            .id("body")
            .child(Element::div().id("menu").children(pairs))
            .child(Element::button("Outside").id("outside")),
    )
}

fn node(page: &Page, id: &str) -> NodeId {
    page.find(id).unwrap()
}

fn build(page: &mut Page, root: &str) -> Dropdown {
    let root = node(page, root);
    let dropdowns = Dropdown::widget_type();
    dropdowns.construct(page, root).widget().clone()
}

/// Record expand/collapse events bubbling up to `root`.
fn record(page: &mut Page, root: &str) -> Recorded {
    let root = node(page, root);
    let seen: Recorded = Rc::new(RefCell::new(Vec::new()));
    for name in ["dropdownExpand", "dropdownCollapse"] {
        let log = Rc::clone(&seen);
        page.listen(root, name, move |_page, event| {
            log.borrow_mut()
                .push((event.name.clone(), event.index().unwrap_or(usize::MAX)));
            Retain::Keep
        });
    }
    seen
}

fn expanded(index: usize) -> (String, usize) {
    ("dropdownExpand".to_string(), index)
}

fn collapsed(index: usize) -> (String, usize) {
    ("dropdownCollapse".to_string(), index)
}

// ============================================================================
// Construction
// ============================================================================

#[test]
fn test_pairs_tagged_with_index() {
    let mut page = menu_page(true);
    let dropdown = build(&mut page, "menu");

    assert_eq!(dropdown.pair_count(&page), 3);
    let doc = page.document();
    assert_eq!(doc.data(node(&page, "handle-2"), INDEX_KEY), Some("2"));
    assert_eq!(doc.data(node(&page, "content-2"), INDEX_KEY), Some("2"));
    assert_eq!(dropdown.handle(&page, 1), Some(node(&page, "handle-1")));
    assert_eq!(dropdown.expander(&page, 1), Some(node(&page, "content-1")));
    assert_eq!(dropdown.handle(&page, 3), None);
}

#[test]
fn test_construct_twice_binds_once() {
    let mut page = menu_page(true);
    let menu = node(&page, "menu");
    let dropdowns = Dropdown::widget_type();

    let a = dropdowns.construct(&mut page, menu);
    let b = dropdowns.construct(&mut page, menu);

    assert!(Rc::ptr_eq(&a, &b));
    assert!(page.document().has_class(menu, "is-dropdown-instantiated"));
    assert_eq!(page.listener_count(node(&page, "handle-0"), "focus"), 1);
    assert_eq!(page.listener_count(node(&page, "handle-0"), "click"), 1);
    assert_eq!(page.listener_count(node(&page, "content-0"), "mouseover"), 1);
}

#[test]
fn test_shared_type_handle_builds_once_per_root() {
    let mut page = menu_page(true);
    let menu = node(&page, "menu");
    let dropdowns = Dropdown::widget_type();
    let shared = dropdowns.clone();

    let a = dropdowns.construct(&mut page, menu);
    let b = shared.construct(&mut page, menu);

    assert!(Rc::ptr_eq(&a, &b));
    assert_eq!(shared.instance_count(), 1);
    assert_eq!(page.listener_count(node(&page, "handle-1"), "focus"), 1);
}

#[test]
fn test_default_options() {
    let options = DropdownOptions::default();
    assert_eq!(options.throttle_delay, 300);
    assert_eq!(options.active_dropdown_class, ACTIVE);
    assert!(options.triggers.on.contains_key("focus"));
    assert!(options.triggers.off.contains_key("blur"));
    assert!(options.triggers.toggle.contains_key("click"));

    let dropdowns = Dropdown::widget_type();
    let defaults = dropdowns.default_options();
    assert_eq!(defaults.get("throttleDelay"), Some(&serde_json::json!(300)));
    assert_eq!(
        defaults.get("dropdownHandleSelector"),
        Some(&serde_json::json!(r#"[data-role="dropdown-handle"]"#))
    );
}

#[test]
fn test_invalid_options_fall_back_to_defaults() {
    let mut page = menu_page(true);
    let menu = node(&page, "menu");
    page.document_mut().set_data(menu, "throttle-delay", "slow");

    let dropdown = build(&mut page, "menu");

    assert_eq!(dropdown.options(), DropdownOptions::default());
    assert_eq!(dropdown.pair_count(&page), 3);
}

#[test]
fn test_invalid_selector_yields_no_pairs() {
    let mut page = menu_page(true);
    let menu = node(&page, "menu");
    page.document_mut().set_data(menu, "dropdown-handle-selector", "div > button");
    let seen = record(&mut page, "menu");

    let dropdown = build(&mut page, "menu");
    assert_eq!(dropdown.pair_count(&page), 0);

    dropdown.expand(&mut page, 0, Duration::ZERO);
    page.tick();

    assert!(seen.borrow().is_empty());
    assert!(!page.document().has_class(node(&page, "handle-0"), ACTIVE));
}

// ============================================================================
// Transitions
// ============================================================================

#[test]
fn test_zero_delay_expand_waits_for_tick() {
    let mut page = menu_page(true);
    let dropdown = build(&mut page, "menu");
    let seen = record(&mut page, "menu");

    dropdown.expand(&mut page, 2, Duration::ZERO);
    assert!(!dropdown.is_active(&page, 2));
    assert_eq!(dropdown.phase(&page, 2), PairPhase::PendingExpand);

    page.tick();

    assert!(dropdown.is_active(&page, 2));
    assert!(page.document().has_class(node(&page, "handle-2"), ACTIVE));
    assert_eq!(*seen.borrow(), vec![expanded(2)]);
    assert_eq!(page.focused(), Some(node(&page, "content-2")));
}

#[test]
fn test_throttle_blocks_then_releases() {
    let mut page = menu_page(true);
    let dropdown = build(&mut page, "menu");
    let seen = record(&mut page, "menu");

    dropdown.expand(&mut page, 2, Duration::ZERO);
    page.tick();
    assert_eq!(dropdown.phase(&page, 2), PairPhase::Throttled);

    dropdown.expand(&mut page, 2, Duration::ZERO);
    dropdown.collapse(&mut page, 2, Duration::ZERO);
    page.advance(ms(299));
    assert!(dropdown.is_active(&page, 2));
    assert_eq!(seen.borrow().len(), 1);

    page.advance(ms(1));
    assert_eq!(dropdown.phase(&page, 2), PairPhase::Active);

    dropdown.collapse(&mut page, 2, Duration::ZERO);
    page.tick();
    assert!(!dropdown.is_active(&page, 2));
    assert!(!page.document().has_class(node(&page, "handle-2"), ACTIVE));
    assert_eq!(*seen.borrow(), vec![expanded(2), collapsed(2)]);
}

#[test]
fn test_reaction_to_expand_is_not_throttled() {
    let mut page = menu_page(true);
    let dropdown = build(&mut page, "menu");
    let seen = record(&mut page, "menu");
    let handle = node(&page, "handle-0");

    let closer = dropdown.clone();
    page.listen(handle, "dropdownExpand", move |page, event| {
        if let Some(index) = event.index() {
            closer.collapse(page, index, Duration::ZERO);
        }
        Retain::Remove
    });

    dropdown.expand(&mut page, 0, Duration::ZERO);
    page.tick();

    assert!(!dropdown.is_active(&page, 0));
    assert_eq!(*seen.borrow(), vec![expanded(0), collapsed(0)]);
    assert_eq!(dropdown.phase(&page, 0), PairPhase::Throttled);
}

#[test]
fn test_collapse_before_expand_fires_cancels_it() {
    let mut page = menu_page(true);
    let dropdown = build(&mut page, "menu");
    let seen = record(&mut page, "menu");

    dropdown.expand(&mut page, 0, ms(100));
    page.advance(ms(40));
    dropdown.collapse(&mut page, 0, ms(50));
    assert_eq!(dropdown.phase(&page, 0), PairPhase::PendingCollapse);

    page.advance(ms(200));

    assert!(!dropdown.is_active(&page, 0));
    assert!(!seen.borrow().contains(&expanded(0)));
    assert_eq!(*seen.borrow(), vec![collapsed(0)]);
}

#[test]
fn test_repeated_expand_schedules_once() {
    let mut page = menu_page(true);
    let dropdown = build(&mut page, "menu");
    let seen = record(&mut page, "menu");

    dropdown.expand(&mut page, 1, ms(100));
    dropdown.expand(&mut page, 1, ms(100));
    dropdown.expand(&mut page, 1, ms(10));
    assert_eq!(page.pending_timers(), 1);

    page.advance(ms(100));

    assert_eq!(*seen.borrow(), vec![expanded(1)]);
}

#[test]
fn test_pairs_are_independent() {
    let mut page = menu_page(true);
    let dropdown = build(&mut page, "menu");
    let seen = record(&mut page, "menu");

    dropdown.expand(&mut page, 0, Duration::ZERO);
    page.tick();
    dropdown.expand(&mut page, 1, Duration::ZERO);
    page.tick();

    assert!(dropdown.is_active(&page, 0));
    assert!(dropdown.is_active(&page, 1));
    assert!(!dropdown.is_active(&page, 2));
    assert_eq!(*seen.borrow(), vec![expanded(0), expanded(1)]);
}

#[test]
fn test_missing_pair_touches_nothing() {
    let mut page = menu_page(true);
    let dropdown = build(&mut page, "menu");
    let seen = record(&mut page, "menu");

    dropdown.expand(&mut page, 7, Duration::ZERO);
    page.tick();

    assert!(seen.borrow().is_empty());
    assert!(!dropdown.is_active(&page, 7));
    assert_eq!(page.focused(), None);
}

#[tokio::test(start_paused = true)]
async fn test_run_until_idle_drives_timers() {
    let mut page = menu_page(true);
    let dropdown = build(&mut page, "menu");
    let seen = record(&mut page, "menu");

    dropdown.expand(&mut page, 0, ms(100));
    page.run_until_idle().await;

    assert!(dropdown.is_active(&page, 0));
    assert_eq!(page.pending_timers(), 0);
    assert_eq!(page.now(), ms(400));
    assert_eq!(dropdown.phase(&page, 0), PairPhase::Active);
    assert_eq!(*seen.borrow(), vec![expanded(0)]);
}

// ============================================================================
// Hover
// ============================================================================

#[test]
fn test_hover_holds_pending_collapse() {
    let mut page = menu_page(true);
    let dropdown = build(&mut page, "menu");
    let content = node(&page, "content-0");

    dropdown.expand(&mut page, 0, Duration::ZERO);
    page.tick();
    page.advance(ms(300));

    dropdown.collapse(&mut page, 0, ms(200));
    page.hover(content);
    assert_eq!(dropdown.phase(&page, 0), PairPhase::Active);

    page.advance(ms(500));
    assert!(dropdown.is_active(&page, 0));

    page.leave(content);
    page.tick();
    assert!(!dropdown.is_active(&page, 0));
    assert_eq!(page.listener_count(content, "mouseleave"), 0);
}

#[test]
fn test_hover_without_pending_collapse_is_ignored() {
    let mut page = menu_page(true);
    let _dropdown = build(&mut page, "menu");
    let content = node(&page, "content-1");

    page.hover(content);

    assert_eq!(page.listener_count(content, "mouseleave"), 0);
}

// ============================================================================
// Default triggers
// ============================================================================

#[test]
fn test_focus_expands_and_blur_collapses() {
    let mut page = menu_page(false);
    let dropdown = build(&mut page, "menu");
    let seen = record(&mut page, "menu");
    let handle = node(&page, "handle-0");

    page.focus(handle);
    page.tick();
    assert!(dropdown.is_active(&page, 0));
    assert_eq!(page.focused(), Some(handle));

    page.advance(ms(300));
    page.blur();
    page.tick();

    assert!(!dropdown.is_active(&page, 0));
    assert_eq!(*seen.borrow(), vec![expanded(0), collapsed(0)]);
    assert_eq!(page.listener_count(handle, "blur"), 0);
}

#[test]
fn test_blur_before_expand_fires_cancels_it() {
    let mut page = menu_page(false);
    let dropdown = build(&mut page, "menu");
    let seen = record(&mut page, "menu");

    page.focus(node(&page, "handle-1"));
    page.blur();
    page.tick();

    assert!(!dropdown.is_active(&page, 1));
    assert_eq!(*seen.borrow(), vec![collapsed(1)]);
}

#[test]
fn test_handle_blur_from_expander_focus_collapses() {
    let mut page = menu_page(true);
    let dropdown = build(&mut page, "menu");
    let seen = record(&mut page, "menu");
    let handle = node(&page, "handle-0");

    page.focus(handle);
    page.tick();

    assert_eq!(page.focused(), Some(node(&page, "content-0")));
    assert!(!dropdown.is_active(&page, 0));
    assert_eq!(*seen.borrow(), vec![expanded(0), collapsed(0)]);
    assert_eq!(page.listener_count(handle, "blur"), 0);
}

#[test]
fn test_click_toggles() {
    let mut page = menu_page(false);
    let dropdown = build(&mut page, "menu");
    let seen = record(&mut page, "menu");
    let handle = node(&page, "handle-1");

    page.click(handle);
    page.tick();
    assert!(dropdown.is_active(&page, 1));

    page.advance(ms(300));
    page.click(handle);
    page.tick();
    assert!(!dropdown.is_active(&page, 1));
    assert_eq!(*seen.borrow(), vec![expanded(1), collapsed(1)]);
}

// ============================================================================
// Configured triggers
// ============================================================================

#[test]
fn test_off_trigger_ignores_events_inside_expander() {
    let mut page = Page::new(
        Element::div()
            .id("menu")
            .data("throttle-delay", "0")
            .data(
                "triggers",
                r#"{"on": {"focus": {"delay": 0}}, "off": {"click": {"delay": 0}}}"#,
            )
            .child(
                Element::new("li")
                    .id("handle")
                    .data("role", "dropdown-handle")
                    .focusable(true)
                    .child(
                        Element::div()
                            .id("content")
                            .data("role", "dropdown-content")
                            .child(Element::button("Inner").id("inner")),
                    ),
            ),
    );
    let dropdown = build(&mut page, "menu");
    let handle = node(&page, "handle");

    page.focus(handle);
    page.tick();
    assert!(dropdown.is_active(&page, 0));

    page.click(node(&page, "inner"));
    page.tick();
    assert!(dropdown.is_active(&page, 0));
    assert_eq!(page.listener_count(handle, "click"), 1);

    page.click(handle);
    page.tick();
    assert!(!dropdown.is_active(&page, 0));
    assert_eq!(page.listener_count(handle, "click"), 0);
}

#[test]
fn test_document_trigger_resolves_index_from_target() {
    let mut page = menu_page(false);
    let menu = node(&page, "menu");
    page.document_mut().set_data(menu, "throttle-delay", "0");
    page.document_mut().set_data(
        menu,
        "triggers",
        r#"{"on": {"click": {"selector": "document", "delay": 25}}}"#,
    );
    let dropdown = build(&mut page, "menu");
    let seen = record(&mut page, "menu");

    page.click(node(&page, "outside"));
    page.advance(ms(25));
    assert!(seen.borrow().is_empty());

    page.click(node(&page, "inner-1"));
    page.advance(ms(24));
    assert!(!dropdown.is_active(&page, 1));
    page.advance(ms(1));

    assert!(dropdown.is_active(&page, 1));
    assert_eq!(*seen.borrow(), vec![expanded(1)]);
}
