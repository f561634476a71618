//! Template rendering strategies.
//!
//! A template element names its strategy with the `template-language` data
//! attribute. Templates without one use the table's default strategy.

use std::collections::BTreeMap;
use std::rc::Rc;

use serde_json::Value;
use stagedom::{Content, Document, Element, NodeId};

/// Strategy used when a template does not name one.
pub const DEFAULT_TEMPLATE_LANGUAGE: &str = "micro_template";

/// Data key a template uses to select its strategy.
pub const TEMPLATE_LANGUAGE_KEY: &str = "template-language";

/// Text shown in place of a template that failed to render.
pub const RENDER_ERROR_TEXT: &str = "Error rendering template";

/// Rendered output: top-level elements in order.
pub type Fragment = Vec<Element>;

/// A named way of turning a template plus view data into a fragment.
///
/// Returning `None` reports failure; the caller substitutes a placeholder.
pub trait TemplateRenderer {
    fn render(&self, doc: &Document, template: NodeId, view: &Value) -> Option<Fragment>;
}

impl<F> TemplateRenderer for F
where
    F: Fn(&Document, NodeId, &Value) -> Option<Fragment>,
{
    fn render(&self, doc: &Document, template: NodeId, view: &Value) -> Option<Fragment> {
        self(doc, template, view)
    }
}

/// Table of render strategies keyed by name.
pub struct Renderers {
    strategies: BTreeMap<String, Rc<dyn TemplateRenderer>>,
    default: String,
}

impl Default for Renderers {
    fn default() -> Self {
        let mut renderers = Self {
            strategies: BTreeMap::new(),
            default: DEFAULT_TEMPLATE_LANGUAGE.to_string(),
        };
        renderers.register(DEFAULT_TEMPLATE_LANGUAGE, MicroTemplate);
        renderers
    }
}

impl Renderers {
    /// Register (or replace) the strategy called `name`.
    pub fn register(&mut self, name: impl Into<String>, renderer: impl TemplateRenderer + 'static) {
        self.strategies.insert(name.into(), Rc::new(renderer));
    }

    pub fn contains(&self, name: &str) -> bool {
        self.strategies.contains_key(name)
    }

    pub fn set_default(&mut self, name: impl Into<String>) {
        self.default = name.into();
    }

    pub fn default_name(&self) -> &str {
        &self.default
    }

    /// Strategy name for `template`: its own tag, else the default.
    pub fn language_for<'a>(&'a self, doc: &'a Document, template: NodeId) -> &'a str {
        doc.data(template, TEMPLATE_LANGUAGE_KEY)
            .filter(|lang| !lang.is_empty())
            .unwrap_or(&self.default)
    }

    /// Render `template` with `view`.
    ///
    /// Unknown strategies and strategy failures both yield
    /// [`error_placeholder`].
    pub fn render(&self, doc: &Document, template: NodeId, view: &Value) -> Fragment {
        let language = self.language_for(doc, template);
        let rendered = match self.strategies.get(language) {
            Some(strategy) => strategy.render(doc, template, view),
            None => {
                log::debug!("[render] no strategy named '{}'", language);
                None
            }
        };

        rendered.unwrap_or_else(|| {
            log::debug!("[render] '{}' failed for template {}", language, template);
            error_placeholder()
        })
    }
}

impl std::fmt::Debug for Renderers {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Renderers")
            .field("strategies", &self.strategies.keys().collect::<Vec<_>>())
            .field("default", &self.default)
            .finish()
    }
}

pub fn error_placeholder() -> Fragment {
    vec![Element::span(RENDER_ERROR_TEXT)]
}

/// Built-in strategy: clones the template's children, replacing `{{key}}`
/// in text with the matching top-level field of the view.
///
/// Fails on a template with no children.
#[derive(Debug, Clone, Copy, Default)]
pub struct MicroTemplate;

impl TemplateRenderer for MicroTemplate {
    fn render(&self, doc: &Document, template: NodeId, view: &Value) -> Option<Fragment> {
        let children = doc.children(template);
        if children.is_empty() {
            return None;
        }

        children
            .iter()
            .map(|&child| doc.to_element(child).map(|el| interpolate_element(el, view)))
            .collect()
    }
}

fn interpolate_element(mut element: Element, view: &Value) -> Element {
    element.content = match element.content {
        Content::Text(text) => Content::Text(interpolate(&text, view)),
        Content::Children(children) => Content::Children(
            children
                .into_iter()
                .map(|child| interpolate_element(child, view))
                .collect(),
        ),
        Content::None => Content::None,
    };
    element
}

/// Replace every `{{key}}` with the view's value for `key`.
///
/// Missing keys and nulls render as empty text. An unterminated `{{` is kept
/// as-is.
pub fn interpolate(text: &str, view: &Value) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;

    while let Some(start) = rest.find("{{") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        let Some(end) = after.find("}}") else {
            out.push_str(&rest[start..]);
            return out;
        };

        let key = after[..end].trim();
        match view.get(key) {
            Some(Value::String(s)) => out.push_str(s),
            Some(Value::Null) | None => {}
            Some(other) => out.push_str(&other.to_string()),
        }
        rest = &after[end + 2..];
    }

    out.push_str(rest);
    out
}
