use std::collections::HashMap;

use super::{Content, Element};
use crate::selector::Selector;

/// Stable handle to a node inside a [`Document`].
///
/// Handles are never reused; a document only grows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    pub fn raw(self) -> usize {
        self.0
    }
}

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A live node. Structure (parent/children) is owned by the document.
#[derive(Debug, Clone)]
pub struct Node {
    pub id: String,
    pub tag: String,
    pub classes: Vec<String>,
    pub data: HashMap<String, String>,
    pub text: Option<String>,
    pub focusable: bool,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

impl Node {
    pub fn has_class(&self, class: &str) -> bool {
        self.classes.iter().any(|c| c == class)
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }
}

/// Arena-backed element tree.
#[derive(Debug, Clone)]
pub struct Document {
    nodes: Vec<Node>,
    root: NodeId,
}

impl Document {
    pub fn new(root: Element) -> Self {
        let mut doc = Self {
            nodes: Vec::new(),
            root: NodeId(0),
        };
        doc.root = doc.insert(root, None);
        doc
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.0)
    }

    fn get_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(id.0)
    }

    /// Insert `element` (and its subtree) as the last child of `parent`.
    pub fn append(&mut self, parent: NodeId, element: Element) -> Option<NodeId> {
        self.get(parent)?;
        Some(self.insert(element, Some(parent)))
    }

    fn insert(&mut self, element: Element, parent: Option<NodeId>) -> NodeId {
        let id = NodeId(self.nodes.len());
        let (text, children) = match element.content {
            Content::None => (None, Vec::new()),
            Content::Text(text) => (Some(text), Vec::new()),
            Content::Children(children) => (None, children),
        };

        self.nodes.push(Node {
            id: element.id,
            tag: element.tag,
            classes: element.classes,
            data: element.data,
            text,
            focusable: element.focusable,
            parent,
            children: Vec::new(),
        });

        if let Some(parent) = parent.and_then(|p| self.get_mut(p)) {
            parent.children.push(id);
        }

        for child in children {
            self.insert(child, Some(id));
        }

        id
    }

    pub fn find_by_id(&self, id: &str) -> Option<NodeId> {
        self.nodes.iter().position(|n| n.id == id).map(NodeId)
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.get(id)?.parent
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.get(id).map(|n| n.children.as_slice()).unwrap_or(&[])
    }

    /// Ancestors of `id`, nearest first. Excludes `id` itself.
    pub fn ancestors(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut current = self.parent(id);
        while let Some(node) = current {
            out.push(node);
            current = self.parent(node);
        }
        out
    }

    /// Descendants of `id` in document order. Excludes `id` itself.
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.children(id).iter().rev().copied().collect();
        while let Some(node) = stack.pop() {
            out.push(node);
            stack.extend(self.children(node).iter().rev().copied());
        }
        out
    }

    pub fn contains(&self, ancestor: NodeId, node: NodeId) -> bool {
        ancestor == node || self.ancestors(node).contains(&ancestor)
    }

    // =========================================================================
    // Queries
    // =========================================================================

    /// Descendants of `scope` matching `selector`, in document order.
    pub fn select(&self, scope: NodeId, selector: &Selector) -> Vec<NodeId> {
        self.descendants(scope)
            .into_iter()
            .filter(|&node| selector.matches(self, node))
            .collect()
    }

    /// Matches anywhere in the document, including the root.
    pub fn select_all(&self, selector: &Selector) -> Vec<NodeId> {
        let mut out = Vec::new();
        if selector.matches(self, self.root) {
            out.push(self.root);
        }
        out.extend(self.select(self.root, selector));
        out
    }

    /// Nearest ancestor-or-self of `id` matching `selector`.
    pub fn closest(&self, id: NodeId, selector: &Selector) -> Option<NodeId> {
        if selector.matches(self, id) {
            return Some(id);
        }
        self.ancestors(id)
            .into_iter()
            .find(|&node| selector.matches(self, node))
    }

    // =========================================================================
    // Classes
    // =========================================================================

    pub fn has_class(&self, id: NodeId, class: &str) -> bool {
        self.get(id).is_some_and(|n| n.has_class(class))
    }

    pub fn add_class(&mut self, id: NodeId, class: &str) {
        if let Some(node) = self.get_mut(id) {
            if !node.has_class(class) {
                node.classes.push(class.to_string());
            }
        }
    }

    pub fn remove_class(&mut self, id: NodeId, class: &str) {
        if let Some(node) = self.get_mut(id) {
            node.classes.retain(|c| c != class);
        }
    }

    /// Add `class` when `on`, remove it otherwise.
    pub fn toggle_class(&mut self, id: NodeId, class: &str, on: bool) {
        if on {
            self.add_class(id, class);
        } else {
            self.remove_class(id, class);
        }
    }

    // =========================================================================
    // Data attributes
    // =========================================================================

    pub fn data(&self, id: NodeId, key: &str) -> Option<&str> {
        self.get(id)?.data.get(key).map(String::as_str)
    }

    pub fn set_data(&mut self, id: NodeId, key: impl Into<String>, value: impl Into<String>) {
        if let Some(node) = self.get_mut(id) {
            node.data.insert(key.into(), value.into());
        }
    }

    pub fn data_map(&self, id: NodeId) -> Option<&HashMap<String, String>> {
        self.get(id).map(|n| &n.data)
    }

    // =========================================================================
    // Text
    // =========================================================================

    pub fn text_content(&self, id: NodeId) -> String {
        let Some(node) = self.get(id) else {
            return String::new();
        };
        let mut out = node.text.clone().unwrap_or_default();
        for &child in &node.children {
            out.push_str(&self.text_content(child));
        }
        out
    }

    pub fn set_text(&mut self, id: NodeId, text: impl Into<String>) {
        if let Some(node) = self.get_mut(id) {
            node.text = Some(text.into());
        }
    }

    /// Snapshot a subtree back into a declarative [`Element`].
    pub fn to_element(&self, id: NodeId) -> Option<Element> {
        let node = self.get(id)?;
        let content = if !node.children.is_empty() {
            Content::Children(
                node.children
                    .iter()
                    .filter_map(|&child| self.to_element(child))
                    .collect(),
            )
        } else if let Some(text) = &node.text {
            Content::Text(text.clone())
        } else {
            Content::None
        };

        Some(Element {
            id: node.id.clone(),
            tag: node.tag.clone(),
            content,
            classes: node.classes.clone(),
            focusable: node.focusable,
            data: node.data.clone(),
        })
    }
}
