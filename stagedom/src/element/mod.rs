mod content;
mod document;
mod node;

pub use content::Content;
pub use document::{Document, Node, NodeId};
pub use node::Element;

/// Find an element by ID in a declarative tree.
pub fn find_element<'a>(root: &'a Element, id: &str) -> Option<&'a Element> {
    if root.id == id {
        return Some(root);
    }

    if let Content::Children(children) = &root.content {
        for child in children {
            if let Some(found) = find_element(child, id) {
                return Some(found);
            }
        }
    }

    None
}
