use crate::element::{Document, NodeId};

/// Tracks which node is currently focused.
#[derive(Debug, Default)]
pub struct FocusState {
    focused: Option<NodeId>,
}

impl FocusState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the currently focused node.
    pub fn focused(&self) -> Option<NodeId> {
        self.focused
    }

    pub fn is_focused(&self, id: NodeId) -> bool {
        self.focused == Some(id)
    }

    /// Focus `id` if the node exists and is focusable.
    /// Returns true if focus changed.
    pub fn focus(&mut self, doc: &Document, id: NodeId) -> bool {
        let Some(node) = doc.get(id) else {
            return false;
        };
        if !node.focusable {
            log::trace!("[focus] {} ({}) is not focusable", id, node.id);
            return false;
        }
        if self.focused == Some(id) {
            return false;
        }
        log::debug!("[focus] Changing focus from {:?} to {}", self.focused, id);
        self.focused = Some(id);
        true
    }

    /// Clear focus.
    /// Returns the node that lost focus, if any.
    pub fn blur(&mut self) -> Option<NodeId> {
        self.focused.take()
    }
}
