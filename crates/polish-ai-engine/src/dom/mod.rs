//! In-memory document tree the resolver and replacer operate on.
//!
//! The model keeps just enough of a browser document to reproduce how a page
//! behaves while text is being polished:
//!
//! - element and text nodes in a single tree rooted at `body`
//! - plain-text form fields (`input`, `textarea`) whose value lives outside the
//!   node tree, together with their own selection
//! - `contenteditable` elements (inherited by descendants)
//! - the active (focused) element and the live selection range
//! - a log of dispatched `input` events
//!
//! Text content is stored in `xi_rope::Rope` buffers and edited through
//! deltas, the same way the editor core stores its document.

mod range;

use std::fmt;

use serde::Serialize;
use xi_rope::Rope;
use xi_rope::delta::Builder;

use crate::span::NodeRange;

/// Index of a node inside a `Document`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct NodeId(pub usize);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DomError {
    #[error("node {0} does not exist")]
    UnknownNode(NodeId),
    #[error("node {0} is not attached to the document")]
    Detached(NodeId),
    #[error("offset {offset} is out of bounds for node {node} (length {len})")]
    OffsetOutOfBounds {
        node: NodeId,
        offset: usize,
        len: usize,
    },
    #[error("offset {offset} is not on a character boundary in node {node}")]
    NotCharBoundary { node: NodeId, offset: usize },
    #[error("node {0} is not a text node")]
    NotText(NodeId),
    #[error("node {0} is not a text field")]
    NotField(NodeId),
    #[error("node {0} cannot contain children")]
    NotContainer(NodeId),
    #[error("range end precedes range start")]
    InvertedRange,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum FieldKind {
    Input,
    TextArea,
}

impl FieldKind {
    fn tag(self) -> &'static str {
        match self {
            FieldKind::Input => "input",
            FieldKind::TextArea => "textarea",
        }
    }
}

/// Value and selection of a plain-text form control.
#[derive(Clone)]
pub struct Field {
    pub kind: FieldKind,
    pub(crate) value: Rope,
    pub(crate) selection: std::ops::Range<usize>,
}

#[derive(Debug, Clone)]
pub struct Element {
    pub tag: String,
    pub content_editable: bool,
    pub field: Option<Field>,
}

#[derive(Clone)]
pub enum NodeKind {
    Element(Element),
    Text(Rope),
}

impl fmt::Debug for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Field")
            .field("kind", &self.kind)
            .field("value", &self.value.to_string())
            .field("selection", &self.selection)
            .finish()
    }
}

impl fmt::Debug for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeKind::Element(element) => f.debug_tuple("Element").field(element).finish(),
            NodeKind::Text(rope) => f.debug_tuple("Text").field(&rope.to_string()).finish(),
        }
    }
}

#[derive(Debug, Clone)]
struct Node {
    kind: NodeKind,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

/// Events the document has dispatched, oldest first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum DomEvent {
    Input { target: NodeId, bubbles: bool },
}

#[derive(Debug, Clone)]
pub struct Document {
    nodes: Vec<Node>,
    body: NodeId,
    selection: Option<NodeRange>,
    active_element: Option<NodeId>,
    events: Vec<DomEvent>,
    version: u64,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    /// Empty document containing only `body`.
    pub fn new() -> Self {
        let body = Node {
            kind: NodeKind::Element(Element {
                tag: "body".to_string(),
                content_editable: false,
                field: None,
            }),
            parent: None,
            children: Vec::new(),
        };
        Self {
            nodes: vec![body],
            body: NodeId(0),
            selection: None,
            active_element: None,
            events: Vec::new(),
            version: 0,
        }
    }

    /// Build a page from plain text: every paragraph becomes a `<p>` holding one
    /// text node, and the blank-line runs between paragraphs stay as
    /// whitespace-only text nodes directly under `body`.
    ///
    /// `text_content(body())` reproduces `text` exactly.
    pub fn from_paragraphs(text: &str) -> Self {
        let mut doc = Self::new();
        let body = doc.body;
        let mut last = 0;
        for separator in crate::text::paragraph_separators(text) {
            doc.push_paragraph(body, &text[last..separator.start]);
            doc.push_text(body, &text[separator.clone()]);
            last = separator.end;
        }
        doc.push_paragraph(body, &text[last..]);
        doc
    }

    fn push_paragraph(&mut self, parent: NodeId, content: &str) {
        if content.is_empty() {
            return;
        }
        let p = self.alloc(NodeKind::Element(Element {
            tag: "p".to_string(),
            content_editable: false,
            field: None,
        }));
        self.attach(parent, p);
        self.push_text(p, content);
    }

    fn push_text(&mut self, parent: NodeId, content: &str) {
        let text = self.alloc(NodeKind::Text(Rope::from(content)));
        self.attach(parent, text);
    }

    pub fn body(&self) -> NodeId {
        self.body
    }

    /// Incremented on every mutation.
    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn events(&self) -> &[DomEvent] {
        &self.events
    }

    // ============ Tree construction ============

    pub fn create_element(&mut self, tag: &str) -> NodeId {
        self.alloc(NodeKind::Element(Element {
            tag: tag.to_string(),
            content_editable: false,
            field: None,
        }))
    }

    pub fn create_text(&mut self, content: &str) -> NodeId {
        self.alloc(NodeKind::Text(Rope::from(content)))
    }

    pub fn create_field(&mut self, kind: FieldKind, value: &str) -> NodeId {
        let len = value.len();
        self.alloc(NodeKind::Element(Element {
            tag: kind.tag().to_string(),
            content_editable: false,
            field: Some(Field {
                kind,
                value: Rope::from(value),
                selection: len..len,
            }),
        }))
    }

    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> Result<(), DomError> {
        let moving_within = self.parent(child) == Some(parent);
        let index = self.node(parent)?.children.len() - usize::from(moving_within);
        self.insert_child(parent, index, child)
    }

    /// Insert `child` at `index` among `parent`'s children, detaching it from
    /// any previous parent first.
    pub fn insert_child(
        &mut self,
        parent: NodeId,
        index: usize,
        child: NodeId,
    ) -> Result<(), DomError> {
        self.node(child)?;
        match &self.node(parent)?.kind {
            NodeKind::Element(element) if element.field.is_none() => {}
            _ => return Err(DomError::NotContainer(parent)),
        }
        if child == parent || self.is_ancestor(child, parent) {
            return Err(DomError::NotContainer(parent));
        }
        let already_child = self.parent(child) == Some(parent);
        let len = self.nodes[parent.0].children.len() - usize::from(already_child);
        if index > len {
            return Err(DomError::OffsetOutOfBounds {
                node: parent,
                offset: index,
                len,
            });
        }
        self.detach(child);
        self.nodes[parent.0].children.insert(index, child);
        self.nodes[child.0].parent = Some(parent);
        self.version += 1;
        Ok(())
    }

    pub fn append_element(&mut self, parent: NodeId, tag: &str) -> Result<NodeId, DomError> {
        let id = self.create_element(tag);
        self.append_child(parent, id)?;
        Ok(id)
    }

    pub fn append_text(&mut self, parent: NodeId, content: &str) -> Result<NodeId, DomError> {
        let id = self.create_text(content);
        self.append_child(parent, id)?;
        Ok(id)
    }

    pub fn append_field(
        &mut self,
        parent: NodeId,
        kind: FieldKind,
        value: &str,
    ) -> Result<NodeId, DomError> {
        let id = self.create_field(kind, value);
        self.append_child(parent, id)?;
        Ok(id)
    }

    pub fn set_content_editable(&mut self, id: NodeId, editable: bool) -> Result<(), DomError> {
        match &mut self.node_mut(id)?.kind {
            NodeKind::Element(element) => {
                element.content_editable = editable;
                Ok(())
            }
            NodeKind::Text(_) => Err(DomError::NotContainer(id)),
        }
    }

    /// Detach `id` (and its subtree) from its parent. The node keeps its id and
    /// content but is no longer part of the document.
    pub fn remove(&mut self, id: NodeId) -> Result<(), DomError> {
        self.node(id)?;
        if id == self.body {
            return Err(DomError::NotContainer(id));
        }
        self.detach(id);
        self.version += 1;
        Ok(())
    }

    // ============ Tree queries ============

    pub fn kind(&self, id: NodeId) -> Result<&NodeKind, DomError> {
        Ok(&self.node(id)?.kind)
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes.get(id.0).and_then(|n| n.parent)
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.nodes
            .get(id.0)
            .map(|n| n.children.as_slice())
            .unwrap_or(&[])
    }

    pub fn index_in_parent(&self, id: NodeId) -> Result<(NodeId, usize), DomError> {
        let parent = self.parent(id).ok_or(DomError::Detached(id))?;
        let index = self
            .children(parent)
            .iter()
            .position(|c| *c == id)
            .ok_or(DomError::Detached(id))?;
        Ok((parent, index))
    }

    /// True when `id` is `body` or reachable from it.
    pub fn is_connected(&self, id: NodeId) -> bool {
        if id.0 >= self.nodes.len() {
            return false;
        }
        let mut current = id;
        loop {
            if current == self.body {
                return true;
            }
            match self.nodes[current.0].parent {
                Some(parent) => current = parent,
                None => return false,
            }
        }
    }

    /// Text nodes under `root` in document order, `root` included.
    pub fn text_nodes_under(&self, root: NodeId) -> Vec<NodeId> {
        self.preorder(root)
            .into_iter()
            .filter(|id| matches!(self.nodes[id.0].kind, NodeKind::Text(_)))
            .collect()
    }

    /// Concatenated content of every text node under `root`.
    pub fn text_content(&self, root: NodeId) -> String {
        self.text_nodes_under(root)
            .into_iter()
            .filter_map(|id| self.text_rope(id).ok())
            .map(|rope| rope.to_string())
            .collect()
    }

    pub(crate) fn preorder(&self, root: NodeId) -> Vec<NodeId> {
        let mut order = Vec::new();
        if root.0 >= self.nodes.len() {
            return order;
        }
        let mut stack = vec![root];
        while let Some(id) = stack.pop() {
            order.push(id);
            stack.extend(self.nodes[id.0].children.iter().rev());
        }
        order
    }

    /// True when `id` is `root` or sits somewhere below it.
    pub fn contains(&self, root: NodeId, id: NodeId) -> bool {
        root == id || self.is_ancestor(root, id)
    }

    fn is_ancestor(&self, ancestor: NodeId, of: NodeId) -> bool {
        let mut current = self.parent(of);
        while let Some(id) = current {
            if id == ancestor {
                return true;
            }
            current = self.parent(id);
        }
        false
    }

    // ============ Text nodes ============

    pub fn text(&self, id: NodeId) -> Result<String, DomError> {
        Ok(self.text_rope(id)?.to_string())
    }

    pub fn text_len(&self, id: NodeId) -> Result<usize, DomError> {
        Ok(self.text_rope(id)?.len())
    }

    /// Replace `range` of a text node's content with `replacement`.
    pub fn splice_text(
        &mut self,
        id: NodeId,
        range: std::ops::Range<usize>,
        replacement: &str,
    ) -> Result<(), DomError> {
        if range.start > range.end {
            return Err(DomError::InvertedRange);
        }
        let rope = self.text_rope(id)?;
        check_offset(id, rope, range.start)?;
        check_offset(id, rope, range.end)?;

        let mut builder = Builder::new(rope.len());
        builder.replace(range, Rope::from(replacement));
        let delta = builder.build();
        let updated = delta.apply(rope);

        if let NodeKind::Text(content) = &mut self.node_mut(id)?.kind {
            *content = updated;
        }
        self.version += 1;
        Ok(())
    }

    pub(crate) fn text_rope(&self, id: NodeId) -> Result<&Rope, DomError> {
        match &self.node(id)?.kind {
            NodeKind::Text(rope) => Ok(rope),
            NodeKind::Element(_) => Err(DomError::NotText(id)),
        }
    }

    // ============ Form fields ============

    pub fn is_text_field(&self, id: NodeId) -> bool {
        matches!(
            self.nodes.get(id.0).map(|n| &n.kind),
            Some(NodeKind::Element(Element { field: Some(_), .. }))
        )
    }

    pub fn field_value(&self, id: NodeId) -> Result<String, DomError> {
        Ok(self.field(id)?.value.to_string())
    }

    pub fn field_selection(&self, id: NodeId) -> Result<std::ops::Range<usize>, DomError> {
        Ok(self.field(id)?.selection.clone())
    }

    /// Assign the whole value, like setting `element.value`. The caret moves to
    /// the end of the new value.
    pub fn set_field_value(&mut self, id: NodeId, value: &str) -> Result<(), DomError> {
        let field = self.field_mut(id)?;
        field.value = Rope::from(value);
        field.selection = value.len()..value.len();
        self.version += 1;
        Ok(())
    }

    /// Like `setSelectionRange`: offsets past the end clamp to the value length.
    pub fn set_field_selection(
        &mut self,
        id: NodeId,
        selection: std::ops::Range<usize>,
    ) -> Result<(), DomError> {
        let field = self.field_mut(id)?;
        let len = field.value.len();
        let end = selection.end.min(len);
        let start = selection.start.min(end);
        field.selection = start..end;
        Ok(())
    }

    /// Record a bubbling `input` event on `target`.
    pub fn dispatch_input(&mut self, target: NodeId) -> Result<(), DomError> {
        self.node(target)?;
        self.events.push(DomEvent::Input {
            target,
            bubbles: true,
        });
        Ok(())
    }

    fn field(&self, id: NodeId) -> Result<&Field, DomError> {
        match &self.node(id)?.kind {
            NodeKind::Element(Element {
                field: Some(field), ..
            }) => Ok(field),
            _ => Err(DomError::NotField(id)),
        }
    }

    fn field_mut(&mut self, id: NodeId) -> Result<&mut Field, DomError> {
        match &mut self.node_mut(id)?.kind {
            NodeKind::Element(Element {
                field: Some(field), ..
            }) => Ok(field),
            _ => Err(DomError::NotField(id)),
        }
    }

    // ============ Focus and selection ============

    /// Editable when the node itself or any ancestor is `contenteditable`.
    pub fn is_content_editable(&self, id: NodeId) -> bool {
        let mut current = Some(id);
        while let Some(node) = current {
            if let Some(Node {
                kind: NodeKind::Element(element),
                ..
            }) = self.nodes.get(node.0)
                && element.content_editable
            {
                return true;
            }
            current = self.parent(node);
        }
        false
    }

    pub fn focus(&mut self, id: NodeId) -> Result<(), DomError> {
        self.node(id)?;
        self.active_element = Some(id);
        Ok(())
    }

    pub fn active_element(&self) -> Option<NodeId> {
        self.active_element
    }

    pub fn selection(&self) -> Option<&NodeRange> {
        self.selection.as_ref()
    }

    /// Replace the live selection, like `removeAllRanges()` + `addRange()`.
    pub fn select(&mut self, range: NodeRange) {
        self.selection = Some(range);
    }

    pub fn clear_selection(&mut self) {
        self.selection = None;
    }

    // ============ Internals ============

    fn alloc(&mut self, kind: NodeKind) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node {
            kind,
            parent: None,
            children: Vec::new(),
        });
        id
    }

    fn attach(&mut self, parent: NodeId, child: NodeId) {
        self.nodes[parent.0].children.push(child);
        self.nodes[child.0].parent = Some(parent);
    }

    fn detach(&mut self, id: NodeId) {
        if let Some(parent) = self.nodes[id.0].parent.take() {
            self.nodes[parent.0].children.retain(|c| *c != id);
        }
    }

    fn node(&self, id: NodeId) -> Result<&Node, DomError> {
        self.nodes.get(id.0).ok_or(DomError::UnknownNode(id))
    }

    fn node_mut(&mut self, id: NodeId) -> Result<&mut Node, DomError> {
        self.nodes.get_mut(id.0).ok_or(DomError::UnknownNode(id))
    }
}

/// Offsets must land inside the content and between characters.
fn check_offset(node: NodeId, rope: &Rope, offset: usize) -> Result<(), DomError> {
    let len = rope.len();
    if offset > len {
        return Err(DomError::OffsetOutOfBounds { node, offset, len });
    }
    if !rope.is_codepoint_boundary(offset) {
        return Err(DomError::NotCharBoundary { node, offset });
    }
    Ok(())
}
