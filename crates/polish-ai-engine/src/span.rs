use serde::Serialize;

use crate::dom::NodeId;

/// A position inside the document tree.
///
/// For text nodes `offset` is a UTF-8 byte offset into the node's content.
/// For elements it is a child index, so `offset == children.len()` means
/// "after the last child".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct BoundaryPoint {
    pub node: NodeId,
    pub offset: usize,
}

impl BoundaryPoint {
    pub fn new(node: NodeId, offset: usize) -> Self {
        Self { node, offset }
    }
}

/// A start/end pair of boundary points, the model's equivalent of a DOM `Range`.
///
/// A range is only a claim about where some text was when it was built. It
/// must be checked against the live document before it is mutated through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct NodeRange {
    pub start: BoundaryPoint,
    pub end: BoundaryPoint,
}

impl NodeRange {
    pub fn new(start: BoundaryPoint, end: BoundaryPoint) -> Self {
        Self { start, end }
    }

    /// Range covering `range` bytes inside a single text node.
    pub fn in_text(node: NodeId, range: std::ops::Range<usize>) -> Self {
        Self {
            start: BoundaryPoint::new(node, range.start),
            end: BoundaryPoint::new(node, range.end),
        }
    }

    /// Zero-length range at `point` (a caret).
    pub fn collapsed(point: BoundaryPoint) -> Self {
        Self {
            start: point,
            end: point,
        }
    }

    pub fn is_collapsed(&self) -> bool {
        self.start == self.end
    }

    /// The shared container when both ends sit in the same node.
    pub fn single_container(&self) -> Option<NodeId> {
        (self.start.node == self.end.node).then_some(self.start.node)
    }
}

/// Byte offsets into a plain-text field's value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct FieldSpan {
    pub field: NodeId,
    pub start: usize,
    pub end: usize,
}

/// Location of selected text, either in the page's text nodes or in a form field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum TextSpan {
    Node(NodeRange),
    Field(FieldSpan),
}

impl From<NodeRange> for TextSpan {
    fn from(range: NodeRange) -> Self {
        TextSpan::Node(range)
    }
}

impl From<FieldSpan> for TextSpan {
    fn from(span: FieldSpan) -> Self {
        TextSpan::Field(span)
    }
}
