//! Range operations: stringify, delete and insert, mirroring the DOM `Range`
//! methods the replacer relies on.

use crate::dom::{Document, DomError, NodeId, NodeKind};
use crate::span::{BoundaryPoint, NodeRange};

/// Text nodes of the document in order, with their preorder positions, so a
/// boundary point can be mapped to a (text index, byte offset) pair.
struct FlatText {
    texts: Vec<NodeId>,
    text_positions: Vec<usize>,
    preorder: Vec<NodeId>,
}

impl FlatText {
    fn new(doc: &Document) -> Self {
        let preorder = doc.preorder(doc.body());
        let mut texts = Vec::new();
        let mut text_positions = Vec::new();
        for (position, id) in preorder.iter().enumerate() {
            if matches!(doc.nodes[id.0].kind, NodeKind::Text(_)) {
                texts.push(*id);
                text_positions.push(position);
            }
        }
        Self {
            texts,
            text_positions,
            preorder,
        }
    }

    fn position_of(&self, id: NodeId) -> Result<usize, DomError> {
        self.preorder
            .iter()
            .position(|n| *n == id)
            .ok_or(DomError::Detached(id))
    }

    /// Map a validated boundary point to (index into `texts`, byte offset).
    ///
    /// Element points resolve to the first text node at or after the point,
    /// offset 0.
    fn locate(&self, doc: &Document, point: BoundaryPoint) -> Result<(usize, usize), DomError> {
        match doc.kind(point.node)? {
            NodeKind::Text(_) => {
                let index = self
                    .texts
                    .iter()
                    .position(|n| *n == point.node)
                    .ok_or(DomError::Detached(point.node))?;
                Ok((index, point.offset))
            }
            NodeKind::Element(_) => {
                let children = doc.children(point.node);
                let target = match children.get(point.offset) {
                    Some(child) => self.position_of(*child)?,
                    None => {
                        self.position_of(point.node)? + doc.preorder(point.node).len()
                    }
                };
                let index = self.text_positions.partition_point(|p| *p < target);
                Ok((index, 0))
            }
        }
    }
}

impl Document {
    /// Text covered by `range`, like `Range.toString()`.
    pub fn range_to_string(&self, range: &NodeRange) -> Result<String, DomError> {
        self.validate_point(range.start)?;
        self.validate_point(range.end)?;

        let flat = FlatText::new(self);
        let (start_index, start_offset) = flat.locate(self, range.start)?;
        let (end_index, end_offset) = flat.locate(self, range.end)?;
        if (start_index, start_offset) > (end_index, end_offset) {
            return Err(DomError::InvertedRange);
        }

        let mut out = String::new();
        let last = flat.texts.len().min(end_index + 1);
        for index in start_index..last {
            let rope = self.text_rope(flat.texts[index])?;
            let from = if index == start_index { start_offset } else { 0 };
            let to = if index == end_index {
                end_offset
            } else {
                rope.len()
            };
            out.push_str(&rope.slice_to_cow(from..to));
        }
        Ok(out)
    }

    /// Remove the content covered by `range`, like `Range.deleteContents()`.
    ///
    /// Boundary text nodes are truncated, text nodes fully inside the range are
    /// detached. Elements left empty stay in place. Returns the collapsed point
    /// where the range now sits.
    pub fn delete_contents(&mut self, range: &NodeRange) -> Result<BoundaryPoint, DomError> {
        self.validate_point(range.start)?;
        self.validate_point(range.end)?;

        let flat = FlatText::new(self);
        let (start_index, start_offset) = flat.locate(self, range.start)?;
        let (end_index, end_offset) = flat.locate(self, range.end)?;
        if (start_index, start_offset) > (end_index, end_offset) {
            return Err(DomError::InvertedRange);
        }

        let start_text = self.text_container(range.start.node);
        let end_text = self.text_container(range.end.node);

        if let (Some(start), Some(end)) = (start_text, end_text)
            && start == end
        {
            self.splice_text(start, start_offset..end_offset, "")?;
            return Ok(range.start);
        }

        let inner_end = end_index.min(flat.texts.len());
        for &node in &flat.texts[start_index..inner_end] {
            if Some(node) == start_text {
                let len = self.text_len(node)?;
                self.splice_text(node, start_offset..len, "")?;
            } else {
                self.remove(node)?;
            }
        }
        if let Some(end) = end_text {
            self.splice_text(end, 0..end_offset, "")?;
        }

        Ok(range.start)
    }

    /// Insert a new text node at `point`, like `Range.insertNode()`. A text
    /// container is split at the offset and the new node goes between the
    /// halves.
    pub fn insert_text_at(
        &mut self,
        point: BoundaryPoint,
        content: &str,
    ) -> Result<NodeId, DomError> {
        self.validate_point(point)?;
        let inserted = self.create_text(content);

        if self.text_container(point.node).is_some() {
            let (parent, index) = self.index_in_parent(point.node)?;
            let len = self.text_len(point.node)?;
            if point.offset < len {
                let tail = self.text(point.node)?[point.offset..].to_string();
                self.splice_text(point.node, point.offset..len, "")?;
                let tail_node = self.create_text(&tail);
                self.insert_child(parent, index + 1, tail_node)?;
            }
            self.insert_child(parent, index + 1, inserted)?;
        } else {
            self.insert_child(point.node, point.offset, inserted)?;
        }
        Ok(inserted)
    }

    /// The point just after `node` in its parent, like `setStartAfter(node)`.
    pub fn point_after(&self, node: NodeId) -> Result<BoundaryPoint, DomError> {
        let (parent, index) = self.index_in_parent(node)?;
        Ok(BoundaryPoint::new(parent, index + 1))
    }

    fn text_container(&self, id: NodeId) -> Option<NodeId> {
        matches!(self.kind(id), Ok(NodeKind::Text(_))).then_some(id)
    }

    fn validate_point(&self, point: BoundaryPoint) -> Result<(), DomError> {
        let kind = self.kind(point.node)?;
        if !self.is_connected(point.node) {
            return Err(DomError::Detached(point.node));
        }
        match kind {
            NodeKind::Text(rope) => super::check_offset(point.node, rope, point.offset),
            NodeKind::Element(_) => {
                let len = self.children(point.node).len();
                if point.offset > len {
                    return Err(DomError::OffsetOutOfBounds {
                        node: point.node,
                        offset: point.offset,
                        len,
                    });
                }
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    /// `<body><p>Hello <b>bold</b> world</p><p>Next</p></body>`
    fn sample() -> (Document, [NodeId; 4]) {
        let mut doc = Document::new();
        let body = doc.body();
        let p1 = doc.append_element(body, "p").unwrap();
        let hello = doc.append_text(p1, "Hello ").unwrap();
        let b = doc.append_element(p1, "b").unwrap();
        let bold = doc.append_text(b, "bold").unwrap();
        let world = doc.append_text(p1, " world").unwrap();
        let p2 = doc.append_element(body, "p").unwrap();
        let next = doc.append_text(p2, "Next").unwrap();
        (doc, [hello, bold, world, next])
    }

    #[test]
    fn test_range_to_string_single_node() {
        let (doc, [hello, ..]) = sample();
        let range = NodeRange::in_text(hello, 0..5);
        assert_eq!(doc.range_to_string(&range).unwrap(), "Hello");
    }

    #[test]
    fn test_range_to_string_across_nodes() {
        let (doc, [hello, _, world, _]) = sample();
        let range = NodeRange::new(BoundaryPoint::new(hello, 2), BoundaryPoint::new(world, 3));
        assert_eq!(doc.range_to_string(&range).unwrap(), "llo bold wo");
    }

    #[test]
    fn test_range_to_string_with_element_boundaries() {
        let (doc, [_, _, _, next]) = sample();
        let body = doc.body();
        let p2 = doc.parent(next).unwrap();
        let whole_first_paragraph =
            NodeRange::new(BoundaryPoint::new(body, 0), BoundaryPoint::new(body, 1));
        assert_eq!(
            doc.range_to_string(&whole_first_paragraph).unwrap(),
            "Hello bold world"
        );
        let inside_p2 = NodeRange::new(BoundaryPoint::new(p2, 0), BoundaryPoint::new(p2, 1));
        assert_eq!(doc.range_to_string(&inside_p2).unwrap(), "Next");
    }

    #[test]
    fn test_range_to_string_rejects_inverted_and_detached() {
        let (mut doc, [hello, _, world, _]) = sample();
        let inverted = NodeRange::new(BoundaryPoint::new(world, 1), BoundaryPoint::new(hello, 1));
        assert_eq!(doc.range_to_string(&inverted), Err(DomError::InvertedRange));

        doc.remove(hello).unwrap();
        let stale = NodeRange::in_text(hello, 0..5);
        assert_eq!(doc.range_to_string(&stale), Err(DomError::Detached(hello)));
    }

    #[test]
    fn test_delete_contents_within_one_node() {
        let (mut doc, [hello, ..]) = sample();
        let point = doc
            .delete_contents(&NodeRange::in_text(hello, 1..5))
            .unwrap();
        assert_eq!(point, BoundaryPoint::new(hello, 1));
        assert_eq!(doc.text(hello).unwrap(), "H ");
    }

    #[test]
    fn test_delete_contents_across_nodes() {
        let (mut doc, [hello, bold, world, _]) = sample();
        let range = NodeRange::new(BoundaryPoint::new(hello, 2), BoundaryPoint::new(world, 3));

        doc.delete_contents(&range).unwrap();

        assert_eq!(doc.text(hello).unwrap(), "He");
        assert_eq!(doc.text(world).unwrap(), "rld");
        assert!(!doc.is_connected(bold));
        assert_eq!(doc.text_content(doc.body()), "HerldNext");
    }

    #[test]
    fn test_insert_text_splits_text_node() {
        let (mut doc, [hello, ..]) = sample();
        let inserted = doc.insert_text_at(BoundaryPoint::new(hello, 3), "[x]").unwrap();

        assert_eq!(doc.text(hello).unwrap(), "Hel");
        assert_eq!(doc.text(inserted).unwrap(), "[x]");
        assert_eq!(doc.text_content(doc.body()), "Hel[x]lo bold worldNext");
    }

    #[test]
    fn test_insert_text_into_element() {
        let (mut doc, [.., next]) = sample();
        let p2 = doc.parent(next).unwrap();
        let inserted = doc.insert_text_at(BoundaryPoint::new(p2, 0), "Up ").unwrap();

        assert_eq!(doc.children(p2), &[inserted, next]);
        assert_eq!(doc.point_after(inserted).unwrap(), BoundaryPoint::new(p2, 1));
    }

    #[test]
    fn test_validate_point_bounds() {
        let (doc, [hello, ..]) = sample();
        let range = NodeRange::in_text(hello, 0..99);
        assert_eq!(
            doc.range_to_string(&range),
            Err(DomError::OffsetOutOfBounds {
                node: hello,
                offset: 99,
                len: 6
            })
        );
    }
}
