//! Writing replacement text back over a resolved span.
//!
//! A span is only a claim about where text was. The page may have changed
//! while the transformation request was in flight, so page spans are checked
//! against the live document before anything is mutated.

use crate::dom::{Document, DomError, NodeKind};
use crate::error::PolishError;
use crate::resolve::Resolver;
use crate::span::{BoundaryPoint, FieldSpan, NodeRange};

/// Confirm `span` still covers `expected`, or find `expected` again by exact
/// search. Never falls back to a looser match.
pub fn revalidate(
    doc: &Document,
    span: &NodeRange,
    expected: &str,
) -> Result<NodeRange, PolishError> {
    match doc.range_to_string(span) {
        Ok(current) if !current.is_empty() && current.trim() == expected.trim() => {
            return Ok(*span);
        }
        Ok(current) => log::debug!(
            "Span now reads {:?}, searching for text again",
            crate::text::preview(&current, 50)
        ),
        Err(e) => log::debug!("Span no longer valid ({e}), searching for text again"),
    }

    Resolver::new(doc)
        .find_exact(expected)
        .filter(|candidate| {
            doc.range_to_string(candidate)
                .is_ok_and(|text| text.trim() == expected.trim())
        })
        .ok_or_else(|| {
            log::error!("Could not find text to replace");
            PolishError::SpanInvalidated
        })
}

/// Revalidate a page span and replace it. Returns the caret left after the
/// inserted text.
pub fn replace_page_span(
    doc: &mut Document,
    span: &NodeRange,
    expected: &str,
    replacement: &str,
) -> Result<BoundaryPoint, PolishError> {
    let span = revalidate(doc, span, expected)?;
    Ok(replace_range(doc, &span, replacement)?)
}

/// Replace whatever `range` covers with `replacement` and collapse the live
/// selection to a caret just after it.
///
/// A range inside one text node is spliced in place. Anything else is deleted
/// and a single new text node is inserted at the range start.
pub fn replace_range(
    doc: &mut Document,
    range: &NodeRange,
    replacement: &str,
) -> Result<BoundaryPoint, DomError> {
    let caret = match range.single_container() {
        Some(node) if matches!(doc.kind(node)?, NodeKind::Text(_)) => {
            if !doc.is_connected(node) {
                return Err(DomError::Detached(node));
            }
            doc.splice_text(node, range.start.offset..range.end.offset, replacement)?;
            BoundaryPoint::new(node, range.start.offset + replacement.len())
        }
        _ => return insert_over(doc, range, replacement),
    };
    doc.select(NodeRange::collapsed(caret));
    Ok(caret)
}

/// Delete the contents of `range` and insert `replacement` as one new text
/// node at its start, leaving the caret after that node.
pub fn insert_over(
    doc: &mut Document,
    range: &NodeRange,
    replacement: &str,
) -> Result<BoundaryPoint, DomError> {
    let start = doc.delete_contents(range)?;
    let inserted = doc.insert_text_at(start, replacement)?;
    let caret = doc.point_after(inserted)?;
    doc.select(NodeRange::collapsed(caret));
    Ok(caret)
}

/// Replace `span` of a field's value, put the caret after the new text and
/// fire a bubbling `input` event. Returns the caret offset.
///
/// Offsets past the end of the current value are clamped to it.
pub fn replace_field(
    doc: &mut Document,
    span: FieldSpan,
    replacement: &str,
) -> Result<usize, DomError> {
    if span.start > span.end {
        return Err(DomError::InvertedRange);
    }
    let value = doc.field_value(span.field)?;
    let end = span.end.min(value.len());
    let start = span.start.min(end);
    for offset in [start, end] {
        if !value.is_char_boundary(offset) {
            return Err(DomError::NotCharBoundary {
                node: span.field,
                offset,
            });
        }
    }

    let updated = format!("{}{}{}", &value[..start], replacement, &value[end..]);
    doc.set_field_value(span.field, &updated)?;
    let caret = start + replacement.len();
    doc.set_field_selection(span.field, caret..caret)?;
    doc.dispatch_input(span.field)?;
    Ok(caret)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::{DomEvent, FieldKind, NodeId};
    use pretty_assertions::assert_eq;

    fn paragraph(text: &str) -> (Document, NodeId) {
        let mut doc = Document::new();
        let body = doc.body();
        let p = doc.append_element(body, "p").unwrap();
        let node = doc.append_text(p, text).unwrap();
        (doc, node)
    }

    // ============ Page spans ============

    #[test]
    fn test_splice_within_single_node() {
        let (mut doc, node) = paragraph("one two three");
        let span = NodeRange::in_text(node, 4..7);

        let caret = replace_page_span(&mut doc, &span, "two", "2").unwrap();

        assert_eq!(doc.text(node).unwrap(), "one 2 three");
        assert_eq!(caret, BoundaryPoint::new(node, 5));
        assert_eq!(doc.selection(), Some(&NodeRange::collapsed(caret)));
    }

    #[test]
    fn test_revalidation_finds_moved_text() {
        let (mut doc, node) = paragraph("one two three");
        let span = NodeRange::in_text(node, 4..7);
        doc.splice_text(node, 0..0, "zero ").unwrap();

        replace_page_span(&mut doc, &span, "two", "TWO").unwrap();

        assert_eq!(doc.text(node).unwrap(), "zero one TWO three");
    }

    #[test]
    fn test_revalidation_fails_when_text_is_gone() {
        let (mut doc, node) = paragraph("one two three");
        let span = NodeRange::in_text(node, 4..7);
        doc.splice_text(node, 4..7, "2").unwrap();

        let result = replace_page_span(&mut doc, &span, "two", "TWO");

        assert_eq!(result, Err(PolishError::SpanInvalidated));
        assert_eq!(doc.text(node).unwrap(), "one 2 three");
    }

    #[test]
    fn test_revalidation_survives_detached_span() {
        let (mut doc, node) = paragraph("old text");
        let span = NodeRange::in_text(node, 0..3);
        doc.remove(node).unwrap();
        let body = doc.body();
        let fresh = doc.append_text(body, "the old way").unwrap();

        replace_page_span(&mut doc, &span, "old", "new").unwrap();

        assert_eq!(doc.text(fresh).unwrap(), "the new way");
    }

    #[test]
    fn test_replace_across_nodes_inserts_single_text_node() {
        let mut doc = Document::new();
        let body = doc.body();
        let p = doc.append_element(body, "p").unwrap();
        let start = doc.append_text(p, "Hello ").unwrap();
        let b = doc.append_element(p, "b").unwrap();
        doc.append_text(b, "bold").unwrap();
        let end = doc.append_text(p, " world").unwrap();
        let span = NodeRange::new(BoundaryPoint::new(start, 0), BoundaryPoint::new(end, 6));

        let caret = replace_page_span(&mut doc, &span, "Hello bold world", "Hi").unwrap();

        assert_eq!(doc.text_content(body), "Hi");
        let inserted = doc.children(p)[1];
        assert_eq!(doc.text(inserted).unwrap(), "Hi");
        assert_eq!(caret, doc.point_after(inserted).unwrap());
    }

    #[test]
    fn test_insert_over_always_adds_a_node() {
        let (mut doc, node) = paragraph("keep this part");
        let p = doc.parent(node).unwrap();

        let caret = insert_over(&mut doc, &NodeRange::in_text(node, 5..9), "that").unwrap();

        assert_eq!(doc.text_content(p), "keep that part");
        assert_eq!(doc.children(p).len(), 3);
        assert_eq!(caret, BoundaryPoint::new(p, 2));
        assert_eq!(doc.selection(), Some(&NodeRange::collapsed(caret)));
    }

    #[test]
    fn test_replace_range_rejects_detached_node() {
        let (mut doc, node) = paragraph("gone");
        doc.remove(node).unwrap();
        let result = replace_range(&mut doc, &NodeRange::in_text(node, 0..4), "x");
        assert_eq!(result, Err(DomError::Detached(node)));
    }

    // ============ Fields ============

    fn field(value: &str) -> (Document, NodeId) {
        let mut doc = Document::new();
        let body = doc.body();
        let input = doc.append_field(body, FieldKind::TextArea, value).unwrap();
        (doc, input)
    }

    #[test]
    fn test_field_replacement_moves_caret_and_fires_input() {
        let (mut doc, input) = field("abcXYZdef");
        let span = FieldSpan {
            field: input,
            start: 3,
            end: 6,
        };

        let caret = replace_field(&mut doc, span, "123").unwrap();

        assert_eq!(doc.field_value(input).unwrap(), "abc123def");
        assert_eq!(caret, 6);
        assert_eq!(doc.field_selection(input).unwrap(), 6..6);
        assert_eq!(
            doc.events(),
            &[DomEvent::Input {
                target: input,
                bubbles: true
            }]
        );
    }

    #[test]
    fn test_field_offsets_clamp_to_value() {
        let (mut doc, input) = field("short");
        let span = FieldSpan {
            field: input,
            start: 2,
            end: 40,
        };
        replace_field(&mut doc, span, "ORT").unwrap();
        assert_eq!(doc.field_value(input).unwrap(), "shORT");
    }

    #[test]
    fn test_field_rejects_split_character() {
        let (mut doc, input) = field("née");
        let span = FieldSpan {
            field: input,
            start: 2,
            end: 4,
        };
        assert_eq!(
            replace_field(&mut doc, span, "x"),
            Err(DomError::NotCharBoundary {
                node: input,
                offset: 2
            })
        );
        assert!(doc.events().is_empty());
    }
}
