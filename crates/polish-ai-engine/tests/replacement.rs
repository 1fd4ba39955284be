use polish_ai_engine::replace::{replace_field, replace_page_span};
use polish_ai_engine::{
    BoundaryPoint, Document, DomEvent, FieldKind, FieldSpan, MatchRequest, MatchStrategy,
    NodeRange, PolishError, ProcessResult, Resolver, TextSpan, begin_field_polish,
    begin_page_polish,
};
use pretty_assertions::assert_eq;
use rstest::rstest;

fn resolve_exact(doc: &Document, raw: &str) -> NodeRange {
    let resolution = Resolver::new(doc)
        .resolve(&MatchRequest::new(raw).unwrap())
        .unwrap();
    assert_eq!(resolution.strategy, MatchStrategy::Exact);
    resolution.span
}

#[rstest]
#[case("first paragraph", "opening paragraph")]
#[case("first paragraph", "x")]
#[case("middle", "centre of the document")]
fn replaced_text_resolves_to_itself(#[case] original: &str, #[case] replacement: &str) {
    let mut doc = Document::from_paragraphs("The first paragraph.\n\nThe middle one.\n\nThe end.");
    let span = resolve_exact(&doc, original);

    replace_page_span(&mut doc, &span, original, replacement).unwrap();

    let again = resolve_exact(&doc, replacement);
    assert_eq!(doc.range_to_string(&again).unwrap(), replacement);
}

#[test]
fn field_replacement_example() {
    let mut doc = Document::new();
    let body = doc.body();
    let field = doc.append_field(body, FieldKind::Input, "abcXYZdef").unwrap();

    let caret = replace_field(
        &mut doc,
        FieldSpan {
            field,
            start: 3,
            end: 6,
        },
        "Q",
    )
    .unwrap();

    assert_eq!(doc.field_value(field).unwrap(), "abcQdef");
    assert_eq!(caret, 4);
    assert_eq!(doc.field_selection(field).unwrap(), 4..4);
    assert_eq!(
        doc.events(),
        &[DomEvent::Input {
            target: field,
            bubbles: true
        }]
    );
}

#[test]
fn page_edit_during_request_is_detected() {
    let mut doc = Document::from_paragraphs("Please polish this sentence.\n\nAnother one.");
    let pending = begin_page_polish(&doc, "polish this sentence").unwrap();

    // The page rewrites the paragraph while the request is in flight.
    let text = doc.text_nodes_under(doc.body())[0];
    let len = doc.text_len(text).unwrap();
    doc.splice_text(text, 0..len, "Entirely different words.").unwrap();
    let version = doc.version();

    let result = pending.complete(&mut doc, "refine this sentence");

    assert_eq!(
        result,
        ProcessResult::failure("Could not find selected text on page for replacement")
    );
    assert_eq!(doc.version(), version);
    assert_eq!(
        doc.text_content(doc.body()),
        "Entirely different words.\n\nAnother one."
    );
}

#[test]
fn page_edit_that_shifts_text_is_followed() {
    let mut doc = Document::from_paragraphs("Please polish this sentence.");
    let pending = begin_page_polish(&doc, "polish this").unwrap();

    let text = doc.text_nodes_under(doc.body())[0];
    doc.splice_text(text, 0..0, "Now: ").unwrap();

    assert!(pending.complete(&mut doc, "tidy this").success);
    assert_eq!(
        doc.text_content(doc.body()),
        "Now: Please tidy this sentence."
    );
}

#[test]
fn abandoned_operation_leaves_field_untouched() {
    let mut doc = Document::new();
    let body = doc.body();
    let field = doc
        .append_field(body, FieldKind::TextArea, "keep me as I am")
        .unwrap();
    doc.focus(field).unwrap();
    doc.set_field_selection(field, 0..4).unwrap();

    let pending = begin_field_polish(&doc).unwrap();
    let result = pending.abandon(PolishError::Service {
        status: "Internal Server Error".to_string(),
    });

    assert_eq!(
        result,
        ProcessResult::failure("Server error: Internal Server Error")
    );
    assert_eq!(doc.field_value(field).unwrap(), "keep me as I am");
    assert!(doc.events().is_empty());
}

#[test]
fn selection_across_markup_is_replaced_with_one_text_node() {
    let mut doc = Document::new();
    let body = doc.body();
    let p = doc.append_element(body, "p").unwrap();
    let start = doc.append_text(p, "Make ").unwrap();
    let b = doc.append_element(p, "b").unwrap();
    doc.append_text(b, "this").unwrap();
    let end = doc.append_text(p, " louder").unwrap();
    let selected = NodeRange::new(BoundaryPoint::new(start, 5), BoundaryPoint::new(end, 7));
    doc.select(selected);

    let pending = begin_page_polish(&doc, "this louder").unwrap();
    assert_eq!(pending.strategy(), Some(MatchStrategy::LiveSelection));
    assert_eq!(pending.span(), &TextSpan::Node(selected));

    let result = pending.complete(&mut doc, "THIS LOUDER");

    assert_eq!(result, ProcessResult::success());
    assert_eq!(doc.text_content(p), "Make THIS LOUDER");
    let inserted = doc.children(p)[1];
    assert_eq!(doc.text(inserted).unwrap(), "THIS LOUDER");
    assert_eq!(doc.text(start).unwrap(), "Make ");
    assert_eq!(
        doc.selection(),
        Some(&NodeRange::collapsed(BoundaryPoint::new(p, 2)))
    );
}
