//! One polish operation from trigger to result.
//!
//! An operation is split around the transformation request: `begin_*` works
//! out what to replace and returns a `PendingPolish` that owns the target,
//! and `PendingPolish::complete` writes the transformed text back once it
//! arrives. The document is free to change in between.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::dom::{Document, DomError, NodeId};
use crate::error::PolishError;
use crate::replace;
use crate::resolve::{MatchRequest, MatchStrategy, Resolver};
use crate::span::{BoundaryPoint, FieldSpan, NodeRange, TextSpan};

pub const SUCCESS_MESSAGE: &str = "Text processed successfully";

/// Outcome reported back to whoever triggered the operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessResult {
    pub success: bool,
    pub message: String,
}

impl ProcessResult {
    pub fn success() -> Self {
        Self {
            success: true,
            message: SUCCESS_MESSAGE.to_string(),
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
        }
    }
}

impl From<PolishError> for ProcessResult {
    fn from(error: PolishError) -> Self {
        Self::failure(error.to_string())
    }
}

/// Per-operation context carried across the transformation request.
///
/// Consumed by `complete` or `abandon`, so a span is used at most once.
#[derive(Debug)]
pub struct PendingPolish {
    id: Uuid,
    text: String,
    span: TextSpan,
    /// What a resolved page span rendered to, checked again before replacing.
    /// Spans captured from the focused element have none and are used as-is.
    expected: Option<String>,
    strategy: Option<MatchStrategy>,
}

impl PendingPolish {
    fn new(
        text: String,
        span: TextSpan,
        expected: Option<String>,
        strategy: Option<MatchStrategy>,
    ) -> Self {
        let id = Uuid::new_v4();
        log::debug!("Polish {id} started for {span:?}");
        Self {
            id,
            text,
            span,
            expected,
            strategy,
        }
    }

    /// The selected text to send for transformation.
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn span(&self) -> &TextSpan {
        &self.span
    }

    /// How the page span was found. `None` for field and editable targets.
    pub fn strategy(&self) -> Option<MatchStrategy> {
        self.strategy
    }

    /// Write `replacement` over the target.
    pub fn complete(self, doc: &mut Document, replacement: &str) -> ProcessResult {
        match self.apply(doc, replacement) {
            Ok(()) => {
                log::info!("Polish {} replaced {} bytes", self.id, self.text.len());
                ProcessResult::success()
            }
            Err(error) => self.abandon(error),
        }
    }

    /// Drop the target without touching the document.
    pub fn abandon(self, error: PolishError) -> ProcessResult {
        log::error!("Polish {} failed: {error}", self.id);
        error.into()
    }

    fn apply(&self, doc: &mut Document, replacement: &str) -> Result<(), PolishError> {
        match (&self.span, &self.expected) {
            (TextSpan::Node(range), Some(expected)) => {
                replace::replace_page_span(doc, range, expected, replacement)?;
            }
            (TextSpan::Node(range), None) => {
                replace::insert_over(doc, range, replacement)?;
            }
            (TextSpan::Field(span), _) => {
                replace::replace_field(doc, *span, replacement)?;
            }
        }
        Ok(())
    }
}

/// Resolve `selected_text` on the page. This is the context menu path, where
/// the live selection has usually been lost.
pub fn begin_page_polish(
    doc: &Document,
    selected_text: &str,
) -> Result<PendingPolish, PolishError> {
    let request = MatchRequest::new(selected_text)?;
    let resolution = Resolver::new(doc).resolve(&request)?;
    let expected = doc.range_to_string(&resolution.span)?;
    Ok(PendingPolish::new(
        selected_text.to_string(),
        resolution.span.into(),
        Some(expected),
        Some(resolution.strategy),
    ))
}

/// Selection taken from the focused editable element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CapturedSelection {
    Field { text: String, span: FieldSpan },
    Editable {
        text: String,
        element: NodeId,
        range: NodeRange,
    },
}

impl CapturedSelection {
    pub fn text(&self) -> &str {
        match self {
            CapturedSelection::Field { text, .. } | CapturedSelection::Editable { text, .. } => {
                text
            }
        }
    }
}

/// Capture the selection in the active element, if that element is a text
/// field or `contenteditable`.
///
/// A `contenteditable` element with no live selection captures as empty text.
/// Field offsets that split a character are an error.
pub fn capture_field_selection(doc: &Document) -> Result<Option<CapturedSelection>, DomError> {
    let Some(active) = doc.active_element() else {
        return Ok(None);
    };

    if doc.is_text_field(active) {
        let value = doc.field_value(active)?;
        let selection = doc.field_selection(active)?;
        let text = value
            .get(selection.clone())
            .ok_or_else(|| {
                let offset = if value.is_char_boundary(selection.start) {
                    selection.end
                } else {
                    selection.start
                };
                DomError::NotCharBoundary {
                    node: active,
                    offset,
                }
            })?
            .to_string();
        return Ok(Some(CapturedSelection::Field {
            text,
            span: FieldSpan {
                field: active,
                start: selection.start,
                end: selection.end,
            },
        }));
    }

    if doc.is_content_editable(active) {
        let (text, range) = match doc.selection() {
            Some(range) => (doc.range_to_string(range)?, *range),
            None => (
                String::new(),
                NodeRange::collapsed(BoundaryPoint::new(active, 0)),
            ),
        };
        return Ok(Some(CapturedSelection::Editable {
            text,
            element: active,
            range,
        }));
    }

    Ok(None)
}

/// Start the keyboard command path: polish what is selected in the focused
/// field.
pub fn begin_field_polish(doc: &Document) -> Result<PendingPolish, PolishError> {
    let captured = capture_field_selection(doc)
        .map_err(PolishError::InvalidSelection)?
        .ok_or_else(|| {
            log::info!("Text must be selected from an input field");
            PolishError::NotAnInputField
        })?;
    if captured.text().trim().is_empty() {
        log::info!("No text selected in input field");
        return Err(PolishError::NoSelection);
    }

    let pending = match captured {
        CapturedSelection::Field { text, span } => {
            PendingPolish::new(text, span.into(), None, None)
        }
        CapturedSelection::Editable { text, range, .. } => {
            PendingPolish::new(text, range.into(), None, None)
        }
    };
    Ok(pending)
}
