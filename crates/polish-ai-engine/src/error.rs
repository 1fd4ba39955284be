use crate::dom::DomError;

/// Every way a polish operation can fail. The `Display` text is the message
/// shown to the user.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PolishError {
    #[error("No text selected")]
    NoSelection,

    #[error("Text must be selected from an input field")]
    NotAnInputField,

    #[error("Could not find selected text on page")]
    SpanNotFound,

    #[error("Could not find selected text on page for replacement")]
    SpanInvalidated,

    #[error("Invalid selection: {0}")]
    InvalidSelection(DomError),

    #[error("Error replacing text: {0}")]
    Mutation(#[from] DomError),

    #[error("Server error: {status}")]
    Service { status: String },

    #[error("Network error: {0}")]
    Network(String),
}
