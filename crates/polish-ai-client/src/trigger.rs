//! Entry points for the two ways a polish is triggered, each producing
//! exactly one `ProcessResult`.
//!
//! The document lock is taken to resolve the selection and again to write the
//! result. It is never held while waiting for the service.

use std::sync::{Mutex, MutexGuard, PoisonError};

use polish_ai_engine::{
    Document, PendingPolish, PolishError, ProcessResult, begin_field_polish, begin_page_polish,
};
use serde::{Deserialize, Serialize};

use crate::service::Transformer;

/// Messages sent to the page by the context menu and the keyboard command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action")]
pub enum TriggerRequest {
    /// Context menu: polish this text wherever it is on the page.
    #[serde(rename = "polishSelectedText")]
    PolishSelectedText {
        #[serde(rename = "selectedText", default)]
        selected_text: String,
    },
    /// Keyboard command: polish the selection in the focused field.
    #[serde(rename = "getSelectedText")]
    GetSelectedText,
}

pub async fn handle_request<T>(
    doc: &Mutex<Document>,
    transformer: &T,
    request: TriggerRequest,
) -> ProcessResult
where
    T: Transformer + ?Sized,
{
    match request {
        TriggerRequest::PolishSelectedText { selected_text } => {
            polish_page_selection(doc, transformer, &selected_text).await
        }
        TriggerRequest::GetSelectedText => polish_field_selection(doc, transformer).await,
    }
}

/// Find `selected_text` on the page, transform it and write it back.
pub async fn polish_page_selection<T>(
    doc: &Mutex<Document>,
    transformer: &T,
    selected_text: &str,
) -> ProcessResult
where
    T: Transformer + ?Sized,
{
    let started = {
        let doc = lock(doc);
        begin_page_polish(&doc, selected_text)
    };
    finish(doc, transformer, started).await
}

/// Transform the selection in the focused text field or `contenteditable`.
pub async fn polish_field_selection<T>(doc: &Mutex<Document>, transformer: &T) -> ProcessResult
where
    T: Transformer + ?Sized,
{
    let started = {
        let doc = lock(doc);
        begin_field_polish(&doc)
    };
    finish(doc, transformer, started).await
}

async fn finish<T>(
    doc: &Mutex<Document>,
    transformer: &T,
    started: Result<PendingPolish, PolishError>,
) -> ProcessResult
where
    T: Transformer + ?Sized,
{
    let pending = match started {
        Ok(pending) => pending,
        Err(error) => {
            log::error!("{error}");
            return error.into();
        }
    };

    match transformer.transform(pending.text()).await {
        Ok(replacement) => {
            let mut doc = lock(doc);
            pending.complete(&mut doc, &replacement)
        }
        Err(error) => pending.abandon(error.into()),
    }
}

/// Poisoned locks are used as-is.
fn lock(doc: &Mutex<Document>) -> MutexGuard<'_, Document> {
    doc.lock().unwrap_or_else(PoisonError::into_inner)
}
