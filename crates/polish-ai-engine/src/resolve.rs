//! Selection resolution: find where a piece of selected text lives in the
//! document.
//!
//! The selected text arrives as a plain string, usually from a context menu
//! that has already lost the live selection, and may have had its whitespace
//! rewritten on the way. `Resolver::resolve` tries progressively looser
//! strategies until one finds a span:
//!
//! 1. the live selection, if it still renders to the target text
//! 2. an exact substring of a text node
//! 3. a case-insensitive substring
//! 4. a whitespace-collapsed match, mapped back to real offsets
//! 5. a fuzzy word-prefix match with an estimated end
//!
//! Each strategy scans every text node in document order before the next one
//! is tried, so a looser strategy never shadows a stricter hit later in the
//! page.

use serde::Serialize;

use crate::dom::{Document, NodeId};
use crate::error::PolishError;
use crate::span::NodeRange;
use crate::text::{
    char_to_byte, find_exact, find_folded, find_normalized, folded_char_index, leading_words,
    normalize_whitespace, preview,
};

/// Text to locate, kept both as selected and whitespace-normalized.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchRequest {
    raw: String,
    normalized: String,
}

impl MatchRequest {
    /// Fails with `NoSelection` when `raw` is empty after trimming.
    pub fn new(raw: impl Into<String>) -> Result<Self, PolishError> {
        let raw = raw.into();
        if raw.trim().is_empty() {
            return Err(PolishError::NoSelection);
        }
        let normalized = normalize_whitespace(&raw);
        Ok(Self { raw, normalized })
    }

    pub fn raw(&self) -> &str {
        &self.raw
    }

    pub fn normalized(&self) -> &str {
        &self.normalized
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchStrategy {
    LiveSelection,
    Exact,
    CaseInsensitive,
    Normalized,
    Fuzzy,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Resolution {
    pub span: NodeRange,
    pub strategy: MatchStrategy,
}

/// Searches the text nodes under one root.
pub struct Resolver<'a> {
    doc: &'a Document,
    root: NodeId,
}

impl<'a> Resolver<'a> {
    /// Resolver over the whole document body.
    pub fn new(doc: &'a Document) -> Self {
        Self::within(doc, doc.body())
    }

    pub fn within(doc: &'a Document, root: NodeId) -> Self {
        Self { doc, root }
    }

    pub fn resolve(&self, request: &MatchRequest) -> Result<Resolution, PolishError> {
        log::debug!(
            "Searching for text: {:?} ({} bytes, normalized {:?})",
            preview(request.raw(), 50),
            request.raw().len(),
            preview(request.normalized(), 50)
        );

        if let Some(span) = self.live_selection(request) {
            log::debug!("Live selection still matches");
            return Ok(Resolution {
                span,
                strategy: MatchStrategy::LiveSelection,
            });
        }

        let nodes = self.searchable_nodes();
        let found = scan(&nodes, |text| find_exact(text, request.raw()))
            .map(|span| (span, MatchStrategy::Exact))
            .or_else(|| {
                scan(&nodes, |text| find_folded(text, request.raw()))
                    .map(|span| (span, MatchStrategy::CaseInsensitive))
            })
            .or_else(|| {
                scan(&nodes, |text| find_normalized(text, request.normalized()))
                    .map(|span| (span, MatchStrategy::Normalized))
            })
            .or_else(|| fuzzy(&nodes, request).map(|span| (span, MatchStrategy::Fuzzy)));

        match found {
            Some((span, MatchStrategy::Fuzzy)) => {
                log::warn!(
                    "Only a fuzzy match found in node {}, end offset is estimated",
                    span.start.node
                );
                Ok(Resolution {
                    span,
                    strategy: MatchStrategy::Fuzzy,
                })
            }
            Some((span, strategy)) => {
                log::debug!("Found {strategy:?} match in node {}", span.start.node);
                Ok(Resolution { span, strategy })
            }
            None => {
                log::error!(
                    "Could not find text in document after all attempts (document text length {})",
                    self.doc.text_content(self.root).len()
                );
                Err(PolishError::SpanNotFound)
            }
        }
    }

    /// Exact substring search only, as used to re-find text right before a
    /// replacement.
    pub fn find_exact(&self, raw: &str) -> Option<NodeRange> {
        scan(&self.searchable_nodes(), |text| find_exact(text, raw))
    }

    fn live_selection(&self, request: &MatchRequest) -> Option<NodeRange> {
        let range = self
            .doc
            .selection()
            .filter(|r| self.doc.contains(self.root, r.start.node))
            .filter(|r| self.doc.contains(self.root, r.end.node))?;
        let text = self.doc.range_to_string(range).ok()?;
        (text.trim() == request.raw().trim()).then_some(*range)
    }

    /// Non-blank text nodes under the root, in document order.
    fn searchable_nodes(&self) -> Vec<(NodeId, String)> {
        self.doc
            .text_nodes_under(self.root)
            .into_iter()
            .filter_map(|id| self.doc.text(id).ok().map(|text| (id, text)))
            .filter(|(_, text)| !text.trim().is_empty())
            .collect()
    }
}

/// First node (in order) where `find` hits, using the first hit in that node.
fn scan<F>(nodes: &[(NodeId, String)], find: F) -> Option<NodeRange>
where
    F: Fn(&str) -> Option<std::ops::Range<usize>>,
{
    nodes
        .iter()
        .find_map(|(id, text)| find(text).map(|range| NodeRange::in_text(*id, range)))
}

/// Last resort: match the first few words of the target and assume the span
/// runs for the target's length from there. The end is not verified.
fn fuzzy(nodes: &[(NodeId, String)], request: &MatchRequest) -> Option<NodeRange> {
    let prefix = leading_words(request.raw());
    if prefix.is_empty() {
        return None;
    }
    let target_len = request.raw().chars().count();
    log::debug!("Trying fuzzy match with: {prefix:?}");

    nodes
        .iter()
        .filter(|(_, text)| text.chars().count() * 2 > target_len)
        .find_map(|(id, text)| {
            let start = folded_char_index(text, &prefix)?;
            let end = (start + target_len).min(text.chars().count());
            Some(NodeRange::in_text(
                *id,
                char_to_byte(text, start)..char_to_byte(text, end),
            ))
        })
}
