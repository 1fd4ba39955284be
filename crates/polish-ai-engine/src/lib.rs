pub mod dom;
pub mod error;
pub mod operation;
pub mod replace;
pub mod resolve;
pub mod span;
pub mod text;

// Re-export key types for easier usage
pub use dom::{Document, DomError, DomEvent, FieldKind, NodeId, NodeKind};
pub use error::PolishError;
pub use operation::*;
pub use resolve::{MatchRequest, MatchStrategy, Resolution, Resolver};
pub use span::*;
