pub mod service;
pub mod trigger;

pub use service::{HttpTransformer, ServiceError, Transformer};
pub use trigger::{TriggerRequest, handle_request, polish_field_selection, polish_page_selection};
