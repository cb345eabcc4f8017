//! Single-record validation.

mod completeness;
mod resource;

pub use completeness::missing_fields;
pub use resource::{Normalization, ResourceValidator};
