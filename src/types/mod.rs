pub mod report;
pub mod resource_type;

pub use report::{BundleReport, ValidationOutcome, ValidationResult, ValidationStatus};
pub use resource_type::{ResourceType, UnsupportedResourceType};
