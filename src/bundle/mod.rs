//! Bundle canonicalization and the validate/repair orchestration.

mod canonical;
mod naming;
mod orchestrator;

pub use canonical::canonicalize;
pub use naming::{object_name, validated_object_id};
pub use orchestrator::{BundleOrchestrator, Pass};
