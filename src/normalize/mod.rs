//! Per-resource-type structural repairs applied before schema validation.

mod registry;
mod rules;
mod timestamp;

pub use registry::RepairRegistry;
pub use rules::RepairRule;
pub use timestamp::ensure_timezone_aware;
