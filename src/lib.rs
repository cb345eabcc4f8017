//! # OctoFHIR SynthBundle
//!
//! Synthetic FHIR bundle generation with structural validation and repair.
//!
//! ## Features
//!
//! - **Validation**: Check every bundle entry against embedded resource schemas and
//!   report missing required fields
//! - **Repair**: Normalize known structural irregularities per resource type and
//!   re-validate, persisting the repaired bundle
//! - **Generation**: Build linked Patient-centred bundles through a text generation service
//! - **Storage**: In-memory and filesystem object stores
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use octofhir_synthbundle::*;
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<()> {
//! let store = Arc::new(MemoryObjectStore::new());
//! let orchestrator = BundleOrchestrator::new(store, SynthBundleConfig::default());
//!
//! let payload = serde_json::json!({
//!     "patient": {"resourceType": "Patient", "id": "p1", "birthDate": "1980-02-29"}
//! });
//! let outcome = orchestrator.validate_payload(&payload, None).await?;
//! println!("{}", serde_json::to_string_pretty(&outcome)?);
//! # Ok(())
//! # }
//! ```

pub mod bundle;
pub mod core;
pub mod error;
pub mod generation;
pub mod normalize;
pub mod path;
pub mod schema;
pub mod storage;
pub mod types;
pub mod validation;

pub use bundle::{BundleOrchestrator, Pass, canonicalize};
pub use crate::core::{GenerationConfig, StorageConfig, SynthBundleConfig, ValidationConfig};
pub use error::{Result, SynthBundleError};
pub use generation::{
    BundleGenerator, GeneratedBundle, GenerationParams, GenerationRequest, GenerationSummary,
    ObservationCategory, PromptBuilder, TextGenerator, extract_json,
};
#[cfg(feature = "openai-client")]
pub use generation::OpenAiChatClient;
pub use normalize::{RepairRegistry, RepairRule, ensure_timezone_aware};
pub use path::{exists, flatten, resolve};
pub use schema::{
    FieldPartition, FhirSchema, SchemaError, SchemaIssue, SchemaSet, SchemaValidator,
    StructuralValidator, embedded_schemas, field_partition,
};
#[cfg(feature = "disk-storage")]
pub use storage::FileObjectStore;
pub use storage::{MemoryObjectStore, ObjectStore};
pub use types::{
    BundleReport, ResourceType, ValidationOutcome, ValidationResult, ValidationStatus,
};
pub use validation::{Normalization, ResourceValidator, missing_fields};
