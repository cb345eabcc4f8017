pub mod config;

pub use config::{GenerationConfig, StorageConfig, SynthBundleConfig, ValidationConfig};
