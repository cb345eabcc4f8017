//! Runtime configuration.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{Result, SynthBundleError};

pub const ENV_CONTAINER: &str = "BLOB_CONTAINER_NAME";
pub const ENV_API_KEY: &str = "AZURE_OPENAI_KEY";
pub const ENV_API_BASE: &str = "AZURE_OPENAI_API_BASE";
pub const ENV_API_VERSION: &str = "AZURE_OPENAI_API_VERSION";
pub const ENV_MODEL: &str = "AZURE_OPENAI_MODEL";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SynthBundleConfig {
    #[serde(default)]
    pub validation: ValidationConfig,
    #[serde(default)]
    pub generation: GenerationConfig,
    #[serde(default)]
    pub storage: StorageConfig,
}

/// Bundle validation settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationConfig {
    /// Name prefix of persisted validated bundles
    #[serde(default = "default_validated_prefix")]
    pub object_prefix: String,

    /// Name prefix identifying generated source bundles
    #[serde(default = "default_generated_prefix")]
    pub source_prefix: String,

    /// `strftime` format of the fallback object id
    #[serde(default = "default_timestamp_format")]
    pub timestamp_format: String,

    /// Bundle `type` assigned when the payload has none
    #[serde(default = "default_bundle_type")]
    pub default_bundle_type: String,
}

/// Text generation settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationConfig {
    /// Service endpoint, e.g. `https://<resource>.openai.azure.com`
    #[serde(default)]
    pub api_base: Option<String>,

    #[serde(default, skip_serializing)]
    pub api_key: Option<String>,

    #[serde(default = "default_api_version")]
    pub api_version: String,

    /// Model deployment name
    #[serde(default = "default_model")]
    pub model: String,

    #[serde(default = "default_temperature")]
    pub temperature: f32,

    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// Per-request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout: u64,

    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Name prefix of persisted generated bundles
    #[serde(default = "default_generated_prefix")]
    pub object_prefix: String,
}

/// Object store settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "default_container")]
    pub container: String,

    /// Root directory of the file object store
    #[serde(default = "default_root")]
    pub root: PathBuf,

    /// Public URL prefix for stored objects
    #[serde(default)]
    pub base_url: Option<String>,
}

impl SynthBundleConfig {
    /// Defaults overlaid with the environment
    pub fn from_env() -> Self {
        Self::default().with_env_overrides(|key| std::env::var(key).ok())
    }

    /// Read a JSON configuration file, then overlay the environment
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            SynthBundleError::config(format!("Failed to read {}: {e}", path.display()))
        })?;
        let config: Self = serde_json::from_str(&content).map_err(|e| {
            SynthBundleError::config(format!("Failed to parse {}: {e}", path.display()))
        })?;
        Ok(config.with_env_overrides(|key| std::env::var(key).ok()))
    }

    /// Overlay values from `lookup` (usually the process environment)
    pub fn with_env_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        let lookup = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        if let Some(container) = lookup(ENV_CONTAINER) {
            self.storage.container = container;
        }
        if let Some(key) = lookup(ENV_API_KEY) {
            self.generation.api_key = Some(key);
        }
        if let Some(base) = lookup(ENV_API_BASE) {
            self.generation.api_base = Some(base);
        }
        if let Some(version) = lookup(ENV_API_VERSION) {
            self.generation.api_version = version;
        }
        if let Some(model) = lookup(ENV_MODEL) {
            self.generation.model = model;
        }
        self
    }

    pub fn with_container(mut self, container: impl Into<String>) -> Self {
        self.storage.container = container.into();
        self
    }

    pub fn with_storage_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.storage.root = root.into();
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.generation.model = model.into();
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.storage.container.trim().is_empty() {
            return Err(SynthBundleError::config("Container name must not be empty"));
        }
        if !(0.0..=2.0).contains(&self.generation.temperature) {
            return Err(SynthBundleError::config(format!(
                "Temperature must be within 0.0..=2.0, got {}",
                self.generation.temperature
            )));
        }
        Ok(())
    }
}

impl GenerationConfig {
    pub fn timeout_duration(&self) -> Duration {
        Duration::from_secs(self.timeout)
    }
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            object_prefix: default_validated_prefix(),
            source_prefix: default_generated_prefix(),
            timestamp_format: default_timestamp_format(),
            default_bundle_type: default_bundle_type(),
        }
    }
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            api_base: None,
            api_key: None,
            api_version: default_api_version(),
            model: default_model(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            timeout: default_timeout(),
            max_retries: default_max_retries(),
            object_prefix: default_generated_prefix(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            container: default_container(),
            root: default_root(),
            base_url: None,
        }
    }
}

fn default_validated_prefix() -> String { "validated_fhir_bundle".to_string() }
fn default_generated_prefix() -> String { "generated_fhir_bundle".to_string() }
fn default_timestamp_format() -> String { "%Y%m%d%H%M%S".to_string() }
fn default_bundle_type() -> String { "collection".to_string() }
fn default_api_version() -> String { "2024-02-01".to_string() }
fn default_model() -> String { "gpt-4o".to_string() }
fn default_temperature() -> f32 { 0.7 }
fn default_max_tokens() -> u32 { 4096 }
fn default_timeout() -> u64 { 300 }
fn default_max_retries() -> u32 { 5 }
fn default_container() -> String { "fhir-bundles".to_string() }
fn default_root() -> PathBuf { PathBuf::from("data") }
