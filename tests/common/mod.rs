use octofhir_synthbundle::*;
use serde_json::Value;
use std::path::PathBuf;
use std::sync::Arc;

#[allow(dead_code)]
pub fn fixture_path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

#[allow(dead_code)]
pub fn load_fixture(name: &str) -> Value {
    let content = std::fs::read_to_string(fixture_path(name))
        .unwrap_or_else(|e| panic!("failed to read fixture {name}: {e}"));
    serde_json::from_str(&content).unwrap_or_else(|e| panic!("invalid fixture {name}: {e}"))
}

#[allow(dead_code)]
pub fn memory_orchestrator() -> (BundleOrchestrator, MemoryObjectStore) {
    let store = MemoryObjectStore::new();
    let orchestrator =
        BundleOrchestrator::new(Arc::new(store.clone()), SynthBundleConfig::default());
    (orchestrator, store)
}

/// The resource held by entry `index` of `bundle`
#[allow(dead_code)]
pub fn entry_resource(bundle: &Value, index: usize) -> &Value {
    &bundle["entry"][index]["resource"]
}
