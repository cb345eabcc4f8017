mod common;

use common::*;
use octofhir_synthbundle::*;
use pretty_assertions::assert_eq;
use serde_json::{Value, json};

#[tokio::test]
async fn conformant_bundle_is_accepted_as_is() {
    let (orchestrator, store) = memory_orchestrator();
    let payload = load_fixture("valid_bundle.json");

    let outcome = orchestrator.validate_payload(&payload, None).await.unwrap();

    assert_eq!(outcome.status, ValidationStatus::Success);
    assert!(!outcome.was_repaired());
    let report = &outcome.initial_validation;
    assert_eq!(report.results.len(), 3);
    assert!(report.results.iter().all(ValidationResult::is_success));
    assert_eq!(
        report.object_name.as_deref(),
        Some("validated_fhir_bundle_b-valid.json")
    );
    assert_eq!(
        report.object_url.as_deref(),
        Some("memory://fhir-bundles/validated_fhir_bundle_b-valid.json")
    );

    let stored = store
        .get("fhir-bundles", "validated_fhir_bundle_b-valid.json")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(serde_json::from_slice::<Value>(&stored).unwrap(), payload);
}

#[tokio::test]
async fn missing_resource_type_yields_one_error_among_three() {
    let (orchestrator, _) = memory_orchestrator();
    let payload = load_fixture("missing_resource_type.json");

    let outcome = orchestrator.validate_payload(&payload, None).await.unwrap();
    let initial = &outcome.initial_validation;

    assert_eq!(initial.results.len(), 3);
    assert_eq!(initial.error_count(), 1);
    assert_eq!(initial.status, ValidationStatus::Error);
    assert!(initial.results[0].is_success());
    assert!(initial.results[2].is_success());
    assert!(
        initial.results[1]
            .message
            .starts_with("Missing 'resourceType' in resource")
    );
    assert_eq!(initial.results[1].resource_type, None);

    // The repair pass cannot invent a resource type
    assert!(outcome.was_repaired());
    let repair = outcome.re_validation.as_ref().unwrap();
    assert_eq!(repair.results.len(), 3);
    assert_eq!(repair.error_count(), 1);
    assert_eq!(outcome.status, ValidationStatus::Error);
}

#[tokio::test]
async fn repair_fixes_encounter_and_medication_request() {
    let (orchestrator, store) = memory_orchestrator();
    let payload = load_fixture("repairable_bundle.json");

    let outcome = orchestrator
        .validate_payload(&payload, Some("generated_fhir_bundle_p1.json"))
        .await
        .unwrap();

    let initial = &outcome.initial_validation;
    assert_eq!(initial.status, ValidationStatus::Error);
    assert!(
        initial.results[0]
            .message
            .starts_with("Bundle validation failed: ")
    );
    assert_eq!(initial.results.len(), 4);

    let repair = outcome.re_validation.as_ref().unwrap();
    assert_eq!(repair.status, ValidationStatus::Success, "{repair:#?}");
    assert_eq!(repair.results.len(), 3);
    assert_eq!(
        repair.message,
        "FHIR Bundle and resourceTypes are valid after re-validation."
    );
    assert_eq!(
        repair.object_name.as_deref(),
        Some("validated_fhir_bundle_p1.json")
    );
    assert_eq!(outcome.status, ValidationStatus::Success);

    let repaired = outcome.repaired_bundle.as_ref().unwrap();
    let encounter = entry_resource(repaired, 1);
    assert_eq!(
        encounter["class"],
        json!([{"coding": [{"system": "http://terminology.hl7.org/CodeSystem/v3-ActCode", "code": "AMB"}]}])
    );
    assert!(encounter.get("period").is_none());
    assert!(encounter.get("participant").is_none());

    let medication = entry_resource(repaired, 2);
    assert_eq!(
        medication["medication"]["concept"],
        entry_resource(&payload, 2)["medicationCodeableConcept"]
    );
    assert!(medication.get("medicationCodeableConcept").is_none());
    assert_eq!(medication["authoredOn"], "2024-05-02T08:20:00+00:00");

    let stored = store
        .get("fhir-bundles", "validated_fhir_bundle_p1.json")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(&serde_json::from_slice::<Value>(&stored).unwrap(), repaired);
}

#[tokio::test]
async fn caller_payload_is_never_modified() {
    let (orchestrator, _) = memory_orchestrator();
    let payload = load_fixture("repairable_bundle.json");
    let before = payload.clone();

    let outcome = orchestrator.validate_payload(&payload, None).await.unwrap();

    assert!(outcome.was_repaired());
    assert_eq!(payload, before);
}

#[test]
fn initial_pass_does_not_touch_the_bundle_it_reads() {
    let (orchestrator, _) = memory_orchestrator();
    let bundle = canonicalize(&load_fixture("repairable_bundle.json"), "collection");
    let before = bundle.clone();

    let initial = orchestrator.initial_pass(&bundle);
    assert_eq!(bundle, before);

    let mut repaired = bundle.clone();
    let repair = orchestrator.repair_pass(&mut repaired);
    assert_ne!(repaired, bundle);
    assert!(initial.error_count() > repair.error_count());
}

#[tokio::test]
async fn keyed_payload_is_canonicalized_in_order() {
    let (orchestrator, _) = memory_orchestrator();
    let payload = load_fixture("keyed_payload.json");

    let outcome = orchestrator.validate_payload(&payload, None).await.unwrap();
    let ids: Vec<Option<&str>> = outcome
        .initial_validation
        .results
        .iter()
        .map(|r| r.id.as_deref())
        .collect();

    assert_eq!(ids, vec![Some("p7"), Some("c7"), Some("c8")]);
    assert_eq!(outcome.status, ValidationStatus::Success);
    let name = outcome.initial_validation.object_name.unwrap();
    assert!(name.starts_with("validated_fhir_bundle_"), "{name}");
}

#[tokio::test]
async fn patient_without_birth_date_reports_missing_field() {
    let (orchestrator, _) = memory_orchestrator();
    let payload = json!({"resourceType": "Patient", "id": "p2", "gender": "unknown"});

    let outcome = orchestrator.validate_payload(&payload, None).await.unwrap();
    let result = &outcome.initial_validation.results[0];

    assert!(result.is_success());
    let missing = result.missing_fields.as_ref().unwrap();
    assert!(missing.contains("birthDate"));
    assert!(!missing.contains("gender"));
    assert!(!missing.contains("id"));
}

#[tokio::test]
async fn unsupported_types_are_reported_per_entry() {
    let (orchestrator, _) = memory_orchestrator();
    let payload = json!({
        "entry": [
            {"resource": {"resourceType": "Practitioner", "id": "dr1"}},
            {"resource": {"resourceType": "Patient", "id": "p3"}}
        ]
    });

    let outcome = orchestrator.validate_payload(&payload, None).await.unwrap();
    let initial = &outcome.initial_validation;

    assert_eq!(
        initial.results[0].message,
        "Unsupported resource type: Practitioner"
    );
    assert!(initial.results[1].is_success());
}

#[tokio::test]
async fn stored_objects_can_be_validated_by_name() {
    let (orchestrator, store) = memory_orchestrator();
    let bytes = serde_json::to_vec(&load_fixture("valid_bundle.json")).unwrap();
    store
        .put("fhir-bundles", "generated_fhir_bundle_p1.json", bytes)
        .await
        .unwrap();

    let outcome = orchestrator
        .validate_object("generated_fhir_bundle_p1.json")
        .await
        .unwrap();

    assert_eq!(
        outcome.initial_validation.source.as_deref(),
        Some("generated_fhir_bundle_p1.json")
    );
    assert_eq!(
        outcome.initial_validation.object_name.as_deref(),
        Some("validated_fhir_bundle_p1.json")
    );
}
