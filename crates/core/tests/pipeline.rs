//! End-to-end acceptance tests over the wire-level JSON shape.
//!
//! These drive the full validate → transform → persist pipeline with pinned
//! identifier and clock capabilities and assert on the serialised document,
//! exactly as a downstream FHIR consumer would see it.

use chrono::{TimeZone, Utc};
use medex_core::{CoreError, MemoryStore, TransformService, ViolationKind};
use medex_uuid::{FixedClock, SequenceIds};
use serde_json::{json, Value};
use std::sync::Arc;

fn service(store: Arc<MemoryStore>) -> TransformService<Arc<MemoryStore>> {
    TransformService::with_capabilities(
        store,
        Box::new(SequenceIds::new()),
        Box::new(FixedClock(
            Utc.with_ymd_and_hms(2024, 6, 15, 12, 0, 0).unwrap(),
        )),
    )
}

fn process(payload: Value) -> Result<Value, CoreError> {
    let store = Arc::new(MemoryStore::new());
    let bundle = service(store.clone()).process(&payload)?;

    // Assert against what was actually persisted, not the in-memory struct.
    let row = store.get(&bundle.id).expect("bundle stored");
    Ok(serde_json::from_str(&row.document).expect("stored document is JSON"))
}

fn patient() -> Value {
    json!({
        "vorname": "Max",
        "nachname": "Mustermann",
        "geburtsdatum": "1990-01-01",
        "geschlecht": "male"
    })
}

#[test]
fn patient_only_payload_yields_single_entry_bundle() {
    let doc = process(json!({ "patient": patient() })).expect("process");

    assert_eq!(doc["resourceType"], "Bundle");
    assert_eq!(doc["type"], "collection");
    assert_eq!(doc["entry"].as_array().map(Vec::len), Some(1));

    let resource = &doc["entry"][0]["resource"];
    assert_eq!(resource["resourceType"], "Patient");
    assert_eq!(resource["name"][0]["family"], "Mustermann");
    assert_eq!(resource["name"][0]["given"], json!(["Max"]));
    assert_eq!(resource["gender"], "male");
    assert_eq!(resource["birthDate"], "1990-01-01");
}

#[test]
fn diagnosis_entry_is_coded_under_icd10() {
    let doc = process(json!({
        "patient": patient(),
        "diagnosen": [{"icd10": "I10", "beschreibung": "Hypertonie"}]
    }))
    .expect("process");

    assert_eq!(doc["entry"].as_array().map(Vec::len), Some(2));
    let coding = &doc["entry"][1]["resource"]["code"]["coding"][0];
    assert_eq!(coding["system"], "http://hl7.org/fhir/sid/icd-10");
    assert_eq!(coding["code"], "I10");
    assert_eq!(coding["display"], "Hypertonie");
    assert_eq!(doc["entry"][1]["resource"]["code"]["text"], "Hypertonie");
}

#[test]
fn invalid_sex_fails_validation_without_producing_a_document() {
    let store = Arc::new(MemoryStore::new());
    let mut p = patient();
    p["geschlecht"] = json!("invalid");

    let err = service(store.clone())
        .process(&json!({ "patient": p }))
        .expect_err("invalid sex");
    match err {
        CoreError::Validation(failure) => {
            let violation = failure
                .violations
                .iter()
                .find(|v| v.path == "patient.geschlecht")
                .expect("violation at patient.geschlecht");
            assert_eq!(violation.kind, ViolationKind::NotAllowed);
        }
        other => panic!("expected Validation, got {other:?}"),
    }
    assert!(store.is_empty());
}

#[test]
fn lab_reference_range_carries_both_bounds_with_units() {
    let doc = process(json!({
        "patient": patient(),
        "laborwerte": [{
            "loinc": "2345-7",
            "wert": 120.5,
            "einheit": "mg/dL",
            "referenz_min": 70.0,
            "referenz_max": 100.0
        }]
    }))
    .expect("process");

    let obs = &doc["entry"][1]["resource"];
    assert_eq!(obs["resourceType"], "Observation");
    assert_eq!(obs["valueQuantity"]["value"], 120.5);

    let range = &obs["referenceRange"][0];
    assert_eq!(range["low"]["value"], 70.0);
    assert_eq!(range["low"]["unit"], "mg/dL");
    assert_eq!(range["high"]["value"], 100.0);
    assert_eq!(range["high"]["unit"], "mg/dL");
}

#[test]
fn lab_without_bounds_omits_reference_range_entirely() {
    let doc = process(json!({
        "patient": patient(),
        "laborwerte": [{"loinc": "718-7", "wert": 14.0, "einheit": "g/dL"}]
    }))
    .expect("process");

    let obs = &doc["entry"][1]["resource"];
    assert!(obs.get("referenceRange").is_none());
    assert_eq!(obs["status"], "final");
    assert_eq!(obs["category"][0]["text"], "laboratory");
}

#[test]
fn sibling_violations_are_reported_together() {
    let err = process(json!({
        "patient": patient(),
        "diagnosen": [{"icd10": "invalid-code"}],
        "prozeduren": [{"ops": "also-bad"}]
    }))
    .expect_err("invalid entries");

    match err {
        CoreError::Validation(failure) => {
            assert!(failure.has_path("diagnosen[0].icd10"));
            assert!(failure.has_path("prozeduren[0].ops"));
        }
        other => panic!("expected Validation, got {other:?}"),
    }
}

#[test]
fn onset_and_performed_dates_propagate_into_the_document() {
    // The emitted record must carry these dates whenever the input did; an
    // implementation that drops them on some construction path is defective.
    let doc = process(json!({
        "patient": patient(),
        "diagnosen": [{"icd10": "E11.9", "begonnen_am": "2020-03-15"}],
        "prozeduren": [{"ops": "5-780", "datum": "2023-06-10"}]
    }))
    .expect("process");

    assert_eq!(doc["entry"][1]["resource"]["onsetDateTime"], "2020-03-15");
    assert_eq!(doc["entry"][2]["resource"]["performedDateTime"], "2023-06-10");
}

#[test]
fn entry_order_follows_input_order_within_groups() {
    let doc = process(json!({
        "patient": patient(),
        "diagnosen": [{"icd10": "I10"}, {"icd10": "I11"}, {"icd10": "I12"}],
        "prozeduren": [{"ops": "5-511"}, {"ops": "5-780"}],
        "laborwerte": [
            {"loinc": "2345-7", "wert": 1.0, "einheit": "u"},
            {"loinc": "718-7", "wert": 2.0, "einheit": "u"}
        ]
    }))
    .expect("process");

    let entries = doc["entry"].as_array().expect("entries");
    assert_eq!(entries.len(), 1 + 3 + 2 + 2);

    let types: Vec<&str> = entries
        .iter()
        .map(|e| e["resource"]["resourceType"].as_str().expect("type"))
        .collect();
    assert_eq!(
        types,
        vec![
            "Patient",
            "Condition",
            "Condition",
            "Condition",
            "Procedure",
            "Procedure",
            "Observation",
            "Observation"
        ]
    );

    let diagnosis_codes: Vec<&str> = entries[1..4]
        .iter()
        .map(|e| e["resource"]["code"]["coding"][0]["code"].as_str().expect("code"))
        .collect();
    assert_eq!(diagnosis_codes, vec!["I10", "I11", "I12"]);

    let lab_codes: Vec<&str> = entries[6..8]
        .iter()
        .map(|e| e["resource"]["code"]["coding"][0]["code"].as_str().expect("code"))
        .collect();
    assert_eq!(lab_codes, vec!["2345-7", "718-7"]);
}

#[test]
fn every_clinical_record_references_the_subject_record() {
    let doc = process(json!({
        "patient": patient(),
        "diagnosen": [{"icd10": "I10"}],
        "prozeduren": [{"ops": "5-511"}],
        "laborwerte": [{"loinc": "718-7", "wert": 14.0, "einheit": "g/dL"}]
    }))
    .expect("process");

    let patient_id = doc["entry"][0]["resource"]["id"].as_str().expect("id");
    let expected = format!("Patient/{patient_id}");
    for entry in &doc["entry"].as_array().expect("entries")[1..] {
        assert_eq!(
            entry["resource"]["subject"]["reference"],
            expected.as_str(),
            "subject reference mismatch"
        );
    }
}

#[test]
fn caller_supplied_patient_id_flows_through_every_reference() {
    let mut p = patient();
    p["id"] = json!("patient-123");
    let doc = process(json!({
        "patient": p,
        "diagnosen": [{"icd10": "I10"}]
    }))
    .expect("process");

    assert_eq!(doc["entry"][0]["resource"]["id"], "patient-123");
    assert_eq!(
        doc["entry"][1]["resource"]["subject"]["reference"],
        "Patient/patient-123"
    );
}
