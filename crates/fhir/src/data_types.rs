//! Shared FHIR data types.
//!
//! Wire representations of the FHIR data types reused across the resource
//! models: coded concepts, human names, quantities, ranges and references.
//! Only the fields Medex emits are modelled.

use serde::{Deserialize, Serialize};

/// A single coding: a code taken from a named coding system.
///
/// `display` is the human-readable label supplied with the entry and is
/// omitted from the wire form when absent.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct Coding {
    pub system: String,

    pub code: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub display: Option<String>,
}

/// A concept classified under one or more coding systems.
///
/// Medex always fills `text` (the entry description, falling back to the bare
/// code), so downstream consumers can render the concept even when they do
/// not know the coding system.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct CodeableConcept {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub coding: Vec<Coding>,

    pub text: String,
}

impl CodeableConcept {
    /// A concept carrying one coding from `system`, with `text` falling back
    /// to the code itself when no description is supplied.
    pub fn coded(system: &str, code: &str, display: Option<&str>) -> Self {
        Self {
            coding: vec![Coding {
                system: system.to_owned(),
                code: code.to_owned(),
                display: display.map(str::to_owned),
            }],
            text: display.unwrap_or(code).to_owned(),
        }
    }

    /// A free-text concept with no coding (used for clinical status and
    /// observation categories).
    pub fn text_only(text: &str) -> Self {
        Self {
            coding: Vec::new(),
            text: text.to_owned(),
        }
    }
}

/// A human name as a (family, given names) pair.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
pub struct HumanName {
    pub family: String,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub given: Vec<String>,
}

/// A literal reference to another resource, e.g. `Patient/pat-…`.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
pub struct Reference {
    pub reference: String,
}

impl Reference {
    /// Reference to the Patient resource with the given identifier.
    pub fn to_patient(patient_id: &str) -> Self {
        Self {
            reference: format!("Patient/{patient_id}"),
        }
    }
}

/// A measured amount: numeric value plus unit string.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct Quantity {
    pub value: f64,
    pub unit: String,
}

/// A reference range with optional low/high bounds.
///
/// A bound that was not supplied is omitted from the wire form entirely; a
/// range with neither bound is never emitted (the owning field is dropped
/// instead).
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
pub struct ReferenceRange {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub low: Option<Quantity>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub high: Option<Quantity>,
}

/// Resource metadata; Medex only emits the profile list.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
pub struct Meta {
    pub profile: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn coded_concept_uses_display_as_text() {
        let concept = CodeableConcept::coded("http://loinc.org", "2345-7", Some("Glucose"));
        assert_eq!(concept.coding.len(), 1);
        assert_eq!(concept.coding[0].code, "2345-7");
        assert_eq!(concept.coding[0].display.as_deref(), Some("Glucose"));
        assert_eq!(concept.text, "Glucose");
    }

    #[test]
    fn coded_concept_falls_back_to_code() {
        let concept = CodeableConcept::coded("http://hl7.org/fhir/sid/icd-10", "J06.9", None);
        assert_eq!(concept.text, "J06.9");
        assert!(concept.coding[0].display.is_none());

        let json = serde_json::to_value(&concept).expect("serialise");
        assert!(json["coding"][0].get("display").is_none());
    }

    #[test]
    fn text_only_concept_omits_coding() {
        let concept = CodeableConcept::text_only("laboratory");
        let json = serde_json::to_value(&concept).expect("serialise");
        assert!(json.get("coding").is_none());
        assert_eq!(json["text"], "laboratory");
    }

    #[test]
    fn reference_range_omits_missing_bounds() {
        let range = ReferenceRange {
            low: Some(Quantity {
                value: 3.5,
                unit: "mmol/L".into(),
            }),
            high: None,
        };
        let json = serde_json::to_value(&range).expect("serialise");
        assert_eq!(json["low"]["value"], 3.5);
        assert!(json.get("high").is_none());
    }

    #[test]
    fn patient_reference_format() {
        let reference = Reference::to_patient("pat-123");
        assert_eq!(reference.reference, "Patient/pat-123");
    }
}
