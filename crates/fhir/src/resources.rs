//! FHIR resource wire models.
//!
//! The four record kinds Medex produces share no behaviour beyond carrying an
//! identifier and appearing in a bundle entry, so they are modelled as a
//! closed variant set ([`Resource`]) rather than an inheritance-style
//! hierarchy. The enum is internally tagged on `resourceType`, which is
//! exactly the FHIR JSON discriminator.

use serde::{Deserialize, Serialize};

use crate::data_types::{CodeableConcept, HumanName, Meta, Quantity, Reference, ReferenceRange};

/// Any resource that can appear in a bundle entry.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
#[serde(tag = "resourceType")]
pub enum Resource {
    Patient(Patient),
    Condition(Condition),
    Procedure(Procedure),
    Observation(Observation),
}

impl Resource {
    /// The resource's own identifier.
    pub fn id(&self) -> &str {
        match self {
            Resource::Patient(r) => &r.id,
            Resource::Condition(r) => &r.id,
            Resource::Procedure(r) => &r.id,
            Resource::Observation(r) => &r.id,
        }
    }

    /// The wire discriminator, e.g. `"Patient"`.
    pub fn resource_type(&self) -> &'static str {
        match self {
            Resource::Patient(_) => "Patient",
            Resource::Condition(_) => "Condition",
            Resource::Procedure(_) => "Procedure",
            Resource::Observation(_) => "Observation",
        }
    }

    /// The subject reference carried by clinical resources; `None` for the
    /// Patient resource itself.
    pub fn subject(&self) -> Option<&Reference> {
        match self {
            Resource::Patient(_) => None,
            Resource::Condition(r) => Some(&r.subject),
            Resource::Procedure(r) => Some(&r.subject),
            Resource::Observation(r) => Some(&r.subject),
        }
    }
}

/// The subject record at the root of every bundle.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
pub struct Patient {
    pub id: String,

    pub name: Vec<HumanName>,

    pub gender: String,

    /// Calendar date, `YYYY-MM-DD`, no time component.
    #[serde(rename = "birthDate")]
    pub birth_date: String,

    pub meta: Meta,
}

/// A diagnosis, coded under ICD-10.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct Condition {
    pub id: String,

    pub subject: Reference,

    pub code: CodeableConcept,

    /// Free-text clinical status (`active`, `remission`, …).
    #[serde(rename = "clinicalStatus")]
    pub clinical_status: CodeableConcept,

    /// Onset date; omitted entirely when the entry carried none.
    #[serde(rename = "onsetDateTime", skip_serializing_if = "Option::is_none")]
    pub onset_date_time: Option<String>,
}

/// A performed procedure, coded under OPS.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct Procedure {
    pub id: String,

    pub subject: Reference,

    pub code: CodeableConcept,

    /// Always `"completed"`; the source data carries no other status.
    pub status: String,

    #[serde(rename = "performedDateTime", skip_serializing_if = "Option::is_none")]
    pub performed_date_time: Option<String>,
}

/// A laboratory result, coded under LOINC.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct Observation {
    pub id: String,

    pub status: String,

    pub category: Vec<CodeableConcept>,

    pub code: CodeableConcept,

    pub subject: Reference,

    /// Full measurement timestamp in round-trippable text form.
    #[serde(rename = "effectiveDateTime")]
    pub effective_date_time: String,

    #[serde(rename = "valueQuantity")]
    pub value_quantity: Quantity,

    /// At most one range, present only when at least one bound was supplied.
    #[serde(rename = "referenceRange", skip_serializing_if = "Option::is_none")]
    pub reference_range: Option<Vec<ReferenceRange>>,
}
