//! Deterministic bundle assembly.
//!
//! The transformer maps a validated [`TransformRequest`] into a FHIR
//! [`Bundle`]: one Patient record plus one Condition/Procedure/Observation
//! per input entry, every clinical record carrying the same subject
//! reference, assembled in input order into a single timestamped collection.
//!
//! Identifier generation and clock reads go through the capabilities handed
//! to [`Transformer::new`]; with those pinned, the output is fully
//! determined by the input.

use fhir::{
    Bundle, CodeableConcept, Condition, HumanName, Meta, Observation, Patient, Procedure,
    Quantity, Reference, ReferenceRange, Resource, PROFILE_PATIENT, SYSTEM_ICD10, SYSTEM_LOINC,
    SYSTEM_OPS,
};
use medex_uuid::{Clock, IdGenerator};

use crate::encounter::{DiagnosisEntry, LabResultEntry, ProcedureEntry, TransformRequest};

/// Unexpected condition during document assembly.
///
/// The transformer only receives pre-validated input, so this error is not
/// part of the primary path; the boundary treats it as a server-side defect,
/// never a user error.
#[derive(Debug, thiserror::Error)]
#[error("{0}")]
pub struct CreationError(pub String);

/// Assembles document bundles from validated requests.
pub struct Transformer<'a> {
    ids: &'a dyn IdGenerator,
    clock: &'a dyn Clock,
}

impl<'a> Transformer<'a> {
    pub fn new(ids: &'a dyn IdGenerator, clock: &'a dyn Clock) -> Self {
        Self { ids, clock }
    }

    /// Build the document bundle for `request`.
    ///
    /// Entry order is subject first, then diagnoses, procedures and lab
    /// results, each group preserving input order.
    ///
    /// # Errors
    ///
    /// Returns [`CreationError`] only on an unexpected assembly condition;
    /// validated input does not reach this path.
    pub fn transform(&self, request: &TransformRequest) -> Result<Bundle, CreationError> {
        let subject = &request.subject;

        let patient_id = match &subject.id {
            Some(id) => id.clone(),
            None => format!("pat-{}", self.ids.next_id()),
        };
        if patient_id.trim().is_empty() {
            // Guarded by validation; a blank id here would corrupt every
            // subject reference in the bundle.
            return Err(CreationError("subject identifier is blank".into()));
        }

        let patient = Patient {
            id: patient_id.clone(),
            name: vec![HumanName {
                family: subject.family_name.clone(),
                given: vec![subject.given_name.clone()],
            }],
            gender: subject.sex.as_str().to_owned(),
            birth_date: subject.birth_date.format("%Y-%m-%d").to_string(),
            meta: Meta {
                profile: vec![PROFILE_PATIENT.to_owned()],
            },
        };

        let subject_ref = Reference::to_patient(&patient_id);

        let mut resources = Vec::with_capacity(
            1 + request.diagnoses.len() + request.procedures.len() + request.lab_results.len(),
        );
        resources.push(Resource::Patient(patient));
        for diagnosis in &request.diagnoses {
            resources.push(Resource::Condition(self.condition(diagnosis, &subject_ref)));
        }
        for procedure in &request.procedures {
            resources.push(Resource::Procedure(self.procedure(procedure, &subject_ref)));
        }
        for lab in &request.lab_results {
            resources.push(Resource::Observation(self.observation(lab, &subject_ref)));
        }

        Ok(Bundle::collection(
            format!("bundle-{}", self.ids.next_id()),
            self.clock.now().to_rfc3339(),
            resources,
        ))
    }

    fn condition(&self, diagnosis: &DiagnosisEntry, subject_ref: &Reference) -> Condition {
        Condition {
            id: format!("cond-{}", self.ids.next_id()),
            subject: subject_ref.clone(),
            code: CodeableConcept::coded(
                SYSTEM_ICD10,
                &diagnosis.code,
                diagnosis.description.as_deref(),
            ),
            clinical_status: CodeableConcept::text_only(diagnosis.status.as_str()),
            onset_date_time: diagnosis
                .onset
                .map(|date| date.format("%Y-%m-%d").to_string()),
        }
    }

    fn procedure(&self, procedure: &ProcedureEntry, subject_ref: &Reference) -> Procedure {
        Procedure {
            id: format!("proc-{}", self.ids.next_id()),
            subject: subject_ref.clone(),
            code: CodeableConcept::coded(
                SYSTEM_OPS,
                &procedure.code,
                procedure.description.as_deref(),
            ),
            status: "completed".to_owned(),
            performed_date_time: procedure
                .performed
                .map(|date| date.format("%Y-%m-%d").to_string()),
        }
    }

    fn observation(&self, lab: &LabResultEntry, subject_ref: &Reference) -> Observation {
        let reference_range = if lab.reference_low.is_some() || lab.reference_high.is_some() {
            Some(vec![ReferenceRange {
                low: lab.reference_low.map(|value| Quantity {
                    value,
                    unit: lab.unit.clone(),
                }),
                high: lab.reference_high.map(|value| Quantity {
                    value,
                    unit: lab.unit.clone(),
                }),
            }])
        } else {
            None
        };

        Observation {
            id: format!("obs-{}", self.ids.next_id()),
            status: "final".to_owned(),
            category: vec![CodeableConcept::text_only("laboratory")],
            code: CodeableConcept::coded(SYSTEM_LOINC, &lab.code, lab.description.as_deref()),
            subject: subject_ref.clone(),
            effective_date_time: lab.measured_at.to_rfc3339(),
            value_quantity: Quantity {
                value: lab.value,
                unit: lab.unit.clone(),
            },
            reference_range,
        }
    }
}
