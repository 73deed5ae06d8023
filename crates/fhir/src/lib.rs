//! FHIR wire models for Medex.
//!
//! This crate provides **wire models** for the FHIR R4 resources Medex emits:
//! `Bundle`, `Patient`, `Condition`, `Procedure` and `Observation`, together
//! with the shared data types they are built from (`Coding`,
//! `CodeableConcept`, `Quantity`, …).
//!
//! This crate focuses on:
//! - FHIR semantic alignment (without FHIR REST transport)
//! - serialisation/deserialisation of the JSON wire form
//! - nothing else: clinical meaning and document assembly live in `medex-core`
//!
//! The structs serialise to exactly the shape consumed by downstream FHIR
//! tooling: camelCase field names, optional fields omitted entirely rather
//! than emitted as `null`, and each resource carrying its own `resourceType`
//! discriminator.

pub mod bundle;
pub mod data_types;
pub mod resources;

// Re-export facades
pub use bundle::{Bundle, BundleEntry};
pub use data_types::{CodeableConcept, Coding, HumanName, Meta, Quantity, Reference, ReferenceRange};
pub use resources::{Condition, Observation, Patient, Procedure, Resource};

/// ICD-10 coding system URI (diagnoses).
pub const SYSTEM_ICD10: &str = "http://hl7.org/fhir/sid/icd-10";

/// OPS coding system URI (procedures; the German operation/procedure catalogue).
pub const SYSTEM_OPS: &str = "http://fhir.de/CodeSystem/dimdi/ops";

/// LOINC coding system URI (laboratory results).
pub const SYSTEM_LOINC: &str = "http://loinc.org";

/// Structure definition tagged onto every emitted Patient resource.
pub const PROFILE_PATIENT: &str = "http://hl7.org/fhir/StructureDefinition/Patient";

/// Errors returned by the `fhir` boundary crate.
#[derive(Debug, thiserror::Error)]
pub enum FhirError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("invalid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),
}

/// Type alias for Results that can fail with a [`FhirError`].
pub type FhirResult<T> = Result<T, FhirError>;
