//! The validated domain model.
//!
//! These types exist only on the far side of [`crate::validate`]: every value
//! here already satisfies the input invariants (trimmed non-empty names,
//! shape-checked codes, no future dates). The transformer consumes them
//! without re-validating.

use chrono::{DateTime, NaiveDate, Utc};

/// Administrative sex of the subject.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Sex {
    Male,
    Female,
    Other,
    Unknown,
}

impl Sex {
    /// Wire form, matching the FHIR `gender` value set.
    pub fn as_str(self) -> &'static str {
        match self {
            Sex::Male => "male",
            Sex::Female => "female",
            Sex::Other => "other",
            Sex::Unknown => "unknown",
        }
    }

    /// Parse the wire form; `None` for anything outside the value set.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "male" => Some(Sex::Male),
            "female" => Some(Sex::Female),
            "other" => Some(Sex::Other),
            "unknown" => Some(Sex::Unknown),
            _ => None,
        }
    }
}

/// Clinical status of a diagnosis.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ClinicalStatus {
    #[default]
    Active,
    Remission,
    Resolved,
    Inactive,
}

impl ClinicalStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            ClinicalStatus::Active => "active",
            ClinicalStatus::Remission => "remission",
            ClinicalStatus::Resolved => "resolved",
            ClinicalStatus::Inactive => "inactive",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "active" => Some(ClinicalStatus::Active),
            "remission" => Some(ClinicalStatus::Remission),
            "resolved" => Some(ClinicalStatus::Resolved),
            "inactive" => Some(ClinicalStatus::Inactive),
            _ => None,
        }
    }
}

/// The patient the bundle is about.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Subject {
    /// Caller-supplied external identifier, used verbatim when present.
    pub id: Option<String>,
    pub given_name: String,
    pub family_name: String,
    pub birth_date: NaiveDate,
    pub sex: Sex,
}

/// A single diagnosis, ICD-10 coded.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DiagnosisEntry {
    /// Uppercased, shape-checked ICD-10 code.
    pub code: String,
    pub description: Option<String>,
    pub onset: Option<NaiveDate>,
    pub status: ClinicalStatus,
}

/// A single procedure, OPS coded.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProcedureEntry {
    /// Uppercased, shape-checked OPS code.
    pub code: String,
    pub description: Option<String>,
    pub performed: Option<NaiveDate>,
}

/// A single laboratory result, LOINC coded.
#[derive(Clone, Debug, PartialEq)]
pub struct LabResultEntry {
    /// Shape-checked LOINC code (not case-normalised; LOINC is numeric).
    pub code: String,
    pub value: f64,
    pub unit: String,
    pub measured_at: DateTime<Utc>,
    pub reference_low: Option<f64>,
    pub reference_high: Option<f64>,
    pub description: Option<String>,
}

/// A fully validated transformation request.
///
/// List order is preserved into the output bundle.
#[derive(Clone, Debug, PartialEq)]
pub struct TransformRequest {
    pub subject: Subject,
    pub diagnoses: Vec<DiagnosisEntry>,
    pub procedures: Vec<ProcedureEntry>,
    pub lab_results: Vec<LabResultEntry>,
}
