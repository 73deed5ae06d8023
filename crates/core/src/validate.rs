//! Aggregate input validation.
//!
//! This module turns the untyped request payload (a `serde_json::Value`) into
//! a fully-typed [`TransformRequest`], or a [`ValidationFailure`] enumerating
//! **every** violated field. Field validators are pure functions that record
//! violations into a shared collector instead of raising on the first error,
//! so a failure in one list entry never blocks validation of its siblings.
//!
//! "Now" is an argument, not an ambient read: date comparisons are relative
//! to validator invocation time supplied by the caller's clock capability.

use chrono::{DateTime, Months, NaiveDate, NaiveDateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::sync::LazyLock;

use crate::encounter::{
    ClinicalStatus, DiagnosisEntry, LabResultEntry, ProcedureEntry, Sex, Subject, TransformRequest,
};

/// Maximum accepted length for person names, counted after trimming.
const MAX_NAME_CHARS: usize = 100;

/// Oldest accepted subject age in years.
const MAX_SUBJECT_AGE_YEARS: u32 = 150;

// Syntactic shape only; codes are not checked against a terminology service.
static ICD10_SHAPE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Z][0-9]{2,3}(\.[0-9]+)?$").expect("valid pattern"));
static OPS_SHAPE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9]{1,2}-[0-9]{2,3}(\.[0-9A-Z]+)?$").expect("valid pattern"));
static LOINC_SHAPE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9]{4,5}-[0-9]$").expect("valid pattern"));

/// Machine-readable classification of a single violation.
#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ViolationKind {
    MissingField,
    WrongType,
    Empty,
    TooLong,
    BadFormat,
    NotAllowed,
    FutureDate,
    TooOld,
    RangeInvalid,
}

/// One violated field: where, what, and which rule.
#[derive(Clone, Debug, Deserialize, PartialEq, Eq, Serialize)]
pub struct Violation {
    /// Path into the input payload, e.g. `diagnosen[1].icd10`.
    pub path: String,

    /// Human-readable description of the violated rule.
    pub message: String,

    /// Machine-readable violation kind.
    pub kind: ViolationKind,
}

/// The aggregate failure: every violation found across the whole payload.
#[derive(Clone, Debug, Deserialize, PartialEq, Eq, Serialize, thiserror::Error)]
#[error("{} violation(s)", .violations.len())]
pub struct ValidationFailure {
    pub violations: Vec<Violation>,
}

impl ValidationFailure {
    /// True if any violation was recorded at `path`.
    pub fn has_path(&self, path: &str) -> bool {
        self.violations.iter().any(|v| v.path == path)
    }
}

#[derive(Default)]
struct Collector {
    violations: Vec<Violation>,
}

impl Collector {
    fn push(&mut self, path: impl Into<String>, kind: ViolationKind, message: impl fmt::Display) {
        self.violations.push(Violation {
            path: path.into(),
            message: message.to_string(),
            kind,
        });
    }
}

/// Validate the untyped payload into a [`TransformRequest`].
///
/// All fields and all list entries are checked independently; the returned
/// failure enumerates every violation found, not just the first. Validation
/// is a pure function of the payload and `now`.
///
/// # Errors
///
/// Returns a [`ValidationFailure`] when any field violates its rules.
pub fn validate(payload: &Value, now: DateTime<Utc>) -> Result<TransformRequest, ValidationFailure> {
    let mut out = Collector::default();

    let Some(root) = payload.as_object() else {
        out.push(
            "<root>",
            ViolationKind::WrongType,
            "request body must be a JSON object",
        );
        return Err(ValidationFailure {
            violations: out.violations,
        });
    };

    let subject = match root.get("patient") {
        None | Some(Value::Null) => {
            out.push("patient", ViolationKind::MissingField, "is required");
            None
        }
        Some(value) => validate_patient(value, now, &mut out),
    };

    let diagnoses = collect_entries(root, "diagnosen", &mut out, |value, path, out| {
        validate_diagnosis(value, path, now, out)
    });
    let procedures = collect_entries(root, "prozeduren", &mut out, |value, path, out| {
        validate_procedure(value, path, now, out)
    });
    let lab_results = collect_entries(root, "laborwerte", &mut out, |value, path, out| {
        validate_lab_result(value, path, now, out)
    });

    if !out.violations.is_empty() {
        return Err(ValidationFailure {
            violations: out.violations,
        });
    }

    // An empty collector means every field above validated, so the subject is
    // necessarily present.
    let subject = subject.expect("no violations implies a validated subject");
    Ok(TransformRequest {
        subject,
        diagnoses,
        procedures,
        lab_results,
    })
}

fn collect_entries<T>(
    root: &Map<String, Value>,
    field: &str,
    out: &mut Collector,
    mut validate_entry: impl FnMut(&Value, &str, &mut Collector) -> Option<T>,
) -> Vec<T> {
    match root.get(field) {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::Array(items)) => {
            let mut entries = Vec::with_capacity(items.len());
            for (idx, item) in items.iter().enumerate() {
                let path = format!("{field}[{idx}]");
                if let Some(entry) = validate_entry(item, &path, out) {
                    entries.push(entry);
                }
            }
            entries
        }
        Some(_) => {
            out.push(field, ViolationKind::WrongType, "must be an array");
            Vec::new()
        }
    }
}

fn validate_patient(value: &Value, now: DateTime<Utc>, out: &mut Collector) -> Option<Subject> {
    let Some(obj) = value.as_object() else {
        out.push("patient", ViolationKind::WrongType, "must be an object");
        return None;
    };

    let mut id_ok = true;
    let id = match obj.get("id") {
        None | Some(Value::Null) => None,
        Some(Value::String(raw)) => {
            let trimmed = raw.trim();
            if trimmed.is_empty() {
                out.push(
                    "patient.id",
                    ViolationKind::Empty,
                    "must not be empty when supplied",
                );
                id_ok = false;
                None
            } else {
                Some(trimmed.to_owned())
            }
        }
        Some(_) => {
            out.push("patient.id", ViolationKind::WrongType, "must be a string");
            id_ok = false;
            None
        }
    };

    let given = required_str(obj, "patient", "vorname", out)
        .and_then(|raw| person_name(raw, "patient.vorname", out));
    let family = required_str(obj, "patient", "nachname", out)
        .and_then(|raw| person_name(raw, "patient.nachname", out));

    let birth_date = required_str(obj, "patient", "geburtsdatum", out)
        .and_then(|raw| calendar_date(raw, "patient.geburtsdatum", out))
        .and_then(|date| {
            let today = now.date_naive();
            if date > today {
                out.push(
                    "patient.geburtsdatum",
                    ViolationKind::FutureDate,
                    "must not lie in the future",
                );
                return None;
            }
            let oldest = today
                .checked_sub_months(Months::new(MAX_SUBJECT_AGE_YEARS * 12))
                .unwrap_or(NaiveDate::MIN);
            if date < oldest {
                out.push(
                    "patient.geburtsdatum",
                    ViolationKind::TooOld,
                    format!("lies more than {MAX_SUBJECT_AGE_YEARS} years in the past"),
                );
                return None;
            }
            Some(date)
        });

    let sex = required_str(obj, "patient", "geschlecht", out).and_then(|raw| {
        let trimmed = raw.trim();
        match Sex::parse(trimmed) {
            Some(sex) => Some(sex),
            None => {
                out.push(
                    "patient.geschlecht",
                    ViolationKind::NotAllowed,
                    "must be one of: male, female, other, unknown",
                );
                None
            }
        }
    });

    match (given, family, birth_date, sex) {
        (Some(given_name), Some(family_name), Some(birth_date), Some(sex)) if id_ok => {
            Some(Subject {
                id,
                given_name,
                family_name,
                birth_date,
                sex,
            })
        }
        _ => None,
    }
}

fn validate_diagnosis(
    value: &Value,
    prefix: &str,
    now: DateTime<Utc>,
    out: &mut Collector,
) -> Option<DiagnosisEntry> {
    let Some(obj) = value.as_object() else {
        out.push(prefix, ViolationKind::WrongType, "must be an object");
        return None;
    };

    let code = required_str(obj, prefix, "icd10", out).and_then(|raw| {
        let path = format!("{prefix}.icd10");
        let code = raw.trim().to_uppercase();
        if code.is_empty() {
            out.push(path, ViolationKind::Empty, "must not be empty");
            None
        } else if !ICD10_SHAPE.is_match(&code) {
            out.push(path, ViolationKind::BadFormat, "is not a valid ICD-10 code");
            None
        } else {
            Some(code)
        }
    });

    let description = optional_description(obj, prefix, out);
    let onset = optional_past_date(obj, prefix, "begonnen_am", now, out);
    let status = clinical_status(obj, prefix, out);

    match (code, onset, status) {
        (Some(code), Some(onset), Some(status)) => Some(DiagnosisEntry {
            code,
            description,
            onset,
            status,
        }),
        _ => None,
    }
}

fn validate_procedure(
    value: &Value,
    prefix: &str,
    now: DateTime<Utc>,
    out: &mut Collector,
) -> Option<ProcedureEntry> {
    let Some(obj) = value.as_object() else {
        out.push(prefix, ViolationKind::WrongType, "must be an object");
        return None;
    };

    let code = required_str(obj, prefix, "ops", out).and_then(|raw| {
        let path = format!("{prefix}.ops");
        let code = raw.trim().to_uppercase();
        if code.is_empty() {
            out.push(path, ViolationKind::Empty, "must not be empty");
            None
        } else if !OPS_SHAPE.is_match(&code) {
            out.push(path, ViolationKind::BadFormat, "is not a valid OPS code");
            None
        } else {
            Some(code)
        }
    });

    let description = optional_description(obj, prefix, out);
    let performed = optional_past_date(obj, prefix, "datum", now, out);

    match (code, performed) {
        (Some(code), Some(performed)) => Some(ProcedureEntry {
            code,
            description,
            performed,
        }),
        _ => None,
    }
}

fn validate_lab_result(
    value: &Value,
    prefix: &str,
    now: DateTime<Utc>,
    out: &mut Collector,
) -> Option<LabResultEntry> {
    let Some(obj) = value.as_object() else {
        out.push(prefix, ViolationKind::WrongType, "must be an object");
        return None;
    };

    // LOINC codes are numeric: trimmed, but deliberately not case-normalised.
    let code = required_str(obj, prefix, "loinc", out).and_then(|raw| {
        let path = format!("{prefix}.loinc");
        let code = raw.trim().to_owned();
        if code.is_empty() {
            out.push(path, ViolationKind::Empty, "must not be empty");
            None
        } else if !LOINC_SHAPE.is_match(&code) {
            out.push(path, ViolationKind::BadFormat, "is not a valid LOINC code");
            None
        } else {
            Some(code)
        }
    });

    let value_field = required_number(obj, prefix, "wert", out);

    let unit = required_str(obj, prefix, "einheit", out).and_then(|raw| {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            out.push(
                format!("{prefix}.einheit"),
                ViolationKind::Empty,
                "must not be empty",
            );
            None
        } else {
            Some(trimmed.to_owned())
        }
    });

    // Absent measurement time defaults to "now" at validation.
    let measured_at = match obj.get("gemessen_am") {
        None | Some(Value::Null) => Some(now),
        Some(Value::String(raw)) => {
            let path = format!("{prefix}.gemessen_am");
            timestamp(raw, &path, out).and_then(|at| {
                if at > now {
                    out.push(path, ViolationKind::FutureDate, "must not lie in the future");
                    None
                } else {
                    Some(at)
                }
            })
        }
        Some(_) => {
            out.push(
                format!("{prefix}.gemessen_am"),
                ViolationKind::WrongType,
                "must be a string",
            );
            None
        }
    };

    let reference_low = optional_number(obj, prefix, "referenz_min", out);
    let reference_high = optional_number(obj, prefix, "referenz_max", out);

    // Cross-field rule: only constrained when both bounds are supplied.
    let mut range_ok = true;
    if let (Some(low), Some(high)) = (reference_low, reference_high) {
        if high <= low {
            out.push(
                format!("{prefix}.referenz_max"),
                ViolationKind::RangeInvalid,
                "reference maximum must exceed reference minimum",
            );
            range_ok = false;
        }
    }

    let description = optional_description(obj, prefix, out);

    match (code, value_field, unit, measured_at) {
        (Some(code), Some(value), Some(unit), Some(measured_at)) if range_ok => {
            Some(LabResultEntry {
                code,
                value,
                unit,
                measured_at,
                reference_low,
                reference_high,
                description,
            })
        }
        _ => None,
    }
}

// ---------------------------------------------------------------------------
// Scalar field helpers
// ---------------------------------------------------------------------------

fn field_path(prefix: &str, field: &str) -> String {
    format!("{prefix}.{field}")
}

fn required_str<'a>(
    obj: &'a Map<String, Value>,
    prefix: &str,
    field: &str,
    out: &mut Collector,
) -> Option<&'a str> {
    match obj.get(field) {
        None | Some(Value::Null) => {
            out.push(
                field_path(prefix, field),
                ViolationKind::MissingField,
                "is required",
            );
            None
        }
        Some(Value::String(raw)) => Some(raw),
        Some(_) => {
            out.push(
                field_path(prefix, field),
                ViolationKind::WrongType,
                "must be a string",
            );
            None
        }
    }
}

fn optional_str<'a>(
    obj: &'a Map<String, Value>,
    prefix: &str,
    field: &str,
    out: &mut Collector,
) -> Option<&'a str> {
    match obj.get(field) {
        None | Some(Value::Null) => None,
        Some(Value::String(raw)) => Some(raw),
        Some(_) => {
            out.push(
                field_path(prefix, field),
                ViolationKind::WrongType,
                "must be a string",
            );
            None
        }
    }
}

fn required_number(
    obj: &Map<String, Value>,
    prefix: &str,
    field: &str,
    out: &mut Collector,
) -> Option<f64> {
    match obj.get(field) {
        None | Some(Value::Null) => {
            out.push(
                field_path(prefix, field),
                ViolationKind::MissingField,
                "is required",
            );
            None
        }
        Some(Value::Number(n)) => n.as_f64(),
        Some(_) => {
            out.push(
                field_path(prefix, field),
                ViolationKind::WrongType,
                "must be a number",
            );
            None
        }
    }
}

fn optional_number(
    obj: &Map<String, Value>,
    prefix: &str,
    field: &str,
    out: &mut Collector,
) -> Option<f64> {
    match obj.get(field) {
        None | Some(Value::Null) => None,
        Some(Value::Number(n)) => n.as_f64(),
        Some(_) => {
            out.push(
                field_path(prefix, field),
                ViolationKind::WrongType,
                "must be a number",
            );
            None
        }
    }
}

fn person_name(raw: &str, path: &str, out: &mut Collector) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        out.push(path, ViolationKind::Empty, "must not be empty");
        return None;
    }
    if trimmed.chars().count() > MAX_NAME_CHARS {
        out.push(
            path,
            ViolationKind::TooLong,
            format!("exceeds maximum length of {MAX_NAME_CHARS} characters"),
        );
        return None;
    }
    Some(trimmed.to_owned())
}

fn calendar_date(raw: &str, path: &str, out: &mut Collector) -> Option<NaiveDate> {
    match NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d") {
        Ok(date) => Some(date),
        Err(_) => {
            out.push(
                path,
                ViolationKind::BadFormat,
                "is not a valid calendar date (expected YYYY-MM-DD)",
            );
            None
        }
    }
}

/// Timestamps are accepted as RFC 3339 or as a naive `YYYY-MM-DDTHH:MM:SS[.f]`
/// read as UTC.
fn timestamp(raw: &str, path: &str, out: &mut Collector) -> Option<DateTime<Utc>> {
    let trimmed = raw.trim();
    if let Ok(at) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(at.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(DateTime::from_naive_utc_and_offset(naive, Utc));
    }
    out.push(
        path,
        ViolationKind::BadFormat,
        "is not a valid timestamp (expected RFC 3339 or YYYY-MM-DDTHH:MM:SS)",
    );
    None
}

/// Optional `beschreibung` field; a value that trims to nothing is treated as
/// absent rather than rejected.
fn optional_description(
    obj: &Map<String, Value>,
    prefix: &str,
    out: &mut Collector,
) -> Option<String> {
    optional_str(obj, prefix, "beschreibung", out).and_then(|raw| {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_owned())
        }
    })
}

/// Optional date field that must not lie in the future.
///
/// The outer `Option` distinguishes "field invalid" (`None`) from "field valid
/// or absent" (`Some(inner)`), so callers can aggregate without conflating the
/// two.
fn optional_past_date(
    obj: &Map<String, Value>,
    prefix: &str,
    field: &str,
    now: DateTime<Utc>,
    out: &mut Collector,
) -> Option<Option<NaiveDate>> {
    match obj.get(field) {
        None | Some(Value::Null) => Some(None),
        Some(Value::String(raw)) => {
            let path = field_path(prefix, field);
            match calendar_date(raw, &path, out) {
                Some(date) if date > now.date_naive() => {
                    out.push(path, ViolationKind::FutureDate, "must not lie in the future");
                    None
                }
                Some(date) => Some(Some(date)),
                None => None,
            }
        }
        Some(_) => {
            out.push(
                field_path(prefix, field),
                ViolationKind::WrongType,
                "must be a string",
            );
            None
        }
    }
}

/// Optional `klinischer_status`, defaulting to `active`.
fn clinical_status(
    obj: &Map<String, Value>,
    prefix: &str,
    out: &mut Collector,
) -> Option<ClinicalStatus> {
    match obj.get("klinischer_status") {
        None | Some(Value::Null) => Some(ClinicalStatus::default()),
        Some(Value::String(raw)) => {
            let trimmed = raw.trim();
            match ClinicalStatus::parse(trimmed) {
                Some(status) => Some(status),
                None => {
                    out.push(
                        field_path(prefix, "klinischer_status"),
                        ViolationKind::NotAllowed,
                        "must be one of: active, remission, resolved, inactive",
                    );
                    None
                }
            }
        }
        Some(_) => {
            out.push(
                field_path(prefix, "klinischer_status"),
                ViolationKind::WrongType,
                "must be a string",
            );
            None
        }
    }
}
