//! # Medex Core
//!
//! Core business logic for the Medex encounter-to-FHIR transformer.
//!
//! This crate contains the validation-and-transformation pipeline:
//! - [`validate`]: aggregate input validation of the untyped request payload
//!   into a typed [`TransformRequest`]
//! - [`Transformer`]: deterministic assembly of a FHIR document bundle from a
//!   validated request
//! - [`BundleStore`]: the opaque persistence seam, with file-backed and
//!   in-memory implementations
//! - [`TransformService`]: the single synchronous validate → transform →
//!   persist entry point consumed by the HTTP and CLI boundaries
//!
//! **No API concerns**: HTTP routing, status-code mapping and OpenAPI
//! documentation belong in `api-rest`.

pub mod config;
pub mod encounter;
pub mod error;
pub mod service;
pub mod store;
pub mod transform;
pub mod validate;

pub use config::{ConfigError, CoreConfig};
pub use encounter::{
    ClinicalStatus, DiagnosisEntry, LabResultEntry, ProcedureEntry, Sex, Subject, TransformRequest,
};
pub use error::{CoreError, CoreResult};
pub use service::TransformService;
pub use store::{BundleStore, FileStore, MemoryStore, StoreError, StoredRow};
pub use transform::{CreationError, Transformer};
pub use validate::{validate, ValidationFailure, Violation, ViolationKind};
