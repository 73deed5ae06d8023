//! The validate → transform → persist entry point.

use fhir::Bundle;
use medex_uuid::{Clock, IdGenerator, SystemClock, UuidIds};
use serde_json::Value;

use crate::error::{CoreError, CoreResult};
use crate::store::BundleStore;
use crate::transform::{CreationError, Transformer};
use crate::validate::validate;

/// The single synchronous operation exposed to the boundaries.
///
/// Each call is independent and stateless: the validator and transformer are
/// pure functions of the payload plus fresh-identifier/clock reads, so one
/// service instance can be shared across concurrent requests without locking.
/// The store is the only shared collaborator and manages its own durability.
pub struct TransformService<S> {
    store: S,
    ids: Box<dyn IdGenerator>,
    clock: Box<dyn Clock>,
}

impl<S: BundleStore> TransformService<S> {
    /// Service with production capabilities (v4 UUIDs, system clock).
    pub fn new(store: S) -> Self {
        Self::with_capabilities(store, Box::new(UuidIds), Box::new(SystemClock))
    }

    /// Service with explicit capabilities, used by tests to pin ids and time.
    pub fn with_capabilities(
        store: S,
        ids: Box<dyn IdGenerator>,
        clock: Box<dyn Clock>,
    ) -> Self {
        Self { store, ids, clock }
    }

    /// Validate `payload`, transform it into a document bundle, persist the
    /// serialised document, and return the bundle.
    ///
    /// # Errors
    ///
    /// - [`CoreError::Validation`] when the payload violates input rules
    ///   (client error; the aggregate lists every violation).
    /// - [`CoreError::Creation`] on an unexpected assembly or serialisation
    ///   condition (server-side defect).
    /// - [`CoreError::Storage`] when the store could not durably write the
    ///   document; the computed bundle is not returned in that case so the
    ///   caller can distinguish "rejected" from "valid but not saved".
    pub fn process(&self, payload: &Value) -> CoreResult<Bundle> {
        let now = self.clock.now();

        let request = match validate(payload, now) {
            Ok(request) => request,
            Err(failure) => {
                tracing::warn!(violations = failure.violations.len(), "input validation failed");
                return Err(CoreError::Validation(failure));
            }
        };

        let transformer = Transformer::new(self.ids.as_ref(), self.clock.as_ref());
        let bundle = match transformer.transform(&request) {
            Ok(bundle) => bundle,
            Err(err) => {
                tracing::error!(error = %err, "document creation failed");
                return Err(CoreError::Creation(err));
            }
        };

        let document = bundle
            .to_json()
            .map_err(|err| CoreError::Creation(CreationError(format!(
                "failed to serialise bundle: {err}"
            ))))?;

        if let Err(err) = self.store.save(&bundle.id, &document, &bundle.timestamp) {
            tracing::error!(bundle_id = %bundle.id, error = %err, "bundle storage failed");
            return Err(CoreError::Storage(err));
        }

        tracing::info!(
            bundle_id = %bundle.id,
            entries = bundle.entry.len(),
            "bundle created and stored"
        );
        Ok(bundle)
    }
}
