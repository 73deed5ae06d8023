//! The document bundle: the single container returned per request.

use serde::{Deserialize, Serialize};

use crate::resources::Resource;
use crate::{FhirError, FhirResult};

/// A `Bundle` of type `collection`: a flat, unordered aggregation with no
/// processing semantics attached to entry order beyond display order.
///
/// Field declaration order is the wire key order: `resourceType`, `id`,
/// `type`, `timestamp`, `entry`.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct Bundle {
    #[serde(rename = "resourceType")]
    resource_type: String,

    pub id: String,

    #[serde(rename = "type")]
    pub kind: String,

    pub timestamp: String,

    pub entry: Vec<BundleEntry>,
}

/// Wrapper envelope around each bundled resource.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct BundleEntry {
    pub resource: Resource,
}

impl Bundle {
    /// Assemble a collection bundle from already-ordered resources.
    pub fn collection(id: String, timestamp: String, resources: Vec<Resource>) -> Self {
        Self {
            resource_type: "Bundle".to_owned(),
            id,
            kind: "collection".to_owned(),
            timestamp,
            entry: resources
                .into_iter()
                .map(|resource| BundleEntry { resource })
                .collect(),
        }
    }

    /// Serialise the bundle to its JSON wire form.
    ///
    /// # Errors
    ///
    /// Returns [`FhirError::InvalidJson`] if serialisation fails.
    pub fn to_json(&self) -> FhirResult<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Parse a bundle from JSON text, verifying the `resourceType`
    /// discriminator.
    ///
    /// # Errors
    ///
    /// Returns [`FhirError::InvalidJson`] if the text is not valid JSON for
    /// the bundle shape, or [`FhirError::InvalidInput`] if `resourceType` is
    /// not `"Bundle"`.
    pub fn from_json(json: &str) -> FhirResult<Self> {
        let bundle: Bundle = serde_json::from_str(json)?;
        if bundle.resource_type != "Bundle" {
            return Err(FhirError::InvalidInput(format!(
                "Expected resourceType 'Bundle', got '{}'",
                bundle.resource_type
            )));
        }
        Ok(bundle)
    }
}
