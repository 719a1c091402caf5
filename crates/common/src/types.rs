use serde::{Deserialize, Serialize};

/// A catalog entry.
///
/// `id` and `version` may be absent on inbound requests; they default to the
/// empty string and are filled in when an event is built.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Product {
    #[serde(default)]
    pub id: String,

    pub name: String,

    #[serde(rename = "type")]
    pub product_type: String,

    #[serde(default)]
    pub version: String,
}

impl Product {
    /// Creates a product from its four attributes.
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        product_type: impl Into<String>,
        version: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            product_type: product_type.into(),
            version: version.into(),
        }
    }

    /// Returns the same product with a different identifier.
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    /// Returns the same product with a different version string.
    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    /// True when the product has no identifier yet.
    pub fn has_empty_id(&self) -> bool {
        self.id.is_empty()
    }
}
