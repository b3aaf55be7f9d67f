//! Core types shared by the model, the reader and the capability engine.

use std::fmt;

use serde::Serialize;
use serde_json::Value;

/// Conventional retrieval key of the primary metadata document.
pub const METADATA_KEY: &str = "$metadata";

/// Namespace of the built-in primitive types.
pub const EDM_NAMESPACE: &str = "Edm";

/// Returns the JSON type name for error messages.
pub fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Handle of a type registered in a [`crate::Model`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct TypeId(pub(crate) usize);

impl TypeId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// Handle of a property registered in a [`crate::Model`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct PropertyId(pub(crate) usize);

impl PropertyId {
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for PropertyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Kind tag carried by class types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ClassKind {
    Entity,
    Complex,
    Enum,
    /// The entity container: root of the generated client surface.
    Service,
}

/// Protocol generation of the described service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
pub enum ServiceType {
    #[serde(rename = "odata-v3")]
    ODataV3,
    #[default]
    #[serde(rename = "odata-v4")]
    ODataV4,
}

impl ServiceType {
    /// Whether services of this generation carry capability vocabulary annotations.
    pub fn supports_capabilities(&self) -> bool {
        matches!(self, ServiceType::ODataV4)
    }
}

/// How a model with more than one Service class is treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ContainerPolicy {
    /// The first Service class in namespace-then-declaration order wins.
    #[default]
    First,
    /// More than one Service class is a data-consistency error.
    Unique,
}

/// Raw metadata documents of a service, keyed by retrieval identifier.
///
/// Keeps insertion order; inserting an existing key replaces its text in place.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ServiceMetadata {
    entries: Vec<(String, String)>,
}

impl ServiceMetadata {
    pub fn new() -> Self {
        Self::default()
    }

    /// Metadata holding a single primary document under [`METADATA_KEY`].
    pub fn primary(document: impl Into<String>) -> Self {
        let mut metadata = Self::new();
        metadata.insert(METADATA_KEY, document);
        metadata
    }

    pub fn insert(&mut self, key: impl Into<String>, document: impl Into<String>) {
        let key = key.into();
        let document = document.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = document,
            None => self.entries.push((key, document)),
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for ServiceMetadata {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut metadata = Self::new();
        for (key, document) in iter {
            metadata.insert(key, document);
        }
        metadata
    }
}

/// Options for reading service metadata into a model.
#[derive(Debug, Clone)]
pub struct ReadOptions {
    /// Protocol generation of the service.
    pub service_type: ServiceType,
    /// Treatment of models with several entity containers.
    pub container_policy: ContainerPolicy,
    /// Run the capability engine over every entity set.
    /// Ignored for services that do not support capability annotations.
    pub resolve_capabilities: bool,
    /// Validate the document structure before reading it.
    pub validate: bool,
}

impl Default for ReadOptions {
    fn default() -> Self {
        Self::new(ServiceType::default())
    }
}

impl ReadOptions {
    /// Create read options with capability resolution and validation enabled.
    pub fn new(service_type: ServiceType) -> Self {
        Self {
            service_type,
            container_policy: ContainerPolicy::First,
            resolve_capabilities: true,
            validate: true,
        }
    }

    pub fn container_policy(mut self, policy: ContainerPolicy) -> Self {
        self.container_policy = policy;
        self
    }

    pub fn resolve_capabilities(mut self, resolve: bool) -> Self {
        self.resolve_capabilities = resolve;
        self
    }

    pub fn validate(mut self, validate: bool) -> Self {
        self.validate = validate;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn service_metadata_keeps_insertion_order() {
        let mut metadata = ServiceMetadata::new();
        metadata.insert("$metadata", "{}");
        metadata.insert("vocabulary", "[]");
        metadata.insert("$metadata", "{\"$Version\":\"4.0\"}");

        let keys: Vec<&str> = metadata.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["$metadata", "vocabulary"]);
        assert_eq!(metadata.get("$metadata"), Some("{\"$Version\":\"4.0\"}"));
        assert_eq!(metadata.len(), 2);
    }

    #[test]
    fn service_metadata_primary() {
        let metadata = ServiceMetadata::primary("doc");
        assert_eq!(metadata.get(METADATA_KEY), Some("doc"));
        assert_eq!(metadata.get("other"), None);
    }

    #[test]
    fn only_v4_supports_capabilities() {
        assert!(ServiceType::ODataV4.supports_capabilities());
        assert!(!ServiceType::ODataV3.supports_capabilities());
    }

    #[test]
    fn read_options_builder() {
        let opts = ReadOptions::new(ServiceType::ODataV3)
            .container_policy(ContainerPolicy::Unique)
            .resolve_capabilities(false)
            .validate(false);
        assert_eq!(opts.service_type, ServiceType::ODataV3);
        assert_eq!(opts.container_policy, ContainerPolicy::Unique);
        assert!(!opts.resolve_capabilities);
        assert!(!opts.validate);

        let opts = ReadOptions::default();
        assert_eq!(opts.service_type, ServiceType::ODataV4);
        assert!(opts.resolve_capabilities);
    }
}
