//! OCM Schema
//!
//! Compiles OData service metadata into an object code model (OCM): a registry
//! of namespaces, classes, primitives and operations, where every property
//! carries a projection of its value type enriched with capabilities.
//!
//! Capabilities come from restriction annotations of the
//! `Org.OData.Capabilities.V1` vocabulary on entity sets. Code writers use
//! them to decide which operations to generate for a property.
//!
//! # Example
//!
//! ```
//! use ocm_schema::{read_model_str, Capability, ReadOptions};
//!
//! let metadata = r#"{
//!     "$Version": "4.01",
//!     "$EntityContainer": "NS.Service",
//!     "NS": {
//!         "Item": {
//!             "$Kind": "EntityType",
//!             "Related": { "$Kind": "NavigationProperty", "$Type": "NS.Item" }
//!         },
//!         "Service": {
//!             "$Kind": "EntityContainer",
//!             "Items": {
//!                 "$Collection": true,
//!                 "$Type": "NS.Item",
//!                 "@Org.OData.Capabilities.V1.DeleteRestrictions": {
//!                     "Deletable": true,
//!                     "NonDeletableNavigationProperties": ["Related"]
//!                 }
//!             }
//!         }
//!     }
//! }"#;
//!
//! let model = read_model_str(metadata, &ReadOptions::default()).unwrap();
//! let service = model.entity_container().unwrap();
//! let items = model.find_property(service, "Items").unwrap();
//! let related = model.find_property(service, "Items.Related").unwrap();
//!
//! assert_eq!(
//!     model.property(items).unwrap().projection().capabilities(),
//!     &[Capability::Deletable(true)]
//! );
//! // Excluded navigation properties are never deletable
//! assert_eq!(
//!     model.property(related).unwrap().projection().capabilities(),
//!     &[Capability::Deletable(false)]
//! );
//! ```
//!
//! # Restriction terms
//!
//! | Term | Capability | Navigation exclusions |
//! |------|------------|-----------------------|
//! | `InsertRestrictions` | `Insertable` | `NonInsertableNavigationProperties` |
//! | `UpdateRestrictions` | `Updatable` | `NonUpdatableNavigationProperties` |
//! | `DeleteRestrictions` | `Deletable` | `NonDeletableNavigationProperties` |
//! | `ExpandRestrictions` | `Expandable` | `NonExpandableProperties` |
//!
//! Terms are consulted in that order for every entity set. Capabilities
//! accumulate per property and are never overwritten.

mod capabilities;
mod capability;
mod emit;
mod error;
mod loader;
mod metadata;
mod model;
mod projection;
mod reader;
mod types;
mod validator;
mod vocabulary;

pub use capabilities::CapabilityReader;
pub use capability::{
    Capability, CapabilityKind, CAPABILITIES_NAMESPACE, DELETE_RESTRICTIONS, EXPAND_RESTRICTIONS,
    INSERT_RESTRICTIONS, UPDATE_RESTRICTIONS,
};
pub use emit::{capability_summary, model_to_json, CapabilityEntry};
pub use error::{CapabilityError, ModelError, ReadError, SchemaError, ValidateError};
pub use loader::{is_url, load_metadata, load_metadata_auto, load_metadata_str};
pub use metadata::{
    Annotation, ContainerMember, CsdlDocument, EntitySetRef, MetadataGraph, TermName,
};
pub use model::{
    Class, EnumMember, Method, MethodKind, Model, Namespace, OcmType, Parameter, Primitive,
    Property, PropertyDef, TypeVariant, TypeVariantRef,
};
pub use projection::Projection;
pub use reader::{read_model, read_model_str};
pub use types::{
    ClassKind, ContainerPolicy, PropertyId, ReadOptions, ServiceMetadata, ServiceType, TypeId,
    EDM_NAMESPACE, METADATA_KEY,
};
pub use validator::{validate_against_schema, validate_csdl};
pub use vocabulary::{Term, Vocabulary};

#[cfg(feature = "remote")]
pub use loader::load_metadata_url;
