//! Capability resolution: projects restriction annotations onto model properties.
//!
//! For every entity set, the engine looks up the four restriction terms of the
//! capabilities vocabulary. Each annotation found is a record holding exactly
//! one boolean field and exactly one collection of navigation property paths:
//!
//! ```json
//! "@Org.OData.Capabilities.V1.DeleteRestrictions": {
//!     "Deletable": true,
//!     "NonDeletableNavigationProperties": ["Related"]
//! }
//! ```
//!
//! The entity set property receives a capability carrying the boolean. Every
//! navigation property named in the collection receives a capability of the
//! same kind carrying `false`, whatever the boolean says.
//!
//! Capabilities accumulate per property across calls, in discovery order, and
//! are never overwritten; [`CapabilityReader::materialize_projections`] turns
//! the accumulated lists into projections on the model.

use std::collections::BTreeMap;

use serde_json::{Map, Value};
use tracing::{debug, trace};

use crate::capability::{Capability, CapabilityKind};
use crate::error::CapabilityError;
use crate::metadata::{is_control, Annotation, EntitySetRef, MetadataGraph, TermName};
use crate::model::Model;
use crate::types::{json_type_name, PropertyId};
use crate::vocabulary::Vocabulary;

/// Members of a path element object that hold the path.
const PATH_MEMBERS: &[&str] = &["$NavigationPropertyPath", "$PropertyPath", "$Path"];

type Accumulator = BTreeMap<PropertyId, Vec<Capability>>;

type RestrictionHandler = fn(
    &mut Accumulator,
    &Model,
    PropertyId,
    CapabilityKind,
    &Annotation<'_>,
) -> Result<(), CapabilityError>;

struct RestrictionTerm {
    term: TermName,
    kind: CapabilityKind,
    handler: RestrictionHandler,
}

/// Reads restriction annotations of entity sets and accumulates capabilities.
pub struct CapabilityReader {
    restrictions: Vec<RestrictionTerm>,
    accumulated: Accumulator,
}

impl CapabilityReader {
    /// Create a reader backed by the bundled capabilities vocabulary.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the bundled vocabulary cannot be loaded.
    pub fn new() -> Result<Self, CapabilityError> {
        Self::with_vocabulary(&Vocabulary::bundled()?)
    }

    /// Create a reader whose restriction terms come from `vocabulary`.
    ///
    /// # Errors
    ///
    /// Returns `CapabilityError::MissingTerm` if the vocabulary does not
    /// declare one of the four restriction terms, and
    /// `CapabilityError::Vocabulary` if a restriction term is declared with the
    /// wrong record type or does not apply to entity sets.
    pub fn with_vocabulary(vocabulary: &Vocabulary) -> Result<Self, CapabilityError> {
        let restrictions = CapabilityKind::ALL
            .iter()
            .map(|&kind| {
                let term = vocabulary.restriction_term(kind).ok_or_else(|| {
                    CapabilityError::MissingTerm {
                        term: kind.term().to_string(),
                    }
                })?;
                Ok(RestrictionTerm {
                    term,
                    kind,
                    handler: restrict_entity_set_and_navigation,
                })
            })
            .collect::<Result<Vec<_>, CapabilityError>>()?;

        for restriction in &restrictions {
            check_declaration(vocabulary, restriction)?;
        }

        Ok(Self {
            restrictions,
            accumulated: Accumulator::new(),
        })
    }

    /// Restriction terms consulted for each entity set, in order.
    pub fn terms(&self) -> impl Iterator<Item = &TermName> {
        self.restrictions.iter().map(|r| &r.term)
    }

    /// Capabilities accumulated so far for `property`, in discovery order.
    pub fn accumulated(&self, property: PropertyId) -> &[Capability] {
        self.accumulated
            .get(&property)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Apply the restriction annotations of `entity_set` to `property` (the
    /// entity set's property on the entity container) and to the navigation
    /// properties the annotations name, then materialize projections.
    ///
    /// # Errors
    ///
    /// Returns `CapabilityError::UnknownProperty` or `CapabilityError::NotAClass`
    /// when `property` does not fit, `CapabilityError::AnnotationShape` for a
    /// malformed annotation record and `CapabilityError::UnresolvedPath` for a
    /// navigation path the model cannot resolve.
    pub fn resolve_entity_set_capabilities<G: MetadataGraph + ?Sized>(
        &mut self,
        model: &mut Model,
        property: PropertyId,
        graph: &G,
        entity_set: &EntitySetRef,
    ) -> Result<(), CapabilityError> {
        if model.property(property).is_none() {
            return Err(CapabilityError::UnknownProperty { property });
        }

        for restriction in &self.restrictions {
            let Some(annotation) = graph.find_annotation(entity_set, &restriction.term) else {
                continue;
            };
            debug!(
                entity_set = %entity_set.target_path(),
                term = %restriction.term,
                "applying restriction annotation"
            );
            (restriction.handler)(
                &mut self.accumulated,
                model,
                property,
                restriction.kind,
                &annotation,
            )?;
        }

        self.materialize_projections(model);
        Ok(())
    }

    /// Assign every accumulated capability list to its property as a projection.
    ///
    /// Processes whatever is accumulated at call time. The accumulator is not
    /// cleared, so later calls re-assign earlier properties from their full lists.
    pub fn materialize_projections(&self, model: &mut Model) {
        for (&property, capabilities) in &self.accumulated {
            let Some(current) = model.property(property) else {
                continue;
            };
            let projection = current
                .projection()
                .type_id()
                .projection(capabilities.clone());
            model.set_projection(property, projection);
        }
    }
}

/// Shared handler of all four restriction terms.
/// A restriction term must carry its `<Term>Type` record and be applicable to
/// entity sets. An empty `$AppliesTo` applies everywhere.
fn check_declaration(
    vocabulary: &Vocabulary,
    restriction: &RestrictionTerm,
) -> Result<(), CapabilityError> {
    let Some(declared) = vocabulary.find_term(&restriction.term) else {
        return Err(CapabilityError::MissingTerm {
            term: restriction.term.to_string(),
        });
    };
    let expected = format!("{}Type", restriction.kind.term());
    if declared.type_name != expected {
        return Err(CapabilityError::Vocabulary {
            message: format!(
                "term '{}' has type '{}', expected '{}'",
                restriction.term, declared.type_name, expected
            ),
        });
    }
    if !declared.applies_to.is_empty() && !declared.applies_to.iter().any(|t| t == "EntitySet") {
        return Err(CapabilityError::Vocabulary {
            message: format!("term '{}' does not apply to entity sets", restriction.term),
        });
    }
    Ok(())
}

fn restrict_entity_set_and_navigation(
    accumulated: &mut Accumulator,
    model: &Model,
    property: PropertyId,
    kind: CapabilityKind,
    annotation: &Annotation<'_>,
) -> Result<(), CapabilityError> {
    let entity_set = model
        .property(property)
        .ok_or(CapabilityError::UnknownProperty { property })?;
    let shape_error = |message: String| CapabilityError::AnnotationShape {
        term: annotation.term.to_string(),
        property: entity_set.name().to_string(),
        message,
    };

    let record = annotation.value.as_object().ok_or_else(|| {
        shape_error(format!(
            "expected a record, got {}",
            json_type_name(annotation.value)
        ))
    })?;
    let allowed = single_field(record, "boolean", Value::as_bool).map_err(&shape_error)?;
    let elements = single_field(record, "collection", Value::as_array).map_err(&shape_error)?;
    let paths = elements
        .iter()
        .map(|element| {
            navigation_path(element).ok_or_else(|| {
                shape_error(format!(
                    "expected a navigation property path, got {}",
                    json_type_name(element)
                ))
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    let class = entity_set.value_type();
    if model.class(class).is_none() {
        return Err(CapabilityError::NotAClass {
            property: entity_set.name().to_string(),
        });
    }

    // Resolve everything before recording anything for this annotation.
    let navigation = paths
        .into_iter()
        .map(|path| {
            model
                .find_property(class, &path)
                .map_err(|source| CapabilityError::UnresolvedPath {
                    term: annotation.term.to_string(),
                    property: entity_set.name().to_string(),
                    path,
                    source,
                })
        })
        .collect::<Result<Vec<_>, _>>()?;

    trace!(property = entity_set.name(), ?kind, allowed, "recording capability");
    accumulated
        .entry(property)
        .or_default()
        .push(kind.capability(allowed));

    for id in navigation {
        trace!(property = %id, ?kind, "recording excluded navigation property");
        accumulated.entry(id).or_default().push(kind.capability(false));
    }

    Ok(())
}

/// The value of the only record field that `extract` accepts.
fn single_field<'a, T>(
    record: &'a Map<String, Value>,
    what: &str,
    extract: impl Fn(&'a Value) -> Option<T>,
) -> Result<T, String> {
    let mut fields = record
        .iter()
        .filter(|(name, _)| !is_control(name))
        .filter_map(|(_, value)| extract(value));

    match (fields.next(), fields.next()) {
        (Some(value), None) => Ok(value),
        (None, _) => Err(format!("expected exactly one {} field, found none", what)),
        (Some(_), Some(_)) => Err(format!(
            "expected exactly one {} field, found {}",
            what,
            fields.count() + 2
        )),
    }
}

/// Dotted model path of a path element, or `None` if the element is not a path.
fn navigation_path(element: &Value) -> Option<String> {
    let raw = match element {
        Value::String(path) => path.as_str(),
        Value::Object(map) => PATH_MEMBERS
            .iter()
            .find_map(|member| map.get(*member))
            .and_then(Value::as_str)?,
        _ => return None,
    };
    Some(raw.split('/').collect::<Vec<_>>().join("."))
}
