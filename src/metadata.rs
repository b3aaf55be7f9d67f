//! The parsed metadata graph consumed by the model reader and the capability engine.
//!
//! [`MetadataGraph`] is the seam the capability engine depends on: annotation
//! lookup on an entity set node. [`CsdlDocument`] implements it over an OData
//! CSDL JSON document.
//!
//! # Annotation lookup
//!
//! Annotations of an entity set come from two places, in this order:
//!
//! 1. inline members of the entity set object, e.g.
//!    `"@Capabilities.InsertRestrictions": { ... }`
//! 2. `$Annotations` blocks of any schema whose target is `Container/EntitySet`
//!
//! Term and target prefixes may use an alias declared by `$Reference`/`$Include`
//! or by a schema's `$Alias`; they are normalized to the namespace.

use std::collections::HashMap;
use std::fmt;

use serde_json::{Map, Value};

use crate::error::ReadError;

/// Full identifier of a vocabulary term: namespace plus simple name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TermName {
    namespace: String,
    name: String,
}

impl TermName {
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
        }
    }

    /// Split a full name at its last dot. Returns `None` without a namespace part.
    pub fn parse(full_name: &str) -> Option<Self> {
        let (namespace, name) = full_name.rsplit_once('.')?;
        if namespace.is_empty() || name.is_empty() {
            return None;
        }
        Some(Self::new(namespace, name))
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Display for TermName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.namespace, self.name)
    }
}

/// A vocabulary annotation attached to a metadata node.
#[derive(Debug, Clone, PartialEq)]
pub struct Annotation<'a> {
    pub term: TermName,
    pub qualifier: Option<&'a str>,
    pub value: &'a Value,
}

/// Identity of an entity set node in the metadata graph.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EntitySetRef {
    /// Qualified name of the entity container.
    pub container: String,
    pub name: String,
    /// Qualified name of the entity type.
    pub entity_type: String,
}

impl EntitySetRef {
    /// Annotation target path: `Namespace.Container/EntitySet`.
    pub fn target_path(&self) -> String {
        format!("{}/{}", self.container, self.name)
    }
}

/// Annotation lookup over an already parsed metadata graph.
pub trait MetadataGraph {
    /// All annotations attached to `target`, in document order.
    fn annotations(&self, target: &EntitySetRef) -> Vec<Annotation<'_>>;

    /// First annotation of `target` whose term matches by namespace and name.
    fn find_annotation(&self, target: &EntitySetRef, term: &TermName) -> Option<Annotation<'_>> {
        self.annotations(target)
            .into_iter()
            .find(|a| a.term.namespace() == term.namespace() && a.term.name() == term.name())
    }
}

/// Member of an entity container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContainerMember {
    EntitySet(EntitySetRef),
    Singleton { name: String, entity_type: String },
    ActionImport { name: String, action: String },
    FunctionImport { name: String, function: String },
}

/// True for member names that carry control information or annotations.
pub(crate) fn is_control(name: &str) -> bool {
    name.starts_with('$') || name.contains('@')
}

/// An OData CSDL JSON document.
#[derive(Debug, Clone)]
pub struct CsdlDocument {
    root: Value,
    /// alias -> namespace
    aliases: HashMap<String, String>,
}

impl CsdlDocument {
    /// Parse a CSDL JSON document.
    ///
    /// # Errors
    ///
    /// Returns `ReadError::InvalidJson` if the text isn't valid JSON.
    pub fn parse(text: &str) -> Result<Self, ReadError> {
        let root = serde_json::from_str(text).map_err(|source| ReadError::InvalidJson { source })?;
        Ok(Self::from_value(root))
    }

    pub fn from_value(root: Value) -> Self {
        let mut aliases = HashMap::new();

        if let Some(references) = root.get("$Reference").and_then(Value::as_object) {
            for reference in references.values() {
                let includes = reference
                    .get("$Include")
                    .and_then(Value::as_array)
                    .into_iter()
                    .flatten();
                for include in includes {
                    let namespace = include.get("$Namespace").and_then(Value::as_str);
                    let alias = include.get("$Alias").and_then(Value::as_str);
                    if let (Some(namespace), Some(alias)) = (namespace, alias) {
                        aliases.insert(alias.to_string(), namespace.to_string());
                    }
                }
            }
        }

        if let Some(members) = root.as_object() {
            for (namespace, schema) in members {
                if is_control(namespace) {
                    continue;
                }
                if let Some(alias) = schema.get("$Alias").and_then(Value::as_str) {
                    aliases.insert(alias.to_string(), namespace.clone());
                }
            }
        }

        Self { root, aliases }
    }

    pub fn root(&self) -> &Value {
        &self.root
    }

    /// `$Version` of the document.
    pub fn version(&self) -> Option<&str> {
        self.root.get("$Version").and_then(Value::as_str)
    }

    /// Schemas keyed by namespace, in document order.
    pub fn schemas(&self) -> impl Iterator<Item = (&str, &Map<String, Value>)> {
        self.root
            .as_object()
            .into_iter()
            .flatten()
            .filter(|(name, _)| !is_control(name))
            .filter_map(|(name, schema)| schema.as_object().map(|s| (name.as_str(), s)))
    }

    /// Replace an alias prefix of a qualified name with its namespace.
    pub fn qualify(&self, name: &str) -> String {
        match name.rsplit_once('.') {
            Some((prefix, local)) => match self.aliases.get(prefix) {
                Some(namespace) => format!("{}.{}", namespace, local),
                None => name.to_string(),
            },
            None => name.to_string(),
        }
    }

    /// Qualify the leading name of an annotation target path.
    fn qualify_target(&self, target: &str) -> String {
        match target.split_once('/') {
            Some((head, rest)) => format!("{}/{}", self.qualify(head), rest),
            None => self.qualify(target),
        }
    }

    /// Schema element by qualified (or alias-qualified) name.
    pub fn element(&self, qualified_name: &str) -> Option<&Value> {
        let qualified = self.qualify(qualified_name);
        let (namespace, name) = qualified.rsplit_once('.')?;
        self.root.get(namespace)?.get(name)
    }

    /// Qualified name and body of the entity container.
    ///
    /// Uses `$EntityContainer` when present, else the first element of kind
    /// `EntityContainer` in document order.
    ///
    /// # Errors
    ///
    /// Returns `ReadError::UnknownType` if `$EntityContainer` names no element
    /// and `ReadError::InvalidElement` if it names an element of another kind.
    pub fn entity_container(&self) -> Result<Option<(String, &Map<String, Value>)>, ReadError> {
        if let Some(name) = self.root.get("$EntityContainer").and_then(Value::as_str) {
            let qualified = self.qualify(name);
            let body = self
                .element(name)
                .and_then(Value::as_object)
                .ok_or_else(|| ReadError::UnknownType {
                    name: qualified.clone(),
                    path: "/$EntityContainer".to_string(),
                })?;
            if body.get("$Kind").and_then(Value::as_str) != Some("EntityContainer") {
                return Err(ReadError::InvalidElement {
                    path: "/$EntityContainer".to_string(),
                    message: format!("'{}' is not an entity container", qualified),
                });
            }
            return Ok(Some((qualified, body)));
        }
        Ok(self.schemas().find_map(|(namespace, schema)| {
            schema.iter().find_map(|(name, element)| {
                let body = element.as_object()?;
                (body.get("$Kind").and_then(Value::as_str) == Some("EntityContainer"))
                    .then(|| (format!("{}.{}", namespace, name), body))
            })
        }))
    }

    /// Members of the entity container, in document order.
    ///
    /// # Errors
    ///
    /// Fails as [`CsdlDocument::entity_container`] does, and with
    /// `ReadError::InvalidElement` for a member that is not an object or
    /// declares none of `$Type`, `$Action` and `$Function`.
    pub fn container_members(&self) -> Result<Vec<ContainerMember>, ReadError> {
        let Some((container, body)) = self.entity_container()? else {
            return Ok(Vec::new());
        };
        let container_path = match container.rsplit_once('.') {
            Some((namespace, name)) => format!("/{}/{}", namespace, name),
            None => format!("/{}", container),
        };

        let mut members = Vec::new();
        for (name, member) in body {
            if is_control(name) {
                continue;
            }
            let invalid = |message: &str| ReadError::InvalidElement {
                path: format!("{}/{}", container_path, name),
                message: message.to_string(),
            };
            let member = member
                .as_object()
                .ok_or_else(|| invalid("expected a container member object"))?;
            let str_of = |key: &str| member.get(key).and_then(Value::as_str);

            if let Some(action) = str_of("$Action") {
                members.push(ContainerMember::ActionImport {
                    name: name.clone(),
                    action: self.qualify(action),
                });
            } else if let Some(function) = str_of("$Function") {
                members.push(ContainerMember::FunctionImport {
                    name: name.clone(),
                    function: self.qualify(function),
                });
            } else if let Some(entity_type) = str_of("$Type") {
                let entity_type = self.qualify(entity_type);
                if member.get("$Collection").and_then(Value::as_bool) == Some(true) {
                    members.push(ContainerMember::EntitySet(EntitySetRef {
                        container: container.clone(),
                        name: name.clone(),
                        entity_type,
                    }));
                } else {
                    members.push(ContainerMember::Singleton {
                        name: name.clone(),
                        entity_type,
                    });
                }
            } else {
                return Err(invalid("container member declares no $Type, $Action or $Function"));
            }
        }
        Ok(members)
    }

    /// Entity sets of the entity container, in document order.
    pub fn entity_sets(&self) -> Result<Vec<EntitySetRef>, ReadError> {
        Ok(self
            .container_members()?
            .into_iter()
            .filter_map(|member| match member {
                ContainerMember::EntitySet(set) => Some(set),
                _ => None,
            })
            .collect())
    }

    fn entity_set_body(&self, target: &EntitySetRef) -> Option<&Map<String, Value>> {
        self.element(&target.container)?
            .get(&target.name)?
            .as_object()
    }

    fn collect_annotations<'a>(&self, members: &'a Map<String, Value>, out: &mut Vec<Annotation<'a>>) {
        for (key, value) in members {
            let Some(term) = key.strip_prefix('@') else {
                continue;
            };
            // `@A@B` annotates the annotation `@A`, not the target
            if term.contains('@') {
                continue;
            }
            let (term, qualifier) = match term.split_once('#') {
                Some((term, qualifier)) => (term, Some(qualifier)),
                None => (term, None),
            };
            let Some(term) = TermName::parse(&self.qualify(term)) else {
                continue;
            };
            out.push(Annotation {
                term,
                qualifier,
                value,
            });
        }
    }
}

impl MetadataGraph for CsdlDocument {
    fn annotations(&self, target: &EntitySetRef) -> Vec<Annotation<'_>> {
        let mut found = Vec::new();

        if let Some(body) = self.entity_set_body(target) {
            self.collect_annotations(body, &mut found);
        }

        let path = target.target_path();
        for (_, schema) in self.schemas() {
            let Some(blocks) = schema.get("$Annotations").and_then(Value::as_object) else {
                continue;
            };
            for (block_target, block) in blocks {
                if self.qualify_target(block_target) != path {
                    continue;
                }
                if let Some(block) = block.as_object() {
                    self.collect_annotations(block, &mut found);
                }
            }
        }

        found
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn document() -> CsdlDocument {
        CsdlDocument::from_value(json!({
            "$Version": "4.01",
            "$EntityContainer": "self.Container",
            "$Reference": {
                "https://oasis-tcs.github.io/odata-vocabularies/vocabularies/Org.OData.Capabilities.V1.json": {
                    "$Include": [
                        { "$Namespace": "Org.OData.Capabilities.V1", "$Alias": "Capabilities" }
                    ]
                }
            },
            "NS": {
                "$Alias": "self",
                "Item": { "$Kind": "EntityType" },
                "Container": {
                    "$Kind": "EntityContainer",
                    "Items": {
                        "$Collection": true,
                        "$Type": "self.Item",
                        "@Capabilities.InsertRestrictions": { "Insertable": false },
                        "@Capabilities.InsertRestrictions@Core.Description": "ignored",
                        "@Capabilities.UpdateRestrictions#Strict": { "Updatable": false }
                    },
                    "Me": { "$Type": "NS.Item" },
                    "Reset": { "$Action": "self.Reset" },
                    "Top": { "$Function": "NS.Top" }
                },
                "$Annotations": {
                    "self.Container/Items": {
                        "@Org.OData.Capabilities.V1.DeleteRestrictions": { "Deletable": true }
                    },
                    "NS.Container/Me": {
                        "@Org.OData.Capabilities.V1.DeleteRestrictions": { "Deletable": false }
                    }
                }
            }
        }))
    }

    fn items() -> EntitySetRef {
        EntitySetRef {
            container: "NS.Container".into(),
            name: "Items".into(),
            entity_type: "NS.Item".into(),
        }
    }

    #[test]
    fn term_name_parse() {
        let term = TermName::parse("Org.OData.Capabilities.V1.InsertRestrictions").unwrap();
        assert_eq!(term.namespace(), "Org.OData.Capabilities.V1");
        assert_eq!(term.name(), "InsertRestrictions");
        assert_eq!(term.to_string(), "Org.OData.Capabilities.V1.InsertRestrictions");
        assert!(TermName::parse("NoNamespace").is_none());
        assert!(TermName::parse(".Name").is_none());
    }

    #[test]
    fn qualify_resolves_aliases() {
        let doc = document();
        assert_eq!(doc.qualify("self.Item"), "NS.Item");
        assert_eq!(
            doc.qualify("Capabilities.InsertRestrictions"),
            "Org.OData.Capabilities.V1.InsertRestrictions"
        );
        assert_eq!(doc.qualify("Edm.String"), "Edm.String");
        assert_eq!(doc.qualify("Plain"), "Plain");
    }

    #[test]
    fn container_members_in_order() {
        let doc = document();
        let members = doc.container_members().unwrap();
        assert_eq!(
            members,
            vec![
                ContainerMember::EntitySet(items()),
                ContainerMember::Singleton {
                    name: "Me".into(),
                    entity_type: "NS.Item".into()
                },
                ContainerMember::ActionImport {
                    name: "Reset".into(),
                    action: "NS.Reset".into()
                },
                ContainerMember::FunctionImport {
                    name: "Top".into(),
                    function: "NS.Top".into()
                },
            ]
        );
        assert_eq!(doc.entity_sets().unwrap(), vec![items()]);
    }

    #[test]
    fn annotations_inline_then_external() {
        let doc = document();
        let annotations = doc.annotations(&items());
        let terms: Vec<String> = annotations.iter().map(|a| a.term.to_string()).collect();
        assert_eq!(
            terms,
            vec![
                "Org.OData.Capabilities.V1.InsertRestrictions",
                "Org.OData.Capabilities.V1.UpdateRestrictions",
                "Org.OData.Capabilities.V1.DeleteRestrictions",
            ]
        );
        assert_eq!(annotations[1].qualifier, Some("Strict"));
        assert_eq!(annotations[2].value, &json!({ "Deletable": true }));
    }

    #[test]
    fn find_annotation_matches_namespace_and_name() {
        let doc = document();
        let term = TermName::new("Org.OData.Capabilities.V1", "InsertRestrictions");
        let annotation = doc.find_annotation(&items(), &term).unwrap();
        assert_eq!(annotation.value, &json!({ "Insertable": false }));

        let other = TermName::new("Other.Vocabulary", "InsertRestrictions");
        assert!(doc.find_annotation(&items(), &other).is_none());
    }

    #[test]
    fn entity_container_without_pointer() {
        let doc = CsdlDocument::from_value(json!({
            "$Version": "4.0",
            "NS": {
                "Item": { "$Kind": "EntityType" },
                "Box": { "$Kind": "EntityContainer" }
            }
        }));
        let (name, _) = doc.entity_container().unwrap().unwrap();
        assert_eq!(name, "NS.Box");
        assert!(doc.entity_sets().unwrap().is_empty());
    }

    #[test]
    fn entity_container_pointer_must_name_a_container() {
        let doc = CsdlDocument::from_value(json!({
            "$Version": "4.0",
            "$EntityContainer": "NS.Item",
            "NS": {
                "Item": { "$Kind": "EntityType" },
                "Box": { "$Kind": "EntityContainer" }
            }
        }));
        match doc.entity_container() {
            Err(ReadError::InvalidElement { path, message }) => {
                assert_eq!(path, "/$EntityContainer");
                assert!(message.contains("'NS.Item' is not an entity container"));
            }
            other => panic!("expected InvalidElement, got {:?}", other),
        }
        assert!(doc.container_members().is_err());
    }

    #[test]
    fn entity_container_pointer_to_missing_element() {
        let doc = CsdlDocument::from_value(json!({
            "$Version": "4.0",
            "$EntityContainer": "NS.Missing",
            "NS": { "Item": { "$Kind": "EntityType" } }
        }));
        assert!(matches!(
            doc.entity_container(),
            Err(ReadError::UnknownType { name, .. }) if name == "NS.Missing"
        ));
    }

    #[test]
    fn untyped_container_member_is_invalid() {
        let doc = CsdlDocument::from_value(json!({
            "$Version": "4.0",
            "NS": {
                "Item": { "$Kind": "EntityType" },
                "Box": {
                    "$Kind": "EntityContainer",
                    "Items": { "$Collection": true }
                }
            }
        }));
        match doc.entity_sets() {
            Err(ReadError::InvalidElement { path, message }) => {
                assert_eq!(path, "/NS/Box/Items");
                assert!(message.contains("$Type"));
            }
            other => panic!("expected InvalidElement, got {:?}", other),
        }
    }

    #[test]
    fn parse_rejects_invalid_json() {
        assert!(matches!(
            CsdlDocument::parse("not json"),
            Err(ReadError::InvalidJson { .. })
        ));
        assert_eq!(CsdlDocument::parse(r#"{"$Version":"4.0"}"#).unwrap().version(), Some("4.0"));
    }
}
