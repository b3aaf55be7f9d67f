//! Compiles service metadata into a [`Model`].
//!
//! The primary CSDL JSON document is read in passes, so that every reference
//! can be resolved regardless of declaration order:
//!
//! 1. register types (entity, complex, enum and container classes, type definitions)
//! 2. fill members: base types, properties, enum members
//! 3. fill keys (keys may name inherited properties)
//! 4. operations: bound ones become methods of their binding class; overloads
//!    bound to a primitive or other non-class type are skipped
//! 5. container: entity sets, singletons and operation imports
//! 6. capabilities, for services that support them
//!
//! `Edm.*` primitives are registered on first use.

use serde_json::{Map, Value};
use tracing::{debug, info};

use crate::capabilities::CapabilityReader;
use crate::error::ReadError;
use crate::metadata::{is_control, ContainerMember, CsdlDocument, EntitySetRef};
use crate::model::{EnumMember, Method, MethodKind, Model, OcmType, Parameter, PropertyDef};
use crate::types::{
    json_type_name, ClassKind, ContainerPolicy, PropertyId, ReadOptions, ServiceMetadata,
    TypeId, EDM_NAMESPACE, METADATA_KEY,
};
use crate::validator::validate_csdl;

/// Type of a property or parameter that declares no `$Type`.
const DEFAULT_TYPE: &str = "Edm.String";

/// Read service metadata into a model.
///
/// # Errors
///
/// Returns `ReadError::MissingDocument` without a `$metadata` document,
/// `ReadError::InvalidJson` or `ReadError::Validate` for a malformed one, and
/// model or capability errors for inconsistent metadata.
pub fn read_model(metadata: ServiceMetadata, options: &ReadOptions) -> Result<Model, ReadError> {
    let text = metadata
        .get(METADATA_KEY)
        .ok_or_else(|| ReadError::MissingDocument {
            key: METADATA_KEY.to_string(),
        })?;
    let root: Value =
        serde_json::from_str(text).map_err(|source| ReadError::InvalidJson { source })?;
    if options.validate {
        validate_csdl(&root)?;
    }
    let document = CsdlDocument::from_value(root);

    let mut builder = ModelBuilder {
        document: &document,
        model: Model::new(metadata, options.service_type),
    };
    builder.register_types()?;
    builder.fill_members()?;
    builder.fill_keys()?;
    builder.fill_operations()?;
    let entity_sets = builder.fill_container()?;

    let mut model = builder.model;
    if !options.resolve_capabilities {
        debug!("capability resolution disabled");
    } else if !options.service_type.supports_capabilities() {
        debug!(
            service_type = ?options.service_type,
            "service type has no capability annotations, skipping resolution"
        );
    } else {
        let mut capabilities = CapabilityReader::new()?;
        for (property, entity_set) in &entity_sets {
            capabilities.resolve_entity_set_capabilities(
                &mut model,
                *property,
                &document,
                entity_set,
            )?;
        }
    }

    if options.container_policy == ContainerPolicy::Unique {
        model.unique_entity_container()?;
    }

    info!(
        version = document.version().unwrap_or("unknown"),
        namespaces = model.namespaces().len(),
        types = model.types().count(),
        properties = model.properties().count(),
        entity_sets = entity_sets.len(),
        "compiled model"
    );
    Ok(model)
}

/// Read a single CSDL JSON document into a model.
pub fn read_model_str(document: &str, options: &ReadOptions) -> Result<Model, ReadError> {
    read_model(ServiceMetadata::primary(document), options)
}

/// Non-control members of a JSON object.
fn elements(object: &Map<String, Value>) -> impl Iterator<Item = (&str, &Value)> {
    object
        .iter()
        .filter(|(name, _)| !is_control(name))
        .map(|(name, value)| (name.as_str(), value))
}

fn flag(object: &Map<String, Value>, key: &str) -> bool {
    object.get(key).and_then(Value::as_bool).unwrap_or(false)
}

fn kind_of(object: &Map<String, Value>) -> Option<&str> {
    object.get("$Kind").and_then(Value::as_str)
}

fn invalid(path: &str, message: impl Into<String>) -> ReadError {
    ReadError::InvalidElement {
        path: path.to_string(),
        message: message.into(),
    }
}

struct ModelBuilder<'a> {
    document: &'a CsdlDocument,
    model: Model,
}

impl<'a> ModelBuilder<'a> {
    /// Resolve a (possibly alias-qualified) type reference.
    fn resolve_type_ref(&mut self, name: &str, path: &str) -> Result<TypeId, ReadError> {
        let qualified = self.document.qualify(name);
        let unknown = || ReadError::UnknownType {
            name: qualified.clone(),
            path: path.to_string(),
        };
        let Some((namespace, local)) = qualified.rsplit_once('.') else {
            return Err(unknown());
        };
        if let Some(id) = self.model.resolve_type_id(local, namespace) {
            return Ok(id);
        }
        if namespace == EDM_NAMESPACE {
            return Ok(self.model.add_type(OcmType::primitive(local, namespace))?);
        }
        Err(unknown())
    }

    fn registered(&self, namespace: &str, name: &str) -> Result<TypeId, ReadError> {
        self.model
            .resolve_type_id(name, namespace)
            .ok_or_else(|| ReadError::UnknownType {
                name: format!("{}.{}", namespace, name),
                path: format!("/{}/{}", namespace, name),
            })
    }

    fn register_types(&mut self) -> Result<(), ReadError> {
        let document = self.document;
        for (namespace, schema) in document.schemas() {
            for (name, element) in elements(schema) {
                let Some(body) = element.as_object() else {
                    continue;
                };
                let ty = match kind_of(body) {
                    Some("EntityType") => OcmType::class(name, namespace, ClassKind::Entity),
                    Some("ComplexType") => OcmType::class(name, namespace, ClassKind::Complex),
                    Some("EnumType") => OcmType::class(name, namespace, ClassKind::Enum),
                    Some("EntityContainer") => {
                        OcmType::class(name, namespace, ClassKind::Service)
                    }
                    Some("TypeDefinition") => OcmType::primitive(name, namespace),
                    _ => continue,
                };
                self.model.add_type(ty)?;
            }
        }
        Ok(())
    }

    fn fill_members(&mut self) -> Result<(), ReadError> {
        let document = self.document;
        for (namespace, schema) in document.schemas() {
            for (name, element) in elements(schema) {
                let Some(body) = element.as_object() else {
                    continue;
                };
                let path = format!("/{}/{}", namespace, name);
                match kind_of(body) {
                    Some("EntityType") | Some("ComplexType") => {
                        let class = self.registered(namespace, name)?;
                        self.fill_structured(class, body, &path)?;
                    }
                    Some("EnumType") => {
                        let class = self.registered(namespace, name)?;
                        self.fill_enum(class, body, &path)?;
                    }
                    _ => {}
                }
            }
        }
        Ok(())
    }

    fn fill_structured(
        &mut self,
        class: TypeId,
        body: &Map<String, Value>,
        path: &str,
    ) -> Result<(), ReadError> {
        if let Some(base) = body.get("$BaseType").and_then(Value::as_str) {
            let base = self.resolve_type_ref(base, &format!("{}/$BaseType", path))?;
            self.model.set_base(class, base)?;
        }
        if flag(body, "$Abstract") {
            self.model.set_abstract(class, true)?;
        }

        for (member, value) in elements(body) {
            let member_path = format!("{}/{}", path, member);
            let Some(definition) = value.as_object() else {
                return Err(invalid(
                    &member_path,
                    format!("expected a property, got {}", json_type_name(value)),
                ));
            };
            let is_navigation = match kind_of(definition) {
                None | Some("Property") => false,
                Some("NavigationProperty") => true,
                Some(other) => {
                    return Err(invalid(
                        &member_path,
                        format!("unexpected member kind '{}'", other),
                    ))
                }
            };
            let type_name = definition
                .get("$Type")
                .and_then(Value::as_str)
                .unwrap_or(DEFAULT_TYPE);
            let value_type = self.resolve_type_ref(type_name, &member_path)?;
            self.model.add_property(
                class,
                PropertyDef::new(member, value_type)
                    .collection(flag(definition, "$Collection"))
                    .nullable(flag(definition, "$Nullable"))
                    .navigation(is_navigation),
            )?;
        }
        Ok(())
    }

    fn fill_enum(
        &mut self,
        class: TypeId,
        body: &Map<String, Value>,
        path: &str,
    ) -> Result<(), ReadError> {
        for (member, value) in elements(body) {
            let value = value.as_i64().ok_or_else(|| {
                invalid(
                    &format!("{}/{}", path, member),
                    format!("expected an integer member value, got {}", json_type_name(value)),
                )
            })?;
            self.model.add_enum_member(
                class,
                EnumMember {
                    name: member.to_string(),
                    value,
                },
            )?;
        }
        Ok(())
    }

    fn fill_keys(&mut self) -> Result<(), ReadError> {
        let document = self.document;
        for (namespace, schema) in document.schemas() {
            for (name, element) in elements(schema) {
                let Some(body) = element.as_object() else {
                    continue;
                };
                if kind_of(body) != Some("EntityType") {
                    continue;
                }
                let Some(entries) = body.get("$Key").and_then(Value::as_array) else {
                    continue;
                };
                let class = self.registered(namespace, name)?;
                let path = format!("/{}/{}/$Key", namespace, name);

                let mut key = Vec::with_capacity(entries.len());
                for entry in entries {
                    // `"Id"` or `{ "Alias": "Path/To/Id" }`
                    let key_path = match entry {
                        Value::String(key_path) => Some(key_path.as_str()),
                        Value::Object(aliased) => aliased.values().next().and_then(Value::as_str),
                        _ => None,
                    }
                    .ok_or_else(|| {
                        invalid(
                            &path,
                            format!("expected a key property path, got {}", json_type_name(entry)),
                        )
                    })?;
                    key.push(self.model.find_property(class, &key_path.replace('/', "."))?);
                }
                self.model.set_key(class, key)?;
            }
        }
        Ok(())
    }

    fn fill_operations(&mut self) -> Result<(), ReadError> {
        let document = self.document;
        for (namespace, schema) in document.schemas() {
            for (name, element) in elements(schema) {
                let Some(overloads) = element.as_array() else {
                    continue;
                };
                let mut unbound_registered = false;
                for (index, overload) in overloads.iter().enumerate() {
                    let path = format!("/{}/{}/{}", namespace, name, index);
                    let body = overload
                        .as_object()
                        .ok_or_else(|| invalid(&path, "expected an operation object"))?;
                    let method = self.read_method(name, body, &path)?;

                    if method.is_bound {
                        let binding = method
                            .parameters
                            .first()
                            .map(|p| p.type_id)
                            .ok_or_else(|| invalid(&path, "bound operation has no parameters"))?;
                        if self.model.class(binding).is_none() {
                            debug!(
                                operation = %format!("{}.{}", namespace, name),
                                index,
                                binding = %self.model.type_name(binding),
                                "skipping overload bound to a non-class type"
                            );
                            continue;
                        }
                        self.model.add_method(binding, method)?;
                    } else if !unbound_registered {
                        self.model
                            .add_type(OcmType::operation(name, namespace, method))?;
                        unbound_registered = true;
                    } else {
                        debug!(operation = %format!("{}.{}", namespace, name), index, "skipping overload");
                    }
                }
            }
        }
        Ok(())
    }

    fn read_method(
        &mut self,
        name: &str,
        body: &Map<String, Value>,
        path: &str,
    ) -> Result<Method, ReadError> {
        let kind = match kind_of(body) {
            Some("Action") => MethodKind::Action,
            Some("Function") => MethodKind::Function,
            other => {
                return Err(invalid(
                    path,
                    format!("expected Action or Function, got {:?}", other),
                ))
            }
        };

        let mut method = Method::new(name, kind);
        method.is_bound = flag(body, "$IsBound");
        method.is_composable = flag(body, "$IsComposable");

        let parameters = body
            .get("$Parameter")
            .and_then(Value::as_array)
            .into_iter()
            .flatten();
        for (index, parameter) in parameters.enumerate() {
            let parameter_path = format!("{}/$Parameter/{}", path, index);
            let definition = parameter
                .as_object()
                .ok_or_else(|| invalid(&parameter_path, "expected a parameter object"))?;
            let parameter_name = definition
                .get("$Name")
                .and_then(Value::as_str)
                .ok_or_else(|| invalid(&parameter_path, "parameter has no $Name"))?;
            let type_name = definition
                .get("$Type")
                .and_then(Value::as_str)
                .unwrap_or(DEFAULT_TYPE);
            method.parameters.push(Parameter {
                name: parameter_name.to_string(),
                type_id: self.resolve_type_ref(type_name, &parameter_path)?,
                is_collection: flag(definition, "$Collection"),
                is_nullable: flag(definition, "$Nullable"),
            });
        }

        if let Some(returns) = body.get("$ReturnType").and_then(Value::as_object) {
            let type_name = returns
                .get("$Type")
                .and_then(Value::as_str)
                .unwrap_or(DEFAULT_TYPE);
            method.return_type =
                Some(self.resolve_type_ref(type_name, &format!("{}/$ReturnType", path))?);
            method.returns_collection = flag(returns, "$Collection");
        }

        Ok(method)
    }

    /// Add container members to the Service class. Returns the entity set
    /// properties together with their metadata nodes.
    fn fill_container(&mut self) -> Result<Vec<(PropertyId, EntitySetRef)>, ReadError> {
        let document = self.document;
        let Some((container, _)) = document.entity_container()? else {
            return Ok(Vec::new());
        };
        let (namespace, name) = container
            .rsplit_once('.')
            .ok_or_else(|| invalid("/$EntityContainer", "container name is not qualified"))?;
        let service = self.registered(namespace, name)?;

        let mut entity_sets = Vec::new();
        for member in document.container_members()? {
            match member {
                ContainerMember::EntitySet(set) => {
                    let path = format!("/{}/{}/{}", namespace, name, set.name);
                    let entity_type = self.resolve_type_ref(&set.entity_type, &path)?;
                    let property = self.model.add_property(
                        service,
                        PropertyDef::new(&set.name, entity_type)
                            .collection(true)
                            .navigation(true),
                    )?;
                    entity_sets.push((property, set));
                }
                ContainerMember::Singleton {
                    name: member,
                    entity_type,
                } => {
                    let path = format!("/{}/{}/{}", namespace, name, member);
                    let entity_type = self.resolve_type_ref(&entity_type, &path)?;
                    self.model.add_property(
                        service,
                        PropertyDef::new(member, entity_type).navigation(true),
                    )?;
                }
                ContainerMember::ActionImport {
                    name: member,
                    action: operation,
                }
                | ContainerMember::FunctionImport {
                    name: member,
                    function: operation,
                } => {
                    let path = format!("/{}/{}/{}", namespace, name, member);
                    self.add_import(service, member, &operation, &path)?;
                }
            }
        }
        Ok(entity_sets)
    }

    fn add_import(
        &mut self,
        service: TypeId,
        name: String,
        operation: &str,
        path: &str,
    ) -> Result<(), ReadError> {
        let unknown = || ReadError::UnknownType {
            name: operation.to_string(),
            path: path.to_string(),
        };
        let (namespace, local) = operation.rsplit_once('.').ok_or_else(unknown)?;
        let mut method = self
            .model
            .resolve_type::<Method>(local, namespace)
            .cloned()
            .ok_or_else(unknown)?;
        method.name = name;
        self.model.add_method(service, method)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capability::Capability;
    use crate::error::ModelError;
    use crate::model::{Class, Primitive};
    use crate::types::ServiceType;

    const SERVICE: &str = r#"{
        "$Version": "4.01",
        "$EntityContainer": "self.Service",
        "$Reference": {
            "https://oasis-tcs.github.io/odata-vocabularies/vocabularies/Org.OData.Capabilities.V1.json": {
                "$Include": [{ "$Namespace": "Org.OData.Capabilities.V1", "$Alias": "Capabilities" }]
            }
        },
        "NS": {
            "$Alias": "self",
            "Color": { "$Kind": "EnumType", "Red": 0, "Green": 1 },
            "Code": { "$Kind": "TypeDefinition", "$UnderlyingType": "Edm.String" },
            "Base": {
                "$Kind": "EntityType",
                "$Abstract": true,
                "$Key": ["Id"],
                "Id": { "$Type": "Edm.Int32" }
            },
            "Item": {
                "$Kind": "EntityType",
                "$BaseType": "self.Base",
                "Name": { "$Nullable": true },
                "Code": { "$Type": "self.Code" },
                "Color": { "$Type": "NS.Color" },
                "Tags": { "$Collection": true },
                "Related": { "$Kind": "NavigationProperty", "$Type": "self.Item" }
            },
            "Archive": [
                {
                    "$Kind": "Action",
                    "$IsBound": true,
                    "$Parameter": [{ "$Name": "item", "$Type": "self.Item" }]
                }
            ],
            "Top": [
                {
                    "$Kind": "Function",
                    "$Parameter": [{ "$Name": "count", "$Type": "Edm.Int32" }],
                    "$ReturnType": { "$Type": "self.Item", "$Collection": true }
                },
                { "$Kind": "Function", "$ReturnType": { "$Type": "self.Item" } }
            ],
            "Service": {
                "$Kind": "EntityContainer",
                "Items": {
                    "$Collection": true,
                    "$Type": "self.Item",
                    "@Capabilities.DeleteRestrictions": {
                        "Deletable": true,
                        "NonDeletableNavigationProperties": ["Related"]
                    }
                },
                "Featured": { "$Type": "self.Item" },
                "TopItems": { "$Function": "self.Top" }
            }
        }
    }"#;

    fn read(options: &ReadOptions) -> Model {
        read_model_str(SERVICE, options).unwrap()
    }

    #[test]
    fn registers_declared_and_primitive_types() {
        let model = read(&ReadOptions::default());

        assert!(model.resolve_type::<Class>("Item", "NS").is_some());
        assert!(model.resolve_type::<Primitive>("Code", "NS").is_some());
        assert!(model.resolve_type::<Primitive>("Int32", "Edm").is_some());
        assert!(model.resolve_type::<Primitive>("String", "Edm").is_some());
        let namespaces: Vec<&str> = model.namespaces().iter().map(|n| n.name()).collect();
        assert_eq!(namespaces, vec!["NS", "Edm"]);
    }

    #[test]
    fn fills_members_keys_and_enums() {
        let model = read(&ReadOptions::default());
        let item = model.resolve_type_id("Item", "NS").unwrap();
        let base = model.resolve_type_id("Base", "NS").unwrap();

        let class = model.class(item).unwrap();
        assert_eq!(class.base(), Some(base));
        assert_eq!(class.properties().len(), 5);
        assert!(model.class(base).unwrap().is_abstract());
        assert_eq!(model.class(base).unwrap().key().len(), 1);

        let name = model.find_property(item, "Name").unwrap();
        let name = model.property(name).unwrap();
        assert!(name.is_nullable());
        assert_eq!(model.type_name(name.value_type()), "Edm.String");

        let tags = model.find_property(item, "Tags").unwrap();
        assert!(model.property(tags).unwrap().is_collection());
        let related = model.find_property(item, "Related").unwrap();
        assert!(model.property(related).unwrap().is_navigation());
        // Inherited key property
        assert!(model.find_property(item, "Id").is_ok());

        let color = model.resolve_type::<Class>("Color", "NS").unwrap();
        assert_eq!(color.kind(), ClassKind::Enum);
        assert_eq!(
            color.members(),
            &[
                EnumMember { name: "Red".into(), value: 0 },
                EnumMember { name: "Green".into(), value: 1 },
            ]
        );
    }

    #[test]
    fn reads_operations_and_container() {
        let model = read(&ReadOptions::default());

        let item = model.resolve_type::<Class>("Item", "NS").unwrap();
        assert_eq!(item.methods().len(), 1);
        assert_eq!(item.methods()[0].name, "Archive");
        assert!(item.methods()[0].is_bound);

        let top = model.resolve_type::<Method>("Top", "NS").unwrap();
        assert_eq!(top.kind, MethodKind::Function);
        assert_eq!(top.parameters.len(), 1);
        assert!(top.returns_collection);

        let service = model.entity_container().unwrap();
        let class = model.class(service).unwrap();
        assert_eq!(class.kind(), ClassKind::Service);
        let names: Vec<&str> = class
            .properties()
            .iter()
            .map(|id| model.property(*id).unwrap().name())
            .collect();
        assert_eq!(names, vec!["Items", "Featured"]);
        assert_eq!(class.methods()[0].name, "TopItems");
    }

    #[test]
    fn operations_bound_to_non_class_types_are_skipped() {
        let document = r#"{
            "$Version": "4.01",
            "NS": {
                "Item": { "$Kind": "EntityType" },
                "Shout": [
                    {
                        "$Kind": "Function",
                        "$IsBound": true,
                        "$Parameter": [{ "$Name": "text", "$Type": "Edm.String" }],
                        "$ReturnType": { "$Type": "Edm.String" }
                    },
                    {
                        "$Kind": "Function",
                        "$IsBound": true,
                        "$Parameter": [{ "$Name": "item", "$Type": "NS.Item" }],
                        "$ReturnType": { "$Type": "Edm.String" }
                    }
                ],
                "Lengths": [
                    {
                        "$Kind": "Function",
                        "$IsBound": true,
                        "$Parameter": [{ "$Name": "texts", "$Type": "Edm.String", "$Collection": true }],
                        "$ReturnType": { "$Type": "Edm.Int32", "$Collection": true }
                    }
                ]
            }
        }"#;
        let model = read_model_str(document, &ReadOptions::default()).unwrap();

        let item = model.resolve_type::<Class>("Item", "NS").unwrap();
        let methods: Vec<&str> = item.methods().iter().map(|m| m.name.as_str()).collect();
        assert_eq!(methods, vec!["Shout"]);
        assert!(model.resolve_type::<Method>("Shout", "NS").is_none());
        assert!(model.resolve_type::<Method>("Lengths", "NS").is_none());
    }

    #[test]
    fn entity_container_pointer_to_entity_type_is_error() {
        let document = r#"{
            "$Version": "4.0",
            "$EntityContainer": "NS.Item",
            "NS": {
                "Item": {
                    "$Kind": "EntityType",
                    "Related": { "$Kind": "NavigationProperty", "$Type": "NS.Item" }
                }
            }
        }"#;
        let err = read_model_str(document, &ReadOptions::default()).unwrap_err();
        assert!(matches!(
            err,
            ReadError::InvalidElement { ref path, .. } if path == "/$EntityContainer"
        ));
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn entity_container_pointer_to_missing_element_is_error() {
        let document = r#"{
            "$Version": "4.0",
            "$EntityContainer": "NS.Service",
            "NS": { "Item": { "$Kind": "EntityType" } }
        }"#;
        let err = read_model_str(document, &ReadOptions::default()).unwrap_err();
        assert!(matches!(
            err,
            ReadError::UnknownType { ref name, .. } if name == "NS.Service"
        ));
    }

    #[test]
    fn untyped_entity_set_is_error() {
        let document = r#"{
            "$Version": "4.0",
            "$EntityContainer": "NS.Service",
            "NS": {
                "Item": { "$Kind": "EntityType" },
                "Service": {
                    "$Kind": "EntityContainer",
                    "Items": { "$Collection": true }
                }
            }
        }"#;
        let err = read_model_str(document, &ReadOptions::default()).unwrap_err();
        assert!(matches!(
            err,
            ReadError::InvalidElement { ref path, .. } if path == "/NS/Service/Items"
        ));
    }

    #[test]
    fn resolves_capabilities_for_v4() {
        let model = read(&ReadOptions::default());
        let service = model.entity_container().unwrap();
        let items = model.find_property(service, "Items").unwrap();
        let item = model.resolve_type_id("Item", "NS").unwrap();
        let related = model.find_property(item, "Related").unwrap();

        assert_eq!(
            model.property(items).unwrap().projection().capabilities(),
            &[Capability::Deletable(true)]
        );
        assert_eq!(
            model.property(related).unwrap().projection().capabilities(),
            &[Capability::Deletable(false)]
        );
    }

    #[test]
    fn v3_and_disabled_resolution_leave_projections_empty() {
        for options in [
            ReadOptions::new(ServiceType::ODataV3),
            ReadOptions::default().resolve_capabilities(false),
        ] {
            let model = read(&options);
            assert!(model
                .properties()
                .all(|(_, p)| p.projection().capabilities().is_empty()));
        }
    }

    #[test]
    fn missing_document_is_error() {
        let err = read_model(ServiceMetadata::new(), &ReadOptions::default()).unwrap_err();
        assert!(matches!(err, ReadError::MissingDocument { .. }));
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn validation_can_be_skipped() {
        let document = r#"{ "NS": { "Item": { "$Kind": "EntityType" } } }"#;
        let err = read_model_str(document, &ReadOptions::default()).unwrap_err();
        assert_eq!(err.exit_code(), 1);

        let model = read_model_str(document, &ReadOptions::default().validate(false)).unwrap();
        assert!(model.resolve_type::<Class>("Item", "NS").is_some());
        assert_eq!(model.entity_container(), None);
    }

    #[test]
    fn unknown_type_reference_is_error() {
        let document = r#"{
            "$Version": "4.0",
            "NS": { "Item": { "$Kind": "EntityType", "Owner": { "$Type": "NS.Person" } } }
        }"#;
        let err = read_model_str(document, &ReadOptions::default()).unwrap_err();
        assert!(matches!(
            err,
            ReadError::UnknownType { ref name, ref path } if name == "NS.Person" && path == "/NS/Item/Owner"
        ));
    }

    #[test]
    fn unknown_key_property_is_error() {
        let document = r#"{
            "$Version": "4.0",
            "NS": { "Item": { "$Kind": "EntityType", "$Key": ["Id"] } }
        }"#;
        let err = read_model_str(document, &ReadOptions::default()).unwrap_err();
        assert!(matches!(
            err,
            ReadError::Model(ModelError::PropertyNotFound { .. })
        ));
    }

    #[test]
    fn unique_container_policy() {
        let document = r#"{
            "$Version": "4.0",
            "A": { "Box": { "$Kind": "EntityContainer" } },
            "B": { "Box": { "$Kind": "EntityContainer" } }
        }"#;
        assert!(read_model_str(document, &ReadOptions::default()).is_ok());

        let options = ReadOptions::default().container_policy(ContainerPolicy::Unique);
        let err = read_model_str(document, &options).unwrap_err();
        assert!(matches!(
            err,
            ReadError::Model(ModelError::MultipleEntityContainers { .. })
        ));
    }

    #[test]
    fn malformed_restriction_fails_read() {
        let document = r#"{
            "$Version": "4.0",
            "$EntityContainer": "NS.Service",
            "NS": {
                "Item": { "$Kind": "EntityType" },
                "Service": {
                    "$Kind": "EntityContainer",
                    "Items": {
                        "$Collection": true,
                        "$Type": "NS.Item",
                        "@Org.OData.Capabilities.V1.InsertRestrictions": {
                            "Insertable": false,
                            "NonInsertableNavigationProperties": ["Missing"]
                        }
                    }
                }
            }
        }"#;
        let err = read_model_str(document, &ReadOptions::default()).unwrap_err();
        assert!(matches!(err, ReadError::Capability(_)));
        assert_eq!(err.exit_code(), 2);
    }
}
