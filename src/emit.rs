//! JSON export of a compiled model for code writers.

use serde::Serialize;
use serde_json::{json, Map, Value};

use crate::capability::{Capability, CapabilityKind};
use crate::model::{Class, Method, MethodKind, Model, OcmType, Parameter, Property, TypeVariant};
use crate::types::PropertyId;

/// Capabilities projected onto one property.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CapabilityEntry {
    /// `Namespace.Class/Property`
    pub property: String,
    pub capabilities: Vec<Capability>,
}

/// Every property whose projection carries capabilities, in registration order.
pub fn capability_summary(model: &Model) -> Vec<CapabilityEntry> {
    model
        .properties()
        .filter(|(_, p)| !p.projection().capabilities().is_empty())
        .map(|(_, p)| CapabilityEntry {
            property: format!("{}/{}", model.type_name(p.declaring_class()), p.name()),
            capabilities: p.projection().capabilities().to_vec(),
        })
        .collect()
}

/// Render the model as JSON: namespaces with their types, members and projections.
pub fn model_to_json(model: &Model) -> Value {
    let namespaces: Vec<Value> = model
        .namespaces()
        .iter()
        .map(|namespace| {
            let types: Vec<Value> = namespace
                .types()
                .iter()
                .filter_map(|id| model.type_def(*id))
                .map(|ty| type_to_json(model, ty))
                .collect();
            json!({ "name": namespace.name(), "types": types })
        })
        .collect();

    json!({
        "serviceType": model.service_type(),
        "entityContainer": model.entity_container().map(|id| model.type_name(id)),
        "namespaces": namespaces,
    })
}

fn type_to_json(model: &Model, ty: &OcmType) -> Value {
    match ty.variant() {
        TypeVariant::Primitive(_) => json!({ "name": ty.name(), "kind": "primitive" }),
        TypeVariant::Operation(method) => {
            let mut out = method_to_json(model, method);
            out.insert("kind".into(), json!("operation"));
            Value::Object(out)
        }
        TypeVariant::Class(class) => Value::Object(class_to_json(model, ty.name(), class)),
    }
}

fn class_to_json(model: &Model, name: &str, class: &Class) -> Map<String, Value> {
    let mut out = Map::new();
    out.insert("name".into(), json!(name));
    out.insert("kind".into(), json!(class.kind()));
    if let Some(base) = class.base() {
        out.insert("base".into(), json!(model.type_name(base)));
    }
    if class.is_abstract() {
        out.insert("abstract".into(), json!(true));
    }
    if !class.key().is_empty() {
        let key: Vec<&str> = class
            .key()
            .iter()
            .filter_map(|id| model.property(*id))
            .map(Property::name)
            .collect();
        out.insert("key".into(), json!(key));
    }
    if !class.members().is_empty() {
        let members: Map<String, Value> = class
            .members()
            .iter()
            .map(|m| (m.name.clone(), json!(m.value)))
            .collect();
        out.insert("members".into(), Value::Object(members));
    }
    if !class.properties().is_empty() {
        let properties: Vec<Value> = class
            .properties()
            .iter()
            .filter_map(|id| property_to_json(model, *id))
            .collect();
        out.insert("properties".into(), json!(properties));
    }
    if !class.methods().is_empty() {
        let methods: Vec<Value> = class
            .methods()
            .iter()
            .map(|m| Value::Object(method_to_json(model, m)))
            .collect();
        out.insert("methods".into(), json!(methods));
    }
    out
}

fn property_to_json(model: &Model, id: PropertyId) -> Option<Value> {
    let property = model.property(id)?;
    let projection = property.projection();
    let supports: Map<String, Value> = CapabilityKind::ALL
        .iter()
        .map(|kind| (kind.as_str().to_string(), json!(projection.supports(*kind))))
        .collect();

    Some(json!({
        "name": property.name(),
        "type": model.type_name(projection.type_id()),
        "collection": property.is_collection(),
        "nullable": property.is_nullable(),
        "navigation": property.is_navigation(),
        "capabilities": projection.capabilities(),
        "supports": supports,
    }))
}

fn method_to_json(model: &Model, method: &Method) -> Map<String, Value> {
    let mut out = Map::new();
    out.insert("name".into(), json!(method.name));
    out.insert(
        "method".into(),
        json!(match method.kind {
            MethodKind::Action => "action",
            MethodKind::Function => "function",
        }),
    );
    if method.is_bound {
        out.insert("bound".into(), json!(true));
    }
    if method.is_composable {
        out.insert("composable".into(), json!(true));
    }
    let parameters: Vec<Value> = method
        .parameters
        .iter()
        .map(|p| parameter_to_json(model, p))
        .collect();
    out.insert("parameters".into(), json!(parameters));
    if let Some(returns) = method.return_type {
        out.insert(
            "returns".into(),
            json!({
                "type": model.type_name(returns),
                "collection": method.returns_collection,
            }),
        );
    }
    out
}

fn parameter_to_json(model: &Model, parameter: &Parameter) -> Value {
    json!({
        "name": parameter.name,
        "type": model.type_name(parameter.type_id),
        "collection": parameter.is_collection,
        "nullable": parameter.is_nullable,
    })
}
