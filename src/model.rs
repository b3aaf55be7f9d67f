//! The object code model: a registry of namespaces, types and properties.
//!
//! Types live in a flat arena addressed by [`TypeId`]; namespaces hold the ids
//! of the types declared under them. Properties live in a second arena
//! addressed by [`PropertyId`] and always belong to exactly one class.
//!
//! # Identity
//!
//! A type is identified by its (name, namespace) pair, unique across the model.

use crate::error::ModelError;
use crate::projection::Projection;
use crate::types::{ClassKind, PropertyId, ServiceMetadata, ServiceType, TypeId};

/// A named bucket of types.
#[derive(Debug, Clone)]
pub struct Namespace {
    name: String,
    types: Vec<TypeId>,
}

impl Namespace {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Types in registration order.
    pub fn types(&self) -> &[TypeId] {
        &self.types
    }
}

/// A registered type: common identity plus a variant payload.
#[derive(Debug, Clone)]
pub struct OcmType {
    name: String,
    namespace: String,
    variant: TypeVariant,
}

#[derive(Debug, Clone)]
pub enum TypeVariant {
    Primitive(Primitive),
    Class(Class),
    /// An unbound operation declared at namespace level.
    Operation(Method),
}

/// Payload of primitive and type-definition types.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Primitive;

impl OcmType {
    pub fn primitive(name: impl Into<String>, namespace: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            namespace: namespace.into(),
            variant: TypeVariant::Primitive(Primitive),
        }
    }

    pub fn class(name: impl Into<String>, namespace: impl Into<String>, kind: ClassKind) -> Self {
        Self {
            name: name.into(),
            namespace: namespace.into(),
            variant: TypeVariant::Class(Class::new(kind)),
        }
    }

    pub fn operation(
        name: impl Into<String>,
        namespace: impl Into<String>,
        method: Method,
    ) -> Self {
        Self {
            name: name.into(),
            namespace: namespace.into(),
            variant: TypeVariant::Operation(method),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// `Namespace.Name`
    pub fn full_name(&self) -> String {
        format!("{}.{}", self.namespace, self.name)
    }

    pub fn variant(&self) -> &TypeVariant {
        &self.variant
    }

    pub fn as_class(&self) -> Option<&Class> {
        Class::from_type(self)
    }
}

/// Typed view onto a registered type, used by [`Model::resolve_type`].
pub trait TypeVariantRef {
    /// Returns `None` when `ty` is not of this variant.
    fn from_type(ty: &OcmType) -> Option<&Self>;
}

impl TypeVariantRef for OcmType {
    fn from_type(ty: &OcmType) -> Option<&Self> {
        Some(ty)
    }
}

impl TypeVariantRef for Class {
    fn from_type(ty: &OcmType) -> Option<&Self> {
        match &ty.variant {
            TypeVariant::Class(class) => Some(class),
            _ => None,
        }
    }
}

impl TypeVariantRef for Primitive {
    fn from_type(ty: &OcmType) -> Option<&Self> {
        match &ty.variant {
            TypeVariant::Primitive(primitive) => Some(primitive),
            _ => None,
        }
    }
}

impl TypeVariantRef for Method {
    fn from_type(ty: &OcmType) -> Option<&Self> {
        match &ty.variant {
            TypeVariant::Operation(method) => Some(method),
            _ => None,
        }
    }
}

/// Entity, complex, enum and service types.
#[derive(Debug, Clone)]
pub struct Class {
    kind: ClassKind,
    base: Option<TypeId>,
    is_abstract: bool,
    properties: Vec<PropertyId>,
    key: Vec<PropertyId>,
    methods: Vec<Method>,
    members: Vec<EnumMember>,
}

impl Class {
    pub fn new(kind: ClassKind) -> Self {
        Self {
            kind,
            base: None,
            is_abstract: false,
            properties: Vec::new(),
            key: Vec::new(),
            methods: Vec::new(),
            members: Vec::new(),
        }
    }

    pub fn kind(&self) -> ClassKind {
        self.kind
    }

    pub fn base(&self) -> Option<TypeId> {
        self.base
    }

    pub fn is_abstract(&self) -> bool {
        self.is_abstract
    }

    /// Declared properties in declaration order (inherited ones excluded).
    pub fn properties(&self) -> &[PropertyId] {
        &self.properties
    }

    pub fn key(&self) -> &[PropertyId] {
        &self.key
    }

    pub fn methods(&self) -> &[Method] {
        &self.methods
    }

    /// Members of an enum class.
    pub fn members(&self) -> &[EnumMember] {
        &self.members
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumMember {
    pub name: String,
    pub value: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MethodKind {
    Action,
    Function,
}

/// An operation, either bound to a class or declared at namespace level.
#[derive(Debug, Clone)]
pub struct Method {
    pub name: String,
    pub kind: MethodKind,
    pub parameters: Vec<Parameter>,
    pub return_type: Option<TypeId>,
    pub returns_collection: bool,
    /// The first parameter is the binding parameter.
    pub is_bound: bool,
    pub is_composable: bool,
}

impl Method {
    pub fn new(name: impl Into<String>, kind: MethodKind) -> Self {
        Self {
            name: name.into(),
            kind,
            parameters: Vec::new(),
            return_type: None,
            returns_collection: false,
            is_bound: false,
            is_composable: false,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Parameter {
    pub name: String,
    pub type_id: TypeId,
    pub is_collection: bool,
    pub is_nullable: bool,
}

/// Description of a property to add with [`Model::add_property`].
#[derive(Debug, Clone)]
pub struct PropertyDef {
    pub name: String,
    pub value_type: TypeId,
    pub is_collection: bool,
    pub is_nullable: bool,
    pub is_navigation: bool,
}

impl PropertyDef {
    pub fn new(name: impl Into<String>, value_type: TypeId) -> Self {
        Self {
            name: name.into(),
            value_type,
            is_collection: false,
            is_nullable: false,
            is_navigation: false,
        }
    }

    pub fn collection(mut self, is_collection: bool) -> Self {
        self.is_collection = is_collection;
        self
    }

    pub fn nullable(mut self, is_nullable: bool) -> Self {
        self.is_nullable = is_nullable;
        self
    }

    pub fn navigation(mut self, is_navigation: bool) -> Self {
        self.is_navigation = is_navigation;
        self
    }
}

/// A member property of a class.
#[derive(Debug, Clone)]
pub struct Property {
    name: String,
    declaring_class: TypeId,
    value_type: TypeId,
    is_collection: bool,
    is_nullable: bool,
    is_navigation: bool,
    projection: Projection,
}

impl Property {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn declaring_class(&self) -> TypeId {
        self.declaring_class
    }

    pub fn value_type(&self) -> TypeId {
        self.value_type
    }

    pub fn is_collection(&self) -> bool {
        self.is_collection
    }

    pub fn is_nullable(&self) -> bool {
        self.is_nullable
    }

    pub fn is_navigation(&self) -> bool {
        self.is_navigation
    }

    /// The projection assigned by the capability engine; initially the value
    /// type with no capabilities.
    pub fn projection(&self) -> &Projection {
        &self.projection
    }
}

/// The compiled model of one service.
#[derive(Debug, Clone)]
pub struct Model {
    namespaces: Vec<Namespace>,
    types: Vec<OcmType>,
    properties: Vec<Property>,
    service_metadata: ServiceMetadata,
    service_type: ServiceType,
}

impl Model {
    pub fn new(service_metadata: ServiceMetadata, service_type: ServiceType) -> Self {
        Self {
            namespaces: Vec::new(),
            types: Vec::new(),
            properties: Vec::new(),
            service_metadata,
            service_type,
        }
    }

    pub fn service_metadata(&self) -> &ServiceMetadata {
        &self.service_metadata
    }

    pub fn service_type(&self) -> ServiceType {
        self.service_type
    }

    /// Namespaces in order of first registration.
    pub fn namespaces(&self) -> &[Namespace] {
        &self.namespaces
    }

    pub fn namespace(&self, name: &str) -> Option<&Namespace> {
        self.namespaces.iter().find(|n| n.name == name)
    }

    /// Register a type under its namespace, creating the namespace on first use.
    ///
    /// Registration is not idempotent: a second type under a (name, namespace)
    /// pair that is already taken is a model-building error rather than a
    /// second entry at that key, so resolution never sees two candidates.
    ///
    /// # Errors
    ///
    /// Returns `ModelError::DuplicateType` if the (name, namespace) pair is taken.
    pub fn add_type(&mut self, ty: OcmType) -> Result<TypeId, ModelError> {
        if self.resolve_type_id(&ty.name, &ty.namespace).is_some() {
            return Err(ModelError::DuplicateType {
                namespace: ty.namespace,
                name: ty.name,
            });
        }
        let id = TypeId(self.types.len());
        let index = match self.namespaces.iter().position(|n| n.name == ty.namespace) {
            Some(index) => index,
            None => {
                self.namespaces.push(Namespace {
                    name: ty.namespace.clone(),
                    types: Vec::new(),
                });
                self.namespaces.len() - 1
            }
        };
        self.namespaces[index].types.push(id);
        self.types.push(ty);
        Ok(id)
    }

    pub fn type_def(&self, id: TypeId) -> Option<&OcmType> {
        self.types.get(id.0)
    }

    /// All registered types in registration order.
    pub fn types(&self) -> impl Iterator<Item = (TypeId, &OcmType)> {
        self.types.iter().enumerate().map(|(i, ty)| (TypeId(i), ty))
    }

    pub fn class(&self, id: TypeId) -> Option<&Class> {
        self.type_def(id).and_then(OcmType::as_class)
    }

    /// Full name of a type, or `"?"` for a foreign id.
    pub fn type_name(&self, id: TypeId) -> String {
        self.type_def(id)
            .map(OcmType::full_name)
            .unwrap_or_else(|| "?".to_string())
    }

    /// Id of the type registered under (`name`, `namespace`).
    pub fn resolve_type_id(&self, name: &str, namespace: &str) -> Option<TypeId> {
        self.types
            .iter()
            .position(|t| t.name == name && t.namespace == namespace)
            .map(TypeId)
    }

    /// Resolve a type by exact name and namespace as the requested variant.
    ///
    /// A type registered under the pair but of another variant is reported as
    /// `None`, exactly like an absent type; the two cases cannot be told apart
    /// here. Use [`Model::resolve_type_id`] to check for presence alone.
    pub fn resolve_type<T: TypeVariantRef>(&self, name: &str, namespace: &str) -> Option<&T> {
        let id = self.resolve_type_id(name, namespace)?;
        T::from_type(&self.types[id.0])
    }

    /// The Service class: first match in namespace-then-declaration order.
    pub fn entity_container(&self) -> Option<TypeId> {
        self.entity_containers().into_iter().next()
    }

    /// Every Service class in namespace-then-declaration order.
    pub fn entity_containers(&self) -> Vec<TypeId> {
        self.namespaces
            .iter()
            .flat_map(|n| n.types.iter().copied())
            .filter(|id| {
                self.class(*id)
                    .map(|c| c.kind == ClassKind::Service)
                    .unwrap_or(false)
            })
            .collect()
    }

    /// Like [`Model::entity_container`], but more than one Service class is an error.
    pub fn unique_entity_container(&self) -> Result<Option<TypeId>, ModelError> {
        let containers = self.entity_containers();
        if containers.len() > 1 {
            return Err(ModelError::MultipleEntityContainers {
                names: containers.iter().map(|id| self.type_name(*id)).collect(),
            });
        }
        Ok(containers.into_iter().next())
    }

    fn class_mut(&mut self, id: TypeId) -> Result<&mut Class, ModelError> {
        let ty = self
            .types
            .get_mut(id.0)
            .ok_or(ModelError::UnknownType { id: id.0 })?;
        let name = ty.full_name();
        match &mut ty.variant {
            TypeVariant::Class(class) => Ok(class),
            _ => Err(ModelError::NotAClass { name }),
        }
    }

    fn check_type(&self, id: TypeId) -> Result<(), ModelError> {
        match self.type_def(id) {
            Some(_) => Ok(()),
            None => Err(ModelError::UnknownType { id: id.0 }),
        }
    }

    pub fn set_base(&mut self, class: TypeId, base: TypeId) -> Result<(), ModelError> {
        self.check_type(base)?;
        self.class_mut(class)?.base = Some(base);
        Ok(())
    }

    pub fn set_abstract(&mut self, class: TypeId, is_abstract: bool) -> Result<(), ModelError> {
        self.class_mut(class)?.is_abstract = is_abstract;
        Ok(())
    }

    /// Add a property to `class`. Its projection starts out as the value type
    /// with no capabilities.
    pub fn add_property(&mut self, class: TypeId, def: PropertyDef) -> Result<PropertyId, ModelError> {
        self.check_type(def.value_type)?;
        let id = PropertyId(self.properties.len());
        self.class_mut(class)?.properties.push(id);
        self.properties.push(Property {
            name: def.name,
            declaring_class: class,
            value_type: def.value_type,
            is_collection: def.is_collection,
            is_nullable: def.is_nullable,
            is_navigation: def.is_navigation,
            projection: def.value_type.projection(Vec::new()),
        });
        Ok(id)
    }

    pub fn set_key(&mut self, class: TypeId, key: Vec<PropertyId>) -> Result<(), ModelError> {
        self.class_mut(class)?.key = key;
        Ok(())
    }

    pub fn add_method(&mut self, class: TypeId, method: Method) -> Result<(), ModelError> {
        self.class_mut(class)?.methods.push(method);
        Ok(())
    }

    pub fn add_enum_member(&mut self, class: TypeId, member: EnumMember) -> Result<(), ModelError> {
        self.class_mut(class)?.members.push(member);
        Ok(())
    }

    pub fn property(&self, id: PropertyId) -> Option<&Property> {
        self.properties.get(id.0)
    }

    /// All registered properties in registration order.
    pub fn properties(&self) -> impl Iterator<Item = (PropertyId, &Property)> {
        self.properties
            .iter()
            .enumerate()
            .map(|(i, p)| (PropertyId(i), p))
    }

    pub(crate) fn set_projection(&mut self, id: PropertyId, projection: Projection) {
        if let Some(property) = self.properties.get_mut(id.0) {
            property.projection = projection;
        }
    }

    /// Find a member of `class` or of one of its base classes by name.
    fn find_member(&self, class: TypeId, name: &str) -> Option<PropertyId> {
        let mut current = Some(class);
        // Bounded by the type count so a cyclic base chain cannot spin forever.
        for _ in 0..=self.types.len() {
            let class = self.class(current?)?;
            let found = class
                .properties
                .iter()
                .copied()
                .find(|id| self.properties[id.0].name == name);
            if found.is_some() {
                return found;
            }
            current = class.base;
        }
        None
    }

    /// Resolve a dotted property path (`A.B.C`) starting at `class`.
    ///
    /// Each segment after the first is looked up on the value type of the
    /// property named by the previous segment. Inherited members count.
    pub fn find_property(&self, class: TypeId, path: &str) -> Result<PropertyId, ModelError> {
        if self.class(class).is_none() {
            return Err(ModelError::NotAClass {
                name: self.type_name(class),
            });
        }
        let not_found = |segment: &str| ModelError::PropertyNotFound {
            class: self.type_name(class),
            path: path.to_string(),
            segment: segment.to_string(),
        };

        let mut segments = path.split('.');
        let Some(first) = segments.next() else {
            return Err(not_found(path));
        };
        let mut found = self.find_member(class, first).ok_or_else(|| not_found(first))?;
        for segment in segments {
            let owner = self.properties[found.0].value_type;
            found = self
                .find_member(owner, segment)
                .ok_or_else(|| not_found(segment))?;
        }
        Ok(found)
    }
}
