//! Capability variants: one boolean-flagged behavioral restriction each.

use serde::Serialize;

/// Namespace of the capabilities vocabulary.
pub const CAPABILITIES_NAMESPACE: &str = "Org.OData.Capabilities.V1";

pub const INSERT_RESTRICTIONS: &str = "Org.OData.Capabilities.V1.InsertRestrictions";
pub const UPDATE_RESTRICTIONS: &str = "Org.OData.Capabilities.V1.UpdateRestrictions";
pub const DELETE_RESTRICTIONS: &str = "Org.OData.Capabilities.V1.DeleteRestrictions";
pub const EXPAND_RESTRICTIONS: &str = "Org.OData.Capabilities.V1.ExpandRestrictions";

/// Discriminant of a [`Capability`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CapabilityKind {
    Insert,
    Update,
    Delete,
    Expand,
}

impl CapabilityKind {
    /// All kinds, in the order their terms are consulted.
    pub const ALL: [CapabilityKind; 4] = [
        CapabilityKind::Insert,
        CapabilityKind::Update,
        CapabilityKind::Delete,
        CapabilityKind::Expand,
    ];

    /// Short lowercase name, as used in serialized output.
    pub fn as_str(&self) -> &'static str {
        match self {
            CapabilityKind::Insert => "insert",
            CapabilityKind::Update => "update",
            CapabilityKind::Delete => "delete",
            CapabilityKind::Expand => "expand",
        }
    }

    /// Full name of the restriction term that carries this kind.
    pub fn term(&self) -> &'static str {
        match self {
            CapabilityKind::Insert => INSERT_RESTRICTIONS,
            CapabilityKind::Update => UPDATE_RESTRICTIONS,
            CapabilityKind::Delete => DELETE_RESTRICTIONS,
            CapabilityKind::Expand => EXPAND_RESTRICTIONS,
        }
    }

    /// Construct the capability of this kind carrying `allowed`.
    pub fn capability(self, allowed: bool) -> Capability {
        match self {
            CapabilityKind::Insert => Capability::Insertable(allowed),
            CapabilityKind::Update => Capability::Updatable(allowed),
            CapabilityKind::Delete => Capability::Deletable(allowed),
            CapabilityKind::Expand => Capability::Expandable(allowed),
        }
    }
}

/// A single restriction: two capabilities are equal iff they have the same
/// kind and the same flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Capability {
    /// Entities can be inserted.
    Insertable(bool),
    /// Entities can be updated.
    Updatable(bool),
    /// Entities can be deleted.
    Deletable(bool),
    /// `$expand` is supported.
    Expandable(bool),
}

impl Capability {
    /// The permissive default of `kind`: flag is `true`.
    pub fn default_for(kind: CapabilityKind) -> Self {
        kind.capability(true)
    }

    pub fn insertable() -> Self {
        Self::default_for(CapabilityKind::Insert)
    }

    pub fn updatable() -> Self {
        Self::default_for(CapabilityKind::Update)
    }

    pub fn deletable() -> Self {
        Self::default_for(CapabilityKind::Delete)
    }

    pub fn expandable() -> Self {
        Self::default_for(CapabilityKind::Expand)
    }

    pub fn kind(&self) -> CapabilityKind {
        match self {
            Capability::Insertable(_) => CapabilityKind::Insert,
            Capability::Updatable(_) => CapabilityKind::Update,
            Capability::Deletable(_) => CapabilityKind::Delete,
            Capability::Expandable(_) => CapabilityKind::Expand,
        }
    }

    pub fn is_allowed(&self) -> bool {
        match *self {
            Capability::Insertable(allowed)
            | Capability::Updatable(allowed)
            | Capability::Deletable(allowed)
            | Capability::Expandable(allowed) => allowed,
        }
    }
}
