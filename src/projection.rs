//! Projections: a type paired with the capabilities that currently apply to it.

use serde::Serialize;

use crate::capability::{Capability, CapabilityKind};
use crate::types::TypeId;

/// Capability-annotated view of a type, as consumed by code generation.
///
/// Only [`TypeId::projection`] constructs projections, so equal
/// (type, capabilities) pairs always come out equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Projection {
    #[serde(rename = "type")]
    type_id: TypeId,
    capabilities: Vec<Capability>,
}

impl TypeId {
    /// Compute the projection of this type under `capabilities`.
    ///
    /// Pure: the result depends only on the arguments, and capability order is kept.
    pub fn projection(self, capabilities: impl Into<Vec<Capability>>) -> Projection {
        Projection {
            type_id: self,
            capabilities: capabilities.into(),
        }
    }
}

impl Projection {
    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    /// Capabilities in discovery order. Several entries of one kind may appear.
    pub fn capabilities(&self) -> &[Capability] {
        &self.capabilities
    }

    /// Whether the operation of `kind` should be exposed.
    ///
    /// False as soon as any capability of that kind is recorded as not allowed.
    pub fn supports(&self, kind: CapabilityKind) -> bool {
        !self
            .capabilities
            .iter()
            .any(|c| c.kind() == kind && !c.is_allowed())
    }
}
