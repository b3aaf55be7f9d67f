//! The bundled capabilities vocabulary.
//!
//! The vocabulary is a fixed CSDL JSON document shipped with the crate; it is
//! not service specific. Failing to load it is a configuration error.

use serde_json::Value;

use crate::capability::{CapabilityKind, CAPABILITIES_NAMESPACE};
use crate::error::{CapabilityError, ValidateError};
use crate::metadata::{is_control, CsdlDocument, TermName};
use crate::validator::validate_csdl;

const BUNDLED: &str = include_str!("../vocabularies/Org.OData.Capabilities.V1.json");

/// A term declared by a vocabulary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Term {
    pub name: String,
    /// Qualified type of the term's value.
    pub type_name: String,
    pub applies_to: Vec<String>,
}

/// A parsed vocabulary schema.
#[derive(Debug, Clone)]
pub struct Vocabulary {
    namespace: String,
    terms: Vec<Term>,
}

impl Vocabulary {
    /// Load the `Org.OData.Capabilities.V1` vocabulary embedded in the crate.
    pub fn bundled() -> Result<Self, CapabilityError> {
        let vocabulary = Self::parse(BUNDLED)?;
        if vocabulary.namespace != CAPABILITIES_NAMESPACE {
            return Err(CapabilityError::Vocabulary {
                message: format!(
                    "expected namespace {}, found {}",
                    CAPABILITIES_NAMESPACE, vocabulary.namespace
                ),
            });
        }
        Ok(vocabulary)
    }

    /// Parse a vocabulary from CSDL JSON text. The first schema of the document
    /// is the vocabulary.
    ///
    /// # Errors
    ///
    /// Returns `CapabilityError::Vocabulary` if the text is not a valid CSDL
    /// document or declares no schema.
    pub fn parse(text: &str) -> Result<Self, CapabilityError> {
        let root: Value = serde_json::from_str(text).map_err(|e| CapabilityError::Vocabulary {
            message: e.to_string(),
        })?;
        validate_csdl(&root).map_err(|e| CapabilityError::Vocabulary {
            message: describe(&e),
        })?;

        let document = CsdlDocument::from_value(root);
        let (namespace, schema) =
            document
                .schemas()
                .next()
                .ok_or_else(|| CapabilityError::Vocabulary {
                    message: "document declares no schema".to_string(),
                })?;

        let mut terms = Vec::new();
        for (name, element) in schema {
            if is_control(name) {
                continue;
            }
            if element.get("$Kind").and_then(Value::as_str) != Some("Term") {
                continue;
            }
            let type_name = element
                .get("$Type")
                .and_then(Value::as_str)
                .map(|t| document.qualify(t))
                .unwrap_or_else(|| "Edm.String".to_string());
            let applies_to = element
                .get("$AppliesTo")
                .and_then(Value::as_array)
                .map(|targets| {
                    targets
                        .iter()
                        .filter_map(Value::as_str)
                        .map(String::from)
                        .collect()
                })
                .unwrap_or_default();
            terms.push(Term {
                name: name.clone(),
                type_name,
                applies_to,
            });
        }

        Ok(Self {
            namespace: namespace.to_string(),
            terms,
        })
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Look up a term by exact namespace and name.
    pub fn find_term(&self, term: &TermName) -> Option<&Term> {
        if term.namespace() != self.namespace {
            return None;
        }
        self.terms.iter().find(|t| t.name == term.name())
    }

    /// Full name of the term carrying restrictions of `kind`, if declared here.
    pub fn restriction_term(&self, kind: CapabilityKind) -> Option<TermName> {
        let term = TermName::parse(kind.term())?;
        self.find_term(&term).map(|_| term)
    }
}

fn describe(error: &ValidateError) -> String {
    match error {
        ValidateError::Invalid { errors } => {
            let details: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
            format!("{}: {}", error, details.join("; "))
        }
        other => other.to_string(),
    }
}
