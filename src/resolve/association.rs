//! Association Resolution
//!
//! Annotates every association of a [`ResolvedModel`] with what a backend
//! must honor for it:
//!
//! - the accessor contract (which operations exist, over which element type),
//! - the default initializer of a to-many container,
//! - the inverse-update obligation of a bidirectional association.
//!
//! An interface target stays the element type of the contract. Backends
//! never substitute an implementing class.

use serde::Serialize;
use std::fmt;
use tracing::debug;

use super::{ResolvedAssociation, ResolvedClass, ResolvedModel};
use crate::error::{ModelError, Result};
use crate::model::names::singular;
use crate::model::{CollectionKind, DefaultKey, Multiplicity};

// =============================================================================
// Contract vocabulary
// =============================================================================

/// Logical accessor operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum AccessorOp {
    Get,
    Set,
    Add,
    Remove,
    GetAll,
    SetAll,
}

impl AccessorOp {
    pub const TO_ONE: [AccessorOp; 2] = [AccessorOp::Get, AccessorOp::Set];
    pub const TO_MANY: [AccessorOp; 4] = [
        AccessorOp::Add,
        AccessorOp::Remove,
        AccessorOp::GetAll,
        AccessorOp::SetAll,
    ];
}

impl fmt::Display for AccessorOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Get => "get",
            Self::Set => "set",
            Self::Add => "add",
            Self::Remove => "remove",
            Self::GetAll => "getAll",
            Self::SetAll => "setAll",
        };
        write!(f, "{}", name)
    }
}

/// What kind of type the element type is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TargetKind {
    Class,
    Interface,
}

/// Operations and element type a backend must expose for one association
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessorContract {
    /// Declared target, never an implementer of it
    pub element_type: String,
    pub element_kind: TargetKind,
    pub multiplicity: Multiplicity,
    /// Container kind for to-many associations
    pub collection_kind: Option<CollectionKind>,
    pub operations: Vec<AccessorOp>,
    /// Element name used by `add`/`remove`
    pub singular_name: String,
}

impl AccessorContract {
    pub fn supports(&self, op: AccessorOp) -> bool {
        self.operations.contains(&op)
    }
}

/// Where an initializer expression came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum InitializerSource {
    /// The association's own default value
    Member,
    /// A descriptor override of the collection default
    ModelDefault,
    BuiltIn,
}

/// Expression that creates the empty container of a to-many association
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DefaultInitializer {
    pub kind: CollectionKind,
    /// Backend-neutral text; `<?>` stands for the element type
    pub expression: String,
    pub source: InitializerSource,
}

impl DefaultInitializer {
    /// Expression with the `<?>` placeholder filled in
    pub fn render(&self, element_type: &str) -> String {
        self.expression.replace("<?>", &format!("<{}>", element_type))
    }
}

/// How the inverse side changes when this side is mutated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum InverseUpdate {
    /// Inverse is to-many: add to / remove from its collection
    AddToCollection,
    /// Inverse is to-one: assign / clear
    Assign,
}

/// Symmetric update a bidirectional association owes its inverse
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InverseObligation {
    pub target_type: String,
    pub inverse_member: String,
    pub inverse_multiplicity: Multiplicity,
    pub update: InverseUpdate,
}

/// Everything known about one association of one resolved class
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AssociationAnnotation {
    pub class: String,
    pub association: String,
    pub declared_in: String,
    pub contract: AccessorContract,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub initializer: Option<DefaultInitializer>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub inverse: Option<InverseObligation>,
}

/// A resolved view with its association annotations, in traversal order
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnnotatedModel {
    pub view: ResolvedModel,
    pub annotations: Vec<AssociationAnnotation>,
}

impl AnnotatedModel {
    pub fn annotation(&self, class: &str, association: &str) -> Option<&AssociationAnnotation> {
        self.annotations
            .iter()
            .find(|a| a.class == class && a.association == association)
    }

    pub fn annotations_for<'a>(&'a self, class: &'a str) -> impl Iterator<Item = &'a AssociationAnnotation> {
        self.annotations.iter().filter(move |a| a.class == class)
    }
}

// =============================================================================
// Resolver
// =============================================================================

/// Derives association annotations from a resolved view
pub struct AssociationResolver<'a> {
    view: &'a ResolvedModel,
}

impl<'a> AssociationResolver<'a> {
    pub fn new(view: &'a ResolvedModel) -> Self {
        Self { view }
    }

    /// Annotate every association; the first broken one fails the run
    pub fn annotate_all(&self) -> Result<Vec<AssociationAnnotation>> {
        let mut annotations = Vec::new();
        for class in &self.view.classes {
            for association in &class.associations {
                annotations.push(self.annotate(class, association)?);
            }
        }
        debug!(
            model = %self.view.name,
            version = %self.view.version,
            associations = annotations.len(),
            "annotated associations"
        );
        Ok(annotations)
    }

    pub fn annotate(&self, class: &ResolvedClass, resolved: &ResolvedAssociation) -> Result<AssociationAnnotation> {
        Ok(AssociationAnnotation {
            class: class.name.clone(),
            association: resolved.name().to_string(),
            declared_in: resolved.declared_in.clone(),
            contract: self.contract(class, resolved)?,
            initializer: self.initializer(resolved),
            inverse: self.inverse(class, resolved)?,
        })
    }

    fn contract(&self, class: &ResolvedClass, resolved: &ResolvedAssociation) -> Result<AccessorContract> {
        let association = &resolved.association;
        let element_kind = if self.view.get_class(&association.target).is_some() {
            TargetKind::Class
        } else if self.view.get_interface(&association.target).is_some() {
            TargetKind::Interface
        } else {
            return Err(ModelError::resolution(
                entity(class, resolved),
                format!("target '{}' is not part of the view at version {}", association.target, self.view.version),
            ));
        };

        let (operations, collection_kind) = match association.multiplicity {
            Multiplicity::Many => (AccessorOp::TO_MANY.to_vec(), Some(association.collection_kind)),
            Multiplicity::One => (AccessorOp::TO_ONE.to_vec(), None),
        };

        Ok(AccessorContract {
            element_type: association.target.clone(),
            element_kind,
            multiplicity: association.multiplicity,
            collection_kind,
            operations,
            singular_name: singular(association.name()),
        })
    }

    /// Own default value, then the model's override, then the built-in
    fn initializer(&self, resolved: &ResolvedAssociation) -> Option<DefaultInitializer> {
        let association = &resolved.association;
        if !association.is_many() {
            return None;
        }
        let kind = association.collection_kind;
        let key = DefaultKey::for_collection(kind);

        let (expression, source) = match &association.field.default_value {
            Some(own) if !own.trim().is_empty() => (own.clone(), InitializerSource::Member),
            _ if self.view.defaults.is_overridden(key) => {
                (self.view.defaults.get(key).to_string(), InitializerSource::ModelDefault)
            }
            _ => (key.builtin_value().to_string(), InitializerSource::BuiltIn),
        };

        Some(DefaultInitializer {
            kind,
            expression,
            source,
        })
    }

    fn inverse(&self, class: &ResolvedClass, resolved: &ResolvedAssociation) -> Result<Option<InverseObligation>> {
        let association = &resolved.association;
        let Some(back_reference) = &association.back_reference else {
            return Ok(None);
        };
        let fail = |message: String| Err(ModelError::resolution(entity(class, resolved), message));

        let Some(target) = self.view.get_class(&association.target) else {
            return fail(format!(
                "back-reference '{}' needs a class target, '{}' is not one at version {}",
                back_reference, association.target, self.view.version
            ));
        };

        let Some(inverse) = target.get_association(back_reference) else {
            return if target.get_field(back_reference).is_some() {
                fail(format!(
                    "back-reference '{}.{}' is a field, not an association",
                    target.name, back_reference
                ))
            } else {
                fail(format!(
                    "back-reference '{}' does not exist on '{}' at version {}",
                    back_reference, target.name, self.view.version
                ))
            };
        };

        if !class.conforms_to(&inverse.association.target) {
            return fail(format!(
                "back-reference '{}.{}' points to '{}', not to '{}'",
                target.name, back_reference, inverse.association.target, class.name
            ));
        }

        if let Some(mirror) = &inverse.association.back_reference {
            if mirror != association.name() {
                return fail(format!(
                    "back-reference '{}.{}' names '{}' as its inverse, not '{}'",
                    target.name,
                    back_reference,
                    mirror,
                    association.name()
                ));
            }
        }

        let inverse_multiplicity = inverse.association.multiplicity;
        Ok(Some(InverseObligation {
            target_type: target.name.clone(),
            inverse_member: back_reference.clone(),
            inverse_multiplicity,
            update: match inverse_multiplicity {
                Multiplicity::Many => InverseUpdate::AddToCollection,
                Multiplicity::One => InverseUpdate::Assign,
            },
        }))
    }
}

fn entity(class: &ResolvedClass, resolved: &ResolvedAssociation) -> String {
    format!("{}.{}", class.name, resolved.name())
}

impl ResolvedModel {
    /// Attach association annotations to this view
    pub fn annotate(self) -> Result<AnnotatedModel> {
        let annotations = AssociationResolver::new(&self).annotate_all()?;
        Ok(AnnotatedModel {
            view: self,
            annotations,
        })
    }
}
