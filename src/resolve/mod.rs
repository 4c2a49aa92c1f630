//! Version Resolution
//!
//! Projects a [`CertifiedModel`] onto one target version. The result is a
//! [`ResolvedModel`]: only what is active at that version, with every class
//! flattened over its active ancestors.
//!
//! Flattening walks the superclass chain from the root-most active ancestor
//! down to the class itself. A member redeclared further down replaces the
//! inherited one in place, so member order follows first declaration. An
//! ancestor that is inactive at the target version contributes nothing, but
//! the walk continues past it.
//!
//! Views are fresh values: resolving the same pair twice yields equal views.

pub mod association;

pub use association::{
    AccessorContract, AccessorOp, AnnotatedModel, AssociationAnnotation, AssociationResolver,
    DefaultInitializer, InitializerSource, InverseObligation, InverseUpdate, TargetKind,
};

use serde::Serialize;
use std::collections::{BTreeSet, HashSet};
use tracing::debug;

use crate::error::{ModelError, Result};
use crate::model::{
    Model, ModelAssociation, ModelClass, ModelDefaults, ModelField, ModelMethod, TypeRef,
};
use crate::validate::CertifiedModel;
use crate::version::{Version, VersionRange};

// =============================================================================
// Resolved view
// =============================================================================

/// A field as seen from a resolved class
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedField {
    pub field: ModelField,
    /// Class holding the winning declaration
    pub declared_in: String,
    pub inherited: bool,
}

impl ResolvedField {
    pub fn name(&self) -> &str {
        &self.field.name
    }
}

/// An association as seen from a resolved class
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedAssociation {
    pub association: ModelAssociation,
    pub declared_in: String,
    pub inherited: bool,
}

impl ResolvedAssociation {
    pub fn name(&self) -> &str {
        self.association.name()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedInterface {
    pub name: String,
    /// Active superinterfaces, transitive, nearest first
    pub superinterfaces: Vec<String>,
    pub methods: Vec<ModelMethod>,
    pub version_range: VersionRange,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedClass {
    pub name: String,
    pub description: Option<String>,
    pub is_abstract: bool,
    /// Nearest active ancestor
    pub superclass: Option<String>,
    /// Active ancestors, nearest first
    pub ancestors: Vec<String>,
    /// Active interfaces: own first, then inherited, without repeats
    pub interfaces: Vec<String>,
    pub fields: Vec<ResolvedField>,
    pub associations: Vec<ResolvedAssociation>,
    pub deprecated_version: Option<Version>,
    pub version_range: VersionRange,
}

impl ResolvedClass {
    pub fn get_field(&self, name: &str) -> Option<&ResolvedField> {
        self.fields.iter().find(|f| f.name() == name)
    }

    pub fn get_association(&self, name: &str) -> Option<&ResolvedAssociation> {
        self.associations.iter().find(|a| a.name() == name)
    }

    /// Whether `name` is this class, an ancestor or an implemented interface
    pub fn conforms_to(&self, name: &str) -> bool {
        self.name == name
            || self.ancestors.iter().any(|a| a == name)
            || self.interfaces.iter().any(|i| i == name)
    }
}

/// Everything active at one version
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedModel {
    pub name: String,
    pub package: String,
    pub version: Version,
    pub defaults: ModelDefaults,
    pub interfaces: Vec<ResolvedInterface>,
    pub classes: Vec<ResolvedClass>,
}

impl ResolvedModel {
    pub fn get_class(&self, name: &str) -> Option<&ResolvedClass> {
        self.classes.iter().find(|c| c.name == name)
    }

    pub fn get_interface(&self, name: &str) -> Option<&ResolvedInterface> {
        self.interfaces.iter().find(|i| i.name == name)
    }

    pub fn contains_type(&self, name: &str) -> bool {
        self.get_class(name).is_some() || self.get_interface(name).is_some()
    }
}

// =============================================================================
// Resolver
// =============================================================================

/// A member while flattening, before it is split back into fields and associations
#[derive(Debug, Clone)]
enum Member<'m> {
    Field(&'m ModelField),
    Association(&'m ModelAssociation),
}

impl<'m> Member<'m> {
    fn name(&self) -> &'m str {
        match self {
            Self::Field(f) => &f.name,
            Self::Association(a) => a.name(),
        }
    }

    /// Type as compared for override conflicts
    fn type_signature(&self) -> String {
        match self {
            Self::Field(f) => f.type_name.clone(),
            Self::Association(a) if a.is_many() => {
                format!("{}<{}>", a.collection_kind.type_name(), a.target)
            }
            Self::Association(a) => a.target.clone(),
        }
    }

    fn conflicts_with(&self, other: &Member<'m>) -> bool {
        match (self, other) {
            (Self::Field(a), Self::Field(b)) => a.type_name != b.type_name,
            (Self::Association(a), Self::Association(b)) => {
                a.target != b.target
                    || a.multiplicity != b.multiplicity
                    || (a.is_many() && a.collection_kind != b.collection_kind)
            }
            _ => true,
        }
    }
}

struct Slot<'m> {
    member: Member<'m>,
    declared_in: &'m str,
}

/// Projects a certified model onto a target version
pub struct VersionResolver<'a> {
    model: &'a Model,
    version: &'a Version,
}

impl<'a> VersionResolver<'a> {
    pub fn new(certified: &'a CertifiedModel, version: &'a Version) -> Self {
        Self {
            model: certified.model(),
            version,
        }
    }

    /// Build the resolved view
    pub fn resolve(&self) -> Result<ResolvedModel> {
        let model = self.model;
        if !model.version_range.contains(self.version) {
            return Err(ModelError::resolution(
                &model.name,
                format!("model range '{}' does not cover version {}", model.version_range, self.version),
            ));
        }

        let interfaces = model
            .interfaces
            .iter()
            .filter(|i| self.is_active(&i.effective_range(&model.version_range)))
            .map(|i| ResolvedInterface {
                name: i.name.clone(),
                superinterfaces: self.interface_closure(i.superinterfaces.iter().map(String::as_str)),
                methods: i.methods.clone(),
                version_range: i.effective_range(&model.version_range),
            })
            .collect();

        let mut classes = Vec::new();
        for class in &model.classes {
            let range = class.effective_range(&model.version_range);
            if self.is_active(&range) {
                classes.push(self.resolve_class(class, range)?);
            }
        }

        let resolved = ResolvedModel {
            name: model.name.clone(),
            package: model.package_name().to_string(),
            version: self.version.clone(),
            defaults: model.defaults.clone(),
            interfaces,
            classes,
        };

        debug!(
            model = %resolved.name,
            version = %resolved.version,
            classes = resolved.classes.len(),
            interfaces = resolved.interfaces.len(),
            "resolved model"
        );
        Ok(resolved)
    }

    fn is_active(&self, range: &VersionRange) -> bool {
        range.contains(self.version)
    }

    fn type_active(&self, name: &str) -> Option<bool> {
        self.model
            .lookup(name)
            .map(|t| self.is_active(&t.effective_range(&self.model.version_range)))
    }

    /// Superclass chain, nearest first, active or not
    fn chain(&self, class: &'a ModelClass) -> Result<Vec<&'a ModelClass>> {
        let mut chain = Vec::new();
        let mut seen: HashSet<&str> = HashSet::from([class.name.as_str()]);
        let mut current = class;

        while let Some(parent) = &current.superclass {
            let next = self.model.get_class(parent).ok_or_else(|| {
                ModelError::resolution(&current.name, format!("superclass '{}' is not a declared class", parent))
            })?;
            if !seen.insert(next.name.as_str()) {
                return Err(ModelError::resolution(
                    &class.name,
                    format!("superclass chain loops back at '{}'", next.name),
                ));
            }
            chain.push(next);
            current = next;
        }
        Ok(chain)
    }

    /// Active interfaces reachable from `roots`, breadth first, without repeats.
    /// Inactive interfaces are skipped but their parents are still visited.
    fn interface_closure<'n>(&self, roots: impl Iterator<Item = &'n str>) -> Vec<String> {
        let mut ordered = Vec::new();
        let mut visited: BTreeSet<&str> = BTreeSet::new();
        let mut queue: Vec<&str> = roots.collect();

        while !queue.is_empty() {
            let mut next = Vec::new();
            for name in queue {
                if !visited.insert(name) {
                    continue;
                }
                let Some(TypeRef::Interface(interface)) = self.model.lookup(name) else {
                    continue;
                };
                if self.is_active(&interface.effective_range(&self.model.version_range)) {
                    ordered.push(interface.name.clone());
                }
                next.extend(interface.superinterfaces.iter().map(String::as_str));
            }
            queue = next;
        }
        ordered
    }

    fn resolve_class(&self, class: &'a ModelClass, range: VersionRange) -> Result<ResolvedClass> {
        let model_range = &self.model.version_range;
        let active_ancestors: Vec<&ModelClass> = self
            .chain(class)?
            .into_iter()
            .filter(|c| self.is_active(&c.effective_range(model_range)))
            .collect();

        // Own interfaces first, then each ancestor's, nearest first
        let interface_roots = std::iter::once(class)
            .chain(active_ancestors.iter().copied())
            .flat_map(|c| c.interfaces.iter().map(String::as_str));
        let interfaces = self.interface_closure(interface_roots);

        let mut slots: Vec<Slot<'a>> = Vec::new();
        for owner in active_ancestors.iter().rev().copied().chain(std::iter::once(class)) {
            let owner_range = owner.effective_range(model_range);
            let members = owner
                .fields
                .iter()
                .filter(|f| self.is_active(&f.effective_range(&owner_range)))
                .map(Member::Field)
                .chain(
                    owner
                        .associations
                        .iter()
                        .filter(|a| self.is_active(&a.effective_range(&owner_range)))
                        .map(Member::Association),
                );

            for member in members {
                let slot = Slot {
                    member,
                    declared_in: owner.name.as_str(),
                };
                match slots.iter_mut().find(|s| s.member.name() == slot.member.name()) {
                    Some(existing) => {
                        if slot.member.conflicts_with(&existing.member) {
                            return Err(ModelError::TypeConflict {
                                class: class.name.clone(),
                                member: slot.member.name().to_string(),
                                declared_in: slot.declared_in.to_string(),
                                declared_type: slot.member.type_signature(),
                                inherited_from: existing.declared_in.to_string(),
                                inherited_type: existing.member.type_signature(),
                            });
                        }
                        *existing = slot;
                    }
                    None => slots.push(slot),
                }
            }
        }

        let mut fields = Vec::new();
        let mut associations = Vec::new();
        for slot in slots {
            let inherited = slot.declared_in != class.name;
            match slot.member {
                Member::Field(field) => fields.push(ResolvedField {
                    field: field.clone(),
                    declared_in: slot.declared_in.to_string(),
                    inherited,
                }),
                Member::Association(association) => {
                    match self.type_active(&association.target) {
                        Some(true) => {}
                        Some(false) => {
                            return Err(ModelError::resolution(
                                format!("{}.{}", class.name, association.name()),
                                format!("target '{}' is not active at version {}", association.target, self.version),
                            ))
                        }
                        None => {
                            return Err(ModelError::resolution(
                                format!("{}.{}", class.name, association.name()),
                                format!("target '{}' is not declared", association.target),
                            ))
                        }
                    }
                    associations.push(ResolvedAssociation {
                        association: association.clone(),
                        declared_in: slot.declared_in.to_string(),
                        inherited,
                    });
                }
            }
        }

        let ancestors: Vec<String> = active_ancestors.iter().map(|c| c.name.clone()).collect();
        Ok(ResolvedClass {
            name: class.name.clone(),
            description: class.description.clone(),
            is_abstract: class.is_abstract,
            superclass: ancestors.first().cloned(),
            ancestors,
            interfaces,
            fields,
            associations,
            deprecated_version: class.deprecated_version.clone(),
            version_range: range,
        })
    }
}

impl CertifiedModel {
    /// Resolved view at `version`
    pub fn resolve(&self, version: &Version) -> Result<ResolvedModel> {
        VersionResolver::new(self, version).resolve()
    }
}
