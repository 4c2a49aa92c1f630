//! Instance graph
//!
//! An in-memory interpreter of the accessor contracts in an
//! [`AnnotatedModel`]. Objects are untyped bags of association slots; every
//! mutation goes through the contract of the association it touches and
//! applies the recorded inverse obligation, so the symmetry a generated
//! accessor pair must keep can be exercised without generating anything.
//!
//! Inverse updates use raw slot writes and never recurse into another
//! accessor.

use std::collections::BTreeMap;
use std::fmt;

use crate::error::{ModelError, Result};
use crate::model::CollectionKind;
use crate::resolve::{AccessorOp, AnnotatedModel, AssociationAnnotation, InverseUpdate};

/// Handle of an object in an [`InstanceGraph`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectId(usize);

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone)]
enum Slot {
    One(Option<ObjectId>),
    Many { kind: CollectionKind, items: Vec<ObjectId> },
}

#[derive(Debug, Clone)]
struct Object {
    class: String,
    slots: BTreeMap<String, Slot>,
}

/// Objects of one annotated model and the links between them
#[derive(Debug)]
pub struct InstanceGraph<'m> {
    model: &'m AnnotatedModel,
    objects: Vec<Object>,
}

impl<'m> InstanceGraph<'m> {
    pub fn new(model: &'m AnnotatedModel) -> Self {
        Self {
            model,
            objects: Vec::new(),
        }
    }

    /// Instantiate a concrete class with every association empty
    pub fn create(&mut self, class: &str) -> Result<ObjectId> {
        let resolved = self
            .model
            .view
            .get_class(class)
            .ok_or_else(|| ModelError::contract(class, "class is not part of the view"))?;
        if resolved.is_abstract {
            return Err(ModelError::contract(class, "cannot instantiate an abstract class"));
        }

        let slots = self
            .model
            .annotations_for(class)
            .map(|a| {
                let slot = match a.contract.collection_kind {
                    Some(kind) => Slot::Many { kind, items: Vec::new() },
                    None => Slot::One(None),
                };
                (a.association.clone(), slot)
            })
            .collect();

        self.objects.push(Object {
            class: class.to_string(),
            slots,
        });
        Ok(ObjectId(self.objects.len() - 1))
    }

    pub fn class_of(&self, id: ObjectId) -> Result<&str> {
        self.object(id).map(|o| o.class.as_str())
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    // -------------------------------------------------------------------------
    // Accessors
    // -------------------------------------------------------------------------

    /// to-many `add`
    pub fn add(&mut self, owner: ObjectId, association: &str, element: ObjectId) -> Result<()> {
        let annotation = self.checked(owner, association, AccessorOp::Add)?;
        self.check_element(annotation, element)?;

        if self.raw_insert(owner, association, element)? {
            self.link_inverse(annotation, owner, element)?;
        }
        Ok(())
    }

    /// to-many `remove`
    pub fn remove(&mut self, owner: ObjectId, association: &str, element: ObjectId) -> Result<()> {
        let annotation = self.checked(owner, association, AccessorOp::Remove)?;

        if self.raw_remove(owner, association, element)? {
            self.unlink_inverse(annotation, owner, element)?;
        }
        Ok(())
    }

    /// to-many `getAll`: the live contents
    pub fn get_all(&self, owner: ObjectId, association: &str) -> Result<&[ObjectId]> {
        self.checked(owner, association, AccessorOp::GetAll)?;
        match self.slot(owner, association)? {
            Slot::Many { items, .. } => Ok(items),
            Slot::One(_) => Err(slot_mismatch(owner, association)),
        }
    }

    /// to-many `setAll`: replace the contents wholesale
    pub fn set_all(&mut self, owner: ObjectId, association: &str, elements: &[ObjectId]) -> Result<()> {
        let annotation = self.checked(owner, association, AccessorOp::SetAll)?;
        for element in elements {
            self.check_element(annotation, *element)?;
        }

        let current = self.get_all(owner, association)?.to_vec();
        for element in current {
            if self.raw_remove(owner, association, element)? {
                self.unlink_inverse(annotation, owner, element)?;
            }
        }
        for element in elements {
            if self.raw_insert(owner, association, *element)? {
                self.link_inverse(annotation, owner, *element)?;
            }
        }
        Ok(())
    }

    /// to-one `get`
    pub fn get(&self, owner: ObjectId, association: &str) -> Result<Option<ObjectId>> {
        self.checked(owner, association, AccessorOp::Get)?;
        self.raw_get(owner, association)
    }

    /// to-one `set`; `None` clears
    pub fn set(&mut self, owner: ObjectId, association: &str, value: Option<ObjectId>) -> Result<()> {
        let annotation = self.checked(owner, association, AccessorOp::Set)?;
        if let Some(element) = value {
            self.check_element(annotation, element)?;
        }

        let previous = self.raw_get(owner, association)?;
        if previous == value {
            return Ok(());
        }
        if let Some(previous) = previous {
            self.raw_assign(owner, association, None)?;
            self.unlink_inverse(annotation, owner, previous)?;
        }
        if let Some(element) = value {
            self.raw_assign(owner, association, Some(element))?;
            self.link_inverse(annotation, owner, element)?;
        }
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Inverse maintenance
    // -------------------------------------------------------------------------

    /// Make `element`'s inverse member point back at `owner`
    fn link_inverse(&mut self, annotation: &AssociationAnnotation, owner: ObjectId, element: ObjectId) -> Result<()> {
        let Some(inverse) = &annotation.inverse else {
            return Ok(());
        };
        match inverse.update {
            InverseUpdate::AddToCollection => {
                self.raw_insert(element, &inverse.inverse_member, owner)?;
            }
            InverseUpdate::Assign => {
                // element can belong to one owner only; detach it from the old one
                if let Some(old) = self.raw_get(element, &inverse.inverse_member)? {
                    if old != owner {
                        self.raw_detach(old, &annotation.association, element)?;
                    }
                }
                self.raw_assign(element, &inverse.inverse_member, Some(owner))?;
            }
        }
        Ok(())
    }

    fn unlink_inverse(&mut self, annotation: &AssociationAnnotation, owner: ObjectId, element: ObjectId) -> Result<()> {
        let Some(inverse) = &annotation.inverse else {
            return Ok(());
        };
        match inverse.update {
            InverseUpdate::AddToCollection => {
                self.raw_remove(element, &inverse.inverse_member, owner)?;
            }
            InverseUpdate::Assign => {
                if self.raw_get(element, &inverse.inverse_member)? == Some(owner) {
                    self.raw_assign(element, &inverse.inverse_member, None)?;
                }
            }
        }
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Raw slot access
    // -------------------------------------------------------------------------

    fn raw_get(&self, owner: ObjectId, association: &str) -> Result<Option<ObjectId>> {
        match self.slot(owner, association)? {
            Slot::One(value) => Ok(*value),
            Slot::Many { .. } => Err(slot_mismatch(owner, association)),
        }
    }

    fn raw_assign(&mut self, owner: ObjectId, association: &str, value: Option<ObjectId>) -> Result<()> {
        match self.slot_mut(owner, association)? {
            Slot::One(slot) => {
                *slot = value;
                Ok(())
            }
            Slot::Many { .. } => Err(slot_mismatch(owner, association)),
        }
    }

    /// Returns whether the collection changed
    fn raw_insert(&mut self, owner: ObjectId, association: &str, element: ObjectId) -> Result<bool> {
        match self.slot_mut(owner, association)? {
            Slot::Many { kind, items } => {
                if *kind == CollectionKind::Set && items.contains(&element) {
                    return Ok(false);
                }
                items.push(element);
                Ok(true)
            }
            Slot::One(_) => Err(slot_mismatch(owner, association)),
        }
    }

    /// Removes the first occurrence; returns whether the collection changed
    fn raw_remove(&mut self, owner: ObjectId, association: &str, element: ObjectId) -> Result<bool> {
        match self.slot_mut(owner, association)? {
            Slot::Many { items, .. } => match items.iter().position(|e| *e == element) {
                Some(index) => {
                    items.remove(index);
                    Ok(true)
                }
                None => Ok(false),
            },
            Slot::One(_) => Err(slot_mismatch(owner, association)),
        }
    }

    /// Drop `element` from a slot of either shape
    fn raw_detach(&mut self, owner: ObjectId, association: &str, element: ObjectId) -> Result<()> {
        match self.slot_mut(owner, association)? {
            Slot::Many { items, .. } => items.retain(|e| *e != element),
            Slot::One(slot) => {
                if *slot == Some(element) {
                    *slot = None;
                }
            }
        }
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Lookups
    // -------------------------------------------------------------------------

    fn object(&self, id: ObjectId) -> Result<&Object> {
        self.objects
            .get(id.0)
            .ok_or_else(|| ModelError::contract(id.to_string(), "no such object"))
    }

    fn slot(&self, owner: ObjectId, association: &str) -> Result<&Slot> {
        self.object(owner)?
            .slots
            .get(association)
            .ok_or_else(|| ModelError::contract(format!("{}.{}", owner, association), "no such association"))
    }

    fn slot_mut(&mut self, owner: ObjectId, association: &str) -> Result<&mut Slot> {
        self.objects
            .get_mut(owner.0)
            .ok_or_else(|| ModelError::contract(owner.to_string(), "no such object"))?
            .slots
            .get_mut(association)
            .ok_or_else(|| ModelError::contract(format!("{}.{}", owner, association), "no such association"))
    }

    /// Annotation of `owner.association`, if it supports `op`
    fn checked(&self, owner: ObjectId, association: &str, op: AccessorOp) -> Result<&'m AssociationAnnotation> {
        let model = self.model;
        let class = self.class_of(owner)?;
        let annotation = model
            .annotation(class, association)
            .ok_or_else(|| ModelError::contract(format!("{}.{}", class, association), "no such association"))?;
        if !annotation.contract.supports(op) {
            return Err(ModelError::contract(
                format!("{}.{}", class, association),
                format!("operation '{}' is not part of the accessor contract", op),
            ));
        }
        Ok(annotation)
    }

    fn check_element(&self, annotation: &AssociationAnnotation, element: ObjectId) -> Result<()> {
        let class = self.class_of(element)?;
        let conforms = self
            .model
            .view
            .get_class(class)
            .is_some_and(|c| c.conforms_to(&annotation.contract.element_type));
        if conforms {
            Ok(())
        } else {
            Err(ModelError::contract(
                format!("{}.{}", annotation.class, annotation.association),
                format!("'{}' is not a {}", class, annotation.contract.element_type),
            ))
        }
    }
}

fn slot_mismatch(owner: ObjectId, association: &str) -> ModelError {
    ModelError::contract(
        format!("{}.{}", owner, association),
        "association multiplicity does not match the accessor",
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Model, ModelAssociation, ModelClass, ModelInterface, Multiplicity};
    use crate::validate::{validate, ValidationOptions};
    use crate::version::Version;

    fn annotated(model: Model) -> AnnotatedModel {
        validate(model, &ValidationOptions::default())
            .unwrap()
            .resolve(&Version::parse("1.0").unwrap())
            .unwrap()
            .annotate()
            .unwrap()
    }

    fn parent_child(inverse_many: bool) -> AnnotatedModel {
        let inverse = if inverse_many {
            ModelAssociation::new("parents", "Parent", Multiplicity::Many).with_back_reference("children")
        } else {
            ModelAssociation::new("parent", "Parent", Multiplicity::One).with_back_reference("children")
        };
        let back = if inverse_many { "parents" } else { "parent" };
        annotated(
            Model::new("family")
                .class(ModelClass::new("Parent").association(
                    ModelAssociation::new("children", "Child", Multiplicity::Many).with_back_reference(back),
                ))
                .class(ModelClass::new("Child").association(inverse)),
        )
    }

    #[test]
    fn test_add_and_remove_keep_to_one_inverse() {
        let model = parent_child(false);
        let mut graph = InstanceGraph::new(&model);
        let parent = graph.create("Parent").unwrap();
        let child = graph.create("Child").unwrap();

        graph.add(parent, "children", child).unwrap();
        assert_eq!(graph.get(child, "parent").unwrap(), Some(parent));
        assert_eq!(graph.get_all(parent, "children").unwrap(), &[child]);

        graph.remove(parent, "children", child).unwrap();
        assert_eq!(graph.get(child, "parent").unwrap(), None);
        assert!(graph.get_all(parent, "children").unwrap().is_empty());
    }

    #[test]
    fn test_reassigning_moves_between_owners() {
        let model = parent_child(false);
        let mut graph = InstanceGraph::new(&model);
        let first = graph.create("Parent").unwrap();
        let second = graph.create("Parent").unwrap();
        let child = graph.create("Child").unwrap();

        graph.add(first, "children", child).unwrap();
        graph.set(child, "parent", Some(second)).unwrap();

        assert!(graph.get_all(first, "children").unwrap().is_empty());
        assert_eq!(graph.get_all(second, "children").unwrap(), &[child]);

        graph.set(child, "parent", None).unwrap();
        assert!(graph.get_all(second, "children").unwrap().is_empty());
    }

    #[test]
    fn test_many_to_many_symmetry() {
        let model = parent_child(true);
        let mut graph = InstanceGraph::new(&model);
        let parent = graph.create("Parent").unwrap();
        let a = graph.create("Child").unwrap();
        let b = graph.create("Child").unwrap();

        graph.set_all(parent, "children", &[a, b]).unwrap();
        assert_eq!(graph.get_all(a, "parents").unwrap(), &[parent]);
        assert_eq!(graph.get_all(b, "parents").unwrap(), &[parent]);

        graph.set_all(parent, "children", &[b]).unwrap();
        assert!(graph.get_all(a, "parents").unwrap().is_empty());
        assert_eq!(graph.get_all(b, "parents").unwrap(), &[parent]);
    }

    #[test]
    fn test_contract_rejects_wrong_operation_and_type() {
        let model = parent_child(false);
        let mut graph = InstanceGraph::new(&model);
        let parent = graph.create("Parent").unwrap();
        let other = graph.create("Parent").unwrap();

        assert!(matches!(graph.get(parent, "children"), Err(ModelError::Contract { .. })));
        assert!(matches!(graph.add(parent, "children", other), Err(ModelError::Contract { .. })));
        assert!(graph.create("Nobody").is_err());
    }

    #[test]
    fn test_interface_elements_and_set_semantics() {
        let model = annotated(
            Model::new("ifaceassociation")
                .interface(ModelInterface::new("IPerson"))
                .class(ModelClass::new("Person").implements("IPerson"))
                .class(
                    ModelClass::new("Location")
                        .association(ModelAssociation::new("persons", "IPerson", Multiplicity::Many))
                        .association(
                            ModelAssociation::new("relatives", "IPerson", Multiplicity::Many)
                                .with_collection(CollectionKind::Set),
                        ),
                ),
        );
        let mut graph = InstanceGraph::new(&model);
        let location = graph.create("Location").unwrap();
        let person = graph.create("Person").unwrap();

        graph.add(location, "persons", person).unwrap();
        graph.add(location, "persons", person).unwrap();
        assert_eq!(graph.get_all(location, "persons").unwrap().len(), 2);

        graph.add(location, "relatives", person).unwrap();
        graph.add(location, "relatives", person).unwrap();
        assert_eq!(graph.get_all(location, "relatives").unwrap().len(), 1);
    }
}
