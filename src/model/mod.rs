//! Object Model Graph
//!
//! The raw model as read from a descriptor: classes, interfaces, fields,
//! associations, version ranges and global defaults. References between
//! types are by name and resolved through [`Model`] lookups; nothing here
//! uses native inheritance to model superclasses.
//!
//! Once a model passes validation it is wrapped in
//! [`CertifiedModel`](crate::validate::CertifiedModel) and never mutated
//! again.

pub mod defaults;
pub mod loader;
pub mod names;

pub use defaults::{DefaultKey, ModelDefault, ModelDefaults};
pub use loader::{load_descriptor, load_from_directory, load_from_str, DescriptorFormat, LoadedDescriptor};

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::version::{Version, VersionRange};

/// Type names that need no declaration in the model
pub const PRIMITIVE_TYPES: &[&str] = &[
    "boolean", "Boolean", "char", "Character", "byte", "Byte", "short", "Short",
    "int", "Integer", "long", "Long", "float", "Float", "double", "Double",
    "String", "Date", "java.util.Date", "DOM",
    "java.util.List", "java.util.Set", "java.util.Map", "java.util.Properties",
];

/// Whether a type name is built in
pub fn is_primitive(type_name: &str) -> bool {
    PRIMITIVE_TYPES.contains(&type_name)
}

// =============================================================================
// Association vocabulary
// =============================================================================

/// How many elements an association holds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Multiplicity {
    #[default]
    #[serde(alias = "1")]
    One,
    #[serde(alias = "*")]
    Many,
}

impl Multiplicity {
    pub fn is_many(&self) -> bool {
        matches!(self, Self::Many)
    }
}

impl fmt::Display for Multiplicity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::One => write!(f, "1"),
            Self::Many => write!(f, "*"),
        }
    }
}

/// Container used by a to-many association
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CollectionKind {
    #[default]
    #[serde(alias = "java.util.List")]
    List,
    #[serde(alias = "java.util.Set")]
    Set,
    #[serde(alias = "java.util.Map")]
    Map,
    #[serde(alias = "java.util.Properties")]
    Properties,
}

impl CollectionKind {
    /// Interface type name of the container
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::List => "java.util.List",
            Self::Set => "java.util.Set",
            Self::Map => "java.util.Map",
            Self::Properties => "java.util.Properties",
        }
    }
}

impl fmt::Display for CollectionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::List => write!(f, "list"),
            Self::Set => write!(f, "set"),
            Self::Map => write!(f, "map"),
            Self::Properties => write!(f, "properties"),
        }
    }
}

// =============================================================================
// Members
// =============================================================================

/// A scalar-valued member
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelField {
    pub name: String,
    /// Declared type. Associations may leave it empty.
    #[serde(rename = "type", default)]
    pub type_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_value: Option<String>,
    #[serde(default)]
    pub required: bool,
    /// Own range; absent means the owning class's range
    #[serde(rename = "version", default, skip_serializing_if = "Option::is_none")]
    pub version_range: Option<VersionRange>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl ModelField {
    pub fn new(name: impl Into<String>, type_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            type_name: type_name.into(),
            ..Default::default()
        }
    }

    pub fn with_range(mut self, range: VersionRange) -> Self {
        self.version_range = Some(range);
        self
    }

    pub fn with_default(mut self, value: impl Into<String>) -> Self {
        self.default_value = Some(value.into());
        self
    }

    /// Own range, falling back to the owner's
    pub fn effective_range(&self, owner: &VersionRange) -> VersionRange {
        self.version_range.clone().unwrap_or_else(|| owner.clone())
    }
}

/// A member whose value references other model types
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelAssociation {
    #[serde(flatten)]
    pub field: ModelField,
    /// Referenced class or interface
    pub target: String,
    #[serde(default)]
    pub multiplicity: Multiplicity,
    #[serde(rename = "collection", default)]
    pub collection_kind: CollectionKind,
    #[serde(default)]
    pub bidirectional: bool,
    /// Member on the target type pointing back at the owner
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub back_reference: Option<String>,
}

impl ModelAssociation {
    pub fn new(name: impl Into<String>, target: impl Into<String>, multiplicity: Multiplicity) -> Self {
        Self {
            field: ModelField::new(name, ""),
            target: target.into(),
            multiplicity,
            collection_kind: CollectionKind::default(),
            bidirectional: false,
            back_reference: None,
        }
    }

    pub fn with_collection(mut self, kind: CollectionKind) -> Self {
        self.collection_kind = kind;
        self
    }

    pub fn with_back_reference(mut self, member: impl Into<String>) -> Self {
        self.back_reference = Some(member.into());
        self.bidirectional = true;
        self
    }

    pub fn with_range(mut self, range: VersionRange) -> Self {
        self.field.version_range = Some(range);
        self
    }

    pub fn name(&self) -> &str {
        &self.field.name
    }

    pub fn is_many(&self) -> bool {
        self.multiplicity.is_many()
    }

    /// Declared member type: the container for to-many, the target otherwise
    pub fn declared_type(&self) -> String {
        match self.multiplicity {
            Multiplicity::Many => self.collection_kind.type_name().to_string(),
            Multiplicity::One => self.target.clone(),
        }
    }

    /// Whether an explicit `type` agrees with the multiplicity, collection
    /// and target. An absent type always agrees.
    pub fn explicit_type_matches(&self) -> bool {
        let explicit = self.field.type_name.as_str();
        if explicit.is_empty() {
            return true;
        }
        match self.multiplicity {
            Multiplicity::Many => {
                explicit == self.collection_kind.type_name()
                    || explicit.eq_ignore_ascii_case(&self.collection_kind.to_string())
            }
            Multiplicity::One => explicit == self.target,
        }
    }

    pub fn effective_range(&self, owner: &VersionRange) -> VersionRange {
        self.field.effective_range(owner)
    }
}

// =============================================================================
// Types
// =============================================================================

/// One modeled entity type
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelClass {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub superclass: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub interfaces: Vec<String>,
    #[serde(default)]
    pub fields: Vec<ModelField>,
    #[serde(default)]
    pub associations: Vec<ModelAssociation>,
    #[serde(rename = "version", default, skip_serializing_if = "Option::is_none")]
    pub version_range: Option<VersionRange>,
    #[serde(rename = "abstract", default)]
    pub is_abstract: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deprecated_version: Option<Version>,
}

impl ModelClass {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn with_range(mut self, range: VersionRange) -> Self {
        self.version_range = Some(range);
        self
    }

    pub fn extends(mut self, superclass: impl Into<String>) -> Self {
        self.superclass = Some(superclass.into());
        self
    }

    pub fn implements(mut self, interface: impl Into<String>) -> Self {
        self.interfaces.push(interface.into());
        self
    }

    pub fn field(mut self, field: ModelField) -> Self {
        self.fields.push(field);
        self
    }

    pub fn association(mut self, association: ModelAssociation) -> Self {
        self.associations.push(association);
        self
    }

    pub fn deprecated_in(mut self, version: Version) -> Self {
        self.deprecated_version = Some(version);
        self
    }

    pub fn effective_range(&self, model: &VersionRange) -> VersionRange {
        self.version_range.clone().unwrap_or_else(|| model.clone())
    }

    pub fn get_field(&self, name: &str) -> Option<&ModelField> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn get_association(&self, name: &str) -> Option<&ModelAssociation> {
        self.associations.iter().find(|a| a.field.name == name)
    }
}

/// A parameter of an interface method
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelParameter {
    pub name: String,
    #[serde(rename = "type")]
    pub type_name: String,
}

/// An abstract method signature; opaque to resolution
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelMethod {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub return_type: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub parameters: Vec<ModelParameter>,
}

/// A capability contract usable as an association element type
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelInterface {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub superinterfaces: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub methods: Vec<ModelMethod>,
    #[serde(rename = "version", default, skip_serializing_if = "Option::is_none")]
    pub version_range: Option<VersionRange>,
}

impl ModelInterface {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn extends(mut self, superinterface: impl Into<String>) -> Self {
        self.superinterfaces.push(superinterface.into());
        self
    }

    pub fn with_range(mut self, range: VersionRange) -> Self {
        self.version_range = Some(range);
        self
    }

    pub fn effective_range(&self, model: &VersionRange) -> VersionRange {
        self.version_range.clone().unwrap_or_else(|| model.clone())
    }
}

/// What a type name refers to inside a model
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TypeRef<'a> {
    Class(&'a ModelClass),
    Interface(&'a ModelInterface),
}

impl<'a> TypeRef<'a> {
    pub fn name(&self) -> &'a str {
        match self {
            Self::Class(c) => &c.name,
            Self::Interface(i) => &i.name,
        }
    }

    pub fn effective_range(&self, model: &VersionRange) -> VersionRange {
        match self {
            Self::Class(c) => c.effective_range(model),
            Self::Interface(i) => i.effective_range(model),
        }
    }
}

// =============================================================================
// Model
// =============================================================================

/// The whole schema
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Model {
    pub name: String,
    /// Explicit package; falls back to the `package` default
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub package: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(rename = "version", default)]
    pub version_range: VersionRange,
    #[serde(default)]
    pub defaults: ModelDefaults,
    #[serde(default)]
    pub interfaces: Vec<ModelInterface>,
    #[serde(default)]
    pub classes: Vec<ModelClass>,
}

impl Model {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn with_range(mut self, range: VersionRange) -> Self {
        self.version_range = range;
        self
    }

    pub fn with_defaults(mut self, defaults: ModelDefaults) -> Self {
        self.defaults = defaults;
        self
    }

    pub fn class(mut self, class: ModelClass) -> Self {
        self.classes.push(class);
        self
    }

    pub fn interface(mut self, interface: ModelInterface) -> Self {
        self.interfaces.push(interface);
        self
    }

    /// Effective package name
    pub fn package_name(&self) -> &str {
        self.package.as_deref().unwrap_or_else(|| self.defaults.package())
    }

    pub fn get_class(&self, name: &str) -> Option<&ModelClass> {
        self.classes.iter().find(|c| c.name == name)
    }

    pub fn get_interface(&self, name: &str) -> Option<&ModelInterface> {
        self.interfaces.iter().find(|i| i.name == name)
    }

    /// Look a type name up among classes, then interfaces
    pub fn lookup(&self, name: &str) -> Option<TypeRef<'_>> {
        self.get_class(name)
            .map(TypeRef::Class)
            .or_else(|| self.get_interface(name).map(TypeRef::Interface))
    }

    /// Names of every declared type, declaration order
    pub fn type_names(&self) -> impl Iterator<Item = &str> {
        self.interfaces
            .iter()
            .map(|i| i.name.as_str())
            .chain(self.classes.iter().map(|c| c.name.as_str()))
    }
}
