//! Code Generation
//!
//! Drives backends over an annotated, version-resolved view.
//!
//! Architecture:
//! - GenerationContext: the annotated view plus configuration, read-only
//! - ModelVisitor: callbacks a backend implements to receive the traversal
//! - Backend: turns a context into opaque artifacts
//! - GenerationEngine: resolves, annotates and runs one backend per
//!   (version, backend) pair, isolating failures per pair
//!
//! Traversal order is fixed and identical for every backend: interfaces in
//! declaration order, then classes in declaration order, and within a class
//! fields then associations in declaration order.

pub mod java;
pub mod manifest;
pub mod output;

pub use crate::model::names;

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;
use tracing::{debug, info, warn};

use crate::checksum::Checksum;
use crate::error::{ModelError, Result};
use crate::model::defaults::parse_flag;
use crate::resolve::{
    AnnotatedModel, AssociationAnnotation, ResolvedAssociation, ResolvedClass, ResolvedField,
    ResolvedInterface, ResolvedModel,
};
use crate::validate::CertifiedModel;
use crate::version::Version;

// =============================================================================
// Configuration
// =============================================================================

/// Opaque option mapping handed to backends verbatim.
///
/// The engine reads nothing from it; the accessors below cover the option
/// names every backend shares.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct GenerationConfig {
    options: BTreeMap<String, String>,
}

impl GenerationConfig {
    pub const OUTPUT_DIRECTORY: &'static str = "outputDirectory";
    pub const VERSION: &'static str = "version";
    pub const PACKAGE_WITH_VERSION: &'static str = "packageWithVersion";
    pub const ENCODING: &'static str = "encoding";

    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.options.insert(key.into(), value.into());
        self
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.options.get(key).map(String::as_str)
    }

    /// Boolean option, read the same permissive way as model defaults
    pub fn flag(&self, key: &str) -> bool {
        self.get(key).is_some_and(parse_flag)
    }

    pub fn output_directory(&self) -> Option<PathBuf> {
        self.get(Self::OUTPUT_DIRECTORY).map(PathBuf::from)
    }

    pub fn version(&self) -> Option<&str> {
        self.get(Self::VERSION)
    }

    pub fn package_with_version(&self) -> bool {
        self.flag(Self::PACKAGE_WITH_VERSION)
    }

    pub fn encoding(&self) -> &str {
        self.get(Self::ENCODING).unwrap_or("UTF-8")
    }

    pub fn options(&self) -> &BTreeMap<String, String> {
        &self.options
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for GenerationConfig {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            options: iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
        }
    }
}

// =============================================================================
// Artifacts
// =============================================================================

/// One generated file, path relative to the output root
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Artifact {
    pub path: PathBuf,
    pub content: String,
}

impl Artifact {
    pub fn new(path: impl Into<PathBuf>, content: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            content: content.into(),
        }
    }

    pub fn checksum(&self) -> Checksum {
        Checksum::from_str(&self.content)
    }
}

/// Everything one backend produced for one version
#[derive(Debug, Clone, Serialize)]
pub struct ArtifactSet {
    pub backend: String,
    pub version: Version,
    pub artifacts: Vec<Artifact>,
    /// Combined checksum over paths and contents, in artifact order
    pub checksum: Checksum,
    pub generated_at: DateTime<Utc>,
}

impl ArtifactSet {
    pub fn new(backend: impl Into<String>, version: Version, artifacts: Vec<Artifact>) -> Self {
        let parts: Vec<Checksum> = artifacts
            .iter()
            .flat_map(|a| [Checksum::from_str(&a.path.to_string_lossy()), a.checksum()])
            .collect();
        Self {
            backend: backend.into(),
            version,
            checksum: Checksum::combine(&parts),
            artifacts,
            generated_at: Utc::now(),
        }
    }

    pub fn len(&self) -> usize {
        self.artifacts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.artifacts.is_empty()
    }
}

// =============================================================================
// Traversal
// =============================================================================

/// Where the traversal was when a visitor failed
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Location {
    Model,
    Interface(String),
    Class(String),
    Member { class: String, member: String },
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Model => write!(f, "model"),
            Self::Interface(name) => write!(f, "interface {}", name),
            Self::Class(name) => write!(f, "class {}", name),
            Self::Member { class, member } => write!(f, "{}.{}", class, member),
        }
    }
}

/// A visitor failure tagged with its location
#[derive(Debug)]
pub struct TraversalError {
    pub location: Location,
    pub cause: anyhow::Error,
}

impl fmt::Display for TraversalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "at {}: {}", self.location, self.cause)
    }
}

impl std::error::Error for TraversalError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(self.cause.as_ref())
    }
}

/// Callbacks for [`GenerationContext::walk`]. Every method defaults to a no-op.
pub trait ModelVisitor {
    fn begin_model(&mut self, _view: &ResolvedModel) -> anyhow::Result<()> {
        Ok(())
    }

    fn visit_interface(&mut self, _interface: &ResolvedInterface) -> anyhow::Result<()> {
        Ok(())
    }

    fn begin_class(&mut self, _class: &ResolvedClass) -> anyhow::Result<()> {
        Ok(())
    }

    fn visit_field(&mut self, _class: &ResolvedClass, _field: &ResolvedField) -> anyhow::Result<()> {
        Ok(())
    }

    fn visit_association(
        &mut self,
        _class: &ResolvedClass,
        _association: &ResolvedAssociation,
        _annotation: &AssociationAnnotation,
    ) -> anyhow::Result<()> {
        Ok(())
    }

    fn end_class(&mut self, _class: &ResolvedClass) -> anyhow::Result<()> {
        Ok(())
    }

    fn end_model(&mut self, _view: &ResolvedModel) -> anyhow::Result<()> {
        Ok(())
    }
}

/// What a backend sees
pub struct GenerationContext<'a> {
    model: &'a AnnotatedModel,
    config: &'a GenerationConfig,
}

impl<'a> GenerationContext<'a> {
    pub fn new(model: &'a AnnotatedModel, config: &'a GenerationConfig) -> Self {
        Self { model, config }
    }

    pub fn model(&self) -> &'a AnnotatedModel {
        self.model
    }

    pub fn view(&self) -> &'a ResolvedModel {
        &self.model.view
    }

    pub fn config(&self) -> &'a GenerationConfig {
        self.config
    }

    pub fn version(&self) -> &'a Version {
        &self.model.view.version
    }

    /// Drive `visitor` over the view in the fixed traversal order
    pub fn walk<V: ModelVisitor + ?Sized>(&self, visitor: &mut V) -> std::result::Result<(), TraversalError> {
        let view = self.view();
        let at = |location: Location| move |cause: anyhow::Error| TraversalError { location, cause };

        visitor.begin_model(view).map_err(at(Location::Model))?;

        for interface in &view.interfaces {
            visitor
                .visit_interface(interface)
                .map_err(at(Location::Interface(interface.name.clone())))?;
        }

        for class in &view.classes {
            visitor
                .begin_class(class)
                .map_err(at(Location::Class(class.name.clone())))?;

            for field in &class.fields {
                visitor
                    .visit_field(class, field)
                    .map_err(at(member(class, field.name())))?;
            }

            for association in &class.associations {
                let annotation = self
                    .model
                    .annotation(&class.name, association.name())
                    .ok_or_else(|| anyhow::anyhow!("association has no annotation"))
                    .map_err(at(member(class, association.name())))?;
                visitor
                    .visit_association(class, association, annotation)
                    .map_err(at(member(class, association.name())))?;
            }

            visitor
                .end_class(class)
                .map_err(at(Location::Class(class.name.clone())))?;
        }

        visitor.end_model(view).map_err(at(Location::Model))
    }
}

fn member(class: &ResolvedClass, name: &str) -> Location {
    Location::Member {
        class: class.name.clone(),
        member: name.to_string(),
    }
}

// =============================================================================
// Backends
// =============================================================================

/// One output representation
pub trait Backend: Send + Sync {
    /// Identifier used to select the backend
    fn id(&self) -> &str;

    /// Produce artifacts for the context's view. Artifacts are opaque to the engine.
    fn generate(&self, ctx: &GenerationContext<'_>) -> anyhow::Result<Vec<Artifact>>;
}

/// Name -> backend lookup table
#[derive(Default)]
pub struct BackendRegistry {
    backends: BTreeMap<String, Box<dyn Backend>>,
}

impl BackendRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding the bundled backends
    pub fn with_builtin() -> Self {
        let mut registry = Self::new();
        registry.register(Box::new(java::JavaBackend));
        registry.register(Box::new(manifest::ManifestBackend));
        registry
    }

    /// Add a backend, replacing one with the same id
    pub fn register(&mut self, backend: Box<dyn Backend>) {
        let id = backend.id().to_string();
        if self.backends.insert(id.clone(), backend).is_some() {
            warn!(backend = %id, "replaced registered backend");
        }
    }

    pub fn get(&self, id: &str) -> Result<&dyn Backend> {
        self.backends
            .get(id)
            .map(|b| b.as_ref())
            .ok_or_else(|| ModelError::UnknownBackend(id.to_string()))
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.backends.keys().map(String::as_str)
    }
}

// =============================================================================
// Engine
// =============================================================================

/// Result of one (version, backend) pair in a batch
#[derive(Debug)]
pub struct PairOutcome {
    pub version: Version,
    pub backend: String,
    pub result: Result<ArtifactSet>,
}

/// Runs backends over certified models
pub struct GenerationEngine {
    registry: BackendRegistry,
}

impl Default for GenerationEngine {
    fn default() -> Self {
        Self::new(BackendRegistry::with_builtin())
    }
}

impl GenerationEngine {
    pub fn new(registry: BackendRegistry) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &BackendRegistry {
        &self.registry
    }

    /// Resolve, annotate and generate one pair
    pub fn generate(
        &self,
        certified: &CertifiedModel,
        version: &Version,
        backend: &str,
        config: &GenerationConfig,
    ) -> Result<ArtifactSet> {
        let backend = self.registry.get(backend)?;
        let annotated = certified.resolve(version)?.annotate()?;
        self.run(backend, &annotated, config)
    }

    /// Generate from an already annotated view
    pub fn generate_annotated(
        &self,
        annotated: &AnnotatedModel,
        backend: &str,
        config: &GenerationConfig,
    ) -> Result<ArtifactSet> {
        self.run(self.registry.get(backend)?, annotated, config)
    }

    /// Run every pair independently; one failure never stops the others
    pub fn generate_all(
        &self,
        certified: &CertifiedModel,
        pairs: &[(Version, String)],
        config: &GenerationConfig,
    ) -> Vec<PairOutcome> {
        let outcomes: Vec<PairOutcome> = pairs
            .iter()
            .map(|(version, backend)| {
                let result = self.generate(certified, version, backend, config);
                if let Err(e) = &result {
                    warn!(version = %version, backend = %backend, error = %e, "generation pair failed");
                }
                PairOutcome {
                    version: version.clone(),
                    backend: backend.clone(),
                    result,
                }
            })
            .collect();

        let failed = outcomes.iter().filter(|o| o.result.is_err()).count();
        info!(pairs = outcomes.len(), failed, "generation batch finished");
        outcomes
    }

    fn run(&self, backend: &dyn Backend, annotated: &AnnotatedModel, config: &GenerationConfig) -> Result<ArtifactSet> {
        let ctx = GenerationContext::new(annotated, config);
        debug!(backend = backend.id(), version = %ctx.version(), "running backend");

        let artifacts = backend.generate(&ctx).map_err(|err| {
            let (location, source): (String, Box<dyn std::error::Error + Send + Sync>) = match err.downcast::<TraversalError>() {
                Ok(traversal) => (traversal.location.to_string(), traversal.cause.into()),
                Err(other) => (Location::Model.to_string(), other.into()),
            };
            ModelError::Generation {
                backend: backend.id().to_string(),
                location,
                source,
            }
        })?;

        let set = ArtifactSet::new(backend.id(), ctx.version().clone(), artifacts);
        info!(
            backend = %set.backend,
            version = %set.version,
            artifacts = set.len(),
            checksum = %set.checksum,
            "generated artifacts"
        );
        Ok(set)
    }
}
