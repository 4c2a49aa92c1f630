//! modelgen
//!
//! A versioned object-model compiler. One model descriptor describes classes,
//! interfaces, fields and associations, each with the range of model versions
//! it exists in. modelgen validates the descriptor, projects it onto a target
//! version and drives generation backends over the result.
//!
//! ## Pipeline
//!
//! ```text
//! descriptor ─▶ loader ─▶ Model ─▶ validate ─▶ CertifiedModel
//!                                                   │ resolve(version)
//!                                                   ▼
//!                         ArtifactSet ◀─ Backend ◀─ AnnotatedModel ◀─ ResolvedModel
//! ```
//!
//! - **Validation** is fail-complete: every defect is reported in one pass.
//! - **Resolution** flattens inheritance and applies member overrides for one
//!   version; the result is a fresh value, never shared state.
//! - **Association annotation** fixes the accessor contract, collection
//!   initializer and inverse obligation of every association.
//! - **Generation** walks the annotated view in declaration order; each
//!   (version, backend) pair succeeds or fails on its own.

pub mod checksum;
pub mod codegen;
pub mod config;
pub mod diagnostics;
pub mod error;
pub mod instance;
pub mod model;
pub mod resolve;
pub mod validate;
pub mod version;

use std::path::Path;

pub use checksum::Checksum;
pub use codegen::{
    Artifact, ArtifactSet, Backend, BackendRegistry, GenerationConfig, GenerationContext,
    GenerationEngine, ModelVisitor,
};
pub use config::GeneratorConfig;
pub use diagnostics::{DiagnosticCode, DiagnosticItem, Diagnostics, Severity};
pub use error::{ModelError, Result};
pub use instance::{InstanceGraph, ObjectId};
pub use model::{
    CollectionKind, DefaultKey, Model, ModelAssociation, ModelClass, ModelDefault, ModelDefaults,
    ModelField, ModelInterface, Multiplicity,
};
pub use resolve::{AnnotatedModel, ResolvedModel, VersionResolver};
pub use validate::{validate, CertifiedModel, ValidationOptions};
pub use version::{Version, VersionRange};

/// Load, validate, resolve and generate in one call.
///
/// Fails with the full validation report, or with the single error of the
/// first stage that fails after validation.
pub fn generate(
    descriptor: &Path,
    version: &str,
    backend: &str,
    config: &GenerationConfig,
) -> Result<ArtifactSet> {
    let loaded = model::load_descriptor(descriptor)?;
    let certified = validate(loaded.model, &ValidationOptions::default())?;
    let version = Version::parse(version)?;
    GenerationEngine::default().generate(&certified, &version, backend, config)
}
