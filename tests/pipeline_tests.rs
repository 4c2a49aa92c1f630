//! End-to-end tests over descriptor fixtures
//!
//! Each test loads a descriptor from tests/fixtures and drives it through
//! validation, resolution, annotation and generation.

use std::path::{Path, PathBuf};

use modelgen::codegen::output::{drift, write_atomic};
use modelgen::model::load_descriptor;
use modelgen::resolve::{InitializerSource, InverseUpdate};
use modelgen::{
    generate, validate, CertifiedModel, DefaultKey, DiagnosticCode, GenerationConfig,
    GenerationEngine, InstanceGraph, Model, ModelClass, ModelDefault, ModelDefaults, ModelError,
    ValidationOptions, Version, VersionRange,
};

fn fixture(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures").join(name)
}

fn certify(name: &str) -> CertifiedModel {
    let loaded = load_descriptor(&fixture(name)).unwrap();
    validate(loaded.model, &ValidationOptions::default()).unwrap()
}

fn v(s: &str) -> Version {
    Version::parse(s).unwrap()
}

fn content<'a>(set: &'a modelgen::ArtifactSet, path: &str) -> &'a str {
    &set.artifacts
        .iter()
        .find(|a| a.path == PathBuf::from(path))
        .unwrap_or_else(|| panic!("no artifact {path}"))
        .content
}

// =============================================================================
// Defaults
// =============================================================================

#[test]
fn test_builtin_defaults() {
    let expected = [
        ("package", "model"),
        ("java.util.List", "new java.util.ArrayList<?>()"),
        ("java.util.Set", "new java.util.HashSet<?>()"),
        ("java.util.Map", "new java.util.HashMap()"),
        ("java.util.Properties", "new java.util.Properties()"),
        ("strictXmlAttributes", "true"),
        ("checkDeprecation", "false"),
    ];
    for (key, value) in expected {
        let default = ModelDefault::get_default(key).unwrap();
        assert_eq!(default.key, key);
        assert_eq!(default.value, value, "built-in value of {key}");
    }

    // lookup ignores case but keeps the caller's spelling
    let upper = ModelDefault::get_default("CHECKDEPRECATION").unwrap();
    assert_eq!(upper.key, "CHECKDEPRECATION");
    assert_eq!(upper.value, "false");
}

#[test]
fn test_unknown_default_key() {
    for key in ["bogus", "BOGUS"] {
        match ModelDefault::get_default(key) {
            Err(ModelError::InvalidKey { key: reported }) => assert_eq!(reported, key),
            other => panic!("expected InvalidKey for {key}, got {other:?}"),
        }
    }
}

#[test]
fn test_validate_element_rejects_blank_parts() {
    for element in [ModelDefault::new("", "x"), ModelDefault::new("package", "  ")] {
        match element.validate_element() {
            Err(ModelError::Validation(diagnostics)) => {
                assert_eq!(diagnostics.len(), 1);
                assert_eq!(diagnostics.all()[0].code, DiagnosticCode::InvalidDefault);
            }
            other => panic!("expected validation failure, got {other:?}"),
        }
    }

    assert_eq!(
        ModelDefault::new("Java.Util.Set", "new java.util.TreeSet<?>()").validate_element().unwrap(),
        DefaultKey::Set
    );
}

#[test]
fn test_as_boolean_is_permissive() {
    assert!(ModelDefault::new("checkDeprecation", "TRUE").as_boolean());
    assert!(!ModelDefault::new("checkDeprecation", "yes").as_boolean());
    assert!(!ModelDefault::new("checkDeprecation", "1").as_boolean());
}

// =============================================================================
// Validation
// =============================================================================

#[test]
fn test_defects_are_reported_together() {
    let loaded = load_descriptor(&fixture("defects.json")).unwrap();
    let diagnostics = match validate(loaded.model, &ValidationOptions::default()) {
        Err(ModelError::Validation(diagnostics)) => diagnostics,
        other => panic!("expected validation failure, got {other:?}"),
    };

    for code in [
        DiagnosticCode::UnresolvedSuperclass,
        DiagnosticCode::UnresolvedType,
        DiagnosticCode::DuplicateMember,
        DiagnosticCode::MissingBackReference,
        DiagnosticCode::InheritanceCycle,
    ] {
        assert!(
            diagnostics.with_code(code).next().is_some(),
            "missing {code} in:\n{}",
            diagnostics.format_all()
        );
    }
    assert!(diagnostics.error_count() >= 5);
    assert!(diagnostics.for_entity("Order.total").next().is_some());
}

#[test]
fn test_deprecation_check_toggle() {
    let bounded = || {
        Model::new("m")
            .with_range(VersionRange::parse("1.0.0+").unwrap())
            .class(ModelClass::new("Legacy").with_range(VersionRange::parse("1.0/1.5").unwrap()))
    };

    // off by default
    assert!(validate(bounded(), &ValidationOptions::default()).is_ok());

    let strict = bounded().with_defaults(ModelDefaults::new().with(DefaultKey::CheckDeprecation, "true"));
    match validate(strict, &ValidationOptions::default()) {
        Err(ModelError::Validation(diagnostics)) => {
            let item = diagnostics.with_code(DiagnosticCode::MissingDeprecation).next().unwrap();
            assert_eq!(item.entity, "Legacy");
        }
        other => panic!("expected deprecation failure, got {other:?}"),
    }

    // the fixture declares its deprecation and passes with the check on
    let certified = certify("versioned.json");
    assert!(certified.model().defaults.check_deprecation());
}

#[test]
fn test_declared_versions() {
    let certified = certify("versioned.json");
    let versions: Vec<String> = certified.declared_versions().iter().map(ToString::to_string).collect();
    assert_eq!(versions, vec!["1.0.0", "1.5.0", "2.0.0"]);
}

// =============================================================================
// Resolution
// =============================================================================

#[test]
fn test_resolution_is_idempotent() {
    let certified = certify("versioned.json");
    let first = certified.resolve(&v("1.5")).unwrap();
    let second = certified.resolve(&v("1.5")).unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_members_follow_their_ranges() {
    let certified = certify("versioned.json");

    let early = certified.resolve(&v("1.0")).unwrap();
    let article = early.get_class("Article").unwrap();
    assert!(article.get_field("summary").is_none());
    assert!(article.get_field("id").unwrap().inherited);
    assert!(early.get_class("Legacy").is_some());

    let late = certified.resolve(&v("2.0")).unwrap();
    assert!(late.get_class("Article").unwrap().get_field("summary").is_some());
    assert!(late.get_class("Legacy").is_none());

    // no type active at 1.0 that is also active at 2.0 disappears in between
    let middle = certified.resolve(&v("1.5")).unwrap();
    for class in &early.classes {
        if late.contains_type(&class.name) {
            assert!(middle.contains_type(&class.name), "{} missing at 1.5", class.name);
        }
    }
}

#[test]
fn test_type_conflict_only_where_override_is_active() {
    let certified = certify("type_conflict.json");
    assert!(certified.resolve(&v("1.0")).is_ok());

    match certified.resolve(&v("2.0")) {
        Err(ModelError::TypeConflict { class, member, .. }) => {
            assert_eq!(class, "Derived");
            assert_eq!(member, "amount");
        }
        other => panic!("expected type conflict, got {other:?}"),
    }
}

// =============================================================================
// Associations
// =============================================================================

#[test]
fn test_interface_association_annotations() {
    let annotated = certify("ifaceassociation.json").resolve(&v("1.0")).unwrap().annotate().unwrap();

    let persons = annotated.annotation("Location", "persons").unwrap();
    assert_eq!(persons.contract.element_type, "IPerson");
    assert_eq!(persons.contract.singular_name, "person");
    let initializer = persons.initializer.as_ref().unwrap();
    assert_eq!(initializer.source, InitializerSource::BuiltIn);
    assert_eq!(initializer.render("IPerson"), "new java.util.ArrayList<IPerson>()");

    let relatives = annotated.annotation("Location", "relatives").unwrap();
    assert_eq!(
        relatives.initializer.as_ref().unwrap().render("IPerson"),
        "new java.util.HashSet<IPerson>()"
    );

    let main = annotated.annotation("Location", "mainPerson").unwrap();
    assert!(main.initializer.is_none());
}

#[test]
fn test_model_default_initializer() {
    let annotated = certify("versioned.json").resolve(&v("1.0")).unwrap().annotate().unwrap();
    let tags = annotated.annotation("Article", "tags").unwrap();
    let initializer = tags.initializer.as_ref().unwrap();
    assert_eq!(initializer.source, InitializerSource::ModelDefault);
    assert_eq!(initializer.render("Tag"), "new java.util.LinkedList<Tag>()");
}

#[test]
fn test_bidirectional_symmetry() {
    let annotated = certify("bidirectional.json").resolve(&v("1.0")).unwrap().annotate().unwrap();

    let children = annotated.annotation("Parent", "children").unwrap();
    let inverse = children.inverse.as_ref().unwrap();
    assert_eq!(inverse.inverse_member, "parent");
    assert_eq!(inverse.update, InverseUpdate::Assign);

    let mut graph = InstanceGraph::new(&annotated);
    let first = graph.create("Parent").unwrap();
    let second = graph.create("Parent").unwrap();
    let child = graph.create("Child").unwrap();

    graph.add(first, "children", child).unwrap();
    assert_eq!(graph.get(child, "parent").unwrap(), Some(first));

    graph.set(child, "parent", Some(second)).unwrap();
    assert!(graph.get_all(first, "children").unwrap().is_empty());
    assert_eq!(graph.get_all(second, "children").unwrap(), &[child]);

    graph.remove(second, "children", child).unwrap();
    assert_eq!(graph.get(child, "parent").unwrap(), None);
}

// =============================================================================
// Generation
// =============================================================================

#[test]
fn test_java_for_interface_association() {
    let certified = certify("ifaceassociation.json");
    let set = GenerationEngine::default()
        .generate(&certified, &v("1.0.0"), "java", &GenerationConfig::new())
        .unwrap();

    let location = content(&set, "org/example/ifaceassociation/Location.java");
    assert!(location.contains("package org.example.ifaceassociation;"));
    assert!(location.contains("public void addPerson( IPerson person )"));
    assert!(location.contains("public void removePerson( IPerson person )"));
    assert!(location.contains("public java.util.List<IPerson> getPersons()"));
    assert!(location.contains("this.persons = new java.util.ArrayList<IPerson>();"));
    assert!(location.contains("public void addRelative( IPerson relative )"));
    assert!(location.contains("public IPerson getMainPerson()"));

    let person = content(&set, "org/example/ifaceassociation/IPerson.java");
    assert!(person.contains("public interface IPerson"));
}

#[test]
fn test_deprecated_annotation_by_version() {
    let certified = certify("versioned.json");
    let engine = GenerationEngine::default();
    let config = GenerationConfig::new();

    let before = engine.generate(&certified, &v("1.0"), "java", &config).unwrap();
    assert!(!content(&before, "org/example/catalog/Legacy.java").contains("@Deprecated"));

    let at = engine.generate(&certified, &v("1.5"), "java", &config).unwrap();
    assert!(content(&at, "org/example/catalog/Legacy.java").contains("@Deprecated"));

    let after = engine.generate(&certified, &v("2.0"), "java", &config).unwrap();
    assert!(after.artifacts.iter().all(|a| !a.path.ends_with("Legacy.java")));
}

#[test]
fn test_pairs_are_isolated() {
    let certified = certify("type_conflict.json");
    let pairs = vec![
        (v("1.0"), "java".to_string()),
        (v("2.0"), "java".to_string()),
        (v("1.0"), "cobol".to_string()),
        (v("1.0"), "manifest".to_string()),
    ];
    let outcomes = GenerationEngine::default().generate_all(&certified, &pairs, &GenerationConfig::new());

    assert_eq!(outcomes.len(), 4);
    assert!(outcomes[0].result.is_ok());
    assert!(matches!(outcomes[1].result, Err(ModelError::TypeConflict { .. })));
    assert!(matches!(outcomes[2].result, Err(ModelError::UnknownBackend(_))));
    assert!(outcomes[3].result.is_ok());
}

#[test]
fn test_generation_is_reproducible() {
    let certified = certify("ifaceassociation.json");
    let engine = GenerationEngine::default();
    let config = GenerationConfig::new();
    let first = engine.generate(&certified, &v("1.0"), "manifest", &config).unwrap();
    let second = engine.generate(&certified, &v("1.0"), "manifest", &config).unwrap();
    assert_eq!(first.checksum, second.checksum);
    assert_eq!(first.artifacts, second.artifacts);
}

#[test]
fn test_generate_and_write() {
    let set = generate(
        &fixture("bidirectional.json"),
        "1.0",
        "java",
        &GenerationConfig::new().with(GenerationConfig::PACKAGE_WITH_VERSION, "true"),
    )
    .unwrap();
    assert_eq!(set.backend, "java");

    let dir = tempfile::tempdir().unwrap();
    let written = write_atomic(&set, dir.path()).unwrap();
    assert_eq!(written.len(), 2);
    assert!(dir.path().join("org/example/family/v1_0/Parent.java").exists());

    let parent = std::fs::read_to_string(dir.path().join("org/example/family/v1_0/Parent.java")).unwrap();
    assert!(parent.contains("child.attachParent( this );"));

    assert!(drift(&set, dir.path()).unwrap().iter().all(|e| !e.is_drifted()));
}

#[test]
fn test_generate_reports_validation_failures() {
    let err = generate(&fixture("defects.json"), "1.0", "java", &GenerationConfig::new()).unwrap_err();
    assert!(matches!(err, ModelError::Validation(_)));
}

// =============================================================================
// Configuration
// =============================================================================

#[test]
fn test_config_file_drives_backends() {
    let path = fixture("modelgen.toml");
    let config = modelgen::GeneratorConfig::load_from(path.to_str()).unwrap();
    assert_eq!(config.generation.backends, vec!["java", "manifest"]);

    let certified = certify("ifaceassociation.json");
    let generation = config.to_generation_config();
    let pairs: Vec<(Version, String)> = config
        .generation
        .backends
        .iter()
        .map(|b| (v("1.0"), b.clone()))
        .collect();
    let outcomes = GenerationEngine::default().generate_all(&certified, &pairs, &generation);
    assert!(outcomes.iter().all(|o| o.result.is_ok()));
}
