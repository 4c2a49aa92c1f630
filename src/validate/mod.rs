//! Model Validation
//!
//! A single read-only pass over the raw model that collects every structural
//! and semantic defect before reporting. The pass never stops early: a model
//! with N unrelated defects yields N diagnostics in one run.
//!
//! A model that passes comes back as a [`CertifiedModel`], the only input
//! the version resolver accepts.

use fuzzy_matcher::skim::SkimMatcherV2;
use fuzzy_matcher::FuzzyMatcher;
use petgraph::algo::kosaraju_scc;
use petgraph::graph::{DiGraph, NodeIndex};
use regex::Regex;
use std::collections::{BTreeSet, HashMap};
use std::sync::{Arc, LazyLock};
use tracing::{debug, info};

use crate::diagnostics::{DiagnosticCode, DiagnosticItem, Diagnostics};
use crate::error::{ModelError, Result};
use crate::model::{is_primitive, Model, ModelAssociation, ModelClass, ModelField, TypeRef, PRIMITIVE_TYPES};
use crate::version::{Version, VersionRange};

static IDENTIFIER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("identifier pattern"));

/// Knobs for a validation run
#[derive(Debug, Clone, Default)]
pub struct ValidationOptions {
    /// Type names accepted for fields without being declared in the model
    pub external_types: BTreeSet<String>,
}

impl ValidationOptions {
    pub fn with_external_types<I, S>(types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            external_types: types.into_iter().map(Into::into).collect(),
        }
    }
}

/// A model that passed validation. Read-only from here on.
#[derive(Debug, Clone)]
pub struct CertifiedModel {
    model: Arc<Model>,
    warnings: Diagnostics,
}

impl CertifiedModel {
    pub fn model(&self) -> &Model {
        &self.model
    }

    /// Non-fatal findings from validation
    pub fn warnings(&self) -> &Diagnostics {
        &self.warnings
    }

    /// Every version bound mentioned anywhere in the model, ascending
    pub fn declared_versions(&self) -> Vec<Version> {
        let mut ranges: Vec<&VersionRange> = vec![&self.model.version_range];
        for interface in &self.model.interfaces {
            ranges.extend(interface.version_range.iter());
        }
        for class in &self.model.classes {
            ranges.extend(class.version_range.iter());
            ranges.extend(class.fields.iter().filter_map(|f| f.version_range.as_ref()));
            ranges.extend(
                class
                    .associations
                    .iter()
                    .filter_map(|a| a.field.version_range.as_ref()),
            );
        }

        // equal versions keep the spelling met first
        let mut versions: BTreeSet<Version> = BTreeSet::new();
        for version in ranges.into_iter().flat_map(|r| r.lower().into_iter().chain(r.upper())) {
            if !versions.contains(version) {
                versions.insert(version.clone());
            }
        }
        versions.into_iter().collect()
    }
}

/// Validate a raw model, returning it certified or every defect found
pub fn validate(model: Model, options: &ValidationOptions) -> Result<CertifiedModel> {
    debug!(model = %model.name, classes = model.classes.len(), "validating model");

    let diagnostics = ModelValidator::new(&model, options).run();

    if diagnostics.has_errors() {
        info!(
            model = %model.name,
            errors = diagnostics.error_count(),
            warnings = diagnostics.warning_count(),
            "model validation failed"
        );
        return Err(ModelError::Validation(diagnostics));
    }

    info!(model = %model.name, warnings = diagnostics.warning_count(), "model certified");
    Ok(CertifiedModel {
        model: Arc::new(model),
        warnings: diagnostics.into_warnings(),
    })
}

/// The validation pass
pub struct ModelValidator<'a> {
    model: &'a Model,
    options: &'a ValidationOptions,
    diagnostics: Diagnostics,
}

impl<'a> ModelValidator<'a> {
    pub fn new(model: &'a Model, options: &'a ValidationOptions) -> Self {
        Self {
            model,
            options,
            diagnostics: Diagnostics::new(),
        }
    }

    /// Run every check and return the full report
    pub fn run(mut self) -> Diagnostics {
        self.check_model_range();
        self.check_type_names();

        let model = self.model;
        for interface in &model.interfaces {
            let range = interface.effective_range(&model.version_range);
            self.check_range(&interface.name, &range, &model.version_range, "model");
            for parent in &interface.superinterfaces {
                if !matches!(model.lookup(parent), Some(TypeRef::Interface(_))) {
                    self.report_unresolved_interface(&interface.name, parent);
                }
            }
        }

        for class in &model.classes {
            self.check_class(class);
        }

        self.check_inheritance_cycles();
        self.diagnostics
    }

    // -------------------------------------------------------------------------
    // Model level
    // -------------------------------------------------------------------------

    fn check_model_range(&mut self) {
        if !self.model.version_range.is_well_formed() {
            self.diagnostics.report(
                "model",
                DiagnosticCode::MalformedVersionRange,
                format!("model version range '{}' has lower bound above upper bound", self.model.version_range),
            );
        }
    }

    fn check_type_names(&mut self) {
        let mut seen: HashMap<&str, usize> = HashMap::new();
        let model = self.model;
        for name in model.type_names() {
            let count = seen.entry(name).or_insert(0);
            *count += 1;
            if *count == 2 {
                self.diagnostics.report(
                    name,
                    DiagnosticCode::DuplicateType,
                    format!("type name '{}' is declared more than once", name),
                );
            }
            if *count == 1 {
                self.check_identifier(name, name);
            }
        }
    }

    fn check_identifier(&mut self, entity: &str, name: &str) {
        if !IDENTIFIER.is_match(name) {
            self.diagnostics.report(
                entity,
                DiagnosticCode::InvalidIdentifier,
                format!("'{}' is not a valid identifier", name),
            );
        }
    }

    /// Well-formedness, then containment in the owner's range
    fn check_range(&mut self, entity: &str, range: &VersionRange, owner: &VersionRange, owner_name: &str) {
        if !range.is_well_formed() {
            self.diagnostics.report(
                entity,
                DiagnosticCode::MalformedVersionRange,
                format!("version range '{}' has lower bound above upper bound", range),
            );
            return;
        }
        if owner.is_well_formed() && !owner.contains_range(range) {
            self.diagnostics.push(
                DiagnosticItem::new(
                    entity,
                    DiagnosticCode::RangeNotContained,
                    format!("version range '{}' is not contained in {}'s range '{}'", range, owner_name, owner),
                ),
            );
        }
    }

    // -------------------------------------------------------------------------
    // Classes
    // -------------------------------------------------------------------------

    fn check_class(&mut self, class: &ModelClass) {
        let model = self.model;
        let model_range = &model.version_range;
        let class_range = class.effective_range(model_range);
        self.check_range(&class.name, &class_range, model_range, "model");

        if let Some(superclass) = &class.superclass {
            match model.lookup(superclass) {
                Some(TypeRef::Class(_)) => {}
                Some(TypeRef::Interface(_)) => self.diagnostics.report(
                    &class.name,
                    DiagnosticCode::UnresolvedSuperclass,
                    format!("superclass '{}' is an interface", superclass),
                ),
                None => {
                    let mut item = DiagnosticItem::new(
                        &class.name,
                        DiagnosticCode::UnresolvedSuperclass,
                        format!("superclass '{}' is not declared", superclass),
                    );
                    if let Some(hint) = self.suggest(superclass) {
                        item = item.with_context(format!("did you mean '{}'?", hint));
                    }
                    self.diagnostics.push(item);
                }
            }
        }

        for interface in &class.interfaces {
            if !matches!(model.lookup(interface), Some(TypeRef::Interface(_))) {
                self.report_unresolved_interface(&class.name, interface);
            }
        }

        self.check_deprecation(class, &class_range);
        self.check_members(class, &class_range);
    }

    fn check_deprecation(&mut self, class: &ModelClass, class_range: &VersionRange) {
        match &class.deprecated_version {
            None if self.model.defaults.check_deprecation() && class_range.is_bounded_above() => {
                self.diagnostics.report(
                    &class.name,
                    DiagnosticCode::MissingDeprecation,
                    format!(
                        "class has bounded version range '{}' but no deprecated version",
                        class_range
                    ),
                );
            }
            Some(deprecated) if !class_range.contains(deprecated) => {
                self.diagnostics.report(
                    &class.name,
                    DiagnosticCode::DeprecationOutsideRange,
                    format!("deprecated version {} is outside range '{}'", deprecated, class_range),
                );
            }
            _ => {}
        }
    }

    fn check_members(&mut self, class: &ModelClass, class_range: &VersionRange) {
        let mut seen: HashMap<&str, usize> = HashMap::new();
        let names = class
            .fields
            .iter()
            .map(|f| f.name.as_str())
            .chain(class.associations.iter().map(|a| a.name()));
        for name in names {
            let count = seen.entry(name).or_insert(0);
            *count += 1;
            let entity = member_entity(class, name);
            if *count == 2 {
                self.diagnostics.report(
                    &entity,
                    DiagnosticCode::DuplicateMember,
                    format!("member '{}' is declared more than once in {}", name, class.name),
                );
            }
            if *count == 1 {
                self.check_identifier(&entity, name);
            }
        }

        for field in &class.fields {
            self.check_field(class, class_range, field);
        }
        for association in &class.associations {
            self.check_association(class, class_range, association);
        }
    }

    fn check_field(&mut self, class: &ModelClass, class_range: &VersionRange, field: &ModelField) {
        let entity = member_entity(class, &field.name);
        self.check_range(&entity, &field.effective_range(class_range), class_range, &class.name);

        let type_name = field.type_name.trim();
        if type_name.is_empty() {
            self.diagnostics.report(&entity, DiagnosticCode::UnresolvedType, "field declares no type");
            return;
        }
        let resolvable = is_primitive(type_name)
            || self.model.lookup(type_name).is_some()
            || self.options.external_types.contains(type_name);
        if !resolvable {
            let hint = self.suggest(type_name);
            self.diagnostics.unresolved_type(&entity, type_name, hint.as_deref());
        }
    }

    fn check_association(&mut self, class: &ModelClass, class_range: &VersionRange, association: &ModelAssociation) {
        let entity = member_entity(class, association.name());
        let range = association.effective_range(class_range);
        self.check_range(&entity, &range, class_range, &class.name);

        match self.model.lookup(&association.target) {
            Some(target) => {
                let target_range = target.effective_range(&self.model.version_range);
                if range.is_well_formed() && target_range.is_well_formed() && !target_range.contains_range(&range) {
                    self.diagnostics.push(
                        DiagnosticItem::new(
                            &entity,
                            DiagnosticCode::TargetNotActive,
                            format!(
                                "association is active in '{}' but target '{}' only in '{}'",
                                range,
                                target.name(),
                                target_range
                            ),
                        ),
                    );
                }
            }
            None => {
                let hint = self.suggest(&association.target);
                self.diagnostics.unresolved_type(&entity, &association.target, hint.as_deref());
            }
        }

        if !association.explicit_type_matches() {
            self.diagnostics.push(
                DiagnosticItem::new(
                    &entity,
                    DiagnosticCode::AssociationTypeMismatch,
                    format!(
                        "declared type '{}' does not match association type '{}'",
                        association.field.type_name,
                        association.declared_type()
                    ),
                )
                .with_context("leave the type out or name the collection or target"),
            );
        }

        if association.bidirectional && association.back_reference.is_none() {
            self.diagnostics.report(
                &entity,
                DiagnosticCode::MissingBackReference,
                "association is bidirectional but names no back-reference",
            );
        }
    }

    fn report_unresolved_interface(&mut self, entity: &str, interface: &str) {
        let message = match self.model.lookup(interface) {
            Some(TypeRef::Class(_)) => format!("'{}' is a class, not an interface", interface),
            _ => format!("interface '{}' is not declared", interface),
        };
        self.diagnostics.report(entity, DiagnosticCode::UnresolvedInterface, message);
    }

    // -------------------------------------------------------------------------
    // Inheritance
    // -------------------------------------------------------------------------

    fn check_inheritance_cycles(&mut self) {
        let model = self.model;

        let classes: Vec<(&str, Vec<&str>)> = model
            .classes
            .iter()
            .map(|c| (c.name.as_str(), c.superclass.as_deref().into_iter().collect()))
            .collect();
        for members in find_cycles(&classes) {
            self.diagnostics.push(
                DiagnosticItem::new(
                    members[0],
                    DiagnosticCode::InheritanceCycle,
                    format!("superclass chain of '{}' loops back on itself", members[0]),
                )
                .with_context(format!("cycle members: {}", members.join(", "))),
            );
        }

        let interfaces: Vec<(&str, Vec<&str>)> = model
            .interfaces
            .iter()
            .map(|i| (i.name.as_str(), i.superinterfaces.iter().map(String::as_str).collect()))
            .collect();
        for members in find_cycles(&interfaces) {
            self.diagnostics.push(
                DiagnosticItem::new(
                    members[0],
                    DiagnosticCode::InheritanceCycle,
                    format!("superinterfaces of '{}' loop back on it", members[0]),
                )
                .with_context(format!("cycle members: {}", members.join(", "))),
            );
        }
    }

    // -------------------------------------------------------------------------
    // Helpers
    // -------------------------------------------------------------------------

    /// Closest known type name, for "did you mean" hints
    fn suggest(&self, unknown: &str) -> Option<String> {
        let matcher = SkimMatcherV2::default();
        self.model
            .type_names()
            .chain(PRIMITIVE_TYPES.iter().copied())
            .chain(self.options.external_types.iter().map(String::as_str))
            .filter_map(|candidate| {
                matcher
                    .fuzzy_match(candidate, unknown)
                    .or_else(|| matcher.fuzzy_match(unknown, candidate))
                    .map(|score| (score, candidate))
            })
            .max_by(|a, b| a.0.cmp(&b.0).then_with(|| b.1.cmp(a.1)))
            .map(|(_, name)| name.to_string())
    }
}

fn member_entity(class: &ModelClass, member: &str) -> String {
    format!("{}.{}", class.name, member)
}

/// Strongly connected parent chains among `types`, each listed in
/// declaration order, cycles ordered by their first member
fn find_cycles<'m>(types: &[(&'m str, Vec<&'m str>)]) -> Vec<Vec<&'m str>> {
    let mut graph: DiGraph<&str, ()> = DiGraph::new();
    let mut nodes: HashMap<&str, NodeIndex> = HashMap::new();
    let mut order: HashMap<NodeIndex, usize> = HashMap::new();

    for (i, (name, _)) in types.iter().enumerate() {
        if nodes.contains_key(name) {
            continue;
        }
        let idx = graph.add_node(*name);
        nodes.insert(*name, idx);
        order.insert(idx, i);
    }
    for (name, parents) in types {
        let Some(from) = nodes.get(name).copied() else {
            continue;
        };
        for parent in parents {
            if let Some(to) = nodes.get(parent) {
                graph.update_edge(from, *to, ());
            }
        }
    }

    let mut cycles: Vec<Vec<NodeIndex>> = kosaraju_scc(&graph)
        .into_iter()
        .filter(|scc| scc.len() > 1 || graph.contains_edge(scc[0], scc[0]))
        .collect();
    for scc in &mut cycles {
        scc.sort_by_key(|idx| order[idx]);
    }
    cycles.sort_by_key(|scc| order[&scc[0]]);

    cycles
        .into_iter()
        .map(|scc| scc.iter().map(|idx| graph[*idx]).collect())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{DefaultKey, ModelDefaults, ModelInterface, Multiplicity};

    fn range(s: &str) -> VersionRange {
        VersionRange::parse(s).unwrap()
    }

    fn base_model() -> Model {
        Model::new("test")
            .with_range(range("1.0.0+"))
            .interface(ModelInterface::new("IPerson"))
            .class(
                ModelClass::new("Person")
                    .implements("IPerson")
                    .field(ModelField::new("name", "String")),
            )
            .class(
                ModelClass::new("Location").association(
                    ModelAssociation::new("persons", "IPerson", Multiplicity::Many),
                ),
            )
    }

    fn codes(err: ModelError) -> Vec<DiagnosticCode> {
        err.diagnostics()
            .expect("validation error")
            .all()
            .iter()
            .map(|i| i.code)
            .collect()
    }

    #[test]
    fn test_valid_model_is_certified() {
        let certified = validate(base_model(), &ValidationOptions::default()).unwrap();
        assert_eq!(certified.model().classes.len(), 2);
        assert!(certified.warnings().is_empty());
    }

    #[test]
    fn test_duplicate_type_names() {
        let model = base_model().class(ModelClass::new("Person"));
        let codes = codes(validate(model, &ValidationOptions::default()).unwrap_err());
        assert_eq!(codes, vec![DiagnosticCode::DuplicateType]);
    }

    #[test]
    fn test_interface_and_class_share_namespace() {
        let model = base_model().class(ModelClass::new("IPerson"));
        let codes = codes(validate(model, &ValidationOptions::default()).unwrap_err());
        assert!(codes.contains(&DiagnosticCode::DuplicateType));
    }

    #[test]
    fn test_unresolved_field_type_with_hint() {
        let model = base_model().class(ModelClass::new("Office").field(ModelField::new("where", "Locaton")));
        let err = validate(model, &ValidationOptions::default()).unwrap_err();
        let diags = err.diagnostics().unwrap();
        let item = diags.with_code(DiagnosticCode::UnresolvedType).next().unwrap();
        assert_eq!(item.entity, "Office.where");
        assert!(item.context.iter().any(|c| c.contains("Location")));
    }

    #[test]
    fn test_external_types_are_accepted() {
        let model = base_model().class(ModelClass::new("Office").field(ModelField::new("id", "java.util.UUID")));
        assert!(validate(model.clone(), &ValidationOptions::default()).is_err());
        let options = ValidationOptions::with_external_types(["java.util.UUID"]);
        assert!(validate(model, &options).is_ok());
    }

    #[test]
    fn test_malformed_and_uncontained_ranges() {
        let model = base_model()
            .class(ModelClass::new("Inverted").with_range(range("2.0/1.0")))
            .class(ModelClass::new("TooEarly").with_range(range("0.5/1.5")));
        let err = validate(model, &ValidationOptions::default()).unwrap_err();
        let diags = err.diagnostics().unwrap();
        assert_eq!(diags.for_entity("Inverted").next().unwrap().code, DiagnosticCode::MalformedVersionRange);
        assert_eq!(diags.for_entity("TooEarly").next().unwrap().code, DiagnosticCode::RangeNotContained);
    }

    #[test]
    fn test_member_range_must_fit_class() {
        let model = base_model().class(
            ModelClass::new("Office")
                .with_range(range("1.0/2.0"))
                .deprecated_in(Version::parse("2.0").unwrap())
                .field(ModelField::new("code", "String").with_range(range("1.5+"))),
        );
        let err = validate(model, &ValidationOptions::default()).unwrap_err();
        let item = err.diagnostics().unwrap().all()[0].clone();
        assert_eq!(item.entity, "Office.code");
        assert_eq!(item.code, DiagnosticCode::RangeNotContained);
    }

    #[test]
    fn test_association_target_must_cover_range() {
        let model = Model::new("test")
            .with_range(range("1.0.0+"))
            .class(ModelClass::new("Person").with_range(range("2.0.0+")))
            .class(
                ModelClass::new("Location")
                    .association(ModelAssociation::new("owner", "Person", Multiplicity::One)),
            );
        let codes = codes(validate(model, &ValidationOptions::default()).unwrap_err());
        assert_eq!(codes, vec![DiagnosticCode::TargetNotActive]);
    }

    #[test]
    fn test_deprecation_check_follows_default() {
        let class = ModelClass::new("Legacy").with_range(range("1.0/2.0"));

        let lenient = Model::new("test").with_range(range("1.0.0+")).class(class.clone());
        assert!(validate(lenient, &ValidationOptions::default()).is_ok());

        let strict = Model::new("test")
            .with_range(range("1.0.0+"))
            .with_defaults(ModelDefaults::new().with(DefaultKey::CheckDeprecation, "true"))
            .class(class);
        let err = validate(strict, &ValidationOptions::default()).unwrap_err();
        let item = &err.diagnostics().unwrap().all()[0];
        assert_eq!(item.code, DiagnosticCode::MissingDeprecation);
        assert_eq!(item.code.family(), "DeprecationError");
        assert_eq!(item.entity, "Legacy");
    }

    #[test]
    fn test_deprecated_version_outside_range_is_a_warning() {
        let model = Model::new("test").with_range(range("1.0.0+")).class(
            ModelClass::new("Legacy")
                .with_range(range("1.0/2.0"))
                .deprecated_in(Version::parse("3.0").unwrap()),
        );
        let certified = validate(model, &ValidationOptions::default()).unwrap();
        assert_eq!(certified.warnings().len(), 1);
    }

    #[test]
    fn test_superclass_and_interface_kinds() {
        let model = base_model()
            .class(ModelClass::new("A").extends("IPerson"))
            .class(ModelClass::new("B").implements("Person"))
            .class(ModelClass::new("C").extends("Persn"));
        let codes = codes(validate(model, &ValidationOptions::default()).unwrap_err());
        assert_eq!(
            codes,
            vec![
                DiagnosticCode::UnresolvedSuperclass,
                DiagnosticCode::UnresolvedInterface,
                DiagnosticCode::UnresolvedSuperclass,
            ]
        );
    }

    #[test]
    fn test_inheritance_cycle() {
        let model = Model::new("test")
            .class(ModelClass::new("A").extends("B"))
            .class(ModelClass::new("B").extends("A"))
            .class(ModelClass::new("Self").extends("Self"));
        let err = validate(model, &ValidationOptions::default()).unwrap_err();
        let cycles: Vec<_> = err
            .diagnostics()
            .unwrap()
            .with_code(DiagnosticCode::InheritanceCycle)
            .map(|i| i.entity.clone())
            .collect();
        assert_eq!(cycles, vec!["A".to_string(), "Self".to_string()]);
    }

    #[test]
    fn test_superinterface_cycle() {
        let model = base_model()
            .interface(ModelInterface::new("INamed").extends("ILabelled"))
            .interface(ModelInterface::new("ILabelled").extends("INamed"));
        let err = validate(model, &ValidationOptions::default()).unwrap_err();
        let diags = err.diagnostics().unwrap();
        let item = diags.with_code(DiagnosticCode::InheritanceCycle).next().unwrap();
        assert_eq!(item.entity, "INamed");
        assert_eq!(diags.len(), 1);
    }

    #[test]
    fn test_association_type_must_match() {
        let mut wrong_collection = ModelAssociation::new("tags", "Person", Multiplicity::Many);
        wrong_collection.field.type_name = "java.util.Map".to_string();
        let mut wrong_target = ModelAssociation::new("owner", "Person", Multiplicity::One);
        wrong_target.field.type_name = "Location".to_string();
        let mut agreeing = ModelAssociation::new("people", "Person", Multiplicity::Many);
        agreeing.field.type_name = "java.util.List".to_string();

        let model = base_model().class(
            ModelClass::new("Office")
                .association(wrong_collection)
                .association(wrong_target)
                .association(agreeing),
        );
        let err = validate(model, &ValidationOptions::default()).unwrap_err();
        let entities: Vec<_> = err
            .diagnostics()
            .unwrap()
            .with_code(DiagnosticCode::AssociationTypeMismatch)
            .map(|i| i.entity.clone())
            .collect();
        assert_eq!(entities, vec!["Office.tags".to_string(), "Office.owner".to_string()]);
    }

    #[test]
    fn test_bidirectional_without_back_reference() {
        let mut association = ModelAssociation::new("persons", "Person", Multiplicity::Many);
        association.bidirectional = true;
        let model = base_model().class(ModelClass::new("Office").association(association));
        let codes = codes(validate(model, &ValidationOptions::default()).unwrap_err());
        assert_eq!(codes, vec![DiagnosticCode::MissingBackReference]);
    }

    #[test]
    fn test_invalid_identifiers_and_duplicate_members() {
        let model = base_model().class(
            ModelClass::new("Office")
                .field(ModelField::new("first-name", "String"))
                .field(ModelField::new("code", "String"))
                .association(ModelAssociation::new("code", "Person", Multiplicity::One)),
        );
        let codes = codes(validate(model, &ValidationOptions::default()).unwrap_err());
        assert_eq!(codes, vec![DiagnosticCode::InvalidIdentifier, DiagnosticCode::DuplicateMember]);
    }

    #[test]
    fn test_declared_versions() {
        let model = Model::new("test")
            .with_range(range("1.0.0+"))
            .class(ModelClass::new("A").with_range(range("1.0/2.0")).deprecated_in(Version::parse("2.0").unwrap()))
            .class(ModelClass::new("B").field(ModelField::new("x", "int").with_range(range("1.5+"))));
        let certified = validate(model, &ValidationOptions::default()).unwrap();
        let versions: Vec<String> = certified.declared_versions().iter().map(|v| v.to_string()).collect();
        assert_eq!(versions, vec!["1.0.0", "1.5", "2.0"]);
    }
}
