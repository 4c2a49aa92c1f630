//! Manifest backend
//!
//! Writes the resolved view and every association annotation as one JSON
//! document per version. Useful for diffing what a version looks like
//! without reading generated sources.

use serde::Serialize;
use std::collections::BTreeMap;

use super::{Artifact, Backend, GenerationContext, ModelVisitor};
use crate::resolve::{
    AssociationAnnotation, ResolvedAssociation, ResolvedClass, ResolvedField, ResolvedInterface,
    ResolvedModel,
};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ManifestDocument {
    model: String,
    package: String,
    version: String,
    defaults: BTreeMap<String, String>,
    types: Vec<TypeEntry>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase", tag = "kind")]
enum TypeEntry {
    Interface {
        name: String,
        superinterfaces: Vec<String>,
        methods: Vec<String>,
    },
    Class {
        name: String,
        #[serde(rename = "abstract")]
        is_abstract: bool,
        #[serde(skip_serializing_if = "Option::is_none")]
        superclass: Option<String>,
        interfaces: Vec<String>,
        #[serde(rename = "deprecatedVersion", skip_serializing_if = "Option::is_none")]
        deprecated_version: Option<String>,
        fields: Vec<FieldEntry>,
        associations: Vec<AssociationAnnotation>,
    },
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct FieldEntry {
    name: String,
    #[serde(rename = "type")]
    type_name: String,
    required: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    default_value: Option<String>,
    declared_in: String,
}

/// JSON description of the annotated view
pub struct ManifestBackend;

impl Backend for ManifestBackend {
    fn id(&self) -> &str {
        "manifest"
    }

    fn generate(&self, ctx: &GenerationContext<'_>) -> anyhow::Result<Vec<Artifact>> {
        let mut collector = ManifestCollector::default();
        ctx.walk(&mut collector)?;

        let document = collector
            .document
            .ok_or_else(|| anyhow::anyhow!("traversal never reached the model"))?;
        let content = serde_json::to_string_pretty(&document)?;
        let path = format!("{}-{}.manifest.json", ctx.view().name, ctx.version());
        Ok(vec![Artifact::new(path, content + "\n")])
    }
}

#[derive(Default)]
struct ManifestCollector {
    document: Option<ManifestDocument>,
}

impl ManifestCollector {
    fn types(&mut self) -> anyhow::Result<&mut Vec<TypeEntry>> {
        self.document
            .as_mut()
            .map(|d| &mut d.types)
            .ok_or_else(|| anyhow::anyhow!("type visited before the model"))
    }

    fn current_class(&mut self) -> anyhow::Result<(&mut Vec<FieldEntry>, &mut Vec<AssociationAnnotation>)> {
        match self.types()?.last_mut() {
            Some(TypeEntry::Class {
                fields, associations, ..
            }) => Ok((fields, associations)),
            _ => Err(anyhow::anyhow!("member visited outside of a class")),
        }
    }
}

impl ModelVisitor for ManifestCollector {
    fn begin_model(&mut self, view: &ResolvedModel) -> anyhow::Result<()> {
        self.document = Some(ManifestDocument {
            model: view.name.clone(),
            package: view.package.clone(),
            version: view.version.to_string(),
            defaults: view
                .defaults
                .effective()
                .into_iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            types: Vec::new(),
        });
        Ok(())
    }

    fn visit_interface(&mut self, interface: &ResolvedInterface) -> anyhow::Result<()> {
        let methods = interface
            .methods
            .iter()
            .map(|m| {
                let params: Vec<String> = m
                    .parameters
                    .iter()
                    .map(|p| format!("{}: {}", p.name, p.type_name))
                    .collect();
                match &m.return_type {
                    Some(ret) => format!("{}({}) -> {}", m.name, params.join(", "), ret),
                    None => format!("{}({})", m.name, params.join(", ")),
                }
            })
            .collect();

        self.types()?.push(TypeEntry::Interface {
            name: interface.name.clone(),
            superinterfaces: interface.superinterfaces.clone(),
            methods,
        });
        Ok(())
    }

    fn begin_class(&mut self, class: &ResolvedClass) -> anyhow::Result<()> {
        self.types()?.push(TypeEntry::Class {
            name: class.name.clone(),
            is_abstract: class.is_abstract,
            superclass: class.superclass.clone(),
            interfaces: class.interfaces.clone(),
            deprecated_version: class.deprecated_version.as_ref().map(ToString::to_string),
            fields: Vec::new(),
            associations: Vec::new(),
        });
        Ok(())
    }

    fn visit_field(&mut self, _class: &ResolvedClass, field: &ResolvedField) -> anyhow::Result<()> {
        let (fields, _) = self.current_class()?;
        fields.push(FieldEntry {
            name: field.name().to_string(),
            type_name: field.field.type_name.clone(),
            required: field.field.required,
            default_value: field.field.default_value.clone(),
            declared_in: field.declared_in.clone(),
        });
        Ok(())
    }

    fn visit_association(
        &mut self,
        _class: &ResolvedClass,
        _association: &ResolvedAssociation,
        annotation: &AssociationAnnotation,
    ) -> anyhow::Result<()> {
        let (_, associations) = self.current_class()?;
        associations.push(annotation.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codegen::GenerationConfig;
    use crate::model::{Model, ModelAssociation, ModelClass, ModelField, ModelInterface, Multiplicity};
    use crate::validate::{validate, ValidationOptions};
    use crate::version::Version;

    #[test]
    fn test_manifest_document() {
        let model = Model::new("ifaceassociation")
            .interface(ModelInterface::new("IPerson"))
            .class(ModelClass::new("Person").implements("IPerson").field(ModelField::new("name", "String")))
            .class(
                ModelClass::new("Location")
                    .association(ModelAssociation::new("persons", "IPerson", Multiplicity::Many)),
            );
        let annotated = validate(model, &ValidationOptions::default())
            .unwrap()
            .resolve(&Version::parse("1.0").unwrap())
            .unwrap()
            .annotate()
            .unwrap();

        let config = GenerationConfig::new();
        let artifacts = ManifestBackend
            .generate(&GenerationContext::new(&annotated, &config))
            .unwrap();
        assert_eq!(artifacts.len(), 1);
        assert_eq!(artifacts[0].path.to_string_lossy(), "ifaceassociation-1.0.manifest.json");

        let json: serde_json::Value = serde_json::from_str(&artifacts[0].content).unwrap();
        assert_eq!(json["defaults"]["java.util.List"], "new java.util.ArrayList<?>()");
        assert_eq!(json["types"][0]["kind"], "interface");
        assert_eq!(json["types"][2]["name"], "Location");
        let persons = &json["types"][2]["associations"][0];
        assert_eq!(persons["contract"]["elementType"], "IPerson");
        assert_eq!(persons["contract"]["operations"], serde_json::json!(["add", "remove", "getAll", "setAll"]));
        assert_eq!(persons["initializer"]["source"], "builtIn");
    }

    #[test]
    fn test_manifest_is_deterministic() {
        let model = Model::new("m").class(ModelClass::new("A").field(ModelField::new("x", "int")));
        let annotated = validate(model, &ValidationOptions::default())
            .unwrap()
            .resolve(&Version::parse("2.0").unwrap())
            .unwrap()
            .annotate()
            .unwrap();
        let config = GenerationConfig::new();
        let ctx = GenerationContext::new(&annotated, &config);
        assert_eq!(ManifestBackend.generate(&ctx).unwrap(), ManifestBackend.generate(&ctx).unwrap());
    }
}
