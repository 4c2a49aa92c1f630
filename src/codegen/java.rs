//! Java Data Object Emitter
//!
//! Emits one plain Java source file per active interface and class of the
//! resolved view.
//!
//! Key constraints:
//! - Only the annotated view is read; the raw model is never consulted
//! - Accessors follow the association contract: to-many gets
//!   add/remove/get/set over the whole collection, to-one gets get/set
//! - Inherited members are left to the Java superclass
//! - Inverse updates go through package-private attach/detach methods so
//!   the two sides never call each other's public accessors

use anyhow::{bail, Context};
use std::collections::BTreeMap;
use std::path::PathBuf;

use super::names::capitalise;
use super::{Artifact, Backend, GenerationContext, ModelVisitor};
use crate::model::CollectionKind;
use crate::resolve::{
    AnnotatedModel, AssociationAnnotation, ResolvedAssociation, ResolvedClass,
    ResolvedField, ResolvedInterface, ResolvedModel,
};

/// Plain Java objects with accessors and collection initializers
pub struct JavaBackend;

impl Backend for JavaBackend {
    fn id(&self) -> &str {
        "java"
    }

    fn generate(&self, ctx: &GenerationContext<'_>) -> anyhow::Result<Vec<Artifact>> {
        let encoding = ctx.config().encoding();
        if !matches!(encoding.to_ascii_uppercase().as_str(), "UTF-8" | "UTF8") {
            bail!("unsupported source encoding '{}', only UTF-8 is written", encoding);
        }

        let mut package = ctx.view().package.clone();
        if ctx.config().package_with_version() {
            let segments: Vec<String> = ctx.version().segments().iter().map(u32::to_string).collect();
            package = format!("{}.v{}", package, segments.join("_"));
        }

        let mut emitter = JavaEmitter::new(ctx.model(), package);
        ctx.walk(&mut emitter)?;
        Ok(emitter.artifacts)
    }
}

// =============================================================================
// Emitter
// =============================================================================

#[derive(Default)]
struct ClassBuffer {
    declarations: String,
    accessors: String,
}

struct JavaEmitter<'a> {
    model: &'a AnnotatedModel,
    package: String,
    /// (declaring class, member) pairs that receive inverse updates, mapped
    /// to the member on the other side of the pair
    inverse_members: BTreeMap<(String, String), String>,
    current: Option<ClassBuffer>,
    artifacts: Vec<Artifact>,
}

impl<'a> JavaEmitter<'a> {
    fn new(model: &'a AnnotatedModel, package: String) -> Self {
        Self {
            model,
            package,
            inverse_members: BTreeMap::new(),
            current: None,
            artifacts: Vec::new(),
        }
    }

    fn path_for(&self, type_name: &str) -> PathBuf {
        let mut path: PathBuf = self.package.split('.').collect();
        path.push(format!("{}.java", type_name));
        path
    }

    fn header(&self, view: &ResolvedModel) -> String {
        format!(
            "// Generated by modelgen from model '{}' version {}. Do not edit.\n\npackage {};\n\n",
            view.name, view.version, self.package
        )
    }

    fn buffer(&mut self) -> anyhow::Result<&mut ClassBuffer> {
        self.current.as_mut().context("member visited outside of a class")
    }
}

impl ModelVisitor for JavaEmitter<'_> {
    fn begin_model(&mut self, view: &ResolvedModel) -> anyhow::Result<()> {
        for annotation in &self.model.annotations {
            let Some(inverse) = &annotation.inverse else {
                continue;
            };
            let declared_in = view
                .get_class(&inverse.target_type)
                .and_then(|c| c.get_association(&inverse.inverse_member))
                .map(|a| a.declared_in.clone())
                .with_context(|| format!("inverse member '{}.{}' is not in the view", inverse.target_type, inverse.inverse_member))?;
            self.inverse_members
                .entry((declared_in, inverse.inverse_member.clone()))
                .or_insert_with(|| annotation.association.clone());
            self.inverse_members
                .entry((annotation.declared_in.clone(), annotation.association.clone()))
                .or_insert_with(|| inverse.inverse_member.clone());
        }
        Ok(())
    }

    fn visit_interface(&mut self, interface: &ResolvedInterface) -> anyhow::Result<()> {
        let view = &self.model.view;
        let mut out = self.header(view);

        out.push_str(&format!("public interface {}\n", interface.name));
        if !interface.superinterfaces.is_empty() {
            out.push_str(&format!("    extends {}\n", interface.superinterfaces.join(", ")));
        }
        out.push_str("{\n");
        for method in &interface.methods {
            let params: Vec<String> = method
                .parameters
                .iter()
                .map(|p| format!("{} {}", java_type(&p.type_name), p.name))
                .collect();
            let return_type = method.return_type.as_deref().map(java_type).unwrap_or("void");
            out.push_str(&format!("    {} {}({});\n", return_type, method.name, spaced(&params.join(", "))));
        }
        out.push_str("}\n");

        self.artifacts.push(Artifact::new(self.path_for(&interface.name), out));
        Ok(())
    }

    fn begin_class(&mut self, _class: &ResolvedClass) -> anyhow::Result<()> {
        self.current = Some(ClassBuffer::default());
        Ok(())
    }

    fn visit_field(&mut self, _class: &ResolvedClass, field: &ResolvedField) -> anyhow::Result<()> {
        if field.inherited {
            return Ok(());
        }
        let name = field.name().to_string();
        let type_name = java_type(&field.field.type_name).to_string();
        let init = field
            .field
            .default_value
            .as_deref()
            .map(|v| format!(" = {}", java_literal(&type_name, v)))
            .unwrap_or_default();
        let getter = if type_name == "boolean" { "is" } else { "get" };

        let buffer = self.buffer()?;
        buffer.declarations.push_str(&format!("    private {} {}{};\n", type_name, name, init));
        buffer.accessors.push_str(&format!(
            "    public {t} {g}{c}()\n    {{\n        return this.{n};\n    }}\n\n\
             \x20   public void set{c}( {t} {n} )\n    {{\n        this.{n} = {n};\n    }}\n\n",
            t = type_name,
            g = getter,
            c = capitalise(&name),
            n = name,
        ));
        Ok(())
    }

    fn visit_association(
        &mut self,
        class: &ResolvedClass,
        association: &ResolvedAssociation,
        annotation: &AssociationAnnotation,
    ) -> anyhow::Result<()> {
        let opposite = self
            .inverse_members
            .get(&(class.name.clone(), association.name().to_string()))
            .cloned();
        if association.inherited {
            return Ok(());
        }

        let mut accessors = String::new();
        let declaration = match annotation.contract.collection_kind {
            Some(kind) => emit_to_many(&mut accessors, annotation, kind, opposite.is_some())?,
            None => emit_to_one(&mut accessors, annotation, opposite.as_deref()),
        };

        let buffer = self.buffer()?;
        buffer.declarations.push_str(&declaration);
        buffer.accessors.push_str(&accessors);
        Ok(())
    }

    fn end_class(&mut self, class: &ResolvedClass) -> anyhow::Result<()> {
        let buffer = self.current.take().context("class ended twice")?;
        let view = &self.model.view;
        let mut out = self.header(view);

        if let Some(description) = &class.description {
            out.push_str(&format!("/**\n * {}\n */\n", description));
        }
        if class.deprecated_version.as_ref().is_some_and(|d| *d <= view.version) {
            out.push_str("@Deprecated\n");
        }
        let modifier = if class.is_abstract { "abstract " } else { "" };
        out.push_str(&format!("public {}class {}\n", modifier, class.name));
        if let Some(superclass) = &class.superclass {
            out.push_str(&format!("    extends {}\n", superclass));
        }
        if !class.interfaces.is_empty() {
            out.push_str(&format!("    implements {}\n", class.interfaces.join(", ")));
        }
        out.push_str("{\n");
        out.push_str(&buffer.declarations);
        if !buffer.accessors.is_empty() {
            out.push('\n');
            out.push_str(buffer.accessors.trim_end());
            out.push('\n');
        }
        out.push_str("}\n");

        self.artifacts.push(Artifact::new(self.path_for(&class.name), out));
        Ok(())
    }
}

// =============================================================================
// Association Emission
// =============================================================================

/// Returns the field declaration; accessors are appended to `out`
fn emit_to_many(
    out: &mut String,
    annotation: &AssociationAnnotation,
    kind: CollectionKind,
    inverse_hooks: bool,
) -> anyhow::Result<String> {
    let element = &annotation.contract.element_type;
    let name = &annotation.association;
    let single = &annotation.contract.singular_name;
    let plural_cap = capitalise(name);
    let single_cap = capitalise(single);

    let keyed = matches!(kind, CollectionKind::Map | CollectionKind::Properties);
    if keyed && (annotation.inverse.is_some() || inverse_hooks) {
        bail!("bidirectional {} associations are not supported", kind);
    }

    let collection_type = match kind {
        CollectionKind::List | CollectionKind::Set => format!("{}<{}>", kind.type_name(), element),
        CollectionKind::Map | CollectionKind::Properties => kind.type_name().to_string(),
    };
    let initializer = annotation
        .initializer
        .as_ref()
        .map(|i| i.render(element))
        .context("to-many association without initializer")?;

    let (link, unlink) = inverse_calls(annotation, single);

    if keyed {
        out.push_str(&format!(
            "    public void add{sc}( Object key, {e} {s} )\n    {{\n        get{pc}().put( key, {s} );\n    }}\n\n\
             \x20   public void remove{sc}( Object key )\n    {{\n        get{pc}().remove( key );\n    }}\n\n",
            sc = single_cap,
            pc = plural_cap,
            e = element,
            s = single,
        ));
    } else {
        out.push_str(&format!(
            "    public void add{sc}( {e} {s} )\n    {{\n        get{pc}().add( {s} );\n{link}    }}\n\n\
             \x20   public void remove{sc}( {e} {s} )\n    {{\n        get{pc}().remove( {s} );\n{unlink}    }}\n\n",
            sc = single_cap,
            pc = plural_cap,
            e = element,
            s = single,
            link = link,
            unlink = unlink,
        ));
    }

    out.push_str(&format!(
        "    public {ct} get{pc}()\n    {{\n        if ( this.{n} == null )\n        {{\n            this.{n} = {init};\n        }}\n        return this.{n};\n    }}\n\n",
        ct = collection_type,
        pc = plural_cap,
        n = name,
        init = initializer,
    ));

    match &annotation.inverse {
        Some(inverse) => {
            let hook = capitalise(&inverse.inverse_member);
            out.push_str(&format!(
                "    public void set{pc}( {ct} {n} )\n    {{\n\
                 \x20       for ( {e} element : get{pc}() )\n        {{\n            element.detach{h}( this );\n        }}\n\
                 \x20       this.{n} = {n};\n\
                 \x20       for ( {e} element : get{pc}() )\n        {{\n            element.attach{h}( this );\n        }}\n    }}\n\n",
                pc = plural_cap,
                ct = collection_type,
                n = name,
                e = element,
                h = hook,
            ));
        }
        None => {
            out.push_str(&format!(
                "    public void set{pc}( {ct} {n} )\n    {{\n        this.{n} = {n};\n    }}\n\n",
                pc = plural_cap,
                ct = collection_type,
                n = name,
            ));
        }
    }

    if inverse_hooks {
        out.push_str(&format!(
            "    void attach{pc}( {e} value )\n    {{\n        if ( !get{pc}().contains( value ) )\n        {{\n            get{pc}().add( value );\n        }}\n    }}\n\n\
             \x20   void detach{pc}( {e} value )\n    {{\n        get{pc}().remove( value );\n    }}\n\n",
            pc = plural_cap,
            e = element,
        ));
    }

    Ok(format!("    private {} {};\n", collection_type, name))
}

fn emit_to_one(out: &mut String, annotation: &AssociationAnnotation, opposite: Option<&str>) -> String {
    let element = &annotation.contract.element_type;
    let name = &annotation.association;
    let cap = capitalise(name);

    let (before, after) = match &annotation.inverse {
        Some(inverse) => {
            let hook = capitalise(&inverse.inverse_member);
            (
                format!(
                    "        if ( this.{n} != null )\n        {{\n            this.{n}.detach{h}( this );\n        }}\n",
                    n = name,
                    h = hook
                ),
                format!(
                    "        if ( {n} != null )\n        {{\n            {n}.attach{h}( this );\n        }}\n",
                    n = name,
                    h = hook
                ),
            )
        }
        None => (String::new(), String::new()),
    };

    out.push_str(&format!(
        "    public {e} get{c}()\n    {{\n        return this.{n};\n    }}\n\n\
         \x20   public void set{c}( {e} {n} )\n    {{\n{before}        this.{n} = {n};\n{after}    }}\n\n",
        e = element,
        c = cap,
        n = name,
        before = before,
        after = after,
    ));

    if let Some(opposite) = opposite {
        // the previous owner lets go before the new one is recorded
        out.push_str(&format!(
            "    void attach{c}( {e} value )\n    {{\n\
             \x20       if ( this.{n} != null && this.{n} != value )\n        {{\n            this.{n}.detach{o}( this );\n        }}\n\
             \x20       this.{n} = value;\n    }}\n\n\
             \x20   void detach{c}( {e} value )\n    {{\n        if ( this.{n} == value )\n        {{\n            this.{n} = null;\n        }}\n    }}\n\n",
            c = cap,
            e = element,
            n = name,
            o = capitalise(opposite),
        ));
    }

    format!("    private {} {};\n", element, name)
}

/// Statements run after add/remove to keep the inverse side in step
fn inverse_calls(annotation: &AssociationAnnotation, element_var: &str) -> (String, String) {
    match &annotation.inverse {
        Some(inverse) => {
            let hook = capitalise(&inverse.inverse_member);
            (
                format!("        {}.attach{}( this );\n", element_var, hook),
                format!("        {}.detach{}( this );\n", element_var, hook),
            )
        }
        None => (String::new(), String::new()),
    }
}

// =============================================================================
// Helper Utilities
// =============================================================================

/// Java spelling of a model type name
fn java_type(type_name: &str) -> &str {
    match type_name {
        "Date" => "java.util.Date",
        "DOM" => "Object",
        other => other,
    }
}

/// Default value as a Java expression
fn java_literal(type_name: &str, value: &str) -> String {
    match type_name {
        "String" if !value.starts_with('"') => {
            format!("\"{}\"", value.replace('\\', "\\\\").replace('"', "\\\""))
        }
        "char" | "Character" if !value.starts_with('\'') => format!("'{}'", value),
        "long" | "Long" if value.parse::<i64>().is_ok() => format!("{}L", value),
        "float" | "Float" if value.parse::<f32>().is_ok() => format!("{}f", value),
        _ => value.to_string(),
    }
}

fn spaced(params: &str) -> String {
    if params.is_empty() {
        String::new()
    } else {
        format!(" {} ", params)
    }
}
