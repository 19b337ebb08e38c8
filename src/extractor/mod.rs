//! Parse tree → entity extraction.
//!
//! One traversal per file. Each type declaration (nested ones included) becomes
//! its own [`JavaType`]; members are collected in source order. A malformed
//! declaration is skipped and reported, its siblings are still extracted.

pub mod comments;

use crate::error::ExtractionError;
use crate::javadoc::parse_javadoc;
use crate::syntax::{is_comment_kind, SyntaxNode};
use crate::types::{
    qualify, Annotation, Document, Extraction, Field, JavaType, Method, Modifier, ModifierSet,
    Parameter, TypeKind,
};

use comments::{embedded_doc_comment, DocCommentTracker};

const TYPE_NODE_KINDS: &[&str] = &[
    "type_identifier",
    "scoped_type_identifier",
    "generic_type",
    "array_type",
    "integral_type",
    "floating_point_type",
    "boolean_type",
    "void_type",
];

#[derive(Debug, Clone)]
pub struct ExtractorOptions {
    /// Keep `private` members and nested types.
    pub include_private: bool,
}

impl Default for ExtractorOptions {
    fn default() -> Self {
        Self {
            include_private: true,
        }
    }
}

/// Declaration kinds the extractor dispatches on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeclarationKind {
    Type(TypeKind),
    Method,
    Constructor,
    Field,
    EnumConstant,
    AnnotationElement,
}

impl DeclarationKind {
    pub fn classify(kind: &str) -> Option<Self> {
        let decl = match kind {
            "class_declaration" => DeclarationKind::Type(TypeKind::Class),
            "interface_declaration" => DeclarationKind::Type(TypeKind::Interface),
            "enum_declaration" => DeclarationKind::Type(TypeKind::Enum),
            "record_declaration" => DeclarationKind::Type(TypeKind::Record),
            "annotation_type_declaration" => DeclarationKind::Type(TypeKind::Annotation),
            "method_declaration" => DeclarationKind::Method,
            "constructor_declaration" | "compact_constructor_declaration" => {
                DeclarationKind::Constructor
            }
            "field_declaration" | "constant_declaration" => DeclarationKind::Field,
            "enum_constant" => DeclarationKind::EnumConstant,
            "annotation_type_element_declaration" => DeclarationKind::AnnotationElement,
            _ => return None,
        };
        Some(decl)
    }

    fn describe(&self) -> &'static str {
        match self {
            DeclarationKind::Type(TypeKind::Class) => "class",
            DeclarationKind::Type(TypeKind::Interface) => "interface",
            DeclarationKind::Type(TypeKind::Enum) => "enum",
            DeclarationKind::Type(TypeKind::Record) => "record",
            DeclarationKind::Type(TypeKind::Annotation) => "annotation type",
            DeclarationKind::Method => "method",
            DeclarationKind::Constructor => "constructor",
            DeclarationKind::Field => "field",
            DeclarationKind::EnumConstant => "enum constant",
            DeclarationKind::AnnotationElement => "annotation element",
        }
    }
}

/// Where a declaration sits: the file's package and the enclosing type, if any.
#[derive(Debug, Clone)]
struct Scope {
    origin: String,
    package: String,
    owner: Option<Owner>,
}

#[derive(Debug, Clone)]
struct Owner {
    fqn: String,
    name: String,
}

impl Scope {
    fn qualify(&self, name: &str) -> String {
        match &self.owner {
            Some(owner) => format!("{}.{}", owner.fqn, name),
            None => qualify(&self.package, name),
        }
    }

    fn nested(&self, fqn: &str, name: &str) -> Scope {
        Scope {
            origin: self.origin.clone(),
            package: self.package.clone(),
            owner: Some(Owner {
                fqn: fqn.to_string(),
                name: name.to_string(),
            }),
        }
    }

    fn location(&self) -> String {
        match &self.owner {
            Some(owner) => format!(" in {}", owner.fqn),
            None if self.package.is_empty() => String::new(),
            None => format!(" in package {}", self.package),
        }
    }
}

/// Members gathered while walking one type body.
#[derive(Debug, Default)]
struct Members {
    methods: Vec<Method>,
    fields: Vec<Field>,
    nested: Vec<String>,
}

#[derive(Debug, Clone, Default)]
pub struct EntityExtractor {
    options: ExtractorOptions,
}

impl EntityExtractor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: ExtractorOptions) -> Self {
        Self { options }
    }

    /// Walk one file's tree and return every type found, outer types before
    /// the types nested in them.
    pub fn extract<N: SyntaxNode>(&self, root: &N, origin: &str) -> Extraction {
        let mut out = Extraction::default();
        let scope = Scope {
            origin: origin.to_string(),
            package: package_name(root).unwrap_or_default(),
            owner: None,
        };

        // Top-level members do not exist in Java; anything collected here is dropped.
        let mut top_level = Members::default();
        self.walk_declarations(root.children(), &scope, &mut top_level, &mut out);
        out
    }

    fn walk_declarations<N: SyntaxNode>(
        &self,
        nodes: Vec<N>,
        scope: &Scope,
        members: &mut Members,
        out: &mut Extraction,
    ) {
        let mut docs = DocCommentTracker::default();

        for node in nodes {
            let kind = node.kind();

            if is_comment_kind(kind) {
                docs.observe(node.text());
                continue;
            }

            if node.is_error() {
                docs.reset();
                out.errors.push(ExtractionError::new(
                    format!("declaration{}", scope.location()),
                    node.start_line(),
                    format!("syntax error near `{}`", snippet(node.text())),
                ));
                continue;
            }

            if kind == "enum_body_declarations" {
                docs.reset();
                self.walk_declarations(node.children(), scope, members, out);
                continue;
            }

            match DeclarationKind::classify(kind) {
                Some(decl) => {
                    let doc = docs.claim();
                    if let Err(reason) = self.visit(decl, &node, doc, scope, members, out) {
                        out.errors.push(ExtractionError::new(
                            format!("{}{}", decl.describe(), scope.location()),
                            node.start_line(),
                            reason,
                        ));
                    }
                }
                None if is_named_kind(kind) => docs.reset(),
                None => {}
            }
        }
    }

    fn visit<N: SyntaxNode>(
        &self,
        decl: DeclarationKind,
        node: &N,
        doc: Option<String>,
        scope: &Scope,
        members: &mut Members,
        out: &mut Extraction,
    ) -> Result<(), String> {
        match decl {
            DeclarationKind::Type(kind) => {
                if let Some(name) = self.visit_type(kind, node, doc, scope, out)? {
                    members.nested.push(name);
                }
            }
            DeclarationKind::Method => {
                if let Some(method) = self.build_method(node, doc, scope, false)? {
                    members.methods.push(method);
                }
            }
            DeclarationKind::Constructor => {
                if let Some(method) = self.build_method(node, doc, scope, true)? {
                    members.methods.push(method);
                }
            }
            DeclarationKind::AnnotationElement => {
                if let Some(method) = self.build_annotation_element(node, doc, scope)? {
                    members.methods.push(method);
                }
            }
            DeclarationKind::Field => {
                members.fields.extend(self.build_fields(node, doc)?);
            }
            DeclarationKind::EnumConstant => {
                members.fields.push(self.build_enum_constant(node, doc, scope)?);
            }
        }
        Ok(())
    }

    /// Builds the type, pushes it before its nested types, and returns its
    /// simple name (or `None` when it was filtered out).
    fn visit_type<N: SyntaxNode>(
        &self,
        kind: TypeKind,
        node: &N,
        sibling_doc: Option<String>,
        scope: &Scope,
        out: &mut Extraction,
    ) -> Result<Option<String>, String> {
        let name = declared_name(node).ok_or_else(|| "missing type name".to_string())?;

        // Modifiers and annotations first.
        let (modifiers, annotations) = modifiers_of(node);
        if !self.keeps(&modifiers) && scope.owner.is_some() {
            return Ok(None);
        }

        // Then the attached doc comment.
        let doc = attached_doc(node, sibling_doc);

        let fqn = scope.qualify(&name);
        let mut java_type = JavaType::new(scope.package.clone(), name.clone(), kind);
        java_type.fqn = fqn.clone();
        java_type.modifiers = modifiers;
        java_type.annotations = annotations;
        java_type.doc = doc;
        java_type.origin = scope.origin.clone();
        java_type.enclosing_type = scope.owner.as_ref().map(|o| o.fqn.clone());
        java_type.line = node.start_line();

        let slot = out.types.len();
        out.types.push(java_type);

        // Then members in source order.
        let inner = scope.nested(&fqn, &name);
        let mut members = Members::default();

        if kind == TypeKind::Record {
            if let Some(components) = node.child_by_field("parameters") {
                members.fields.extend(self.record_components(&components));
            }
        }
        if let Some(body) = node.child_by_field("body") {
            self.walk_declarations(body.children(), &inner, &mut members, out);
        }

        // Extends/implements last.
        let (extends, implements) = super_types(node, kind);

        let java_type = &mut out.types[slot];
        java_type.methods = members.methods;
        java_type.fields = members.fields;
        java_type.nested_types = members.nested;
        java_type.extends = extends;
        java_type.implements = implements;

        Ok(Some(name))
    }

    fn build_method<N: SyntaxNode>(
        &self,
        node: &N,
        sibling_doc: Option<String>,
        scope: &Scope,
        constructor: bool,
    ) -> Result<Option<Method>, String> {
        let name = declared_name(node).ok_or_else(|| "missing method name".to_string())?;
        let (modifiers, annotations) = modifiers_of(node);
        if !self.keeps(&modifiers) {
            return Ok(None);
        }
        let doc = attached_doc(node, sibling_doc);

        let return_type = if constructor {
            scope
                .owner
                .as_ref()
                .map(|o| o.name.clone())
                .unwrap_or_else(|| name.clone())
        } else {
            let base = node
                .child_by_field("type")
                .map(|t| type_text(&t))
                .ok_or_else(|| format!("method `{}` has no return type", name))?;
            match node.child_by_field("dimensions") {
                Some(dims) => format!("{}{}", base, compact(dims.text())),
                None => base,
            }
        };

        let parameters = node
            .child_by_field("parameters")
            .map(|p| self.parameters(&p))
            .unwrap_or_default();

        Ok(Some(Method {
            name,
            return_type,
            parameters,
            modifiers,
            annotations,
            doc,
            declaring_type: scope.owner.as_ref().map(|o| o.fqn.clone()).unwrap_or_default(),
            throws: throws_clause(node),
            type_parameters: node
                .child_by_field("type_parameters")
                .or_else(|| node.first_child_of_kind("type_parameters"))
                .map(|t| type_text(&t)),
            is_constructor: constructor,
        }))
    }

    fn build_annotation_element<N: SyntaxNode>(
        &self,
        node: &N,
        sibling_doc: Option<String>,
        scope: &Scope,
    ) -> Result<Option<Method>, String> {
        let name = declared_name(node).ok_or_else(|| "missing element name".to_string())?;
        let (modifiers, annotations) = modifiers_of(node);
        let return_type = node
            .child_by_field("type")
            .map(|t| type_text(&t))
            .ok_or_else(|| format!("element `{}` has no type", name))?;

        Ok(Some(Method {
            name,
            return_type,
            parameters: Vec::new(),
            modifiers,
            annotations,
            doc: attached_doc(node, sibling_doc),
            declaring_type: scope.owner.as_ref().map(|o| o.fqn.clone()).unwrap_or_default(),
            throws: Vec::new(),
            type_parameters: None,
            is_constructor: false,
        }))
    }

    /// One declaration may introduce several fields (`int x, y = 2;`).
    fn build_fields<N: SyntaxNode>(
        &self,
        node: &N,
        sibling_doc: Option<String>,
    ) -> Result<Vec<Field>, String> {
        let (modifiers, annotations) = modifiers_of(node);
        if !self.keeps(&modifiers) {
            return Ok(Vec::new());
        }
        let doc = attached_doc(node, sibling_doc);
        let base_type = node
            .child_by_field("type")
            .map(|t| type_text(&t))
            .ok_or_else(|| "field declaration has no type".to_string())?;

        let mut fields = Vec::new();
        for declarator in node
            .children()
            .into_iter()
            .filter(|c| c.kind() == "variable_declarator")
        {
            let Some(name) = declared_name(&declarator) else {
                continue;
            };
            let type_name = match declarator.child_by_field("dimensions") {
                Some(dims) => format!("{}{}", base_type, compact(dims.text())),
                None => base_type.clone(),
            };
            fields.push(Field {
                name,
                type_name,
                modifiers: modifiers.clone(),
                annotations: annotations.clone(),
                doc: doc.clone(),
                initial_value: declarator
                    .child_by_field("value")
                    .map(|v| v.text().trim().to_string()),
            });
        }

        if fields.is_empty() {
            return Err(format!("field declaration of type `{}` declares no names", base_type));
        }
        Ok(fields)
    }

    fn build_enum_constant<N: SyntaxNode>(
        &self,
        node: &N,
        sibling_doc: Option<String>,
        scope: &Scope,
    ) -> Result<Field, String> {
        let name = declared_name(node).ok_or_else(|| "missing enum constant name".to_string())?;
        let (_, annotations) = modifiers_of(node);
        let enum_name = scope.owner.as_ref().map(|o| o.name.clone()).unwrap_or_default();

        Ok(Field {
            name,
            type_name: enum_name,
            modifiers: [Modifier::Public, Modifier::Static, Modifier::Final]
                .into_iter()
                .collect(),
            annotations,
            doc: attached_doc(node, sibling_doc),
            initial_value: node.child_by_field("arguments").map(|a| type_text(&a)),
        })
    }

    fn record_components<N: SyntaxNode>(&self, components: &N) -> Vec<Field> {
        self.parameters(components)
            .into_iter()
            .map(|p| {
                let type_name = p.display_type();
                Field {
                    name: p.name,
                    type_name,
                    modifiers: [Modifier::Private, Modifier::Final].into_iter().collect(),
                    annotations: p.annotations,
                    doc: None,
                    initial_value: None,
                }
            })
            .collect()
    }

    fn parameters<N: SyntaxNode>(&self, params: &N) -> Vec<Parameter> {
        let mut result = Vec::new();
        for child in params.children() {
            match child.kind() {
                "formal_parameter" => {
                    if let Some(param) = formal_parameter(&child) {
                        result.push(param);
                    }
                }
                "spread_parameter" => {
                    if let Some(param) = spread_parameter(&child) {
                        result.push(param);
                    }
                }
                _ => {}
            }
        }
        result
    }

    fn keeps(&self, modifiers: &ModifierSet) -> bool {
        self.options.include_private || !modifiers.contains(&Modifier::Private)
    }
}

fn package_name<N: SyntaxNode>(root: &N) -> Option<String> {
    let package = root.first_child_of_kind("package_declaration")?;
    package
        .children()
        .into_iter()
        .find(|c| matches!(c.kind(), "scoped_identifier" | "identifier"))
        .map(|id| compact(id.text()))
}

fn declared_name<N: SyntaxNode>(node: &N) -> Option<String> {
    let name = node.child_by_field("name")?;
    if name.is_error() {
        return None;
    }
    let text = name.text().trim();
    if text.is_empty() {
        None
    } else {
        Some(text.to_string())
    }
}

fn modifiers_of<N: SyntaxNode>(node: &N) -> (ModifierSet, Vec<Annotation>) {
    let mut modifiers = ModifierSet::new();
    let mut annotations = Vec::new();

    if let Some(list) = node.first_child_of_kind("modifiers") {
        for child in list.children() {
            match child.kind() {
                "marker_annotation" | "annotation" => annotations.push(annotation(&child)),
                kind => {
                    if let Some(modifier) =
                        Modifier::from_keyword(kind).or_else(|| Modifier::from_keyword(child.text()))
                    {
                        modifiers.insert(modifier);
                    }
                }
            }
        }
    }

    (modifiers, annotations)
}

fn annotation<N: SyntaxNode>(node: &N) -> Annotation {
    let name = node
        .child_by_field("name")
        .map(|n| compact(n.text()))
        .unwrap_or_else(|| compact(node.text().trim_start_matches('@')));
    let mut result = Annotation::new(name);

    if let Some(arguments) = node.child_by_field("arguments") {
        for arg in arguments.children() {
            match arg.kind() {
                "(" | ")" | "," => {}
                kind if is_comment_kind(kind) => {}
                "element_value_pair" => {
                    let key = arg.child_by_field("key").map(|k| k.text().trim().to_string());
                    let value = arg.child_by_field("value").map(|v| v.text().trim().to_string());
                    if let (Some(key), Some(value)) = (key, value) {
                        result.arguments.insert(key, value);
                    }
                }
                _ => {
                    result
                        .arguments
                        .insert("value".to_string(), arg.text().trim().to_string());
                }
            }
        }
    }

    result
}

fn attached_doc<N: SyntaxNode>(node: &N, sibling_doc: Option<String>) -> Option<Document> {
    sibling_doc
        .or_else(|| embedded_doc_comment(node))
        .and_then(|raw| parse_javadoc(&raw))
}

fn formal_parameter<N: SyntaxNode>(node: &N) -> Option<Parameter> {
    let name = declared_name(node)?;
    let mut type_name = node.child_by_field("type").map(|t| type_text(&t))?;
    if let Some(dims) = node.child_by_field("dimensions") {
        type_name.push_str(&compact(dims.text()));
    }
    let (modifiers, annotations) = modifiers_of(node);

    Some(Parameter {
        name,
        type_name,
        annotations,
        is_varargs: false,
        is_final: modifiers.contains(&Modifier::Final),
    })
}

/// `String... args`: a single parameter flagged as variable arity.
fn spread_parameter<N: SyntaxNode>(node: &N) -> Option<Parameter> {
    let children = node.children();
    let type_name = children
        .iter()
        .find(|c| TYPE_NODE_KINDS.contains(&c.kind()))
        .map(type_text)?;
    let name = children
        .iter()
        .find(|c| c.kind() == "variable_declarator")
        .and_then(|d| declared_name(d).or_else(|| first_identifier(d)))
        .or_else(|| {
            children
                .iter()
                .find(|c| c.kind() == "identifier")
                .map(|c| c.text().trim().to_string())
        })?;
    let (modifiers, annotations) = modifiers_of(node);

    Some(Parameter {
        name,
        type_name,
        annotations,
        is_varargs: true,
        is_final: modifiers.contains(&Modifier::Final),
    })
}

fn first_identifier<N: SyntaxNode>(node: &N) -> Option<String> {
    node.first_child_of_kind("identifier")
        .map(|id| id.text().trim().to_string())
}

fn throws_clause<N: SyntaxNode>(node: &N) -> Vec<String> {
    node.first_child_of_kind("throws")
        .map(|t| type_names(&t))
        .unwrap_or_default()
}

fn super_types<N: SyntaxNode>(node: &N, kind: TypeKind) -> (Vec<String>, Vec<String>) {
    let extends = match kind {
        TypeKind::Interface => node
            .first_child_of_kind("extends_interfaces")
            .map(|e| type_names(&e))
            .unwrap_or_default(),
        _ => node
            .child_by_field("superclass")
            .or_else(|| node.first_child_of_kind("superclass"))
            .map(|s| type_names(&s))
            .unwrap_or_default(),
    };
    let implements = node
        .child_by_field("interfaces")
        .or_else(|| node.first_child_of_kind("super_interfaces"))
        .map(|i| type_names(&i))
        .unwrap_or_default();
    (extends, implements)
}

/// Type names directly under `node` or under its `type_list`.
fn type_names<N: SyntaxNode>(node: &N) -> Vec<String> {
    let mut names = Vec::new();
    for child in node.children() {
        if child.kind() == "type_list" {
            names.extend(type_names(&child));
        } else if TYPE_NODE_KINDS.contains(&child.kind()) {
            names.push(type_text(&child));
        }
    }
    names
}

fn type_text<N: SyntaxNode>(node: &N) -> String {
    node.text().split_whitespace().collect::<Vec<_>>().join(" ")
}

fn compact(text: &str) -> String {
    text.chars().filter(|c| !c.is_whitespace()).collect()
}

fn snippet(text: &str) -> String {
    let line = text.lines().next().unwrap_or("").trim();
    line.chars().take(40).collect()
}

/// Named grammar nodes start with a letter; punctuation tokens do not.
fn is_named_kind(kind: &str) -> bool {
    kind.chars().next().map_or(false, |c| c.is_ascii_alphabetic())
}
