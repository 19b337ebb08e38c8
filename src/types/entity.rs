use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::{Deserialize, Serialize};

use super::doc::Document;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Modifier {
    Public,
    Protected,
    Private,
    Static,
    Final,
    Abstract,
    Synchronized,
    Native,
    Transient,
    Volatile,
    Strictfp,
    Default,
    Sealed,
    NonSealed,
}

impl Modifier {
    /// Map a Java modifier keyword to its tag.
    pub fn from_keyword(keyword: &str) -> Option<Self> {
        let modifier = match keyword {
            "public" => Modifier::Public,
            "protected" => Modifier::Protected,
            "private" => Modifier::Private,
            "static" => Modifier::Static,
            "final" => Modifier::Final,
            "abstract" => Modifier::Abstract,
            "synchronized" => Modifier::Synchronized,
            "native" => Modifier::Native,
            "transient" => Modifier::Transient,
            "volatile" => Modifier::Volatile,
            "strictfp" => Modifier::Strictfp,
            "default" => Modifier::Default,
            "sealed" => Modifier::Sealed,
            "non-sealed" => Modifier::NonSealed,
            _ => return None,
        };
        Some(modifier)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Modifier::Public => "public",
            Modifier::Protected => "protected",
            Modifier::Private => "private",
            Modifier::Static => "static",
            Modifier::Final => "final",
            Modifier::Abstract => "abstract",
            Modifier::Synchronized => "synchronized",
            Modifier::Native => "native",
            Modifier::Transient => "transient",
            Modifier::Volatile => "volatile",
            Modifier::Strictfp => "strictfp",
            Modifier::Default => "default",
            Modifier::Sealed => "sealed",
            Modifier::NonSealed => "non-sealed",
        }
    }
}

impl fmt::Display for Modifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Declaration qualifiers, kept as tags so any combination is representable.
pub type ModifierSet = BTreeSet<Modifier>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TypeKind {
    Class,
    Interface,
    Enum,
    Record,
    Annotation,
}

impl TypeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TypeKind::Class => "class",
            TypeKind::Interface => "interface",
            TypeKind::Enum => "enum",
            TypeKind::Record => "record",
            TypeKind::Annotation => "@interface",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Annotation {
    pub name: String,
    pub arguments: BTreeMap<String, String>,
}

impl Annotation {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            arguments: BTreeMap::new(),
        }
    }

    pub fn with_argument(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.arguments.insert(key.into(), value.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Parameter {
    pub name: String,
    /// Declared type as written. For a variable-arity parameter this is the
    /// element type and `is_varargs` is set.
    pub type_name: String,
    pub annotations: Vec<Annotation>,
    pub is_varargs: bool,
    pub is_final: bool,
}

impl Parameter {
    pub fn new(name: impl Into<String>, type_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            type_name: type_name.into(),
            annotations: Vec::new(),
            is_varargs: false,
            is_final: false,
        }
    }

    pub fn with_varargs(mut self, is_varargs: bool) -> Self {
        self.is_varargs = is_varargs;
        self
    }

    pub fn with_annotations(mut self, annotations: Vec<Annotation>) -> Self {
        self.annotations = annotations;
        self
    }

    /// Type as it appears in a signature, `String...` for varargs.
    pub fn display_type(&self) -> String {
        if self.is_varargs {
            format!("{}...", self.type_name)
        } else {
            self.type_name.clone()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Field {
    pub name: String,
    pub type_name: String,
    pub modifiers: ModifierSet,
    pub annotations: Vec<Annotation>,
    pub doc: Option<Document>,
    pub initial_value: Option<String>,
}

impl Field {
    pub fn new(name: impl Into<String>, type_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            type_name: type_name.into(),
            modifiers: ModifierSet::new(),
            annotations: Vec::new(),
            doc: None,
            initial_value: None,
        }
    }

    pub fn with_modifiers(mut self, modifiers: impl IntoIterator<Item = Modifier>) -> Self {
        self.modifiers = modifiers.into_iter().collect();
        self
    }

    pub fn with_doc(mut self, doc: Document) -> Self {
        self.doc = Some(doc);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Method {
    pub name: String,
    pub return_type: String,
    pub parameters: Vec<Parameter>,
    pub modifiers: ModifierSet,
    pub annotations: Vec<Annotation>,
    pub doc: Option<Document>,
    /// FQN of the declaring type. Looked up through the index, never owned.
    pub declaring_type: String,
    pub throws: Vec<String>,
    pub type_parameters: Option<String>,
    pub is_constructor: bool,
}

impl Method {
    pub fn new(name: impl Into<String>, return_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            return_type: return_type.into(),
            parameters: Vec::new(),
            modifiers: ModifierSet::new(),
            annotations: Vec::new(),
            doc: None,
            declaring_type: String::new(),
            throws: Vec::new(),
            type_parameters: None,
            is_constructor: false,
        }
    }

    pub fn with_parameters(mut self, parameters: Vec<Parameter>) -> Self {
        self.parameters = parameters;
        self
    }

    pub fn with_modifiers(mut self, modifiers: impl IntoIterator<Item = Modifier>) -> Self {
        self.modifiers = modifiers.into_iter().collect();
        self
    }

    pub fn with_doc(mut self, doc: Document) -> Self {
        self.doc = Some(doc);
        self
    }

    pub fn with_declaring_type(mut self, fqn: impl Into<String>) -> Self {
        self.declaring_type = fqn.into();
        self
    }

    /// Signature line such as `int add(int a, int b)`.
    pub fn signature(&self) -> String {
        let params = self
            .parameters
            .iter()
            .map(|p| format!("{} {}", p.display_type(), p.name))
            .collect::<Vec<_>>()
            .join(", ");
        if self.is_constructor {
            format!("{}({})", self.name, params)
        } else {
            format!("{} {}({})", self.return_type, self.name, params)
        }
    }
}

/// A class, interface, enum, record or annotation type declaration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JavaType {
    pub fqn: String,
    pub name: String,
    pub package: String,
    pub kind: TypeKind,
    pub modifiers: ModifierSet,
    pub annotations: Vec<Annotation>,
    pub extends: Vec<String>,
    pub implements: Vec<String>,
    pub methods: Vec<Method>,
    pub fields: Vec<Field>,
    pub doc: Option<Document>,
    pub origin: String,
    pub enclosing_type: Option<String>,
    pub nested_types: Vec<String>,
    pub source_file: Option<String>,
    pub line: usize,
}

impl JavaType {
    /// Build an empty type; the FQN is derived from `package` and `name`.
    pub fn new(package: impl Into<String>, name: impl Into<String>, kind: TypeKind) -> Self {
        let package = package.into();
        let name = name.into();
        let fqn = qualify(&package, &name);
        Self {
            fqn,
            name,
            package,
            kind,
            modifiers: ModifierSet::new(),
            annotations: Vec::new(),
            extends: Vec::new(),
            implements: Vec::new(),
            methods: Vec::new(),
            fields: Vec::new(),
            doc: None,
            origin: String::new(),
            enclosing_type: None,
            nested_types: Vec::new(),
            source_file: None,
            line: 0,
        }
    }

    pub fn with_methods(mut self, methods: Vec<Method>) -> Self {
        let fqn = self.fqn.clone();
        self.methods = methods
            .into_iter()
            .map(|m| m.with_declaring_type(fqn.clone()))
            .collect();
        self
    }

    pub fn with_fields(mut self, fields: Vec<Field>) -> Self {
        self.fields = fields;
        self
    }

    pub fn with_modifiers(mut self, modifiers: impl IntoIterator<Item = Modifier>) -> Self {
        self.modifiers = modifiers.into_iter().collect();
        self
    }

    pub fn with_origin(mut self, origin: impl Into<String>) -> Self {
        self.origin = origin.into();
        self
    }

    pub fn with_doc(mut self, doc: Document) -> Self {
        self.doc = Some(doc);
        self
    }

    /// Extended then implemented type names, in declaration order.
    pub fn super_types(&self) -> impl Iterator<Item = &str> {
        self.extends
            .iter()
            .chain(self.implements.iter())
            .map(String::as_str)
    }

    pub fn is_public(&self) -> bool {
        self.modifiers.contains(&Modifier::Public)
    }

    pub fn method_count(&self) -> usize {
        self.methods.len()
    }

    /// True when the FQN is non-empty and the package is a dotted prefix of it.
    pub fn is_well_formed(&self) -> bool {
        if self.fqn.is_empty() || self.name.is_empty() {
            return false;
        }
        if self.package.is_empty() {
            return true;
        }
        self.fqn
            .strip_prefix(&self.package)
            .map(|rest| rest.starts_with('.') && rest.len() > 1)
            .unwrap_or(false)
    }
}

/// Join a package (possibly empty) and a dotted name.
pub fn qualify(package: &str, name: &str) -> String {
    if package.is_empty() {
        name.to_string()
    } else {
        format!("{}.{}", package, name)
    }
}
