pub mod analysis;
pub mod doc;
pub mod entity;

pub use analysis::{Extraction, FileAnalysis, SourceFile};
pub use doc::{DocParam, DocThrows, Document};
pub use entity::{
    qualify, Annotation, Field, JavaType, Method, Modifier, ModifierSet, Parameter, TypeKind,
};
