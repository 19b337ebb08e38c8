use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocParam {
    pub name: String,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocThrows {
    pub exception: String,
    pub description: String,
}

/// Structured form of one Javadoc comment block.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    pub summary: String,
    pub description: String,
    pub params: Vec<DocParam>,
    pub returns: Option<String>,
    pub throws: Vec<DocThrows>,
    /// Auxiliary tags (`since`, `see`, `deprecated`, `author`, ...). Repeated
    /// tags are joined with a newline.
    pub tags: BTreeMap<String, String>,
    pub examples: Vec<String>,
}

impl Document {
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|p| p.name == name)
            .map(|p| p.description.as_str())
    }

    pub fn tag(&self, name: &str) -> Option<&str> {
        self.tags.get(name).map(String::as_str)
    }

    pub fn since(&self) -> Option<&str> {
        self.tag("since")
    }

    pub fn deprecated(&self) -> Option<&str> {
        self.tag("deprecated")
    }

    pub fn is_empty(&self) -> bool {
        self.summary.is_empty()
            && self.description.is_empty()
            && self.params.is_empty()
            && self.returns.is_none()
            && self.throws.is_empty()
            && self.tags.is_empty()
            && self.examples.is_empty()
    }
}
