use std::collections::HashSet;
use std::sync::Arc;

use anyhow::Result;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::debug;

use crate::query::QueryEngine;
use crate::storage::{MethodHit, SharedIndex};
use crate::types::JavaType;

const DEFAULT_LIMIT: usize = 50;
const DEFAULT_GUIDE_RESULTS: usize = 10;

/// Words that never make a useful API search term.
const GUIDE_STOPWORDS: &[&str] = &[
    "how", "to", "the", "a", "an", "is", "are", "for", "in", "on", "with", "and", "can", "use",
    "using", "from", "into", "of",
];

/// JSON schema of one tool, in the shape LLM tool-calling APIs expect.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolSchema {
    pub name: String,
    pub description: String,
    pub input_schema: Value,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolResult {
    pub success: bool,
    pub data: Value,
    pub error: Option<String>,
}

impl ToolResult {
    pub fn success(data: Value) -> Self {
        Self {
            success: true,
            data,
            error: None,
        }
    }

    pub fn error(message: String) -> Self {
        Self {
            success: false,
            data: json!({}),
            error: Some(message),
        }
    }
}

/// Tool surface over the API index, for assistants that call tools by name.
pub struct ApiTools {
    index: SharedIndex,
    query: QueryEngine,
}

impl ApiTools {
    pub fn new(index: SharedIndex) -> Self {
        let query = QueryEngine::new(Arc::clone(&index));
        Self { index, query }
    }

    pub fn get_tool_schemas(&self) -> Vec<ToolSchema> {
        vec![
            ToolSchema {
                name: "search_methods".to_string(),
                description: "Find Java methods by name across every indexed type, optionally restricted to one class".to_string(),
                input_schema: json!({
                    "type": "object",
                    "properties": {
                        "method_name": {
                            "type": "string",
                            "description": "Method name, or a fragment of it when partial is true"
                        },
                        "class_name": {
                            "type": "string",
                            "description": "Only return methods declared by types with this simple name"
                        },
                        "case_sensitive": {
                            "type": "boolean",
                            "description": "Match names exactly as written",
                            "default": true
                        },
                        "partial": {
                            "type": "boolean",
                            "description": "Match every method whose name contains method_name",
                            "default": false
                        },
                        "limit": {
                            "type": "integer",
                            "description": "Maximum number of results to return",
                            "default": DEFAULT_LIMIT
                        }
                    },
                    "required": ["method_name"]
                }),
            },
            ToolSchema {
                name: "analyze_class".to_string(),
                description: "Return the full shape of a class, interface, enum, record or annotation type: members, supertypes and Javadoc".to_string(),
                input_schema: json!({
                    "type": "object",
                    "properties": {
                        "fully_qualified_name": {
                            "type": "string",
                            "description": "Fully qualified type name, e.g. java.util.ArrayList or com.acme.Outer.Inner"
                        },
                        "origin": {
                            "type": "string",
                            "description": "Look the type up in this origin instead of the latest ingested version"
                        },
                        "case_sensitive": {
                            "type": "boolean",
                            "description": "Match the name exactly as written",
                            "default": true
                        }
                    },
                    "required": ["fully_qualified_name"]
                }),
            },
            ToolSchema {
                name: "list_types".to_string(),
                description: "List indexed types by package, origin and/or simple name".to_string(),
                input_schema: json!({
                    "type": "object",
                    "properties": {
                        "package": {
                            "type": "string",
                            "description": "Package name, e.g. com.acme.util"
                        },
                        "origin": {
                            "type": "string",
                            "description": "Origin the types were indexed under"
                        },
                        "simple_name": {
                            "type": "string",
                            "description": "Simple type name, e.g. Util"
                        },
                        "limit": {
                            "type": "integer",
                            "description": "Maximum number of results to return",
                            "default": DEFAULT_LIMIT
                        }
                    }
                }),
            },
            ToolSchema {
                name: "index_overview".to_string(),
                description: "Counts of indexed types, methods and fields, plus the known origins and packages. With an origin: that origin's package breakdown, best documented types and Javadoc coverage".to_string(),
                input_schema: json!({
                    "type": "object",
                    "properties": {
                        "origin": {
                            "type": "string",
                            "description": "Summarise only the types indexed under this origin"
                        }
                    }
                }),
            },
            ToolSchema {
                name: "generate_guide".to_string(),
                description: "Find the classes and methods relevant to a use case described in plain words, e.g. \"parse a date from a string\"".to_string(),
                input_schema: json!({
                    "type": "object",
                    "properties": {
                        "use_case": {
                            "type": "string",
                            "description": "What the caller wants to do"
                        },
                        "max_results": {
                            "type": "integer",
                            "description": "Maximum number of keywords, classes and methods",
                            "default": DEFAULT_GUIDE_RESULTS
                        }
                    },
                    "required": ["use_case"]
                }),
            },
        ]
    }

    pub async fn execute_tool(&self, tool_name: &str, input: Value) -> Result<ToolResult> {
        debug!("Executing tool {}", tool_name);
        match tool_name {
            "search_methods" => self.search_methods(input).await,
            "analyze_class" => self.analyze_class(input).await,
            "list_types" => self.list_types(input).await,
            "index_overview" => self.index_overview(input).await,
            "generate_guide" => self.generate_guide(input).await,
            _ => Ok(ToolResult::error(format!("Unknown tool: {}", tool_name))),
        }
    }

    async fn search_methods(&self, input: Value) -> Result<ToolResult> {
        let search_input: SearchMethodsInput = match parse_input(input, "search_methods") {
            Ok(parsed) => parsed,
            Err(result) => return Ok(result),
        };
        let case_sensitive = search_input.case_sensitive.unwrap_or(true);

        let mut hits = if search_input.partial.unwrap_or(false) {
            self.query
                .find_methods_by_partial_name(&search_input.method_name, case_sensitive)
        } else {
            self.query.find_methods_by_name(
                &search_input.method_name,
                search_input.class_name.as_deref(),
                case_sensitive,
            )
        };
        if search_input.partial.unwrap_or(false) {
            if let Some(class_name) = &search_input.class_name {
                hits.retain(|hit| names_match(&hit.owner().name, class_name, case_sensitive));
            }
        }

        let total = hits.len();
        let results: Vec<Value> = hits
            .iter()
            .take(search_input.limit.unwrap_or(DEFAULT_LIMIT))
            .map(method_json)
            .collect();

        Ok(ToolResult::success(json!({
            "method_name": search_input.method_name,
            "results": results,
            "count": results.len(),
            "total_matches": total
        })))
    }

    async fn analyze_class(&self, input: Value) -> Result<ToolResult> {
        let class_input: AnalyzeClassInput = match parse_input(input, "analyze_class") {
            Ok(parsed) => parsed,
            Err(result) => return Ok(result),
        };
        let fqn = class_input.fully_qualified_name.as_str();
        let case_sensitive = class_input.case_sensitive.unwrap_or(true);

        let found = match &class_input.origin {
            Some(origin) => self
                .query
                .find_types_by_origin(origin)
                .into_iter()
                .rev()
                .find(|ty| names_match(&ty.fqn, fqn, case_sensitive)),
            None if case_sensitive => self.query.find_type_by_fqn(fqn),
            None => self.query.find_type_by_fqn_case_insensitive(fqn),
        };

        let data = match found {
            Some(ty) => json!({
                "found": true,
                "fully_qualified_name": ty.fqn,
                "type": ty.as_ref(),
                "signatures": ty.methods.iter().map(|m| m.signature()).collect::<Vec<_>>()
            }),
            None => json!({
                "found": false,
                "fully_qualified_name": fqn
            }),
        };
        Ok(ToolResult::success(data))
    }

    async fn list_types(&self, input: Value) -> Result<ToolResult> {
        let list_input: ListTypesInput = match parse_input(input, "list_types") {
            Ok(parsed) => parsed,
            Err(result) => return Ok(result),
        };

        let mut types: Vec<Arc<JavaType>> = match (&list_input.package, &list_input.origin, &list_input.simple_name) {
            (Some(package), Some(origin), _) => self.query.find_types_by_package_in_origin(package, origin),
            (Some(package), None, _) => self.query.find_types_by_package(package),
            (None, Some(origin), _) => self.query.find_types_by_origin(origin),
            (None, None, Some(name)) => self.query.find_types_by_simple_name(name),
            (None, None, None) => {
                return Ok(ToolResult::error(
                    "list_types needs at least one of package, origin or simple_name".to_string(),
                ))
            }
        };
        if let Some(name) = &list_input.simple_name {
            types.retain(|ty| &ty.name == name);
        }

        let total = types.len();
        let results: Vec<Value> = types
            .iter()
            .take(list_input.limit.unwrap_or(DEFAULT_LIMIT))
            .map(|ty| type_summary_json(ty))
            .collect();

        Ok(ToolResult::success(json!({
            "results": results,
            "count": results.len(),
            "total_matches": total
        })))
    }

    async fn index_overview(&self, input: Value) -> Result<ToolResult> {
        let overview_input: IndexOverviewInput = match parse_input(input, "index_overview") {
            Ok(parsed) => parsed,
            Err(result) => return Ok(result),
        };

        if let Some(origin) = &overview_input.origin {
            let overview = self.query.origin_overview(origin);
            return Ok(ToolResult::success(serde_json::to_value(overview)?));
        }

        let index = self.index.read();
        Ok(ToolResult::success(json!({
            "stats": index.stats(),
            "origins": index.origins(),
            "packages": index.packages()
        })))
    }

    async fn generate_guide(&self, input: Value) -> Result<ToolResult> {
        let guide_input: GenerateGuideInput = match parse_input(input, "generate_guide") {
            Ok(parsed) => parsed,
            Err(result) => return Ok(result),
        };
        let max_results = guide_input.max_results.unwrap_or(DEFAULT_GUIDE_RESULTS);
        let keywords: Vec<String> = guide_keywords(&guide_input.use_case)
            .into_iter()
            .take(max_results)
            .collect();

        let mut seen_types = HashSet::new();
        let mut seen_methods = HashSet::new();
        let mut classes = Vec::new();
        let mut methods = Vec::new();

        for keyword in &keywords {
            for hit in self
                .query
                .find_methods_by_partial_name(keyword, false)
                .into_iter()
                .take(max_results)
            {
                if seen_methods.insert(hit.order_key()) {
                    methods.push(hit);
                }
            }
            for ty in self
                .query
                .find_types_by_simple_name_with(keyword, false)
                .into_iter()
                .take(max_results)
            {
                if seen_types.insert((ty.fqn.clone(), ty.origin.clone())) {
                    classes.push(ty);
                }
            }
        }
        classes.truncate(max_results);
        methods.truncate(max_results);
        debug!(
            "generate_guide: {} keywords -> {} classes, {} methods",
            keywords.len(),
            classes.len(),
            methods.len()
        );

        Ok(ToolResult::success(json!({
            "use_case": guide_input.use_case,
            "keywords": keywords,
            "classes": classes.iter().map(|ty| type_summary_json(ty)).collect::<Vec<_>>(),
            "methods": methods.iter().map(method_json).collect::<Vec<_>>()
        })))
    }
}

/// Lowercased search terms from a use-case text: stopwords and words of two
/// letters or fewer dropped, surrounding punctuation stripped, first
/// occurrence kept.
fn guide_keywords(use_case: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    use_case
        .split_whitespace()
        .map(|word| {
            word.trim_matches(|c: char| !c.is_alphanumeric() && c != '_')
                .to_lowercase()
        })
        .filter(|word| word.chars().count() > 2 && !GUIDE_STOPWORDS.contains(&word.as_str()))
        .filter(|word| seen.insert(word.clone()))
        .collect()
}

fn parse_input<T: DeserializeOwned>(input: Value, tool: &str) -> std::result::Result<T, ToolResult> {
    serde_json::from_value(input).map_err(|e| ToolResult::error(format!("Invalid {} input: {}", tool, e)))
}

pub(crate) fn names_match(candidate: &str, wanted: &str, case_sensitive: bool) -> bool {
    if case_sensitive {
        candidate == wanted
    } else {
        candidate.to_lowercase() == wanted.to_lowercase()
    }
}

pub(crate) fn method_json(hit: &MethodHit) -> Value {
    let owner = hit.owner();
    let method = hit.method();
    json!({
        "declaring_type": owner.fqn,
        "origin": owner.origin,
        "signature": method.signature(),
        "method": method
    })
}

pub(crate) fn type_summary_json(ty: &JavaType) -> Value {
    json!({
        "fully_qualified_name": ty.fqn,
        "kind": ty.kind,
        "origin": ty.origin,
        "method_count": ty.methods.len(),
        "field_count": ty.fields.len(),
        "summary": ty.doc.as_ref().map(|d| d.summary.clone())
    })
}

// Input types for tool functions
#[derive(Debug, Deserialize)]
struct SearchMethodsInput {
    method_name: String,
    class_name: Option<String>,
    case_sensitive: Option<bool>,
    partial: Option<bool>,
    limit: Option<usize>,
}

#[derive(Debug, Deserialize)]
struct AnalyzeClassInput {
    fully_qualified_name: String,
    origin: Option<String>,
    case_sensitive: Option<bool>,
}

#[derive(Debug, Deserialize, Default)]
struct IndexOverviewInput {
    origin: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GenerateGuideInput {
    use_case: String,
    max_results: Option<usize>,
}

#[derive(Debug, Deserialize, Default)]
struct ListTypesInput {
    package: Option<String>,
    origin: Option<String>,
    simple_name: Option<String>,
    limit: Option<usize>,
}
