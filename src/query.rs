//! Read-only search over a [`SharedIndex`].
//!
//! Every call takes the read lock once and returns owned results, so a caller
//! never holds the lock while it formats output. A miss is an empty result.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::Serialize;
use tracing::debug;

use crate::storage::{fold_case, IndexStats, MethodHit, SharedIndex};
use crate::types::{Document, JavaType, TypeKind};

const TOP_DOCUMENTED_LIMIT: usize = 10;
const PACKAGE_SAMPLE_SIZE: usize = 5;

/// Everything one origin contributes to the index, summarised.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OriginOverview {
    pub origin: String,
    pub types: usize,
    pub methods: usize,
    pub packages: usize,
    pub average_methods_per_type: f64,
    /// Largest packages first.
    pub package_breakdown: Vec<PackageSummary>,
    /// Documented types with the most methods first.
    pub top_documented: Vec<TypeHighlight>,
    pub coverage: DocCoverage,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PackageSummary {
    pub name: String,
    pub type_count: usize,
    pub method_count: usize,
    /// First few simple names, in ingestion order.
    pub types: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TypeHighlight {
    pub fully_qualified_name: String,
    pub kind: TypeKind,
    pub summary: String,
    pub method_count: usize,
}

/// Javadoc coverage; rates are percentages rounded to two decimals.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DocCoverage {
    pub documented_types: usize,
    pub total_types: usize,
    pub type_rate: f64,
    pub documented_methods: usize,
    pub total_methods: usize,
    pub method_rate: f64,
}

#[derive(Debug, Clone)]
pub struct QueryEngine {
    index: SharedIndex,
}

impl QueryEngine {
    pub fn new(index: SharedIndex) -> Self {
        Self { index }
    }

    /// Methods with exactly `name`, optionally restricted to owners whose
    /// simple name equals `class_filter` under the same case policy.
    pub fn find_methods_by_name(
        &self,
        name: &str,
        class_filter: Option<&str>,
        case_sensitive: bool,
    ) -> Vec<MethodHit> {
        let index = self.index.read();

        let mut hits: Vec<MethodHit> = if case_sensitive {
            index.methods_by_name(name).to_vec()
        } else {
            index.methods_by_name_ignore_case(name)
        };

        if let Some(filter) = class_filter {
            let filter = if case_sensitive {
                filter.to_string()
            } else {
                normalize(filter)
            };
            hits.retain(|hit| {
                let owner = &hit.owner().name;
                if case_sensitive {
                    *owner == filter
                } else {
                    normalize(owner) == filter
                }
            });
        }

        debug!(
            "find_methods_by_name({}, {:?}, case_sensitive={}) -> {}",
            name,
            class_filter,
            case_sensitive,
            hits.len()
        );
        hits
    }

    /// Every method whose name contains `fragment`, in ingestion order.
    pub fn find_methods_by_partial_name(&self, fragment: &str, case_sensitive: bool) -> Vec<MethodHit> {
        let index = self.index.read();
        let needle = if case_sensitive {
            fragment.to_string()
        } else {
            normalize(fragment)
        };

        let mut hits: Vec<MethodHit> = index
            .method_entries()
            .filter(|(key, _)| {
                if case_sensitive {
                    key.contains(needle.as_str())
                } else {
                    normalize(key).contains(needle.as_str())
                }
            })
            .flat_map(|(_, hits)| hits.iter().cloned())
            .collect();
        hits.sort_by_key(MethodHit::order_key);

        debug!("find_methods_by_partial_name({}) -> {}", fragment, hits.len());
        hits
    }

    pub fn find_type_by_fqn(&self, fqn: &str) -> Option<Arc<JavaType>> {
        self.index.read().type_by_fqn(fqn)
    }

    /// When several FQNs differ only by case, the most recently ingested wins.
    pub fn find_type_by_fqn_case_insensitive(&self, fqn: &str) -> Option<Arc<JavaType>> {
        let index = self.index.read();
        if let Some(exact) = index.type_by_fqn(fqn) {
            return Some(exact);
        }

        let needle = normalize(fqn);
        index
            .fqn_entries()
            .filter(|(key, _)| normalize(key) == needle)
            .max_by_key(|(key, _)| index.sequence_of(key))
            .map(|(_, ty)| ty)
    }

    pub fn find_types_by_simple_name(&self, name: &str) -> Vec<Arc<JavaType>> {
        self.index.read().types_by_simple_name(name)
    }

    pub fn find_types_by_simple_name_with(&self, name: &str, case_sensitive: bool) -> Vec<Arc<JavaType>> {
        if case_sensitive {
            return self.find_types_by_simple_name(name);
        }

        let index = self.index.read();
        let needle = normalize(name);
        let mut found: Vec<(u64, Arc<JavaType>)> = index
            .simple_name_entries()
            .filter(|(key, _)| normalize(key) == needle)
            .flat_map(|(_, types)| types)
            .collect();
        found.sort_by_key(|(seq, _)| *seq);
        found.into_iter().map(|(_, ty)| ty).collect()
    }

    pub fn find_types_by_origin(&self, origin: &str) -> Vec<Arc<JavaType>> {
        self.index.read().types_by_origin(origin)
    }

    pub fn find_types_by_package(&self, package: &str) -> Vec<Arc<JavaType>> {
        self.index.read().types_by_package(package)
    }

    pub fn find_types_by_package_in_origin(&self, package: &str, origin: &str) -> Vec<Arc<JavaType>> {
        let mut types = self.index.read().types_by_origin(origin);
        types.retain(|ty| ty.package == package);
        types
    }

    pub fn methods_of_type(&self, fqn: &str) -> Vec<MethodHit> {
        self.index.read().methods_of(fqn)
    }

    pub fn statistics(&self) -> IndexStats {
        self.index.read().stats()
    }

    /// Statistics, package breakdown and Javadoc coverage for one origin.
    /// An unknown origin yields an all-zero overview.
    pub fn origin_overview(&self, origin: &str) -> OriginOverview {
        let types = self.find_types_by_origin(origin);
        let methods: usize = types.iter().map(|ty| ty.methods.len()).sum();

        let mut by_package: BTreeMap<&str, Vec<&JavaType>> = BTreeMap::new();
        for ty in &types {
            by_package.entry(ty.package.as_str()).or_default().push(ty);
        }
        let mut package_breakdown: Vec<PackageSummary> = by_package
            .iter()
            .map(|(name, members)| PackageSummary {
                name: name.to_string(),
                type_count: members.len(),
                method_count: members.iter().map(|ty| ty.methods.len()).sum(),
                types: members
                    .iter()
                    .take(PACKAGE_SAMPLE_SIZE)
                    .map(|ty| ty.name.clone())
                    .collect(),
            })
            .collect();
        package_breakdown.sort_by(|a, b| b.type_count.cmp(&a.type_count).then_with(|| a.name.cmp(&b.name)));

        let mut documented: Vec<&Arc<JavaType>> = types.iter().filter(|ty| is_documented(&ty.doc)).collect();
        documented.sort_by(|a, b| b.methods.len().cmp(&a.methods.len()).then_with(|| a.fqn.cmp(&b.fqn)));
        let top_documented = documented
            .iter()
            .take(TOP_DOCUMENTED_LIMIT)
            .map(|ty| TypeHighlight {
                fully_qualified_name: ty.fqn.clone(),
                kind: ty.kind,
                summary: ty.doc.as_ref().map(|d| d.summary.clone()).unwrap_or_default(),
                method_count: ty.methods.len(),
            })
            .collect();

        let documented_methods = types
            .iter()
            .flat_map(|ty| ty.methods.iter())
            .filter(|m| is_documented(&m.doc))
            .count();
        let coverage = DocCoverage {
            documented_types: documented.len(),
            total_types: types.len(),
            type_rate: percentage(documented.len(), types.len()),
            documented_methods,
            total_methods: methods,
            method_rate: percentage(documented_methods, methods),
        };

        OriginOverview {
            origin: origin.to_string(),
            types: types.len(),
            methods,
            packages: by_package.len(),
            average_methods_per_type: ratio(methods, types.len()),
            package_breakdown,
            top_documented,
            coverage,
        }
    }
}

fn is_documented(doc: &Option<Document>) -> bool {
    doc.as_ref().is_some_and(|d| !d.is_empty())
}

fn ratio(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        return 0.0;
    }
    (part as f64 / whole as f64 * 100.0).round() / 100.0
}

fn percentage(part: usize, whole: usize) -> f64 {
    ratio(part * 100, whole)
}

fn normalize(text: &str) -> String {
    fold_case(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{shared_index, ApiIndex};
    use crate::types::{Method, Parameter};

    fn create_test_type(package: &str, name: &str, methods: &[&str]) -> JavaType {
        JavaType::new(package, name, TypeKind::Class).with_methods(
            methods
                .iter()
                .map(|m| Method::new(*m, "int").with_parameters(vec![Parameter::new("a", "int")]))
                .collect(),
        )
    }

    fn engine_with(batches: Vec<(&str, Vec<JavaType>)>) -> QueryEngine {
        let index = shared_index(ApiIndex::new());
        for (origin, types) in batches {
            index.write().ingest(types, origin);
        }
        QueryEngine::new(index)
    }

    fn describe(hits: &[MethodHit]) -> Vec<String> {
        hits.iter()
            .map(|h| format!("{}#{}", h.owner().fqn, h.method().name))
            .collect()
    }

    #[test]
    fn test_exact_and_partial_method_search() {
        let engine = engine_with(vec![(
            "lib-a",
            vec![create_test_type("com.acme", "Util", &["add", "addAll"])],
        )]);

        let exact = engine.find_methods_by_name("add", None, true);
        assert_eq!(describe(&exact), vec!["com.acme.Util#add"]);

        let partial = engine.find_methods_by_partial_name("add", true);
        assert_eq!(describe(&partial), vec!["com.acme.Util#add", "com.acme.Util#addAll"]);
    }

    #[test]
    fn test_case_insensitive_method_search() {
        let engine = engine_with(vec![(
            "lib-a",
            vec![
                create_test_type("p", "A", &["getName", "getname"]),
                create_test_type("p", "B", &["GETNAME"]),
            ],
        )]);

        assert_eq!(engine.find_methods_by_name("getName", None, true).len(), 1);
        let all = engine.find_methods_by_name("getName", None, false);
        assert_eq!(describe(&all), vec!["p.A#getName", "p.A#getname", "p.B#GETNAME"]);

        let partial = engine.find_methods_by_partial_name("NAME", false);
        assert_eq!(partial.len(), 3);
        assert!(engine.find_methods_by_partial_name("NAME", true).len() == 1);
    }

    #[test]
    fn test_class_filter_uses_case_policy() {
        let engine = engine_with(vec![(
            "lib-a",
            vec![
                create_test_type("p", "Util", &["run"]),
                create_test_type("q", "Other", &["run"]),
            ],
        )]);

        assert_eq!(describe(&engine.find_methods_by_name("run", Some("Util"), true)), vec!["p.Util#run"]);
        assert!(engine.find_methods_by_name("run", Some("util"), true).is_empty());
        assert_eq!(engine.find_methods_by_name("run", Some("util"), false).len(), 1);
    }

    #[test]
    fn test_type_lookups() {
        let engine = engine_with(vec![
            ("lib-a", vec![create_test_type("com.acme", "Util", &["add"])]),
            ("lib-b", vec![create_test_type("org.other", "Util", &[])]),
        ]);

        assert!(engine.find_type_by_fqn("com.acme.Util").is_some());
        assert!(engine.find_type_by_fqn("com.acme.util").is_none());
        assert_eq!(
            engine.find_type_by_fqn_case_insensitive("COM.ACME.UTIL").unwrap().fqn,
            "com.acme.Util"
        );

        let by_name: Vec<_> = engine
            .find_types_by_simple_name("Util")
            .iter()
            .map(|t| t.origin.clone())
            .collect();
        assert_eq!(by_name, vec!["lib-a", "lib-b"]);
        assert_eq!(engine.find_types_by_simple_name_with("UTIL", false).len(), 2);
        assert!(engine.find_types_by_simple_name_with("UTIL", true).is_empty());

        assert_eq!(engine.find_types_by_package("org.other").len(), 1);
        assert_eq!(engine.find_types_by_package_in_origin("com.acme", "lib-a").len(), 1);
        assert!(engine.find_types_by_package_in_origin("com.acme", "lib-b").is_empty());
        assert_eq!(engine.methods_of_type("com.acme.Util").len(), 1);
    }

    #[test]
    fn test_origin_overview() {
        let documented = |ty: JavaType, summary: &str| {
            ty.with_doc(Document {
                summary: summary.to_string(),
                ..Document::default()
            })
        };
        let mut util = create_test_type("com.acme", "Util", &["add", "sub", "mul"]);
        util.methods[0].doc = Some(Document {
            summary: "Adds.".to_string(),
            ..Document::default()
        });
        let engine = engine_with(vec![
            (
                "lib-a",
                vec![
                    documented(util, "Arithmetic."),
                    documented(create_test_type("com.acme", "Strings", &["trim"]), "Text helpers."),
                    create_test_type("com.acme.io", "Reader", &[]),
                    create_test_type("com.acme", "Empty", &[]).with_doc(Document::default()),
                ],
            ),
            ("lib-b", vec![create_test_type("org.other", "Noise", &["run"])]),
        ]);

        let overview = engine.origin_overview("lib-a");
        assert_eq!(overview.types, 4);
        assert_eq!(overview.methods, 4);
        assert_eq!(overview.packages, 2);
        assert_eq!(overview.average_methods_per_type, 1.0);

        let packages: Vec<_> = overview
            .package_breakdown
            .iter()
            .map(|p| (p.name.as_str(), p.type_count, p.method_count))
            .collect();
        assert_eq!(packages, vec![("com.acme", 3, 4), ("com.acme.io", 1, 0)]);
        assert_eq!(overview.package_breakdown[0].types, vec!["Util", "Strings", "Empty"]);

        let top: Vec<_> = overview
            .top_documented
            .iter()
            .map(|t| (t.fully_qualified_name.as_str(), t.summary.as_str()))
            .collect();
        assert_eq!(
            top,
            vec![("com.acme.Util", "Arithmetic."), ("com.acme.Strings", "Text helpers.")]
        );

        assert_eq!(overview.coverage.documented_types, 2);
        assert_eq!(overview.coverage.type_rate, 50.0);
        assert_eq!(overview.coverage.documented_methods, 1);
        assert_eq!(overview.coverage.method_rate, 25.0);
    }

    #[test]
    fn test_origin_overview_of_unknown_origin() {
        let engine = engine_with(vec![("lib-a", vec![create_test_type("p", "A", &["run"])])]);
        let overview = engine.origin_overview("missing");
        assert_eq!(overview.types, 0);
        assert_eq!(overview.average_methods_per_type, 0.0);
        assert!(overview.package_breakdown.is_empty());
        assert_eq!(overview.coverage, DocCoverage::default());
    }

    #[test]
    fn test_misses_are_empty() {
        let engine = engine_with(vec![]);
        assert!(engine.find_methods_by_name("nothing", None, false).is_empty());
        assert!(engine.find_methods_by_partial_name("x", true).is_empty());
        assert!(engine.find_type_by_fqn_case_insensitive("a.B").is_none());
        assert!(engine.find_types_by_origin("none").is_empty());
        assert_eq!(engine.statistics().types, 0);
    }
}
