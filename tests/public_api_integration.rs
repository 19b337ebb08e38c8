// Integration tests for the public API
use javalore::{
    javadoc, ApiIndex, IndexReport, JavaLore, JavaLoreBuilder, JavaLoreError, JavaType, Method,
    Parameter, Result, SourceFile, ToolResult, ToolSchema, TypeKind, VERSION,
};
use serde_json::json;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

const UTIL_A: &str = r#"
package com.acme;

import java.util.List;

/** Arithmetic helpers. */
public class Util {
    /**
     * Adds two numbers.
     * @param a first
     * @param b
     * @return the sum
     */
    public static int add(int a, int b) { return a + b; }

    public static int addAll(List<Integer> values) { return 0; }
}
"#;

const UTIL_B: &str = r#"
package com.acme;

public class Util {
    public String describe() { return "b"; }
}
"#;

fn util_type(origin_methods: &[(&str, Vec<Parameter>)]) -> JavaType {
    let methods = origin_methods
        .iter()
        .map(|(name, params)| Method::new(*name, "int").with_parameters(params.clone()))
        .collect();
    JavaType::new("com.acme", "Util", TypeKind::Class).with_methods(methods)
}

fn write(root: &Path, relative: &str, content: &str) {
    let path = root.join(relative);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

#[test]
fn test_public_api_exports() {
    let _version: &str = VERSION;

    let builder: JavaLoreBuilder = JavaLore::builder();
    let lore: Result<JavaLore> = builder.build();
    let lore = lore.unwrap();

    let _tools: Vec<ToolSchema> = lore.tool_definitions();
    let _report: IndexReport = IndexReport::default();
    let _error: JavaLoreError = JavaLoreError::Config("x".to_string());
    assert!(!lore.is_indexed());
}

#[test]
fn test_builder_configuration() {
    let lore = JavaLore::builder()
        .source_roots(vec!["src/main/java".to_string(), "src".to_string()])
        .include_patterns(vec!["**/*.java".to_string()])
        .exclude_patterns(vec!["**/generated/**".to_string()])
        .max_file_size(512 * 1024)
        .max_depth(20)
        .follow_symlinks(false)
        .include_private(false)
        .threads(2)
        .build();
    assert!(lore.is_ok());

    let bad = JavaLore::builder()
        .include_patterns(vec!["**/[".to_string()])
        .build();
    assert!(matches!(bad, Err(JavaLoreError::Pattern(_))));
}

#[test]
fn test_scenario_exact_and_partial_method_search() {
    let lore = JavaLore::builder().build().unwrap();
    let report = lore
        .index_sources("lib-a", vec![SourceFile::new("com/acme/Util.java", UTIL_A)])
        .unwrap();
    assert_eq!(report.types_indexed, 1);
    assert!(report.is_clean());

    let query = lore.query();
    let exact = query.find_methods_by_name("add", None, true);
    assert_eq!(exact.len(), 1);
    assert_eq!(exact[0].owner().fqn, "com.acme.Util");
    assert_eq!(exact[0].method().name, "add");

    let partial: Vec<String> = query
        .find_methods_by_partial_name("add", true)
        .iter()
        .map(|hit| hit.method().name.clone())
        .collect();
    assert_eq!(partial, vec!["add", "addAll"]);
}

#[test]
fn test_scenario_last_write_wins_then_clear() {
    let lore = JavaLore::builder().build().unwrap();
    lore.index_sources("lib-a", vec![SourceFile::new("Util.java", UTIL_A)])
        .unwrap();
    let report = lore
        .index_sources("lib-b", vec![SourceFile::new("Util.java", UTIL_B)])
        .unwrap();
    assert_eq!(report.collisions, vec!["com.acme.Util".to_string()]);

    let query = lore.query();
    let current = query.find_type_by_fqn("com.acme.Util").unwrap();
    assert_eq!(current.origin, "lib-b");
    assert_eq!(current.methods[0].name, "describe");

    let lib_a = query.find_types_by_origin("lib-a");
    assert_eq!(lib_a.len(), 1);
    assert_eq!(lib_a[0].methods.len(), 2);

    assert_eq!(lore.clear_origin("lib-a"), 1);
    assert!(query.find_types_by_origin("lib-a").is_empty());
    assert_eq!(query.find_types_by_origin("lib-b").len(), 1);
    assert_eq!(query.find_type_by_fqn("com.acme.Util").unwrap().origin, "lib-b");
    assert!(query.find_methods_by_name("add", None, true).is_empty());
    assert!(lore.index().read().check_consistency().is_ok());
}

#[test]
fn test_scenario_doc_comment() {
    let doc = javadoc::extract("Adds two numbers.\n@param a first\n@param b\n@return the sum");
    assert_eq!(doc.summary, "Adds two numbers.");
    assert_eq!(doc.params.len(), 2);
    assert_eq!(doc.param("a"), Some("first"));
    assert_eq!(doc.param("b"), Some(""));
    assert_eq!(doc.returns.as_deref(), Some("the sum"));

    // The same comment reaches the method through the parser
    let lore = JavaLore::builder().build().unwrap();
    lore.index_sources("lib-a", vec![SourceFile::new("Util.java", UTIL_A)])
        .unwrap();
    let add = lore.query().find_methods_by_name("add", Some("Util"), true);
    let doc = add[0].method().doc.clone().unwrap();
    assert_eq!(doc.summary, "Adds two numbers.");
    assert_eq!(doc.param("b"), Some(""));
}

#[test]
fn test_index_accepts_prebuilt_types() {
    let mut index = ApiIndex::new();
    let summary = index.ingest(
        vec![util_type(&[
            ("add", vec![Parameter::new("a", "int"), Parameter::new("b", "int")]),
            ("addAll", vec![Parameter::new("values", "List")]),
        ])],
        "lib-a",
    );
    assert_eq!(summary.types, 1);
    assert_eq!(summary.methods, 2);
    assert_eq!(index.methods_by_name("addAll").len(), 1);
}

#[tokio::test]
async fn test_index_directory_end_to_end() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "src/main/java/com/acme/Util.java", UTIL_A);
    write(
        dir.path(),
        "src/main/java/com/acme/io/Reader.java",
        "package com.acme.io;\n\npublic interface Reader { String read(String path) throws java.io.IOException; }\n",
    );
    write(dir.path(), "src/main/java/com/acme/Broken.java", "package com.acme; class Broken { void ( }");
    write(dir.path(), "target/classes/Ignored.java", "class Ignored {}");

    let lore = JavaLore::builder().build().unwrap();
    let report = lore.index_directory("acme", dir.path()).await.unwrap();

    assert_eq!(report.files_scanned, 3);
    assert!(report.files_failed.is_empty());
    assert!(report.files_with_syntax_errors >= 1);
    assert!(lore.is_indexed());

    let query = lore.query();
    let reader = query.find_type_by_fqn("com.acme.io.Reader").unwrap();
    assert_eq!(reader.kind, TypeKind::Interface);
    assert_eq!(reader.methods[0].throws, vec!["java.io.IOException"]);
    assert_eq!(
        reader.source_file.as_deref(),
        Some("src/main/java/com/acme/io/Reader.java")
    );
    assert_eq!(query.find_types_by_package("com.acme.io").len(), 1);
    assert!(query.find_type_by_fqn("Ignored").is_none());

    // Re-indexing the same origin replaces, never duplicates
    let again = lore.index_directory("acme", dir.path()).await.unwrap();
    assert_eq!(again.types_replaced, report.types_indexed);
    assert_eq!(lore.stats().types, report.types_indexed);
}

#[tokio::test]
async fn test_index_directory_errors() {
    let lore = JavaLore::builder().build().unwrap();

    let missing = lore.index_directory("x", "/definitely/not/a/dir").await;
    assert!(matches!(missing, Err(JavaLoreError::DirectoryAccess { .. })));

    let empty = TempDir::new().unwrap();
    write(empty.path(), "README.md", "nothing here");
    let result = lore.index_directory("x", empty.path()).await;
    assert!(matches!(result, Err(JavaLoreError::NoSourceFiles { .. })));
}

#[tokio::test]
async fn test_execute_tool_interface() {
    let lore = JavaLore::builder().build().unwrap();

    let result: ToolResult = lore.execute_tool("invalid_tool", json!({})).await.unwrap();
    assert!(!result.success);
    assert!(result.error.is_some());

    let overview = lore.execute_tool("index_overview", json!({})).await.unwrap();
    assert!(overview.success);
    assert_eq!(overview.data["stats"]["types"], 0);

    lore.index_sources("lib-a", vec![SourceFile::new("Util.java", UTIL_A)])
        .unwrap();

    let search = lore
        .execute_tool("search_methods", json!({"method_name": "ADD", "case_sensitive": false}))
        .await
        .unwrap();
    assert!(search.success);
    assert_eq!(search.data["count"], 1);
    assert_eq!(search.data["results"][0]["declaring_type"], "com.acme.Util");

    let class = lore
        .execute_tool("analyze_class", json!({"fully_qualified_name": "com.acme.Util"}))
        .await
        .unwrap();
    assert_eq!(class.data["found"], true);

    let overview = lore
        .execute_tool("index_overview", json!({"origin": "lib-a"}))
        .await
        .unwrap();
    assert_eq!(overview.data["types"], 1);
    assert_eq!(overview.data["coverage"]["documented_types"], 1);
    assert_eq!(overview.data["coverage"]["method_rate"], 50.0);

    let guide = lore
        .execute_tool("generate_guide", json!({"use_case": "add numbers with util"}))
        .await
        .unwrap();
    assert_eq!(guide.data["classes"][0]["fully_qualified_name"], "com.acme.Util");
    assert_eq!(guide.data["methods"].as_array().unwrap().len(), 2);

    let bad_input = lore
        .execute_tool("analyze_class", json!({"fqn": 3}))
        .await
        .unwrap();
    assert!(!bad_input.success);
}

#[test]
fn test_tool_definitions_structure() {
    let lore = JavaLore::builder().build().unwrap();
    let tools = lore.tool_definitions();

    let names: Vec<&str> = tools.iter().map(|t| t.name.as_str()).collect();
    assert_eq!(
        names,
        vec![
            "search_methods",
            "analyze_class",
            "list_types",
            "index_overview",
            "generate_guide"
        ]
    );
    for tool in &tools {
        assert!(!tool.description.is_empty());
        assert!(tool.input_schema.is_object());
    }
}

#[test]
fn test_version_constant() {
    assert!(!VERSION.is_empty());
}
