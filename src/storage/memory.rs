use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use std::time::SystemTime;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::types::{JavaType, Method};

/// Case folding shared by the index and the query engine.
pub fn fold_case(text: &str) -> String {
    text.to_lowercase()
}

/// A type stored in the index together with its ingestion sequence number.
#[derive(Debug, Clone)]
struct Entry {
    seq: u64,
    ty: Arc<JavaType>,
}

impl Entry {
    fn is(&self, other: &Entry) -> bool {
        Arc::ptr_eq(&self.ty, &other.ty)
    }
}

/// A `(type, method)` pair. The method is addressed by position inside its
/// owning type, so the pair stays valid as long as the type is shared.
#[derive(Debug, Clone)]
pub struct MethodHit {
    owner: Arc<JavaType>,
    index: usize,
    seq: u64,
}

impl MethodHit {
    pub fn owner(&self) -> &JavaType {
        &self.owner
    }

    pub fn owner_arc(&self) -> Arc<JavaType> {
        Arc::clone(&self.owner)
    }

    pub fn method(&self) -> &Method {
        &self.owner.methods[self.index]
    }

    /// Ordering key: owner ingestion order, then declaration order.
    pub fn order_key(&self) -> (u64, usize) {
        (self.seq, self.index)
    }

    fn belongs_to(&self, entry: &Entry) -> bool {
        Arc::ptr_eq(&self.owner, &entry.ty)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexMetadata {
    pub total_types: usize,
    pub total_methods: usize,
    pub total_fields: usize,
    pub total_packages: usize,
    pub origins: BTreeSet<String>,
    pub last_updated: SystemTime,
}

impl Default for IndexMetadata {
    fn default() -> Self {
        Self {
            total_types: 0,
            total_methods: 0,
            total_fields: 0,
            total_packages: 0,
            origins: BTreeSet::new(),
            last_updated: SystemTime::now(),
        }
    }
}

/// Counts reported by [`ApiIndex::stats`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexStats {
    pub types: usize,
    pub methods: usize,
    pub fields: usize,
    pub packages: usize,
    pub origins: usize,
    pub distinct_fqns: usize,
    pub distinct_method_names: usize,
}

/// Outcome of one [`ApiIndex::ingest`] call.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngestSummary {
    pub origin: String,
    pub replaced_types: usize,
    pub types: usize,
    pub methods: usize,
    /// FQNs whose slot was taken over from another type.
    pub collisions: Vec<String>,
}

/// In-memory multi-key index over extracted Java types.
///
/// Five lookup structures are kept: by FQN, by simple name, by package, by
/// origin and by method name. They are only mutated by [`ingest`](Self::ingest),
/// [`clear`](Self::clear) and [`clear_all`](Self::clear_all), each of which
/// leaves them mutually consistent.
#[derive(Debug, Clone, Default)]
pub struct ApiIndex {
    by_fqn: HashMap<String, Entry>,
    by_simple_name: HashMap<String, Vec<Entry>>,
    by_package: HashMap<String, Vec<Entry>>,
    by_origin: HashMap<String, Vec<Entry>>,
    by_method: HashMap<String, Vec<MethodHit>>,
    /// Case-folded method name to the exact `by_method` keys that fold to it.
    method_names_folded: HashMap<String, BTreeSet<String>>,

    next_seq: u64,
    metadata: IndexMetadata,
}

impl ApiIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace everything previously ingested under `origin` with `types`.
    ///
    /// Every type is stamped with `origin`. An FQN already held by another
    /// type is taken over (last write wins) and reported as a collision.
    pub fn ingest(&mut self, types: Vec<JavaType>, origin: &str) -> IngestSummary {
        let replaced_types = self.remove_origin(origin);

        let mut summary = IngestSummary {
            origin: origin.to_string(),
            replaced_types,
            ..IngestSummary::default()
        };

        for mut ty in types {
            ty.origin = origin.to_string();
            let entry = Entry {
                seq: self.next_seq,
                ty: Arc::new(ty),
            };
            self.next_seq += 1;

            summary.types += 1;
            summary.methods += entry.ty.methods.len();

            if let Some(previous) = self.by_fqn.insert(entry.ty.fqn.clone(), entry.clone()) {
                warn!(
                    "FQN collision for {}: origin '{}' replaces origin '{}'",
                    entry.ty.fqn, origin, previous.ty.origin
                );
                summary.collisions.push(entry.ty.fqn.clone());
            }
            self.add_to_indexes(&entry);
        }

        self.update_metadata();
        info!(
            "Ingested {} types ({} methods) for origin '{}', replaced {}",
            summary.types, summary.methods, origin, summary.replaced_types
        );
        summary
    }

    /// Remove every entry contributed by `origin`. Returns how many types were
    /// removed; clearing an unknown origin is a no-op.
    pub fn clear(&mut self, origin: &str) -> usize {
        let removed = self.remove_origin(origin);
        if removed > 0 {
            self.update_metadata();
            info!("Cleared {} types for origin '{}'", removed, origin);
        }
        removed
    }

    pub fn clear_all(&mut self) {
        self.by_fqn.clear();
        self.by_simple_name.clear();
        self.by_package.clear();
        self.by_origin.clear();
        self.by_method.clear();
        self.method_names_folded.clear();
        self.update_metadata();
        debug!("Cleared the whole index");
    }

    // Read accessors. Lists come back in ingestion order.

    pub fn type_by_fqn(&self, fqn: &str) -> Option<Arc<JavaType>> {
        self.by_fqn.get(fqn).map(|e| Arc::clone(&e.ty))
    }

    pub fn types_by_simple_name(&self, name: &str) -> Vec<Arc<JavaType>> {
        Self::collect(self.by_simple_name.get(name))
    }

    pub fn types_by_package(&self, package: &str) -> Vec<Arc<JavaType>> {
        Self::collect(self.by_package.get(package))
    }

    pub fn types_by_origin(&self, origin: &str) -> Vec<Arc<JavaType>> {
        Self::collect(self.by_origin.get(origin))
    }

    pub fn methods_by_name(&self, name: &str) -> &[MethodHit] {
        self.by_method.get(name).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Hits for every method whose name equals `name` ignoring case, in
    /// ingestion order.
    pub fn methods_by_name_ignore_case(&self, name: &str) -> Vec<MethodHit> {
        let Some(keys) = self.method_names_folded.get(&fold_case(name)) else {
            return Vec::new();
        };
        let mut hits: Vec<MethodHit> = keys
            .iter()
            .filter_map(|key| self.by_method.get(key))
            .flatten()
            .cloned()
            .collect();
        hits.sort_by_key(MethodHit::order_key);
        hits
    }

    /// Method-name keys with their hits, in no particular order.
    pub fn method_entries(&self) -> impl Iterator<Item = (&str, &[MethodHit])> {
        self.by_method.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    /// FQN keys with the type currently holding each slot.
    pub fn fqn_entries(&self) -> impl Iterator<Item = (&str, Arc<JavaType>)> {
        self.by_fqn.iter().map(|(k, e)| (k.as_str(), Arc::clone(&e.ty)))
    }

    /// Simple-name keys with their types and ingestion sequence numbers.
    pub fn simple_name_entries(&self) -> impl Iterator<Item = (&str, Vec<(u64, Arc<JavaType>)>)> {
        self.by_simple_name.iter().map(|(k, v)| {
            let types = v.iter().map(|e| (e.seq, Arc::clone(&e.ty))).collect();
            (k.as_str(), types)
        })
    }

    /// Ingestion sequence of the type currently holding `fqn`.
    pub fn sequence_of(&self, fqn: &str) -> Option<u64> {
        self.by_fqn.get(fqn).map(|e| e.seq)
    }

    /// Methods of the type currently holding `fqn`, as index hits.
    pub fn methods_of(&self, fqn: &str) -> Vec<MethodHit> {
        match self.by_fqn.get(fqn) {
            Some(entry) => (0..entry.ty.methods.len())
                .map(|index| MethodHit {
                    owner: Arc::clone(&entry.ty),
                    index,
                    seq: entry.seq,
                })
                .collect(),
            None => Vec::new(),
        }
    }

    pub fn origins(&self) -> Vec<String> {
        let mut origins: Vec<_> = self.by_origin.keys().cloned().collect();
        origins.sort();
        origins
    }

    pub fn packages(&self) -> Vec<String> {
        let mut packages: Vec<_> = self.by_package.keys().cloned().collect();
        packages.sort();
        packages
    }

    pub fn type_count(&self) -> usize {
        self.by_origin.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.by_origin.is_empty()
    }

    pub fn get_metadata(&self) -> &IndexMetadata {
        &self.metadata
    }

    pub fn stats(&self) -> IndexStats {
        IndexStats {
            types: self.metadata.total_types,
            methods: self.metadata.total_methods,
            fields: self.metadata.total_fields,
            packages: self.metadata.total_packages,
            origins: self.metadata.origins.len(),
            distinct_fqns: self.by_fqn.len(),
            distinct_method_names: self.by_method.len(),
        }
    }

    /// Verify that the five structures agree with each other.
    pub fn check_consistency(&self) -> std::result::Result<(), String> {
        let mut total = 0;

        for (origin, entries) in &self.by_origin {
            if entries.is_empty() {
                return Err(format!("empty origin list for '{}'", origin));
            }
            for entry in entries {
                total += 1;
                let ty = &entry.ty;
                if &ty.origin != origin {
                    return Err(format!("{} listed under '{}' but stamped '{}'", ty.fqn, origin, ty.origin));
                }
                if !Self::contains(self.by_simple_name.get(&ty.name), entry) {
                    return Err(format!("{} missing from simple-name index", ty.fqn));
                }
                if !Self::contains(self.by_package.get(&ty.package), entry) {
                    return Err(format!("{} missing from package index", ty.fqn));
                }
                for method in &ty.methods {
                    let hits = self.by_method.get(&method.name);
                    if !hits.map_or(false, |h| h.iter().any(|hit| hit.belongs_to(entry))) {
                        return Err(format!("{}#{} missing from method index", ty.fqn, method.name));
                    }
                }
                match self.by_fqn.get(&ty.fqn) {
                    Some(slot) if slot.seq >= entry.seq => {}
                    Some(_) => return Err(format!("{} slot holds an older type", ty.fqn)),
                    None => return Err(format!("{} missing from FQN index", ty.fqn)),
                }
            }
        }

        for (fqn, slot) in &self.by_fqn {
            if !Self::contains(self.by_origin.get(&slot.ty.origin), slot) {
                return Err(format!("FQN slot {} points at a type outside its origin", fqn));
            }
        }

        let simple_total: usize = self.by_simple_name.values().map(Vec::len).sum();
        let package_total: usize = self.by_package.values().map(Vec::len).sum();
        if simple_total != total || package_total != total {
            return Err(format!(
                "type counts disagree: origin {}, simple name {}, package {}",
                total, simple_total, package_total
            ));
        }

        let method_total: usize = self.by_method.values().map(Vec::len).sum();
        let expected_methods: usize = self
            .by_origin
            .values()
            .flatten()
            .map(|e| e.ty.methods.len())
            .sum();
        if method_total != expected_methods {
            return Err(format!(
                "method index holds {} hits, types declare {}",
                method_total, expected_methods
            ));
        }

        let folded_total: usize = self.method_names_folded.values().map(BTreeSet::len).sum();
        if folded_total != self.by_method.len() {
            return Err(format!(
                "case-folded method names cover {} keys, method index has {}",
                folded_total,
                self.by_method.len()
            ));
        }
        for (folded, keys) in &self.method_names_folded {
            for key in keys {
                if !self.by_method.contains_key(key) || fold_case(key) != *folded {
                    return Err(format!("stale case-folded method name {}", key));
                }
            }
        }

        if self.by_simple_name.values().any(Vec::is_empty)
            || self.by_package.values().any(Vec::is_empty)
            || self.by_method.values().any(Vec::is_empty)
        {
            return Err("empty list left behind in an index".to_string());
        }

        Ok(())
    }

    // Private helper methods

    fn collect(entries: Option<&Vec<Entry>>) -> Vec<Arc<JavaType>> {
        entries
            .map(|list| list.iter().map(|e| Arc::clone(&e.ty)).collect())
            .unwrap_or_default()
    }

    fn contains(entries: Option<&Vec<Entry>>, entry: &Entry) -> bool {
        entries.map_or(false, |list| list.iter().any(|e| e.is(entry)))
    }

    fn add_to_indexes(&mut self, entry: &Entry) {
        let ty = &entry.ty;

        self.by_simple_name
            .entry(ty.name.clone())
            .or_default()
            .push(entry.clone());

        self.by_package
            .entry(ty.package.clone())
            .or_default()
            .push(entry.clone());

        self.by_origin
            .entry(ty.origin.clone())
            .or_default()
            .push(entry.clone());

        for (index, method) in ty.methods.iter().enumerate() {
            self.method_names_folded
                .entry(fold_case(&method.name))
                .or_default()
                .insert(method.name.clone());
            self.by_method
                .entry(method.name.clone())
                .or_default()
                .push(MethodHit {
                    owner: Arc::clone(ty),
                    index,
                    seq: entry.seq,
                });
        }
    }

    fn remove_origin(&mut self, origin: &str) -> usize {
        let Some(entries) = self.by_origin.remove(origin) else {
            return 0;
        };

        for entry in &entries {
            self.remove_from_simple_name_index(entry);
            self.remove_from_package_index(entry);
            self.remove_from_method_index(entry);
        }
        for entry in &entries {
            self.release_fqn_slot(entry);
        }

        entries.len()
    }

    fn remove_from_simple_name_index(&mut self, entry: &Entry) {
        if let Some(list) = self.by_simple_name.get_mut(&entry.ty.name) {
            list.retain(|e| !e.is(entry));
            if list.is_empty() {
                self.by_simple_name.remove(&entry.ty.name);
            }
        }
    }

    fn remove_from_package_index(&mut self, entry: &Entry) {
        if let Some(list) = self.by_package.get_mut(&entry.ty.package) {
            list.retain(|e| !e.is(entry));
            if list.is_empty() {
                self.by_package.remove(&entry.ty.package);
            }
        }
    }

    fn remove_from_method_index(&mut self, entry: &Entry) {
        for method in &entry.ty.methods {
            if let Some(hits) = self.by_method.get_mut(&method.name) {
                hits.retain(|hit| !hit.belongs_to(entry));
                if hits.is_empty() {
                    self.by_method.remove(&method.name);
                    self.forget_folded_name(&method.name);
                }
            }
        }
    }

    fn forget_folded_name(&mut self, name: &str) {
        let folded = fold_case(name);
        if let Some(keys) = self.method_names_folded.get_mut(&folded) {
            keys.remove(name);
            if keys.is_empty() {
                self.method_names_folded.remove(&folded);
            }
        }
    }

    /// Drop the FQN slot if `entry` holds it, handing it to the most recently
    /// ingested surviving type with the same FQN.
    fn release_fqn_slot(&mut self, entry: &Entry) {
        let fqn = &entry.ty.fqn;
        let held = self.by_fqn.get(fqn).map_or(false, |slot| slot.is(entry));
        if !held {
            return;
        }

        let survivor = self
            .by_simple_name
            .get(&entry.ty.name)
            .and_then(|list| {
                list.iter()
                    .filter(|e| &e.ty.fqn == fqn)
                    .max_by_key(|e| e.seq)
                    .cloned()
            });

        match survivor {
            Some(next) => {
                debug!("FQN {} falls back to origin '{}'", fqn, next.ty.origin);
                self.by_fqn.insert(fqn.clone(), next);
            }
            None => {
                self.by_fqn.remove(fqn);
            }
        }
    }

    fn update_metadata(&mut self) {
        let (mut types, mut methods, mut fields) = (0, 0, 0);
        for entry in self.by_origin.values().flatten() {
            types += 1;
            methods += entry.ty.methods.len();
            fields += entry.ty.fields.len();
        }
        self.metadata.total_types = types;
        self.metadata.total_methods = methods;
        self.metadata.total_fields = fields;
        self.metadata.total_packages = self.by_package.len();
        self.metadata.origins = self.by_origin.keys().cloned().collect();
        self.metadata.last_updated = SystemTime::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Field, Parameter, TypeKind};

    fn create_test_type(package: &str, name: &str, methods: &[&str]) -> JavaType {
        JavaType::new(package, name, TypeKind::Class)
            .with_methods(
                methods
                    .iter()
                    .map(|m| Method::new(*m, "void").with_parameters(vec![Parameter::new("x", "int")]))
                    .collect(),
            )
            .with_fields(vec![Field::new("count", "int")])
    }

    #[test]
    fn test_index_creation() {
        let index = ApiIndex::new();
        assert!(index.is_empty());
        assert_eq!(index.type_count(), 0);
        assert_eq!(index.stats(), IndexStats::default());
        assert!(index.check_consistency().is_ok());
    }

    #[test]
    fn test_ingest_populates_all_structures() {
        let mut index = ApiIndex::new();
        let summary = index.ingest(
            vec![
                create_test_type("com.acme", "Util", &["add", "addAll"]),
                create_test_type("com.acme", "Other", &["add"]),
            ],
            "lib-a",
        );

        assert_eq!(summary.types, 2);
        assert_eq!(summary.methods, 3);
        assert!(summary.collisions.is_empty());

        assert!(index.type_by_fqn("com.acme.Util").is_some());
        assert_eq!(index.types_by_simple_name("Util").len(), 1);
        assert_eq!(index.types_by_package("com.acme").len(), 2);
        assert_eq!(index.types_by_origin("lib-a").len(), 2);
        assert_eq!(index.methods_by_name("add").len(), 2);
        assert_eq!(index.methods_by_name("addAll")[0].method().name, "addAll");
        assert_eq!(index.origins(), vec!["lib-a".to_string()]);
        assert!(index.check_consistency().is_ok());
    }

    #[test]
    fn test_ingest_stamps_origin() {
        let mut index = ApiIndex::new();
        let ty = create_test_type("p", "T", &[]).with_origin("somewhere-else");
        index.ingest(vec![ty], "lib-a");
        assert_eq!(index.type_by_fqn("p.T").unwrap().origin, "lib-a");
    }

    #[test]
    fn test_reingest_replaces_origin() {
        let mut index = ApiIndex::new();
        index.ingest(vec![create_test_type("p", "A", &["one", "two"])], "lib-a");
        let summary = index.ingest(vec![create_test_type("p", "B", &["three"])], "lib-a");

        assert_eq!(summary.replaced_types, 1);
        assert!(index.type_by_fqn("p.A").is_none());
        assert!(index.methods_by_name("one").is_empty());
        assert_eq!(index.types_by_origin("lib-a").len(), 1);
        assert_eq!(index.stats().methods, 1);
        assert!(index.check_consistency().is_ok());
    }

    #[test]
    fn test_last_write_wins_and_clear_restores() {
        let mut index = ApiIndex::new();
        index.ingest(vec![create_test_type("com.acme", "Util", &["add"])], "lib-a");
        let summary = index.ingest(vec![create_test_type("com.acme", "Util", &["sub"])], "lib-b");

        assert_eq!(summary.collisions, vec!["com.acme.Util".to_string()]);
        let current = index.type_by_fqn("com.acme.Util").unwrap();
        assert_eq!(current.origin, "lib-b");
        assert_eq!(index.types_by_origin("lib-a")[0].methods[0].name, "add");
        assert!(index.check_consistency().is_ok());

        index.clear("lib-b");
        let restored = index.type_by_fqn("com.acme.Util").unwrap();
        assert_eq!(restored.origin, "lib-a");
        assert!(index.check_consistency().is_ok());

        index.clear("lib-a");
        assert!(index.type_by_fqn("com.acme.Util").is_none());
        assert!(index.is_empty());
        assert!(index.check_consistency().is_ok());
    }

    #[test]
    fn test_clear_is_idempotent() {
        let mut index = ApiIndex::new();
        index.ingest(vec![create_test_type("p", "A", &["run"])], "lib-a");
        index.ingest(vec![create_test_type("q", "B", &["run"])], "lib-b");

        assert_eq!(index.clear("lib-a"), 1);
        assert_eq!(index.clear("lib-a"), 0);
        assert_eq!(index.clear("never-seen"), 0);

        assert!(index.types_by_origin("lib-a").is_empty());
        assert_eq!(index.types_by_origin("lib-b").len(), 1);
        assert_eq!(index.methods_by_name("run").len(), 1);
        assert!(index.types_by_package("p").is_empty());
        assert!(index.check_consistency().is_ok());
    }

    #[test]
    fn test_clear_all() {
        let mut index = ApiIndex::new();
        index.ingest(vec![create_test_type("p", "A", &["run"])], "lib-a");
        index.clear_all();
        assert!(index.is_empty());
        assert_eq!(index.stats().types, 0);
        assert!(index.check_consistency().is_ok());
    }

    #[test]
    fn test_methods_of_and_ordering() {
        let mut index = ApiIndex::new();
        index.ingest(vec![create_test_type("p", "A", &["first", "second"])], "lib-a");
        index.ingest(vec![create_test_type("p", "B", &["first"])], "lib-b");

        let names: Vec<_> = index
            .methods_of("p.A")
            .iter()
            .map(|hit| hit.method().name.clone())
            .collect();
        assert_eq!(names, vec!["first", "second"]);
        assert!(index.methods_of("p.Missing").is_empty());

        let owners: Vec<_> = index
            .methods_by_name("first")
            .iter()
            .map(|hit| hit.owner().fqn.clone())
            .collect();
        assert_eq!(owners, vec!["p.A", "p.B"]);
    }

    #[test]
    fn test_duplicate_fqn_within_one_origin() {
        let mut index = ApiIndex::new();
        index.ingest(
            vec![
                create_test_type("p", "Dup", &["old"]),
                create_test_type("p", "Dup", &["new"]),
            ],
            "lib-a",
        );
        assert_eq!(index.type_by_fqn("p.Dup").unwrap().methods[0].name, "new");
        assert!(index.check_consistency().is_ok());

        index.clear("lib-a");
        assert!(index.type_by_fqn("p.Dup").is_none());
        assert!(index.check_consistency().is_ok());
    }

    #[test]
    fn test_methods_by_name_ignore_case_follows_ingest_and_clear() {
        let mut index = ApiIndex::new();
        index.ingest(vec![create_test_type("p", "A", &["getName", "getname"])], "lib-a");
        index.ingest(vec![create_test_type("p", "B", &["GETNAME", "other"])], "lib-b");

        let owners: Vec<_> = index
            .methods_by_name_ignore_case("GetName")
            .iter()
            .map(|hit| format!("{}#{}", hit.owner().fqn, hit.method().name))
            .collect();
        assert_eq!(owners, vec!["p.A#getName", "p.A#getname", "p.B#GETNAME"]);
        assert!(index.check_consistency().is_ok());

        index.clear("lib-a");
        assert_eq!(index.methods_by_name_ignore_case("getname").len(), 1);
        assert!(index.check_consistency().is_ok());

        index.clear("lib-b");
        assert!(index.methods_by_name_ignore_case("getname").is_empty());
        assert!(index.method_names_folded.is_empty());
        assert!(index.check_consistency().is_ok());
    }

    #[test]
    fn test_metadata_updates() {
        let mut index = ApiIndex::new();
        index.ingest(
            vec![
                create_test_type("p", "A", &["a", "b"]),
                create_test_type("q", "B", &["c"]),
            ],
            "lib-a",
        );

        let metadata = index.get_metadata();
        assert_eq!(metadata.total_types, 2);
        assert_eq!(metadata.total_methods, 3);
        assert_eq!(metadata.total_fields, 2);
        assert_eq!(metadata.total_packages, 2);
        assert!(metadata.origins.contains("lib-a"));

        let stats = index.stats();
        assert_eq!(stats.distinct_method_names, 3);
        assert_eq!(stats.origins, 1);
    }
}
