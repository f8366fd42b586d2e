//! Arena-backed schema tree.
//!
//! Schema nodes live in one `Vec` inside the [`Catalog`], addressed by
//! stable [`SchemaId`] indices. A node's parent link is an index-only
//! back-reference; the arena owns every node, so the tree stays acyclic by
//! construction. The unnamed root (id 0) represents the catalog boundary.

use std::sync::Arc;

use rustc_hash::FxHashMap;

use relwire_types::RelType;

use crate::function::FunctionDescriptor;
use crate::matcher::NameMatcher;
use crate::table::CatalogTable;

/// Stable index of a schema node inside its catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SchemaId(usize);

impl SchemaId {
    pub const ROOT: SchemaId = SchemaId(0);

    #[inline]
    pub fn index(self) -> usize {
        self.0
    }
}

struct SchemaNode {
    name: String,
    parent: Option<SchemaId>,
    schemas: FxHashMap<String, SchemaId>,
    tables: FxHashMap<String, Arc<dyn CatalogTable>>,
    functions: FxHashMap<String, Vec<Arc<FunctionDescriptor>>>,
    types: FxHashMap<String, RelType>,
}

impl SchemaNode {
    fn new(name: String, parent: Option<SchemaId>) -> Self {
        Self {
            name,
            parent,
            schemas: FxHashMap::default(),
            tables: FxHashMap::default(),
            functions: FxHashMap::default(),
            types: FxHashMap::default(),
        }
    }
}

/// The hierarchical namespace of schemas, tables, and functions.
///
/// Populate the tree up front, then share it behind an `Arc`; the resolver
/// never mutates it.
pub struct Catalog {
    nodes: Vec<SchemaNode>,
}

impl Catalog {
    /// A catalog holding only the unnamed root schema.
    pub fn new() -> Self {
        Self {
            nodes: vec![SchemaNode::new(String::new(), None)],
        }
    }

    #[inline]
    pub fn root(&self) -> SchemaId {
        SchemaId::ROOT
    }

    /// Add (or find) a child schema under `parent`.
    pub fn add_schema(&mut self, parent: SchemaId, name: impl Into<String>) -> SchemaId {
        let name = name.into();
        if let Some(existing) = self.nodes[parent.index()].schemas.get(&name) {
            return *existing;
        }
        let id = SchemaId(self.nodes.len());
        self.nodes.push(SchemaNode::new(name.clone(), Some(parent)));
        self.nodes[parent.index()].schemas.insert(name, id);
        id
    }

    /// Add (or find) the schema at `path` below the root.
    pub fn add_schema_path<S: AsRef<str>>(&mut self, path: &[S]) -> SchemaId {
        let mut current = self.root();
        for part in path {
            current = self.add_schema(current, part.as_ref());
        }
        current
    }

    pub fn add_table(
        &mut self,
        schema: SchemaId,
        name: impl Into<String>,
        table: Arc<dyn CatalogTable>,
    ) {
        self.nodes[schema.index()].tables.insert(name.into(), table);
    }

    /// Register one overload of a function. Overload order within a name
    /// is registration order.
    pub fn add_function(&mut self, schema: SchemaId, descriptor: FunctionDescriptor) {
        let name = descriptor.name.clone();
        self.nodes[schema.index()]
            .functions
            .entry(name)
            .or_default()
            .push(Arc::new(descriptor));
    }

    pub fn add_named_type(&mut self, schema: SchemaId, name: impl Into<String>, ty: RelType) {
        self.nodes[schema.index()].types.insert(name.into(), ty);
    }

    pub fn schema_name(&self, id: SchemaId) -> &str {
        &self.nodes[id.index()].name
    }

    pub fn parent(&self, id: SchemaId) -> Option<SchemaId> {
        self.nodes[id.index()].parent
    }

    /// Find a direct child schema by name under the matcher's policy.
    pub fn child_schema(
        &self,
        id: SchemaId,
        name: &str,
        matcher: NameMatcher,
    ) -> Option<SchemaId> {
        lookup(&self.nodes[id.index()].schemas, name, matcher).map(|(_, id)| *id)
    }

    /// Find a table by name; returns the registered name alongside the
    /// entry so case-insensitive hits report their canonical spelling.
    pub fn table<'a>(
        &'a self,
        id: SchemaId,
        name: &str,
        matcher: NameMatcher,
    ) -> Option<(&'a str, &'a Arc<dyn CatalogTable>)> {
        lookup(&self.nodes[id.index()].tables, name, matcher)
            .map(|(key, table)| (key.as_str(), table))
    }

    /// All overloads registered under a matching function name.
    pub fn functions(
        &self,
        id: SchemaId,
        name: &str,
        matcher: NameMatcher,
    ) -> Vec<Arc<FunctionDescriptor>> {
        let node = &self.nodes[id.index()];
        let mut out = Vec::new();
        for (key, overloads) in &node.functions {
            if matcher.matches(key, name) {
                out.extend(overloads.iter().cloned());
            }
        }
        out
    }

    pub fn named_type(&self, id: SchemaId, name: &str, matcher: NameMatcher) -> Option<&RelType> {
        lookup(&self.nodes[id.index()].types, name, matcher).map(|(_, ty)| ty)
    }

    /// Walk a schema path from `from`, matching each component.
    pub fn navigate<S: AsRef<str>>(
        &self,
        from: SchemaId,
        path: impl IntoIterator<Item = S>,
        matcher: NameMatcher,
    ) -> Option<SchemaId> {
        let mut current = from;
        for part in path {
            current = self.child_schema(current, part.as_ref(), matcher)?;
        }
        Some(current)
    }

    /// Name components from the root down to `id`, excluding the unnamed
    /// root itself.
    pub fn path_of(&self, id: SchemaId) -> Vec<String> {
        let mut parts = Vec::new();
        let mut current = Some(id);
        while let Some(node_id) = current {
            let node = &self.nodes[node_id.index()];
            if node.parent.is_some() || !node.name.is_empty() {
                parts.push(node.name.clone());
            }
            current = node.parent;
        }
        parts.reverse();
        parts
    }

    /// The full ancestor chain of scopes for `id`: its own path, its
    /// parent's path, and so on up to the root's empty path.
    pub fn ancestor_scopes(&self, id: SchemaId) -> Vec<Vec<String>> {
        let mut scopes = Vec::new();
        let mut current = Some(id);
        while let Some(node_id) = current {
            scopes.push(self.path_of(node_id));
            current = self.nodes[node_id.index()].parent;
        }
        scopes
    }

    /// Sorted child-schema names.
    pub fn schema_names(&self, id: SchemaId) -> Vec<String> {
        let mut names: Vec<String> = self.nodes[id.index()].schemas.keys().cloned().collect();
        names.sort();
        names
    }

    /// Sorted table names.
    pub fn table_names(&self, id: SchemaId) -> Vec<String> {
        let mut names: Vec<String> = self.nodes[id.index()].tables.keys().cloned().collect();
        names.sort();
        names
    }

    /// Sorted function names (views included, since views are registered
    /// as zero-argument table macros).
    pub fn function_names(&self, id: SchemaId) -> Vec<String> {
        let mut names: Vec<String> = self.nodes[id.index()].functions.keys().cloned().collect();
        names.sort();
        names
    }
}

impl Default for Catalog {
    fn default() -> Self {
        Self::new()
    }
}

fn lookup<'a, V>(
    map: &'a FxHashMap<String, V>,
    name: &str,
    matcher: NameMatcher,
) -> Option<(&'a String, &'a V)> {
    if matcher.is_case_sensitive() {
        return map.get_key_value(name);
    }
    map.iter().find(|(key, _)| matcher.matches(key, name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::SimpleTable;
    use relwire_types::RelField;

    fn table() -> Arc<dyn CatalogTable> {
        Arc::new(SimpleTable::new(vec![RelField::new(
            "a",
            RelType::integer(),
        )]))
    }

    #[test]
    fn paths_exclude_the_unnamed_root() {
        let mut catalog = Catalog::new();
        let hr = catalog.add_schema_path(&["hr"]);
        let nested = catalog.add_schema(hr, "payroll");
        assert_eq!(catalog.path_of(catalog.root()), Vec::<String>::new());
        assert_eq!(catalog.path_of(hr), vec!["hr"]);
        assert_eq!(catalog.path_of(nested), vec!["hr", "payroll"]);
    }

    #[test]
    fn ancestor_scopes_walk_to_root() {
        let mut catalog = Catalog::new();
        let nested = catalog.add_schema_path(&["hr", "payroll"]);
        assert_eq!(
            catalog.ancestor_scopes(nested),
            vec![
                vec!["hr".to_string(), "payroll".to_string()],
                vec!["hr".to_string()],
                Vec::<String>::new(),
            ]
        );
    }

    #[test]
    fn add_schema_is_idempotent() {
        let mut catalog = Catalog::new();
        let a = catalog.add_schema_path(&["s"]);
        let b = catalog.add_schema_path(&["s"]);
        assert_eq!(a, b);
    }

    #[test]
    fn navigation_honors_matcher() {
        let mut catalog = Catalog::new();
        let hr = catalog.add_schema_path(&["HR"]);
        catalog.add_table(hr, "emps", table());

        let loose = NameMatcher::case_insensitive();
        let strict = NameMatcher::case_sensitive();
        assert!(catalog.navigate(catalog.root(), ["hr"], loose).is_some());
        assert!(catalog.navigate(catalog.root(), ["hr"], strict).is_none());

        let (actual, _) = catalog.table(hr, "EMPS", loose).unwrap();
        assert_eq!(actual, "emps");
    }

    #[test]
    fn function_overloads_accumulate_in_order() {
        let mut catalog = Catalog::new();
        let s = catalog.add_schema_path(&["s"]);
        catalog.add_function(
            s,
            FunctionDescriptor::new("f", crate::function::FunctionCategory::Scalar)
                .returns(RelType::integer()),
        );
        catalog.add_function(
            s,
            FunctionDescriptor::new("f", crate::function::FunctionCategory::Scalar)
                .with_param("x", RelType::integer())
                .returns(RelType::integer()),
        );
        let overloads = catalog.functions(s, "f", NameMatcher::case_sensitive());
        assert_eq!(overloads.len(), 2);
        assert!(overloads[0].params.is_empty());
        assert_eq!(overloads[1].params.len(), 1);
    }
}
