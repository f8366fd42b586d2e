//! The catalog resolver: search-path-scoped name resolution.

use std::sync::Arc;

use relwire_ops::{OperatorDef, SyntaxForm};
use relwire_types::{RelField, RelType};

use crate::config::ResolverConfig;
use crate::convert::to_operator;
use crate::function::{CategoryFilter, FunctionDescriptor};
use crate::matcher::NameMatcher;
use crate::moniker::{Moniker, MonikerKind};
use crate::schema::{Catalog, SchemaId};
use crate::table::TableHandle;
use crate::CatalogResult;

/// Ordered list of schema scopes consulted during unqualified resolution.
///
/// Duplicate entries collapse (set semantics) while preserving first-seen
/// order; the list is immutable once the resolver is built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchPath {
    entries: Vec<Vec<String>>,
}

impl SearchPath {
    pub fn new(entries: Vec<Vec<String>>) -> Self {
        let mut deduped: Vec<Vec<String>> = Vec::with_capacity(entries.len());
        for entry in entries {
            if !deduped.contains(&entry) {
                deduped.push(entry);
            }
        }
        Self { entries: deduped }
    }

    pub fn entries(&self) -> &[Vec<String>] {
        &self.entries
    }
}

/// Resolves qualified and unqualified names against a shared catalog.
///
/// The catalog handle is explicit; the resolver holds no ambient state and
/// never mutates the tree. Concurrent resolution is safe as long as the
/// catalog owner keeps the tree read-stable during a call.
#[derive(Clone)]
pub struct CatalogResolver {
    catalog: Arc<Catalog>,
    search_path: SearchPath,
    matcher: NameMatcher,
    config: ResolverConfig,
}

impl CatalogResolver {
    /// Resolver scoped to `default_schema` first and the root last, the
    /// standard two-entry search path.
    pub fn new(catalog: Arc<Catalog>, default_schema: Vec<String>, config: ResolverConfig) -> Self {
        let matcher = NameMatcher::with_case_sensitive(config.case_sensitive);
        Self {
            catalog,
            search_path: SearchPath::new(vec![default_schema, Vec::new()]),
            matcher,
            config,
        }
    }

    /// Re-scope this resolver to a different default schema path, sharing
    /// the same catalog and configuration.
    pub fn with_search_path(&self, default_schema: Vec<String>) -> Self {
        Self {
            catalog: Arc::clone(&self.catalog),
            search_path: SearchPath::new(vec![default_schema, Vec::new()]),
            matcher: self.matcher,
            config: self.config.clone(),
        }
    }

    pub fn catalog(&self) -> &Arc<Catalog> {
        &self.catalog
    }

    pub fn matcher(&self) -> NameMatcher {
        self.matcher
    }

    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    pub fn search_path(&self) -> &SearchPath {
        &self.search_path
    }

    /// Row-field lookup by alias under the resolver's matcher.
    pub fn field<'a>(&self, row_type: &'a RelType, alias: &str) -> Option<(usize, &'a RelField)> {
        self.matcher.field_of(row_type, alias)
    }

    /// Resolve a (possibly qualified) table name.
    ///
    /// Search-path entries are tried in order; the first schema in which
    /// the name resolves wins. "Not found" is an expected outcome and
    /// surfaces as `None`.
    pub fn resolve_table<S: AsRef<str>>(&self, names: &[S]) -> Option<TableHandle> {
        let (last, prefix) = names.split_last()?;
        for entry in self.search_path.entries() {
            let Some(schema) = self.navigate_scoped(entry, prefix) else {
                continue;
            };
            if let Some((actual, table)) = self.catalog.table(schema, last.as_ref(), self.matcher)
            {
                // Tables carrying a pre-built handle pass it through.
                if let Some(handle) = table.resolved() {
                    return Some(handle);
                }
                let mut path = self.catalog.path_of(schema);
                path.push(actual.to_string());
                return Some(TableHandle::new(path, Arc::clone(table)));
            }
        }
        tracing::debug!(
            name = names.last().map(|s| s.as_ref()).unwrap_or(""),
            "table did not resolve in any search-path scope"
        );
        None
    }

    /// Resolve function overloads for a (possibly qualified) name.
    ///
    /// Qualified names ignore the search path except for its last two
    /// entries (catalog scope and root). Bare names expand each entry to
    /// its full ancestor chain and collect same-named overloads from every
    /// level. Results are filtered by the category predicate.
    pub fn resolve_functions<S: AsRef<str>>(
        &self,
        names: &[S],
        filter: CategoryFilter,
    ) -> Vec<Arc<FunctionDescriptor>> {
        let Some((last, prefix)) = names.split_last() else {
            return Vec::new();
        };

        let mut scopes: Vec<Vec<String>> = Vec::new();
        if names.len() > 1 {
            let entries = self.search_path.entries();
            let start = entries.len().saturating_sub(2);
            scopes.extend(entries[start..].iter().cloned());
        } else {
            for entry in self.search_path.entries() {
                if let Some(schema) = self.navigate_scoped(entry, &[] as &[&str]) {
                    scopes.extend(self.catalog.ancestor_scopes(schema));
                }
            }
        }

        // Distinct schemas only, first hit wins the ordering.
        let mut visited: Vec<SchemaId> = Vec::new();
        let mut out = Vec::new();
        for scope in scopes {
            let Some(schema) = self.navigate_scoped(&scope, prefix) else {
                continue;
            };
            if visited.contains(&schema) {
                continue;
            }
            visited.push(schema);
            for descriptor in self.catalog.functions(schema, last.as_ref(), self.matcher) {
                if filter.accepts(descriptor.category) {
                    out.push(descriptor);
                }
            }
        }
        out
    }

    /// Resolve function overloads and convert them to operators.
    ///
    /// Only standard call syntax participates; other syntax forms resolve
    /// through the operator registry alone.
    pub fn lookup_operator_overloads<S: AsRef<str>>(
        &self,
        names: &[S],
        filter: CategoryFilter,
        syntax: SyntaxForm,
    ) -> CatalogResult<Vec<Arc<OperatorDef>>> {
        if syntax != SyntaxForm::Function {
            return Ok(Vec::new());
        }
        self.resolve_functions(names, filter)
            .iter()
            .map(|descriptor| to_operator(descriptor, &self.config))
            .collect()
    }

    /// Every function reachable from the search path, converted to a flat
    /// operator list for tooling.
    pub fn operator_list(&self) -> CatalogResult<Vec<Arc<OperatorDef>>> {
        let mut out = Vec::new();
        for entry in self.search_path.entries() {
            let Some(schema) = self.navigate_scoped(entry, &[] as &[&str]) else {
                continue;
            };
            for name in self.catalog.function_names(schema) {
                for descriptor in self.catalog.functions(schema, &name, self.matcher) {
                    out.push(to_operator(&descriptor, &self.config)?);
                }
            }
        }
        Ok(out)
    }

    /// Enumerate the objects visible at a schema path as typed monikers.
    pub fn list_objects<S: AsRef<str>>(&self, path: &[S]) -> Vec<Moniker> {
        let Some(schema) = self
            .catalog
            .navigate(self.catalog.root(), path.iter().map(|s| s.as_ref()), self.matcher)
        else {
            return Vec::new();
        };

        let mut out = Vec::new();
        if !self.catalog.schema_name(schema).is_empty() {
            out.push(self.moniker(schema, None, MonikerKind::Schema));
        }
        for name in self.catalog.schema_names(schema) {
            out.push(self.moniker(schema, Some(&name), MonikerKind::Schema));
        }
        for name in self.catalog.table_names(schema) {
            out.push(self.moniker(schema, Some(&name), MonikerKind::Table));
        }
        // Views appear here too: they are zero-argument table functions.
        for name in self.catalog.function_names(schema) {
            out.push(self.moniker(schema, Some(&name), MonikerKind::Function));
        }
        out
    }

    /// Resolve a schema-declared named type.
    pub fn resolve_named_type<S: AsRef<str>>(&self, names: &[S]) -> Option<RelType> {
        let (last, prefix) = names.split_last()?;
        for entry in self.search_path.entries() {
            let Some(schema) = self.navigate_scoped(entry, prefix) else {
                continue;
            };
            if let Some(ty) = self.catalog.named_type(schema, last.as_ref(), self.matcher) {
                return Some(ty.clone());
            }
        }
        None
    }

    fn moniker(&self, schema: SchemaId, name: Option<&str>, kind: MonikerKind) -> Moniker {
        let mut path = self.catalog.path_of(schema);
        if let Some(name) = name {
            path.push(name.to_string());
        }
        // One level below the unnamed root is the catalog boundary.
        let kind = if kind == MonikerKind::Schema
            && path.len() == 1
            && self.catalog.schema_name(self.catalog.root()).is_empty()
        {
            MonikerKind::Catalog
        } else {
            kind
        };
        Moniker::new(path, kind)
    }

    fn navigate_scoped<A: AsRef<str>, B: AsRef<str>>(
        &self,
        scope: &[A],
        prefix: &[B],
    ) -> Option<SchemaId> {
        self.catalog.navigate(
            self.catalog.root(),
            scope
                .iter()
                .map(|s| s.as_ref())
                .chain(prefix.iter().map(|s| s.as_ref())),
            self.matcher,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn search_path_collapses_duplicates_in_order() {
        let path = SearchPath::new(vec![
            vec!["a".to_string()],
            vec!["b".to_string()],
            vec!["a".to_string()],
            Vec::new(),
        ]);
        assert_eq!(
            path.entries(),
            &[vec!["a".to_string()], vec!["b".to_string()], Vec::new()]
        );
    }
}
