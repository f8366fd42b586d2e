//! Catalog tables and resolved table handles.

use std::fmt;
use std::sync::Arc;

use arrow::datatypes::Schema;

use relwire_types::{translation, RelField, RelType};

/// A table registered in the catalog.
///
/// The catalog owns the backing object; handles reference it without
/// taking over its lifetime.
pub trait CatalogTable: Send + Sync {
    /// The table's row type, fixed once resolved.
    fn row_type(&self) -> RelType;

    /// Native "unwrap" capability: a table that already carries a resolved
    /// handle returns it here and resolution passes it through as-is.
    fn resolved(&self) -> Option<TableHandle> {
        None
    }
}

/// A resolved, typed reference to a table.
#[derive(Clone)]
pub struct TableHandle {
    pub path: Vec<String>,
    pub row_type: RelType,
    table: Arc<dyn CatalogTable>,
}

impl TableHandle {
    pub fn new(path: Vec<String>, table: Arc<dyn CatalogTable>) -> Self {
        let row_type = table.row_type();
        Self {
            path,
            row_type,
            table,
        }
    }

    /// The backing catalog entry.
    pub fn table(&self) -> &Arc<dyn CatalogTable> {
        &self.table
    }

    /// Dotted rendering of the qualified path.
    pub fn qualified_name(&self) -> String {
        self.path.join(".")
    }
}

// Equality ignores the backing handle: two handles naming the same path
// with the same row type are the same reference for wire purposes.
impl PartialEq for TableHandle {
    fn eq(&self, other: &Self) -> bool {
        self.path == other.path && self.row_type == other.row_type
    }
}

impl Eq for TableHandle {}

impl fmt::Debug for TableHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TableHandle")
            .field("path", &self.path)
            .field("row_type", &self.row_type)
            .finish_non_exhaustive()
    }
}

/// A plain table described by its row type.
#[derive(Debug, Clone)]
pub struct SimpleTable {
    row_type: RelType,
}

impl SimpleTable {
    pub fn new(fields: Vec<RelField>) -> Self {
        Self {
            row_type: RelType::row(fields),
        }
    }

    pub fn from_row_type(row_type: RelType) -> Self {
        Self { row_type }
    }

    /// Build the table from an Arrow schema (the usual shape catalogs in
    /// Arrow-native engines carry).
    pub fn from_arrow_schema(schema: &Schema) -> Self {
        Self {
            row_type: translation::row_type_from_arrow(schema),
        }
    }
}

impl CatalogTable for SimpleTable {
    fn row_type(&self) -> RelType {
        self.row_type.clone()
    }
}

/// A table that exposes a pre-built resolved handle; resolution returns
/// that handle unchanged instead of synthesizing one.
pub struct PreResolvedTable {
    handle: TableHandle,
}

impl PreResolvedTable {
    pub fn new(handle: TableHandle) -> Self {
        Self { handle }
    }
}

impl CatalogTable for PreResolvedTable {
    fn row_type(&self) -> RelType {
        self.handle.row_type.clone()
    }

    fn resolved(&self) -> Option<TableHandle> {
        Some(self.handle.clone())
    }
}
