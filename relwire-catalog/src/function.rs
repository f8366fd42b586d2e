//! Catalog function descriptors.

use std::fmt;
use std::sync::Arc;

use relwire_ops::KindTag;
use relwire_types::{RelField, RelType};

/// Function category, fixed at registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FunctionCategory {
    Scalar,
    Aggregate,
    TableFunction,
    /// Expands to a relational expression at plan time; views are
    /// zero-argument table macros.
    TableMacro,
}

impl FunctionCategory {
    /// Whether calls of this category produce a table.
    pub fn is_table_producing(self) -> bool {
        matches!(
            self,
            FunctionCategory::TableFunction | FunctionCategory::TableMacro
        )
    }
}

/// Caller-supplied category predicate for overload lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CategoryFilter {
    All,
    /// Table functions and table macros only.
    TableProducing,
    /// Scalar and aggregate functions only.
    Regular,
}

impl CategoryFilter {
    pub fn accepts(self, category: FunctionCategory) -> bool {
        match self {
            CategoryFilter::All => true,
            CategoryFilter::TableProducing => category.is_table_producing(),
            CategoryFilter::Regular => !category.is_table_producing(),
        }
    }
}

/// One parameter of a function overload. Order is significant and fixed at
/// registration.
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionParam {
    pub name: String,
    pub ty: RelType,
    pub optional: bool,
}

/// How an overload's return type is determined.
#[derive(Clone)]
pub enum ReturnTypeStrategy {
    /// A fixed declared type.
    Fixed(RelType),
    /// Computed per call from the actual operand types.
    Binding(Arc<dyn Fn(&[RelType]) -> RelType + Send + Sync>),
}

impl fmt::Debug for ReturnTypeStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReturnTypeStrategy::Fixed(ty) => f.debug_tuple("Fixed").field(ty).finish(),
            ReturnTypeStrategy::Binding(_) => f.write_str("Binding(..)"),
        }
    }
}

/// One overload of a catalog function.
#[derive(Debug, Clone)]
pub struct FunctionDescriptor {
    pub name: String,
    pub params: Vec<FunctionParam>,
    pub returns: ReturnTypeStrategy,
    pub category: FunctionCategory,
    /// Explicit kind tag for the converted operator; absent means the
    /// generic "other function" tag.
    pub kind_tag: Option<KindTag>,
}

impl FunctionDescriptor {
    pub fn new(name: impl Into<String>, category: FunctionCategory) -> Self {
        Self {
            name: name.into(),
            params: Vec::new(),
            returns: ReturnTypeStrategy::Fixed(RelType::any()),
            category,
            kind_tag: None,
        }
    }

    /// A view: a zero-argument table macro with a fixed row type.
    pub fn view(name: impl Into<String>, row_fields: Vec<RelField>) -> Self {
        Self::new(name, FunctionCategory::TableMacro).returns(RelType::row(row_fields))
    }

    pub fn with_param(mut self, name: impl Into<String>, ty: RelType) -> Self {
        self.params.push(FunctionParam {
            name: name.into(),
            ty,
            optional: false,
        });
        self
    }

    pub fn with_optional_param(mut self, name: impl Into<String>, ty: RelType) -> Self {
        self.params.push(FunctionParam {
            name: name.into(),
            ty,
            optional: true,
        });
        self
    }

    pub fn returns(mut self, ty: RelType) -> Self {
        self.returns = ReturnTypeStrategy::Fixed(ty);
        self
    }

    pub fn returns_with(
        mut self,
        infer: impl Fn(&[RelType]) -> RelType + Send + Sync + 'static,
    ) -> Self {
        self.returns = ReturnTypeStrategy::Binding(Arc::new(infer));
        self
    }

    pub fn with_kind_tag(mut self, tag: KindTag) -> Self {
        self.kind_tag = Some(tag);
        self
    }
}
