//! Conversion of catalog function descriptors into operator definitions.

use std::sync::Arc;

use relwire_ops::{
    KindTag, OperandRule, OperatorCategory, OperatorDef, ParamMetadata, ReturnTypeRule,
    SyntaxForm, TypeFamily,
};
use relwire_types::{RelType, TypeKind};

use crate::config::{Conformance, ResolverConfig};
use crate::function::{FunctionCategory, FunctionDescriptor, ReturnTypeStrategy};
use crate::CatalogResult;

/// Ordered parameter families for an overload.
///
/// This is a pure function of the descriptor: the metadata is
/// representation-stable and independent of whatever type context a later
/// validation pass may use.
pub fn param_families(descriptor: &FunctionDescriptor) -> Vec<TypeFamily> {
    descriptor
        .params
        .iter()
        .map(|param| TypeFamily::of(&param.ty))
        .collect()
}

/// Convert one overload into a resolvable operator definition.
pub fn to_operator(
    descriptor: &FunctionDescriptor,
    config: &ResolverConfig,
) -> CatalogResult<Arc<OperatorDef>> {
    let operands = OperandRule::Explicit(
        descriptor
            .params
            .iter()
            .map(|param| ParamMetadata {
                name: param.name.clone(),
                family: TypeFamily::of(&param.ty),
                ty: param.ty.clone(),
                optional: param.optional,
            })
            .collect(),
    );

    let kind = descriptor
        .kind_tag
        .clone()
        .unwrap_or(KindTag::OtherFunction);
    let syntax = syntax_for(descriptor, config);

    let (category, returns) = match descriptor.category {
        FunctionCategory::Scalar => (OperatorCategory::Scalar, scalar_returns(descriptor)),
        // Distinctness is a per-call wire attribute; the definition never
        // records it.
        FunctionCategory::Aggregate => (OperatorCategory::Aggregate, scalar_returns(descriptor)),
        FunctionCategory::TableMacro => (OperatorCategory::TableMacro, ReturnTypeRule::Cursor),
        FunctionCategory::TableFunction => {
            (OperatorCategory::TableFunction, ReturnTypeRule::Cursor)
        }
    };

    let op = OperatorDef::new(descriptor.name.clone(), kind, syntax, category, returns)
        .with_operands(operands);
    Ok(Arc::new(op))
}

fn scalar_returns(descriptor: &FunctionDescriptor) -> ReturnTypeRule {
    match &descriptor.returns {
        ReturnTypeStrategy::Fixed(ty) => ReturnTypeRule::Fixed(to_sql(ty.clone())),
        ReturnTypeStrategy::Binding(infer) => {
            let infer = Arc::clone(infer);
            ReturnTypeRule::Binding(Arc::new(move |operands: &[RelType]| {
                to_sql(infer(operands))
            }))
        }
    }
}

/// Normalize a declared type for operator use: the dynamic/untyped
/// placeholder becomes the nullable ANY sentinel.
fn to_sql(ty: RelType) -> RelType {
    if matches!(ty.kind(), TypeKind::Any) {
        RelType::any()
    } else {
        ty
    }
}

fn syntax_for(descriptor: &FunctionDescriptor, config: &ResolverConfig) -> SyntaxForm {
    if !descriptor.params.is_empty() {
        return SyntaxForm::Function;
    }
    match config.conformance {
        // Keep both `foo()` and `foo` working under the default dialect.
        Conformance::Default => SyntaxForm::FunctionIdConstant,
        Conformance::Custom {
            allow_niladic_parentheses: true,
        } => SyntaxForm::Function,
        Conformance::Custom {
            allow_niladic_parentheses: false,
        } => SyntaxForm::FunctionId,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use relwire_types::RelField;

    fn config() -> ResolverConfig {
        ResolverConfig::default()
    }

    #[test]
    fn families_are_a_pure_projection() {
        let desc = FunctionDescriptor::new("f", FunctionCategory::Scalar)
            .with_param("n", RelType::decimal(10, 2))
            .with_param("s", RelType::varchar(None))
            .with_param("x", RelType::any());
        assert_eq!(
            param_families(&desc),
            vec![TypeFamily::Numeric, TypeFamily::Character, TypeFamily::Any]
        );
        // Stable across repeated computation.
        assert_eq!(param_families(&desc), param_families(&desc));
    }

    #[test]
    fn scalar_conversion_binds_explicit_operands() {
        let desc = FunctionDescriptor::new("myfun", FunctionCategory::Scalar)
            .with_param("a", RelType::integer())
            .returns(RelType::bigint());
        let op = to_operator(&desc, &config()).unwrap();
        assert_eq!(op.kind, KindTag::OtherFunction);
        assert_eq!(op.syntax, SyntaxForm::Function);
        match &op.operands {
            OperandRule::Explicit(params) => {
                assert_eq!(params.len(), 1);
                assert_eq!(params[0].ty, RelType::integer());
            }
            other => panic!("expected explicit operands, got {other:?}"),
        }
        assert_eq!(op.returns.infer(&[]), Some(RelType::bigint()));
    }

    #[test]
    fn explicit_kind_tag_wins_over_default() {
        let desc = FunctionDescriptor::new("my_max", FunctionCategory::Aggregate)
            .with_param("a", RelType::integer())
            .returns(RelType::integer())
            .with_kind_tag(KindTag::Max);
        let op = to_operator(&desc, &config()).unwrap();
        assert_eq!(op.kind, KindTag::Max);
        assert!(op.is_aggregate());
    }

    #[test]
    fn niladic_syntax_depends_on_conformance() {
        let desc = FunctionDescriptor::new("f", FunctionCategory::Scalar)
            .returns(RelType::integer());

        let default = to_operator(&desc, &config()).unwrap();
        assert_eq!(default.syntax, SyntaxForm::FunctionIdConstant);

        let with_parens = to_operator(
            &desc,
            &config().with_conformance(Conformance::Custom {
                allow_niladic_parentheses: true,
            }),
        )
        .unwrap();
        assert_eq!(with_parens.syntax, SyntaxForm::Function);

        let without_parens = to_operator(
            &desc,
            &config().with_conformance(Conformance::Custom {
                allow_niladic_parentheses: false,
            }),
        )
        .unwrap();
        assert_eq!(without_parens.syntax, SyntaxForm::FunctionId);
    }

    #[test]
    fn table_functions_return_cursor() {
        let view = FunctionDescriptor::view("v", vec![RelField::new("a", RelType::integer())]);
        let op = to_operator(&view, &config()).unwrap();
        assert_eq!(op.returns.infer(&[]), Some(RelType::cursor()));

        let tf = FunctionDescriptor::new("gen", FunctionCategory::TableFunction)
            .with_param("n", RelType::integer())
            .returns(RelType::row(vec![RelField::new("x", RelType::integer())]));
        let op = to_operator(&tf, &config()).unwrap();
        assert_eq!(op.returns.infer(&[]), Some(RelType::cursor()));
        assert_eq!(op.syntax, SyntaxForm::Function);
    }

    #[test]
    fn untyped_placeholder_coerces_to_nullable_any() {
        let desc = FunctionDescriptor::new("dyn", FunctionCategory::Scalar)
            .returns(RelType::new(TypeKind::Any, false));
        let op = to_operator(&desc, &config()).unwrap();
        assert_eq!(op.returns.infer(&[]), Some(RelType::any()));

        let binding = FunctionDescriptor::new("dyn2", FunctionCategory::Scalar)
            .with_param("a", RelType::integer())
            .returns_with(|_| RelType::new(TypeKind::Any, false));
        let op = to_operator(&binding, &config()).unwrap();
        assert_eq!(op.returns.infer(&[RelType::integer()]), Some(RelType::any()));
    }
}
