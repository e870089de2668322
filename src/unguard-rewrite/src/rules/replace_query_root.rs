//! Query root replacement rule.
//!
//! A composed query refers to "the query built so far" through a
//! [`Expr::QueryRoot`] placeholder. Before execution the placeholder is
//! replaced by the engine's own source expression so the engine receives a
//! single coherent tree.

use common_error::{UnguardError, UnguardResult};
use unguard_expr::{Expr, ExprRewriter, Rewritten, TypeDesc, rewrite_tree};

use super::rule::{RewriteRule, Transformed};

/// Query root replacement rule.
#[derive(Debug, Clone)]
pub struct ReplaceQueryRoot {
    source: Expr,
}

impl ReplaceQueryRoot {
    /// Replace query roots with `source`.
    pub fn new(source: Expr) -> Self {
        Self { source }
    }

    /// The source expression spliced in.
    pub fn source(&self) -> &Expr {
        &self.source
    }
}

impl RewriteRule for ReplaceQueryRoot {
    fn name(&self) -> &'static str {
        "ReplaceQueryRoot"
    }

    fn description(&self) -> &'static str {
        "Replace the composed-query placeholder with the engine's source"
    }

    fn apply(&self, expr: Expr) -> UnguardResult<Transformed> {
        let mut splicer = RootSplicer {
            source: &self.source,
            source_type: self.source.static_type(),
            mismatch: None,
            replaced: 0,
        };
        let rewritten = rewrite_tree(&mut splicer, &expr);

        if let Some(element) = splicer.mismatch {
            return Err(UnguardError::type_error(format!(
                "query root over {element} cannot be replaced by a source of type {}",
                splicer.source_type
            )));
        }

        Ok(Transformed::when(splicer.replaced > 0, rewritten, expr))
    }
}

struct RootSplicer<'a> {
    source: &'a Expr,
    source_type: TypeDesc,
    mismatch: Option<TypeDesc>,
    replaced: usize,
}

impl ExprRewriter for RootSplicer<'_> {
    fn rewrite_leaf(&mut self, expr: &Expr) -> Rewritten {
        let Expr::QueryRoot { element } = expr else {
            return Rewritten::Unchanged;
        };
        if self.source_type.element() != Some(element) {
            self.mismatch = Some(element.clone());
            return Rewritten::Unchanged;
        }
        self.replaced += 1;
        Rewritten::Replaced(self.source.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use unguard_expr::expr::{constant, lambda};
    use unguard_expr::testing::person_type;

    fn people() -> Expr {
        Expr::source("people", person_type())
    }

    fn filtered(root: Expr) -> Expr {
        Expr::call_static(
            "where",
            vec![root, lambda(["p"], constant(true))],
            TypeDesc::sequence(person_type()),
        )
    }

    #[test]
    fn test_root_replaced() {
        let rule = ReplaceQueryRoot::new(people());
        let result = rule
            .apply(filtered(Expr::query_root(person_type())))
            .unwrap();

        assert!(result.changed);
        assert_eq!(result.expr, filtered(people()));
        assert_eq!(rule.source(), &people());
    }

    #[test]
    fn test_no_root_unchanged() {
        let rule = ReplaceQueryRoot::new(people());
        let result = rule.apply(filtered(people())).unwrap();
        assert!(!result.changed);
    }

    #[test]
    fn test_element_type_mismatch() {
        let rule = ReplaceQueryRoot::new(people());
        let err = rule
            .apply(filtered(Expr::query_root(TypeDesc::String)))
            .unwrap_err();
        assert!(matches!(err, UnguardError::TypeError(_)));
    }
}
