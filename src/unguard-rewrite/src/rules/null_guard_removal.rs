//! Null-propagation guard removal rule.

use common_config::RewriteConfig;
use common_error::UnguardResult;
use unguard_expr::Expr;

use super::rule::{RewriteRule, Transformed};
use crate::unwrap::{MemberUnwrap, MethodUnwrap};
use crate::yanker::NullGuardYanker;

/// Null-guard removal rule.
///
/// Removes the guards enabled in its [`RewriteConfig`]; with both shapes
/// disabled the rule never fires.
///
/// # Legal When
///
/// - Every guarded path is non-null for the data the query runs against
#[derive(Debug, Clone, Default)]
pub struct NullGuardRemoval {
    config: RewriteConfig,
}

impl NullGuardRemoval {
    /// Create the rule with the given shapes enabled.
    pub fn new(config: RewriteConfig) -> Self {
        Self { config }
    }

    /// The rule's configuration.
    pub fn config(&self) -> &RewriteConfig {
        &self.config
    }
}

impl RewriteRule for NullGuardRemoval {
    fn name(&self) -> &'static str {
        "NullGuardRemoval"
    }

    fn description(&self) -> &'static str {
        "Remove null-propagation guards and their companion null checks"
    }

    fn apply(&self, expr: Expr) -> UnguardResult<Transformed> {
        if !self.config.any_enabled() {
            return Ok(Transformed::unchanged(expr));
        }

        let shape = (
            self.config.member_unwrap.then_some(MemberUnwrap),
            self.config.method_unwrap.then_some(MethodUnwrap),
        );
        let mut yanker = NullGuardYanker::new(shape);
        let rewritten = yanker.yank(&expr);

        Ok(Transformed::when(yanker.guards_removed() > 0, rewritten, expr))
    }
}
