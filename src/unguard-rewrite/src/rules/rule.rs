//! The rule seam of the rewrite pipeline.
//!
//! A rule consumes a tree and hands back either the same tree or a rewritten
//! one, flagged so the pipeline can detect a fixpoint without comparing trees.

use common_error::UnguardResult;
use unguard_expr::Expr;

/// A single rewrite over a whole expression tree.
///
/// Rules must leave every sub-tree they do not match structurally unchanged.
pub trait RewriteRule: Send + Sync {
    /// Short name used in logs and traces.
    fn name(&self) -> &'static str;

    /// One-line summary of what the rule removes or replaces.
    fn description(&self) -> &'static str;

    /// Apply the rule.
    fn apply(&self, expr: Expr) -> UnguardResult<Transformed>;
}

/// Tree produced by a rule, and whether it differs from the input.
#[derive(Debug, Clone, PartialEq)]
pub struct Transformed {
    pub expr: Expr,
    pub changed: bool,
}

impl Transformed {
    /// The rule rewrote the tree.
    pub fn rewritten(expr: Expr) -> Self {
        Self {
            expr,
            changed: true,
        }
    }

    /// The rule left the tree alone.
    pub fn unchanged(expr: Expr) -> Self {
        Self {
            expr,
            changed: false,
        }
    }

    /// Keep `rewritten` when the rule reports it matched something, else
    /// hand back `original` so no clone of an untouched tree survives.
    pub fn when(matched: bool, rewritten: Expr, original: Expr) -> Self {
        if matched {
            Self::rewritten(rewritten)
        } else {
            Self::unchanged(original)
        }
    }
}

/// One rule application that changed the tree.
#[derive(Debug, Clone)]
pub struct RuleTrace {
    pub rule: &'static str,
    /// 1-based pass the rule ran in.
    pub pass: usize,
    pub before: Expr,
    pub after: Expr,
}

impl RuleTrace {
    /// Nodes added (positive) or removed (negative) by the rule.
    pub fn node_delta(&self) -> isize {
        let before = isize::try_from(self.before.node_count()).unwrap_or(isize::MAX);
        let after = isize::try_from(self.after.node_count()).unwrap_or(isize::MAX);
        after - before
    }
}

impl std::fmt::Display for RuleTrace {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "pass {} {} ({:+} nodes): {} => {}",
            self.pass,
            self.rule,
            self.node_delta(),
            self.before,
            self.after
        )
    }
}

/// The outcome of running a pipeline.
#[derive(Debug, Clone)]
pub struct RewriteResult {
    pub expr: Expr,
    pub passes: usize,
    /// Rule applications that changed the tree.
    pub rules_applied: usize,
    /// Filled only when tracing is enabled.
    pub trace: Vec<RuleTrace>,
}

impl RewriteResult {
    /// A result for a tree no rule has touched yet.
    pub fn new(expr: Expr) -> Self {
        Self {
            expr,
            passes: 0,
            rules_applied: 0,
            trace: Vec::new(),
        }
    }

    /// Whether any rule changed the tree.
    pub fn changed(&self) -> bool {
        self.rules_applied > 0
    }
}

impl std::fmt::Display for RewriteResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} rule application(s) over {} pass(es)",
            self.rules_applied, self.passes
        )?;
        for entry in &self.trace {
            write!(f, "\n  {entry}")?;
        }
        Ok(())
    }
}
