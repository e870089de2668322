//! The pipeline that applies rewrite rules to an expression.
//!
//! Rules run in order. With `max_passes` above one the pipeline repeats
//! until a pass changes nothing or the limit is reached.

use common_config::RewriteConfig;
use common_error::UnguardResult;
use log::debug;
use unguard_expr::Expr;

use super::rule::{RewriteResult, RewriteRule, RuleTrace};
use super::{NullGuardRemoval, ReplaceQueryRoot};

/// Applies rewrite rules to query expressions.
pub struct RewritePipeline {
    /// The rules to apply (in order).
    rules: Vec<Box<dyn RewriteRule>>,
    /// Configuration.
    config: RewriteConfig,
}

impl RewritePipeline {
    /// Create a pipeline with the given rules.
    pub fn new(rules: Vec<Box<dyn RewriteRule>>) -> Self {
        Self {
            rules,
            config: RewriteConfig::default(),
        }
    }

    /// Create a pipeline with custom config.
    pub fn with_config(rules: Vec<Box<dyn RewriteRule>>, config: RewriteConfig) -> Self {
        Self { rules, config }
    }

    /// The pipeline that prepares a composed query for `source`:
    /// splice the source in, then remove guards.
    pub fn for_source(source: Expr, config: RewriteConfig) -> Self {
        Self::with_config(
            vec![
                Box::new(ReplaceQueryRoot::new(source)),
                Box::new(NullGuardRemoval::new(config.clone())),
            ],
            config,
        )
    }

    /// Add a rule to the pipeline.
    pub fn add_rule<R: RewriteRule + 'static>(&mut self, rule: R) {
        self.rules.push(Box::new(rule));
    }

    /// Names of the rules, in application order.
    pub fn rule_names(&self) -> Vec<&'static str> {
        self.rules.iter().map(|r| r.name()).collect()
    }

    /// Rewrite an expression, repeating passes up to `max_passes`.
    pub fn rewrite(&self, expr: Expr) -> UnguardResult<RewriteResult> {
        let max_passes = self.config.max_passes.max(1);
        let mut result = RewriteResult::new(expr);

        loop {
            if result.passes >= max_passes {
                debug!("Rewrite reached max passes ({max_passes}), stopping");
                break;
            }

            result.passes += 1;
            let changed = self.run_pass(&mut result)?;

            if !changed {
                debug!("No changes in pass {}, reached fixpoint", result.passes);
                break;
            }
        }

        Ok(result)
    }

    /// Rewrite with a single pass.
    pub fn rewrite_once(&self, expr: Expr) -> UnguardResult<RewriteResult> {
        let mut result = RewriteResult::new(expr);
        result.passes = 1;
        self.run_pass(&mut result)?;
        Ok(result)
    }

    fn run_pass(&self, result: &mut RewriteResult) -> UnguardResult<bool> {
        let mut changed_this_pass = false;

        for rule in &self.rules {
            let before = self.config.enable_trace.then(|| result.expr.clone());

            let current = std::mem::replace(&mut result.expr, Expr::constant(true));
            let transformed = rule.apply(current)?;

            if transformed.changed {
                changed_this_pass = true;
                result.rules_applied += 1;

                debug!("Rule '{}' applied in pass {}", rule.name(), result.passes);

                if let Some(before) = before {
                    result.trace.push(RuleTrace {
                        rule: rule.name(),
                        pass: result.passes,
                        before,
                        after: transformed.expr.clone(),
                    });
                }
            }

            result.expr = transformed.expr;
        }

        Ok(changed_this_pass)
    }
}

impl Default for RewritePipeline {
    fn default() -> Self {
        Self::new(vec![Box::new(NullGuardRemoval::default())])
    }
}

impl std::fmt::Debug for RewritePipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RewritePipeline")
            .field("rules", &self.rule_names())
            .field("config", &self.config)
            .finish()
    }
}
