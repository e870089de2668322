//! Indented tree rendering of expressions.

use common_display::{DisplayTree, TreeNode};

use super::Expr;

impl TreeNode for Expr {
    fn name(&self) -> String {
        match self {
            Self::Constant { value, .. } => format!("Constant {value}"),
            Self::Parameter { name, .. } => format!("Parameter {name}"),
            Self::Member { member, .. } => format!("Member .{member}"),
            Self::Call { method, .. } => format!("Call {method}"),
            Self::Unary { op, .. } => format!("Unary {op}"),
            Self::Binary { op, .. } => format!("Binary {op}"),
            Self::Lambda { params, .. } => format!("Lambda ({})", params.join(", ")),
            Self::Source { name, .. } => format!("Source {name}"),
            Self::Opaque { label, .. } => format!("Opaque {label}"),
            Self::Conditional { .. } | Self::QueryRoot { .. } => self.kind().to_string(),
        }
    }

    fn children(&self) -> Vec<&dyn TreeNode> {
        Self::children(self)
            .into_iter()
            .map(|c| c as &dyn TreeNode)
            .collect()
    }

    fn details(&self) -> Option<String> {
        match self {
            Self::Lambda { .. } => None,
            _ => Some(self.static_type().to_string()),
        }
    }
}

impl Expr {
    /// Render the tree one node per line.
    pub fn explain(&self) -> String {
        DisplayTree::new(self).to_string()
    }
}
