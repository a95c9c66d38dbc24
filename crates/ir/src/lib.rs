//! Syntax tree model shared between the parser and the detectors.
//!
//! A [`SyntaxTree`] owns every node it contains, is immutable once built
//! and lives for a single scan of a single file. Node kinds form a closed
//! enum so detector dispatch is exhaustiveness-checked at compile time.

use serde::{Deserialize, Serialize};

pub mod walk;

pub use walk::Walk;

/// Binary operators the detectors care about. Everything outside the
/// arithmetic set collapses into [`BinaryOp::Other`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Other,
}

impl BinaryOp {
    pub fn from_token(op: &str) -> Self {
        match op {
            "+" => BinaryOp::Add,
            "-" => BinaryOp::Sub,
            "*" => BinaryOp::Mul,
            "/" => BinaryOp::Div,
            "%" => BinaryOp::Mod,
            _ => BinaryOp::Other,
        }
    }
}

/// Kind-specific payload of a node. Children are owned inline so a tree is
/// one ownership hierarchy with no back or cross references.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum NodeKind {
    /// A call expression. `callee` is the full dotted target
    /// (`cursor.execute`), arguments in source order.
    Call {
        callee: String,
        args: Vec<SyntaxNode>,
    },
    /// A simple assignment: `target = value`.
    Assignment {
        target: String,
        value: Box<SyntaxNode>,
    },
    /// One imported module (an `import a, b` statement yields two nodes).
    Import { module: String },
    BinaryOp {
        op: BinaryOp,
        left: Box<SyntaxNode>,
        right: Box<SyntaxNode>,
    },
    /// String literal with quotes and prefixes stripped.
    StringLiteral(String),
    Number,
    Identifier(String),
    Tuple(Vec<SyntaxNode>),
    Dict(Vec<(SyntaxNode, SyntaxNode)>),
    /// Opaque container for constructs the detectors do not inspect
    /// directly (function bodies, branches, loops). Keeps nested
    /// statements reachable by the walker.
    Block(Vec<SyntaxNode>),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyntaxNode {
    /// 1-based source line the node starts on.
    pub line: usize,
    /// Trimmed source text the node spans, capped at construction.
    pub excerpt: String,
    pub kind: NodeKind,
}

impl SyntaxNode {
    pub fn new(line: usize, excerpt: impl Into<String>, kind: NodeKind) -> Self {
        Self {
            line,
            excerpt: excerpt.into(),
            kind,
        }
    }

    /// Direct children in source order.
    pub fn children(&self) -> Vec<&SyntaxNode> {
        match &self.kind {
            NodeKind::Call { args, .. } => args.iter().collect(),
            NodeKind::Assignment { value, .. } => vec![value.as_ref()],
            NodeKind::BinaryOp { left, right, .. } => vec![left.as_ref(), right.as_ref()],
            NodeKind::Tuple(items) | NodeKind::Block(items) => items.iter().collect(),
            NodeKind::Dict(entries) => entries.iter().flat_map(|(k, v)| [k, v]).collect(),
            NodeKind::Import { .. }
            | NodeKind::StringLiteral(_)
            | NodeKind::Number
            | NodeKind::Identifier(_) => Vec::new(),
        }
    }

    /// Last segment of a call target: `cursor.execute` yields `execute`.
    /// `None` when the node is not a call.
    pub fn call_method(&self) -> Option<&str> {
        match &self.kind {
            NodeKind::Call { callee, .. } => Some(method_of(callee)),
            _ => None,
        }
    }

    /// `true` for calls on a bare name with no receiver (`eval(x)` as
    /// opposed to `db.eval(x)`).
    pub fn is_plain_call(&self) -> bool {
        matches!(&self.kind, NodeKind::Call { callee, .. } if !callee.contains('.'))
    }

    /// `true` when the node is a `+` concatenation.
    pub fn is_concat(&self) -> bool {
        matches!(
            self.kind,
            NodeKind::BinaryOp {
                op: BinaryOp::Add,
                ..
            }
        )
    }

    pub fn as_string_literal(&self) -> Option<&str> {
        match &self.kind {
            NodeKind::StringLiteral(s) => Some(s),
            _ => None,
        }
    }
}

/// Returns the method segment of a dotted call target.
pub fn method_of(callee: &str) -> &str {
    callee.rsplit('.').next().unwrap_or(callee)
}

/// Parsed representation of one source file. Root statements in source
/// order; dropped as soon as the scan of the file finishes.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SyntaxTree {
    roots: Vec<SyntaxNode>,
}

impl SyntaxTree {
    pub fn new(roots: Vec<SyntaxNode>) -> Self {
        Self { roots }
    }

    pub fn roots(&self) -> &[SyntaxNode] {
        &self.roots
    }

    pub fn is_empty(&self) -> bool {
        self.roots.is_empty()
    }

    /// Depth-first traversal over every node in the tree, the shape
    /// detectors are written against.
    pub fn walk(&self) -> Walk<'_> {
        Walk::new(&self.roots)
    }
}

#[cfg(test)]
mod tests;
