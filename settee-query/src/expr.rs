//! Expression trees for field selectors.
//!
//! A selector such as `w => w.Name.First` is captured as an [`Expr`] tree,
//! usually by the [`select!`](crate::select) macro. The tree keeps every node
//! it saw, including ones that cannot select a field (method calls,
//! indexing, arithmetic), so that [`FieldPath::extract`] can reject them with
//! a precise error instead of guessing.
//!
//! ```rust
//! use settee_query::expr::{Expr, NodeKind};
//!
//! let expr = Expr::member(Expr::member(Expr::parameter("w"), "Name"), "First");
//! assert_eq!(expr.to_string(), "w.Name.First");
//! assert_eq!(expr.kind(), NodeKind::MemberAccess);
//! ```
//!
//! [`FieldPath::extract`]: crate::field::FieldPath::extract

use std::fmt;

use smol_str::SmolStr;

/// Kind of an expression node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    /// The selector's own parameter.
    Parameter,
    /// An identifier that is not the selector parameter.
    Capture,
    /// `target.name`.
    MemberAccess,
    /// `target.method(args)`.
    Call,
    /// `target[index]`.
    Index,
    /// A literal.
    Constant,
    /// `lhs op rhs`.
    Binary,
    /// Anything else.
    Opaque,
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Parameter => "parameter",
            Self::Capture => "captured variable",
            Self::MemberAccess => "member access",
            Self::Call => "method call",
            Self::Index => "index",
            Self::Constant => "constant",
            Self::Binary => "binary",
            Self::Opaque => "opaque",
        };
        f.write_str(name)
    }
}

/// A selector expression tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expr {
    /// The selector parameter.
    Parameter(SmolStr),
    /// A root identifier other than the parameter.
    Capture(SmolStr),
    /// Member access.
    Member {
        /// Expression the member is read from.
        target: Box<Expr>,
        /// Member name.
        name: SmolStr,
    },
    /// Method call; arguments are kept as source text.
    Call {
        /// Receiver.
        target: Box<Expr>,
        /// Method name.
        method: SmolStr,
        /// Argument source text.
        args: String,
    },
    /// Indexing; the index is kept as source text.
    Index {
        /// Indexed expression.
        target: Box<Expr>,
        /// Index source text.
        index: String,
    },
    /// A literal, as source text.
    Constant(String),
    /// A binary operation; the right-hand side is kept as source text.
    Binary {
        /// Left operand.
        lhs: Box<Expr>,
        /// Operator token.
        op: SmolStr,
        /// Right operand source text.
        rhs: String,
    },
    /// Source text that does not fit any other node.
    Opaque(String),
}

impl Expr {
    /// The selector parameter itself.
    pub fn parameter(name: impl Into<SmolStr>) -> Self {
        Self::Parameter(name.into())
    }

    /// A root identifier; it is the parameter only when the names match.
    pub fn root(param: &str, ident: &str) -> Self {
        if param == ident {
            Self::Parameter(ident.into())
        } else {
            Self::Capture(ident.into())
        }
    }

    /// Member access on `target`.
    pub fn member(target: Expr, name: impl Into<SmolStr>) -> Self {
        Self::Member {
            target: Box::new(target),
            name: name.into(),
        }
    }

    /// Method call on `target`.
    pub fn call(target: Expr, method: impl Into<SmolStr>, args: impl Into<String>) -> Self {
        Self::Call {
            target: Box::new(target),
            method: method.into(),
            args: args.into(),
        }
    }

    /// Indexing into `target`.
    pub fn index(target: Expr, index: impl Into<String>) -> Self {
        Self::Index {
            target: Box::new(target),
            index: index.into(),
        }
    }

    /// A literal.
    pub fn constant(text: impl Into<String>) -> Self {
        Self::Constant(text.into())
    }

    /// A binary operation.
    pub fn binary(lhs: Expr, op: impl Into<SmolStr>, rhs: impl Into<String>) -> Self {
        Self::Binary {
            lhs: Box::new(lhs),
            op: op.into(),
            rhs: rhs.into(),
        }
    }

    /// Unclassified source text.
    pub fn opaque(text: impl Into<String>) -> Self {
        Self::Opaque(text.into())
    }

    /// Kind of this node.
    pub fn kind(&self) -> NodeKind {
        match self {
            Self::Parameter(_) => NodeKind::Parameter,
            Self::Capture(_) => NodeKind::Capture,
            Self::Member { .. } => NodeKind::MemberAccess,
            Self::Call { .. } => NodeKind::Call,
            Self::Index { .. } => NodeKind::Index,
            Self::Constant(_) => NodeKind::Constant,
            Self::Binary { .. } => NodeKind::Binary,
            Self::Opaque(_) => NodeKind::Opaque,
        }
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Parameter(name) | Self::Capture(name) => f.write_str(name),
            Self::Member { target, name } => write!(f, "{}.{}", target, name),
            Self::Call {
                target,
                method,
                args,
            } => write!(f, "{}.{}({})", target, method, args),
            Self::Index { target, index } => write!(f, "{}[{}]", target, index),
            Self::Constant(text) | Self::Opaque(text) => f.write_str(text),
            Self::Binary { lhs, op, rhs } => write!(f, "{} {} {}", lhs, op, rhs),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_root_distinguishes_parameter() {
        assert_eq!(Expr::root("w", "w").kind(), NodeKind::Parameter);
        assert_eq!(Expr::root("w", "other").kind(), NodeKind::Capture);
    }

    #[test]
    fn test_display() {
        let w = || Expr::parameter("w");
        assert_eq!(Expr::call(Expr::member(w(), "Name"), "len", "").to_string(), "w.Name.len()");
        assert_eq!(Expr::index(Expr::member(w(), "Tags"), "0").to_string(), "w.Tags[0]");
        assert_eq!(Expr::binary(Expr::member(w(), "Price"), "*", "2").to_string(), "w.Price * 2");
    }
}
