//! Structured boolean expressions and scope-value extraction.
//!
//! Expressions arrive already parsed (a CEL condition resolved into a small
//! tree). Only one shape carries meaning for access decisions:
//!
//! ```text
//! resource.environment_name in ["staging", "prod"]
//! ```
//!
//! [`extract_scope_values`] recognises that shape and returns the literal
//! list. Every other shape yields an empty [`ScopeValues`]; this is a normal
//! outcome, never an error.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Field name identifying the environment scope of a resource.
pub const ENVIRONMENT_FIELD: &str = "resource.environment_name";

/// A literal value appearing in an expression.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Literal {
    /// Boolean literal.
    Bool(bool),
    /// Integer literal.
    Int(i64),
    /// String literal.
    String(String),
    /// List literal; elements may be of mixed kinds.
    List(Vec<Literal>),
}

impl Literal {
    /// Return the elements as strings if this is a list made only of strings.
    ///
    /// An empty list counts as a string list.
    pub fn as_string_list(&self) -> Option<Vec<String>> {
        match self {
            Self::List(items) => items
                .iter()
                .map(|item| match item {
                    Self::String(s) => Some(s.clone()),
                    _ => None,
                })
                .collect(),
            _ => None,
        }
    }
}

/// One side of a binary expression.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operand {
    /// A reference to a resource attribute, e.g. `resource.environment_name`.
    Field(String),
    /// A literal value.
    Value(Literal),
}

/// Comparison operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompareOp {
    /// `==`
    Eq,
    /// `!=`
    Ne,
    /// `<`
    Lt,
    /// `<=`
    Le,
    /// `>`
    Gt,
    /// `>=`
    Ge,
}

impl CompareOp {
    fn symbol(self) -> &'static str {
        match self {
            Self::Eq => "==",
            Self::Ne => "!=",
            Self::Lt => "<",
            Self::Le => "<=",
            Self::Gt => ">",
            Self::Ge => ">=",
        }
    }
}

/// A parsed boolean expression.
///
/// [`Expr::Empty`] is the zero value: what an absent or unparsable condition
/// resolves to.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Expr {
    /// No expression.
    #[default]
    Empty,
    /// A bare literal (e.g. `true`).
    Literal {
        /// The literal value.
        value: Literal,
    },
    /// Containment test: `left in right`.
    In {
        /// Left operand, usually a field.
        left: Operand,
        /// Right operand, usually a list literal.
        right: Operand,
    },
    /// Binary comparison.
    Compare {
        /// Comparison operator.
        cmp: CompareOp,
        /// Left operand.
        left: Operand,
        /// Right operand.
        right: Operand,
    },
    /// Logical conjunction of all arguments.
    And {
        /// Conjuncts.
        args: Vec<Expr>,
    },
    /// Logical disjunction of all arguments.
    Or {
        /// Disjuncts.
        args: Vec<Expr>,
    },
}

impl Expr {
    /// Build `field in [values...]`.
    pub fn field_in<I, S>(field: &str, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::In {
            left: Operand::Field(field.to_owned()),
            right: Operand::Value(Literal::List(
                values
                    .into_iter()
                    .map(|v| Literal::String(v.into()))
                    .collect(),
            )),
        }
    }

    /// Build `resource.environment_name in [environments...]`.
    pub fn environment_in<I, S>(environments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::field_in(ENVIRONMENT_FIELD, environments)
    }

    /// Whether this is the zero-value expression.
    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }
}

/// Scope values extracted from an expression, in the order given.
///
/// Duplicates are kept as they appear in the source list; containment checks
/// are unaffected by them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ScopeValues(Vec<String>);

impl ScopeValues {
    /// Whether `value` is one of the extracted scope values.
    pub fn contains(&self, value: &str) -> bool {
        self.0.iter().any(|v| v == value)
    }

    /// Whether nothing was extracted.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of extracted values, duplicates included.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Iterate over the values.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    /// Consume into the underlying list.
    pub fn into_vec(self) -> Vec<String> {
        self.0
    }
}

impl From<Vec<String>> for ScopeValues {
    fn from(values: Vec<String>) -> Self {
        Self(values)
    }
}

/// Extract the environment names an expression restricts access to.
///
/// Recognises exactly `resource.environment_name in [<string>, ...]`. Any other
/// shape (other operator, other field, non-list or mixed-type right operand,
/// nested logic) returns an empty set.
pub fn extract_scope_values(expr: &Expr) -> ScopeValues {
    match expr {
        Expr::In {
            left: Operand::Field(field),
            right: Operand::Value(list),
        } if field == ENVIRONMENT_FIELD => list
            .as_string_list()
            .map(ScopeValues::from)
            .unwrap_or_default(),
        Expr::In { .. }
        | Expr::Empty
        | Expr::Literal { .. }
        | Expr::Compare { .. }
        | Expr::And { .. }
        | Expr::Or { .. } => ScopeValues::default(),
    }
}

// ── Rendering ───────────────────────────────────────────────────

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(b) => write!(f, "{b}"),
            Self::Int(n) => write!(f, "{n}"),
            Self::String(s) => write!(f, "{s:?}"),
            Self::List(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_str("]")
            }
        }
    }
}

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Field(name) => f.write_str(name),
            Self::Value(lit) => write!(f, "{lit}"),
        }
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => Ok(()),
            Self::Literal { value } => write!(f, "{value}"),
            Self::In { left, right } => write!(f, "{left} in {right}"),
            Self::Compare { cmp, left, right } => write!(f, "{left} {} {right}", cmp.symbol()),
            Self::And { args } => write_joined(f, args, " && "),
            Self::Or { args } => write_joined(f, args, " || "),
        }
    }
}

fn write_joined(f: &mut fmt::Formatter<'_>, args: &[Expr], sep: &str) -> fmt::Result {
    for (i, arg) in args.iter().enumerate() {
        if i > 0 {
            f.write_str(sep)?;
        }
        match arg {
            Expr::And { .. } | Expr::Or { .. } => write!(f, "({arg})")?,
            _ => write!(f, "{arg}")?,
        }
    }
    Ok(())
}
