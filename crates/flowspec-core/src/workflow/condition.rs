//! Step inclusion conditions.
//!
//! The grammar is intentionally one clause wide:
//!
//! ```text
//! condition  := comparison | presence
//! comparison := IDENT OP LITERAL          OP in >= > <= < == !=
//! presence   := ["not " | "!"] "exists(" IDENT ")"
//! LITERAL    := number | true | false | 'text' | "text" | bareword
//! ```
//!
//! A bareword is a single token and never a connective (`and`, `or`,
//! `&&`, `||`), so compound expressions are rejected rather than read as
//! one long text literal.
//!
//! Conditions are parsed once at compile time. Evaluation is total: a
//! missing variable or a kind mismatch never errors, it fails closed.

use std::fmt;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Serialize, Serializer};

use super::context::{ContextValue, ExecutionContext};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Ge,
    Gt,
    Le,
    Lt,
    Eq,
    Ne,
}

impl CompareOp {
    fn parse(op: &str) -> Option<Self> {
        match op {
            ">=" => Some(CompareOp::Ge),
            ">" => Some(CompareOp::Gt),
            "<=" => Some(CompareOp::Le),
            "<" => Some(CompareOp::Lt),
            "==" => Some(CompareOp::Eq),
            "!=" => Some(CompareOp::Ne),
            _ => None,
        }
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            CompareOp::Ge => ">=",
            CompareOp::Gt => ">",
            CompareOp::Le => "<=",
            CompareOp::Lt => "<",
            CompareOp::Eq => "==",
            CompareOp::Ne => "!=",
        }
    }

    fn is_ordering(&self) -> bool {
        !matches!(self, CompareOp::Eq | CompareOp::Ne)
    }
}

/// A parsed inclusion condition.
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    Compare {
        variable: String,
        op: CompareOp,
        literal: ContextValue,
    },
    Exists(String),
    Missing(String),
}

/// Why a condition expression was rejected.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConditionError {
    #[error("empty condition")]
    Empty,
    #[error("unrecognized expression")]
    Unrecognized,
    #[error("operator '{0}' requires a numeric literal")]
    NonNumericOrdering(String),
}

fn comparison_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^([A-Za-z_][A-Za-z0-9_.\-]*)\s*(>=|<=|==|!=|>|<)\s*([^\s<>=!].*)$")
            .expect("static comparison pattern")
    })
}

fn presence_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^(not\s+|!\s*)?exists\(\s*([A-Za-z_][A-Za-z0-9_.\-]*)\s*\)$")
            .expect("static presence pattern")
    })
}

fn bareword_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[A-Za-z0-9_.:/+\-]+$").expect("static bareword pattern"))
}

const CONNECTIVES: [&str; 3] = ["and", "or", "not"];

fn parse_literal(raw: &str) -> Result<ContextValue, ConditionError> {
    let raw = raw.trim();
    for quote in ['"', '\''] {
        if raw.len() >= 2 && raw.starts_with(quote) && raw.ends_with(quote) {
            let inner = &raw[1..raw.len() - 1];
            if inner.contains(quote) {
                return Err(ConditionError::Unrecognized);
            }
            return Ok(ContextValue::Text(inner.to_string()));
        }
    }

    if !bareword_re().is_match(raw) || CONNECTIVES.contains(&raw.to_ascii_lowercase().as_str()) {
        return Err(ConditionError::Unrecognized);
    }
    Ok(ContextValue::parse(raw))
}

impl Condition {
    /// Parse a condition expression.
    pub fn parse(expression: &str) -> Result<Self, ConditionError> {
        let expr = expression.trim();
        if expr.is_empty() {
            return Err(ConditionError::Empty);
        }

        if let Some(caps) = presence_re().captures(expr) {
            let variable = caps[2].to_string();
            return Ok(if caps.get(1).is_some() {
                Condition::Missing(variable)
            } else {
                Condition::Exists(variable)
            });
        }

        let caps = comparison_re()
            .captures(expr)
            .ok_or(ConditionError::Unrecognized)?;
        let op = CompareOp::parse(&caps[2]).ok_or(ConditionError::Unrecognized)?;
        let literal = parse_literal(&caps[3])?;

        if op.is_ordering() && !matches!(literal, ContextValue::Number(_)) {
            return Err(ConditionError::NonNumericOrdering(op.symbol().to_string()));
        }

        Ok(Condition::Compare {
            variable: caps[1].to_string(),
            op,
            literal,
        })
    }

    /// The context variable this condition reads.
    pub fn variable(&self) -> &str {
        match self {
            Condition::Compare { variable, .. } => variable,
            Condition::Exists(v) | Condition::Missing(v) => v,
        }
    }

    /// Evaluate against a context. Pure and total.
    pub fn evaluate(&self, context: &ExecutionContext) -> bool {
        match self {
            Condition::Exists(v) => context.contains(v),
            Condition::Missing(v) => !context.contains(v),
            Condition::Compare { variable, op, literal } => match context.get(variable) {
                Some(actual) => compare(actual, *op, literal),
                None => false,
            },
        }
    }

    /// Human-readable reason for an unsatisfied condition, naming the
    /// threshold and the value actually seen.
    pub fn skip_reason(&self, context: &ExecutionContext) -> String {
        let observed = match self {
            Condition::Missing(v) => match context.get(v) {
                Some(actual) => format!("{} = {}", v, actual),
                None => format!("{} not set", v),
            },
            _ => match context.get(self.variable()) {
                Some(actual) => format!("actual: {}", actual),
                None => format!("{} not set", self.variable()),
            },
        };
        format!("condition not met: {} ({})", self, observed)
    }
}

fn compare(actual: &ContextValue, op: CompareOp, literal: &ContextValue) -> bool {
    match (actual, literal) {
        (ContextValue::Number(a), ContextValue::Number(b)) => match op {
            CompareOp::Ge => a >= b,
            CompareOp::Gt => a > b,
            CompareOp::Le => a <= b,
            CompareOp::Lt => a < b,
            CompareOp::Eq => a == b,
            CompareOp::Ne => a != b,
        },
        (ContextValue::Bool(a), ContextValue::Bool(b)) => match op {
            CompareOp::Eq => a == b,
            CompareOp::Ne => a != b,
            _ => false,
        },
        (ContextValue::Text(a), ContextValue::Text(b)) => match op {
            CompareOp::Eq => a == b,
            CompareOp::Ne => a != b,
            _ => false,
        },
        // mismatched kinds fail closed, including `!=`
        _ => false,
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Condition::Compare { variable, op, literal } => match literal {
                ContextValue::Text(s) => write!(f, "{} {} '{}'", variable, op.symbol(), s),
                other => write!(f, "{} {} {}", variable, op.symbol(), other),
            },
            Condition::Exists(v) => write!(f, "exists({})", v),
            Condition::Missing(v) => write!(f, "not exists({})", v),
        }
    }
}

impl Serialize for Condition {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}
