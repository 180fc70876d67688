//! Coordinate predicates.
//!
//! A predicate is a boolean expression over the vertex coordinates `x`, `y`
//! and `z`, e.g. `(x < 0.5) & (y > 0.1)` or `(sqrt(x**2 + y**2) <= 1)`. It is
//! parsed into a small expression tree and evaluated per vertex; nothing but
//! arithmetic, comparisons, boolean connectives and a fixed set of math
//! functions can be expressed.
//!
//! Precedence, from loosest to tightest: `or` / `|`, `and` / `&`,
//! `not` / `~`, comparisons (chainable, `0 < x < 1`), `+ -`, `* /`, unary
//! minus, `**` (right associative).
//!
//! Parentheses, unary operators and operator chains together may nest at
//! most 64 levels deep.

use std::fmt;

use logos::Logos;
use nalgebra::Point3;

use crate::error::{RegionError, RegionResult};
use crate::parser::MAX_NESTING;

#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq)]
#[logos(skip r"[ \t\r\n]+")]
enum PredToken {
    #[token("or")]
    #[token("|")]
    Or,
    #[token("and")]
    #[token("&")]
    And,
    #[token("not")]
    #[token("~")]
    Not,
    #[token("True")]
    #[token("true")]
    True,
    #[token("False")]
    #[token("false")]
    False,
    #[regex(r"[A-Za-z_][A-Za-z0-9_]*")]
    Ident,
    #[regex(r"[0-9]+(\.[0-9]*)?([eE][+-]?[0-9]+)?|\.[0-9]+([eE][+-]?[0-9]+)?")]
    Number,
    #[token("<")]
    Lt,
    #[token("<=")]
    Le,
    #[token(">")]
    Gt,
    #[token(">=")]
    Ge,
    #[token("==")]
    Eq,
    #[token("!=")]
    Ne,
    #[token("+")]
    Plus,
    #[token("-")]
    Minus,
    #[token("*")]
    Star,
    #[token("/")]
    Slash,
    #[token("**")]
    Pow,
    #[token("(")]
    LParen,
    #[token(")")]
    RParen,
}

/// Coordinate axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    /// `x`
    X,
    /// `y`
    Y,
    /// `z`
    Z,
}

impl Axis {
    fn index(self) -> usize {
        match self {
            Self::X => 0,
            Self::Y => 1,
            Self::Z => 2,
        }
    }

    fn name(self) -> &'static str {
        match self {
            Self::X => "x",
            Self::Y => "y",
            Self::Z => "z",
        }
    }
}

/// Built-in unary math functions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MathFn {
    /// `sqrt`
    Sqrt,
    /// `abs`
    Abs,
    /// `sin`
    Sin,
    /// `cos`
    Cos,
    /// `tan`
    Tan,
    /// `exp`
    Exp,
    /// `log`, natural logarithm
    Log,
}

impl MathFn {
    fn from_name(name: &str) -> Option<Self> {
        Some(match name {
            "sqrt" => Self::Sqrt,
            "abs" => Self::Abs,
            "sin" => Self::Sin,
            "cos" => Self::Cos,
            "tan" => Self::Tan,
            "exp" => Self::Exp,
            "log" => Self::Log,
            _ => return None,
        })
    }

    fn apply(self, value: f64) -> f64 {
        match self {
            Self::Sqrt => value.sqrt(),
            Self::Abs => value.abs(),
            Self::Sin => value.sin(),
            Self::Cos => value.cos(),
            Self::Tan => value.tan(),
            Self::Exp => value.exp(),
            Self::Log => value.ln(),
        }
    }
}

/// Arithmetic operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArithOp {
    /// `+`
    Add,
    /// `-`
    Sub,
    /// `*`
    Mul,
    /// `/`
    Div,
    /// `**`
    Pow,
}

/// Comparison operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CmpOp {
    /// `<`
    Lt,
    /// `<=`
    Le,
    /// `>`
    Gt,
    /// `>=`
    Ge,
    /// `==`
    Eq,
    /// `!=`
    Ne,
}

impl CmpOp {
    #[allow(clippy::float_cmp)]
    fn apply(self, a: f64, b: f64) -> bool {
        match self {
            Self::Lt => a < b,
            Self::Le => a <= b,
            Self::Gt => a > b,
            Self::Ge => a >= b,
            Self::Eq => a == b,
            Self::Ne => a != b,
        }
    }
}

/// Predicate expression tree.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// Numeric literal.
    Num(f64),
    /// Boolean literal.
    Bool(bool),
    /// Coordinate component.
    Var(Axis),
    /// Unary minus.
    Neg(Box<Expr>),
    /// Boolean negation.
    Not(Box<Expr>),
    /// Arithmetic.
    Arith(ArithOp, Box<Expr>, Box<Expr>),
    /// Comparison chain `a op b op c ...`, true when every link holds.
    Compare(Box<Expr>, Vec<(CmpOp, Expr)>),
    /// Conjunction.
    And(Box<Expr>, Box<Expr>),
    /// Disjunction.
    Or(Box<Expr>, Box<Expr>),
    /// Math function call.
    Call(MathFn, Box<Expr>),
}

#[derive(Debug, Clone, Copy)]
enum Value {
    Num(f64),
    Bool(bool),
}

impl Expr {
    fn eval(&self, point: &Point3<f64>) -> Result<Value, &'static str> {
        Ok(match self {
            Self::Num(value) => Value::Num(*value),
            Self::Bool(value) => Value::Bool(*value),
            Self::Var(axis) => Value::Num(point[axis.index()]),
            Self::Neg(inner) => Value::Num(-inner.number(point)?),
            Self::Not(inner) => Value::Bool(!inner.boolean(point)?),
            Self::Arith(op, lhs, rhs) => {
                let (a, b) = (lhs.number(point)?, rhs.number(point)?);
                Value::Num(match op {
                    ArithOp::Add => a + b,
                    ArithOp::Sub => a - b,
                    ArithOp::Mul => a * b,
                    ArithOp::Div => a / b,
                    ArithOp::Pow => a.powf(b),
                })
            }
            Self::Compare(first, links) => {
                let mut left = first.number(point)?;
                let mut holds = true;
                for (op, expr) in links {
                    let right = expr.number(point)?;
                    holds &= op.apply(left, right);
                    left = right;
                }
                Value::Bool(holds)
            }
            Self::And(lhs, rhs) => Value::Bool(lhs.boolean(point)? & rhs.boolean(point)?),
            Self::Or(lhs, rhs) => Value::Bool(lhs.boolean(point)? | rhs.boolean(point)?),
            Self::Call(func, arg) => Value::Num(func.apply(arg.number(point)?)),
        })
    }

    fn number(&self, point: &Point3<f64>) -> Result<f64, &'static str> {
        match self.eval(point)? {
            Value::Num(value) => Ok(value),
            Value::Bool(_) => Err("expected a number, found a boolean"),
        }
    }

    fn boolean(&self, point: &Point3<f64>) -> Result<bool, &'static str> {
        match self.eval(point)? {
            Value::Bool(value) => Ok(value),
            Value::Num(_) => Err("expected a boolean, found a number"),
        }
    }

    fn max_axis(&self) -> Option<Axis> {
        let max = |a: Option<Axis>, b: Option<Axis>| match (a, b) {
            (Some(a), Some(b)) => Some(if a.index() >= b.index() { a } else { b }),
            (a, None) => a,
            (None, b) => b,
        };
        match self {
            Self::Num(_) | Self::Bool(_) => None,
            Self::Var(axis) => Some(*axis),
            Self::Neg(inner) | Self::Not(inner) | Self::Call(_, inner) => inner.max_axis(),
            Self::Arith(_, lhs, rhs) | Self::And(lhs, rhs) | Self::Or(lhs, rhs) => {
                max(lhs.max_axis(), rhs.max_axis())
            }
            Self::Compare(first, links) => links
                .iter()
                .fold(first.max_axis(), |acc, (_, expr)| max(acc, expr.max_axis())),
        }
    }
}

/// A parsed coordinate predicate.
///
/// # Example
///
/// ```
/// use mesh_region::Predicate;
/// use mesh_types::Point3;
///
/// let pred = Predicate::parse("(x < 0.5) & (y > -1)").unwrap();
/// let coors = [Point3::new(0.0, 0.0, 0.0), Point3::new(1.0, 0.0, 0.0)];
/// assert_eq!(pred.select(&coors, 2).unwrap(), vec![0]);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Predicate {
    text: String,
    expr: Expr,
}

impl Predicate {
    /// Parse a predicate.
    ///
    /// # Errors
    ///
    /// Returns [`RegionError::Syntax`] with a position relative to `text`.
    pub fn parse(text: &str) -> RegionResult<Self> {
        let mut lexer = PredToken::lexer(text);
        let mut tokens = Vec::new();
        while let Some(token) = lexer.next() {
            let Ok(token) = token else {
                return Err(syntax(text, lexer.span().start, lexer.slice(), "unexpected character"));
            };
            tokens.push((token, lexer.slice(), lexer.span().start));
        }

        let mut parser = PredParser {
            text,
            tokens,
            pos: 0,
            depth: 0,
        };
        let expr = parser.or_expr()?;
        if let Some(&(_, fragment, offset)) = parser.tokens.get(parser.pos) {
            return Err(syntax(text, offset, fragment, "unexpected token after predicate"));
        }
        Ok(Self {
            text: text.trim().to_string(),
            expr,
        })
    }

    /// Source text of the predicate.
    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Expression tree.
    #[must_use]
    pub fn expr(&self) -> &Expr {
        &self.expr
    }

    /// Indices of the points satisfying the predicate.
    ///
    /// # Errors
    ///
    /// Returns [`RegionError::Predicate`] if the expression uses a coordinate
    /// beyond `dim`, mixes numbers and booleans, or is not boolean.
    pub fn select(&self, coors: &[Point3<f64>], dim: usize) -> RegionResult<Vec<u32>> {
        if let Some(axis) = self.expr.max_axis().filter(|axis| axis.index() >= dim) {
            return Err(self.error(&format!(
                "coordinate '{}' is not defined in {dim}D",
                axis.name()
            )));
        }

        let mut out = Vec::new();
        for (point, index) in coors.iter().zip(0u32..) {
            if self.expr.boolean(point).map_err(|reason| self.error(reason))? {
                out.push(index);
            }
        }
        Ok(out)
    }

    fn error(&self, reason: &str) -> RegionError {
        RegionError::Predicate {
            expression: self.text.clone(),
            reason: reason.to_string(),
        }
    }
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

fn syntax(text: &str, position: usize, fragment: &str, message: &str) -> RegionError {
    RegionError::Syntax {
        message: message.to_string(),
        fragment: fragment.to_string(),
        position,
        text: text.to_string(),
    }
}

struct PredParser<'a> {
    text: &'a str,
    tokens: Vec<(PredToken, &'a str, usize)>,
    pos: usize,
    /// Depth of the expression tree under construction.
    depth: usize,
}

impl<'a> PredParser<'a> {
    fn peek(&self) -> Option<PredToken> {
        self.tokens.get(self.pos).map(|&(token, _, _)| token)
    }

    fn eat(&mut self, token: PredToken) -> bool {
        if self.peek() == Some(token) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn error(&self, message: &str) -> RegionError {
        match self.tokens.get(self.pos) {
            Some(&(_, fragment, offset)) => syntax(self.text, offset, fragment, message),
            None => syntax(self.text, self.text.len(), "end of input", message),
        }
    }

    /// Descend one level; the matching `depth -= n` follows on success.
    fn enter(&mut self) -> RegionResult<()> {
        self.depth += 1;
        if self.depth > MAX_NESTING {
            return Err(self.error("expression nested too deeply"));
        }
        Ok(())
    }

    fn or_expr(&mut self) -> RegionResult<Expr> {
        let mut lhs = self.and_expr()?;
        let mut chained = 0;
        while self.eat(PredToken::Or) {
            self.enter()?;
            chained += 1;
            let rhs = self.and_expr()?;
            lhs = Expr::Or(Box::new(lhs), Box::new(rhs));
        }
        self.depth -= chained;
        Ok(lhs)
    }

    fn and_expr(&mut self) -> RegionResult<Expr> {
        let mut lhs = self.not_expr()?;
        let mut chained = 0;
        while self.eat(PredToken::And) {
            self.enter()?;
            chained += 1;
            let rhs = self.not_expr()?;
            lhs = Expr::And(Box::new(lhs), Box::new(rhs));
        }
        self.depth -= chained;
        Ok(lhs)
    }

    fn not_expr(&mut self) -> RegionResult<Expr> {
        if self.eat(PredToken::Not) {
            self.enter()?;
            let inner = self.not_expr()?;
            self.depth -= 1;
            return Ok(Expr::Not(Box::new(inner)));
        }
        self.comparison()
    }

    fn comparison(&mut self) -> RegionResult<Expr> {
        let first = self.additive()?;
        let mut links = Vec::new();
        loop {
            let op = match self.peek() {
                Some(PredToken::Lt) => CmpOp::Lt,
                Some(PredToken::Le) => CmpOp::Le,
                Some(PredToken::Gt) => CmpOp::Gt,
                Some(PredToken::Ge) => CmpOp::Ge,
                Some(PredToken::Eq) => CmpOp::Eq,
                Some(PredToken::Ne) => CmpOp::Ne,
                _ => break,
            };
            self.pos += 1;
            links.push((op, self.additive()?));
        }
        if links.is_empty() {
            Ok(first)
        } else {
            Ok(Expr::Compare(Box::new(first), links))
        }
    }

    fn additive(&mut self) -> RegionResult<Expr> {
        let mut lhs = self.multiplicative()?;
        let mut chained = 0;
        loop {
            let op = match self.peek() {
                Some(PredToken::Plus) => ArithOp::Add,
                Some(PredToken::Minus) => ArithOp::Sub,
                _ => {
                    self.depth -= chained;
                    return Ok(lhs);
                }
            };
            self.pos += 1;
            self.enter()?;
            chained += 1;
            let rhs = self.multiplicative()?;
            lhs = Expr::Arith(op, Box::new(lhs), Box::new(rhs));
        }
    }

    fn multiplicative(&mut self) -> RegionResult<Expr> {
        let mut lhs = self.unary()?;
        let mut chained = 0;
        loop {
            let op = match self.peek() {
                Some(PredToken::Star) => ArithOp::Mul,
                Some(PredToken::Slash) => ArithOp::Div,
                _ => {
                    self.depth -= chained;
                    return Ok(lhs);
                }
            };
            self.pos += 1;
            self.enter()?;
            chained += 1;
            let rhs = self.unary()?;
            lhs = Expr::Arith(op, Box::new(lhs), Box::new(rhs));
        }
    }

    fn unary(&mut self) -> RegionResult<Expr> {
        let negate = match self.peek() {
            Some(PredToken::Minus) => true,
            Some(PredToken::Plus) => false,
            _ => return self.power(),
        };
        self.pos += 1;
        self.enter()?;
        let operand = self.unary()?;
        self.depth -= 1;
        Ok(if negate { Expr::Neg(Box::new(operand)) } else { operand })
    }

    fn power(&mut self) -> RegionResult<Expr> {
        let base = self.atom()?;
        if self.eat(PredToken::Pow) {
            // -x**2 is -(x**2); 2**-1 is allowed.
            self.enter()?;
            let exponent = self.unary()?;
            self.depth -= 1;
            return Ok(Expr::Arith(ArithOp::Pow, Box::new(base), Box::new(exponent)));
        }
        Ok(base)
    }

    fn atom(&mut self) -> RegionResult<Expr> {
        let Some(&(token, text, _)) = self.tokens.get(self.pos) else {
            return Err(self.error("expected an expression"));
        };
        match token {
            PredToken::Number => {
                let value = text
                    .parse::<f64>()
                    .map_err(|_| self.error("invalid number"))?;
                self.pos += 1;
                Ok(Expr::Num(value))
            }
            PredToken::True => {
                self.pos += 1;
                Ok(Expr::Bool(true))
            }
            PredToken::False => {
                self.pos += 1;
                Ok(Expr::Bool(false))
            }
            PredToken::LParen => {
                self.pos += 1;
                self.enter()?;
                let inner = self.or_expr()?;
                if !self.eat(PredToken::RParen) {
                    return Err(self.error("expected ')'"));
                }
                self.depth -= 1;
                Ok(inner)
            }
            PredToken::Ident => self.name(text),
            _ => Err(self.error("expected an expression")),
        }
    }

    fn name(&mut self, name: &str) -> RegionResult<Expr> {
        let axis = match name {
            "x" => Some(Axis::X),
            "y" => Some(Axis::Y),
            "z" => Some(Axis::Z),
            _ => None,
        };
        if let Some(axis) = axis {
            self.pos += 1;
            return Ok(Expr::Var(axis));
        }
        if name == "pi" {
            self.pos += 1;
            return Ok(Expr::Num(std::f64::consts::PI));
        }
        let Some(func) = MathFn::from_name(name) else {
            return Err(self.error("unknown name"));
        };
        self.pos += 1;
        if !self.eat(PredToken::LParen) {
            return Err(self.error("expected '(' after function name"));
        }
        self.enter()?;
        let arg = self.or_expr()?;
        if !self.eat(PredToken::RParen) {
            return Err(self.error("expected ')'"));
        }
        self.depth -= 1;
        Ok(Expr::Call(func, Box::new(arg)))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn square() -> Vec<Point3<f64>> {
        vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
            Point3::new(1.0, 1.0, 0.0),
        ]
    }

    fn select(text: &str) -> Vec<u32> {
        Predicate::parse(text).unwrap().select(&square(), 2).unwrap()
    }

    #[test]
    fn test_simple_comparison() {
        assert_eq!(select("(x < 0.5)"), vec![0, 2]);
        assert_eq!(select("x >= 0.5"), vec![1, 3]);
    }

    #[test]
    fn test_connectives() {
        assert_eq!(select("(x < 0.5) & (y > 0.5)"), vec![2]);
        assert_eq!(select("(x < 0.5) | (y > 0.5)"), vec![0, 2, 3]);
        assert_eq!(select("~(x < 0.5)"), vec![1, 3]);
        assert_eq!(select("not x < 0.5 and y < 0.5"), vec![1]);
    }

    #[test]
    fn test_arithmetic_and_functions() {
        assert_eq!(select("(sqrt(x**2 + y**2) > 1.1)"), vec![3]);
        assert_eq!(select("(-x**2 == -1)"), vec![1, 3]);
        assert_eq!(select("(x + y * 2 == 2)"), vec![2]);
        assert_eq!(select("(abs(x - y) < 1e-9)"), vec![0, 3]);
    }

    #[test]
    fn test_chained_comparison() {
        assert_eq!(select("(-0.1 < x < 0.1)"), vec![0, 2]);
    }

    #[test]
    fn test_z_in_2d_is_an_error() {
        let pred = Predicate::parse("(z > 0)").unwrap();
        assert!(matches!(
            pred.select(&square(), 2),
            Err(RegionError::Predicate { .. })
        ));
        assert!(pred.select(&square(), 3).unwrap().is_empty());
    }

    #[test]
    fn test_type_errors() {
        let pred = Predicate::parse("(x + 1)").unwrap();
        assert!(matches!(
            pred.select(&square(), 2),
            Err(RegionError::Predicate { .. })
        ));
        let pred = Predicate::parse("((x < 1) + 1 > 0)").unwrap();
        assert!(pred.select(&square(), 2).is_err());
    }

    #[test]
    fn test_syntax_errors() {
        assert!(matches!(
            Predicate::parse("(x < )"),
            Err(RegionError::Syntax { position: 5, .. })
        ));
        assert!(matches!(
            Predicate::parse("(w < 1)"),
            Err(RegionError::Syntax { .. })
        ));
        assert!(Predicate::parse("(x < 1").is_err());
        assert!(Predicate::parse("(x < 1))").is_err());
    }

    #[test]
    fn test_parse_is_deterministic() {
        let a = Predicate::parse("(x < 0.5) & (y > 0.1)").unwrap();
        let b = Predicate::parse("(x < 0.5) & (y > 0.1)").unwrap();
        assert_eq!(a, b);
        assert_eq!(a.text(), "(x < 0.5) & (y > 0.1)");
    }

    #[test]
    fn test_nesting_limit() {
        let parens = |n: usize| format!("{}x < 1{}", "(".repeat(n), ")".repeat(n));
        assert!(Predicate::parse(&parens(32)).is_ok());
        assert!(matches!(
            Predicate::parse(&parens(10_000)),
            Err(RegionError::Syntax { ref message, .. }) if message.contains("too deeply")
        ));

        let negations = format!("{}x < 1", "~".repeat(10_000));
        assert!(Predicate::parse(&negations).is_err());
        let signs = format!("{}x < 1", "-".repeat(10_000));
        assert!(Predicate::parse(&signs).is_err());
        let chain = format!("{} < 1", vec!["x"; 10_000].join(" + "));
        assert!(Predicate::parse(&chain).is_err());
        let short_chain = format!("{} < 1", vec!["x"; 8].join(" + "));
        assert_eq!(select(&short_chain), vec![0, 2]);
    }
}
