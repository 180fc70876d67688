//! Selection-language parser.
//!
//! A hand-written recursive-descent parser over the tokens of
//! [`crate::lexer`]. The output is a postfix stack: leaves in the order they
//! appear, each binary operator emitted right after its second operand.
//! Operators are left associative and share one precedence level, so
//! `a -v b +v c` is `(a -v b) +v c`.
//!
//! ```text
//! expr  := term (SETOP term)*
//! term  := '(' expr ')' | leaf
//! leaf  := 'all'
//!        | 'r.' NAME | 'copy' 'r.' NAME
//!        | VERTICES 'in' ( '[' INT (','? INT)* ']' | predicate )
//!        | 'vertex' 'in' 'r.' NAME
//!        | VERTICES 'of' ( 'surface' | 'group' '-'? INT | 'set' NAME )
//!        | VERTICES 'by' NAME
//!        | VERTICES INT (','? INT)*
//!        | CELLS 'by' NAME
//!        | CELLS 'of' ( 'group' '-'? INT | 'set' NAME )
//!        | CELLS '(' INT ',' INT ')' (','? '(' INT ',' INT ')')*
//!        | CELLS INT (','? INT)*
//! predicate := NOT? '(' ... ')' (( '&' | '|' | 'and' | 'or' ) NOT? '(' ... ')')*
//! NOT       := '~' | 'not'
//! ```
//!
//! `VERTICES` is `vertex` or `vertices`; `CELLS` is any of `cell`, `cells`,
//! `element`, `elements`. `SETOP` is `+`, `-`, `*` optionally followed by a
//! kind code `v`, `e`, `f`, `s` or `c`; a bare sign targets vertices.
//! Parentheses nest at most 64 deep.

use std::fmt;

use crate::error::{RegionError, RegionResult};
use crate::kind::{EntityKind, SetOp, SetOperator};
use crate::lexer::{tokenize, Token, TokenKind};
use crate::predicate::Predicate;

/// Deepest parenthesis nesting accepted by the selection and predicate parsers.
pub(crate) const MAX_NESTING: usize = 64;

/// A leaf of a selection expression.
#[derive(Debug, Clone, PartialEq)]
pub enum Leaf {
    /// `all`
    All,
    /// `r.<name>`, the materialized region itself.
    RegionRef(String),
    /// `copy r.<name>`, an independent duplicate.
    RegionCopy(String),
    /// `vertices of surface`
    Surface,
    /// `vertices in (<predicate>)`
    VerticesIn(Predicate),
    /// `vertices in [i, j, ...]`
    VerticesInList(Vec<i64>),
    /// `vertices by <function>`
    VerticesBy(String),
    /// `cells by <function>`
    CellsBy(String),
    /// `cells of group <mat_id>`
    CellsOfGroup(i64),
    /// `cells of set <name>`
    CellsOfSet(String),
    /// `vertices of group <tag>`
    VerticesOfGroup(i64),
    /// `vertices of set <name>`
    VerticesOfSet(String),
    /// `vertex in r.<name>`, the first vertex of a region.
    VertexOfRegion(String),
    /// `vertices i j ...`
    Vertices(Vec<i64>),
    /// `cells i j ...`, global cell indices.
    Cells(Vec<i64>),
    /// `cells (ig, iel) ...`, group-local cell indices.
    GroupCells(Vec<(i64, i64)>),
}

impl Leaf {
    /// Name of the region this leaf reads, if any.
    #[must_use]
    pub fn reference(&self) -> Option<&str> {
        match self {
            Self::RegionRef(name) | Self::RegionCopy(name) | Self::VertexOfRegion(name) => {
                Some(name)
            }
            _ => None,
        }
    }
}

fn write_list<T: fmt::Display>(f: &mut fmt::Formatter<'_>, items: &[T]) -> fmt::Result {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        write!(f, "{item}")?;
    }
    Ok(())
}

impl fmt::Display for Leaf {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::All => f.write_str("all"),
            Self::RegionRef(name) => write!(f, "r.{name}"),
            Self::RegionCopy(name) => write!(f, "copy r.{name}"),
            Self::Surface => f.write_str("vertices of surface"),
            Self::VerticesIn(pred) => write!(f, "vertices in {pred}"),
            Self::VerticesInList(list) => {
                f.write_str("vertices in [")?;
                write_list(f, list)?;
                f.write_str("]")
            }
            Self::VerticesBy(name) => write!(f, "vertices by {name}"),
            Self::CellsBy(name) => write!(f, "cells by {name}"),
            Self::CellsOfGroup(id) => write!(f, "cells of group {id}"),
            Self::CellsOfSet(name) => write!(f, "cells of set {name}"),
            Self::VerticesOfGroup(id) => write!(f, "vertices of group {id}"),
            Self::VerticesOfSet(name) => write!(f, "vertices of set {name}"),
            Self::VertexOfRegion(name) => write!(f, "vertex in r.{name}"),
            Self::Vertices(list) => {
                f.write_str("vertices ")?;
                write_list(f, list)
            }
            Self::Cells(list) => {
                f.write_str("cells ")?;
                write_list(f, list)
            }
            Self::GroupCells(pairs) => {
                f.write_str("cells ")?;
                for (i, (ig, iel)) in pairs.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "({ig}, {iel})")?;
                }
                Ok(())
            }
        }
    }
}

/// One entry of a postfix stack.
#[derive(Debug, Clone, PartialEq)]
pub enum StackOp {
    /// Push the region of a leaf.
    Leaf(Leaf),
    /// Pop two regions, push their combination.
    Op(SetOperator),
}

/// Parse a selection text into a postfix stack.
///
/// # Errors
///
/// Returns [`RegionError::Syntax`] with the offending fragment and its byte
/// position for malformed text.
///
/// # Example
///
/// ```
/// use mesh_region::{parse, EntityKind, Leaf, SetOp, SetOperator, StackOp};
///
/// let stack = parse("r.Omega -s vertices of surface").unwrap();
/// assert_eq!(
///     stack,
///     vec![
///         StackOp::Leaf(Leaf::RegionRef("Omega".to_string())),
///         StackOp::Leaf(Leaf::Surface),
///         StackOp::Op(SetOperator::new(SetOp::Subtract, EntityKind::Facet)),
///     ]
/// );
/// ```
pub fn parse(text: &str) -> RegionResult<Vec<StackOp>> {
    let tokens = tokenize(text)?;
    let mut parser = Parser {
        text,
        tokens,
        pos: 0,
        depth: 0,
        out: Vec::new(),
    };
    parser.expr()?;
    if parser.pos < parser.tokens.len() {
        return Err(parser.error("expected a set operator"));
    }
    Ok(parser.out)
}

/// Names of the regions a stack reads, in order of first use.
#[must_use]
pub fn references(stack: &[StackOp]) -> Vec<&str> {
    let mut out: Vec<&str> = Vec::new();
    let names = stack.iter().filter_map(|op| match op {
        StackOp::Leaf(leaf) => leaf.reference(),
        StackOp::Op(_) => None,
    });
    for name in names {
        if !out.contains(&name) {
            out.push(name);
        }
    }
    out
}

struct Parser<'a> {
    text: &'a str,
    tokens: Vec<Token<'a>>,
    pos: usize,
    depth: usize,
    out: Vec<StackOp>,
}

impl<'a> Parser<'a> {
    fn peek(&self) -> Option<TokenKind> {
        self.tokens.get(self.pos).map(|t| t.kind)
    }

    fn peek_at(&self, ahead: usize) -> Option<TokenKind> {
        self.tokens.get(self.pos + ahead).map(|t| t.kind)
    }

    /// Consume an identifier spelled `word`.
    fn eat_word(&mut self, word: &str) -> bool {
        match self.tokens.get(self.pos) {
            Some(token) if token.kind == TokenKind::Ident && token.text == word => {
                self.pos += 1;
                true
            }
            _ => false,
        }
    }

    fn eat(&mut self, kind: TokenKind) -> bool {
        if self.peek() == Some(kind) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect(&mut self, kind: TokenKind, what: &str) -> RegionResult<Token<'a>> {
        match self.tokens.get(self.pos) {
            Some(&token) if token.kind == kind => {
                self.pos += 1;
                Ok(token)
            }
            _ => Err(self.error(&format!("expected {what}"))),
        }
    }

    fn error(&self, message: &str) -> RegionError {
        match self.tokens.get(self.pos) {
            Some(token) => RegionError::Syntax {
                message: message.to_string(),
                fragment: token.text.to_string(),
                position: token.offset,
                text: self.text.to_string(),
            },
            None => RegionError::Syntax {
                message: message.to_string(),
                fragment: "end of input".to_string(),
                position: self.text.len(),
                text: self.text.to_string(),
            },
        }
    }

    fn set_operator(&self) -> RegionResult<Option<SetOperator>> {
        let Some(token) = self.tokens.get(self.pos) else {
            return Ok(None);
        };
        Ok(match token.kind {
            TokenKind::SetOp => Some(
                SetOperator::parse(token.text)
                    .ok_or_else(|| self.error("unknown set operator, expected one of v, e, f, s, c"))?,
            ),
            TokenKind::Plus => Some(SetOperator::new(SetOp::Add, EntityKind::Vertex)),
            TokenKind::Minus => Some(SetOperator::new(SetOp::Subtract, EntityKind::Vertex)),
            TokenKind::Star => Some(SetOperator::new(SetOp::Intersect, EntityKind::Vertex)),
            _ => None,
        })
    }

    fn expr(&mut self) -> RegionResult<()> {
        self.term()?;
        while let Some(operator) = self.set_operator()? {
            self.pos += 1;
            self.term()?;
            self.out.push(StackOp::Op(operator));
        }
        Ok(())
    }

    fn term(&mut self) -> RegionResult<()> {
        if self.peek() == Some(TokenKind::LParen) {
            if self.depth == MAX_NESTING {
                return Err(self.error("expression nested too deeply"));
            }
            self.pos += 1;
            self.depth += 1;
            self.expr()?;
            self.expect(TokenKind::RParen, "')'")?;
            self.depth -= 1;
            return Ok(());
        }
        let leaf = self.leaf()?;
        self.out.push(StackOp::Leaf(leaf));
        Ok(())
    }

    fn leaf(&mut self) -> RegionResult<Leaf> {
        let Some(token) = self.tokens.get(self.pos).copied() else {
            return Err(self.error("expected a region expression"));
        };
        match token.kind {
            TokenKind::All => {
                self.pos += 1;
                Ok(Leaf::All)
            }
            TokenKind::RegionRef => {
                self.pos += 1;
                Ok(Leaf::RegionRef(region_name(token)))
            }
            TokenKind::Copy => {
                self.pos += 1;
                let target = self.expect(TokenKind::RegionRef, "a region reference 'r.<name>'")?;
                Ok(Leaf::RegionCopy(region_name(target)))
            }
            TokenKind::Vertex | TokenKind::Vertices => {
                self.pos += 1;
                self.vertex_leaf(token.kind == TokenKind::Vertex)
            }
            TokenKind::Cell | TokenKind::Cells => {
                self.pos += 1;
                self.cell_leaf()
            }
            _ => Err(self.error("expected a region expression")),
        }
    }

    fn vertex_leaf(&mut self, singular: bool) -> RegionResult<Leaf> {
        match self.peek() {
            Some(TokenKind::In) => {
                self.pos += 1;
                match self.peek() {
                    Some(TokenKind::LBracket) => {
                        self.pos += 1;
                        let list = self.int_list()?;
                        self.expect(TokenKind::RBracket, "']'")?;
                        Ok(Leaf::VerticesInList(list))
                    }
                    Some(TokenKind::RegionRef) if singular => {
                        let target = self.expect(TokenKind::RegionRef, "a region reference")?;
                        Ok(Leaf::VertexOfRegion(region_name(target)))
                    }
                    Some(TokenKind::Ident) if self.tokens[self.pos].text == "not" => {
                        Ok(Leaf::VerticesIn(self.predicate()?))
                    }
                    Some(TokenKind::LParen | TokenKind::Tilde) => {
                        Ok(Leaf::VerticesIn(self.predicate()?))
                    }
                    _ => Err(self.error("expected '[', '(' or a region reference")),
                }
            }
            Some(TokenKind::Of) => {
                self.pos += 1;
                match self.peek() {
                    Some(TokenKind::Surface) => {
                        self.pos += 1;
                        Ok(Leaf::Surface)
                    }
                    Some(TokenKind::Group) => {
                        self.pos += 1;
                        Ok(Leaf::VerticesOfGroup(self.signed_int()?))
                    }
                    Some(TokenKind::Set) => {
                        self.pos += 1;
                        Ok(Leaf::VerticesOfSet(self.name()?))
                    }
                    _ => Err(self.error("expected 'surface', 'group' or 'set'")),
                }
            }
            Some(TokenKind::By) => {
                self.pos += 1;
                Ok(Leaf::VerticesBy(self.name()?))
            }
            Some(TokenKind::Int) => Ok(Leaf::Vertices(self.int_list()?)),
            _ => Err(self.error("expected 'in', 'of', 'by' or a vertex index")),
        }
    }

    fn cell_leaf(&mut self) -> RegionResult<Leaf> {
        match self.peek() {
            Some(TokenKind::By) => {
                self.pos += 1;
                Ok(Leaf::CellsBy(self.name()?))
            }
            Some(TokenKind::Of) => {
                self.pos += 1;
                match self.peek() {
                    Some(TokenKind::Group) => {
                        self.pos += 1;
                        Ok(Leaf::CellsOfGroup(self.signed_int()?))
                    }
                    Some(TokenKind::Set) => {
                        self.pos += 1;
                        Ok(Leaf::CellsOfSet(self.name()?))
                    }
                    _ => Err(self.error("expected 'group' or 'set'")),
                }
            }
            Some(TokenKind::LParen) => {
                let mut pairs = vec![self.pair()?];
                loop {
                    let comma = self.peek() == Some(TokenKind::Comma)
                        && self.peek_at(1) == Some(TokenKind::LParen);
                    if comma {
                        self.pos += 1;
                    } else if self.peek() != Some(TokenKind::LParen) {
                        break;
                    }
                    pairs.push(self.pair()?);
                }
                Ok(Leaf::GroupCells(pairs))
            }
            Some(TokenKind::Int) => Ok(Leaf::Cells(self.int_list()?)),
            _ => Err(self.error("expected 'by', 'of', '(' or a cell index")),
        }
    }

    fn pair(&mut self) -> RegionResult<(i64, i64)> {
        self.expect(TokenKind::LParen, "'('")?;
        let ig = self.int()?;
        self.expect(TokenKind::Comma, "','")?;
        let iel = self.int()?;
        self.expect(TokenKind::RParen, "')'")?;
        Ok((ig, iel))
    }

    fn int(&mut self) -> RegionResult<i64> {
        let token = self.expect(TokenKind::Int, "an integer")?;
        token.text.parse::<i64>().map_err(|_| RegionError::Syntax {
            message: "integer out of range".to_string(),
            fragment: token.text.to_string(),
            position: token.offset,
            text: self.text.to_string(),
        })
    }

    fn signed_int(&mut self) -> RegionResult<i64> {
        let negative = self.eat(TokenKind::Minus);
        let value = self.int()?;
        Ok(if negative { -value } else { value })
    }

    /// One or more integers, optionally separated by commas.
    fn int_list(&mut self) -> RegionResult<Vec<i64>> {
        let mut list = vec![self.int()?];
        loop {
            let comma = self.peek() == Some(TokenKind::Comma)
                && self.peek_at(1) == Some(TokenKind::Int);
            if comma {
                self.pos += 1;
            } else if self.peek() != Some(TokenKind::Int) {
                return Ok(list);
            }
            list.push(self.int()?);
        }
    }

    fn name(&mut self) -> RegionResult<String> {
        match self.tokens.get(self.pos) {
            Some(token) if token.kind.is_word() => {
                self.pos += 1;
                Ok(token.text.to_string())
            }
            _ => Err(self.error("expected a name")),
        }
    }

    /// Delimit a predicate by its parentheses and parse its source text.
    fn predicate(&mut self) -> RegionResult<Predicate> {
        let start = self.pos;
        loop {
            if !self.eat(TokenKind::Tilde) {
                self.eat_word("not");
            }
            if self.peek() != Some(TokenKind::LParen) {
                return Err(self.error("expected '('"));
            }
            let mut depth = 0usize;
            loop {
                match self.peek() {
                    Some(TokenKind::LParen) => depth += 1,
                    Some(TokenKind::RParen) => depth -= 1,
                    Some(_) => {}
                    None => return Err(self.error("unbalanced parentheses")),
                }
                self.pos += 1;
                if depth == 0 {
                    break;
                }
            }
            let joined = self.eat(TokenKind::Amp)
                || self.eat(TokenKind::Pipe)
                || self.eat_word("and")
                || self.eat_word("or");
            if !joined {
                break;
            }
        }

        let begin = self.tokens[start].offset;
        let last = self.tokens[self.pos - 1];
        let end = last.offset + last.text.len();
        Predicate::parse(&self.text[begin..end]).map_err(|err| match err {
            RegionError::Syntax {
                message,
                fragment,
                position,
                ..
            } => RegionError::Syntax {
                message,
                fragment,
                position: begin + position,
                text: self.text.to_string(),
            },
            other => other,
        })
    }
}

fn region_name(token: Token<'_>) -> String {
    token.text.trim_start_matches("r.").to_string()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn leaf(text: &str) -> Leaf {
        match parse(text).unwrap().as_slice() {
            [StackOp::Leaf(leaf)] => leaf.clone(),
            other => panic!("expected a single leaf, got {other:?}"),
        }
    }

    fn op(sign: char, code: char) -> StackOp {
        StackOp::Op(SetOperator::new(
            SetOp::from_sign(sign).unwrap(),
            EntityKind::from_code(code).unwrap(),
        ))
    }

    #[test]
    fn test_parse_leaves() {
        assert_eq!(leaf("all"), Leaf::All);
        assert_eq!(leaf("r.Omega"), Leaf::RegionRef("Omega".to_string()));
        assert_eq!(leaf("copy r.Omega"), Leaf::RegionCopy("Omega".to_string()));
        assert_eq!(leaf("vertices of surface"), Leaf::Surface);
        assert_eq!(leaf("vertices in [3, 1 2]"), Leaf::VerticesInList(vec![3, 1, 2]));
        assert_eq!(leaf("vertices by get_left"), Leaf::VerticesBy("get_left".to_string()));
        assert_eq!(leaf("elements by get_cells"), Leaf::CellsBy("get_cells".to_string()));
        assert_eq!(leaf("elements of group 2"), Leaf::CellsOfGroup(2));
        assert_eq!(leaf("cells of set Inner"), Leaf::CellsOfSet("Inner".to_string()));
        assert_eq!(leaf("vertices of group -1"), Leaf::VerticesOfGroup(-1));
        assert_eq!(leaf("vertices of set Gamma"), Leaf::VerticesOfSet("Gamma".to_string()));
        assert_eq!(leaf("vertex in r.Top"), Leaf::VertexOfRegion("Top".to_string()));
        assert_eq!(leaf("vertex 0 1, 2"), Leaf::Vertices(vec![0, 1, 2]));
        assert_eq!(leaf("element 4, 5"), Leaf::Cells(vec![4, 5]));
        assert_eq!(leaf("cell (0, 1), (1, 0) (1, 2)"), Leaf::GroupCells(vec![(0, 1), (1, 0), (1, 2)]));
    }

    #[test]
    fn test_parse_predicate_leaf() {
        let Leaf::VerticesIn(pred) = leaf("vertices in (x < 0.5) & ~(y > -sqrt(2))") else {
            panic!("expected a predicate leaf");
        };
        assert_eq!(pred.text(), "(x < 0.5) & ~(y > -sqrt(2))");
    }

    #[test]
    fn test_parse_postfix_order() {
        let stack = parse("r.A -v r.B +c r.C").unwrap();
        assert_eq!(
            stack,
            vec![
                StackOp::Leaf(Leaf::RegionRef("A".to_string())),
                StackOp::Leaf(Leaf::RegionRef("B".to_string())),
                op('-', 'v'),
                StackOp::Leaf(Leaf::RegionRef("C".to_string())),
                op('+', 'c'),
            ]
        );

        let stack = parse("r.A -v (r.B *s r.C)").unwrap();
        assert_eq!(stack[3], op('*', 's'));
        assert_eq!(stack[4], op('-', 'v'));
    }

    #[test]
    fn test_bare_sign_targets_vertices() {
        let stack = parse("vertex 1 + vertex 2").unwrap();
        assert_eq!(stack[2], op('+', 'v'));
        let stack = parse("(vertex 1) * (vertex 2)").unwrap();
        assert_eq!(stack[2], op('*', 'v'));
    }

    #[test]
    fn test_syntax_errors() {
        let err = parse("vertices of nothing").unwrap_err();
        assert!(matches!(
            err,
            RegionError::Syntax { ref fragment, position: 12, .. } if fragment == "nothing"
        ));

        assert!(parse("").is_err());
        assert!(parse("r.A +v").is_err());
        assert!(parse("(r.A").is_err());
        assert!(parse("r.A r.B").is_err());
        assert!(parse("copy all").is_err());
        assert!(parse("vertices in (x < 1").is_err());

        let err = parse("r.A +x r.B").unwrap_err();
        assert!(matches!(
            err,
            RegionError::Syntax { ref fragment, position: 4, .. } if fragment == "+x"
        ));
    }

    #[test]
    fn test_predicate_error_position_is_absolute() {
        let err = parse("vertices in (x < )").unwrap_err();
        assert!(matches!(err, RegionError::Syntax { position: 17, .. }));
    }

    #[test]
    fn test_references_from_stack() {
        let stack = parse("r.A +v copy r.B -v (vertex in r.A *v vertex 3)").unwrap();
        assert_eq!(references(&stack), vec!["A", "B"]);

        // Look-alikes inside other leaves are not references.
        let stack = parse("vertices of set r_A").unwrap();
        assert!(references(&stack).is_empty());
    }

    #[test]
    fn test_parse_is_deterministic() {
        let text = "vertices in (x < 0.5) -c cells of group 1";
        assert_eq!(parse(text).unwrap(), parse(text).unwrap());
    }

    #[test]
    fn test_keyword_connectives_between_clauses() {
        let Leaf::VerticesIn(pred) = leaf("vertices in (x < 0.5) and not (y < 0.5) or (x > 2)") else {
            panic!("expected a predicate leaf");
        };
        assert_eq!(pred.text(), "(x < 0.5) and not (y < 0.5) or (x > 2)");

        let stack = parse("vertices in not (x < 0.5) +v r.A").unwrap();
        assert_eq!(stack.len(), 3);
    }

    #[test]
    fn test_deep_nesting_is_rejected() {
        let nested = |n: usize| format!("{}all{}", "(".repeat(n), ")".repeat(n));
        assert!(parse(&nested(MAX_NESTING)).is_ok());

        let err = parse(&nested(10_000)).unwrap_err();
        assert!(matches!(
            err,
            RegionError::Syntax { ref message, position, .. }
                if message.contains("too deeply") && position == MAX_NESTING
        ));

        let predicate = format!("vertices in {}x < 1{}", "(".repeat(10_000), ")".repeat(10_000));
        assert!(matches!(parse(&predicate), Err(RegionError::Syntax { .. })));
    }
}
