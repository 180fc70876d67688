//! Logos-based lexer for the selection language.
//!
//! Coordinate predicates are only delimited here (by their parentheses); their
//! contents are tokenized again by [`crate::predicate`].

use logos::Logos;

use crate::error::{RegionError, RegionResult};

/// A token with its kind, text, and byte offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token<'a> {
    /// Token kind.
    pub kind: TokenKind,
    /// Source text of the token.
    pub text: &'a str,
    /// Byte offset in the selection text.
    pub offset: usize,
}

/// Selection-language token kinds.
#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[logos(skip r"[ \t\r\n]+")]
pub enum TokenKind {
    // =========================================================================
    // KEYWORDS
    // =========================================================================
    /// `all`
    #[token("all")]
    All,
    /// `copy`
    #[token("copy")]
    Copy,
    /// `vertex`
    #[token("vertex")]
    Vertex,
    /// `vertices`
    #[token("vertices")]
    Vertices,
    /// `cell`, `element`
    #[token("cell")]
    #[token("element")]
    Cell,
    /// `cells`, `elements`
    #[token("cells")]
    #[token("elements")]
    Cells,
    /// `in`
    #[token("in")]
    In,
    /// `of`
    #[token("of")]
    Of,
    /// `by`
    #[token("by")]
    By,
    /// `surface`
    #[token("surface")]
    Surface,
    /// `group`
    #[token("group")]
    Group,
    /// `set`
    #[token("set")]
    Set,

    // =========================================================================
    // NAMES AND LITERALS
    // =========================================================================
    /// `r.<name>`
    #[regex(r"r\.[A-Za-z_][A-Za-z0-9_]*")]
    RegionRef,
    /// Identifier.
    #[regex(r"[A-Za-z_][A-Za-z0-9_]*")]
    Ident,
    /// Unsigned integer.
    #[regex(r"[0-9]+")]
    Int,
    /// Floating point literal, only meaningful inside predicates.
    #[regex(r"([0-9]+\.[0-9]*|\.[0-9]+)([eE][+-]?[0-9]+)?|[0-9]+[eE][+-]?[0-9]+")]
    Float,

    // =========================================================================
    // OPERATORS
    // =========================================================================
    /// Sign followed by a letter, e.g. `+v`, `*c`; the letter must be a kind code.
    #[regex(r"[-+*][A-Za-z]")]
    SetOp,
    /// `+`
    #[token("+")]
    Plus,
    /// `-`
    #[token("-")]
    Minus,
    /// `*`
    #[token("*")]
    Star,
    /// Arithmetic and comparison symbols, only meaningful inside predicates.
    #[regex(r"[<>]=?|==|!=|/|\*\*")]
    Symbol,
    /// `&`
    #[token("&")]
    Amp,
    /// `|`
    #[token("|")]
    Pipe,
    /// `~`
    #[token("~")]
    Tilde,

    // =========================================================================
    // PUNCTUATION
    // =========================================================================
    /// `(`
    #[token("(")]
    LParen,
    /// `)`
    #[token(")")]
    RParen,
    /// `[`
    #[token("[")]
    LBracket,
    /// `]`
    #[token("]")]
    RBracket,
    /// `,`
    #[token(",")]
    Comma,
}

impl TokenKind {
    /// Check if the token is a word that may also serve as a name.
    #[must_use]
    pub fn is_word(self) -> bool {
        matches!(
            self,
            Self::All
                | Self::Copy
                | Self::Vertex
                | Self::Vertices
                | Self::Cell
                | Self::Cells
                | Self::In
                | Self::Of
                | Self::By
                | Self::Surface
                | Self::Group
                | Self::Set
                | Self::Ident
        )
    }
}

/// Tokenize a selection text.
///
/// # Errors
///
/// Returns [`RegionError::Syntax`] at the first character no token matches.
///
/// # Example
///
/// ```
/// use mesh_region::lexer::{tokenize, TokenKind};
///
/// let tokens = tokenize("r.Omega -v vertex 3").unwrap();
/// let kinds: Vec<TokenKind> = tokens.iter().map(|t| t.kind).collect();
/// assert_eq!(
///     kinds,
///     vec![TokenKind::RegionRef, TokenKind::SetOp, TokenKind::Vertex, TokenKind::Int]
/// );
/// ```
pub fn tokenize(text: &str) -> RegionResult<Vec<Token<'_>>> {
    let mut lexer = TokenKind::lexer(text);
    let mut tokens = Vec::new();
    while let Some(kind) = lexer.next() {
        let span = lexer.span();
        let Ok(kind) = kind else {
            return Err(RegionError::Syntax {
                message: "unexpected character".to_string(),
                fragment: lexer.slice().to_string(),
                position: span.start,
                text: text.to_string(),
            });
        };
        tokens.push(Token {
            kind,
            text: lexer.slice(),
            offset: span.start,
        });
    }
    Ok(tokens)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn kinds(text: &str) -> Vec<TokenKind> {
        tokenize(text).unwrap().iter().map(|t| t.kind).collect()
    }

    #[test]
    fn test_lex_keywords_and_synonyms() {
        assert_eq!(
            kinds("elements of group 3"),
            vec![TokenKind::Cells, TokenKind::Of, TokenKind::Group, TokenKind::Int]
        );
        assert_eq!(kinds("element 1"), kinds("cell 1"));
    }

    #[test]
    fn test_lex_region_refs() {
        let tokens = tokenize("copy r.Gamma_1").unwrap();
        assert_eq!(tokens[1].kind, TokenKind::RegionRef);
        assert_eq!(tokens[1].text, "r.Gamma_1");
        assert_eq!(tokens[1].offset, 5);
        // A plain `r` is an identifier.
        assert_eq!(kinds("r"), vec![TokenKind::Ident]);
    }

    #[test]
    fn test_lex_operators() {
        assert_eq!(
            kinds("+ - * +s *c"),
            vec![
                TokenKind::Plus,
                TokenKind::Minus,
                TokenKind::Star,
                TokenKind::SetOp,
                TokenKind::SetOp
            ]
        );
    }

    #[test]
    fn test_lex_predicate_symbols() {
        assert_eq!(
            kinds("(x <= 0.5e-1)"),
            vec![
                TokenKind::LParen,
                TokenKind::Ident,
                TokenKind::Symbol,
                TokenKind::Float,
                TokenKind::RParen
            ]
        );
    }

    #[test]
    fn test_lex_error_position() {
        let err = tokenize("vertex 1 # 2").unwrap_err();
        assert!(matches!(err, RegionError::Syntax { position: 9, .. }));
    }
}
