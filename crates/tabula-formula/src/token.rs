//! Formula tokens

use std::fmt;

/// Words recognized as keywords in script mode
pub const KEYWORDS: &[&str] = &["import", "use", "print", "save", "as"];

/// Kind of a lexed token
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    // === Structure ===
    /// End of input
    Eof,
    /// Line break (script mode only)
    Eol,
    /// `#` comment (script mode only)
    Comment,
    /// Unterminated literal or unrecognized character
    Illegal,

    // === Words and literals ===
    Keyword,
    Identifier,
    Number,
    /// Quoted text (`'...'` or `"..."`)
    Literal,

    // === Operators ===
    /// `=` in script mode
    Assign,
    Plus,
    Minus,
    Star,
    Slash,
    Caret,
    Ampersand,
    Equal,
    NotEqual,
    Less,
    LessEqual,
    Greater,
    GreaterEqual,

    // === Delimiters ===
    Comma,
    Dot,
    LeftParen,
    RightParen,
    LeftBrace,
    RightBrace,
    LeftBracket,
    RightBracket,
    /// Range marker `:`
    Colon,
    /// Sheet marker `!`
    Bang,
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TokenKind::Eof => "end of input",
            TokenKind::Eol => "end of line",
            TokenKind::Comment => "comment",
            TokenKind::Illegal => "illegal token",
            TokenKind::Keyword => "keyword",
            TokenKind::Identifier => "identifier",
            TokenKind::Number => "number",
            TokenKind::Literal => "literal",
            TokenKind::Assign => "'='",
            TokenKind::Plus => "'+'",
            TokenKind::Minus => "'-'",
            TokenKind::Star => "'*'",
            TokenKind::Slash => "'/'",
            TokenKind::Caret => "'^'",
            TokenKind::Ampersand => "'&'",
            TokenKind::Equal => "'='",
            TokenKind::NotEqual => "'<>'",
            TokenKind::Less => "'<'",
            TokenKind::LessEqual => "'<='",
            TokenKind::Greater => "'>'",
            TokenKind::GreaterEqual => "'>='",
            TokenKind::Comma => "','",
            TokenKind::Dot => "'.'",
            TokenKind::LeftParen => "'('",
            TokenKind::RightParen => "')'",
            TokenKind::LeftBrace => "'{'",
            TokenKind::RightBrace => "'}'",
            TokenKind::LeftBracket => "'['",
            TokenKind::RightBracket => "']'",
            TokenKind::Colon => "':'",
            TokenKind::Bang => "'!'",
        };
        f.write_str(s)
    }
}

/// A token with its source location (1-based line and column)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub literal: String,
    pub line: usize,
    pub column: usize,
}

impl Token {
    pub fn new<S: Into<String>>(kind: TokenKind, literal: S, line: usize, column: usize) -> Self {
        Self {
            kind,
            literal: literal.into(),
            line,
            column,
        }
    }

    /// Check the token kind
    pub fn is(&self, kind: TokenKind) -> bool {
        self.kind == kind
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            TokenKind::Keyword
            | TokenKind::Identifier
            | TokenKind::Number
            | TokenKind::Literal
            | TokenKind::Comment
            | TokenKind::Illegal => write!(f, "{} '{}'", self.kind, self.literal),
            _ => write!(f, "{}", self.kind),
        }
    }
}
