//! Formula lexer
//!
//! A single forward pass over the input characters. Failures never panic or
//! return `Err`: an unterminated literal or an unknown character becomes a
//! [`TokenKind::Illegal`] token that the parser reports as a syntax error.

use crate::token::{Token, TokenKind, KEYWORDS};

/// Lexing rules
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LexerMode {
    /// Spreadsheet formulas: line breaks are whitespace, `=` is equality
    #[default]
    Formula,
    /// Line-oriented scripts: line breaks and `#` comments are tokens,
    /// keywords are recognized, `=` assigns and `==` compares
    Script,
}

/// Formula lexer
pub struct Lexer {
    chars: Vec<char>,
    pos: usize,
    line: usize,
    column: usize,
    mode: LexerMode,
    finished: bool,
}

impl Lexer {
    /// Create a lexer in formula mode
    pub fn new(input: &str) -> Self {
        Self::with_mode(input, LexerMode::Formula)
    }

    /// Create a lexer with explicit rules
    pub fn with_mode(input: &str, mode: LexerMode) -> Self {
        Self {
            chars: input.chars().collect(),
            pos: 0,
            line: 1,
            column: 1,
            mode,
            finished: false,
        }
    }

    /// The lexing rules in effect
    pub fn mode(&self) -> LexerMode {
        self.mode
    }

    /// Scan the next token; returns [`TokenKind::Eof`] forever once input is exhausted
    pub fn next_token(&mut self) -> Token {
        self.skip_whitespace();

        let (line, column) = (self.line, self.column);
        let Some(c) = self.advance() else {
            return Token::new(TokenKind::Eof, "", line, column);
        };

        let token = |kind: TokenKind, literal: &str| Token::new(kind, literal, line, column);

        match c {
            '\n' => token(TokenKind::Eol, "\n"),
            '#' if self.mode == LexerMode::Script => {
                let text = format!("#{}", self.take_while(|c| c != '\n'));
                token(TokenKind::Comment, text.trim_end())
            }
            '0'..='9' => {
                let literal = self.scan_number(c);
                token(TokenKind::Number, &literal)
            }
            '\'' | '"' => self.scan_literal(c, line, column),
            c if is_identifier_start(c) => {
                let mut literal = String::from(c);
                literal.push_str(&self.take_while(is_identifier_char));
                let kind = if self.mode == LexerMode::Script && KEYWORDS.contains(&literal.as_str())
                {
                    TokenKind::Keyword
                } else {
                    TokenKind::Identifier
                };
                token(kind, &literal)
            }
            '+' => token(TokenKind::Plus, "+"),
            '-' => token(TokenKind::Minus, "-"),
            '*' => token(TokenKind::Star, "*"),
            '/' => token(TokenKind::Slash, "/"),
            '^' => token(TokenKind::Caret, "^"),
            '&' => token(TokenKind::Ampersand, "&"),
            '=' if self.mode == LexerMode::Formula => token(TokenKind::Equal, "="),
            '=' if self.eat('=') => token(TokenKind::Equal, "=="),
            '=' => token(TokenKind::Assign, "="),
            '<' if self.eat('=') => token(TokenKind::LessEqual, "<="),
            '<' if self.eat('>') => token(TokenKind::NotEqual, "<>"),
            '<' => token(TokenKind::Less, "<"),
            '>' if self.eat('=') => token(TokenKind::GreaterEqual, ">="),
            '>' => token(TokenKind::Greater, ">"),
            ',' => token(TokenKind::Comma, ","),
            '.' => token(TokenKind::Dot, "."),
            '(' => token(TokenKind::LeftParen, "("),
            ')' => token(TokenKind::RightParen, ")"),
            '{' => token(TokenKind::LeftBrace, "{"),
            '}' => token(TokenKind::RightBrace, "}"),
            '[' => token(TokenKind::LeftBracket, "["),
            ']' => token(TokenKind::RightBracket, "]"),
            ':' => token(TokenKind::Colon, ":"),
            '!' => token(TokenKind::Bang, "!"),
            other => token(TokenKind::Illegal, &other.to_string()),
        }
    }

    /// Scan all remaining tokens, ending with (and including) `Eof`
    pub fn tokenize(mut self) -> Vec<Token> {
        let mut tokens = Vec::new();
        loop {
            let token = self.next_token();
            let done = token.is(TokenKind::Eof);
            tokens.push(token);
            if done {
                return tokens;
            }
        }
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn peek_next(&self) -> Option<char> {
        self.chars.get(self.pos + 1).copied()
    }

    fn advance(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += 1;
        if c == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(c)
    }

    fn eat(&mut self, expected: char) -> bool {
        if self.peek() == Some(expected) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn take_while<F: Fn(char) -> bool>(&mut self, predicate: F) -> String {
        let mut text = String::new();
        while let Some(c) = self.peek() {
            if !predicate(c) {
                break;
            }
            text.push(c);
            self.advance();
        }
        text
    }

    fn skip_whitespace(&mut self) {
        while let Some(c) = self.peek() {
            if c == '\n' && self.mode == LexerMode::Script {
                break;
            }
            if !c.is_whitespace() {
                break;
            }
            self.advance();
        }
    }

    /// Digits with at most one `.`; the dot is only taken when a digit follows
    fn scan_number(&mut self, first: char) -> String {
        let mut literal = String::from(first);
        literal.push_str(&self.take_while(|c| c.is_ascii_digit()));

        if self.peek() == Some('.') && self.peek_next().map_or(false, |c| c.is_ascii_digit()) {
            self.advance();
            literal.push('.');
            literal.push_str(&self.take_while(|c| c.is_ascii_digit()));
        }

        literal
    }

    /// Quoted literal; a doubled quote inside is an escaped quote
    fn scan_literal(&mut self, quote: char, line: usize, column: usize) -> Token {
        let mut text = String::new();

        loop {
            match self.advance() {
                Some(c) if c == quote => {
                    if self.eat(quote) {
                        text.push(quote);
                    } else {
                        return Token::new(TokenKind::Literal, text, line, column);
                    }
                }
                Some(c) => text.push(c),
                None => {
                    return Token::new(
                        TokenKind::Illegal,
                        format!("{}{}", quote, text),
                        line,
                        column,
                    );
                }
            }
        }
    }
}

impl Iterator for Lexer {
    type Item = Token;

    /// Yields every token including the final `Eof`, then `None`
    fn next(&mut self) -> Option<Token> {
        if self.finished {
            return None;
        }
        let token = self.next_token();
        if token.is(TokenKind::Eof) {
            self.finished = true;
        }
        Some(token)
    }
}

fn is_identifier_start(c: char) -> bool {
    c.is_alphabetic() || c == '_' || c == '$'
}

fn is_identifier_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '$'
}
