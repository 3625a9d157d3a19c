//! Formula parser
//!
//! Pratt-style precedence climbing over the token stream. The parser keeps a
//! current/peek token pair; `current` is always the next unconsumed token.
//! Parsing is all-or-nothing: the first error aborts with no partial tree.

use log::debug;
use tabula_core::{decode, Position};

use crate::ast::{BinaryOperator, Expr, Precedence, UnaryOperator};
use crate::error::{FormulaError, FormulaResult};
use crate::lexer::{Lexer, LexerMode};
use crate::token::{Token, TokenKind};

/// Parser configuration
#[derive(Debug, Clone, Default)]
pub struct ParseOptions {
    /// Lexing rules
    pub mode: LexerMode,
    /// Reject formulas that don't start with `=`
    pub require_leading_equals: bool,
}

/// Parse a formula string into an AST
///
/// A leading `=` is accepted but not required.
///
/// # Examples
/// ```
/// use tabula_formula::parse;
///
/// let expr = parse("=SUM(A1:A3) * 2").unwrap();
/// assert_eq!(expr.to_string(), "SUM(A1:A3)*2");
/// ```
pub fn parse(text: &str) -> FormulaResult<Expr> {
    parse_with_options(text, &ParseOptions::default())
}

/// Parse a formula string with explicit options
pub fn parse_with_options(text: &str, options: &ParseOptions) -> FormulaResult<Expr> {
    let mut parser = Parser::new(Lexer::with_mode(text, options.mode));
    let expr = parser.parse_formula(options.require_leading_equals)?;
    debug!("parsed formula {:?} as {}", text, expr);
    Ok(expr)
}

/// Formula parser over a token stream
pub struct Parser {
    lexer: Lexer,
    current: Token,
    peek: Token,
}

impl Parser {
    pub fn new(mut lexer: Lexer) -> Self {
        let current = next_significant(&mut lexer);
        let peek = next_significant(&mut lexer);
        Self {
            lexer,
            current,
            peek,
        }
    }

    /// Parse one complete formula; all input must be consumed
    pub fn parse_formula(&mut self, require_leading_equals: bool) -> FormulaResult<Expr> {
        self.skip_line_breaks();

        if matches!(self.current.kind, TokenKind::Equal | TokenKind::Assign) {
            self.next_token();
        } else if require_leading_equals {
            return Err(self.error("formula must start with '='"));
        }

        let expr = self.parse_expression(Precedence::Lowest)?;

        self.skip_line_breaks();
        if !self.current.is(TokenKind::Eof) {
            return Err(self.unexpected());
        }

        Ok(expr)
    }

    /// Parse an expression whose operators bind tighter than `precedence`
    pub fn parse_expression(&mut self, precedence: Precedence) -> FormulaResult<Expr> {
        let mut left = self.parse_prefix()?;

        while let Some(op) = infix_operator(self.current.kind) {
            if op.precedence() <= precedence {
                break;
            }
            left = self.parse_infix(op, left)?;
        }

        Ok(left)
    }

    // === Prefix rules ===

    fn parse_prefix(&mut self) -> FormulaResult<Expr> {
        match self.current.kind {
            TokenKind::Number => self.parse_number(),
            TokenKind::Literal => self.parse_literal(),
            TokenKind::Identifier => self.parse_identifier(),
            TokenKind::Plus => self.parse_unary(UnaryOperator::Plus),
            TokenKind::Minus => self.parse_unary(UnaryOperator::Negate),
            TokenKind::LeftParen => self.parse_group(),
            TokenKind::Illegal => Err(self.illegal()),
            TokenKind::Eof => Err(self.error("unexpected end of input")),
            _ => Err(self.unexpected()),
        }
    }

    fn parse_number(&mut self) -> FormulaResult<Expr> {
        let token = self.advance();
        token
            .literal
            .parse::<f64>()
            .map(Expr::Number)
            .map_err(|_| error_at(&token, format!("invalid number '{}'", token.literal)))
    }

    fn parse_literal(&mut self) -> FormulaResult<Expr> {
        let token = self.advance();
        if self.current.is(TokenKind::Bang) {
            return self.parse_qualified_reference(token.literal);
        }
        Ok(Expr::Text(token.literal))
    }

    fn parse_identifier(&mut self) -> FormulaResult<Expr> {
        let token = self.advance();

        match self.current.kind {
            TokenKind::LeftParen => self.parse_call(Expr::Identifier(token.literal)),
            TokenKind::Bang => self.parse_qualified_reference(token.literal),
            _ => match decode(&token.literal) {
                Ok(position) => self.parse_reference(position, None),
                Err(_) if token.literal.contains('$') => Err(error_at(
                    &token,
                    format!("invalid cell address '{}'", token.literal),
                )),
                Err(_) => Ok(Expr::Identifier(token.literal)),
            },
        }
    }

    /// `Sheet!A1` or `'My Sheet'!A1:B2`; `current` is the `!`
    fn parse_qualified_reference(&mut self, sheet: String) -> FormulaResult<Expr> {
        self.expect(TokenKind::Bang)?;
        let token = self.expect(TokenKind::Identifier)?;
        let position = decode(&token.literal).map_err(|_| {
            error_at(&token, format!("invalid cell address '{}'", token.literal))
        })?;
        self.parse_reference(position, Some(sheet))
    }

    /// A decoded address, extended to a range when `:` follows
    fn parse_reference(
        &mut self,
        mut start: Position,
        sheet: Option<String>,
    ) -> FormulaResult<Expr> {
        start.sheet = sheet.clone();

        if !self.current.is(TokenKind::Colon) {
            return Ok(Expr::CellRef(start));
        }
        self.next_token();

        let token = self.expect(TokenKind::Identifier)?;
        let mut end = decode(&token.literal).map_err(|_| {
            error_at(&token, format!("invalid cell address '{}'", token.literal))
        })?;
        end.sheet = sheet;

        Ok(Expr::RangeRef { start, end })
    }

    fn parse_unary(&mut self, op: UnaryOperator) -> FormulaResult<Expr> {
        self.next_token();
        let operand = self.parse_expression(Precedence::Prefix)?;
        Ok(Expr::unary(op, operand))
    }

    fn parse_group(&mut self) -> FormulaResult<Expr> {
        self.expect(TokenKind::LeftParen)?;
        let expr = self.parse_expression(Precedence::Lowest)?;
        self.expect(TokenKind::RightParen)?;
        Ok(expr)
    }

    fn parse_call(&mut self, callee: Expr) -> FormulaResult<Expr> {
        self.expect(TokenKind::LeftParen)?;

        let mut args = Vec::new();
        if self.current.is(TokenKind::RightParen) {
            self.next_token();
            return Ok(Expr::Call {
                callee: Box::new(callee),
                args,
            });
        }

        loop {
            args.push(self.parse_expression(Precedence::Lowest)?);
            match self.current.kind {
                TokenKind::Comma => self.next_token(),
                TokenKind::RightParen => {
                    self.next_token();
                    break;
                }
                TokenKind::Illegal => return Err(self.illegal()),
                _ => return Err(self.error(format!(
                    "expected ',' or ')' in argument list, found {}",
                    self.current
                ))),
            }
        }

        Ok(Expr::Call {
            callee: Box::new(callee),
            args,
        })
    }

    // === Infix rules ===

    fn parse_infix(&mut self, op: BinaryOperator, left: Expr) -> FormulaResult<Expr> {
        self.next_token();

        // `^` re-enters at a weaker power so a following `^` binds to the right
        let precedence = if op.is_right_associative() {
            op.precedence().lower()
        } else {
            op.precedence()
        };

        let right = self.parse_expression(precedence)?;
        Ok(Expr::binary(op, left, right))
    }

    // === Token handling ===

    fn next_token(&mut self) {
        let peek = next_significant(&mut self.lexer);
        self.current = std::mem::replace(&mut self.peek, peek);
    }

    /// Consume and return the current token
    fn advance(&mut self) -> Token {
        let token = self.current.clone();
        self.next_token();
        token
    }

    fn expect(&mut self, kind: TokenKind) -> FormulaResult<Token> {
        if self.current.is(kind) {
            return Ok(self.advance());
        }
        if self.current.is(TokenKind::Illegal) {
            return Err(self.illegal());
        }
        Err(self.error(format!("expected {}, found {}", kind, self.current)))
    }

    fn skip_line_breaks(&mut self) {
        while self.current.is(TokenKind::Eol) {
            self.next_token();
        }
    }

    /// Look one token past `current`
    pub fn peek(&self) -> &Token {
        &self.peek
    }

    fn error<S: Into<String>>(&self, message: S) -> FormulaError {
        error_at(&self.current, message)
    }

    fn unexpected(&self) -> FormulaError {
        if self.current.is(TokenKind::Illegal) {
            return self.illegal();
        }
        self.error(format!("unexpected {}", self.current))
    }

    fn illegal(&self) -> FormulaError {
        let literal = &self.current.literal;
        if literal.starts_with('\'') || literal.starts_with('"') {
            self.error("unterminated text literal")
        } else {
            self.error(format!("unexpected character '{}'", literal))
        }
    }
}

fn error_at<S: Into<String>>(token: &Token, message: S) -> FormulaError {
    FormulaError::syntax(message, token.line, token.column)
}

/// Next token, skipping comments
fn next_significant(lexer: &mut Lexer) -> Token {
    loop {
        let token = lexer.next_token();
        if !token.is(TokenKind::Comment) {
            return token;
        }
    }
}

/// The binary operator a token continues an expression with, if any
fn infix_operator(kind: TokenKind) -> Option<BinaryOperator> {
    let op = match kind {
        TokenKind::Plus => BinaryOperator::Add,
        TokenKind::Minus => BinaryOperator::Subtract,
        TokenKind::Star => BinaryOperator::Multiply,
        TokenKind::Slash => BinaryOperator::Divide,
        TokenKind::Caret => BinaryOperator::Power,
        TokenKind::Ampersand => BinaryOperator::Concat,
        TokenKind::Equal => BinaryOperator::Equal,
        TokenKind::NotEqual => BinaryOperator::NotEqual,
        TokenKind::Less => BinaryOperator::LessThan,
        TokenKind::LessEqual => BinaryOperator::LessEqual,
        TokenKind::Greater => BinaryOperator::GreaterThan,
        TokenKind::GreaterEqual => BinaryOperator::GreaterEqual,
        _ => return None,
    };
    Some(op)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn num(n: f64) -> Expr {
        Expr::number(n)
    }

    fn syntax_error_at(text: &str) -> (usize, usize) {
        match parse(text) {
            Err(FormulaError::Syntax { line, column, .. }) => (line, column),
            other => panic!("expected syntax error for {:?}, got {:?}", text, other),
        }
    }

    #[test]
    fn test_parse_number() {
        assert_eq!(parse("42").unwrap(), num(42.0));
        assert_eq!(parse("=3.14").unwrap(), num(3.14));
    }

    #[test]
    fn test_precedence() {
        assert_eq!(
            parse("1+1*2").unwrap(),
            Expr::binary(
                BinaryOperator::Add,
                num(1.0),
                Expr::binary(BinaryOperator::Multiply, num(1.0), num(2.0)),
            )
        );
    }

    #[test]
    fn test_left_associative() {
        assert_eq!(
            parse("8-4-2").unwrap(),
            Expr::binary(
                BinaryOperator::Subtract,
                Expr::binary(BinaryOperator::Subtract, num(8.0), num(4.0)),
                num(2.0),
            )
        );
    }

    #[test]
    fn test_power_is_right_associative() {
        assert_eq!(
            parse("2^3^2").unwrap(),
            Expr::binary(
                BinaryOperator::Power,
                num(2.0),
                Expr::binary(BinaryOperator::Power, num(3.0), num(2.0)),
            )
        );
    }

    #[test]
    fn test_unary_binds_tighter_than_power() {
        assert_eq!(
            parse("-2^2").unwrap(),
            Expr::binary(
                BinaryOperator::Power,
                Expr::unary(UnaryOperator::Negate, num(2.0)),
                num(2.0),
            )
        );
    }

    #[test]
    fn test_comparison_below_concat() {
        assert_eq!(
            parse("'a'&'b'='ab'").unwrap(),
            Expr::binary(
                BinaryOperator::Equal,
                Expr::binary(BinaryOperator::Concat, Expr::text("a"), Expr::text("b")),
                Expr::text("ab"),
            )
        );
        assert_eq!(
            parse("1<2=TRUE").unwrap(),
            Expr::binary(
                BinaryOperator::Equal,
                Expr::binary(BinaryOperator::LessThan, num(1.0), num(2.0)),
                Expr::identifier("TRUE"),
            )
        );
    }

    #[test]
    fn test_grouping() {
        assert_eq!(
            parse("(1+2)*3").unwrap(),
            Expr::binary(
                BinaryOperator::Multiply,
                Expr::binary(BinaryOperator::Add, num(1.0), num(2.0)),
                num(3.0),
            )
        );
    }

    #[test]
    fn test_references() {
        assert_eq!(
            parse("$B$2").unwrap(),
            Expr::CellRef(Position::absolute(2, 2))
        );
        assert_eq!(
            parse("A3:A1").unwrap(),
            Expr::RangeRef {
                start: Position::new(3, 1),
                end: Position::new(1, 1),
            }
        );
        assert_eq!(
            parse("Sheet2!B1").unwrap(),
            Expr::CellRef(Position::new(1, 2).on_sheet("Sheet2"))
        );
        assert_eq!(
            parse("'My Sheet'!A1:B2").unwrap(),
            Expr::RangeRef {
                start: Position::new(1, 1).on_sheet("My Sheet"),
                end: Position::new(2, 2).on_sheet("My Sheet"),
            }
        );
    }

    #[test]
    fn test_identifier_vs_address() {
        assert_eq!(parse("total").unwrap(), Expr::identifier("total"));
        assert_eq!(parse("TRUE").unwrap(), Expr::identifier("TRUE"));
        assert_eq!(
            parse("one()").unwrap(),
            Expr::call("one", vec![])
        );
        // An address-shaped name followed by `(` is still a call
        assert_eq!(
            parse("LOG10(100)").unwrap(),
            Expr::call("LOG10", vec![num(100.0)])
        );
    }

    #[test]
    fn test_call_arguments() {
        assert_eq!(
            parse("SUM(A1:A3, 2, MAX(1, 2))").unwrap(),
            Expr::call(
                "SUM",
                vec![
                    Expr::RangeRef {
                        start: Position::new(1, 1),
                        end: Position::new(3, 1),
                    },
                    num(2.0),
                    Expr::call("MAX", vec![num(1.0), num(2.0)]),
                ],
            )
        );
    }

    #[test]
    fn test_syntax_errors() {
        assert!(parse("").unwrap_err().is_syntax());
        assert!(parse("1+").unwrap_err().is_syntax());
        assert!(parse("(1+2").unwrap_err().is_syntax());
        assert!(parse("SUM(1, 2").unwrap_err().is_syntax());
        assert!(parse("1 2").unwrap_err().is_syntax());
        assert!(parse("A1:").unwrap_err().is_syntax());
        assert!(parse("total:A1").unwrap_err().is_syntax());
        assert!(parse("$$A1").unwrap_err().is_syntax());
        assert!(parse("Sheet1!x").unwrap_err().is_syntax());
    }

    #[test]
    fn test_syntax_error_location() {
        assert_eq!(syntax_error_at("1 + 'abc"), (1, 5));
        assert_eq!(syntax_error_at("1 +\n  ;"), (2, 3));
        assert_eq!(syntax_error_at("SUM(1 2)"), (1, 7));
    }

    #[test]
    fn test_require_leading_equals() {
        let options = ParseOptions {
            require_leading_equals: true,
            ..ParseOptions::default()
        };
        assert_eq!(parse_with_options("=1", &options).unwrap(), num(1.0));
        assert!(parse_with_options("1", &options).is_err());
    }

    #[test]
    fn test_script_mode() {
        let options = ParseOptions {
            mode: LexerMode::Script,
            ..ParseOptions::default()
        };
        assert_eq!(
            parse_with_options("\n1 == 1 # compare\n", &options).unwrap(),
            Expr::binary(BinaryOperator::Equal, num(1.0), num(1.0))
        );
    }

    #[test]
    fn test_display_round_trip() {
        for text in [
            "1+1*2",
            "(1+2)*3",
            "2^3^2",
            "(2^3)^2",
            "-2^2",
            "-(A1+1)",
            "SUM($A$1:B9, \"x\")",
            "'My Sheet'!A1&\"!\"",
            "1-(2-3)",
            "A1<>B1",
        ] {
            let expr = parse(text).unwrap();
            assert_eq!(parse(&expr.to_string()).unwrap(), expr, "{}", text);
        }
    }
}
