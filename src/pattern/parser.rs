use crate::pattern::error::ParseError;
use crate::pattern::expr::{PatternExpr, PatternKind, SubPatternKind};
use crate::pattern::token::{Token, TokenKind, Tokenizer};

/// Recursive-descent parser for the pattern grammar.
///
/// Top level forms:
///   `*( body )`, `&( body )`, `&_BLF( body )`, `< hex >`, or a bare body.
/// A body is a pattern-data run (hex/mask bytes, binary masks, sub-patterns,
/// string literals) with an optional trailing `+`/`-` hex offset.
pub struct Parser<'a> {
    input: &'a str,
    tok: Tokenizer<'a>,
}

impl<'a> Parser<'a> {
    pub fn new(input: &'a str) -> Self {
        Self {
            input,
            tok: Tokenizer::new(input),
        }
    }

    pub fn parse(mut self) -> Result<PatternExpr, ParseError> {
        let mut expr = PatternExpr::default();

        self.skip_whitespace();
        match self.tok.peek().kind {
            TokenKind::Pointer | TokenKind::Reference => {
                self.parse_reference_or_pointer(&mut expr)?;
            }
            TokenKind::ValueOpen => {
                self.parse_static_value(&mut expr)?;
            }
            TokenKind::Eof => {
                // Empty pattern.
            }
            TokenKind::Invalid => {
                return Err(self.error("Syntax error"));
            }
            _ => {
                self.parse_pattern_body(&mut expr)?;
                expr.input_offset = self.parse_offset()?;
            }
        }

        self.skip_whitespace();
        if self.tok.peek().kind != TokenKind::Eof {
            return Err(self.error("Unexpected tokens after end of pattern"));
        }

        Ok(expr)
    }

    fn parse_reference_or_pointer(&mut self, expr: &mut PatternExpr) -> Result<(), ParseError> {
        let opener = self.tok.next();

        expr.kind = if opener.kind == TokenKind::Pointer {
            PatternKind::Pointer
        } else if self.tok.peek().kind == TokenKind::Blf {
            // `&_BLF( ... )` decodes a branch/call instead of an LDR.
            self.tok.next();
            PatternKind::BranchReference
        } else {
            PatternKind::Reference
        };

        self.expect(TokenKind::ParenOpen)?;
        self.tok.next();

        self.parse_pattern_body(expr)?;
        expr.input_offset = self.parse_offset()?;

        self.skip_whitespace();
        self.expect(TokenKind::ParenClose)?;
        self.tok.next();

        expr.output_offset = self.parse_offset()?;
        Ok(())
    }

    fn parse_static_value(&mut self, expr: &mut PatternExpr) -> Result<(), ParseError> {
        self.expect(TokenKind::ValueOpen)?;
        self.tok.next();

        self.skip_whitespace();
        let token = self.expect_hex()?;
        let value = self.hex_value(token)?;
        expr.kind = PatternKind::Static(value);
        self.tok.next();

        self.skip_whitespace();
        self.expect(TokenKind::ValueClose)?;
        self.tok.next();
        Ok(())
    }

    fn parse_pattern_body(&mut self, expr: &mut PatternExpr) -> Result<(), ParseError> {
        self.skip_whitespace();

        // Optional grouping parens around the data run, for readability at
        // the top of a reference/pointer form.
        if self.tok.peek().kind == TokenKind::ParenOpen {
            self.tok.next();
            while self.parse_pattern_data(expr)? {}
            self.skip_whitespace();
            self.expect(TokenKind::ParenClose)?;
            self.tok.next();
        } else {
            while self.parse_pattern_data(expr)? {}
        }
        Ok(())
    }

    /// One pattern-data item. Returns false when the data run ends, which is
    /// not an error: the caller then reads a trailing offset or a closing
    /// delimiter.
    fn parse_pattern_data(&mut self, expr: &mut PatternExpr) -> Result<bool, ParseError> {
        match self.tok.peek().kind {
            TokenKind::HexRun | TokenKind::MaskRun => self.parse_hex_mask(expr)?,
            TokenKind::BinMask => self.parse_bin_mask(expr),
            TokenKind::ShortOpen => {
                self.parse_sub_pattern(
                    expr,
                    SubPatternKind::ShortBranch,
                    TokenKind::ShortOpen,
                    TokenKind::ShortClose,
                )?;
            }
            TokenKind::LongOpen => {
                self.parse_sub_pattern(
                    expr,
                    SubPatternKind::LongBranch,
                    TokenKind::LongOpen,
                    TokenKind::LongClose,
                )?;
            }
            TokenKind::Blf => {
                self.tok.next();
                self.parse_sub_pattern(
                    expr,
                    SubPatternKind::LongBranch,
                    TokenKind::ParenOpen,
                    TokenKind::ParenClose,
                )?;
            }
            TokenKind::Ldr => {
                self.tok.next();
                match self.tok.peek().kind {
                    TokenKind::ShortOpen => self.parse_sub_pattern(
                        expr,
                        SubPatternKind::ShortLoad,
                        TokenKind::ShortOpen,
                        TokenKind::ShortClose,
                    )?,
                    TokenKind::LongOpen => self.parse_sub_pattern(
                        expr,
                        SubPatternKind::LongLoad,
                        TokenKind::LongOpen,
                        TokenKind::LongClose,
                    )?,
                    _ => return Err(self.unexpected()),
                }
            }
            TokenKind::AsciiString => self.parse_ascii_string(expr)?,
            TokenKind::Separator | TokenKind::Whitespace => {
                self.tok.next();
            }
            TokenKind::Invalid => return Err(self.error("Syntax error")),
            _ => return Ok(false),
        }
        Ok(true)
    }

    fn parse_hex_mask(&mut self, expr: &mut PatternExpr) -> Result<(), ParseError> {
        let token = self.tok.peek();
        let text = self.tok.text(token);
        if text.len() % 2 != 0 {
            return Err(self.error("The hex number length must be even"));
        }

        let chars: Vec<char> = text.chars().collect();
        for pair in chars.chunks(2) {
            let mut mask = 0u8;
            let mut byte = 0u8;
            if pair[0] != '?' {
                mask |= 0xF0;
                byte |= hex_digit(pair[0]) << 4;
            }
            if pair[1] != '?' {
                mask |= 0x0F;
                byte |= hex_digit(pair[1]);
            }
            expr.push_byte(byte, mask);
        }

        self.tok.next();
        Ok(())
    }

    fn parse_bin_mask(&mut self, expr: &mut PatternExpr) {
        let token = self.tok.peek();
        let text = self.tok.text(token);
        let mut mask = 0u8;
        let mut byte = 0u8;
        // Skip the surrounding brackets; 8 inner characters map to bits 7..0.
        for (i, c) in text[1..9].chars().enumerate() {
            let bit = 1 << (7 - i);
            match c {
                '1' => {
                    mask |= bit;
                    byte |= bit;
                }
                '0' => mask |= bit,
                _ => {} // '.' leaves the bit wildcard
            }
        }
        expr.push_byte(byte, mask);
        self.tok.next();
    }

    fn parse_sub_pattern(
        &mut self,
        expr: &mut PatternExpr,
        kind: SubPatternKind,
        open: TokenKind,
        close: TokenKind,
    ) -> Result<(), ParseError> {
        self.expect(open)?;
        self.tok.next();

        let mut child = PatternExpr::default();
        while self.parse_pattern_data(&mut child)? {}
        child.input_offset = self.parse_offset()?;

        self.skip_whitespace();
        self.expect(close)?;
        self.tok.next();

        expr.attach_sub_pattern(kind, child);
        Ok(())
    }

    fn parse_ascii_string(&mut self, expr: &mut PatternExpr) -> Result<(), ParseError> {
        let token = self.tok.peek();
        let text = self.tok.text(token);
        let inner = &text[1..text.len() - 1];
        if inner.is_empty() {
            return Err(self.error("Empty string not allowed"));
        }

        let mut child = PatternExpr::default();
        for &byte in inner.as_bytes() {
            child.push_byte(byte, 0xFF);
        }
        expr.attach_sub_pattern(SubPatternKind::AsciiString, child);

        self.tok.next();
        Ok(())
    }

    fn parse_offset(&mut self) -> Result<i32, ParseError> {
        self.skip_whitespace();
        let negative = match self.tok.peek().kind {
            TokenKind::Minus => true,
            TokenKind::Plus => false,
            _ => return Ok(0),
        };
        self.tok.next();

        self.skip_whitespace();
        let token = self.expect_hex()?;
        let value = self.hex_value(token)? as i64;
        self.tok.next();

        Ok(if negative { -value } else { value } as i32)
    }

    fn skip_whitespace(&mut self) {
        while self.tok.peek().kind == TokenKind::Whitespace {
            self.tok.next();
        }
    }

    fn expect(&mut self, kind: TokenKind) -> Result<Token, ParseError> {
        let token = self.tok.peek();
        if token.kind == kind {
            Ok(token)
        } else {
            Err(self.unexpected())
        }
    }

    fn expect_hex(&mut self) -> Result<Token, ParseError> {
        let token = self.tok.peek();
        match token.kind {
            TokenKind::HexLit | TokenKind::HexRun => Ok(token),
            _ => Err(self.unexpected()),
        }
    }

    fn hex_value(&mut self, token: Token) -> Result<u32, ParseError> {
        let text = self.tok.text(token);
        let digits = text
            .strip_prefix("0x")
            .or_else(|| text.strip_prefix("0X"))
            .unwrap_or(text);
        u32::from_str_radix(digits, 16).map_err(|_| self.error("Hex number is out of range"))
    }

    fn unexpected(&mut self) -> ParseError {
        match self.tok.peek().kind {
            TokenKind::Eof => self.error("Unexpected EOF"),
            TokenKind::Invalid => self.error("Syntax error"),
            kind => self.error(format!("Unexpected token {}", kind.name())),
        }
    }

    fn error(&mut self, message: impl Into<String>) -> ParseError {
        let offset = self.tok.location();
        ParseError::new(self.input, offset, message)
    }
}

fn hex_digit(c: char) -> u8 {
    c.to_digit(16).unwrap_or(0) as u8
}
