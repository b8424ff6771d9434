#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Eof,
    Invalid,
    Reference,
    Pointer,
    Blf,
    Ldr,
    LongOpen,
    LongClose,
    ShortOpen,
    ShortClose,
    ParenOpen,
    ParenClose,
    ValueOpen,
    ValueClose,
    Separator,
    Whitespace,
    Plus,
    Minus,
    HexLit,
    HexRun,
    MaskRun,
    BinMask,
    AsciiString,
}

impl TokenKind {
    pub fn name(self) -> &'static str {
        match self {
            TokenKind::Eof => "EOF",
            TokenKind::Invalid => "INVALID",
            TokenKind::Reference => "REFERENCE",
            TokenKind::Pointer => "POINTER",
            TokenKind::Blf => "BLF",
            TokenKind::Ldr => "LDR",
            TokenKind::LongOpen => "LONG_BRANCH_OPEN",
            TokenKind::LongClose => "LONG_BRANCH_CLOSE",
            TokenKind::ShortOpen => "SHORT_BRANCH_OPEN",
            TokenKind::ShortClose => "SHORT_BRANCH_CLOSE",
            TokenKind::ParenOpen => "PAREN_OPEN",
            TokenKind::ParenClose => "PAREN_CLOSE",
            TokenKind::ValueOpen => "VALUE_OPEN",
            TokenKind::ValueClose => "VALUE_CLOSE",
            TokenKind::Separator => "SEPARATOR",
            TokenKind::Whitespace => "WHITESPACE",
            TokenKind::Plus => "PLUS",
            TokenKind::Minus => "MINUS",
            TokenKind::HexLit => "HEX",
            TokenKind::HexRun => "HEX",
            TokenKind::MaskRun => "MASK",
            TokenKind::BinMask => "BIN",
            TokenKind::AsciiString => "ASCII_STRING",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub start: usize,
    pub end: usize,
}

/// Lexer for the pattern grammar. `peek` is idempotent; `next` consumes.
pub struct Tokenizer<'a> {
    input: &'a str,
    pos: usize,
    lookahead: Option<Token>,
}

impl<'a> Tokenizer<'a> {
    pub fn new(input: &'a str) -> Self {
        Self {
            input,
            pos: 0,
            lookahead: None,
        }
    }

    pub fn peek(&mut self) -> Token {
        if self.lookahead.is_none() {
            self.lookahead = Some(self.lex());
        }
        self.lookahead.unwrap()
    }

    pub fn next(&mut self) -> Token {
        let token = self.peek();
        self.lookahead = None;
        token
    }

    pub fn text(&self, token: Token) -> &'a str {
        &self.input[token.start..token.end]
    }

    /// Byte offset of the next unconsumed token, for error locations.
    pub fn location(&mut self) -> usize {
        self.peek().start
    }

    fn is_hex(c: u8) -> bool {
        c.is_ascii_hexdigit()
    }

    fn is_hex_or_wildcard(c: u8) -> bool {
        c.is_ascii_hexdigit() || c == b'?'
    }

    fn lex(&mut self) -> Token {
        let bytes = self.input.as_bytes();
        let start = self.pos;

        if self.pos >= bytes.len() {
            return Token {
                kind: TokenKind::Eof,
                start,
                end: start,
            };
        }

        if bytes[self.pos].is_ascii_whitespace() {
            while self.pos < bytes.len() && bytes[self.pos].is_ascii_whitespace() {
                self.pos += 1;
            }
            return self.token(TokenKind::Whitespace, start);
        }

        // A binary mask literal `[0101..01]` must be tried before `[` is taken
        // as a short-branch delimiter. It needs exactly 8 inner characters of
        // 0/1/. and at least one wildcard dot, otherwise `[01234567]`-style
        // hex runs inside a short-branch sub-pattern would be misread.
        if bytes[self.pos] == b'[' && self.pos + 9 < bytes.len() && bytes[self.pos + 9] == b']' {
            let inner = &bytes[self.pos + 1..self.pos + 9];
            if inner.iter().all(|&c| matches!(c, b'0' | b'1' | b'.')) && inner.contains(&b'.') {
                self.pos += 10;
                return self.token(TokenKind::BinMask, start);
            }
        }

        let punct = match bytes[self.pos] {
            b'&' => Some(TokenKind::Reference),
            b'*' => Some(TokenKind::Pointer),
            b'(' => Some(TokenKind::ParenOpen),
            b')' => Some(TokenKind::ParenClose),
            b'[' => Some(TokenKind::ShortOpen),
            b']' => Some(TokenKind::ShortClose),
            b'{' => Some(TokenKind::LongOpen),
            b'}' => Some(TokenKind::LongClose),
            b'+' => Some(TokenKind::Plus),
            b'-' => Some(TokenKind::Minus),
            b',' => Some(TokenKind::Separator),
            b'<' => Some(TokenKind::ValueOpen),
            b'>' => Some(TokenKind::ValueClose),
            _ => None,
        };
        if let Some(kind) = punct {
            self.pos += 1;
            return self.token(kind, start);
        }

        if bytes[self.pos] == b'0'
            && self.pos + 2 < bytes.len()
            && bytes[self.pos + 1].eq_ignore_ascii_case(&b'x')
            && Self::is_hex(bytes[self.pos + 2])
        {
            self.pos += 3;
            while self.pos < bytes.len() && Self::is_hex(bytes[self.pos]) {
                self.pos += 1;
            }
            return self.token(TokenKind::HexLit, start);
        }

        if Self::is_hex_or_wildcard(bytes[self.pos]) {
            let mut has_wildcard = false;
            while self.pos < bytes.len() && Self::is_hex_or_wildcard(bytes[self.pos]) {
                has_wildcard |= bytes[self.pos] == b'?';
                self.pos += 1;
            }
            let kind = if has_wildcard {
                TokenKind::MaskRun
            } else {
                TokenKind::HexRun
            };
            return self.token(kind, start);
        }

        if self.keyword("_blf") {
            return self.token(TokenKind::Blf, start);
        }

        if self.keyword("ldr") {
            return self.token(TokenKind::Ldr, start);
        }

        if bytes[self.pos] == b'%' {
            self.pos += 1;
            while self.pos < bytes.len() {
                if bytes[self.pos] == b'%' {
                    self.pos += 1;
                    return self.token(TokenKind::AsciiString, start);
                }
                self.pos += 1;
            }
            // Unterminated string literal.
            return self.token(TokenKind::Invalid, start);
        }

        // Span the offending character so diagnostics can show it.
        if let Some(c) = self.input[self.pos..].chars().next() {
            self.pos += c.len_utf8();
        }
        self.token(TokenKind::Invalid, start)
    }

    fn keyword(&mut self, word: &str) -> bool {
        let rest = &self.input.as_bytes()[self.pos..];
        if rest.len() >= word.len() && rest[..word.len()].eq_ignore_ascii_case(word.as_bytes()) {
            self.pos += word.len();
            true
        } else {
            false
        }
    }

    fn token(&self, kind: TokenKind, start: usize) -> Token {
        Token {
            kind,
            start,
            end: self.pos,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(input: &str) -> Vec<TokenKind> {
        let mut tok = Tokenizer::new(input);
        let mut out = Vec::new();
        loop {
            let t = tok.next();
            out.push(t.kind);
            if t.kind == TokenKind::Eof || t.kind == TokenKind::Invalid {
                break;
            }
        }
        out
    }

    #[test]
    fn test_hex_and_mask_runs() {
        assert_eq!(
            kinds("AB ?? C?"),
            vec![
                TokenKind::HexRun,
                TokenKind::Whitespace,
                TokenKind::MaskRun,
                TokenKind::Whitespace,
                TokenKind::MaskRun,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_peek_is_idempotent() {
        let mut tok = Tokenizer::new("AB CD");
        let a = tok.peek();
        let b = tok.peek();
        assert_eq!(a, b);
        assert_eq!(tok.next(), a);
        assert_eq!(tok.peek().kind, TokenKind::Whitespace);
    }

    #[test]
    fn test_hex_literal() {
        let mut tok = Tokenizer::new("0xA0001234");
        let t = tok.next();
        assert_eq!(t.kind, TokenKind::HexLit);
        assert_eq!(tok.text(t), "0xA0001234");
    }

    #[test]
    fn test_binary_mask_needs_a_dot() {
        assert_eq!(kinds("[01..0101]")[0], TokenKind::BinMask);
        // Without a wildcard bit this is a short-branch group with a hex run.
        assert_eq!(
            kinds("[01010101]")[..3],
            [TokenKind::ShortOpen, TokenKind::HexRun, TokenKind::ShortClose]
        );
    }

    #[test]
    fn test_keywords_case_insensitive() {
        assert_eq!(kinds("_BLF(")[0], TokenKind::Blf);
        assert_eq!(kinds("_blf(")[0], TokenKind::Blf);
        assert_eq!(kinds("LDR[")[0], TokenKind::Ldr);
        assert_eq!(kinds("ldr{")[0], TokenKind::Ldr);
    }

    #[test]
    fn test_ascii_string() {
        let mut tok = Tokenizer::new("%init%");
        let t = tok.next();
        assert_eq!(t.kind, TokenKind::AsciiString);
        assert_eq!(tok.text(t), "%init%");
    }

    #[test]
    fn test_unterminated_string_is_invalid() {
        assert_eq!(*kinds("%abc").last().unwrap(), TokenKind::Invalid);
    }

    #[test]
    fn test_punctuation() {
        assert_eq!(
            kinds("&(*)[]{}+-,<>"),
            vec![
                TokenKind::Reference,
                TokenKind::ParenOpen,
                TokenKind::Pointer,
                TokenKind::ParenClose,
                TokenKind::ShortOpen,
                TokenKind::ShortClose,
                TokenKind::LongOpen,
                TokenKind::LongClose,
                TokenKind::Plus,
                TokenKind::Minus,
                TokenKind::Separator,
                TokenKind::ValueOpen,
                TokenKind::ValueClose,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_invalid_character() {
        assert_eq!(*kinds("AB !").last().unwrap(), TokenKind::Invalid);
    }

    #[test]
    fn test_invalid_token_spans_the_character() {
        let mut tok = Tokenizer::new("!AB");
        let t = tok.next();
        assert_eq!(t.kind, TokenKind::Invalid);
        assert_eq!(tok.text(t), "!");
        // Multi-byte characters are spanned whole.
        let mut tok = Tokenizer::new("é");
        let t = tok.next();
        assert_eq!(t.kind, TokenKind::Invalid);
        assert_eq!(tok.text(t), "é");
    }
}
