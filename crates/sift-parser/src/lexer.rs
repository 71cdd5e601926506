//! Tokenizer for the bundled Python-dialect frontend.
//!
//! Indentation-sensitive: emits NEWLINE at logical line ends and
//! INDENT/DEDENT pairs as the leading-whitespace column moves, tracked on a
//! stack. Newlines inside brackets are implicit joins and produce nothing.

use sift_common::Span;

use crate::error::ParseError;

/// A lexical token. `text` carries the cooked payload for names, numbers,
/// and strings; punctuation leaves it empty.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
    pub text: String,
}

impl Token {
    fn bare(kind: TokenKind, span: Span) -> Self {
        Token {
            kind,
            span,
            text: String::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    // Layout
    Newline,
    Indent,
    Dedent,
    Eof,

    // Literals and names
    Name,
    Int,
    Float,
    Str,

    // Keywords
    KwDef,
    KwClass,
    KwIf,
    KwElif,
    KwElse,
    KwWhile,
    KwFor,
    KwIn,
    KwReturn,
    KwYield,
    KwPass,
    KwBreak,
    KwContinue,
    KwTry,
    KwExcept,
    KwFinally,
    KwAs,
    KwImport,
    KwGlobal,
    KwLambda,
    KwAnd,
    KwOr,
    KwNot,
    KwIs,

    // Punctuation and operators
    Plus,
    Minus,
    Star,
    StarStar,
    Slash,
    Percent,
    Lt,
    Gt,
    LtEq,
    GtEq,
    EqEq,
    NotEq,
    Eq,
    Comma,
    Colon,
    Semicolon,
    Dot,
    LParen,
    RParen,
    LBracket,
    RBracket,
    LBrace,
    RBrace,
}

/// Map an identifier to its keyword kind, if it is one.
fn keyword_from_str(s: &str) -> Option<TokenKind> {
    use TokenKind::*;
    Some(match s {
        "def" => KwDef,
        "class" => KwClass,
        "if" => KwIf,
        "elif" => KwElif,
        "else" => KwElse,
        "while" => KwWhile,
        "for" => KwFor,
        "in" => KwIn,
        "return" => KwReturn,
        "yield" => KwYield,
        "pass" => KwPass,
        "break" => KwBreak,
        "continue" => KwContinue,
        "try" => KwTry,
        "except" => KwExcept,
        "finally" => KwFinally,
        "as" => KwAs,
        "import" => KwImport,
        "global" => KwGlobal,
        "lambda" => KwLambda,
        "and" => KwAnd,
        "or" => KwOr,
        "not" => KwNot,
        "is" => KwIs,
        _ => return None,
    })
}

/// Byte-level source iterator with position tracking.
struct Cursor<'src> {
    source: &'src str,
    pos: u32,
    chars: std::str::Chars<'src>,
}

impl<'src> Cursor<'src> {
    fn new(source: &'src str) -> Self {
        Self {
            source,
            pos: 0,
            chars: source.chars(),
        }
    }

    fn peek(&self) -> Option<char> {
        self.chars.clone().next()
    }

    fn peek_next(&self) -> Option<char> {
        let mut iter = self.chars.clone();
        iter.next();
        iter.next()
    }

    fn advance(&mut self) -> Option<char> {
        let c = self.chars.next()?;
        self.pos += c.len_utf8() as u32;
        Some(c)
    }

    fn pos(&self) -> u32 {
        self.pos
    }

    fn is_eof(&self) -> bool {
        self.peek().is_none()
    }

    fn eat_while(&mut self, predicate: impl Fn(char) -> bool) {
        while let Some(c) = self.peek() {
            if predicate(c) {
                self.advance();
            } else {
                break;
            }
        }
    }

    fn slice(&self, start: u32, end: u32) -> &'src str {
        &self.source[start as usize..end as usize]
    }
}

/// The dialect lexer. `tokenize` drives it to completion.
pub struct Lexer<'src> {
    cursor: Cursor<'src>,
    tokens: Vec<Token>,
    /// Indentation column stack. Always starts with 0.
    indents: Vec<u32>,
    /// Nesting depth of () [] {}; newlines inside brackets are joins.
    bracket_depth: u32,
    /// True at the start of a logical line, before indentation is measured.
    at_line_start: bool,
}

impl<'src> Lexer<'src> {
    pub fn new(source: &'src str) -> Self {
        Self {
            cursor: Cursor::new(source),
            tokens: Vec::new(),
            indents: vec![0],
            bracket_depth: 0,
            at_line_start: true,
        }
    }

    /// Tokenize the entire source. The result ends with `Eof` and closes
    /// any open indentation levels with trailing DEDENTs.
    pub fn tokenize(source: &str) -> Result<Vec<Token>, ParseError> {
        let mut lexer = Lexer::new(source);
        lexer.run()?;
        Ok(lexer.tokens)
    }

    fn run(&mut self) -> Result<(), ParseError> {
        loop {
            if self.at_line_start && self.bracket_depth == 0 {
                self.handle_line_start()?;
                if self.cursor.is_eof() {
                    break;
                }
            }
            if self.cursor.is_eof() {
                break;
            }
            self.lex_token()?;
        }

        // Close the final logical line and any open indentation.
        let end = self.cursor.pos();
        if matches!(
            self.tokens.last().map(|t| t.kind),
            Some(k) if k != TokenKind::Newline && k != TokenKind::Dedent
        ) {
            self.tokens
                .push(Token::bare(TokenKind::Newline, Span::new(end, end)));
        }
        while self.indents.len() > 1 {
            self.indents.pop();
            self.tokens
                .push(Token::bare(TokenKind::Dedent, Span::new(end, end)));
        }
        self.tokens
            .push(Token::bare(TokenKind::Eof, Span::new(end, end)));
        Ok(())
    }

    /// Measure leading whitespace, skip blank and comment-only lines, and
    /// emit INDENT/DEDENT tokens as the column moves.
    fn handle_line_start(&mut self) -> Result<(), ParseError> {
        loop {
            let line_start = self.cursor.pos();
            let mut col = 0u32;
            while let Some(c) = self.cursor.peek() {
                match c {
                    ' ' => col += 1,
                    '\t' => col += 8 - (col % 8),
                    _ => break,
                }
                self.cursor.advance();
            }
            match self.cursor.peek() {
                // Blank or comment-only line: consume and try the next one.
                Some('\n') => {
                    self.cursor.advance();
                    continue;
                }
                Some('#') => {
                    self.cursor.eat_while(|c| c != '\n');
                    self.cursor.advance();
                    continue;
                }
                None => {
                    self.at_line_start = false;
                    return Ok(());
                }
                Some(_) => {
                    self.at_line_start = false;
                    let here = Span::new(line_start, self.cursor.pos());
                    let current = *self.indents.last().expect("indent stack is never empty");
                    if col > current {
                        self.indents.push(col);
                        self.tokens.push(Token::bare(TokenKind::Indent, here));
                    } else if col < current {
                        while col < *self.indents.last().unwrap() {
                            self.indents.pop();
                            self.tokens.push(Token::bare(TokenKind::Dedent, here));
                        }
                        if col != *self.indents.last().unwrap() {
                            return Err(ParseError::new("inconsistent indentation", here));
                        }
                    }
                    return Ok(());
                }
            }
        }
    }

    fn lex_token(&mut self) -> Result<(), ParseError> {
        let start = self.cursor.pos();
        let c = match self.cursor.advance() {
            Some(c) => c,
            None => return Ok(()),
        };
        use TokenKind::*;
        match c {
            ' ' | '\t' | '\r' => {}
            '\n' => {
                if self.bracket_depth == 0 {
                    self.tokens
                        .push(Token::bare(Newline, Span::new(start, self.cursor.pos())));
                    self.at_line_start = true;
                }
            }
            '#' => {
                self.cursor.eat_while(|c| c != '\n');
            }
            '(' => self.open_bracket(LParen, start),
            ')' => self.close_bracket(RParen, start),
            '[' => self.open_bracket(LBracket, start),
            ']' => self.close_bracket(RBracket, start),
            '{' => self.open_bracket(LBrace, start),
            '}' => self.close_bracket(RBrace, start),
            '+' => self.push_bare(Plus, start),
            '-' => self.push_bare(Minus, start),
            '*' => {
                if self.cursor.peek() == Some('*') {
                    self.cursor.advance();
                    self.push_bare(StarStar, start);
                } else {
                    self.push_bare(Star, start);
                }
            }
            '/' => self.push_bare(Slash, start),
            '%' => self.push_bare(Percent, start),
            '<' => {
                if self.cursor.peek() == Some('=') {
                    self.cursor.advance();
                    self.push_bare(LtEq, start);
                } else {
                    self.push_bare(Lt, start);
                }
            }
            '>' => {
                if self.cursor.peek() == Some('=') {
                    self.cursor.advance();
                    self.push_bare(GtEq, start);
                } else {
                    self.push_bare(Gt, start);
                }
            }
            '=' => {
                if self.cursor.peek() == Some('=') {
                    self.cursor.advance();
                    self.push_bare(EqEq, start);
                } else {
                    self.push_bare(Eq, start);
                }
            }
            '!' => {
                if self.cursor.peek() == Some('=') {
                    self.cursor.advance();
                    self.push_bare(NotEq, start);
                } else {
                    return Err(ParseError::new(
                        "unexpected character: '!'",
                        Span::new(start, self.cursor.pos()),
                    ));
                }
            }
            ',' => self.push_bare(Comma, start),
            ':' => self.push_bare(Colon, start),
            ';' => self.push_bare(Semicolon, start),
            '.' => self.push_bare(Dot, start),
            '\'' | '"' => self.lex_string(c, start)?,
            c if c.is_ascii_digit() => self.lex_number(start),
            c if c.is_alphabetic() || c == '_' => self.lex_name(start),
            other => {
                return Err(ParseError::new(
                    format!("unexpected character: {other:?}"),
                    Span::new(start, self.cursor.pos()),
                ));
            }
        }
        Ok(())
    }

    fn push_bare(&mut self, kind: TokenKind, start: u32) {
        self.tokens
            .push(Token::bare(kind, Span::new(start, self.cursor.pos())));
    }

    fn open_bracket(&mut self, kind: TokenKind, start: u32) {
        self.bracket_depth += 1;
        self.push_bare(kind, start);
    }

    fn close_bracket(&mut self, kind: TokenKind, start: u32) {
        self.bracket_depth = self.bracket_depth.saturating_sub(1);
        self.push_bare(kind, start);
    }

    fn lex_name(&mut self, start: u32) {
        self.cursor
            .eat_while(|c| c.is_alphanumeric() || c == '_');
        let end = self.cursor.pos();
        let text = self.cursor.slice(start, end);
        let kind = keyword_from_str(text).unwrap_or(TokenKind::Name);
        self.tokens.push(Token {
            kind,
            span: Span::new(start, end),
            text: text.to_string(),
        });
    }

    fn lex_number(&mut self, start: u32) {
        self.cursor
            .eat_while(|c| c.is_ascii_alphanumeric() || c == '_');
        let mut is_float = false;
        // A dot continues the literal only when followed by a digit, so
        // `1.method` still lexes as Int Dot Name.
        if self.cursor.peek() == Some('.')
            && self.cursor.peek_next().is_some_and(|c| c.is_ascii_digit())
        {
            is_float = true;
            self.cursor.advance();
            self.cursor.eat_while(|c| c.is_ascii_digit() || c == '_');
            if matches!(self.cursor.peek(), Some('e') | Some('E')) {
                self.cursor.advance();
                if matches!(self.cursor.peek(), Some('+') | Some('-')) {
                    self.cursor.advance();
                }
                self.cursor.eat_while(|c| c.is_ascii_digit());
            }
        }
        let end = self.cursor.pos();
        self.tokens.push(Token {
            kind: if is_float {
                TokenKind::Float
            } else {
                TokenKind::Int
            },
            span: Span::new(start, end),
            text: self.cursor.slice(start, end).to_string(),
        });
    }

    /// Lex a string literal. Both quote characters work; a tripled quote
    /// opens a multi-line string (the docstring form).
    fn lex_string(&mut self, quote: char, start: u32) -> Result<(), ParseError> {
        let triple = self.cursor.peek() == Some(quote) && self.cursor.peek_next() == Some(quote);
        if triple {
            self.cursor.advance();
            self.cursor.advance();
        }
        let mut value = String::new();
        loop {
            let c = match self.cursor.advance() {
                Some(c) => c,
                None => {
                    return Err(ParseError::new(
                        "unterminated string literal",
                        Span::new(start, self.cursor.pos()),
                    ));
                }
            };
            match c {
                '\\' => {
                    let esc = self.cursor.advance().ok_or_else(|| {
                        ParseError::new(
                            "unterminated string literal",
                            Span::new(start, self.cursor.pos()),
                        )
                    })?;
                    value.push(match esc {
                        'n' => '\n',
                        't' => '\t',
                        'r' => '\r',
                        '0' => '\0',
                        other => other,
                    });
                }
                '\n' if !triple => {
                    return Err(ParseError::new(
                        "unterminated string literal",
                        Span::new(start, self.cursor.pos()),
                    ));
                }
                c if c == quote => {
                    if !triple {
                        break;
                    }
                    if self.cursor.peek() == Some(quote) && self.cursor.peek_next() == Some(quote) {
                        self.cursor.advance();
                        self.cursor.advance();
                        break;
                    }
                    value.push(c);
                }
                c => value.push(c),
            }
        }
        self.tokens.push(Token {
            kind: TokenKind::Str,
            span: Span::new(start, self.cursor.pos()),
            text: value,
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<TokenKind> {
        Lexer::tokenize(source)
            .unwrap()
            .into_iter()
            .map(|t| t.kind)
            .collect()
    }

    #[test]
    fn simple_assignment() {
        use TokenKind::*;
        assert_eq!(
            kinds("x = 1\n"),
            vec![Name, Eq, Int, Newline, Eof]
        );
    }

    #[test]
    fn indent_dedent_pairs() {
        use TokenKind::*;
        let toks = kinds("if x:\n    y = 1\nz = 2\n");
        assert_eq!(
            toks,
            vec![
                KwIf, Name, Colon, Newline, Indent, Name, Eq, Int, Newline, Dedent, Name, Eq,
                Int, Newline, Eof
            ]
        );
    }

    #[test]
    fn dangling_indent_closed_at_eof() {
        use TokenKind::*;
        let toks = kinds("def f():\n    return 1");
        assert_eq!(toks.last(), Some(&Eof));
        assert!(toks.contains(&Indent));
        assert_eq!(toks.iter().filter(|k| **k == Dedent).count(), 1);
    }

    #[test]
    fn brackets_join_lines() {
        use TokenKind::*;
        let toks = kinds("x = (1,\n     2)\n");
        // No NEWLINE between the elements, no INDENT for the continuation.
        assert_eq!(
            toks,
            vec![Name, Eq, LParen, Int, Comma, Int, RParen, Newline, Eof]
        );
    }

    #[test]
    fn blank_and_comment_lines_are_skipped() {
        use TokenKind::*;
        let toks = kinds("x = 1\n\n# note\ny = 2\n");
        assert_eq!(
            toks,
            vec![Name, Eq, Int, Newline, Name, Eq, Int, Newline, Eof]
        );
    }

    #[test]
    fn string_escapes_are_cooked() {
        let toks = Lexer::tokenize("s = 'a\\nb'\n").unwrap();
        let s = toks.iter().find(|t| t.kind == TokenKind::Str).unwrap();
        assert_eq!(s.text, "a\nb");
    }

    #[test]
    fn triple_quoted_string_spans_lines() {
        let toks = Lexer::tokenize("s = \"\"\"one\ntwo\"\"\"\n").unwrap();
        let s = toks.iter().find(|t| t.kind == TokenKind::Str).unwrap();
        assert_eq!(s.text, "one\ntwo");
    }

    #[test]
    fn inconsistent_indentation_is_an_error() {
        let err = Lexer::tokenize("if x:\n        y = 1\n    z = 2\n").unwrap_err();
        assert!(err.message.contains("indentation"));
    }

    #[test]
    fn unterminated_string_is_an_error() {
        assert!(Lexer::tokenize("s = 'oops\n").is_err());
    }
}
