//! Character-buffer lexer with backtracking.
//!
//! A [`Lexer`] walks a buffer of characters with a single read cursor and one
//! saved cursor. Parsers peek with [`Lexer::look_ahead`], consume with
//! [`Lexer::consume`] or [`Lexer::match_token`], and try alternative grammars
//! by marking the input position and rewinding when the attempt fails:
//!
//! ```
//! use sipkit_sip_core::lexer::{Lexer, LexerMode, TokenClass};
//!
//! let mut lexer = Lexer::new(LexerMode::SipUrl, "example.com:5060");
//! lexer.mark_input_position();
//! assert!(lexer.match_token(TokenClass::Digit).is_err());
//! lexer.rewind_input_position();
//! assert_eq!(lexer.ttoken(), "example.com");
//! ```
//!
//! A lexer owns mutable cursor state and is not meant to be shared across
//! concurrent parses.

pub mod keywords;

use std::fmt;
use std::sync::Arc;

use crate::error::LexicalError;

pub use keywords::{keyword_table, Keyword, KeywordTable, LexerMode};

/// Sentinel returned by [`Lexer::look_ahead`] past the end of input.
pub const END_OF_INPUT: char = '\0';

/// Kind of a matched token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    /// RFC 3261 token run
    Id,
    /// Single ASCII letter
    Alpha,
    /// Single ASCII digit
    Digit,
    /// Literal character
    Char(char),
    /// Keyword from the active table
    Keyword(Keyword),
}

/// A token read from the buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub text: String,
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

/// What [`Lexer::match_token`] should accept next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenClass {
    Char(char),
    Alpha,
    Digit,
    Id,
    Keyword(Keyword),
}

/// RFC 3261 `token` characters.
pub fn is_token_char(c: char) -> bool {
    c.is_ascii_alphanumeric()
        || matches!(c, '-' | '.' | '!' | '%' | '*' | '_' | '+' | '`' | '\'' | '~')
}

/// Backtracking character lexer.
#[derive(Debug, Clone)]
pub struct Lexer {
    buffer: Vec<char>,
    ptr: usize,
    saved: usize,
    mode: LexerMode,
    table: Arc<KeywordTable>,
}

impl Lexer {
    /// Creates a lexer over `input` using the keyword table of `mode`.
    pub fn new(mode: LexerMode, input: &str) -> Self {
        Lexer {
            buffer: input.chars().collect(),
            ptr: 0,
            saved: 0,
            mode,
            table: keyword_table(mode),
        }
    }

    /// Switches to the keyword table of another mode.
    pub fn select_lexer(&mut self, mode: LexerMode) {
        if self.mode != mode {
            self.mode = mode;
            self.table = keyword_table(mode);
        }
    }

    pub fn mode(&self) -> LexerMode {
        self.mode
    }

    /// Current read offset in characters.
    pub fn position(&self) -> usize {
        self.ptr
    }

    /// The whole input buffer.
    pub fn buffer(&self) -> String {
        self.buffer.iter().collect()
    }

    /// Unconsumed input, without moving the cursor.
    pub fn rest(&self) -> String {
        self.buffer[self.ptr..].iter().collect()
    }

    pub fn has_more_chars(&self) -> bool {
        self.ptr < self.buffer.len()
    }

    /// Peeks `k` characters ahead; returns [`END_OF_INPUT`] past the end.
    pub fn look_ahead(&self, k: usize) -> char {
        self.buffer.get(self.ptr + k).copied().unwrap_or(END_OF_INPUT)
    }

    /// Advances the cursor by `k` characters, clamped to the end of input.
    pub fn consume(&mut self, k: usize) {
        self.ptr = (self.ptr + k).min(self.buffer.len());
    }

    /// Saves the cursor for a later [`Lexer::rewind_input_position`].
    pub fn mark_input_position(&mut self) -> usize {
        self.saved = self.ptr;
        self.saved
    }

    /// Restores the cursor saved by the last mark.
    pub fn rewind_input_position(&mut self) {
        self.ptr = self.saved;
    }

    /// Moves the cursor back to an explicit earlier offset.
    pub fn rewind_to(&mut self, position: usize) {
        self.ptr = position.min(self.buffer.len());
    }

    /// Builds a lexical error at the current offset.
    pub fn error(&self, message: impl Into<String>) -> LexicalError {
        LexicalError::new(message, self.buffer(), self.ptr)
    }

    /// Keyword for `text` in the active table.
    pub fn lookup_keyword(&self, text: &str) -> Option<Keyword> {
        self.table.lookup(text)
    }

    /// Consumes and validates the next token against `class`.
    pub fn match_token(&mut self, class: TokenClass) -> Result<Token, LexicalError> {
        let la = self.look_ahead(0);
        match class {
            TokenClass::Char(expected) => {
                if la == expected {
                    self.consume(1);
                    Ok(Token {
                        kind: TokenKind::Char(expected),
                        text: expected.to_string(),
                    })
                } else {
                    Err(self.error(format!("expected '{}'", expected.escape_debug())))
                }
            }
            TokenClass::Alpha => {
                if la.is_ascii_alphabetic() {
                    self.consume(1);
                    Ok(Token {
                        kind: TokenKind::Alpha,
                        text: la.to_string(),
                    })
                } else {
                    Err(self.error("expected alpha"))
                }
            }
            TokenClass::Digit => {
                if la.is_ascii_digit() {
                    self.consume(1);
                    Ok(Token {
                        kind: TokenKind::Digit,
                        text: la.to_string(),
                    })
                } else {
                    Err(self.error("expected digit"))
                }
            }
            TokenClass::Id => {
                let start = self.ptr;
                let text = self.ttoken();
                if text.is_empty() {
                    self.ptr = start;
                    Err(self.error("expected identifier"))
                } else {
                    Ok(Token {
                        kind: TokenKind::Id,
                        text,
                    })
                }
            }
            TokenClass::Keyword(expected) => {
                let start = self.ptr;
                let text = self.ttoken();
                match self.lookup_keyword(&text) {
                    Some(found) if found == expected => Ok(Token {
                        kind: TokenKind::Keyword(found),
                        text,
                    }),
                    _ => {
                        self.ptr = start;
                        Err(self.error(format!("expected keyword {}", expected)))
                    }
                }
            }
        }
    }

    /// Reads an identifier and classifies it against the keyword table.
    pub fn next_token(&mut self) -> Result<Token, LexicalError> {
        let token = self.match_token(TokenClass::Id)?;
        match self.lookup_keyword(&token.text) {
            Some(kw) => Ok(Token {
                kind: TokenKind::Keyword(kw),
                text: token.text,
            }),
            None => Ok(token),
        }
    }

    /// Consumes a run of token characters; may be empty.
    pub fn ttoken(&mut self) -> String {
        self.take_while(is_token_char)
    }

    /// Like [`Lexer::ttoken`] but spaces and tabs belong to the run.
    pub fn ttoken_allow_space(&mut self) -> String {
        self.take_while(|c| is_token_char(c) || c == ' ' || c == '\t')
    }

    /// Consumes one or more ASCII digits.
    pub fn number(&mut self) -> Result<String, LexicalError> {
        if !self.look_ahead(0).is_ascii_digit() {
            return Err(self.error("expected number"));
        }
        Ok(self.take_while(|c| c.is_ascii_digit()))
    }

    /// Consumes characters up to (not including) `delim` or the end.
    pub fn get_next_token(&mut self, delim: char) -> String {
        self.take_while(|c| c != delim)
    }

    /// Consumes characters up to the first of `delims` or the end.
    pub fn get_next_token_any(&mut self, delims: &[char]) -> String {
        self.take_while(|c| !delims.contains(&c))
    }

    /// Consumes and returns everything left.
    pub fn get_rest(&mut self) -> String {
        let rest = self.rest();
        self.ptr = self.buffer.len();
        rest
    }

    /// Text up to the next line feed, without consuming.
    pub fn peek_line(&self) -> String {
        self.buffer[self.ptr..]
            .iter()
            .take_while(|c| **c != '\n')
            .collect()
    }

    /// Skips spaces and horizontal tabs.
    pub fn sp_or_ht(&mut self) {
        while matches!(self.look_ahead(0), ' ' | '\t') {
            self.consume(1);
        }
    }

    /// Skips any whitespace including line breaks.
    pub fn skip_whitespace(&mut self) {
        while matches!(self.look_ahead(0), ' ' | '\t' | '\r' | '\n') {
            self.consume(1);
        }
    }

    /// Scans a double-quoted run starting at the cursor.
    ///
    /// Returns the content between the quotes with backslash escapes kept
    /// verbatim. Fails if the cursor is not on `"` or the run is unterminated.
    pub fn quoted_string(&mut self) -> Result<String, LexicalError> {
        let start = self.ptr;
        if self.look_ahead(0) != '"' {
            return Err(self.error("expected '\"'"));
        }
        self.consume(1);
        let mut out = String::new();
        loop {
            match self.look_ahead(0) {
                END_OF_INPUT if !self.has_more_chars() => {
                    let err = self.error("unterminated quoted string");
                    self.ptr = start;
                    return Err(err);
                }
                '"' => {
                    self.consume(1);
                    return Ok(out);
                }
                '\\' => {
                    out.push('\\');
                    self.consume(1);
                    if !self.has_more_chars() {
                        let err = self.error("unterminated escape in quoted string");
                        self.ptr = start;
                        return Err(err);
                    }
                    out.push(self.look_ahead(0));
                    self.consume(1);
                }
                c => {
                    out.push(c);
                    self.consume(1);
                }
            }
        }
    }

    /// Scans a balanced parenthesized comment starting at the cursor.
    ///
    /// Returns the content between the outermost parentheses with nested
    /// parentheses and escapes kept verbatim.
    pub fn comment(&mut self) -> Result<String, LexicalError> {
        let start = self.ptr;
        if self.look_ahead(0) != '(' {
            return Err(self.error("expected '('"));
        }
        self.consume(1);
        let mut depth = 1usize;
        let mut out = String::new();
        loop {
            if !self.has_more_chars() {
                let err = self.error("unterminated comment");
                self.ptr = start;
                return Err(err);
            }
            let c = self.look_ahead(0);
            self.consume(1);
            match c {
                '\\' => {
                    out.push('\\');
                    if self.has_more_chars() {
                        out.push(self.look_ahead(0));
                        self.consume(1);
                    }
                }
                '(' => {
                    depth += 1;
                    out.push(c);
                }
                ')' => {
                    depth -= 1;
                    if depth == 0 {
                        return Ok(out);
                    }
                    out.push(c);
                }
                _ => out.push(c),
            }
        }
    }

    /// Consumes the longest run of characters satisfying `pred`.
    pub fn take_while(&mut self, pred: impl Fn(char) -> bool) -> String {
        let start = self.ptr;
        while self.ptr < self.buffer.len() && pred(self.buffer[self.ptr]) {
            self.ptr += 1;
        }
        self.buffer[start..self.ptr].iter().collect()
    }
}
