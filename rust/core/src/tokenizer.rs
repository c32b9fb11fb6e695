// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! OBJ Tokenizer
//!
//! Lossless, chunk-buffered tokenization driven by a character-level
//! state machine. Every byte of the input ends up in exactly one token, so
//! concatenating the lexemes reproduces the source.

use std::borrow::Cow;
use std::fmt;
use std::io::{self, Read};

use smallvec::SmallVec;

use crate::config::ParserConfig;
use crate::error::Error;

/// Number of distinct token kinds (row width of a compiled transition table).
pub const TOKEN_KINDS: usize = 9;

/// Token classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TokenKind {
    /// Letters, digits and underscores, not starting with a digit
    Word,
    /// Digits with an optional leading minus
    Int,
    /// Digits, a dot, digits; optional leading minus
    Float,
    /// `/`
    Slash,
    /// A run of spaces and tabs
    Space,
    /// `\n`
    Eol,
    /// End of input (empty lexeme)
    Eof,
    /// Anything the character machine could not classify
    Unknown,
    /// `#` up to, not including, the end of the line
    Comment,
}

impl TokenKind {
    pub const ALL: [TokenKind; TOKEN_KINDS] = [
        TokenKind::Word,
        TokenKind::Int,
        TokenKind::Float,
        TokenKind::Slash,
        TokenKind::Space,
        TokenKind::Eol,
        TokenKind::Eof,
        TokenKind::Unknown,
        TokenKind::Comment,
    ];

    /// Column index in a transition row.
    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }

    /// Upper-case name used in diagnostics.
    pub fn as_str(self) -> &'static str {
        match self {
            TokenKind::Word => "WORD",
            TokenKind::Int => "INT",
            TokenKind::Float => "FLOAT",
            TokenKind::Slash => "SLASH",
            TokenKind::Space => "SPACE",
            TokenKind::Eol => "EOL",
            TokenKind::Eof => "EOF",
            TokenKind::Unknown => "UNKNOWN",
            TokenKind::Comment => "COMMENT",
        }
    }

    /// EOL or EOF.
    #[inline]
    pub fn is_line_end(self) -> bool {
        matches!(self, TokenKind::Eol | TokenKind::Eof)
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Location of the first byte of a token. Line and column are 0-based.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Position {
    pub line: usize,
    pub column: usize,
    pub offset: usize,
}

/// A classified lexeme.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Token {
    pub kind: TokenKind,
    pub bytes: SmallVec<[u8; 24]>,
    pub position: Position,
}

impl Token {
    /// Raw lexeme bytes.
    #[inline]
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Lexeme as text (lossy for invalid UTF-8).
    pub fn text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.bytes)
    }

    /// Lexeme length in bytes.
    #[inline]
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// Character classes of the scanning machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CharClass {
    Newline,
    Blank,
    Hash,
    Slash,
    Minus,
    Dot,
    Digit,
    Letter,
    Other,
}

impl CharClass {
    #[inline]
    fn of(byte: u8) -> Self {
        match byte {
            b'\n' => CharClass::Newline,
            // '\r' is folded into whitespace so CRLF files tokenize as Space + EOL.
            b' ' | b'\t' | b'\r' => CharClass::Blank,
            b'#' => CharClass::Hash,
            b'/' => CharClass::Slash,
            b'-' => CharClass::Minus,
            b'.' => CharClass::Dot,
            b'0'..=b'9' => CharClass::Digit,
            b'a'..=b'z' | b'A'..=b'Z' | b'_' => CharClass::Letter,
            _ => CharClass::Other,
        }
    }
}

/// States of the scanning machine. `Start` doubles as "token complete".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ScanState {
    Start,
    Comment,
    Newline,
    Blank,
    Slash,
    Minus,
    Dot,
    Int,
    Float,
    Word,
    Unknown,
}

impl ScanState {
    /// Transition on one character class. Returning `Start` from any other
    /// state means the byte belongs to the next token.
    #[inline]
    fn step(self, class: CharClass) -> ScanState {
        use CharClass as C;
        use ScanState as S;
        match (self, class) {
            (S::Start, C::Newline) => S::Newline,
            (S::Start, C::Blank) => S::Blank,
            (S::Start, C::Hash) => S::Comment,
            (S::Start, C::Slash) => S::Slash,
            (S::Start, C::Minus) => S::Minus,
            (S::Start, C::Digit) => S::Int,
            (S::Start, C::Letter) => S::Word,
            (S::Start, C::Dot | C::Other) => S::Unknown,

            (S::Comment, C::Newline) => S::Start,
            (S::Comment, _) => S::Comment,

            (S::Newline | S::Slash, _) => S::Start,
            (S::Blank, C::Blank) => S::Blank,
            (S::Blank, _) => S::Start,

            // Delimiters terminate every other run.
            (_, C::Newline | C::Blank | C::Hash | C::Slash) => S::Start,

            (S::Minus, C::Digit) => S::Int,
            (S::Int, C::Digit) => S::Int,
            (S::Int, C::Dot) => S::Dot,
            (S::Dot | S::Float, C::Digit) => S::Float,
            (S::Word, C::Digit | C::Letter) => S::Word,
            _ => S::Unknown,
        }
    }

    /// Kind of the token that ends in this state.
    fn kind(self) -> TokenKind {
        match self {
            ScanState::Comment => TokenKind::Comment,
            ScanState::Newline => TokenKind::Eol,
            ScanState::Blank => TokenKind::Space,
            ScanState::Slash => TokenKind::Slash,
            ScanState::Int => TokenKind::Int,
            ScanState::Float => TokenKind::Float,
            ScanState::Word => TokenKind::Word,
            ScanState::Start | ScanState::Minus | ScanState::Dot | ScanState::Unknown => {
                TokenKind::Unknown
            }
        }
    }
}

/// Callback invoked when the byte source fails.
pub type IoErrorHandler = Box<dyn FnMut(&Error)>;

fn default_io_error_handler() -> IoErrorHandler {
    Box::new(|err: &Error| tracing::warn!(error = %err, "byte source failed, treating as end of input"))
}

/// Pull-based tokenizer over any [`Read`] source.
///
/// After the source is exhausted (or has failed) every call to
/// [`next_token`](Self::next_token) returns an EOF token.
pub struct Tokenizer<R> {
    reader: R,
    buffer: Vec<u8>,
    pos: usize,
    filled: usize,
    exhausted: bool,

    line: usize,
    column: usize,
    offset: usize,
    /// Bytes of the current line consumed so far (no trailing newline).
    line_text: Vec<u8>,
    /// The most recently completed line.
    previous_line: Vec<u8>,

    skip_comments: bool,
    on_io_error: IoErrorHandler,
}

impl<R: Read> Tokenizer<R> {
    /// Create a tokenizer with the default configuration (comments skipped).
    pub fn new(reader: R) -> Self {
        Self::with_config(reader, &ParserConfig::default())
    }

    pub fn with_config(reader: R, config: &ParserConfig) -> Self {
        Self {
            reader,
            buffer: vec![0; config.chunk_size.max(1)],
            pos: 0,
            filled: 0,
            exhausted: false,
            line: 0,
            column: 0,
            offset: 0,
            line_text: Vec::with_capacity(128),
            previous_line: Vec::with_capacity(128),
            skip_comments: config.skip_comments,
            on_io_error: default_io_error_handler(),
        }
    }

    /// Replace the handler that receives read failures. The default handler
    /// logs a `tracing` warning; a replacement is the only report.
    pub fn set_io_error_handler(&mut self, handler: impl FnMut(&Error) + 'static) {
        self.on_io_error = Box::new(handler);
    }

    pub fn set_skip_comments(&mut self, skip: bool) {
        self.skip_comments = skip;
    }

    pub fn skip_comments(&self) -> bool {
        self.skip_comments
    }

    /// Position of the next unread byte.
    pub fn position(&self) -> Position {
        Position {
            line: self.line,
            column: self.column,
            offset: self.offset,
        }
    }

    /// Text of the current line consumed so far.
    pub fn current_line(&self) -> String {
        String::from_utf8_lossy(&self.line_text).into_owned()
    }

    /// Text of the last line whose newline has been consumed.
    pub fn previous_line(&self) -> String {
        String::from_utf8_lossy(&self.previous_line).into_owned()
    }

    /// Return the next token. Comments are dropped when comment skipping is on.
    pub fn next_token(&mut self) -> Token {
        loop {
            let token = self.scan();
            if token.kind == TokenKind::Comment && self.skip_comments {
                continue;
            }
            return token;
        }
    }

    /// Consume everything up to and including the next newline (or up to EOF)
    /// and return the complete text of the line being skipped.
    pub fn skip_line(&mut self) -> String {
        loop {
            if !self.fill() {
                return self.current_line();
            }
            let window = &self.buffer[self.pos..self.filled];
            match memchr::memchr(b'\n', window) {
                Some(index) => {
                    self.line_text.extend_from_slice(&window[..index]);
                    self.advance_in_line(index);
                    self.bump();
                    return self.previous_line();
                }
                None => {
                    let len = window.len();
                    self.line_text.extend_from_slice(window);
                    self.advance_in_line(len);
                }
            }
        }
    }

    fn scan(&mut self) -> Token {
        let position = self.position();
        let mut bytes = SmallVec::new();
        let mut state = ScanState::Start;
        while let Some(byte) = self.peek() {
            let next = state.step(CharClass::of(byte));
            if next == ScanState::Start {
                break;
            }
            state = next;
            bytes.push(byte);
            self.bump();
        }
        let kind = if bytes.is_empty() {
            TokenKind::Eof
        } else {
            state.kind()
        };
        Token {
            kind,
            bytes,
            position,
        }
    }

    #[inline]
    fn peek(&mut self) -> Option<u8> {
        if self.fill() {
            Some(self.buffer[self.pos])
        } else {
            None
        }
    }

    /// Consume one buffered byte, updating line bookkeeping.
    #[inline]
    fn bump(&mut self) {
        let byte = self.buffer[self.pos];
        self.pos += 1;
        self.offset += 1;
        if byte == b'\n' {
            self.line += 1;
            self.column = 0;
            std::mem::swap(&mut self.previous_line, &mut self.line_text);
            self.line_text.clear();
        } else {
            self.column += 1;
            self.line_text.push(byte);
        }
    }

    /// Skip `count` buffered bytes known not to contain a newline.
    /// The caller has already appended them to `line_text`.
    #[inline]
    fn advance_in_line(&mut self, count: usize) {
        self.pos += count;
        self.offset += count;
        self.column += count;
    }

    /// Ensure at least one unread byte is buffered. Returns false at end of input.
    fn fill(&mut self) -> bool {
        if self.pos < self.filled {
            return true;
        }
        if self.exhausted {
            return false;
        }
        loop {
            match self.reader.read(&mut self.buffer) {
                Ok(0) => {
                    self.exhausted = true;
                    self.pos = 0;
                    self.filled = 0;
                    return false;
                }
                Ok(n) => {
                    self.pos = 0;
                    self.filled = n;
                    return true;
                }
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => {
                    let err = Error::Io {
                        offset: self.offset,
                        source: e,
                    };
                    (self.on_io_error)(&err);
                    self.exhausted = true;
                    self.pos = 0;
                    self.filled = 0;
                    return false;
                }
            }
        }
    }
}
