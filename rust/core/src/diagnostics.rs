// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Diagnostics
//!
//! Line-level problems are values, not errors: a [`Diagnostic`] records what
//! went wrong, where, and the source line it happened on. The dispatcher
//! hands each one to a [`DiagnosticSink`].
//!
//! Text form:
//!
//! ```text
//! [ERROR] line: 2, column: 15, token: 'eol', message: the texture is not specified ...
//!   -> f 1/2/3 4/5/6 7
//!                     ^
//! [WARNING] line: 5, message: unsupported element format - curve
//! ```

use std::fmt;
use std::io::{self, Write};

use crate::tokenizer::{Token, TokenKind};

/// Failure and warning taxonomy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum DiagnosticKind {
    /// A run of characters the tokenizer could not classify
    LexicalError,
    /// Wrong token kind, wrong delimiter, missing or trailing fields
    SyntaxError,
    /// Well-formed token whose value is unusable (overflow, bad word)
    SemanticError,
    /// A repetition disagrees with the optional subfields of the first one
    FormatConsistencyError,
    /// Known keyword without a compiled parser
    UnsupportedElementWarning,
    /// Line parsed, but carried a value that is accepted and ignored
    ExtraParameterWarning,
}

impl DiagnosticKind {
    pub fn severity(self) -> Severity {
        match self {
            DiagnosticKind::UnsupportedElementWarning | DiagnosticKind::ExtraParameterWarning => {
                Severity::Warning
            }
            _ => Severity::Error,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            DiagnosticKind::LexicalError => "lexical error",
            DiagnosticKind::SyntaxError => "syntax error",
            DiagnosticKind::SemanticError => "semantic error",
            DiagnosticKind::FormatConsistencyError => "format consistency error",
            DiagnosticKind::UnsupportedElementWarning => "unsupported element",
            DiagnosticKind::ExtraParameterWarning => "extra parameter",
        }
    }
}

impl fmt::Display for DiagnosticKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Severity {
    Warning,
    Error,
}

/// One reported problem. `line` and `column` are 0-based; the text form
/// prints them 1-based.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    pub message: String,
    pub line: usize,
    pub column: usize,
    /// Offending lexeme (`eol` / `eof` for terminators)
    pub token: String,
    /// Width of the caret run
    pub token_len: usize,
    /// Full text of the offending line, without its newline
    pub source_line: String,
}

impl Diagnostic {
    /// A diagnostic anchored on `token`.
    pub fn at_token(
        kind: DiagnosticKind,
        message: impl Into<String>,
        token: &Token,
        source_line: impl Into<String>,
    ) -> Self {
        let text = match token.kind {
            TokenKind::Eol => "eol".to_string(),
            TokenKind::Eof => "eof".to_string(),
            _ => token.text().into_owned(),
        };
        Self {
            kind,
            message: message.into(),
            line: token.position.line,
            column: token.position.column,
            token_len: token.len().max(1),
            token: text,
            source_line: source_line.into(),
        }
    }

    /// A diagnostic for a whole line.
    pub fn for_line(kind: DiagnosticKind, message: impl Into<String>, line: usize) -> Self {
        Self {
            kind,
            message: message.into(),
            line,
            column: 0,
            token: String::new(),
            token_len: 0,
            source_line: String::new(),
        }
    }

    #[inline]
    pub fn severity(&self) -> Severity {
        self.kind.severity()
    }

    #[inline]
    pub fn is_error(&self) -> bool {
        self.severity() == Severity::Error
    }

    /// Whitespace under the source line up to the token, tabs preserved so
    /// the caret lines up in a terminal.
    fn caret_padding(&self) -> String {
        let mut pad: String = self
            .source_line
            .char_indices()
            .take_while(|(i, _)| *i < self.column)
            .map(|(_, c)| if c == '\t' { '\t' } else { ' ' })
            .collect();
        let covered = self
            .source_line
            .char_indices()
            .take_while(|(i, _)| *i < self.column)
            .map(|(_, c)| c.len_utf8())
            .sum::<usize>();
        pad.extend(std::iter::repeat(' ').take(self.column.saturating_sub(covered)));
        pad
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.severity() {
            Severity::Warning => write!(f, "[WARNING] line: {}, message: {}", self.line + 1, self.message),
            Severity::Error => {
                write!(
                    f,
                    "[ERROR] line: {}, column: {}, token: '{}', message: {}",
                    self.line + 1,
                    self.column + 1,
                    self.token,
                    self.message
                )?;
                write!(f, "\n  -> {}", self.source_line)?;
                write!(
                    f,
                    "\n     {}{}",
                    self.caret_padding(),
                    "^".repeat(self.token_len.max(1))
                )
            }
        }
    }
}

/// Receiver for diagnostics produced by the dispatcher.
pub trait DiagnosticSink {
    fn emit(&mut self, diagnostic: Diagnostic);
}

/// Collect into memory.
impl DiagnosticSink for Vec<Diagnostic> {
    fn emit(&mut self, diagnostic: Diagnostic) {
        self.push(diagnostic);
    }
}

impl<S: DiagnosticSink + ?Sized> DiagnosticSink for &mut S {
    fn emit(&mut self, diagnostic: Diagnostic) {
        (**self).emit(diagnostic);
    }
}

impl<S: DiagnosticSink + ?Sized> DiagnosticSink for Box<S> {
    fn emit(&mut self, diagnostic: Diagnostic) {
        (**self).emit(diagnostic);
    }
}

/// Adapter for closures.
pub struct FnSink<F>(pub F);

impl<F: FnMut(Diagnostic)> DiagnosticSink for FnSink<F> {
    fn emit(&mut self, diagnostic: Diagnostic) {
        (self.0)(diagnostic);
    }
}

/// Writes the text form, one diagnostic per block.
pub struct WriterSink<W: Write> {
    writer: W,
}

impl<W: Write> WriterSink<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl WriterSink<io::Stderr> {
    /// The default sink.
    pub fn stderr() -> Self {
        Self::new(io::stderr())
    }
}

impl<W: Write> DiagnosticSink for WriterSink<W> {
    fn emit(&mut self, diagnostic: Diagnostic) {
        if let Err(e) = writeln!(self.writer, "{}", diagnostic) {
            tracing::warn!(error = %e, "failed to write diagnostic");
        }
    }
}

/// Forwards diagnostics as `tracing` events.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl DiagnosticSink for TracingSink {
    fn emit(&mut self, diagnostic: Diagnostic) {
        let line = diagnostic.line + 1;
        match diagnostic.severity() {
            Severity::Error => tracing::error!(
                line,
                column = diagnostic.column + 1,
                kind = %diagnostic.kind,
                token = %diagnostic.token,
                "{}",
                diagnostic.message
            ),
            Severity::Warning => tracing::warn!(
                line,
                kind = %diagnostic.kind,
                "{}",
                diagnostic.message
            ),
        }
    }
}
