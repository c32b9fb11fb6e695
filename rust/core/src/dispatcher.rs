// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Line dispatcher
//!
//! Reads the leading keyword of each statement, hands the rest of the line
//! to the matching element parser and turns failures into diagnostics.
//! Malformed lines never stop the stream: the dispatcher reports them,
//! resynchronizes on the next line and keeps going until EOF.

use std::io::{self, Read};

use rustc_hash::FxHashMap;

use crate::config::ParserConfig;
use crate::diagnostics::{Diagnostic, DiagnosticKind, DiagnosticSink, WriterSink};
use crate::element::{ElementParser, Failure, Outcome, Status};
use crate::error::Error;
use crate::fsm::{messages, Report};
use crate::keywords::ElementType;
use crate::registry::Registry;
use crate::tokenizer::{Token, TokenKind, Tokenizer};

/// One parsed statement, or the end of the input.
#[derive(Debug, PartialEq)]
pub enum Item<'a> {
    /// Successful or warning outcome; errors are reported to the sink and
    /// skipped.
    Element {
        element_type: ElementType,
        outcome: Outcome<'a>,
    },
    EndOfFile,
}

impl<'a> Item<'a> {
    pub fn element_type(&self) -> ElementType {
        match self {
            Item::Element { element_type, .. } => *element_type,
            Item::EndOfFile => ElementType::EndOfFile,
        }
    }

    pub fn is_end_of_file(&self) -> bool {
        matches!(self, Item::EndOfFile)
    }
}

/// Counters accumulated over a dispatch run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DispatchStats {
    /// Lines returned to the caller, including those with a warning
    pub records: usize,
    pub warnings: usize,
    pub errors: usize,
}

/// Pull-based statement reader.
pub struct Dispatcher<R, S = WriterSink<io::Stderr>> {
    tokenizer: Tokenizer<R>,
    registry: Registry,
    parsers: FxHashMap<ElementType, ElementParser>,
    sink: S,
    config: ParserConfig,
    stats: DispatchStats,
    finished: bool,
}

impl<R: Read> Dispatcher<R> {
    /// Dispatcher that prints diagnostics to stderr.
    pub fn new(reader: R, registry: Registry) -> Self {
        Self::with_sink(reader, registry, WriterSink::stderr())
    }
}

impl<R: Read, S: DiagnosticSink> Dispatcher<R, S> {
    pub fn with_sink(reader: R, registry: Registry, sink: S) -> Self {
        Self::with_config(reader, registry, sink, ParserConfig::default())
    }

    pub fn with_config(reader: R, registry: Registry, sink: S, config: ParserConfig) -> Self {
        let parsers = registry
            .iter()
            .map(|(t, fsm)| (t, ElementParser::new(fsm.clone())))
            .collect();
        Self {
            tokenizer: Tokenizer::with_config(reader, &config),
            registry,
            parsers,
            sink,
            config,
            stats: DispatchStats::default(),
            finished: false,
        }
    }

    /// Replace the handler that receives read failures.
    pub fn set_io_error_handler(&mut self, handler: impl FnMut(&Error) + 'static) {
        self.tokenizer.set_io_error_handler(handler);
    }

    /// Read up to the next successfully parsed statement.
    ///
    /// Once [`Item::EndOfFile`] has been returned every further call
    /// returns it again.
    pub fn next(&mut self) -> Item<'_> {
        let Some((element_type, warning)) = self.advance() else {
            return Item::EndOfFile;
        };
        match self.parsers.get(&element_type) {
            Some(parser) => {
                let record = parser.record();
                let outcome = match warning {
                    Some(report) => Outcome::Warning(record, report),
                    None => Outcome::Success(record),
                };
                Item::Element {
                    element_type,
                    outcome,
                }
            }
            None => Item::EndOfFile,
        }
    }

    pub fn stats(&self) -> DispatchStats {
        self.stats
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn config(&self) -> &ParserConfig {
        &self.config
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    pub fn into_sink(self) -> S {
        self.sink
    }

    /// Drive the stream to the next returnable line. `None` at EOF.
    fn advance(&mut self) -> Option<(ElementType, Option<Report>)> {
        if self.finished {
            return None;
        }
        loop {
            let token = self.tokenizer.next_token();
            match token.kind {
                TokenKind::Space | TokenKind::Eol | TokenKind::Comment => continue,
                TokenKind::Eof => {
                    self.finished = true;
                    tracing::debug!(
                        records = self.stats.records,
                        warnings = self.stats.warnings,
                        errors = self.stats.errors,
                        "end of input"
                    );
                    return None;
                }
                TokenKind::Word => {}
                _ => {
                    self.reject_keyword(&token);
                    continue;
                }
            }

            let Some(element_type) = ElementType::from_keyword(&token.text()) else {
                self.reject_keyword(&token);
                continue;
            };
            let line = token.position.line;
            let Some(parser) = self.parsers.get_mut(&element_type) else {
                tracing::trace!(line, element = element_type.name(), "unsupported element");
                self.stats.warnings += 1;
                self.emit(Diagnostic::for_line(
                    DiagnosticKind::UnsupportedElementWarning,
                    messages::unsupported_element(element_type.name()),
                    line,
                ));
                self.tokenizer.skip_line();
                continue;
            };

            tracing::trace!(line, element = element_type.name(), "dispatching line");
            match parser.drive(&mut self.tokenizer) {
                Status::Success => {
                    self.stats.records += 1;
                    return Some((element_type, None));
                }
                Status::Warning(report) => {
                    self.stats.records += 1;
                    self.stats.warnings += 1;
                    self.emit(Diagnostic::for_line(report.kind, &*report.message, line));
                    return Some((element_type, Some(report)));
                }
                Status::Error(failure) => {
                    self.stats.errors += 1;
                    self.fail(failure);
                }
            }
        }
    }

    /// Report a parser failure and resynchronize on the next line.
    fn fail(&mut self, failure: Failure) {
        let Failure { report, token } = failure;
        let source_line = match token.kind {
            // the terminator has already been consumed
            TokenKind::Eol => self.tokenizer.previous_line(),
            TokenKind::Eof => self.tokenizer.current_line(),
            _ => self.tokenizer.skip_line(),
        };
        self.emit(Diagnostic::at_token(
            report.kind,
            &*report.message,
            &token,
            source_line,
        ));
    }

    /// A line whose first token is not a known keyword.
    fn reject_keyword(&mut self, token: &Token) {
        let kind = if token.kind == TokenKind::Unknown {
            DiagnosticKind::LexicalError
        } else {
            DiagnosticKind::SyntaxError
        };
        self.stats.errors += 1;
        let source_line = self.tokenizer.skip_line();
        self.emit(Diagnostic::at_token(
            kind,
            messages::bad_element_name(),
            token,
            source_line,
        ));
    }

    fn emit(&mut self, diagnostic: Diagnostic) {
        let suppressed = if diagnostic.is_error() {
            self.config.ignore_errors
        } else {
            self.config.ignore_warnings
        };
        if !suppressed {
            self.sink.emit(diagnostic);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::Severity;

    fn dispatcher(text: &str) -> Dispatcher<&[u8], Vec<Diagnostic>> {
        Dispatcher::with_sink(text.as_bytes(), Registry::standard().unwrap(), Vec::new())
    }

    fn types(d: &mut Dispatcher<&[u8], Vec<Diagnostic>>) -> Vec<ElementType> {
        let mut out = Vec::new();
        loop {
            match d.next() {
                Item::EndOfFile => return out,
                item => out.push(item.element_type()),
            }
        }
    }

    #[test]
    fn test_blank_and_comment_lines_are_skipped() {
        let mut d = dispatcher("\n   \n# header\nv 1 2 3\n\n");
        assert_eq!(types(&mut d), vec![ElementType::Vertex]);
        assert!(d.sink().is_empty());
    }

    #[test]
    fn test_end_of_file_is_sticky() {
        let mut d = dispatcher("v 1 2 3");
        assert!(!d.next().is_end_of_file());
        assert!(d.next().is_end_of_file());
        assert!(d.next().is_end_of_file());
        assert_eq!(d.next().element_type(), ElementType::EndOfFile);
    }

    #[test]
    fn test_bad_keyword() {
        let mut d = dispatcher("vx 1 2 3\nv 1 2 3\n");
        assert_eq!(types(&mut d), vec![ElementType::Vertex]);
        let diagnostics = d.sink();
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].kind, DiagnosticKind::SyntaxError);
        assert_eq!(diagnostics[0].message, "error in the name of the element type");
        assert_eq!(diagnostics[0].token, "vx");
        assert_eq!(diagnostics[0].source_line, "vx 1 2 3");
        assert_eq!(diagnostics[0].line, 0);
    }

    #[test]
    fn test_leading_number_is_rejected() {
        let mut d = dispatcher("1 2 3\n");
        assert!(types(&mut d).is_empty());
        assert_eq!(d.sink()[0].token, "1");
        assert_eq!(d.stats().errors, 1);
    }

    #[test]
    fn test_unsupported_element() {
        let mut d = dispatcher("curv 0 1 2 3\nv 1 2 3\n");
        assert_eq!(types(&mut d), vec![ElementType::Vertex]);
        let diagnostics = d.sink();
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].kind, DiagnosticKind::UnsupportedElementWarning);
        assert_eq!(diagnostics[0].severity(), Severity::Warning);
        assert_eq!(diagnostics[0].message, "unsupported element format - curve");
    }

    #[test]
    fn test_error_at_end_of_line_keeps_next_line() {
        let mut d = dispatcher("v 1 2\nv 4 5 6\n");
        assert_eq!(types(&mut d), vec![ElementType::Vertex]);
        let diagnostics = d.sink();
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].token, "eol");
        assert_eq!(diagnostics[0].source_line, "v 1 2");
        assert_eq!(diagnostics[0].line, 0);
    }

    #[test]
    fn test_error_at_end_of_input() {
        let mut d = dispatcher("v 1 2");
        assert!(types(&mut d).is_empty());
        assert_eq!(d.sink()[0].token, "eof");
        assert_eq!(d.sink()[0].source_line, "v 1 2");
    }

    #[test]
    fn test_error_mid_line_skips_rest() {
        let mut d = dispatcher("v 1 x 3 4 5\nvn 0 0 1\n");
        assert_eq!(types(&mut d), vec![ElementType::VertexNormal]);
        assert_eq!(d.sink()[0].token, "x");
        assert_eq!(d.sink()[0].column, 4);
        assert_eq!(d.sink()[0].source_line, "v 1 x 3 4 5");
    }

    #[test]
    fn test_ignore_flags() {
        let config = ParserConfig::default()
            .with_ignore_errors(true)
            .with_ignore_warnings(true);
        let mut d = Dispatcher::with_config(
            "vx\ncurv 1\nv 1 2\nv 1 2 3\n".as_bytes(),
            Registry::standard().unwrap(),
            Vec::new(),
            config,
        );
        assert_eq!(types(&mut d), vec![ElementType::Vertex]);
        assert!(d.sink().is_empty());
        assert_eq!(
            d.stats(),
            DispatchStats {
                records: 1,
                warnings: 1,
                errors: 2
            }
        );
    }

    #[test]
    fn test_other_statements() {
        let mut d = dispatcher("o cube\ng front left\nusemtl red\nlod 3\nbevel on\n");
        let mut seen = Vec::new();
        loop {
            match d.next() {
                Item::EndOfFile => break,
                Item::Element {
                    element_type,
                    outcome,
                } => {
                    let record = outcome.record().unwrap();
                    seen.push((element_type, record.clone()));
                }
            }
        }
        assert_eq!(seen.len(), 5);
        assert_eq!(seen[0].1.text(0), Some("cube"));
        assert_eq!(seen[1].1.repeated(0).len(), 2);
        assert_eq!(seen[3].1.int(0), Some(3));
        assert_eq!(seen[4].1.bool(0), Some(true));
        assert!(d.sink().is_empty());
    }
}
