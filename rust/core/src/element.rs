// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Element parser runtime
//!
//! Runs one compiled table over the tokens of a single line. The loop reads
//! exactly one token per step and never looks further ahead.

use std::io::Read;
use std::sync::Arc;

use crate::diagnostics::DiagnosticKind;
use crate::fsm::{messages, CompiledFsm, Report, ERROR, START, WARNING};
use crate::record::Record;
use crate::tokenizer::{Token, Tokenizer};

/// A failed line: what went wrong and the token it went wrong on.
#[derive(Debug, Clone, PartialEq)]
pub struct Failure {
    pub report: Report,
    pub token: Token,
}

/// Result of parsing one line.
#[derive(Debug, PartialEq)]
pub enum Outcome<'a> {
    Success(&'a Record),
    /// The record is usable; the report explains what was ignored
    Warning(&'a Record, Report),
    Error(Failure),
}

impl<'a> Outcome<'a> {
    pub fn record(&self) -> Option<&'a Record> {
        match self {
            Outcome::Success(record) | Outcome::Warning(record, _) => Some(record),
            Outcome::Error(_) => None,
        }
    }

    pub fn report(&self) -> Option<&Report> {
        match self {
            Outcome::Success(_) => None,
            Outcome::Warning(_, report) => Some(report),
            Outcome::Error(failure) => Some(&failure.report),
        }
    }

    #[inline]
    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Success(_))
    }

    #[inline]
    pub fn is_error(&self) -> bool {
        matches!(self, Outcome::Error(_))
    }
}

/// Owned counterpart of [`Outcome`], so callers can re-borrow the record
/// after the tokenizer borrow ends.
#[derive(Debug)]
pub(crate) enum Status {
    Success,
    Warning(Report),
    Error(Failure),
}

/// A compiled table plus its private, reused output record.
#[derive(Debug, Clone)]
pub struct ElementParser {
    fsm: Arc<CompiledFsm>,
    record: Record,
}

impl ElementParser {
    pub fn new(fsm: Arc<CompiledFsm>) -> Self {
        let record = fsm.new_record();
        Self { fsm, record }
    }

    pub fn fsm(&self) -> &CompiledFsm {
        &self.fsm
    }

    /// Record of the most recent run.
    pub fn record(&self) -> &Record {
        &self.record
    }

    /// Parse the rest of the current line. The keyword must already have
    /// been consumed.
    pub fn run<R: Read>(&mut self, tokenizer: &mut Tokenizer<R>) -> Outcome<'_> {
        match self.drive(tokenizer) {
            Status::Success => Outcome::Success(&self.record),
            Status::Warning(report) => Outcome::Warning(&self.record, report),
            Status::Error(failure) => Outcome::Error(failure),
        }
    }

    pub(crate) fn drive<R: Read>(&mut self, tokenizer: &mut Tokenizer<R>) -> Status {
        self.record.clear();
        let mut state = START;
        loop {
            let token = tokenizer.next_token();
            let Some(cell) = self.fsm.transition(state, token.kind) else {
                let report = Report::new(
                    DiagnosticKind::SyntaxError,
                    messages::impossible(self.fsm.element(), token.kind),
                );
                return Status::Error(Failure { report, token });
            };
            match cell.target {
                START => return Status::Success,
                WARNING => {
                    let report = cell.report.clone().unwrap_or_else(|| {
                        Report::new(DiagnosticKind::ExtraParameterWarning, "")
                    });
                    return Status::Warning(report);
                }
                ERROR => {
                    let report = cell.report.clone().unwrap_or_else(|| {
                        Report::new(
                            DiagnosticKind::SyntaxError,
                            messages::impossible(self.fsm.element(), token.kind),
                        )
                    });
                    return Status::Error(Failure { report, token });
                }
                target => {
                    if let Some(action) = self.fsm.action(target) {
                        if let Err(report) = action.apply(&token, &mut self.record) {
                            return Status::Error(Failure { report, token });
                        }
                    }
                    state = target;
                }
            }
        }
    }
}
