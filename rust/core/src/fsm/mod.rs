// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Compiled element automata
//!
//! A [`CompiledFsm`] is a dense table indexed by `(state, token kind)`. Every
//! cell names the next state; cells leading to [`ERROR`] or [`WARNING`] also
//! carry the [`Report`] to hand back. Entering a state may run that state's
//! [`Action`], which converts the current token and stores it in the output
//! [`Record`].
//!
//! Three states are reserved:
//!
//! - [`START`]: initial state, and the successful end of a line
//! - [`ERROR`]: terminal failure
//! - [`WARNING`]: terminal success that carries a report

mod branches;
mod compiler;
pub(crate) mod messages;

use std::fmt;
use std::sync::Arc;

use crate::diagnostics::DiagnosticKind;
use crate::record::{FieldValue, Group, Record, Value};
use crate::schema::ValueKind;
use crate::tokenizer::{Token, TokenKind, TOKEN_KINDS};

pub use compiler::{compile, compile_for};

/// Index of a state in a compiled table.
pub type StateId = usize;

pub const START: StateId = 0;
pub const ERROR: StateId = 1;
pub const WARNING: StateId = 2;
/// Number of reserved states; the first allocated state has this id.
pub const RESERVED_STATES: usize = 3;

/// A tagged message produced while running an automaton.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Report {
    pub kind: DiagnosticKind,
    pub message: Arc<str>,
}

impl Report {
    pub fn new(kind: DiagnosticKind, message: impl Into<Arc<str>>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

/// One table cell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    pub target: StateId,
    /// Set when `target` is [`ERROR`] or [`WARNING`].
    pub report: Option<Report>,
}

impl Transition {
    #[inline]
    pub(crate) fn to(target: StateId) -> Self {
        Self {
            target,
            report: None,
        }
    }

    #[inline]
    pub(crate) fn fail(report: Report) -> Self {
        Self {
            target: ERROR,
            report: Some(report),
        }
    }
}

/// Where a converted value lands in the record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Place {
    /// A scalar field
    Field,
    /// Subfield `j` of a composite field
    Sub(usize),
    /// Start a new repetition of `width` subfields with subfield 0
    Open { width: usize },
    /// Subfield `j` of the latest repetition
    Last(usize),
}

/// Conversion and storage performed when a state is entered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Action {
    /// Index of the schema field
    pub field: usize,
    pub place: Place,
    pub kind: ValueKind,
    /// Name used in conversion failures
    pub name: Arc<str>,
}

impl Action {
    /// Convert `token` and write it into `record`.
    pub(crate) fn apply(&self, token: &Token, record: &mut Record) -> Result<(), Report> {
        let value = convert(token, &self.kind, &self.name)?;
        let Some(field) = record.field_mut(self.field) else {
            return Ok(());
        };
        match (field, self.place) {
            (FieldValue::Scalar(slot), Place::Field) => *slot = Some(value),
            (FieldValue::Composite(group), Place::Sub(j)) => {
                if let Some(slot) = group.get_mut(j) {
                    *slot = Some(value);
                }
            }
            (FieldValue::Repeated(items), Place::Open { width }) => {
                let mut group: Group = std::iter::repeat(None).take(width.max(1)).collect();
                group[0] = Some(value);
                items.push(group);
            }
            (FieldValue::Repeated(items), Place::Last(j)) => {
                if let Some(slot) = items.last_mut().and_then(|g| g.get_mut(j)) {
                    *slot = Some(value);
                }
            }
            _ => {}
        }
        Ok(())
    }
}

/// Lexeme to value. Lexical shape has already been checked by the table;
/// this is the semantic layer.
fn convert(token: &Token, kind: &ValueKind, name: &str) -> Result<Value, Report> {
    let bytes = token.bytes();
    match kind {
        ValueKind::Int => lexical_core::parse::<i64>(bytes)
            .map(Value::Int)
            .map_err(|_| Report::new(DiagnosticKind::SemanticError, messages::not_integer(name))),
        ValueKind::Float => match fast_float::parse::<f64, _>(bytes) {
            Ok(f) if f.is_finite() => Ok(Value::Float(f)),
            _ => Err(Report::new(
                DiagnosticKind::SemanticError,
                messages::not_float(name),
            )),
        },
        ValueKind::Bool => match bytes {
            b"on" => Ok(Value::Bool(true)),
            b"off" => Ok(Value::Bool(false)),
            _ => Err(Report::new(
                DiagnosticKind::SemanticError,
                messages::not_bool(name),
            )),
        },
        ValueKind::String => Ok(Value::Text(token.text().into_owned())),
        ValueKind::Enum(variants) => {
            let text = token.text();
            variants
                .iter()
                .position(|v| v.as_str() == text)
                .map(Value::Enum)
                .ok_or_else(|| {
                    Report::new(
                        DiagnosticKind::SemanticError,
                        messages::not_variant(name, variants),
                    )
                })
        }
    }
}

pub(crate) type Row = [Transition; TOKEN_KINDS];

/// Immutable transition table for one element type. Shared between parsers
/// through an `Arc`.
#[derive(Debug, Clone)]
pub struct CompiledFsm {
    element: String,
    rows: Vec<Row>,
    actions: Vec<Option<Action>>,
    /// Empty record shaped after the schema
    template: Record,
}

impl CompiledFsm {
    pub(crate) fn from_parts(
        element: String,
        rows: Vec<Row>,
        actions: Vec<Option<Action>>,
        template: Record,
    ) -> Self {
        Self {
            element,
            rows,
            actions,
            template,
        }
    }

    /// A fresh, empty output record for this table.
    pub fn new_record(&self) -> Record {
        self.template.clone()
    }

    /// Name of the element the table was compiled for.
    pub fn element(&self) -> &str {
        &self.element
    }

    pub fn state_count(&self) -> usize {
        self.rows.len()
    }

    /// Cell for `(state, kind)`, or `None` for a state outside the table.
    #[inline]
    pub fn transition(&self, state: StateId, kind: TokenKind) -> Option<&Transition> {
        self.rows.get(state).map(|row| &row[kind.index()])
    }

    /// Action run when `state` is entered.
    #[inline]
    pub fn action(&self, state: StateId) -> Option<&Action> {
        self.actions.get(state).and_then(Option::as_ref)
    }
}
