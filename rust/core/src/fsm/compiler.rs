// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Schema to table compilation.
//!
//! Fields are laid out left to right. Each value is read by a "value" state
//! whose accepted tokens lead to an "after" state; the after state owns the
//! store action and decides what may follow (a delimiter, the end of the
//! line, or trailing whitespace). Repeated composites are handed to
//! [`branches`](super::branches).

use std::sync::Arc;

use super::branches::RepeatedComposite;
use super::messages;
use super::{Action, CompiledFsm, Place, Report, Row, StateId, Transition, START, WARNING};
use crate::diagnostics::DiagnosticKind;
use crate::error::SchemaError;
use crate::record::Record;
use crate::schema::{
    CompositeSpec, Delimiter, FieldSpec, RepeatedElement, RepeatedSpec, ScalarSpec, Schema,
    ValueKind,
};
use crate::tokenizer::TokenKind;

/// Compile a schema under a generic element name.
pub fn compile(schema: &Schema) -> Result<CompiledFsm, SchemaError> {
    compile_for("element", schema)
}

/// Compile a schema. `element` is the human name used in messages
/// ("vertex", "face").
pub fn compile_for(element: &str, schema: &Schema) -> Result<CompiledFsm, SchemaError> {
    schema.validate()?;

    let fields = schema.fields();
    // suffix[i]: names still required when field i is about to be read
    let mut suffix: Vec<Vec<String>> = vec![Vec::new(); fields.len() + 1];
    for i in (0..fields.len()).rev() {
        let mut names = required_names(&fields[i]);
        names.extend(suffix[i + 1].iter().cloned());
        suffix[i] = names;
    }

    let mut b = Builder::new(element);
    let mut warning: Option<Report> = None;
    // After state of the previous field and the name of its last value
    let mut previous: Option<(StateId, String)> = None;

    for (index, field) in fields.iter().enumerate() {
        let first_name = first_value_name(field);
        let first = b.value_state(&first_name, first_kind(field));
        let end_here = LineEnd::after(&suffix[index], &warning);

        match &previous {
            None => {
                b.on(START, TokenKind::Space, first);
                b.line_end(START, &end_here);
            }
            Some((after, name)) => {
                let delimiter = messages::delimiter_between(name, &first_name);
                b.fill(*after, |kind| messages::invalid(&delimiter, "SPACE", kind));
                b.on(*after, TokenKind::Space, first);
                b.line_end(*after, &end_here);
            }
        }

        let end_after = LineEnd::after(&suffix[index + 1], &warning);
        previous = match field {
            FieldSpec::Scalar(spec) => {
                let after = scalar(&mut b, index, spec, first, &end_here);
                if spec.unsupported {
                    warning = Some(Report::new(
                        DiagnosticKind::ExtraParameterWarning,
                        messages::not_supported(&spec.name),
                    ));
                }
                Some((after, spec.name.clone()))
            }
            FieldSpec::Composite(spec) => {
                let (after, last) = composite(&mut b, index, spec, first, &suffix[index + 1], &end_after);
                Some((after, last))
            }
            FieldSpec::Repeated(spec) => {
                repeated(&mut b, index, spec, first, &end_after);
                None
            }
        };
    }

    if let Some((after, name)) = previous {
        let end = LineEnd::Accept(warning);
        b.trailer(after, &name, &end);
    }

    let fsm = b.finish(Record::for_schema(schema));
    tracing::trace!(element, states = fsm.state_count(), "compiled element table");
    Ok(fsm)
}

/// Names reported as missing when a line ends before `field`.
fn required_names(field: &FieldSpec) -> Vec<String> {
    match field {
        FieldSpec::Scalar(s) if s.optional => Vec::new(),
        FieldSpec::Scalar(s) => vec![s.name.clone()],
        FieldSpec::Composite(c) => c
            .fields
            .iter()
            .filter(|sub| !sub.optional)
            .map(|sub| messages::sub_of(&sub.name, &c.name))
            .collect(),
        FieldSpec::Repeated(r) => (1..=r.min_count)
            .map(|i| messages::numbered(&r.name, i))
            .collect(),
    }
}

fn first_value_name(field: &FieldSpec) -> String {
    match field {
        FieldSpec::Scalar(s) => s.name.clone(),
        FieldSpec::Composite(c) => c
            .fields
            .first()
            .map(|sub| messages::sub_of(&sub.name, &c.name))
            .unwrap_or_else(|| c.name.clone()),
        FieldSpec::Repeated(r) => match &r.element {
            RepeatedElement::Scalar(_) => messages::numbered(&r.name, 1),
            RepeatedElement::Composite(c) => c
                .fields
                .first()
                .map(|sub| messages::sub_of(&sub.name, &messages::numbered(&r.name, 1)))
                .unwrap_or_else(|| messages::numbered(&r.name, 1)),
        },
    }
}

fn first_kind(field: &FieldSpec) -> &ValueKind {
    match field {
        FieldSpec::Scalar(s) => &s.kind,
        FieldSpec::Composite(c) => &c.fields[0].kind,
        FieldSpec::Repeated(r) => match &r.element {
            RepeatedElement::Scalar(s) => &s.kind,
            RepeatedElement::Composite(c) => &c.fields[0].kind,
        },
    }
}

fn scalar(b: &mut Builder, field: usize, spec: &ScalarSpec, value: StateId, end: &LineEnd) -> StateId {
    let after = b.state(&spec.name);
    b.set_action(after, Action::store(field, Place::Field, &spec.kind, &spec.name));
    b.on_value(value, &spec.kind, after);
    // Missing for required fields, Accept for optional ones
    b.line_end(value, end);
    after
}

/// A non-repeated composite. Returns its final after state and the name of
/// its last subfield.
fn composite(
    b: &mut Builder,
    field: usize,
    spec: &CompositeSpec,
    first: StateId,
    later: &[String],
    end: &LineEnd,
) -> (StateId, String) {
    let names: Vec<String> = spec
        .fields
        .iter()
        .map(|sub| messages::sub_of(&sub.name, &spec.name))
        .collect();
    let missing_from = |j: usize| -> LineEnd {
        let mut missing: Vec<String> = spec.fields[j..]
            .iter()
            .zip(&names[j..])
            .filter(|(sub, _)| !sub.optional)
            .map(|(_, name)| name.clone())
            .collect();
        missing.extend(later.iter().cloned());
        if missing.is_empty() {
            end.clone()
        } else {
            LineEnd::Missing(missing)
        }
    };

    let delimiter = spec.delimiter.token();
    let mut value = first;
    let mut j = 0;
    loop {
        let sub = &spec.fields[j];
        let after = b.state(&names[j]);
        b.set_action(after, Action::store(field, Place::Sub(j), &sub.kind, &names[j]));
        b.on_value(value, &sub.kind, after);
        if !sub.optional {
            b.line_end(value, &missing_from(j));
        }

        let Some(next_sub) = spec.fields.get(j + 1) else {
            return (after, names[j].clone());
        };
        let next = b.value_state(&names[j + 1], &next_sub.kind);
        let between = messages::delimiter_between(&names[j], &names[j + 1]);
        b.fill(after, |kind| messages::invalid(&between, delimiter.as_str(), kind));
        b.on(after, delimiter, next);
        b.line_end(after, &missing_from(j + 1));
        if next_sub.optional && spec.delimiter == Delimiter::Slash {
            // The composite is the last field: whitespace closes it early.
            let tail = b.tail(end);
            b.on(after, TokenKind::Space, tail);
        }
        value = next;
        j += 1;
    }
}

/// A repeated field; always the last field of its schema.
fn repeated(b: &mut Builder, field: usize, spec: &RepeatedSpec, first: StateId, end: &LineEnd) {
    match &spec.element {
        RepeatedElement::Scalar(element) => repeated_scalar(b, field, spec, element, first, end),
        RepeatedElement::Composite(element) => {
            RepeatedComposite::new(b, field, &spec.name, element, spec.min_count, end).build(first)
        }
    }
}

fn repeated_scalar(
    b: &mut Builder,
    field: usize,
    spec: &RepeatedSpec,
    element: &ScalarSpec,
    first: StateId,
    end: &LineEnd,
) {
    let min = spec.min_count;
    let missing_from = |k: usize| -> LineEnd {
        LineEnd::Missing((k..=min).map(|i| messages::numbered(&spec.name, i)).collect())
    };
    let open = Place::Open { width: 1 };

    let mut value = first;
    let mut name = messages::numbered(&spec.name, 1);
    for k in 1..=min {
        let after = b.state(&name);
        b.set_action(after, Action::store(field, open, &element.kind, &name));
        b.on_value(value, &element.kind, after);
        b.line_end(value, &missing_from(k));

        let next_name = if k < min {
            messages::numbered(&spec.name, k + 1)
        } else {
            messages::additional(&spec.name)
        };
        let next = b.value_state(&next_name, &element.kind);
        let between = messages::delimiter_between(&name, &next_name);
        b.fill(after, |kind| messages::invalid(&between, "SPACE", kind));
        b.on(after, TokenKind::Space, next);
        if k < min {
            b.line_end(after, &missing_from(k + 1));
        } else {
            b.line_end(after, end);
        }
        value = next;
        name = next_name;
    }

    // Unbounded tail: `value` now reads the additional elements.
    let after = b.state(&name);
    b.set_action(after, Action::store(field, open, &element.kind, &name));
    b.on_value(value, &element.kind, after);
    b.line_end(value, end);
    let between = messages::delimiter_between(&name, &name);
    b.fill(after, |kind| messages::invalid(&between, "SPACE", kind));
    b.on(after, TokenKind::Space, value);
    b.line_end(after, end);
}

impl Action {
    pub(super) fn store(field: usize, place: Place, kind: &ValueKind, name: &str) -> Self {
        Self {
            field,
            place,
            kind: kind.clone(),
            name: Arc::from(name),
        }
    }
}

/// What a line terminator means in a given state.
#[derive(Debug, Clone)]
pub(super) enum LineEnd {
    /// Complete the line, with a warning if one was armed.
    Accept(Option<Report>),
    /// Fail naming the fields that were never read.
    Missing(Vec<String>),
}

impl LineEnd {
    fn after(missing: &[String], warning: &Option<Report>) -> Self {
        if missing.is_empty() {
            LineEnd::Accept(warning.clone())
        } else {
            LineEnd::Missing(missing.to_vec())
        }
    }
}

/// Syntax errors triggered by an Unknown token are lexical.
pub(super) fn report(kind: DiagnosticKind, received: TokenKind, message: String) -> Report {
    let kind = if received == TokenKind::Unknown && kind == DiagnosticKind::SyntaxError {
        DiagnosticKind::LexicalError
    } else {
        kind
    };
    Report::new(kind, message)
}

/// Mutable table under construction.
pub(crate) struct Builder {
    element: String,
    rows: Vec<Row>,
    actions: Vec<Option<Action>>,
}

impl Builder {
    pub(super) fn new(element: &str) -> Self {
        let mut b = Self {
            element: element.to_string(),
            rows: Vec::with_capacity(32),
            actions: Vec::with_capacity(32),
        };
        b.push_row(|kind| messages::impossible_at_start(kind));
        // ERROR and WARNING are terminal; their rows are never consulted.
        b.push_row(|kind| messages::impossible(element, kind));
        b.push_row(|kind| messages::impossible(element, kind));
        b
    }

    fn push_row(&mut self, message: impl Fn(TokenKind) -> String) -> StateId {
        let row: Row = std::array::from_fn(|i| {
            let kind = TokenKind::ALL[i];
            Transition::fail(report(DiagnosticKind::SyntaxError, kind, message(kind)))
        });
        self.rows.push(row);
        self.actions.push(None);
        self.rows.len() - 1
    }

    /// New state rejecting everything as an impossible token for `context`.
    pub(super) fn state(&mut self, context: &str) -> StateId {
        self.push_row(|kind| messages::impossible(context, kind))
    }

    /// New state rejecting everything as an invalid `name`.
    pub(super) fn value_state(&mut self, name: &str, kind: &ValueKind) -> StateId {
        let expected = kind.expected_token();
        self.push_row(|received| messages::invalid(name, expected.as_str(), received))
    }

    /// Overwrite every cell of `state` with a syntax error.
    pub(super) fn fill(&mut self, state: StateId, message: impl Fn(TokenKind) -> String) {
        for kind in TokenKind::ALL {
            self.rows[state][kind.index()] =
                Transition::fail(report(DiagnosticKind::SyntaxError, kind, message(kind)));
        }
    }

    pub(super) fn on(&mut self, state: StateId, token: TokenKind, target: StateId) {
        self.rows[state][token.index()] = Transition::to(target);
    }

    /// Accept every token kind `value` admits.
    pub(super) fn on_value(&mut self, state: StateId, value: &ValueKind, target: StateId) {
        for kind in TokenKind::ALL {
            if value.accepts(kind) {
                self.on(state, kind, target);
            }
        }
    }

    pub(super) fn fail(&mut self, state: StateId, token: TokenKind, kind: DiagnosticKind, message: String) {
        self.rows[state][token.index()] = Transition::fail(report(kind, token, message));
    }

    /// Reject every token kind `value` admits.
    pub(super) fn fail_value(
        &mut self,
        state: StateId,
        value: &ValueKind,
        kind: DiagnosticKind,
        message: &str,
    ) {
        for token in TokenKind::ALL {
            if value.accepts(token) {
                self.fail(state, token, kind, message.to_string());
            }
        }
    }

    /// Set EOL, EOF and comment cells. A comment always runs to the end of
    /// the line, so it ends the line like the terminator that follows it.
    pub(super) fn line_end(&mut self, state: StateId, end: &LineEnd) {
        for token in [TokenKind::Eol, TokenKind::Eof, TokenKind::Comment] {
            self.rows[state][token.index()] = match end {
                LineEnd::Accept(None) => Transition::to(START),
                LineEnd::Accept(Some(warning)) => Transition {
                    target: WARNING,
                    report: Some(warning.clone()),
                },
                LineEnd::Missing(names) => Transition::fail(report(
                    DiagnosticKind::SyntaxError,
                    token,
                    messages::not_specified(names),
                )),
            };
        }
    }

    /// Same for whitespace and line terminators: `message` for each.
    pub(super) fn fail_gap(&mut self, state: StateId, kind: DiagnosticKind, message: &str) {
        for token in [TokenKind::Space, TokenKind::Eol, TokenKind::Eof, TokenKind::Comment] {
            self.fail(state, token, kind, message.to_string());
        }
    }

    /// Trailing whitespace state: only the end of the line may follow.
    pub(super) fn tail(&mut self, end: &LineEnd) -> StateId {
        let element = self.element.clone();
        let tail = self.push_row(|kind| messages::unexpected_after(&element, kind));
        self.line_end(tail, end);
        tail
    }

    /// Close the record after the final value `name`.
    fn trailer(&mut self, after: StateId, name: &str, end: &LineEnd) {
        let context = messages::token_after(name);
        self.fill(after, |kind| messages::invalid(&context, "EOL", kind));
        let tail = self.tail(end);
        self.on(after, TokenKind::Space, tail);
        self.line_end(after, end);
    }

    pub(super) fn set_action(&mut self, state: StateId, action: Action) {
        debug_assert!(
            self.actions[state].as_ref().map_or(true, |a| *a == action),
            "conflicting actions for state {state}"
        );
        self.actions[state] = Some(action);
    }

    pub(super) fn finish(self, template: Record) -> CompiledFsm {
        CompiledFsm::from_parts(self.element, self.rows, self.actions, template)
    }
}
