// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Repeated composite fields.
//!
//! The first repetition decides which optional subfields are present. Its
//! probing states are keyed by `(position, presence mask)` and generated
//! from a FIFO worklist, so allocation order is deterministic and nothing
//! recurses. Every mask the probes can end with gets its own chain of
//! continuation states that replays that mask for repetitions `2..=min` and
//! for the unbounded tail. A repetition that deviates from the mask is a
//! format consistency error.

use std::collections::VecDeque;

use rustc_hash::FxHashMap;

use super::compiler::{Builder, LineEnd};
use super::messages;
use super::{Action, Place, StateId};
use crate::diagnostics::DiagnosticKind;
use crate::schema::CompositeSpec;
use crate::tokenizer::TokenKind;

/// Which optional subfields the first repetition carried, one bit per position.
type Mask = u64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Probe {
    /// Subfield `next - 1` of the first repetition was just read
    After { next: usize, present: Mask },
    /// A delimiter was just read; subfield `at` may follow
    Slot { at: usize, present: Mask },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Repetition {
    /// 1-based
    Nth(usize),
    Additional,
}

pub(super) struct RepeatedComposite<'a> {
    b: &'a mut Builder,
    field: usize,
    name: &'a str,
    spec: &'a CompositeSpec,
    min: usize,
    end: &'a LineEnd,
    required: usize,
    delimiter: TokenKind,
    probes: FxHashMap<Probe, StateId>,
    pending: VecDeque<Probe>,
    continuations: FxHashMap<Mask, StateId>,
}

impl<'a> RepeatedComposite<'a> {
    pub(super) fn new(
        b: &'a mut Builder,
        field: usize,
        name: &'a str,
        spec: &'a CompositeSpec,
        min: usize,
        end: &'a LineEnd,
    ) -> Self {
        Self {
            b,
            field,
            name,
            spec,
            min,
            end,
            required: spec.required_count(),
            delimiter: spec.delimiter.token(),
            probes: FxHashMap::default(),
            pending: VecDeque::new(),
            continuations: FxHashMap::default(),
        }
    }

    /// Emit every state. `first` is the value state for subfield 0 of the
    /// first repetition.
    pub(super) fn build(mut self, first: StateId) {
        let spec = self.spec;
        let delimiter = self.delimiter;
        let rep = Repetition::Nth(1);
        let rep_name = self.rep_name(rep);
        let mut value = first;

        // Required prefix of the first repetition.
        for j in 0..self.required {
            let name = self.sub_name(j, rep);
            let after = self.b.state(&rep_name);
            let action = self.action(j, &name);
            self.b.set_action(after, action);
            self.b.on_value(value, &spec.fields[j].kind, after);
            let missing = self.missing_in(rep, j);
            self.b.line_end(value, &missing);

            if j + 1 < self.required {
                let next_name = self.sub_name(j + 1, rep);
                let next = self.b.value_state(&next_name, &spec.fields[j + 1].kind);
                let between = messages::delimiter_between(&name, &next_name);
                self.b
                    .fill(after, |kind| messages::invalid(&between, delimiter.as_str(), kind));
                self.b.on(after, delimiter, next);
                let missing = self.missing_in(rep, j + 1);
                self.b.line_end(after, &missing);
                value = next;
            } else {
                let probe = Probe::After {
                    next: self.required,
                    present: 0,
                };
                self.probes.insert(probe, after);
                self.pending.push_back(probe);
            }
        }

        while let Some(probe) = self.pending.pop_front() {
            let Some(&state) = self.probes.get(&probe) else {
                continue;
            };
            match probe {
                Probe::After { next, present } => self.after(state, next, present),
                Probe::Slot { at, present } => self.slot(state, at, present),
            }
        }
    }

    /// A value was just read in the first repetition.
    fn after(&mut self, state: StateId, next: usize, present: Mask) {
        if next < self.spec.fields.len() {
            let slot = self.probe(Probe::Slot { at: next, present });
            let delimiter = self.delimiter;
            self.b.on(state, delimiter, slot);
        }
        let continuation = self.continuation(present);
        self.b.on(state, TokenKind::Space, continuation);
        let end = self.reps_from(self.following(Repetition::Nth(1)));
        self.b.line_end(state, &end);
    }

    /// A delimiter was just read in the first repetition.
    fn slot(&mut self, state: StateId, at: usize, present: Mask) {
        let spec = self.spec;
        let delimiter = self.delimiter;
        let after = self.probe(Probe::After {
            next: at + 1,
            present: present | (1 << at),
        });
        self.b.on_value(state, &spec.fields[at].kind, after);
        if at + 1 < spec.fields.len() {
            // Empty subfield, as in `1//3`
            let gap = self.probe(Probe::Slot { at: at + 1, present });
            self.b.on(state, delimiter, gap);
        }
    }

    fn probe(&mut self, probe: Probe) -> StateId {
        if let Some(&state) = self.probes.get(&probe) {
            return state;
        }
        let spec = self.spec;
        let rep = Repetition::Nth(1);
        let state = match probe {
            Probe::After { next, .. } => {
                let rep_name = self.rep_name(rep);
                let state = self.b.state(&rep_name);
                let name = self.sub_name(next - 1, rep);
                let action = self.action(next - 1, &name);
                self.b.set_action(state, action);
                state
            }
            Probe::Slot { at, .. } => {
                let name = self.sub_name(at, rep);
                self.b.value_state(&name, &spec.fields[at].kind)
            }
        };
        self.probes.insert(probe, state);
        self.pending.push_back(probe);
        state
    }

    /// Chains enforcing `present` for repetitions 2.. and the tail.
    fn continuation(&mut self, present: Mask) -> StateId {
        if let Some(&state) = self.continuations.get(&present) {
            return state;
        }
        let additional = self.repetition(present, Repetition::Additional, None);
        let mut next = additional;
        for i in (2..=self.min).rev() {
            next = self.repetition(present, Repetition::Nth(i), Some(next));
        }
        self.continuations.insert(present, next);
        next
    }

    /// One repetition replaying `present`. Whitespace after it leads to
    /// `next`, or back to its own start when `None`.
    fn repetition(&mut self, present: Mask, rep: Repetition, next: Option<StateId>) -> StateId {
        let spec = self.spec;
        let fields = &spec.fields;
        let delimiter = self.delimiter;
        let required = self.required;
        let has = move |j: usize| j < required || present & (1 << j) != 0;
        let last = (0..fields.len()).rev().find(|&j| has(j)).unwrap_or(0);
        let rep_name = self.rep_name(rep);

        let first_name = self.sub_name(0, rep);
        let start = self.b.value_state(&first_name, &fields[0].kind);
        let end = self.reps_from(rep);
        self.b.line_end(start, &end);

        // `current` reads position j: a value state, or a gap state that
        // only lets the delimiter through.
        let mut current = start;
        for j in 0..=last {
            let sub = &fields[j];
            let after = if has(j) {
                let name = self.sub_name(j, rep);
                let after = self.b.state(&rep_name);
                let action = self.action(j, &name);
                self.b.set_action(after, action);
                self.b.on_value(current, &sub.kind, after);
                if j >= required {
                    let message = messages::missing_for(&sub.name, &rep_name, self.name);
                    self.b
                        .fail(current, delimiter, DiagnosticKind::FormatConsistencyError, message);
                }
                after
            } else {
                let message = messages::extra_for(&sub.name, &rep_name, self.name);
                self.b
                    .fail_value(current, &sub.kind, DiagnosticKind::FormatConsistencyError, &message);
                current
            };
            if j == last {
                current = after;
                break;
            }

            let following = if has(j + 1) {
                let name = self.sub_name(j + 1, rep);
                self.b.value_state(&name, &fields[j + 1].kind)
            } else {
                self.b.state(&rep_name)
            };
            let upcoming = (j + 1..=last).find(|&q| has(q)).unwrap_or(last);
            if upcoming >= required {
                let message = messages::missing_for(&fields[upcoming].name, &rep_name, self.name);
                self.b
                    .fail_gap(after, DiagnosticKind::FormatConsistencyError, &message);
            } else {
                let missing = self.missing_in(rep, j + 1);
                self.b.line_end(after, &missing);
            }
            self.b.on(after, delimiter, following);
            current = following;
        }

        // End of the repetition.
        if delimiter == TokenKind::Slash && last + 1 < fields.len() {
            let message = messages::extra_for(&fields[last + 1].name, &rep_name, self.name);
            self.b.fail(
                current,
                TokenKind::Slash,
                DiagnosticKind::FormatConsistencyError,
                message,
            );
        }
        self.b.on(current, TokenKind::Space, next.unwrap_or(start));
        let end = self.reps_from(self.following(rep));
        self.b.line_end(current, &end);
        start
    }

    fn action(&self, j: usize, name: &str) -> Action {
        let place = if j == 0 {
            Place::Open {
                width: self.spec.fields.len(),
            }
        } else {
            Place::Last(j)
        };
        Action::store(self.field, place, &self.spec.fields[j].kind, name)
    }

    fn rep_name(&self, rep: Repetition) -> String {
        match rep {
            Repetition::Nth(i) => messages::numbered(self.name, i),
            Repetition::Additional => messages::additional(self.name),
        }
    }

    fn sub_name(&self, j: usize, rep: Repetition) -> String {
        messages::sub_of(&self.spec.fields[j].name, &self.rep_name(rep))
    }

    fn following(&self, rep: Repetition) -> Repetition {
        match rep {
            Repetition::Nth(i) if i < self.min => Repetition::Nth(i + 1),
            _ => Repetition::Additional,
        }
    }

    /// Line end before repetition `rep` has started.
    fn reps_from(&self, rep: Repetition) -> LineEnd {
        match rep {
            Repetition::Nth(i) if i <= self.min => LineEnd::Missing(
                (i..=self.min)
                    .map(|k| messages::numbered(self.name, k))
                    .collect(),
            ),
            _ => self.end.clone(),
        }
    }

    /// Line end inside repetition `rep`, before subfield `j`.
    fn missing_in(&self, rep: Repetition, j: usize) -> LineEnd {
        if j == 0 {
            return self.reps_from(rep);
        }
        let mut names: Vec<String> = (j..self.required).map(|s| self.sub_name(s, rep)).collect();
        if let LineEnd::Missing(rest) = self.reps_from(self.following(rep)) {
            names.extend(rest);
        }
        if names.is_empty() {
            self.end.clone()
        } else {
            LineEnd::Missing(names)
        }
    }
}
