// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Element Schemas
//!
//! Declarative description of the fields of one OBJ statement. A [`Schema`]
//! is plain data: it is validated and compiled once, at registration time,
//! into a [`CompiledFsm`](crate::fsm::CompiledFsm).
//!
//! ```rust,ignore
//! use obj_lite_core::schema::{FieldSpec, Schema, ScalarSpec, CompositeSpec, Delimiter, ValueKind};
//!
//! // f v1[/vt1[/vn1]] v2[/vt2[/vn2]] v3[/vt3[/vn3]] ...
//! let face = Schema::new(vec![FieldSpec::repeated(
//!     "vertex",
//!     CompositeSpec::new("vertex", Delimiter::Slash)
//!         .field(ScalarSpec::new("index", ValueKind::Int))
//!         .field(ScalarSpec::new("texture", ValueKind::Int).optional())
//!         .field(ScalarSpec::new("normal", ValueKind::Int).optional()),
//!     3,
//! )]);
//! ```

use std::fmt;

use crate::error::SchemaError;
use crate::tokenizer::TokenKind;

/// Upper bound on the subfields of one composite. Optional subfields of a
/// repeated composite multiply the compiled state count by two each.
pub const MAX_SUBFIELDS: usize = 8;

/// Scalar value kinds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValueKind {
    Int,
    /// Accepts Int lexemes as well as Float lexemes.
    Float,
    /// `on` / `off`
    Bool,
    /// Any run without whitespace or slashes (`Material.001`, `my-cube`)
    String,
    /// One of the listed words; stored as the variant index
    Enum(Vec<String>),
}

impl ValueKind {
    /// Token kind named in diagnostics as the expected one.
    pub fn expected_token(&self) -> TokenKind {
        match self {
            ValueKind::Int => TokenKind::Int,
            ValueKind::Float => TokenKind::Float,
            ValueKind::Bool | ValueKind::String | ValueKind::Enum(_) => TokenKind::Word,
        }
    }

    /// Whether a token of `kind` is lexically acceptable for this value kind.
    pub fn accepts(&self, kind: TokenKind) -> bool {
        match self {
            ValueKind::Int => kind == TokenKind::Int,
            ValueKind::Float => matches!(kind, TokenKind::Int | TokenKind::Float),
            ValueKind::String => matches!(
                kind,
                TokenKind::Word | TokenKind::Int | TokenKind::Float | TokenKind::Unknown
            ),
            ValueKind::Bool | ValueKind::Enum(_) => kind == TokenKind::Word,
        }
    }

    #[inline]
    pub fn is_numeric(&self) -> bool {
        matches!(self, ValueKind::Int | ValueKind::Float)
    }
}

/// Separator between the subfields of a composite field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Delimiter {
    Space,
    Slash,
}

impl Delimiter {
    pub fn token(self) -> TokenKind {
        match self {
            Delimiter::Space => TokenKind::Space,
            Delimiter::Slash => TokenKind::Slash,
        }
    }
}

/// A single value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScalarSpec {
    pub name: String,
    pub kind: ValueKind,
    pub optional: bool,
    /// Recognized but not supported: when present, the line completes with
    /// an extra-parameter warning.
    pub unsupported: bool,
}

impl ScalarSpec {
    pub fn new(name: impl Into<String>, kind: ValueKind) -> Self {
        Self {
            name: name.into(),
            kind,
            optional: false,
            unsupported: false,
        }
    }

    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }

    /// Mark the field as accepted but unsupported. Implies nothing about
    /// optionality; validation requires it to be optional as well.
    pub fn unsupported(mut self) -> Self {
        self.unsupported = true;
        self
    }
}

/// A fixed group of numeric subfields joined by one delimiter kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompositeSpec {
    pub name: String,
    pub delimiter: Delimiter,
    pub fields: Vec<ScalarSpec>,
}

impl CompositeSpec {
    pub fn new(name: impl Into<String>, delimiter: Delimiter) -> Self {
        Self {
            name: name.into(),
            delimiter,
            fields: Vec::new(),
        }
    }

    pub fn field(mut self, field: ScalarSpec) -> Self {
        self.fields.push(field);
        self
    }

    /// Number of leading required subfields.
    pub fn required_count(&self) -> usize {
        self.fields.iter().take_while(|f| !f.optional).count()
    }

    pub fn has_optional(&self) -> bool {
        self.fields.iter().any(|f| f.optional)
    }
}

/// Element of a repeated field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RepeatedElement {
    Scalar(ScalarSpec),
    Composite(CompositeSpec),
}

/// A variable-length, ordered run of elements with a minimum count.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepeatedSpec {
    pub name: String,
    pub element: RepeatedElement,
    pub min_count: usize,
}

/// One field of a schema.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldSpec {
    Scalar(ScalarSpec),
    Composite(CompositeSpec),
    Repeated(RepeatedSpec),
}

impl FieldSpec {
    pub fn scalar(name: impl Into<String>, kind: ValueKind) -> Self {
        FieldSpec::Scalar(ScalarSpec::new(name, kind))
    }

    pub fn optional(name: impl Into<String>, kind: ValueKind) -> Self {
        FieldSpec::Scalar(ScalarSpec::new(name, kind).optional())
    }

    pub fn composite(spec: CompositeSpec) -> Self {
        FieldSpec::Composite(spec)
    }

    pub fn repeated(name: impl Into<String>, element: impl Into<RepeatedElement>, min_count: usize) -> Self {
        FieldSpec::Repeated(RepeatedSpec {
            name: name.into(),
            element: element.into(),
            min_count,
        })
    }

    pub fn name(&self) -> &str {
        match self {
            FieldSpec::Scalar(s) => &s.name,
            FieldSpec::Composite(c) => &c.name,
            FieldSpec::Repeated(r) => &r.name,
        }
    }

    /// True if the field may be left out entirely.
    pub fn is_optional(&self) -> bool {
        matches!(self, FieldSpec::Scalar(s) if s.optional)
    }
}

impl From<ScalarSpec> for RepeatedElement {
    fn from(spec: ScalarSpec) -> Self {
        RepeatedElement::Scalar(spec)
    }
}

impl From<CompositeSpec> for RepeatedElement {
    fn from(spec: CompositeSpec) -> Self {
        RepeatedElement::Composite(spec)
    }
}

/// Ordered list of fields for one element type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Schema {
    fields: Vec<FieldSpec>,
}

impl Schema {
    pub fn new(fields: Vec<FieldSpec>) -> Self {
        Self { fields }
    }

    pub fn fields(&self) -> &[FieldSpec] {
        &self.fields
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Check every structural invariant. Runs once, before compilation.
    pub fn validate(&self) -> Result<(), SchemaError> {
        if self.fields.is_empty() {
            return Err(SchemaError::EmptySchema);
        }

        let last = self.fields.len() - 1;
        let mut repeated = self.fields.iter().filter_map(|field| match field {
            FieldSpec::Repeated(spec) => Some(spec),
            _ => None,
        });
        if let (Some(_), Some(second)) = (repeated.next(), repeated.next()) {
            return Err(SchemaError::MultipleRepeated(second.name.clone()));
        }

        let mut seen_optional = false;
        for (index, field) in self.fields.iter().enumerate() {
            if field.name().is_empty() {
                return Err(SchemaError::EmptyName(index));
            }
            match field {
                FieldSpec::Scalar(scalar) => {
                    validate_scalar(scalar)?;
                    if scalar.optional {
                        seen_optional = true;
                    } else if seen_optional {
                        return Err(SchemaError::OptionalNotTrailing(scalar.name.clone()));
                    }
                }
                FieldSpec::Composite(composite) => {
                    if seen_optional {
                        return Err(SchemaError::OptionalNotTrailing(composite.name.clone()));
                    }
                    validate_composite(composite)?;
                    if composite.has_optional() && index != last {
                        return Err(SchemaError::OptionalCompositeNotLast(composite.name.clone()));
                    }
                }
                FieldSpec::Repeated(repeated) => {
                    if index != last {
                        return Err(SchemaError::RepeatedNotLast(repeated.name.clone()));
                    }
                    if seen_optional {
                        return Err(SchemaError::OptionalNotTrailing(repeated.name.clone()));
                    }
                    if repeated.min_count == 0 {
                        return Err(SchemaError::ZeroMinCount(repeated.name.clone()));
                    }
                    match &repeated.element {
                        RepeatedElement::Scalar(scalar) => {
                            validate_scalar(scalar)?;
                            if scalar.optional {
                                return Err(SchemaError::OptionalRepeated(repeated.name.clone()));
                            }
                        }
                        RepeatedElement::Composite(composite) => validate_composite(composite)?,
                    }
                }
            }
        }
        Ok(())
    }
}

impl From<Vec<FieldSpec>> for Schema {
    fn from(fields: Vec<FieldSpec>) -> Self {
        Self::new(fields)
    }
}

impl fmt::Display for Schema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.fields.iter().map(FieldSpec::name).collect();
        write!(f, "[{}]", names.join(", "))
    }
}

fn validate_scalar(scalar: &ScalarSpec) -> Result<(), SchemaError> {
    if let ValueKind::Enum(variants) = &scalar.kind {
        if variants.is_empty() {
            return Err(SchemaError::EmptyEnum(scalar.name.clone()));
        }
    }
    if scalar.unsupported && !scalar.optional {
        return Err(SchemaError::UnsupportedNotOptional(scalar.name.clone()));
    }
    Ok(())
}

fn validate_composite(composite: &CompositeSpec) -> Result<(), SchemaError> {
    let Some(first) = composite.fields.first() else {
        return Err(SchemaError::EmptyComposite(composite.name.clone()));
    };
    if first.optional {
        return Err(SchemaError::FirstSubfieldOptional(composite.name.clone()));
    }
    if composite.fields.len() > MAX_SUBFIELDS {
        return Err(SchemaError::TooManySubfields(composite.name.clone()));
    }
    let mut seen_optional = false;
    for (index, sub) in composite.fields.iter().enumerate() {
        if sub.name.is_empty() {
            return Err(SchemaError::EmptySubfieldName {
                composite: composite.name.clone(),
                index,
            });
        }
        if !sub.kind.is_numeric() {
            return Err(SchemaError::NonNumericSubfield(sub.name.clone()));
        }
        if sub.unsupported {
            return Err(SchemaError::UnsupportedNotOptional(sub.name.clone()));
        }
        if sub.optional {
            if composite.delimiter == Delimiter::Space {
                return Err(SchemaError::OptionalInSpaceComposite(composite.name.clone()));
            }
            seen_optional = true;
        } else if seen_optional {
            return Err(SchemaError::OptionalNotTrailing(sub.name.clone()));
        }
    }
    Ok(())
}
