// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Error types for schema registration and byte-source faults.
//!
//! Malformed input lines are not errors in this sense: they surface as
//! [`Report`](crate::fsm::Report)s and [`Diagnostic`](crate::diagnostics::Diagnostic)s
//! and never abort the stream.

use thiserror::Error;

/// Result type alias for fallible registration and I/O.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while building a registry or reading input.
#[derive(Error, Debug)]
pub enum Error {
    /// A schema failed validation and nothing was installed.
    #[error("invalid schema for '{keyword}': {source}")]
    Schema {
        keyword: String,
        #[source]
        source: SchemaError,
    },

    /// The keyword is not one of the known OBJ statements.
    #[error("unknown element keyword: '{0}'")]
    UnknownKeyword(String),

    /// The underlying byte source failed.
    #[error("read error at offset {offset}: {source}")]
    Io {
        offset: usize,
        #[source]
        source: std::io::Error,
    },
}

/// A violated schema invariant. Produced once, by [`Schema::validate`](crate::schema::Schema::validate)
/// or [`compile`](crate::fsm::compile), never per input line.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SchemaError {
    #[error("the schema has no fields")]
    EmptySchema,

    #[error("field {0} has an empty name")]
    EmptyName(usize),

    #[error("subfield {index} of the composite field '{composite}' has an empty name")]
    EmptySubfieldName { composite: String, index: usize },

    #[error("the required field '{0}' follows an optional field")]
    OptionalNotTrailing(String),

    #[error("the repeated field '{0}' must be the last field")]
    RepeatedNotLast(String),

    #[error("the schema declares more than one repeated field ('{0}')")]
    MultipleRepeated(String),

    #[error("the subfield '{0}' of a composite field must be an int or a float")]
    NonNumericSubfield(String),

    #[error("the composite field '{0}' is space-delimited and cannot contain optional subfields")]
    OptionalInSpaceComposite(String),

    #[error("the first subfield of the composite field '{0}' cannot be optional")]
    FirstSubfieldOptional(String),

    #[error("the composite field '{0}' has no subfields")]
    EmptyComposite(String),

    #[error("the repeated field '{0}' must have a minimum count of at least one")]
    ZeroMinCount(String),

    #[error("the enum field '{0}' declares no variants")]
    EmptyEnum(String),

    #[error("the field '{0}' is flagged unsupported but is not optional")]
    UnsupportedNotOptional(String),

    #[error("the composite field '{0}' has optional subfields and must be the last field")]
    OptionalCompositeNotLast(String),

    #[error("the repeated field '{0}' cannot be optional")]
    OptionalRepeated(String),

    #[error("the composite field '{0}' has more than {max} subfields", max = crate::schema::MAX_SUBFIELDS)]
    TooManySubfields(String),
}
