// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! # OBJ-Lite Core Parser
//!
//! Streaming, error-recovering parser for Wavefront OBJ files. Each
//! statement type is described by a declarative [`Schema`] that is compiled
//! once into a table-driven automaton; lines are then parsed one token at a
//! time with no backtracking.
//!
//! ## Overview
//!
//! - **Tokenization**: byte-level lexer over any [`std::io::Read`] source,
//!   with exact line/column tracking and [memchr](https://docs.rs/memchr)
//!   based line skipping
//! - **Schema Compilation**: scalar, composite and repeated fields become a
//!   dense `(state, token kind)` transition table
//! - **Dispatch**: keyword lookup, per-line recovery and diagnostics that
//!   point at the offending token
//! - **Number parsing**: [lexical-core](https://docs.rs/lexical-core) for
//!   integers and [fast-float](https://docs.rs/fast-float) for floats
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use obj_lite_core::{Dispatcher, Element, ElementType, Face, Item, Registry, Vertex};
//!
//! let input = "v 0 0 0\nv 1 0 0\nv 0 1 0\nf 1 2 3\n";
//! let mut dispatcher = Dispatcher::new(input.as_bytes(), Registry::standard()?);
//!
//! loop {
//!     match dispatcher.next() {
//!         Item::EndOfFile => break,
//!         Item::Element { element_type, outcome } => {
//!             let record = outcome.record().unwrap();
//!             match element_type {
//!                 ElementType::Vertex => println!("{:?}", Vertex::from_record(record)),
//!                 ElementType::Face => println!("{:?}", Face::from_record(record)),
//!                 _ => {}
//!             }
//!         }
//!     }
//! }
//! ```
//!
//! ## Custom Schemas
//!
//! ```rust,ignore
//! use obj_lite_core::{FieldSpec, Registry, Schema, ValueKind};
//!
//! let mut builder = Registry::builder();
//! builder.register("lod", &Schema::new(vec![FieldSpec::scalar("level", ValueKind::Int)]))?;
//! let registry = builder.build();
//! ```
//!
//! ## Feature Flags
//!
//! - `serde`: Enable serialization support for records and diagnostics

pub mod config;
pub mod diagnostics;
pub mod dispatcher;
pub mod element;
pub mod elements;
pub mod error;
pub mod fsm;
pub mod keywords;
pub mod record;
pub mod registry;
pub mod schema;
pub mod tokenizer;

pub use config::ParserConfig;
pub use diagnostics::{
    Diagnostic, DiagnosticKind, DiagnosticSink, FnSink, Severity, TracingSink, WriterSink,
};
pub use dispatcher::{DispatchStats, Dispatcher, Item};
pub use element::{ElementParser, Failure, Outcome};
pub use elements::{
    Element, Face, FaceVertex, Line, LineVertex, Normal, ParameterVertex, Point, TextureVertex,
    Vertex,
};
pub use error::{Error, Result, SchemaError};
pub use fsm::{compile, compile_for, CompiledFsm, Report};
pub use keywords::ElementType;
pub use record::{FieldValue, Group, Record, Value};
pub use registry::{Lookup, Registry, RegistryBuilder};
pub use schema::{
    CompositeSpec, Delimiter, FieldSpec, RepeatedElement, RepeatedSpec, ScalarSpec, Schema,
    ValueKind,
};
pub use tokenizer::{Position, Token, TokenKind, Tokenizer};
