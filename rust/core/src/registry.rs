// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Keyword to parser registry
//!
//! Every OBJ keyword is recognized. A keyword with a registered schema maps
//! to its compiled table; the rest are known but unsupported. The registry
//! is assembled once through [`RegistryBuilder`] and is immutable afterwards.

use std::sync::Arc;

use rustc_hash::FxHashMap;

use crate::elements::{Element, Face, Line, Normal, ParameterVertex, Point, TextureVertex, Vertex};
use crate::error::{Error, Result};
use crate::fsm::{compile_for, CompiledFsm};
use crate::keywords::ElementType;
use crate::schema::{FieldSpec, ScalarSpec, Schema, ValueKind};

/// Result of looking up a leading keyword.
#[derive(Debug, Clone, Copy)]
pub enum Lookup<'a> {
    Compiled(ElementType, &'a Arc<CompiledFsm>),
    /// Known keyword without a schema
    Unsupported(ElementType),
    Unknown,
}

/// Mutable registry under construction.
#[derive(Debug, Default)]
pub struct RegistryBuilder {
    parsers: FxHashMap<ElementType, Arc<CompiledFsm>>,
}

impl RegistryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Compile `schema` and install it for `keyword`, replacing any earlier
    /// schema. On failure nothing is installed.
    pub fn register(&mut self, keyword: &str, schema: &Schema) -> Result<&mut Self> {
        let element_type = ElementType::from_keyword(keyword)
            .ok_or_else(|| Error::UnknownKeyword(keyword.to_string()))?;
        let fsm = compile_for(element_type.name(), schema).map_err(|source| Error::Schema {
            keyword: keyword.to_string(),
            source,
        })?;
        tracing::debug!(
            keyword,
            element = element_type.name(),
            states = fsm.state_count(),
            "registered element parser"
        );
        self.parsers.insert(element_type, Arc::new(fsm));
        Ok(self)
    }

    /// Register a typed element under its own keyword.
    pub fn register_element<E: Element>(&mut self) -> Result<&mut Self> {
        self.register(E::ELEMENT_TYPE.keyword(), &E::schema())
    }

    pub fn build(self) -> Registry {
        Registry {
            parsers: self.parsers,
        }
    }
}

/// Immutable keyword registry.
#[derive(Debug, Clone, Default)]
pub struct Registry {
    parsers: FxHashMap<ElementType, Arc<CompiledFsm>>,
}

impl Registry {
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::new()
    }

    /// Parsers for the statements this crate understands out of the box.
    pub fn standard() -> Result<Self> {
        let mut builder = RegistryBuilder::new();
        builder
            .register_element::<Vertex>()?
            .register_element::<TextureVertex>()?
            .register_element::<Normal>()?
            .register_element::<ParameterVertex>()?
            .register_element::<Point>()?
            .register_element::<Line>()?
            .register_element::<Face>()?
            .register("o", &single("object name", ValueKind::String))?
            .register("usemtl", &single("material name", ValueKind::String))?
            .register(
                "g",
                &Schema::new(vec![FieldSpec::repeated(
                    "group name",
                    ScalarSpec::new("group name", ValueKind::String),
                    1,
                )]),
            )?
            .register("lod", &single("level", ValueKind::Int))?;
        for t in [
            ElementType::BevelInterpolation,
            ElementType::ColorInterpolation,
            ElementType::DissolveInterpolation,
        ] {
            builder.register(t.keyword(), &single(t.name(), ValueKind::Bool))?;
        }
        Ok(builder.build())
    }

    pub fn lookup(&self, keyword: &str) -> Lookup<'_> {
        match ElementType::from_keyword(keyword) {
            Some(t) => match self.parsers.get(&t) {
                Some(fsm) => Lookup::Compiled(t, fsm),
                None => Lookup::Unsupported(t),
            },
            None => Lookup::Unknown,
        }
    }

    pub fn get(&self, element_type: ElementType) -> Option<&Arc<CompiledFsm>> {
        self.parsers.get(&element_type)
    }

    pub fn is_supported(&self, element_type: ElementType) -> bool {
        self.parsers.contains_key(&element_type)
    }

    /// Registered parsers (unordered)
    pub fn iter(&self) -> impl Iterator<Item = (ElementType, &Arc<CompiledFsm>)> {
        self.parsers.iter().map(|(t, fsm)| (*t, fsm))
    }

    pub fn len(&self) -> usize {
        self.parsers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parsers.is_empty()
    }
}

fn single(name: &str, kind: ValueKind) -> Schema {
    Schema::new(vec![FieldSpec::scalar(name, kind)])
}
