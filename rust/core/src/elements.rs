// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Typed element views
//!
//! Each type owns the schema its statement is compiled from and knows how
//! to read itself back out of a parsed [`Record`].

use crate::keywords::ElementType;
use crate::record::{Group, Record, Value};
use crate::schema::{CompositeSpec, Delimiter, FieldSpec, ScalarSpec, Schema, ValueKind};

/// A statement with a fixed schema.
pub trait Element: Sized {
    const ELEMENT_TYPE: ElementType;

    fn schema() -> Schema;

    /// `None` if the record does not have this element's shape.
    fn from_record(record: &Record) -> Option<Self>;
}

fn int_at(group: &Group, j: usize) -> Option<i64> {
    group.get(j)?.as_ref().and_then(Value::as_int)
}

/// Geometric vertex: `v x y z [w]`
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Vertex {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    /// Weight for rational curves and surfaces; 0.0 when absent
    pub w: f64,
}

impl Element for Vertex {
    const ELEMENT_TYPE: ElementType = ElementType::Vertex;

    fn schema() -> Schema {
        Schema::new(vec![
            FieldSpec::scalar("X coordinate", ValueKind::Float),
            FieldSpec::scalar("Y coordinate", ValueKind::Float),
            FieldSpec::scalar("Z coordinate", ValueKind::Float),
            FieldSpec::optional("weight parameter", ValueKind::Float),
        ])
    }

    fn from_record(record: &Record) -> Option<Self> {
        Some(Self {
            x: record.float(0)?,
            y: record.float(1)?,
            z: record.float(2)?,
            w: record.float(3).unwrap_or(0.0),
        })
    }
}

/// Texture vertex: `vt u [v] [w]`
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TextureVertex {
    pub u: f64,
    pub v: Option<f64>,
    pub w: Option<f64>,
}

impl Element for TextureVertex {
    const ELEMENT_TYPE: ElementType = ElementType::TextureVertex;

    fn schema() -> Schema {
        Schema::new(vec![
            FieldSpec::scalar("horizontal direction", ValueKind::Float),
            FieldSpec::optional("vertical direction", ValueKind::Float),
            FieldSpec::optional("depth", ValueKind::Float),
        ])
    }

    fn from_record(record: &Record) -> Option<Self> {
        Some(Self {
            u: record.float(0)?,
            v: record.float(1),
            w: record.float(2),
        })
    }
}

/// Vertex normal: `vn i j k`
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Normal {
    pub i: f64,
    pub j: f64,
    pub k: f64,
}

impl Element for Normal {
    const ELEMENT_TYPE: ElementType = ElementType::VertexNormal;

    fn schema() -> Schema {
        Schema::new(vec![
            FieldSpec::scalar("X coordinate", ValueKind::Float),
            FieldSpec::scalar("Y coordinate", ValueKind::Float),
            FieldSpec::scalar("Z coordinate", ValueKind::Float),
        ])
    }

    fn from_record(record: &Record) -> Option<Self> {
        Some(Self {
            i: record.float(0)?,
            j: record.float(1)?,
            k: record.float(2)?,
        })
    }
}

/// Parameter space vertex: `vp u [v] [w]`
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ParameterVertex {
    pub u: f64,
    pub v: Option<f64>,
    pub w: Option<f64>,
}

impl Element for ParameterVertex {
    const ELEMENT_TYPE: ElementType = ElementType::ParameterVertex;

    fn schema() -> Schema {
        Schema::new(vec![
            FieldSpec::scalar("U coordinate", ValueKind::Float),
            FieldSpec::optional("V coordinate", ValueKind::Float),
            FieldSpec::optional("weight parameter", ValueKind::Float),
        ])
    }

    fn from_record(record: &Record) -> Option<Self> {
        Some(Self {
            u: record.float(0)?,
            v: record.float(1),
            w: record.float(2),
        })
    }
}

/// Point element: `p v1 v2 v3 ...`
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Point {
    pub vertices: Vec<i64>,
}

impl Element for Point {
    const ELEMENT_TYPE: ElementType = ElementType::Point;

    fn schema() -> Schema {
        Schema::new(vec![FieldSpec::repeated(
            "vertex",
            ScalarSpec::new("vertex", ValueKind::Int),
            1,
        )])
    }

    fn from_record(record: &Record) -> Option<Self> {
        let vertices = record
            .repeated(0)
            .iter()
            .map(|g| int_at(g, 0))
            .collect::<Option<Vec<_>>>()?;
        Some(Self { vertices })
    }
}

/// One vertex reference of a line element
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LineVertex {
    pub index: i64,
    pub texture: Option<i64>,
}

/// Line element: `l v1[/vt1] v2[/vt2] ...`
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Line {
    pub vertices: Vec<LineVertex>,
}

impl Element for Line {
    const ELEMENT_TYPE: ElementType = ElementType::Line;

    fn schema() -> Schema {
        Schema::new(vec![FieldSpec::repeated(
            "vertex",
            CompositeSpec::new("vertex", Delimiter::Slash)
                .field(ScalarSpec::new("index", ValueKind::Int))
                .field(ScalarSpec::new("texture", ValueKind::Int).optional()),
            2,
        )])
    }

    fn from_record(record: &Record) -> Option<Self> {
        let vertices = record
            .repeated(0)
            .iter()
            .map(|g| {
                Some(LineVertex {
                    index: int_at(g, 0)?,
                    texture: int_at(g, 1),
                })
            })
            .collect::<Option<Vec<_>>>()?;
        Some(Self { vertices })
    }
}

/// One vertex reference of a face element
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FaceVertex {
    /// Reference number of the geometric vertex
    pub index: i64,
    /// Reference number of the texture vertex
    pub texture: Option<i64>,
    /// Reference number of the vertex normal
    pub normal: Option<i64>,
}

/// Face element: `f v1[/vt1[/vn1]] v2[/vt2[/vn2]] v3[/vt3[/vn3]] ...`
///
/// Every vertex carries the same optional references as the first one.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Face {
    pub vertices: Vec<FaceVertex>,
}

impl Element for Face {
    const ELEMENT_TYPE: ElementType = ElementType::Face;

    fn schema() -> Schema {
        Schema::new(vec![FieldSpec::repeated(
            "vertex",
            CompositeSpec::new("vertex", Delimiter::Slash)
                .field(ScalarSpec::new("index", ValueKind::Int))
                .field(ScalarSpec::new("texture", ValueKind::Int).optional())
                .field(ScalarSpec::new("normal", ValueKind::Int).optional()),
            3,
        )])
    }

    fn from_record(record: &Record) -> Option<Self> {
        let vertices = record
            .repeated(0)
            .iter()
            .map(|g| {
                Some(FaceVertex {
                    index: int_at(g, 0)?,
                    texture: int_at(g, 1),
                    normal: int_at(g, 2),
                })
            })
            .collect::<Option<Vec<_>>>()?;
        Some(Self { vertices })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::ElementParser;
    use crate::fsm::compile_for;
    use crate::tokenizer::Tokenizer;
    use std::sync::Arc;

    fn parse<E: Element>(text: &str) -> Option<E> {
        let fsm = compile_for(E::ELEMENT_TYPE.name(), &E::schema()).ok()?;
        let mut parser = ElementParser::new(Arc::new(fsm));
        let mut tokenizer = Tokenizer::new(text.as_bytes());
        tokenizer.next_token();
        let record = parser.run(&mut tokenizer).record()?.clone();
        E::from_record(&record)
    }

    #[test]
    fn test_schemas_are_valid() {
        assert!(Vertex::schema().validate().is_ok());
        assert!(TextureVertex::schema().validate().is_ok());
        assert!(Normal::schema().validate().is_ok());
        assert!(ParameterVertex::schema().validate().is_ok());
        assert!(Point::schema().validate().is_ok());
        assert!(Line::schema().validate().is_ok());
        assert!(Face::schema().validate().is_ok());
    }

    #[test]
    fn test_vertex_weight_defaults_to_zero() {
        let v: Vertex = parse("v 1.0 2.0 3.0\n").unwrap();
        assert_eq!(v, Vertex { x: 1.0, y: 2.0, z: 3.0, w: 0.0 });
        let v: Vertex = parse("v 1.0 2.0 3.0 0.5\n").unwrap();
        assert_eq!(v.w, 0.5);
    }

    #[test]
    fn test_face_vertices() {
        let f: Face = parse("f -1//-2 -3//-4 -5//-6\n").unwrap();
        assert_eq!(f.vertices.len(), 3);
        assert_eq!(
            f.vertices[2],
            FaceVertex { index: -5, texture: None, normal: Some(-6) }
        );
    }

    #[test]
    fn test_point_and_line() {
        let p: Point = parse("p 4 5 6\n").unwrap();
        assert_eq!(p.vertices, vec![4, 5, 6]);
        let l: Line = parse("l 1/1 2/2\n").unwrap();
        assert_eq!(l.vertices[1], LineVertex { index: 2, texture: Some(2) });
        assert!(parse::<Line>("l 1\n").is_none());
    }

    #[test]
    fn test_wrong_shape_is_none() {
        let fsm = compile_for("vertex", &Vertex::schema()).unwrap();
        let record = fsm.new_record();
        assert!(Face::from_record(&record).map_or(true, |f| f.vertices.is_empty()));
        assert!(Vertex::from_record(&record).is_none());
    }
}
