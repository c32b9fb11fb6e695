// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! OBJ Element Types
//!
//! Fast keyword matching using an enum instead of string comparison.

use std::fmt;

/// OBJ statement types, one per leading keyword
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ElementType {
    // Vertex data
    Vertex,
    TextureVertex,
    VertexNormal,
    ParameterVertex,

    // Free-form curve/surface attributes
    CurveSurfaceType,
    Degree,
    BasisMatrix,
    Step,

    // Elements
    Point,
    Line,
    Face,
    Curve,
    Curve2D,
    Surface,

    // Free-form curve/surface body statements
    Parameter,
    Trim,
    Hole,
    SpecialCurve,
    SpecialPoint,
    End,

    // Connectivity
    Connect,

    // Grouping
    Group,
    SmoothingGroup,
    MergingGroup,
    Object,

    // Display/render attributes
    BevelInterpolation,
    ColorInterpolation,
    DissolveInterpolation,
    LevelOfDetail,
    MapLibrary,
    UseMapping,
    UseMaterial,
    MaterialLibrary,
    ShadowObject,
    TraceObject,
    CurveApproximation,
    SurfaceApproximation,

    // General statements
    Call,
    Scmp,
    Csh,

    /// Sentinel produced once the input is exhausted
    EndOfFile,
}

impl ElementType {
    /// Every keyword-bearing type, in declaration order.
    pub const KEYWORDS: [ElementType; 40] = [
        Self::Vertex,
        Self::TextureVertex,
        Self::VertexNormal,
        Self::ParameterVertex,
        Self::CurveSurfaceType,
        Self::Degree,
        Self::BasisMatrix,
        Self::Step,
        Self::Point,
        Self::Line,
        Self::Face,
        Self::Curve,
        Self::Curve2D,
        Self::Surface,
        Self::Parameter,
        Self::Trim,
        Self::Hole,
        Self::SpecialCurve,
        Self::SpecialPoint,
        Self::End,
        Self::Connect,
        Self::Group,
        Self::SmoothingGroup,
        Self::MergingGroup,
        Self::Object,
        Self::BevelInterpolation,
        Self::ColorInterpolation,
        Self::DissolveInterpolation,
        Self::LevelOfDetail,
        Self::MapLibrary,
        Self::UseMapping,
        Self::UseMaterial,
        Self::MaterialLibrary,
        Self::ShadowObject,
        Self::TraceObject,
        Self::CurveApproximation,
        Self::SurfaceApproximation,
        Self::Call,
        Self::Scmp,
        Self::Csh,
    ];

    /// Parse the leading keyword of a line
    pub fn from_keyword(s: &str) -> Option<Self> {
        let t = match s {
            "v" => Self::Vertex,
            "vt" => Self::TextureVertex,
            "vn" => Self::VertexNormal,
            "vp" => Self::ParameterVertex,
            "cstype" => Self::CurveSurfaceType,
            "deg" => Self::Degree,
            "bmat" => Self::BasisMatrix,
            "step" => Self::Step,
            "p" => Self::Point,
            "l" => Self::Line,
            "f" => Self::Face,
            "curv" => Self::Curve,
            "curv2" => Self::Curve2D,
            "surf" => Self::Surface,
            "parm" => Self::Parameter,
            "trim" => Self::Trim,
            "hole" => Self::Hole,
            "scrv" => Self::SpecialCurve,
            "sp" => Self::SpecialPoint,
            "end" => Self::End,
            "con" => Self::Connect,
            "g" => Self::Group,
            "s" => Self::SmoothingGroup,
            "mg" => Self::MergingGroup,
            "o" => Self::Object,
            "bevel" => Self::BevelInterpolation,
            "c_interp" => Self::ColorInterpolation,
            "d_interp" => Self::DissolveInterpolation,
            "lod" => Self::LevelOfDetail,
            "maplib" => Self::MapLibrary,
            "usemap" => Self::UseMapping,
            "usemtl" => Self::UseMaterial,
            "mtllib" => Self::MaterialLibrary,
            "shadow_obj" => Self::ShadowObject,
            "trace_obj" => Self::TraceObject,
            "ctech" => Self::CurveApproximation,
            "stech" => Self::SurfaceApproximation,
            "call" => Self::Call,
            "scmp" => Self::Scmp,
            "csh" => Self::Csh,
            _ => return None,
        };
        Some(t)
    }

    /// Leading keyword (empty for [`EndOfFile`](Self::EndOfFile))
    pub fn keyword(&self) -> &'static str {
        match self {
            Self::Vertex => "v",
            Self::TextureVertex => "vt",
            Self::VertexNormal => "vn",
            Self::ParameterVertex => "vp",
            Self::CurveSurfaceType => "cstype",
            Self::Degree => "deg",
            Self::BasisMatrix => "bmat",
            Self::Step => "step",
            Self::Point => "p",
            Self::Line => "l",
            Self::Face => "f",
            Self::Curve => "curv",
            Self::Curve2D => "curv2",
            Self::Surface => "surf",
            Self::Parameter => "parm",
            Self::Trim => "trim",
            Self::Hole => "hole",
            Self::SpecialCurve => "scrv",
            Self::SpecialPoint => "sp",
            Self::End => "end",
            Self::Connect => "con",
            Self::Group => "g",
            Self::SmoothingGroup => "s",
            Self::MergingGroup => "mg",
            Self::Object => "o",
            Self::BevelInterpolation => "bevel",
            Self::ColorInterpolation => "c_interp",
            Self::DissolveInterpolation => "d_interp",
            Self::LevelOfDetail => "lod",
            Self::MapLibrary => "maplib",
            Self::UseMapping => "usemap",
            Self::UseMaterial => "usemtl",
            Self::MaterialLibrary => "mtllib",
            Self::ShadowObject => "shadow_obj",
            Self::TraceObject => "trace_obj",
            Self::CurveApproximation => "ctech",
            Self::SurfaceApproximation => "stech",
            Self::Call => "call",
            Self::Scmp => "scmp",
            Self::Csh => "csh",
            Self::EndOfFile => "",
        }
    }

    /// Human-readable name used in messages
    pub fn name(&self) -> &'static str {
        match self {
            Self::Vertex => "vertex",
            Self::TextureVertex => "vertex texture",
            Self::VertexNormal => "vertex normal",
            Self::ParameterVertex => "vertex parameter",
            Self::CurveSurfaceType => "curve surface type",
            Self::Degree => "degree",
            Self::BasisMatrix => "basis matrix",
            Self::Step => "step",
            Self::Point => "point",
            Self::Line => "line",
            Self::Face => "face",
            Self::Curve => "curve",
            Self::Curve2D => "curve 2D",
            Self::Surface => "surface",
            Self::Parameter => "parameter",
            Self::Trim => "trim",
            Self::Hole => "hole",
            Self::SpecialCurve => "special curve",
            Self::SpecialPoint => "special point",
            Self::End => "end",
            Self::Connect => "connect",
            Self::Group => "group",
            Self::SmoothingGroup => "smoothing group",
            Self::MergingGroup => "merging group",
            Self::Object => "object",
            Self::BevelInterpolation => "bevel interpolation",
            Self::ColorInterpolation => "color interpolation",
            Self::DissolveInterpolation => "dissolve interpolation",
            Self::LevelOfDetail => "level of detail",
            Self::MapLibrary => "map library",
            Self::UseMapping => "use mapping",
            Self::UseMaterial => "use material",
            Self::MaterialLibrary => "material library",
            Self::ShadowObject => "shadow object",
            Self::TraceObject => "trace object",
            Self::CurveApproximation => "curve approximation technique",
            Self::SurfaceApproximation => "surface approximation technique",
            Self::Call => "call command",
            Self::Scmp => "scmp command",
            Self::Csh => "csh command",
            Self::EndOfFile => "end of file",
        }
    }

    /// Check if this statement carries vertex data
    pub fn is_vertex_data(&self) -> bool {
        matches!(
            self,
            Self::Vertex | Self::TextureVertex | Self::VertexNormal | Self::ParameterVertex
        )
    }

    /// Check if this is a polygonal element referencing vertices
    pub fn is_polygonal(&self) -> bool {
        matches!(self, Self::Point | Self::Line | Self::Face)
    }

    /// Check if this is a grouping statement
    pub fn is_grouping(&self) -> bool {
        matches!(
            self,
            Self::Group | Self::SmoothingGroup | Self::MergingGroup | Self::Object
        )
    }
}

impl fmt::Display for ElementType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}
