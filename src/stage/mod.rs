//! Per-stage assembly of GLSL documents.

mod assemble;
pub mod layout;
mod library;

pub use assemble::Stage;
pub use layout::*;
pub use library::FunctionLibrary;

use crate::schema::BlockKind;
#[cfg(feature = "config-file")]
use serde::{Deserialize, Serialize};

pub const DEFAULT_VERSION: &str = "330 core";
pub const DEFAULT_TESSELLATION_VERSION: &str = "400 core";
pub const DEFAULT_COMPUTE_VERSION: &str = "430 core";

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
#[cfg_attr(feature = "config-file", derive(Serialize, Deserialize))]
pub enum StageKind {
    Vertex,
    Fragment,
    Geometry,
    TessControl,
    TessEval,
    Compute,
}

impl StageKind {
    pub fn name(&self) -> &'static str {
        match self {
            StageKind::Vertex => "vertex",
            StageKind::Fragment => "fragment",
            StageKind::Geometry => "geometry",
            StageKind::TessControl => "tessellation control",
            StageKind::TessEval => "tessellation evaluation",
            StageKind::Compute => "compute",
        }
    }

    /// File extension conventionally used for the stage.
    pub fn extension(&self) -> &'static str {
        match self {
            StageKind::Vertex => "vert",
            StageKind::Fragment => "frag",
            StageKind::Geometry => "geom",
            StageKind::TessControl => "tesc",
            StageKind::TessEval => "tese",
            StageKind::Compute => "comp",
        }
    }

    pub fn default_version(&self) -> &'static str {
        match self {
            StageKind::TessControl | StageKind::TessEval => DEFAULT_TESSELLATION_VERSION,
            StageKind::Compute => DEFAULT_COMPUTE_VERSION,
            _ => DEFAULT_VERSION,
        }
    }

    pub fn requires_layout(&self) -> bool {
        !matches!(self, StageKind::Vertex | StageKind::Fragment)
    }

    /// Block kinds the stage accepts as parameters.
    pub fn accepts_input(&self, kind: BlockKind) -> bool {
        match self {
            StageKind::Vertex => matches!(kind, BlockKind::Uniform | BlockKind::Attribute),
            StageKind::Fragment
            | StageKind::Geometry
            | StageKind::TessControl
            | StageKind::TessEval => matches!(kind, BlockKind::Uniform | BlockKind::Varying),
            StageKind::Compute => kind == BlockKind::Uniform,
        }
    }

    /// Block kind the stage writes through `return`, if it has an output.
    pub fn output_kind(&self) -> Option<BlockKind> {
        match self {
            StageKind::Fragment => Some(BlockKind::FragmentOutput),
            StageKind::Compute => None,
            _ => Some(BlockKind::Varying),
        }
    }

    /// Whether inputs may be declared as per-vertex arrays.
    pub fn accepts_array_inputs(&self) -> bool {
        matches!(
            self,
            StageKind::Geometry | StageKind::TessControl | StageKind::TessEval
        )
    }
}

/// Stage kind plus the layout and version overrides for one compilation.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct StageConfig {
    pub kind: StageKind,
    pub layout: Option<StageLayout>,
    pub version: Option<String>,
}

impl StageConfig {
    pub fn new(kind: StageKind) -> Self {
        StageConfig {
            kind,
            layout: None,
            version: None,
        }
    }

    pub fn vertex() -> Self {
        StageConfig::new(StageKind::Vertex)
    }

    pub fn fragment() -> Self {
        StageConfig::new(StageKind::Fragment)
    }

    pub fn layout(mut self, layout: StageLayout) -> Self {
        self.layout = Some(layout);
        self
    }

    pub fn version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }
}
