//! Stage layout metadata and the layout qualifier lines it produces.

use crate::error::{CompileError, CompileResult};
use crate::source::ast::{Expr, Literal};
use crate::stage::StageKind;

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum InputPrimitive {
    Points,
    Lines,
    LinesAdjacency,
    Triangles,
    TrianglesAdjacency,
}

impl InputPrimitive {
    pub fn from_name(name: &str) -> Option<Self> {
        Some(match name {
            "points" => InputPrimitive::Points,
            "lines" => InputPrimitive::Lines,
            "lines_adjacency" => InputPrimitive::LinesAdjacency,
            "triangles" => InputPrimitive::Triangles,
            "triangles_adjacency" => InputPrimitive::TrianglesAdjacency,
            _ => return None,
        })
    }

    pub fn keyword(&self) -> &'static str {
        match self {
            InputPrimitive::Points => "points",
            InputPrimitive::Lines => "lines",
            InputPrimitive::LinesAdjacency => "lines_adjacency",
            InputPrimitive::Triangles => "triangles",
            InputPrimitive::TrianglesAdjacency => "triangles_adjacency",
        }
    }
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum OutputPrimitive {
    Points,
    LineStrip,
    TriangleStrip,
}

impl OutputPrimitive {
    pub fn from_name(name: &str) -> Option<Self> {
        Some(match name {
            "points" => OutputPrimitive::Points,
            "line_strip" => OutputPrimitive::LineStrip,
            "triangle_strip" => OutputPrimitive::TriangleStrip,
            _ => return None,
        })
    }

    pub fn keyword(&self) -> &'static str {
        match self {
            OutputPrimitive::Points => "points",
            OutputPrimitive::LineStrip => "line_strip",
            OutputPrimitive::TriangleStrip => "triangle_strip",
        }
    }
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum TessPrimitive {
    Triangles,
    Quads,
    Isolines,
}

impl TessPrimitive {
    pub fn from_name(name: &str) -> Option<Self> {
        Some(match name {
            "triangles" => TessPrimitive::Triangles,
            "quads" => TessPrimitive::Quads,
            "isolines" => TessPrimitive::Isolines,
            _ => return None,
        })
    }

    pub fn keyword(&self) -> &'static str {
        match self {
            TessPrimitive::Triangles => "triangles",
            TessPrimitive::Quads => "quads",
            TessPrimitive::Isolines => "isolines",
        }
    }
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, Default)]
pub enum Spacing {
    #[default]
    Equal,
    FractionalEven,
    FractionalOdd,
}

impl Spacing {
    pub fn from_name(name: &str) -> Option<Self> {
        Some(match name {
            "equal_spacing" => Spacing::Equal,
            "fractional_even_spacing" => Spacing::FractionalEven,
            "fractional_odd_spacing" => Spacing::FractionalOdd,
            _ => return None,
        })
    }

    pub fn keyword(&self) -> &'static str {
        match self {
            Spacing::Equal => "equal_spacing",
            Spacing::FractionalEven => "fractional_even_spacing",
            Spacing::FractionalOdd => "fractional_odd_spacing",
        }
    }
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, Default)]
pub enum VertexOrder {
    Cw,
    #[default]
    Ccw,
}

impl VertexOrder {
    pub fn from_name(name: &str) -> Option<Self> {
        Some(match name {
            "cw" => VertexOrder::Cw,
            "ccw" => VertexOrder::Ccw,
            _ => return None,
        })
    }

    pub fn keyword(&self) -> &'static str {
        match self {
            VertexOrder::Cw => "cw",
            VertexOrder::Ccw => "ccw",
        }
    }
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum StageLayout {
    Geometry {
        input: InputPrimitive,
        output: OutputPrimitive,
        max_vertices: u32,
    },
    TessControl {
        vertices: u32,
    },
    TessEval {
        mode: TessPrimitive,
        spacing: Spacing,
        order: VertexOrder,
    },
    Compute {
        local_size: [u32; 3],
    },
}

impl StageLayout {
    pub fn geometry(input: InputPrimitive, output: OutputPrimitive, max_vertices: u32) -> Self {
        StageLayout::Geometry {
            input,
            output,
            max_vertices,
        }
    }

    pub fn tess_control(vertices: u32) -> Self {
        StageLayout::TessControl { vertices }
    }

    /// Evaluation layout with `equal_spacing` and `ccw` order.
    pub fn tess_eval(mode: TessPrimitive) -> Self {
        StageLayout::TessEval {
            mode,
            spacing: Spacing::default(),
            order: VertexOrder::default(),
        }
    }

    pub fn compute(x: u32, y: u32, z: u32) -> Self {
        StageLayout::Compute {
            local_size: [x, y, z],
        }
    }

    pub fn kind(&self) -> StageKind {
        match self {
            StageLayout::Geometry { .. } => StageKind::Geometry,
            StageLayout::TessControl { .. } => StageKind::TessControl,
            StageLayout::TessEval { .. } => StageKind::TessEval,
            StageLayout::Compute { .. } => StageKind::Compute,
        }
    }

    pub fn lines(&self) -> Vec<String> {
        match self {
            StageLayout::Geometry {
                input,
                output,
                max_vertices,
            } => vec![
                format!("layout({}) in;", input.keyword()),
                format!(
                    "layout({}, max_vertices = {}) out;",
                    output.keyword(),
                    max_vertices
                ),
            ],
            StageLayout::TessControl { vertices } => {
                vec![format!("layout(vertices = {}) out;", vertices)]
            }
            StageLayout::TessEval {
                mode,
                spacing,
                order,
            } => vec![format!(
                "layout({}, {}, {}) in;",
                mode.keyword(),
                spacing.keyword(),
                order.keyword()
            )],
            StageLayout::Compute {
                local_size: [x, y, z],
            } => vec![format!(
                "layout(local_size_x = {}, local_size_y = {}, local_size_z = {}) in;",
                x, y, z
            )],
        }
    }

    /// Parses a layout decorator such as
    /// `@geometry_shader_layout(input_primitive=triangles, ...)`.
    ///
    /// Decorators that are not layout decorators yield `None`.
    pub fn from_decorator(decorator: &Expr) -> CompileResult<Option<StageLayout>> {
        let (name, args) = match decorator {
            Expr::Call { func, .. } => match func.as_name() {
                Some(name) => (name, DecoratorArgs::new(decorator)),
                None => return Ok(None),
            },
            _ => return Ok(None),
        };

        let layout = match name {
            "geometry_shader_layout" => {
                let stage = "geometry";
                let hint = "add @geometry_shader_layout(input_primitive=..., output_primitive=..., max_vertices=...)";
                let input = args
                    .get(0, "input_primitive")
                    .ok_or(CompileError::MissingLayoutMetadata { stage, hint })?;
                let output = args
                    .get(1, "output_primitive")
                    .ok_or(CompileError::MissingLayoutMetadata { stage, hint })?;
                let max_vertices = args
                    .get(2, "max_vertices")
                    .ok_or(CompileError::MissingLayoutMetadata { stage, hint })?;
                StageLayout::Geometry {
                    input: keyword_arg(input, InputPrimitive::from_name)?,
                    output: keyword_arg(output, OutputPrimitive::from_name)?,
                    max_vertices: integer_arg(max_vertices)?,
                }
            }
            "tessellation_control_layout" => {
                let vertices = args
                    .get(0, "vertices")
                    .ok_or(CompileError::MissingLayoutMetadata {
                        stage: "tessellation control",
                        hint: "add @tessellation_control_layout(vertices=...)",
                    })?;
                StageLayout::TessControl {
                    vertices: integer_arg(vertices)?,
                }
            }
            "tessellation_evaluation_layout" => {
                let mode = args
                    .get(0, "primitive_mode")
                    .ok_or(CompileError::MissingLayoutMetadata {
                        stage: "tessellation evaluation",
                        hint: "add @tessellation_evaluation_layout(primitive_mode=...)",
                    })?;
                StageLayout::TessEval {
                    mode: keyword_arg(mode, TessPrimitive::from_name)?,
                    spacing: optional_keyword_arg(args.get(1, "spacing"), Spacing::from_name)?
                        .unwrap_or_default(),
                    order: optional_keyword_arg(
                        args.get(2, "vertex_order"),
                        VertexOrder::from_name,
                    )?
                    .unwrap_or_default(),
                }
            }
            "compute_shader_layout" => {
                let size = |index, key| -> CompileResult<u32> {
                    args.get(index, key).map(integer_arg).unwrap_or(Ok(1))
                };
                StageLayout::Compute {
                    local_size: [
                        size(0, "local_size_x")?,
                        size(1, "local_size_y")?,
                        size(2, "local_size_z")?,
                    ],
                }
            }
            _ => return Ok(None),
        };

        Ok(Some(layout))
    }
}

struct DecoratorArgs<'a> {
    positional: &'a [Expr],
    keywords: Vec<(&'a str, &'a Expr)>,
}

impl<'a> DecoratorArgs<'a> {
    fn new(call: &'a Expr) -> Self {
        match call {
            Expr::Call { args, keywords, .. } => DecoratorArgs {
                positional: args,
                keywords: keywords
                    .iter()
                    .map(|keyword| (keyword.name.as_str(), &keyword.value))
                    .collect(),
            },
            _ => DecoratorArgs {
                positional: &[],
                keywords: vec![],
            },
        }
    }

    fn get(&self, index: usize, key: &str) -> Option<&'a Expr> {
        self.keywords
            .iter()
            .find(|(name, _)| *name == key)
            .map(|(_, value)| *value)
            .or_else(|| self.positional.get(index))
            // `spacing=None` means the default
            .filter(|value| !matches!(value, Expr::Literal(Literal::None)))
    }
}

fn keyword_arg<T>(value: &Expr, parse: fn(&str) -> Option<T>) -> CompileResult<T> {
    match value {
        Expr::Name(name) => parse(name).ok_or_else(|| CompileError::UnresolvedType(name.clone())),
        other => Err(CompileError::malformed(format!(
            "layout argument must be a layout keyword, found {:?}",
            other
        ))),
    }
}

fn optional_keyword_arg<T>(
    value: Option<&Expr>,
    parse: fn(&str) -> Option<T>,
) -> CompileResult<Option<T>> {
    value.map(|value| keyword_arg(value, parse)).transpose()
}

fn integer_arg(value: &Expr) -> CompileResult<u32> {
    match value {
        Expr::Literal(Literal::Int(text)) => text.parse().map_err(|_| {
            CompileError::malformed(format!("'{}' is not a valid layout count", text))
        }),
        other => Err(CompileError::malformed(format!(
            "layout count must be an integer literal, found {:?}",
            other
        ))),
    }
}
