//! Closed catalog of GLSL type names and storage/interpolation qualifiers,
//! plus the marker type annotations resolve to.

use crate::error::{CompileError, CompileResult};
use crate::source::ast::{Expr, Literal};
use regex::Regex;
use std::collections::HashSet;
use std::fmt::{Display, Formatter};

lazy_static::lazy_static! {
    static ref BUILTIN_TYPES: HashSet<&'static str> = [
        // scalars
        "bool", "int", "uint", "float", "double",
        // vectors
        "vec2", "vec3", "vec4",
        "bvec2", "bvec3", "bvec4",
        "ivec2", "ivec3", "ivec4",
        "uvec2", "uvec3", "uvec4",
        "dvec2", "dvec3", "dvec4",
        // matrices
        "mat2", "mat3", "mat4",
        "mat2x2", "mat2x3", "mat2x4",
        "mat3x2", "mat3x3", "mat3x4",
        "mat4x2", "mat4x3", "mat4x4",
        "dmat2", "dmat3", "dmat4",
        "dmat2x2", "dmat2x3", "dmat2x4",
        "dmat3x2", "dmat3x3", "dmat3x4",
        "dmat4x2", "dmat4x3", "dmat4x4",
        // samplers
        "sampler1D", "sampler2D", "sampler3D", "samplerCube",
        "sampler1DShadow", "sampler2DShadow", "samplerCubeShadow",
        "isampler1D", "isampler2D", "isampler3D", "isamplerCube",
        "usampler1D", "usampler2D", "usampler3D", "usamplerCube",
        "sampler2DRect", "sampler2DRectShadow",
        "isampler2DRect", "usampler2DRect",
        "samplerBuffer", "isamplerBuffer", "usamplerBuffer",
        "sampler1DArray", "sampler2DArray", "samplerCubeArray",
        "sampler1DArrayShadow", "sampler2DArrayShadow", "samplerCubeArrayShadow",
        "isampler1DArray", "isampler2DArray", "isamplerCubeArray",
        "usampler1DArray", "usampler2DArray", "usamplerCubeArray",
        // images
        "image1D", "iimage1D", "uimage1D",
        "image2D", "iimage2D", "uimage2D",
        "image3D", "iimage3D", "uimage3D",
        "image2DRect", "iimage2DRect", "uimage2DRect",
        "imageCube", "iimageCube", "uimageCube",
        "imageBuffer", "iimageBuffer", "uimageBuffer",
        "image1DArray", "iimage1DArray", "uimage1DArray",
        "image2DArray", "iimage2DArray", "uimage2DArray",
        "imageCubeArray", "iimageCubeArray", "uimageCubeArray",
    ]
    .into_iter()
    .collect();

    static ref ARRAY_MARKER: Regex = Regex::new(r"^Array(\d+)$").unwrap();
}

/// Per-vertex inputs GLSL provides implicitly as `gl_in[]`. Parameters of
/// these types are never declared.
pub const BUILTIN_INPUT_BLOCKS: &[&str] = &["GlGsIn", "GlTessIn"];

/// Returns the catalog entry for `name`, if it is a GLSL type.
pub fn builtin_type(name: &str) -> Option<&'static str> {
    BUILTIN_TYPES.get(name).copied()
}

pub fn is_builtin_input(name: &str) -> bool {
    BUILTIN_INPUT_BLOCKS.contains(&name)
}

/// Length of `ArrayN` markers, e.g. `Array16` → 16.
pub fn array_marker_length(name: &str) -> Option<usize> {
    ARRAY_MARKER
        .captures(name)
        .and_then(|captures| captures.get(1))
        .and_then(|length| length.as_str().parse().ok())
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum Qualifier {
    Flat,
    Smooth,
    NoPerspective,
    Shared,
}

impl Qualifier {
    pub fn from_name(name: &str) -> Option<Qualifier> {
        Some(match name {
            "flat" => Qualifier::Flat,
            "smooth" => Qualifier::Smooth,
            "noperspective" => Qualifier::NoPerspective,
            "shared" => Qualifier::Shared,
            _ => return None,
        })
    }

    pub fn keyword(&self) -> &'static str {
        match self {
            Qualifier::Flat => "flat",
            Qualifier::Smooth => "smooth",
            Qualifier::NoPerspective => "noperspective",
            Qualifier::Shared => "shared",
        }
    }

    pub fn is_interpolation(&self) -> bool {
        !matches!(self, Qualifier::Shared)
    }
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum ArrayLength {
    Sized(usize),
    Unsized,
}

impl Display for ArrayLength {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ArrayLength::Sized(length) => write!(f, "[{}]", length),
            ArrayLength::Unsized => f.write_str("[]"),
        }
    }
}

/// Tag for a GLSL type: either a catalog entry, a registered struct or
/// block name, or an array of either.
#[derive(Debug, Clone, Eq, PartialEq, Hash)]
pub enum TypeMarker {
    Builtin(&'static str),
    Named(String),
    Array {
        element: Box<TypeMarker>,
        length: ArrayLength,
    },
}

impl TypeMarker {
    pub fn array(element: TypeMarker, length: ArrayLength) -> TypeMarker {
        TypeMarker::Array {
            element: Box::new(element),
            length,
        }
    }

    /// GLSL name of the type, or of the element type for arrays.
    pub fn glsl_name(&self) -> &str {
        match self {
            TypeMarker::Builtin(name) => name,
            TypeMarker::Named(name) => name,
            TypeMarker::Array { element, .. } => element.glsl_name(),
        }
    }

    pub fn is_array(&self) -> bool {
        matches!(self, TypeMarker::Array { .. })
    }

    /// Innermost non-array marker.
    pub fn base(&self) -> &TypeMarker {
        match self {
            TypeMarker::Array { element, .. } => element.base(),
            other => other,
        }
    }

    /// Renders `<type> <name>` with any array suffix after the name.
    pub fn declare(&self, name: &str) -> String {
        let mut result = format!("{} {}", self.glsl_name(), name);
        let mut current = self;
        while let TypeMarker::Array { element, length } = current {
            result.push_str(&length.to_string());
            current = element;
        }
        result
    }
}

impl Display for TypeMarker {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            TypeMarker::Array { element, length } => write!(f, "{}{}", element, length),
            other => f.write_str(other.glsl_name()),
        }
    }
}

/// Resolves annotation expressions against the catalog and a table of
/// registered names.
pub trait TypeLookup {
    /// Whether `name` is a registered struct or interface block.
    fn is_registered(&self, name: &str) -> bool;
}

impl TypeLookup for HashSet<String> {
    fn is_registered(&self, name: &str) -> bool {
        self.contains(name)
    }
}

/// Return annotation of a function after resolution.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct ReturnMarker {
    /// `None` for `void`.
    pub marker: Option<TypeMarker>,
    /// Declared as `Iterator[T]`/`Generator[T]`.
    pub generator: bool,
}

fn resolve_name(name: &str, lookup: &dyn TypeLookup) -> CompileResult<TypeMarker> {
    if let Some(builtin) = builtin_type(name) {
        Ok(TypeMarker::Builtin(builtin))
    } else if lookup.is_registered(name) || is_builtin_input(name) {
        Ok(TypeMarker::Named(name.to_string()))
    } else {
        Err(CompileError::UnresolvedType(name.to_string()))
    }
}

fn describe(expr: &Expr) -> String {
    match expr {
        Expr::Name(name) => name.clone(),
        Expr::Attribute { value, attr } => format!("{}.{}", describe(value), attr),
        Expr::Subscript { value, index } => format!("{}[{}]", describe(value), describe(index)),
        Expr::Literal(Literal::Int(text)) => text.clone(),
        other => format!("{:?}", other),
    }
}

/// Resolves a type annotation or type-marker expression.
///
/// Accepted forms are `T`, `Sequence[T]` (unsized array), `ArrayN[T]` and
/// `T[n]` (sized arrays).
pub fn resolve_marker(expr: &Expr, lookup: &dyn TypeLookup) -> CompileResult<TypeMarker> {
    match expr {
        Expr::Name(name) => resolve_name(name, lookup),
        // `typing.Sequence` and similar qualified spellings
        Expr::Attribute { attr, .. } => resolve_name(attr, lookup),
        Expr::Subscript { value, index } => {
            let outer = match value.as_ref() {
                Expr::Name(name) => name.as_str(),
                Expr::Attribute { attr, .. } => attr.as_str(),
                Expr::Subscript { .. } => {
                    // nested `T[n][m]`
                    let element = resolve_marker(value, lookup)?;
                    let length = literal_length(index)
                        .ok_or_else(|| CompileError::UnresolvedType(describe(expr)))?;
                    return Ok(TypeMarker::array(element, ArrayLength::Sized(length)));
                }
                _ => return Err(CompileError::UnresolvedType(describe(expr))),
            };

            if outer == "Sequence" {
                return Ok(TypeMarker::array(
                    resolve_marker(index, lookup)?,
                    ArrayLength::Unsized,
                ));
            }
            if let Some(length) = array_marker_length(outer) {
                return Ok(TypeMarker::array(
                    resolve_marker(index, lookup)?,
                    ArrayLength::Sized(length),
                ));
            }
            if let Some(length) = literal_length(index) {
                return Ok(TypeMarker::array(
                    resolve_name(outer, lookup)?,
                    ArrayLength::Sized(length),
                ));
            }
            Err(CompileError::UnresolvedType(describe(expr)))
        }
        other => Err(CompileError::UnresolvedType(describe(other))),
    }
}

fn literal_length(expr: &Expr) -> Option<usize> {
    match expr {
        Expr::Literal(Literal::Int(text)) => text.parse().ok(),
        _ => None,
    }
}

/// Resolves a function's `->` annotation. A missing annotation, `None`
/// and `void` all mean no return value.
pub fn resolve_return(
    annotation: Option<&Expr>,
    lookup: &dyn TypeLookup,
) -> CompileResult<ReturnMarker> {
    let annotation = match annotation {
        None | Some(Expr::Literal(Literal::None)) => {
            return Ok(ReturnMarker {
                marker: None,
                generator: false,
            })
        }
        Some(Expr::Name(name)) if name == "void" => {
            return Ok(ReturnMarker {
                marker: None,
                generator: false,
            })
        }
        Some(annotation) => annotation,
    };

    if let Expr::Subscript { value, index } = annotation {
        if matches!(value.as_name(), Some("Iterator" | "Generator")) {
            return Ok(ReturnMarker {
                marker: Some(resolve_marker(index, lookup)?),
                generator: true,
            });
        }
    }

    Ok(ReturnMarker {
        marker: Some(resolve_marker(annotation, lookup)?),
        generator: false,
    })
}

/// Whether a call through `name` looks like a type constructor, which turns
/// an assignment into a declaration.
pub fn is_constructor_name(name: &str, lookup: &dyn TypeLookup) -> bool {
    builtin_type(name).is_some()
        || lookup.is_registered(name)
        || name.chars().next().map_or(false, char::is_uppercase)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::lexer::Lexer;
    use crate::source::parser::Parser;

    fn expr(source: &str) -> Expr {
        let tokens = Lexer::tokenize(source).unwrap();
        Parser::new(tokens).parse_test().unwrap()
    }

    fn registered(names: &[&str]) -> HashSet<String> {
        names.iter().map(|name| name.to_string()).collect()
    }

    #[test]
    fn resolves_catalog_and_registered_names() {
        let table = registered(&["Light"]);
        assert_eq!(
            resolve_marker(&expr("vec3"), &table).unwrap(),
            TypeMarker::Builtin("vec3")
        );
        assert_eq!(
            resolve_marker(&expr("Light"), &table).unwrap(),
            TypeMarker::Named("Light".into())
        );
        assert_eq!(
            resolve_marker(&expr("Missing"), &table),
            Err(CompileError::UnresolvedType("Missing".into()))
        );
    }

    #[test]
    fn resolves_array_forms() {
        let table = registered(&["VsOut"]);
        assert_eq!(
            resolve_marker(&expr("Sequence[VsOut]"), &table)
                .unwrap()
                .declare("vs_out"),
            "VsOut vs_out[]"
        );
        assert_eq!(
            resolve_marker(&expr("Array4[float]"), &table)
                .unwrap()
                .declare("weights"),
            "float weights[4]"
        );
        assert_eq!(
            resolve_marker(&expr("float[256]"), &table)
                .unwrap()
                .declare("data"),
            "float data[256]"
        );
    }

    #[test]
    fn resolves_generator_return() {
        let table = registered(&["GsOut"]);
        let marker = resolve_return(Some(&expr("Iterator[GsOut]")), &table).unwrap();
        assert!(marker.generator);
        assert_eq!(marker.marker, Some(TypeMarker::Named("GsOut".into())));
        assert_eq!(resolve_return(None, &table).unwrap().marker, None);
        assert_eq!(resolve_return(Some(&expr("None")), &table).unwrap().marker, None);
    }

    #[test]
    fn recognises_constructors() {
        let table = registered(&[]);
        assert!(is_constructor_name("vec4", &table));
        assert!(is_constructor_name("Material", &table));
        assert!(!is_constructor_name("normalize", &table));
    }

    #[test]
    fn qualifiers_map_to_keywords() {
        assert_eq!(
            Qualifier::from_name("noperspective").map(|q| q.keyword()),
            Some("noperspective")
        );
        assert_eq!(Qualifier::from_name("centroid"), None);
    }
}
