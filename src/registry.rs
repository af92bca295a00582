//! Explicit table of schemas and shader functions.
//!
//! Everything a stage refers to by name is looked up here. Entries keep
//! their registration order, which is also the order structs are emitted in.

use crate::error::{CompileError, CompileResult};
use crate::schema::{class_kind, resolve_class, InterfaceBlock, Schema, StructDef};
use crate::source::ast::{FunctionDef, Stmt};
use crate::source::parse;
use crate::stage::StageLayout;
use crate::types::{resolve_marker, resolve_return, ReturnMarker, TypeLookup, TypeMarker};
use std::collections::{HashMap, HashSet};

#[derive(Debug, Clone, Eq, PartialEq)]
pub struct ShaderParam {
    pub name: String,
    pub marker: TypeMarker,
}

/// A parsed function with resolved parameter and return types.
#[derive(Debug, Clone, PartialEq)]
pub struct ShaderFunction {
    pub name: String,
    pub params: Vec<ShaderParam>,
    pub returns: ReturnMarker,
    pub body: Vec<Stmt>,
    /// Layout taken from a layout decorator, if present.
    pub layout: Option<StageLayout>,
}

impl ShaderFunction {
    pub fn resolve(def: FunctionDef, lookup: &dyn TypeLookup) -> CompileResult<ShaderFunction> {
        let mut params = Vec::with_capacity(def.params.len());
        for (index, param) in def.params.into_iter().enumerate() {
            if index == 0 && param.name == "self" {
                continue;
            }
            let annotation = param.annotation.ok_or_else(|| {
                CompileError::malformed(format!(
                    "untyped parameter '{}' in function '{}'",
                    param.name, def.name
                ))
            })?;
            params.push(ShaderParam {
                name: param.name,
                marker: resolve_marker(&annotation, lookup)?,
            });
        }

        let returns = resolve_return(def.returns.as_ref(), lookup)?;

        let mut layout = None;
        for decorator in &def.decorators {
            if let Some(found) = StageLayout::from_decorator(decorator)? {
                layout = Some(found);
            }
        }

        Ok(ShaderFunction {
            name: def.name,
            params,
            returns,
            body: def.body,
            layout,
        })
    }
}

#[derive(Debug, Default, Clone)]
pub struct Registry {
    schemas: Vec<Schema>,
    schema_index: HashMap<String, usize>,
    functions: Vec<ShaderFunction>,
    function_index: HashMap<String, usize>,
}

impl TypeLookup for Registry {
    fn is_registered(&self, name: &str) -> bool {
        self.schema_index.contains_key(name)
    }
}

/// Lookup used while a module's classes are resolved, so members may name
/// any class of the same module.
struct PendingLookup<'a> {
    registry: &'a Registry,
    pending: HashSet<String>,
}

impl TypeLookup for PendingLookup<'_> {
    fn is_registered(&self, name: &str) -> bool {
        self.pending.contains(name) || self.registry.is_registered(name)
    }
}

impl Registry {
    pub fn new() -> Self {
        Registry::default()
    }

    /// Parses a module and registers all of its schema classes and
    /// functions.
    pub fn from_source(source: &str) -> CompileResult<Registry> {
        let mut registry = Registry::new();
        registry.parse_source(source)?;
        Ok(registry)
    }

    /// Registers every schema class and function in `source`, in source
    /// order. Classes are registered before functions so annotations may
    /// name classes defined further down.
    pub fn parse_source(&mut self, source: &str) -> CompileResult<()> {
        let module = parse(source)?;

        let mut classes = Vec::new();
        let mut functions = Vec::new();
        for stmt in module {
            match stmt {
                Stmt::ClassDef(class) => {
                    if class_kind(&class).is_some() {
                        classes.push(class);
                    } else {
                        log::warn!("skipping class '{}' without a schema base", class.name);
                    }
                }
                Stmt::FunctionDef(def) => functions.push(def),
                Stmt::Expr(_) | Stmt::Pass => {}
                other => {
                    return Err(CompileError::unsupported(
                        "module statement",
                        format!(
                            "only classes and functions may appear at module level, found {:?}",
                            other
                        ),
                    ))
                }
            }
        }

        let resolved = {
            let lookup = PendingLookup {
                registry: &*self,
                pending: classes.iter().map(|class| class.name.clone()).collect(),
            };
            classes
                .iter()
                .map(|class| resolve_class(class, &lookup))
                .collect::<CompileResult<Vec<_>>>()?
        };
        for schema in resolved {
            self.insert_schema(schema);
        }

        for def in functions {
            self.register_function(def)?;
        }

        log::debug!(
            "registry holds {} schemas and {} functions",
            self.schemas.len(),
            self.functions.len()
        );
        Ok(())
    }

    fn insert_schema(&mut self, schema: Schema) {
        let name = schema.name().to_string();
        match self.schema_index.get(&name) {
            Some(&index) => self.schemas[index] = schema,
            None => {
                self.schema_index.insert(name, self.schemas.len());
                self.schemas.push(schema);
            }
        }
    }

    pub fn register_struct(&mut self, def: StructDef) -> &mut Self {
        self.insert_schema(Schema::Struct(def));
        self
    }

    pub fn register_block(&mut self, block: InterfaceBlock) -> &mut Self {
        self.insert_schema(Schema::Block(block));
        self
    }

    pub fn register_function(&mut self, def: FunctionDef) -> CompileResult<&mut Self> {
        let function = ShaderFunction::resolve(def, &*self)?;
        log::trace!("registered function '{}'", function.name);
        match self.function_index.get(&function.name) {
            Some(&index) => self.functions[index] = function,
            None => {
                self.function_index
                    .insert(function.name.clone(), self.functions.len());
                self.functions.push(function);
            }
        }
        Ok(self)
    }

    pub fn schema(&self, name: &str) -> Option<&Schema> {
        self.schema_index.get(name).map(|&index| &self.schemas[index])
    }

    pub fn block(&self, name: &str) -> Option<&InterfaceBlock> {
        match self.schema(name) {
            Some(Schema::Block(block)) => Some(block),
            _ => None,
        }
    }

    pub fn struct_def(&self, name: &str) -> Option<&StructDef> {
        match self.schema(name) {
            Some(Schema::Struct(def)) => Some(def),
            _ => None,
        }
    }

    /// Registered structs in registration order.
    pub fn structs(&self) -> impl Iterator<Item = &StructDef> {
        self.schemas.iter().filter_map(|schema| match schema {
            Schema::Struct(def) => Some(def),
            _ => None,
        })
    }

    pub fn function(&self, name: &str) -> CompileResult<&ShaderFunction> {
        self.function_index
            .get(name)
            .map(|&index| &self.functions[index])
            .ok_or_else(|| CompileError::UnknownSymbol(name.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::BlockKind;
    use crate::stage::{InputPrimitive, OutputPrimitive};

    const MODULE: &str = r#"
class Light(GlslStruct):
    position = vec3()
    material = Material()

class Material(GlslStruct):
    shininess = float()

class VsOut(ShaderInterface):
    color = vec4()

@geometry_shader_layout(input_primitive=triangles, output_primitive=triangle_strip, max_vertices=3)
def geom(gl_in: Sequence[GlGsIn], vs_out: Sequence[VsOut]) -> Iterator[VsOut]:
    pass

def shade(self, light: Light, n: vec3) -> float:
    return dot(light.position, n)
"#;

    #[test]
    fn registers_module_in_order() {
        let registry = Registry::from_source(MODULE).unwrap();
        let names: Vec<&str> = registry.structs().map(|def| def.name.as_str()).collect();
        assert_eq!(names, vec!["Light", "Material"]);
        assert_eq!(registry.block("VsOut").map(|block| block.kind), Some(BlockKind::Varying));
    }

    #[test]
    fn resolves_function_signatures() {
        let registry = Registry::from_source(MODULE).unwrap();
        let shade = registry.function("shade").unwrap();
        assert_eq!(shade.params.len(), 2);
        assert_eq!(shade.params[0].marker, TypeMarker::Named("Light".into()));
        assert_eq!(shade.returns.marker, Some(TypeMarker::Builtin("float")));

        let geom = registry.function("geom").unwrap();
        assert!(geom.returns.generator);
        assert_eq!(
            geom.layout,
            Some(StageLayout::geometry(
                InputPrimitive::Triangles,
                OutputPrimitive::TriangleStrip,
                3
            ))
        );
    }

    #[test]
    fn rejects_untyped_parameters() {
        let result = Registry::from_source("def f(x):\n    pass\n");
        assert!(matches!(result, Err(CompileError::MalformedDeclaration(_))));
    }

    #[test]
    fn reports_unknown_functions() {
        let registry = Registry::new();
        assert_eq!(
            registry.function("missing").err(),
            Some(CompileError::UnknownSymbol("missing".into()))
        );
    }

    #[test]
    fn reports_unknown_annotations() {
        let result = Registry::from_source("def f(x: Missing):\n    pass\n");
        assert_eq!(result.err(), Some(CompileError::UnresolvedType("Missing".into())));
    }
}
