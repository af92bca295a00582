use shader_glslgen::prelude::*;

fn vertex(source: &str) -> CompileResult<String> {
    let registry = Registry::from_source(source)?;
    Stage::new(&registry, "vertex", StageConfig::vertex()).compile()
}

#[test]
fn inconsistent_indentation() {
    let result = Registry::from_source("def vertex():\n        a = 1\n    b = 2\n");
    assert!(matches!(result, Err(CompileError::Indentation { line: 3, .. })));
}

#[test]
fn syntax_errors_carry_the_line() {
    let result = Registry::from_source("def vertex():\n    a = (1 +\n");
    assert!(matches!(result, Err(CompileError::Syntax { .. })));
}

#[test]
fn unresolved_annotations() {
    let result = vertex("def vertex(light: Light):\n    pass\n");
    assert_eq!(result, Err(CompileError::UnresolvedType("Light".into())));
}

#[test]
fn unknown_entry_point() {
    let registry = Registry::from_source("def vertex():\n    pass\n").unwrap();
    let result = Stage::new(&registry, "fragment", StageConfig::fragment()).compile();
    assert_eq!(result, Err(CompileError::UnknownSymbol("fragment".into())));
}

#[test]
fn unsupported_constructs() {
    for source in [
        "def vertex():\n    if a is b:\n        pass\n",
        "def vertex():\n    for x in items:\n        pass\n",
        "def vertex():\n    def inner():\n        pass\n",
        "def vertex():\n    yield vec4(1.0)\n",
    ] {
        assert!(
            matches!(vertex(source), Err(CompileError::UnsupportedConstruct { .. })),
            "{}",
            source
        );
    }
}

#[test]
fn malformed_declarations() {
    let structs = r#"
class Light(GlslStruct):
    position = vec3()
    power = float()

"#;
    for body in [
        "def vertex():\n    arr = []\n",
        "def vertex():\n    a, b = vec2(1.0), vec2(2.0)\n",
        "def vertex():\n    light = Light(position=vec3(0.0))\n",
        "def vertex():\n    light = Light(position=vec3(0.0), power=1.0, color=vec3(1.0))\n",
    ] {
        let source = format!("{}{}", structs, body);
        assert!(
            matches!(vertex(&source), Err(CompileError::MalformedDeclaration(_))),
            "{}",
            body
        );
    }
}

#[test]
fn uniform_blocks_are_not_arrays() {
    let source = r#"
class Globals(UniformBlock):
    u_time = float()

class GsOut(ShaderInterface):
    color = vec4()

@geometry_shader_layout(input_primitive=points, output_primitive=points, max_vertices=1)
def geometry(globals: Sequence[Globals]) -> Iterator[GsOut]:
    yield GsOut(color=vec4(1.0))
"#;
    let registry = Registry::from_source(source).unwrap();
    let result = Stage::new(&registry, "geometry", StageConfig::new(StageKind::Geometry)).compile();
    assert!(matches!(result, Err(CompileError::MalformedDeclaration(_))));
}

#[test]
fn missing_layout_metadata_names_the_stage() {
    let source = r#"
class GsOut(ShaderInterface):
    color = vec4()

def geometry() -> Iterator[GsOut]:
    yield GsOut(color=vec4(1.0))
"#;
    let registry = Registry::from_source(source).unwrap();
    let error = Stage::new(&registry, "geometry", StageConfig::new(StageKind::Geometry))
        .compile()
        .unwrap_err();
    assert!(error.to_string().starts_with("geometry shader is missing layout metadata"));
}

#[test]
fn geometry_stages_must_yield() {
    let source = r#"
class GsOut(ShaderInterface):
    color = vec4()

@geometry_shader_layout(input_primitive=points, output_primitive=points, max_vertices=1)
def geometry() -> GsOut:
    return GsOut(color=vec4(1.0))
"#;
    let registry = Registry::from_source(source).unwrap();
    let result = Stage::new(&registry, "geometry", StageConfig::new(StageKind::Geometry)).compile();
    assert!(matches!(result, Err(CompileError::MalformedDeclaration(_))));
}

#[test]
fn output_errors_wrap_compile_errors() {
    let registry = Registry::from_source("def vertex():\n    arr = []\n").unwrap();
    let config = GlslGenConfig::init(std::env::temp_dir().join("shader-glslgen-errors"));
    let result = ShaderProgram::new("broken")
        .stage(Stage::new(&registry, "vertex", StageConfig::vertex()))
        .transpile_and_write(&config);
    assert!(matches!(
        result,
        Err(OutputError::Compile(CompileError::MalformedDeclaration(_)))
    ));
}
