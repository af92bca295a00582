use shader_glslgen::lower::flatten::{count_returns, flatten_returns};
use shader_glslgen::prelude::*;
use shader_glslgen::source::parse;

const MODULE: &str = r#"
class Attrs(AttributeBlock):
    position = vec3()
    normal = vec3()
    uv = vec2()

class VsOut(ShaderInterface):
    gl_position = vec4()
    normal = vec3()

class FsOut(FragmentShaderOutputBlock):
    color = vec4()
    normal = vec4()
    depth = float()

def clamp_light(x: float) -> float:
    if x < 0.0:
        return 0.0
    if x > 1.0:
        return 1.0
    return x

def vertex(attrs: Attrs) -> VsOut:
    for i in range(4):
        attrs.position.x += 1.0
    for j in range(0, 8, 2):
        attrs.position.y += 1.0
    for k in range(8, 0, -1):
        attrs.position.z -= 1.0
    return VsOut(gl_position=vec4(attrs.position, 1.0), normal=attrs.normal)

def fragment(vs_out: VsOut) -> FsOut:
    light = float(clamp_light(vs_out.normal.z))
    return FsOut(color=vec4(light), normal=vec4(vs_out.normal, 0.0), depth=light)
"#;

#[test]
fn flattening_leaves_one_return() {
    for source in [
        "if a:\n    return 1.0\nreturn 2.0\n",
        "if a:\n    return 1.0\nelif b:\n    return 2.0\nelse:\n    return 3.0\n",
        "if a:\n    x = 1.0\n    if b:\n        return x\nreturn 0.0\n",
    ] {
        let marker = TypeMarker::Builtin("float");
        let once = flatten_returns(parse(source).unwrap(), &marker).unwrap();
        assert_eq!(count_returns(&once), 1, "{}", source);

        let twice = flatten_returns(once.clone(), &marker).unwrap();
        assert_eq!(once, twice);
    }
}

#[test]
fn library_functions_have_single_exit() {
    let registry = Registry::from_source(MODULE).unwrap();
    let glsl = Stage::new(&registry, "fragment", StageConfig::fragment())
        .library(["clamp_light"])
        .compile()
        .unwrap();

    let start = glsl.find("float clamp_light(float x) {").unwrap();
    let end = glsl.find("void main() {").unwrap();
    let function = &glsl[start..end];
    assert_eq!(function.matches("return ").count(), 1);
    assert!(function.contains("    float _return_value;\n"));
    assert!(function.contains("    return _return_value;\n"));
}

#[test]
fn locations_are_numbered_from_zero() {
    let registry = Registry::from_source(MODULE).unwrap();

    let vertex = Stage::new(&registry, "vertex", StageConfig::vertex()).compile().unwrap();
    assert!(vertex.contains("layout(location=0) in vec3 position;\n"));
    assert!(vertex.contains("layout(location=1) in vec3 normal;\n"));
    assert!(vertex.contains("layout(location=2) in vec2 uv;\n"));

    let fragment = Stage::new(&registry, "fragment", StageConfig::fragment())
        .library(["clamp_light"])
        .compile()
        .unwrap();
    assert!(fragment.contains("layout(location=0) out vec4 color;\n"));
    assert!(fragment.contains("layout(location=1) out vec4 normal;\n"));
    assert!(fragment.contains("layout(location=2) out float depth;\n"));
}

#[test]
fn loop_increment_depends_on_step() {
    let registry = Registry::from_source(MODULE).unwrap();
    let glsl = Stage::new(&registry, "vertex", StageConfig::vertex()).compile().unwrap();

    assert!(glsl.contains("    for (int i = 0; i < 4; i++) {\n"));
    assert!(glsl.contains("    for (int j = 0; j < 8; j += 2) {\n"));
    assert!(glsl.contains("    for (int k = 8; k > 0; k += -1) {\n"));
    assert!(glsl.contains("        position.x += 1.0;\n"));
}

#[test]
fn compilation_is_deterministic() {
    let compile = || {
        let registry = Registry::from_source(MODULE).unwrap();
        let config = GlslGenConfig::init(std::env::temp_dir().join("shader-glslgen-determinism"));
        ShaderProgram::new("lit")
            .stage(Stage::new(&registry, "vertex", StageConfig::vertex()))
            .stage(
                Stage::new(&registry, "fragment", StageConfig::fragment())
                    .library(["clamp_light"]),
            )
            .compile(&config)
            .unwrap()
    };
    assert_eq!(compile(), compile());
}

#[test]
fn library_is_deduplicated_in_insertion_order() {
    let library: FunctionLibrary = ["b", "a", "b", "c", "a"].into_iter().collect();
    assert_eq!(library.iter().collect::<Vec<_>>(), vec!["b", "a", "c"]);
}
