use shader_glslgen::prelude::*;

fn compute(source: &str, entry: &str) -> CompileResult<String> {
    let registry = Registry::from_source(source)?;
    Stage::new(&registry, entry, StageConfig::new(StageKind::Compute)).compile()
}

#[test]
fn counts_with_shared_atomics() {
    let source = r#"
@compute_shader_layout(local_size_x=64)
def histogram(image: image2D):
    counter = shared(uint)
    barrier()
    texel = vec4(imageLoad(image, ivec2(gl_GlobalInvocationID.xy)))
    if texel.r > 0.5:
        old = uint(atomicAdd(counter, uint(1)))
    barrier()
"#;
    let glsl = compute(source, "histogram").unwrap();

    assert!(glsl.starts_with(
        "#version 430 core\nlayout(local_size_x = 64, local_size_y = 1, local_size_z = 1) in;\n\n"
    ));
    assert!(glsl.contains("uniform image2D image;\n"));
    assert!(glsl.contains("shared uint counter;\n\nvoid main() {\n"));
    assert!(glsl.contains(
        "    vec4 texel = vec4(imageLoad(image, ivec2(gl_GlobalInvocationID.xy)));\n"
    ));
    assert!(glsl.contains("        uint old = uint(atomicAdd(counter, uint(1)));\n"));
    assert_eq!(glsl.matches("    barrier();\n").count(), 2);
}

#[test]
fn defaults_local_size_to_one() {
    let glsl = compute("def noop():\n    barrier()\n", "noop").unwrap();
    assert!(glsl.contains("layout(local_size_x = 1, local_size_y = 1, local_size_z = 1) in;\n"));
    assert!(!glsl.contains("shared"));
}

#[test]
fn keeps_shared_declarations_in_body_order() {
    let source = r#"
@compute_shader_layout(local_size_x=16, local_size_y=16)
def tile():
    tile = shared(vec4[16][16])
    total = shared(float)
    barrier()
"#;
    let glsl = compute(source, "tile").unwrap();
    let first = glsl.find("shared vec4 tile[16][16];").unwrap();
    let second = glsl.find("shared float total;").unwrap();
    assert!(first < second);
    assert!(second < glsl.find("void main()").unwrap());
}

#[test]
fn compute_stages_return_nothing() {
    let source = r#"
class Out(ShaderInterface):
    value = float()

def run() -> Out:
    return Out(value=1.0)
"#;
    assert!(matches!(
        compute(source, "run"),
        Err(CompileError::MalformedDeclaration(_))
    ));
}

#[test]
fn shared_outside_compute_is_rejected() {
    let result = {
        let registry =
            Registry::from_source("def vertex():\n    data = shared(float[4])\n").unwrap();
        Stage::new(&registry, "vertex", StageConfig::vertex()).compile()
    };
    assert!(matches!(result, Err(CompileError::UnsupportedConstruct { .. })));
}
