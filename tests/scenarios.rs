use shader_glslgen::prelude::*;

fn compile(source: &str, entry: &str, config: StageConfig) -> CompileResult<String> {
    let registry = Registry::from_source(source)?;
    Stage::new(&registry, entry, config).compile()
}

#[test]
fn declares_vector_constructor() {
    let glsl = compile(
        "def vertex():\n    a = vec3(1.0, 2.0, 3.0)\n",
        "vertex",
        StageConfig::vertex(),
    )
    .unwrap();
    assert!(glsl.contains("    vec3 a = vec3(1.0, 2.0, 3.0);\n"));
}

#[test]
fn declares_inside_conditional() {
    let glsl = compile(
        "def vertex():\n    if 1 != 2:\n        a = int(1)\n",
        "vertex",
        StageConfig::vertex(),
    )
    .unwrap();
    assert!(glsl.contains("    if (1 != 2) {\n"));
    assert!(glsl.contains("        int a = int(1);\n"));
}

#[test]
fn declares_array_literals() {
    let glsl = compile(
        "def vertex():\n    arr = [1.0, 2.0, 3.0]\n    ints = [1,2,3,4]\n",
        "vertex",
        StageConfig::vertex(),
    )
    .unwrap();
    assert!(glsl.contains("float arr[3] = float[3](1.0, 2.0, 3.0);"));
    assert!(glsl.contains("int ints[4] = int[4](1, 2, 3, 4);"));

    let result = compile("def vertex():\n    arr = []\n", "vertex", StageConfig::vertex());
    assert!(matches!(result, Err(CompileError::MalformedDeclaration(_))));
}

#[test]
fn declares_uniform_members() {
    let source = r#"
class Uniforms(UniformBlock):
    u_time = float()
    u_matrix = mat4()

def vertex(uniforms: Uniforms):
    gl_position = uniforms.u_matrix * vec4(uniforms.u_time)
"#;
    let glsl = compile(source, "vertex", StageConfig::vertex()).unwrap();
    assert!(glsl.contains("uniform float u_time;\n"));
    assert!(glsl.contains("uniform mat4 u_matrix;\n"));
    assert!(glsl.contains("    gl_Position = (u_matrix * vec4(u_time));\n"));
}

#[test]
fn emits_geometry_layout() {
    let source = r#"
class VsOut(ShaderInterface):
    color = vec4()

class GsOut(ShaderInterface):
    gl_position = vec4()
    color = vec4()

@geometry_shader_layout(input_primitive=triangles, output_primitive=triangle_strip, max_vertices=3)
def geometry(gl_in: Sequence[GlGsIn], vs_out: Sequence[VsOut]) -> Iterator[GsOut]:
    for i in range(3):
        yield GsOut(gl_position=gl_in[i].gl_Position, color=vs_out[i].color)
    EndPrimitive()
"#;
    let glsl = compile(source, "geometry", StageConfig::new(StageKind::Geometry)).unwrap();
    assert!(glsl.starts_with(
        "#version 330 core\nlayout(triangles) in;\nlayout(triangle_strip, max_vertices = 3) out;\n"
    ));
    assert!(glsl.contains("in VsOut {\n    vec4 color;\n} vs_out[];\n"));
    assert!(glsl.contains("out GsOut {\n    vec4 color;\n} gs_out;\n"));
    assert!(glsl.contains(
        "    for (int i = 0; i < 3; i++) {\n        gl_Position = gl_in[i].gl_Position;\n        gs_out.color = vs_out[i].color;\n        EmitVertex();\n    }\n    EndPrimitive();\n"
    ));
}

#[test]
fn hoists_shared_memory() {
    let source = r#"
@compute_shader_layout(local_size_x=256)
def reduce():
    data = shared(float[256])
    data[gl_LocalInvocationIndex] = float(gl_LocalInvocationIndex)
    barrier()
"#;
    let glsl = compile(source, "reduce", StageConfig::new(StageKind::Compute)).unwrap();
    let shared = glsl.find("shared float data[256];\n").unwrap();
    let main = glsl.find("void main() {").unwrap();
    assert!(shared < main);
    assert!(glsl.starts_with(
        "#version 430 core\nlayout(local_size_x = 256, local_size_y = 1, local_size_z = 1) in;\n"
    ));
    assert!(!glsl.contains("data = shared"));
    assert!(glsl.contains("    barrier();\n"));
}

#[test]
fn declares_nested_structs_before_use() {
    let source = r#"
class Light(GlslStruct):
    position = vec3()
    material = Material()

class Material(GlslStruct):
    shininess = float()
    tint = Tint()

class Tint(GlslStruct):
    color = vec3()

class Unused(GlslStruct):
    value = float()

def fragment(light: Light):
    shine = float(light.material.shininess)
"#;
    let glsl = compile(source, "fragment", StageConfig::fragment()).unwrap();
    let tint = glsl.find("struct Tint {").unwrap();
    let material = glsl.find("struct Material {").unwrap();
    let light = glsl.find("struct Light {").unwrap();
    assert!(tint < material);
    assert!(material < light);
    assert!(glsl.contains("struct Light {\n    vec3 position;\n    Material material;\n};\n"));
    assert!(glsl.contains("uniform Light light;\n"));
    assert!(!glsl.contains("Unused"));
}

#[test]
fn rejects_recursive_structs() {
    let source = r#"
class Node(GlslStruct):
    next = Link()

class Link(GlslStruct):
    node = Node()

def fragment(node: Node):
    pass
"#;
    let result = compile(source, "fragment", StageConfig::fragment());
    assert!(matches!(result, Err(CompileError::MalformedDeclaration(_))));
}
