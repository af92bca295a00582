pub mod codegen;
pub mod config;
pub mod error;
pub mod lower;
pub mod program;
pub mod registry;
pub mod schema;
pub mod source;
pub mod stage;
pub mod transpile;
pub mod types;
pub(crate) mod util;
#[cfg(feature = "validate")]
pub mod validate;

pub mod prelude {
    pub use super::config::Config as GlslGenConfig;
    pub use super::error::{CompileError, CompileResult, OutputError};
    pub use super::program::{CompiledProgram, CompiledStage, ShaderProgram};
    pub use super::registry::Registry;
    pub use super::schema::{BlockKind, InterfaceBlock, StructDef};
    pub use super::stage::*;
    pub use super::transpile::*;
    pub use super::types::{ArrayLength, Qualifier, TypeMarker};
}

#[cfg(test)]
mod tests {
    use super::prelude::*;
    use log::LevelFilter;

    const MODULE: &str = r#"
class Globals(UniformBlock):
    u_time = float()

class VsOut(ShaderInterface):
    gl_position = vec4()
    uv = vec2()

class FsOut(FragmentShaderOutputBlock):
    color = vec4()

def vertex(globals: Globals, position: vec2) -> VsOut:
    return VsOut(gl_position=vec4(position, 0.0, 1.0), uv=position * globals.u_time)

def fragment(vs_out: VsOut) -> FsOut:
    return FsOut(color=vec4(vs_out.uv, 0.0, 1.0))
"#;

    #[test]
    fn full_test() {
        let _ = env_logger::builder()
            .filter_level(LevelFilter::Trace)
            .is_test(true)
            .try_init();

        let root = std::env::temp_dir().join("shader-glslgen-full-test");
        let config = GlslGenConfig::init(&root);

        let registry = Registry::from_source(MODULE).unwrap();
        let programs = vec![ShaderProgram::new("screen")
            .stage(Stage::new(&registry, "vertex", StageConfig::vertex()))
            .stage(Stage::new(&registry, "fragment", StageConfig::fragment()))];

        let result: CodegenData = programs.transpile_and_write(&config).unwrap();
        assert_eq!(result.files.len(), 2);
        result.generate_sources(&config).unwrap();

        let written = std::fs::read_to_string(config.out.join("screen.frag.glsl")).unwrap();
        assert!(written.contains("layout(location=0) out vec4 color;"));
    }
}
