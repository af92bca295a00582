use crate::config::Config;
use crate::error::OutputError;
use crate::program::{CompiledProgram, ShaderProgram};
use crate::util::static_ident;
use std::collections::BTreeSet;
use std::ops::AddAssign;
use std::path::{Path, PathBuf};

fn format_static_statement(
    name: impl AsRef<str>,
    value: impl AsRef<Path>,
    indent: usize,
) -> String {
    format!(
        "{}pub static {}: &'static str = include_str!(\"./{}\");\n",
        "    ".repeat(indent),
        name.as_ref(),
        value.as_ref().display(),
    )
}

/// A written stage source, with its path relative to the generated module.
#[derive(Debug, Clone, Eq, PartialEq, Ord, PartialOrd)]
pub struct ShaderFile {
    pub name: String,
    pub path: PathBuf,
}

#[derive(Debug, Default)]
pub struct CodegenData {
    pub files: BTreeSet<ShaderFile>,
}

impl CodegenData {
    pub fn register(&mut self, file: ShaderFile) {
        self.files.insert(file);
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Text of the generated module.
    pub fn module_source(&self) -> String {
        let mut result = String::from("// GENERATED SOURCE FILE. DO NOT EDIT.\n");
        if self.files.is_empty() {
            return result;
        }

        result.push_str("\npub mod glsl {\n");
        for file in &self.files {
            result.push_str(&format_static_statement(&file.name, &file.path, 1));
        }
        result.push_str("}\n");
        result
    }

    pub fn generate_sources(self, config: &Config) -> Result<(), std::io::Error> {
        if let Some(parent) = config.generated.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent)?;
            }
        }
        log::info!(
            "writing {} shader statics to {}",
            self.files.len(),
            config.generated.display()
        );
        std::fs::write(&config.generated, self.module_source())
    }
}

impl AddAssign for CodegenData {
    fn add_assign(&mut self, mut rhs: Self) {
        self.files.append(&mut rhs.files);
    }
}

/// Writes compiled stage sources into `config.out`.
pub trait WriteOutput {
    fn write(&self, config: &Config) -> Result<CodegenData, OutputError>;
}

impl WriteOutput for CompiledProgram {
    fn write(&self, config: &Config) -> Result<CodegenData, OutputError> {
        let mut result = CodegenData::default();

        if !config.out.exists() {
            std::fs::create_dir_all(&config.out)?;
        }

        for stage in &self.stages {
            let file_name = stage.file_name(&self.name);
            let out_file = config.out.join(&file_name);
            log::debug!("writing {}", out_file.display());
            std::fs::write(&out_file, &stage.source)?;

            result.register(ShaderFile {
                name: static_ident(&format!("{}.{}", self.name, stage.kind.extension())),
                path: config.out_relative().join(file_name),
            });
        }

        Ok(result)
    }
}

impl WriteOutput for Vec<CompiledProgram> {
    fn write(&self, config: &Config) -> Result<CodegenData, OutputError> {
        let mut result = CodegenData::default();

        for program in self {
            result += program.write(config)?;
        }

        Ok(result)
    }
}

/// Compiles programs and writes their stages in one step.
pub trait Transpile {
    fn transpile_and_write(&self, config: &Config) -> Result<CodegenData, OutputError>;
}

impl Transpile for ShaderProgram<'_> {
    fn transpile_and_write(&self, config: &Config) -> Result<CodegenData, OutputError> {
        self.compile(config)?.write(config)
    }
}

impl Transpile for Vec<ShaderProgram<'_>> {
    fn transpile_and_write(&self, config: &Config) -> Result<CodegenData, OutputError> {
        let mut result = CodegenData::default();

        for program in self {
            result += program.transpile_and_write(config)?;
        }

        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generates_static_module() {
        let mut data = CodegenData::default();
        data.register(ShaderFile {
            name: "BLIT_VERT".into(),
            path: PathBuf::from("gen/blit.vert.glsl"),
        });
        let mut other = CodegenData::default();
        other.register(ShaderFile {
            name: "BLIT_FRAG".into(),
            path: PathBuf::from("gen/blit.frag.glsl"),
        });
        data += other;

        assert_eq!(
            data.module_source(),
            "// GENERATED SOURCE FILE. DO NOT EDIT.\n\npub mod glsl {\n    pub static BLIT_FRAG: &'static str = include_str!(\"./gen/blit.frag.glsl\");\n    pub static BLIT_VERT: &'static str = include_str!(\"./gen/blit.vert.glsl\");\n}\n"
        );
    }
}
