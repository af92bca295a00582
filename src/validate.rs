//! Checks generated sources with naga's GLSL frontend and validator.

use crate::config::Config;
use crate::error::{ValidationError, VecErr};
use crate::program::{CompiledProgram, CompiledStage};
use crate::stage::StageKind;
use naga::front::glsl::{Options, Parser};
use naga::valid::ModuleInfo;
use naga::ShaderStage;

/// Version naga's frontend accepts, substituted for the generated one.
const FRONTEND_VERSION: &str = "#version 450 core";

pub fn naga_stage(kind: StageKind) -> Result<ShaderStage, ValidationError> {
    match kind {
        StageKind::Vertex => Ok(ShaderStage::Vertex),
        StageKind::Fragment => Ok(ShaderStage::Fragment),
        StageKind::Compute => Ok(ShaderStage::Compute),
        other => Err(ValidationError::UnsupportedStage(other.name())),
    }
}

fn with_frontend_version(source: &str) -> String {
    match source.split_once('\n') {
        Some((first, rest)) if first.starts_with("#version") => {
            format!("{}\n{}", FRONTEND_VERSION, rest)
        }
        _ => source.to_string(),
    }
}

pub fn validate_source(
    kind: StageKind,
    source: &str,
    config: &Config,
) -> Result<ModuleInfo, ValidationError> {
    let stage = naga_stage(kind)?;
    let options = Options {
        stage,
        defines: Default::default(),
    };

    let mut parser = Parser::default();
    let module = parser
        .parse(&options, &with_frontend_version(source))
        .map_err(VecErr::from)?;

    config
        .validator()
        .validate(&module)
        .map_err(|err| ValidationError::Validation(format!("{:?}", err)))
}

impl CompiledStage {
    pub fn validate(&self, config: &Config) -> Result<ModuleInfo, ValidationError> {
        validate_source(self.kind, &self.source, config)
    }
}

impl CompiledProgram {
    /// Validates every stage naga can parse; the others are skipped.
    pub fn validate(&self, config: &Config) -> Result<(), ValidationError> {
        for stage in &self.stages {
            match stage.validate(config) {
                Ok(_) => log::debug!("{} stage of '{}' is valid", stage.kind.name(), self.name),
                Err(ValidationError::UnsupportedStage(name)) => {
                    log::warn!("skipping validation of {} stage of '{}'", name, self.name)
                }
                Err(err) => return Err(err),
            }
        }
        Ok(())
    }
}
