//! Groups the stages of one shader program and compiles them together.

use crate::config::Config;
use crate::error::{CompileError, CompileResult};
use crate::stage::{Stage, StageKind};
use std::collections::HashSet;

#[derive(Debug, Clone)]
pub struct ShaderProgram<'r> {
    name: String,
    stages: Vec<Stage<'r>>,
}

impl<'r> ShaderProgram<'r> {
    pub fn new(name: impl Into<String>) -> Self {
        ShaderProgram {
            name: name.into(),
            stages: vec![],
        }
    }

    pub fn stage(mut self, stage: Stage<'r>) -> Self {
        self.stages.push(stage);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn stages(&self) -> &[Stage<'r>] {
        &self.stages
    }

    /// Compiles every stage. Stages without an explicit version use the
    /// one `config` gives for their kind. The first failing stage aborts
    /// the whole program.
    pub fn compile(&self, config: &Config) -> CompileResult<CompiledProgram> {
        let mut kinds = HashSet::with_capacity(self.stages.len());
        let mut stages = Vec::with_capacity(self.stages.len());

        for stage in &self.stages {
            if !kinds.insert(stage.kind()) {
                return Err(CompileError::malformed(format!(
                    "program '{}' has more than one {} stage",
                    self.name,
                    stage.kind().name()
                )));
            }

            let source = stage.assemble(config.version_for(stage.kind()))?;
            stages.push(CompiledStage {
                kind: stage.kind(),
                entry: stage.entry().to_string(),
                source,
            });
        }

        log::info!("compiled program '{}' ({} stages)", self.name, stages.len());
        Ok(CompiledProgram {
            name: self.name.clone(),
            stages,
        })
    }
}

#[derive(Debug, Clone, Eq, PartialEq)]
pub struct CompiledStage {
    pub kind: StageKind,
    pub entry: String,
    pub source: String,
}

impl CompiledStage {
    /// `<program>.<ext>.glsl`, e.g. `blur.frag.glsl`.
    pub fn file_name(&self, program: &str) -> String {
        format!("{}.{}.glsl", program, self.kind.extension())
    }
}

#[derive(Debug, Clone, Eq, PartialEq)]
pub struct CompiledProgram {
    pub name: String,
    pub stages: Vec<CompiledStage>,
}

impl CompiledProgram {
    pub fn stage(&self, kind: StageKind) -> Option<&CompiledStage> {
        self.stages.iter().find(|stage| stage.kind == kind)
    }
}
