use crate::codegen::{GlslDocument, Visitor};
use crate::error::{CompileError, CompileResult};
use crate::lower::flatten::flatten_returns;
use crate::lower::rename::{Remover, Renamer};
use crate::lower::returns::{OutputTarget, ReturnRewriter};
use crate::lower::shared::SharedExtractor;
use crate::lower::{visit_exprs, Rewrite};
use crate::registry::{Registry, ShaderFunction, ShaderParam};
use crate::schema::{BlockKind, InterfaceBlock, Schema, StructDef};
use crate::source::ast::{Expr, Stmt};
use crate::stage::{FunctionLibrary, StageConfig, StageKind, StageLayout};
use crate::types::{is_builtin_input, ArrayLength, TypeLookup, TypeMarker};
use std::collections::HashSet;

#[derive(Debug)]
enum State {
    CollectLayout,
    DeclarePrologue,
    DeclareBlocks,
    RewriteBody,
    EmitBody,
    Finished(String),
}

fn layout_hint(kind: StageKind) -> &'static str {
    match kind {
        StageKind::Geometry => {
            "add @geometry_shader_layout(input_primitive=..., output_primitive=..., max_vertices=...) or pass a StageLayout"
        }
        StageKind::TessControl => {
            "add @tessellation_control_layout(vertices=...) or pass a StageLayout"
        }
        StageKind::TessEval => {
            "add @tessellation_evaluation_layout(primitive_mode=...) or pass a StageLayout"
        }
        _ => "pass a StageLayout",
    }
}

/// One shader stage: an entry function from the registry, the stage
/// configuration and the library functions emitted ahead of `main`.
///
/// ```ignore
/// let source = Stage::new(&registry, "vertex", StageConfig::vertex())
///     .library(["lighting"])
///     .compile()?;
/// ```
#[derive(Debug, Clone)]
pub struct Stage<'r> {
    registry: &'r Registry,
    entry: String,
    config: StageConfig,
    library: FunctionLibrary,
}

impl<'r> Stage<'r> {
    pub fn new(registry: &'r Registry, entry: impl Into<String>, config: StageConfig) -> Self {
        Stage {
            registry,
            entry: entry.into(),
            config,
            library: FunctionLibrary::new(),
        }
    }

    /// Adds library functions, keeping the first occurrence of each name.
    pub fn library<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.library.extend(names);
        self
    }

    pub fn kind(&self) -> StageKind {
        self.config.kind
    }

    pub fn entry(&self) -> &str {
        &self.entry
    }

    /// Compiles the stage, using the stage's default version unless the
    /// configuration names one.
    pub fn compile(&self) -> CompileResult<String> {
        self.assemble(self.config.kind.default_version())
    }

    pub(crate) fn assemble(&self, fallback_version: &str) -> CompileResult<String> {
        let kind = self.config.kind;
        log::info!("compiling {} shader '{}'", kind.name(), self.entry);

        let mut assembly = Assembly {
            stage: self,
            function: self.registry.function(&self.entry)?,
            version: self
                .config
                .version
                .clone()
                .unwrap_or_else(|| fallback_version.to_string()),
            layout: None,
            output: None,
            document: GlslDocument::new(),
            body: vec![],
            removed: vec![],
            shared: vec![],
        };

        let mut state = State::CollectLayout;
        loop {
            state = match state {
                State::Finished(source) => return Ok(source),
                state => {
                    log::debug!("{} shader '{}': {:?}", kind.name(), self.entry, state);
                    assembly.advance(state)?
                }
            };
        }
    }
}

/// Working state of one compilation.
struct Assembly<'s, 'r> {
    stage: &'s Stage<'r>,
    function: &'r ShaderFunction,
    version: String,
    layout: Option<StageLayout>,
    output: Option<&'r InterfaceBlock>,
    document: GlslDocument,
    body: Vec<Stmt>,
    /// Parameters whose `name.` prefix is stripped from the body.
    removed: Vec<String>,
    shared: Vec<String>,
}

impl<'s, 'r> Assembly<'s, 'r> {
    fn kind(&self) -> StageKind {
        self.stage.config.kind
    }

    fn advance(&mut self, state: State) -> CompileResult<State> {
        Ok(match state {
            State::CollectLayout => {
                self.collect_layout()?;
                State::DeclarePrologue
            }
            State::DeclarePrologue => {
                self.declare_prologue()?;
                State::DeclareBlocks
            }
            State::DeclareBlocks => {
                self.declare_blocks()?;
                State::RewriteBody
            }
            State::RewriteBody => {
                self.rewrite_body()?;
                State::EmitBody
            }
            State::EmitBody => State::Finished(self.emit_body()?),
            finished @ State::Finished(_) => finished,
        })
    }

    fn collect_layout(&mut self) -> CompileResult<()> {
        let kind = self.kind();
        let layout = self.stage.config.layout.or(self.function.layout);

        if let Some(layout) = layout {
            if layout.kind() != kind {
                return Err(CompileError::malformed(format!(
                    "{} layout attached to {} shader '{}'",
                    layout.kind().name(),
                    kind.name(),
                    self.function.name
                )));
            }
        }

        self.layout = match (layout, kind) {
            (Some(layout), _) => Some(layout),
            (None, StageKind::Compute) => Some(StageLayout::compute(1, 1, 1)),
            (None, kind) if kind.requires_layout() => {
                return Err(CompileError::MissingLayoutMetadata {
                    stage: kind.name(),
                    hint: layout_hint(kind),
                })
            }
            (None, _) => None,
        };
        Ok(())
    }

    fn declare_prologue(&mut self) -> CompileResult<()> {
        self.document.line(format!("#version {}", self.version));
        if let Some(layout) = self.layout {
            self.document.extend(layout.lines());
        }
        self.document.line("");

        let referenced = self.referenced_schemas()?;
        for def in self.ordered_structs(&referenced)? {
            log::trace!("declaring struct '{}'", def.name);
            self.document.extend(def.declare());
            self.document.line("");
        }
        Ok(())
    }

    /// Referenced structs with every struct placed after the structs its
    /// members use. Ties keep registration order.
    fn ordered_structs(
        &self,
        referenced: &HashSet<&'r str>,
    ) -> CompileResult<Vec<&'r StructDef>> {
        fn visit<'r>(
            registry: &'r Registry,
            def: &'r StructDef,
            visiting: &mut Vec<&'r str>,
            done: &mut HashSet<&'r str>,
            ordered: &mut Vec<&'r StructDef>,
        ) -> CompileResult<()> {
            if done.contains(def.name.as_str()) {
                return Ok(());
            }
            if let Some(start) = visiting.iter().position(|name| *name == def.name) {
                let mut cycle = visiting[start..].to_vec();
                cycle.push(&def.name);
                return Err(CompileError::malformed(format!(
                    "struct '{}' contains itself through {}",
                    def.name,
                    cycle.join(" -> ")
                )));
            }

            visiting.push(&def.name);
            for name in def.referenced_types() {
                if let Some(member) = registry.struct_def(name) {
                    visit(registry, member, visiting, done, ordered)?;
                }
            }
            visiting.pop();

            done.insert(&def.name);
            ordered.push(def);
            Ok(())
        }

        let registry: &'r Registry = self.stage.registry;
        let mut visiting = vec![];
        let mut done = HashSet::new();
        let mut ordered = vec![];
        for def in registry
            .structs()
            .filter(|def| referenced.contains(def.name.as_str()))
        {
            visit(registry, def, &mut visiting, &mut done, &mut ordered)?;
        }
        Ok(ordered)
    }

    /// Every schema the entry point and its library reach, directly or
    /// through struct and block members.
    fn referenced_schemas(&self) -> CompileResult<HashSet<&'r str>> {
        let registry: &'r Registry = self.stage.registry;

        let mut functions = vec![self.function];
        for name in self.stage.library.iter() {
            functions.push(registry.function(name)?);
        }

        let mut pending: Vec<&'r str> = vec![];
        for function in functions {
            let markers = function
                .params
                .iter()
                .map(|param| &param.marker)
                .chain(function.returns.marker.as_ref());
            for marker in markers {
                if let TypeMarker::Named(name) = marker.base() {
                    pending.push(name);
                }
            }
            // constructor calls and annotations
            visit_exprs(&function.body, &mut |expr: &'r Expr| {
                if let Expr::Name(name) = expr {
                    if registry.is_registered(name) {
                        pending.push(name);
                    }
                }
            });
        }

        let mut seen = HashSet::new();
        while let Some(name) = pending.pop() {
            if !seen.insert(name) {
                continue;
            }
            match registry.schema(name) {
                Some(Schema::Struct(def)) => pending.extend(def.referenced_types()),
                Some(Schema::Block(block)) => pending.extend(block.referenced_types()),
                None => {}
            }
        }
        Ok(seen)
    }

    fn declare_input(&mut self, param: &ShaderParam) -> CompileResult<Vec<String>> {
        let kind = self.kind();
        let (marker, array) = match &param.marker {
            TypeMarker::Array { element, length } => (element.as_ref(), Some(*length)),
            other => (other, None),
        };

        let block = match marker {
            TypeMarker::Named(name) => self.stage.registry.block(name),
            _ => None,
        };
        let block = match block {
            Some(block) => block,
            None => return Ok(vec![format!("uniform {};", param.marker.declare(&param.name))]),
        };

        if !kind.accepts_input(block.kind) {
            return Err(CompileError::malformed(format!(
                "{} block '{}' cannot be an input of a {} shader",
                block.kind.name(),
                block.name,
                kind.name()
            )));
        }
        if array.is_some() && !kind.accepts_array_inputs() {
            return Err(CompileError::malformed(format!(
                "{} shaders cannot take '{}' as a per-vertex array",
                kind.name(),
                param.name
            )));
        }
        if matches!(block.kind, BlockKind::Uniform | BlockKind::Attribute) {
            self.removed.push(param.name.clone());
        }

        block.declare_input(&param.name, array)
    }

    fn resolve_output(&self) -> CompileResult<Option<&'r InterfaceBlock>> {
        let kind = self.kind();
        let returns = &self.function.returns;

        if returns.generator && kind != StageKind::Geometry {
            return Err(CompileError::unsupported(
                "yield",
                format!("{} shaders cannot emit vertices", kind.name()),
            ));
        }
        if kind == StageKind::Geometry && !returns.generator && returns.marker.is_some() {
            return Err(CompileError::malformed(format!(
                "geometry shader '{}' must yield its output and be annotated with Iterator[...]",
                self.function.name
            )));
        }

        let marker = match &returns.marker {
            Some(marker) => marker,
            None => return Ok(None),
        };
        let expected = kind.output_kind().ok_or_else(|| {
            CompileError::malformed(format!(
                "{} shader '{}' cannot return a value",
                kind.name(),
                self.function.name
            ))
        })?;

        let block = match marker {
            TypeMarker::Named(name) => self.stage.registry.block(name),
            _ => None,
        };
        match block {
            Some(block) if block.kind == expected => Ok(Some(block)),
            _ => Err(CompileError::malformed(format!(
                "{} shader '{}' must return a {} block, not '{}'",
                kind.name(),
                self.function.name,
                expected.name(),
                marker
            ))),
        }
    }

    fn declare_blocks(&mut self) -> CompileResult<()> {
        let before = self.document.lines().len();

        let mut params: Vec<&'r ShaderParam> = self.function.params.iter().collect();
        params.sort_by(|a, b| a.name.cmp(&b.name));
        for param in params {
            if let TypeMarker::Named(name) = param.marker.base() {
                if is_builtin_input(name) {
                    continue;
                }
            }
            let lines = self.declare_input(param)?;
            self.document.extend(lines);
        }

        self.output = self.resolve_output()?;
        if let Some(block) = self.output {
            let array = match self.kind() {
                StageKind::TessControl => Some(ArrayLength::Unsized),
                _ => None,
            };
            self.document.extend(block.declare_output(array)?);
            if block.kind == BlockKind::FragmentOutput {
                self.removed.push(block.instance_name());
            }
        }

        if self.document.lines().len() > before {
            self.document.line("");
        }
        Ok(())
    }

    fn rewrite_body(&mut self) -> CompileResult<()> {
        let (block, target) = match self.output {
            Some(block) => {
                let instance = block.instance_name();
                let target = match self.kind() {
                    StageKind::TessControl => OutputTarget::Indexed(instance),
                    _ => OutputTarget::Instance(instance),
                };
                (Some(block.name.clone()), target)
            }
            None => (None, OutputTarget::None),
        };

        let mut body = ReturnRewriter::new(block, target)
            .generator(self.function.returns.generator)
            .rewrite_body(self.function.body.clone())?;

        if self.kind() == StageKind::Compute {
            let mut extractor = SharedExtractor::new(self.stage.registry);
            body = extractor.rewrite_body(body)?;
            self.shared = extractor.into_declarations();
        }

        body = Renamer::default().rewrite_body(body)?;

        let mut remover = Remover::new(self.removed.drain(..));
        if !remover.is_empty() {
            body = remover.rewrite_body(body)?;
        }

        self.body = body;
        Ok(())
    }

    fn emit_body(&mut self) -> CompileResult<String> {
        let registry = self.stage.registry;
        let visitor = Visitor::new(registry);

        if !self.shared.is_empty() {
            self.document.extend(self.shared.drain(..));
            self.document.line("");
        }

        for name in self.stage.library.iter() {
            let function = registry.function(name)?;
            if function.returns.generator {
                return Err(CompileError::unsupported(
                    "yield",
                    format!("library function '{}' cannot emit vertices", name),
                ));
            }
            let body = match &function.returns.marker {
                Some(marker) => flatten_returns(function.body.clone(), marker)?,
                None => function.body.clone(),
            };
            log::trace!("emitting library function '{}'", name);
            self.document.append(visitor.function(function, &body)?);
            self.document.line("");
        }

        self.document.append(visitor.main(&self.body)?);
        Ok(std::mem::take(&mut self.document).finish())
    }
}
