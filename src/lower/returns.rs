//! Rewrites `return Output(k=v, ...)` into assignments to the stage outputs.

use crate::error::{CompileError, CompileResult};
use crate::lower::{walk_stmt, Rewrite};
use crate::source::ast::{Expr, Stmt};

/// Where the fields of a returned output block are written.
#[derive(Debug, Clone, Eq, PartialEq)]
pub enum OutputTarget {
    /// The stage has no output block.
    None,
    /// `<instance>.<field>`
    Instance(String),
    /// `<instance>[gl_InvocationID].<field>`, with built-ins written to
    /// `gl_out[gl_InvocationID].<key>`.
    Indexed(String),
}

pub struct ReturnRewriter {
    block: Option<String>,
    target: OutputTarget,
    generator: bool,
    depth: usize,
}

impl ReturnRewriter {
    /// `block` is the output block name calls must construct.
    pub fn new(block: Option<String>, target: OutputTarget) -> Self {
        ReturnRewriter {
            block,
            target,
            generator: false,
            depth: 0,
        }
    }

    /// Accepts `yield Output(...)`, each followed by `EmitVertex()`.
    pub fn generator(mut self, generator: bool) -> Self {
        self.generator = generator;
        self
    }

    fn invocation_id() -> Expr {
        Expr::name("gl_InvocationID")
    }

    fn field_target(&self, key: &str) -> CompileResult<Expr> {
        let builtin = key.starts_with("gl_");
        Ok(match &self.target {
            OutputTarget::None => {
                return Err(CompileError::malformed(
                    "stage has no output block to return",
                ))
            }
            OutputTarget::Instance(_) if builtin => Expr::name(key),
            OutputTarget::Instance(instance) => Expr::attribute(Expr::name(instance.as_str()), key),
            OutputTarget::Indexed(_) if builtin => Expr::attribute(
                Expr::subscript(Expr::name("gl_out"), Self::invocation_id()),
                key,
            ),
            OutputTarget::Indexed(instance) => Expr::attribute(
                Expr::subscript(Expr::name(instance.as_str()), Self::invocation_id()),
                key,
            ),
        })
    }

    /// One plain assignment per keyword of `value`.
    fn assignments(&self, value: Expr) -> CompileResult<Vec<Stmt>> {
        if self.target == OutputTarget::None {
            return Err(CompileError::malformed(
                "stage has no output block to return",
            ));
        }

        let (func, args, keywords) = match value {
            Expr::Call {
                func,
                args,
                keywords,
            } => (func, args, keywords),
            other => {
                return Err(CompileError::malformed(format!(
                    "output must be constructed with keyword arguments, found {:?}",
                    other
                )))
            }
        };

        let callee = func.as_name().unwrap_or_default();
        if self.block.as_deref() != Some(callee) {
            return Err(CompileError::malformed(format!(
                "returned '{}' does not match the output block '{}'",
                callee,
                self.block.as_deref().unwrap_or("none")
            )));
        }
        if !args.is_empty() {
            return Err(CompileError::malformed(
                "positional arguments are not allowed in output constructors",
            ));
        }

        keywords
            .into_iter()
            .map(|keyword| {
                Ok(Stmt::plain_assign(
                    self.field_target(&keyword.name)?,
                    keyword.value,
                ))
            })
            .collect()
    }
}

impl Rewrite for ReturnRewriter {
    fn rewrite_body(&mut self, body: Vec<Stmt>) -> CompileResult<Vec<Stmt>> {
        self.depth += 1;
        let top_level = self.depth == 1;
        let last = body.len().saturating_sub(1);

        let mut result = Vec::with_capacity(body.len());
        for (index, stmt) in body.into_iter().enumerate() {
            match stmt {
                Stmt::Return(Some(value)) => {
                    if self.generator {
                        return Err(CompileError::malformed(
                            "geometry shaders emit vertices with yield, not return",
                        ));
                    }
                    result.append(&mut self.assignments(value)?);
                    // an early return still has to leave main
                    if !(top_level && index == last) {
                        result.push(Stmt::Return(None));
                    }
                }
                Stmt::Yield(value) => {
                    if !self.generator {
                        return Err(CompileError::unsupported(
                            "yield",
                            "only geometry shaders can emit vertices",
                        ));
                    }
                    if let Some(value) = value {
                        result.append(&mut self.assignments(value)?);
                    }
                    result.push(Stmt::Expr(Expr::call(Expr::name("EmitVertex"), vec![])));
                }
                other => result.append(&mut walk_stmt(self, other)?),
            }
        }

        self.depth -= 1;
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::parse;

    fn rewrite(mut rewriter: ReturnRewriter, source: &str) -> CompileResult<Vec<Stmt>> {
        rewriter.rewrite_body(parse(source)?)
    }

    fn plain(source: &str) -> Vec<Stmt> {
        parse(source)
            .unwrap()
            .into_iter()
            .map(|stmt| match stmt {
                Stmt::Assign { targets, value, .. } => {
                    Stmt::plain_assign(targets[0].clone(), value)
                }
                other => other,
            })
            .collect()
    }

    #[test]
    fn assigns_each_keyword() {
        let rewriter = ReturnRewriter::new(
            Some("VsOut".into()),
            OutputTarget::Instance("vs_out".into()),
        );
        let body = rewrite(rewriter, "return VsOut(gl_position=p, color=c)\n").unwrap();
        assert_eq!(body, plain("gl_position = p\nvs_out.color = c\n"));
    }

    #[test]
    fn indexes_control_outputs_by_invocation() {
        let rewriter = ReturnRewriter::new(
            Some("TcsOut".into()),
            OutputTarget::Indexed("tcs_out".into()),
        );
        let body = rewrite(rewriter, "return TcsOut(pos=p, gl_Position=q)\n").unwrap();
        assert_eq!(
            body,
            plain("tcs_out[gl_InvocationID].pos = p\ngl_out[gl_InvocationID].gl_Position = q\n")
        );
    }

    #[test]
    fn keeps_early_returns_as_exits() {
        let rewriter = ReturnRewriter::new(
            Some("Out".into()),
            OutputTarget::Instance("out".into()),
        );
        let body = rewrite(rewriter, "if a:\n    return Out(v=1)\nreturn Out(v=2)\n").unwrap();
        match &body[0] {
            Stmt::If { body, .. } => assert_eq!(body.last(), Some(&Stmt::Return(None))),
            other => panic!("unexpected {:?}", other),
        }
        assert_eq!(body.len(), 2);
    }

    #[test]
    fn emits_vertex_after_yield() {
        let rewriter = ReturnRewriter::new(
            Some("GsOut".into()),
            OutputTarget::Instance("gs_out".into()),
        )
        .generator(true);
        let body = rewrite(rewriter, "for i in range(3):\n    yield GsOut(color=c)\n").unwrap();
        match &body[0] {
            Stmt::For { body, .. } => {
                assert_eq!(body.len(), 2);
                assert_eq!(body[1], Stmt::Expr(Expr::call(Expr::name("EmitVertex"), vec![])));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn rejects_malformed_outputs() {
        let target = || OutputTarget::Instance("out".into());
        assert!(matches!(
            rewrite(ReturnRewriter::new(Some("Out".into()), target()), "return Out(1)\n"),
            Err(CompileError::MalformedDeclaration(_))
        ));
        assert!(matches!(
            rewrite(ReturnRewriter::new(Some("Out".into()), target()), "return Other(v=1)\n"),
            Err(CompileError::MalformedDeclaration(_))
        ));
        assert!(matches!(
            rewrite(ReturnRewriter::new(None, OutputTarget::None), "return x\n"),
            Err(CompileError::MalformedDeclaration(_))
        ));
        assert!(matches!(
            rewrite(ReturnRewriter::new(Some("Out".into()), target()), "yield Out(v=1)\n"),
            Err(CompileError::UnsupportedConstruct { .. })
        ));
    }
}
