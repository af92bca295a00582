use crate::error::CompileResult;
use crate::lower::{walk_expr, Rewrite};
use crate::source::ast::Expr;
use std::collections::{HashMap, HashSet};

lazy_static::lazy_static! {
    /// Lower-case spellings of GLSL built-ins and their real names.
    pub static ref BUILTIN_RENAMES: HashMap<&'static str, &'static str> = [
        ("gl_position", "gl_Position"),
        ("gl_fragcolor", "gl_FragColor"),
        ("gl_fragcoord", "gl_FragCoord"),
        ("gl_fragdepth", "gl_FragDepth"),
        ("gl_pointcoord", "gl_PointCoord"),
        ("gl_pointsize", "gl_PointSize"),
        ("gl_vertexid", "gl_VertexID"),
        ("gl_instanceid", "gl_InstanceID"),
        ("gl_primitiveid", "gl_PrimitiveID"),
        ("gl_invocationid", "gl_InvocationID"),
        ("gl_tesscoord", "gl_TessCoord"),
        ("gl_tesslevelinner", "gl_TessLevelInner"),
        ("gl_tesslevelouter", "gl_TessLevelOuter"),
    ]
    .into_iter()
    .collect();
}

/// Rewrites built-in names on bare names and attribute names.
pub struct Renamer<'a> {
    names: &'a HashMap<&'static str, &'static str>,
}

impl Default for Renamer<'static> {
    fn default() -> Self {
        Renamer {
            names: &BUILTIN_RENAMES,
        }
    }
}

impl<'a> Renamer<'a> {
    pub fn new(names: &'a HashMap<&'static str, &'static str>) -> Self {
        Renamer { names }
    }

    fn rename(&self, name: String) -> String {
        match self.names.get(name.as_str()) {
            Some(renamed) => renamed.to_string(),
            None => name,
        }
    }
}

impl Rewrite for Renamer<'_> {
    fn rewrite_expr(&mut self, expr: Expr) -> CompileResult<Expr> {
        Ok(match expr {
            Expr::Name(id) => Expr::Name(self.rename(id)),
            Expr::Attribute { value, attr } => Expr::Attribute {
                value: Box::new(self.rewrite_expr(*value)?),
                attr: self.rename(attr),
            },
            other => walk_expr(self, other)?,
        })
    }
}

/// Replaces `p.field` with `field` wherever `p` is a designated name.
///
/// Chains rooted anywhere else are left as they are, and chains below a
/// replaced prefix keep their tail, so `p.a.b` becomes `a.b`.
pub struct Remover {
    names: HashSet<String>,
}

impl Remover {
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Remover {
            names: names.into_iter().map(Into::into).collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

impl Rewrite for Remover {
    fn rewrite_expr(&mut self, expr: Expr) -> CompileResult<Expr> {
        match expr {
            Expr::Attribute { value, attr } => match *value {
                Expr::Name(ref root) if self.names.contains(root) => Ok(Expr::Name(attr)),
                value => Ok(Expr::Attribute {
                    value: Box::new(self.rewrite_expr(value)?),
                    attr,
                }),
            },
            other => walk_expr(self, other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lower::Rewrite;
    use crate::source::parse;

    fn rewrite(rewrite: &mut dyn Rewrite, source: &str) -> Vec<crate::source::ast::Stmt> {
        rewrite.rewrite_body(parse(source).unwrap()).unwrap()
    }

    #[test]
    fn renames_names_and_attributes() {
        let body = rewrite(&mut Renamer::default(), "gl_position = gl_in[0].gl_position\n");
        assert_eq!(
            body,
            parse("gl_Position = gl_in[0].gl_Position\n").unwrap()
        );
    }

    #[test]
    fn strips_designated_prefixes_everywhere() {
        let mut remover = Remover::new(["attrs", "u"]);
        let body = rewrite(
            &mut remover,
            "x = f(attrs.position, u.scale * other.scale)\nif u.flag:\n    y = attrs.uv.x\n",
        );
        assert_eq!(
            body,
            parse("x = f(position, scale * other.scale)\nif flag:\n    y = uv.x\n").unwrap()
        );
    }

    #[test]
    fn leaves_other_roots_alone() {
        let mut remover = Remover::new(["attrs"]);
        let body = rewrite(&mut remover, "p = vs_out[0].attrs\n");
        assert_eq!(body, parse("p = vs_out[0].attrs\n").unwrap());
    }
}
