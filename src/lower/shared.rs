use crate::error::{CompileError, CompileResult};
use crate::lower::{walk_stmt, Rewrite};
use crate::source::ast::{Expr, Stmt};
use crate::types::{resolve_marker, TypeLookup};

/// Pulls `name = shared(T)` assignments out of a compute body and collects
/// the matching top-level `shared` declarations.
pub struct SharedExtractor<'a> {
    lookup: &'a dyn TypeLookup,
    declarations: Vec<String>,
}

impl<'a> SharedExtractor<'a> {
    pub fn new(lookup: &'a dyn TypeLookup) -> Self {
        SharedExtractor {
            lookup,
            declarations: vec![],
        }
    }

    /// Declarations found so far, in body order.
    pub fn declarations(&self) -> &[String] {
        &self.declarations
    }

    pub fn into_declarations(self) -> Vec<String> {
        self.declarations
    }

    fn declare(&mut self, targets: &[Expr], args: &[Expr]) -> CompileResult<()> {
        let name = match targets {
            [Expr::Name(name)] => name,
            _ => {
                return Err(CompileError::malformed(
                    "shared memory must be assigned to a single plain name",
                ))
            }
        };
        let marker = match args {
            [marker] => resolve_marker(marker, self.lookup)?,
            _ => {
                return Err(CompileError::malformed(format!(
                    "shared() takes exactly one type argument, '{}' has {}",
                    name,
                    args.len()
                )))
            }
        };

        log::trace!("extracted shared variable '{}'", name);
        self.declarations
            .push(format!("shared {};", marker.declare(name)));
        Ok(())
    }
}

impl Rewrite for SharedExtractor<'_> {
    fn rewrite_stmt(&mut self, stmt: Stmt) -> CompileResult<Vec<Stmt>> {
        match stmt {
            Stmt::Assign {
                ref targets,
                value: Expr::Call {
                    ref func, ref args, ..
                },
                ..
            } if func.as_name() == Some("shared") => {
                self.declare(targets, args)?;
                Ok(vec![])
            }
            other => walk_stmt(self, other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::parse;
    use std::collections::HashSet;

    #[test]
    fn extracts_shared_arrays_and_scalars() {
        let lookup: HashSet<String> = HashSet::new();
        let mut extractor = SharedExtractor::new(&lookup);
        let body = extractor
            .rewrite_body(
                parse("data = shared(float[256])\ncount = shared(uint)\nx = data[0]\n").unwrap(),
            )
            .unwrap();

        assert_eq!(body, parse("x = data[0]\n").unwrap());
        assert_eq!(
            extractor.into_declarations(),
            vec!["shared float data[256];", "shared uint count;"]
        );
    }

    #[test]
    fn rejects_unknown_shared_types() {
        let lookup: HashSet<String> = HashSet::new();
        let mut extractor = SharedExtractor::new(&lookup);
        let result = extractor.rewrite_body(parse("data = shared(Missing[4])\n").unwrap());
        assert_eq!(result, Err(CompileError::UnresolvedType("Missing".into())));
    }
}
