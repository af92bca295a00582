//! Single-exit lowering for functions with several `return` statements.

use crate::error::{CompileError, CompileResult};
use crate::source::ast::{Expr, Stmt};
use crate::types::TypeMarker;

pub const RETURN_VALUE: &str = "_return_value";

/// Number of `return` statements in `body`, nested blocks included.
pub fn count_returns(body: &[Stmt]) -> usize {
    body.iter()
        .map(|stmt| match stmt {
            Stmt::Return(_) => 1,
            Stmt::If { body, orelse, .. } => count_returns(body) + count_returns(orelse),
            Stmt::For { body, .. } | Stmt::While { body, .. } => count_returns(body),
            _ => 0,
        })
        .sum()
}

/// Rewrites a body with more than one `return` so that it declares
/// `_return_value` up front, assigns it wherever it used to return and
/// returns it once at the end. Bodies with fewer returns are given back
/// unchanged.
pub fn flatten_returns(body: Vec<Stmt>, returns: &TypeMarker) -> CompileResult<Vec<Stmt>> {
    if count_returns(&body) <= 1 {
        return Ok(body);
    }
    log::trace!("flattening returns into {}", RETURN_VALUE);

    let lowered = lower(body, &[])?;

    let mut result = Vec::with_capacity(lowered.len() + 2);
    result.push(Stmt::Declare {
        ty: returns.to_string(),
        name: RETURN_VALUE.to_string(),
    });
    result.extend(lowered);
    result.push(Stmt::Return(Some(Expr::name(RETURN_VALUE))));
    Ok(result)
}

/// Lowers `body` followed by the already lowered `after`. Code that
/// follows a returning `if` is copied into each branch that falls through,
/// so nothing runs after an assignment that used to be a `return`.
fn lower(body: Vec<Stmt>, after: &[Stmt]) -> CompileResult<Vec<Stmt>> {
    let mut result = Vec::with_capacity(body.len() + after.len());
    let mut rest = body.into_iter();

    while let Some(stmt) = rest.next() {
        match stmt {
            Stmt::Return(Some(value)) => {
                // anything after it is unreachable
                result.push(Stmt::plain_assign(Expr::name(RETURN_VALUE), value));
                return Ok(result);
            }
            Stmt::Return(None) => {
                return Err(CompileError::malformed(
                    "bare return in a function that returns a value",
                ))
            }
            Stmt::For { ref body, .. } | Stmt::While { ref body, .. }
                if count_returns(body) > 0 =>
            {
                return Err(CompileError::unsupported(
                    "return",
                    "functions with several returns cannot return from inside a loop",
                ))
            }
            Stmt::If { test, body, orelse }
                if count_returns(&body) + count_returns(&orelse) > 0 =>
            {
                let tail = lower(rest.collect(), after)?;
                result.push(Stmt::If {
                    test,
                    body: lower(body, &tail)?,
                    orelse: lower(orelse, &tail)?,
                });
                return Ok(result);
            }
            other => result.push(other),
        }
    }

    result.extend(after.iter().cloned());
    Ok(result)
}
