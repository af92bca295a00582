//! Tree-to-tree rewrites applied before code generation.
//!
//! Passes implement [`Rewrite`] and override only the nodes they care
//! about; the `walk_*` functions rebuild everything else unchanged.

pub mod flatten;
pub mod range;
pub mod rename;
pub mod returns;
pub mod shared;

use crate::error::CompileResult;
use crate::source::ast::{Comprehension, Expr, Keyword, Stmt};

pub trait Rewrite {
    fn rewrite_expr(&mut self, expr: Expr) -> CompileResult<Expr> {
        walk_expr(self, expr)
    }

    /// A statement may be replaced by any number of statements.
    fn rewrite_stmt(&mut self, stmt: Stmt) -> CompileResult<Vec<Stmt>> {
        walk_stmt(self, stmt)
    }

    fn rewrite_body(&mut self, body: Vec<Stmt>) -> CompileResult<Vec<Stmt>> {
        walk_body(self, body)
    }
}

fn boxed<R: Rewrite + ?Sized>(rewrite: &mut R, expr: Box<Expr>) -> CompileResult<Box<Expr>> {
    Ok(Box::new(rewrite.rewrite_expr(*expr)?))
}

fn all<R: Rewrite + ?Sized>(rewrite: &mut R, exprs: Vec<Expr>) -> CompileResult<Vec<Expr>> {
    exprs
        .into_iter()
        .map(|expr| rewrite.rewrite_expr(expr))
        .collect()
}

pub fn walk_expr<R: Rewrite + ?Sized>(rewrite: &mut R, expr: Expr) -> CompileResult<Expr> {
    Ok(match expr {
        Expr::Attribute { value, attr } => Expr::Attribute {
            value: boxed(rewrite, value)?,
            attr,
        },
        Expr::Subscript { value, index } => Expr::Subscript {
            value: boxed(rewrite, value)?,
            index: boxed(rewrite, index)?,
        },
        Expr::Call {
            func,
            args,
            keywords,
        } => Expr::Call {
            func: boxed(rewrite, func)?,
            args: all(rewrite, args)?,
            keywords: keywords
                .into_iter()
                .map(|keyword| {
                    Ok(Keyword {
                        name: keyword.name,
                        value: rewrite.rewrite_expr(keyword.value)?,
                    })
                })
                .collect::<CompileResult<_>>()?,
        },
        Expr::BinaryOp { left, op, right } => Expr::BinaryOp {
            left: boxed(rewrite, left)?,
            op,
            right: boxed(rewrite, right)?,
        },
        Expr::UnaryOp { op, operand } => Expr::UnaryOp {
            op,
            operand: boxed(rewrite, operand)?,
        },
        Expr::BoolOp { op, values } => Expr::BoolOp {
            op,
            values: all(rewrite, values)?,
        },
        Expr::Compare {
            left,
            ops,
            comparators,
        } => Expr::Compare {
            left: boxed(rewrite, left)?,
            ops,
            comparators: all(rewrite, comparators)?,
        },
        Expr::IfExp { test, body, orelse } => Expr::IfExp {
            test: boxed(rewrite, test)?,
            body: boxed(rewrite, body)?,
            orelse: boxed(rewrite, orelse)?,
        },
        Expr::List(items) => Expr::List(all(rewrite, items)?),
        Expr::Tuple(items) => Expr::Tuple(all(rewrite, items)?),
        Expr::ListComp { elt, generators } => Expr::ListComp {
            elt: boxed(rewrite, elt)?,
            generators: generators
                .into_iter()
                .map(|generator| {
                    Ok(Comprehension {
                        target: rewrite.rewrite_expr(generator.target)?,
                        iter: rewrite.rewrite_expr(generator.iter)?,
                        ifs: all(rewrite, generator.ifs)?,
                    })
                })
                .collect::<CompileResult<_>>()?,
        },
        leaf @ (Expr::Name(_) | Expr::Literal(_)) => leaf,
    })
}

pub fn walk_stmt<R: Rewrite + ?Sized>(rewrite: &mut R, stmt: Stmt) -> CompileResult<Vec<Stmt>> {
    let stmt = match stmt {
        Stmt::Expr(expr) => Stmt::Expr(rewrite.rewrite_expr(expr)?),
        Stmt::Assign {
            targets,
            value,
            kind,
        } => Stmt::Assign {
            targets: all(rewrite, targets)?,
            value: rewrite.rewrite_expr(value)?,
            kind,
        },
        Stmt::AugAssign { target, op, value } => Stmt::AugAssign {
            target: rewrite.rewrite_expr(target)?,
            op,
            value: rewrite.rewrite_expr(value)?,
        },
        Stmt::AnnAssign {
            target,
            annotation,
            value,
        } => Stmt::AnnAssign {
            target: rewrite.rewrite_expr(target)?,
            annotation,
            value: value.map(|value| rewrite.rewrite_expr(value)).transpose()?,
        },
        Stmt::Return(value) => {
            Stmt::Return(value.map(|value| rewrite.rewrite_expr(value)).transpose()?)
        }
        Stmt::Yield(value) => {
            Stmt::Yield(value.map(|value| rewrite.rewrite_expr(value)).transpose()?)
        }
        Stmt::If { test, body, orelse } => Stmt::If {
            test: rewrite.rewrite_expr(test)?,
            body: rewrite.rewrite_body(body)?,
            orelse: rewrite.rewrite_body(orelse)?,
        },
        Stmt::For { target, iter, body } => Stmt::For {
            target: rewrite.rewrite_expr(target)?,
            iter: rewrite.rewrite_expr(iter)?,
            body: rewrite.rewrite_body(body)?,
        },
        Stmt::While { test, body } => Stmt::While {
            test: rewrite.rewrite_expr(test)?,
            body: rewrite.rewrite_body(body)?,
        },
        other => other,
    };
    Ok(vec![stmt])
}

pub fn walk_body<R: Rewrite + ?Sized>(
    rewrite: &mut R,
    body: Vec<Stmt>,
) -> CompileResult<Vec<Stmt>> {
    let mut result = Vec::with_capacity(body.len());
    for stmt in body {
        result.append(&mut rewrite.rewrite_stmt(stmt)?);
    }
    Ok(result)
}

/// Visits every expression of `body` without rebuilding it.
pub fn visit_exprs<'a>(body: &'a [Stmt], visit: &mut dyn FnMut(&'a Expr)) {
    fn expr<'a>(node: &'a Expr, visit: &mut dyn FnMut(&'a Expr)) {
        visit(node);
        match node {
            Expr::Attribute { value, .. } => expr(value, visit),
            Expr::Subscript { value, index } => {
                expr(value, visit);
                expr(index, visit);
            }
            Expr::Call {
                func,
                args,
                keywords,
            } => {
                expr(func, visit);
                args.iter().for_each(|arg| expr(arg, visit));
                keywords.iter().for_each(|keyword| expr(&keyword.value, visit));
            }
            Expr::BinaryOp { left, right, .. } => {
                expr(left, visit);
                expr(right, visit);
            }
            Expr::UnaryOp { operand, .. } => expr(operand, visit),
            Expr::BoolOp { values, .. } | Expr::List(values) | Expr::Tuple(values) => {
                values.iter().for_each(|value| expr(value, visit))
            }
            Expr::Compare {
                left, comparators, ..
            } => {
                expr(left, visit);
                comparators.iter().for_each(|value| expr(value, visit));
            }
            Expr::IfExp { test, body, orelse } => {
                expr(test, visit);
                expr(body, visit);
                expr(orelse, visit);
            }
            Expr::ListComp { elt, generators } => {
                expr(elt, visit);
                for generator in generators {
                    expr(&generator.iter, visit);
                    generator.ifs.iter().for_each(|cond| expr(cond, visit));
                }
            }
            Expr::Name(_) | Expr::Literal(_) => {}
        }
    }

    for stmt in body {
        match stmt {
            Stmt::Expr(value) | Stmt::Return(Some(value)) | Stmt::Yield(Some(value)) => {
                expr(value, visit)
            }
            Stmt::Assign { targets, value, .. } => {
                targets.iter().for_each(|target| expr(target, visit));
                expr(value, visit);
            }
            Stmt::AugAssign { target, value, .. } => {
                expr(target, visit);
                expr(value, visit);
            }
            Stmt::AnnAssign {
                target,
                annotation,
                value,
            } => {
                expr(target, visit);
                expr(annotation, visit);
                if let Some(value) = value {
                    expr(value, visit);
                }
            }
            Stmt::If { test, body, orelse } => {
                expr(test, visit);
                visit_exprs(body, visit);
                visit_exprs(orelse, visit);
            }
            Stmt::For { iter, body, .. } => {
                expr(iter, visit);
                visit_exprs(body, visit);
            }
            Stmt::While { test, body } => {
                expr(test, visit);
                visit_exprs(body, visit);
            }
            _ => {}
        }
    }
}
