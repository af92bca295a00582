//! `range(...)` bounds for counted loops and bounded comprehensions.

use crate::error::{CompileError, CompileResult};
use crate::source::ast::{BinaryOperator, Expr, Literal, UnaryOperator};

/// Arguments of a `range(...)` call.
#[derive(Debug, Clone, Copy)]
pub struct RangeBounds<'e> {
    pub start: Option<&'e Expr>,
    pub end: &'e Expr,
    pub step: Option<&'e Expr>,
}

impl<'e> RangeBounds<'e> {
    /// Reads the bounds of `iter`, which must be a `range` call with one to
    /// three integer or variable arguments.
    pub fn from_call(iter: &'e Expr) -> CompileResult<RangeBounds<'e>> {
        let args = match iter {
            Expr::Call {
                func,
                args,
                keywords,
            } if func.as_name() == Some("range") && keywords.is_empty() => args,
            _ => {
                return Err(CompileError::unsupported(
                    "for",
                    "only range() loops are supported",
                ))
            }
        };

        for arg in args {
            if let Expr::Literal(literal) = arg {
                if !matches!(literal, Literal::Int(_)) {
                    return Err(CompileError::unsupported(
                        "range",
                        "range() arguments must be integers or variables",
                    ));
                }
            }
        }

        match args.as_slice() {
            [end] => Ok(RangeBounds {
                start: None,
                end,
                step: None,
            }),
            [start, end] => Ok(RangeBounds {
                start: Some(start),
                end,
                step: None,
            }),
            [start, end, step] => Ok(RangeBounds {
                start: Some(start),
                end,
                step: Some(step),
            }),
            _ => Err(CompileError::unsupported(
                "range",
                "range() requires 1-3 arguments",
            )),
        }
    }

    /// Evaluates the bounds to `(start, end, step)` at compile time.
    pub fn evaluate(&self) -> CompileResult<(i64, i64, i64)> {
        let constant = |expr: Option<&Expr>, default: i64| -> CompileResult<i64> {
            match expr {
                None => Ok(default),
                Some(expr) => const_int(expr).ok_or_else(|| {
                    CompileError::unsupported(
                        "ListComp",
                        "list comprehension size must be computable at compile time; use constant range() arguments",
                    )
                }),
            }
        };
        Ok((
            constant(self.start, 0)?,
            constant(Some(self.end), 0)?,
            constant(self.step, 1)?,
        ))
    }
}

/// Number of elements `range(start, end, step)` yields,
/// `ceil((end - start) / step)`.
pub fn range_length(start: i64, end: i64, step: i64) -> CompileResult<usize> {
    if step <= 0 {
        return Err(CompileError::malformed(format!(
            "range step must be positive, got {}",
            step
        )));
    }
    let overflow = || {
        CompileError::malformed(format!(
            "range({}, {}, {}) is too large to unroll",
            start, end, step
        ))
    };
    let span = end.checked_sub(start).ok_or_else(overflow)?;
    if span <= 0 {
        return Err(CompileError::malformed(format!(
            "range({}, {}, {}) is empty",
            start, end, step
        )));
    }
    let length = span / step + i64::from(span % step != 0);
    usize::try_from(length).map_err(|_| overflow())
}

fn parse_int(text: &str) -> Option<i64> {
    let lower = text.to_ascii_lowercase();
    if let Some(hex) = lower.strip_prefix("0x") {
        i64::from_str_radix(hex, 16).ok()
    } else if let Some(oct) = lower.strip_prefix("0o") {
        i64::from_str_radix(oct, 8).ok()
    } else if let Some(bin) = lower.strip_prefix("0b") {
        i64::from_str_radix(bin, 2).ok()
    } else {
        lower.trim_end_matches('u').parse().ok()
    }
}

/// Folds integer literal arithmetic. Anything that is not a constant
/// integer expression yields `None`.
pub fn const_int(expr: &Expr) -> Option<i64> {
    match expr {
        Expr::Literal(Literal::Int(text)) => parse_int(text),
        Expr::UnaryOp { op, operand } => {
            let value = const_int(operand)?;
            match op {
                UnaryOperator::Plus => Some(value),
                UnaryOperator::Minus => value.checked_neg(),
                UnaryOperator::Invert => Some(!value),
                UnaryOperator::Not => None,
            }
        }
        Expr::BinaryOp { left, op, right } => {
            let left = const_int(left)?;
            let right = const_int(right)?;
            match op {
                BinaryOperator::Add => left.checked_add(right),
                BinaryOperator::Sub => left.checked_sub(right),
                BinaryOperator::Mul => left.checked_mul(right),
                BinaryOperator::FloorDiv => left.checked_div_euclid(right),
                BinaryOperator::Mod => left.checked_rem_euclid(right),
                BinaryOperator::LShift => left.checked_shl(u32::try_from(right).ok()?),
                BinaryOperator::RShift => left.checked_shr(u32::try_from(right).ok()?),
                _ => None,
            }
        }
        _ => None,
    }
}
