use crate::error::{CompileError, CompileResult};
use regex::Regex;

lazy_static::lazy_static! {
    static ref LEADING_WHITESPACE: Regex = Regex::new(r"^[ \t]*").unwrap();
}

fn indent_width(line: &str) -> usize {
    LEADING_WHITESPACE
        .find(line)
        .map(|found| found.end())
        .unwrap_or(0)
}

/// De-indents `source` by the leading whitespace of its first non-blank
/// line.
///
/// Every following line must start with at least that much whitespace;
/// blank lines are allowed to be shorter.
pub fn dedent(source: &str) -> CompileResult<String> {
    let lines: Vec<&str> = source
        .lines()
        .skip_while(|line| line.trim().is_empty())
        .collect();

    let width = match lines.first() {
        Some(first) => indent_width(first),
        None => return Ok(String::new()),
    };

    let mut result = String::with_capacity(source.len());
    for (number, line) in lines.iter().enumerate() {
        if line.trim().is_empty() {
            result.push('\n');
            continue;
        }

        if indent_width(line) < width {
            return Err(CompileError::indentation(
                number + 1,
                format!("less indentation than first line: {}", line.trim_end()),
            ));
        }

        result.push_str(&line[width..]);
        result.push('\n');
    }

    log::trace!("dedented source by {} columns", width);
    Ok(result)
}
