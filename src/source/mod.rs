pub mod ast;
pub mod lexer;
pub mod normalize;
pub mod parser;

use crate::error::CompileResult;
use ast::Stmt;

/// De-indents `source` and parses it into top-level statements.
pub fn parse(source: &str) -> CompileResult<Vec<Stmt>> {
    let dedented = normalize::dedent(source)?;
    parser::parse_module(&dedented)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_indented_method_source() {
        let body = parse("        def f(x: float) -> float:\n            return x\n").unwrap();
        assert!(matches!(&body[0], Stmt::FunctionDef(def) if def.name == "f"));
    }
}
