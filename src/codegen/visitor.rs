//! Node-by-node translation of function bodies into GLSL.

use crate::codegen::document::GlslDocument;
use crate::error::{CompileError, CompileResult};
use crate::lower::range::{const_int, range_length, RangeBounds};
use crate::registry::{Registry, ShaderFunction};
use crate::source::ast::{
    AssignKind, BinaryOperator, BoolOperator, CompareOperator, Comprehension, Expr, Keyword,
    Literal, Stmt, UnaryOperator,
};
use crate::types::{array_marker_length, is_constructor_name, resolve_marker};

fn binary_symbol(op: BinaryOperator) -> CompileResult<&'static str> {
    Ok(match op {
        BinaryOperator::Add => "+",
        BinaryOperator::Sub => "-",
        BinaryOperator::Mul | BinaryOperator::MatMul => "*",
        BinaryOperator::Div => "/",
        BinaryOperator::Mod => "%",
        BinaryOperator::LShift => "<<",
        BinaryOperator::RShift => ">>",
        BinaryOperator::BitOr => "|",
        BinaryOperator::BitXor => "^",
        BinaryOperator::BitAnd => "&",
        BinaryOperator::Pow => {
            return Err(CompileError::unsupported("**", "use pow() instead"))
        }
        BinaryOperator::FloorDiv => {
            return Err(CompileError::unsupported("//", "use floor(a / b) instead"))
        }
    })
}

fn unary_symbol(op: UnaryOperator) -> &'static str {
    match op {
        UnaryOperator::Plus => "+",
        UnaryOperator::Minus => "-",
        UnaryOperator::Not => "!",
        UnaryOperator::Invert => "~",
    }
}

fn compare_symbol(op: CompareOperator) -> CompileResult<&'static str> {
    Ok(match op {
        CompareOperator::Eq => "==",
        CompareOperator::NotEq => "!=",
        CompareOperator::Lt => "<",
        CompareOperator::LtE => "<=",
        CompareOperator::Gt => ">",
        CompareOperator::GtE => ">=",
        CompareOperator::Is | CompareOperator::IsNot => {
            return Err(CompileError::unsupported("is", "compare values with == instead"))
        }
        CompareOperator::In | CompareOperator::NotIn => {
            return Err(CompileError::unsupported(
                "in",
                "membership tests have no GLSL equivalent",
            ))
        }
    })
}

fn int_literal(text: &str) -> String {
    let lower = text.to_ascii_lowercase();
    // GLSL only knows decimal, octal with a leading 0 and hex
    if lower.starts_with("0o") || lower.starts_with("0b") {
        if let Some(value) = const_int(&Expr::Literal(Literal::Int(text.to_string()))) {
            return value.to_string();
        }
    }
    text.to_string()
}

/// Emits GLSL for expressions and statements. Holds nothing but the
/// registry it resolves declarations against.
pub struct Visitor<'a> {
    registry: &'a Registry,
}

impl<'a> Visitor<'a> {
    pub fn new(registry: &'a Registry) -> Self {
        Visitor { registry }
    }

    /// Renders an operator operand. Comparisons are the only operators
    /// emitted without their own parentheses, so they get them here.
    fn operand(&self, expr: &Expr) -> CompileResult<String> {
        Ok(match expr {
            Expr::Compare { .. } => format!("({})", self.expr(expr)?),
            other => self.expr(other)?,
        })
    }

    pub fn expr(&self, expr: &Expr) -> CompileResult<String> {
        Ok(match expr {
            Expr::Name(id) => id.clone(),
            Expr::Attribute { value, attr } => format!("{}.{}", self.expr(value)?, attr),
            Expr::Subscript { value, index } => {
                format!("{}[{}]", self.expr(value)?, self.expr(index)?)
            }
            Expr::Literal(literal) => match literal {
                Literal::Bool(true) => "true".to_string(),
                Literal::Bool(false) => "false".to_string(),
                Literal::Int(text) => int_literal(text),
                Literal::Float(text) => text.clone(),
                Literal::Str(_) | Literal::None => String::new(),
            },
            Expr::Call {
                func,
                args,
                keywords,
            } => self.call(func, args, keywords)?,
            Expr::BinaryOp { left, op, right } => format!(
                "({} {} {})",
                self.operand(left)?,
                binary_symbol(*op)?,
                self.operand(right)?
            ),
            Expr::UnaryOp { op, operand } => match operand.as_ref() {
                Expr::UnaryOp { .. } => {
                    format!("{}({})", unary_symbol(*op), self.expr(operand)?)
                }
                _ => format!("{}{}", unary_symbol(*op), self.operand(operand)?),
            },
            Expr::BoolOp { op, values } => {
                let symbol = match op {
                    BoolOperator::And => " && ",
                    BoolOperator::Or => " || ",
                };
                let values = values
                    .iter()
                    .map(|value| self.expr(value))
                    .collect::<CompileResult<Vec<_>>>()?;
                format!("({})", values.join(symbol))
            }
            Expr::Compare {
                left,
                ops,
                comparators,
            } => match (ops.as_slice(), comparators.as_slice()) {
                ([op], [right]) => format!(
                    "{} {} {}",
                    self.operand(left)?,
                    compare_symbol(*op)?,
                    self.operand(right)?
                ),
                _ => {
                    return Err(CompileError::unsupported(
                        "comparison",
                        "chained comparisons are not supported; combine them with 'and'",
                    ))
                }
            },
            Expr::IfExp { test, body, orelse } => format!(
                "({} ? {} : {})",
                self.expr(test)?,
                self.expr(body)?,
                self.expr(orelse)?
            ),
            Expr::List(_) => {
                return Err(CompileError::unsupported(
                    "list",
                    "array literals may only be assigned to a name",
                ))
            }
            Expr::Tuple(_) => {
                return Err(CompileError::unsupported(
                    "tuple",
                    "tuples have no GLSL equivalent",
                ))
            }
            Expr::ListComp { .. } => {
                return Err(CompileError::unsupported(
                    "ListComp",
                    "comprehensions may only be assigned to a name",
                ))
            }
        })
    }

    fn call(&self, func: &Expr, args: &[Expr], keywords: &[Keyword]) -> CompileResult<String> {
        if func.as_name() == Some("shared") {
            return Err(CompileError::unsupported(
                "shared",
                "shared memory is only available in compute shaders",
            ));
        }

        let callee = self.expr(func)?;
        let mut rendered = Vec::with_capacity(args.len() + keywords.len());
        for arg in args {
            let arg = self.expr(arg)?;
            if !arg.is_empty() {
                rendered.push(arg);
            }
        }

        if !keywords.is_empty() {
            let fields = self.constructor_fields(&callee, rendered, keywords)?;
            return Ok(format!("{}({})", callee, fields.join(", ")));
        }
        Ok(format!("{}({})", callee, rendered.join(", ")))
    }

    /// Orders struct constructor arguments by member declaration order.
    fn constructor_fields(
        &self,
        callee: &str,
        positional: Vec<String>,
        keywords: &[Keyword],
    ) -> CompileResult<Vec<String>> {
        let def = self.registry.struct_def(callee).ok_or_else(|| {
            CompileError::malformed(format!(
                "keyword arguments are only accepted by struct constructors, '{}' is not a struct",
                callee
            ))
        })?;

        let mut fields: Vec<Option<String>> = vec![None; def.members.len()];
        if positional.len() > fields.len() {
            return Err(CompileError::malformed(format!(
                "'{}' has {} members, {} arguments given",
                callee,
                fields.len(),
                positional.len()
            )));
        }
        for (slot, value) in fields.iter_mut().zip(positional) {
            *slot = Some(value);
        }

        for keyword in keywords {
            let index = def.member_index(&keyword.name).ok_or_else(|| {
                CompileError::malformed(format!(
                    "'{}' has no member '{}'",
                    callee, keyword.name
                ))
            })?;
            if fields[index].is_some() {
                return Err(CompileError::malformed(format!(
                    "member '{}' of '{}' is given twice",
                    keyword.name, callee
                )));
            }
            fields[index] = Some(self.expr(&keyword.value)?);
        }

        fields
            .into_iter()
            .zip(&def.members)
            .map(|(field, member)| {
                field.ok_or_else(|| {
                    CompileError::malformed(format!(
                        "missing member '{}' in '{}' constructor",
                        member.name, callee
                    ))
                })
            })
            .collect()
    }

    /// Statements of `body` at the current level, without terminators.
    pub fn body(&self, body: &[Stmt]) -> CompileResult<GlslDocument> {
        let mut document = GlslDocument::new();
        for stmt in body {
            document.append(self.stmt(stmt)?);
        }
        Ok(document)
    }

    pub fn stmt(&self, stmt: &Stmt) -> CompileResult<GlslDocument> {
        Ok(match stmt {
            // docstrings
            Stmt::Expr(Expr::Literal(_)) => GlslDocument::new(),
            Stmt::Expr(expr) => GlslDocument::with_line(self.expr(expr)?),
            Stmt::Assign {
                targets,
                value,
                kind,
            } => match targets.as_slice() {
                [target] => self.assign(target, value, *kind)?,
                _ => {
                    return Err(CompileError::malformed(
                        "multiple assignment targets are not supported",
                    ))
                }
            },
            Stmt::AugAssign { target, op, value } => GlslDocument::with_line(format!(
                "{} {}= {}",
                self.expr(target)?,
                binary_symbol(*op)?,
                self.expr(value)?
            )),
            Stmt::AnnAssign {
                target,
                annotation,
                value,
            } => {
                let name = target.as_name().ok_or_else(|| {
                    CompileError::malformed("annotated assignments must target a plain name")
                })?;
                let declaration = resolve_marker(annotation, self.registry)?.declare(name);
                match value {
                    Some(value) => {
                        GlslDocument::with_line(format!("{} = {}", declaration, self.expr(value)?))
                    }
                    None => GlslDocument::with_line(declaration),
                }
            }
            Stmt::Declare { ty, name } => GlslDocument::with_line(format!("{} {}", ty, name)),
            Stmt::Return(Some(value)) => {
                GlslDocument::with_line(format!("return {}", self.expr(value)?))
            }
            Stmt::Return(None) => GlslDocument::with_line("return"),
            Stmt::Yield(_) => {
                return Err(CompileError::unsupported(
                    "yield",
                    "only geometry shaders can emit vertices",
                ))
            }
            Stmt::If { test, body, orelse } => {
                let mut document = GlslDocument::with_line(format!("if ({}) {{", self.expr(test)?));
                document.append_block(self.body(body)?);
                if !orelse.is_empty() {
                    document.line("} else {");
                    document.append_block(self.body(orelse)?);
                }
                document.line("}");
                document
            }
            Stmt::For { target, iter, body } => {
                let variable = target.as_name().ok_or_else(|| {
                    CompileError::unsupported("for", "loop variable must be a plain name")
                })?;
                let mut document = GlslDocument::with_line(self.range_loop(variable, iter)?);
                document.append_block(self.body(body)?);
                document.line("}");
                document
            }
            Stmt::While { test, body } => {
                let mut document =
                    GlslDocument::with_line(format!("while ({}) {{", self.expr(test)?));
                document.append_block(self.body(body)?);
                document.line("}");
                document
            }
            Stmt::Break => GlslDocument::with_line("break"),
            Stmt::Continue => GlslDocument::with_line("continue"),
            Stmt::Pass => GlslDocument::new(),
            Stmt::FunctionDef(def) => {
                return Err(CompileError::unsupported(
                    "def",
                    format!("nested function '{}' cannot be translated", def.name),
                ))
            }
            Stmt::ClassDef(class) => {
                return Err(CompileError::unsupported(
                    "class",
                    format!("nested class '{}' cannot be translated", class.name),
                ))
            }
        })
    }

    /// `for (int v = s; v < e; v++) {` for a `range(...)` iterable.
    fn range_loop(&self, variable: &str, iter: &Expr) -> CompileResult<String> {
        let bounds = RangeBounds::from_call(iter)?;
        let start = match bounds.start {
            Some(start) => self.expr(start)?,
            None => "0".to_string(),
        };
        let end = self.expr(bounds.end)?;
        let step = match bounds.step {
            Some(step) => self.expr(step)?,
            None => "1".to_string(),
        };

        let descending = bounds.step.and_then(const_int).map_or(false, |step| step < 0);
        let comparison = if descending { ">" } else { "<" };
        let increment = if step == "1" {
            format!("{}++", variable)
        } else {
            format!("{} += {}", variable, step)
        };
        Ok(format!(
            "for (int {v} = {}; {v} {} {}; {}) {{",
            start,
            comparison,
            end,
            increment,
            v = variable
        ))
    }

    fn assign(&self, target: &Expr, value: &Expr, kind: AssignKind) -> CompileResult<GlslDocument> {
        if let Expr::Tuple(_) = target {
            return Err(CompileError::malformed(
                "tuple unpacking is not supported",
            ));
        }

        let declared = match target {
            Expr::Name(name) if kind == AssignKind::Auto && !name.starts_with("gl_") => Some(name),
            _ => None,
        };

        match (declared, value) {
            (Some(name), Expr::List(items)) => self.array_literal(name, items),
            (Some(name), Expr::ListComp { elt, generators }) => {
                self.comprehension(name, elt, generators)
            }
            (Some(name), Expr::Subscript { value: marker, .. })
                if marker.as_name().and_then(array_marker_length).is_some() =>
            {
                let marker = resolve_marker(value, self.registry)?;
                Ok(GlslDocument::with_line(marker.declare(name)))
            }
            (Some(name), Expr::Call { func, .. })
                if func
                    .as_name()
                    .map_or(false, |callee| is_constructor_name(callee, self.registry)) =>
            {
                let callee = self.expr(func)?;
                Ok(GlslDocument::with_line(format!(
                    "{} {} = {}",
                    callee,
                    name,
                    self.expr(value)?
                )))
            }
            _ => Ok(GlslDocument::with_line(format!(
                "{} = {}",
                self.expr(target)?,
                self.expr(value)?
            ))),
        }
    }

    fn array_literal(&self, name: &str, items: &[Expr]) -> CompileResult<GlslDocument> {
        if items.is_empty() {
            return Err(CompileError::malformed(format!(
                "array '{}' is assigned an empty literal",
                name
            )));
        }

        let elements = items
            .iter()
            .map(|item| self.expr(item))
            .collect::<CompileResult<Vec<_>>>()?;
        let ty = if elements.iter().any(|element| element.contains('.')) {
            "float"
        } else {
            "int"
        };
        Ok(GlslDocument::with_line(format!(
            "{ty} {}[{n}] = {ty}[{n}]({})",
            name,
            elements.join(", "),
            ty = ty,
            n = elements.len()
        )))
    }

    fn comprehension(
        &self,
        name: &str,
        elt: &Expr,
        generators: &[Comprehension],
    ) -> CompileResult<GlslDocument> {
        let generator = match generators {
            [generator] => generator,
            _ => {
                return Err(CompileError::unsupported(
                    "ListComp",
                    "only a single for clause is supported",
                ))
            }
        };
        let variable = generator.target.as_name().ok_or_else(|| {
            CompileError::unsupported("ListComp", "loop variable must be a plain name")
        })?;

        let (start, end, step) = RangeBounds::from_call(&generator.iter)?.evaluate()?;
        let length = range_length(start, end, step)?;

        let element = self.expr(elt)?;
        let ty = if element.contains('.') { "float" } else { "int" };

        let slot = match (start, step) {
            (0, 1) => variable.to_string(),
            (_, 1) => format!("({} - {})", variable, start),
            (0, _) => format!("({} / {})", variable, step),
            _ => format!("(({} - {}) / {})", variable, start, step),
        };
        let mut assignment = GlslDocument::with_line(format!("{}[{}] = {}", name, slot, element));

        if !generator.ifs.is_empty() {
            let conditions = generator
                .ifs
                .iter()
                .map(|cond| self.expr(cond))
                .collect::<CompileResult<Vec<_>>>()?;
            let mut filtered =
                GlslDocument::with_line(format!("if ({}) {{", conditions.join(" && ")));
            filtered.append_block(assignment);
            filtered.line("}");
            assignment = filtered;
        }

        let increment = if step == 1 {
            format!("{}++", variable)
        } else {
            format!("{} += {}", variable, step)
        };
        let mut document = GlslDocument::with_line(format!("{} {}[{}]", ty, name, length));
        document.line(format!(
            "for (int {v} = {}; {v} < {}; {}) {{",
            start,
            end,
            increment,
            v = variable
        ));
        document.append_block(assignment);
        document.line("}");
        Ok(document)
    }

    /// `<ret> <name>(<params>) { ... }` for a library function whose body
    /// has already been lowered.
    pub fn function(
        &self,
        function: &ShaderFunction,
        body: &[Stmt],
    ) -> CompileResult<GlslDocument> {
        let returns = match &function.returns.marker {
            Some(marker) => marker.to_string(),
            None => "void".to_string(),
        };
        let params = function
            .params
            .iter()
            .map(|param| param.marker.declare(&param.name))
            .collect::<Vec<_>>();

        let mut document = GlslDocument::with_line(format!(
            "{} {}({}) {{",
            returns,
            function.name,
            params.join(", ")
        ));
        document.append_block(self.body(body)?);
        document.line("}");
        Ok(document)
    }

    pub fn main(&self, body: &[Stmt]) -> CompileResult<GlslDocument> {
        let mut document = GlslDocument::with_line("void main() {");
        document.append_block(self.body(body)?);
        document.line("}");
        Ok(document)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::StructDef;
    use crate::source::parse;
    use crate::types::TypeMarker;

    fn emit(source: &str) -> CompileResult<Vec<String>> {
        let registry = Registry::new();
        let body = parse(source)?;
        Ok(Visitor::new(&registry).main(&body)?.lines()[1..]
            .iter()
            .map(|line| line.trim().to_string())
            .collect())
    }

    #[test]
    fn declares_constructor_assignments() {
        let lines = emit(
            "a = vec3(1.0, 2.0, 3.0)\nb = normalize(a)\ngl_Position = vec4(a, 1.0)\n",
        )
        .unwrap();
        assert_eq!(lines[0], "vec3 a = vec3(1.0, 2.0, 3.0);");
        assert_eq!(lines[1], "b = normalize(a);");
        assert_eq!(lines[2], "gl_Position = vec4(a, 1.0);");
    }

    #[test]
    fn emits_conditionals() {
        let lines = emit("if 1 != 2:\n    a = int(1)\nelse:\n    a = int(2)\n").unwrap();
        assert_eq!(
            &lines[..5],
            &["if (1 != 2) {", "int a = int(1);", "} else {", "int a = int(2);", "}"]
        );
    }

    #[test]
    fn infers_array_literal_types() {
        let lines = emit("arr = [1.0, 2.0, 3.0]\nidx = [1, 2, 3, 4]\n").unwrap();
        assert_eq!(lines[0], "float arr[3] = float[3](1.0, 2.0, 3.0);");
        assert_eq!(lines[1], "int idx[4] = int[4](1, 2, 3, 4);");
        assert!(matches!(
            emit("arr = []\n"),
            Err(CompileError::MalformedDeclaration(_))
        ));
    }

    #[test]
    fn lowers_range_loops() {
        let lines = emit(
            "for i in range(10):\n    x += i\nfor j in range(2, n, 2):\n    x -= j\n",
        )
        .unwrap();
        assert_eq!(lines[0], "for (int i = 0; i < 10; i++) {");
        assert_eq!(lines[1], "x += i;");
        assert_eq!(lines[3], "for (int j = 2; j < n; j += 2) {");
        assert!(emit("for v in items:\n    pass\n").is_err());
    }

    #[test]
    fn unrolls_bounded_comprehensions() {
        let lines = emit("w = i * 0.5 for i in range(0, 10, 3) if i != 3\n").unwrap();
        assert_eq!(
            &lines[..6],
            &[
                "float w[4];",
                "for (int i = 0; i < 10; i += 3) {",
                "if (i != 3) {",
                "w[(i / 3)] = (i * 0.5);",
                "}",
                "}"
            ]
        );

        let error = emit("w = i for i in range(n)\n").unwrap_err();
        assert!(error.to_string().contains("computable at compile time"));
    }

    #[test]
    fn renders_operators() {
        let lines = emit("x = a if b and not c else -d\ny = 0b101 | 0x1f\n").unwrap();
        assert_eq!(lines[0], "x = ((b && !c) ? a : -d);");
        assert_eq!(lines[1], "y = (5 | 0x1f);");
        assert!(emit("x = a ** 2\n").is_err());
        assert!(emit("x = a < b < c\n").is_err());
    }

    #[test]
    fn parenthesises_nested_operands() {
        let lines = emit(
            "a = float(-(-1.0))\nif not (1.0 < 2.0):\n    pass\nc = int((1 < 2) & 3)\nd = (a < b) == (c < e)\n",
        )
        .unwrap();
        assert_eq!(lines[0], "float a = float(-(-1.0));");
        assert_eq!(lines[1], "if (!(1.0 < 2.0)) {");
        assert_eq!(lines[3], "int c = int(((1 < 2) & 3));");
        assert_eq!(lines[4], "d = (a < b) == (c < e);");

        let lines = emit("if 1 != 2:\n    x = -y\n").unwrap();
        assert_eq!(lines[0], "if (1 != 2) {");
        assert_eq!(lines[1], "x = -y;");
    }

    #[test]
    fn reorders_struct_keywords() {
        let mut registry = Registry::new();
        registry.register_struct(
            StructDef::new("Light")
                .member("position", TypeMarker::Builtin("vec3"))
                .member("power", TypeMarker::Builtin("float")),
        );
        let visitor = Visitor::new(&registry);
        let body = parse("l = Light(power=2.0, position=p)\n").unwrap();
        assert_eq!(
            visitor.stmt(&body[0]).unwrap().lines(),
            &["Light l = Light(p, 2.0)"]
        );

        let body = parse("l = Light(power=2.0)\n").unwrap();
        assert!(matches!(
            visitor.stmt(&body[0]),
            Err(CompileError::MalformedDeclaration(_))
        ));
    }

    #[test]
    fn declares_array_markers_and_annotations() {
        let lines = emit("weights = Array4[float]\ncount: int = 3\n").unwrap();
        assert_eq!(lines[0], "float weights[4];");
        assert_eq!(lines[1], "int count = 3;");
    }

    #[test]
    fn rejects_multiple_targets() {
        assert!(matches!(
            emit("a = b = 1\n"),
            Err(CompileError::MalformedDeclaration(_))
        ));
    }
}
