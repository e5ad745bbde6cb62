use crate::ast::{Expr, ExprVisitor, FunctionDecl, LiteralValue, Stmt, StmtVisitor};

/// Renders trees in the Crafting‑Interpreters parenthesised prefix form,
/// e.g. `(* (- 123.0) (group 45.67))`.  Debugging aid only.
pub struct AstPrinter;

impl AstPrinter {
    pub fn print(expr: &Expr) -> String {
        expr.accept(&mut AstPrinter)
    }

    pub fn print_stmt(stmt: &Stmt) -> String {
        stmt.accept(&mut AstPrinter)
    }

    fn parenthesize<'e>(&mut self, name: &str, exprs: impl IntoIterator<Item = &'e Expr>) -> String {
        let mut s = format!("({}", name);
        for expr in exprs {
            s.push(' ');
            s.push_str(&expr.accept(self));
        }
        s.push(')');
        s
    }

    fn function(&mut self, decl: &FunctionDecl) -> String {
        let params: Vec<&str> = decl.params.iter().map(|p| p.lexeme.as_str()).collect();
        let mut s = format!("(fun {}({})", decl.name.lexeme, params.join(" "));
        for stmt in &decl.body {
            s.push(' ');
            s.push_str(&stmt.accept(self));
        }
        s.push(')');
        s
    }
}

impl ExprVisitor<String> for AstPrinter {
    fn visit_expr(&mut self, expr: &Expr) -> String {
        match expr {
            // ── literals ────────────────────────────────────────────────
            Expr::Literal(lit) => match lit {
                LiteralValue::True => "true".into(),

                LiteralValue::False => "false".into(),

                LiteralValue::Nil => "nil".into(),

                LiteralValue::Str(s) => s.clone(),

                LiteralValue::Number(n) => {
                    if n.fract() == 0.0 {
                        // 3 → 3.0
                        format!("{:.1}", n)
                    } else {
                        n.to_string()
                    }
                }
            },

            Expr::Grouping(inner) => self.parenthesize("group", [inner.as_ref()]),

            Expr::Unary { operator, right } => {
                self.parenthesize(&operator.lexeme, [right.as_ref()])
            }

            Expr::Binary {
                left,
                operator,
                right,
            }
            | Expr::Logical {
                left,
                operator,
                right,
            } => self.parenthesize(&operator.lexeme, [left.as_ref(), right.as_ref()]),

            Expr::Variable { name, .. } => name.lexeme.clone(),

            Expr::Assign { name, value, .. } => {
                self.parenthesize(&format!("= {}", name.lexeme), [value.as_ref()])
            }

            Expr::Call {
                callee, arguments, ..
            } => self.parenthesize("call", std::iter::once(callee.as_ref()).chain(arguments)),

            Expr::Get { object, name } => {
                format!("(. {} {})", object.accept(self), name.lexeme)
            }

            Expr::Set {
                object,
                name,
                value,
            } => format!(
                "(= {} {} {})",
                object.accept(self),
                name.lexeme,
                value.accept(self)
            ),

            Expr::This { .. } => "this".into(),

            Expr::Super { method, .. } => format!("(super {})", method.lexeme),
        }
    }
}

impl StmtVisitor<String> for AstPrinter {
    fn visit_stmt(&mut self, stmt: &Stmt) -> String {
        match stmt {
            Stmt::Expression(expr) => self.parenthesize(";", [expr]),

            Stmt::Print(expr) => self.parenthesize("print", [expr]),

            Stmt::Var { name, initializer } => {
                self.parenthesize(&format!("var {}", name.lexeme), initializer)
            }

            Stmt::Block(statements) => {
                let mut s = String::from("(block");
                for stmt in statements {
                    s.push(' ');
                    s.push_str(&stmt.accept(self));
                }
                s.push(')');
                s
            }

            Stmt::If {
                condition,
                then_branch,
                else_branch,
            } => match else_branch {
                Some(else_branch) => format!(
                    "(if-else {} {} {})",
                    condition.accept(self),
                    then_branch.accept(self),
                    else_branch.accept(self)
                ),
                None => format!(
                    "(if {} {})",
                    condition.accept(self),
                    then_branch.accept(self)
                ),
            },

            Stmt::While { condition, body } => {
                format!("(while {} {})", condition.accept(self), body.accept(self))
            }

            Stmt::Function(decl) => self.function(decl),

            Stmt::Return { value, .. } => self.parenthesize("return", value),

            Stmt::Class {
                name,
                superclass,
                methods,
            } => {
                let mut s = format!("(class {}", name.lexeme);
                if let Some(superclass) = superclass {
                    s.push_str(" < ");
                    s.push_str(&superclass.accept(self));
                }
                for method in methods {
                    s.push(' ');
                    s.push_str(&self.function(method));
                }
                s.push(')');
                s
            }
        }
    }
}
